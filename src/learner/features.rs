//! Fixed-size numeric features derived from a game record.
//!
//! Every feature is oriented toward the home side (positive favours home) and
//! is independently bounded, so no single malformed input can dominate the
//! linear score:
//!
//! | feature          | range           |
//! |------------------|-----------------|
//! | `moneyline_edge` | [-0.5, 0.5]     |
//! | `spread_tilt`    | [-0.3, 0.3]     |
//! | `weather`        | [-0.25, 0.0]    |
//! | `injuries`       | [-0.1, 0.1]     |
//! | `turnovers`      | [-0.08, 0.08]   |
//! | `pace`           | [-0.05, 0.05]   |
//! | `home_field`     | [0.0, 0.1]      |

use serde::{Deserialize, Serialize};

use crate::models::{Game, Injuries, Odds, SideValues, Weather};

/// Number of features in the model.
pub const FEATURE_COUNT: usize = 7;

const SPREAD_TILT_PER_POINT: f64 = 0.02;
const SPREAD_TILT_BOUND: f64 = 0.3;
const WEATHER_FLOOR: f64 = -0.25;
const INJURY_SCALE: f64 = 0.5;
const INJURY_BOUND: f64 = 0.1;
const DEFAULT_TURNOVERS: f64 = 1.2;
const TURNOVER_SCALE: f64 = 0.03;
const TURNOVER_BOUND: f64 = 0.08;
/// League-average plays per game used as the pace baseline.
const PACE_BASELINE: f64 = 65.0;
const PACE_SCALE: f64 = 0.0025;
const PACE_BOUND: f64 = 0.05;
const DEFAULT_HOME_FIELD: f64 = 0.05;
const HOME_FIELD_MAX: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub moneyline_edge: f64,
    pub spread_tilt: f64,
    pub weather: f64,
    pub injuries: f64,
    pub turnovers: f64,
    pub pace: f64,
    pub home_field: f64,
}

impl FeatureVector {
    /// Build the feature vector for a game. Missing inputs contribute 0.
    pub fn extract(game: &Game) -> Self {
        let (moneyline_edge, spread_tilt) = match &game.odds {
            Some(odds) => (moneyline_edge(odds), spread_tilt(odds.spread)),
            None => (0.0, 0.0),
        };
        FeatureVector {
            moneyline_edge,
            spread_tilt,
            weather: weather_impact(game.weather.as_ref()),
            injuries: injury_impact(game.injuries.as_ref()),
            turnovers: turnover_impact(game.turnovers.as_ref()),
            pace: pace_impact(game.pace.as_ref()),
            home_field: home_field(game.home_field_advantage),
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.moneyline_edge,
            self.spread_tilt,
            self.weather,
            self.injuries,
            self.turnovers,
            self.pace,
            self.home_field,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [moneyline_edge, spread_tilt, weather, injuries, turnovers, pace, home_field] = values;
        FeatureVector {
            moneyline_edge,
            spread_tilt,
            weather,
            injuries,
            turnovers,
            pace,
            home_field,
        }
    }

    /// Weighted sum of the features.
    pub fn dot(&self, weights: &FeatureVector) -> f64 {
        self.to_array()
            .iter()
            .zip(weights.to_array())
            .map(|(f, w)| f * w)
            .sum()
    }
}

// ── Sub-scorers ──────────────────────────────────────────────────────────────

/// Convert an American price to decimal odds. `None` for zero / non-finite.
pub fn american_to_decimal(odds: f64) -> Option<f64> {
    if !odds.is_finite() || odds == 0.0 {
        return None;
    }
    if odds > 0.0 {
        Some(1.0 + odds / 100.0)
    } else {
        Some(1.0 + 100.0 / odds.abs())
    }
}

/// Vig-free implied probabilities `(home, away)` from an American price pair.
pub fn vigless_implied(home: f64, away: f64) -> Option<(f64, f64)> {
    let home_imp = 1.0 / american_to_decimal(home)?;
    let away_imp = 1.0 / american_to_decimal(away)?;
    let sum = home_imp + away_imp;
    if !sum.is_finite() || sum <= 0.0 {
        return None;
    }
    Some((home_imp / sum, away_imp / sum))
}

/// Home implied-probability advantage after removing vig, centred at 0.
pub fn moneyline_edge(odds: &Odds) -> f64 {
    match vigless_implied(odds.home, odds.away) {
        Some((home, _)) => (home - 0.5).clamp(-0.5, 0.5),
        None => 0.0,
    }
}

/// A home spread of -7 tilts toward home by 0.14.
pub fn spread_tilt(spread: Option<f64>) -> f64 {
    match spread {
        Some(s) if s.is_finite() => (-s * SPREAD_TILT_PER_POINT).clamp(-SPREAD_TILT_BOUND, SPREAD_TILT_BOUND),
        _ => 0.0,
    }
}

/// Penalty for conditions that compress scoring and favour randomness.
/// Each threshold subtracts a fixed amount; the sum is floored at -0.25.
pub fn weather_impact(weather: Option<&Weather>) -> f64 {
    let Some(weather) = weather else {
        return 0.0;
    };
    let mut impact: f64 = 0.0;

    if let Some(t) = weather.temperature.filter(|t| t.is_finite()) {
        if t < 32.0 {
            impact -= 0.05;
        } else if t > 90.0 {
            impact -= 0.03;
        }
    }

    if let Some(w) = weather.wind_speed.filter(|w| w.is_finite()) {
        if w > 20.0 {
            impact -= 0.08;
        } else if w > 12.0 {
            impact -= 0.05;
        } else if w > 8.0 {
            impact -= 0.02;
        }
    }

    let conditions = weather
        .conditions
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if conditions.contains("rain") || conditions.contains("snow") {
        impact -= 0.07;
    }

    impact.clamp(WEATHER_FLOOR, 0.0)
}

/// Positive when the away side is more hurt than the home side.
pub fn injury_impact(injuries: Option<&Injuries>) -> f64 {
    let Some(injuries) = injuries else {
        return 0.0;
    };
    let home = finite_or(injuries.home_impact, 0.0);
    let away = finite_or(injuries.away_impact, 0.0);
    ((away - home) * INJURY_SCALE).clamp(-INJURY_BOUND, INJURY_BOUND)
}

/// Positive when the away side turns the ball over more often.
pub fn turnover_impact(turnovers: Option<&SideValues>) -> f64 {
    let Some(turnovers) = turnovers else {
        return 0.0;
    };
    let home = finite_or(turnovers.home, DEFAULT_TURNOVERS);
    let away = finite_or(turnovers.away, DEFAULT_TURNOVERS);
    ((away - home) * TURNOVER_SCALE).clamp(-TURNOVER_BOUND, TURNOVER_BOUND)
}

/// Deviation of the average pace of both sides from the league baseline.
pub fn pace_impact(pace: Option<&SideValues>) -> f64 {
    let Some(pace) = pace else {
        return 0.0;
    };
    let home = finite_or(pace.home, PACE_BASELINE);
    let away = finite_or(pace.away, PACE_BASELINE);
    let avg = (home + away) / 2.0;
    ((avg - PACE_BASELINE) * PACE_SCALE).clamp(-PACE_BOUND, PACE_BOUND)
}

pub fn home_field(advantage: Option<f64>) -> f64 {
    finite_or(advantage, DEFAULT_HOME_FIELD).clamp(0.0, HOME_FIELD_MAX)
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}
