//! Seven-dimension adjustment of a base probability / confidence pair.
//!
//! Five dimensions are additive and move the probability:
//!
//!   effect = clamp(Σ wᵢ·scoreᵢ, ±0.15)
//!   p'     = clamp(p · (1 + effect) · temporal_decay, 0.01, 0.99)
//!
//! Chaos and information asymmetry scale the confidence instead:
//!
//!   c'     = clamp(c · (1 − chaos_penalty) · (1 + |information_asymmetry|), 0.1, 1.0)
//!
//! Volatility only ever attenuates confidence; recency pulls the whole
//! estimate toward the prior without choosing a direction.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::{Category, Game};

use super::dimensions::{
    chaos_sensitivity, emergent_pattern, information_asymmetry, narrative_momentum,
    network_influence, sentiment_field, strongest_narrative, temporal_decay, DimensionInputs,
    DimensionScores,
};
use super::weights::{CategoryWeights, WeightOverrides};

/// Bound on the combined additive effect.
pub const MAX_COMBINED_EFFECT: f64 = 0.15;
pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;
pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Discrete advice on how much to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeSize {
    Avoid,
    Small,
    Medium,
    Large,
}

impl fmt::Display for StakeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StakeSize::Avoid => "avoid",
            StakeSize::Small => "small",
            StakeSize::Medium => "medium",
            StakeSize::Large => "large",
        };
        f.write_str(s)
    }
}

/// What the engine needs to know about the event besides its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub category: Category,
    pub home_team: String,
    pub away_team: String,
}

impl EventMeta {
    pub fn from_game(game: &Game) -> Self {
        EventMeta {
            category: Category::detect(&game.league, &game.sport),
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
        }
    }
}

/// Dimension scores plus the explanation gathered while computing them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDimensions {
    pub scores: DimensionScores,
    /// Fraction of confidence removed for volatility, in [0, 1]
    pub chaos_penalty: f64,
    pub reasoning: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScoredDimensions {
    /// Scores supplied directly by a caller; the chaos penalty is the chaos
    /// score itself.
    pub fn from_scores(scores: DimensionScores) -> Self {
        let scores = scores.bounded();
        ScoredDimensions {
            chaos_penalty: scores.chaos_sensitivity,
            scores,
            reasoning: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectResult {
    pub scores: DimensionScores,
    pub weights: CategoryWeights,
    pub combined_effect: f64,
    pub adjusted_probability: f64,
    pub adjusted_confidence: f64,
    pub recommendation: StakeSize,
    pub recommendation_reason: String,
    pub reasoning: Vec<String>,
    pub warnings: Vec<String>,
}

/// Stateless apart from optional weight overrides; safe to share.
#[derive(Debug, Clone, Default)]
pub struct EffectEngine {
    overrides: WeightOverrides,
}

impl EffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: WeightOverrides) -> Self {
        EffectEngine { overrides }
    }

    pub fn weights_for(&self, category: Category) -> CategoryWeights {
        CategoryWeights::for_category(category).with_overrides(&self.overrides)
    }

    /// Score every dimension from its context. Absent context yields the
    /// neutral value for that dimension.
    pub fn score(&self, meta: &EventMeta, inputs: &DimensionInputs) -> ScoredDimensions {
        let mut reasoning = Vec::new();
        let mut warnings = Vec::new();
        let mut scores = DimensionScores::default();

        if let Some(sentiment) = &inputs.sentiment {
            scores.sentiment_field = sentiment_field(sentiment);
            if scores.sentiment_field.abs() > 0.05 {
                let team = self.leaning_team(meta, scores.sentiment_field);
                reasoning.push(format!(
                    "Sentiment field favours {} ({:+.1}%)",
                    team,
                    scores.sentiment_field * 100.0
                ));
            }
        }

        if let Some(narratives) = &inputs.narratives {
            scores.narrative_momentum = narrative_momentum(narratives);
            if scores.narrative_momentum.abs() > 0.03 {
                match strongest_narrative(narratives) {
                    Some((label, side)) => reasoning.push(format!(
                        "Narrative momentum: {} ({}), {:+.1}%",
                        label,
                        side,
                        scores.narrative_momentum * 100.0
                    )),
                    None => reasoning.push(format!(
                        "Narrative momentum {:+.1}%",
                        scores.narrative_momentum * 100.0
                    )),
                }
            }
        }

        if let Some(info) = &inputs.information_asymmetry {
            scores.information_asymmetry = information_asymmetry(info);
            if scores.information_asymmetry.abs() > 0.02 {
                let team = self.leaning_team(meta, scores.information_asymmetry);
                reasoning.push(format!(
                    "Sharp money detected on {} ({:+.1}%)",
                    team,
                    scores.information_asymmetry * 100.0
                ));
                if info.reverse_line_movement {
                    warnings.push(
                        "Reverse line movement: line moving against the public side".to_string(),
                    );
                }
            }
        }

        let mut chaos_penalty = None;
        if let Some(factors) = &inputs.chaos {
            scores.chaos_sensitivity = chaos_sensitivity(factors);
        } else if let Some(reading) = &inputs.chaos_reading {
            scores.chaos_sensitivity = unit_or_zero(reading.csi_score);
        }
        if let Some(reading) = &inputs.chaos_reading {
            if reading.confidence_penalty.is_finite() {
                chaos_penalty = Some(reading.confidence_penalty.clamp(0.0, 1.0));
            }
        }
        if scores.chaos_sensitivity > 0.35 {
            warnings.push(format!(
                "High chaos index ({:.0}%): outcome volatility is elevated",
                scores.chaos_sensitivity * 100.0
            ));
            reasoning.push(format!(
                "Chaos sensitivity {:.0}% reduces confidence",
                scores.chaos_sensitivity * 100.0
            ));
        } else if scores.chaos_sensitivity > 0.25 {
            reasoning.push(format!(
                "Moderate chaos ({:.0}%)",
                scores.chaos_sensitivity * 100.0
            ));
        }

        if let Some(network) = &inputs.network {
            scores.network_influence = network_influence(network);
            if scores.network_influence.abs() > 0.03 {
                let quality = if scores.network_influence > 0.0 {
                    "strong"
                } else {
                    "weak"
                };
                reasoning.push(format!(
                    "Team chemistry is {} ({:+.1}%)",
                    quality,
                    scores.network_influence * 100.0
                ));
            }
        }

        if let Some(events) = &inputs.recent_events {
            scores.temporal_decay = temporal_decay(events, meta.category);
            if scores.temporal_decay < 0.8 {
                reasoning.push(format!(
                    "Recent events have decayed to {:.0}% of their impact",
                    scores.temporal_decay * 100.0
                ));
            }
        }

        if let Some(signals) = &inputs.emergent_patterns {
            scores.emergent_pattern = emergent_pattern(signals);
            if scores.emergent_pattern.abs() > 0.02 {
                reasoning.push(format!(
                    "Emergent pattern signal {:+.1}%",
                    scores.emergent_pattern * 100.0
                ));
            }
        }

        let scores = scores.bounded();
        ScoredDimensions {
            chaos_penalty: chaos_penalty.unwrap_or(scores.chaos_sensitivity),
            scores,
            reasoning,
            warnings,
        }
    }

    /// Apply already-scored dimensions to a base estimate.
    pub fn combine(
        &self,
        base_probability: f64,
        base_confidence: f64,
        meta: &EventMeta,
        scored: ScoredDimensions,
    ) -> EffectResult {
        let base_probability = finite_or_half(base_probability);
        let base_confidence = finite_or_half(base_confidence);
        let scores = scored.scores.bounded();
        let weights = self.weights_for(meta.category);

        let raw = weights.sentiment * scores.sentiment_field
            + weights.narrative * scores.narrative_momentum
            + weights.information_asymmetry * scores.information_asymmetry
            + weights.network_influence * scores.network_influence
            + weights.emergent_pattern * scores.emergent_pattern;
        let combined_effect = if raw.is_finite() {
            raw.clamp(-MAX_COMBINED_EFFECT, MAX_COMBINED_EFFECT)
        } else {
            0.0
        };

        let adjusted_probability = (base_probability * (1.0 + combined_effect) * scores.temporal_decay)
            .clamp(MIN_PROBABILITY, MAX_PROBABILITY);

        let chaos_penalty = unit_or_zero(scored.chaos_penalty);
        let adjusted_confidence = (base_confidence
            * (1.0 - chaos_penalty)
            * (1.0 + scores.information_asymmetry.abs()))
        .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        let (recommendation, recommendation_reason) =
            recommend(&scores, adjusted_confidence);

        debug!(
            "EffectEngine: {:?} effect={:+.4} p {:.3}->{:.3} c {:.3}->{:.3} => {}",
            meta.category,
            combined_effect,
            base_probability,
            adjusted_probability,
            base_confidence,
            adjusted_confidence,
            recommendation
        );

        EffectResult {
            scores,
            weights,
            combined_effect,
            adjusted_probability,
            adjusted_confidence,
            recommendation,
            recommendation_reason,
            reasoning: scored.reasoning,
            warnings: scored.warnings,
        }
    }

    /// Score and combine in one step.
    pub fn calculate(
        &self,
        base_probability: f64,
        base_confidence: f64,
        meta: &EventMeta,
        inputs: &DimensionInputs,
    ) -> EffectResult {
        let scored = self.score(meta, inputs);
        self.combine(base_probability, base_confidence, meta, scored)
    }

    fn leaning_team<'a>(&self, meta: &'a EventMeta, score: f64) -> &'a str {
        if score >= 0.0 {
            &meta.home_team
        } else {
            &meta.away_team
        }
    }
}

/// Ordered policy, first match wins.
pub fn recommend(scores: &DimensionScores, confidence: f64) -> (StakeSize, String) {
    let chaos = scores.chaos_sensitivity;
    if chaos > 0.5 {
        return (
            StakeSize::Avoid,
            format!("Chaos index {:.0}% is too high to bet", chaos * 100.0),
        );
    }
    if chaos > 0.35 {
        return (
            StakeSize::Small,
            format!("Elevated chaos ({:.0}%), keep the stake small", chaos * 100.0),
        );
    }
    if confidence < 0.6 {
        return (
            StakeSize::Small,
            format!("Confidence {:.0}% is below 60%", confidence * 100.0),
        );
    }
    if scores.information_asymmetry.abs() > 0.05 && confidence > 0.7 {
        return (
            StakeSize::Large,
            "Strong information asymmetry backed by high confidence".to_string(),
        );
    }
    if confidence > 0.75 && chaos < 0.25 {
        return (
            StakeSize::Large,
            format!(
                "High confidence ({:.0}%) in a low-chaos game",
                confidence * 100.0
            ),
        );
    }
    (
        StakeSize::Medium,
        "Moderate edge with acceptable volatility".to_string(),
    )
}

fn finite_or_half(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.5
    }
}

fn unit_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::dimensions::{
        ChaosFactors, ChaosReading, EmergentSignal, InformationAsymmetryData,
        LineMovementDirection, Narrative, NarrativeKind, NarrativeSide, NetworkData,
        RecentEvent, SentimentData, SharpMoney,
    };
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn meta(category: Category) -> EventMeta {
        EventMeta {
            category,
            home_team: "Kansas City Chiefs".into(),
            away_team: "Buffalo Bills".into(),
        }
    }

    #[test]
    fn all_neutral_returns_base_estimate() {
        let engine = EffectEngine::new();
        for category in [Category::Nfl, Category::Nhl, Category::Other] {
            let r = engine.calculate(0.62, 0.71, &meta(category), &DimensionInputs::default());
            assert_relative_eq!(r.adjusted_probability, 0.62, epsilon = 1e-12);
            assert_relative_eq!(r.adjusted_confidence, 0.71, epsilon = 1e-12);
            assert_eq!(r.combined_effect, 0.0);
            assert!(r.reasoning.is_empty());
            assert!(r.warnings.is_empty());
        }
    }

    #[test]
    fn high_chaos_means_avoid_and_leaves_probability() {
        let engine = EffectEngine::new();
        let scored = ScoredDimensions::from_scores(DimensionScores {
            chaos_sensitivity: 0.6,
            ..Default::default()
        });
        let r = engine.combine(0.55, 0.8, &meta(Category::Nfl), scored);
        assert_eq!(r.recommendation, StakeSize::Avoid);
        assert_relative_eq!(r.adjusted_probability, 0.55, epsilon = 1e-12);
        assert_relative_eq!(r.adjusted_confidence, 0.8 * 0.4, epsilon = 1e-12);
    }

    #[test]
    fn chaos_overrides_strong_signals() {
        let engine = EffectEngine::new();
        let scored = ScoredDimensions::from_scores(DimensionScores {
            chaos_sensitivity: 0.51,
            information_asymmetry: 0.1,
            sentiment_field: 0.2,
            ..Default::default()
        });
        let r = engine.combine(0.7, 1.0, &meta(Category::Nba), scored);
        assert_eq!(r.recommendation, StakeSize::Avoid);
    }

    #[test]
    fn additive_effect_uses_category_weights() {
        let engine = EffectEngine::new();
        let scored = ScoredDimensions::from_scores(DimensionScores {
            information_asymmetry: 0.1,
            ..Default::default()
        });
        let r = engine.combine(0.5, 0.7, &meta(Category::Nfl), scored);
        assert_relative_eq!(r.combined_effect, 0.028, epsilon = 1e-12);
        assert_relative_eq!(r.adjusted_probability, 0.5 * 1.028, epsilon = 1e-12);
        assert_relative_eq!(r.adjusted_confidence, 0.7 * 1.1, epsilon = 1e-12);
    }

    #[test]
    fn combined_effect_is_clamped() {
        let engine = EffectEngine::with_overrides(WeightOverrides {
            sentiment: Some(5.0),
            ..Default::default()
        });
        let scored = ScoredDimensions::from_scores(DimensionScores {
            sentiment_field: 0.2,
            ..Default::default()
        });
        let r = engine.combine(0.5, 0.7, &meta(Category::Other), scored);
        assert_relative_eq!(r.combined_effect, MAX_COMBINED_EFFECT);
        assert_relative_eq!(r.adjusted_probability, 0.575, epsilon = 1e-12);
    }

    #[test]
    fn temporal_decay_pulls_probability_down() {
        let engine = EffectEngine::new();
        let scored = ScoredDimensions::from_scores(DimensionScores {
            temporal_decay: 0.5,
            ..Default::default()
        });
        let r = engine.combine(0.8, 0.8, &meta(Category::Mlb), scored);
        assert_relative_eq!(r.adjusted_probability, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn recommendation_policy_order() {
        let s = |chaos: f64, iai: f64| DimensionScores {
            chaos_sensitivity: chaos,
            information_asymmetry: iai,
            ..Default::default()
        };
        assert_eq!(recommend(&s(0.4, 0.0), 0.9).0, StakeSize::Small);
        assert_eq!(recommend(&s(0.1, 0.0), 0.55).0, StakeSize::Small);
        assert_eq!(recommend(&s(0.3, 0.06), 0.72).0, StakeSize::Large);
        assert_eq!(recommend(&s(0.2, 0.0), 0.8).0, StakeSize::Large);
        assert_eq!(recommend(&s(0.3, 0.0), 0.8).0, StakeSize::Medium);
        assert_eq!(recommend(&s(0.0, 0.0), 0.65).0, StakeSize::Medium);
        assert!(!recommend(&s(0.0, 0.0), 0.65).1.is_empty());
    }

    #[test]
    fn external_penalty_is_preferred() {
        let engine = EffectEngine::new();
        let inputs = DimensionInputs {
            chaos: Some(ChaosFactors::default()),
            chaos_reading: Some(ChaosReading {
                csi_score: 0.9,
                confidence_penalty: 0.05,
            }),
            ..Default::default()
        };
        let r = engine.calculate(0.6, 0.8, &meta(Category::Nfl), &inputs);
        // Factors win for the index itself
        assert_relative_eq!(r.scores.chaos_sensitivity, 0.15, epsilon = 1e-12);
        assert_relative_eq!(r.adjusted_confidence, 0.8 * 0.95, epsilon = 1e-12);
    }

    #[test]
    fn chaos_reading_alone_sets_index() {
        let engine = EffectEngine::new();
        let inputs = DimensionInputs {
            chaos_reading: Some(ChaosReading {
                csi_score: 0.7,
                confidence_penalty: 0.2,
            }),
            ..Default::default()
        };
        let r = engine.calculate(0.6, 0.8, &meta(Category::Nfl), &inputs);
        assert_relative_eq!(r.scores.chaos_sensitivity, 0.7, epsilon = 1e-12);
        assert_eq!(r.recommendation, StakeSize::Avoid);
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn reasoning_and_warnings_are_collected() {
        let engine = EffectEngine::new();
        let inputs = DimensionInputs {
            sentiment: Some(SentimentData {
                player_statements: 1.0,
                press_conferences: 1.0,
                ..Default::default()
            }),
            narratives: Some(vec![Narrative {
                kind: NarrativeKind::Revenge,
                strength: 0.9,
                side: NarrativeSide::Home,
                description: "Lost the AFC title game here".into(),
            }]),
            information_asymmetry: Some(InformationAsymmetryData {
                public_bet_percentage: 0.75,
                line_movement: 2.0,
                line_movement_direction: LineMovementDirection::AgainstPublic,
                sharp_money: SharpMoney::Home,
                reverse_line_movement: true,
                volume: 1.0,
            }),
            chaos: Some(ChaosFactors {
                division_rivalry: true,
                short_rest: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let r = engine.calculate(0.6, 0.75, &meta(Category::Nfl), &inputs);
        assert_eq!(r.reasoning.len(), 4);
        assert!(r.reasoning[0].contains("Kansas City Chiefs"));
        assert!(r.reasoning[1].contains("Revenge Game"));
        assert_eq!(r.warnings.len(), 2);
        assert!(r.combined_effect > 0.0);
        assert_eq!(r.recommendation, StakeSize::Small);
    }

    #[test]
    fn non_finite_base_is_sanitized() {
        let engine = EffectEngine::new();
        let r = engine.calculate(f64::NAN, f64::INFINITY, &meta(Category::Nba), &DimensionInputs::default());
        assert_relative_eq!(r.adjusted_probability, 0.5);
        assert_relative_eq!(r.adjusted_confidence, 0.5);
    }

    #[test]
    fn outputs_stay_in_contract_for_random_inputs() {
        let engine = EffectEngine::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let inputs = DimensionInputs {
                sentiment: Some(SentimentData {
                    player_statements: rng.gen_range(-3.0..3.0),
                    social_chatter: rng.gen_range(-3.0..3.0),
                    press_conferences: rng.gen_range(-3.0..3.0),
                    fan_sentiment: rng.gen_range(-3.0..3.0),
                    beat_reporter_tone: rng.gen_range(-3.0..3.0),
                }),
                information_asymmetry: Some(InformationAsymmetryData {
                    public_bet_percentage: rng.gen_range(-1.0..2.0),
                    line_movement: rng.gen_range(-20.0..20.0),
                    reverse_line_movement: rng.gen_bool(0.5),
                    sharp_money: SharpMoney::Home,
                    ..Default::default()
                }),
                chaos: Some(ChaosFactors {
                    weather_severity: rng.gen_range(-2.0..2.0),
                    trap_game: rng.gen_bool(0.5),
                    unfamiliar_starter: rng.gen_bool(0.5),
                    ..Default::default()
                }),
                network: Some(NetworkData {
                    cohesion: rng.gen_range(-1.0..2.0),
                    leadership: rng.gen_range(-1.0..2.0),
                    integration: rng.gen_range(-1.0..2.0),
                }),
                recent_events: Some(vec![RecentEvent {
                    days_ago: rng.gen_range(-5.0..30.0),
                    impact: rng.gen_range(-1.0..1.0),
                    kind: String::new(),
                }]),
                emergent_patterns: Some(vec![EmergentSignal {
                    score: rng.gen_range(-1.0..1.0),
                    description: String::new(),
                }]),
                ..Default::default()
            };
            let p = rng.gen_range(0.0..1.0);
            let c = rng.gen_range(0.0..1.0);
            let r = engine.calculate(p, c, &meta(Category::Nhl), &inputs);
            assert!((MIN_PROBABILITY..=MAX_PROBABILITY).contains(&r.adjusted_probability));
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&r.adjusted_confidence));
            assert!(r.combined_effect.abs() <= MAX_COMBINED_EFFECT);
            if r.scores.chaos_sensitivity > 0.5 {
                assert_eq!(r.recommendation, StakeSize::Avoid);
            }
        }
    }
}
