//! Online linear learner over [`FeatureVector`].
//!
//! The model is `p_home = clamp(0.5 + w·x + b, 0.05, 0.95)`. After each
//! finished game one gradient step is taken:
//!
//!   e = y − p,   w_i += lr · e · x_i,   b += lr · e · 0.1
//!
//! followed by clamping every weight into [-1.5, 1.5] and the bias into
//! [-0.5, 0.5]. Features carry no normalisation guarantee, so the clamp is
//! what keeps repeated noisy updates from diverging.
//!
//! Updates are not idempotent: feed each finished game exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::features::{FeatureVector, FEATURE_COUNT};
use crate::models::{Game, Side};
use crate::store::{StateStore, StoreError, LEARNER_STATE_KEY};

pub const LEARNING_RATE: f64 = 0.05;
/// The bias moves at a tenth of the weight step.
pub const BIAS_STEP_SCALE: f64 = 0.1;
pub const WEIGHT_BOUND: f64 = 1.5;
pub const BIAS_BOUND: f64 = 0.5;
pub const MIN_PROBABILITY: f64 = 0.05;
pub const MAX_PROBABILITY: f64 = 0.95;

/// Learned weights, one per feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureWeights {
    pub moneyline_edge: f64,
    pub spread_tilt: f64,
    pub weather: f64,
    pub injuries: f64,
    pub turnovers: f64,
    pub pace: f64,
    pub home_field: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        FeatureWeights {
            moneyline_edge: 0.4,
            spread_tilt: 0.15,
            weather: 0.05,
            injuries: 0.1,
            turnovers: 0.1,
            pace: 0.05,
            home_field: 0.15,
        }
    }
}

impl FeatureWeights {
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
        FeatureWeights {
            moneyline_edge,
            spread_tilt,
            weather,
            injuries,
            turnovers,
            pace,
            home_field,
        }
    }

    fn as_vector(&self) -> FeatureVector {
        FeatureVector::from_array(self.to_array())
    }
}

/// Everything the learner remembers across games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearnerState {
    pub weights: FeatureWeights,
    pub bias: f64,
    /// Finished games learned from
    pub samples: u64,
    /// Of those, games whose winner was called correctly
    pub wins: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for LearnerState {
    fn default() -> Self {
        LearnerState {
            weights: FeatureWeights::default(),
            bias: 0.0,
            samples: 0,
            wins: 0,
            updated_at: None,
        }
    }
}

impl LearnerState {
    /// Parse a persisted document. Missing fields take their defaults; a
    /// document that fails to parse yields full defaults.
    pub fn from_document(doc: &str) -> Self {
        match serde_json::from_str::<LearnerState>(doc) {
            Ok(state) => state.sanitized(),
            Err(e) => {
                warn!("Learner state is corrupt ({}); falling back to defaults", e);
                LearnerState::default()
            }
        }
    }

    pub fn to_document(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Re-establish every invariant: finite, bounded weights and bias, and
    /// `wins <= samples`.
    pub fn sanitized(mut self) -> Self {
        let defaults = FeatureWeights::default().to_array();
        let mut weights = self.weights.to_array();
        for (w, d) in weights.iter_mut().zip(defaults) {
            *w = if w.is_finite() {
                w.clamp(-WEIGHT_BOUND, WEIGHT_BOUND)
            } else {
                d
            };
        }
        self.weights = FeatureWeights::from_array(weights);
        self.bias = if self.bias.is_finite() {
            self.bias.clamp(-BIAS_BOUND, BIAS_BOUND)
        } else {
            0.0
        };
        self.wins = self.wins.min(self.samples);
        self
    }
}

/// Output of [`predict`]. `probability` is always the home win probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_winner: String,
    pub predicted_side: Side,
    pub probability: f64,
    pub confidence: f64,
    pub features: FeatureVector,
}

/// Result of one learning step.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnStep {
    pub state: LearnerState,
    /// Prediction made under the state *before* the update
    pub prediction: Prediction,
    /// y − p
    pub error: f64,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerStats {
    pub weights: FeatureWeights,
    pub bias: f64,
    pub samples: u64,
    pub wins: u64,
    pub accuracy: f64,
}

/// Score a game under `state`. Pure and deterministic.
pub fn predict(game: &Game, state: &LearnerState) -> Prediction {
    let features = FeatureVector::extract(game);
    let score = features.dot(&state.weights.as_vector()) + state.bias;
    let probability = if score.is_finite() {
        (0.5 + score).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    } else {
        0.5
    };
    let predicted_side = if probability >= 0.5 { Side::Home } else { Side::Away };
    Prediction {
        predicted_winner: game.team(predicted_side).to_string(),
        predicted_side,
        probability,
        confidence: probability,
        features,
    }
}

/// Take one gradient step toward the observed winner. Returns the new state;
/// `state` itself is untouched.
pub fn learn(game: &Game, actual_winner: &str, state: &LearnerState) -> LearnStep {
    let prediction = predict(game, state);
    let actual_side = game.side_of(actual_winner);
    if actual_side.is_none() {
        debug!(
            "Winner {:?} matches neither side of {} vs {}; labelling as away",
            actual_winner, game.home_team, game.away_team
        );
    }
    let y = if actual_side == Some(Side::Home) { 1.0 } else { 0.0 };
    let error = y - prediction.probability;

    let mut weights = state.weights.to_array();
    for (w, x) in weights.iter_mut().zip(prediction.features.to_array()) {
        *w = (*w + LEARNING_RATE * error * x).clamp(-WEIGHT_BOUND, WEIGHT_BOUND);
    }
    let bias = (state.bias + LEARNING_RATE * error * BIAS_STEP_SCALE).clamp(-BIAS_BOUND, BIAS_BOUND);

    let correct = actual_side == Some(prediction.predicted_side);
    let next = LearnerState {
        weights: FeatureWeights::from_array(weights),
        bias,
        samples: state.samples + 1,
        wins: state.wins + u64::from(correct),
        updated_at: Some(Utc::now()),
    }
    .sanitized();

    debug!(
        "Learned {} vs {}: y={} p={:.3} error={:+.4} correct={} samples={}",
        game.home_team, game.away_team, y, prediction.probability, error, correct, next.samples
    );

    LearnStep {
        state: next,
        prediction,
        error,
        correct,
    }
}

pub fn stats(state: &LearnerState) -> LearnerStats {
    let accuracy = if state.samples == 0 {
        0.0
    } else {
        state.wins as f64 / state.samples as f64
    };
    LearnerStats {
        weights: state.weights,
        bias: state.bias,
        samples: state.samples,
        wins: state.wins,
        accuracy,
    }
}

/// Load the learner state from `store`, or defaults when none is stored.
pub fn load_state<S: StateStore + ?Sized>(store: &S) -> Result<LearnerState, StoreError> {
    Ok(match store.read(LEARNER_STATE_KEY)? {
        Some(doc) => LearnerState::from_document(&doc),
        None => LearnerState::default(),
    })
}

pub fn save_state<S: StateStore + ?Sized>(store: &S, state: &LearnerState) -> Result<(), StoreError> {
    store.write(LEARNER_STATE_KEY, &state.to_document()?)
}

/// A learner bound to a store: the single writer of the persisted state.
/// Every learning step is saved before it is reported.
pub struct OnlineLearner<S: StateStore> {
    store: S,
    state: LearnerState,
}

impl<S: StateStore> OnlineLearner<S> {
    pub fn open(store: S) -> Result<Self, StoreError> {
        let state = load_state(&store)?;
        info!(
            "Learner state loaded from {} store ({} samples, {} wins)",
            store.name(),
            state.samples,
            state.wins
        );
        Ok(OnlineLearner { store, state })
    }

    pub fn state(&self) -> &LearnerState {
        &self.state
    }

    pub fn predict(&self, game: &Game) -> Prediction {
        predict(game, &self.state)
    }

    pub fn learn(&mut self, game: &Game, actual_winner: &str) -> Result<LearnStep, StoreError> {
        let step = learn(game, actual_winner, &self.state);
        save_state(&self.store, &step.state)?;
        self.state = step.state.clone();
        Ok(step)
    }

    pub fn stats(&self) -> LearnerStats {
        stats(&self.state)
    }

    /// Discard everything learned and persist the defaults.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let fresh = LearnerState::default();
        save_state(&self.store, &fresh)?;
        self.state = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Odds;
    use crate::store::MemoryStore;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn make_game(home_ml: f64, away_ml: f64) -> Game {
        Game {
            id: "g1".into(),
            home_team: "Kansas City Chiefs".into(),
            away_team: "Denver Broncos".into(),
            sport: "nfl".into(),
            league: "NFL".into(),
            odds: Some(Odds {
                home: home_ml,
                away: away_ml,
                spread: None,
                total: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn default_state_matches_documented_weights() {
        let s = LearnerState::default();
        assert_eq!(s.weights.to_array(), [0.4, 0.15, 0.05, 0.1, 0.1, 0.05, 0.15]);
        assert_eq!((s.bias, s.samples, s.wins), (0.0, 0, 0));
    }

    #[test]
    fn predict_is_bounded_and_confidence_equals_probability() {
        let mut state = LearnerState::default();
        state.weights = FeatureWeights::from_array([1.5; FEATURE_COUNT]);
        state.bias = 0.5;
        let p = predict(&make_game(-5000.0, 3000.0), &state);
        assert_relative_eq!(p.probability, MAX_PROBABILITY, epsilon = 1e-12);
        assert_eq!(p.confidence, p.probability);

        state.weights = FeatureWeights::from_array([-1.5; FEATURE_COUNT]);
        state.bias = -0.5;
        let p = predict(&make_game(-5000.0, 3000.0), &state);
        assert_relative_eq!(p.probability, MIN_PROBABILITY, epsilon = 1e-12);
        assert_eq!(p.predicted_side, Side::Away);
        assert_eq!(p.predicted_winner, "Denver Broncos");
    }

    #[test]
    fn predict_favours_moneyline_favourite() {
        let state = LearnerState::default();
        let p = predict(&make_game(-250.0, 200.0), &state);
        assert!(p.probability > 0.55);
        assert_eq!(p.predicted_winner, "Kansas City Chiefs");
    }

    #[test]
    fn learn_counts_wins_only_when_called_correctly() {
        let state = LearnerState::default();
        let game = make_game(-250.0, 200.0);

        let hit = learn(&game, "Kansas City Chiefs", &state);
        assert!(hit.correct);
        assert_eq!((hit.state.samples, hit.state.wins), (1, 1));

        let miss = learn(&game, "Denver Broncos", &hit.state);
        assert!(!miss.correct);
        assert_eq!((miss.state.samples, miss.state.wins), (2, 1));
    }

    #[test]
    fn learn_applies_gradient_step() {
        let state = LearnerState::default();
        let game = make_game(-250.0, 200.0);
        let step = learn(&game, "Kansas City Chiefs", &state);

        let x = step.prediction.features.moneyline_edge;
        let expected = 0.4 + LEARNING_RATE * step.error * x;
        assert_relative_eq!(step.state.weights.moneyline_edge, expected, epsilon = 1e-12);
        assert_relative_eq!(
            step.state.bias,
            LEARNING_RATE * step.error * BIAS_STEP_SCALE,
            epsilon = 1e-12
        );
        assert!(step.error > 0.0);
    }

    #[test]
    fn replaying_an_outcome_changes_state_twice() {
        let game = make_game(-150.0, 130.0);
        let once = learn(&game, "Denver Broncos", &LearnerState::default());
        let twice = learn(&game, "Denver Broncos", &once.state);
        assert_eq!(twice.state.samples, 2);
        assert_ne!(once.state.weights, twice.state.weights);
    }

    #[test]
    fn ten_correct_calls_reinforce_dominant_feature() {
        let game = make_game(-300.0, 240.0);
        let mut state = LearnerState::default();
        let mut last = state.weights.moneyline_edge;
        for _ in 0..10 {
            let step = learn(&game, "Kansas City Chiefs", &state);
            assert!(step.correct);
            assert!(step.state.weights.moneyline_edge > last);
            last = step.state.weights.moneyline_edge;
            state = step.state;
        }
        assert_eq!(state.samples, 10);
        assert_eq!(state.wins, 10);
    }

    #[test]
    fn invariants_hold_under_random_extreme_updates() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = LearnerState::default();
        for _ in 0..2_000 {
            let mut game = make_game(
                rng.gen_range(-100_000.0..-100.0),
                rng.gen_range(100.0..100_000.0),
            );
            if rng.gen_bool(0.5) {
                std::mem::swap(&mut game.home_team, &mut game.away_team);
            }
            game.home_field_advantage = Some(rng.gen_range(-50.0..50.0));
            if let Some(odds) = game.odds.as_mut() {
                odds.spread = Some(rng.gen_range(-1e6..1e6));
            }
            let winner = if rng.gen_bool(0.5) {
                game.home_team.clone()
            } else {
                game.away_team.clone()
            };
            state = learn(&game, &winner, &state).state;

            for w in state.weights.to_array() {
                assert!((-WEIGHT_BOUND..=WEIGHT_BOUND).contains(&w));
            }
            assert!((-BIAS_BOUND..=BIAS_BOUND).contains(&state.bias));
            assert!(state.wins <= state.samples);
        }
        assert_eq!(state.samples, 2_000);
    }

    #[test]
    fn partial_document_merges_with_defaults() {
        let state = LearnerState::from_document(r#"{"weights":{"pace":0.9},"samples":4,"wins":3}"#);
        assert_relative_eq!(state.weights.pace, 0.9);
        assert_relative_eq!(state.weights.moneyline_edge, 0.4);
        assert_eq!((state.samples, state.wins), (4, 3));
        assert_eq!(state.bias, 0.0);
    }

    #[test]
    fn document_keys_are_camel_case() {
        let doc: serde_json::Value =
            serde_json::from_str(&LearnerState::default().to_document().unwrap()).unwrap();
        let mut keys: Vec<&str> = doc["weights"]
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["homeField", "injuries", "moneylineEdge", "pace", "spreadTilt", "turnovers", "weather"]
        );
    }

    #[test]
    fn corrupt_document_falls_back_to_full_defaults() {
        let state = LearnerState::from_document(r#"{"weights":{"pace":0.9},"bias":"oops"}"#);
        assert_eq!(state, LearnerState::default());
        assert_eq!(LearnerState::from_document("not json"), LearnerState::default());
    }

    #[test]
    fn out_of_contract_document_is_clamped() {
        let state = LearnerState::from_document(
            r#"{"weights":{"weather":9.0,"injuries":-9.0},"bias":3.0,"samples":2,"wins":5}"#,
        );
        assert_eq!(state.weights.weather, WEIGHT_BOUND);
        assert_eq!(state.weights.injuries, -WEIGHT_BOUND);
        assert_eq!(state.bias, BIAS_BOUND);
        assert_eq!(state.wins, 2);
    }

    #[test]
    fn stats_reports_accuracy() {
        assert_eq!(stats(&LearnerState::default()).accuracy, 0.0);
        let state = LearnerState { samples: 8, wins: 6, ..Default::default() };
        assert_relative_eq!(stats(&state).accuracy, 0.75);
    }

    #[test]
    fn online_learner_persists_every_update() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let game = make_game(-180.0, 155.0);
        {
            let mut learner = OnlineLearner::open(store.clone()).unwrap();
            learner.learn(&game, "Kansas City Chiefs").unwrap();
            learner.learn(&game, "Denver Broncos").unwrap();
        }
        let reopened = OnlineLearner::open(store.clone()).unwrap();
        assert_eq!(reopened.stats().samples, 2);
        assert_eq!(reopened.stats().wins, 1);
        assert!(reopened.state().updated_at.is_some());
    }

    #[test]
    fn reset_restores_defaults() {
        let store = MemoryStore::new();
        let mut learner = OnlineLearner::open(store).unwrap();
        learner.learn(&make_game(-180.0, 155.0), "Denver Broncos").unwrap();
        learner.reset().unwrap();
        assert_eq!(learner.state(), &LearnerState::default());
    }
}
