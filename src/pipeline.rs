//! End-to-end evaluation of one game: learner prediction, dimension
//! gathering, then the effect engine on top of the learner's estimate.

use serde::Serialize;
use tracing::info;

use crate::effect::gather::SourceFailure;
use crate::effect::{
    Dimension, DimensionGatherer, DimensionInputs, EffectEngine, EffectResult, EventMeta,
};
use crate::learner::{predict, LearnerState, Prediction};
use crate::models::{Game, Side};
use crate::sizing::{recommended_stake, StakeAdvice};

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub game_id: String,
    pub prediction: Prediction,
    pub effect: EffectResult,
    /// Winner after adjustment: home iff the adjusted probability is ≥ 0.5
    pub final_winner: String,
    pub final_side: Side,
    /// Dimensions that received context
    pub gathered: Vec<Dimension>,
    /// Sources that errored; their dimensions stayed neutral
    pub failed: Vec<SourceFailure>,
}

impl Evaluation {
    /// Adjusted probability that `final_side` wins.
    pub fn winner_probability(&self) -> f64 {
        match self.final_side {
            Side::Home => self.effect.adjusted_probability,
            Side::Away => 1.0 - self.effect.adjusted_probability,
        }
    }

    /// Stake advice for backing the final winner at `market_price`.
    pub fn stake(&self, market_price: f64, kelly_fraction: f64) -> StakeAdvice {
        recommended_stake(
            self.effect.recommendation,
            self.winner_probability(),
            market_price,
            kelly_fraction,
        )
    }
}

#[derive(Clone, Default)]
pub struct Pipeline {
    engine: EffectEngine,
    gatherer: DimensionGatherer,
}

impl Pipeline {
    pub fn new(engine: EffectEngine, gatherer: DimensionGatherer) -> Self {
        Pipeline { engine, gatherer }
    }

    /// Gather every dimension from the registered sources, then evaluate.
    pub async fn evaluate(&self, game: &Game, state: &LearnerState) -> Evaluation {
        let report = self.gatherer.gather(game).await;
        let mut evaluation = self.evaluate_with_inputs(game, state, &report.inputs);
        evaluation.gathered = report.available;
        evaluation.failed = report.failed;
        evaluation
    }

    /// Evaluate with dimension context already in hand.
    pub fn evaluate_with_inputs(
        &self,
        game: &Game,
        state: &LearnerState,
        inputs: &DimensionInputs,
    ) -> Evaluation {
        let prediction = predict(game, state);
        let meta = EventMeta::from_game(game);
        let effect = self
            .engine
            .calculate(prediction.probability, prediction.confidence, &meta, inputs);

        let final_side = if effect.adjusted_probability >= 0.5 {
            Side::Home
        } else {
            Side::Away
        };
        let final_winner = game.team(final_side).to_string();

        info!(
            "{} vs {}: learner {} ({:.1}%) → {} ({:.1}%, conf {:.1}%) [{}]",
            game.home_team,
            game.away_team,
            prediction.predicted_winner,
            prediction.probability * 100.0,
            final_winner,
            effect.adjusted_probability * 100.0,
            effect.adjusted_confidence * 100.0,
            effect.recommendation
        );

        let gathered = Dimension::ALL
            .into_iter()
            .filter(|d| inputs.has(*d))
            .collect();

        Evaluation {
            game_id: game.id.clone(),
            prediction,
            effect,
            final_winner,
            final_side,
            gathered,
            failed: Vec::new(),
        }
    }
}
