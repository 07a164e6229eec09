pub mod features;
pub mod online;

pub use features::FeatureVector;
pub use online::{
    learn, load_state, predict, save_state, stats, FeatureWeights, LearnStep, LearnerState,
    LearnerStats, OnlineLearner, Prediction,
};
