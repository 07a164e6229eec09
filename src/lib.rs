//! Prediction adjustment engine.
//!
//! A linear online learner produces a base win probability for a
//! head-to-head game; a seven-dimension effect engine adjusts that estimate
//! and its confidence and recommends a stake size; a fuzzy matcher locates
//! the game among loosely formatted market listings.

pub mod config;
pub mod effect;
pub mod learner;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod sizing;
pub mod store;
