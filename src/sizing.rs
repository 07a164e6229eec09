//! Bankroll sizing for an adjusted prediction.
//!
//! The Kelly fraction
//!
//!   f* = (b·p − q) / b
//!
//! with b = net odds per unit staked ((1/price) − 1), p the adjusted win
//! probability and q = 1 − p, is scaled by a fractional-Kelly multiplier and
//! then by the engine's discrete recommendation.

use serde::Serialize;

use crate::effect::StakeSize;

/// Share of the Kelly stake each recommendation allows.
pub fn stake_multiplier(size: StakeSize) -> f64 {
    match size {
        StakeSize::Avoid => 0.0,
        StakeSize::Small => 0.25,
        StakeSize::Medium => 0.5,
        StakeSize::Large => 1.0,
    }
}

/// Net winnings per unit staked on a binary contract bought at `price`.
fn net_odds(price: f64) -> Option<f64> {
    (price > 0.0 && price < 1.0).then(|| (1.0 - price) / price)
}

/// Fraction of bankroll to stake, in [0, 1]. Returns `0.0` when there is
/// no edge or any input is outside its range.
pub fn kelly_stake(win_prob: f64, market_price: f64, kelly_fraction: f64) -> f64 {
    let in_unit = |x: f64| (0.0..=1.0).contains(&x);
    if !in_unit(win_prob) || !in_unit(kelly_fraction) {
        return 0.0;
    }
    let Some(b) = net_odds(market_price) else {
        return 0.0;
    };

    // Same as (b·p − q)/b
    let full = win_prob - (1.0 - win_prob) / b;
    (full.max(0.0) * kelly_fraction).min(1.0)
}

/// Expected return per unit staked: win_prob / market_price − 1.
pub fn edge(win_prob: f64, market_price: f64) -> f64 {
    match net_odds(market_price) {
        Some(_) if win_prob.is_finite() => win_prob / market_price - 1.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StakeAdvice {
    pub edge: f64,
    /// Fractional Kelly before the recommendation is applied
    pub kelly: f64,
    /// Bankroll fraction to commit
    pub stake_fraction: f64,
}

/// Kelly stake on the side priced at `market_price`, scaled by `size`.
pub fn recommended_stake(
    size: StakeSize,
    win_prob: f64,
    market_price: f64,
    kelly_fraction: f64,
) -> StakeAdvice {
    let kelly = kelly_stake(win_prob, market_price, kelly_fraction);
    StakeAdvice {
        edge: edge(win_prob, market_price),
        kelly,
        stake_fraction: kelly * stake_multiplier(size),
    }
}
