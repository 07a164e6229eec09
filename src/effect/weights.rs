use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Weights of the five additive dimensions for one competition category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub sentiment: f64,
    pub narrative: f64,
    pub information_asymmetry: f64,
    pub network_influence: f64,
    pub emergent_pattern: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            sentiment: 0.15,
            narrative: 0.12,
            information_asymmetry: 0.20,
            network_influence: 0.13,
            emergent_pattern: 0.20,
        }
    }
}

impl CategoryWeights {
    pub fn for_category(category: Category) -> Self {
        match category {
            // Market signals and situational patterns dominate
            Category::Nfl => CategoryWeights {
                sentiment: 0.10,
                narrative: 0.10,
                information_asymmetry: 0.28,
                network_influence: 0.10,
                emergent_pattern: 0.25,
            },
            // Momentum and storylines dominate
            Category::Nhl => CategoryWeights {
                sentiment: 0.14,
                narrative: 0.25,
                information_asymmetry: 0.12,
                network_influence: 0.14,
                emergent_pattern: 0.10,
            },
            Category::Nba => CategoryWeights {
                sentiment: 0.18,
                narrative: 0.14,
                information_asymmetry: 0.18,
                network_influence: 0.15,
                emergent_pattern: 0.15,
            },
            Category::Mlb => CategoryWeights {
                sentiment: 0.12,
                narrative: 0.10,
                information_asymmetry: 0.22,
                network_influence: 0.08,
                emergent_pattern: 0.18,
            },
            Category::Ncaaf => CategoryWeights {
                sentiment: 0.14,
                narrative: 0.18,
                information_asymmetry: 0.16,
                network_influence: 0.12,
                emergent_pattern: 0.14,
            },
            Category::Ncaab => CategoryWeights {
                sentiment: 0.15,
                narrative: 0.18,
                information_asymmetry: 0.15,
                network_influence: 0.12,
                emergent_pattern: 0.12,
            },
            Category::Other => CategoryWeights::default(),
        }
    }

    /// Layer a partial override on top of these weights. Non-finite override
    /// values are ignored.
    pub fn with_overrides(mut self, overrides: &WeightOverrides) -> Self {
        fn apply(slot: &mut f64, value: Option<f64>) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *slot = v;
            }
        }
        apply(&mut self.sentiment, overrides.sentiment);
        apply(&mut self.narrative, overrides.narrative);
        apply(&mut self.information_asymmetry, overrides.information_asymmetry);
        apply(&mut self.network_influence, overrides.network_influence);
        apply(&mut self.emergent_pattern, overrides.emergent_pattern);
        self
    }

    pub fn total(&self) -> f64 {
        self.sentiment
            + self.narrative
            + self.information_asymmetry
            + self.network_influence
            + self.emergent_pattern
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOverrides {
    pub sentiment: Option<f64>,
    pub narrative: Option<f64>,
    pub information_asymmetry: Option<f64>,
    pub network_influence: Option<f64>,
    pub emergent_pattern: Option<f64>,
}
