//! Assembles per-dimension context from pluggable lookups.
//!
//! Sources are consulted in registration order. The first source that
//! returns context for a dimension fills it; later sources for the same
//! dimension act as fallbacks and are only called while it is still empty.
//! A failing source never fails the gather: the dimension stays neutral.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::Game;

use super::dimensions::{ChaosFactors, Dimension, DimensionContext, DimensionInputs};

/// Trait that every dimension lookup must implement.
#[async_trait]
pub trait DimensionSource: Send + Sync {
    /// The dimension this source provides context for.
    fn dimension(&self) -> Dimension;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// `Ok(None)` means the source has nothing for this game.
    async fn fetch(&self, game: &Game) -> Result<Option<DimensionContext>>;
}

/// Per-dimension include flags; all dimensions are gathered by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherOptions {
    pub sentiment: bool,
    pub narrative: bool,
    pub information_asymmetry: bool,
    pub chaos: bool,
    pub network: bool,
    pub temporal: bool,
    pub emergent: bool,
}

impl Default for GatherOptions {
    fn default() -> Self {
        GatherOptions {
            sentiment: true,
            narrative: true,
            information_asymmetry: true,
            chaos: true,
            network: true,
            temporal: true,
            emergent: true,
        }
    }
}

impl GatherOptions {
    pub fn includes(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Sentiment => self.sentiment,
            Dimension::Narrative => self.narrative,
            Dimension::InformationAsymmetry => self.information_asymmetry,
            Dimension::Chaos => self.chaos,
            Dimension::Network => self.network,
            Dimension::Temporal => self.temporal,
            Dimension::Emergent => self.emergent,
        }
    }

    pub fn without(mut self, dimension: Dimension) -> Self {
        let flag = match dimension {
            Dimension::Sentiment => &mut self.sentiment,
            Dimension::Narrative => &mut self.narrative,
            Dimension::InformationAsymmetry => &mut self.information_asymmetry,
            Dimension::Chaos => &mut self.chaos,
            Dimension::Network => &mut self.network,
            Dimension::Temporal => &mut self.temporal,
            Dimension::Emergent => &mut self.emergent,
        };
        *flag = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub dimension: Dimension,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct GatherReport {
    pub inputs: DimensionInputs,
    /// Dimensions that received context, in the order they were filled
    pub available: Vec<Dimension>,
    pub failed: Vec<SourceFailure>,
}

#[derive(Clone, Default)]
pub struct DimensionGatherer {
    sources: Vec<Arc<dyn DimensionSource>>,
    options: GatherOptions,
}

impl DimensionGatherer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: GatherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn DimensionSource>) {
        self.sources.push(source);
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub async fn gather(&self, game: &Game) -> GatherReport {
        let mut report = GatherReport::default();

        for source in &self.sources {
            let dimension = source.dimension();
            if !self.options.includes(dimension) || report.inputs.has(dimension) {
                continue;
            }

            match source.fetch(game).await {
                Ok(Some(ctx)) => {
                    if ctx.dimension() != dimension {
                        warn!(
                            "DimensionSource {} declared {} but returned {} context; dropped",
                            source.name(),
                            dimension.label(),
                            ctx.dimension().label()
                        );
                        continue;
                    }
                    if report.inputs.fill(ctx) {
                        debug!(
                            "DimensionSource {}: {} context for {}",
                            source.name(),
                            dimension.label(),
                            game.id
                        );
                        report.available.push(dimension);
                    }
                }
                Ok(None) => {
                    debug!(
                        "DimensionSource {}: no {} context for {}",
                        source.name(),
                        dimension.label(),
                        game.id
                    );
                }
                Err(e) => {
                    warn!(
                        "DimensionSource {} failed for {} ({}): {:#}",
                        source.name(),
                        dimension.label(),
                        game.id,
                        e
                    );
                    report.failed.push(SourceFailure {
                        source: source.name().to_string(),
                        dimension,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        report
    }
}

/// Serves a fixed context, e.g. one loaded from a file.
pub struct StaticSource {
    name: String,
    context: DimensionContext,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, context: DimensionContext) -> Self {
        StaticSource {
            name: name.into(),
            context,
        }
    }
}

#[async_trait]
impl DimensionSource for StaticSource {
    fn dimension(&self) -> Dimension {
        self.context.dimension()
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _game: &Game) -> Result<Option<DimensionContext>> {
        Ok(Some(self.context.clone()))
    }
}

/// Rough chaos factors read off the game record alone: bad weather and
/// divisional games. Register it last so real chaos feeds take priority.
pub struct GameRecordChaosSource;

const ROUGH_WEATHER: [&str; 3] = ["rain", "snow", "wind"];

#[async_trait]
impl DimensionSource for GameRecordChaosSource {
    fn dimension(&self) -> Dimension {
        Dimension::Chaos
    }

    fn name(&self) -> &str {
        "game-record-chaos"
    }

    async fn fetch(&self, game: &Game) -> Result<Option<DimensionContext>> {
        let rough_weather = game
            .weather
            .as_ref()
            .and_then(|w| w.conditions.as_deref())
            .map(|c| {
                let c = c.to_lowercase();
                ROUGH_WEATHER.iter().any(|k| c.contains(k))
            })
            .unwrap_or(false);
        let divisional = game.league.to_lowercase().contains("division");

        Ok(Some(DimensionContext::Chaos(ChaosFactors {
            division_rivalry: divisional,
            weather_severity: if rough_weather { 1.0 } else { 0.0 },
            ..Default::default()
        })))
    }
}
