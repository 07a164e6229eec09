use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use prediction_engine::config::{Command, Config};
use prediction_engine::effect::{
    DimensionContext, DimensionGatherer, EffectEngine, GameRecordChaosSource, GatherOptions,
    StaticSource, WeightOverrides,
};
use prediction_engine::learner::OnlineLearner;
use prediction_engine::matching::{Listing, ListingIndex, TeamPair};
use prediction_engine::models::Game;
use prediction_engine::pipeline::Pipeline;
use prediction_engine::store::open_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    match config.command.clone() {
        Command::Predict {
            game,
            context,
            market_price,
            weights,
            estimate_chaos,
            skip,
        } => {
            let game: Game = read_json(&game)?;
            let learner = open_learner(&config)?;

            let engine = match weights {
                Some(path) => EffectEngine::with_overrides(read_json::<WeightOverrides>(&path)?),
                None => EffectEngine::new(),
            };

            let options = skip
                .iter()
                .fold(GatherOptions::default(), |opts, d| opts.without(*d));
            let mut gatherer = DimensionGatherer::new().with_options(options);
            if let Some(path) = context {
                let entries: Vec<DimensionContext> = read_json(&path)?;
                for ctx in entries {
                    let name = format!("{} ({})", path.display(), ctx.dimension().label());
                    gatherer.add_source(Arc::new(StaticSource::new(name, ctx)));
                }
            }
            if estimate_chaos {
                gatherer.add_source(Arc::new(GameRecordChaosSource));
            }
            info!("Configured {} dimension source(s)", gatherer.source_count());

            let pipeline = Pipeline::new(engine, gatherer);
            let evaluation = pipeline.evaluate(&game, learner.state()).await;
            let stake = market_price.map(|price| evaluation.stake(price, config.kelly_fraction));

            print_json(&json!({
                "evaluation": evaluation,
                "stake": stake,
            }))?;
        }

        Command::Learn { game, winner } => {
            let game: Game = read_json(&game)?;
            if game.side_of(&winner).is_none() {
                anyhow::bail!(
                    "winner {:?} is neither {:?} nor {:?}",
                    winner,
                    game.home_team,
                    game.away_team
                );
            }
            let mut learner = open_learner(&config)?;
            let step = learner.learn(&game, &winner)?;
            info!(
                "Learned from {}: predicted {}, actual {} ({})",
                game.id,
                step.prediction.predicted_winner,
                winner,
                if step.correct { "correct" } else { "wrong" }
            );
            print_json(&json!({
                "prediction": step.prediction,
                "error": step.error,
                "correct": step.correct,
                "stats": learner.stats(),
            }))?;
        }

        Command::Stats => {
            let learner = open_learner(&config)?;
            print_json(&learner.stats())?;
        }

        Command::Match { home, away, texts } => {
            let pair = TeamPair::new(home, away);
            let mut index = ListingIndex::new();
            index.load(
                texts
                    .into_iter()
                    .enumerate()
                    .map(|(i, title)| Listing {
                        id: format!("listing-{}", i + 1),
                        title,
                    })
                    .collect(),
            );
            let best = index.best_match(&pair);
            print_json(&json!({
                "pair": pair,
                "listing": best.as_ref().map(|b| b.listing),
                "result": best.as_ref().map(|b| b.result),
            }))?;
        }

        Command::Reset => {
            let mut learner = open_learner(&config)?;
            learner.reset()?;
            info!("Learner state reset to defaults");
            print_json(&learner.stats())?;
        }
    }

    Ok(())
}

fn open_learner(
    config: &Config,
) -> Result<OnlineLearner<Box<dyn prediction_engine::store::StateStore>>> {
    let store = open_store(config.state_backend, &config.state_path).with_context(|| {
        format!(
            "opening {:?} state store at {}",
            config.state_backend,
            config.state_path.display()
        )
    })?;
    Ok(OnlineLearner::open(store)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
