use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::effect::Dimension;
use crate::store::Backend;

/// Prediction adjustment engine: online learner, seven-dimension effect
/// engine and listing matcher
#[derive(Parser, Debug, Clone)]
#[command(name = "prediction-engine", version, about)]
pub struct Config {
    /// Where the learner state is persisted
    #[arg(long, env = "STATE_BACKEND", value_enum, default_value = "file")]
    pub state_backend: Backend,

    /// State directory (file backend) or database path (sqlite backend)
    #[arg(long, env = "STATE_PATH", default_value = ".progno")]
    pub state_path: PathBuf,

    /// Fractional Kelly multiplier applied to stake sizing (0.0–1.0)
    #[arg(long, env = "KELLY_FRACTION", default_value = "0.25")]
    pub kelly_fraction: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Predict a game and adjust the estimate with the effect engine
    Predict {
        /// Game record (JSON)
        game: PathBuf,

        /// Dimension context (JSON array of tagged dimension entries)
        #[arg(long)]
        context: Option<PathBuf>,

        /// Market price of the predicted winner (0.0–1.0) for stake sizing
        #[arg(long)]
        market_price: Option<f64>,

        /// Partial overrides of the additive dimension weights (JSON)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Fall back to a chaos estimate read off the game record
        #[arg(long, default_value = "false")]
        estimate_chaos: bool,

        /// Dimensions to leave neutral (repeatable)
        #[arg(long = "skip", value_enum)]
        skip: Vec<Dimension>,
    },

    /// Learn from a finished game
    Learn {
        /// Game record (JSON)
        game: PathBuf,

        /// Name of the team that won
        #[arg(long)]
        winner: String,
    },

    /// Show learner weights and accuracy
    Stats,

    /// Match a team pair against listing titles
    Match {
        #[arg(long)]
        home: String,

        #[arg(long)]
        away: String,

        /// Listing title (repeatable)
        #[arg(long = "text", required = true)]
        texts: Vec<String>,
    },

    /// Reset the learner to its default weights
    Reset,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.kelly_fraction) {
            anyhow::bail!("kelly_fraction must be between 0.0 and 1.0");
        }
        if self.state_path.as_os_str().is_empty() {
            anyhow::bail!("state_path must not be empty");
        }
        if let Command::Predict {
            market_price: Some(price),
            ..
        } = &self.command
        {
            if !(*price > 0.0 && *price < 1.0) {
                anyhow::bail!("market_price must be strictly between 0.0 and 1.0");
            }
        }
        if let Command::Learn { winner, .. } = &self.command {
            if winner.trim().is_empty() {
                anyhow::bail!("winner must not be empty");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("prediction-engine").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["stats"]);
        assert_eq!(config.state_backend, Backend::File);
        assert_eq!(config.state_path, PathBuf::from(".progno"));
        assert!((config.kelly_fraction - 0.25).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn predict_flags() {
        let config = parse(&[
            "--state-backend",
            "sqlite",
            "predict",
            "game.json",
            "--market-price",
            "0.45",
            "--skip",
            "sentiment",
            "--skip",
            "information-asymmetry",
            "--estimate-chaos",
        ]);
        assert_eq!(config.state_backend, Backend::Sqlite);
        match config.command {
            Command::Predict {
                market_price,
                skip,
                estimate_chaos,
                ..
            } => {
                assert_eq!(market_price, Some(0.45));
                assert_eq!(skip, vec![Dimension::Sentiment, Dimension::InformationAsymmetry]);
                assert!(estimate_chaos);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_kelly_fraction() {
        let config = parse(&["--kelly-fraction", "1.5", "stats"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_market_price() {
        let config = parse(&["predict", "game.json", "--market-price", "1.0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn match_requires_text() {
        let result = Config::try_parse_from([
            "prediction-engine",
            "match",
            "--home",
            "Lakers",
            "--away",
            "Celtics",
        ]);
        assert!(result.is_err());
    }
}
