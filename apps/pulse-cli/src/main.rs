use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use pulse_aggregator::StatsService;
use pulse_ops::init_tracing;
use pulse_store::{InMemoryStore, StoreHistoryRepository};
use pulse_telemetry::HttpTelemetrySource;
use pulse_types::config::{PulseConfig, TELEMETRY_URL_ENV};
use serde::Serialize;
use tracing::{info, warn};

/// Game operations dashboard stats, printed as JSON.
#[derive(Debug, Parser)]
#[command(name = "pulse", version)]
struct Cli {
    /// Path to a TOML config file. Falls back to `PULSE_CONFIG`.
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Live counters merged with peak history and totals.
    Stats,
    /// Win-rate balance over recent matches.
    Balance,
    /// Top players by points and by games played.
    Players,
    /// DAU, WAU and new users for today.
    Activity,
    /// Player feedback, newest first.
    Feedback {
        /// Maximum number of entries; omit for all of them.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config);
    init_tracing(&config.ops)?;

    if let Command::Feedback { limit: Some(limit) } = cli.command {
        config.history.feedback_limit = Some(usize::try_from(limit)?);
    }

    let store = match &config.store.seed_path {
        Some(path) => InMemoryStore::from_seed_file(path)?,
        None => {
            warn!("No store.seed_path configured; serving an empty document store");
            InMemoryStore::new()
        }
    };
    let telemetry = HttpTelemetrySource::new(&config.telemetry)?;
    info!("Telemetry source: {}", telemetry.stats_url());

    let service = StatsService::new(
        telemetry,
        StoreHistoryRepository::new(store),
        config.history.clone(),
        &config.activity,
    )?;

    match cli.command {
        Command::Stats => print_json(&service.aggregated_stats().await?),
        Command::Balance => print_json(&service.balance_analytics().await?),
        Command::Players => print_json(&service.player_analytics().await?),
        Command::Activity => print_json(&service.activity_analytics().await?),
        Command::Feedback { .. } => print_json(&service.feedback().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(from_args: Option<PathBuf>) -> PulseConfig {
    let path = from_args.or_else(|| env::var("PULSE_CONFIG").ok().map(PathBuf::from));
    resolve_config(path, env::var(TELEMETRY_URL_ENV).ok())
}

/// Loads `path` (or the defaults) and applies the telemetry URL override. An
/// invalid result falls back to the defaults, which keep the override when it
/// is itself valid.
fn resolve_config(path: Option<PathBuf>, telemetry_url: Option<String>) -> PulseConfig {
    let mut config = match path {
        Some(path) => match PulseConfig::from_file(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!(
                    "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                PulseConfig::default()
            }
        },
        None => PulseConfig::default(),
    };
    config.override_telemetry_url(telemetry_url.clone());

    if let Err(err) = config.validate() {
        eprintln!("Invalid config: {err}. Falling back to internal defaults.");
        let mut fallback = PulseConfig::default();
        fallback.override_telemetry_url(telemetry_url);
        if let Err(err) = fallback.validate() {
            eprintln!("Ignoring {TELEMETRY_URL_ENV}: {err}");
            return PulseConfig::default();
        }
        return fallback;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_feedback_limit() {
        let cli = Cli::try_parse_from(["pulse", "--config", "pulse.toml", "feedback", "--limit", "5"])
            .expect("parse args");
        assert_eq!(cli.config, Some(PathBuf::from("pulse.toml")));
        assert!(matches!(cli.command, Command::Feedback { limit: Some(5) }));
    }

    #[test]
    fn zero_feedback_limit_is_rejected() {
        let err = Cli::try_parse_from(["pulse", "feedback", "--limit", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let cli = Cli::try_parse_from(["pulse", "feedback"]).expect("parse args");
        assert!(matches!(cli.command, Command::Feedback { limit: None }));
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let config = resolve_config(Some(PathBuf::from("/nonexistent/pulse.toml")), None);
        assert_eq!(config.history.match_sample_limit, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_fallback_keeps_telemetry_url_override() {
        let path = std::env::temp_dir().join("pulse-cli-invalid-config.toml");
        std::fs::write(&path, "[telemetry]\ntimeout_ms = 0\n").expect("write config");

        let config = resolve_config(Some(path.clone()), Some("http://game-server:3000".into()));
        assert_eq!(config.telemetry.base_url, "http://game-server:3000");
        assert_eq!(config.telemetry.timeout_ms, 3_000);

        let config = resolve_config(Some(path.clone()), Some("not-a-url".into()));
        assert_eq!(config, PulseConfig::default());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn telemetry_url_override_applies_to_loaded_config() {
        let config = resolve_config(None, Some(" http://localhost:3001 ".into()));
        assert_eq!(config.telemetry.base_url, "http://localhost:3001");
    }
}
