//! resonance - networked spatial audio client engine
//!
//! Headless client shell: loads configuration, builds a session and
//! optionally replays a recorded event log. Live transport plugs in where
//! the replay feed sits.

mod config;
mod replay;

use anyhow::Result;
use config::ClientConfig;
use resonance_client::Session;
use std::{env, path::PathBuf, process};
use tracing::info;

struct CliOptions {
    config_path: Option<PathBuf>,
    replay_path: Option<PathBuf>,
    settle_ms: u64,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut options = CliOptions {
            config_path: None,
            replay_path: None,
            settle_ms: 1_000,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args.next().ok_or("--config requires a path")?;
                    options.config_path = Some(PathBuf::from(value));
                }
                "--replay" => {
                    let value = args.next().ok_or("--replay requires a path")?;
                    options.replay_path = Some(PathBuf::from(value));
                }
                "--settle-ms" => {
                    let value = args.next().ok_or("--settle-ms requires a value")?;
                    options.settle_ms = value
                        .parse()
                        .map_err(|_| "--settle-ms expects milliseconds")?;
                }
                other => return Err(format!("Unknown option: {other}")),
            }
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting resonance v{}", env!("CARGO_PKG_VERSION"));

    let cli = match CliOptions::parse(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Usage: resonance [--config <path>] [--replay <events.jsonl>] [--settle-ms <ms>]");
            process::exit(2);
        }
    };

    let config = match &cli.config_path {
        Some(path) => ClientConfig::load_from_path(path),
        None => ClientConfig::load(),
    };

    let mut session = Session::new();
    session.media_mut().set_master_volume(config.master_volume);

    match &cli.replay_path {
        Some(path) => {
            let summary = replay::run(&mut session, path, cli.settle_ms)?;
            info!(
                "session state after replay: {} channel(s), {} speaker(s)",
                summary.live_channels, summary.live_speakers
            );
        }
        None => {
            info!("no replay log given; nothing to drive the session, exiting");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_paths() {
        let cli = CliOptions::parse(
            ["--config", "a.toml", "--replay", "b.jsonl", "--settle-ms", "250"]
                .into_iter()
                .map(String::from),
        )
        .expect("valid options");
        assert_eq!(cli.config_path, Some(PathBuf::from("a.toml")));
        assert_eq!(cli.replay_path, Some(PathBuf::from("b.jsonl")));
        assert_eq!(cli.settle_ms, 250);
    }

    #[test]
    fn cli_rejects_unknown_options() {
        assert!(CliOptions::parse(["--frobnicate"].into_iter().map(String::from)).is_err());
    }
}
