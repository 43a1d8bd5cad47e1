//! chainwatch daemon: entry point for running the chain health monitor.

use std::path::PathBuf;

use anyhow::Context;
use chainwatch_monitor::{init_logging, Monitor, MonitorConfig, ShutdownController};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chainwatch", about = "Tendermint chain health monitor")]
struct Cli {
    /// WebSocket endpoints (comma-separated: "wss://a/websocket,wss://b/websocket").
    #[arg(long, env = "ENDPOINTS", value_delimiter = ',')]
    endpoints: Vec<String>,

    /// Operator addresses of validators to watch (comma-separated).
    #[arg(long, env = "VALIDATORS_WATCHLIST", value_delimiter = ',')]
    validators_watchlist: Vec<String>,

    /// Enabled events: other, chain, block_speed, validator_set, signatures.
    #[arg(long, env = "EVENTS_WATCHLIST", value_delimiter = ',')]
    events: Vec<String>,

    /// Allowed deviation (ms) from the average block time.
    #[arg(long, env = "BLOCK_SPEED_THRESHOLD")]
    block_speed_threshold: Option<u64>,

    /// Report block speed every this many blocks.
    #[arg(long, env = "BLOCK_SPEED_INFO_INTERVAL")]
    block_speed_info_interval: Option<u64>,

    /// Slack webhook used for every severity without its own webhook.
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    slack_webhook_url: Option<String>,

    #[arg(long, env = "SLACK_INFO", hide_env_values = true)]
    slack_info: Option<String>,

    #[arg(long, env = "SLACK_WARN", hide_env_values = true)]
    slack_warn: Option<String>,

    #[arg(long, env = "SLACK_CRITICAL", hide_env_values = true)]
    slack_critical: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Overlay every non-empty flag or env value on top of `base`.
    fn merge_into(self, base: MonitorConfig) -> MonitorConfig {
        let mut config = base;
        if let Some(endpoints) = non_empty_list(self.endpoints) {
            config.endpoints = endpoints;
        }
        if let Some(watchlist) = non_empty_list(self.validators_watchlist) {
            config.validators_watchlist = watchlist;
        }
        if let Some(events) = non_empty_list(self.events) {
            config.events = events;
        }
        if let Some(threshold) = self.block_speed_threshold {
            config.block_speed_threshold_ms = threshold;
        }
        if let Some(interval) = self.block_speed_info_interval {
            config.block_speed_info_interval = interval;
        }
        let slack = &mut config.slack;
        for (target, value) in [
            (&mut slack.webhook_url, self.slack_webhook_url),
            (&mut slack.info, self.slack_info),
            (&mut slack.warn, self.slack_warn),
            (&mut slack.critical, self.slack_critical),
        ] {
            if let Some(url) = non_empty(value) {
                *target = Some(url);
            }
        }
        if let Some(level) = non_empty(self.log_level) {
            config.log_level = level;
        }
        if let Some(format) = non_empty(self.log_format) {
            config.log_format = format;
        }
        config
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty_list(values: Vec<String>) -> Option<Vec<String>> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    (!values.is_empty()).then_some(values)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let base = match cli.config.take() {
        Some(path) => MonitorConfig::from_toml_file(&path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    let config = cli.merge_into(base);

    init_logging(config.log_format()?, &config.log_level)?;
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let monitor = Monitor::new(&config)?;
    let shutdown = ShutdownController::new();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    tracing::info!("chainwatch started");
    monitor.run(&shutdown).await?;
    tracing::info!("chainwatch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["chainwatch"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn flags_build_a_valid_config() {
        let config = parse(&[
            "--endpoints",
            "wss://a/websocket,wss://b/websocket",
            "--events",
            "chain,block_speed",
            "--block-speed-threshold",
            "1500",
        ])
        .merge_into(MonitorConfig::default());
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.block_speed_threshold_ms, 1500);
        assert_eq!(config.block_speed_info_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_file_values() {
        let base = MonitorConfig {
            endpoints: vec!["wss://file/websocket".into()],
            events: vec!["signatures".into()],
            block_speed_info_interval: 50,
            ..Default::default()
        };
        let config = parse(&["--events", "validator_set", "--slack-critical", "https://hooks/c"])
            .merge_into(base);
        assert_eq!(config.endpoints, vec!["wss://file/websocket".to_string()]);
        assert_eq!(config.events, vec!["validator_set".to_string()]);
        assert_eq!(config.block_speed_info_interval, 50);
        assert_eq!(config.slack.critical.as_deref(), Some("https://hooks/c"));
        assert!(config.slack.webhook_url.is_none());
    }

    #[test]
    fn blank_list_entries_are_ignored() {
        let config = parse(&["--validators-watchlist", " ,"]).merge_into(MonitorConfig {
            validators_watchlist: vec!["valoper1".into()],
            ..Default::default()
        });
        assert_eq!(config.validators_watchlist, vec!["valoper1".to_string()]);
    }
}
