//! CLI argument definitions using clap.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pose Ingest - per-camera pose frame reconciliation pipeline
#[derive(Parser, Debug)]
#[command(
    name = "pose-ingest",
    author,
    version,
    about = "Pose frame drift reconciliation pipeline",
    long_about = "Reads raw per-camera pose detection output from disk, corrects frame \n\
                  count drift window by window, assigns deterministic timestamps, and \n\
                  persists the reconciled segments."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "POSE_INGEST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "POSE_INGEST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciliation pipeline over a time range
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "POSE_INGEST_CONFIG"
    )]
    pub config: PathBuf,

    /// Start of the processed range (RFC 3339, e.g. 2024-03-15T10:00:00Z)
    #[arg(long, env = "POSE_INGEST_START")]
    pub start: DateTime<Utc>,

    /// End of the processed range, exclusive (RFC 3339)
    #[arg(long, env = "POSE_INGEST_END")]
    pub end: DateTime<Utc>,

    /// Override the configured camera list (comma-separated)
    #[arg(long, value_delimiter = ',', env = "POSE_INGEST_CAMERAS")]
    pub cameras: Vec<String>,

    /// Processing-run identifier; generated when omitted
    #[arg(long, env = "POSE_INGEST_RUN_ID")]
    pub run_id: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "POSE_INGEST_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the discovery glob pattern for each camera
    #[arg(long)]
    pub patterns: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_maps_to_observability() {
        assert_eq!(
            observability::LogFormat::from(LogFormat::Json),
            observability::LogFormat::Json
        );
        assert_eq!(
            observability::LogFormat::from(LogFormat::default()),
            observability::LogFormat::Pretty
        );
        assert_eq!(
            observability::LogFormat::from(LogFormat::Compact),
            observability::LogFormat::Compact
        );
    }
}
