//! Tracing setup
//!
//! Text mode writes to a rolling file and to stdout. JSON mode writes the
//! file only. `RUST_LOG`, when set, replaces the configured filter entirely.

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{AppConfig, LogRotation};

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Filter used when `RUST_LOG` is unset: the configured level, sqlx
/// statement logs capped at warn, then any extra directives from config.
pub fn filter_directives(config: &AppConfig) -> String {
    [config.log_level.as_str(), "sqlx=warn"]
        .into_iter()
        .chain(config.log_filters.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(",")
}

fn file_appender(config: &AppConfig) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(config.log_file.as_str())
        .build(&config.log_dir)
        .with_context(|| format!("Failed to open log file in {}", config.log_dir))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process: dropping it
/// flushes and stops the background writer.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(config)?);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config))
            .context("Invalid log_level or log_filters")?,
    };

    let json_file = config.use_json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer.clone())
            .with_ansi(false)
    });
    let text_file = (!config.use_json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(writer.clone())
            .with_ansi(false)
    });
    let stdout = (!config.use_json).then(|| fmt::layer().with_target(false).with_ansi(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_file)
        .with(text_file)
        .with(stdout)
        .try_init()
        .context("Global tracing subscriber already installed")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> AppConfig {
        let yaml = format!(
            "log_level: info\nlog_dir: ./logs\nlog_file: transfer.log\nuse_json: false\n\
             gateway:\n  host: 127.0.0.1\n  port: 8080\n{extra}"
        );
        AppConfig::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(&config("")), "info,sqlx=warn");

        let config = config("log_filters: [\"transfer_service::gateway=debug\", \"hyper=warn\"]\n");
        let directives = filter_directives(&config);
        assert_eq!(directives, "info,sqlx=warn,transfer_service::gateway=debug,hyper=warn");
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn test_rotation_mapping() {
        assert_eq!(Rotation::from(LogRotation::Hourly), Rotation::HOURLY);
        assert_eq!(Rotation::from(LogRotation::Daily), Rotation::DAILY);
        assert_eq!(Rotation::from(LogRotation::Never), Rotation::NEVER);
        assert_eq!(Rotation::from(config("").rotation), Rotation::DAILY);
    }

    #[test]
    fn test_file_appender_creates_log_dir() {
        let dir = std::env::temp_dir().join(format!("transfer-logs-{}", ulid::Ulid::new()));
        let mut config = config("rotation: never\n");
        config.log_dir = dir.to_string_lossy().into_owned();

        assert!(file_appender(&config).is_ok());
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
