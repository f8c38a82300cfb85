//! Log level selection and subscriber setup for the command line tool.
//!
//! The library only emits `tracing` events. Output goes to stderr so stdout carries nothing but
//! the rendered filter.

use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable read when no level is given on the command line.
pub const LOG_ENV: &str = "LUCENE_FILTER_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown log level '{0}', expected one of: trace, debug, info, warn, error")]
pub struct UnknownLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// The explicit level if there is one, else the environment, else the default.
    pub fn resolve(explicit: Option<LogLevel>) -> Result<LogLevel, UnknownLevel> {
        match explicit {
            Some(level) => Ok(level),
            None => match env::var(LOG_ENV) {
                Ok(value) => value.parse(),
                Err(_) => Ok(LogLevel::default()),
            },
        }
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_filter_str())
}

/// Installs a stderr subscriber. A subscriber that is already set wins.
pub fn init_logging(level: LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn parses_levels(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_level() {
        let error = "loud".parse::<LogLevel>().unwrap_err();
        assert_eq!(error, UnknownLevel("loud".to_string()));
        assert!(error.to_string().starts_with("unknown log level 'loud'"));
    }

    #[test]
    fn explicit_level_wins() {
        assert_eq!(LogLevel::resolve(Some(LogLevel::Trace)), Ok(LogLevel::Trace));
    }

    #[test]
    fn filter_uses_level() {
        assert_eq!(filter_for(LogLevel::Debug).to_string(), "debug");
        assert_eq!(LogLevel::default().to_string(), "warn");
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LogLevel::Warn);
        init_logging(LogLevel::Debug);
    }
}
