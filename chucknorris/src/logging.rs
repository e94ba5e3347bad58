//! Log output for the provider process
//!
//! Terraform reads provider logs from stderr and selects their verbosity with
//! `TF_LOG_PROVIDER` (falling back to `TF_LOG`).

use std::fmt;
use tracing::Level;

/// Log level accepted in `TF_LOG`/`TF_LOG_PROVIDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Parse a Terraform log level, case-insensitively. `JSON` is Terraform's
    /// structured trace mode and maps to `Trace`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            "OFF" => Some(LogLevel::Off),
            _ => None,
        }
    }

    /// Pick the level from the provider-specific variable first, then the
    /// global one; unknown or missing values fall back to `Info`.
    pub fn resolve(provider: Option<&str>, global: Option<&str>) -> Self {
        provider
            .and_then(Self::parse)
            .or_else(|| global.and_then(Self::parse))
            .unwrap_or(LogLevel::Info)
    }

    pub fn from_env() -> Self {
        let provider = std::env::var("TF_LOG_PROVIDER").ok();
        let global = std::env::var("TF_LOG").ok();
        Self::resolve(provider.as_deref(), global.as_deref())
    }

    pub fn as_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Trace => Some(Level::TRACE),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Off => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        };
        f.write_str(name)
    }
}

/// Install the global stderr subscriber at the level from the environment.
///
/// Returns false when logging is off or a subscriber is already installed.
pub fn init() -> bool {
    init_with_level(LogLevel::from_env())
}

pub fn init_with_level(level: LogLevel) -> bool {
    let Some(max_level) = level.as_tracing_level() else {
        return false;
    };

    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_accepts_terraform_levels() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("JSON"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse(" Warn "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::parse(""), None);
    }

    #[test]
    fn provider_variable_wins_over_global() {
        assert_eq!(
            LogLevel::resolve(Some("debug"), Some("error")),
            LogLevel::Debug
        );
        assert_eq!(LogLevel::resolve(Some("bogus"), Some("error")), LogLevel::Error);
        assert_eq!(LogLevel::resolve(None, None), LogLevel::Info);
    }

    #[test]
    #[serial]
    fn from_env_reads_tf_log() {
        std::env::remove_var("TF_LOG_PROVIDER");
        std::env::set_var("TF_LOG", "WARN");

        assert_eq!(LogLevel::from_env(), LogLevel::Warn);

        std::env::set_var("TF_LOG_PROVIDER", "TRACE");
        assert_eq!(LogLevel::from_env(), LogLevel::Trace);

        std::env::remove_var("TF_LOG");
        std::env::remove_var("TF_LOG_PROVIDER");
    }

    #[test]
    fn off_installs_nothing() {
        assert!(!init_with_level(LogLevel::Off));
        assert_eq!(LogLevel::Off.as_tracing_level(), None);
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
    }
}
