use serde::Deserialize;

use crate::logger::error::LoggerError;
use crate::logger::format::LoggerFormat;

/// Filter directive, e.g. `info` or `fanout_core=debug,warn`.
pub const ENV_LEVEL: &str = "FANOUT_LOG";
/// One of `text`, `json`, `journald`.
pub const ENV_FORMAT: &str = "FANOUT_LOG_FORMAT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive string.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    /// Log a close event with busy/idle time for every batch span.
    pub batch_spans: bool,
}

impl LoggerConfig {
    /// Defaults overridden by [`ENV_LEVEL`] and [`ENV_FORMAT`] when they are set and non-empty.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let set = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());

        let mut cfg = Self::default();
        if let Some(level) = set(ENV_LEVEL) {
            cfg.level = level;
        }
        if let Some(format) = set(ENV_FORMAT) {
            cfg.format = format.parse()?;
        }
        Ok(cfg)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || atty::is(atty::Stream::Stdout);
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
            batch_spans: false,
        }
    }
}
