use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builds the output layer for `cfg.format` and installs it behind the level filter.
pub(crate) fn init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = filter(&cfg.level)?;
    let output = output_layer(cfg)?;

    // `try_init` fails only when a global subscriber or `log` logger is already set.
    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

fn output_layer(cfg: &LoggerConfig) -> Result<BoxedLayer, LoggerError> {
    let spans = if cfg.batch_spans { FmtSpan::CLOSE } else { FmtSpan::NONE };
    match cfg.format {
        LoggerFormat::Text => Ok(fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_span_events(spans)
            .with_timer(local_timer())
            .boxed()),
        LoggerFormat::Json => Ok(fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_current_span(true)
            .with_span_events(spans)
            .with_timer(local_timer())
            .boxed()),
        LoggerFormat::Journald => journald(),
    }
}

fn filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|_| LoggerError::InvalidLogLevel(directive.to_string()))
}

fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<BoxedLayer, LoggerError> {
    tracing_journald::layer()
        .map(Layer::boxed)
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<BoxedLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_json_layers_build() {
        for format in [LoggerFormat::Text, LoggerFormat::Json] {
            let cfg = LoggerConfig { format, batch_spans: true, ..LoggerConfig::default() };
            assert!(output_layer(&cfg).is_ok());
        }
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_without_feature_is_rejected() {
        let cfg = LoggerConfig { format: LoggerFormat::Journald, ..LoggerConfig::default() };
        assert!(matches!(output_layer(&cfg).err(), Some(LoggerError::JournaldNotSupported)));
    }

    #[test]
    fn per_crate_directives_parse() {
        assert!(filter("fanout_core=debug,fanout_transform=trace,warn").is_ok());
        assert!(filter("fanout_core=chatty").is_err());
    }
}
