//! Process-wide `tracing` subscriber setup for binaries and tests using fanout.
//!
//! The libraries only emit events; installing a subscriber is left to the application:
//!
//! ```no_run
//! let cfg = fanout_observe::LoggerConfig::from_env()?;
//! fanout_observe::logger_init(&cfg)?;
//! # Ok::<(), fanout_observe::LoggerError>(())
//! ```

mod logger;
pub use logger::*;
