//! Log capture for one CLI run.
//!
//! Events are formatted into a [`LogBuffer`] by a subscriber that is active
//! only while the run executes. The runtime then copies the buffer to the
//! stderr handle it was given, so embedders and tests see log lines on the
//! stream they passed in. Stdout stays reserved for the run summary.
//!
//! A bare level such as `debug` enables the `seam` crates only; explicit
//! `target=level` directives are passed through unchanged.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{MakeWriter, time::UtcTime};

use seam_config::{Config, LogFormat};

/// Crates whose events a bare level directive applies to.
const LOG_TARGETS: [&str; 3] = ["seam_cli", "seam_config", "seam_syntax"];

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Errors encountered while configuring logging.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TelemetryError {
    /// The configured filter is not a valid `EnvFilter` expression.
    #[error("invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },
}

/// Shared in-memory sink for formatted log lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// Removes and returns everything written so far.
    pub(crate) fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.bytes.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Builds the subscriber for one run, writing into `logs`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured filter does not
/// parse.
pub(crate) fn dispatch(config: &Config, logs: LogBuffer) -> Result<Dispatch, TelemetryError> {
    let directives = scoped_directives(config.log_filter());
    let filter = EnvFilter::try_new(&directives).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(logs)
        .with_ansi(false);

    Ok(match config.log_format() {
        LogFormat::Json => Dispatch::new(
            builder
                .json()
                .flatten_event(true)
                .with_timer(UtcTime::rfc_3339())
                .finish(),
        ),
        LogFormat::Compact => Dispatch::new(builder.compact().without_time().finish()),
    })
}

/// Expands bare levels into one directive per `seam` crate.
fn scoped_directives(filter: &str) -> String {
    filter
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .flat_map(|directive| {
            if is_level(directive) {
                LOG_TARGETS
                    .iter()
                    .map(|target| format!("{target}={directive}"))
                    .collect()
            } else {
                vec![directive.to_owned()]
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn is_level(directive: &str) -> bool {
    LEVELS
        .iter()
        .any(|level| directive.eq_ignore_ascii_case(level))
}
