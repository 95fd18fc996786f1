//! Configuration for the `seam` instrumenter.
//!
//! Every setting resolves from a command-line flag first, then a `SEAM_*`
//! environment variable, then a built-in default. [`Config`] is a `clap`
//! argument group so the binary can flatten it into its own parser; tests and
//! embedders load it directly with [`Config::load_from_iter`].

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

mod defaults;
mod logging;
mod provider;

pub use defaults::{
    DEFAULT_ENTRY_MARKER, DEFAULT_EXIT_MARKER, DEFAULT_LOG_FILTER, DEFAULT_OUTPUT_SUFFIX,
    DEFAULT_PREFIX, default_log_filter, default_log_format, default_provider,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use provider::{ProviderKind, ProviderKindParseError};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The command line or environment could not be parsed.
    #[error("{0}")]
    Cli(#[from] clap::Error),
    /// The function prefix is empty, which would select every function.
    #[error("the function prefix must not be empty")]
    EmptyPrefix,
    /// A marker name cannot be called as a C macro.
    #[error("the {role} marker '{name}' is not a valid C identifier")]
    InvalidMarker {
        /// Which marker was rejected, `entry` or `exit`.
        role: &'static str,
        /// The rejected name.
        name: String,
    },
    /// The output suffix is empty, which would overwrite the input file.
    #[error("the output suffix must not be empty")]
    EmptyOutputSuffix,
}

impl ConfigError {
    fn invalid_marker(role: &'static str, name: &str) -> Self {
        Self::InvalidMarker {
            role,
            name: name.to_owned(),
        }
    }
}

/// Resolved settings for one instrumentation run.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "seam")]
pub struct Config {
    /// Instrument function definitions whose name starts with this prefix.
    #[arg(long, env = "SEAM_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,
    /// Macro inserted as the first statement of each instrumented body.
    #[arg(long, env = "SEAM_ENTRY_MARKER", default_value = DEFAULT_ENTRY_MARKER)]
    entry_marker: String,
    /// Macro inserted as the last statement of each instrumented body.
    #[arg(long, env = "SEAM_EXIT_MARKER", default_value = DEFAULT_EXIT_MARKER)]
    exit_marker: String,
    /// Suffix appended to the input file stem to name the output file.
    #[arg(long, env = "SEAM_OUTPUT_SUFFIX", default_value = DEFAULT_OUTPUT_SUFFIX)]
    output_suffix: String,
    /// Tracing filter expression, e.g. `debug` or `seam_syntax=trace`.
    #[arg(long, env = "SEAM_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
    /// Log output format, `json` or `compact`.
    #[arg(long, env = "SEAM_LOG_FORMAT", default_value_t = default_log_format())]
    log_format: LogFormat,
    /// Parser, `clang` (preprocessed) or `tree-sitter` (raw text).
    #[arg(long, env = "SEAM_PROVIDER", default_value_t = default_provider())]
    provider: ProviderKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            entry_marker: DEFAULT_ENTRY_MARKER.to_owned(),
            exit_marker: DEFAULT_EXIT_MARKER.to_owned(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_owned(),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
            provider: default_provider(),
        }
    }
}

impl Config {
    /// Parses configuration from command-line style arguments and the
    /// process environment, then validates it.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] when the arguments cannot be parsed and
    /// a validation error when a resolved value is unusable.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the resolved values can drive an instrumentation run.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty prefix or output suffix, or for marker
    /// names that are not C identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if !is_c_identifier(&self.entry_marker) {
            return Err(ConfigError::invalid_marker("entry", &self.entry_marker));
        }
        if !is_c_identifier(&self.exit_marker) {
            return Err(ConfigError::invalid_marker("exit", &self.exit_marker));
        }
        if self.output_suffix.is_empty() {
            return Err(ConfigError::EmptyOutputSuffix);
        }
        Ok(())
    }

    /// Returns a copy with a different function prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns a copy with different entry and exit marker names.
    #[must_use]
    pub fn with_markers(mut self, entry: impl Into<String>, exit: impl Into<String>) -> Self {
        self.entry_marker = entry.into();
        self.exit_marker = exit.into();
        self
    }

    /// Returns a copy using a different parser.
    #[must_use]
    pub const fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Returns a copy with a different output suffix.
    #[must_use]
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Prefix selecting the functions to instrument.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Name of the entry macro.
    #[must_use]
    pub fn entry_marker(&self) -> &str {
        &self.entry_marker
    }

    /// Name of the exit macro.
    #[must_use]
    pub fn exit_marker(&self) -> &str {
        &self.exit_marker
    }

    /// Suffix appended to the input file stem.
    #[must_use]
    pub fn output_suffix(&self) -> &str {
        &self.output_suffix
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Parser used to build the syntax tree.
    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }
}

/// Returns whether `name` is a valid C identifier.
fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
