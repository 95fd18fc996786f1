/// Prefix selecting the functions to instrument.
pub const DEFAULT_PREFIX: &str = "wgpu";

/// Macro invoked as the first statement of an instrumented body.
pub const DEFAULT_ENTRY_MARKER: &str = "ENTRY";

/// Macro invoked as the last statement of an instrumented body.
pub const DEFAULT_EXIT_MARKER: &str = "EXIT";

/// Suffix appended to the input file stem to name the output file.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_instrumented";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binary.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Default parser for the binary.
#[must_use]
pub const fn default_provider() -> crate::provider::ProviderKind {
    crate::provider::ProviderKind::Clang
}
