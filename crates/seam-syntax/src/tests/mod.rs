//! Crate-internal test suites.
