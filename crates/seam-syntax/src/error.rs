//! Error types for parsing and instrumentation.
//!
//! Only failures that prevent a syntax tree from being produced are errors.
//! Problems inside the parsed source are diagnostics on the
//! [`TranslationUnit`](crate::TranslationUnit).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from syntax providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// Failed to initialise a C parser: the Tree-sitter grammar or libclang.
    #[error("failed to initialise C parser: {message}")]
    ParserInitError {
        /// Description of the failure.
        message: String,
    },

    /// The source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The parser returned no tree.
    #[error("failed to parse {}: {message}", path.display())]
    ParseError {
        /// The file that failed to parse.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

impl SyntaxError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(message: impl Into<String>) -> Self {
        Self::ParserInitError {
            message: message.into(),
        }
    }

    /// Creates a read error.
    #[must_use]
    pub const fn read(path: PathBuf, source: io::Error) -> Self {
        Self::ReadError { path, source }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(path: PathBuf, message: impl Into<String>) -> Self {
        Self::ParseError {
            path,
            message: message.into(),
        }
    }
}
