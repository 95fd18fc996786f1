//! The syntax provider seam.
//!
//! A provider parses one file with a set of compiler-style arguments and
//! returns an owned [`TranslationUnit`]: the syntax tree, the diagnostics the
//! parser raised and the exact text the tree was computed from. Any parser
//! able to report byte offsets together with one-based line and column
//! numbers can sit behind [`SyntaxProvider`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SyntaxError;
use crate::tree::SyntaxNode;

/// Severity of a parser diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The diagnostic was suppressed.
    Ignored,
    /// Supplementary information attached to another diagnostic.
    Note,
    /// Suspicious but accepted construct.
    Warning,
    /// The parse is not trustworthy.
    Error,
    /// The parser gave up.
    Fatal,
}

impl Severity {
    /// Returns whether diagnostics of this severity abort instrumentation.
    #[must_use]
    pub fn is_error(self) -> bool {
        self >= Self::Error
    }

    /// Returns the lower-case name of the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message raised by the provider while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How severe the problem is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// One-based line of the problem.
    pub line: u32,
    /// One-based column of the problem.
    pub column: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Everything a provider knows about one parsed file.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    path: PathBuf,
    source: String,
    root: SyntaxNode,
    diagnostics: Vec<Diagnostic>,
}

impl TranslationUnit {
    /// Assembles a translation unit from its parts.
    #[must_use]
    pub const fn new(
        path: PathBuf,
        source: String,
        root: SyntaxNode,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            path,
            source,
            root,
            diagnostics,
        }
    }

    /// Path the unit was parsed from, as given to the provider.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The text the tree's offsets refer to.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root of the syntax tree.
    #[must_use]
    pub const fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// All diagnostics raised while parsing.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics at error severity or above.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity.is_error())
    }

    /// Returns whether any diagnostic gates instrumentation.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Produces syntax trees for source files.
pub trait SyntaxProvider {
    /// Parses the file at `path` with compiler-style `args`.
    ///
    /// # Errors
    ///
    /// Returns an error when no tree can be produced at all, for example
    /// because the file cannot be read. Problems inside the source are
    /// reported as diagnostics on the returned unit instead.
    fn parse(&mut self, path: &Path, args: &[String]) -> Result<TranslationUnit, SyntaxError>;
}
