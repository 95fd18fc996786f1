//! Syntax-driven entry/exit instrumentation for C sources.
//!
//! This crate holds the instrumentation-point engine of the `seam` tool:
//!
//! - **Parsing** via the [`SyntaxProvider`] trait, which lowers a parse into
//!   an owned [`SyntaxNode`] tree plus [`Diagnostic`]s. [`ClangProvider`]
//!   preprocesses with libclang and is what the CLI uses by default;
//!   [`TreeSitterProvider`] parses the raw text and needs no native library
//! - **Point discovery** via [`find_instrumentation_points`], selecting
//!   function definitions by name prefix and declaring file
//! - **Rewriting** via [`instrument`], which inserts the entry and exit
//!   markers into the original text in one batch
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use seam_syntax::{
//!     FunctionFilter, Markers, TreeSitterProvider, find_instrumentation_points, instrument,
//! };
//!
//! let path = Path::new("device.c");
//! let mut provider = TreeSitterProvider::new()?;
//! let unit = provider.parse_source(path, "void wgpuDrop(void) {\n    free(0);\n}\n".into())?;
//! assert!(!unit.has_errors());
//!
//! let points = find_instrumentation_points(unit.root(), path, &FunctionFilter::new("wgpu"));
//! let result = instrument(unit.source(), &points, &Markers::default());
//!
//! assert_eq!(
//!     result.output(),
//!     "void wgpuDrop(void) {\n    ENTRY();\n    free(0);\n    EXIT();\n}\n"
//! );
//! # Ok::<(), seam_syntax::SyntaxError>(())
//! ```

mod error;
mod libclang;
mod parser;
mod points;
mod position;
mod provider;
mod rewriter;
mod tree;

pub use error::SyntaxError;
pub use libclang::ClangProvider;
pub use parser::TreeSitterProvider;
pub use points::{FunctionFilter, InstrumentationPoint, find_instrumentation_points};
pub use provider::{Diagnostic, Severity, SyntaxProvider, TranslationUnit};
pub use rewriter::{InstrumentedSource, Markers, instrument};
pub use tree::{Extent, Location, NodeKind, SyntaxNode};

#[cfg(test)]
mod tests;
