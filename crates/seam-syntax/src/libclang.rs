//! libclang syntax provider.
//!
//! Runs the real C front end: the preprocessor expands macros, resolves
//! conditionals and follows `#include`s using the compiler arguments, so the
//! tree describes the code the compiler would see. Every node records the
//! file it was written in, which lets the point finder skip definitions that
//! come from headers.
//!
//! libclang is loaded at runtime on first use. A missing or unloadable
//! library is reported as [`SyntaxError::ParserInitError`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use clang::diagnostic::Severity as ClangSeverity;
use clang::source::SourceLocation;
use clang::{Clang, Entity, EntityKind, Index, Unsaved};
use tracing::debug;

use crate::error::SyntaxError;
use crate::provider::{Diagnostic, Severity, SyntaxProvider, TranslationUnit};
use crate::tree::{Extent, Location, NodeKind, SyntaxNode, lower_tree};

/// libclang allows one `Clang` instance per process at a time.
static CLANG: Mutex<()> = Mutex::new(());

/// Syntax provider backed by libclang.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClangProvider;

impl ClangProvider {
    /// Creates a provider. libclang is loaded by each
    /// [`parse`](SyntaxProvider::parse) call.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Checks that libclang can be loaded.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::ParserInitError`] when the library cannot be
    /// found or loaded.
    pub fn check_available() -> Result<(), SyntaxError> {
        let _guard = CLANG.lock().unwrap_or_else(PoisonError::into_inner);
        Clang::new().map(drop).map_err(libclang_unavailable)
    }
}

impl SyntaxProvider for ClangProvider {
    fn parse(&mut self, path: &Path, args: &[String]) -> Result<TranslationUnit, SyntaxError> {
        let source =
            fs::read_to_string(path).map_err(|e| SyntaxError::read(path.to_path_buf(), e))?;

        let _guard = CLANG.lock().unwrap_or_else(PoisonError::into_inner);
        let clang = Clang::new().map_err(libclang_unavailable)?;
        let index = Index::new(&clang, false, false);
        let unit = index
            .parser(path)
            .arguments(args)
            .unsaved(&[Unsaved::new(path, &source)])
            .parse()
            .map_err(|e| SyntaxError::parse(path.to_path_buf(), e.to_string()))?;

        let mut files = FileCache::new(path);
        let root = lower_entities(unit.get_entity(), &mut files);
        let diagnostics: Vec<Diagnostic> = unit
            .get_diagnostics()
            .iter()
            .map(|diagnostic| {
                let location = diagnostic.get_location().get_file_location();
                let text = diagnostic.get_text();
                let message = match location.file.map(|file| file.get_path()) {
                    Some(file) if files.resolve(&file).as_ref() != path => {
                        format!("{}: {text}", file.display())
                    }
                    _ => text,
                };
                Diagnostic {
                    severity: severity(diagnostic.get_severity()),
                    message,
                    line: location.line,
                    column: location.column,
                }
            })
            .collect();

        debug!(
            path = %path.display(),
            args = args.len(),
            nodes = root.descendant_count(),
            diagnostics = diagnostics.len(),
            "parsed C translation unit"
        );

        Ok(TranslationUnit::new(
            path.to_path_buf(),
            source,
            root,
            diagnostics,
        ))
    }
}

fn libclang_unavailable(message: String) -> SyntaxError {
    SyntaxError::parser_init(format!("libclang could not be loaded: {message}"))
}

const fn severity(severity: ClangSeverity) -> Severity {
    match severity {
        ClangSeverity::Ignored => Severity::Ignored,
        ClangSeverity::Note => Severity::Note,
        ClangSeverity::Warning => Severity::Warning,
        ClangSeverity::Error => Severity::Error,
        ClangSeverity::Fatal => Severity::Fatal,
    }
}

/// Shares one path allocation per file and maps the parsed file back to the
/// path the caller supplied.
struct FileCache {
    main: Arc<Path>,
    known: HashMap<PathBuf, Arc<Path>>,
}

impl FileCache {
    fn new(main: &Path) -> Self {
        let main: Arc<Path> = Arc::from(main);
        let mut known = HashMap::new();
        known.insert(main.to_path_buf(), Arc::clone(&main));
        Self { main, known }
    }

    fn resolve(&mut self, file: &Path) -> Arc<Path> {
        if let Some(known) = self.known.get(file) {
            return Arc::clone(known);
        }
        // Headers may be reached through `..` or symlinked include paths.
        let resolved = match fs::canonicalize(file) {
            Ok(canonical) if canonical.as_path() == self.main.as_ref() => Arc::clone(&self.main),
            Ok(canonical) => Arc::from(canonical),
            Err(_) => Arc::from(file),
        };
        self.known.insert(file.to_path_buf(), Arc::clone(&resolved));
        resolved
    }
}

fn lower_entities(root: Entity<'_>, files: &mut FileCache) -> SyntaxNode {
    lower_tree(
        root,
        |entity| {
            let kind = match entity.get_kind() {
                EntityKind::TranslationUnit => NodeKind::TranslationUnit,
                EntityKind::FunctionDecl if entity.is_definition() => NodeKind::FunctionDefinition,
                EntityKind::CompoundStmt => NodeKind::CompoundStatement,
                other => NodeKind::Other(format!("{other:?}")),
            };
            let extent = entity.get_range().map_or_else(Extent::default, |range| {
                Extent::new(location(range.get_start()), location(range.get_end()))
            });

            let mut node = SyntaxNode::new(kind, extent);
            let file = match entity.get_kind() {
                EntityKind::TranslationUnit => Some(Arc::clone(&files.main)),
                _ => entity
                    .get_location()
                    .and_then(|at| at.get_file_location().file)
                    .map(|file| files.resolve(&file.get_path())),
            };
            if let Some(file) = file {
                node = node.with_file(file);
            }
            if *node.kind() == NodeKind::FunctionDefinition {
                if let Some(name) = entity.get_name() {
                    node = node.with_name(name);
                }
            }
            node
        },
        Entity::get_children,
    )
}

fn location(at: SourceLocation<'_>) -> Location {
    let at = at.get_file_location();
    Location::new(
        usize::try_from(at.offset).unwrap_or_default(),
        at.line,
        at.column,
    )
}
