//! Tree-sitter C syntax provider.
//!
//! Parses C sources with the Tree-sitter C grammar and lowers the concrete
//! syntax tree into the owned [`SyntaxNode`] model. Tree-sitter is
//! error-tolerant, so a tree is produced even for broken input; ERROR and
//! MISSING nodes are reported as error-severity diagnostics instead.
//!
//! Tree-sitter does not run the preprocessor. Compiler arguments are not
//! interpreted, headers are never expanded and macros are parsed as written,
//! so code whose syntax depends on a macro (`T x zeroinit;`) or on a
//! conditional inside an expression reports errors here. Directives that
//! stand between statements are kept as [`NodeKind::Directive`] nodes. Use
//! [`ClangProvider`](crate::ClangProvider) for preprocessed parsing.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::SyntaxError;
use crate::position::{node_extent, point_to_one_based};
use crate::provider::{Diagnostic, Severity, SyntaxProvider, TranslationUnit};
use crate::tree::{NodeKind, SyntaxNode, lower_tree};

const CONTEXT_LIMIT: usize = 50;

/// Syntax provider backed by the Tree-sitter C grammar.
pub struct TreeSitterProvider {
    inner: tree_sitter::Parser,
}

impl TreeSitterProvider {
    /// Creates a provider configured for C.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tree-sitter parser cannot be initialised
    /// with the C grammar.
    pub fn new() -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| SyntaxError::parser_init(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Parses in-memory source as if it had been read from `path`.
    ///
    /// Every node of the resulting tree is attributed to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser fails to produce a syntax tree. This
    /// is rare and typically indicates a parser configuration issue.
    pub fn parse_source(
        &mut self,
        path: &Path,
        source: String,
    ) -> Result<TranslationUnit, SyntaxError> {
        let tree = self
            .inner
            .parse(&source, None)
            .ok_or_else(|| SyntaxError::parse(path.to_path_buf(), "parsing failed"))?;

        let file: Arc<Path> = Arc::from(path);
        let root_node = tree.root_node();
        let root = lower_syntax_tree(root_node, source.as_bytes(), &file);

        let diagnostics = if root_node.has_error() {
            collect_error_nodes(root_node, &source)
        } else {
            Vec::new()
        };

        debug!(
            path = %path.display(),
            nodes = root.descendant_count(),
            diagnostics = diagnostics.len(),
            "parsed C source"
        );

        Ok(TranslationUnit::new(
            path.to_path_buf(),
            source,
            root,
            diagnostics,
        ))
    }
}

impl SyntaxProvider for TreeSitterProvider {
    fn parse(&mut self, path: &Path, args: &[String]) -> Result<TranslationUnit, SyntaxError> {
        if !args.is_empty() {
            debug!(
                path = %path.display(),
                args = args.len(),
                "compiler arguments are not interpreted by the tree-sitter provider"
            );
        }

        let source =
            fs::read_to_string(path).map_err(|e| SyntaxError::read(path.to_path_buf(), e))?;
        self.parse_source(path, source)
    }
}

/// Lowers a Tree-sitter tree, keeping named nodes and skipping comments.
fn lower_syntax_tree(root: tree_sitter::Node<'_>, source: &[u8], file: &Arc<Path>) -> SyntaxNode {
    lower_tree(
        root,
        |node| {
            let lowered = SyntaxNode::new(node_kind(node.kind()), node_extent(*node))
                .with_file(Arc::clone(file));
            match node.kind() {
                "function_definition" => match function_name(*node, source) {
                    Some(name) => lowered.with_name(name),
                    None => lowered,
                },
                _ => lowered,
            }
        },
        |node| {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .collect()
        },
    )
}

fn node_kind(kind: &str) -> NodeKind {
    match kind {
        "translation_unit" => NodeKind::TranslationUnit,
        "function_definition" => NodeKind::FunctionDefinition,
        "compound_statement" => NodeKind::CompoundStatement,
        directive if directive.starts_with("preproc_") => NodeKind::Directive(directive.to_owned()),
        other => NodeKind::Other(other.to_owned()),
    }
}

/// Finds the identifier a function definition declares.
///
/// The declarator chain may wrap the identifier in pointer, attributed or
/// parenthesised declarators, e.g. `const char *(wgpuName)(void)`.
fn function_name(node: tree_sitter::Node<'_>, source: &[u8]) -> Option<String> {
    let mut declarator = node.child_by_field_name("declarator")?;
    loop {
        declarator = match declarator.kind() {
            "identifier" => {
                return declarator.utf8_text(source).ok().map(str::to_owned);
            }
            "parenthesized_declarator" | "attributed_declarator" => {
                let mut cursor = declarator.walk();
                declarator
                    .named_children(&mut cursor)
                    .find(|child| child.kind().ends_with("declarator") || child.kind() == "identifier")?
            }
            _ => declarator.child_by_field_name("declarator")?,
        };
    }
}

/// Collects ERROR and MISSING nodes as error diagnostics, in source order.
fn collect_error_nodes(root: tree_sitter::Node<'_>, source: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            out.push(error_diagnostic(node, source));
            if node.is_missing() {
                continue;
            }
        }

        let mut cursor = node.walk();
        let erroneous: Vec<_> = node
            .children(&mut cursor)
            .filter(tree_sitter::Node::has_error)
            .collect();
        pending.extend(erroneous.into_iter().rev());
    }
    out
}

fn error_diagnostic(node: tree_sitter::Node<'_>, source: &str) -> Diagnostic {
    let (line, column) = point_to_one_based(node.start_position());

    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let context = source
            .get(node.byte_range())
            .map(|s| {
                let first_line = s.lines().next().unwrap_or_default();
                if first_line.len() > CONTEXT_LIMIT {
                    let truncated: String = first_line.chars().take(CONTEXT_LIMIT - 3).collect();
                    format!("{truncated}...")
                } else {
                    first_line.to_owned()
                }
            })
            .unwrap_or_default();
        format!("syntax error near `{context}`")
    };

    Diagnostic {
        severity: Severity::Error,
        message,
        line,
        column,
    }
}
