//! Provider-agnostic syntax tree handed to the point finder.
//!
//! Syntax providers translate whatever their parser produces into this owned
//! tree so that the instrumentation engine never depends on a particular
//! parsing library. Only the node kinds the engine distinguishes get their own
//! variant; everything else is carried as [`NodeKind::Other`] with the
//! provider's raw kind name for diagnostics and logging.

use std::path::Path;
use std::sync::Arc;

/// Classification of a syntax node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a parsed file.
    TranslationUnit,
    /// A function declaration that carries a body.
    FunctionDefinition,
    /// A brace-delimited block of statements.
    CompoundStatement,
    /// A preprocessor directive left in the tree by a provider that does not
    /// preprocess, tagged with the provider's kind name.
    Directive(String),
    /// Any other node, tagged with the provider's kind name.
    Other(String),
}

impl NodeKind {
    /// Returns the kind name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TranslationUnit => "translation_unit",
            Self::FunctionDefinition => "function_definition",
            Self::CompoundStatement => "compound_statement",
            Self::Directive(kind) | Self::Other(kind) => kind,
        }
    }

    /// Returns whether the node is a preprocessor directive.
    #[must_use]
    pub const fn is_directive(&self) -> bool {
        matches!(self, Self::Directive(_))
    }
}

/// A position in the source buffer.
///
/// `offset` is a zero-based byte offset. `line` and `column` are one-based;
/// columns count bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Zero-based byte offset.
    pub offset: usize,
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Source extent of a node. `end` points one past the last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    /// First byte of the node.
    pub start: Location,
    /// One past the last byte of the node.
    pub end: Location,
}

impl Extent {
    /// Creates an extent from its bounds.
    #[must_use]
    pub const fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// One-based column of the last byte covered by the extent.
    ///
    /// For a compound statement this is the column of its closing brace.
    #[must_use]
    pub const fn last_column(&self) -> u32 {
        self.end.column.saturating_sub(1)
    }
}

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    name: Option<String>,
    file: Option<Arc<Path>>,
    extent: Extent,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Creates a leaf node with no name and no declaring file.
    #[must_use]
    pub const fn new(kind: NodeKind, extent: Extent) -> Self {
        Self {
            kind,
            name: None,
            file: None,
            extent,
            children: Vec::new(),
        }
    }

    /// Sets the declared name (function nodes).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the file in which the node was declared.
    #[must_use]
    pub fn with_file(mut self, file: Arc<Path>) -> Self {
        self.file = Some(file);
        self
    }

    /// Replaces the node's children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the declared name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the file the node was declared in, if known.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Returns the node's source extent.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Returns the node's children in source order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Counts this node and all of its descendants.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        let mut count = 0_usize;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count = count.saturating_add(1);
            pending.extend(node.children.iter());
        }
        count
    }
}

impl Drop for SyntaxNode {
    // Detach descendants onto a flat list so deeply nested bodies do not
    // exhaust the stack when the tree is dropped.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A node being lowered whose children are still being converted.
struct Frame<T> {
    node: SyntaxNode,
    pending: std::vec::IntoIter<T>,
}

/// Converts a provider's tree into a [`SyntaxNode`] tree without recursion.
///
/// `lower` converts one provider node into a childless [`SyntaxNode`].
/// `children` lists the provider children to keep, in source order.
pub(crate) fn lower_tree<T, L, C>(root: T, mut lower: L, mut children: C) -> SyntaxNode
where
    L: FnMut(&T) -> SyntaxNode,
    C: FnMut(&T) -> Vec<T>,
{
    let mut current = Frame {
        node: lower(&root),
        pending: children(&root).into_iter(),
    };
    let mut stack: Vec<Frame<T>> = Vec::new();

    loop {
        if let Some(child) = current.pending.next() {
            let next = Frame {
                node: lower(&child),
                pending: children(&child).into_iter(),
            };
            stack.push(std::mem::replace(&mut current, next));
            continue;
        }

        let Some(mut parent) = stack.pop() else {
            return current.node;
        };
        parent.node.children.push(current.node);
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds `depth` compound statements, each nested in the previous one.
    fn nested_blocks(depth: usize) -> SyntaxNode {
        lower_tree(
            0_usize,
            |level| {
                let offset = *level;
                let kind = if offset == 0 {
                    NodeKind::TranslationUnit
                } else {
                    NodeKind::CompoundStatement
                };
                SyntaxNode::new(kind, Extent::new(Location::new(offset, 1, 1), Location::default()))
            },
            |level| if *level < depth { vec![*level + 1] } else { Vec::new() },
        )
    }

    #[test]
    fn lowering_keeps_child_order() {
        let tree = lower_tree(
            "root",
            |name| SyntaxNode::new(NodeKind::Other((*name).to_owned()), Extent::default()),
            |name| match *name {
                "root" => vec!["a", "b"],
                "a" => vec!["a1", "a2"],
                _ => Vec::new(),
            },
        );

        let kinds: Vec<_> = tree.children().iter().map(|n| n.kind().as_str()).collect();
        assert_eq!(kinds, ["a", "b"]);
        let nested: Vec<_> = tree.children()[0]
            .children()
            .iter()
            .map(|n| n.kind().as_str())
            .collect();
        assert_eq!(nested, ["a1", "a2"]);
        assert_eq!(tree.descendant_count(), 5);
    }

    #[test]
    fn deeply_nested_trees_are_built_counted_and_dropped() {
        let depth = 100_000;
        let tree = nested_blocks(depth);

        assert_eq!(tree.descendant_count(), depth + 1);
        drop(tree);
    }

    #[test]
    fn directives_are_recognised() {
        assert!(NodeKind::Directive("preproc_ifdef".to_owned()).is_directive());
        assert!(!NodeKind::Other("preproc".to_owned()).is_directive());
        assert_eq!(NodeKind::Directive("preproc_if".to_owned()).as_str(), "preproc_if");
    }
}
