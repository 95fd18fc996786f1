//! Discovery of instrumentation points.
//!
//! The finder walks the whole tree depth-first, parent before children, and
//! records one [`InstrumentationPoint`] for every qualifying function
//! definition. It never stops descending at a match, so a qualifying
//! definition nested inside another qualifying body is reported as well.
//! The walk keeps its own stack, so nesting depth is bounded by memory only.
//!
//! Directive nodes never set the marker indentation: the first statement
//! after them does, or the empty-body rule when there is none.

use std::path::Path;

use tracing::debug;

use crate::tree::{NodeKind, SyntaxNode};

/// Extra indentation for the entry marker of an empty body.
const EMPTY_BODY_INDENT: usize = 4;

/// Selects functions by the prefix of their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionFilter {
    prefix: String,
}

impl FunctionFilter {
    /// Creates a filter accepting names that start with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns whether a function called `name` should be instrumented.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
    }
}

/// Where and how to instrument one function body.
///
/// Offsets refer to the source buffer the tree was parsed from and become
/// meaningless once that buffer is modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationPoint {
    function: String,
    entry_offset: usize,
    exit_offset: usize,
    entry_indent: String,
    exit_indent: String,
}

impl InstrumentationPoint {
    /// Name of the instrumented function.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Offset one past the opening brace of the body.
    #[must_use]
    pub const fn entry_offset(&self) -> usize {
        self.entry_offset
    }

    /// Offset of the closing brace of the body.
    #[must_use]
    pub const fn exit_offset(&self) -> usize {
        self.exit_offset
    }

    /// Indentation of the marker lines.
    #[must_use]
    pub fn entry_indent(&self) -> &str {
        &self.entry_indent
    }

    /// Indentation of the closing brace.
    #[must_use]
    pub fn exit_indent(&self) -> &str {
        &self.exit_indent
    }
}

/// Finds every function defined in `file` whose name passes `filter`.
///
/// Points are returned in depth-first pre-order. Functions declared in any
/// other file, such as an included header, are ignored. An empty result is
/// not an error.
#[must_use]
pub fn find_instrumentation_points(
    root: &SyntaxNode,
    file: &Path,
    filter: &FunctionFilter,
) -> Vec<InstrumentationPoint> {
    let mut points = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if let Some(point) = qualify(node, file, filter) {
            debug!(
                function = point.function(),
                entry_offset = point.entry_offset,
                exit_offset = point.exit_offset,
                "found instrumentation point"
            );
            points.push(point);
        }
        pending.extend(node.children().iter().rev());
    }
    points
}

fn qualify(node: &SyntaxNode, file: &Path, filter: &FunctionFilter) -> Option<InstrumentationPoint> {
    if *node.kind() != NodeKind::FunctionDefinition {
        return None;
    }
    let name = node.name().filter(|name| filter.matches(name))?;
    if node.file() != Some(file) {
        return None;
    }

    let body = node
        .children()
        .iter()
        .find(|child| *child.kind() == NodeKind::CompoundStatement)?;
    let extent = body.extent();
    let brace_column = column_width(extent.last_column());

    let first_statement = body.children().iter().find(|child| !child.kind().is_directive());
    let indent_width = match first_statement {
        Some(statement) => column_width(statement.extent().start.column),
        None => brace_column.saturating_add(EMPTY_BODY_INDENT),
    };

    Some(InstrumentationPoint {
        function: name.to_owned(),
        entry_offset: extent.start.offset.saturating_add(1),
        exit_offset: extent.end.offset.saturating_sub(1),
        entry_indent: " ".repeat(indent_width),
        exit_indent: " ".repeat(brace_column),
    })
}

/// Number of columns before a one-based column.
fn column_width(column: u32) -> usize {
    usize::try_from(column.saturating_sub(1)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tree::{Extent, Location};

    fn at(offset: usize, line: u32, column: u32) -> Location {
        Location::new(offset, line, column)
    }

    fn node(kind: NodeKind, start: Location, end: Location) -> SyntaxNode {
        SyntaxNode::new(kind, Extent::new(start, end))
    }

    fn function(name: &str, file: &Path, body: Option<SyntaxNode>) -> SyntaxNode {
        let mut children = vec![node(
            NodeKind::Other("function_declarator".to_owned()),
            at(5, 1, 6),
            at(15, 1, 16),
        )];
        children.extend(body);
        node(NodeKind::FunctionDefinition, at(0, 1, 1), at(40, 3, 2))
            .with_name(name)
            .with_file(Arc::from(file))
            .with_children(children)
    }

    fn body_with_statement(column: u32) -> SyntaxNode {
        node(NodeKind::CompoundStatement, at(16, 1, 17), at(40, 3, 2)).with_children(vec![node(
            NodeKind::Other("return_statement".to_owned()),
            at(22, 2, column),
            at(29, 2, column + 7),
        )])
    }

    fn root(children: Vec<SyntaxNode>) -> SyntaxNode {
        node(NodeKind::TranslationUnit, at(0, 1, 1), at(100, 10, 1)).with_children(children)
    }

    fn filter() -> FunctionFilter {
        FunctionFilter::new("wgpu")
    }

    #[test]
    fn offsets_bracket_the_body() {
        let file = Path::new("/src/a.c");
        let tree = root(vec![function("wgpuA", file, Some(body_with_statement(5)))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.function(), "wgpuA");
        assert_eq!(point.entry_offset(), 17);
        assert_eq!(point.exit_offset(), 39);
        assert!(point.entry_offset() <= point.exit_offset());
    }

    #[test]
    fn entry_indent_follows_first_statement() {
        let file = Path::new("/src/a.c");
        let tree = root(vec![function("wgpuA", file, Some(body_with_statement(9)))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        assert_eq!(points[0].entry_indent(), " ".repeat(8));
        assert_eq!(points[0].exit_indent(), "");
    }

    #[test]
    fn empty_body_indents_past_the_closing_brace() {
        let file = Path::new("/src/a.c");
        let body = node(NodeKind::CompoundStatement, at(16, 1, 17), at(25, 2, 4));
        let tree = root(vec![function("wgpuEmpty", file, Some(body))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        assert_eq!(points[0].entry_indent(), " ".repeat(6));
        assert_eq!(points[0].exit_indent(), "  ");
    }

    #[test]
    fn functions_without_a_body_are_skipped() {
        let file = Path::new("/src/a.c");
        let tree = root(vec![function("wgpuNoBody", file, None)]);

        assert!(find_instrumentation_points(&tree, file, &filter()).is_empty());
    }

    #[test]
    fn header_definitions_are_ignored() {
        let file = Path::new("/src/a.c");
        let header = Path::new("/src/a.h");
        let tree = root(vec![
            function("wgpuFromHeader", header, Some(body_with_statement(5))),
            function("wgpuLocal", file, Some(body_with_statement(5))),
        ]);

        let points = find_instrumentation_points(&tree, file, &filter());

        let names: Vec<_> = points.iter().map(InstrumentationPoint::function).collect();
        assert_eq!(names, vec!["wgpuLocal"]);
    }

    #[test]
    fn unprefixed_functions_are_ignored() {
        let file = Path::new("/src/a.c");
        let tree = root(vec![
            function("helper", file, Some(body_with_statement(5))),
            function("gpuAlmost", file, Some(body_with_statement(5))),
        ]);

        assert!(find_instrumentation_points(&tree, file, &filter()).is_empty());
    }

    #[test]
    fn nested_definitions_inside_a_match_are_visited() {
        let file = Path::new("/src/a.c");
        let inner = function("wgpuInner", file, Some(body_with_statement(9)));
        let outer_body = node(NodeKind::CompoundStatement, at(16, 1, 17), at(90, 8, 2))
            .with_children(vec![inner]);
        let outer = function("wgpuOuter", file, Some(outer_body));
        let tree = root(vec![outer]);

        let points = find_instrumentation_points(&tree, file, &filter());

        let names: Vec<_> = points.iter().map(InstrumentationPoint::function).collect();
        assert_eq!(names, vec!["wgpuOuter", "wgpuInner"]);
    }

    #[test]
    fn leading_directives_do_not_set_the_indent() {
        let file = Path::new("/src/a.c");
        let body = node(NodeKind::CompoundStatement, at(16, 1, 17), at(60, 6, 2)).with_children(vec![
            node(NodeKind::Directive("preproc_ifdef".to_owned()), at(18, 2, 1), at(40, 4, 7)),
            node(NodeKind::Other("return_statement".to_owned()), at(45, 5, 3), at(52, 5, 10)),
        ]);
        let tree = root(vec![function("wgpuA", file, Some(body))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        assert_eq!(points[0].entry_indent(), "  ");
    }

    #[test]
    fn body_of_only_directives_uses_the_empty_body_indent() {
        let file = Path::new("/src/a.c");
        let body = node(NodeKind::CompoundStatement, at(16, 1, 17), at(40, 4, 2)).with_children(vec![
            node(NodeKind::Directive("preproc_if".to_owned()), at(18, 2, 1), at(38, 3, 7)),
        ]);
        let tree = root(vec![function("wgpuA", file, Some(body))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        assert_eq!(points[0].entry_indent(), " ".repeat(4));
    }

    #[test]
    fn deeply_nested_bodies_are_walked_without_recursion() {
        let file = Path::new("/src/a.c");
        let depth = 50_000;
        let mut block = node(NodeKind::CompoundStatement, at(16, 1, 17), at(20, 1, 21));
        for _ in 0..depth {
            block = node(NodeKind::CompoundStatement, at(16, 1, 17), at(20, 1, 21))
                .with_children(vec![block]);
        }
        let inner = function("wgpuInner", file, Some(body_with_statement(5)));
        let deepest = node(NodeKind::CompoundStatement, at(16, 1, 17), at(20, 1, 21))
            .with_children(vec![inner]);
        let outer_body = node(NodeKind::CompoundStatement, at(16, 1, 17), at(90, 8, 2))
            .with_children(vec![block, deepest]);
        let tree = root(vec![function("wgpuOuter", file, Some(outer_body))]);

        let points = find_instrumentation_points(&tree, file, &filter());

        let names: Vec<_> = points.iter().map(InstrumentationPoint::function).collect();
        assert_eq!(names, vec!["wgpuOuter", "wgpuInner"]);
    }

    #[test]
    fn filter_matches_by_prefix_only() {
        let filter = FunctionFilter::new("wgpu");
        assert!(filter.matches("wgpuDeviceCreateBuffer"));
        assert!(!filter.matches("createWgpuBuffer"));
        assert!(!filter.matches("WGPUBuffer"));
    }
}
