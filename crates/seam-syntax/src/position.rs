//! Shared position conversion helpers.
//!
//! Tree-sitter positions are zero-based. The syntax tree uses one-based line
//! and column numbers, matching what compilers print.

use crate::tree::{Extent, Location};

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}

/// Builds the extent of a Tree-sitter node.
#[must_use]
pub(crate) fn node_extent(node: tree_sitter::Node<'_>) -> Extent {
    let (start_line, start_column) = point_to_one_based(node.start_position());
    let (end_line, end_column) = point_to_one_based(node.end_position());
    Extent::new(
        Location::new(node.start_byte(), start_line, start_column),
        Location::new(node.end_byte(), end_line, end_column),
    )
}
