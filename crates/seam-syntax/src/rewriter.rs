//! Batch insertion of entry and exit markers.
//!
//! Every [`InstrumentationPoint`] becomes two insertions computed against the
//! original buffer. Insertions are applied from the highest offset down, so
//! each one lands before any text that has already been inserted and every
//! offset that remains to be applied still refers to unmodified bytes.
//!
//! Markers are anchored on line boundaries where possible:
//!
//! - the entry marker goes at the end of the line holding the opening brace
//!   (after any trailing `//` comment), becoming the first line of the body;
//! - the exit marker goes at the end of the last non-blank content before the
//!   closing brace, becoming the last line of the body.
//!
//! A brace that shares its line with code is moved to a line of its own at its
//! original column. Lines are broken ahead of the blanks that separated the
//! brace from the code, and those blanks are counted towards the indentation of
//! the moved code, so no line is left with trailing whitespace.

use tracing::debug;

use crate::points::InstrumentationPoint;

const DEFAULT_ENTRY_MARKER: &str = "ENTRY";
const DEFAULT_EXIT_MARKER: &str = "EXIT";

/// Names of the macros inserted at function entry and exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    entry: String,
    exit: String,
}

impl Markers {
    /// Creates markers from macro names, e.g. `"ENTRY"` and `"EXIT"`.
    #[must_use]
    pub fn new(entry: impl Into<String>, exit: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            exit: exit.into(),
        }
    }

    /// Returns the entry macro name.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Returns the exit macro name.
    #[must_use]
    pub fn exit(&self) -> &str {
        &self.exit
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_MARKER, DEFAULT_EXIT_MARKER)
    }
}

/// A pending insertion into the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    offset: usize,
    text: String,
}

/// Result of instrumenting a source buffer.
#[derive(Debug, Clone)]
pub struct InstrumentedSource {
    output: String,
    functions: Vec<String>,
    inserted_bytes: usize,
}

impl InstrumentedSource {
    /// Returns the instrumented source code.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the result, returning the instrumented source code.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Names of the instrumented functions, in discovery order.
    #[must_use]
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Total number of bytes inserted.
    #[must_use]
    pub const fn inserted_bytes(&self) -> usize {
        self.inserted_bytes
    }

    /// Returns whether any function was instrumented.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.functions.is_empty()
    }
}

/// Inserts entry and exit markers for every point into a copy of `source`.
///
/// `source` must be the exact buffer the points were computed from; the
/// caller is responsible for not mixing buffers.
///
/// # Panics
///
/// Panics if an offset lies outside `source` or inside a multi-byte
/// character, which only happens when the points belong to another buffer.
#[must_use]
pub fn instrument(
    source: &str,
    points: &[InstrumentationPoint],
    markers: &Markers,
) -> InstrumentedSource {
    let edits = plan_edits(source, points, markers);
    let inserted_bytes = edits
        .iter()
        .map(|edit| edit.text.len())
        .fold(0, usize::saturating_add);
    let output = apply_edits(source, edits);

    debug!(
        functions = points.len(),
        inserted_bytes, "applied instrumentation edits"
    );

    InstrumentedSource {
        output,
        functions: points
            .iter()
            .map(|point| point.function().to_owned())
            .collect(),
        inserted_bytes,
    }
}

/// Derives the two insertions of every point, in generation order.
fn plan_edits(source: &str, points: &[InstrumentationPoint], markers: &Markers) -> Vec<Edit> {
    let newline = line_ending(source);
    let mut edits = Vec::with_capacity(points.len().saturating_mul(2));

    for point in points {
        let indent = point.entry_indent();
        let entry = entry_anchor(source, point.entry_offset(), point.exit_offset());
        let exit = exit_anchor(source, point.exit_offset(), entry.offset);

        let mut entry_text = format!("{newline}{indent}{}();", markers.entry());
        if let Some(carried) = entry.carried {
            // Code follows the brace on its line; start it on a fresh line.
            entry_text.push_str(newline);
            entry_text.push_str(reduce_indent(indent, carried));
        }

        let mut exit_text = format!("{newline}{indent}{}();", markers.exit());
        if let Some(carried) = exit.carried {
            exit_text.push_str(newline);
            exit_text.push_str(reduce_indent(point.exit_indent(), carried));
        }

        edits.push(Edit {
            offset: entry.offset,
            text: entry_text,
        });
        edits.push(Edit {
            offset: exit.offset,
            text: exit_text,
        });
    }

    edits
}

/// Applies insertions from the highest offset down.
///
/// Insertions sharing an offset are applied in reverse generation order so
/// that they read in generation order afterwards.
fn apply_edits(source: &str, edits: Vec<Edit>) -> String {
    let mut ordered: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();
    ordered.sort_by(|(a_seq, a), (b_seq, b)| {
        b.offset.cmp(&a.offset).then_with(|| b_seq.cmp(a_seq))
    });

    let mut output = source.to_owned();
    for (_, edit) in ordered {
        output.insert_str(edit.offset, &edit.text);
    }
    output
}

/// Line terminator used for inserted lines.
fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Returns whether `offset` sits at a line break or the end of the buffer.
fn ends_line(source: &str, offset: usize) -> bool {
    source
        .as_bytes()
        .get(offset..)
        .is_none_or(|tail| tail.is_empty() || tail.starts_with(b"\n") || tail.starts_with(b"\r\n"))
}

/// Where a marker is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    offset: usize,
    /// Set when the insertion breaks a line: the number of blank columns
    /// already standing between the anchor and the code moved down.
    carried: Option<usize>,
}

impl Anchor {
    const fn at(offset: usize) -> Self {
        Self {
            offset,
            carried: None,
        }
    }

    const fn breaking(offset: usize, carried: usize) -> Self {
        Self {
            offset,
            carried: Some(carried),
        }
    }
}

/// Where the entry marker goes, given the offsets just past `{` and of `}`.
///
/// A line holding only the brace and an optional comment is left intact and
/// the marker follows it. Otherwise the line is broken right after the brace,
/// ahead of any blanks, so no trailing whitespace is left behind.
fn entry_anchor(source: &str, entry_offset: usize, exit_offset: usize) -> Anchor {
    let bytes = source.as_bytes();
    let tail = bytes.get(entry_offset..).unwrap_or_default();
    let blank_len = tail
        .iter()
        .take_while(|byte| matches!(byte, b' ' | b'\t'))
        .count();
    let after_blanks = entry_offset.saturating_add(blank_len);

    if after_blanks >= exit_offset {
        return Anchor::at(entry_offset);
    }
    if ends_line(source, after_blanks) {
        return Anchor::at(after_blanks);
    }
    let rest = bytes.get(after_blanks..).unwrap_or_default();
    if let Some(comment_len) = trailing_comment_len(rest) {
        return Anchor::at(after_blanks.saturating_add(comment_len));
    }
    Anchor::breaking(
        entry_offset,
        carried_columns(tail.get(..blank_len).unwrap_or_default()),
    )
}

/// Length of a comment that runs to the end of the line, excluding `\r\n`.
fn trailing_comment_len(rest: &[u8]) -> Option<usize> {
    let line_len = rest
        .iter()
        .position(|byte| *byte == b'\n')
        .unwrap_or(rest.len());
    let line = rest.get(..line_len)?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if line.starts_with(b"//") {
        return Some(line.len());
    }
    let comment = line.strip_prefix(b"/*")?;
    let close = comment.windows(2).position(|pair| pair == b"*/")?;
    let after = comment.get(close.saturating_add(2)..)?;
    after
        .iter()
        .all(|byte| matches!(byte, b' ' | b'\t'))
        .then_some(line.len())
}

/// Where the exit marker goes, given the offset of `}`.
///
/// A brace on its own line keeps it and the marker follows the last
/// non-blank content. An inline brace is moved to a new line and the marker
/// is anchored at the last non-blank byte before it. Never returns an offset
/// before `floor`, the entry anchor of the same body.
fn exit_anchor(source: &str, exit_offset: usize, floor: usize) -> Anchor {
    let bytes = source.as_bytes();
    let mut offset = exit_offset;
    while offset > floor && matches!(bytes.get(offset.saturating_sub(1)), Some(b' ' | b'\t')) {
        offset = offset.saturating_sub(1);
    }
    let blanks = bytes.get(offset..exit_offset).unwrap_or_default();

    if offset > floor && bytes.get(offset.saturating_sub(1)) == Some(&b'\n') {
        while offset > floor
            && matches!(
                bytes.get(offset.saturating_sub(1)),
                Some(b' ' | b'\t' | b'\r' | b'\n')
            )
        {
            offset = offset.saturating_sub(1);
        }
        return Anchor::at(offset);
    }
    Anchor::breaking(offset, carried_columns(blanks))
}

/// Columns a run of blanks contributes to the indentation that follows it.
///
/// Tabs have no fixed width, so a run containing one contributes nothing.
fn carried_columns(blanks: &[u8]) -> usize {
    if blanks.iter().all(|byte| *byte == b' ') {
        blanks.len()
    } else {
        0
    }
}

/// Shortens an all-space indent by the blanks already present in the source.
fn reduce_indent(indent: &str, carried: usize) -> &str {
    indent
        .get(..indent.len().saturating_sub(carried))
        .unwrap_or_default()
}
