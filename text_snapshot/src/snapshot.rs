// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::validate_range;
use crate::{Error, SnapshotPoint, SnapshotSpan, TextChange, TextSnapshotLine};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_buffer_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub(crate) struct VersionNode {
    number: u32,
    next: OnceLock<VersionLink>,
}

#[derive(Debug)]
struct VersionLink {
    changes: Arc<[TextChange]>,
    node: Arc<VersionNode>,
}

/// One version in a buffer's history.
///
/// Versions form a singly linked chain: each version knows the changes that
/// lead to its successor once that successor exists.
#[derive(Clone, Debug)]
pub struct TextVersion(Arc<VersionNode>);

impl TextVersion {
    pub(crate) fn first() -> Self {
        Self(Arc::new(VersionNode {
            number: 0,
            next: OnceLock::new(),
        }))
    }

    /// Records `changes` as the edit from this version to a new one and
    /// returns the new version.
    pub(crate) fn push(&self, changes: Vec<TextChange>) -> Self {
        let node = Arc::new(VersionNode {
            number: self.0.number.wrapping_add(1),
            next: OnceLock::new(),
        });
        let link = VersionLink {
            changes: changes.into(),
            node: node.clone(),
        };
        let linked = self.0.next.set(link).is_ok();
        debug_assert!(linked, "only the latest version of a buffer can be edited");
        Self(node)
    }

    /// The version number, starting at zero for a new buffer.
    pub fn number(&self) -> u32 {
        self.0.number
    }

    /// The changes that turn this version into the next one, or `None` if this
    /// is the latest version.
    ///
    /// An empty slice means the next version was published without text
    /// changes.
    pub fn changes(&self) -> Option<&[TextChange]> {
        self.0.next.get().map(|link| &*link.changes)
    }

    /// The next version, if one exists.
    pub fn next(&self) -> Option<Self> {
        self.0.next.get().map(|link| Self(link.node.clone()))
    }
}

impl PartialEq for TextVersion {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TextVersion {}

struct SnapshotData {
    buffer_id: u64,
    version: TextVersion,
    text: String,
    line_starts: Vec<usize>,
}

/// An immutable view of a buffer's text at one version.
///
/// Cloning is cheap. Two snapshots compare equal only if they are the same
/// version of the same buffer.
#[derive(Clone)]
pub struct TextSnapshot(Arc<SnapshotData>);

impl TextSnapshot {
    pub(crate) fn new(buffer_id: u64, version: TextVersion, text: String) -> Self {
        let line_starts = line_starts(&text);
        Self(Arc::new(SnapshotData {
            buffer_id,
            version,
            text,
            line_starts,
        }))
    }

    /// The full text.
    pub fn text(&self) -> &str {
        &self.0.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.text.len()
    }

    /// Whether the snapshot contains no text.
    pub fn is_empty(&self) -> bool {
        self.0.text.is_empty()
    }

    /// The version this snapshot was taken at.
    pub fn version(&self) -> &TextVersion {
        &self.0.version
    }

    /// Whether `other` is a snapshot (of any version) of the same buffer.
    pub fn is_same_buffer(&self, other: &Self) -> bool {
        self.0.buffer_id == other.0.buffer_id
    }

    /// Number of lines. Always at least one; a trailing line break starts a
    /// final empty line.
    pub fn line_count(&self) -> usize {
        self.0.line_starts.len()
    }

    /// The line with the given zero-based number.
    pub fn line(&self, line_number: usize) -> Result<TextSnapshotLine, Error> {
        if line_number >= self.line_count() {
            return Err(Error::line_out_of_range(line_number, self.line_count()));
        }
        Ok(self.line_unchecked(line_number))
    }

    /// The line containing `position`, clamped to the end of the text.
    pub(crate) fn line_containing(&self, position: usize) -> TextSnapshotLine {
        let position = position.min(self.len());
        let number = self.0.line_starts.partition_point(|&start| start <= position) - 1;
        self.line_unchecked(number)
    }

    fn line_unchecked(&self, line_number: usize) -> TextSnapshotLine {
        let starts = &self.0.line_starts;
        let start = starts[line_number];
        let (end_including_break, line_break_length) = match starts.get(line_number + 1) {
            Some(&next) => {
                let text = self.0.text.as_bytes();
                let crlf = next >= start + 2 && &text[next - 2..next] == b"\r\n";
                (next, if crlf { 2 } else { 1 })
            }
            None => (self.len(), 0),
        };
        TextSnapshotLine::new(
            self.clone(),
            line_number,
            start,
            end_including_break - line_break_length,
            line_break_length,
        )
    }

    /// The line containing `position`. The end of the buffer belongs to the
    /// last line.
    pub fn line_from_position(&self, position: usize) -> Result<TextSnapshotLine, Error> {
        self.line(self.line_number_from_position(position)?)
    }

    /// The number of the line containing `position`.
    pub fn line_number_from_position(&self, position: usize) -> Result<usize, Error> {
        if position > self.len() {
            return Err(Error::invalid_bounds(position..position, self.len()));
        }
        let starts = &self.0.line_starts;
        Ok(starts.partition_point(|&start| start <= position) - 1)
    }

    /// Iterates over all lines in order.
    pub fn lines(&self) -> impl Iterator<Item = TextSnapshotLine> + '_ {
        (0..self.line_count()).filter_map(|n| self.line(n).ok())
    }

    /// The text in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<&str, Error> {
        validate_range(self.text(), &range)?;
        Ok(&self.0.text[range])
    }

    /// A validated point on this snapshot.
    pub fn point(&self, position: usize) -> Result<SnapshotPoint, Error> {
        SnapshotPoint::new(self.clone(), position)
    }

    /// A validated span on this snapshot.
    pub fn span(&self, range: Range<usize>) -> Result<SnapshotSpan, Error> {
        SnapshotSpan::new(self.clone(), range)
    }

    /// The span covering the whole text.
    pub fn full_span(&self) -> SnapshotSpan {
        SnapshotSpan::new_unchecked(self.clone(), 0..self.len())
    }

    /// Whether any text changed between `older` and this snapshot.
    ///
    /// Versions published without changes do not count. Returns `false` when
    /// `older` is not an ancestor of this snapshot.
    pub fn any_text_changes_since(&self, older: &Self) -> bool {
        if !self.is_same_buffer(older) {
            return false;
        }
        let target = self.version().number();
        let mut version = older.version().clone();
        while version.number() != target {
            let Some(next) = version.next() else {
                return false;
            };
            if version.changes().is_some_and(|changes| !changes.is_empty()) {
                return true;
            }
            version = next;
        }
        false
    }

    /// Collects the per-version change lists leading from `self` to `target`.
    pub(crate) fn changes_to(&self, target: &Self) -> Result<Vec<Arc<[TextChange]>>, Error> {
        if !self.is_same_buffer(target) {
            return Err(Error::foreign_snapshot(0, self.len()));
        }
        let goal = target.version().number();
        if goal < self.version().number() {
            return Err(Error::backward_translation(0, self.len()));
        }
        let mut steps = Vec::new();
        let mut node = self.version().0.clone();
        while node.number != goal {
            let Some(link) = node.next.get() else {
                return Err(Error::backward_translation(0, self.len()));
            };
            steps.push(link.changes.clone());
            node = link.node.clone();
        }
        Ok(steps)
    }
}

impl PartialEq for TextSnapshot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TextSnapshot {}

impl fmt::Debug for TextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSnapshot")
            .field("buffer", &self.0.buffer_id)
            .field("version", &self.0.version.number())
            .field("len", &self.len())
            .field("lines", &self.line_count())
            .finish_non_exhaustive()
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => starts.push(i + 1),
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                starts.push(i + 1);
            }
            _ => {}
        }
        i += 1;
    }
    starts
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, TextBuffer};

    #[test]
    fn lines_for_every_break_kind() {
        let buffer = TextBuffer::new("a\nbc\r\nd\re");
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.line_count(), 4);

        let lines: Vec<_> = snapshot
            .lines()
            .map(|l| (l.start(), l.end(), l.line_break_length()))
            .collect();
        assert_eq!(lines, [(0, 1, 1), (2, 4, 2), (6, 7, 1), (8, 9, 0)]);
    }

    #[test]
    fn trailing_break_starts_empty_line() {
        let snapshot = TextBuffer::new("ABC\nDEF\n").snapshot();
        assert_eq!(snapshot.line_count(), 3);
        let last = snapshot.line(2).unwrap();
        assert_eq!((last.start(), last.end()), (8, 8));
        assert_eq!(snapshot.line_from_position(8).unwrap().line_number(), 2);
        assert_eq!(snapshot.line_from_position(7).unwrap().line_number(), 1);
        assert_eq!(snapshot.line_from_position(4).unwrap().line_number(), 1);
    }

    #[test]
    fn empty_text_has_one_line() {
        let snapshot = TextBuffer::new("").snapshot();
        assert_eq!(snapshot.line_count(), 1);
        let line = snapshot.line(0).unwrap();
        assert_eq!((line.start(), line.end(), line.line_break_length()), (0, 0, 0));
    }

    #[test]
    fn line_lookup_errors() {
        let snapshot = TextBuffer::new("ab").snapshot();
        assert_eq!(
            snapshot.line(1).unwrap_err().kind(),
            ErrorKind::LineOutOfRange
        );
        assert_eq!(
            snapshot.line_from_position(3).unwrap_err().kind(),
            ErrorKind::InvalidBounds
        );
    }

    #[test]
    fn republish_is_not_a_text_change() {
        let mut buffer = TextBuffer::new("abc");
        let first = buffer.snapshot();
        let second = buffer.republish();
        assert_ne!(first, second);
        assert!(!second.any_text_changes_since(&first));

        let third = buffer.insert(3, "d").unwrap();
        assert!(third.any_text_changes_since(&first));
        assert!(!third.any_text_changes_since(&third));
    }

    #[test]
    fn versions_chain_forward() {
        let mut buffer = TextBuffer::new("abc");
        let first = buffer.snapshot();
        let second = buffer.delete(0..1).unwrap();
        assert_eq!(first.version().number(), 0);
        assert_eq!(second.version().number(), 1);
        assert_eq!(first.version().next().as_ref(), Some(second.version()));
        assert_eq!(first.version().changes().map(<[_]>::len), Some(1));
        assert!(second.version().changes().is_none());
    }
}
