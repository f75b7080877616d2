// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{SnapshotPoint, SnapshotSpan, TextSnapshot};

/// One line of a [`TextSnapshot`], with or without its line break.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSnapshotLine {
    snapshot: TextSnapshot,
    line_number: usize,
    start: usize,
    end: usize,
    line_break_length: usize,
}

impl TextSnapshotLine {
    pub(crate) fn new(
        snapshot: TextSnapshot,
        line_number: usize,
        start: usize,
        end: usize,
        line_break_length: usize,
    ) -> Self {
        Self {
            snapshot,
            line_number,
            start,
            end,
            line_break_length,
        }
    }

    /// The snapshot this line belongs to.
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    /// Zero-based line number.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Offset of the first character.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset just past the last character, before the line break.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Offset just past the line break.
    pub fn end_including_line_break(&self) -> usize {
        self.end + self.line_break_length
    }

    /// Length of the line break: 0 on the last line, 2 for `\r\n`, otherwise 1.
    pub fn line_break_length(&self) -> usize {
        self.line_break_length
    }

    /// Length of the line's text without the line break.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the line has no text (it may still have a line break).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The line's text without the line break.
    pub fn text(&self) -> &str {
        &self.snapshot.text()[self.start..self.end]
    }

    /// The line's start as a point.
    pub fn start_point(&self) -> SnapshotPoint {
        SnapshotPoint::new_unchecked(self.snapshot.clone(), self.start)
    }

    /// The line's end as a point.
    pub fn end_point(&self) -> SnapshotPoint {
        SnapshotPoint::new_unchecked(self.snapshot.clone(), self.end)
    }

    /// The span of the line's text.
    pub fn extent(&self) -> SnapshotSpan {
        SnapshotSpan::new_unchecked(self.snapshot.clone(), self.start..self.end)
    }

    /// The span of the line's text and its line break.
    pub fn extent_including_line_break(&self) -> SnapshotSpan {
        SnapshotSpan::new_unchecked(
            self.snapshot.clone(),
            self.start..self.end_including_line_break(),
        )
    }
}
