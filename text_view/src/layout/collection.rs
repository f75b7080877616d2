// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use text_snapshot::{SnapshotSpan, TextSnapshot};

use super::line::{LineId, TextBounds, VisibilityState, VisualLine};
use crate::error::{Result, ViewError};

/// The formatted lines of the view, in document order.
///
/// The lines are consecutive snapshot lines of one snapshot and there is
/// always at least one.
#[derive(Clone, Debug)]
pub struct ViewLineCollection {
    lines: Vec<VisualLine>,
}

impl ViewLineCollection {
    pub(crate) fn new(lines: Vec<VisualLine>) -> Result<Self> {
        let Some(first) = lines.first() else {
            return Err(ViewError::invalid_argument("a line collection cannot be empty"));
        };
        let snapshot = first.snapshot();
        for pair in lines.windows(2) {
            if pair[1].snapshot() != snapshot
                || pair[1].line_number() != pair[0].line_number() + 1
            {
                return Err(ViewError::invalid_argument(
                    "collection lines must be consecutive lines of one snapshot",
                ));
            }
        }
        Ok(Self { lines })
    }

    /// The snapshot the lines were formatted from.
    pub fn snapshot(&self) -> &TextSnapshot {
        self.lines[0].snapshot()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false`: a collection holds at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The line at `index`.
    pub fn get(&self, index: usize) -> Option<&VisualLine> {
        self.lines.get(index)
    }

    /// Iterates over the lines, top to bottom.
    pub fn iter(&self) -> core::slice::Iter<'_, VisualLine> {
        self.lines.iter()
    }

    /// The lines as a slice.
    pub fn as_slice(&self) -> &[VisualLine] {
        &self.lines
    }

    /// The topmost line.
    pub fn first_line(&self) -> &VisualLine {
        &self.lines[0]
    }

    /// The bottommost line.
    pub fn last_line(&self) -> &VisualLine {
        &self.lines[self.lines.len() - 1]
    }

    /// The first line that is at least partly visible.
    pub fn first_visible_line(&self) -> &VisualLine {
        self.lines
            .iter()
            .find(|line| line.visibility() != VisibilityState::Hidden)
            .unwrap_or_else(|| self.first_line())
    }

    /// The last line that is at least partly visible.
    pub fn last_visible_line(&self) -> &VisualLine {
        self.lines
            .iter()
            .rev()
            .find(|line| line.visibility() != VisibilityState::Hidden)
            .unwrap_or_else(|| self.last_line())
    }

    /// From the first line's start to the last line's end including its line
    /// break.
    pub fn formatted_span(&self) -> SnapshotSpan {
        SnapshotSpan::new_unchecked(
            self.snapshot().clone(),
            self.first_line().start()..self.last_line().end_including_line_break(),
        )
    }

    /// The index of the line with identity `id`.
    pub fn index_of(&self, id: LineId) -> Option<usize> {
        self.lines.iter().position(|line| line.id() == id)
    }

    /// The line with identity `id`.
    pub fn find(&self, id: LineId) -> Option<&VisualLine> {
        self.lines.iter().find(|line| line.id() == id)
    }

    /// The index of the line containing `position`.
    pub fn index_at(&self, position: usize) -> Option<usize> {
        let index = self.lines.partition_point(|line| line.start() <= position);
        let index = index.checked_sub(1)?;
        self.lines[index]
            .contains_buffer_position(position)
            .then_some(index)
    }

    /// The line containing `position`, or `None` outside the formatted span.
    pub fn line_at(&self, position: usize) -> Option<&VisualLine> {
        self.index_at(position).map(|index| &self.lines[index])
    }

    /// The line whose vertical extent contains `y`.
    pub fn line_at_y(&self, y: f64) -> Option<&VisualLine> {
        let index = self.lines.partition_point(|line| line.top() <= y);
        let line = &self.lines[index.checked_sub(1)?];
        (y < line.bottom()).then_some(line)
    }

    /// The lines that intersect `span`, per
    /// [`VisualLine::intersects_buffer_span`].
    pub fn lines_intersecting_span(&self, span: &Range<usize>) -> &[VisualLine] {
        let first = self.lines.partition_point(|line| {
            let end = line.end_including_line_break();
            end < span.start || (end == span.start && !line.is_last_line())
        });
        let last = self.lines.partition_point(|line| line.start() <= span.end);
        if first >= last {
            return &[];
        }
        &self.lines[first..last]
    }

    /// Whether `span` intersects any formatted line.
    pub fn intersects_buffer_span(&self, span: &Range<usize>) -> bool {
        !self.lines_intersecting_span(span).is_empty()
    }

    /// The text element containing `position`.
    pub fn text_element_span(&self, position: usize) -> Result<SnapshotSpan> {
        self.require_line(position)?.text_element_span(position)
    }

    /// Bounds of the text element containing `position`.
    pub fn character_bounds(&self, position: usize) -> Result<TextBounds> {
        self.require_line(position)?.character_bounds(position)
    }

    /// Bounds of `span` on every formatted line it touches.
    pub fn normalized_text_bounds(&self, span: &Range<usize>) -> Vec<TextBounds> {
        self.lines_intersecting_span(span)
            .iter()
            .flat_map(|line| line.normalized_text_bounds(span))
            .collect()
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [VisualLine] {
        &mut self.lines
    }

    pub(crate) fn into_lines(self) -> Vec<VisualLine> {
        self.lines
    }

    fn require_line(&self, position: usize) -> Result<&VisualLine> {
        self.line_at(position).ok_or_else(|| {
            ViewError::invalid_argument(format!("position {position} is not formatted"))
        })
    }
}

impl<'a> IntoIterator for &'a ViewLineCollection {
    type Item = &'a VisualLine;
    type IntoIter = core::slice::Iter<'a, VisualLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
