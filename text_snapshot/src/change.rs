// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

/// A single replacement recorded between two consecutive versions.
///
/// Positions are expressed in the coordinates of the older snapshot. The
/// changes of one version are sorted and never overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    old_position: usize,
    old_len: usize,
    new_text: String,
}

impl TextChange {
    pub(crate) fn new(old_range: Range<usize>, new_text: String) -> Self {
        Self {
            old_position: old_range.start,
            old_len: old_range.end - old_range.start,
            new_text,
        }
    }

    /// Start of the replaced range in the older snapshot.
    pub fn old_position(&self) -> usize {
        self.old_position
    }

    /// Length in bytes of the replaced text.
    pub fn old_len(&self) -> usize {
        self.old_len
    }

    /// End of the replaced range in the older snapshot.
    pub fn old_end(&self) -> usize {
        self.old_position + self.old_len
    }

    /// The replaced range in the older snapshot.
    pub fn old_range(&self) -> Range<usize> {
        self.old_position..self.old_end()
    }

    /// The inserted text.
    pub fn new_text(&self) -> &str {
        &self.new_text
    }

    /// Length in bytes of the inserted text.
    pub fn new_len(&self) -> usize {
        self.new_text.len()
    }

    /// Net change in text length.
    pub fn delta(&self) -> isize {
        self.new_len() as isize - self.old_len as isize
    }
}

/// How a point behaves when text is inserted exactly at its position, or when
/// the text around it is replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PointTrackingMode {
    /// The point moves to the end of inserted or replacing text.
    #[default]
    Positive,
    /// The point stays at the start of inserted or replacing text.
    Negative,
}

/// How the edges of a span react to insertions at the edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SpanTrackingMode {
    /// Insertions at either edge are excluded from the span.
    #[default]
    EdgeExclusive,
    /// Insertions at either edge are included in the span.
    EdgeInclusive,
    /// Both edges track positively.
    EdgePositive,
    /// Both edges track negatively.
    EdgeNegative,
}

impl SpanTrackingMode {
    pub(crate) fn edge_modes(self) -> (PointTrackingMode, PointTrackingMode) {
        use PointTrackingMode::{Negative, Positive};
        match self {
            Self::EdgeExclusive => (Positive, Negative),
            Self::EdgeInclusive => (Negative, Positive),
            Self::EdgePositive => (Positive, Positive),
            Self::EdgeNegative => (Negative, Negative),
        }
    }
}

/// Maps `position` across one version's worth of changes.
pub(crate) fn translate_position(
    position: usize,
    changes: &[TextChange],
    mode: PointTrackingMode,
) -> usize {
    // Changes are sorted and expressed in old coordinates, so applying them
    // back to front leaves the earlier changes' positions valid.
    changes
        .iter()
        .rev()
        .fold(position, |position, change| {
            translate_through(position, change, mode)
        })
}

fn translate_through(position: usize, change: &TextChange, mode: PointTrackingMode) -> usize {
    let old_position = change.old_position;
    if position < old_position {
        return position;
    }
    if position == old_position && change.old_len == 0 {
        return match mode {
            PointTrackingMode::Positive => position + change.new_len(),
            PointTrackingMode::Negative => position,
        };
    }
    if position >= change.old_end() {
        return position + change.new_len() - change.old_len;
    }
    // Inside the replaced range.
    match mode {
        PointTrackingMode::Positive => old_position + change.new_len(),
        PointTrackingMode::Negative => old_position,
    }
}

#[cfg(test)]
mod tests {
    use super::{translate_position, PointTrackingMode, TextChange};

    fn insert(at: usize, text: &str) -> TextChange {
        TextChange::new(at..at, text.into())
    }

    #[test]
    fn insertion_before_shifts() {
        let changes = [insert(2, "xyz")];
        assert_eq!(translate_position(5, &changes, PointTrackingMode::Negative), 8);
        assert_eq!(translate_position(1, &changes, PointTrackingMode::Positive), 1);
    }

    #[test]
    fn insertion_at_point_follows_mode() {
        let changes = [insert(4, "ab")];
        assert_eq!(translate_position(4, &changes, PointTrackingMode::Positive), 6);
        assert_eq!(translate_position(4, &changes, PointTrackingMode::Negative), 4);
    }

    #[test]
    fn deletion_collapses_interior_points() {
        let changes = [TextChange::new(2..6, String::new())];
        assert_eq!(translate_position(4, &changes, PointTrackingMode::Positive), 2);
        assert_eq!(translate_position(4, &changes, PointTrackingMode::Negative), 2);
        assert_eq!(translate_position(6, &changes, PointTrackingMode::Negative), 2);
        assert_eq!(translate_position(9, &changes, PointTrackingMode::Negative), 5);
    }

    #[test]
    fn several_changes_in_one_version() {
        // "0123456789" with "AB" inserted at 1 and 7..9 removed.
        let changes = [insert(1, "AB"), TextChange::new(7..9, String::new())];
        assert_eq!(translate_position(0, &changes, PointTrackingMode::Positive), 0);
        assert_eq!(translate_position(5, &changes, PointTrackingMode::Positive), 7);
        assert_eq!(translate_position(9, &changes, PointTrackingMode::Positive), 9);
        assert_eq!(translate_position(10, &changes, PointTrackingMode::Positive), 10);
    }

    #[test]
    fn delta_reports_growth() {
        assert_eq!(TextChange::new(0..3, "a".into()).delta(), -2);
        assert_eq!(insert(0, "abc").delta(), 3);
    }
}
