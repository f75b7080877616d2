// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use peniko::Brush;
use smallvec::SmallVec;
use text_snapshot::{
    SnapshotPoint, SnapshotSpan, TextSnapshot, TextSnapshotLine, VirtualSnapshotPoint,
};

use crate::error::{Result, ViewError};

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a formatted line, unique for the life of the process.
///
/// A line keeps its identity while it is only translated; reformatting
/// produces a new identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(u64);

impl LineId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How much of a line is inside the viewport.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisibilityState {
    /// Entirely inside the viewport.
    FullyVisible,
    /// Partly inside the viewport.
    PartiallyVisible,
    /// Formatted but outside the viewport.
    Hidden,
    /// Formatted on demand and not part of the line collection.
    Unattached,
}

/// What happened to a line during the last layout pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineChange {
    /// Reused without moving.
    None,
    /// Formatted during the pass.
    NewOrReformatted,
    /// Reused and moved vertically by [`VisualLine::delta_y`].
    Translated,
}

/// A glyph with its absolute cluster offset and its pen position relative to
/// the line's left edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph identifier.
    pub id: u32,
    /// Byte offset of the glyph's cluster in the snapshot.
    pub cluster: usize,
    /// Pen position.
    pub x: f64,
    /// Offset from the baseline.
    pub y: f64,
    /// Advance after tab expansion.
    pub advance: f64,
}

/// A sequence of glyphs that share a style.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    pub(crate) style: String,
    pub(crate) brush: Brush,
    pub(crate) text_range: Range<usize>,
    pub(crate) glyphs: Vec<PositionedGlyph>,
}

impl GlyphRun {
    /// Name of the style the run was shaped with.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// The brush for the run's glyphs.
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// The byte range of the snapshot covered by the run.
    pub fn text_range(&self) -> Range<usize> {
        self.text_range.clone()
    }

    /// The positioned glyphs.
    pub fn glyphs(&self) -> &[PositionedGlyph] {
        &self.glyphs
    }

    /// Left edge of the run.
    pub fn left(&self) -> f64 {
        self.glyphs.first().map_or(0.0, |g| g.x)
    }

    /// Right edge of the run.
    pub fn right(&self) -> f64 {
        self.glyphs.last().map_or(0.0, |g| g.x + g.advance)
    }
}

/// A text element: the glyphs that together render a byte range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Cluster {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) left: f64,
    pub(crate) right: f64,
}

/// Bounds of a character or a run of characters.
///
/// Lines are laid out left to right, so the leading edge is the left one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextBounds {
    /// Leading (left) edge.
    pub leading: f64,
    /// Trailing (right) edge.
    pub trailing: f64,
    /// Top of the line.
    pub top: f64,
    /// Height of the line.
    pub height: f64,
    /// Top of the text.
    pub text_top: f64,
    /// Height of the text.
    pub text_height: f64,
}

impl TextBounds {
    /// Left edge.
    pub fn left(&self) -> f64 {
        self.leading
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.trailing
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.trailing - self.leading
    }

    /// Bottom of the line.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Bottom of the text.
    pub fn text_bottom(&self) -> f64 {
        self.text_top + self.text_height
    }
}

/// One snapshot line shaped, measured and positioned in view coordinates.
#[derive(Clone, Debug)]
pub struct VisualLine {
    pub(crate) id: LineId,
    pub(crate) line: TextSnapshotLine,
    pub(crate) runs: Vec<GlyphRun>,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) top: f64,
    pub(crate) height: f64,
    pub(crate) width: f64,
    pub(crate) baseline: f64,
    pub(crate) virtual_space_width: f64,
    pub(crate) visibility: VisibilityState,
    pub(crate) change: LineChange,
    pub(crate) delta_y: f64,
}

impl VisualLine {
    /// The line's identity.
    pub fn id(&self) -> LineId {
        self.id
    }

    /// The snapshot the line was formatted from.
    pub fn snapshot(&self) -> &TextSnapshot {
        self.line.snapshot()
    }

    /// The underlying snapshot line.
    pub fn snapshot_line(&self) -> &TextSnapshotLine {
        &self.line
    }

    /// Zero-based number of the snapshot line.
    pub fn line_number(&self) -> usize {
        self.line.line_number()
    }

    /// The glyph runs, left to right.
    pub fn runs(&self) -> &[GlyphRun] {
        &self.runs
    }

    /// Offset of the first character.
    pub fn start(&self) -> usize {
        self.line.start()
    }

    /// Offset just past the text, before the line break.
    pub fn end(&self) -> usize {
        self.line.end()
    }

    /// Offset just past the line break.
    pub fn end_including_line_break(&self) -> usize {
        self.line.end_including_line_break()
    }

    /// Length of the line break; zero on the last line.
    pub fn line_break_length(&self) -> usize {
        self.line.line_break_length()
    }

    /// Length of the text, excluding the line break.
    pub fn len(&self) -> usize {
        self.line.len()
    }

    /// Whether the line has no text.
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// The span of the text.
    pub fn extent(&self) -> SnapshotSpan {
        self.line.extent()
    }

    /// The span of the text and the line break.
    pub fn extent_including_line_break(&self) -> SnapshotSpan {
        self.line.extent_including_line_break()
    }

    /// Whether this is the first line of the document.
    pub fn is_first_line(&self) -> bool {
        self.line.line_number() == 0
    }

    /// Whether this is the last line of the document.
    pub fn is_last_line(&self) -> bool {
        self.line.line_break_length() == 0
    }

    /// Top edge in view coordinates.
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Height of the line.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Bottom edge in view coordinates.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Width of the text.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Distance from the top of the line to the baseline.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Left edge of the text.
    pub fn text_left(&self) -> f64 {
        0.0
    }

    /// Right edge of the text.
    pub fn text_right(&self) -> f64 {
        self.width
    }

    /// Top edge of the text.
    pub fn text_top(&self) -> f64 {
        self.top
    }

    /// Bottom edge of the text.
    pub fn text_bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Height of the text.
    pub fn text_height(&self) -> f64 {
        self.height
    }

    /// Width of one column of virtual space.
    pub fn virtual_space_width(&self) -> f64 {
        self.virtual_space_width
    }

    /// Width of the line break marker area past [`Self::text_right`].
    pub fn end_of_line_width(&self) -> f64 {
        self.virtual_space_width
    }

    /// Visibility after the last layout pass.
    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    /// What happened to the line during the last layout pass.
    pub fn change(&self) -> LineChange {
        self.change
    }

    /// Vertical movement during the last layout pass.
    pub fn delta_y(&self) -> f64 {
        self.delta_y
    }

    /// Whether `position` is on this line. The end of the buffer belongs to
    /// the last line.
    pub fn contains_buffer_position(&self, position: usize) -> bool {
        position >= self.start()
            && (position < self.end_including_line_break()
                || (position == self.end_including_line_break() && self.is_last_line()))
    }

    /// Whether `span` overlaps or touches the line, counting a span that
    /// starts at the end of the line break only on the last line.
    pub fn intersects_buffer_span(&self, span: &Range<usize>) -> bool {
        let end = self.end_including_line_break();
        span.start <= end
            && span.end >= self.start()
            && (span.start < end || self.is_last_line())
    }

    /// The start of the text element under `x`, or `None` when `x` is not
    /// over the text.
    pub fn buffer_position_from_x(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.text_left() || x >= self.text_right() {
            return None;
        }
        self.cluster_at_x(x).map(|c| c.start)
    }

    /// The insertion position nearest to `x`.
    ///
    /// Inside the text this is the closer edge of the text element under `x`.
    /// Past the end of the text it is the line end plus the nearest number of
    /// virtual spaces.
    pub fn insertion_buffer_position_from_x(&self, x: f64) -> VirtualSnapshotPoint {
        if let Some(cluster) = self.interior_cluster_at_x(x) {
            let position = if x < cluster.left + (cluster.right - cluster.left) * 0.5 {
                cluster.start
            } else {
                cluster.end
            };
            return self.point(position).into();
        }
        if x <= self.text_left() {
            return self.point(self.start()).into();
        }
        let spaces = if x > self.text_right() {
            columns((x - self.text_right()) / self.virtual_space_width, f64::round)
        } else {
            0
        };
        VirtualSnapshotPoint::new(self.point(self.end()), spaces)
    }

    /// The start of the text element containing `x`, or the line end plus the
    /// number of whole virtual spaces before `x`.
    pub fn virtual_buffer_position_from_x(&self, x: f64) -> VirtualSnapshotPoint {
        if let Some(cluster) = self.interior_cluster_at_x(x) {
            return self.point(cluster.start).into();
        }
        if x <= self.text_left() {
            return self.point(self.start()).into();
        }
        let spaces = if x > self.text_right() {
            columns((x - self.text_right()) / self.virtual_space_width, f64::floor)
        } else {
            0
        };
        VirtualSnapshotPoint::new(self.point(self.end()), spaces)
    }

    /// Bounds of the text element containing the byte at `position`.
    ///
    /// At the line end this is the end-of-line area.
    pub fn character_bounds(&self, position: usize) -> Result<TextBounds> {
        self.check_relaxed_contains(position)?;
        Ok(match self.cluster_at(position) {
            Some(cluster) => self.bounds(cluster.left, cluster.right),
            None => self.bounds(
                self.text_right(),
                self.text_right() + self.end_of_line_width(),
            ),
        })
    }

    /// Bounds of the text element at `point`, or of the virtual space column
    /// when the point is in virtual space.
    pub fn extended_character_bounds(&self, point: &VirtualSnapshotPoint) -> Result<TextBounds> {
        self.check_snapshot(point.snapshot())?;
        if point.is_in_virtual_space() {
            self.check_relaxed_contains(point.position())?;
            let leading =
                self.text_right() + point.virtual_spaces() as f64 * self.virtual_space_width;
            return Ok(self.bounds(leading, leading + self.virtual_space_width));
        }
        self.character_bounds(point.position())
    }

    /// The x coordinate where a caret at `point` is drawn: the leading edge
    /// in virtual space or at the line start, else the trailing edge of the
    /// previous element.
    pub fn x_from_virtual_position(&self, point: &VirtualSnapshotPoint) -> Result<f64> {
        if point.is_in_virtual_space() || point.position() == self.start() {
            Ok(self.extended_character_bounds(point)?.leading)
        } else {
            self.check_snapshot(point.snapshot())?;
            Ok(self.character_bounds(point.position() - 1)?.trailing)
        }
    }

    /// The text element containing `position`. At the line end this is the
    /// line break, which is empty on the last line.
    pub fn text_element_span(&self, position: usize) -> Result<SnapshotSpan> {
        self.check_relaxed_contains(position)?;
        let range = match self.cluster_at(position) {
            Some(cluster) => cluster.start..cluster.end,
            None => self.end()..self.end_including_line_break(),
        };
        Ok(SnapshotSpan::new_unchecked(self.snapshot().clone(), range))
    }

    /// Bounds of the part of `span` on this line, merged into one entry per
    /// contiguous run.
    ///
    /// A span that covers part of the line break includes the end-of-line
    /// area.
    pub fn normalized_text_bounds(&self, span: &Range<usize>) -> SmallVec<[TextBounds; 1]> {
        let mut result = SmallVec::new();
        let start = span.start.max(self.start());
        let end = span.end.min(self.end_including_line_break());
        if start >= end {
            return result;
        }
        let mut left = f64::MAX;
        let mut right = f64::MIN;
        for cluster in &self.clusters {
            if cluster.start < end && cluster.end > start {
                left = left.min(cluster.left);
                right = right.max(cluster.right);
            }
        }
        if end > self.end() {
            left = left.min(self.text_right());
            right = right.max(self.text_right() + self.end_of_line_width());
        }
        if right > left {
            result.push(self.bounds(left, right));
        }
        result
    }

    fn bounds(&self, leading: f64, trailing: f64) -> TextBounds {
        TextBounds {
            leading,
            trailing,
            top: self.top,
            height: self.height,
            text_top: self.text_top(),
            text_height: self.text_height(),
        }
    }

    fn point(&self, position: usize) -> SnapshotPoint {
        SnapshotPoint::new_unchecked(self.snapshot().clone(), position)
    }

    fn cluster_at(&self, position: usize) -> Option<&Cluster> {
        let index = self.clusters.partition_point(|c| c.end <= position);
        self.clusters
            .get(index)
            .filter(|c| c.start <= position && position < c.end)
    }

    fn cluster_at_x(&self, x: f64) -> Option<&Cluster> {
        let index = self.clusters.partition_point(|c| c.right <= x);
        self.clusters.get(index).filter(|c| c.left <= x)
    }

    fn interior_cluster_at_x(&self, x: f64) -> Option<&Cluster> {
        self.buffer_position_from_x(x)?;
        self.cluster_at_x(x)
    }

    fn check_snapshot(&self, snapshot: &TextSnapshot) -> Result<()> {
        if snapshot != self.snapshot() {
            return Err(ViewError::invalid_snapshot(
                "point does not belong to the line's snapshot",
            ));
        }
        Ok(())
    }

    fn check_relaxed_contains(&self, position: usize) -> Result<()> {
        if !self.contains_buffer_position(position) {
            return Err(ViewError::invalid_argument(format!(
                "position {position} is not on line {}",
                self.line_number()
            )));
        }
        Ok(())
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "column counts are far below usize::MAX"
)]
fn columns(value: f64, round: fn(f64) -> f64) -> usize {
    let value = round(value);
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}
