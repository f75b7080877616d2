// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::change::translate_position;
use crate::error::validate_range;
use crate::{Error, SnapshotPoint, SpanTrackingMode, TextSnapshot, VirtualSnapshotPoint};

/// A half-open byte range in one [`TextSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotSpan {
    snapshot: TextSnapshot,
    start: usize,
    end: usize,
}

impl SnapshotSpan {
    /// Returns a span after validating `range` against the snapshot's text.
    pub fn new(snapshot: TextSnapshot, range: Range<usize>) -> Result<Self, Error> {
        validate_range(snapshot.text(), &range)?;
        Ok(Self::new_unchecked(snapshot, range))
    }

    /// Creates a span without validation.
    #[must_use]
    #[inline]
    pub fn new_unchecked(snapshot: TextSnapshot, range: Range<usize>) -> Self {
        Self {
            snapshot,
            start: range.start,
            end: range.end,
        }
    }

    /// Creates the span between two points of the same snapshot, in either
    /// order.
    pub fn from_points(a: &SnapshotPoint, b: &SnapshotPoint) -> Result<Self, Error> {
        let (start, end) = match a.try_cmp(b)? {
            core::cmp::Ordering::Greater => (b.position(), a.position()),
            _ => (a.position(), b.position()),
        };
        Ok(Self::new_unchecked(a.snapshot().clone(), start..end))
    }

    /// The snapshot this span belongs to.
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    /// Start offset.
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// The start as a point.
    pub fn start_point(&self) -> SnapshotPoint {
        SnapshotPoint::new_unchecked(self.snapshot.clone(), self.start)
    }

    /// The end as a point.
    pub fn end_point(&self) -> SnapshotPoint {
        SnapshotPoint::new_unchecked(self.snapshot.clone(), self.end)
    }

    /// The span as a byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The covered text.
    pub fn text(&self) -> &str {
        &self.snapshot.text()[self.start..self.end]
    }

    /// Whether `position` lies in `start..end`.
    pub fn contains(&self, position: usize) -> bool {
        (self.start..self.end).contains(&position)
    }

    /// Whether the two spans share at least one byte.
    pub fn overlaps_with(&self, other: &Range<usize>) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Whether the two spans overlap or touch.
    pub fn intersects_with(&self, other: &Range<usize>) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    /// The shared bytes, if the spans overlap.
    pub fn overlap(&self, other: &Range<usize>) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then(|| Self::new_unchecked(self.snapshot.clone(), start..end))
    }

    /// The intersection, if the spans overlap or touch.
    pub fn intersection(&self, other: &Range<usize>) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then(|| Self::new_unchecked(self.snapshot.clone(), start..end))
    }

    /// Translates this span forward to a later snapshot of the same buffer.
    ///
    /// The end never moves before the start.
    pub fn translate_to(
        &self,
        target: &TextSnapshot,
        mode: SpanTrackingMode,
    ) -> Result<Self, Error> {
        if &self.snapshot == target {
            return Ok(self.clone());
        }
        let (start_mode, end_mode) = mode.edge_modes();
        let steps = self.snapshot.changes_to(target)?;
        let (start, end) = steps.iter().fold((self.start, self.end), |(start, end), changes| {
            let start = translate_position(start, changes, start_mode);
            let end = translate_position(end, changes, end_mode).max(start);
            (start, end)
        });
        Ok(Self::new_unchecked(target.clone(), start..end))
    }
}

/// A span whose endpoints may lie in virtual space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualSnapshotSpan {
    start: VirtualSnapshotPoint,
    end: VirtualSnapshotPoint,
}

impl VirtualSnapshotSpan {
    /// Creates a span from two ordered points of the same snapshot.
    pub fn new(start: VirtualSnapshotPoint, end: VirtualSnapshotPoint) -> Result<Self, Error> {
        if start.try_cmp(&end)?.is_gt() {
            return Err(Error::invalid_range(
                start.position()..end.position(),
                start.snapshot().len(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The start point.
    pub fn start(&self) -> &VirtualSnapshotPoint {
        &self.start
    }

    /// The end point.
    pub fn end(&self) -> &VirtualSnapshotPoint {
        &self.end
    }

    /// The snapshot both points belong to.
    pub fn snapshot(&self) -> &TextSnapshot {
        self.start.snapshot()
    }

    /// The physical part of the span.
    pub fn snapshot_span(&self) -> SnapshotSpan {
        SnapshotSpan::new_unchecked(
            self.snapshot().clone(),
            self.start.position()..self.end.position(),
        )
    }

    /// Whether both endpoints are the same virtual point.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether either endpoint is in virtual space.
    pub fn is_in_virtual_space(&self) -> bool {
        self.start.is_in_virtual_space() || self.end.is_in_virtual_space()
    }
}

impl From<SnapshotSpan> for VirtualSnapshotSpan {
    fn from(span: SnapshotSpan) -> Self {
        Self {
            start: span.start_point().into(),
            end: span.end_point().into(),
        }
    }
}

/// A sorted list of spans of one snapshot where overlapping or abutting
/// spans are merged.
///
/// Empty spans are kept unless they touch another span.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedSpans {
    spans: Vec<SnapshotSpan>,
}

impl NormalizedSpans {
    /// Sorts and merges `spans`. All spans must belong to the same snapshot.
    pub fn new(spans: impl IntoIterator<Item = SnapshotSpan>) -> Result<Self, Error> {
        let mut spans: Vec<_> = spans.into_iter().collect();
        if let Some(first) = spans.first() {
            let snapshot = first.snapshot.clone();
            if let Some(foreign) = spans.iter().find(|span| span.snapshot != snapshot) {
                return Err(Error::foreign_snapshot(foreign.start, snapshot.len()));
            }
        }
        spans.sort_by_key(|span| (span.start, span.end));
        let mut merged: Vec<SnapshotSpan> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }
        Ok(Self { spans: merged })
    }

    /// Number of spans after merging.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether there are no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Iterates over the spans in order.
    pub fn iter(&self) -> core::slice::Iter<'_, SnapshotSpan> {
        self.spans.iter()
    }

    /// The merged spans.
    pub fn as_slice(&self) -> &[SnapshotSpan] {
        &self.spans
    }
}

impl<'a> IntoIterator for &'a NormalizedSpans {
    type Item = &'a SnapshotSpan;
    type IntoIter = core::slice::Iter<'a, SnapshotSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
