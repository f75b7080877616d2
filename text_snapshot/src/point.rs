// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cmp::Ordering;

use crate::change::translate_position;
use crate::error::validate_range;
use crate::{Error, PointTrackingMode, TextSnapshot, TextSnapshotLine};

/// A position in one [`TextSnapshot`].
///
/// Points from different snapshots are unordered: [`PartialOrd`] yields
/// `None` and [`SnapshotPoint::try_cmp`] reports an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotPoint {
    snapshot: TextSnapshot,
    position: usize,
}

impl SnapshotPoint {
    /// Returns a point after checking that `position` is in bounds and on a
    /// `char` boundary.
    pub fn new(snapshot: TextSnapshot, position: usize) -> Result<Self, Error> {
        validate_range(snapshot.text(), &(position..position))?;
        Ok(Self { snapshot, position })
    }

    /// Creates a point without validation.
    ///
    /// This is intended for callers that derive `position` from the snapshot's
    /// own line or cluster boundaries.
    #[must_use]
    #[inline]
    pub fn new_unchecked(snapshot: TextSnapshot, position: usize) -> Self {
        Self { snapshot, position }
    }

    /// The snapshot this point belongs to.
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    /// The byte offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The line containing this point.
    pub fn containing_line(&self) -> TextSnapshotLine {
        self.snapshot.line_containing(self.position)
    }

    /// Compares two points, failing if they belong to different snapshots.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, Error> {
        if self.snapshot != other.snapshot {
            return Err(Error::foreign_snapshot(other.position, self.snapshot.len()));
        }
        Ok(self.position.cmp(&other.position))
    }

    /// Translates this point forward to a later snapshot of the same buffer.
    pub fn translate_to(
        &self,
        target: &TextSnapshot,
        mode: PointTrackingMode,
    ) -> Result<Self, Error> {
        if &self.snapshot == target {
            return Ok(self.clone());
        }
        let steps = self
            .snapshot
            .changes_to(target)
            .map_err(|_| self.mismatch(target))?;
        let position = steps
            .iter()
            .fold(self.position, |position, changes| {
                translate_position(position, changes, mode)
            });
        Ok(Self::new_unchecked(target.clone(), position))
    }

    fn mismatch(&self, target: &TextSnapshot) -> Error {
        if self.snapshot.is_same_buffer(target) {
            Error::backward_translation(self.position, self.snapshot.len())
        } else {
            Error::foreign_snapshot(self.position, self.snapshot.len())
        }
    }
}

impl PartialOrd for SnapshotPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

/// A [`SnapshotPoint`] plus a count of virtual spaces past the end of its
/// line.
///
/// Virtual spaces are only kept when the point sits at the end of a line;
/// anywhere else the count is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualSnapshotPoint {
    point: SnapshotPoint,
    virtual_spaces: usize,
}

impl VirtualSnapshotPoint {
    /// Creates a virtual point, dropping the virtual spaces unless `point` is
    /// at the end of its line.
    pub fn new(point: SnapshotPoint, virtual_spaces: usize) -> Self {
        let at_line_end = point.containing_line().end() == point.position;
        let virtual_spaces = if at_line_end { virtual_spaces } else { 0 };
        Self {
            point,
            virtual_spaces,
        }
    }

    /// The physical point.
    pub fn point(&self) -> &SnapshotPoint {
        &self.point
    }

    /// The physical byte offset.
    pub fn position(&self) -> usize {
        self.point.position
    }

    /// The snapshot this point belongs to.
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.point.snapshot
    }

    /// The number of virtual spaces past the end of the line.
    pub fn virtual_spaces(&self) -> usize {
        self.virtual_spaces
    }

    /// Whether the point lies past the physical end of its line.
    pub fn is_in_virtual_space(&self) -> bool {
        self.virtual_spaces > 0
    }

    /// The same physical point without virtual spaces.
    #[must_use]
    pub fn without_virtual_space(&self) -> Self {
        Self {
            point: self.point.clone(),
            virtual_spaces: 0,
        }
    }

    /// Compares two points, failing if they belong to different snapshots.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, Error> {
        Ok(self
            .point
            .try_cmp(&other.point)?
            .then(self.virtual_spaces.cmp(&other.virtual_spaces)))
    }

    /// Translates to a later snapshot, keeping virtual spaces only if the
    /// translated point is still at the end of its line.
    pub fn translate_to(&self, target: &TextSnapshot) -> Result<Self, Error> {
        let point = self.point.translate_to(target, PointTrackingMode::Positive)?;
        Ok(Self::new(point, self.virtual_spaces))
    }
}

impl From<SnapshotPoint> for VirtualSnapshotPoint {
    fn from(point: SnapshotPoint) -> Self {
        Self {
            point,
            virtual_spaces: 0,
        }
    }
}

impl PartialOrd for VirtualSnapshotPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}
