// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection model and painting.

mod painter;

use core::fmt;

use text_snapshot::{
    NormalizedSpans, SnapshotPoint, SnapshotSpan, TextSnapshot, VirtualSnapshotPoint,
    VirtualSnapshotSpan,
};

use crate::error::{Result, ViewError};
use crate::layout::{LineSource, VisualLine};
use crate::memo::Memo;

pub(crate) use painter::SelectionPainter;
#[cfg(test)]
pub(crate) use painter::visual_overlaps_for_line;

/// How the selection extends across lines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Everything between the two endpoints.
    #[default]
    Stream,
    /// A rectangle between the x coordinates of the two endpoints.
    Box,
}

/// What the view has to do with the selection painters after a selection
/// operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Paint {
    Nothing,
    Update,
    Clear,
}

/// The result of a selection operation.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SelectionOutcome {
    pub(crate) paint: Paint,
    /// Whether `SelectionChanged` has to be raised.
    pub(crate) raise: bool,
    /// Whether the active painter switched between focused and unfocused.
    pub(crate) activation_changed: bool,
}

impl SelectionOutcome {
    fn paint(paint: Paint) -> Self {
        Self {
            paint,
            raise: false,
            activation_changed: false,
        }
    }
}

/// Anchor and active points plus the derived, lazily computed span lists.
///
/// While the selection is empty, observers see the caret position in place
/// of both points.
#[derive(Debug)]
pub(crate) struct Selection {
    anchor: VirtualSnapshotPoint,
    active: VirtualSnapshotPoint,
    mode: SelectionMode,
    left_x: f64,
    right_x: f64,
    is_active: bool,
    activation_tracks_focus: bool,
    has_focus: bool,
    virtual_spans: Memo<Vec<VirtualSnapshotSpan>>,
    selected_spans: Memo<NormalizedSpans>,
}

impl Selection {
    pub(crate) fn new(snapshot: &TextSnapshot) -> Self {
        let origin = VirtualSnapshotPoint::from(SnapshotPoint::new_unchecked(snapshot.clone(), 0));
        Self {
            anchor: origin.clone(),
            active: origin,
            mode: SelectionMode::Stream,
            left_x: 0.0,
            right_x: 0.0,
            is_active: false,
            activation_tracks_focus: true,
            has_focus: false,
            virtual_spans: Memo::new(),
            selected_spans: Memo::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    pub(crate) fn is_reversed(&self) -> bool {
        self.active < self.anchor
    }

    pub(crate) fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub(crate) fn is_active(&self) -> bool {
        self.is_active
    }

    pub(crate) fn activation_tracks_focus(&self) -> bool {
        self.activation_tracks_focus
    }

    /// Selects from `anchor` to `active`, snapping both to text element
    /// boundaries. Equal points clear the selection.
    pub(crate) fn select(
        &mut self,
        source: &dyn LineSource,
        anchor: VirtualSnapshotPoint,
        active: VirtualSnapshotPoint,
    ) -> Result<SelectionOutcome> {
        for (name, point) in [("anchor", &anchor), ("active", &active)] {
            if point.snapshot() != source.snapshot() {
                log::warn!("selection {name} point is on a stale snapshot");
                return Err(ViewError::invalid_snapshot(format!(
                    "the {name} point does not belong to the view's snapshot"
                )));
            }
        }
        if anchor == active {
            return Ok(self.clear(false));
        }
        let anchor = self.normalize_point(source, &anchor)?;
        let active = self.normalize_point(source, &active)?;
        if anchor == active {
            return Ok(self.clear(false));
        }
        self.inner_select(source, anchor, active)
    }

    fn inner_select(
        &mut self,
        source: &dyn LineSource,
        anchor: VirtualSnapshotPoint,
        active: VirtualSnapshotPoint,
    ) -> Result<SelectionOutcome> {
        debug_assert!(anchor != active, "an empty selection goes through clear");
        let (start, end) = if anchor > active {
            (&active, &anchor)
        } else {
            (&anchor, &active)
        };
        if self.mode == SelectionMode::Box {
            let start_line = source.line_containing(start.position())?;
            let end_line = source.line_containing(end.position())?;
            let left = start_line.extended_character_bounds(start)?.leading;
            let right = end_line.extended_character_bounds(end)?.leading;
            (self.left_x, self.right_x) = if right < left { (right, left) } else { (left, right) };
        }
        let empty_before = self.is_empty();
        let activation_changed = self.track_focus();
        self.anchor = anchor;
        self.active = active;
        let raise = self.changed(empty_before, false, true);
        Ok(SelectionOutcome {
            paint: Paint::Update,
            raise,
            activation_changed,
        })
    }

    /// Collapses the selection onto its active point. With `reset_mode` the
    /// mode returns to [`SelectionMode::Stream`].
    pub(crate) fn clear(&mut self, reset_mode: bool) -> SelectionOutcome {
        let empty_before = self.is_empty();
        self.anchor = self.active.clone();
        let activation_changed = self.track_focus();
        if reset_mode {
            self.mode = SelectionMode::Stream;
        }
        let raise = self.changed(empty_before, true, false);
        SelectionOutcome {
            paint: Paint::Clear,
            raise,
            activation_changed,
        }
    }

    pub(crate) fn set_mode(
        &mut self,
        source: &dyn LineSource,
        mode: SelectionMode,
    ) -> Result<SelectionOutcome> {
        if self.mode == mode {
            return Ok(SelectionOutcome::paint(Paint::Nothing));
        }
        self.mode = mode;
        if self.is_empty() {
            return Ok(SelectionOutcome::paint(Paint::Nothing));
        }
        self.select(source, self.anchor.clone(), self.active.clone())
    }

    /// Brings the points to the snapshot of `source` after a layout pass.
    pub(crate) fn layout_changed(
        &mut self,
        source: &dyn LineSource,
        snapshot_changed: bool,
    ) -> Result<SelectionOutcome> {
        if self.is_empty() {
            let origin = SnapshotPoint::new_unchecked(source.snapshot().clone(), 0);
            self.active = origin.into();
            self.anchor = self.active.clone();
            if snapshot_changed {
                self.invalidate();
            }
        } else if snapshot_changed {
            let anchor = self.anchor.translate_to(source.snapshot())?;
            let active = self.active.translate_to(source.snapshot())?;
            let normalized_anchor = self.normalize_point(source, &anchor)?;
            let normalized_active = self.normalize_point(source, &active)?;
            if normalized_anchor == normalized_active {
                return Ok(self.clear(false));
            }
            if normalized_anchor != anchor
                || normalized_active != active
                || self.mode == SelectionMode::Box
            {
                return self.inner_select(source, normalized_anchor, normalized_active);
            }
            self.anchor = normalized_anchor;
            self.active = normalized_active;
            self.invalidate();
        }
        Ok(SelectionOutcome::paint(Paint::Update))
    }

    /// Drops virtual space from both endpoints once virtual space is turned
    /// off, unless the selection is a box.
    pub(crate) fn virtual_space_disabled(
        &mut self,
        source: &dyn LineSource,
        caret: &VirtualSnapshotPoint,
    ) -> Result<SelectionOutcome> {
        if self.mode == SelectionMode::Box {
            return Ok(SelectionOutcome::paint(Paint::Nothing));
        }
        let anchor = self.anchor_point(caret).without_virtual_space();
        self.select(source, anchor, caret.without_virtual_space())
    }

    pub(crate) fn set_has_focus(&mut self, has_focus: bool) -> bool {
        self.has_focus = has_focus;
        self.activation_tracks_focus && self.set_is_active(has_focus)
    }

    /// Returns whether the active painter has to change.
    pub(crate) fn set_is_active(&mut self, is_active: bool) -> bool {
        let changed = self.is_active != is_active;
        self.is_active = is_active;
        changed
    }

    pub(crate) fn set_activation_tracks_focus(&mut self, tracks: bool) -> bool {
        if self.activation_tracks_focus == tracks {
            return false;
        }
        self.activation_tracks_focus = tracks;
        tracks && self.set_is_active(self.has_focus)
    }

    fn track_focus(&mut self) -> bool {
        self.set_activation_tracks_focus(true)
    }

    fn changed(&mut self, empty_before: bool, empty_after: bool, moved: bool) -> bool {
        if moved || empty_before != empty_after {
            self.invalidate();
        }
        moved || !(empty_before && empty_after)
    }

    fn invalidate(&mut self) {
        self.virtual_spans.invalidate();
        self.selected_spans.invalidate();
    }

    /// Box endpoints are kept as given; stream endpoints are snapped with
    /// [`normalize_point`].
    fn normalize_point(
        &self,
        source: &dyn LineSource,
        point: &VirtualSnapshotPoint,
    ) -> Result<VirtualSnapshotPoint> {
        match self.mode {
            SelectionMode::Box => Ok(point.clone()),
            SelectionMode::Stream => normalize_point(source, point),
        }
    }

    fn anchor_point(&self, caret: &VirtualSnapshotPoint) -> VirtualSnapshotPoint {
        if self.is_empty() {
            caret.clone()
        } else {
            self.anchor.clone()
        }
    }

    fn active_point(&self, caret: &VirtualSnapshotPoint) -> VirtualSnapshotPoint {
        if self.is_empty() {
            caret.clone()
        } else {
            self.active.clone()
        }
    }
}

/// Keeps virtual space at the end of a line and snaps interior points to
/// the start of their text element.
fn normalize_point(
    source: &dyn LineSource,
    point: &VirtualSnapshotPoint,
) -> Result<VirtualSnapshotPoint> {
    let line = source.line_containing(point.position())?;
    if point.position() >= line.end() {
        let end = SnapshotPoint::new_unchecked(line.snapshot().clone(), line.end());
        return Ok(VirtualSnapshotPoint::new(end, point.virtual_spaces()));
    }
    Ok(line.text_element_span(point.position())?.start_point().into())
}

/// The selection as seen from outside the view: an empty selection reports
/// the caret position for both of its points.
#[derive(Copy, Clone)]
pub struct SelectionView<'a> {
    selection: &'a Selection,
    source: &'a dyn LineSource,
    caret: &'a VirtualSnapshotPoint,
}

impl<'a> SelectionView<'a> {
    pub(crate) fn new(
        selection: &'a Selection,
        source: &'a dyn LineSource,
        caret: &'a VirtualSnapshotPoint,
    ) -> Self {
        Self {
            selection,
            source,
            caret,
        }
    }

    /// Whether the anchor and active points are equal.
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Whether the active point precedes the anchor.
    pub fn is_reversed(&self) -> bool {
        self.selection.is_reversed()
    }

    /// The selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Whether the selection is painted with the focused brush.
    pub fn is_active(&self) -> bool {
        self.selection.is_active()
    }

    /// Whether activity follows keyboard focus.
    pub fn activation_tracks_focus(&self) -> bool {
        self.selection.activation_tracks_focus()
    }

    /// The fixed end of the selection.
    pub fn anchor_point(&self) -> VirtualSnapshotPoint {
        self.selection.anchor_point(self.caret)
    }

    /// The moving end of the selection.
    pub fn active_point(&self) -> VirtualSnapshotPoint {
        self.selection.active_point(self.caret)
    }

    /// The earlier endpoint.
    pub fn start(&self) -> VirtualSnapshotPoint {
        if self.is_reversed() {
            self.active_point()
        } else {
            self.anchor_point()
        }
    }

    /// The later endpoint.
    pub fn end(&self) -> VirtualSnapshotPoint {
        if self.is_reversed() {
            self.anchor_point()
        } else {
            self.active_point()
        }
    }

    /// The span from [`start`](Self::start) to [`end`](Self::end).
    pub fn stream_selection_span(&self) -> Result<VirtualSnapshotSpan> {
        Ok(VirtualSnapshotSpan::new(self.start(), self.end())?)
    }

    /// The selected spans, one per line in box mode.
    pub fn virtual_selected_spans(&self) -> Result<Vec<VirtualSnapshotSpan>> {
        if self.is_empty() {
            return Ok(vec![VirtualSnapshotSpan::new(
                self.caret.clone(),
                self.caret.clone(),
            )?]);
        }
        let spans = self
            .selection
            .virtual_spans
            .get_or_try_init(|| self.compute_virtual_spans())?;
        Ok(spans.clone())
    }

    /// The physical parts of [`virtual_selected_spans`], sorted and merged.
    ///
    /// [`virtual_selected_spans`]: Self::virtual_selected_spans
    pub fn selected_spans(&self) -> Result<NormalizedSpans> {
        if self.is_empty() {
            let position = self.caret.position();
            let snapshot = self.caret.snapshot().clone();
            let span = SnapshotSpan::new_unchecked(snapshot, position..position);
            return Ok(NormalizedSpans::new([span])?);
        }
        let spans = self.selection.selected_spans.get_or_try_init(|| {
            let spans = self.virtual_selected_spans()?;
            Ok::<_, ViewError>(NormalizedSpans::new(
                spans.iter().map(VirtualSnapshotSpan::snapshot_span),
            )?)
        })?;
        Ok(spans.clone())
    }

    /// The part of the selection on `line`.
    ///
    /// An empty selection yields the caret's empty span on the line holding
    /// the caret and `None` elsewhere.
    pub fn selection_on_line(&self, line: &VisualLine) -> Result<Option<VirtualSnapshotSpan>> {
        if line.snapshot() != self.source.snapshot() {
            return Err(ViewError::invalid_snapshot("the line belongs to another snapshot"));
        }
        if self.is_empty() {
            if line.contains_buffer_position(self.caret.position()) {
                return Ok(Some(VirtualSnapshotSpan::new(
                    self.caret.clone(),
                    self.caret.clone(),
                )?));
            }
            return Ok(None);
        }
        let mut start = self.start();
        let mut end = self.end();
        if end.position() < line.start() || start.position() > line.end() {
            return Ok(None);
        }
        if self.mode() == SelectionMode::Box {
            let left = line.insertion_buffer_position_from_x(self.selection.left_x);
            let right = line.insertion_buffer_position_from_x(self.selection.right_x);
            let (start, end) = if left <= right { (left, right) } else { (right, left) };
            return Ok(Some(VirtualSnapshotSpan::new(start, end)?));
        }
        if start.position() < line.start() {
            start = SnapshotPoint::new_unchecked(line.snapshot().clone(), line.start()).into();
        }
        if end.position() > line.end() {
            end = SnapshotPoint::new_unchecked(
                line.snapshot().clone(),
                line.end_including_line_break(),
            )
            .into();
        }
        if start == end {
            return Ok(None);
        }
        Ok(Some(VirtualSnapshotSpan::new(start, end)?))
    }

    fn compute_virtual_spans(&self) -> Result<Vec<VirtualSnapshotSpan>> {
        if self.mode() == SelectionMode::Stream {
            return Ok(vec![self.stream_selection_span()?]);
        }
        let end = self.end();
        let mut spans = Vec::new();
        let mut current = self.start().position();
        loop {
            let line = self.source.line_containing(current)?;
            if let Some(span) = self.selection_on_line(&line)? {
                spans.push(span);
            }
            if line.is_last_line() {
                break;
            }
            current = line.end_including_line_break();
            if current > end.position() {
                break;
            }
        }
        Ok(spans)
    }
}

impl fmt::Debug for SelectionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionView")
            .field("selection", self.selection)
            .field("caret", self.caret)
            .finish_non_exhaustive()
    }
}
