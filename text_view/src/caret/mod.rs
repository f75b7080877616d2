// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The caret: position, geometry and blinking.

mod blink;

use std::borrow::Cow;

use peniko::kurbo::Rect;
use text_snapshot::{SnapshotPoint, TextSnapshot, VirtualSnapshotPoint};

use crate::error::{Result, ViewError};
use crate::layout::{LineSource, ViewRelativePosition, Viewport, VisibilityState, VisualLine};
use crate::options::{EditorOption, EditorOptions};
use crate::selection::SelectionMode;
use crate::view::SmartIndent;

pub use blink::{CaretBlinkSettings, DEFAULT_BLINK_INTERVAL, DefaultBlinkSettings, NoBlink};
pub(crate) use blink::BlinkTimer;

/// Width of the insertion caret.
pub const CARET_WIDTH: f64 = 2.0;
/// Space kept between the caret and the viewport edge when scrolling.
pub const CARET_HORIZONTAL_PADDING: f64 = 2.0;
/// Upper bound for the horizontal scroll distance used to reveal the caret.
pub const HORIZONTAL_SCROLL_PADDING: f64 = 200.0;
/// Width in pixels of one smart indentation column.
pub const INDENT_COLUMN_WIDTH: f64 = 16.0;

const ROUND_OFF_BUFFER: f64 = 0.01;

/// Which side of a line boundary the caret belongs to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PositionAffinity {
    /// The caret sticks to the preceding text.
    Predecessor,
    /// The caret sticks to the following text.
    #[default]
    Successor,
}

/// A caret location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaretPosition {
    point: VirtualSnapshotPoint,
    affinity: PositionAffinity,
}

impl CaretPosition {
    /// The caret's physical position.
    pub fn buffer_position(&self) -> &SnapshotPoint {
        self.point.point()
    }

    /// The caret's position including virtual space.
    pub fn virtual_buffer_position(&self) -> &VirtualSnapshotPoint {
        &self.point
    }

    /// Virtual spaces past the end of the line.
    pub fn virtual_spaces(&self) -> usize {
        self.point.virtual_spaces()
    }

    /// The affinity.
    pub fn affinity(&self) -> PositionAffinity {
        self.affinity
    }
}

/// What the caret needs to know about the rest of the view.
#[derive(Clone, Copy)]
pub(crate) struct CaretContext<'a> {
    pub(crate) source: &'a dyn LineSource,
    pub(crate) options: &'a EditorOptions,
    pub(crate) selection_mode: SelectionMode,
    pub(crate) selection_is_empty: bool,
    pub(crate) smart_indent: &'a dyn SmartIndent,
}

impl CaretContext<'_> {
    fn virtual_space_or_box(&self) -> bool {
        self.options.use_virtual_space() || self.selection_mode == SelectionMode::Box
    }
}

/// The result of a caret operation.
#[must_use]
#[derive(Clone, Debug)]
pub(crate) struct CaretMove {
    pub(crate) old_position: CaretPosition,
    pub(crate) new_position: CaretPosition,
    /// Whether observers are told about the move.
    pub(crate) raise: bool,
}

impl CaretMove {
    fn unchanged(position: CaretPosition) -> Self {
        Self {
            old_position: position.clone(),
            new_position: position,
            raise: false,
        }
    }

    pub(crate) fn moved(&self) -> bool {
        self.old_position != self.new_position
    }
}

/// Caret state and geometry.
///
/// Geometry is in view coordinates and follows the line the caret is on.
#[derive(Clone, Debug)]
pub struct Caret {
    point: VirtualSnapshotPoint,
    affinity: PositionAffinity,
    preferred_x: f64,
    preferred_y_offset: f64,
    bounds: Rect,
    overwrite_mode: bool,
    empty_selection: bool,
    force_virtual_space: bool,
    is_hidden: bool,
    is_contained_by_view: bool,
    opacity: f64,
}

impl Caret {
    pub(crate) fn new(snapshot: &TextSnapshot) -> Self {
        Self {
            point: SnapshotPoint::new_unchecked(snapshot.clone(), 0).into(),
            affinity: PositionAffinity::Successor,
            preferred_x: 0.0,
            preferred_y_offset: 0.0,
            bounds: Rect::ZERO,
            overwrite_mode: false,
            empty_selection: true,
            force_virtual_space: false,
            is_hidden: false,
            is_contained_by_view: false,
            opacity: 1.0,
        }
    }

    /// The current position.
    pub fn position(&self) -> CaretPosition {
        CaretPosition {
            point: self.point.clone(),
            affinity: self.affinity,
        }
    }

    pub(crate) fn point(&self) -> &VirtualSnapshotPoint {
        &self.point
    }

    /// The caret rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.bounds.x0
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.bounds.x1
    }

    /// Width: [`CARET_WIDTH`], or the width of the overwritten element.
    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    /// Top edge. Fails while the caret is not on a formatted line.
    pub fn top(&self) -> Result<f64> {
        self.require_contained()?;
        Ok(self.bounds.y0)
    }

    /// Bottom edge. Fails while the caret is not on a formatted line.
    pub fn bottom(&self) -> Result<f64> {
        self.require_contained()?;
        Ok(self.bounds.y1)
    }

    /// Height. Fails while the caret is not on a formatted line.
    pub fn height(&self) -> Result<f64> {
        self.require_contained()?;
        Ok(self.bounds.height())
    }

    /// Whether the caret is past the end of its line.
    pub fn in_virtual_space(&self) -> bool {
        self.point.is_in_virtual_space()
    }

    /// Whether the caret covers the next element instead of sitting between
    /// two. Never set in virtual space, at a line end or with a selection.
    pub fn overwrite_mode(&self) -> bool {
        self.overwrite_mode
    }

    /// The x coordinate kept across vertical moves.
    pub fn preferred_x_coordinate(&self) -> f64 {
        self.preferred_x
    }

    /// The y coordinate kept across vertical moves, clamped to `viewport`.
    pub fn preferred_y_coordinate(&self, viewport: &Viewport) -> f64 {
        (self.preferred_y_offset + viewport.top)
            .min(viewport.bottom())
            .max(viewport.top)
    }

    /// Whether the caret was hidden by its owner.
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.is_hidden = hidden;
    }

    /// Whether the caret is on a formatted line and not hidden.
    pub fn is_shown_on_screen(&self) -> bool {
        self.is_contained_by_view && !self.is_hidden
    }

    /// Current blink opacity, either 1 or 0.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub(crate) fn reset_blink(&mut self) {
        self.opacity = 1.0;
    }

    pub(crate) fn toggle_blink(&mut self) {
        self.opacity = if self.opacity == 0.0 { 1.0 } else { 0.0 };
    }

    fn require_contained(&self) -> Result<()> {
        if self.is_contained_by_view {
            Ok(())
        } else {
            Err(ViewError::invalid_state("the caret is not on a formatted line"))
        }
    }

    /// The line holding the caret.
    pub(crate) fn containing_line<'a>(
        &self,
        source: &'a dyn LineSource,
    ) -> Result<Cow<'a, VisualLine>> {
        containing_line(source, self.point.position(), self.affinity)
    }

    pub(crate) fn move_to(
        &mut self,
        ctx: &CaretContext<'_>,
        point: VirtualSnapshotPoint,
        affinity: PositionAffinity,
        capture_horizontal: bool,
    ) -> Result<CaretMove> {
        self.internal_move_to(ctx, point, affinity, capture_horizontal, true, true)
    }

    /// Places the caret on `line` at the preferred x coordinate.
    pub(crate) fn move_to_line(
        &mut self,
        ctx: &CaretContext<'_>,
        line: &VisualLine,
    ) -> Result<CaretMove> {
        check_line(ctx, line)?;
        let x = self.map_x_coordinate(ctx, line, self.preferred_x, false);
        self.move_to_line_x(ctx, line, x, true, false, true, true)
    }

    /// Places the caret on `line` near `x`.
    pub(crate) fn move_to_x(
        &mut self,
        ctx: &CaretContext<'_>,
        line: &VisualLine,
        x: f64,
        capture_horizontal: bool,
    ) -> Result<CaretMove> {
        if x.is_nan() {
            return Err(ViewError::invalid_argument("x coordinate must be a number"));
        }
        check_line(ctx, line)?;
        let x = self.map_x_coordinate(ctx, line, x, true);
        self.move_to_line_x(ctx, line, x, true, capture_horizontal, true, true)
    }

    /// Places the caret at the preferred coordinates against the current
    /// lines.
    pub(crate) fn move_to_preferred_coordinates(
        &mut self,
        ctx: &CaretContext<'_>,
    ) -> Result<CaretMove> {
        let lines = ctx.source.lines();
        let y = self.preferred_y_coordinate(&ctx.source.viewport());
        let line = lines.line_at_y(y).unwrap_or_else(|| lines.last_visible_line());
        let x = self.map_x_coordinate(ctx, line, self.preferred_x, false);
        self.move_to_line_x(ctx, line, x, ctx.virtual_space_or_box(), false, false, true)
    }

    /// Moves one text element forward, growing virtual space at a line end
    /// when it is enabled. Does nothing at the end of the buffer.
    pub(crate) fn move_to_next_caret_position(
        &mut self,
        ctx: &CaretContext<'_>,
    ) -> Result<CaretMove> {
        let old = self.position();
        let position = old.point.position();
        let line = ctx.source.line_containing(position)?;
        let snapshot = ctx.source.snapshot();
        if position == line.end() {
            if ctx.virtual_space_or_box() {
                let end = SnapshotPoint::new_unchecked(snapshot.clone(), line.end());
                let next = VirtualSnapshotPoint::new(end, old.virtual_spaces() + 1);
                return self.move_to(ctx, next, PositionAffinity::Successor, true);
            }
            if position == snapshot.len() {
                return Ok(CaretMove::unchanged(old));
            }
            let next =
                SnapshotPoint::new_unchecked(snapshot.clone(), line.end_including_line_break());
            return self.move_to(ctx, next.into(), PositionAffinity::Successor, true);
        }
        let element = line.text_element_span(position)?;
        self.move_to(ctx, element.end_point().into(), PositionAffinity::Successor, true)
    }

    /// Moves one text element back, shrinking virtual space first. Does
    /// nothing at the start of the buffer.
    pub(crate) fn move_to_previous_caret_position(
        &mut self,
        ctx: &CaretContext<'_>,
    ) -> Result<CaretMove> {
        let old = self.position();
        let position = old.point.position();
        let snapshot = ctx.source.snapshot();
        if old.virtual_spaces() > 0 {
            let line = snapshot.line_from_position(position)?;
            let spaces = if ctx.virtual_space_or_box() {
                old.virtual_spaces() - 1
            } else {
                0
            };
            let previous = VirtualSnapshotPoint::new(line.end_point(), spaces);
            return self.move_to(ctx, previous, PositionAffinity::Successor, true);
        }
        if position == 0 {
            return Ok(CaretMove::unchanged(old));
        }
        let element = ctx
            .source
            .line_containing(position - 1)?
            .text_element_span(position - 1)?;
        self.move_to(ctx, element.start_point().into(), PositionAffinity::Successor, true)
    }

    /// Follows the text after a layout pass. Returns whether the caret has
    /// to be scrolled into view because text changed while it sits on the
    /// last line and auto scroll is on.
    pub(crate) fn layout_changed(
        &mut self,
        ctx: &CaretContext<'_>,
        old_snapshot: &TextSnapshot,
    ) -> Result<(CaretMove, bool)> {
        let new_snapshot = ctx.source.snapshot();
        if old_snapshot != new_snapshot {
            self.point = self.point.translate_to(new_snapshot)?;
        }
        let text_changes = new_snapshot.any_text_changes_since(old_snapshot);
        let refresh = self.refresh(ctx, text_changes, false)?;
        let scroll = text_changes
            && ctx.options.auto_scroll()
            && self.point.point().containing_line().line_number() + 1 == new_snapshot.line_count();
        Ok((refresh, scroll))
    }

    /// Recomputes the caret at its current position.
    pub(crate) fn refresh(
        &mut self,
        ctx: &CaretContext<'_>,
        preserve_coordinates: bool,
        clear_virtual_space: bool,
    ) -> Result<CaretMove> {
        let mut point = self.point.clone();
        if clear_virtual_space && !self.force_virtual_space {
            point = point.without_virtual_space();
        }
        self.internal_move_to(
            ctx,
            point,
            self.affinity,
            preserve_coordinates,
            preserve_coordinates,
            false,
        )
    }

    /// Overwrite geometry depends on the selection being empty.
    pub(crate) fn selection_changed(
        &mut self,
        ctx: &CaretContext<'_>,
    ) -> Result<Option<CaretMove>> {
        if ctx.options.overwrite_mode() && ctx.selection_is_empty != self.empty_selection {
            return self.refresh(ctx, false, false).map(Some);
        }
        Ok(None)
    }

    pub(crate) fn option_changed(
        &mut self,
        ctx: &CaretContext<'_>,
        option: EditorOption,
    ) -> Result<Option<CaretMove>> {
        match option {
            EditorOption::OverwriteMode => self.refresh(ctx, false, false).map(Some),
            EditorOption::UseVirtualSpace if !ctx.virtual_space_or_box() => {
                self.refresh(ctx, false, true).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Where the view has to scroll vertically to show the caret's line.
    pub(crate) fn vertical_scroll(
        &self,
        source: &dyn LineSource,
    ) -> Result<Option<(usize, ViewRelativePosition)>> {
        let line = self.containing_line(source)?;
        if line.visibility() == VisibilityState::FullyVisible {
            return Ok(None);
        }
        let viewport = source.viewport();
        let fits = line.height() <= viewport.height + ROUND_OFF_BUFFER;
        let position = if line.visibility() != VisibilityState::Unattached {
            if fits {
                if line.top() < viewport.top {
                    Some(ViewRelativePosition::Top)
                } else {
                    Some(ViewRelativePosition::Bottom)
                }
            } else if line.bottom() < viewport.bottom() {
                Some(ViewRelativePosition::Bottom)
            } else if line.top() > viewport.top {
                Some(ViewRelativePosition::Top)
            } else {
                None
            }
        } else {
            let above = line.start() < source.lines().formatted_span().start();
            Some(if above == fits {
                ViewRelativePosition::Top
            } else {
                ViewRelativePosition::Bottom
            })
        };
        Ok(position.map(|position| (line.start(), position)))
    }

    /// The viewport left edge that shows the caret with some padding, or
    /// `None` when it is already visible.
    pub(crate) fn horizontal_scroll(&self, viewport: &Viewport) -> Option<f64> {
        if viewport.width == 0.0 {
            return (viewport.left != 0.0).then_some(0.0);
        }
        let amount = (viewport.width / 4.0)
            .min(HORIZONTAL_SCROLL_PADDING)
            .max(CARET_HORIZONTAL_PADDING);
        if self.bounds.x0 - CARET_HORIZONTAL_PADDING < viewport.left {
            Some(self.bounds.x0 - amount)
        } else if self.bounds.x1 + CARET_HORIZONTAL_PADDING > viewport.right() {
            Some(self.bounds.x1 + amount - viewport.width)
        } else {
            None
        }
    }

    fn map_x_coordinate(
        &self,
        ctx: &CaretContext<'_>,
        line: &VisualLine,
        x: f64,
        user_specified: bool,
    ) -> f64 {
        if x <= line.text_right() || ctx.virtual_space_or_box() {
            return x;
        }
        let mut indentation = 0.0;
        if line.is_empty() {
            if let Some(columns) = ctx.smart_indent.desired_indentation(line.snapshot_line()) {
                let text_width = line.text_right() - line.text_left();
                indentation = (columns as f64 * INDENT_COLUMN_WIDTH - text_width).max(0.0);
                if user_specified && x < line.text_right() + indentation {
                    indentation = 0.0;
                }
            }
        }
        line.text_right() + indentation
    }

    fn move_to_line_x(
        &mut self,
        ctx: &CaretContext<'_>,
        line: &VisualLine,
        x: f64,
        allow_virtual_space: bool,
        capture_horizontal: bool,
        capture_vertical: bool,
        raise: bool,
    ) -> Result<CaretMove> {
        let mut point = line.insertion_buffer_position_from_x(x);
        if !allow_virtual_space {
            point = point.without_virtual_space();
        }
        self.move_caret(
            ctx,
            point,
            PositionAffinity::Successor,
            line,
            capture_horizontal,
            capture_vertical,
            raise,
        )
    }

    fn internal_move_to(
        &mut self,
        ctx: &CaretContext<'_>,
        point: VirtualSnapshotPoint,
        affinity: PositionAffinity,
        capture_horizontal: bool,
        capture_vertical: bool,
        raise: bool,
    ) -> Result<CaretMove> {
        if point.snapshot() != ctx.source.snapshot() {
            log::warn!("caret point is on a stale snapshot");
            return Err(ViewError::invalid_snapshot(
                "the caret point does not belong to the view's snapshot",
            ));
        }
        let line = containing_line(ctx.source, point.position(), affinity)?;
        let normalized = normalize_position(&point, &line)?;
        let raise = raise || normalized != point;
        self.move_caret(
            ctx,
            normalized,
            affinity,
            &line,
            capture_horizontal,
            capture_vertical,
            raise,
        )
    }

    fn move_caret(
        &mut self,
        ctx: &CaretContext<'_>,
        point: VirtualSnapshotPoint,
        affinity: PositionAffinity,
        line: &VisualLine,
        capture_horizontal: bool,
        capture_vertical: bool,
        raise: bool,
    ) -> Result<CaretMove> {
        let overwrite = !(point.is_in_virtual_space() || point.position() == line.end())
            && ctx.options.overwrite_mode()
            && ctx.selection_is_empty;
        let (x, width) = if overwrite {
            let bounds = line.extended_character_bounds(&point)?;
            (bounds.left(), bounds.width())
        } else {
            (line.x_from_virtual_position(&point)?, CARET_WIDTH)
        };
        let preferred_y = if capture_vertical {
            Some(preferred_y_offset(ctx.source, &point, affinity)?)
        } else {
            None
        };

        let old = self.position();
        self.force_virtual_space = point.is_in_virtual_space() && !ctx.virtual_space_or_box();
        self.point = point;
        self.affinity = affinity;
        self.empty_selection = ctx.selection_is_empty;
        self.is_contained_by_view = line.visibility() != VisibilityState::Unattached;
        self.overwrite_mode = overwrite;
        self.bounds = Rect::new(x, line.text_top(), x + width, line.text_bottom());
        if capture_horizontal {
            self.preferred_x = self.bounds.x0;
        }
        if let Some(offset) = preferred_y {
            self.preferred_y_offset = offset;
        }
        let new = self.position();
        if old != new {
            log::trace!(
                "caret moved to {} (+{})",
                new.point.position(),
                new.point.virtual_spaces()
            );
        }
        Ok(CaretMove {
            old_position: old,
            new_position: new,
            raise,
        })
    }
}

fn check_line(ctx: &CaretContext<'_>, line: &VisualLine) -> Result<()> {
    if line.snapshot() == ctx.source.snapshot() {
        Ok(())
    } else {
        Err(ViewError::invalid_snapshot("the line belongs to another snapshot"))
    }
}

/// The line for a caret at `position`; a predecessor caret at the start of
/// a continuation line belongs to the line before.
fn containing_line<'a>(
    source: &'a dyn LineSource,
    position: usize,
    affinity: PositionAffinity,
) -> Result<Cow<'a, VisualLine>> {
    let line = source.line_containing(position)?;
    if affinity == PositionAffinity::Predecessor
        && line.start() == position
        && line.snapshot_line().start() != position
    {
        return source.line_containing(position - 1);
    }
    Ok(line)
}

/// Keeps virtual space only at the line end and snaps other points to the
/// start of their text element.
fn normalize_position(
    point: &VirtualSnapshotPoint,
    line: &VisualLine,
) -> Result<VirtualSnapshotPoint> {
    let needs_snap = if point.is_in_virtual_space() {
        point.position() != line.end()
    } else {
        point.position() != line.start()
    };
    if !needs_snap {
        return Ok(point.clone());
    }
    let position = if point.position() < line.end() {
        line.text_element_span(point.position())?.start()
    } else {
        line.end()
    };
    Ok(SnapshotPoint::new_unchecked(line.snapshot().clone(), position).into())
}

/// The vertical center of the caret's line relative to the viewport top,
/// using the nearest visible line when the caret's line is off screen.
fn preferred_y_offset(
    source: &dyn LineSource,
    point: &VirtualSnapshotPoint,
    affinity: PositionAffinity,
) -> Result<f64> {
    let line = containing_line(source, point.position(), affinity)?;
    let lines = source.lines();
    let line = match line.visibility() {
        VisibilityState::Unattached | VisibilityState::Hidden => {
            let last = lines.last_visible_line();
            if point.position() < last.start() {
                Cow::Borrowed(lines.first_visible_line())
            } else {
                Cow::Borrowed(last)
            }
        }
        _ => line,
    };
    Ok(line.top() + line.height() * 0.5 - source.viewport().top)
}
