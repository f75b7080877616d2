// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::borrow::Cow;

use hashbrown::HashMap;
use peniko::kurbo::Rect;
use text_snapshot::{PointTrackingMode, TextSnapshot};

use super::collection::ViewLineCollection;
use super::engine::LineLayoutEngine;
use super::line::{LineChange, VisibilityState, VisualLine};
use crate::error::{Result, ViewError};

/// The visible rectangle of the view, in view coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Viewport {
    /// Creates a viewport at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The viewport as a rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right(), self.bottom())
    }
}

/// Where [`ViewLayout::display_line_containing`] places a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewRelativePosition {
    /// The line's top is placed at a distance below the viewport top.
    Top,
    /// The line's bottom is placed at a distance above the viewport bottom.
    Bottom,
}

/// Read access to the formatted state of a view.
///
/// Caret and selection logic query lines through this trait.
pub trait LineSource {
    /// The snapshot the lines are formatted for.
    fn snapshot(&self) -> &TextSnapshot;

    /// The formatted lines.
    fn lines(&self) -> &ViewLineCollection;

    /// The viewport.
    fn viewport(&self) -> Viewport;

    /// The line containing `position`.
    ///
    /// Positions outside the formatted span get a freshly formatted
    /// [`VisibilityState::Unattached`] line.
    fn line_containing(&self, position: usize) -> Result<Cow<'_, VisualLine>>;
}

/// State captured before a layout pass.
#[derive(Clone, Debug)]
pub(crate) struct LayoutPass {
    pub(crate) old_snapshot: TextSnapshot,
    pub(crate) old_viewport: Viewport,
}

/// Owns the snapshot, the viewport and the formatted lines covering it.
#[derive(Debug)]
pub struct ViewLayout {
    engine: LineLayoutEngine,
    snapshot: TextSnapshot,
    lines: ViewLineCollection,
    viewport: Viewport,
}

impl ViewLayout {
    /// Formats `snapshot` from its first line at the top of `viewport`.
    pub fn new(
        engine: LineLayoutEngine,
        snapshot: TextSnapshot,
        viewport: Viewport,
    ) -> Result<Self> {
        let first = engine.layout(&snapshot.line(0)?)?;
        let mut layout = Self {
            engine,
            snapshot,
            lines: ViewLineCollection::new(vec![first])?,
            viewport,
        };
        layout.perform_layout(0, viewport.top, false)?;
        Ok(layout)
    }

    /// The layout engine.
    pub fn engine(&self) -> &LineLayoutEngine {
        &self.engine
    }

    /// The largest text right edge among the formatted lines.
    pub fn max_text_right_coordinate(&self) -> f64 {
        self.lines
            .iter()
            .map(VisualLine::text_right)
            .fold(0.0, f64::max)
    }

    /// Moves to a later snapshot of the same buffer and reformats every line.
    ///
    /// The first formatted line keeps its position, tracked through the edit.
    pub(crate) fn set_snapshot(&mut self, snapshot: TextSnapshot) -> Result<LayoutPass> {
        if !snapshot.is_same_buffer(&self.snapshot) {
            return Err(ViewError::invalid_snapshot(
                "the new snapshot belongs to another buffer",
            ));
        }
        if snapshot.version().number() < self.snapshot.version().number() {
            return Err(ViewError::not_supported("moving a view to an older snapshot"));
        }
        let first = self.lines.first_line();
        let top = first.top();
        let anchor = first
            .snapshot_line()
            .start_point()
            .translate_to(&snapshot, PointTrackingMode::Negative)?;
        let anchor_line = snapshot.line_number_from_position(anchor.position())?;
        let pass = self.begin();
        self.snapshot = snapshot;
        self.perform_layout(anchor_line, top, false)?;
        Ok(pass)
    }

    /// Changes the viewport size, keeping the first line in place.
    pub(crate) fn set_viewport_size(&mut self, width: f64, height: f64) -> Result<LayoutPass> {
        if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
            return Err(ViewError::invalid_argument(format!(
                "invalid viewport size {width}x{height}"
            )));
        }
        let pass = self.begin();
        self.viewport.width = width;
        self.viewport.height = height;
        self.relayout_in_place()?;
        Ok(pass)
    }

    /// Moves the viewport down by `pixels` (up when negative).
    pub(crate) fn scroll_vertically(&mut self, pixels: f64) -> Result<LayoutPass> {
        if !pixels.is_finite() {
            return Err(ViewError::invalid_argument("scroll distance must be finite"));
        }
        let pass = self.begin();
        self.viewport.top += pixels;
        self.relayout_in_place()?;
        Ok(pass)
    }

    /// Moves the viewport's left edge, clamped at zero. Lines are kept as
    /// they are.
    pub(crate) fn set_viewport_left(&mut self, left: f64) -> Result<LayoutPass> {
        if left.is_nan() {
            return Err(ViewError::invalid_argument("viewport left must be a number"));
        }
        let pass = self.begin();
        self.viewport.left = left.max(0.0);
        for line in self.lines.lines_mut() {
            line.change = LineChange::None;
            line.delta_y = 0.0;
        }
        Ok(pass)
    }

    /// Relayout placing the line containing `position` relative to the
    /// viewport.
    pub(crate) fn display_line_containing(
        &mut self,
        position: usize,
        distance: f64,
        relative_to: ViewRelativePosition,
    ) -> Result<LayoutPass> {
        if !distance.is_finite() {
            return Err(ViewError::invalid_argument("distance must be finite"));
        }
        let line_number = self.snapshot.line_number_from_position(position)?;
        let top = match relative_to {
            ViewRelativePosition::Top => self.viewport.top + distance,
            ViewRelativePosition::Bottom => {
                let height = match self.lines.line_at(position) {
                    Some(line) => line.height(),
                    None => self.engine.layout(&self.snapshot.line(line_number)?)?.height(),
                };
                self.viewport.bottom() - distance - height
            }
        };
        let pass = self.begin();
        self.perform_layout(line_number, top, true)?;
        Ok(pass)
    }

    fn begin(&self) -> LayoutPass {
        LayoutPass {
            old_snapshot: self.snapshot.clone(),
            old_viewport: self.viewport,
        }
    }

    fn relayout_in_place(&mut self) -> Result<()> {
        let first = self.lines.first_line();
        let (line_number, top) = (first.line_number(), first.top());
        self.perform_layout(line_number, top, true)
    }

    /// Formats the lines covering the viewport around an anchor line placed
    /// at `anchor_top`.
    ///
    /// With `reuse`, lines already formatted for the current snapshot keep
    /// their identity and are reported as translated when they move.
    pub(crate) fn perform_layout(
        &mut self,
        anchor_line: usize,
        anchor_top: f64,
        reuse: bool,
    ) -> Result<()> {
        let mut old: HashMap<usize, VisualLine> = HashMap::new();
        if reuse && self.lines.snapshot() == &self.snapshot {
            old = self
                .lines
                .clone()
                .into_lines()
                .into_iter()
                .map(|line| (line.line_number(), line))
                .collect();
        }
        let mut lines = self.format_around(&mut old, anchor_line, anchor_top)?;

        let viewport = self.viewport;
        if !lines.iter().any(|(line, top)| intersects(*top, *top + line.height(), &viewport)) {
            // Scrolled past the end: pin the last formatted line to the top.
            let last = lines.last().map_or(anchor_line, |(line, _)| line.line_number());
            lines = self.format_around(&mut old, last, viewport.top)?;
        }

        let mut formatted = Vec::with_capacity(lines.len());
        for (mut line, top) in lines {
            let bottom = top + line.height();
            if !intersects(top, bottom, &viewport) {
                continue;
            }
            let previous = old_top(&line);
            if let Some(previous) = previous {
                line.delta_y = top - previous;
                line.change = if line.delta_y == 0.0 {
                    LineChange::None
                } else {
                    LineChange::Translated
                };
            } else {
                line.delta_y = 0.0;
                line.change = LineChange::NewOrReformatted;
            }
            line.top = top;
            line.visibility = if top >= viewport.top && bottom <= viewport.bottom() {
                VisibilityState::FullyVisible
            } else {
                VisibilityState::PartiallyVisible
            };
            formatted.push(line);
        }
        self.lines = ViewLineCollection::new(formatted)?;
        log::debug!(
            "layout: lines {}..={} of {} (viewport top {}, height {})",
            self.lines.first_line().line_number(),
            self.lines.last_line().line_number(),
            self.snapshot.line_count(),
            viewport.top,
            viewport.height
        );
        Ok(())
    }

    /// Formats the anchor line and its neighbors until the viewport is
    /// covered. Returns each line with its new top.
    fn format_around(
        &self,
        old: &mut HashMap<usize, VisualLine>,
        anchor_line: usize,
        anchor_top: f64,
    ) -> Result<Vec<(VisualLine, f64)>> {
        let viewport = self.viewport;
        let line_count = self.snapshot.line_count();
        let anchor_line = anchor_line.min(line_count - 1);

        let anchor = self.format(old, anchor_line)?;
        let mut bottom = anchor_top + anchor.height();
        let mut lines = vec![(anchor, anchor_top)];

        let mut top = anchor_top;
        let mut number = anchor_line;
        let mut above = Vec::new();
        while top > viewport.top && number > 0 {
            number -= 1;
            let line = self.format(old, number)?;
            top -= line.height();
            above.push((line, top));
        }
        above.reverse();
        above.append(&mut lines);
        let mut lines = above;

        // The document never starts below the viewport top.
        if let Some((first, first_top)) = lines.first() {
            if first.line_number() == 0 && *first_top > viewport.top {
                let shift = viewport.top - *first_top;
                for (_, top) in &mut lines {
                    *top += shift;
                }
                bottom += shift;
            }
        }

        let mut number = lines.last().map_or(anchor_line, |(line, _)| line.line_number()) + 1;
        while bottom < viewport.bottom() && number < line_count {
            let line = self.format(old, number)?;
            let top = bottom;
            bottom += line.height();
            lines.push((line, top));
            number += 1;
        }
        Ok(lines)
    }

    fn format(
        &self,
        old: &mut HashMap<usize, VisualLine>,
        line_number: usize,
    ) -> Result<VisualLine> {
        match old.remove(&line_number) {
            Some(line) => Ok(line),
            None => self.engine.layout(&self.snapshot.line(line_number)?),
        }
    }
}

/// The top a reused line had before the pass, or `None` for a new line.
fn old_top(line: &VisualLine) -> Option<f64> {
    (line.visibility != VisibilityState::Unattached).then_some(line.top)
}

/// Whether a line spanning `top..bottom` is shown in `viewport`. A line
/// crossing the viewport top counts even when the viewport has no height.
fn intersects(top: f64, bottom: f64, viewport: &Viewport) -> bool {
    bottom > viewport.top && (top < viewport.bottom() || top <= viewport.top)
}

impl LineSource for ViewLayout {
    fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    fn lines(&self) -> &ViewLineCollection {
        &self.lines
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn line_containing(&self, position: usize) -> Result<Cow<'_, VisualLine>> {
        if let Some(line) = self.lines.line_at(position) {
            return Ok(Cow::Borrowed(line));
        }
        let line = self.snapshot.line_from_position(position)?;
        Ok(Cow::Owned(self.engine.layout(&line)?))
    }
}
