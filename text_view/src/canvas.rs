// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::Brush;
use peniko::kurbo::{BezPath, Point, Rect};

use crate::layout::GlyphRun;

/// Drawing target for [`TextView::render`](crate::TextView::render).
///
/// All coordinates are in device pixels relative to the top left corner of
/// the viewport.
pub trait Canvas {
    /// Fills `path` with the non-zero rule.
    fn fill_path(&mut self, path: &BezPath, brush: &Brush);

    /// Fills an axis aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, brush: &Brush);

    /// Draws the glyphs of `run` with the run's brush.
    ///
    /// `origin` is the baseline origin of the line; glyph `x` positions are
    /// relative to it.
    fn draw_glyph_run(&mut self, run: &GlyphRun, origin: Point);
}
