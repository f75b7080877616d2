// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{BezPath, Point, Rect, Shape};
use peniko::Brush;

use crate::layout::GlyphRun;
use crate::Canvas;

/// One drawing call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Path { bounds: Rect, brush: Brush },
    Rect { rect: Rect, brush: Brush },
    Glyphs { text_range: core::ops::Range<usize>, origin: Point },
}

/// Records drawing calls in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingCanvas {
    pub(crate) ops: Vec<Op>,
}

impl RecordingCanvas {
    /// Bounding boxes of the filled paths.
    pub(crate) fn paths(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Path { bounds, .. } => Some(*bounds),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn rects(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// A one letter summary per call: `p`ath, `r`ect or `g`lyphs.
    pub(crate) fn kinds(&self) -> String {
        self.ops
            .iter()
            .map(|op| match op {
                Op::Path { .. } => 'p',
                Op::Rect { .. } => 'r',
                Op::Glyphs { .. } => 'g',
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn fill_path(&mut self, path: &BezPath, brush: &Brush) {
        self.ops.push(Op::Path {
            bounds: path.bounding_box(),
            brush: brush.clone(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush) {
        self.ops.push(Op::Rect {
            rect,
            brush: brush.clone(),
        });
    }

    fn draw_glyph_run(&mut self, run: &GlyphRun, origin: Point) {
        self.ops.push(Op::Glyphs {
            text_range: run.text_range(),
            origin,
        });
    }
}
