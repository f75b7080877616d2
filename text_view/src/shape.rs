// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shaping seam and a monospace reference shaper.

use core::fmt;

use icu_segmenter::GraphemeClusterSegmenter;
use peniko::kurbo::Point;

use crate::error::{Result, ViewError};
use crate::style::FontMetrics;

/// A glyph produced by a [`Shaper`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph identifier in the shaper's font.
    pub id: u32,
    /// Byte offset of the glyph's cluster, relative to the shaped text.
    pub cluster: usize,
    /// Pen position of the glyph.
    pub x: f64,
    /// Baseline offset of the glyph.
    pub y: f64,
    /// Horizontal advance.
    pub advance: f64,
}

/// The output of one shaping call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedText {
    /// Glyphs in visual (left to right) order.
    pub glyphs: Vec<ShapedGlyph>,
    /// Pen position after the last glyph.
    pub end: Point,
}

/// Turns a run of text into positioned glyphs.
///
/// Implementations must emit glyphs whose clusters are non-decreasing and lie
/// on `char` boundaries of the input.
pub trait Shaper: Send + Sync {
    /// Vertical metrics of the shaper's font.
    fn metrics(&self) -> FontMetrics;

    /// Shapes `text` with the pen starting at `origin`.
    ///
    /// An error is a configuration problem and fails the whole layout.
    fn shape(&self, text: &str, origin: Point) -> Result<ShapedText>;
}

/// A shaper that gives every grapheme cluster the same advance.
///
/// The glyph id is the first `char` of the cluster.
#[derive(Clone, PartialEq)]
pub struct MonospaceShaper {
    advance: f64,
    metrics: FontMetrics,
}

impl MonospaceShaper {
    /// Creates a shaper. Fails unless `advance` is finite and positive and
    /// `metrics` are valid.
    pub fn new(advance: f64, metrics: FontMetrics) -> Result<Self> {
        if !advance.is_finite() || advance <= 0.0 {
            return Err(ViewError::invalid_argument(format!(
                "monospace advance must be finite and positive, got {advance}"
            )));
        }
        if !metrics.is_valid() {
            return Err(ViewError::invalid_argument(format!(
                "invalid font metrics {metrics:?}"
            )));
        }
        Ok(Self { advance, metrics })
    }

    /// The advance of every cluster.
    pub fn advance(&self) -> f64 {
        self.advance
    }
}

impl fmt::Debug for MonospaceShaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonospaceShaper")
            .field("advance", &self.advance)
            .field("line_spacing", &self.metrics.line_spacing)
            .finish_non_exhaustive()
    }
}

impl Shaper for MonospaceShaper {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn shape(&self, text: &str, origin: Point) -> Result<ShapedText> {
        let breaks: Vec<usize> = GraphemeClusterSegmenter::new().segment_str(text).collect();
        let mut glyphs = Vec::with_capacity(breaks.len().saturating_sub(1));
        let mut x = origin.x;
        for cluster in breaks.windows(2) {
            let (start, end) = (cluster[0], cluster[1]);
            let Some(first) = text[start..end].chars().next() else {
                continue;
            };
            glyphs.push(ShapedGlyph {
                id: first as u32,
                cluster: start,
                x,
                y: origin.y,
                advance: self.advance,
            });
            x += self.advance;
        }
        Ok(ShapedText {
            glyphs,
            end: Point::new(x, origin.y),
        })
    }
}
