// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use std::sync::Arc;

use peniko::kurbo::Point;
use text_snapshot::TextSnapshotLine;

use super::line::{
    Cluster, GlyphRun, LineChange, LineId, PositionedGlyph, VisibilityState, VisualLine,
};
use crate::classify::{ClassificationSpan, Classifier};
use crate::error::{Result, ViewError};
use crate::style::{DEFAULT_STYLE, StyleMap};

/// Tab stops are placed every `TAB_SIZE` columns.
pub const TAB_SIZE: usize = 4;

/// Shapes snapshot lines into [`VisualLine`]s.
pub struct LineLayoutEngine {
    styles: Arc<StyleMap>,
    classifier: Box<dyn Classifier>,
    virtual_space_width: f64,
}

impl LineLayoutEngine {
    /// Creates an engine.
    ///
    /// Fails with [`ViewError::InvalidArgument`] when the default style
    /// cannot shape a space or reports invalid metrics.
    pub fn new(styles: Arc<StyleMap>, classifier: Box<dyn Classifier>) -> Result<Self> {
        let default = styles.default_style();
        if !default.metrics().is_valid() {
            return Err(ViewError::invalid_argument(format!(
                "default style has invalid metrics {:?}",
                default.metrics()
            )));
        }
        let space = default.shaper().shape(" ", Point::ZERO)?;
        let virtual_space_width = space.end.x;
        if !virtual_space_width.is_finite() || virtual_space_width <= 0.0 {
            return Err(ViewError::invalid_argument("default style gives a space no width"));
        }
        Ok(Self {
            styles,
            classifier,
            virtual_space_width,
        })
    }

    /// The style map.
    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// Width of one column of virtual space: the default style's advance of a
    /// space.
    pub fn virtual_space_width(&self) -> f64 {
        self.virtual_space_width
    }

    /// Formats one line. The result is [`VisibilityState::Unattached`] with
    /// its top at zero.
    pub fn layout(&self, line: &TextSnapshotLine) -> Result<VisualLine> {
        let default_metrics = self.styles.default_style().metrics();
        let mut height = 0.0_f64;
        let mut baseline = 0.0_f64;
        let mut pen = 0.0;
        let mut runs = Vec::new();

        for segment in self.segments(line) {
            let (name, style) = self.styles.resolve(&segment.classification);
            let metrics = style.metrics();
            if !metrics.is_valid() {
                return Err(ViewError::invalid_argument(format!(
                    "style `{name}` has invalid metrics {metrics:?}"
                )));
            }
            let text = &line.snapshot().text()[segment.range.clone()];
            let shaped = style.shaper().shape(text, Point::new(pen, 0.0))?;
            let mut previous = 0;
            let mut glyphs = Vec::with_capacity(shaped.glyphs.len());
            for glyph in &shaped.glyphs {
                if glyph.cluster < previous
                    || glyph.cluster >= text.len()
                    || !text.is_char_boundary(glyph.cluster)
                {
                    return Err(ViewError::invalid_argument(format!(
                        "shaper for style `{name}` produced cluster {} for {} bytes of text",
                        glyph.cluster,
                        text.len()
                    )));
                }
                previous = glyph.cluster;
                glyphs.push(PositionedGlyph {
                    id: glyph.id,
                    cluster: segment.range.start + glyph.cluster,
                    x: glyph.x,
                    y: glyph.y,
                    advance: glyph.advance,
                });
            }
            pen = shaped.end.x;
            height = height.max(metrics.line_spacing);
            baseline = baseline.max(metrics.ascent);
            runs.push(GlyphRun {
                style: name.to_owned(),
                brush: style.brush().clone(),
                text_range: segment.range,
                glyphs,
            });
        }

        if runs.is_empty() {
            height = default_metrics.line_spacing;
            baseline = default_metrics.ascent;
        }
        let shift = expand_tabs(line.snapshot().text(), &mut runs);
        let clusters = clusters(&runs, line.end());
        let width = if runs.is_empty() { 0.0 } else { pen + shift };

        log::trace!(
            "formatted line {} ({} runs, width {width})",
            line.line_number(),
            runs.len()
        );
        Ok(VisualLine {
            id: LineId::next(),
            line: line.clone(),
            runs,
            clusters,
            top: 0.0,
            height,
            width,
            baseline,
            virtual_space_width: self.virtual_space_width,
            visibility: VisibilityState::Unattached,
            change: LineChange::NewOrReformatted,
            delta_y: 0.0,
        })
    }

    /// Splits the line into classified segments, filling gaps with the
    /// default style.
    fn segments(&self, line: &TextSnapshotLine) -> Vec<ClassificationSpan> {
        let text = line.snapshot().text();
        let mut spans = self.classifier.classify(line);
        spans.retain_mut(|span| {
            span.range.start = span.range.start.max(line.start());
            span.range.end = span.range.end.min(line.end());
            let valid =
                text.is_char_boundary(span.range.start) && text.is_char_boundary(span.range.end);
            if !valid {
                log::warn!(
                    "ignoring classification {:?} that splits a character",
                    span.range
                );
            }
            valid && span.range.start < span.range.end
        });
        spans.sort_by_key(|span| span.range.start);

        let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = line.start();
        for mut span in spans {
            span.range.start = span.range.start.max(cursor);
            if span.range.start >= span.range.end {
                continue;
            }
            if span.range.start > cursor {
                segments.push(ClassificationSpan::new(cursor..span.range.start, DEFAULT_STYLE));
            }
            cursor = span.range.end;
            segments.push(span);
        }
        if cursor < line.end() {
            segments.push(ClassificationSpan::new(cursor..line.end(), DEFAULT_STYLE));
        }
        segments
    }
}

impl fmt::Debug for LineLayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineLayoutEngine")
            .field("styles", &self.styles)
            .field("virtual_space_width", &self.virtual_space_width)
            .finish_non_exhaustive()
    }
}

/// Widens every tab so that the following text starts on the next tab stop
/// and shifts later glyphs. Returns the total added width.
///
/// Columns are counted in clusters since the last tab or the line start.
fn expand_tabs(text: &str, runs: &mut [GlyphRun]) -> f64 {
    let mut shift = 0.0;
    let mut column = 0;
    let mut last_cluster = None;
    for glyph in runs.iter_mut().flat_map(|run| run.glyphs.iter_mut()) {
        glyph.x += shift;
        if last_cluster == Some(glyph.cluster) {
            continue;
        }
        last_cluster = Some(glyph.cluster);
        if text[glyph.cluster..].starts_with('\t') {
            let stops = (TAB_SIZE - column % TAB_SIZE) as f64;
            let extra = glyph.advance * (stops - 1.0);
            glyph.advance += extra;
            shift += extra;
            column = 0;
        } else {
            column += 1;
        }
    }
    shift
}

/// Groups glyphs into text elements. Each element ends where the next one
/// starts; the last one ends at `line_end`.
fn clusters(runs: &[GlyphRun], line_end: usize) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for glyph in runs.iter().flat_map(|run| run.glyphs.iter()) {
        let right = glyph.x + glyph.advance;
        match clusters.last_mut() {
            Some(last) if last.start == glyph.cluster => {
                last.left = last.left.min(glyph.x);
                last.right = last.right.max(right);
            }
            _ => {
                if let Some(last) = clusters.last_mut() {
                    last.end = glyph.cluster;
                }
                clusters.push(Cluster {
                    start: glyph.cluster,
                    end: line_end,
                    left: glyph.x,
                    right,
                });
            }
        }
    }
    clusters
}
