// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use peniko::Brush;
use peniko::kurbo::{Affine, BezPath, Rect, Shape, Vec2};
use smallvec::SmallVec;
use text_snapshot::{VirtualSnapshotPoint, VirtualSnapshotSpan};

use super::{SelectionMode, SelectionView};
use crate::adornment::{
    AdornmentLayer, AdornmentPositioningBehavior, AdornmentRemovedCallback, AdornmentTag,
    AdornmentVisual,
};
use crate::canvas::Canvas;
use crate::caret::CARET_WIDTH;
use crate::error::Result;
use crate::layout::{LineId, Viewport, VisualLine};

/// Distance past each side of the viewport that selection geometry is
/// built for.
pub(crate) const CLIP_PADDING: f64 = 1500.0;
/// Margin inside a clip edge where a clipped region may show artifacts.
pub(crate) const EDGE_WIDTH: f64 = 2.0;
/// Vertical overlap between the regions of adjacent lines.
pub(crate) const OVERLAP: f64 = 0.5;

/// Bookkeeping for the region painted on one line.
#[derive(Clone, Debug, PartialEq)]
struct SelectionData {
    span: VirtualSnapshotSpan,
    /// Left edge of the correctly rendered part of the region.
    left_edge: f64,
    /// Right edge of the correctly rendered part of the region.
    right_edge: f64,
    at_top: bool,
    at_bottom: bool,
}

impl SelectionData {
    fn new(
        span: VirtualSnapshotSpan,
        left: f64,
        right: f64,
        left_clip: f64,
        right_clip: f64,
        at_top: bool,
        at_bottom: bool,
    ) -> Self {
        Self {
            span,
            left_edge: if left < left_clip {
                left_clip + EDGE_WIDTH
            } else {
                f64::MIN
            },
            right_edge: if right > right_clip {
                right_clip - EDGE_WIDTH
            } else {
                f64::MAX
            },
            at_top,
            at_bottom,
        }
    }

    fn should_redraw(
        &self,
        span: &VirtualSnapshotSpan,
        viewport: &Viewport,
        at_top: bool,
        at_bottom: bool,
    ) -> bool {
        &self.span != span
            || viewport.left < self.left_edge
            || viewport.right() > self.right_edge
            || self.at_top != at_top
            || self.at_bottom != at_bottom
    }
}

type LineSpans = Rc<RefCell<HashMap<LineId, SelectionData>>>;

/// A filled selection region.
#[derive(Clone, Debug)]
struct SelectionVisual {
    path: BezPath,
    brush: Brush,
}

impl AdornmentVisual for SelectionVisual {
    fn render(&self, canvas: &mut dyn Canvas, offset: Vec2) {
        let mut path = self.path.clone();
        path.apply_affine(Affine::translate(offset));
        canvas.fill_path(&path, &self.brush);
    }
}

/// Paints the selection as one adornment per line and redraws only the
/// lines whose part of the selection changed.
#[derive(Debug)]
pub(crate) struct SelectionPainter {
    brush: Brush,
    line_spans: LineSpans,
    old_stream_selection: Option<VirtualSnapshotSpan>,
}

impl SelectionPainter {
    pub(crate) fn new(brush: Brush) -> Self {
        Self {
            brush,
            line_spans: Rc::default(),
            old_stream_selection: None,
        }
    }

    /// Removes every region this painter added.
    pub(crate) fn clear(&mut self, layer: &mut AdornmentLayer) {
        let tags: Vec<LineId> = self.line_spans.borrow().keys().copied().collect();
        for id in tags {
            layer.remove_adornments_by_tag(&AdornmentTag::Line(id));
        }
        self.line_spans.borrow_mut().clear();
        self.old_stream_selection = None;
    }

    /// Brings the painted regions in line with `selection`.
    pub(crate) fn update(
        &mut self,
        selection: &SelectionView<'_>,
        layer: &mut AdornmentLayer,
        viewport: Viewport,
        use_virtual_space: bool,
    ) -> Result<()> {
        let stream = selection.stream_selection_span()?;
        if stream.is_empty() {
            self.clear(layer);
            return Ok(());
        }
        let source = selection.source;
        let lines = source.lines();
        let new_range = stream.snapshot_span().range();
        let old_on_snapshot = self
            .old_stream_selection
            .as_ref()
            .filter(|old| old.snapshot() == stream.snapshot())
            .map(|old| (old.is_empty(), old.snapshot_span().range()));
        let touched: Vec<&VisualLine> = match old_on_snapshot {
            Some((false, old_range)) => merge_lines(
                lines.lines_intersecting_span(&old_range),
                lines.lines_intersecting_span(&new_range),
            ),
            Some((true, _)) => lines.lines_intersecting_span(&new_range).iter().collect(),
            None => {
                self.clear(layer);
                lines.lines_intersecting_span(&new_range).iter().collect()
            }
        };

        let is_box = selection.mode() == SelectionMode::Box;
        let left_clip = viewport.left - CLIP_PADDING;
        let right_clip = viewport.right() + CLIP_PADDING;
        let selection_end = selection.end().position();

        for line in touched {
            let id = line.id();
            let old = self.line_spans.borrow().get(&id).cloned();
            let line_top = line.text_top();
            let line_bottom = line.text_bottom() + 1.0;
            let at_top = line_top == line.top();
            let at_bottom = line_bottom == line.bottom();
            let new_span = selection.selection_on_line(line)?;

            if let Some(old) = old {
                // Box edges come from pixel positions, so every line is redrawn.
                if let (false, Some(span)) = (is_box, &new_span) {
                    if !old.should_redraw(span, &viewport, at_top, at_bottom) {
                        continue;
                    }
                }
                log::trace!("selection: clearing line {}", line.line_number());
                layer.remove_adornments_by_tag(&AdornmentTag::Line(id));
            }
            let Some(span) = new_span else {
                continue;
            };
            let bounds =
                visual_overlaps_for_line(line, &span, selection_end, is_box, use_virtual_space)?;
            let (Some(first), Some(last)) = (bounds.first(), bounds.last()) else {
                continue;
            };
            let (left, right) = (first.0, last.1);
            if left >= right_clip || right <= left_clip {
                continue;
            }
            let mut path = BezPath::new();
            for &(l, r) in &bounds {
                let (top, bottom) = (line_top, line_bottom);
                add_rectangle_to_path(&mut path, l, top, r, bottom, left_clip, right_clip);
            }
            if path.elements().is_empty() {
                continue;
            }
            log::trace!(
                "selection: painting line {} from {left} to {right}",
                line.line_number()
            );
            let data =
                SelectionData::new(span, left, right, left_clip, right_clip, at_top, at_bottom);
            self.line_spans.borrow_mut().insert(id, data);
            let visual = Rc::new(SelectionVisual {
                path,
                brush: self.brush.clone(),
            });
            let added = layer.add_adornment(
                lines,
                AdornmentPositioningBehavior::TextRelative,
                Some(line.extent()),
                AdornmentTag::Line(id),
                visual,
                Some(self.removed_callback()),
            );
            if !added {
                self.line_spans.borrow_mut().remove(&id);
            }
        }
        self.old_stream_selection = Some(stream);
        Ok(())
    }

    fn removed_callback(&self) -> AdornmentRemovedCallback {
        let line_spans = Rc::downgrade(&self.line_spans);
        Box::new(move |tag: &AdornmentTag, _: &Rc<dyn AdornmentVisual>| {
            if let (AdornmentTag::Line(id), Some(line_spans)) = (tag, line_spans.upgrade()) {
                line_spans.borrow_mut().remove(id);
            }
        })
    }
}

/// Merges two runs of lines sorted by start, dropping duplicates.
fn merge_lines<'a>(old: &'a [VisualLine], new: &'a [VisualLine]) -> Vec<&'a VisualLine> {
    let mut merged = Vec::with_capacity(old.len() + new.len());
    let (mut old, mut new) = (old.iter().peekable(), new.iter().peekable());
    loop {
        let old_start = old.peek().map(|line| line.start());
        let new_start = new.peek().map(|line| line.start());
        let line = match (old_start, new_start) {
            (Some(o), Some(n)) if o < n => old.next(),
            (Some(o), Some(n)) => {
                if o == n {
                    old.next();
                }
                new.next()
            }
            (Some(_), None) => old.next(),
            (None, Some(_)) => new.next(),
            (None, None) => break,
        };
        merged.extend(line);
    }
    merged
}

/// The horizontal extents of the selection on `line`.
///
/// `span` is the part of the selection on the line and `selection_end` the
/// end of the whole selection. An empty span yields a caret wide region.
/// Lines the selection continues past extend to the end-of-line area, or
/// indefinitely with virtual space.
pub(crate) fn visual_overlaps_for_line(
    line: &VisualLine,
    span: &VirtualSnapshotSpan,
    selection_end: usize,
    is_box: bool,
    use_virtual_space: bool,
) -> Result<SmallVec<[(f64, f64); 2]>> {
    let start: &VirtualSnapshotPoint = span.start();
    let end = span.end();
    let mut pairs = SmallVec::new();
    if start == end {
        let x = line.x_from_virtual_position(start)?;
        pairs.push((x, x + CARET_WIDTH));
        return Ok(pairs);
    }

    let is_last_line_of_selection =
        is_box || selection_end < line.end_including_line_break() || line.is_last_line();

    if start.position() == line.end() {
        let x_start = line.x_from_virtual_position(start)?;
        let x_end = if is_last_line_of_selection {
            line.x_from_virtual_position(end)?
        } else if use_virtual_space {
            f64::MAX
        } else {
            x_start + line.end_of_line_width()
        };
        if x_end > x_start {
            pairs.push((x_start, x_end));
        }
        return Ok(pairs);
    }

    for bounds in line.normalized_text_bounds(&(start.position()..end.position())) {
        pairs.push((bounds.left(), bounds.right()));
    }
    let x_end = if is_last_line_of_selection {
        if end.is_in_virtual_space() {
            line.x_from_virtual_position(end)?
        } else {
            f64::MIN
        }
    } else if use_virtual_space {
        f64::MAX
    } else {
        f64::MIN
    };
    let mut x_start = line.text_right();
    if x_end > x_start {
        if let Some(&(left, right)) = pairs.last() {
            if right >= x_start {
                x_start = left;
                pairs.pop();
            }
        }
        pairs.push((x_start, x_end));
    }
    Ok(pairs)
}

/// Adds the rectangle `left..right` by `top..bottom`, clipped horizontally,
/// with a small vertical overlap.
fn add_rectangle_to_path(
    path: &mut BezPath,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    left_clip: f64,
    right_clip: f64,
) {
    let left = left.max(left_clip);
    let right = right.min(right_clip);
    if right > left {
        let rect = Rect::new(left, top - OVERLAP, right, bottom + 2.0 * OVERLAP);
        path.extend(rect.path_elements(0.1));
    }
}
