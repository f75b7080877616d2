// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adornment layers: decorations drawn with the text and kept in place
//! across layout passes.

mod stack;

use core::fmt;
use core::ops::{Deref, DerefMut};
use std::borrow::Cow;
use std::rc::Rc;

use peniko::kurbo::Vec2;
use text_snapshot::{SnapshotSpan, SpanTrackingMode, TextSnapshot};

use crate::canvas::Canvas;
use crate::layout::{LineChange, LineId, ViewLineCollection, VisualLine};

pub use stack::{CARET_LAYER, LayerDefinition, SELECTION_LAYER, TEXT_LAYER};
pub(crate) use stack::{ViewElement, ViewStack};

/// How an adornment moves when the view is laid out again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdornmentPositioningBehavior {
    /// Moves with the text it is attached to.
    TextRelative,
    /// Moves with the text vertically and stays put horizontally on screen.
    TextRelativeVerticalOnly,
    /// Stays put on screen.
    ViewportRelative,
    /// Never moved by the view.
    OwnerControlled,
}

impl AdornmentPositioningBehavior {
    /// Whether the behavior requires a visual span.
    pub fn is_text_relative(self) -> bool {
        matches!(self, Self::TextRelative | Self::TextRelativeVerticalOnly)
    }
}

/// Identifies a group of adornments for removal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AdornmentTag {
    /// Attached to one formatted line.
    Line(LineId),
    /// A caller chosen name.
    Named(Cow<'static, str>),
    /// A caller chosen number.
    Id(u64),
}

impl From<LineId> for AdornmentTag {
    fn from(id: LineId) -> Self {
        Self::Line(id)
    }
}

impl From<&'static str> for AdornmentTag {
    fn from(name: &'static str) -> Self {
        Self::Named(Cow::Borrowed(name))
    }
}

impl From<String> for AdornmentTag {
    fn from(name: String) -> Self {
        Self::Named(Cow::Owned(name))
    }
}

impl From<u64> for AdornmentTag {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

/// Something an adornment layer can draw.
pub trait AdornmentVisual {
    /// Draws the visual. `offset` maps the visual's view coordinates to the
    /// canvas.
    fn render(&self, canvas: &mut dyn Canvas, offset: Vec2);
}

/// Called with the tag and visual of an adornment when it leaves its layer.
pub type AdornmentRemovedCallback = Box<dyn FnMut(&AdornmentTag, &Rc<dyn AdornmentVisual>)>;

/// One adornment and its bookkeeping.
pub struct AdornmentElement {
    behavior: AdornmentPositioningBehavior,
    visual_span: Option<SnapshotSpan>,
    tag: AdornmentTag,
    visual: Rc<dyn AdornmentVisual>,
    removed_callback: Option<AdornmentRemovedCallback>,
    offset: Vec2,
}

impl AdornmentElement {
    /// The positioning behavior.
    pub fn behavior(&self) -> AdornmentPositioningBehavior {
        self.behavior
    }

    /// The text the adornment is attached to.
    pub fn visual_span(&self) -> Option<&SnapshotSpan> {
        self.visual_span.as_ref()
    }

    /// The tag.
    pub fn tag(&self) -> &AdornmentTag {
        &self.tag
    }

    /// The visual.
    pub fn visual(&self) -> &Rc<dyn AdornmentVisual> {
        &self.visual
    }

    /// Accumulated translation since the adornment was added.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    fn removed(mut self) {
        if let Some(callback) = &mut self.removed_callback {
            callback(&self.tag, &self.visual);
        }
    }

    /// Whether the adornment's span overlaps `span`. An empty adornment span
    /// counts as one byte long, and a span reaching the end of the buffer
    /// overlaps an adornment anchored there.
    fn overlaps_with(&self, span: &SnapshotSpan) -> bool {
        let Some(own) = &self.visual_span else {
            return false;
        };
        let start = own.start();
        let end = start + own.len().max(1);
        span.start() < end
            && (span.end() > start || (span.end() == start && start == span.snapshot().len()))
    }
}

impl fmt::Debug for AdornmentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdornmentElement")
            .field("behavior", &self.behavior)
            .field("visual_span", &self.visual_span.as_ref().map(SnapshotSpan::range))
            .field("tag", &self.tag)
            .field("offset", &self.offset)
            .field("has_removed_callback", &self.removed_callback.is_some())
            .finish_non_exhaustive()
    }
}

/// A named, ordered list of adornments.
#[derive(Debug)]
pub struct AdornmentLayer {
    name: String,
    is_overlay: bool,
    elements: Vec<AdornmentElement>,
    opacity: f64,
}

impl AdornmentLayer {
    pub(crate) fn new(name: impl Into<String>, is_overlay: bool) -> Self {
        Self {
            name: name.into(),
            is_overlay,
            elements: Vec::new(),
            opacity: 1.0,
        }
    }

    /// The layer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is an overlay layer, which only accepts
    /// [`AdornmentPositioningBehavior::OwnerControlled`] adornments and does
    /// not scroll.
    pub fn is_overlay(&self) -> bool {
        self.is_overlay
    }

    /// The adornments in insertion order.
    pub fn elements(&self) -> &[AdornmentElement] {
        &self.elements
    }

    /// Number of adornments.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the layer holds no adornments.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Opacity of the whole layer. A layer with zero opacity is not drawn.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Sets the layer opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
    }

    /// Adds an adornment and reports whether it was added.
    ///
    /// Nothing is added when a text relative behavior has no span, when an
    /// overlay layer receives a behavior other than
    /// [`AdornmentPositioningBehavior::OwnerControlled`], or when the span
    /// does not intersect any formatted line.
    pub(crate) fn add_adornment(
        &mut self,
        lines: &ViewLineCollection,
        behavior: AdornmentPositioningBehavior,
        visual_span: Option<SnapshotSpan>,
        tag: AdornmentTag,
        visual: Rc<dyn AdornmentVisual>,
        removed_callback: Option<AdornmentRemovedCallback>,
    ) -> bool {
        if self.is_overlay && behavior != AdornmentPositioningBehavior::OwnerControlled {
            log::warn!(
                "overlay layer `{}` only accepts owner controlled adornments",
                self.name
            );
            return false;
        }
        if behavior.is_text_relative() && visual_span.is_none() {
            log::warn!("text relative adornment without a visual span");
            return false;
        }
        if let Some(span) = &visual_span {
            if span.snapshot() != lines.snapshot() {
                log::warn!("adornment span belongs to another snapshot");
                return false;
            }
            if !lines.intersects_buffer_span(&span.range()) {
                log::trace!("adornment span {:?} is not visible", span.range());
                return false;
            }
        }
        self.elements.push(AdornmentElement {
            behavior,
            visual_span,
            tag,
            visual,
            removed_callback,
            offset: Vec2::ZERO,
        });
        true
    }

    /// Removes every adornment.
    pub fn remove_all_adornments(&mut self) {
        for element in core::mem::take(&mut self.elements) {
            element.removed();
        }
    }

    /// Removes the first adornment showing `visual` and reports whether one
    /// was found.
    pub fn remove_adornment(&mut self, visual: &Rc<dyn AdornmentVisual>) -> bool {
        let Some(index) = self
            .elements
            .iter()
            .position(|element| Rc::ptr_eq(&element.visual, visual))
        else {
            return false;
        };
        self.elements.remove(index).removed();
        true
    }

    /// Removes every adornment tagged `tag`.
    pub fn remove_adornments_by_tag(&mut self, tag: &AdornmentTag) {
        self.remove_matching_adornments(None, |element| &element.tag == tag);
    }

    /// Removes every adornment whose span overlaps `span`.
    pub fn remove_adornments_by_visual_span(&mut self, span: &SnapshotSpan) {
        self.remove_matching_adornments(Some(span), |_| true);
    }

    /// Removes every adornment matching `predicate`. With a span, only
    /// adornments overlapping it are considered.
    pub fn remove_matching_adornments(
        &mut self,
        span: Option<&SnapshotSpan>,
        mut predicate: impl FnMut(&AdornmentElement) -> bool,
    ) {
        let (removed, kept) = core::mem::take(&mut self.elements)
            .into_iter()
            .partition(|element| {
                span.is_none_or(|span| element.overlaps_with(span)) && predicate(element)
            });
        self.elements = kept;
        for element in removed {
            element.removed();
        }
    }

    /// Moves the adornments to `snapshot` after a layout pass.
    ///
    /// Adornments whose span is no longer visible or crosses a reformatted
    /// line are removed. The others are translated per their behavior.
    pub(crate) fn set_snapshot_and_update(
        &mut self,
        lines: &ViewLineCollection,
        snapshot: &TextSnapshot,
        delta: Vec2,
        reformatted: &[&VisualLine],
        translated: &[&VisualLine],
    ) {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.elements.len());
        for mut element in core::mem::take(&mut self.elements) {
            let Some(span) = &element.visual_span else {
                if element.behavior == AdornmentPositioningBehavior::ViewportRelative {
                    element.offset += delta;
                }
                kept.push(element);
                continue;
            };
            let span = match span.translate_to(snapshot, SpanTrackingMode::EdgeInclusive) {
                Ok(span) => span,
                Err(err) => {
                    log::warn!("dropping adornment that cannot follow the snapshot: {err}");
                    removed.push(element);
                    continue;
                }
            };
            if !lines.intersects_buffer_span(&span.range())
                || crossing_line(reformatted, &span).is_some()
            {
                log::trace!("removing adornment over {:?}", span.range());
                element.visual_span = Some(span);
                removed.push(element);
                continue;
            }
            match element.behavior {
                AdornmentPositioningBehavior::TextRelative
                | AdornmentPositioningBehavior::TextRelativeVerticalOnly => {
                    let horizontal =
                        element.behavior == AdornmentPositioningBehavior::TextRelativeVerticalOnly;
                    if let Some(line) = crossing_line(translated, &span) {
                        let dx = if horizontal { delta.x } else { 0.0 };
                        element.offset += Vec2::new(dx, line.delta_y());
                    } else if horizontal {
                        element.offset += Vec2::new(delta.x, 0.0);
                    }
                }
                AdornmentPositioningBehavior::ViewportRelative => element.offset += delta,
                AdornmentPositioningBehavior::OwnerControlled => {}
            }
            element.visual_span = Some(span);
            kept.push(element);
        }
        self.elements = kept;
        for element in removed {
            element.removed();
        }
    }

    /// Draws every adornment shifted by `origin`.
    pub(crate) fn render(&self, canvas: &mut dyn Canvas, origin: Vec2) {
        if self.opacity <= 0.0 {
            return;
        }
        for element in &self.elements {
            element.visual.render(canvas, origin + element.offset);
        }
    }
}

/// A line of `lines` that crosses `span`. Lines must be in document order.
///
/// An empty span counts as one byte long; an empty span at the end of the
/// buffer crosses the last line.
pub(crate) fn crossing_line<'a>(
    lines: &[&'a VisualLine],
    span: &SnapshotSpan,
) -> Option<&'a VisualLine> {
    let last = lines.last()?;
    let start = span.start();
    let end = start + span.len().max(1);
    let (mut low, mut high) = (0, lines.len());
    while low < high {
        let middle = (low + high) / 2;
        let line = lines[middle];
        if end <= line.start() {
            high = middle;
        } else if start >= line.end_including_line_break() {
            low = middle + 1;
        } else {
            return Some(line);
        }
    }
    (end > span.snapshot().len() && last.end() == start).then_some(*last)
}

/// Lines of `lines` with the given change kind.
pub(crate) fn lines_with_change(
    lines: &ViewLineCollection,
    change: LineChange,
) -> Vec<&VisualLine> {
    lines.iter().filter(|line| line.change() == change).collect()
}

/// An adornment layer together with the formatted lines that decide whether
/// new adornments are visible.
#[derive(Debug)]
pub struct AdornmentLayerMut<'a> {
    layer: &'a mut AdornmentLayer,
    lines: &'a ViewLineCollection,
}

impl<'a> AdornmentLayerMut<'a> {
    pub(crate) fn new(layer: &'a mut AdornmentLayer, lines: &'a ViewLineCollection) -> Self {
        Self { layer, lines }
    }

    /// Adds an adornment; see [`AdornmentLayer`] for when nothing is added.
    pub fn add_adornment(
        &mut self,
        behavior: AdornmentPositioningBehavior,
        visual_span: Option<SnapshotSpan>,
        tag: impl Into<AdornmentTag>,
        visual: Rc<dyn AdornmentVisual>,
        removed_callback: Option<AdornmentRemovedCallback>,
    ) -> bool {
        self.layer.add_adornment(
            self.lines,
            behavior,
            visual_span,
            tag.into(),
            visual,
            removed_callback,
        )
    }

    /// Adds a [`AdornmentPositioningBehavior::TextRelative`] adornment
    /// without a removal callback.
    pub fn add_text_adornment(
        &mut self,
        visual_span: SnapshotSpan,
        tag: impl Into<AdornmentTag>,
        visual: Rc<dyn AdornmentVisual>,
    ) -> bool {
        self.add_adornment(
            AdornmentPositioningBehavior::TextRelative,
            Some(visual_span),
            tag,
            visual,
            None,
        )
    }
}

impl Deref for AdornmentLayerMut<'_> {
    type Target = AdornmentLayer;

    fn deref(&self) -> &AdornmentLayer {
        self.layer
    }
}

impl DerefMut for AdornmentLayerMut<'_> {
    fn deref_mut(&mut self) -> &mut AdornmentLayer {
        self.layer
    }
}
