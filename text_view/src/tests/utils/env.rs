// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;
use std::sync::Arc;

use peniko::Color;
use text_snapshot::{SnapshotPoint, TextBuffer, VirtualSnapshotPoint};

use crate::caret::NoBlink;
use crate::{
    CaretPosition, EditorOption, EditorOptions, FontMetrics, MonospaceShaper, PositionAffinity,
    StyleMap, TextStyle, TextView, TextViewServices,
};

/// Advance of every cluster.
pub(crate) const ADVANCE: f64 = 10.0;
/// Height of every line.
pub(crate) const LINE_HEIGHT: f64 = 20.0;

pub(crate) fn styles() -> Arc<StyleMap> {
    let metrics = FontMetrics {
        ascent: 16.0,
        descent: 4.0,
        line_spacing: LINE_HEIGHT,
    };
    let shaper = Arc::new(MonospaceShaper::new(ADVANCE, metrics).unwrap());
    Arc::new(StyleMap::new(TextStyle::new(shaper, Color::BLACK)))
}

/// `count` lines of the form `line 07`, joined by `\n`. Every line is eight
/// bytes long including its line break.
pub(crate) fn numbered_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("line {i:02}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A buffer and a view of it, laid out in a 200x100 viewport unless
/// configured otherwise.
pub(crate) struct TestEnv {
    pub(crate) buffer: TextBuffer,
    pub(crate) view: TextView,
}

pub(crate) struct TestEnvBuilder {
    text: String,
    services: TextViewServices,
    options: EditorOptions,
    viewport: Option<(f64, f64)>,
}

impl TestEnvBuilder {
    pub(crate) fn services(mut self, f: impl FnOnce(TextViewServices) -> TextViewServices) -> Self {
        self.services = f(self.services);
        self
    }

    pub(crate) fn option(mut self, option: EditorOption, value: bool) -> Self {
        self.options = self.options.with(option, value);
        self
    }

    pub(crate) fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Some((width, height));
        self
    }

    /// Leaves the viewport empty so the view is not loaded.
    pub(crate) fn unloaded(mut self) -> Self {
        self.viewport = None;
        self
    }

    pub(crate) fn build(self) -> TestEnv {
        let buffer = TextBuffer::new(self.text);
        let mut view = TextView::new(buffer.snapshot(), self.services, self.options).unwrap();
        if let Some((width, height)) = self.viewport {
            view.set_viewport_size(width, height).unwrap();
        }
        TestEnv { buffer, view }
    }
}

impl TestEnv {
    pub(crate) fn new(text: &str) -> Self {
        Self::builder(text).build()
    }

    pub(crate) fn builder(text: &str) -> TestEnvBuilder {
        TestEnvBuilder {
            text: text.to_owned(),
            services: TextViewServices::new(styles()).with_blink_settings(NoBlink),
            options: EditorOptions::new(),
            viewport: Some((200.0, 100.0)),
        }
    }

    /// Replaces `range` in the buffer and moves the view to the result.
    pub(crate) fn edit(&mut self, range: Range<usize>, text: &str) {
        let snapshot = self.buffer.replace(range, text).unwrap();
        self.view.set_snapshot(snapshot).unwrap();
    }

    pub(crate) fn point(&self, position: usize) -> VirtualSnapshotPoint {
        SnapshotPoint::new(self.view.snapshot().clone(), position)
            .unwrap()
            .into()
    }

    pub(crate) fn virtual_point(&self, position: usize, spaces: usize) -> VirtualSnapshotPoint {
        let point = SnapshotPoint::new(self.view.snapshot().clone(), position).unwrap();
        VirtualSnapshotPoint::new(point, spaces)
    }

    pub(crate) fn move_caret(&mut self, position: usize) -> CaretPosition {
        let point = self.point(position);
        self.view
            .move_caret_to(point, PositionAffinity::Successor, true)
            .unwrap()
    }

    pub(crate) fn select(&mut self, anchor: usize, active: usize) {
        let (anchor, active) = (self.point(anchor), self.point(active));
        self.view.select(anchor, active).unwrap();
    }

    /// The physical selected spans as ranges.
    pub(crate) fn selected_ranges(&self) -> Vec<Range<usize>> {
        self.view
            .selection()
            .selected_spans()
            .unwrap()
            .iter()
            .map(|span| span.range())
            .collect()
    }

    /// Snapshot line numbers of the formatted lines.
    pub(crate) fn line_numbers(&self) -> Vec<usize> {
        self.view.lines().iter().map(|line| line.line_number()).collect()
    }

    pub(crate) fn caret_position(&self) -> usize {
        self.view.caret().position().buffer_position().position()
    }
}
