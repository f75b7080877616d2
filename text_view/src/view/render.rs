// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Point, Vec2};
use peniko::{Brush, Color};

use super::TextView;
use crate::adornment::ViewElement;
use crate::canvas::Canvas;
use crate::error::Result;
use crate::format_map::{CARET, OVERWRITE_CARET};
use crate::layout::{LineSource, Viewport, ViewLineCollection};

impl TextView {
    /// Draws the view.
    ///
    /// The base stack is drawn in rank order with the text and caret at
    /// their layers, then the overlay stack. Coordinates on `canvas` are
    /// relative to the viewport's top left corner.
    pub fn render(&self, canvas: &mut dyn Canvas) -> Result<()> {
        self.ensure_open()?;
        let viewport = self.layout.viewport();
        let origin = Vec2::new(-viewport.left, -viewport.top);
        for element in self.stack.elements() {
            match element {
                ViewElement::Text => render_text(canvas, self.layout.lines(), &viewport),
                ViewElement::Caret => self.render_caret(canvas, origin),
                ViewElement::Adornments(layer) => layer.render(canvas, origin),
            }
        }
        for element in self.overlay.elements() {
            if let ViewElement::Adornments(layer) = element {
                layer.render(canvas, Vec2::ZERO);
            }
        }
        Ok(())
    }

    fn render_caret(&self, canvas: &mut dyn Canvas, origin: Vec2) {
        let caret = &self.caret;
        if !caret.is_shown_on_screen() || caret.opacity() <= 0.0 {
            return;
        }
        let key = if caret.overwrite_mode() { OVERWRITE_CARET } else { CARET };
        let brush = self
            .format_map
            .properties(key)
            .foreground
            .unwrap_or(Brush::Solid(Color::BLACK));
        canvas.fill_rect(caret.bounds() + origin, &brush);
    }
}

fn render_text(canvas: &mut dyn Canvas, lines: &ViewLineCollection, viewport: &Viewport) {
    for line in lines {
        let origin = Point::new(-viewport.left, line.top() - viewport.top + line.baseline());
        for run in line.runs() {
            canvas.draw_glyph_run(run, origin);
        }
    }
}
