// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text View is a Rust crate which implements the view state of a text
//! editor on top of [`text_snapshot`].
//!
//! A [`TextView`] formats the snapshot lines covering its viewport into
//! [`VisualLine`]s, keeps a [`Caret`] and a selection consistent as the
//! buffer changes and the viewport scrolls, and draws text, selection,
//! caret and caller supplied adornments to a [`Canvas`].
//!
//! Shaping, drawing, classification and indentation are supplied by the
//! host through the [`Shaper`], [`Canvas`], [`Classifier`] and
//! [`SmartIndent`] traits. [`MonospaceShaper`] is a reference shaper that
//! gives every grapheme cluster the same advance.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use peniko::Color;
//! use text_snapshot::TextBuffer;
//! use text_view::{
//!     EditorOptions, FontMetrics, MonospaceShaper, PositionAffinity, StyleMap, TextStyle,
//!     TextView, TextViewServices,
//! };
//!
//! let metrics = FontMetrics { ascent: 12.0, descent: 4.0, line_spacing: 20.0 };
//! let shaper = Arc::new(MonospaceShaper::new(8.0, metrics).unwrap());
//! let styles = Arc::new(StyleMap::new(TextStyle::new(shaper, Color::BLACK)));
//!
//! let buffer = TextBuffer::new("Hello\nworld");
//! let mut view = TextView::new(
//!     buffer.snapshot(),
//!     TextViewServices::new(styles),
//!     EditorOptions::new(),
//! )
//! .unwrap();
//! view.set_viewport_size(400.0, 300.0).unwrap();
//! assert_eq!(view.lines().len(), 2);
//!
//! let world = buffer.snapshot().point(6).unwrap();
//! view.move_caret_to(world.into(), PositionAffinity::Successor, true).unwrap();
//! assert_eq!(view.caret().left(), 0.0);
//! assert_eq!(view.caret().top().unwrap(), 20.0);
//! ```
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod adornment;
pub mod caret;
pub mod events;
pub mod format_map;
pub mod layout;
pub mod selection;

mod canvas;
mod classify;
mod error;
mod memo;
mod options;
mod shape;
mod style;
mod view;

#[cfg(test)]
mod tests;

pub use peniko;
pub use text_snapshot;

pub use crate::adornment::{
    AdornmentLayer, AdornmentLayerMut, AdornmentPositioningBehavior, AdornmentTag,
    AdornmentVisual, LayerDefinition,
};
pub use crate::canvas::Canvas;
pub use crate::caret::{Caret, CaretBlinkSettings, CaretPosition, PositionAffinity};
pub use crate::classify::{ClassificationSpan, Classifier, NullClassifier};
pub use crate::error::{Result, ViewError};
pub use crate::events::Subscription;
pub use crate::format_map::{EditorFormatMap, FormatProperties};
pub use crate::layout::{
    LineSource, ViewLayout, ViewLineCollection, ViewRelativePosition, Viewport, VisibilityState,
    VisualLine,
};
pub use crate::options::{EditorOption, EditorOptions};
pub use crate::selection::{SelectionMode, SelectionView};
pub use crate::shape::{MonospaceShaper, ShapedGlyph, ShapedText, Shaper};
pub use crate::style::{DEFAULT_STYLE, FontMetrics, StyleMap, TextStyle};
pub use crate::view::{
    Dispatched, LoadedAction, NoSmartIndent, PostedAction, SmartIndent, TextView,
    TextViewServices,
};
