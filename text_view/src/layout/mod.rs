// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line formatting, the line collection and the viewport.

mod collection;
mod engine;
mod line;
mod view_layout;

pub use collection::ViewLineCollection;
pub use engine::{LineLayoutEngine, TAB_SIZE};
pub use line::{
    GlyphRun, LineChange, LineId, PositionedGlyph, TextBounds, VisibilityState, VisualLine,
};
pub use view_layout::{LineSource, ViewLayout, ViewRelativePosition, Viewport};

pub(crate) use view_layout::LayoutPass;
