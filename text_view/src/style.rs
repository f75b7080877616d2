// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text styles and the style map.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use peniko::Brush;

use crate::error::{Result, ViewError};
use crate::shape::Shaper;

/// Name of the style used for unclassified text.
pub const DEFAULT_STYLE: &str = "";

/// Vertical font metrics, in pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontMetrics {
    /// Distance from the top of the line box to the baseline.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the glyphs.
    pub descent: f64,
    /// Height of one line.
    pub line_spacing: f64,
}

impl FontMetrics {
    /// Whether every metric is finite and the line spacing is positive.
    pub fn is_valid(&self) -> bool {
        self.ascent.is_finite()
            && self.descent.is_finite()
            && self.line_spacing.is_finite()
            && self.line_spacing > 0.0
    }
}

/// A shaper and the brush its glyphs are painted with.
#[derive(Clone)]
pub struct TextStyle {
    shaper: Arc<dyn Shaper>,
    brush: Brush,
}

impl TextStyle {
    /// Creates a style.
    pub fn new(shaper: Arc<dyn Shaper>, brush: impl Into<Brush>) -> Self {
        Self {
            shaper,
            brush: brush.into(),
        }
    }

    /// The shaper for this style.
    pub fn shaper(&self) -> &dyn Shaper {
        &*self.shaper
    }

    /// The glyph brush.
    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// The shaper's font metrics.
    pub fn metrics(&self) -> FontMetrics {
        self.shaper.metrics()
    }
}

impl fmt::Debug for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStyle")
            .field("metrics", &self.metrics())
            .field("brush", &self.brush)
            .finish_non_exhaustive()
    }
}

/// Maps classification names to styles.
///
/// Always holds a default style under [`DEFAULT_STYLE`]; unknown names
/// resolve to it.
#[derive(Clone, Debug)]
pub struct StyleMap {
    default: TextStyle,
    styles: HashMap<String, TextStyle>,
}

impl StyleMap {
    /// Creates a map holding only the default style.
    pub fn new(default: TextStyle) -> Self {
        Self {
            default,
            styles: HashMap::new(),
        }
    }

    /// Builds a map from named styles. One of them must be named
    /// [`DEFAULT_STYLE`].
    pub fn from_styles(styles: impl IntoIterator<Item = (String, TextStyle)>) -> Result<Self> {
        let mut styles: HashMap<String, TextStyle> = styles.into_iter().collect();
        let default = styles.remove(DEFAULT_STYLE).ok_or_else(|| {
            log::warn!("style map has no default style");
            ViewError::invalid_argument("style map has no default (\"\") style")
        })?;
        Ok(Self { default, styles })
    }

    /// Adds or replaces the style called `name`.
    #[must_use]
    pub fn with_style(mut self, name: impl Into<String>, style: TextStyle) -> Self {
        self.insert(name, style);
        self
    }

    /// Adds or replaces the style called `name`.
    pub fn insert(&mut self, name: impl Into<String>, style: TextStyle) {
        let name = name.into();
        if name == DEFAULT_STYLE {
            self.default = style;
        } else {
            self.styles.insert(name, style);
        }
    }

    /// The style called `name`, if present.
    pub fn get(&self, name: &str) -> Option<&TextStyle> {
        if name == DEFAULT_STYLE {
            Some(&self.default)
        } else {
            self.styles.get(name)
        }
    }

    /// The default style.
    pub fn default_style(&self) -> &TextStyle {
        &self.default
    }

    /// The style for `name` together with the name it was found under.
    pub fn resolve<'a>(&'a self, name: &'a str) -> (&'a str, &'a TextStyle) {
        match self.styles.get(name) {
            Some(style) => (name, style),
            None => (DEFAULT_STYLE, &self.default),
        }
    }

    /// Number of styles, including the default.
    pub fn len(&self) -> usize {
        self.styles.len() + 1
    }

    /// Always `false`: the default style is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peniko::Color;

    use super::{DEFAULT_STYLE, FontMetrics, StyleMap, TextStyle};
    use crate::ViewError;
    use crate::shape::MonospaceShaper;

    fn style(advance: f64) -> TextStyle {
        let metrics = FontMetrics {
            ascent: 12.0,
            descent: 4.0,
            line_spacing: 16.0,
        };
        let shaper = MonospaceShaper::new(advance, metrics).unwrap();
        TextStyle::new(Arc::new(shaper), Color::from_rgba8(0, 0, 0, 255))
    }

    #[test]
    fn unknown_names_resolve_to_default() {
        let map = StyleMap::new(style(7.0)).with_style("keyword", style(9.0));
        assert_eq!(map.resolve("keyword").0, "keyword");
        assert_eq!(map.resolve("nothing").0, DEFAULT_STYLE);
        assert!(map.get(DEFAULT_STYLE).is_some());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn from_styles_requires_default() {
        let err = StyleMap::from_styles([("keyword".to_owned(), style(7.0))]).unwrap_err();
        assert!(matches!(err, ViewError::InvalidArgument(_)));
        let map = StyleMap::from_styles([
            (String::new(), style(7.0)),
            ("keyword".to_owned(), style(9.0)),
        ])
        .unwrap();
        assert!(map.get("keyword").is_some());
    }
}
