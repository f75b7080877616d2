// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use std::sync::Arc;

use text_snapshot::TextSnapshotLine;

use crate::adornment::LayerDefinition;
use crate::caret::{CaretBlinkSettings, DefaultBlinkSettings};
use crate::classify::{Classifier, NullClassifier};
use crate::style::StyleMap;

/// Supplies the indentation the caret moves to on an empty line.
pub trait SmartIndent {
    /// The desired indentation of `line` in columns, or `None` to leave the
    /// caret at the start of the line.
    fn desired_indentation(&self, line: &TextSnapshotLine) -> Option<usize>;
}

/// A [`SmartIndent`] that never indents.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSmartIndent;

impl SmartIndent for NoSmartIndent {
    fn desired_indentation(&self, _line: &TextSnapshotLine) -> Option<usize> {
        None
    }
}

/// The collaborators of a [`TextView`](crate::TextView).
pub struct TextViewServices {
    /// Styles used to shape text.
    pub styles: Arc<StyleMap>,
    /// Assigns style names to text.
    pub classifier: Box<dyn Classifier>,
    /// Indentation for the caret on empty lines.
    pub smart_indent: Box<dyn SmartIndent>,
    /// Caret blink interval.
    pub blink_settings: Box<dyn CaretBlinkSettings>,
    /// Layers in addition to [`LayerDefinition::predefined`].
    pub layers: Vec<LayerDefinition>,
}

impl TextViewServices {
    /// Services with no classification, no smart indent and the default
    /// blink interval.
    pub fn new(styles: Arc<StyleMap>) -> Self {
        Self {
            styles,
            classifier: Box::new(NullClassifier),
            smart_indent: Box::new(NoSmartIndent),
            blink_settings: Box::new(DefaultBlinkSettings),
            layers: Vec::new(),
        }
    }

    /// Replaces the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replaces the smart indent service.
    #[must_use]
    pub fn with_smart_indent(mut self, smart_indent: impl SmartIndent + 'static) -> Self {
        self.smart_indent = Box::new(smart_indent);
        self
    }

    /// Replaces the blink settings.
    #[must_use]
    pub fn with_blink_settings(mut self, settings: impl CaretBlinkSettings + 'static) -> Self {
        self.blink_settings = Box::new(settings);
        self
    }

    /// Adds a layer definition.
    #[must_use]
    pub fn with_layer(mut self, layer: LayerDefinition) -> Self {
        self.layers.push(layer);
        self
    }
}

impl fmt::Debug for TextViewServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextViewServices")
            .field("styles", &self.styles)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}
