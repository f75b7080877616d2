// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Vec2;
use text_snapshot::TextSnapshot;

use super::{AdornmentLayer, lines_with_change};
use crate::layout::{LineChange, ViewLineCollection};

/// Name of the layer the selection is painted on.
pub const SELECTION_LAYER: &str = "Selection";
/// Name of the text layer.
pub const TEXT_LAYER: &str = "Text";
/// Name of the layer the caret is drawn on.
pub const CARET_LAYER: &str = "Caret";

/// A named layer and its rank. Lower ranks are drawn first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerDefinition {
    /// Layer name.
    pub name: String,
    /// Drawing order.
    pub rank: i32,
    /// Whether the layer belongs to the overlay stack.
    pub is_overlay: bool,
}

impl LayerDefinition {
    /// A layer drawn with the text.
    pub fn new(name: impl Into<String>, rank: i32) -> Self {
        Self {
            name: name.into(),
            rank,
            is_overlay: false,
        }
    }

    /// A layer drawn above the text stack that does not scroll.
    pub fn overlay(name: impl Into<String>, rank: i32) -> Self {
        Self {
            name: name.into(),
            rank,
            is_overlay: true,
        }
    }

    /// The selection, text and caret layers, in that order.
    pub fn predefined() -> [Self; 3] {
        [
            Self::new(SELECTION_LAYER, 100),
            Self::new(TEXT_LAYER, 200),
            Self::new(CARET_LAYER, 300),
        ]
    }
}

/// Something drawn as part of a stack.
#[derive(Debug)]
pub(crate) enum ViewElement {
    Text,
    Caret,
    Adornments(AdornmentLayer),
}

#[derive(Debug)]
struct StackEntry {
    name: String,
    rank: i32,
    element: ViewElement,
}

/// Elements ordered by the rank of their layer definitions.
#[derive(Debug)]
pub(crate) struct ViewStack {
    is_overlay: bool,
    definitions: Vec<LayerDefinition>,
    entries: Vec<StackEntry>,
}

impl ViewStack {
    /// A stack that accepts the definitions with a matching overlay flag.
    pub(crate) fn new(definitions: &[LayerDefinition], is_overlay: bool) -> Self {
        Self {
            is_overlay,
            definitions: definitions
                .iter()
                .filter(|definition| definition.is_overlay == is_overlay)
                .cloned()
                .collect(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn is_overlay(&self) -> bool {
        self.is_overlay
    }

    pub(crate) fn definition(&self, name: &str) -> Option<&LayerDefinition> {
        self.definitions.iter().find(|definition| definition.name == name)
    }

    /// Inserts `element` in rank order. Fails when the name has no
    /// definition or is already present.
    pub(crate) fn try_add_element(&mut self, name: &str, element: ViewElement) -> bool {
        let Some(rank) = self.definition(name).map(|definition| definition.rank) else {
            return false;
        };
        if self.get_element(name).is_some() {
            return false;
        }
        let index = self.entries.partition_point(|entry| entry.rank <= rank);
        self.entries.insert(
            index,
            StackEntry {
                name: name.to_owned(),
                rank,
                element,
            },
        );
        true
    }

    pub(crate) fn get_element(&self, name: &str) -> Option<&ViewElement> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.element)
    }

    /// The adornment layer called `name`, created on first use when the name
    /// has a definition.
    pub(crate) fn adornment_layer(&mut self, name: &str) -> Option<&mut AdornmentLayer> {
        if self.get_element(name).is_none() {
            let layer = AdornmentLayer::new(name, self.is_overlay);
            if !self.try_add_element(name, ViewElement::Adornments(layer)) {
                return None;
            }
        }
        self.entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .and_then(|entry| match &mut entry.element {
                ViewElement::Adornments(layer) => Some(layer),
                _ => None,
            })
    }

    /// Elements in drawing order.
    pub(crate) fn elements(&self) -> impl Iterator<Item = &ViewElement> + '_ {
        self.entries.iter().map(|entry| &entry.element)
    }

    /// Adornment layers in drawing order.
    pub(crate) fn layers_mut(&mut self) -> impl Iterator<Item = &mut AdornmentLayer> + '_ {
        self.entries
            .iter_mut()
            .filter_map(|entry| match &mut entry.element {
                ViewElement::Adornments(layer) => Some(layer),
                _ => None,
            })
    }

    /// Reconciles every adornment layer with a layout pass.
    pub(crate) fn set_snapshot_and_update(
        &mut self,
        lines: &ViewLineCollection,
        snapshot: &TextSnapshot,
        delta: Vec2,
    ) {
        let reformatted = lines_with_change(lines, LineChange::NewOrReformatted);
        let translated = lines_with_change(lines, LineChange::Translated);
        for layer in self.layers_mut() {
            layer.set_snapshot_and_update(lines, snapshot, delta, &reformatted, &translated);
        }
    }

    /// Removes every adornment, invoking their removal callbacks.
    pub(crate) fn clear(&mut self) {
        for layer in self.layers_mut() {
            layer.remove_all_adornments();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerDefinition, ViewElement, ViewStack};

    fn names(stack: &ViewStack) -> Vec<&'static str> {
        stack
            .elements()
            .map(|element| match element {
                ViewElement::Text => "text",
                ViewElement::Caret => "caret",
                ViewElement::Adornments(_) => "adornments",
            })
            .collect()
    }

    #[test]
    fn elements_follow_rank_order() {
        let mut definitions = LayerDefinition::predefined().to_vec();
        definitions.push(LayerDefinition::new("Squiggles", 250));
        definitions.push(LayerDefinition::overlay("Popup", 10));
        let mut stack = ViewStack::new(&definitions, false);

        assert!(stack.try_add_element("Caret", ViewElement::Caret));
        assert!(stack.try_add_element("Text", ViewElement::Text));
        assert!(stack.adornment_layer("Squiggles").is_some());
        assert!(stack.adornment_layer("Selection").is_some());
        assert_eq!(names(&stack), ["adornments", "text", "adornments", "caret"]);

        assert!(!stack.try_add_element("Text", ViewElement::Text));
        assert!(stack.adornment_layer("Popup").is_none());
        assert!(stack.adornment_layer("Unknown").is_none());
        assert!(stack.adornment_layer("Text").is_none());
    }

    #[test]
    fn overlay_stack_only_takes_overlay_definitions() {
        let definitions = [
            LayerDefinition::new("Base", 1),
            LayerDefinition::overlay("Popup", 10),
        ];
        let mut stack = ViewStack::new(&definitions, true);
        assert!(stack.is_overlay());
        assert!(stack.adornment_layer("Base").is_none());
        let layer = stack.adornment_layer("Popup").unwrap();
        assert!(layer.is_overlay());
        assert_eq!(layer.name(), "Popup");
    }
}
