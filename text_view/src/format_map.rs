// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named paint properties for view elements.

use hashbrown::HashMap;
use peniko::Brush;

use crate::error::{Result, ViewError};
use crate::events::FormatMappingChanged;

/// Format map key of the focused selection.
pub const SELECTED_TEXT: &str = "Selected Text";
/// Format map key of the unfocused selection.
pub const INACTIVE_SELECTED_TEXT: &str = "Inactive Selected Text";
/// Format map key of the insertion caret.
pub const CARET: &str = "Caret";
/// Format map key of the overwrite caret.
pub const OVERWRITE_CARET: &str = "Overwrite Caret";

/// Paint properties stored under one format map key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatProperties {
    /// Brush for glyphs and carets.
    pub foreground: Option<Brush>,
    /// Brush for fills behind text, such as the selection.
    pub background: Option<Brush>,
}

impl FormatProperties {
    /// Properties with only a foreground brush.
    pub fn foreground(brush: impl Into<Brush>) -> Self {
        Self {
            foreground: Some(brush.into()),
            background: None,
        }
    }

    /// Properties with only a background brush.
    pub fn background(brush: impl Into<Brush>) -> Self {
        Self {
            foreground: None,
            background: Some(brush.into()),
        }
    }
}

/// Maps keys such as [`SELECTED_TEXT`] to [`FormatProperties`].
///
/// Changes made inside a batch are coalesced into one
/// [`FormatMappingChanged`] when the batch ends.
#[derive(Debug, Default)]
pub struct EditorFormatMap {
    properties: HashMap<String, FormatProperties>,
    batch: Option<Vec<String>>,
}

impl EditorFormatMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The properties for `key`; empty properties when the key is unknown.
    pub fn properties(&self, key: &str) -> FormatProperties {
        self.properties.get(key).cloned().unwrap_or_default()
    }

    /// Whether `key` has properties.
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Adds properties for a key that has none yet.
    pub fn add_properties(
        &mut self,
        key: &str,
        properties: FormatProperties,
    ) -> Result<Option<FormatMappingChanged>> {
        if self.properties.contains_key(key) {
            return Err(ViewError::invalid_argument(format!(
                "format map already contains `{key}`"
            )));
        }
        Ok(self.set_properties(key, properties))
    }

    /// Replaces the properties for `key`.
    ///
    /// Returns the change notification to deliver, or `None` while batching
    /// or when nothing changed.
    pub fn set_properties(
        &mut self,
        key: &str,
        properties: FormatProperties,
    ) -> Option<FormatMappingChanged> {
        if self.properties.get(key) == Some(&properties) {
            return None;
        }
        self.properties.insert(key.to_owned(), properties);
        match &mut self.batch {
            Some(changed) => {
                if !changed.iter().any(|k| k == key) {
                    changed.push(key.to_owned());
                }
                None
            }
            None => Some(FormatMappingChanged {
                changed_items: vec![key.to_owned()],
            }),
        }
    }

    /// Starts coalescing changes.
    pub fn begin_batch_update(&mut self) -> Result<()> {
        if self.batch.is_some() {
            return Err(ViewError::invalid_state("format map batch already started"));
        }
        self.batch = Some(Vec::new());
        Ok(())
    }

    /// Ends the current batch and returns the coalesced notification, if any
    /// key changed.
    pub fn end_batch_update(&mut self) -> Result<Option<FormatMappingChanged>> {
        let changed = self
            .batch
            .take()
            .ok_or_else(|| ViewError::invalid_state("no format map batch in progress"))?;
        Ok((!changed.is_empty()).then_some(FormatMappingChanged {
            changed_items: changed,
        }))
    }

    /// Whether a batch is in progress.
    pub fn is_in_batch_update(&self) -> bool {
        self.batch.is_some()
    }
}

impl<K: Into<String>> FromIterator<(K, FormatProperties)> for EditorFormatMap {
    /// Seeds a map with properties. Seeding raises no change notifications.
    fn from_iter<I: IntoIterator<Item = (K, FormatProperties)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(key, properties)| (key.into(), properties))
                .collect(),
            batch: None,
        }
    }
}
