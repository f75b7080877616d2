// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime editor options.

use crate::error::{Result, ViewError};

/// A named boolean option that influences caret and selection behavior.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EditorOption {
    /// Allow the caret and selection to extend past the end of a line.
    UseVirtualSpace,
    /// Typing replaces the character after the caret.
    OverwriteMode,
    /// Keep the caret in view when text is appended below it.
    AutoScroll,
    /// The host is rendering in a high contrast theme.
    IsInContrastMode,
}

impl EditorOption {
    /// Every option, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::UseVirtualSpace,
        Self::OverwriteMode,
        Self::AutoScroll,
        Self::IsInContrastMode,
    ];

    /// The option's qualified name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UseVirtualSpace => "TextView/UseVirtualSpace",
            Self::OverwriteMode => "TextView/OverwriteMode",
            Self::AutoScroll => "TextView/AutoScroll",
            Self::IsInContrastMode => "TextViewHost/IsInContrastMode",
        }
    }

    /// Looks an option up by its qualified name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.name() == name)
    }
}

/// The current value of every [`EditorOption`].
///
/// All options default to `false`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorOptions {
    use_virtual_space: bool,
    overwrite_mode: bool,
    auto_scroll: bool,
    is_in_contrast_mode: bool,
}

impl EditorOptions {
    /// Creates options with every value set to `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, option: EditorOption, value: bool) -> Self {
        self.set(option, value);
        self
    }

    /// The value of `option`.
    pub fn get(&self, option: EditorOption) -> bool {
        match option {
            EditorOption::UseVirtualSpace => self.use_virtual_space,
            EditorOption::OverwriteMode => self.overwrite_mode,
            EditorOption::AutoScroll => self.auto_scroll,
            EditorOption::IsInContrastMode => self.is_in_contrast_mode,
        }
    }

    /// The value of the option called `name`.
    pub fn get_by_name(&self, name: &str) -> Result<bool> {
        EditorOption::from_name(name)
            .map(|option| self.get(option))
            .ok_or_else(|| unknown_option(name))
    }

    /// Sets `option` and reports whether the value changed.
    pub fn set(&mut self, option: EditorOption, value: bool) -> bool {
        let slot = match option {
            EditorOption::UseVirtualSpace => &mut self.use_virtual_space,
            EditorOption::OverwriteMode => &mut self.overwrite_mode,
            EditorOption::AutoScroll => &mut self.auto_scroll,
            EditorOption::IsInContrastMode => &mut self.is_in_contrast_mode,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Sets the option called `name` and reports whether the value changed.
    pub fn set_by_name(&mut self, name: &str, value: bool) -> Result<bool> {
        let option = EditorOption::from_name(name).ok_or_else(|| unknown_option(name))?;
        Ok(self.set(option, value))
    }

    /// Whether virtual space is enabled.
    pub fn use_virtual_space(&self) -> bool {
        self.use_virtual_space
    }

    /// Whether overwrite mode is enabled.
    pub fn overwrite_mode(&self) -> bool {
        self.overwrite_mode
    }

    /// Whether auto-scroll is enabled.
    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Whether the host is in contrast mode.
    pub fn is_in_contrast_mode(&self) -> bool {
        self.is_in_contrast_mode
    }
}

fn unknown_option(name: &str) -> ViewError {
    log::warn!("unknown editor option `{name}`");
    ViewError::invalid_argument(format!("unknown editor option `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::{EditorOption, EditorOptions};
    use crate::ViewError;

    #[test]
    fn names_round_trip() {
        for option in EditorOption::ALL {
            assert_eq!(EditorOption::from_name(option.name()), Some(option));
        }
        assert_eq!(EditorOption::from_name("TextView/WordWrap"), None);
    }

    #[test]
    fn set_reports_changes() {
        let mut options = EditorOptions::new();
        assert!(options.set(EditorOption::OverwriteMode, true));
        assert!(!options.set(EditorOption::OverwriteMode, true));
        assert!(options.overwrite_mode());
        assert!(options.set_by_name("TextView/UseVirtualSpace", true).unwrap());
        assert!(options.get_by_name("TextView/UseVirtualSpace").unwrap());
        assert!(matches!(
            options.set_by_name("nope", true),
            Err(ViewError::InvalidArgument(_))
        ));
    }
}
