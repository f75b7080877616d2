// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::error::validate_range;
use crate::snapshot::next_buffer_id;
use crate::{Error, TextChange, TextSnapshot, TextVersion};

/// A mutable text buffer that publishes an immutable [`TextSnapshot`] after
/// every edit.
///
/// Snapshots taken earlier stay valid and can translate their points and
/// spans forward through the recorded changes.
#[derive(Debug)]
pub struct TextBuffer {
    id: u64,
    current: TextSnapshot,
}

impl TextBuffer {
    /// Creates a buffer holding `text` at version zero.
    pub fn new(text: impl Into<String>) -> Self {
        let id = next_buffer_id();
        Self {
            id,
            current: TextSnapshot::new(id, TextVersion::first(), text.into()),
        }
    }

    /// A handle to the latest snapshot.
    pub fn snapshot(&self) -> TextSnapshot {
        self.current.clone()
    }

    /// The latest snapshot by reference.
    pub fn current(&self) -> &TextSnapshot {
        &self.current
    }

    /// Replaces `range` with `text` and returns the new snapshot.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<TextSnapshot, Error> {
        self.edit([(range, text)])
    }

    /// Inserts `text` at `position` and returns the new snapshot.
    pub fn insert(&mut self, position: usize, text: &str) -> Result<TextSnapshot, Error> {
        self.edit([(position..position, text)])
    }

    /// Deletes `range` and returns the new snapshot.
    pub fn delete(&mut self, range: Range<usize>) -> Result<TextSnapshot, Error> {
        self.edit([(range, "")])
    }

    /// Applies a batch of non-overlapping edits as one version.
    ///
    /// All ranges are in the coordinates of the current snapshot. Edits that
    /// change nothing are dropped; if no edit remains, no version is
    /// published and the current snapshot is returned.
    pub fn edit<S: Into<String>>(
        &mut self,
        edits: impl IntoIterator<Item = (Range<usize>, S)>,
    ) -> Result<TextSnapshot, Error> {
        let text = self.current.text();
        let mut changes = Vec::new();
        for (range, new_text) in edits {
            validate_range(text, &range)?;
            changes.push(TextChange::new(range, new_text.into()));
        }
        changes.sort_by_key(TextChange::old_position);
        for pair in changes.windows(2) {
            if pair[0].old_end() > pair[1].old_position() {
                return Err(Error::overlapping_edits(pair[1].old_range(), text.len()));
            }
        }
        changes.retain(|change| change.old_len() != 0 || change.new_len() != 0);
        if changes.is_empty() {
            return Ok(self.snapshot());
        }

        let delta: isize = changes.iter().map(TextChange::delta).sum();
        let mut new_text = String::with_capacity(text.len().saturating_add_signed(delta));
        let mut cursor = 0;
        for change in &changes {
            new_text.push_str(&text[cursor..change.old_position()]);
            new_text.push_str(change.new_text());
            cursor = change.old_end();
        }
        new_text.push_str(&text[cursor..]);

        let version = self.current.version().push(changes);
        self.current = TextSnapshot::new(self.id, version, new_text);
        Ok(self.snapshot())
    }

    /// Publishes a new version with identical text.
    ///
    /// Observers see a snapshot change without any text changes.
    pub fn republish(&mut self) -> TextSnapshot {
        let version = self.current.version().push(Vec::new());
        self.current = TextSnapshot::new(self.id, version, self.current.text().to_owned());
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, TextBuffer};

    #[test]
    fn single_edits() {
        let mut buffer = TextBuffer::new("hello world");
        assert_eq!(buffer.replace(0..5, "HELLO").unwrap().text(), "HELLO world");
        assert_eq!(buffer.insert(11, "!").unwrap().text(), "HELLO world!");
        assert_eq!(buffer.delete(5..11).unwrap().text(), "HELLO!");
        assert_eq!(buffer.current().version().number(), 3);
    }

    #[test]
    fn batch_edits_use_original_coordinates() {
        let mut buffer = TextBuffer::new("0123456789");
        let snapshot = buffer.edit([(7..9, ""), (1..1, "AB")]).unwrap();
        assert_eq!(snapshot.text(), "0AB1234569");
        assert_eq!(snapshot.version().number(), 1);
    }

    #[test]
    fn overlapping_batch_is_rejected() {
        let mut buffer = TextBuffer::new("0123456789");
        let before = buffer.snapshot();
        let err = buffer.edit([(1..4, "x"), (3..5, "y")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OverlappingEdits);
        assert_eq!(buffer.snapshot(), before);
    }

    #[test]
    fn no_op_edit_keeps_version() {
        let mut buffer = TextBuffer::new("abc");
        let before = buffer.snapshot();
        let after = buffer.insert(1, "").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_edits_are_rejected() {
        let mut buffer = TextBuffer::new("né");
        assert_eq!(
            buffer.insert(2, "x").unwrap_err().kind(),
            ErrorKind::NotOnCharBoundary
        );
        assert_eq!(
            buffer.delete(0..9).unwrap_err().kind(),
            ErrorKind::InvalidBounds
        );
    }
}
