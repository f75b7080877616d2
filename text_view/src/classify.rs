// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use text_snapshot::TextSnapshotLine;

/// A classified range of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassificationSpan {
    /// Absolute byte range in the line's snapshot.
    pub range: Range<usize>,
    /// Name looked up in the [`StyleMap`](crate::StyleMap).
    pub classification: String,
}

impl ClassificationSpan {
    /// Creates a span.
    pub fn new(range: Range<usize>, classification: impl Into<String>) -> Self {
        Self {
            range,
            classification: classification.into(),
        }
    }
}

/// Splits a line into classified spans.
///
/// Spans may come in any order and may leave gaps; gaps use the default
/// style. Overlapping parts of later spans are ignored.
pub trait Classifier {
    /// Classifies the text of `line`, excluding its line break.
    fn classify(&self, line: &TextSnapshotLine) -> Vec<ClassificationSpan>;
}

/// A classifier that leaves every line unclassified.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullClassifier;

impl Classifier for NullClassifier {
    fn classify(&self, _line: &TextSnapshotLine) -> Vec<ClassificationSpan> {
        Vec::new()
    }
}
