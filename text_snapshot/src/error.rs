// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

/// Rich error type for snapshot operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the offending byte range, the
/// length of the text it was checked against and, for boundary failures, the
/// enclosing UTF-8 character span.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The start byte index of the caller-provided range or position.
    start: usize,

    /// The end byte index (exclusive) of the caller-provided range.
    end: usize,

    /// The length in bytes of the text the input was checked against.
    len: usize,

    /// Extra detail for boundary-related errors, when available.
    boundary: Option<BoundaryInfo>,
}

#[expect(
    clippy::len_without_is_empty,
    reason = "`Error::len` reports source text length context; an `is_empty` method would be misleading and unused."
)]
impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The start byte index of the range (or the position) provided by the caller.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The end byte index of the range provided by the caller.
    ///
    /// Equal to [`Error::start`] for errors about a single position.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The length in bytes of the text at the time of the error.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Extra details for boundary-related errors, if available.
    pub fn boundary(&self) -> Option<BoundaryInfo> {
        self.boundary
    }

    fn new(kind: ErrorKind, range: Range<usize>, len: usize) -> Self {
        Self {
            kind,
            start: range.start,
            end: range.end,
            len,
            boundary: None,
        }
    }

    pub(crate) fn invalid_bounds(range: Range<usize>, len: usize) -> Self {
        Self::new(ErrorKind::InvalidBounds, range, len)
    }

    pub(crate) fn invalid_range(range: Range<usize>, len: usize) -> Self {
        Self::new(ErrorKind::InvalidRange, range, len)
    }

    pub(crate) fn overlapping_edits(range: Range<usize>, len: usize) -> Self {
        Self::new(ErrorKind::OverlappingEdits, range, len)
    }

    pub(crate) fn foreign_snapshot(position: usize, len: usize) -> Self {
        Self::new(ErrorKind::ForeignSnapshot, position..position, len)
    }

    pub(crate) fn backward_translation(position: usize, len: usize) -> Self {
        Self::new(ErrorKind::BackwardTranslation, position..position, len)
    }

    pub(crate) fn line_out_of_range(line_number: usize, line_count: usize) -> Self {
        Self::new(
            ErrorKind::LineOutOfRange,
            line_number..line_number,
            line_count,
        )
    }

    pub(crate) fn not_on_char_boundary(
        text: &str,
        range: Range<usize>,
        which: Endpoint,
        index: usize,
    ) -> Self {
        let (char_start, char_end) = enclosing_char_span(text, index).unwrap_or((index, index));
        Self {
            kind: ErrorKind::NotOnCharBoundary,
            start: range.start,
            end: range.end,
            len: text.len(),
            boundary: Some(BoundaryInfo {
                which,
                index,
                char_start,
                char_end,
            }),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidBounds => write!(
                f,
                "range {}..{} out of bounds for len {}",
                self.start, self.end, self.len
            ),
            ErrorKind::InvalidRange => {
                write!(f, "invalid range {}..{}: start > end", self.start, self.end)
            }
            ErrorKind::NotOnCharBoundary => {
                if let Some(b) = self.boundary {
                    let which = match b.which {
                        Endpoint::Start => "start",
                        Endpoint::End => "end",
                    };
                    write!(
                        f,
                        "range {}..{}: {} index {} not on UTF-8 boundary (char {}..{})",
                        self.start, self.end, which, b.index, b.char_start, b.char_end
                    )
                } else {
                    write!(
                        f,
                        "range {}..{} not on UTF-8 boundary",
                        self.start, self.end
                    )
                }
            }
            ErrorKind::OverlappingEdits => write!(
                f,
                "edit {}..{} overlaps an earlier edit in the same batch",
                self.start, self.end
            ),
            ErrorKind::ForeignSnapshot => write!(
                f,
                "position {} belongs to a snapshot of another buffer",
                self.start
            ),
            ErrorKind::BackwardTranslation => write!(
                f,
                "position {} cannot be translated to an older snapshot",
                self.start
            ),
            ErrorKind::LineOutOfRange => write!(
                f,
                "line {} out of range for {} lines",
                self.start, self.len
            ),
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Provided indices were out of bounds relative to the text length.
    InvalidBounds,

    /// The provided range had `start > end`.
    InvalidRange,

    /// Either `start` or `end` was not aligned to a UTF-8 character boundary.
    NotOnCharBoundary,

    /// Two edits of one batch touched overlapping ranges.
    OverlappingEdits,

    /// The operation mixed snapshots of different buffers.
    ForeignSnapshot,

    /// A point or span was asked to move to an older version of its buffer.
    BackwardTranslation,

    /// A line number was not below the snapshot's line count.
    LineOutOfRange,
}

/// Identifies which endpoint of a range failed boundary validation.
///
/// This type is surfaced via [`BoundaryInfo`], which is attached to [`Error`]
/// for boundary-related failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// The `start` endpoint of the range.
    Start,

    /// The `end` endpoint of the range.
    End,
}

/// Details about an offending index that was not on a UTF-8 character boundary.
///
/// Returned by [`Error::boundary`] when the error kind is
/// [`ErrorKind::NotOnCharBoundary`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundaryInfo {
    /// Which endpoint (`start` or `end`) was invalid.
    pub which: Endpoint,

    /// The offending byte index.
    pub index: usize,

    /// The start byte index of the enclosing UTF-8 codepoint.
    pub char_start: usize,

    /// The end byte index (exclusive) of the enclosing UTF-8 codepoint.
    pub char_end: usize,
}

/// Validates `range` against `text`: ordered, in bounds, on char boundaries.
pub(crate) fn validate_range(text: &str, range: &Range<usize>) -> Result<(), Error> {
    let len = text.len();
    if range.start > range.end {
        return Err(Error::invalid_range(range.clone(), len));
    }
    if range.end > len {
        return Err(Error::invalid_bounds(range.clone(), len));
    }
    if !text.is_char_boundary(range.start) {
        return Err(Error::not_on_char_boundary(
            text,
            range.clone(),
            Endpoint::Start,
            range.start,
        ));
    }
    if !text.is_char_boundary(range.end) {
        return Err(Error::not_on_char_boundary(
            text,
            range.clone(),
            Endpoint::End,
            range.end,
        ));
    }
    Ok(())
}

fn enclosing_char_span(text: &str, index: usize) -> Option<(usize, usize)> {
    if index > text.len() {
        return None;
    }
    if text.is_char_boundary(index) {
        return Some((index, index));
    }
    // `index` is inside a codepoint, so both searches stay within the text
    // and are bounded by the maximum UTF-8 sequence length.
    let start = (0..index).rev().find(|&i| text.is_char_boundary(i))?;
    let end = (index + 1..=text.len()).find(|&i| text.is_char_boundary(i))?;
    Some((start, end))
}
