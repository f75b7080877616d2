// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text Snapshot is a Rust crate which models an editable text buffer as a
//! chain of immutable, versioned snapshots.
//!
//! Every edit made through a [`TextBuffer`] produces a new [`TextSnapshot`].
//! Snapshots never change, so they can be held by layout and view code while
//! the buffer moves on. Positions are expressed as [`SnapshotPoint`]s and
//! [`SnapshotSpan`]s, which carry the snapshot they belong to and can be
//! translated forward through later versions using the recorded
//! [`TextChange`]s.
//!
//! Offsets are UTF-8 byte offsets and always lie on `char` boundaries.
//!
//! ## Example
//!
//! ```
//! use text_snapshot::{PointTrackingMode, TextBuffer};
//!
//! let mut buffer = TextBuffer::new("Hello world");
//! let before = buffer.snapshot();
//! let world = before.point(6).unwrap();
//!
//! let after = buffer.insert(0, ">> ").unwrap();
//! let moved = world.translate_to(&after, PointTrackingMode::Positive).unwrap();
//! assert_eq!(moved.position(), 9);
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

mod buffer;
mod change;
mod error;
mod line;
mod point;
mod snapshot;
mod span;

pub use crate::buffer::TextBuffer;
pub use crate::change::{PointTrackingMode, SpanTrackingMode, TextChange};
pub use crate::error::{BoundaryInfo, Endpoint, Error, ErrorKind};
pub use crate::line::TextSnapshotLine;
pub use crate::point::{SnapshotPoint, VirtualSnapshotPoint};
pub use crate::snapshot::{TextSnapshot, TextVersion};
pub use crate::span::{NormalizedSpans, SnapshotSpan, VirtualSnapshotSpan};
