// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors reported by view operations.
///
/// Failures are reported to the caller and never recovered internally. A view
/// operation that fails leaves the view state as it was.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A point or span belongs to a snapshot other than the view's current one.
    #[error("snapshot mismatch: {0}")]
    InvalidSnapshot(String),

    /// An argument was out of range or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not valid in the current state, for example after the
    /// view was closed or when the caret is not on a formatted line.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The operation is not supported by this view.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A snapshot operation failed.
    #[error(transparent)]
    Snapshot(#[from] text_snapshot::Error),
}

impl ViewError {
    pub(crate) fn invalid_snapshot(what: impl Into<String>) -> Self {
        Self::InvalidSnapshot(what.into())
    }

    pub(crate) fn invalid_argument(what: impl Into<String>) -> Self {
        Self::InvalidArgument(what.into())
    }

    pub(crate) fn invalid_state(what: impl Into<String>) -> Self {
        Self::InvalidState(what.into())
    }

    pub(crate) fn not_supported(what: impl Into<String>) -> Self {
        Self::NotSupported(what.into())
    }

    pub(crate) fn closed() -> Self {
        Self::InvalidState("the view is closed".into())
    }
}

/// Result alias for view operations.
pub type Result<T, E = ViewError> = core::result::Result<T, E>;
