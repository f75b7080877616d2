// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod canvas;
mod env;
mod events;

pub(crate) use canvas::{Op, RecordingCanvas};
pub(crate) use env::{numbered_lines, styles, TestEnv, ADVANCE, LINE_HEIGHT};
pub(crate) use events::{EventLog, Recorded};
