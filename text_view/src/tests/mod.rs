// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_painter;
mod test_properties;
mod test_selection;
mod test_view;
mod utils;
