// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::tests::utils::{EventLog, Recorded, TestEnv};
use crate::{EditorOption, PositionAffinity, SelectionMode, ViewError};

#[test]
fn select_orders_the_endpoints() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(1, 5);
    let selection = env.view.selection();
    assert!(!selection.is_empty());
    assert!(!selection.is_reversed());
    assert_eq!(selection.start().position(), 1);
    assert_eq!(selection.end().position(), 5);
    assert_eq!(env.selected_ranges(), [1..5]);

    env.select(5, 1);
    let selection = env.view.selection();
    assert!(selection.is_reversed());
    assert_eq!(selection.anchor_point().position(), 5);
    assert_eq!(selection.active_point().position(), 1);
    assert_eq!(selection.stream_selection_span().unwrap().snapshot_span().range(), 1..5);
}

#[test]
fn empty_selection_follows_the_caret() {
    let mut env = TestEnv::new("ABC\nDEF");
    env.move_caret(6);
    let selection = env.view.selection();
    assert!(selection.is_empty());
    assert_eq!(selection.anchor_point().position(), 6);
    assert_eq!(selection.active_point().position(), 6);
    assert_eq!(env.selected_ranges(), [6..6]);
    let spans = selection.virtual_selected_spans().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(spans[0].is_empty());
}

#[test]
fn selecting_an_empty_range_is_not_a_change() {
    let mut env = TestEnv::new("ABC\nDEF");
    let log = EventLog::attach(&mut env.view);
    env.select(2, 2);
    env.view.clear_selection().unwrap();
    assert!(log.take().is_empty());

    env.select(0, 2);
    env.view.clear_selection().unwrap();
    env.view.clear_selection().unwrap();
    assert_eq!(log.take(), [Recorded::Selection, Recorded::Selection]);
    assert!(env.view.selection().is_empty());
}

#[test]
fn endpoints_snap_to_text_elements() {
    let mut env = TestEnv::new("e\u{301}e\u{301}\r\nx");
    env.select(1, 4);
    assert_eq!(env.selected_ranges(), [0..3]);

    // The middle of a line break is the end of the line.
    env.select(0, 7);
    assert_eq!(env.view.selection().end().position(), 6);
}

#[test]
fn full_line_selection_stops_at_the_line_break() {
    let mut env = TestEnv::new("ABC\nDEF\n");
    env.select(0, 4);
    let selection = env.view.selection();
    let lines = env.view.lines();

    let first = selection
        .selection_on_line(lines.first_line())
        .unwrap()
        .unwrap();
    assert_eq!(first.snapshot_span().range(), 0..4);
    assert!(selection.selection_on_line(lines.get(1).unwrap()).unwrap().is_none());
}

#[test]
fn selection_on_line_clips_to_each_line() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(2, 9);
    let selection = env.view.selection();
    let ranges: Vec<_> = env
        .view
        .lines()
        .iter()
        .map(|line| {
            selection
                .selection_on_line(line)
                .unwrap()
                .map(|span| span.snapshot_span().range())
        })
        .collect();
    assert_eq!(ranges, [Some(2..4), Some(4..8), Some(8..9)]);
}

#[test]
fn box_selection_has_one_span_per_line() {
    let mut env = TestEnv::new("ABCDE\nAB\nABCDE");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    env.select(1, 12);

    let spans = env.view.selection().virtual_selected_spans().unwrap();
    assert_eq!(spans.len(), 3);
    let physical: Vec<_> = spans
        .iter()
        .map(|span| span.snapshot_span().range())
        .collect();
    assert_eq!(physical, [1..3, 7..8, 10..12]);
    // The short line is padded with virtual space up to the box edge.
    assert_eq!(spans[1].end().virtual_spaces(), 1);
    assert_eq!(env.selected_ranges(), [1..3, 7..8, 10..12]);

    // The box is the same whichever corner is the anchor.
    env.select(12, 1);
    assert_eq!(env.selected_ranges(), [1..3, 7..8, 10..12]);
}

#[test]
fn box_edges_come_from_both_endpoints() {
    let mut env = TestEnv::new("ABCDE\nABCDE\nABCDE");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    // From column 4 on the first line to column 1 on the last.
    env.select(4, 13);
    assert_eq!(env.selected_ranges(), [1..4, 7..10, 13..16]);
}

#[test]
fn box_endpoints_keep_their_position_inside_a_cluster() {
    let mut env = TestEnv::new("ae\u{301}b\nxyzw");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    env.select(2, 8);
    let selection = env.view.selection();
    assert_eq!(selection.anchor_point().position(), 2);
    assert_eq!(selection.active_point().position(), 8);
    assert_eq!(selection.virtual_selected_spans().unwrap().len(), 2);

    env.view.set_selection_mode(SelectionMode::Stream).unwrap();
    env.select(2, 8);
    assert_eq!(env.view.selection().anchor_point().position(), 1);
}

#[test]
fn clearing_returns_to_stream_mode() {
    let mut env = TestEnv::new("ABC\nDEF");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    env.select(0, 5);
    env.view.clear_selection().unwrap();
    assert_eq!(env.view.selection().mode(), SelectionMode::Stream);
}

#[test]
fn edits_move_the_selection() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(1, 5);
    env.edit(0..0, "X");
    assert_eq!(env.selected_ranges(), [2..6]);

    let log = EventLog::attach(&mut env.view);
    env.edit(2..6, "");
    assert!(env.view.selection().is_empty());
    assert!(log.take_without_layout().contains(&Recorded::Selection));
}

#[test]
fn stale_points_are_rejected() {
    let mut env = TestEnv::new("ABC");
    let stale = env.point(1);
    env.edit(0..0, "X");
    let fresh = env.point(2);
    assert!(matches!(
        env.view.select(stale, fresh),
        Err(ViewError::InvalidSnapshot(_))
    ));
}

#[test]
fn turning_off_virtual_space_trims_the_selection() {
    let mut env = TestEnv::builder("AB\nCD")
        .option(EditorOption::UseVirtualSpace, true)
        .build();
    let (anchor, active) = (env.point(0), env.virtual_point(2, 3));
    env.view
        .move_caret_to(active.clone(), PositionAffinity::Successor, false)
        .unwrap();
    env.view.select(anchor, active).unwrap();
    assert!(env.view.selection().end().is_in_virtual_space());

    env.view
        .set_option(EditorOption::UseVirtualSpace, false)
        .unwrap();
    let selection = env.view.selection();
    assert!(!selection.end().is_in_virtual_space());
    assert_eq!(selection.end().position(), 2);
}

#[test]
fn focus_decides_whether_the_selection_is_active() {
    let mut env = TestEnv::new("ABC");
    assert!(!env.view.selection().is_active());
    env.view.set_has_focus(true).unwrap();
    assert!(env.view.selection().is_active());

    env.view.set_selection_is_active(false).unwrap();
    assert!(!env.view.selection().activation_tracks_focus());
    env.view.set_has_focus(true).unwrap();
    assert!(!env.view.selection().is_active());

    env.view.set_selection_activation_tracks_focus(true).unwrap();
    assert!(env.view.selection().is_active());
}
