// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use peniko::kurbo::Rect;
use peniko::{Brush, Color};

use crate::adornment::{AdornmentVisual, SELECTION_LAYER};
use crate::format_map::{INACTIVE_SELECTED_TEXT, SELECTED_TEXT};
use crate::selection::visual_overlaps_for_line;
use crate::tests::utils::{numbered_lines, Op, RecordingCanvas, TestEnv};
use crate::{FormatProperties, SelectionMode, TextView};

fn selection_visuals(view: &mut TextView) -> Vec<Rc<dyn AdornmentVisual>> {
    view.adornment_layer(SELECTION_LAYER)
        .unwrap()
        .elements()
        .iter()
        .map(|element| element.visual().clone())
        .collect()
}

fn path_bounds(view: &TextView) -> Vec<Rect> {
    let mut canvas = RecordingCanvas::default();
    view.render(&mut canvas).unwrap();
    canvas.paths()
}

#[test]
fn each_selected_line_gets_a_region() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(1, 6);
    assert_eq!(selection_visuals(&mut env.view).len(), 2);

    let bounds = path_bounds(&env.view);
    assert_eq!(bounds.len(), 2);
    // The first line includes the end-of-line area for the line break.
    assert_eq!((bounds[0].x0, bounds[0].x1), (10.0, 40.0));
    assert_eq!((bounds[0].y0, bounds[0].y1), (-0.5, 22.0));
    assert_eq!((bounds[1].x0, bounds[1].x1), (0.0, 20.0));
    assert_eq!(bounds[1].y0, 19.5);
}

#[test]
fn extending_the_selection_keeps_unchanged_lines() {
    let mut env = TestEnv::builder(&numbered_lines(10))
        .viewport(200.0, 200.0)
        .build();
    // Lines 0 through 4, then 0 through 5.
    env.select(0, 40);
    let before = selection_visuals(&mut env.view);
    assert_eq!(before.len(), 5);

    env.select(0, 48);
    let after = selection_visuals(&mut env.view);
    assert_eq!(after.len(), 6);
    for (old, new) in before.iter().zip(&after) {
        assert!(Rc::ptr_eq(old, new));
    }
    assert!(!before.iter().any(|old| Rc::ptr_eq(old, &after[5])));
}

#[test]
fn moving_the_end_repaints_only_its_line() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(1, 6);
    let before = selection_visuals(&mut env.view);
    env.select(1, 7);
    let after = selection_visuals(&mut env.view);
    assert_eq!(after.len(), 2);
    assert!(Rc::ptr_eq(&before[0], &after[0]));
    assert!(!Rc::ptr_eq(&before[1], &after[1]));
}

#[test]
fn clearing_removes_every_region() {
    let mut env = TestEnv::new("ABC\nDEF\nGHI");
    env.select(1, 9);
    assert_eq!(selection_visuals(&mut env.view).len(), 3);
    env.view.clear_selection().unwrap();
    assert!(selection_visuals(&mut env.view).is_empty());
}

#[test]
fn moving_a_box_edge_redraws_every_line() {
    let mut env = TestEnv::new("ABCDE\nABCDE\nABCDE");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    env.select(1, 14);
    let before = selection_visuals(&mut env.view);
    assert_eq!(before.len(), 3);

    // Moving the right edge changes the span on every line.
    env.select(1, 15);
    let after = selection_visuals(&mut env.view);
    assert_eq!(after.len(), 3);
    for (old, new) in before.iter().zip(&after) {
        assert!(!Rc::ptr_eq(old, new));
    }
    let bounds = path_bounds(&env.view);
    for rect in &bounds {
        assert_eq!((rect.x0, rect.x1), (10.0, 30.0));
    }
}

#[test]
fn box_selection_redraws_unchanged_lines() {
    let mut env = TestEnv::new("ABCDE\nABCDE\nABCDE");
    env.view.set_selection_mode(SelectionMode::Box).unwrap();
    env.select(1, 14);
    let before = selection_visuals(&mut env.view);
    assert_eq!(before.len(), 3);

    // Scrolling sideways leaves every line's span as it was.
    env.view.set_viewport_left(3.0).unwrap();
    let after = selection_visuals(&mut env.view);
    assert_eq!(after.len(), 3);
    for (old, new) in before.iter().zip(&after) {
        assert!(!Rc::ptr_eq(old, new));
    }
    for rect in path_bounds(&env.view) {
        assert_eq!((rect.x0, rect.x1), (10.0 - 3.0, 20.0 - 3.0));
    }
}

#[test]
fn stream_selection_survives_sideways_scrolling() {
    let mut env = TestEnv::new("ABCDE\nABCDE\nABCDE");
    env.select(1, 14);
    let before = selection_visuals(&mut env.view);
    env.view.set_viewport_left(3.0).unwrap();
    let after = selection_visuals(&mut env.view);
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert!(Rc::ptr_eq(old, new));
    }
}

#[test]
fn focus_switches_the_brush() {
    let mut env = TestEnv::new("ABC\nDEF");
    env.select(0, 2);
    let inactive = env.view.format_map().properties(INACTIVE_SELECTED_TEXT).background;
    let active = env.view.format_map().properties(SELECTED_TEXT).background;
    assert_ne!(inactive, active);

    let brush_of = |view: &TextView| {
        let mut canvas = RecordingCanvas::default();
        view.render(&mut canvas).unwrap();
        canvas.ops.iter().find_map(|op| match op {
            Op::Path { brush, .. } => Some(brush.clone()),
            _ => None,
        })
    };
    assert_eq!(brush_of(&env.view), inactive);
    env.view.set_has_focus(true).unwrap();
    assert_eq!(brush_of(&env.view), active);
    assert_eq!(selection_visuals(&mut env.view).len(), 1);
}

#[test]
fn format_changes_repaint_with_the_new_brush() {
    let mut env = TestEnv::new("ABC");
    env.view.set_has_focus(true).unwrap();
    env.select(0, 2);
    let red = Brush::Solid(Color::from_rgba8(255, 0, 0, 255));
    env.view
        .set_format_properties(SELECTED_TEXT, FormatProperties::background(red.clone()))
        .unwrap();

    let mut canvas = RecordingCanvas::default();
    env.view.render(&mut canvas).unwrap();
    let brushes: Vec<_> = canvas
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::Path { brush, .. } => Some(brush.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(brushes, [red]);
}

#[test]
fn scrolling_keeps_regions_in_place() {
    let mut env = TestEnv::new(&numbered_lines(20));
    env.select(8, 12);
    let before = selection_visuals(&mut env.view);
    env.view.scroll_vertically(10.0).unwrap();
    let after = selection_visuals(&mut env.view);
    assert!(Rc::ptr_eq(&before[0], &after[0]));

    let bounds = path_bounds(&env.view);
    assert_eq!(bounds[0].y0, 20.0 - 0.5 - 10.0);
}

#[test]
fn overlaps_extend_to_the_end_of_line() {
    let mut env = TestEnv::builder("AB\nCD")
        .option(crate::EditorOption::UseVirtualSpace, true)
        .build();
    env.select(1, 4);
    let selection = env.view.selection();
    let line = env.view.lines().first_line();
    let span = selection.selection_on_line(line).unwrap().unwrap();
    let pairs = visual_overlaps_for_line(line, &span, 4, false, true).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, 10.0);
    assert_eq!(pairs[0].1, f64::MAX);

    let pairs = visual_overlaps_for_line(line, &span, 4, false, false).unwrap();
    assert_eq!(pairs.as_slice(), [(10.0, 30.0)]);
}

#[test]
fn empty_span_is_caret_wide() {
    let env = TestEnv::new("AB\nCD");
    let selection = env.view.selection();
    let line = env.view.lines().first_line();
    let span = selection.selection_on_line(line).unwrap().unwrap();
    let pairs = visual_overlaps_for_line(line, &span, 0, false, false).unwrap();
    assert_eq!(pairs.as_slice(), [(0.0, 2.0)]);
}
