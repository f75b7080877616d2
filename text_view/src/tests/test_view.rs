// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use peniko::Color;

use crate::adornment::SELECTION_LAYER;
use crate::events::LayoutChanged;
use crate::format_map::{CARET, SELECTED_TEXT};
use crate::tests::utils::{numbered_lines, EventLog, Recorded, RecordingCanvas, TestEnv};
use crate::{
    AdornmentPositioningBehavior, AdornmentTag, AdornmentVisual, Canvas, EditorOption,
    FormatProperties, ViewError,
};

struct Nothing;

impl AdornmentVisual for Nothing {
    fn render(&self, _canvas: &mut dyn Canvas, _offset: peniko::kurbo::Vec2) {}
}

#[test]
fn closing_detaches_everything() {
    let mut env = TestEnv::new("ABC\nDEF");
    let log = EventLog::attach(&mut env.view);
    assert!(env.view.handler_count() >= 7);

    let removed = Rc::new(Cell::new(0));
    let counter = removed.clone();
    let mut layer = env.view.adornment_layer(SELECTION_LAYER).unwrap();
    assert!(layer.add_adornment(
        AdornmentPositioningBehavior::OwnerControlled,
        None,
        "note",
        Rc::new(Nothing),
        Some(Box::new(
            move |_tag: &AdornmentTag, _visual: &Rc<dyn AdornmentVisual>| {
                counter.set(counter.get() + 1);
            }
        )),
    ));

    env.view.close();
    env.view.close();
    assert!(env.view.is_closed());
    assert_eq!(log.take(), [Recorded::Closed]);
    assert_eq!(env.view.handler_count(), 0);
    assert_eq!(removed.get(), 1);
}

#[test]
fn closed_views_reject_operations() {
    let mut env = TestEnv::new("ABC");
    let point = env.point(1);
    env.view.close();

    assert!(matches!(
        env.view.set_viewport_size(10.0, 10.0),
        Err(ViewError::InvalidState(_))
    ));
    assert!(matches!(
        env.view.select(point.clone(), point),
        Err(ViewError::InvalidState(_))
    ));
    assert!(matches!(
        env.view.render(&mut RecordingCanvas::default()),
        Err(ViewError::InvalidState(_))
    ));
    assert!(matches!(
        env.view.adornment_layer(SELECTION_LAYER),
        Err(ViewError::InvalidState(_))
    ));
    assert!(matches!(
        env.view.dispatch_pending(),
        Err(ViewError::InvalidState(_))
    ));
    assert!(matches!(
        env.view.do_action_after_loaded(|_| Ok(())),
        Err(ViewError::InvalidState(_))
    ));
}

#[test]
fn unsubscribed_handlers_are_not_called() {
    let mut env = TestEnv::new("ABC");
    let count = env.view.handler_count();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let token = env.view.on_selection_changed(move |_| c.set(c.get() + 1));
    assert_eq!(env.view.handler_count(), count + 1);

    env.select(0, 2);
    assert!(env.view.unsubscribe(token));
    assert!(!env.view.unsubscribe(token));
    env.select(0, 1);
    assert_eq!(calls.get(), 1);
    assert_eq!(env.view.handler_count(), count);
}

#[test]
fn actions_after_loaded_run_again_once_loaded() {
    let mut env = TestEnv::builder("ABC").unloaded().build();
    assert!(!env.view.is_loaded());
    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    env.view
        .do_action_after_loaded(move |_| {
            r.set(r.get() + 1);
            Ok(())
        })
        .unwrap();
    assert_eq!(runs.get(), 1);

    env.view.set_viewport_size(200.0, 100.0).unwrap();
    assert!(env.view.is_loaded());
    assert_eq!(runs.get(), 2);

    // Once loaded, actions run only once.
    env.view.set_viewport_size(300.0, 100.0).unwrap();
    assert_eq!(runs.get(), 2);
    let r = runs.clone();
    env.view
        .do_action_after_loaded(move |_| {
            r.set(r.get() + 1);
            Ok(())
        })
        .unwrap();
    env.view.set_viewport_size(200.0, 100.0).unwrap();
    assert_eq!(runs.get(), 3);
}

#[test]
fn only_the_last_pending_action_is_kept() {
    let mut env = TestEnv::builder("ABC").unloaded().build();
    let runs = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second"] {
        let r = runs.clone();
        env.view
            .do_action_after_loaded(move |_| {
                r.borrow_mut().push(name);
                Ok(())
            })
            .unwrap();
    }
    env.view.set_viewport_size(200.0, 100.0).unwrap();
    assert_eq!(*runs.borrow(), ["first", "second", "second"]);
}

#[test]
fn posted_actions_run_in_order() {
    let mut env = TestEnv::new("ABC");
    let runs = Rc::new(RefCell::new(Vec::new()));
    let r = runs.clone();
    env.view.post(move |view| {
        r.borrow_mut().push(1);
        let r = r.clone();
        view.post(move |_| {
            r.borrow_mut().push(3);
            Ok(())
        });
        Ok(())
    });
    env.view
        .post(|_| Err(ViewError::InvalidArgument("failing action".into())));
    let r = runs.clone();
    env.view.post(move |_| {
        r.borrow_mut().push(2);
        Ok(())
    });
    assert!(runs.borrow().is_empty());

    let dispatched = env.view.dispatch_pending().unwrap();
    assert_eq!(dispatched.actions, 4);
    assert_eq!(*runs.borrow(), [1, 2, 3]);
    assert_eq!(env.view.dispatch_pending().unwrap().actions, 0);
}

#[test]
fn closing_from_a_posted_action_stops_dispatch() {
    let mut env = TestEnv::new("ABC");
    let ran = Rc::new(Cell::new(false));
    let r = ran.clone();
    env.view.post(|view| {
        view.close();
        Ok(())
    });
    env.view.post(move |_| {
        r.set(true);
        Ok(())
    });
    assert_eq!(env.view.dispatch_pending().unwrap().actions, 1);
    assert!(!ran.get());
}

#[test]
fn options_raise_events_on_change() {
    let mut env = TestEnv::new("ABC");
    let log = EventLog::attach(&mut env.view);
    assert!(env.view.set_option(EditorOption::AutoScroll, true).unwrap());
    assert!(!env.view.set_option(EditorOption::AutoScroll, true).unwrap());
    assert!(env
        .view
        .set_option_by_name("TextViewHost/IsInContrastMode", true)
        .unwrap());
    assert!(matches!(
        env.view.set_option_by_name("TextView/WordWrap", true),
        Err(ViewError::InvalidArgument(_))
    ));
    assert_eq!(
        log.take(),
        [
            Recorded::Option("TextView/AutoScroll"),
            Recorded::Option("TextViewHost/IsInContrastMode"),
        ]
    );
    assert!(env.view.options().auto_scroll());
    assert!(env.view.options().is_in_contrast_mode());
}

#[test]
fn format_changes_are_coalesced_in_a_batch() {
    let mut env = TestEnv::new("ABC");
    let log = EventLog::attach(&mut env.view);
    let blue = FormatProperties::foreground(Color::from_rgba8(0, 0, 255, 255));
    let green = FormatProperties::background(Color::from_rgba8(0, 255, 0, 255));

    env.view.begin_format_batch_update().unwrap();
    assert!(matches!(
        env.view.begin_format_batch_update(),
        Err(ViewError::InvalidState(_))
    ));
    env.view.set_format_properties(CARET, blue.clone()).unwrap();
    env.view.set_format_properties(SELECTED_TEXT, green).unwrap();
    env.view.set_format_properties(CARET, blue.clone()).unwrap();
    assert!(log.take().is_empty());

    env.view.end_format_batch_update().unwrap();
    assert_eq!(
        log.take(),
        [Recorded::Format(vec![CARET.into(), SELECTED_TEXT.into()])]
    );
    assert_eq!(env.view.format_map().properties(CARET), blue);

    // Setting the same properties again is not a change.
    env.view.set_format_properties(CARET, blue).unwrap();
    assert!(log.take().is_empty());
    assert!(matches!(
        env.view.end_format_batch_update(),
        Err(ViewError::InvalidState(_))
    ));
}

#[test]
fn layout_events_describe_the_pass() {
    let mut env = TestEnv::new(&numbered_lines(20));
    let passes: Rc<RefCell<Vec<LayoutChanged>>> = Rc::default();
    let p = passes.clone();
    env.view.on_layout_changed(move |e| p.borrow_mut().push(e.clone()));

    env.view.scroll_vertically(30.0).unwrap();
    {
        let passes = passes.borrow();
        let pass = &passes[0];
        assert!(!pass.snapshot_changed());
        assert!(pass.vertical_translation());
        assert!(!pass.horizontal_translation());
        assert_eq!(pass.new_viewport.top, 30.0);
        let new_lines: Vec<_> = env
            .view
            .lines()
            .iter()
            .filter(|line| line.line_number() >= 5)
            .map(|line| line.id())
            .collect();
        assert_eq!(pass.new_or_reformatted_lines, new_lines);
        assert!(pass.translated_lines.is_empty());
    }

    env.edit(0..0, "x");
    let passes = passes.borrow();
    let pass = &passes[1];
    assert!(pass.snapshot_changed());
    assert_eq!(pass.new_or_reformatted_lines.len(), env.view.lines().len());
}

#[test]
fn horizontal_scrolling_raises_its_own_event() {
    let mut env = TestEnv::new("ABC");
    let log = EventLog::attach(&mut env.view);
    env.view.set_viewport_left(40.0).unwrap();
    env.view.set_viewport_left(40.0).unwrap();
    assert_eq!(
        log.take(),
        [
            Recorded::ViewportLeft {
                old: 0.0,
                new: 40.0,
            },
            Recorded::Layout,
        ]
    );
}
