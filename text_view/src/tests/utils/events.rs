// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::rc::Rc;

use crate::TextView;

/// A view event, reduced to what tests compare.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Recorded {
    Caret { old: usize, new: usize },
    Selection,
    Layout,
    Format(Vec<String>),
    Option(&'static str),
    ViewportLeft { old: f64, new: f64 },
    Closed,
}

/// Shared log filled by handlers attached with [`EventLog::attach`].
#[derive(Clone, Debug, Default)]
pub(crate) struct EventLog(Rc<RefCell<Vec<Recorded>>>);

impl EventLog {
    /// Subscribes to every event of `view`.
    pub(crate) fn attach(view: &mut TextView) -> Self {
        let log = Self::default();
        let l = log.clone();
        view.on_caret_position_changed(move |e| {
            l.push(Recorded::Caret {
                old: e.old_position.buffer_position().position(),
                new: e.new_position.buffer_position().position(),
            });
        });
        let l = log.clone();
        view.on_selection_changed(move |_| l.push(Recorded::Selection));
        let l = log.clone();
        view.on_layout_changed(move |_| l.push(Recorded::Layout));
        let l = log.clone();
        view.on_format_mapping_changed(move |e| l.push(Recorded::Format(e.changed_items.clone())));
        let l = log.clone();
        view.on_option_changed(move |e| l.push(Recorded::Option(e.name())));
        let l = log.clone();
        view.on_viewport_left_changed(move |e| {
            l.push(Recorded::ViewportLeft {
                old: e.old_left,
                new: e.new_left,
            });
        });
        let l = log.clone();
        view.on_closed(move |_| l.push(Recorded::Closed));
        log
    }

    fn push(&self, event: Recorded) {
        self.0.borrow_mut().push(event);
    }

    /// Takes the events recorded so far.
    pub(crate) fn take(&self) -> Vec<Recorded> {
        core::mem::take(&mut *self.0.borrow_mut())
    }

    /// Takes the recorded events, leaving out layout passes.
    pub(crate) fn take_without_layout(&self) -> Vec<Recorded> {
        self.take()
            .into_iter()
            .filter(|event| *event != Recorded::Layout)
            .collect()
    }
}
