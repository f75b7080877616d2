// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event arguments and handler lists.

use std::sync::atomic::{AtomicU64, Ordering};

use text_snapshot::TextSnapshot;

use crate::caret::CaretPosition;
use crate::layout::{LineId, Viewport};
use crate::options::EditorOption;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Token returned by every `on_*` registration of a
/// [`TextView`](crate::TextView).
///
/// Passing it to [`TextView::unsubscribe`](crate::TextView::unsubscribe)
/// detaches the handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// The caret moved.
#[derive(Clone, Debug)]
pub struct CaretPositionChanged {
    /// Where the caret was.
    pub old_position: CaretPosition,
    /// Where the caret is now.
    pub new_position: CaretPosition,
}

/// The selection changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionChanged;

/// A layout pass completed.
#[derive(Clone, Debug)]
pub struct LayoutChanged {
    /// The snapshot before the pass.
    pub old_snapshot: TextSnapshot,
    /// The snapshot the lines are now formatted for.
    pub new_snapshot: TextSnapshot,
    /// The viewport before the pass.
    pub old_viewport: Viewport,
    /// The viewport after the pass.
    pub new_viewport: Viewport,
    /// Lines that were formatted during the pass.
    pub new_or_reformatted_lines: Vec<LineId>,
    /// Lines that were kept but moved vertically.
    pub translated_lines: Vec<LineId>,
}

impl LayoutChanged {
    /// Whether the pass moved to a different snapshot.
    pub fn snapshot_changed(&self) -> bool {
        self.old_snapshot != self.new_snapshot
    }

    /// Horizontal viewport movement.
    pub fn horizontal_translation(&self) -> bool {
        self.old_viewport.left != self.new_viewport.left
    }

    /// Vertical viewport movement.
    pub fn vertical_translation(&self) -> bool {
        self.old_viewport.top != self.new_viewport.top
    }
}

/// Format map entries changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatMappingChanged {
    /// The keys whose properties changed, in first-change order.
    pub changed_items: Vec<String>,
}

/// An editor option took a new value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OptionChanged {
    /// The option that changed.
    pub option: EditorOption,
}

impl OptionChanged {
    /// The option's qualified name, such as `TextView/UseVirtualSpace`.
    pub fn name(&self) -> &'static str {
        self.option.name()
    }
}

/// The viewport scrolled horizontally.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewportLeftChanged {
    /// Left edge before the change.
    pub old_left: f64,
    /// Left edge after the change.
    pub new_left: f64,
}

/// The view was closed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewClosed;

type Handler<T> = Box<dyn FnMut(&T)>;

/// An ordered list of handlers for one event.
pub(crate) struct EventHandlers<T> {
    handlers: Vec<(Subscription, Handler<T>)>,
}

impl<T> EventHandlers<T> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> Subscription {
        let token = Subscription(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.handlers.push((token, Box::new(handler)));
        token
    }

    pub(crate) fn unsubscribe(&mut self, token: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _)| *t != token);
        self.handlers.len() != before
    }

    /// Calls every handler in subscription order.
    pub(crate) fn emit(&mut self, args: &T) {
        for (_, handler) in &mut self.handlers {
            handler(args);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl<T> Default for EventHandlers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every outward event of a view.
#[derive(Default)]
pub(crate) struct ViewEvents {
    pub(crate) caret_position_changed: EventHandlers<CaretPositionChanged>,
    pub(crate) selection_changed: EventHandlers<SelectionChanged>,
    pub(crate) layout_changed: EventHandlers<LayoutChanged>,
    pub(crate) format_mapping_changed: EventHandlers<FormatMappingChanged>,
    pub(crate) option_changed: EventHandlers<OptionChanged>,
    pub(crate) viewport_left_changed: EventHandlers<ViewportLeftChanged>,
    pub(crate) closed: EventHandlers<ViewClosed>,
}

impl ViewEvents {
    pub(crate) fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.caret_position_changed.unsubscribe(token)
            || self.selection_changed.unsubscribe(token)
            || self.layout_changed.unsubscribe(token)
            || self.format_mapping_changed.unsubscribe(token)
            || self.option_changed.unsubscribe(token)
            || self.viewport_left_changed.unsubscribe(token)
            || self.closed.unsubscribe(token)
    }

    pub(crate) fn clear(&mut self) {
        self.caret_position_changed.clear();
        self.selection_changed.clear();
        self.layout_changed.clear();
        self.format_mapping_changed.clear();
        self.option_changed.clear();
        self.viewport_left_changed.clear();
        self.closed.clear();
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.caret_position_changed.len()
            + self.selection_changed.len()
            + self.layout_changed.len()
            + self.format_mapping_changed.len()
            + self.option_changed.len()
            + self.viewport_left_changed.len()
            + self.closed.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::EventHandlers;

    #[test]
    fn handlers_run_in_order_and_detach() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut handlers = EventHandlers::<u32>::new();
        let a = {
            let seen = seen.clone();
            handlers.subscribe(move |v| seen.borrow_mut().push(("a", *v)))
        };
        {
            let seen = seen.clone();
            handlers.subscribe(move |v| seen.borrow_mut().push(("b", *v)));
        }
        handlers.emit(&1);
        assert!(handlers.unsubscribe(a));
        assert!(!handlers.unsubscribe(a));
        handlers.emit(&2);
        assert_eq!(*seen.borrow(), [("a", 1), ("b", 1), ("b", 2)]);
    }
}
