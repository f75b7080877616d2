// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view: owns the layout, caret, selection and adornments and keeps
//! them consistent.

mod render;
mod services;

use core::fmt;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::rc::Rc;

use peniko::kurbo::Vec2;
use peniko::{Brush, Color};
use text_snapshot::{TextSnapshot, VirtualSnapshotPoint};

use crate::adornment::{
    AdornmentLayer, AdornmentLayerMut, CARET_LAYER, LayerDefinition, SELECTION_LAYER, TEXT_LAYER,
    ViewElement, ViewStack,
};
use crate::caret::{
    BlinkTimer, Caret, CaretBlinkSettings, CaretContext, CaretMove, CaretPosition,
    PositionAffinity,
};
use crate::error::{Result, ViewError};
use crate::events::{
    CaretPositionChanged, FormatMappingChanged, LayoutChanged, OptionChanged, SelectionChanged,
    Subscription, ViewClosed, ViewEvents, ViewportLeftChanged,
};
use crate::format_map::{
    CARET, EditorFormatMap, FormatProperties, INACTIVE_SELECTED_TEXT, OVERWRITE_CARET,
    SELECTED_TEXT,
};
use crate::layout::{
    LayoutPass, LineChange, LineLayoutEngine, LineSource, ViewLayout, ViewLineCollection,
    ViewRelativePosition, Viewport, VisualLine,
};
use crate::options::{EditorOption, EditorOptions};
use crate::selection::{
    Paint, Selection, SelectionMode, SelectionOutcome, SelectionPainter, SelectionView,
};

pub use services::{NoSmartIndent, SmartIndent, TextViewServices};

/// Deferred work run by [`TextView::dispatch_pending`].
pub type PostedAction = Box<dyn FnOnce(&mut TextView) -> Result<()>>;

/// Work re-run once the view has been laid out with a non-empty viewport.
pub type LoadedAction = Rc<dyn Fn(&mut TextView) -> Result<()>>;

/// What [`TextView::dispatch_pending`] processed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Caret blink ticks received from the timer.
    pub ticks: usize,
    /// Posted actions run.
    pub actions: usize,
}

/// A text view over one buffer.
///
/// The view is bound to the thread that created it. Every state change runs
/// to completion before the method returns: the caret and selection follow
/// a layout pass before adornments are reconciled and painted, and events
/// are raised last.
pub struct TextView {
    layout: ViewLayout,
    options: EditorOptions,
    format_map: EditorFormatMap,
    caret: Caret,
    selection: Selection,
    focused_painter: SelectionPainter,
    unfocused_painter: SelectionPainter,
    stack: ViewStack,
    overlay: ViewStack,
    events: ViewEvents,
    services: ViewServices,
    blink: BlinkTimer,
    posted: VecDeque<PostedAction>,
    loaded_action: Option<LoadedAction>,
    is_loaded: bool,
    is_closed: bool,
}

struct ViewServices {
    smart_indent: Box<dyn SmartIndent>,
    blink_settings: Box<dyn CaretBlinkSettings>,
}

impl TextView {
    /// Creates a view of `snapshot` with an empty viewport.
    ///
    /// The view becomes loaded on the first layout with a non-empty viewport,
    /// see [`set_viewport_size`](Self::set_viewport_size).
    pub fn new(
        snapshot: TextSnapshot,
        services: TextViewServices,
        options: EditorOptions,
    ) -> Result<Self> {
        let TextViewServices {
            styles,
            classifier,
            smart_indent,
            blink_settings,
            layers,
        } = services;
        let engine = LineLayoutEngine::new(styles, classifier)?;
        let layout = ViewLayout::new(engine, snapshot.clone(), Viewport::default())?;

        let mut definitions = LayerDefinition::predefined().to_vec();
        for layer in layers {
            if definitions.iter().any(|d| d.name == layer.name) {
                return Err(ViewError::invalid_argument(format!(
                    "layer `{}` is defined twice",
                    layer.name
                )));
            }
            definitions.push(layer);
        }
        let mut stack = ViewStack::new(&definitions, false);
        let added = stack.try_add_element(TEXT_LAYER, ViewElement::Text)
            && stack.try_add_element(CARET_LAYER, ViewElement::Caret)
            && stack.adornment_layer(SELECTION_LAYER).is_some();
        if !added {
            return Err(ViewError::invalid_state("predefined layers are missing"));
        }
        let overlay = ViewStack::new(&definitions, true);

        let format_map = default_format_map();
        let focused_painter = SelectionPainter::new(selection_brush(&format_map, SELECTED_TEXT));
        let unfocused_painter =
            SelectionPainter::new(selection_brush(&format_map, INACTIVE_SELECTED_TEXT));

        let mut view = Self {
            caret: Caret::new(&snapshot),
            selection: Selection::new(&snapshot),
            layout,
            options,
            format_map,
            focused_painter,
            unfocused_painter,
            stack,
            overlay,
            events: ViewEvents::default(),
            services: ViewServices {
                smart_indent,
                blink_settings,
            },
            blink: BlinkTimer::new(),
            posted: VecDeque::new(),
            loaded_action: None,
            is_loaded: false,
            is_closed: false,
        };
        let ctx = caret_context(
            &view.layout,
            &view.options,
            &view.selection,
            &*view.services.smart_indent,
        );
        // Nothing observes the view yet, so the initial move is not reported.
        let _initial_move = view.caret.refresh(&ctx, true, false)?;
        log::debug!("view created over {snapshot:?}");
        Ok(view)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed {
            Err(ViewError::closed())
        } else {
            Ok(())
        }
    }

    /// The snapshot the view is formatted for.
    pub fn snapshot(&self) -> &TextSnapshot {
        self.layout.snapshot()
    }

    /// The formatted lines.
    pub fn lines(&self) -> &ViewLineCollection {
        self.layout.lines()
    }

    /// The viewport.
    pub fn viewport(&self) -> Viewport {
        self.layout.viewport()
    }

    /// The layout, as a [`LineSource`].
    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    /// The formatted line containing `position`, or a freshly formatted
    /// unattached one.
    pub fn line_containing(&self, position: usize) -> Result<Cow<'_, VisualLine>> {
        self.layout.line_containing(position)
    }

    /// The caret.
    pub fn caret(&self) -> &Caret {
        &self.caret
    }

    /// The selection, resolved against the caret.
    pub fn selection(&self) -> SelectionView<'_> {
        SelectionView::new(&self.selection, &self.layout, self.caret.point())
    }

    /// The current options.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The format map.
    pub fn format_map(&self) -> &EditorFormatMap {
        &self.format_map
    }

    /// Whether the view has been laid out with a non-empty viewport.
    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    // --- Layout ---

    /// Moves the view to a later snapshot of the same buffer.
    pub fn set_snapshot(&mut self, snapshot: TextSnapshot) -> Result<()> {
        self.ensure_open()?;
        if &snapshot == self.layout.snapshot() {
            return Ok(());
        }
        let pass = self.layout.set_snapshot(snapshot)?;
        self.layout_changed(pass)
    }

    /// Resizes the viewport.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.ensure_open()?;
        let pass = self.layout.set_viewport_size(width, height)?;
        self.layout_changed(pass)
    }

    /// Scrolls down by `pixels`, or up when negative.
    pub fn scroll_vertically(&mut self, pixels: f64) -> Result<()> {
        self.ensure_open()?;
        let pass = self.layout.scroll_vertically(pixels)?;
        self.layout_changed(pass)
    }

    /// Scrolls horizontally. Negative values are clamped to zero.
    pub fn set_viewport_left(&mut self, left: f64) -> Result<()> {
        self.ensure_open()?;
        let old_left = self.layout.viewport().left;
        let pass = self.layout.set_viewport_left(left)?;
        let new_left = self.layout.viewport().left;
        if old_left == new_left {
            return Ok(());
        }
        self.events
            .viewport_left_changed
            .emit(&ViewportLeftChanged { old_left, new_left });
        self.layout_changed(pass)
    }

    /// Lays the view out so the line containing `position` is `distance`
    /// pixels from the viewport edge given by `relative_to`.
    pub fn display_line_containing(
        &mut self,
        position: usize,
        distance: f64,
        relative_to: ViewRelativePosition,
    ) -> Result<()> {
        self.ensure_open()?;
        let pass = self
            .layout
            .display_line_containing(position, distance, relative_to)?;
        self.layout_changed(pass)
    }

    fn layout_changed(&mut self, pass: LayoutPass) -> Result<()> {
        let LayoutPass {
            old_snapshot,
            old_viewport,
        } = pass;
        let new_snapshot = self.layout.snapshot().clone();
        let new_viewport = self.layout.viewport();
        let snapshot_changed = old_snapshot != new_snapshot;

        let ctx = caret_context(
            &self.layout,
            &self.options,
            &self.selection,
            &*self.services.smart_indent,
        );
        let (caret_move, scroll) = self.caret.layout_changed(&ctx, &old_snapshot)?;
        let outcome = self.selection.layout_changed(&self.layout, snapshot_changed)?;

        let delta = Vec2::new(
            new_viewport.left - old_viewport.left,
            new_viewport.top - old_viewport.top,
        );
        let lines = self.layout.lines();
        self.stack.set_snapshot_and_update(lines, &new_snapshot, delta);
        self.overlay.set_snapshot_and_update(lines, &new_snapshot, delta);

        self.paint_selection(outcome.paint)?;
        self.update_blink_timer(caret_move.moved());
        if caret_move.raise && caret_move.moved() {
            self.raise_caret_events(caret_move);
        }
        if outcome.raise {
            self.events.selection_changed.emit(&SelectionChanged);
        }

        let lines = self.layout.lines();
        let changed = LayoutChanged {
            old_snapshot,
            new_snapshot,
            old_viewport,
            new_viewport,
            new_or_reformatted_lines: lines
                .iter()
                .filter(|line| line.change() == LineChange::NewOrReformatted)
                .map(VisualLine::id)
                .collect(),
            translated_lines: lines
                .iter()
                .filter(|line| line.change() == LineChange::Translated)
                .map(VisualLine::id)
                .collect(),
        };
        self.events.layout_changed.emit(&changed);

        if scroll {
            self.post(|view| view.ensure_caret_visible());
        }
        if !self.is_loaded && new_viewport.width > 0.0 && new_viewport.height > 0.0 {
            self.is_loaded = true;
            log::debug!("view loaded at {}x{}", new_viewport.width, new_viewport.height);
            if let Some(action) = self.loaded_action.take() {
                action(self)?;
            }
        }
        Ok(())
    }

    // --- Caret ---

    fn caret_move(
        &mut self,
        f: impl FnOnce(&mut Caret, &CaretContext<'_>) -> Result<CaretMove>,
    ) -> Result<CaretPosition> {
        self.ensure_open()?;
        let ctx = caret_context(
            &self.layout,
            &self.options,
            &self.selection,
            &*self.services.smart_indent,
        );
        let caret_move = f(&mut self.caret, &ctx)?;
        self.apply_caret_move(caret_move);
        Ok(self.caret.position())
    }

    /// Moves the caret to `point`. With `capture_horizontal` the caret's x
    /// coordinate becomes the preferred one for vertical moves.
    pub fn move_caret_to(
        &mut self,
        point: VirtualSnapshotPoint,
        affinity: PositionAffinity,
        capture_horizontal: bool,
    ) -> Result<CaretPosition> {
        self.caret_move(|caret, ctx| caret.move_to(ctx, point, affinity, capture_horizontal))
    }

    /// Moves the caret to the line containing `position`, at the preferred
    /// x coordinate.
    pub fn move_caret_to_line(&mut self, position: usize) -> Result<CaretPosition> {
        let line = self.layout.line_containing(position)?.into_owned();
        self.caret_move(|caret, ctx| caret.move_to_line(ctx, &line))
    }

    /// Moves the caret to the line containing `position`, near `x`.
    pub fn move_caret_to_x(
        &mut self,
        position: usize,
        x: f64,
        capture_horizontal: bool,
    ) -> Result<CaretPosition> {
        let line = self.layout.line_containing(position)?.into_owned();
        self.caret_move(|caret, ctx| caret.move_to_x(ctx, &line, x, capture_horizontal))
    }

    /// Moves the caret to the preferred coordinates, on the line at the
    /// preferred y coordinate.
    pub fn move_caret_to_preferred_coordinates(&mut self) -> Result<CaretPosition> {
        self.caret_move(|caret, ctx| caret.move_to_preferred_coordinates(ctx))
    }

    /// Moves the caret one text element forward.
    pub fn move_caret_to_next_caret_position(&mut self) -> Result<CaretPosition> {
        self.caret_move(|caret, ctx| caret.move_to_next_caret_position(ctx))
    }

    /// Moves the caret one text element back.
    pub fn move_caret_to_previous_caret_position(&mut self) -> Result<CaretPosition> {
        self.caret_move(|caret, ctx| caret.move_to_previous_caret_position(ctx))
    }

    /// Hides or shows the caret.
    pub fn set_caret_hidden(&mut self, hidden: bool) -> Result<()> {
        self.ensure_open()?;
        if self.caret.is_hidden() != hidden {
            self.caret.set_hidden(hidden);
            self.update_blink_timer(true);
        }
        Ok(())
    }

    /// Scrolls the caret into view once the view is loaded.
    pub fn ensure_caret_visible(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.do_action_after_loaded(|view| view.scroll_to_caret())
    }

    fn scroll_to_caret(&mut self) -> Result<()> {
        if let Some((start, relative_to)) = self.caret.vertical_scroll(&self.layout)? {
            self.display_line_containing(start, 0.0, relative_to)?;
        }
        if let Some(left) = self.caret.horizontal_scroll(&self.layout.viewport()) {
            self.set_viewport_left(left)?;
        }
        Ok(())
    }

    fn apply_caret_move(&mut self, caret_move: CaretMove) {
        if !caret_move.moved() {
            return;
        }
        self.update_blink_timer(true);
        if caret_move.raise {
            self.raise_caret_events(caret_move);
        }
    }

    fn raise_caret_events(&mut self, caret_move: CaretMove) {
        if self.selection.is_empty() {
            self.events.selection_changed.emit(&SelectionChanged);
        }
        self.events.caret_position_changed.emit(&CaretPositionChanged {
            old_position: caret_move.old_position,
            new_position: caret_move.new_position,
        });
    }

    /// Restarts the blink phase while the caret is on screen and stops the
    /// timer otherwise.
    fn update_blink_timer(&mut self, reset: bool) {
        let interval = self.services.blink_settings.blink_interval();
        match interval {
            Some(interval) if self.caret.is_shown_on_screen() && !self.is_closed => {
                if reset || !self.blink.is_running() {
                    self.caret.reset_blink();
                    self.blink.restart(interval);
                }
            }
            _ => {
                self.caret.reset_blink();
                self.blink.stop();
            }
        }
    }

    // --- Selection ---

    /// Selects from `anchor` to `active`.
    pub fn select(
        &mut self,
        anchor: VirtualSnapshotPoint,
        active: VirtualSnapshotPoint,
    ) -> Result<()> {
        self.ensure_open()?;
        let outcome = self.selection.select(&self.layout, anchor, active)?;
        self.apply_selection(outcome)
    }

    /// Clears the selection and returns to stream mode.
    pub fn clear_selection(&mut self) -> Result<()> {
        self.ensure_open()?;
        let outcome = self.selection.clear(true);
        self.apply_selection(outcome)
    }

    /// Switches between stream and box selection.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> Result<()> {
        self.ensure_open()?;
        let outcome = self.selection.set_mode(&self.layout, mode)?;
        self.apply_selection(outcome)?;
        self.refresh_caret(false, false)
    }

    /// Tells the view whether it has keyboard focus.
    pub fn set_has_focus(&mut self, has_focus: bool) -> Result<()> {
        self.ensure_open()?;
        if self.selection.set_has_focus(has_focus) {
            self.switch_painters()?;
        }
        Ok(())
    }

    /// Paints the selection as focused or unfocused, independent of focus.
    pub fn set_selection_is_active(&mut self, is_active: bool) -> Result<()> {
        self.ensure_open()?;
        self.selection.set_activation_tracks_focus(false);
        if self.selection.set_is_active(is_active) {
            self.switch_painters()?;
        }
        Ok(())
    }

    /// Makes selection activity follow focus again, or stop following it.
    pub fn set_selection_activation_tracks_focus(&mut self, tracks: bool) -> Result<()> {
        self.ensure_open()?;
        if self.selection.set_activation_tracks_focus(tracks) {
            self.switch_painters()?;
        }
        Ok(())
    }

    fn apply_selection(&mut self, outcome: SelectionOutcome) -> Result<()> {
        if outcome.activation_changed {
            self.switch_painters()?;
        }
        self.paint_selection(outcome.paint)?;
        if outcome.raise {
            self.events.selection_changed.emit(&SelectionChanged);
            let ctx = caret_context(
                &self.layout,
                &self.options,
                &self.selection,
                &*self.services.smart_indent,
            );
            if let Some(caret_move) = self.caret.selection_changed(&ctx)? {
                self.apply_caret_move(caret_move);
            }
        }
        Ok(())
    }

    /// Clears the painter that was active and paints with the other one.
    fn switch_painters(&mut self) -> Result<()> {
        let layer = selection_layer(&mut self.stack)?;
        if self.selection.is_active() {
            self.unfocused_painter.clear(layer);
        } else {
            self.focused_painter.clear(layer);
        }
        self.paint_selection(Paint::Update)
    }

    fn paint_selection(&mut self, paint: Paint) -> Result<()> {
        let painter = if self.selection.is_active() {
            &mut self.focused_painter
        } else {
            &mut self.unfocused_painter
        };
        let layer = selection_layer(&mut self.stack)?;
        match paint {
            Paint::Nothing => {}
            Paint::Clear => painter.clear(layer),
            Paint::Update => {
                let selection =
                    SelectionView::new(&self.selection, &self.layout, self.caret.point());
                painter.update(
                    &selection,
                    layer,
                    self.layout.viewport(),
                    self.options.use_virtual_space(),
                )?;
            }
        }
        Ok(())
    }

    fn refresh_caret(
        &mut self,
        preserve_coordinates: bool,
        clear_virtual_space: bool,
    ) -> Result<()> {
        let ctx = caret_context(
            &self.layout,
            &self.options,
            &self.selection,
            &*self.services.smart_indent,
        );
        let caret_move = self
            .caret
            .refresh(&ctx, preserve_coordinates, clear_virtual_space)?;
        self.apply_caret_move(caret_move);
        Ok(())
    }

    // --- Options and formats ---

    /// Sets an option and reports whether its value changed.
    ///
    /// A change raises [`OptionChanged`] and then refreshes the caret and
    /// the selection.
    pub fn set_option(&mut self, option: EditorOption, value: bool) -> Result<bool> {
        self.ensure_open()?;
        if !self.options.set(option, value) {
            return Ok(false);
        }
        log::debug!("option {} set to {value}", option.name());
        self.events.option_changed.emit(&OptionChanged { option });

        let ctx = caret_context(
            &self.layout,
            &self.options,
            &self.selection,
            &*self.services.smart_indent,
        );
        if let Some(caret_move) = self.caret.option_changed(&ctx, option)? {
            self.apply_caret_move(caret_move);
        }
        if option == EditorOption::UseVirtualSpace {
            if !value {
                let caret = self.caret.point().clone();
                let outcome = self.selection.virtual_space_disabled(&self.layout, &caret)?;
                self.apply_selection(outcome)?;
            }
            self.paint_selection(Paint::Update)?;
        }
        Ok(true)
    }

    /// Sets an option by its qualified name.
    pub fn set_option_by_name(&mut self, name: &str, value: bool) -> Result<bool> {
        let option = EditorOption::from_name(name).ok_or_else(|| {
            ViewError::invalid_argument(format!("unknown editor option `{name}`"))
        })?;
        self.set_option(option, value)
    }

    /// Replaces the properties for `key` in the format map.
    pub fn set_format_properties(
        &mut self,
        key: &str,
        properties: FormatProperties,
    ) -> Result<()> {
        self.ensure_open()?;
        if let Some(changed) = self.format_map.set_properties(key, properties) {
            self.format_mapping_changed(&changed)?;
        }
        Ok(())
    }

    /// Starts coalescing format map changes.
    pub fn begin_format_batch_update(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.format_map.begin_batch_update()
    }

    /// Ends a format map batch and applies the coalesced changes.
    pub fn end_format_batch_update(&mut self) -> Result<()> {
        self.ensure_open()?;
        if let Some(changed) = self.format_map.end_batch_update()? {
            self.format_mapping_changed(&changed)?;
        }
        Ok(())
    }

    fn format_mapping_changed(&mut self, changed: &FormatMappingChanged) -> Result<()> {
        self.events.format_mapping_changed.emit(changed);
        for key in &changed.changed_items {
            let focused = match key.as_str() {
                SELECTED_TEXT => true,
                INACTIVE_SELECTED_TEXT => false,
                _ => continue,
            };
            let layer = selection_layer(&mut self.stack)?;
            let painter = if focused {
                &mut self.focused_painter
            } else {
                &mut self.unfocused_painter
            };
            painter.clear(layer);
            *painter = SelectionPainter::new(selection_brush(&self.format_map, key));
            if focused == self.selection.is_active() {
                self.paint_selection(Paint::Update)?;
            }
        }
        Ok(())
    }

    // --- Adornments ---

    /// The adornment layer called `name`, created on first use.
    ///
    /// Fails for the text and caret layers and for names without a layer
    /// definition. Layers defined with [`LayerDefinition::overlay`] live in
    /// the overlay stack.
    pub fn adornment_layer(&mut self, name: &str) -> Result<AdornmentLayerMut<'_>> {
        self.ensure_open()?;
        if name == TEXT_LAYER || name == CARET_LAYER {
            return Err(ViewError::invalid_argument(format!(
                "`{name}` is not an adornment layer"
            )));
        }
        let stack = if self.overlay.definition(name).is_some() {
            &mut self.overlay
        } else {
            &mut self.stack
        };
        let layer = stack.adornment_layer(name).ok_or_else(|| {
            log::warn!("no layer definition for `{name}`");
            ViewError::invalid_argument(format!("no layer definition for `{name}`"))
        })?;
        Ok(AdornmentLayerMut::new(layer, self.layout.lines()))
    }

    // --- Deferred work ---

    /// Runs `action` now and, until the view is loaded, once more after the
    /// first layout with a non-empty viewport. Only the last action stored
    /// this way is re-run.
    pub fn do_action_after_loaded(
        &mut self,
        action: impl Fn(&mut Self) -> Result<()> + 'static,
    ) -> Result<()> {
        self.ensure_open()?;
        let action: LoadedAction = Rc::new(action);
        if !self.is_loaded {
            self.loaded_action = Some(action.clone());
        }
        action(self)
    }

    /// Queues `action` for the next [`dispatch_pending`](Self::dispatch_pending).
    pub fn post(&mut self, action: impl FnOnce(&mut Self) -> Result<()> + 'static) {
        self.posted.push_back(Box::new(action));
    }

    /// Applies pending blink ticks and runs posted actions in order.
    ///
    /// A failing action is logged and does not stop the others.
    pub fn dispatch_pending(&mut self) -> Result<Dispatched> {
        self.ensure_open()?;
        let ticks = self.blink.take_ticks();
        if ticks % 2 == 1 && self.caret.is_shown_on_screen() {
            self.caret.toggle_blink();
        }
        let mut actions = 0;
        while let Some(action) = self.posted.pop_front() {
            actions += 1;
            if let Err(err) = action(self) {
                log::warn!("posted action failed: {err}");
            }
            if self.is_closed {
                break;
            }
        }
        Ok(Dispatched { ticks, actions })
    }

    // --- Events ---

    /// Called after the caret moved.
    pub fn on_caret_position_changed(
        &mut self,
        handler: impl FnMut(&CaretPositionChanged) + 'static,
    ) -> Subscription {
        self.events.caret_position_changed.subscribe(handler)
    }

    /// Called after the selection changed.
    pub fn on_selection_changed(
        &mut self,
        handler: impl FnMut(&SelectionChanged) + 'static,
    ) -> Subscription {
        self.events.selection_changed.subscribe(handler)
    }

    /// Called after every layout pass.
    pub fn on_layout_changed(
        &mut self,
        handler: impl FnMut(&LayoutChanged) + 'static,
    ) -> Subscription {
        self.events.layout_changed.subscribe(handler)
    }

    /// Called after format map entries changed.
    pub fn on_format_mapping_changed(
        &mut self,
        handler: impl FnMut(&FormatMappingChanged) + 'static,
    ) -> Subscription {
        self.events.format_mapping_changed.subscribe(handler)
    }

    /// Called after an option changed.
    pub fn on_option_changed(
        &mut self,
        handler: impl FnMut(&OptionChanged) + 'static,
    ) -> Subscription {
        self.events.option_changed.subscribe(handler)
    }

    /// Called after the viewport scrolled horizontally.
    pub fn on_viewport_left_changed(
        &mut self,
        handler: impl FnMut(&ViewportLeftChanged) + 'static,
    ) -> Subscription {
        self.events.viewport_left_changed.subscribe(handler)
    }

    /// Called once when the view closes.
    pub fn on_closed(&mut self, handler: impl FnMut(&ViewClosed) + 'static) -> Subscription {
        self.events.closed.subscribe(handler)
    }

    /// Detaches a handler and reports whether it was attached.
    pub fn unsubscribe(&mut self, token: Subscription) -> bool {
        self.events.unsubscribe(token)
    }

    /// Number of attached handlers.
    pub fn handler_count(&self) -> usize {
        self.events.handler_count()
    }

    // --- Lifecycle ---

    /// Closes the view.
    ///
    /// Raises [`ViewClosed`], detaches every handler, removes every
    /// adornment and stops the blink timer. Later calls do nothing; other
    /// operations fail with [`ViewError::InvalidState`].
    pub fn close(&mut self) {
        if self.is_closed {
            return;
        }
        self.is_closed = true;
        log::debug!("closing view over {:?}", self.layout.snapshot());
        self.events.closed.emit(&ViewClosed);
        self.events.clear();
        self.stack.clear();
        self.overlay.clear();
        self.blink.stop();
        self.posted.clear();
        self.loaded_action = None;
    }
}

impl Drop for TextView {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for TextView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextView")
            .field("snapshot", self.layout.snapshot())
            .field("viewport", &self.layout.viewport())
            .field("caret", &self.caret)
            .field("selection", &self.selection)
            .field("options", &self.options)
            .field("is_loaded", &self.is_loaded)
            .field("is_closed", &self.is_closed)
            .finish_non_exhaustive()
    }
}

fn caret_context<'a>(
    layout: &'a ViewLayout,
    options: &'a EditorOptions,
    selection: &Selection,
    smart_indent: &'a dyn SmartIndent,
) -> CaretContext<'a> {
    CaretContext {
        source: layout,
        options,
        selection_mode: selection.mode(),
        selection_is_empty: selection.is_empty(),
        smart_indent,
    }
}

fn selection_layer(stack: &mut ViewStack) -> Result<&mut AdornmentLayer> {
    stack
        .adornment_layer(SELECTION_LAYER)
        .ok_or_else(|| ViewError::invalid_state("the selection layer is missing"))
}

fn default_format_map() -> EditorFormatMap {
    let defaults = [
        (
            SELECTED_TEXT,
            FormatProperties::background(Color::from_rgba8(0x33, 0x99, 0xff, 0x66)),
        ),
        (
            INACTIVE_SELECTED_TEXT,
            FormatProperties::background(Color::from_rgba8(0xbf, 0xcd, 0xdb, 0x66)),
        ),
        (CARET, FormatProperties::foreground(Color::BLACK)),
        (
            OVERWRITE_CARET,
            FormatProperties::foreground(Color::from_rgba8(0x80, 0x80, 0x80, 0xff)),
        ),
    ];
    defaults.into_iter().collect()
}

fn selection_brush(map: &EditorFormatMap, key: &str) -> Brush {
    map.properties(key)
        .background
        .unwrap_or_else(|| Brush::Solid(Color::from_rgba8(0x33, 0x99, 0xff, 0x66)))
}
