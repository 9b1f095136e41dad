//! IME engine: the coordinator between key events and the text surface.
//!
//! Data flow for every event: modifier reducer -> resolver -> surface ->
//! statistics. The engine owns the only `ModifierState` and the only
//! `TextSurface`; both are mutated exclusively through the methods here.
//!
//! Work that must happen after the current handler returns (dead-key
//! insertion and statistics refresh on deferred-refresh platforms, restoring
//! the editable flag after composition suppression) is queued as
//! [`DeferredTask`]s. The platform calls [`ImeEngine::drain_deferred`] once the
//! handler has returned, e.g. from a zero-delay timer.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::context::ImeContext;
use crate::document::{Direction, Granularity};
use crate::key::{self, KeyKind, PhysicalKeyEvent};
use crate::layout::LayoutTable;
use crate::modifiers::{ModifierEvent, ModifierState};
use crate::platform::PlatformQuirks;
use crate::resolver;
use crate::surface::{FormatCommand, SurfaceHost, TextSurface};
use crate::Config;

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the IME; the platform must suppress its default
    Handled,
    /// Key was not handled (pass through to the host)
    NotHandled,
}

/// Work scheduled to run after the current handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    InsertCharacter(String),
    RefreshStatistics,
    RestoreEditing,
}

pub struct ImeEngine<H: SurfaceHost> {
    layout: Arc<LayoutTable>,
    modifiers: ModifierState,
    surface: TextSurface<H>,
    quirks: PlatformQuirks,
    native_mode: bool,
    deferred: VecDeque<DeferredTask>,
    context: ImeContext,
}

impl<H: SurfaceHost> ImeEngine<H> {
    /// Engine in native mode with the placeholder view off.
    pub fn new(layout: Arc<LayoutTable>, host: H, quirks: PlatformQuirks) -> Self {
        let mut engine = Self {
            layout,
            modifiers: ModifierState::new(),
            surface: TextSurface::new(host),
            quirks,
            native_mode: true,
            deferred: VecDeque::new(),
            context: ImeContext::new(),
        };
        engine.surface.refresh_statistics();
        engine.sync_context();
        engine
    }

    /// Engine configured from `config`; `detected` quirks are overridden by
    /// any quirk the config pins.
    pub fn with_config(
        layout: Arc<LayoutTable>,
        host: H,
        detected: PlatformQuirks,
        config: &Config,
    ) -> Self {
        let mut engine = Self::new(layout, host, config.quirks(detected));
        engine.native_mode = config.native_mode;
        if config.show_invisibles {
            engine.surface.toggle_invisibles_view(true);
        }
        engine.sync_context();
        engine
    }

    pub fn context(&self) -> &ImeContext {
        &self.context
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    pub fn surface(&self) -> &TextSurface<H> {
        &self.surface
    }

    /// Mutable surface access for document actions (load, new, save).
    pub fn surface_mut(&mut self) -> &mut TextSurface<H> {
        &mut self.surface
    }

    pub fn layout(&self) -> &Arc<LayoutTable> {
        &self.layout
    }

    pub fn quirks(&self) -> PlatformQuirks {
        self.quirks
    }

    pub fn native_mode(&self) -> bool {
        self.native_mode
    }

    pub fn set_native_mode(&mut self, native: bool) {
        self.native_mode = native;
        self.sync_context();
    }

    pub fn toggle_native_mode(&mut self) -> bool {
        self.set_native_mode(!self.native_mode);
        self.native_mode
    }

    /// Tasks waiting for [`drain_deferred`](Self::drain_deferred).
    pub fn pending_tasks(&self) -> impl Iterator<Item = &DeferredTask> {
        self.deferred.iter()
    }

    /// Physical key-down.
    ///
    /// Updates the modifier state. Events from another text field stop
    /// there and go to the host untouched. Otherwise the surface is focused
    /// and, in native mode, typing keys are intercepted. Ctrl shortcuts pass through. Backspace is always routed through
    /// the surface so placeholders are deleted as a unit.
    pub fn handle_key_down(&mut self, event: &PhysicalKeyEvent) -> KeyResult {
        let flags = event.flags;
        self.modifiers = self.modifiers.apply(&ModifierEvent::PhysicalDown {
            code: event.code.clone(),
            flags,
        });

        if event.from_text_field {
            trace!(code = %event.code, "key down in another text field");
            self.sync_context();
            return KeyResult::NotHandled;
        }
        self.surface.ensure_focus();

        let mut result = KeyResult::NotHandled;
        let shortcut = flags.ctrl && !flags.alt_graph;

        if self.native_mode && !shortcut {
            if let Some(desc) = self.layout.get(&event.code) {
                if resolver::is_typing_key(desc) {
                    result = KeyResult::Handled;
                    let snapshot = ModifierState::from_flags(&flags);
                    if let Some(text) = resolver::resolve(desc, &snapshot, true) {
                        let text = text.to_string();
                        if event.is_dead_key() && self.quirks.needs_deferred_refresh {
                            trace!(code = %event.code, "deferring dead-key insert");
                            self.deferred.push_back(DeferredTask::InsertCharacter(text));
                        } else {
                            self.surface.insert_character(&text);
                        }
                    }
                }
            }
        }

        let is_backspace = event.code == key::BACKSPACE || event.key == "Backspace";
        if is_backspace && !flags.alt_graph_condition() && !flags.meta && !flags.ctrl {
            self.surface.delete_backward();
            result = KeyResult::Handled;
        }

        if self.quirks.needs_deferred_refresh {
            self.deferred.push_back(DeferredTask::RefreshStatistics);
        } else {
            self.surface.refresh_statistics();
        }

        trace!(code = %event.code, ?result, "key down");
        self.sync_context();
        result
    }

    /// Physical key-up. Caps Lock releases resync the caps state from the
    /// platform's indicator. Never consumes the event.
    pub fn handle_key_up(&mut self, event: &PhysicalKeyEvent) -> KeyResult {
        if event.code == key::CAPS_LOCK {
            self.modifiers = self.modifiers.apply(&ModifierEvent::CapsSync {
                active: event.flags.caps_lock,
            });
        }
        self.modifiers = self.modifiers.apply(&ModifierEvent::PhysicalUp {
            code: event.code.clone(),
            flags: event.flags,
        });
        self.sync_context();
        KeyResult::NotHandled
    }

    /// Click on the on-screen keyboard.
    ///
    /// Modifier keys toggle; action keys edit or move the caret; character
    /// keys resolve against the shared modifier state and then consume the
    /// one-shot Shift/AltGr. The on-screen keyboard always types the native
    /// script.
    pub fn handle_virtual_key(&mut self, code: &str) -> KeyResult {
        let result = self.virtual_key(code);
        self.sync_context();
        result
    }

    fn virtual_key(&mut self, code: &str) -> KeyResult {
        match code {
            key::SHIFT_LEFT | key::SHIFT_RIGHT | key::ALT_RIGHT | key::CAPS_LOCK => {
                self.modifiers = self.modifiers.apply(&ModifierEvent::VirtualToggle {
                    code: code.to_string(),
                });
                return KeyResult::Handled;
            }
            key::BACKSPACE => {
                self.surface.delete_backward();
                return KeyResult::Handled;
            }
            key::TAB => {
                self.surface.insert_character("\t");
                return KeyResult::Handled;
            }
            key::ENTER => {
                self.surface.insert_paragraph_break();
                return KeyResult::Handled;
            }
            key::ARROW_LEFT => return self.move_caret(Direction::Backward, Granularity::Character),
            key::ARROW_RIGHT => return self.move_caret(Direction::Forward, Granularity::Character),
            key::ARROW_UP => return self.move_caret(Direction::Backward, Granularity::Line),
            key::ARROW_DOWN => return self.move_caret(Direction::Forward, Granularity::Line),
            _ => {}
        }

        let Some(desc) = self.layout.get(code) else {
            debug!(code, "virtual key not in layout");
            return KeyResult::NotHandled;
        };
        if matches!(desc.kind, KeyKind::Modifier | KeyKind::Action) {
            return KeyResult::NotHandled;
        }
        let Some(text) = resolver::resolve(desc, &self.modifiers, true) else {
            return KeyResult::NotHandled;
        };
        let text = text.to_string();
        if self.surface.insert_character(&text) {
            self.modifiers = self.modifiers.apply(&ModifierEvent::ConsumeOneShot);
        }
        KeyResult::Handled
    }

    fn move_caret(&mut self, direction: Direction, granularity: Granularity) -> KeyResult {
        self.surface.ensure_focus();
        if self.surface.move_caret(direction, granularity) {
            self.surface.refresh_statistics();
        }
        KeyResult::Handled
    }

    /// Composition start/update/end from the host.
    ///
    /// On composition-suppressing platforms in native mode the surface is made
    /// non-editable now and restored by the next `drain_deferred`.
    pub fn handle_composition(&mut self) -> KeyResult {
        if !(self.native_mode && self.quirks.needs_composition_suppression) {
            return KeyResult::NotHandled;
        }
        self.surface.set_editable(false);
        self.deferred.push_back(DeferredTask::RestoreEditing);
        self.sync_context();
        KeyResult::Handled
    }

    /// Run every queued task in order. Returns how many ran.
    pub fn drain_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::InsertCharacter(text) => {
                    self.surface.insert_character(&text);
                }
                DeferredTask::RefreshStatistics => {
                    self.surface.refresh_statistics();
                }
                DeferredTask::RestoreEditing => {
                    self.surface.set_editable(true);
                    self.surface.ensure_focus();
                }
            }
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "drained deferred tasks");
        }
        self.sync_context();
        ran
    }

    /// Flip the placeholder view. Returns the new view state.
    pub fn toggle_invisibles(&mut self) -> bool {
        let show = !self.surface.show_invisibles();
        self.set_show_invisibles(show);
        show
    }

    pub fn set_show_invisibles(&mut self, show: bool) {
        self.surface.toggle_invisibles_view(show);
        self.sync_context();
    }

    /// Formatting command from the toolbar.
    pub fn execute_command(&mut self, command: &FormatCommand) {
        self.surface.apply_command(command);
        self.sync_context();
    }

    /// Whether the on-screen key `code` should be drawn pressed.
    pub fn is_key_highlighted(&self, code: &str) -> bool {
        self.modifiers.is_highlighted(code)
    }

    /// Copy engine state into the context after a surface change made
    /// through [`surface_mut`](Self::surface_mut).
    pub fn refresh(&mut self) {
        self.surface.refresh_statistics();
        self.sync_context();
    }

    fn sync_context(&mut self) {
        let stats = self.surface.statistics();
        let ctx = &mut self.context;
        ctx.char_count = stats.chars;
        ctx.word_count = stats.words;
        ctx.shift_active = self.modifiers.shift_active();
        ctx.alt_graph_active = self.modifiers.alt_graph_active();
        ctx.caps_lock_active = self.modifiers.caps_lock_active();
        ctx.depressed_keys = self.modifiers.depressed_keys().iter().cloned().collect();
        ctx.native_mode = self.native_mode;
        ctx.show_invisibles = self.surface.show_invisibles();
        ctx.pending_tasks = self.deferred.len();
    }
}
