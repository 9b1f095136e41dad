//! Modifier state reducer.
//!
//! Two producers feed modifier changes: the physical keyboard, which reports
//! held keys as paired down/up events, and the virtual keyboard, which reports
//! modifier clicks as toggles with no matching release. Both go through one
//! reducer (`ModifierState::apply`) as tagged `ModifierEvent`s, so there is a
//! single place where the fields change.
//!
//! Physical Shift/AltGr are held-state modifiers. Virtual Shift/AltGr are
//! one-shot: they clear after the next virtual character is emitted, unless
//! the matching physical key is still held down.

use std::collections::BTreeSet;

use crate::key::{self, ModifierFlags};

/// Events accepted by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierEvent {
    /// Physical key pressed, with the platform's modifier report
    PhysicalDown { code: String, flags: ModifierFlags },
    /// Physical key released, with the platform's modifier report
    PhysicalUp { code: String, flags: ModifierFlags },
    /// Virtual keyboard click on a key (only modifier keys change state)
    VirtualToggle { code: String },
    /// Authoritative caps-lock indicator from the platform
    CapsSync { active: bool },
    /// A character was emitted from the virtual keyboard
    ConsumeOneShot,
}

/// Current modifier state shared by both input sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierState {
    shift_active: bool,
    alt_graph_active: bool,
    caps_lock_active: bool,
    depressed_keys: BTreeSet<String>,
}

impl ModifierState {
    /// Session-start state: nothing active, nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot used to resolve a physical keystroke from its own flags.
    ///
    /// Meta selects the AltGraph level as well, matching how the platform
    /// reports the third level on some keyboards.
    pub fn from_flags(flags: &ModifierFlags) -> Self {
        Self {
            shift_active: flags.shift,
            alt_graph_active: flags.alt_graph_condition() || flags.meta,
            caps_lock_active: flags.caps_lock,
            depressed_keys: BTreeSet::new(),
        }
    }

    /// Explicit level flags, for resolver tests and virtual-keyboard previews.
    pub fn with_levels(shift: bool, alt_graph: bool, caps_lock: bool) -> Self {
        Self {
            shift_active: shift,
            alt_graph_active: alt_graph,
            caps_lock_active: caps_lock,
            depressed_keys: BTreeSet::new(),
        }
    }

    pub fn shift_active(&self) -> bool {
        self.shift_active
    }

    pub fn alt_graph_active(&self) -> bool {
        self.alt_graph_active
    }

    pub fn caps_lock_active(&self) -> bool {
        self.caps_lock_active
    }

    pub fn depressed_keys(&self) -> &BTreeSet<String> {
        &self.depressed_keys
    }

    pub fn is_depressed(&self, code: &str) -> bool {
        self.depressed_keys.contains(code)
    }

    fn shift_held(&self) -> bool {
        self.is_depressed(key::SHIFT_LEFT) || self.is_depressed(key::SHIFT_RIGHT)
    }

    /// Return the next state after `event`.
    pub fn apply(&self, event: &ModifierEvent) -> Self {
        let mut next = self.clone();
        match event {
            ModifierEvent::PhysicalDown { code, flags } => {
                next.depressed_keys.insert(code.clone());
                if key::is_shift_code(code) {
                    next.shift_active = true;
                }
                if flags.alt_graph_condition() {
                    next.alt_graph_active = true;
                    // AltGr is often synthesized as Ctrl+Alt; drop the phantom Ctrl.
                    next.depressed_keys.remove(key::CONTROL_LEFT);
                }
            }
            ModifierEvent::PhysicalUp { code, flags } => {
                next.depressed_keys.remove(code.as_str());
                if key::is_shift_code(code) {
                    next.shift_active = false;
                }
                if !flags.alt_graph_condition() {
                    next.alt_graph_active = false;
                }
            }
            ModifierEvent::VirtualToggle { code } => {
                if key::is_shift_code(code) {
                    next.shift_active = !next.shift_active;
                } else if code == key::ALT_RIGHT {
                    next.alt_graph_active = !next.alt_graph_active;
                } else if code == key::CAPS_LOCK {
                    next.caps_lock_active = !next.caps_lock_active;
                }
            }
            ModifierEvent::CapsSync { active } => {
                next.caps_lock_active = *active;
            }
            ModifierEvent::ConsumeOneShot => {
                if next.shift_active && !next.shift_held() {
                    next.shift_active = false;
                }
                if next.alt_graph_active && !next.is_depressed(key::ALT_RIGHT) {
                    next.alt_graph_active = false;
                }
            }
        }
        next
    }

    /// Whether the virtual keyboard should draw `code` as pressed.
    pub fn is_highlighted(&self, code: &str) -> bool {
        self.is_depressed(code)
            || (key::is_shift_code(code) && self.shift_active)
            || (code == key::ALT_RIGHT && self.alt_graph_active)
    }
}
