//! Character resolution: key + modifier state + mode -> output string.

use phf::phf_set;

use crate::key::{KeyDescriptor, KeyKind};
use crate::modifiers::ModifierState;

/// Keys on which Caps Lock does not stand in for Shift.
///
/// Only an explicit Shift produces the symbols of the number row; Caps Lock
/// alone keeps the digits.
pub static NUMBER_ROW_CODES: phf::Set<&'static str> = phf_set! {
    "Digit1", "Digit2", "Digit3", "Digit4", "Digit5",
    "Digit6", "Digit7", "Digit8", "Digit9", "Digit0",
    "Minus", "Equal",
};

/// Which variant of a key is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftLevel {
    Base,
    Shift,
    AltGraph,
}

pub fn is_number_row(code: &str) -> bool {
    NUMBER_ROW_CODES.contains(code)
}

/// Pick the shift level for `code`.
///
/// Shift is checked before AltGraph. Caps Lock counts as Shift except on the
/// number row. Latin mode has no AltGraph level.
pub fn shift_level(code: &str, state: &ModifierState, native_mode: bool) -> ShiftLevel {
    let caps_as_shift = state.caps_lock_active() && !is_number_row(code);
    if state.shift_active() || caps_as_shift {
        ShiftLevel::Shift
    } else if native_mode && state.alt_graph_active() {
        ShiftLevel::AltGraph
    } else {
        ShiftLevel::Base
    }
}

/// Resolve the string a key emits, or `None` if nothing is emitted.
///
/// `None` is a normal outcome: modifier and action keys never emit, and an
/// empty variant at the selected level means "no character in this mode".
pub fn resolve<'a>(
    key: &'a KeyDescriptor,
    state: &ModifierState,
    native_mode: bool,
) -> Option<&'a str> {
    if matches!(key.kind, KeyKind::Modifier | KeyKind::Action) {
        return None;
    }
    let level = shift_level(&key.code, state, native_mode);
    let variant = match (native_mode, level) {
        (true, ShiftLevel::Base) => &key.base,
        (true, ShiftLevel::Shift) => &key.shift,
        (true, ShiftLevel::AltGraph) => &key.alt_graph,
        (false, ShiftLevel::Shift) => &key.english_shift,
        (false, _) => &key.english,
    };
    if variant.is_empty() {
        None
    } else {
        Some(variant.as_str())
    }
}

/// Whether the engine intercepts this key instead of letting the host
/// insert text natively.
pub fn is_typing_key(key: &KeyDescriptor) -> bool {
    key.kind == KeyKind::Character && key.has_native_variant()
}
