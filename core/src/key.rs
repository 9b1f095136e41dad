//! Key identifiers, key descriptors and platform modifier flags.
//!
//! A key is identified by its physical `code` (the same identifier the
//! platform reports for a keystroke, e.g. `"KeyA"` or `"ShiftLeft"`). The
//! virtual on-screen keyboard uses the same codes, so both input sources
//! address one layout table.

use serde::{Deserialize, Serialize};

pub const SHIFT_LEFT: &str = "ShiftLeft";
pub const SHIFT_RIGHT: &str = "ShiftRight";
pub const ALT_RIGHT: &str = "AltRight";
pub const CAPS_LOCK: &str = "CapsLock";
pub const CONTROL_LEFT: &str = "ControlLeft";
pub const BACKSPACE: &str = "Backspace";
pub const TAB: &str = "Tab";
pub const ENTER: &str = "Enter";
pub const ARROW_LEFT: &str = "ArrowLeft";
pub const ARROW_RIGHT: &str = "ArrowRight";
pub const ARROW_UP: &str = "ArrowUp";
pub const ARROW_DOWN: &str = "ArrowDown";

/// Logical key name reported for a dead (composing) keystroke.
pub const DEAD_KEY: &str = "Dead";

/// Returns true for either shift key.
pub fn is_shift_code(code: &str) -> bool {
    code == SHIFT_LEFT || code == SHIFT_RIGHT
}

/// Classification of a key in the layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Emits a character (the default when a table entry omits the kind)
    #[default]
    #[serde(rename = "char")]
    Character,
    /// Shift, Ctrl, Alt, Meta, Fn
    Modifier,
    /// Structural keys handled by the surface (Backspace, Enter, arrows, ...)
    Action,
    /// Layout filler with no behaviour
    Spacer,
}

/// One key of a layout table.
///
/// Empty strings mean "no variant at this level". Variants are strings rather
/// than chars because several keys emit a base consonant or vowel together
/// with a combining sign (e.g. `"ាំ"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub code: String,
    /// Native-script output without modifiers
    pub base: String,
    /// Native-script output with Shift (or Caps Lock outside the number row)
    pub shift: String,
    /// Native-script output with AltGraph
    #[serde(default)]
    pub alt_graph: String,
    /// Output in system/Latin mode
    #[serde(default)]
    pub english: String,
    /// Shifted output in system/Latin mode
    #[serde(default)]
    pub english_shift: String,
    /// Short caption for non-character keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: KeyKind,
    /// Presentation width in grid columns; irrelevant to input semantics
    #[serde(default = "default_width")]
    pub width: u8,
}

fn default_width() -> u8 {
    2
}

impl KeyDescriptor {
    /// Character key with native base/shift/altgr variants and Latin fallbacks.
    pub fn character(
        code: &str,
        base: &str,
        shift: &str,
        alt_graph: &str,
        english: &str,
        english_shift: &str,
    ) -> Self {
        Self {
            code: code.to_string(),
            base: base.to_string(),
            shift: shift.to_string(),
            alt_graph: alt_graph.to_string(),
            english: english.to_string(),
            english_shift: english_shift.to_string(),
            label: None,
            kind: KeyKind::Character,
            width: default_width(),
        }
    }

    /// Non-character key (modifier, action or spacer) with a caption.
    pub fn structural(code: &str, label: &str, kind: KeyKind) -> Self {
        Self {
            code: code.to_string(),
            label: Some(label.to_string()),
            kind,
            width: default_width(),
            ..Self::default()
        }
    }

    /// Builder-style width override.
    pub fn with_width(mut self, width: u8) -> Self {
        self.width = width;
        self
    }

    /// Builder-style label override.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// True if at least one native variant is non-empty.
    pub fn has_native_variant(&self) -> bool {
        !self.base.is_empty() || !self.shift.is_empty() || !self.alt_graph.is_empty()
    }

    /// True if any variant, native or Latin, is non-empty.
    pub fn has_any_variant(&self) -> bool {
        self.has_native_variant() || !self.english.is_empty() || !self.english_shift.is_empty()
    }
}

/// Modifier report the platform attaches to a physical key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFlags {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    /// Platform reports the AltGraph modifier state
    pub alt_graph: bool,
    /// Platform's caps-lock indicator
    pub caps_lock: bool,
}

impl ModifierFlags {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shifted() -> Self {
        Self { shift: true, ..Self::default() }
    }

    /// Right-alt condition: either an explicit AltGraph report or a plain Alt.
    pub fn alt_graph_condition(&self) -> bool {
        self.alt_graph || self.alt
    }
}

/// A physical keystroke as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalKeyEvent {
    /// Physical key identifier (`"KeyA"`)
    pub code: String,
    /// Logical key name (`"a"`, `"Backspace"`, `"Dead"`)
    pub key: String,
    pub flags: ModifierFlags,
    /// The event targets another text field; the surface must not steal focus
    pub from_text_field: bool,
}

impl PhysicalKeyEvent {
    pub fn new(code: &str, key: &str, flags: ModifierFlags) -> Self {
        Self {
            code: code.to_string(),
            key: key.to_string(),
            flags,
            from_text_field: false,
        }
    }

    /// Event for a code whose logical key name is irrelevant to the engine.
    pub fn code(code: &str, flags: ModifierFlags) -> Self {
        Self::new(code, code, flags)
    }

    pub fn is_dead_key(&self) -> bool {
        self.key == DEAD_KEY
    }
}
