//! libkhmer-core
//!
//! Script-agnostic input-method engine shared by script-specific crates
//! (libkhmer). It turns physical and on-screen key events into edits of a
//! rich-text surface.
//!
//! Public API:
//! - `LayoutTable` / `KeyDescriptor` - Injected read-only keyboard layout
//! - `ModifierState` - Shift / AltGr / Caps Lock reducer fed by both keyboards
//! - `resolver` - Key + modifiers + mode -> emitted string
//! - `codec` - Invisible marker <-> placeholder conversion
//! - `EditableDocument` - Paragraphs, caret and selection arithmetic
//! - `TextSurface` - Focus, placeholder view, atomic placeholder deletion
//! - `ImeEngine` - Coordinator the platform drives, with `ImeContext` output
//! - `DocumentLibrary` - Named documents over a `DocumentStore` (memory or redb)
//! - `Config` - Configuration and quirk overrides
use serde::{Deserialize, Serialize};

pub mod key;
pub use key::{KeyDescriptor, KeyKind, ModifierFlags, PhysicalKeyEvent};

pub mod layout;
pub use layout::{LayoutError, LayoutTable};

pub mod modifiers;
pub use modifiers::{ModifierEvent, ModifierState};

pub mod resolver;
pub use resolver::ShiftLevel;

pub mod codec;
pub use codec::{Inline, INVISIBLE_MARKER};

pub mod markup;

pub mod document;
pub use document::{Caret, Direction, EditableDocument, Granularity, Selection};

pub mod stats;
pub use stats::Statistics;

pub mod platform;
pub use platform::PlatformQuirks;

pub mod surface;
pub use surface::{FormatCommand, FormattingAttributes, HeadlessHost, SurfaceHost, TextSurface};

pub mod store;
pub use store::{DocumentStore, MemoryStore, RedbStore, SavedDocument, StoreError};

pub mod library;
pub use library::DocumentLibrary;

pub mod context;
pub use context::ImeContext;

pub mod ime_engine;
pub use ime_engine::{DeferredTask, ImeEngine, KeyResult};

/// Generic configuration for the engine.
///
/// Only script-agnostic fields live here. Script-specific options belong in
/// the script crate's config (e.g. `KhmerConfig`), which flattens this one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Start in native-script mode (false = Latin passthrough)
    pub native_mode: bool,

    /// Start with the placeholder view for invisible markers on
    pub show_invisibles: bool,

    /// Key the saved-document list is stored under
    pub store_key: String,

    /// Title of a document that was never saved
    pub default_title: String,

    // Platform quirk overrides. `None` keeps the detected value.
    /// Force the deferred statistics refresh on or off
    pub deferred_refresh: Option<bool>,
    /// Force composition suppression on or off
    pub composition_suppression: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            native_mode: true,
            show_invisibles: false,
            store_key: store::STORE_KEY.to_string(),
            default_title: library::DEFAULT_TITLE.to_string(),
            deferred_refresh: None,
            composition_suppression: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply the quirk overrides to detected quirks.
    pub fn quirks(&self, detected: PlatformQuirks) -> PlatformQuirks {
        PlatformQuirks {
            needs_deferred_refresh: self
                .deferred_refresh
                .unwrap_or(detected.needs_deferred_refresh),
            needs_composition_suppression: self
                .composition_suppression
                .unwrap_or(detected.needs_composition_suppression),
        }
    }
}
