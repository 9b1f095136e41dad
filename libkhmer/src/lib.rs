//! # libkhmer
//!
//! Khmer input method engine built on libkhmer-core.
//!
//! Provides the Khmer keyboard layout, a Khmer-flavoured configuration, and
//! factories that wire both into the generic engine and document library.

pub mod config;
pub mod engine;
pub mod keystroke;
pub mod layout;

// Re-export engine components from core
pub use libkhmer_core::*;

pub use config::KhmerConfig;
pub use engine::{
    create_headless_engine, create_ime_engine, open_library, shared_layout, KhmerError,
    KhmerLibrary,
};
pub use keystroke::{parse_keystroke, parse_script, replay, Keystroke, KeystrokeError};
pub use layout::{khmer_layout, khmer_layout_rows};
