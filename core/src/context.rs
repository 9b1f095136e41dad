//! IME context for platform communication.
//!
//! The `ImeContext` struct is a plain data container. After every call into
//! the engine (key down/up, virtual key, deferred drain) the platform reads
//! these fields to redraw the counters, the mode indicator and the virtual
//! keyboard highlights. No callbacks, no traits.

use crate::stats::Statistics;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImeContext {
    /// Characters in the collapsed content
    pub char_count: usize,

    /// Words in the collapsed content
    pub word_count: usize,

    pub shift_active: bool,
    pub alt_graph_active: bool,
    pub caps_lock_active: bool,

    /// Physical keys currently held, sorted
    pub depressed_keys: Vec<String>,

    /// Native-script mode (false = Latin passthrough)
    pub native_mode: bool,

    /// Placeholder view for invisible markers
    pub show_invisibles: bool,

    /// Tasks waiting for `drain_deferred`
    pub pending_tasks: usize,
}

impl ImeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            chars: self.char_count,
            words: self.word_count,
        }
    }

    /// Whether the platform should schedule a `drain_deferred` call.
    pub fn has_pending_tasks(&self) -> bool {
        self.pending_tasks > 0
    }
}
