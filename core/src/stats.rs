//! Character and word counts over collapsed content.

use serde::{Deserialize, Serialize};

use crate::codec::INVISIBLE_MARKER;

/// Counts shown beside the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Unicode scalar values, invisible markers included
    pub chars: usize,
    /// Whitespace-separated tokens with some visible content
    pub words: usize,
}

impl Statistics {
    /// Project counts from collapsed plain text.
    ///
    /// A token made only of invisible markers is not a word.
    pub fn from_text(text: &str) -> Self {
        let words = text
            .split_whitespace()
            .filter(|token| token.chars().any(|c| c != INVISIBLE_MARKER))
            .count();
        Self {
            chars: text.chars().count(),
            words,
        }
    }
}
