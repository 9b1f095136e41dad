//! Read-only layout table.
//!
//! The table is built once from rows of `KeyDescriptor`s, validated, and then
//! shared (usually behind an `Arc`) by the resolver, the engine and any
//! virtual-keyboard renderer. Rows are kept in order because the on-screen
//! keyboard draws them; lookups go through a code index.

use std::collections::HashMap;

use thiserror::Error;

use crate::key::{KeyDescriptor, KeyKind};

/// Validation failures when building a layout table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("key code `{0}` appears more than once in the layout")]
    DuplicateCode(String),
    #[error("character key `{0}` has no non-empty variant")]
    EmptyCharacterKey(String),
}

/// Layout table: rows of keys plus an index from code to position.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    rows: Vec<Vec<KeyDescriptor>>,
    index: HashMap<String, (usize, usize)>,
}

impl LayoutTable {
    /// Build a table from rows, enforcing unique codes and non-empty
    /// character keys.
    pub fn from_rows(rows: Vec<Vec<KeyDescriptor>>) -> Result<Self, LayoutError> {
        let mut index = HashMap::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, key) in row.iter().enumerate() {
                if key.kind == KeyKind::Character && !key.has_any_variant() {
                    return Err(LayoutError::EmptyCharacterKey(key.code.clone()));
                }
                if index.insert(key.code.clone(), (r, c)).is_some() {
                    return Err(LayoutError::DuplicateCode(key.code.clone()));
                }
            }
        }
        Ok(Self { rows, index })
    }

    /// Single-row convenience constructor, mostly for tests.
    pub fn from_keys(keys: Vec<KeyDescriptor>) -> Result<Self, LayoutError> {
        Self::from_rows(vec![keys])
    }

    /// Look up a key by its code.
    pub fn get(&self, code: &str) -> Option<&KeyDescriptor> {
        self.index.get(code).map(|&(r, c)| &self.rows[r][c])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Rows in presentation order.
    pub fn rows(&self) -> &[Vec<KeyDescriptor>] {
        &self.rows
    }

    /// All keys, row by row.
    pub fn keys(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.rows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
