//! Engine and library factories for Khmer input.
//!
//! Wires the Khmer layout, a `KhmerConfig` and a platform host into a
//! ready-to-use `ImeEngine`, and opens the document library the config
//! points at.

use std::sync::Arc;

use libkhmer_core::{
    DocumentLibrary, DocumentStore, HeadlessHost, ImeEngine, LayoutTable, MemoryStore,
    PlatformQuirks, RedbStore, SurfaceHost,
};
use thiserror::Error;
use tracing::info;

use crate::config::KhmerConfig;
use crate::layout::khmer_layout;

/// Library over whichever store the config selects.
pub type KhmerLibrary = DocumentLibrary<Box<dyn DocumentStore>>;

#[derive(Debug, Error)]
pub enum KhmerError {
    #[error("invalid layout: {0}")]
    Layout(#[from] libkhmer_core::LayoutError),
    #[error(transparent)]
    Store(#[from] libkhmer_core::StoreError),
}

/// The Khmer layout, validated and ready to share.
pub fn shared_layout() -> Result<Arc<LayoutTable>, KhmerError> {
    Ok(Arc::new(khmer_layout()?))
}

/// Create an engine over `host` with the Khmer layout.
///
/// `detected` are the quirks sniffed from the running platform; the config
/// may pin either of them.
pub fn create_ime_engine<H: SurfaceHost>(
    host: H,
    detected: PlatformQuirks,
    config: &KhmerConfig,
) -> Result<ImeEngine<H>, KhmerError> {
    let layout = shared_layout()?;
    Ok(ImeEngine::with_config(layout, host, detected, config.base()))
}

/// Engine over a `HeadlessHost` with no platform quirks, for the CLI and
/// tests.
pub fn create_headless_engine(config: &KhmerConfig) -> Result<ImeEngine<HeadlessHost>, KhmerError> {
    create_ime_engine(HeadlessHost::new(), PlatformQuirks::none(), config)
}

/// Open the document library: redb at `store_path` when set, otherwise an
/// in-memory store.
pub fn open_library(config: &KhmerConfig) -> Result<KhmerLibrary, KhmerError> {
    let base = config.base();
    let store: Box<dyn DocumentStore> = match &config.store_path {
        Some(path) => {
            info!(path = %path, "using redb document store");
            Box::new(RedbStore::open_with_key(path, &base.store_key)?)
        }
        None => Box::new(MemoryStore::new()),
    };
    Ok(DocumentLibrary::with_default_title(store, &base.default_title)?)
}
