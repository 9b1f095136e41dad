//! Named-document library on top of a [`DocumentStore`].
//!
//! Tracks which saved document the surface currently shows and its title,
//! and implements the new/save/load/delete actions. The store is only ever
//! touched by these explicit actions.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{DocumentStore, SavedDocument, StoreError};
use crate::surface::{SurfaceHost, TextSurface};

/// Title given to a document that was never saved.
pub const DEFAULT_TITLE: &str = "New Document";

pub struct DocumentLibrary<S: DocumentStore> {
    store: S,
    documents: Vec<SavedDocument>,
    current_id: Option<String>,
    title: String,
    default_title: String,
}

impl<S: DocumentStore> DocumentLibrary<S> {
    /// Open the library, reading the saved list once.
    pub fn open(store: S) -> Result<Self, StoreError> {
        Self::with_default_title(store, DEFAULT_TITLE)
    }

    pub fn with_default_title(store: S, default_title: &str) -> Result<Self, StoreError> {
        let documents = store.load_all()?;
        debug!(count = documents.len(), "loaded document list");
        Ok(Self {
            store,
            documents,
            current_id: None,
            title: default_title.to_string(),
            default_title: default_title.to_string(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn documents(&self) -> &[SavedDocument] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&SavedDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Id of the saved document on the surface, `None` for an unsaved draft.
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether switching to `target` would drop visible content: the surface
    /// has non-blank text and `target` is not the document already shown.
    pub fn would_discard<H: SurfaceHost>(
        &self,
        surface: &TextSurface<H>,
        target: Option<&str>,
    ) -> bool {
        let blank = surface.plain_text().trim().is_empty();
        !blank && (target.is_none() || target != self.current_id())
    }

    /// Start a blank, unsaved document with the placeholder view off.
    pub fn new_document<H: SurfaceHost>(&mut self, surface: &mut TextSurface<H>) {
        surface.clear();
        surface.toggle_invisibles_view(false);
        self.current_id = None;
        self.title = self.default_title.clone();
    }

    /// Save the surface content.
    ///
    /// A non-blank `title` (trimmed) replaces the current title. The current
    /// document is updated in place; an unsaved draft becomes a new record at
    /// the front of the list. If the store write fails the library is left
    /// as it was.
    pub fn save<H: SurfaceHost>(
        &mut self,
        surface: &TextSurface<H>,
        title: Option<&str>,
    ) -> Result<&SavedDocument, StoreError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| self.title.clone(), str::to_string);
        let content = surface.serialize_for_persistence();
        let timestamp = Utc::now().timestamp_millis();

        let mut documents = self.documents.clone();
        let existing = self
            .current_id
            .as_deref()
            .and_then(|id| documents.iter().position(|d| d.id == id));
        let index = match existing {
            Some(i) => {
                let doc = &mut documents[i];
                doc.title = title.clone();
                doc.content = content;
                doc.timestamp = timestamp;
                i
            }
            None => {
                let id = self
                    .current_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                documents.insert(
                    0,
                    SavedDocument {
                        id,
                        title: title.clone(),
                        content,
                        timestamp,
                    },
                );
                0
            }
        };
        self.store.save_all(&documents)?;

        self.current_id = Some(documents[index].id.clone());
        self.documents = documents;
        self.title = title;
        info!(id = %self.documents[index].id, title = %self.title, "saved document");
        Ok(&self.documents[index])
    }

    /// Show a saved document. Returns false if `id` is unknown.
    pub fn load<H: SurfaceHost>(&mut self, id: &str, surface: &mut TextSurface<H>) -> bool {
        let Some(doc) = self.get(id) else {
            return false;
        };
        let (content, title) = (doc.content.clone(), doc.title.clone());
        surface.load_content(&content);
        self.current_id = Some(id.to_string());
        self.title = title;
        debug!(id, "loaded document");
        true
    }

    /// Delete a saved document. If it is the one on the surface, the content
    /// stays as an unsaved draft with the default title.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.clone();
        documents.retain(|d| d.id != id);
        if documents.len() == self.documents.len() {
            return Ok(false);
        }
        self.store.save_all(&documents)?;
        self.documents = documents;
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
            self.title = self.default_title.clone();
        }
        info!(id, "deleted document");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::surface::HeadlessHost;

    const Z: &str = "\u{200B}";

    fn setup() -> (DocumentLibrary<MemoryStore>, TextSurface<HeadlessHost>) {
        let library = DocumentLibrary::open(MemoryStore::new()).unwrap();
        (library, TextSurface::new(HeadlessHost::new()))
    }

    #[test]
    fn first_save_creates_record() {
        let (mut lib, mut surface) = setup();
        assert_eq!(lib.title(), DEFAULT_TITLE);
        surface.insert_character("ក");
        let id = lib.save(&surface, Some("  សាកល្បង  ")).unwrap().id.clone();
        assert_eq!(lib.current_id(), Some(id.as_str()));
        assert_eq!(lib.title(), "សាកល្បង");
        assert_eq!(lib.documents().len(), 1);
        assert_eq!(lib.store().load_all().unwrap()[0].content, "ក");
    }

    #[test]
    fn blank_title_keeps_current() {
        let (mut lib, surface) = setup();
        lib.save(&surface, Some("   ")).unwrap();
        assert_eq!(lib.title(), DEFAULT_TITLE);
        lib.save(&surface, None).unwrap();
        assert_eq!(lib.documents().len(), 1);
    }

    #[test]
    fn second_save_updates_in_place() {
        let (mut lib, mut surface) = setup();
        lib.save(&surface, Some("one")).unwrap();
        surface.insert_character("x");
        lib.save(&surface, Some("two")).unwrap();
        assert_eq!(lib.documents().len(), 1);
        assert_eq!(lib.documents()[0].title, "two");
        assert_eq!(lib.documents()[0].content, "x");
    }

    #[test]
    fn new_records_are_prepended() {
        let (mut lib, mut surface) = setup();
        lib.save(&surface, Some("older")).unwrap();
        lib.new_document(&mut surface);
        assert_eq!(lib.current_id(), None);
        lib.save(&surface, Some("newer")).unwrap();
        let titles: Vec<_> = lib.documents().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["newer", "older"]);
    }

    #[test]
    fn save_while_expanded_persists_raw_markers() {
        let (mut lib, mut surface) = setup();
        surface.toggle_invisibles_view(true);
        surface.insert_character("A");
        surface.insert_character(Z);
        let saved = lib.save(&surface, None).unwrap().content.clone();
        assert_eq!(saved, format!("A{Z}"));
        assert!(!saved.contains("invisible-zwsp"));
    }

    #[test]
    fn load_reapplies_view_and_title() {
        let (mut lib, mut surface) = setup();
        surface.insert_character(&format!("a{Z}b"));
        let id = lib.save(&surface, Some("doc")).unwrap().id.clone();

        lib.new_document(&mut surface);
        surface.toggle_invisibles_view(true);
        assert!(lib.load(&id, &mut surface));
        assert_eq!(lib.title(), "doc");
        assert!(surface.document().has_placeholders());
        assert_eq!(surface.plain_text(), format!("a{Z}b"));
        assert!(!lib.load("missing", &mut surface));
    }

    #[test]
    fn new_document_hides_invisibles() {
        let (mut lib, mut surface) = setup();
        surface.toggle_invisibles_view(true);
        surface.insert_character("x");
        lib.new_document(&mut surface);
        assert!(!surface.show_invisibles());
        assert_eq!(surface.plain_text(), "");
        assert_eq!(lib.title(), DEFAULT_TITLE);
    }

    #[test]
    fn deleting_current_keeps_draft() {
        let (mut lib, mut surface) = setup();
        surface.insert_character("draft");
        let id = lib.save(&surface, Some("t")).unwrap().id.clone();
        assert!(lib.delete(&id).unwrap());
        assert!(!lib.delete(&id).unwrap());
        assert_eq!(lib.current_id(), None);
        assert_eq!(lib.title(), DEFAULT_TITLE);
        assert_eq!(surface.plain_text(), "draft");
        assert!(lib.store().load_all().unwrap().is_empty());
    }

    #[test]
    fn discard_check() {
        let (mut lib, mut surface) = setup();
        assert!(!lib.would_discard(&surface, None));
        surface.insert_character("x");
        assert!(lib.would_discard(&surface, None));
        let id = lib.save(&surface, None).unwrap().id.clone();
        assert!(!lib.would_discard(&surface, Some(&id)));
        assert!(lib.would_discard(&surface, Some("other")));
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: bool,
    }

    impl DocumentStore for FlakyStore {
        fn load_all(&self) -> Result<Vec<SavedDocument>, StoreError> {
            self.inner.load_all()
        }

        fn save_all(&mut self, documents: &[SavedDocument]) -> Result<(), StoreError> {
            if self.failing {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save_all(documents)
        }
    }

    #[test]
    fn failed_save_leaves_library_unchanged() {
        let mut lib = DocumentLibrary::open(FlakyStore::default()).unwrap();
        let mut surface = TextSurface::new(HeadlessHost::new());
        surface.insert_character("ក");

        lib.store.failing = true;
        assert!(lib.save(&surface, Some("t")).is_err());
        assert!(lib.documents().is_empty());
        assert_eq!(lib.current_id(), None);
        assert_eq!(lib.title(), DEFAULT_TITLE);

        lib.store.failing = false;
        let id = lib.save(&surface, Some("t")).unwrap().id.clone();
        surface.insert_character("ខ");
        lib.store.failing = true;
        assert!(lib.save(&surface, Some("renamed")).is_err());
        assert_eq!(lib.title(), "t");
        assert_eq!(lib.get(&id).unwrap().content, "ក");
    }

    #[test]
    fn failed_delete_keeps_the_record() {
        let mut lib = DocumentLibrary::open(FlakyStore::default()).unwrap();
        let surface = TextSurface::new(HeadlessHost::new());
        let id = lib.save(&surface, Some("keep")).unwrap().id.clone();

        lib.store.failing = true;
        assert!(lib.delete(&id).is_err());
        assert_eq!(lib.documents().len(), 1);
        assert_eq!(lib.current_id(), Some(id.as_str()));
        assert_eq!(lib.title(), "keep");
    }

    #[test]
    fn malformed_store_opens_empty() {
        let lib = DocumentLibrary::open(MemoryStore::with_raw("][")).unwrap();
        assert!(lib.documents().is_empty());
    }
}
