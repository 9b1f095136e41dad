//! Integration tests for the document library over the redb store.
//!
//! Saved documents must come back byte-identical, with invisible markers
//! stored raw regardless of the placeholder view at save time.

use libkhmer_core::{
    DocumentLibrary, DocumentStore, HeadlessHost, MemoryStore, RedbStore, TextSurface,
};

const Z: &str = "\u{200B}";

fn temp_db(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "libkhmer_core_{}_{}.redb",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn test_redb_library_round_trip() {
    let path = temp_db("library");
    let mut surface = TextSurface::new(HeadlessHost::new());
    surface.toggle_invisibles_view(true);
    surface.insert_character(&format!("ក{Z}ខ"));
    surface.insert_paragraph_break();
    surface.insert_character("គ");
    let stored = surface.serialize_for_persistence();
    assert!(!stored.contains("invisible-zwsp"));

    let id = {
        let mut library = DocumentLibrary::open(RedbStore::open(&path).unwrap()).unwrap();
        library.save(&surface, Some("first")).unwrap().id.clone()
    };

    let mut library = DocumentLibrary::open(RedbStore::open(&path).unwrap()).unwrap();
    assert_eq!(library.documents().len(), 1);
    assert_eq!(library.get(&id).unwrap().content, stored);

    let mut fresh = TextSurface::new(HeadlessHost::new());
    assert!(library.load(&id, &mut fresh));
    assert_eq!(fresh.serialize_for_persistence(), stored);
    assert_eq!(fresh.plain_text(), format!("ក{Z}ខ\nគ"));
    assert!(!fresh.document().has_placeholders());

    assert!(library.delete(&id).unwrap());
    drop(library);
    let store = RedbStore::open(&path).unwrap();
    assert!(store.load_all().unwrap().is_empty());
    drop(store);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_store_key_isolates_lists() {
    let path = temp_db("keys");
    let mut surface = TextSurface::new(HeadlessHost::new());
    surface.insert_character("ក");
    {
        let store = RedbStore::open_with_key(&path, "one").unwrap();
        let mut library = DocumentLibrary::open(store).unwrap();
        library.save(&surface, Some("in one")).unwrap();
    }
    let other = RedbStore::open_with_key(&path, "two").unwrap();
    assert!(other.load_all().unwrap().is_empty());
    drop(other);
    let one = RedbStore::open_with_key(&path, "one").unwrap();
    assert_eq!(one.load_all().unwrap()[0].title, "in one");
    drop(one);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_boxed_store_behaves_like_the_inner_one() {
    let store: Box<dyn DocumentStore> = Box::new(MemoryStore::new());
    let mut library = DocumentLibrary::open(store).unwrap();
    let surface = TextSurface::new(HeadlessHost::new());
    let id = library.save(&surface, None).unwrap().id.clone();
    assert_eq!(library.store().load_all().unwrap()[0].id, id);
    assert_eq!(library.documents()[0].title, "New Document");
}

#[test]
fn test_newest_save_comes_first_after_reload() {
    let path = temp_db("order");
    let mut surface = TextSurface::new(HeadlessHost::new());
    {
        let mut library = DocumentLibrary::open(RedbStore::open(&path).unwrap()).unwrap();
        library.save(&surface, Some("a")).unwrap();
        library.new_document(&mut surface);
        library.save(&surface, Some("b")).unwrap();
    }
    let library = DocumentLibrary::open(RedbStore::open(&path).unwrap()).unwrap();
    let titles: Vec<_> = library.documents().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["b", "a"]);
    drop(library);
    let _ = std::fs::remove_file(&path);
}
