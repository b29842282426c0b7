use sift_core::{
    DocumentEntry, Error, FieldSchema, FileStore, Posting, PostingsStore, Record, SearchIndex,
};
use tempfile::tempdir;

fn entry(doc_id: &str, terms: &[(&str, f32)], length: u64) -> DocumentEntry {
    DocumentEntry {
        doc_id: doc_id.to_string(),
        postings: terms
            .iter()
            .map(|(t, w)| Posting {
                term: t.to_string(),
                weight: *w,
            })
            .collect(),
        length,
    }
}

#[test]
fn create_add_and_reopen() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let store = FileStore::create(&root).unwrap();
    store.add(entry("d1", &[("fox", 1.5)], 1)).unwrap();
    store.add(entry("d2", &[("dog", 1.0), ("fox", 1.0)], 2)).unwrap();
    drop(store);

    let reopened = FileStore::open(&root).unwrap();
    assert_eq!(reopened.document_count().unwrap(), 2);
    let mut docs = reopened.term_documents("fox").unwrap();
    docs.sort();
    assert_eq!(docs, vec!["d1", "d2"]);
    let d1 = reopened.entry("d1").unwrap().unwrap();
    assert!((d1.weight("fox").unwrap() - 1.5).abs() < 1e-6);
}

#[test]
fn rebuild_swaps_the_layout_atomically() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let store = FileStore::create(&root).unwrap();
    store.add(entry("old", &[("fox", 1.0)], 1)).unwrap();
    store
        .rebuild(vec![entry("new", &[("dog", 1.0)], 1)])
        .unwrap();

    assert!(store.entry("old").unwrap().is_none());
    assert_eq!(store.term_documents("dog").unwrap(), vec!["new"]);

    // no staging or backup directories survive a clean rebuild
    assert!(!dir.path().join("index.staging").exists());
    assert!(!dir.path().join("index.old").exists());

    drop(store);
    let reopened = FileStore::open(&root).unwrap();
    assert_eq!(reopened.document_count().unwrap(), 1);
    assert!(reopened.entry("new").unwrap().is_some());
}

#[test]
fn failed_rebuild_preserves_old_snapshot_in_memory_and_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let store = FileStore::create(&root).unwrap();
    store.add(entry("old", &[("fox", 1.0)], 1)).unwrap();

    let batch = vec![
        entry("a", &[("dog", 1.0)], 1),
        entry("a", &[("cat", 1.0)], 1),
    ];
    let err = store.rebuild(batch).unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    assert_eq!(store.document_count().unwrap(), 1);
    assert_eq!(store.term_documents("fox").unwrap(), vec!["old"]);

    drop(store);
    let reopened = FileStore::open(&root).unwrap();
    assert_eq!(reopened.document_count().unwrap(), 1);
    assert_eq!(reopened.term_documents("fox").unwrap(), vec!["old"]);
}

#[test]
fn failed_add_keeps_memory_and_disk_in_step() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let store = FileStore::create(&root).unwrap();
    store.add(entry("d1", &[("fox", 1.0)], 1)).unwrap();

    // force every subsequent write to fail: a directory squats where the
    // entries file must land, so the temp-file rename cannot succeed
    std::fs::remove_file(root.join("entries.bin")).unwrap();
    std::fs::create_dir(root.join("entries.bin")).unwrap();

    let err = store.add(entry("d2", &[("dog", 1.0)], 1)).unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    // the live snapshot rolled back to the last durable state
    assert!(store.entry("d2").unwrap().is_none());
    assert!(store.term_documents("dog").unwrap().is_empty());
    assert_eq!(store.document_count().unwrap(), 1);

    // a failed overwrite restores the displaced entry too
    let err = store.add(entry("d1", &[("cat", 1.0)], 1)).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    let d1 = store.entry("d1").unwrap().unwrap();
    assert!(d1.weight("fox").is_some());
    assert!(d1.weight("cat").is_none());
    assert_eq!(store.term_documents("fox").unwrap(), vec!["d1"]);
}

#[test]
fn open_or_create_reuses_an_existing_index() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    // fresh path: creates an empty index
    let store = FileStore::open_or_create(&root).unwrap();
    assert_eq!(store.document_count().unwrap(), 0);
    store.add(entry("d1", &[("fox", 1.0)], 1)).unwrap();
    drop(store);

    // existing path: opens instead of clobbering
    let store = FileStore::open_or_create(&root).unwrap();
    assert_eq!(store.document_count().unwrap(), 1);

    // a rejected rebuild through the reopened store leaves it intact
    let batch = vec![
        entry("a", &[("dog", 1.0)], 1),
        entry("a", &[("cat", 1.0)], 1),
    ];
    assert!(store.rebuild(batch).is_err());
    drop(store);

    let store = FileStore::open_or_create(&root).unwrap();
    assert_eq!(store.term_documents("fox").unwrap(), vec!["d1"]);
}

#[test]
fn open_recovers_from_an_interrupted_rebuild_swap() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let store = FileStore::create(&root).unwrap();
    store.add(entry("d1", &[("fox", 1.0)], 1)).unwrap();
    drop(store);

    // the state a crash between rebuild's two renames leaves behind:
    // nothing at the root, the full old snapshot at the .old sibling
    std::fs::rename(&root, dir.path().join("index.old")).unwrap();

    let store = FileStore::open(&root).unwrap();
    assert_eq!(store.document_count().unwrap(), 1);
    assert_eq!(store.term_documents("fox").unwrap(), vec!["d1"]);
    assert!(root.join("meta.json").exists());
    assert!(!dir.path().join("index.old").exists());
}

#[test]
fn open_rejects_missing_or_corrupt_layout() {
    let dir = tempdir().unwrap();

    // nothing there at all
    assert!(matches!(
        FileStore::open(dir.path().join("absent")).unwrap_err(),
        Error::Io(_)
    ));

    // meta present but entries file is garbage
    let root = dir.path().join("index");
    FileStore::create(&root).unwrap();
    std::fs::write(root.join("entries.bin"), b"not bincode").unwrap();
    assert!(FileStore::open(&root).is_err());
}

#[test]
fn search_works_against_a_reopened_index() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("index");

    let schema = FieldSchema::builder()
        .field("title", 1.5, true)
        .field("content", 1.0, true)
        .build()
        .unwrap();

    {
        let index = SearchIndex::new(schema.clone(), FileStore::create(&root).unwrap());
        let docs = vec![
            Record::new("p1")
                .with_field("title", "<h1>Foxes of the north</h1>")
                .with_field("content", "<p>A fox family settles in.</p>"),
            Record::new("p2")
                .with_field("title", "Gardening weekly")
                .with_field("content", "Tomatoes and soil care."),
            Record::new("p3")
                .with_field("title", "City wildlife")
                .with_field("content", "Raccoons, pigeons, and one shy fox."),
            Record::new("p4")
                .with_field("title", "Bread baking")
                .with_field("content", "Flour, water, salt."),
            Record::new("p5")
                .with_field("title", "Night skies")
                .with_field("content", "Telescopes and planets."),
        ];
        let summary = index.rebuild_index(&docs).unwrap();
        assert_eq!(summary.indexed, 5);
    }

    let index = SearchIndex::new(schema, FileStore::open(&root).unwrap());
    let ranked = index.search("fox", false, 10).unwrap();
    assert_eq!(ranked.len(), 2);
    // p1 carries the term in the weighted title and again in the content
    assert_eq!(ranked[0].0, "p1");
    assert_eq!(ranked[1].0, "p3");
}
