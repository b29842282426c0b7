use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::entry::DocumentEntry;
use crate::error::{Error, Result};
use crate::store::{PostingsStore, Snapshot};

pub const LAYOUT_VERSION: u32 = 1;

const ENTRIES_FILE: &str = "entries.bin";
const META_FILE: &str = "meta.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u64,
    pub created_at: String,
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Durable postings store: one bincode file holding every entry plus a JSON
/// meta file, under a single index directory. The whole index is loaded at
/// open and written through on mutation; `rebuild` stages the new layout in
/// a sibling directory and renames it over the old one, so an interrupted
/// rebuild leaves the previous snapshot on disk.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    inner: RwLock<Snapshot>,
}

impl FileStore {
    /// Create an empty index at `root` (the directory is created if needed).
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let snapshot = Snapshot::default();
        write_layout(&root, &snapshot)?;
        Ok(Self {
            root,
            inner: RwLock::new(snapshot),
        })
    }

    /// Open an existing index directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        // A crash between rebuild's two directory renames leaves nothing at
        // the root and the complete old snapshot at the .old sibling; move
        // it back before reading.
        if !root.join(META_FILE).exists() {
            let backup = sibling_path(&root, ".old");
            if backup.join(META_FILE).exists() {
                fs::rename(&backup, &root)?;
            }
        }
        let meta = read_meta(&root)?;
        if meta.version != LAYOUT_VERSION {
            return Err(Error::store(format!(
                "unsupported index layout version {} (expected {})",
                meta.version, LAYOUT_VERSION
            )));
        }
        let entries = read_entries(&root)?;
        if entries.len() as u64 != meta.num_docs {
            return Err(Error::store(format!(
                "index is inconsistent: meta says {} docs, entries file has {}",
                meta.num_docs,
                entries.len()
            )));
        }
        let snapshot = Snapshot::from_entries(entries.into_values().collect())?;
        Ok(Self {
            root,
            inner: RwLock::new(snapshot),
        })
    }

    /// Open the index at `root` if one exists there, otherwise create an
    /// empty one. Never clobbers existing index contents.
    pub fn open_or_create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let has_index = root.join(META_FILE).exists()
            || sibling_path(&root, ".old").join(META_FILE).exists();
        if has_index {
            Self::open(root)
        } else {
            Self::create(root)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Replace `path` through a temp-file rename, so a torn write never leaves
/// a half-written file behind.
fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = sibling_path(path, ".tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_layout(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir)?;
    let bytes = bincode::serialize(&snapshot.entries)?;
    write_file_atomic(&dir.join(ENTRIES_FILE), &bytes)?;

    let meta = MetaFile {
        version: LAYOUT_VERSION,
        num_docs: snapshot.entries.len() as u64,
        created_at: now_rfc3339(),
    };
    let json = serde_json::to_string_pretty(&meta)?;
    write_file_atomic(&dir.join(META_FILE), json.as_bytes())?;
    Ok(())
}

fn read_entries(dir: &Path) -> Result<HashMap<String, DocumentEntry>> {
    let mut f = File::open(dir.join(ENTRIES_FILE))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

fn read_meta(dir: &Path) -> Result<MetaFile> {
    let mut f = File::open(dir.join(META_FILE))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

fn sibling_path(root: &Path, suffix: &str) -> PathBuf {
    let mut name = root
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    root.with_file_name(name)
}

impl PostingsStore for FileStore {
    fn rebuild(&self, entries: Vec<DocumentEntry>) -> Result<()> {
        let next = Snapshot::from_entries(entries)?;
        let mut guard = self.inner.write();

        // Stage the new layout next to the live one, then swap directories.
        // A failure before the final rename leaves the old index untouched.
        let staging = sibling_path(&self.root, ".staging");
        let backup = sibling_path(&self.root, ".old");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        write_layout(&staging, &next)?;

        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }
        if self.root.exists() {
            fs::rename(&self.root, &backup)?;
        }
        if let Err(err) = fs::rename(&staging, &self.root) {
            // roll the old directory back into place before surfacing
            let _ = fs::rename(&backup, &self.root);
            return Err(err.into());
        }
        let _ = fs::remove_dir_all(&backup);

        *guard = next;
        Ok(())
    }

    fn add(&self, entry: DocumentEntry) -> Result<()> {
        let doc_id = entry.doc_id.clone();
        let mut guard = self.inner.write();
        let displaced = guard.insert(entry);
        if let Err(err) = write_layout(&self.root, &guard) {
            // keep serving the last durable state
            guard.remove(&doc_id);
            if let Some(old) = displaced {
                guard.insert(old);
            }
            return Err(err);
        }
        Ok(())
    }

    fn entry(&self, doc_id: &str) -> Result<Option<DocumentEntry>> {
        Ok(self.inner.read().entries.get(doc_id).cloned())
    }

    fn term_documents(&self, term: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .terms
            .get(term)
            .map(|docs| docs.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn document_count(&self) -> Result<usize> {
        Ok(self.inner.read().entries.len())
    }

    fn average_length(&self) -> Result<f32> {
        self.inner.read().average_length()
    }
}
