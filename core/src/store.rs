use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::entry::DocumentEntry;
use crate::error::{Error, Result};

/// Storage contract for document index entries. Queries only ever read;
/// `rebuild` is the one operation with a transactional guarantee: on
/// failure the previous contents remain observable in full.
pub trait PostingsStore {
    /// Replace the entire store contents. Duplicate doc_ids in the batch
    /// are rejected and leave the store untouched.
    fn rebuild(&self, entries: Vec<DocumentEntry>) -> Result<()>;

    /// Insert or overwrite a single entry, keyed by doc_id.
    fn add(&self, entry: DocumentEntry) -> Result<()>;

    /// The full entry for a document, if indexed.
    fn entry(&self, doc_id: &str) -> Result<Option<DocumentEntry>>;

    /// Ids of every document whose postings contain `term`; empty for an
    /// unseen term.
    fn term_documents(&self, term: &str) -> Result<Vec<String>>;

    fn document_count(&self) -> Result<usize>;

    /// Mean entry length across the corpus. [`Error::EmptyIndex`] when the
    /// store holds no entries; BM25's length normalization is undefined then.
    fn average_length(&self) -> Result<f32>;
}

/// The two views of the index: entries by doc_id, and the derived term to
/// doc_ids mapping. Kept consistent under every mutation.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub(crate) entries: HashMap<String, DocumentEntry>,
    pub(crate) terms: HashMap<String, HashSet<String>>,
}

impl Snapshot {
    pub(crate) fn from_entries(entries: Vec<DocumentEntry>) -> Result<Self> {
        let mut snapshot = Snapshot::default();
        for entry in entries {
            if snapshot.entries.contains_key(&entry.doc_id) {
                return Err(Error::store(format!(
                    "duplicate doc_id '{}' in rebuild batch",
                    entry.doc_id
                )));
            }
            snapshot.insert(entry);
        }
        Ok(snapshot)
    }

    /// Insert an entry, returning the one it displaced (if any) so callers
    /// that must stay transactional can roll back.
    pub(crate) fn insert(&mut self, entry: DocumentEntry) -> Option<DocumentEntry> {
        let displaced = self.remove(&entry.doc_id);
        for posting in &entry.postings {
            self.terms
                .entry(posting.term.clone())
                .or_default()
                .insert(entry.doc_id.clone());
        }
        self.entries.insert(entry.doc_id.clone(), entry);
        displaced
    }

    pub(crate) fn remove(&mut self, doc_id: &str) -> Option<DocumentEntry> {
        let old = self.entries.remove(doc_id)?;
        for posting in &old.postings {
            let emptied = match self.terms.get_mut(&posting.term) {
                Some(docs) => {
                    docs.remove(doc_id);
                    docs.is_empty()
                }
                None => false,
            };
            if emptied {
                self.terms.remove(&posting.term);
            }
        }
        Some(old)
    }

    pub(crate) fn average_length(&self) -> Result<f32> {
        if self.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let total: u64 = self.entries.values().map(|e| e.length).sum();
        Ok(total as f32 / self.entries.len() as f32)
    }
}

/// In-memory postings store under a single-writer/multi-reader lock.
/// Rebuild constructs the replacement state outside the lock and swaps it
/// in whole, so readers see either the old or the new snapshot.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostingsStore for MemoryStore {
    fn rebuild(&self, entries: Vec<DocumentEntry>) -> Result<()> {
        let next = Snapshot::from_entries(entries)?;
        *self.inner.write() = next;
        Ok(())
    }

    fn add(&self, entry: DocumentEntry) -> Result<()> {
        self.inner.write().insert(entry);
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
