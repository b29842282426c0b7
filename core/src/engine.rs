use std::collections::HashMap;

use crate::analyzer::Analyzer;
use crate::document::Document;
use crate::entry::index_document;
use crate::error::Result;
use crate::schema::FieldSchema;
use crate::search;
use crate::store::PostingsStore;
use crate::topk::top_k;

/// Outcome of a batch rebuild: how many documents made it into the index
/// and which ones did not (with the reason). A per-document failure never
/// aborts the rest of the batch.
#[derive(Debug, Default)]
pub struct RebuildSummary {
    pub indexed: usize,
    pub failed: Vec<(String, String)>,
}

impl RebuildSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The caller-facing engine: a validated field schema, the analyzer shared
/// by indexing and querying, and a postings store. The schema is fixed for
/// the life of the index; reconfiguring fields means building a new one.
pub struct SearchIndex<S> {
    schema: FieldSchema,
    analyzer: Analyzer,
    store: S,
}

impl<S: PostingsStore> SearchIndex<S> {
    pub fn new(schema: FieldSchema, store: S) -> Self {
        Self::with_analyzer(schema, Analyzer::default(), store)
    }

    pub fn with_analyzer(schema: FieldSchema, analyzer: Analyzer, store: S) -> Self {
        Self {
            schema,
            analyzer,
            store,
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-derive the whole index from `docs`, atomically replacing the
    /// store contents with the entries that indexed cleanly. Documents that
    /// fail to index are skipped and reported in the summary.
    pub fn rebuild_index<D: Document>(&self, docs: &[D]) -> Result<RebuildSummary> {
        let mut summary = RebuildSummary::default();
        let mut entries = Vec::with_capacity(docs.len());
        for (pos, doc) in docs.iter().enumerate() {
            match index_document(doc, &self.schema, &self.analyzer) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    let id = if doc.id().is_empty() {
                        format!("#{pos}")
                    } else {
                        doc.id().to_string()
                    };
                    tracing::warn!(doc = %id, error = %err, "document skipped during rebuild");
                    summary.failed.push((id, err.to_string()));
                }
            }
        }
        summary.indexed = entries.len();
        self.store.rebuild(entries)?;
        tracing::info!(
            indexed = summary.indexed,
            failed = summary.failed.len(),
            "index rebuilt"
        );
        Ok(summary)
    }

    /// Index one document and append it to the store. Re-adding an existing
    /// doc_id overwrites its entry.
    pub fn add_document<D: Document + ?Sized>(&self, doc: &D) -> Result<()> {
        let entry = index_document(doc, &self.schema, &self.analyzer)?;
        self.store.add(entry)
    }

    /// Rank the corpus against a free-text query and return the top `k`
    /// documents, best first.
    pub fn search(&self, query: &str, is_html: bool, k: usize) -> Result<Vec<(String, f32)>> {
        let scores = self.score(query, is_html)?;
        Ok(top_k(&scores, k))
    }

    /// The raw score map for a query, for callers doing their own selection.
    pub fn score(&self, query: &str, is_html: bool) -> Result<HashMap<String, f32>> {
        search::search(&self.store, &self.analyzer, query, is_html)
    }
}
