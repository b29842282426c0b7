//! Field-weighted BM25 full-text indexing and ranking.
//!
//! Documents expose an id and named textual fields ([`Document`]); a
//! validated [`FieldSchema`] says which fields are indexed and how heavily.
//! [`SearchIndex`] ties the analyzer, the schema, and a [`PostingsStore`]
//! together: rebuild or append entries, then rank free-text queries.

pub mod analyzer;
pub mod document;
pub mod engine;
pub mod entry;
pub mod error;
pub mod persist;
pub mod schema;
pub mod search;
pub mod store;
pub mod topk;

pub use analyzer::Analyzer;
pub use document::{Document, Record};
pub use engine::{RebuildSummary, SearchIndex};
pub use entry::{index_document, DocumentEntry, Posting};
pub use error::{Error, Result};
pub use persist::FileStore;
pub use schema::{FieldConfig, FieldSchema};
pub use search::{idf, B, K1};
pub use store::{MemoryStore, PostingsStore};
pub use topk::top_k;
