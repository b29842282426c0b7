use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyzer::Analyzer;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::schema::FieldSchema;

/// One aggregated term for one document. The weight is the sum, over every
/// occurrence of the term in the document, of the containing field's weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub term: String,
    pub weight: f32,
}

/// The index record for one document: deduplicated postings sorted by term,
/// and the pre-aggregation mention count used for length normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub doc_id: String,
    pub postings: Vec<Posting>,
    pub length: u64,
}

impl DocumentEntry {
    /// Aggregated weight of `term` in this document, if present. Postings
    /// are term-sorted, so this is a binary search.
    pub fn weight(&self, term: &str) -> Option<f32> {
        self.postings
            .binary_search_by(|p| p.term.as_str().cmp(term))
            .ok()
            .map(|i| self.postings[i].weight)
    }
}

/// Analyze every declared field of `doc` and aggregate the weighted term
/// mentions into a [`DocumentEntry`]. A field that is absent on this
/// particular document is skipped, not fatal; heterogeneous corpora are
/// expected. Fails only when the document has no identity.
pub fn index_document<D: Document + ?Sized>(
    doc: &D,
    schema: &FieldSchema,
    analyzer: &Analyzer,
) -> Result<DocumentEntry> {
    if doc.id().is_empty() {
        return Err(Error::invalid_document("document has no id"));
    }

    let mut weights: BTreeMap<String, f32> = BTreeMap::new();
    let mut length: u64 = 0;
    for field in schema.fields() {
        let Some(value) = doc.field(&field.name) else {
            tracing::debug!(doc_id = doc.id(), field = %field.name, "field absent, skipped");
            continue;
        };
        // Each occurrence contributes the field's flat weight, so n mentions
        // in one field aggregate to n * weight.
        for term in analyzer.analyze(value, field.is_html) {
            *weights.entry(term).or_insert(0.0) += field.weight;
            length += 1;
        }
    }

    let postings = weights
        .into_iter()
        .map(|(term, weight)| Posting { term, weight })
        .collect();
    Ok(DocumentEntry {
        doc_id: doc.id().to_string(),
        postings,
        length,
    })
}
