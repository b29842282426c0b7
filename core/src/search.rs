use std::collections::{HashMap, HashSet};

use crate::analyzer::Analyzer;
use crate::error::Result;
use crate::store::PostingsStore;

/// BM25 term-frequency saturation constant.
pub const K1: f32 = 2.0;
/// BM25 document-length normalization constant.
pub const B: f32 = 0.75;

/// Inverse document frequency of a term contained in `containing` of
/// `total_docs` documents. Negative for terms present in more than half the
/// corpus; that is standard BM25 behavior and is deliberately not clamped.
pub fn idf(total_docs: usize, containing: usize) -> f32 {
    let n = total_docs as f32;
    let df = containing as f32;
    ((n - df + 0.5) / (df + 0.5)).ln()
}

/// Evaluate a free-text query against the store and return the score map:
/// doc_id to BM25 relevance, containing exactly the documents that share at
/// least one query term with the query. Read-only with respect to the
/// store; deterministic for a fixed snapshot.
///
/// An empty normalized query yields an empty map. A non-empty query against
/// an empty store surfaces [`crate::Error::EmptyIndex`].
pub fn search<S: PostingsStore + ?Sized>(
    store: &S,
    analyzer: &Analyzer,
    query: &str,
    is_html: bool,
) -> Result<HashMap<String, f32>> {
    // Distinct query terms, first-seen order; BM25 counts each term once
    // per document regardless of how often it repeats in the query.
    let mut terms: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for term in analyzer.analyze(query, is_html) {
        if seen.insert(term.clone()) {
            terms.push(term);
        }
    }
    if terms.is_empty() {
        return Ok(HashMap::new());
    }

    let total_docs = store.document_count()?;
    let avgdl = store.average_length()?;

    let mut idfs: HashMap<&str, f32> = HashMap::with_capacity(terms.len());
    let mut candidates: HashSet<String> = HashSet::new();
    for term in &terms {
        let docs = store.term_documents(term)?;
        idfs.insert(term.as_str(), idf(total_docs, docs.len()));
        candidates.extend(docs);
    }

    let mut scores: HashMap<String, f32> = HashMap::with_capacity(candidates.len());
    for doc_id in candidates {
        let Some(entry) = store.entry(&doc_id)? else {
            continue;
        };
        let norm = K1 * (1.0 - B + B * (entry.length as f32 / avgdl));
        let mut score = 0.0f32;
        for term in &terms {
            if let Some(weight) = entry.weight(term) {
                score += idfs[term.as_str()] * (weight * (K1 + 1.0)) / (weight + norm);
            }
        }
        scores.insert(doc_id, score);
    }

    tracing::debug!(
        query_terms = terms.len(),
        hits = scores.len(),
        "query evaluated"
    );
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_is_monotonic_in_document_frequency() {
        let rare = idf(100, 1);
        let common = idf(100, 50);
        let ubiquitous = idf(100, 99);
        assert!(rare > common);
        assert!(common > ubiquitous);
    }

    #[test]
    fn idf_goes_negative_for_very_common_terms() {
        assert!(idf(3, 2) < 0.0);
        assert!(idf(10, 9) < 0.0);
    }

    #[test]
    fn idf_of_unseen_term_is_large_and_positive() {
        let unseen = idf(100, 0);
        assert!(unseen > 0.0);
        assert!((unseen - (100.5f32 / 0.5).ln()).abs() < 1e-6);
    }
}
