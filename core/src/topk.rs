use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, PartialEq)]
struct Hit {
    score: f32,
    doc_id: String,
}

impl Eq for Hit {}

impl Ord for Hit {
    fn cmp(&self, other: &Self) -> Ordering {
        // higher score ranks higher; equal scores rank by ascending doc_id
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for Hit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the `k` best-scoring documents from a score map, descending by
/// score with ties broken by doc_id ascending. Uses a bounded min-heap, so
/// the full map is never sorted: O(n log k).
pub fn top_k(scores: &HashMap<String, f32>, k: usize) -> Vec<(String, f32)> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Hit>> = BinaryHeap::with_capacity(k + 1);
    for (doc_id, &score) in scores {
        heap.push(Reverse(Hit {
            score,
            doc_id: doc_id.clone(),
        }));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut hits: Vec<Hit> = heap.into_iter().map(|Reverse(hit)| hit).collect();
    hits.sort_by(|a, b| b.cmp(a));
    hits.into_iter().map(|h| (h.doc_id, h.score)).collect()
}
