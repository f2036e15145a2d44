//! Concatenate-with-dedup-boost join of the vector and keyword branches.
//!
//! Output tiers, in order:
//! 1. records retrieved by both branches, by vector rank
//! 2. vector-only records, by vector rank
//! 3. keyword-only records, by keyword rank
//!
//! Scores are never compared across branches. `top_k` is applied after
//! deduplication.

use std::collections::{HashMap, HashSet};

use localrag_core::types::{BranchHit, FusedContext, FusedRecord, IndexedRecord, RetrievalResult};

/// First occurrence of every id, with its rank among the deduplicated hits.
fn first_hits(result: &RetrievalResult) -> Vec<(&IndexedRecord, BranchHit)> {
    let mut seen = HashSet::new();
    result
        .hits
        .iter()
        .filter(|h| seen.insert(h.record.id.as_str()))
        .enumerate()
        .map(|(rank, h)| (&h.record, BranchHit { rank, score: h.score }))
        .collect()
}

pub fn fuse(vector: &RetrievalResult, keyword: &RetrievalResult, top_k: usize) -> FusedContext {
    let vector_hits = first_hits(vector);
    let keyword_hits = first_hits(keyword);
    let keyword_by_id: HashMap<&str, BranchHit> = keyword_hits.iter().map(|(r, h)| (r.id.as_str(), *h)).collect();
    let vector_ids: HashSet<&str> = vector_hits.iter().map(|(r, _)| r.id.as_str()).collect();

    let mut both = Vec::new();
    let mut vector_only = Vec::new();
    for (record, hit) in &vector_hits {
        let fused = FusedRecord { record: (*record).clone(), vector: Some(*hit), keyword: keyword_by_id.get(record.id.as_str()).copied() };
        if fused.keyword.is_some() { both.push(fused) } else { vector_only.push(fused) }
    }
    let keyword_only = keyword_hits
        .iter()
        .filter(|(r, _)| !vector_ids.contains(r.id.as_str()))
        .map(|(record, hit)| FusedRecord { record: (*record).clone(), vector: None, keyword: Some(*hit) });

    let records: Vec<FusedRecord> = both.into_iter().chain(vector_only).chain(keyword_only).take(top_k).collect();
    tracing::debug!(
        vector = vector_hits.len(),
        keyword = keyword_hits.len(),
        fused = records.len(),
        boosted = records.iter().filter(|r| r.in_both()).count(),
        "branches fused"
    );
    FusedContext { records }
}
