use std::collections::HashSet;

use localrag_core::types::{IndexedRecord, Meta, RetrievalResult, ScoredRecord, SourceKind};
use localrag_hybrid::fusion::fuse;
use proptest::prelude::*;

fn branch(source: SourceKind, ids: &[u8]) -> RetrievalResult {
    let hits = ids
        .iter()
        .enumerate()
        .map(|(i, id)| ScoredRecord {
            record: IndexedRecord { id: format!("r{id}"), doc_id: "d".into(), ordinal: 0, text: String::new(), vector: None, meta: Meta::new() },
            score: 1.0 / (i as f32 + 1.0),
        })
        .collect();
    RetrievalResult::new(source, hits)
}

fn ids_strategy() -> impl Strategy<Value = Vec<u8>> { prop::collection::vec(0u8..20, 0..12) }

proptest! {
    #[test]
    fn each_id_once_and_both_tier_first(v in ids_strategy(), k in ids_strategy(), top_k in 0usize..30) {
        let fused = fuse(&branch(SourceKind::Vector, &v), &branch(SourceKind::Keyword, &k), top_k);
        let ids = fused.ids();
        let unique: HashSet<_> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
        prop_assert!(fused.len() <= top_k);
        let first_single = fused.records.iter().position(|r| !r.in_both()).unwrap_or(fused.len());
        prop_assert!(fused.records[first_single..].iter().all(|r| !r.in_both()));
    }

    #[test]
    fn adding_a_hit_never_removes_a_fused_record(v in ids_strategy(), k in ids_strategy(), extra in 0u8..30, to_vector in any::<bool>()) {
        let before = fuse(&branch(SourceKind::Vector, &v), &branch(SourceKind::Keyword, &k), usize::MAX);
        let (mut v2, mut k2) = (v.clone(), k.clone());
        if to_vector { v2.push(extra) } else { k2.push(extra) }
        let after = fuse(&branch(SourceKind::Vector, &v2), &branch(SourceKind::Keyword, &k2), usize::MAX);
        let after_ids: HashSet<_> = after.ids().into_iter().collect();
        for id in before.ids() {
            prop_assert!(after_ids.contains(id), "{} was dropped", id);
        }
    }
}
