//! Document and passage ordering.
//!
//! Across documents, keyword and hybrid searches rank by
//! `top_score + 0.05·[keyword hit] + 0.02·[synonym hit]`. The boost is
//! additive on raw similarity, so a keyword document can still rank below a
//! semantic-only document whose top score is more than 0.05 higher.

use std::cmp::Ordering;

use docdesk_core::types::{DocId, DocumentMatchBag, HitKind, MatchHit};

pub const KEYWORD_BOOST: f32 = 0.05;
pub const SYNONYM_BOOST: f32 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub rank: f32,
    pub top_score: f32,
    pub has_keyword: bool,
    pub has_synonym: bool,
}

fn by_score_desc(a: f32, b: f32) -> Ordering { b.partial_cmp(&a).unwrap_or(Ordering::Equal) }

/// Highest score first; unscored hits count as zero. Stable.
pub fn sort_hits(hits: &mut [MatchHit]) {
    hits.sort_by(|a, b| by_score_desc(a.score_or_zero(), b.score_or_zero()));
}

pub fn rank_doc(doc_id: &str, hits: &[MatchHit], boost: bool) -> RankedDoc {
    let top_score = hits.iter().map(MatchHit::score_or_zero).reduce(f32::max).unwrap_or(0.0);
    let has_keyword = hits.iter().any(|h| h.kind == HitKind::Keyword);
    let has_synonym = hits.iter().any(|h| h.kind == HitKind::Synonym);
    let mut bonus = 0.0;
    if boost && has_keyword { bonus += KEYWORD_BOOST; }
    if boost && has_synonym { bonus += SYNONYM_BOOST; }
    RankedDoc { doc_id: doc_id.to_string(), rank: top_score + bonus, top_score, has_keyword, has_synonym }
}

/// Rank documents by boosted score; ties keep bag (scan) order.
pub fn rank_documents(bag: &DocumentMatchBag, boost: bool) -> Vec<RankedDoc> {
    let mut ranked: Vec<RankedDoc> = bag.iter().map(|(id, hits)| rank_doc(id, hits, boost)).collect();
    ranked.sort_by(|a, b| by_score_desc(a.rank, b.rank));
    ranked
}

/// Keep the order the service returned documents in.
pub fn service_order(bag: &DocumentMatchBag) -> Vec<RankedDoc> {
    bag.iter().map(|(id, hits)| rank_doc(id, hits, false)).collect()
}

/// Rebuild `bag` so its iteration order follows `ranking`.
pub fn reorder(mut bag: DocumentMatchBag, ranking: &[RankedDoc]) -> DocumentMatchBag {
    let mut out = DocumentMatchBag::new();
    for doc in ranking {
        if let Some(hits) = bag.get_mut(&doc.doc_id) { out.insert(doc.doc_id.clone(), std::mem::take(hits)); }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(score: Option<f32>, kind: HitKind) -> MatchHit {
        MatchHit { chunk_index: Some(0), score, preview: String::new(), char_count: None, kind }
    }

    fn close(a: f32, b: f32) -> bool { (a - b).abs() < 1e-6 }

    #[test]
    fn boost_table() {
        let both = rank_doc("d", &[hit(Some(0.3), HitKind::Keyword), hit(Some(0.1), HitKind::Synonym)], true);
        let kw = rank_doc("d", &[hit(Some(0.3), HitKind::Keyword)], true);
        let syn = rank_doc("d", &[hit(Some(0.3), HitKind::Synonym), hit(Some(0.2), HitKind::Semantic)], true);
        let none = rank_doc("d", &[hit(Some(0.3), HitKind::Semantic)], true);
        assert!(close(both.rank, 0.3 + 0.07));
        assert!(close(kw.rank, 0.3 + 0.05));
        assert!(close(syn.rank, 0.3 + 0.02));
        assert!(close(none.rank, 0.3));
    }

    #[test]
    fn boost_disabled_ranks_on_score() {
        let d = rank_doc("d", &[hit(Some(0.3), HitKind::Keyword), hit(None, HitKind::Synonym)], false);
        assert!(close(d.rank, 0.3));
        assert!(d.has_keyword && d.has_synonym);
    }

    #[test]
    fn unscored_hits_sort_last_and_stably() {
        let mut hits = vec![hit(None, HitKind::Keyword), hit(Some(0.2), HitKind::Semantic), hit(None, HitKind::Synonym), hit(Some(0.5), HitKind::Semantic)];
        sort_hits(&mut hits);
        let kinds: Vec<_> = hits.iter().map(|h| (h.score, h.kind)).collect();
        assert_eq!(kinds, vec![(Some(0.5), HitKind::Semantic), (Some(0.2), HitKind::Semantic), (None, HitKind::Keyword), (None, HitKind::Synonym)]);
    }

    #[test]
    fn keyword_boost_does_not_beat_higher_semantic_score() {
        let mut bag = DocumentMatchBag::new();
        bag.insert("A".into(), vec![hit(Some(0.40), HitKind::Keyword)]);
        bag.insert("B".into(), vec![hit(Some(0.50), HitKind::Semantic)]);
        let ranked = rank_documents(&bag, true);
        // 0.40 + 0.05 = 0.45 < 0.50
        assert_eq!(ranked[0].doc_id, "B");
        assert_eq!(ranked[1].doc_id, "A");
        assert!(close(ranked[1].rank, 0.45));
    }

    #[test]
    fn ties_keep_scan_order() {
        let mut bag = DocumentMatchBag::new();
        for id in ["x", "y", "z"] { bag.insert(id.into(), vec![hit(Some(0.2), HitKind::Semantic)]); }
        let ids: Vec<_> = rank_documents(&bag, true).into_iter().map(|d| d.doc_id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn reorder_follows_ranking() {
        let mut bag = DocumentMatchBag::new();
        bag.insert("A".into(), vec![hit(Some(0.1), HitKind::Semantic)]);
        bag.insert("B".into(), vec![hit(Some(0.9), HitKind::Semantic)]);
        let ranking = rank_documents(&bag, true);
        let bag = reorder(bag, &ranking);
        assert_eq!(bag.doc_ids(), &["B".to_string(), "A".to_string()]);
        assert_eq!(bag.get("A").unwrap().len(), 1);
    }
}
