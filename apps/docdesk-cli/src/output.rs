//! Terminal and JSON formatting for the console.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

use docdesk_core::types::{CorpusStats, DocMeta, DocPage, HitKind, MatchHit, QueryStats, SearchMode};
use docdesk_hybrid::{DocSummary, PassageCursor, SearchOutcome, SummarySource};
use docdesk_text::{Highlighter, Render};

/// ANSI only when colour is enabled and stdout is a terminal.
pub fn render_style(color: bool, is_tty: bool) -> Render {
    if color && is_tty { Render::Ansi } else { Render::Marked }
}

fn kind_label(kind: HitKind) -> &'static str {
    match kind { HitKind::Keyword => "kw ", HitKind::Synonym => "syn", HitKind::Semantic => "sem" }
}

fn score_label(score: Option<f32>) -> String { score.map_or_else(|| "  -  ".to_string(), |s| format!("{s:.3}")) }

/// Stage names whose value is truthy, in key order.
pub fn stage_badges(stages: &Value) -> String {
    let Some(obj) = stages.as_object() else { return String::new() };
    obj.iter()
        .filter(|(_, v)| match v { Value::Bool(b) => *b, Value::Number(n) => n.as_f64().is_some_and(|x| x > 0.0), Value::Null => false, _ => true })
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_docs(page: &DocPage) -> String {
    let mut out = format!("📚 {} documents (page {}, {} per page)\n", page.total, page.page, page.limit);
    for doc in &page.items {
        let meta: Vec<&str> = [&doc.dept, &doc.lang, &doc.doc_type, &doc.created_at].into_iter().filter_map(|v| v.as_deref()).collect();
        let _ = writeln!(out, "  {}  {}", doc.doc_id, doc.display_title());
        if !meta.is_empty() { let _ = writeln!(out, "     {}", meta.join(" · ")); }
        let badges = stage_badges(&doc.stages);
        if !badges.is_empty() { let _ = writeln!(out, "     [{badges}]"); }
    }
    out
}

pub fn format_corpus(stats: &CorpusStats) -> String {
    let c = &stats.counts;
    let mut out = format!("📚 {} documents, {} chunks ({} embedded), {} OCR pages\n", c.documents, c.chunks, c.embeddings, c.ocr_pages);
    let on: Vec<&str> = stats.features.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str()).collect();
    if !on.is_empty() { let _ = writeln!(out, "   features: {}", on.join(" ")); }
    if !stats.env.is_empty() {
        let env: Vec<String> = stats.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let _ = writeln!(out, "   env: {}", env.join(" "));
    }
    if let Some(total) = stats.avg_ms.get("total") { let _ = writeln!(out, "   avg {total:.1} ms per route"); }
    for (route, ms) in &stats.avg_routes_ms { let _ = writeln!(out, "     {route}  {ms:.1} ms"); }
    if stats.errors_24h > 0 { let _ = writeln!(out, "⚠️  {} errors in the last 24h", stats.errors_24h); }
    out
}

pub fn format_meta(meta: &DocMeta) -> String {
    let mut out = format!("📄 {}: {} chunks, {} embedded, {} OCR pages\n", meta.doc_id, meta.chunks, meta.embeds, meta.ocr_pages);
    if meta.unembedded() > 0 { let _ = writeln!(out, "⚠️  {} chunks without an embedding", meta.unembedded()); }
    out
}

/// Shown when a newer search replaced this one before it finished.
pub fn superseded_note(query: &str) -> String { format!("⚠️  Search for \"{query}\" superseded") }

pub fn format_stats(mode: SearchMode, stats: &QueryStats) -> String {
    format!(
        "📊 {mode}: {} hits in {}/{} documents ({} kw, {} syn, {} sem) in {} ms",
        stats.hits, stats.docs_matched, stats.docs_scanned, stats.keyword_hits, stats.synonym_hits, stats.semantic_hits, stats.elapsed_ms
    )
}

fn index_label(chunk_index: Option<i64>) -> String { chunk_index.map_or_else(|| "-".to_string(), |i| i.to_string()) }

fn push_hit(out: &mut String, hit: &MatchHit, highlighter: &Highlighter, style: Render) {
    let _ = writeln!(out, "     {} {} #{:<4} {}", kind_label(hit.kind), score_label(hit.score), index_label(hit.chunk_index), highlighter.render(&hit.preview, style));
}

pub fn format_outcome(outcome: &SearchOutcome, highlighter: &Highlighter, style: Render) -> String {
    let mut out = String::new();
    if outcome.bag.is_empty() {
        let _ = writeln!(out, "🔍 No matches for \"{}\"", outcome.query);
    } else {
        let _ = writeln!(out, "🔍 {} documents for \"{}\"", outcome.bag.len(), outcome.query);
    }
    for (i, doc) in outcome.ranking.iter().enumerate() {
        let mut flags = String::new();
        if doc.has_keyword { flags.push_str(" +kw"); }
        if doc.has_synonym { flags.push_str(" +syn"); }
        let _ = writeln!(out, "\n  {}. {}  rank={:.3}{}", i + 1, doc.doc_id, doc.rank, flags);
        for hit in outcome.bag.get(&doc.doc_id).unwrap_or_default() { push_hit(&mut out, hit, highlighter, style); }
    }
    for note in &outcome.notes { let _ = writeln!(out, "⚠️  {note}"); }
    let _ = writeln!(out, "\n{}", format_stats(outcome.mode, &outcome.stats));
    out
}

pub fn format_passages(doc_id: &str, hits: &[MatchHit], cursor: PassageCursor, highlighter: &Highlighter, style: Render) -> String {
    let mut out = format!("📄 {doc_id}: {} passages\n", hits.len());
    for hit in hits { push_hit(&mut out, hit, highlighter, style); }
    if cursor.has_more { let _ = writeln!(out, "   … more from offset {}", cursor.offset); }
    out
}

pub fn format_summary(doc_id: &str, summary: &DocSummary) -> String {
    let source = match summary.source { SummarySource::Llm => "llm", SummarySource::SemanticFallback => "semantic fallback" };
    let mut out = format!("📝 Summary of {doc_id} ({source})\n\n{}\n", summary.text.trim());
    if let Some(meta) = &summary.meta { let _ = writeln!(out, "\nk_used={} took_ms={}", meta.k_used, meta.took_ms); }
    if let Some(note) = &summary.note { let _ = writeln!(out, "⚠️  {note}"); }
    out
}

#[derive(Serialize)]
struct JsonDoc<'a> {
    doc_id: &'a str,
    rank: f32,
    top_score: f32,
    hits: &'a [MatchHit],
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    query: &'a str,
    mode: SearchMode,
    stats: &'a QueryStats,
    notes: &'a [String],
    documents: Vec<JsonDoc<'a>>,
}

pub fn json_outcome(outcome: &SearchOutcome) -> String {
    let documents = outcome
        .ranking
        .iter()
        .map(|d| JsonDoc { doc_id: &d.doc_id, rank: d.rank, top_score: d.top_score, hits: outcome.bag.get(&d.doc_id).unwrap_or_default() })
        .collect();
    let body = JsonOutcome { query: &outcome.query, mode: outcome.mode, stats: &outcome.stats, notes: &outcome.notes, documents };
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdesk_text::{QueryTerms, SynonymTable};
    use serde_json::json;

    #[test]
    fn badges_keep_truthy_stages() {
        assert_eq!(stage_badges(&json!({"chunks": 12, "embed": 0, "ocr": false, "pdf": true})), "chunks pdf");
        assert_eq!(stage_badges(&Value::Null), "");
    }

    #[test]
    fn plain_style_off_terminal() {
        assert_eq!(render_style(true, false), Render::Marked);
        assert_eq!(render_style(false, true), Render::Marked);
        assert_eq!(render_style(true, true), Render::Ansi);
    }

    #[test]
    fn corpus_overview_lists_enabled_features() {
        let stats: CorpusStats = serde_json::from_value(json!({
            "counts": {"documents": 12, "chunks": 340, "embeddings": 338, "ocr_pages": 9},
            "features": {"pg_trgm": true, "pgvector": false},
            "env": {"fusion_alpha": 0.5},
            "avg_ms": {"total": 41.3},
            "avg_routes_ms": {"/api/docs": 3.0}
        }))
        .unwrap();
        let text = format_corpus(&stats);
        assert!(text.starts_with("📚 12 documents, 340 chunks (338 embedded), 9 OCR pages\n"));
        assert!(text.contains("features: pg_trgm\n"));
        assert!(text.contains("env: fusion_alpha=0.5"));
        assert!(text.contains("avg 41.3 ms per route"));
        assert!(text.contains("/api/docs  3.0 ms"));
        assert!(!text.contains("errors"));
    }

    #[test]
    fn meta_flags_missing_embeddings() {
        let full = DocMeta { doc_id: "d1".into(), chunks: 20, embeds: 20, ocr_pages: 4 };
        assert_eq!(format_meta(&full), "📄 d1: 20 chunks, 20 embedded, 4 OCR pages\n");
        let partial = DocMeta { embeds: 17, ..full };
        assert!(format_meta(&partial).ends_with("⚠️  3 chunks without an embedding\n"));
    }

    #[test]
    fn hits_without_chunk_index_print_a_dash() {
        let highlighter = Highlighter::new(&QueryTerms::parse("pension", &SynonymTable::builtin()), true).unwrap();
        let hit = |chunk_index| MatchHit { chunk_index, score: Some(0.5), preview: "pension table".into(), char_count: None, kind: HitKind::Keyword };
        let cursor = PassageCursor { offset: 2, has_more: false, page_size: 10 };
        let text = format_passages("d1", &[hit(None), hit(Some(7))], cursor, &highlighter, Render::Marked);
        assert!(text.contains("kw  0.500 #-    **pension** table"));
        assert!(text.contains("kw  0.500 #7    **pension** table"));
    }

    #[test]
    fn superseded_note_names_the_query() {
        assert_eq!(superseded_note("pension"), "⚠️  Search for \"pension\" superseded");
    }

    #[test]
    fn stats_line() {
        let stats = QueryStats { elapsed_ms: 42, docs_scanned: 10, docs_matched: 3, hits: 5, keyword_hits: 2, synonym_hits: 1, semantic_hits: 2 };
        assert_eq!(format_stats(SearchMode::Keyword, &stats), "📊 keyword: 5 hits in 3/10 documents (2 kw, 1 syn, 2 sem) in 42 ms");
    }
}
