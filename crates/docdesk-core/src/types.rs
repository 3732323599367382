//! Domain types shared by the client, the text helpers and the hybrid engine.
//!
//! Wire types (`DocRow`, `PassageHit`, `SemRow`, ...) mirror the JSON the
//! document service returns; domain types (`MatchHit`, `DocumentMatchBag`,
//! `QueryStats`) are built by this workspace and never come off the wire.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub type DocId = String;

/// Passages requested per page, both for keyword scans and the passage view.
pub const PASSAGE_PAGE_SIZE: usize = 10;
/// Similarity floor for hits that match neither a token nor a synonym.
pub const MIN_SEMANTIC_SCORE: f32 = 0.12;
/// Longest query the document service accepts.
pub const MAX_QUERY_LEN: usize = 512;

/// Reject queries the document service would refuse.
pub fn check_query_len(query: &str) -> crate::error::Result<()> {
    let len = query.chars().count();
    if len > MAX_QUERY_LEN { return Err(crate::error::Error::QueryTooLong { len, max: MAX_QUERY_LEN }); }
    Ok(())
}

/// SQL NULLs come through as JSON `null`; read them as the empty value.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Retrieval strategy picked by the operator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Keyword,
    Semantic,
    #[default]
    Hybrid,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self { Self::Keyword => "keyword", Self::Semantic => "semantic", Self::Hybrid => "hybrid" }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SearchMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "kw" => Ok(Self::Keyword),
            "semantic" | "sem" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown search mode '{other}'"))),
        }
    }
}

/// Corpus-wide ranked endpoints of the document service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankedEndpoint {
    Semantic,
    Hybrid,
}

impl RankedEndpoint {
    pub fn path(self) -> &'static str {
        match self { Self::Semantic => "/api/search/semantic", Self::Hybrid => "/api/search/hybrid" }
    }
}

/// Filters for the document listing. Empty fields are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFilter {
    pub dept: Option<String>,
    pub lang: Option<String>,
    pub doc_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: usize,
    pub page: usize,
}

impl Default for DocFilter {
    fn default() -> Self {
        Self { dept: None, lang: None, doc_type: None, from: None, to: None, limit: 10, page: 1 }
    }
}

impl DocFilter {
    /// Query-string pairs for `GET /api/docs`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let optional = [("dept", &self.dept), ("lang", &self.lang), ("type", &self.doc_type), ("from", &self.from), ("to", &self.to)];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) { out.push((key, v.to_string())); }
        }
        out.push(("limit", self.limit.max(1).to_string()));
        out.push(("page", self.page.max(1).to_string()));
        out
    }
}

/// One row of `GET /api/docs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocRow {
    pub doc_id: DocId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Pipeline stage badges (pdf, ocr, chunks, ...), shown as-is.
    #[serde(default)]
    pub stages: serde_json::Value,
}

impl DocRow {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.doc_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub items: Vec<DocRow>,
}

/// A passage returned by `GET /api/docs/{id}/passages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassageHit {
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: String,
    #[serde(default)]
    pub chars: Option<u64>,
}

/// A corpus-wide hit from the semantic or hybrid endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemRow {
    pub doc_id: DocId,
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: String,
    #[serde(default)]
    pub chars: Option<u64>,
}

impl From<SemRow> for PassageHit {
    fn from(r: SemRow) -> Self {
        Self { chunk_index: r.chunk_index, score: r.score, preview: r.preview, chars: r.chars }
    }
}

/// Full text of one chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkText {
    pub chunk_index: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub has_embed: Option<bool>,
    #[serde(default)]
    pub chars: Option<u64>,
}

/// Row counts reported by `GET /api/stats`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorpusCounts {
    pub documents: u64,
    pub chunks: u64,
    pub embeddings: u64,
    pub ocr_pages: u64,
    pub sem_summaries: u64,
    pub llm_summaries: u64,
}

/// Corpus overview from `GET /api/stats`. Missing sections decode empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorpusStats {
    pub uptime_ms: u64,
    pub counts: CorpusCounts,
    /// Capability flags (pgvector, pg_trgm, ...).
    pub features: BTreeMap<String, bool>,
    /// Retrieval tuning the service runs with, shown as-is.
    pub env: BTreeMap<String, serde_json::Value>,
    /// Rolling latency per stage; `total` averages the routes.
    pub avg_ms: BTreeMap<String, f64>,
    pub avg_routes_ms: BTreeMap<String, f64>,
    pub errors_24h: u64,
}

/// Per-document pipeline counts from `GET /api/docs/{id}/meta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocMeta {
    pub doc_id: DocId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub embeds: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ocr_pages: u64,
}

impl DocMeta {
    /// Chunks still waiting for an embedding.
    pub fn unembedded(&self) -> u64 { self.chunks.saturating_sub(self.embeds) }
}

/// Stitched first-chunks summary from `GET /api/docs/{id}/summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SemanticSummary {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub k: u32,
    #[serde(default)]
    pub probes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmOverrides {
    pub topk: u32,
    pub percent_cap: u32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmOverrides {
    fn default() -> Self { Self { topk: 6, percent_cap: 100, max_tokens: 768, timeout_ms: 60_000 } }
}

/// Body of `POST /api/docs/{id}/llm_summarize/preview_v2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmSummaryRequest {
    pub style: String,
    pub lang: String,
    pub overrides: LlmOverrides,
}

impl Default for LlmSummaryRequest {
    fn default() -> Self { Self { style: "bullet".into(), lang: "en".into(), overrides: LlmOverrides::default() } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmSummaryMeta {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub k_used: u32,
    #[serde(default)]
    pub took_ms: u64,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub meta: LlmSummaryMeta,
}

/// How a passage relates to the query. Decided client-side, never taken
/// from upstream labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Keyword,
    Synonym,
    Semantic,
}

impl HitKind {
    pub fn as_str(self) -> &'static str {
        match self { Self::Keyword => "keyword", Self::Synonym => "synonym", Self::Semantic => "semantic" }
    }
}

impl fmt::Display for HitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A classified passage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchHit {
    /// `None` when the service has no index column for this chunk; such a
    /// hit cannot be opened.
    pub chunk_index: Option<i64>,
    pub score: Option<f32>,
    pub preview: String,
    pub char_count: Option<u64>,
    pub kind: HitKind,
}

impl MatchHit {
    pub fn from_passage(p: PassageHit, kind: HitKind) -> Self {
        Self { chunk_index: p.chunk_index, score: p.score, preview: p.preview, char_count: p.chars, kind }
    }

    /// Score used for ordering; hits without one sort as zero.
    pub fn score_or_zero(&self) -> f32 { self.score.unwrap_or(0.0) }
}

/// Matched documents in relevance order, each with its hits.
///
/// Insertion order is kept; re-inserting an existing document replaces its
/// hits in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMatchBag {
    order: Vec<DocId>,
    hits: HashMap<DocId, Vec<MatchHit>>,
}

impl DocumentMatchBag {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, doc_id: DocId, hits: Vec<MatchHit>) {
        if !self.hits.contains_key(&doc_id) { self.order.push(doc_id.clone()); }
        self.hits.insert(doc_id, hits);
    }

    pub fn push(&mut self, doc_id: &str, hit: MatchHit) {
        match self.hits.get_mut(doc_id) {
            Some(v) => v.push(hit),
            None => { self.order.push(doc_id.to_string()); self.hits.insert(doc_id.to_string(), vec![hit]); }
        }
    }

    pub fn get(&self, doc_id: &str) -> Option<&[MatchHit]> { self.hits.get(doc_id).map(Vec::as_slice) }

    pub fn get_mut(&mut self, doc_id: &str) -> Option<&mut Vec<MatchHit>> { self.hits.get_mut(doc_id) }

    pub fn contains(&self, doc_id: &str) -> bool { self.hits.contains_key(doc_id) }

    pub fn doc_ids(&self) -> &[DocId] { &self.order }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MatchHit])> {
        self.order.iter().filter_map(|id| self.hits.get(id).map(|h| (id.as_str(), h.as_slice())))
    }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn total_hits(&self) -> usize { self.hits.values().map(Vec::len).sum() }

    pub fn count_kind(&self, kind: HitKind) -> usize {
        self.hits.values().flatten().filter(|h| h.kind == kind).count()
    }
}

/// Per-search snapshot for display and telemetry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryStats {
    pub elapsed_ms: u64,
    pub docs_scanned: usize,
    pub docs_matched: usize,
    pub hits: usize,
    pub keyword_hits: usize,
    pub synonym_hits: usize,
    pub semantic_hits: usize,
}

impl QueryStats {
    pub fn from_bag(bag: &DocumentMatchBag, docs_scanned: usize, elapsed_ms: u64) -> Self {
        Self {
            elapsed_ms,
            docs_scanned,
            docs_matched: bag.len(),
            hits: bag.total_hits(),
            keyword_hits: bag.count_kind(HitKind::Keyword),
            synonym_hits: bag.count_kind(HitKind::Synonym),
            semantic_hits: bag.count_kind(HitKind::Semantic),
        }
    }
}
