#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use docdesk_core::error::{Error, Result};
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{
    ChunkText, CorpusCounts, CorpusStats, DocFilter, DocMeta, DocPage, DocRow, LlmSummary, LlmSummaryMeta, LlmSummaryRequest, PassageHit, RankedEndpoint, SemRow, SemanticSummary,
};

/// In-memory document service. Every call is recorded in `calls`.
#[derive(Default)]
pub struct StubBackend {
    pub docs: Vec<DocRow>,
    pub passages: HashMap<String, Vec<PassageHit>>,
    pub rows: Vec<SemRow>,
    pub chunks: HashMap<(String, i64), String>,
    pub failing_docs: RefCell<HashSet<String>>,
    pub failing_queries: HashSet<String>,
    pub malformed_listing: bool,
    pub malformed_ranked: bool,
    /// Keyed by query, or by doc id for passage lookups.
    pub delays_ms: HashMap<String, u64>,
    pub llm: Option<LlmSummary>,
    pub llm_delay_ms: u64,
    pub calls: RefCell<Vec<String>>,
}

pub fn doc(id: &str) -> DocRow {
    DocRow { doc_id: id.into(), title: Some(format!("Title {id}")), dept: None, lang: None, doc_type: None, created_at: None, stages: serde_json::Value::Null }
}

pub fn passage(chunk_index: i64, score: Option<f32>, preview: &str) -> PassageHit {
    PassageHit { chunk_index: Some(chunk_index), score, preview: preview.into(), chars: Some(preview.len() as u64) }
}

pub fn row(doc_id: &str, chunk_index: i64, score: f32, preview: &str) -> SemRow {
    SemRow { doc_id: doc_id.into(), chunk_index: Some(chunk_index), score: Some(score), preview: preview.into(), chars: None }
}

pub fn llm(summary: &str, status: &str) -> LlmSummary {
    LlmSummary { summary: summary.into(), meta: LlmSummaryMeta { status: status.into(), k_used: 6, took_ms: 1200, lang: Some("en".into()) } }
}

impl StubBackend {
    pub fn new() -> Self { Self::default() }

    pub fn with_doc(mut self, id: &str, passages: Vec<PassageHit>) -> Self {
        self.docs.push(doc(id));
        self.passages.insert(id.into(), passages);
        self
    }

    pub fn with_rows(mut self, rows: Vec<SemRow>) -> Self { self.rows = rows; self }

    pub fn with_delay(mut self, key: &str, ms: u64) -> Self { self.delays_ms.insert(key.into(), ms); self }

    pub fn fail_doc(&self, id: &str) { self.failing_docs.borrow_mut().insert(id.into()); }

    pub fn calls(&self) -> Vec<String> { self.calls.borrow().clone() }

    pub fn called(&self, prefix: &str) -> bool { self.calls.borrow().iter().any(|c| c.starts_with(prefix)) }

    fn log(&self, call: String) { self.calls.borrow_mut().push(call); }

    async fn delay_for(&self, key: &str) {
        if let Some(ms) = self.delays_ms.get(key) { tokio::time::sleep(Duration::from_millis(*ms)).await; }
    }
}

#[async_trait::async_trait(?Send)]
impl DocsBackend for StubBackend {
    async fn health(&self) -> Result<serde_json::Value> {
        self.log("health".into());
        Ok(serde_json::json!({"ok": true}))
    }

    async fn stats(&self) -> Result<CorpusStats> {
        self.log("stats".into());
        let chunks = self.passages.values().map(Vec::len).sum::<usize>() as u64;
        Ok(CorpusStats { counts: CorpusCounts { documents: self.docs.len() as u64, chunks, embeddings: chunks, ..CorpusCounts::default() }, ..CorpusStats::default() })
    }

    async fn doc_meta(&self, doc_id: &str) -> Result<DocMeta> {
        self.log(format!("doc_meta:{doc_id}"));
        let chunks = self.passages.get(doc_id).ok_or_else(|| Error::NotFound(format!("/api/docs/{doc_id}/meta")))?.len() as u64;
        Ok(DocMeta { doc_id: doc_id.into(), chunks, embeds: chunks, ocr_pages: 0 })
    }

    async fn list_docs(&self, filter: &DocFilter) -> Result<DocPage> {
        self.log("list_docs".into());
        if self.malformed_listing {
            return Err(Error::Decode { endpoint: "/api/docs".into(), note: "not JSON".into() });
        }
        Ok(DocPage { total: self.docs.len() as u64, page: filter.page, limit: filter.limit, items: self.docs.clone() })
    }

    async fn passages(&self, doc_id: &str, query: &str, limit: usize, offset: usize) -> Result<Vec<PassageHit>> {
        self.log(format!("passages:{doc_id}:{offset}"));
        self.delay_for(query).await;
        self.delay_for(doc_id).await;
        if self.failing_docs.borrow().contains(doc_id) {
            return Err(Error::Transport { endpoint: format!("/api/docs/{doc_id}/passages"), reason: "connection reset".into() });
        }
        let all = self.passages.get(doc_id).map(Vec::as_slice).unwrap_or_default();
        Ok(all.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn ranked(&self, endpoint: RankedEndpoint, query: &str, _filter: &DocFilter, k: usize) -> Result<Vec<SemRow>> {
        self.log(format!("ranked:{}:k={k}", endpoint.path()));
        self.delay_for(query).await;
        if self.failing_queries.contains(query) {
            return Err(Error::Transport { endpoint: endpoint.path().into(), reason: "connection refused".into() });
        }
        if self.malformed_ranked {
            return Err(Error::Decode { endpoint: endpoint.path().into(), note: "expected array, got object".into() });
        }
        Ok(self.rows.iter().take(k).cloned().collect())
    }

    async fn chunk(&self, doc_id: &str, chunk_index: i64) -> Result<ChunkText> {
        self.log(format!("chunk:{doc_id}:{chunk_index}"));
        let text = self.chunks.get(&(doc_id.to_string(), chunk_index)).ok_or_else(|| Error::NotFound(format!("{doc_id}#{chunk_index}")))?;
        Ok(ChunkText { chunk_index, text: text.clone(), has_embed: Some(true), chars: Some(text.len() as u64) })
    }

    async fn semantic_summary(&self, doc_id: &str, k: usize) -> Result<SemanticSummary> {
        self.log(format!("semantic_summary:{doc_id}:k={k}"));
        Ok(SemanticSummary { source: "semantic".into(), text: format!("first {k} chunks of {doc_id}"), k: k as u32, probes: 0 })
    }

    async fn llm_summary(&self, doc_id: &str, _request: &LlmSummaryRequest) -> Result<LlmSummary> {
        self.log(format!("llm_summary:{doc_id}"));
        if self.llm_delay_ms > 0 { tokio::time::sleep(Duration::from_millis(self.llm_delay_ms)).await; }
        self.llm.clone().ok_or_else(|| Error::Status { endpoint: format!("/api/docs/{doc_id}/llm_summarize/preview_v2"), code: 503 })
    }
}
