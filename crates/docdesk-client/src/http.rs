use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::debug;

use docdesk_core::error::{Error, Result};
use docdesk_core::settings::BackendSettings;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{
    check_query_len, ChunkText, CorpusStats, DocFilter, DocMeta, DocPage, LlmSummary, LlmSummaryRequest, PassageHit, RankedEndpoint, SemRow, SemanticSummary,
};

use crate::decode;

/// Extra time granted on top of the LLM's own server-side timeout.
const LLM_GRACE: Duration = Duration::from_secs(5);

/// Document service over HTTP. One pooled `reqwest::Client` per backend.
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let base = Url::parse(settings.base_url.trim())
            .map_err(|e| Error::InvalidConfig(format!("backend.base_url '{}': {e}", settings.base_url)))?;
        if base.cannot_be_a_base() { return Err(Error::InvalidConfig(format!("backend.base_url '{base}' cannot be a base URL"))); }
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_millis(settings.timeout_ms.max(1)))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    async fn send(&self, label: &str, req: RequestBuilder) -> Result<Value> {
        let started = Instant::now();
        let resp = req.send().await.map_err(|e| Error::Transport { endpoint: label.to_string(), reason: e.to_string() })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Transport { endpoint: label.to_string(), reason: e.to_string() })?;
        debug!(endpoint = label, status = status.as_u16(), bytes = body.len(), elapsed_ms = started.elapsed().as_millis() as u64, "backend call");
        if status == reqwest::StatusCode::NOT_FOUND { return Err(Error::NotFound(label.to_string())); }
        if !status.is_success() { return Err(Error::Status { endpoint: label.to_string(), code: status.as_u16() }); }
        decode::parse_body(label, &body)
    }

    async fn get(&self, label: &str, segments: &[&str], query: &[(&str, String)]) -> Result<Value> {
        let req = self.client.get(self.endpoint(segments)).query(query);
        self.send(label, req).await
    }
}

#[async_trait::async_trait(?Send)]
impl DocsBackend for HttpBackend {
    async fn health(&self) -> Result<Value> { self.get("/health", &["health"], &[]).await }

    async fn stats(&self) -> Result<CorpusStats> {
        let v = self.get("/api/stats", &["api", "stats"], &[]).await?;
        decode::decode("/api/stats", v)
    }

    async fn list_docs(&self, filter: &DocFilter) -> Result<DocPage> {
        let v = self.get("/api/docs", &["api", "docs"], &filter.query_pairs()).await?;
        decode::decode("/api/docs", v)
    }

    async fn doc_meta(&self, doc_id: &str) -> Result<DocMeta> {
        let label = format!("/api/docs/{doc_id}/meta");
        let v = self.get(&label, &["api", "docs", doc_id, "meta"], &[]).await?;
        decode::decode(&label, v)
    }

    async fn passages(&self, doc_id: &str, query: &str, limit: usize, offset: usize) -> Result<Vec<PassageHit>> {
        check_query_len(query)?;
        let label = format!("/api/docs/{doc_id}/passages");
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if !query.trim().is_empty() { params.push(("q", query.to_string())); }
        let v = self.get(&label, &["api", "docs", doc_id, "passages"], &params).await?;
        decode::passages(&label, v)
    }

    async fn ranked(&self, endpoint: RankedEndpoint, query: &str, filter: &DocFilter, k: usize) -> Result<Vec<SemRow>> {
        check_query_len(query)?;
        let label = endpoint.path();
        let mode = match endpoint { RankedEndpoint::Semantic => "semantic", RankedEndpoint::Hybrid => "hybrid" };
        let mut params = vec![("q", query.to_string()), ("k", k.to_string())];
        for (key, value) in [("dept", &filter.dept), ("lang", &filter.lang)] {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) { params.push((key, v.to_string())); }
        }
        let v = self.get(label, &["api", "search", mode], &params).await?;
        decode::sem_rows(label, v)
    }

    async fn chunk(&self, doc_id: &str, chunk_index: i64) -> Result<ChunkText> {
        let label = format!("/api/docs/{doc_id}/chunk/{chunk_index}");
        let idx = chunk_index.to_string();
        let v = self.get(&label, &["api", "docs", doc_id, "chunk", &idx], &[]).await?;
        decode::decode(&label, v)
    }

    async fn semantic_summary(&self, doc_id: &str, k: usize) -> Result<SemanticSummary> {
        let label = format!("/api/docs/{doc_id}/summary");
        let params = [("mode", "semantic".to_string()), ("k", k.to_string())];
        let v = self.get(&label, &["api", "docs", doc_id, "summary"], &params).await?;
        decode::decode(&label, v)
    }

    async fn llm_summary(&self, doc_id: &str, request: &LlmSummaryRequest) -> Result<LlmSummary> {
        let label = format!("/api/docs/{doc_id}/llm_summarize/preview_v2");
        let url = self.endpoint(&["api", "docs", doc_id, "llm_summarize", "preview_v2"]);
        let req = self.client.post(url).json(request).timeout(Duration::from_millis(request.overrides.timeout_ms) + LLM_GRACE);
        let v = self.send(&label, req).await?;
        decode::decode(&label, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&BackendSettings { base_url: base.into(), ..BackendSettings::default() }).unwrap()
    }

    #[test]
    fn endpoint_encodes_doc_ids() {
        let b = backend("http://localhost:8000/");
        let url = b.endpoint(&["api", "docs", "HR/2024 policy", "passages"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/docs/HR%2F2024%20policy/passages");
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let b = backend("http://proxy.local/docsvc");
        assert_eq!(b.endpoint(&["health"]).as_str(), "http://proxy.local/docsvc/health");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(HttpBackend::new(&BackendSettings { base_url: "not a url".into(), ..BackendSettings::default() }).is_err());
        assert!(HttpBackend::new(&BackendSettings { base_url: "mailto:ops@example.com".into(), ..BackendSettings::default() }).is_err());
    }

    #[tokio::test]
    async fn overlong_query_fails_before_any_request() {
        let b = backend("http://127.0.0.1:9");
        let q = "x".repeat(600);
        let err = b.passages("d1", &q, 10, 0).await.unwrap_err();
        assert!(matches!(err, Error::QueryTooLong { len: 600, .. }));
    }
}
