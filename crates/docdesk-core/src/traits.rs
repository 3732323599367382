use crate::error::Result;
use crate::types::{ChunkText, CorpusStats, DocFilter, DocMeta, DocPage, LlmSummary, LlmSummaryRequest, PassageHit, RankedEndpoint, SemRow, SemanticSummary};

/// The document service as seen by the console.
///
/// Futures are not required to be `Send`: the console runs on a single
/// cooperative thread.
#[async_trait::async_trait(?Send)]
pub trait DocsBackend {
    async fn health(&self) -> Result<serde_json::Value>;

    async fn stats(&self) -> Result<CorpusStats>;

    async fn list_docs(&self, filter: &DocFilter) -> Result<DocPage>;

    /// Chunk, embedding and OCR-page counts for one document.
    async fn doc_meta(&self, doc_id: &str) -> Result<DocMeta>;

    /// Passages of one document, ranked by the service when `query` is non-empty.
    async fn passages(&self, doc_id: &str, query: &str, limit: usize, offset: usize) -> Result<Vec<PassageHit>>;

    /// Corpus-wide ranked passages; `dept`/`lang` are taken from `filter`.
    async fn ranked(&self, endpoint: RankedEndpoint, query: &str, filter: &DocFilter, k: usize) -> Result<Vec<SemRow>>;

    async fn chunk(&self, doc_id: &str, chunk_index: i64) -> Result<ChunkText>;

    async fn semantic_summary(&self, doc_id: &str, k: usize) -> Result<SemanticSummary>;

    async fn llm_summary(&self, doc_id: &str, request: &LlmSummaryRequest) -> Result<LlmSummary>;
}
