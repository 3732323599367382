//! LLM document summary with operator cancel.
//!
//! The LLM call runs under an [`AbortRegistration`]. Aborting it, an LLM
//! error, a `"fallback"` status or an empty summary all switch to the
//! semantic stitch summary, which is cheap and never calls the model.

use futures::future::{AbortRegistration, Abortable};
use tracing::{info, warn};

use docdesk_core::error::Result;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{LlmSummaryMeta, LlmSummaryRequest};

/// Chunks stitched for the semantic fallback.
pub const FALLBACK_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    Llm,
    SemanticFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocSummary {
    pub text: String,
    pub source: SummarySource,
    pub meta: Option<LlmSummaryMeta>,
    /// Why the fallback was used.
    pub note: Option<String>,
}

pub async fn summarize<B: DocsBackend + ?Sized>(backend: &B, doc_id: &str, request: &LlmSummaryRequest, abort: AbortRegistration) -> Result<DocSummary> {
    let note = match Abortable::new(backend.llm_summary(doc_id, request), abort).await {
        Ok(Ok(s)) if s.meta.status != "fallback" && !s.summary.trim().is_empty() => {
            info!(doc_id, k_used = s.meta.k_used, took_ms = s.meta.took_ms, "llm summary");
            return Ok(DocSummary { text: s.summary, source: SummarySource::Llm, meta: Some(s.meta), note: None });
        }
        Ok(Ok(s)) if s.summary.trim().is_empty() => "LLM returned an empty summary".to_string(),
        Ok(Ok(s)) => format!("LLM reported status '{}'", s.meta.status),
        Ok(Err(e)) => { warn!(doc_id, error = %e, "llm summary failed"); format!("LLM summary failed: {}", e.note()) }
        Err(_aborted) => "LLM summary cancelled".to_string(),
    };
    info!(doc_id, reason = %note, "falling back to semantic summary");
    let fallback = backend.semantic_summary(doc_id, FALLBACK_K).await?;
    Ok(DocSummary { text: fallback.text, source: SummarySource::SemanticFallback, meta: None, note: Some(note) })
}
