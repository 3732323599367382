use tracing::{debug, warn};

use docdesk_core::error::Result;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{ChunkText, DocId, HitKind, MatchHit, PASSAGE_PAGE_SIZE};
use docdesk_text::{Highlighter, QueryTerms, Render, SynonymTable};

use crate::dispatch::filter_passages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageCursor {
    pub offset: usize,
    pub has_more: bool,
    pub page_size: usize,
}

impl Default for PassageCursor {
    fn default() -> Self { Self { offset: 0, has_more: true, page_size: PASSAGE_PAGE_SIZE } }
}

/// What one `fetch` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFetch {
    /// Passages the service returned.
    pub returned: usize,
    /// Passages that survived filtering.
    pub kept: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenedChunk {
    pub chunk: ChunkText,
    pub highlighted: String,
}

/// Passage view for one (document, query) pair with "load more".
pub struct PassagePager<'a, B: DocsBackend + ?Sized> {
    backend: &'a B,
    synonyms: SynonymTable,
    synonyms_enabled: bool,
    include_semantic: bool,
    doc_id: DocId,
    query: String,
    highlighter: Highlighter,
    cursor: PassageCursor,
    passages: Vec<MatchHit>,
}

impl<'a, B: DocsBackend + ?Sized> PassagePager<'a, B> {
    pub fn open(backend: &'a B, synonyms: SynonymTable, synonyms_enabled: bool, include_semantic: bool, doc_id: &str, query: &str) -> Result<Self> {
        let highlighter = Highlighter::new(&QueryTerms::parse(query, &synonyms), synonyms_enabled)?;
        Ok(Self {
            backend,
            synonyms,
            synonyms_enabled,
            include_semantic,
            doc_id: doc_id.to_string(),
            query: query.to_string(),
            highlighter,
            cursor: PassageCursor::default(),
            passages: Vec::new(),
        })
    }

    /// Point the pager at another (document, query) pair. Resets the cursor
    /// and passages when the pair changes; returns whether it did.
    pub fn select(&mut self, doc_id: &str, query: &str) -> Result<bool> {
        if self.doc_id == doc_id && self.query == query { return Ok(false); }
        self.highlighter = Highlighter::new(&QueryTerms::parse(query, &self.synonyms), self.synonyms_enabled)?;
        self.doc_id = doc_id.to_string();
        self.query = query.to_string();
        self.cursor = PassageCursor::default();
        self.passages.clear();
        Ok(true)
    }

    pub fn doc_id(&self) -> &str { &self.doc_id }

    pub fn query(&self) -> &str { &self.query }

    pub fn cursor(&self) -> PassageCursor { self.cursor }

    pub fn passages(&self) -> &[MatchHit] { &self.passages }

    pub fn highlighter(&self) -> &Highlighter { &self.highlighter }

    /// Fetch the first page (`append == false`) or the next one.
    pub async fn fetch(&mut self, append: bool) -> PageFetch {
        let offset = if append { self.cursor.offset } else { 0 };
        let page_size = self.cursor.page_size;
        match self.backend.passages(&self.doc_id, &self.query, page_size, offset).await {
            Ok(page) => {
                let returned = page.len();
                let hits = if self.query.trim().is_empty() {
                    page.into_iter().map(|p| MatchHit::from_passage(p, HitKind::Semantic)).collect()
                } else {
                    filter_passages(page, &self.highlighter, self.include_semantic)
                };
                let kept = hits.len();
                if append { self.passages.extend(hits); } else { self.passages = hits; }
                self.cursor.offset = offset + returned;
                self.cursor.has_more = returned > 0;
                debug!(doc_id = %self.doc_id, offset, returned, kept, "passage page");
                PageFetch { returned, kept, error: None }
            }
            Err(e) => {
                warn!(doc_id = %self.doc_id, offset, error = %e, "passage page failed");
                let text = e.to_string();
                self.cursor.has_more = false;
                if offset == 0 {
                    self.passages = vec![MatchHit { chunk_index: Some(-1), score: None, preview: text.clone(), char_count: None, kind: HitKind::Semantic }];
                }
                PageFetch { returned: 0, kept: 0, error: Some(text) }
            }
        }
    }

    /// Keep appending until the service runs dry, a page fails, or
    /// `max_pages` pages were requested.
    pub async fn load_all(&mut self, max_pages: usize) -> usize {
        let mut pages = 0;
        if self.cursor.offset == 0 && self.passages.is_empty() {
            pages += 1;
            if self.fetch(false).await.error.is_some() { return pages; }
        }
        while self.cursor.has_more && pages < max_pages {
            pages += 1;
            if self.fetch(true).await.error.is_some() { break; }
        }
        pages
    }

    /// Full text of one chunk, highlighted with the pager's query.
    pub async fn open_chunk(&self, chunk_index: i64, style: Render) -> Result<OpenedChunk> {
        let chunk = self.backend.chunk(&self.doc_id, chunk_index).await?;
        let highlighted = self.highlighter.render(&chunk.text, style);
        Ok(OpenedChunk { chunk, highlighted })
    }
}
