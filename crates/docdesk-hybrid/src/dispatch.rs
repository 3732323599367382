use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use docdesk_core::error::Result;
use docdesk_core::settings::Settings;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{
    check_query_len, DocFilter, DocumentMatchBag, MatchHit, PassageHit, QueryStats, RankedEndpoint, SearchMode, MIN_SEMANTIC_SCORE,
    PASSAGE_PAGE_SIZE,
};
use docdesk_text::{Highlighter, QueryTerms, SynonymTable};

use crate::rank::{rank_documents, reorder, service_order, sort_hits, RankedDoc};

/// Size of the corpus-wide ranked request for a listing page of `page_size`.
pub fn ranked_k(page_size: usize) -> usize { page_size.saturating_mul(5).clamp(10, 200) }

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub mode: SearchMode,
    pub filter: DocFilter,
    pub include_semantic: bool,
    pub synonyms_enabled: bool,
    pub boost: bool,
}

impl SearchRequest {
    pub fn from_settings(query: &str, settings: &Settings, filter: DocFilter) -> Self {
        Self {
            query: query.to_string(),
            mode: settings.search.mode,
            filter,
            include_semantic: settings.search.include_semantic,
            synonyms_enabled: settings.search.synonyms_enabled,
            boost: settings.search.boost,
        }
    }
}

/// Everything one search produced. Built fresh per search, never patched.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub mode: SearchMode,
    pub terms: QueryTerms,
    /// Iterates in `ranking` order.
    pub bag: DocumentMatchBag,
    pub ranking: Vec<RankedDoc>,
    pub stats: QueryStats,
    /// Operator-facing notes about degraded results.
    pub notes: Vec<String>,
}

impl SearchOutcome {
    fn empty(req: &SearchRequest, terms: QueryTerms) -> Self {
        Self { query: req.query.clone(), mode: req.mode, terms, bag: DocumentMatchBag::new(), ranking: Vec::new(), stats: QueryStats::default(), notes: Vec::new() }
    }
}

/// Keep a passage when its text matches, or when it clears the similarity
/// floor and semantic hits are wanted.
pub fn keep_passage(p: &PassageHit, highlighter: &Highlighter, include_semantic: bool) -> bool {
    highlighter.matches_text(&p.preview) || (include_semantic && p.score.is_some_and(|s| s >= MIN_SEMANTIC_SCORE))
}

/// Filter and classify one document's passages (keyword-branch rules).
pub fn filter_passages(passages: Vec<PassageHit>, highlighter: &Highlighter, include_semantic: bool) -> Vec<MatchHit> {
    passages
        .into_iter()
        .filter(|p| keep_passage(p, highlighter, include_semantic))
        .map(|p| { let kind = highlighter.classify(&p.preview); MatchHit::from_passage(p, kind) })
        .collect()
}

pub struct Dispatcher<'a, B: DocsBackend + ?Sized> {
    backend: &'a B,
    synonyms: SynonymTable,
}

impl<'a, B: DocsBackend + ?Sized> Dispatcher<'a, B> {
    pub fn new(backend: &'a B, synonyms: SynonymTable) -> Self { Self { backend, synonyms } }

    pub async fn search(&self, req: &SearchRequest) -> Result<SearchOutcome> {
        check_query_len(&req.query)?;
        let started = Instant::now();
        let terms = QueryTerms::parse(&req.query, &self.synonyms);
        if req.query.trim().is_empty() { return Ok(SearchOutcome::empty(req, terms)); }
        let highlighter = Highlighter::new(&terms, req.synonyms_enabled)?;

        let (bag, docs_scanned, notes) = match req.mode {
            SearchMode::Keyword => self.keyword(req, &highlighter).await?,
            SearchMode::Semantic => self.ranked(RankedEndpoint::Semantic, req, &highlighter).await?,
            SearchMode::Hybrid => self.ranked(RankedEndpoint::Hybrid, req, &highlighter).await?,
        };
        let ranking = match req.mode {
            SearchMode::Semantic => service_order(&bag),
            SearchMode::Keyword | SearchMode::Hybrid => rank_documents(&bag, req.boost),
        };
        let bag = reorder(bag, &ranking);
        let stats = QueryStats::from_bag(&bag, docs_scanned, started.elapsed().as_millis().try_into().unwrap_or(u64::MAX));
        info!(
            mode = %req.mode, query = %req.query, docs_scanned = stats.docs_scanned, docs_matched = stats.docs_matched,
            hits = stats.hits, keyword = stats.keyword_hits, synonym = stats.synonym_hits, semantic = stats.semantic_hits,
            elapsed_ms = stats.elapsed_ms, "search complete"
        );
        Ok(SearchOutcome { query: req.query.clone(), mode: req.mode, terms, bag, ranking, stats, notes })
    }

    /// One passage lookup per listed document, all in flight together.
    async fn keyword(&self, req: &SearchRequest, highlighter: &Highlighter) -> Result<(DocumentMatchBag, usize, Vec<String>)> {
        let mut notes = Vec::new();
        let page = match self.backend.list_docs(&req.filter).await {
            Ok(page) => page,
            Err(e) if e.is_decode() => { warn!(error = %e, "document listing unreadable"); notes.push(e.note()); return Ok((DocumentMatchBag::new(), 0, notes)); }
            Err(e) => return Err(e),
        };
        debug!(docs = page.items.len(), "scanning listed documents");

        let lookups = page.items.iter().map(|doc| async move {
            (doc.doc_id.as_str(), self.backend.passages(&doc.doc_id, &req.query, PASSAGE_PAGE_SIZE, 0).await)
        });
        let settled = join_all(lookups).await;

        let mut bag = DocumentMatchBag::new();
        let mut failed = 0usize;
        for (doc_id, result) in settled {
            match result {
                Ok(passages) => {
                    let mut hits = filter_passages(passages, highlighter, req.include_semantic);
                    if hits.is_empty() { continue; }
                    sort_hits(&mut hits);
                    bag.insert(doc_id.to_string(), hits);
                }
                Err(e) => { warn!(doc_id, error = %e, "passage lookup failed; counting as no hits"); failed += 1; }
            }
        }
        if failed > 0 { notes.push(format!("{failed} of {} documents could not be searched", page.items.len())); }
        Ok((bag, page.items.len(), notes))
    }

    /// One corpus-wide request, grouped by document in service order.
    async fn ranked(&self, endpoint: RankedEndpoint, req: &SearchRequest, highlighter: &Highlighter) -> Result<(DocumentMatchBag, usize, Vec<String>)> {
        let mut notes = Vec::new();
        let k = ranked_k(req.filter.limit);
        let rows = match self.backend.ranked(endpoint, &req.query, &req.filter, k).await {
            Ok(rows) => rows,
            Err(e) if e.is_decode() => { warn!(error = %e, "ranked results unreadable"); notes.push(e.note()); Vec::new() }
            Err(e) => return Err(e),
        };
        debug!(rows = rows.len(), k, endpoint = endpoint.path(), "ranked results");

        let mut bag = DocumentMatchBag::new();
        for row in rows {
            let doc_id = row.doc_id.clone();
            let kind = highlighter.classify(&row.preview);
            bag.push(&doc_id, MatchHit::from_passage(row.into(), kind));
        }
        for id in bag.doc_ids().to_vec() {
            if let Some(hits) = bag.get_mut(&id) { sort_hits(hits); }
        }
        let scanned = bag.len();
        Ok((bag, scanned, notes))
    }
}
