use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use docdesk_core::error::Result;
use docdesk_core::settings::Settings;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::DocFilter;
use docdesk_text::SynonymTable;

use crate::dispatch::{Dispatcher, SearchOutcome, SearchRequest};

#[derive(Debug, Clone)]
pub enum SearchStatus {
    Published(Arc<SearchOutcome>),
    /// A newer search started before this one finished; nothing was published.
    Superseded,
}

/// Runs searches and publishes only the newest one's outcome.
pub struct SearchSession<B: DocsBackend> {
    backend: B,
    settings: watch::Receiver<Settings>,
    generation: AtomicU64,
    latest: watch::Sender<Option<Arc<SearchOutcome>>>,
}

impl<B: DocsBackend> SearchSession<B> {
    pub fn new(backend: B, settings: watch::Receiver<Settings>) -> Self {
        let (latest, _) = watch::channel(None);
        Self { backend, settings, generation: AtomicU64::new(0), latest }
    }

    pub fn backend(&self) -> &B { &self.backend }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<SearchOutcome>>> { self.latest.subscribe() }

    pub fn latest(&self) -> Option<Arc<SearchOutcome>> { self.latest.borrow().clone() }

    /// Search with the current settings.
    pub async fn search(&self, query: &str, filter: DocFilter) -> Result<SearchStatus> {
        let req = SearchRequest::from_settings(query, &self.settings.borrow(), filter);
        self.search_with(req).await
    }

    pub async fn search_with(&self, req: SearchRequest) -> Result<SearchStatus> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let synonyms = SynonymTable::from_settings(&self.settings.borrow());
        let result = Dispatcher::new(&self.backend, synonyms).search(&req).await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, query = %req.query, "search superseded");
            return Ok(SearchStatus::Superseded);
        }
        let outcome = Arc::new(result?);
        self.latest.send_replace(Some(Arc::clone(&outcome)));
        Ok(SearchStatus::Published(outcome))
    }

    /// Drop the published outcome and supersede anything in flight.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.latest.send_replace(None);
    }
}
