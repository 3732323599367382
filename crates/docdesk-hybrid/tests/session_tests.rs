mod common;

use common::{passage, row, StubBackend};
use docdesk_core::settings::{Settings, SettingsStore};
use docdesk_core::types::{DocFilter, SearchMode};
use docdesk_hybrid::{SearchRequest, SearchSession, SearchStatus};

fn request(query: &str, mode: SearchMode) -> SearchRequest {
    SearchRequest { query: query.into(), mode, filter: DocFilter::default(), include_semantic: true, synonyms_enabled: true, boost: true }
}

fn corpus() -> StubBackend {
    StubBackend::new()
        .with_doc("kw-doc", vec![passage(0, Some(0.2), "leave policy for staff")])
        .with_rows(vec![row("sem-doc", 0, 0.6, "annual leave"), row("kw-doc", 1, 0.4, "policy")])
}

#[tokio::test]
async fn superseded_search_never_publishes() -> anyhow::Result<()> {
    let backend = corpus().with_delay("slow leave", 60);
    let store = SettingsStore::new(Settings::default());
    let session = SearchSession::new(backend, store.subscribe());
    let mut updates = session.subscribe();

    let (slow, fast) = futures::join!(
        session.search_with(request("slow leave", SearchMode::Hybrid)),
        session.search_with(request("leave", SearchMode::Hybrid)),
    );
    assert!(matches!(slow?, SearchStatus::Superseded));
    assert!(matches!(fast?, SearchStatus::Published(_)));
    assert_eq!(session.latest().unwrap().query, "leave");

    assert!(updates.has_changed()?);
    assert_eq!(updates.borrow_and_update().as_ref().unwrap().query, "leave");
    Ok(())
}

#[tokio::test]
async fn mode_switch_replaces_previous_bag() -> anyhow::Result<()> {
    let session = SearchSession::new(corpus(), SettingsStore::new(Settings::default()).subscribe());
    session.search_with(request("leave", SearchMode::Hybrid)).await?;
    let hybrid = session.latest().unwrap();
    assert!(hybrid.bag.contains("sem-doc"));

    session.search_with(request("leave", SearchMode::Keyword)).await?;
    let keyword = session.latest().unwrap();
    assert_eq!(keyword.mode, SearchMode::Keyword);
    assert!(!keyword.bag.contains("sem-doc"));
    assert_eq!(keyword.bag.doc_ids(), &["kw-doc".to_string()]);
    // the earlier outcome is untouched
    assert!(hybrid.bag.contains("sem-doc"));
    Ok(())
}

#[tokio::test]
async fn failed_search_keeps_published_outcome() -> anyhow::Result<()> {
    let mut backend = corpus();
    backend.failing_queries.insert("boom".into());
    let session = SearchSession::new(backend, SettingsStore::new(Settings::default()).subscribe());
    session.search_with(request("leave", SearchMode::Hybrid)).await?;
    assert!(session.search_with(request("boom", SearchMode::Hybrid)).await.is_err());
    assert_eq!(session.latest().unwrap().query, "leave");
    Ok(())
}

#[tokio::test]
async fn search_follows_settings_changes() -> anyhow::Result<()> {
    let store = SettingsStore::new(Settings::default());
    let session = SearchSession::new(corpus(), store.subscribe());

    session.search("leave", DocFilter::default()).await?;
    assert_eq!(session.latest().unwrap().mode, SearchMode::Hybrid);
    assert!(!session.backend().called("list_docs"));

    assert!(store.update(|s| s.search.mode = SearchMode::Keyword));
    session.search("leave", DocFilter::default()).await?;
    assert_eq!(session.latest().unwrap().mode, SearchMode::Keyword);
    assert!(session.backend().called("list_docs"));
    Ok(())
}

#[tokio::test]
async fn clear_drops_outcome() -> anyhow::Result<()> {
    let session = SearchSession::new(corpus(), SettingsStore::new(Settings::default()).subscribe());
    session.search_with(request("leave", SearchMode::Hybrid)).await?;
    session.clear();
    assert!(session.latest().is_none());
    Ok(())
}
