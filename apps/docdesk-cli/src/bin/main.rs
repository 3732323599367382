use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use futures::future::AbortHandle;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use docdesk_cli::output;
use docdesk_client::HttpBackend;
use docdesk_core::config::Config;
use docdesk_core::settings::SettingsStore;
use docdesk_core::traits::DocsBackend;
use docdesk_core::types::{DocFilter, LlmOverrides, LlmSummaryRequest, SearchMode};
use docdesk_hybrid::{summarize, PassagePager, SearchSession, SearchStatus};
use docdesk_text::{Highlighter, SynonymTable};

/// Operator console for the document service.
#[derive(Parser)]
#[command(name = "docdesk", version, about)]
struct Cli {
    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Document service URL (overrides backend.base_url for this run)
    #[arg(long, global = true, env = "DOCDESK_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List documents
    Docs(FilterArgs),
    /// Search the corpus
    Search {
        query: String,
        /// keyword | semantic | hybrid
        #[arg(short, long)]
        mode: Option<SearchMode>,
        /// Drop hits that only clear the similarity floor
        #[arg(long)]
        no_semantic: bool,
        #[arg(long)]
        no_synonyms: bool,
        /// Rank documents on raw score only
        #[arg(long)]
        no_boost: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Page through one document's passages
    Passages {
        doc_id: String,
        #[arg(short, long)]
        query: Option<String>,
        /// Pages of 10 to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show one chunk in full
    Chunk {
        doc_id: String,
        index: i64,
        /// Highlight this query in the chunk
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Summarize a document with the LLM (Ctrl-C falls back to the quick summary)
    Summary {
        doc_id: String,
        #[arg(long, default_value = "bullet")]
        style: String,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long, default_value_t = 6)]
        topk: u32,
        #[arg(long, default_value_t = 100)]
        percent_cap: u32,
        #[arg(long, default_value_t = 768)]
        max_tokens: u32,
        #[arg(long, default_value_t = 60_000)]
        timeout_ms: u64,
        /// Give up on the LLM after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,
    },
    /// Show or change operator settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Corpus counts, features and route latency
    Stats,
    /// Chunk, embedding and OCR-page counts for one document
    Meta { doc_id: String },
    /// Check the document service
    Health,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    /// Set a dotted key, e.g. `search.mode keyword`
    Set { key: String, value: String },
    /// Drop all saved overrides
    Reset,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    dept: Option<String>,
    #[arg(long)]
    lang: Option<String>,
    #[arg(long = "type")]
    doc_type: Option<String>,
    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Documents per page (default: search.page_size)
    #[arg(long)]
    limit: Option<usize>,
}

impl FilterArgs {
    fn to_filter(&self, page_size: usize) -> Result<DocFilter> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to { anyhow::bail!("--from {from} is after --to {to}"); }
        }
        let day = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        Ok(DocFilter {
            dept: self.dept.clone(),
            lang: self.lang.clone(),
            doc_type: self.doc_type.clone(),
            from: day(self.from),
            to: day(self.to),
            limit: self.limit.unwrap_or(page_size).max(1),
            page: self.page.max(1),
        })
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn cancel_signal(after_ms: Option<u64>) {
    match after_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => {
            if tokio::signal::ctrl_c().await.is_err() { futures::future::pending::<()>().await }
        }
    }
}

fn settings_cmd(store: &mut SettingsStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => println!("{}", serde_json::to_string_pretty(&store.current())?),
        SettingsAction::Set { key, value } => {
            let changed = store.set(&key, &value)?;
            store.save()?;
            if changed { println!("✅ {key} updated"); } else { println!("ℹ️  {key} unchanged"); }
        }
        SettingsAction::Reset => {
            store.reset();
            store.save()?;
            println!("✅ Overrides cleared");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().map_err(|e| { error!(error = %e, "config load failed"); e })?;
    let mut store = SettingsStore::load(&config)?;
    let command = match cli.command {
        Command::Settings { action } => return settings_cmd(&mut store, action),
        other => other,
    };
    if let Some(url) = &cli.base_url { store.update(|s| s.backend.base_url = url.clone()); }

    let settings = store.current();
    let style = output::render_style(settings.render.color, std::io::stdout().is_terminal());
    let backend = HttpBackend::new(&settings.backend)?;

    match command {
        Command::Docs(filter) => {
            let page = backend.list_docs(&filter.to_filter(settings.search.page_size)?).await?;
            if cli.json { println!("{}", serde_json::to_string_pretty(&page)?); } else { print!("{}", output::format_docs(&page)); }
        }
        Command::Search { query, mode, no_semantic, no_synonyms, no_boost, filter } => {
            store.update(|s| {
                if let Some(mode) = mode { s.search.mode = mode; }
                if no_semantic { s.search.include_semantic = false; }
                if no_synonyms { s.search.synonyms_enabled = false; }
                if no_boost { s.search.boost = false; }
            });
            let settings = store.current();
            let filter = filter.to_filter(settings.search.page_size)?;
            let session = SearchSession::new(backend, store.subscribe());
            let pb = spinner(format!("Searching ({})", settings.search.mode));
            let status = session.search(&query, filter).await;
            pb.finish_and_clear();
            match status? {
                SearchStatus::Published(outcome) if cli.json => println!("{}", output::json_outcome(&outcome)),
                SearchStatus::Published(outcome) => {
                    let highlighter = Highlighter::new(&outcome.terms, settings.search.synonyms_enabled)?;
                    print!("{}", output::format_outcome(&outcome, &highlighter, style));
                }
                SearchStatus::Superseded => {
                    warn!(query = %query, "search superseded by a newer one");
                    eprintln!("{}", output::superseded_note(&query));
                }
            }
        }
        Command::Passages { doc_id, query, pages } => {
            let query = query.unwrap_or_default();
            let synonyms = SynonymTable::from_settings(&settings);
            let mut pager = PassagePager::open(&backend, synonyms, settings.search.synonyms_enabled, settings.search.include_semantic, &doc_id, &query)?;
            pager.load_all(pages.max(1)).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(pager.passages())?);
            } else {
                print!("{}", output::format_passages(&doc_id, pager.passages(), pager.cursor(), pager.highlighter(), style));
            }
        }
        Command::Chunk { doc_id, index, query } => {
            let query = query.unwrap_or_default();
            let pager = PassagePager::open(&backend, SynonymTable::from_settings(&settings), settings.search.synonyms_enabled, true, &doc_id, &query)?;
            let opened = pager.open_chunk(index, style).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&opened.chunk)?);
            } else {
                println!("🧩 {doc_id} #{} ({} chars)\n", opened.chunk.chunk_index, opened.chunk.chars.unwrap_or(opened.chunk.text.chars().count() as u64));
                println!("{}", opened.highlighted);
            }
        }
        Command::Summary { doc_id, style: summary_style, lang, topk, percent_cap, max_tokens, timeout_ms, cancel_after_ms } => {
            let request = LlmSummaryRequest { style: summary_style, lang, overrides: LlmOverrides { topk, percent_cap, max_tokens, timeout_ms } };
            let (handle, registration) = AbortHandle::new_pair();
            let pb = spinner("Summarizing (Ctrl-C for the quick summary)".to_string());
            let work = summarize(&backend, &doc_id, &request, registration);
            tokio::pin!(work);
            let summary = tokio::select! {
                s = &mut work => s,
                () = cancel_signal(cancel_after_ms) => {
                    info!(doc_id = %doc_id, "LLM summary cancelled, taking the quick summary");
                    handle.abort();
                    work.await
                }
            };
            pb.finish_and_clear();
            let summary = summary?;
            info!(doc_id = %doc_id, source = ?summary.source, note = summary.note.as_deref().unwrap_or(""), "summary ready");
            print!("{}", output::format_summary(&doc_id, &summary));
        }
        Command::Stats => {
            let stats = backend.stats().await?;
            if cli.json { println!("{}", serde_json::to_string_pretty(&stats)?); } else { print!("{}", output::format_corpus(&stats)); }
        }
        Command::Meta { doc_id } => {
            let meta = backend.doc_meta(&doc_id).await?;
            if cli.json { println!("{}", serde_json::to_string_pretty(&meta)?); } else { print!("{}", output::format_meta(&meta)); }
        }
        Command::Health => {
            let status = backend.health().await?;
            println!("✅ {} is up", backend.base_url());
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Settings { .. } => {}
    }
    Ok(())
}
