//! Command handlers: each one syncs (when it needs the catalog) and renders.

use std::sync::Arc;
use std::time::Duration;

use lista_core::AppConfig;
use lista_feed::{
    format_sale_price, Debouncer, FeedClient, FileCache, Freshness, RateClient, SyncOrchestrator,
    SyncReport,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

fn build_orchestrator(config: &AppConfig) -> anyhow::Result<SyncOrchestrator<FileCache>> {
    let client = FeedClient::from_config(config)?;
    let cache = FileCache::new(&config.cache_path);
    Ok(SyncOrchestrator::new(client, cache))
}

/// Runs one cycle, reports it on stderr, and fails only when there is
/// nothing at all to show.
async fn sync_for_display(
    orchestrator: &SyncOrchestrator<FileCache>,
) -> anyhow::Result<SyncReport> {
    let report = orchestrator.sync().await;
    if report.view.freshness() == Freshness::Empty {
        let reason = report
            .error
            .as_ref()
            .map_or_else(|| "no snapshot published".to_owned(), ToString::to_string);
        anyhow::bail!("no price list available: {reason}");
    }
    eprint!("{}", render::render_status(&report));
    Ok(report)
}

/// Run a single sync cycle and print its summary.
///
/// # Errors
///
/// Returns an error if the configured endpoints are invalid or the cycle
/// left no catalog to show.
pub(crate) async fn run_sync(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let report = orchestrator.sync().await;
    print!("{}", render::render_status(&report));

    if report.view.freshness() == Freshness::Empty {
        anyhow::bail!("sync failed and no cached price list is available");
    }
    Ok(())
}

pub(crate) async fn run_list(config: &AppConfig, html: bool) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let report = sync_for_display(&orchestrator).await?;
    print!("{}", render::render_catalog(report.view.catalog(), html));
    Ok(())
}

pub(crate) async fn run_search(config: &AppConfig, query: &str, html: bool) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let report = sync_for_display(&orchestrator).await?;
    let hits = report.view.search(query);
    tracing::debug!(query, hits = hits.len(), "search complete");
    print!("{}", render::render_catalog(&hits, html));
    Ok(())
}

/// Interactive search: every stdin line replaces the pending query, and only
/// the query left standing after the debounce window is rendered.
///
/// # Errors
///
/// Returns an error if no catalog could be loaded or stdin cannot be read.
pub(crate) async fn run_browse(config: &AppConfig) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    sync_for_display(&orchestrator).await?;
    eprintln!("type a query and press enter; end input to quit");

    let searcher = Arc::clone(&orchestrator);
    let mut debouncer = Debouncer::new(
        Duration::from_millis(config.search_debounce_ms),
        move |query: String| {
            let hits = searcher.search(&query);
            print!("{}", render::render_text(&hits));
        },
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debouncer.submit(line);
    }
    debouncer.settle().await;
    Ok(())
}

pub(crate) async fn run_rate(config: &AppConfig) -> anyhow::Result<()> {
    let client = RateClient::new(
        &config.rate_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let price = match client.fetch_sale_price().await {
        Ok(price) => Some(price),
        Err(err) => {
            tracing::warn!(error = %err, "currency reference unavailable");
            None
        }
    };
    println!("USD sale: {}", format_sale_price(price));
    Ok(())
}
