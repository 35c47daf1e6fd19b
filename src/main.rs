//! Travel Search - interactive search console
//!
//! Feeds stdin lines to a search controller the way a search box feeds keystrokes,
//! and prints every published state change.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travel_search::cache::{FileStore, KeyValueStore};
use travel_search::search::{NominatimClient, SearchPhase};
use travel_search::{spawn_sweep_task, Config, DomainCaches, RateLimiter, SearchController, SearchState};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the file-backed store and sweep stale cache entries
/// 4. Start the background sweep task
/// 5. Build the geocoding client, rate limiter and search controller
/// 6. Read commands from stdin until EOF or Ctrl+C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: endpoint={}, debounce={}ms, rate_limit={}ms, cache_dir={}",
        config.geocoding_endpoint,
        config.debounce_ms,
        config.rate_limit_interval_ms,
        config.cache_dir.display()
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.cache_dir)
            .await
            .with_context(|| format!("opening cache dir {}", config.cache_dir.display()))?,
    );
    let caches = Arc::new(DomainCaches::new(store));
    let report = caches.sweep().await;
    info!("Startup sweep removed {} cache entries", report.total());

    let sweep_handle = spawn_sweep_task(
        caches.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let provider = Arc::new(NominatimClient::from_config(&config)?);
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_interval()));
    let controller = SearchController::new(provider, limiter, config.search());

    let printer = tokio::spawn(print_states(controller.subscribe()));

    eprintln!("Type to search. Commands: :select N, :info, :clear, :quit");
    tokio::select! {
        result = command_loop(&controller) => result?,
        _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down..."),
    }

    controller.shutdown();
    printer.abort();
    sweep_handle.abort();
    warn!("Sweep task aborted");
    info!("Shutdown complete");
    Ok(())
}

async fn command_loop(controller: &SearchController) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            ":quit" => break,
            ":clear" => controller.clear_search(),
            ":info" => match controller.get_selected_city_info().await {
                Ok(Some(info)) => println!("{}", serde_json::to_string_pretty(&info)?),
                Ok(None) => println!("Nothing selected"),
                Err(e) => println!("Lookup failed: {}", e),
            },
            cmd if cmd.starts_with(":select") => {
                let index: usize = cmd
                    .trim_start_matches(":select")
                    .trim()
                    .parse()
                    .unwrap_or(1);
                match controller.state().results.get(index.saturating_sub(1)) {
                    Some(result) => controller.select_result(result.clone()),
                    None => println!("No result #{}", index),
                }
            }
            _ => controller.set_query(line.as_str()),
        }
    }
    Ok(())
}

async fn print_states(mut rx: watch::Receiver<SearchState>) {
    let mut shown_selection = None;
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        for line in render_state(&state, &mut shown_selection) {
            println!("{}", line);
        }
    }
}

/// Console lines for one published state.
///
/// `shown_selection` holds the id of the last selection printed, so a
/// selection is announced once rather than on every later update.
fn render_state(state: &SearchState, shown_selection: &mut Option<String>) -> Vec<String> {
    let selection = state.selected_result.as_ref().map(|r| r.id.clone());
    let newly_selected = selection != *shown_selection;
    *shown_selection = selection;

    match state.phase() {
        SearchPhase::Loading => vec![format!("… searching \"{}\"", state.query)],
        SearchPhase::Failed => state
            .error
            .iter()
            .map(|error| format!("! {} ({})", error.message, error.code))
            .collect(),
        SearchPhase::Idle => vec!["(empty query)".to_string()],
        SearchPhase::Ready => match &state.selected_result {
            Some(selected) if newly_selected => vec![format!(
                "✓ selected {} ({})",
                selected.primary_name, selected.secondary_info
            )],
            Some(_) if state.results.is_empty() => Vec::new(),
            None if state.results.is_empty() => vec![format!("No results for \"{}\"", state.query)],
            _ => state
                .results
                .iter()
                .enumerate()
                .map(|(i, result)| {
                    format!("{:>2}. {} - {}", i + 1, result.primary_name, result.secondary_info)
                })
                .collect(),
        },
    }
}
