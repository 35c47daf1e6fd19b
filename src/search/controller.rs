//! Search Controller
//!
//! Turns raw keystrokes into debounced, rate-limited geocoding lookups and
//! guarantees only the newest query's outcome ever reaches the visible state.
//!
//! Every state-changing operation bumps a generation counter while holding the
//! state channel's write lock. A lookup captures the generation it was issued
//! under and applies its outcome, under the same lock, only if that generation
//! is still current. Superseded lookups are also cancelled cooperatively
//! through their [`CancellationToken`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::{GuideError, Result, SearchError};
use crate::models::{LocationInfo, SearchResult};
use crate::search::{GeocodingProvider, RateLimiter, SearchState};

// == Shared State ==
/// State reachable from spawned lookup tasks.
struct Shared {
    state: watch::Sender<SearchState>,
    generation: AtomicU64,
    closed: AtomicBool,
    provider: Arc<dyn GeocodingProvider>,
    limiter: Arc<RateLimiter>,
    config: SearchConfig,
}

impl Shared {
    /// Debounces, then performs one lookup and applies its outcome.
    async fn run_lookup(self: Arc<Self>, query: String, generation: u64, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = sleep(self.config.debounce) => {}
        }

        debug!(query = %query, generation, "debounce elapsed, issuing lookup");
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(GuideError::Cancelled),
            outcome = self.fetch(&query) => outcome,
        };

        self.apply(generation, outcome);
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.limiter.wait().await;

        let lookup = self.provider.search(query, self.config.result_limit);
        match timeout(self.config.request_timeout, lookup).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GuideError::Timeout(self.config.request_timeout)),
        }
    }

    /// Publishes a lookup outcome if `generation` is still current.
    ///
    /// Returns true if the visible state changed.
    fn apply(&self, generation: u64, outcome: Result<Vec<SearchResult>>) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(generation, "discarding superseded lookup");
                return false;
            }

            match outcome {
                Ok(results) => {
                    debug!(count = results.len(), "search results applied");
                    state.results = results;
                    state.loading = false;
                    state.error = None;
                    true
                }
                Err(e) if e.is_cancellation() => false,
                Err(e) => {
                    warn!(query = %state.query, error = %e, "search failed");
                    state.error = Some(SearchError::from(&e));
                    state.results.clear();
                    state.loading = false;
                    true
                }
            }
        })
    }

    /// Mutates the state and starts a new generation in one step.
    fn advance(&self, modify: impl FnOnce(&mut SearchState)) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            modify(state);
        });
        generation
    }
}

/// A scheduled or in-flight lookup.
struct PendingLookup {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

// == Search Controller ==
/// Owner of one search surface's state.
///
/// Must be used from within a Tokio runtime. Dropping the controller cancels
/// any pending lookup.
pub struct SearchController {
    shared: Arc<Shared>,
    pending: Mutex<Option<PendingLookup>>,
}

impl SearchController {
    /// Creates a controller. `limiter` should be the one instance shared by
    /// every caller of the same upstream endpoint.
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        limiter: Arc<RateLimiter>,
        config: SearchConfig,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                provider,
                limiter,
                config,
            }),
            pending: Mutex::new(None),
        }
    }

    // == Accessors ==
    /// Current state snapshot.
    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }

    pub fn config(&self) -> SearchConfig {
        self.shared.config
    }

    // == Set Query ==
    /// Records a keystroke.
    ///
    /// The query text is visible immediately. A blank query clears results and
    /// issues nothing; otherwise a lookup is scheduled after the debounce
    /// window, superseding any earlier one.
    pub fn set_query(&self, text: impl Into<String>) {
        if self.is_closed() {
            return;
        }

        let text = text.into();
        let is_blank = text.trim().is_empty();

        let mut pending = self.pending_slot();
        cancel(pending.take());

        let query = text.clone();
        let generation = self.shared.advance(|state| {
            state.query = text;
            if is_blank {
                state.results.clear();
                state.error = None;
                state.loading = false;
            } else {
                state.loading = true;
            }
        });

        if is_blank {
            return;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(
            self.shared
                .clone()
                .run_lookup(query, generation, token.clone()),
        );
        *pending = Some(PendingLookup { token, handle });
    }

    // == Select Result ==
    /// Picks a suggestion: it becomes the selection and the query text, and
    /// the suggestion list closes. Any pending lookup is cancelled.
    pub fn select_result(&self, result: SearchResult) {
        if self.is_closed() {
            return;
        }

        let mut pending = self.pending_slot();
        cancel(pending.take());

        self.shared.advance(|state| {
            state.query = result.primary_name.clone();
            state.selected_result = Some(result);
            state.results.clear();
            state.loading = false;
            state.error = None;
        });
    }

    // == Clear Search ==
    /// Cancels pending work and resets to the initial state.
    pub fn clear_search(&self) {
        if self.is_closed() {
            return;
        }

        let mut pending = self.pending_slot();
        cancel(pending.take());

        self.shared.advance(|state| *state = SearchState::default());
    }

    // == Selected City Info ==
    /// Resolves the current selection into a [`LocationInfo`].
    ///
    /// Returns `Ok(None)` when nothing is selected. Does not touch search state.
    pub async fn get_selected_city_info(&self) -> Result<Option<LocationInfo>> {
        let selected = self.shared.state.borrow().selected_result.clone();
        let Some(place) = selected else {
            return Ok(None);
        };

        self.shared.limiter.wait().await;
        let lookup = self.shared.provider.lookup(&place);
        match timeout(self.shared.config.request_timeout, lookup).await {
            Ok(info) => info.map(Some),
            Err(_) => Err(GuideError::Timeout(self.shared.config.request_timeout)),
        }
    }

    // == Teardown ==
    /// Cancels pending work and stops all further state updates.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(lookup) = self.pending_slot().take() {
            lookup.token.cancel();
            lookup.handle.abort();
        }
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        debug!("search controller shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    fn pending_slot(&self) -> MutexGuard<'_, Option<PendingLookup>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn cancel(lookup: Option<PendingLookup>) {
    if let Some(lookup) = lookup {
        lookup.token.cancel();
    }
}
