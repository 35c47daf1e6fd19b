//! Search State
//!
//! The user-visible state of one search surface.

use serde::Serialize;

use crate::error::SearchError;
use crate::models::SearchResult;

/// Snapshot published by a [`SearchController`](super::SearchController).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<SearchError>,
    pub selected_result: Option<SearchResult>,
}

/// Lifecycle phase of a search surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Query is empty
    Idle,
    /// A lookup is scheduled or in flight
    Loading,
    /// Last lookup completed with results (possibly none)
    Ready,
    /// Last lookup failed
    Failed,
}

impl SearchState {
    pub fn phase(&self) -> SearchPhase {
        if self.loading {
            SearchPhase::Loading
        } else if self.error.is_some() {
            SearchPhase::Failed
        } else if self.query.trim().is_empty() {
            SearchPhase::Idle
        } else {
            SearchPhase::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase() {
        let mut state = SearchState::default();
        assert_eq!(state.phase(), SearchPhase::Idle);

        state.query = "Ber".into();
        state.loading = true;
        assert_eq!(state.phase(), SearchPhase::Loading);

        state.loading = false;
        assert_eq!(state.phase(), SearchPhase::Ready);

        state.error = Some(SearchError::new("offline"));
        assert_eq!(state.phase(), SearchPhase::Failed);
    }
}
