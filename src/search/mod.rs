//! Search Module
//!
//! Debounced, cancellable incremental place search over a rate-limited
//! geocoding upstream.

mod controller;
mod geocoding;
mod rate_limit;
mod state;

pub use controller::SearchController;
pub use geocoding::{AddressDetails, GeocodingProvider, NominatimClient, PlaceRecord};
pub use rate_limit::{RateLimiter, DEFAULT_MIN_INTERVAL};
pub use state::{SearchPhase, SearchState};
