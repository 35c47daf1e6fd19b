//! Data models shared by the search and cache layers
//!
//! Plain serializable values; behavior lives in `search` and `domain`.

pub mod attraction;
pub mod place;

// Re-export commonly used types
pub use attraction::Attraction;
pub use place::{Coordinates, LocationInfo, SearchResult};
