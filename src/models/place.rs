//! Place models
//!
//! Values produced by the geocoding layer and carried through search state.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One suggestion returned by a place search.
///
/// `importance` is the provider's relevance score. Results keep the
/// provider's ordering and are never re-ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub display_name: String,
    pub primary_name: String,
    pub secondary_info: String,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub kind: String,
    pub importance: f64,
}

/// Richer description of a selected place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub name: String,
    pub display_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub coordinates: Coordinates,
}
