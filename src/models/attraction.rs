//! Point-of-interest model
//!
//! Cached per coordinate cell by the attractions cache.

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// A nearby point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Interest categories this attraction was classified under
    #[serde(default)]
    pub categories: Vec<String>,
    pub coordinates: Coordinates,
    /// Distance from the query point in meters
    pub distance_m: Option<f64>,
    pub image_url: Option<String>,
}
