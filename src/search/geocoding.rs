//! Geocoding Provider
//!
//! The upstream place search consumed by the search controller, plus a
//! Nominatim-compatible HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{GuideError, Result};
use crate::models::{Coordinates, LocationInfo, SearchResult};

// == Provider Trait ==
/// Upstream geocoding service.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Forward search. Results are returned in provider order.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Resolves a search result into a richer location record.
    async fn lookup(&self, place: &SearchResult) -> Result<LocationInfo>;
}

// == Wire Format ==
/// Nominatim sends some numeric fields as strings and others as numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
}

impl Loose {
    fn as_f64(&self, field: &str) -> Result<f64> {
        match self {
            Loose::Number(n) => Ok(*n),
            Loose::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| GuideError::Upstream(format!("invalid {} '{}'", field, s))),
        }
    }

    fn as_id(&self) -> String {
        match self {
            Loose::Number(n) => format!("{}", *n as i64),
            Loose::Text(s) => s.clone(),
        }
    }
}

/// `address` object of a place record (`addressdetails=1`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressDetails {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

impl AddressDetails {
    /// Most specific settlement name available.
    pub fn settlement(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.municipality.as_deref())
    }

    /// `"{state}, {country}"`, skipping whichever part is missing.
    pub fn region(&self) -> String {
        [self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One place record as returned by the search and reverse endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceRecord {
    place_id: Loose,
    pub display_name: String,
    #[serde(default)]
    pub address: AddressDetails,
    lat: Loose,
    lon: Loose,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub importance: Option<f64>,
}

impl PlaceRecord {
    pub fn coordinates(&self) -> Result<Coordinates> {
        Ok(Coordinates::new(
            self.lat.as_f64("lat")?,
            self.lon.as_f64("lon")?,
        ))
    }

    /// First comma-separated segment of `display_name`.
    fn leading_name(&self) -> String {
        self.display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub fn to_search_result(&self) -> Result<SearchResult> {
        Ok(SearchResult {
            id: self.place_id.as_id(),
            display_name: self.display_name.clone(),
            primary_name: self
                .address
                .settlement()
                .map(str::to_string)
                .unwrap_or_else(|| self.leading_name()),
            secondary_info: self.address.region(),
            coordinates: self.coordinates()?,
            kind: self.kind.clone(),
            importance: self.importance.unwrap_or_default(),
        })
    }

    pub fn to_location_info(&self, name: &str) -> Result<LocationInfo> {
        Ok(LocationInfo {
            name: name.to_string(),
            display_name: self.display_name.clone(),
            city: self.address.settlement().map(str::to_string),
            state: self.address.state.clone(),
            country: self.address.country.clone(),
            country_code: self.address.country_code.clone(),
            coordinates: self.coordinates()?,
        })
    }
}

// == Nominatim Client ==
/// HTTP client for a Nominatim-compatible geocoding endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    endpoint: String,
}

impl NominatimClient {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GuideError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.geocoding_endpoint.clone(),
            &config.user_agent,
            config.request_timeout(),
        )
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, path);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GuideError::Upstream(format!(
                "geocoding returned HTTP {}",
                status
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let limit = limit.to_string();
        let places: Vec<PlaceRecord> = self
            .fetch(
                "search",
                &[
                    ("q", query),
                    ("format", "json"),
                    ("limit", limit.as_str()),
                    ("addressdetails", "1"),
                ],
            )
            .await?;

        debug!(query, count = places.len(), "geocoding search returned");
        places.iter().map(PlaceRecord::to_search_result).collect()
    }

    async fn lookup(&self, place: &SearchResult) -> Result<LocationInfo> {
        let lat = place.coordinates.latitude.to_string();
        let lon = place.coordinates.longitude.to_string();
        let record: PlaceRecord = self
            .fetch(
                "reverse",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "json"),
                    ("addressdetails", "1"),
                ],
            )
            .await?;

        record.to_location_info(&place.primary_name)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: &str = r#"{
        "place_id": 240109189,
        "display_name": "Berlin, Deutschland",
        "address": {"city": "Berlin", "state": "Berlin", "country": "Deutschland", "country_code": "de"},
        "lat": "52.5170365",
        "lon": "13.3888599",
        "type": "city",
        "importance": 0.8875
    }"#;

    #[test]
    fn test_maps_city_record() {
        let record: PlaceRecord = serde_json::from_str(BERLIN).unwrap();
        let result = record.to_search_result().unwrap();

        assert_eq!(result.id, "240109189");
        assert_eq!(result.primary_name, "Berlin");
        assert_eq!(result.secondary_info, "Berlin, Deutschland");
        assert_eq!(result.coordinates, Coordinates::new(52.5170365, 13.3888599));
        assert_eq!(result.kind, "city");
        assert_eq!(result.importance, 0.8875);
    }

    #[test]
    fn test_primary_name_falls_back_through_settlements() {
        let record: PlaceRecord = serde_json::from_str(
            r#"{"place_id": "7", "display_name": "Hallstatt, Gmunden, Austria",
                "address": {"village": "Hallstatt", "country": "Austria"},
                "lat": 47.56, "lon": 13.64, "type": "village"}"#,
        )
        .unwrap();
        let result = record.to_search_result().unwrap();

        assert_eq!(result.id, "7");
        assert_eq!(result.primary_name, "Hallstatt");
        assert_eq!(result.secondary_info, "Austria");
        assert_eq!(result.importance, 0.0);
    }

    #[test]
    fn test_primary_name_uses_display_name_without_address() {
        let record: PlaceRecord = serde_json::from_str(
            r#"{"place_id": 1, "display_name": "Mont Blanc , Chamonix, France",
                "lat": "45.83", "lon": "6.86", "type": "peak"}"#,
        )
        .unwrap();
        let result = record.to_search_result().unwrap();

        assert_eq!(result.primary_name, "Mont Blanc");
        assert_eq!(result.secondary_info, "");
    }

    #[test]
    fn test_malformed_coordinates_are_upstream_errors() {
        let record: PlaceRecord = serde_json::from_str(
            r#"{"place_id": 1, "display_name": "X", "lat": "north", "lon": "0"}"#,
        )
        .unwrap();
        assert!(matches!(
            record.to_search_result(),
            Err(GuideError::Upstream(_))
        ));
    }

    #[test]
    fn test_location_info_from_reverse_record() {
        let record: PlaceRecord = serde_json::from_str(BERLIN).unwrap();
        let info = record.to_location_info("Berlin").unwrap();

        assert_eq!(info.name, "Berlin");
        assert_eq!(info.city.as_deref(), Some("Berlin"));
        assert_eq!(info.country_code.as_deref(), Some("de"));
    }

    #[test]
    fn test_client_trims_endpoint() {
        let client = NominatimClient::new(
            "https://geo.example/",
            "travel-search-test",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint, "https://geo.example");
    }
}
