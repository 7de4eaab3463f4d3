//! Address and postal code lookup
//!
//! [`MapQuestGeocoder`] calls the MapQuest address endpoint. [`StaticGeocoder`]
//! answers from an in-process table and needs no network.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    config::GeocoderConfig,
    error::{Error, Result},
    models::Location,
};

static ZIPCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").expect("valid zipcode pattern"));

/// Resolves free-form addresses or postal codes to a located point
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider answered but could not place the query
    async fn geocode(&self, query: &str) -> Result<Option<Location>>;
}

/// Build the provider named in config
pub fn from_config(config: &GeocoderConfig) -> Result<Arc<dyn Geocoder>> {
    match config.provider.as_str() {
        "mapquest" => Ok(Arc::new(MapQuestGeocoder::new(config)?)),
        "static" => Ok(Arc::new(StaticGeocoder::with_seed_locations())),
        other => Err(Error::Internal(format!(
            "Unknown geocoder provider '{other}' (expected 'mapquest' or 'static')"
        ))),
    }
}

/// MapQuest geocoding API client
pub struct MapQuestGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: LatLng,
    #[serde(default)]
    street: String,
    /// City
    #[serde(default)]
    admin_area5: String,
    /// State
    #[serde(default)]
    admin_area3: String,
    /// Country
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    geocode_quality: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl MapQuestGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Internal("geocoder.api_key is required for mapquest".into()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("bootcamp-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build geocoder HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    #[instrument(skip(self), fields(service = "mapquest"))]
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        let url = format!("{}/geocoding/v1/address", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("location", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "Geocoding request rejected");
            return Err(Error::External(format!("MapQuest returned status {status}")));
        }

        let body: MapQuestResponse = response.json().await?;
        let location = body
            .results
            .into_iter()
            .next()
            .and_then(|result| result.locations.into_iter().next())
            .filter(|found| found.geocode_quality != "COUNTRY")
            .map(into_location);

        debug!(found = location.is_some(), "Geocoding finished");
        Ok(location)
    }
}

fn into_location(found: MapQuestLocation) -> Location {
    let non_empty = |s: String| (!s.trim().is_empty()).then_some(s);

    let locality = [found.admin_area5.as_str(), found.admin_area3.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    let formatted = [
        found.street.as_str(),
        format!("{locality} {}", found.postal_code).trim(),
        found.admin_area1.as_str(),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ");

    Location {
        formatted_address: non_empty(formatted),
        street: non_empty(found.street),
        city: non_empty(found.admin_area5),
        state: non_empty(found.admin_area3),
        zipcode: non_empty(found.postal_code),
        country: non_empty(found.admin_area1),
        ..Location::point(found.lat_lng.lng, found.lat_lng.lat)
    }
}

/// Table-backed geocoder keyed by normalized query and by zipcode
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Location>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookups for the bundled sample bootcamps
    pub fn with_seed_locations() -> Self {
        let mut geocoder = Self::new();
        for (street, city, state, zipcode, latitude, longitude) in [
            ("233 Bay State Rd", "Boston", "MA", "02215", 42.350846, -71.10216),
            ("220 Pawtucket St", "Lowell", "MA", "01854", 42.6478, -71.3284),
            ("85 South Prospect Street", "Burlington", "VT", "05405", 44.4775, -73.1985),
            ("45 Upper College Rd", "Kingston", "RI", "02881", 41.4807, -71.5245),
        ] {
            geocoder.insert(
                zipcode,
                Location {
                    formatted_address: Some(format!("{street}, {city}, {state} {zipcode}, US")),
                    street: Some(street.to_string()),
                    city: Some(city.to_string()),
                    state: Some(state.to_string()),
                    zipcode: Some(zipcode.to_string()),
                    country: Some("US".to_string()),
                    ..Location::point(longitude, latitude)
                },
            );
        }
        geocoder
    }

    #[must_use]
    pub fn with(mut self, query: &str, location: Location) -> Self {
        self.insert(query, location);
        self
    }

    pub fn insert(&mut self, query: &str, location: Location) {
        self.entries.insert(normalize(query), location);
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        if let Some(location) = self.entries.get(&normalize(query)) {
            return Ok(Some(location.clone()));
        }

        Ok(ZIPCODE
            .captures_iter(query)
            .filter_map(|caps| self.entries.get(caps.get(1)?.as_str()))
            .next()
            .cloned())
    }
}

fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_zipcode_lookup() {
        let geocoder = StaticGeocoder::with_seed_locations();
        let location = geocoder.geocode("02215").await.unwrap().unwrap();
        assert_eq!(location.city.as_deref(), Some("Boston"));
        assert_eq!(location.coordinates, [-71.10216, 42.350846]);
    }

    #[tokio::test]
    async fn test_static_address_falls_back_to_zipcode() {
        let geocoder = StaticGeocoder::with_seed_locations();
        let location = geocoder
            .geocode("220 Pawtucket St, Lowell, MA 01854-1234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(location.state.as_deref(), Some("MA"));
        assert_eq!(location.zipcode.as_deref(), Some("01854"));
    }

    #[tokio::test]
    async fn test_static_custom_entry_and_miss() {
        let geocoder = StaticGeocoder::new().with("  Main   Street ", Location::point(1.0, 2.0));
        assert!(geocoder.geocode("main street").await.unwrap().is_some());
        assert!(geocoder.geocode("99999").await.unwrap().is_none());
    }

    #[test]
    fn test_mapquest_location_parsing() {
        let body: MapQuestResponse = serde_json::from_value(serde_json::json!({
            "results": [{
                "locations": [{
                    "street": "233 Bay State Rd",
                    "adminArea5": "Boston",
                    "adminArea3": "MA",
                    "adminArea1": "US",
                    "postalCode": "02215",
                    "geocodeQuality": "POINT",
                    "latLng": {"lat": 42.350846, "lng": -71.10216}
                }]
            }]
        }))
        .unwrap();

        let found = body.results.into_iter().next().unwrap().locations.into_iter().next().unwrap();
        let location = into_location(found);
        assert_eq!(location.coordinates, [-71.10216, 42.350846]);
        assert_eq!(
            location.formatted_address.as_deref(),
            Some("233 Bay State Rd, Boston, MA 02215, US")
        );
        assert_eq!(location.kind, "Point");
    }

    #[test]
    fn test_mapquest_requires_api_key() {
        let config = GeocoderConfig::default();
        assert!(MapQuestGeocoder::new(&config).is_err());
    }

    #[test]
    fn test_from_config_rejects_unknown_provider() {
        let config = GeocoderConfig {
            provider: "carrier-pigeon".into(),
            ..Default::default()
        };
        assert!(from_config(&config).is_err());
        assert!(from_config(&GeocoderConfig {
            provider: "static".into(),
            ..Default::default()
        })
        .is_ok());
    }
}
