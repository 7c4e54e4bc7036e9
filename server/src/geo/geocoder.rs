use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::Coordinates;
use crate::utils::AppError;

/// A successfully resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub coordinates: Coordinates,
    /// The service's normalized form of the query, e.g. "Washington, DC, USA".
    pub address: String,
}

/// Turns free text into a point. Implementations never fail loudly: any
/// problem is logged and reported as `None`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Option<GeocodedLocation>;
}

pub struct HttpGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpGeocoder {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("geocoder client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn fetch(&self, query: &str) -> Result<GeocodeResponse, reqwest::Error> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("sensor", "false"),
                ("output", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<GeocodeResponse>()
            .await
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, query: &str) -> Option<GeocodedLocation> {
        match self.fetch(query).await {
            Ok(response) => {
                let resolved = response.into_location();
                if resolved.is_none() {
                    warn!(query = %query, "Geocoder found no match");
                }
                resolved
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Geocoding request failed");
                None
            }
        }
    }
}

/// Used when no API key is configured.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn geocode(&self, query: &str) -> Option<GeocodedLocation> {
        debug!(query = %query, "Geocoding disabled, location left unresolved");
        None
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(rename = "Status")]
    status: GeocodeStatus,
    #[serde(rename = "Placemark", default)]
    placemarks: Vec<Placemark>,
}

#[derive(Debug, Deserialize)]
struct GeocodeStatus {
    code: i64,
}

#[derive(Debug, Deserialize)]
struct Placemark {
    address: String,
    #[serde(rename = "Point")]
    point: PlacemarkPoint,
}

/// `[longitude, latitude, altitude]`
#[derive(Debug, Deserialize)]
struct PlacemarkPoint {
    coordinates: Vec<f64>,
}

impl GeocodeResponse {
    fn into_location(self) -> Option<GeocodedLocation> {
        if self.status.code != 200 {
            return None;
        }
        let placemark = self.placemarks.into_iter().next()?;
        match placemark.point.coordinates.as_slice() {
            [lon, lat, ..] => Some(GeocodedLocation {
                coordinates: Coordinates::new(*lat, *lon),
                address: placemark.address,
            }),
            _ => None,
        }
    }
}
