//! HTTP client for the Kiwi Tequila location and search APIs

use crate::config::Config;
use crate::{Fare, FlightError, Location};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Date format expected by the search endpoint
const DATE_FORMAT: &str = "%d/%m/%Y";
const LOCALE: &str = "en-US";

/// Maps a free-text city name to a location code
#[async_trait]
pub trait CityResolver: Send + Sync {
    async fn resolve(&self, city_name: &str) -> Result<Location, FlightError>;
}

/// Finds the cheapest one-way fare between two location codes
#[async_trait]
pub trait FareSearch: Send + Sync {
    /// `Ok(None)` means the service had no flights in the window.
    async fn search_cheapest_one_way(
        &self,
        origin_code: &str,
        destination_code: &str,
        currency: &str,
    ) -> Result<Option<Fare>, FlightError>;
}

/// `(date_from, date_to)` covering today and tomorrow in UTC
pub fn next_24h_date_range_utc(now: DateTime<Utc>) -> (String, String) {
    let today = now.date_naive();
    let tomorrow = today + ChronoDuration::days(1);
    (
        today.format(DATE_FORMAT).to_string(),
        tomorrow.format(DATE_FORMAT).to_string(),
    )
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<LocationRecord>,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    #[serde(default)]
    code: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<FareRecord>,
}

#[derive(Debug, Deserialize)]
struct FareRecord {
    #[serde(deserialize_with = "lenient_f64")]
    price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    distance: f64,
}

/// The search API is not consistent about quoting numbers.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f64),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Float(value) => Ok(value),
        Number::Text(text) => text.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Picks the first (highest ranked) match; a missing name falls back to the query.
fn first_location(response: LocationsResponse, city_name: &str) -> Result<Location, FlightError> {
    let record = response
        .locations
        .into_iter()
        .next()
        .filter(|record| !record.code.trim().is_empty())
        .ok_or_else(|| FlightError::CityNotFound(city_name.to_string()))?;

    let name = record
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| city_name.to_string());

    Ok(Location::new(record.code, name))
}

/// Prices and distances must be finite and non-negative.
fn first_fare(response: SearchResponse) -> Result<Option<Fare>, FlightError> {
    let record = match response.data.into_iter().next() {
        Some(record) => record,
        None => return Ok(None),
    };

    for (field, value) in [("price", record.price), ("distance", record.distance)] {
        if !value.is_finite() || value < 0.0 {
            return Err(FlightError::InvalidResponse(format!(
                "{} must be a finite non-negative number, got {}",
                field, value
            )));
        }
    }

    Ok(Some(Fare::new(record.price, record.distance)))
}

/// Client for the Tequila API, serving both city resolution and fare search
pub struct TequilaClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    resolve_timeout: Duration,
    search_timeout: Duration,
}

impl TequilaClient {
    /// Create a new client from the process configuration
    pub fn new(config: &Config) -> Result<Self, FlightError> {
        debug!(base_url = %config.tequila_base, "Creating Tequila client");
        let http_client = Client::builder()
            .user_agent(concat!("flight-optimizer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.tequila_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            resolve_timeout: config.resolve_timeout,
            search_timeout: config.search_timeout,
        })
    }

    async fn get_json<T, Q>(
        &self,
        path: &str,
        query: &Q,
        timeout: Duration,
    ) -> Result<T, FlightError>
    where
        T: for<'de> Deserialize<'de>,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let start_time = Instant::now();
        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .query(query)
            .timeout(timeout)
            .send()
            .await?;
        let status = response.status();

        info!(
            url = %url,
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "HTTP request completed"
        );

        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FlightError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CityResolver for TequilaClient {
    #[instrument(level = "info", skip(self))]
    async fn resolve(&self, city_name: &str) -> Result<Location, FlightError> {
        let term = city_name.trim();
        if term.is_empty() {
            return Err(FlightError::CityNotFound(city_name.to_string()));
        }

        let response: LocationsResponse = self
            .get_json(
                "/locations/query",
                &[
                    ("term", term),
                    ("location_types", "city"),
                    ("limit", "1"),
                    ("active_only", "true"),
                    ("locale", LOCALE),
                    ("sort", "rank"),
                ],
                self.resolve_timeout,
            )
            .await?;

        let location = first_location(response, term)?;
        debug!(code = %location.code, name = %location.name, "City resolved");
        Ok(location)
    }
}

#[async_trait]
impl FareSearch for TequilaClient {
    #[instrument(level = "info", skip(self))]
    async fn search_cheapest_one_way(
        &self,
        origin_code: &str,
        destination_code: &str,
        currency: &str,
    ) -> Result<Option<Fare>, FlightError> {
        let (date_from, date_to) = next_24h_date_range_utc(Utc::now());

        let response: SearchResponse = self
            .get_json(
                "/v2/search",
                &[
                    ("fly_from", origin_code),
                    ("fly_to", destination_code),
                    ("date_from", date_from.as_str()),
                    ("date_to", date_to.as_str()),
                    ("adults", "1"),
                    ("curr", currency),
                    ("limit", "1"),
                    ("sort", "price"),
                    ("asc", "1"),
                ],
                self.search_timeout,
            )
            .await?;

        let fare = first_fare(response)?;
        debug!(found = fare.is_some(), "Fare search completed");
        Ok(fare)
    }
}
