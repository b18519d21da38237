//! # Flight Optimizer
//!
//! Resolves city names to metropolitan codes through the Kiwi Tequila API,
//! searches the cheapest one-way fare from an origin to each destination
//! departing within the next ~24 hours, and ranks the destinations by price
//! per kilometer.
//!
//! The library backs two front ends: the `flight-optimizer` CLI and the
//! `flight-optimizer-server` HTTP service. Both drive the same [`Optimizer`].

pub mod client;
pub mod config;
pub mod http;
pub mod optimizer;
pub mod ranking;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types for convenience
pub use client::{next_24h_date_range_utc, CityResolver, FareSearch, TequilaClient};
pub use config::Config;
pub use optimizer::{
    OptimizeError, Optimizer, Reporter, SearchFailurePolicy, TracingReporter, TripQuery,
};
pub use ranking::{rank_per_km, select_best};

/// Error types for the external flight/location service
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Could not resolve city '{0}'")]
    CityNotFound(String),

    #[error("Unexpected response from flight service: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FlightError {
    /// True when the service answered but had no matching city.
    pub fn is_no_match(&self) -> bool {
        matches!(self, FlightError::CityNotFound(_))
    }
}

/// A resolved city, e.g. `LON` / `London`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub code: String,
    pub name: String,
}

impl Location {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Cheapest one-way offer for an origin/destination pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub price: f64,
    pub distance_km: f64,
}

impl Fare {
    pub fn new(price: f64, distance_km: f64) -> Self {
        Self { price, distance_km }
    }
}

/// A destination with its fare and derived cost per kilometer
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub destination: Location,
    pub fare: Fare,
    /// `+inf` when the fare reports zero distance
    pub price_per_km: f64,
}

impl RankedResult {
    pub fn new(destination: Location, fare: Fare) -> Self {
        let (price_per_km, _, _) = rank_per_km(&fare);
        Self {
            destination,
            fare,
            price_per_km,
        }
    }
}

/// Every ranked destination of one run plus the winner
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub origin: Location,
    /// In destination input order
    pub results: Vec<RankedResult>,
    pub best: RankedResult,
}
