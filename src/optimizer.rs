//! Resolve, search, rank: the orchestration shared by the CLI and the HTTP service

use crate::client::{CityResolver, FareSearch};
use crate::ranking::select_best;
use crate::{FlightError, Location, OptimizationOutcome, RankedResult};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Terminal outcomes of an optimization run
#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Failed to resolve origin '{name}': {source}")]
    OriginUnresolved {
        name: String,
        #[source]
        source: FlightError,
    },

    #[error("No destination cities could be resolved.")]
    NoDestinationsResolved,

    #[error("No viable flights found in the next ~24 hours.")]
    NoFaresFound,

    #[error("Fare search {origin} → {destination} failed: {source}")]
    SearchFailed {
        origin: String,
        destination: String,
        #[source]
        source: FlightError,
    },
}

/// What to do when a single destination's fare search errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFailurePolicy {
    #[default]
    SkipAndContinue,
    FailFast,
}

/// One origin, many destinations
#[derive(Debug, Clone, PartialEq)]
pub struct TripQuery {
    pub origin: String,
    pub destinations: Vec<String>,
    pub currency: String,
}

/// Progress hooks, called in input order while a run proceeds
pub trait Reporter {
    fn destination_unresolved(&mut self, _name: &str, _error: &FlightError) {}

    /// Called once, after destinations are resolved and before any search.
    fn search_started(&mut self, _origin: &Location) {}

    fn fare_ranked(&mut self, _origin: &Location, _result: &RankedResult) {}

    fn no_flights(&mut self, _origin: &Location, _destination: &Location) {}

    fn search_failed(
        &mut self,
        _origin: &Location,
        _destination: &Location,
        _error: &FlightError,
    ) {
    }
}

/// Sends progress to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn destination_unresolved(&mut self, name: &str, error: &FlightError) {
        warn!(destination = name, error = %error, "Skipping unresolved destination");
    }

    fn fare_ranked(&mut self, origin: &Location, result: &RankedResult) {
        info!(
            origin = %origin.code,
            destination = %result.destination.code,
            price = result.fare.price,
            distance_km = result.fare.distance_km,
            price_per_km = result.price_per_km,
            "Fare ranked"
        );
    }

    fn no_flights(&mut self, origin: &Location, destination: &Location) {
        info!(origin = %origin.code, destination = %destination.code, "No flights found");
    }

    fn search_failed(&mut self, origin: &Location, destination: &Location, error: &FlightError) {
        warn!(
            origin = %origin.code,
            destination = %destination.code,
            error = %error,
            "Fare search failed"
        );
    }
}

/// Runs queries sequentially against a resolver and a fare search
pub struct Optimizer<'a> {
    resolver: &'a dyn CityResolver,
    fares: &'a dyn FareSearch,
    policy: SearchFailurePolicy,
}

impl<'a> Optimizer<'a> {
    pub fn new(resolver: &'a dyn CityResolver, fares: &'a dyn FareSearch) -> Self {
        Self {
            resolver,
            fares,
            policy: SearchFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SearchFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[instrument(
        level = "info",
        skip(self, query, reporter),
        fields(origin = %query.origin, destinations = query.destinations.len())
    )]
    pub async fn run<R>(
        &self,
        query: &TripQuery,
        reporter: &mut R,
    ) -> Result<OptimizationOutcome, OptimizeError>
    where
        R: Reporter + Send,
    {
        let origin = self
            .resolver
            .resolve(&query.origin)
            .await
            .map_err(|source| OptimizeError::OriginUnresolved {
                name: query.origin.clone(),
                source,
            })?;
        debug!(code = %origin.code, "Origin resolved");

        let mut destinations = Vec::with_capacity(query.destinations.len());
        for name in &query.destinations {
            match self.resolver.resolve(name).await {
                Ok(location) => destinations.push(location),
                Err(e) => reporter.destination_unresolved(name, &e),
            }
        }

        if destinations.is_empty() {
            return Err(OptimizeError::NoDestinationsResolved);
        }

        reporter.search_started(&origin);

        let mut results = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let search = self
                .fares
                .search_cheapest_one_way(&origin.code, &destination.code, &query.currency)
                .await;

            match search {
                Ok(Some(fare)) => {
                    let result = RankedResult::new(destination, fare);
                    reporter.fare_ranked(&origin, &result);
                    results.push(result);
                }
                Ok(None) => reporter.no_flights(&origin, &destination),
                Err(e) => {
                    reporter.search_failed(&origin, &destination, &e);
                    if self.policy == SearchFailurePolicy::FailFast {
                        return Err(OptimizeError::SearchFailed {
                            origin: origin.code,
                            destination: destination.code,
                            source: e,
                        });
                    }
                }
            }
        }

        let best = select_best(&results)
            .cloned()
            .ok_or(OptimizeError::NoFaresFound)?;
        info!(
            best = %best.destination.code,
            price_per_km = best.price_per_km,
            ranked = results.len(),
            "Optimization completed"
        );

        Ok(OptimizationOutcome {
            origin,
            results,
            best,
        })
    }
}
