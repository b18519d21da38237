//! `POST /optimize` over axum

use crate::client::{CityResolver, FareSearch, TequilaClient};
use crate::config::Config;
use crate::optimizer::{OptimizeError, Optimizer, SearchFailurePolicy, TracingReporter, TripQuery};
use crate::{FlightError, OptimizationOutcome};
use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Services and defaults shared by every request
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn CityResolver>,
    fares: Arc<dyn FareSearch>,
    default_currency: String,
    policy: SearchFailurePolicy,
}

impl AppState {
    pub fn new(
        resolver: Arc<dyn CityResolver>,
        fares: Arc<dyn FareSearch>,
        default_currency: impl Into<String>,
        policy: SearchFailurePolicy,
    ) -> Self {
        Self {
            resolver,
            fares,
            default_currency: default_currency.into(),
            policy,
        }
    }

    /// One Tequila client serves both resolution and search.
    pub fn from_config(config: &Config) -> Result<Self, FlightError> {
        let client = Arc::new(TequilaClient::new(config)?);
        Ok(Self::new(
            client.clone(),
            client,
            config.default_currency.clone(),
            config.search_failure_policy,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub origin: String,
    pub destinations: Vec<String>,
    pub currency: Option<String>,
}

impl OptimizeRequest {
    /// Trims names and rejects blanks.
    fn into_query(self, default_currency: &str) -> Result<TripQuery, ApiError> {
        let origin = self.origin.trim().to_string();
        if origin.is_empty() {
            return Err(ApiError::invalid_body("origin must not be empty"));
        }
        if self.destinations.is_empty() {
            return Err(ApiError::invalid_body("destinations must contain at least one city"));
        }

        let mut destinations = Vec::with_capacity(self.destinations.len());
        for (i, destination) in self.destinations.into_iter().enumerate() {
            let destination = destination.trim().to_string();
            if destination.is_empty() {
                return Err(ApiError::invalid_body(format!(
                    "destinations[{}] must not be empty",
                    i
                )));
            }
            destinations.push(destination);
        }

        let currency = self
            .currency
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_currency.to_string());

        Ok(TripQuery {
            origin,
            destinations,
            currency,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationResult {
    pub destination: String,
    pub code: String,
    pub price: f64,
    pub distance_km: f64,
    /// Serialized as `null` for zero-distance fares
    pub price_per_km: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub best_destination: String,
    pub price_per_km: f64,
    pub details: Vec<DestinationResult>,
}

impl From<OptimizationOutcome> for OptimizeResponse {
    fn from(outcome: OptimizationOutcome) -> Self {
        Self {
            best_destination: outcome.best.destination.name,
            price_per_km: outcome.best.price_per_km,
            details: outcome
                .results
                .into_iter()
                .map(|r| DestinationResult {
                    destination: r.destination.name,
                    code: r.destination.code,
                    price: r.fare.price,
                    distance_km: r.fare.distance_km,
                    price_per_km: r.price_per_km,
                })
                .collect(),
        }
    }
}

/// Failure response: a status and a `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn invalid_body(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }
}

impl From<OptimizeError> for ApiError {
    fn from(err: OptimizeError) -> Self {
        let (status, detail) = match &err {
            OptimizeError::OriginUnresolved { source, .. } => (
                StatusCode::BAD_REQUEST,
                format!("Origin resolution failed: {}", source),
            ),
            OptimizeError::NoDestinationsResolved => {
                (StatusCode::BAD_REQUEST, "No destinations resolved.".to_string())
            }
            OptimizeError::NoFaresFound => (StatusCode::NOT_FOUND, err.to_string()),
            OptimizeError::SearchFailed { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

async fn optimize(
    Extension(state): Extension<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::invalid_body(rejection.to_string()))?;
    let query = request.into_query(&state.default_currency)?;
    info!(
        origin = %query.origin,
        destinations = query.destinations.len(),
        currency = %query.currency,
        "Optimize request received"
    );

    let outcome = Optimizer::new(state.resolver.as_ref(), state.fares.as_ref())
        .with_policy(state.policy)
        .run(&query, &mut TracingReporter)
        .await
        .map_err(|e| {
            warn!(error = %e, "Optimize request failed");
            ApiError::from(e)
        })?;

    Ok(Json(outcome.into()))
}

/// Router with permissive CORS
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/optimize", post(optimize))
        .layer(Extension(state))
        .layer(cors)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let server = axum::Server::try_bind(&addr)?.serve(router(state).into_make_service());
    info!("listening on {}", server.local_addr());
    server.with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
