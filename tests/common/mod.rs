//! In-process stand-in for the Tequila API, served by axum on an ephemeral port

#![allow(dead_code)]

use axum::extract::{Extension, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use flight_optimizer::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test-key";

/// Canned data; city terms are matched case-insensitively
#[derive(Default)]
pub struct MockTequila {
    cities: HashMap<String, Vec<(String, String)>>,
    fares: HashMap<String, Value>,
    failing: Vec<String>,
    slow: Vec<String>,
    failing_cities: Vec<String>,
    slow_cities: Vec<String>,
    requests: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl MockTequila {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(self, term: &str, code: &str, name: &str) -> Self {
        self.candidates(term, &[(code, name)])
    }

    pub fn candidates(mut self, term: &str, candidates: &[(&str, &str)]) -> Self {
        self.cities.insert(
            term.to_lowercase(),
            candidates
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        );
        self
    }

    pub fn fare(mut self, destination_code: &str, price: Value, distance: Value) -> Self {
        self.fares.insert(
            destination_code.to_string(),
            json!({ "price": price, "distance": distance, "flyTo": destination_code }),
        );
        self
    }

    /// Searches to this code answer 500
    pub fn failing(mut self, destination_code: &str) -> Self {
        self.failing.push(destination_code.to_string());
        self
    }

    /// Searches to this code answer after three seconds
    pub fn slow(mut self, destination_code: &str) -> Self {
        self.slow.push(destination_code.to_string());
        self
    }

    /// Lookups of this term answer 500
    pub fn failing_city(mut self, term: &str) -> Self {
        self.failing_cities.push(term.to_lowercase());
        self
    }

    /// Lookups of this term answer after three seconds
    pub fn slow_city(mut self, term: &str) -> Self {
        self.slow_cities.push(term.to_lowercase());
        self
    }

    fn record(&self, path: &str, params: &HashMap<String, String>) {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), params.clone()));
    }

    pub fn requests_to(&self, path: &str) -> Vec<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Invalid API key" }))).into_response()
}

async fn locations(
    Extension(mock): Extension<Arc<MockTequila>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.record("/locations/query", &params);
    if !authorized(&headers) {
        return forbidden();
    }

    let term = params.get("term").map(|t| t.to_lowercase()).unwrap_or_default();
    if mock.failing_cities.contains(&term) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if mock.slow_cities.contains(&term) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    let locations: Vec<Value> = mock
        .cities
        .get(&term)
        .map(|candidates| {
            candidates
                .iter()
                .map(|(code, name)| json!({ "code": code, "name": name, "type": "city" }))
                .collect()
        })
        .unwrap_or_default();

    Json(json!({ "locations": locations })).into_response()
}

async fn search(
    Extension(mock): Extension<Arc<MockTequila>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.record("/v2/search", &params);
    if !authorized(&headers) {
        return forbidden();
    }

    let destination = params.get("fly_to").cloned().unwrap_or_default();
    if mock.failing.contains(&destination) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if mock.slow.contains(&destination) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let data: Vec<Value> = mock.fares.get(&destination).cloned().into_iter().collect();
    Json(json!({ "data": data, "currency": params.get("curr") })).into_response()
}

/// Serve `app` on 127.0.0.1 and return its base URL.
pub async fn spawn(app: Router) -> String {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let local_addr = server.local_addr();
    tokio::spawn(server);
    format!("http://{}", local_addr)
}

pub async fn spawn_mock(mock: MockTequila) -> (String, Arc<MockTequila>) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/locations/query", get(locations))
        .route("/v2/search", get(search))
        .layer(Extension(mock.clone()));
    (spawn(app).await, mock)
}

pub fn config_for(base_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("KIWI_API_KEY".into(), API_KEY.into());
    vars.insert("TEQUILA_BASE".into(), base_url.into());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// London plus three destinations: Paris is the best value, Berlin has no flights
pub fn europe() -> MockTequila {
    MockTequila::new()
        .city("London", "LON", "London")
        .city("Paris", "PAR", "Paris")
        .city("Rome", "ROM", "Rome")
        .city("Berlin", "BER", "Berlin")
        .fare("PAR", json!(80), json!(400))
        .fare("ROM", json!(150), json!(500))
}
