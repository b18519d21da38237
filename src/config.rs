//! Process configuration, read once from the environment at start-up

use crate::optimizer::SearchFailurePolicy;
use crate::FlightError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TEQUILA_BASE: &str = "https://tequila-api.kiwi.com";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the CLI and the HTTP service
#[derive(Debug, Clone)]
pub struct Config {
    pub tequila_base: String,
    pub api_key: String,
    pub default_currency: String,
    pub resolve_timeout: Duration,
    pub search_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub log_dir: Option<PathBuf>,
    pub search_failure_policy: SearchFailurePolicy,
}

impl Config {
    /// Load a `.env` file if present, then read the process environment.
    pub fn from_env() -> Result<Self, FlightError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("KIWI_API_KEY")
            .ok_or_else(|| FlightError::InvalidConfig("KIWI_API_KEY is not set".to_string()))?;

        let tequila_base = get("TEQUILA_BASE")
            .unwrap_or_else(|| DEFAULT_TEQUILA_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = get("OPTIMIZER_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| {
            FlightError::InvalidConfig(format!("OPTIMIZER_BIND_ADDR '{}': {}", bind_addr, e))
        })?;

        let search_failure_policy = match get("OPTIMIZER_FAIL_FAST") {
            Some(flag) => {
                if parse_flag("OPTIMIZER_FAIL_FAST", &flag)? {
                    SearchFailurePolicy::FailFast
                } else {
                    SearchFailurePolicy::SkipAndContinue
                }
            }
            None => SearchFailurePolicy::default(),
        };

        Ok(Self {
            tequila_base,
            api_key,
            default_currency: get("DEFAULT_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            resolve_timeout: parse_secs(
                "TEQUILA_RESOLVE_TIMEOUT_SECS",
                get("TEQUILA_RESOLVE_TIMEOUT_SECS"),
            )?
            .unwrap_or(DEFAULT_RESOLVE_TIMEOUT),
            search_timeout: parse_secs(
                "TEQUILA_SEARCH_TIMEOUT_SECS",
                get("TEQUILA_SEARCH_TIMEOUT_SECS"),
            )?
            .unwrap_or(DEFAULT_SEARCH_TIMEOUT),
            bind_addr,
            log_dir: get("OPTIMIZER_LOG_DIR").map(PathBuf::from),
            search_failure_policy,
        })
    }
}

fn parse_secs(key: &str, value: Option<String>) -> Result<Option<Duration>, FlightError> {
    match value {
        None => Ok(None),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(FlightError::InvalidConfig(format!(
                "{} must be a positive number of seconds, got '{}'",
                key, raw
            ))),
            Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        },
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, FlightError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FlightError::InvalidConfig(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}
