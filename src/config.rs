//! Application configuration with environment overrides.

use std::path::PathBuf;

use crate::error::{Result, RouteScoutError};

/// Process-level settings: cache location, worker pool sizing, API shape.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory for the city-code map and per-route result caches.
    pub cache_dir: PathBuf,
    /// Fixed size of the blocking worker pool.
    pub worker_threads: usize,
    /// Base URL of the timetable API, without a trailing slash.
    pub api_base_url: String,
    /// Language tag forwarded to the API.
    pub language: String,
    /// Maximum number of route segments requested per search.
    pub route_limit: u32,
    /// Idle heartbeat period for the input channel, in milliseconds.
    pub heartbeat_ms: u64,
    /// Delay before shutdown after a failed key validation, in milliseconds.
    pub shutdown_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            worker_threads: 4,
            api_base_url: "https://api.rasp.yandex.net/v3.0".to_string(),
            language: "ru_RU".to_string(),
            route_limit: 10_000,
            heartbeat_ms: 100,
            shutdown_delay_ms: 100,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ROUTE_SCOUT_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Ok(workers) = std::env::var("ROUTE_SCOUT_WORKER_THREADS") {
            config.worker_threads = workers.parse().map_err(|e| {
                RouteScoutError::Configuration(format!("invalid worker_threads: {e}"))
            })?;
            if config.worker_threads == 0 {
                return Err(RouteScoutError::Configuration(
                    "worker_threads must be at least 1".to_string(),
                ));
            }
        }

        if let Ok(base) = std::env::var("ROUTE_SCOUT_API_BASE_URL") {
            config.api_base_url = base.trim_end_matches('/').to_string();
        }

        if let Ok(lang) = std::env::var("ROUTE_SCOUT_LANGUAGE") {
            config.language = lang;
        }

        if let Ok(limit) = std::env::var("ROUTE_SCOUT_ROUTE_LIMIT") {
            config.route_limit = limit
                .parse()
                .map_err(|e| RouteScoutError::Configuration(format!("invalid route_limit: {e}")))?;
        }

        Ok(config)
    }
}

/// The mutable search parameters owned by the session controller.
///
/// Orchestrators borrow this for the duration of a single workflow call;
/// the city mapper rewrites town fields in place once codes are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConfig {
    pub departure: String,
    pub arrival: String,
    pub date: String,
}

impl SearchConfig {
    /// All three fields are required before a search can run.
    pub fn is_complete(&self) -> bool {
        !self.departure.is_empty() && !self.arrival.is_empty() && !self.date.is_empty()
    }

    pub fn describe(&self) -> String {
        fn or_unset(value: &str) -> &str {
            if value.is_empty() {
                "(not set)"
            } else {
                value
            }
        }

        format!(
            "  departure: {}\n  arrival:   {}\n  date:      {}",
            or_unset(&self.departure),
            or_unset(&self.arrival),
            or_unset(&self.date)
        )
    }
}
