//! Shared test fixtures: a scripted transport standing in for the
//! remote timetable API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use route_scout::config::{AppConfig, SearchConfig};
use route_scout::transport::{HttpResponse, Transport};
use route_scout::Result;

/// Answers stations-list requests with a fixed city directory and search
/// requests with one direct Moscow → Saint Petersburg route, counting
/// calls per endpoint.
#[derive(Default)]
pub struct ScriptedTransport {
    pub stations_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let body = if url.contains("stations_list") {
            self.stations_calls.fetch_add(1, Ordering::SeqCst);
            city_directory()
        } else {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            search_response()
        };
        Ok(HttpResponse { status: 200, body })
    }
}

pub fn city_directory() -> String {
    serde_json::json!({
        "countries": [{
            "regions": [{
                "settlements": [
                    {"title": "Moscow", "codes": {"yandex_code": "c213"}},
                    {"title": "Saint Petersburg", "codes": {"yandex_code": "c2"}},
                    {"title": "Nizhny Novgorod", "codes": {"yandex_code": "c47"}}
                ]
            }]
        }]
    })
    .to_string()
}

pub fn search_response() -> String {
    serde_json::json!({
        "search": {
            "from": {"title": "Moscow"},
            "to": {"title": "Saint Petersburg"}
        },
        "segments": [{
            "departure": "2025-06-01T08:00:00+03:00",
            "arrival": "2025-06-01T12:00:00+03:00",
            "from": {
                "title": "Leningradsky Station",
                "station_type_name": "station",
                "transport_type": "train"
            },
            "to": {
                "title": "Moskovsky Station",
                "station_type_name": "station"
            },
            "has_transfers": false
        }]
    })
    .to_string()
}

pub fn test_config(cache_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        cache_dir: cache_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

pub fn moscow_to_petersburg() -> SearchConfig {
    SearchConfig {
        departure: "Moscow".to_string(),
        arrival: "Saint Petersburg".to_string(),
        date: "2025-06-01".to_string(),
    }
}
