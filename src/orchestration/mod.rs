//! # Workflow Orchestrators
//!
//! Each orchestrator composes one or more scheduler submissions into a
//! multi-stage workflow, translating raw task outcomes into domain-level
//! results. All of them run on the session loop; none blocks its caller.
//!
//! - [`ApiManager`] - request building, API key validation, raw route
//!   fetching.
//! - [`CityMapper`] - city-title to station-code resolution backed by an
//!   on-disk directory cache.
//! - [`RoutesHandler`] - cached route retrieval with a freshness window,
//!   falling back to fetch-and-cache.

mod api_manager;
mod city_mapper;
mod report;
mod routes_handler;

pub use api_manager::ApiManager;
pub use city_mapper::{is_city_code, CityMapper, CITY_CACHE_FILE};
pub use report::{extract_routes, format_report, RouteInfo};
pub use routes_handler::{is_cache_fresh, RoutesHandler};

use crate::error::RouteScoutError;
use crate::scheduler::TaskOutcome;

/// Map a failed task outcome onto the error taxonomy by its payload.
fn outcome_error(outcome: TaskOutcome) -> RouteScoutError {
    debug_assert!(!outcome.success);
    let payload = outcome.payload;
    if payload.contains("already running") || payload.contains("scheduler is stopped") {
        RouteScoutError::Scheduling(payload)
    } else if payload.starts_with("JSON parse error") {
        RouteScoutError::MalformedPayload(payload)
    } else if payload.starts_with("cache") || payload.contains("cache file") {
        RouteScoutError::Cache(payload)
    } else {
        RouteScoutError::Transport(payload)
    }
}
