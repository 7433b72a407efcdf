//! Request building and raw API access.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::{AppConfig, SearchConfig};
use crate::error::{Result, RouteScoutError};
use crate::scheduler::{Scheduler, Task};
use crate::transport::Transport;

use super::outcome_error;

/// Builds request targets for the timetable API and runs fetch tasks
/// through the scheduler.
pub struct ApiManager {
    scheduler: Arc<Scheduler>,
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    language: String,
    route_limit: u32,
}

impl ApiManager {
    pub fn new(
        scheduler: Arc<Scheduler>,
        transport: Arc<dyn Transport>,
        api_key: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        Self {
            scheduler,
            transport,
            api_key: api_key.into(),
            base_url: config.api_base_url.clone(),
            language: config.language.clone(),
            route_limit: config.route_limit,
        }
    }

    /// Route search endpoint for one (from, to, date) triple.
    pub fn search_url(&self, search: &SearchConfig) -> String {
        format!(
            "{}/search/?apikey={}&format=json&from={}&to={}&lang={}&date={}&transfers=true&limit={}",
            self.base_url,
            self.api_key,
            search.departure,
            search.arrival,
            self.language,
            search.date,
            self.route_limit
        )
    }

    /// Full station directory, or a one-entry probe when `limit` is set.
    pub fn stations_list_url(&self, limit: Option<u32>) -> String {
        let mut url = format!(
            "{}/stations_list/?apikey={}&lang={}&format=json",
            self.base_url, self.api_key, self.language
        );
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={limit}"));
        }
        url
    }

    /// Probe the stations endpoint to decide whether the key works.
    ///
    /// A structurally valid response without an explicit error field
    /// counts as a valid key; anything else is invalid.
    pub async fn validate_key(&self) -> bool {
        let outcome = self
            .scheduler
            .submit(Task::fetch(
                "api_key_validation",
                self.stations_list_url(Some(1)),
                Arc::clone(&self.transport),
            ))
            .await;

        if !outcome.success {
            debug!(reason = %outcome.payload, "key validation request failed");
            return false;
        }

        match serde_json::from_str::<Value>(&outcome.payload) {
            Ok(body) => {
                let valid = body.get("error").is_none()
                    && (body.get("countries").is_some()
                        || body.get("stations").is_some()
                        || body.is_array());
                info!(valid, "API key validated");
                valid
            }
            Err(_) => false,
        }
    }

    /// Fetch the raw route listing for a fully coded search.
    ///
    /// The task id is derived from the route key, so an identical search
    /// issued while one is still in flight fails with a scheduling error.
    pub async fn get_routes(&self, search: &SearchConfig) -> Result<Value> {
        let task_id = format!(
            "api_request_{}_{}_{}",
            search.departure, search.arrival, search.date
        );
        self.fetch_json(task_id, self.search_url(search)).await
    }

    /// Submit one fetch task and parse the payload as JSON.
    pub(crate) async fn fetch_json(&self, task_id: String, url: String) -> Result<Value> {
        let outcome = self
            .scheduler
            .submit(Task::fetch(task_id, url, Arc::clone(&self.transport)))
            .await;

        if !outcome.success {
            return Err(outcome_error(outcome));
        }
        serde_json::from_str(&outcome.payload)
            .map_err(|e| RouteScoutError::MalformedPayload(format!("JSON parse error: {e}")))
    }
}
