//! Cached route retrieval.
//!
//! Results are cached per (current day, requested date, route) under
//! `<today-yyyymmdd>__<date>_<from>_<to>.json`. A cached artifact is
//! reused while fresh: same year and month as today and at most one
//! calendar day old. Within that rule only today's and yesterday's
//! stamps can qualify, so the lookup probes exactly those two names.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{Result, RouteScoutError};
use crate::scheduler::{Scheduler, Task};

use super::report::{extract_routes, format_report, RouteInfo};
use super::ApiManager;

/// Freshness rule: fresh iff the cache shares year and month with today
/// and is no more than one calendar day old. A stamp from the future
/// (clock skew) is treated as fresh.
pub fn is_cache_fresh(cache_date: NaiveDate, today: NaiveDate) -> bool {
    cache_date.year() == today.year()
        && cache_date.month() == today.month()
        && today.signed_duration_since(cache_date).num_days() <= 1
}

pub struct RoutesHandler {
    scheduler: Arc<Scheduler>,
    api: Arc<ApiManager>,
    cache_dir: PathBuf,
}

impl RoutesHandler {
    pub fn new(scheduler: Arc<Scheduler>, api: Arc<ApiManager>, cache_dir: &Path) -> Self {
        Self {
            scheduler,
            api,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Produce the formatted route report for a fully coded search:
    /// fresh cache when available, fetch-and-cache otherwise.
    pub async fn get_routes(&self, search: &SearchConfig) -> Result<String> {
        let today = Local::now().date_naive();
        match self.try_load_from_cache(search, today).await {
            Ok(report) => {
                info!(
                    departure = %search.departure,
                    arrival = %search.arrival,
                    date = %search.date,
                    "served route report from cache"
                );
                Ok(report)
            }
            Err(reason) => {
                debug!(%reason, "route cache unusable, fetching");
                self.load_from_api_and_cache(search, today).await
            }
        }
    }

    async fn try_load_from_cache(&self, search: &SearchConfig, today: NaiveDate) -> Result<String> {
        for stamp in fresh_cache_stamps(today) {
            let path = self.cache_dir.join(cache_file_name(stamp, search));
            let task_id = format!(
                "cache_read_{}_{}_{}",
                search.departure, search.arrival, search.date
            );
            let outcome = self.scheduler.submit(Task::cache_read(task_id, &path)).await;
            if !outcome.success {
                continue;
            }
            let routes: Vec<RouteInfo> = serde_json::from_str(&outcome.payload)
                .map_err(|e| RouteScoutError::Cache(format!("cache parse error: {e}")))?;
            return Ok(format_report(&routes));
        }
        Err(RouteScoutError::Cache("no fresh cache artifact".to_string()))
    }

    async fn load_from_api_and_cache(
        &self,
        search: &SearchConfig,
        today: NaiveDate,
    ) -> Result<String> {
        let response = self.api.get_routes(search).await?;
        let routes = extract_routes(&response)?;
        let serialized = serde_json::to_string_pretty(&routes)
            .map_err(|e| RouteScoutError::MalformedPayload(format!("serialize routes: {e}")))?;

        // Best effort: the fetched data is still usable when the write
        // fails, so the failure is logged and not surfaced.
        let path = self.cache_dir.join(cache_file_name(today, search));
        let task_id = format!(
            "cache_write_{}_{}_{}",
            search.departure, search.arrival, search.date
        );
        let outcome = self
            .scheduler
            .submit(Task::cache_write(task_id, &path, serialized))
            .await;
        if !outcome.success {
            warn!(
                path = %path.display(),
                reason = %outcome.payload,
                "route cache write failed, returning fetched data"
            );
        }

        Ok(format_report(&routes))
    }
}

/// Stamps a fresh artifact could carry, newest first.
fn fresh_cache_stamps(today: NaiveDate) -> Vec<NaiveDate> {
    let mut stamps = vec![today];
    if let Some(yesterday) = today.pred_opt() {
        if is_cache_fresh(yesterday, today) {
            stamps.push(yesterday);
        }
    }
    stamps
}

fn cache_file_name(stamp: NaiveDate, search: &SearchConfig) -> String {
    format!(
        "{}__{}_{}_{}.json",
        stamp.format("%Y%m%d"),
        search.date,
        search.departure,
        search.arrival
    )
}
