//! City-title to station-code resolution.
//!
//! The remote directory nests countries, regions, and settlements; the
//! mapper flattens it once into `"<title> <code>"` lines cached on disk,
//! then resolves titles by exact match. Fields already in coded form are
//! left alone.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{Result, RouteScoutError};
use crate::scheduler::{Scheduler, Task};

use super::ApiManager;

pub const CITY_CACHE_FILE: &str = "cities_codes.txt";

/// A value is already a station code when it is one alphanumeric token:
/// a letter followed by digits, at least two characters, no spaces.
pub fn is_city_code(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_alphabetic()
        && value.len() >= 2
        && !value.contains(' ')
        && chars.all(|c| c.is_ascii_digit())
}

pub struct CityMapper {
    scheduler: Arc<Scheduler>,
    api: Arc<ApiManager>,
    cache_path: PathBuf,
}

impl CityMapper {
    pub fn new(scheduler: Arc<Scheduler>, api: Arc<ApiManager>, cache_dir: &std::path::Path) -> Self {
        Self {
            scheduler,
            api,
            cache_path: cache_dir.join(CITY_CACHE_FILE),
        }
    }

    /// Resolve both search fields to station codes, rewriting them in
    /// place. Fails naming every city that could not be resolved; on
    /// failure the fields keep their original values.
    pub async fn map_city_codes(&self, search: &mut SearchConfig) -> Result<()> {
        let departure_is_code = is_city_code(&search.departure);
        let arrival_is_code = is_city_code(&search.arrival);
        if departure_is_code && arrival_is_code {
            debug!("both cities already coded, skipping lookup");
            return Ok(());
        }

        self.ensure_city_cache().await?;

        let task_id = format!("city_mapping_{}_{}", search.departure, search.arrival);
        let outcome = self
            .scheduler
            .submit(Task::cache_read(task_id, &self.cache_path))
            .await;
        if !outcome.success {
            return Err(RouteScoutError::Cache(format!(
                "failed to read city cache: {}",
                outcome.payload
            )));
        }

        let mut departure_code = None;
        let mut arrival_code = None;
        for line in outcome.payload.lines() {
            // The title may contain spaces; the code is the last token.
            let Some((title, code)) = line.rsplit_once(' ') else {
                continue;
            };
            if !departure_is_code && title == search.departure {
                departure_code = Some(code.to_string());
            }
            if !arrival_is_code && title == search.arrival {
                arrival_code = Some(code.to_string());
            }
        }

        let mut unresolved = Vec::new();
        if !departure_is_code && departure_code.is_none() {
            unresolved.push(search.departure.clone());
        }
        if !arrival_is_code && arrival_code.is_none() {
            unresolved.push(search.arrival.clone());
        }
        if !unresolved.is_empty() {
            return Err(RouteScoutError::Validation(format!(
                "could not resolve city code for: {}",
                unresolved.join(", ")
            )));
        }

        if let Some(code) = departure_code {
            debug!(city = %search.departure, %code, "departure resolved");
            search.departure = code;
        }
        if let Some(code) = arrival_code {
            debug!(city = %search.arrival, %code, "arrival resolved");
            search.arrival = code;
        }
        Ok(())
    }

    /// Make sure a non-empty city cache exists: reuse it when readable,
    /// otherwise fetch the full directory and write it out. A write
    /// failure here fails the mapping, because nothing could be resolved
    /// on the next step anyway.
    async fn ensure_city_cache(&self) -> Result<()> {
        let outcome = self
            .scheduler
            .submit(Task::cache_read("load_cities_cache", &self.cache_path))
            .await;
        if outcome.success {
            return Ok(());
        }
        info!(reason = %outcome.payload, "city cache unavailable, fetching directory");

        let directory = self
            .api
            .fetch_json(
                "load_cities_api".to_string(),
                self.api.stations_list_url(None),
            )
            .await?;
        let flattened = flatten_settlements(&directory);

        let outcome = self
            .scheduler
            .submit(Task::cache_write(
                "save_cities_cache",
                &self.cache_path,
                flattened,
            ))
            .await;
        if !outcome.success {
            return Err(RouteScoutError::Cache(format!(
                "cities fetched but not cached: {}",
                outcome.payload
            )));
        }
        Ok(())
    }
}

/// Flatten the nested directory into one `"<title> <code>"` line per
/// settlement. Entries without a title or code are skipped.
fn flatten_settlements(directory: &Value) -> String {
    let mut lines = String::new();
    let countries = directory
        .get("countries")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for country in countries {
        let regions = country
            .get("regions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for region in regions {
            let settlements = region
                .get("settlements")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for settlement in settlements {
                let title = settlement.get("title").and_then(Value::as_str);
                let code = settlement
                    .get("codes")
                    .and_then(|codes| codes.get("yandex_code"))
                    .and_then(Value::as_str);
                if let (Some(title), Some(code)) = (title, code) {
                    lines.push_str(title);
                    lines.push(' ');
                    lines.push_str(code);
                    lines.push('\n');
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_detection() {
        assert!(is_city_code("c213"));
        assert!(is_city_code("s9600213"));
        assert!(!is_city_code(""));
        assert!(!is_city_code("c"));
        assert!(!is_city_code("213"));
        assert!(!is_city_code("Moscow"));
        assert!(!is_city_code("Nizhny Novgorod"));
        assert!(!is_city_code("c21a"));
    }

    #[test]
    fn flattening_skips_incomplete_settlements() {
        let directory: Value = serde_json::from_str(
            r#"{
                "countries": [{
                    "regions": [{
                        "settlements": [
                            {"title": "Moscow", "codes": {"yandex_code": "c213"}},
                            {"title": "No Code City", "codes": {}},
                            {"codes": {"yandex_code": "c999"}},
                            {"title": "Nizhny Novgorod", "codes": {"yandex_code": "c47"}}
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let flattened = flatten_settlements(&directory);
        assert_eq!(flattened, "Moscow c213\nNizhny Novgorod c47\n");
    }

    #[test]
    fn flattening_tolerates_foreign_shapes() {
        assert_eq!(flatten_settlements(&serde_json::json!({})), "");
        assert_eq!(
            flatten_settlements(&serde_json::json!({"countries": "nope"})),
            ""
        );
    }
}
