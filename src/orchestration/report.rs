//! Normalized route records and the printed report.
//!
//! The raw search response is a deep JSON structure; this module flattens
//! each usable segment into a [`RouteInfo`] record (the cache artifact
//! shape) and renders the human-readable report from those records.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RouteScoutError};

fn unknown() -> String {
    "unknown".to_string()
}

/// One route, direct or with transfers, as cached and displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    #[serde(default = "unknown")]
    pub departure_city: String,
    #[serde(default = "unknown")]
    pub arrival_city: String,
    #[serde(default = "unknown")]
    pub transport: String,
    #[serde(default = "unknown")]
    pub departure_station: String,
    #[serde(default = "unknown")]
    pub departure_time: String,
    #[serde(default = "unknown")]
    pub arrival_station: String,
    #[serde(default = "unknown")]
    pub arrival_time: String,
    #[serde(default)]
    pub has_transfers: bool,
    /// Raw per-leg segments, kept only for routes with transfers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Value>,
}

/// Flatten every usable segment of a search response.
///
/// Responses without a `segments` array are malformed; individual
/// segments missing the required fields are skipped, not fatal.
pub fn extract_routes(response: &Value) -> Result<Vec<RouteInfo>> {
    let segments = response
        .get("segments")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RouteScoutError::MalformedPayload("no segments in API response".to_string())
        })?;

    Ok(segments
        .iter()
        .filter(|segment| is_usable_segment(segment))
        .map(|segment| route_from_segment(response, segment))
        .collect())
}

/// A segment is usable as a direct route (times, endpoints, transport
/// type) or as a transfer route (non-empty details).
fn is_usable_segment(segment: &Value) -> bool {
    let direct = segment.get("arrival").is_some()
        && segment.get("departure").is_some()
        && segment.get("from").is_some()
        && segment.get("to").is_some()
        && segment
            .get("from")
            .and_then(|from| from.get("transport_type"))
            .is_some();
    let with_details = segment
        .get("details")
        .and_then(Value::as_array)
        .is_some_and(|details| !details.is_empty());
    direct || with_details
}

fn str_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(unknown)
}

/// Station display name: `"<type> - <title>"` when a type name exists.
fn station_name(endpoint: &Value) -> String {
    let title = endpoint
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    match endpoint
        .get("station_type_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
    {
        Some(kind) => format!("{kind} - {title}"),
        None => title.to_string(),
    }
}

fn route_from_segment(response: &Value, segment: &Value) -> RouteInfo {
    let search = response.get("search");
    let departure_city = str_or_unknown(
        search
            .and_then(|s| s.get("from"))
            .and_then(|from| from.get("title")),
    );
    let arrival_city = str_or_unknown(
        search
            .and_then(|s| s.get("to"))
            .and_then(|to| to.get("title")),
    );

    let details = segment.get("details").and_then(Value::as_array);
    match details {
        None => {
            let from = segment.get("from");
            let to = segment.get("to");
            RouteInfo {
                departure_city,
                arrival_city,
                transport: str_or_unknown(from.and_then(|f| f.get("transport_type"))),
                departure_station: from.map(station_name).unwrap_or_else(unknown),
                departure_time: segment
                    .get("departure")
                    .and_then(Value::as_str)
                    .map(format_time)
                    .unwrap_or_else(unknown),
                arrival_station: to.map(station_name).unwrap_or_else(unknown),
                arrival_time: segment
                    .get("arrival")
                    .and_then(Value::as_str)
                    .map(format_time)
                    .unwrap_or_else(unknown),
                has_transfers: segment
                    .get("has_transfers")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                segments: Vec::new(),
            }
        }
        Some(details) => {
            let first = details.first();
            let last = details.last();
            // Transfer markers are waypoints, not travel legs.
            let legs = details
                .iter()
                .filter(|detail| {
                    !detail
                        .get("is_transfer")
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            RouteInfo {
                departure_city,
                arrival_city,
                transport: unknown(),
                departure_station: str_or_unknown(
                    first
                        .and_then(|d| d.get("from"))
                        .and_then(|from| from.get("title")),
                ),
                departure_time: first
                    .and_then(|d| d.get("departure"))
                    .and_then(Value::as_str)
                    .map(format_time)
                    .unwrap_or_else(unknown),
                arrival_station: str_or_unknown(
                    last.and_then(|d| d.get("to")).and_then(|to| to.get("title")),
                ),
                arrival_time: last
                    .and_then(|d| d.get("arrival"))
                    .and_then(Value::as_str)
                    .map(format_time)
                    .unwrap_or_else(unknown),
                has_transfers: true,
                segments: legs,
            }
        }
    }
}

/// ISO timestamps render as `YYYY-MM-DD HH:MM`; anything unparsable is
/// shown verbatim.
fn format_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

const SEPARATOR: &str =
    "-------------------------------------------------------------";

/// Render the printed report for a list of routes.
pub fn format_report(routes: &[RouteInfo]) -> String {
    if routes.is_empty() {
        return "No routes found.\n".to_string();
    }

    let mut output = String::from("Routes found:\n\n");
    for route in routes {
        if route.has_transfers {
            format_transfer_route(route, &mut output);
        } else {
            format_direct_route(route, &mut output);
        }
        output.push_str(SEPARATOR);
        output.push_str("\n\n");
    }
    output
}

fn format_direct_route(route: &RouteInfo, output: &mut String) {
    output.push_str(&format!(
        "Direct route: {} - {}\n\n",
        route.departure_city, route.arrival_city
    ));
    output.push_str(&format!("  transport:         {}\n", route.transport));
    output.push_str(&format!("  departure station: {}\n", route.departure_station));
    output.push_str(&format!("  departure time:    {}\n", route.departure_time));
    output.push_str(&format!("  arrival station:   {}\n", route.arrival_station));
    output.push_str(&format!("  arrival time:      {}\n\n", route.arrival_time));
}

fn format_transfer_route(route: &RouteInfo, output: &mut String) {
    output.push_str(&format!(
        "Route with transfers: {} - {}\n",
        route.departure_city, route.arrival_city
    ));
    output.push_str(&format!(
        "Overall: {} - {}\n\n",
        route.departure_time, route.arrival_time
    ));

    for (index, leg) in route.segments.iter().enumerate() {
        output.push_str(&format!("  Leg {}:\n", index + 1));

        let transport = str_or_unknown(
            leg.get("thread")
                .and_then(|thread| thread.get("transport_type")),
        );
        let from = str_or_unknown(leg.get("from").and_then(|from| from.get("title")));
        let to = str_or_unknown(leg.get("to").and_then(|to| to.get("title")));
        let departure = leg
            .get("departure")
            .and_then(Value::as_str)
            .map(format_time)
            .unwrap_or_else(unknown);
        let arrival = leg
            .get("arrival")
            .and_then(Value::as_str)
            .map(format_time)
            .unwrap_or_else(unknown);
        let number = str_or_unknown(leg.get("thread").and_then(|thread| thread.get("number")));
        let carrier = str_or_unknown(
            leg.get("thread")
                .and_then(|thread| thread.get("carrier"))
                .and_then(|carrier| carrier.get("title")),
        );

        output.push_str(&format!("  transport:         {transport}\n"));
        output.push_str(&format!("  departure station: {from}\n"));
        output.push_str(&format!("  departure time:    {departure}\n"));
        output.push_str(&format!("  arrival station:   {to}\n"));
        output.push_str(&format!("  arrival time:      {arrival}\n"));
        output.push_str(&format!("  service {number}, carrier {carrier}\n\n"));
    }
}
