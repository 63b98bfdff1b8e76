use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::types::{AnalysisRecord, HealthIndicators, Metric};

// ISO-8601 offsets written without a colon, e.g. `+0200`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

// Offset-less timestamps are what the service's `utcnow().isoformat()` emits.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Validate one raw analysis payload and build the canonical record.
///
/// All-or-nothing: either every required field checks out or the caller gets
/// `MalformedPayload` and no record.
pub fn normalize(raw: &Value) -> Result<AnalysisRecord> {
    let obj = raw
        .as_object()
        .ok_or_else(|| DashboardError::malformed("payload is not a JSON object"))?;

    let metrics = match obj.get("metrics") {
        Some(Value::Object(m)) => normalize_metrics(m)?,
        Some(_) => return Err(DashboardError::malformed("`metrics` is not an object")),
        None => return Err(DashboardError::malformed("`metrics` is missing")),
    };

    let health_indicators = normalize_indicators(obj.get("health_indicators"))?;
    let recommendations = normalize_recommendations(obj.get("recommendations"));

    let timestamp = match obj.get("timestamp").and_then(Value::as_str) {
        Some(s) => parse_timestamp(s).ok_or_else(|| {
            DashboardError::malformed(format!("`timestamp` {:?} is not a parseable instant", s))
        })?,
        None => return Err(DashboardError::malformed("`timestamp` is missing or not a string")),
    };

    Ok(AnalysisRecord {
        metrics,
        health_indicators,
        recommendations,
        timestamp,
        sample_id: optional_string(obj, "sample_id"),
        patient_id: optional_string(obj, "patient_id"),
    })
}

/// Normalize a history feed (a JSON array of analysis payloads).
///
/// One bad entry fails the whole feed; the error names its index.
pub fn normalize_history(raw: &Value) -> Result<Vec<AnalysisRecord>> {
    let items = raw
        .as_array()
        .ok_or_else(|| DashboardError::malformed("history payload is not an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            normalize(item).map_err(|e| match e {
                DashboardError::MalformedPayload { reason } => {
                    DashboardError::malformed(format!("history entry {}: {}", i, reason))
                }
                other => other,
            })
        })
        .collect()
}

/// Parse an ISO-8601 instant. Offsets are honoured; offset-less values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn normalize_metrics(raw: &Map<String, Value>) -> Result<BTreeMap<String, Metric>> {
    let mut metrics = BTreeMap::new();
    for (name, entry) in raw {
        let entry = entry
            .as_object()
            .ok_or_else(|| DashboardError::malformed(format!("metric `{}` is not an object", name)))?;

        let value = entry
            .get("value")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .ok_or_else(|| DashboardError::malformed(format!("metric `{}` has no finite `value`", name)))?;
        let unit = non_empty_string(entry, "unit")
            .ok_or_else(|| DashboardError::malformed(format!("metric `{}` has no `unit`", name)))?;
        let status = non_empty_string(entry, "status")
            .ok_or_else(|| DashboardError::malformed(format!("metric `{}` has no `status`", name)))?;

        metrics.insert(name.clone(), Metric { value, unit, status });
    }
    Ok(metrics)
}

fn normalize_indicators(raw: Option<&Value>) -> Result<HealthIndicators> {
    let obj = raw
        .and_then(Value::as_object)
        .ok_or_else(|| DashboardError::malformed("`health_indicators` is missing or not an object"))?;

    let number = |key: &str| {
        obj.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .ok_or_else(|| DashboardError::malformed(format!("`health_indicators.{}` is missing or not a number", key)))
    };
    let fatigue_score = number("fatigue_score")?;
    let stress_indicator = number("stress_indicator")?;

    let overall_status = obj
        .get("overall_status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DashboardError::malformed("`health_indicators.overall_status` is missing or not a string"))?;

    Ok(HealthIndicators {
        fatigue_score,
        stress_indicator,
        overall_status,
    })
}

/// Recommendations are advisory: anything other than an array of strings
/// is dropped with a warning instead of failing the record.
fn normalize_recommendations(raw: Option<&Value>) -> Vec<String> {
    match raw {
        None | Some(Value::Null) => {
            debug!("payload has no recommendations, defaulting to empty");
            Vec::new()
        }
        Some(Value::Array(items)) => {
            let recommendations: Option<Vec<String>> =
                items.iter().map(|item| item.as_str().map(str::to_string)).collect();
            recommendations.unwrap_or_else(|| {
                warn!("`recommendations` contains a non-string entry, defaulting to empty");
                Vec::new()
            })
        }
        Some(_) => {
            warn!("`recommendations` is not an array, defaulting to empty");
            Vec::new()
        }
    }
}

fn non_empty_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
