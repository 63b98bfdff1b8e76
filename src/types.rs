use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::presentation::classify;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub patient_id: Option<String>,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub history_ordering: HistoryOrdering,
}

/// Discrete visual-emphasis tier for a status string.
///
/// Ordered by emphasis so the worst of several tiers is simply the max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "normal",
            SeverityTier::Warning => "warning",
            SeverityTier::Critical => "critical",
        }
    }

    /// Badge color name used by the dashboard's status chips.
    pub fn badge_color(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "success",
            SeverityTier::Warning => "warning",
            SeverityTier::Critical => "error",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, unit-bearing voice measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub(crate) value: f64,
    pub(crate) unit: String,
    pub(crate) status: String,
}

impl Metric {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn severity(&self) -> SeverityTier {
        classify(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthIndicators {
    pub(crate) fatigue_score: f64,
    pub(crate) stress_indicator: f64,
    pub(crate) overall_status: String,
}

impl HealthIndicators {
    pub fn fatigue_score(&self) -> f64 {
        self.fatigue_score
    }

    pub fn stress_indicator(&self) -> f64 {
        self.stress_indicator
    }

    pub fn overall_status(&self) -> &str {
        &self.overall_status
    }
}

/// One completed analysis of a voice sample.
///
/// Only built by [`crate::presentation::normalize`], so every instance has
/// passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub(crate) metrics: BTreeMap<String, Metric>,
    pub(crate) health_indicators: HealthIndicators,
    pub(crate) recommendations: Vec<String>,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) sample_id: Option<String>,
    pub(crate) patient_id: Option<String>,
}

impl AnalysisRecord {
    pub fn metrics(&self) -> &BTreeMap<String, Metric> {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn health_indicators(&self) -> &HealthIndicators {
        &self.health_indicators
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn sample_id(&self) -> Option<&str> {
        self.sample_id.as_deref()
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn overall_severity(&self) -> SeverityTier {
        classify(&self.health_indicators.overall_status)
    }

    /// Worst tier across the per-metric statuses; `Normal` when there are no metrics.
    pub fn highest_metric_severity(&self) -> SeverityTier {
        self.metrics
            .values()
            .map(Metric::severity)
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Values of one metric across several analyses, in projection order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    pub(crate) unit: String,
    pub(crate) points: Vec<SeriesPoint>,
}

impl HistorySeries {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Change between the last two points.
    pub fn delta(&self) -> Option<f64> {
        match self.points.as_slice() {
            [.., prev, last] => Some(last.value - prev.value),
            _ => None,
        }
    }

    pub fn min_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::max)
    }
}

/// Metric name to series. Keys iterate alphabetically.
pub type HistoryProjection = BTreeMap<String, HistorySeries>;

/// Which projection variant to use for history feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryOrdering {
    /// Trust the order the service sent.
    AsReceived,
    /// Stable-sort by timestamp before projecting.
    #[default]
    ByTimestamp,
}

/// Result of a successful sample upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub status: u16,
    /// The analysis the service returned for the sample, if it normalized.
    pub record: Option<AnalysisRecord>,
}
