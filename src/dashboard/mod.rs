use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::AnalysisClient;
use crate::error::{DashboardError, Result};
use crate::presentation::project_with;
use crate::types::{AnalysisRecord, HistoryOrdering, HistoryProjection, UploadReceipt};

/// Immutable view of what the dashboard currently shows.
///
/// Renderers get an `Arc` of this; a refresh swaps in a new one.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub patient_id: String,
    pub latest: Option<AnalysisRecord>,
    pub history: Vec<AnalysisRecord>,
    pub series: HistoryProjection,
}

/// Page-level controller: owns the client and the current snapshot.
pub struct Dashboard {
    client: AnalysisClient,
    patient_id: String,
    ordering: HistoryOrdering,
    snapshot: Arc<DashboardSnapshot>,
}

impl Dashboard {
    pub fn new(client: AnalysisClient, patient_id: impl Into<String>, ordering: HistoryOrdering) -> Self {
        let patient_id = patient_id.into();
        Self {
            client,
            snapshot: Arc::new(DashboardSnapshot {
                patient_id: patient_id.clone(),
                ..Default::default()
            }),
            patient_id,
            ordering,
        }
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Fetch latest analysis and history concurrently.
    ///
    /// Each pane is updated on its own; a failed fetch leaves that pane's
    /// previous data in place.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let (latest, history) = tokio::join!(
            self.client.fetch_latest(&self.patient_id),
            self.client.fetch_history(&self.patient_id),
        );

        let mut next = DashboardSnapshot::clone(&self.snapshot);
        let mut outcome = RefreshOutcome::default();

        match latest {
            Ok(record) => next.latest = Some(record),
            Err(e) => {
                warn!("latest analysis for {} not updated: {}", self.patient_id, e);
                outcome.latest_error = Some(e);
            }
        }

        match history {
            Ok(mut records) => {
                // Keep the record list in the same order as the projected series
                if self.ordering == HistoryOrdering::ByTimestamp {
                    records.sort_by_key(|r| r.timestamp());
                }
                next.series = project_with(&records, self.ordering);
                next.history = records;
            }
            Err(e) => {
                warn!("history for {} not updated: {}", self.patient_id, e);
                outcome.history_error = Some(e);
            }
        }

        info!(
            "dashboard refreshed: latest={}, history records={}, series={}",
            next.latest.is_some(),
            next.history.len(),
            next.series.len()
        );
        self.snapshot = Arc::new(next);
        outcome
    }

    /// Upload a voice sample, then refresh whether or not the upload worked.
    pub async fn submit_sample(&mut self, path: &Path) -> SubmitOutcome {
        let upload = self.client.upload_sample(&self.patient_id, path).await;
        if let Err(e) = &upload {
            warn!("voice sample not submitted: {}", e);
        }
        let refresh = self.refresh().await;
        SubmitOutcome { upload, refresh }
    }
}

/// Per-pane errors from one refresh.
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    pub latest_error: Option<DashboardError>,
    pub history_error: Option<DashboardError>,
}

impl RefreshOutcome {
    pub fn is_complete(&self) -> bool {
        self.latest_error.is_none() && self.history_error.is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DashboardError> {
        self.latest_error.iter().chain(self.history_error.iter())
    }
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub upload: Result<UploadReceipt>,
    pub refresh: RefreshOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_outcome_completeness() {
        let outcome = RefreshOutcome::default();
        assert!(outcome.is_complete());
        assert_eq!(outcome.errors().count(), 0);

        let outcome = RefreshOutcome {
            latest_error: None,
            history_error: Some(DashboardError::malformed("history payload is not an array")),
        };
        assert!(!outcome.is_complete());
        assert_eq!(outcome.errors().count(), 1);
    }

    #[test]
    fn test_new_dashboard_starts_empty() {
        let cfg = crate::types::Config {
            api_base_url: "http://127.0.0.1:9".to_string(),
            api_key: "s3cret".to_string(),
            api_key_header: "X-API-KEY".to_string(),
            patient_id: None,
            request_timeout_secs: 1,
            max_upload_bytes: 1024,
            history_ordering: HistoryOrdering::ByTimestamp,
        };
        let dashboard = Dashboard::new(AnalysisClient::new(&cfg).unwrap(), "P001", cfg.history_ordering);
        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.patient_id, "P001");
        assert!(snapshot.latest.is_none());
        assert!(snapshot.history.is_empty());
        assert!(snapshot.series.is_empty());
    }
}
