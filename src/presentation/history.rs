use tracing::warn;

use crate::types::{AnalysisRecord, HistoryOrdering, HistoryProjection, HistorySeries, SeriesPoint};

/// Project records into per-metric series, keeping the order they arrived in.
///
/// A metric gets one point per record that carries it and no series at all if
/// no record does.
pub fn project(records: &[AnalysisRecord]) -> HistoryProjection {
    project_iter(records.iter())
}

/// Like [`project`], but stable-sorts the records by timestamp first.
pub fn project_sorted(records: &[AnalysisRecord]) -> HistoryProjection {
    if is_chronological(records) {
        return project(records);
    }
    warn!("history feed is not in timestamp order, sorting before projection");
    let mut ordered: Vec<&AnalysisRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);
    project_iter(ordered.into_iter())
}

pub fn project_with(records: &[AnalysisRecord], ordering: HistoryOrdering) -> HistoryProjection {
    match ordering {
        HistoryOrdering::AsReceived => project(records),
        HistoryOrdering::ByTimestamp => project_sorted(records),
    }
}

/// True when timestamps never decrease. Equal timestamps count as ordered.
pub fn is_chronological(records: &[AnalysisRecord]) -> bool {
    records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

fn project_iter<'a, I>(records: I) -> HistoryProjection
where
    I: Iterator<Item = &'a AnalysisRecord>,
{
    let mut projection = HistoryProjection::new();
    for record in records {
        for (name, metric) in &record.metrics {
            projection
                .entry(name.clone())
                .or_insert_with(|| HistorySeries {
                    unit: metric.unit.clone(),
                    points: Vec::new(),
                })
                .points
                .push(SeriesPoint {
                    at: record.timestamp,
                    value: metric.value,
                });
        }
    }
    projection
}
