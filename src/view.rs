use chrono::SecondsFormat;
use serde::Serialize;

use crate::dashboard::DashboardSnapshot;
use crate::types::{AnalysisRecord, HistoryProjection, SeverityTier};

#[derive(Debug, Clone, Serialize)]
pub struct MetricView {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: String,
    pub severity: SeverityTier,
    pub badge: &'static str,
}

/// Display binding for the "latest analysis" card.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub timestamp: String,
    pub metrics: Vec<MetricView>,
    pub fatigue_score: f64,
    pub stress_indicator: f64,
    pub overall_status: String,
    pub overall_severity: SeverityTier,
    pub overall_badge: &'static str,
    pub recommendations: Vec<String>,
}

pub fn build_analysis_view(record: &AnalysisRecord) -> AnalysisView {
    let metrics = record
        .metrics()
        .iter()
        .map(|(name, m)| {
            let severity = m.severity();
            MetricView {
                name: name.clone(),
                value: m.value(),
                unit: m.unit().to_string(),
                status: m.status().to_string(),
                severity,
                badge: severity.badge_color(),
            }
        })
        .collect();

    let hi = record.health_indicators();
    let overall_severity = record.overall_severity();
    AnalysisView {
        timestamp: record.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
        metrics,
        fatigue_score: hi.fatigue_score(),
        stress_indicator: hi.stress_indicator(),
        overall_status: hi.overall_status().to_string(),
        overall_severity,
        overall_badge: overall_severity.badge_color(),
        recommendations: record.recommendations().to_vec(),
    }
}

/// Chart-ready series: one line per metric, points as `{t, v}`.
pub fn build_chart_payload(series: &HistoryProjection) -> serde_json::Value {
    let lines: Vec<serde_json::Value> = series
        .iter()
        .map(|(name, s)| {
            let points: Vec<serde_json::Value> = s
                .points()
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "t": p.at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        "v": p.value,
                    })
                })
                .collect();
            serde_json::json!({
                "metric": name,
                "unit": s.unit(),
                "points": points,
            })
        })
        .collect();
    serde_json::json!({ "series": lines })
}

pub fn build_snapshot_json(snapshot: &DashboardSnapshot) -> serde_json::Value {
    serde_json::json!({
        "patient_id": snapshot.patient_id,
        "latest": snapshot.latest.as_ref().map(build_analysis_view),
        "history": build_chart_payload(&snapshot.series),
    })
}

pub fn render_analysis_text(record: &AnalysisRecord) -> String {
    let view = build_analysis_view(record);
    let mut lines = vec![format!("Latest analysis ({})", view.timestamp)];

    for m in &view.metrics {
        lines.push(format!("• {}: {} {} [{}]", m.name, m.value, m.unit, m.severity));
    }
    if view.metrics.is_empty() {
        lines.push("No metrics reported.".to_string());
    }

    lines.push(format!(
        "Overall status: {} [{}] | fatigue {:.2} | stress {:.2}",
        view.overall_status, view.overall_severity, view.fatigue_score, view.stress_indicator
    ));

    lines.push("Recommendations:".to_string());
    for r in &view.recommendations {
        lines.push(format!("  - {}", r));
    }
    if view.recommendations.is_empty() {
        lines.push("  (none)".to_string());
    }
    lines.join("\n")
}

pub fn render_history_text(series: &HistoryProjection) -> String {
    let mut lines = vec!["History".to_string()];
    for (name, s) in series {
        let latest = s.latest().map(|p| format!("{}", p.value)).unwrap_or_else(|| "-".to_string());
        let delta = s.delta().map(|d| format!(" ({:+.2})", d)).unwrap_or_default();
        let range = match (s.min_value(), s.max_value()) {
            (Some(lo), Some(hi)) => format!("{}..{}", lo, hi),
            _ => "-".to_string(),
        };
        lines.push(format!(
            "• {}: {} points, latest {} {}{}, range {}",
            name,
            s.len(),
            latest,
            s.unit(),
            delta,
            range
        ));
    }
    if series.is_empty() {
        lines.push("No history available.".to_string());
    }
    lines.join("\n")
}

pub fn render_snapshot_text(snapshot: &DashboardSnapshot) -> String {
    let latest = snapshot
        .latest
        .as_ref()
        .map(render_analysis_text)
        .unwrap_or_else(|| "No analysis available.".to_string());
    format!(
        "Patient {}\n\n{}\n\n{}",
        snapshot.patient_id,
        latest,
        render_history_text(&snapshot.series)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{normalize, project};
    use serde_json::json;

    fn record() -> AnalysisRecord {
        normalize(&json!({
            "timestamp": "2024-05-01T10:15:30Z",
            "metrics": {
                "pitch": {"value": 182.4, "unit": "Hz", "status": "normal"},
                "pause_duration": {"value": 2.4, "unit": "seconds", "status": "critical"},
                "speech_rate": {"value": 95.0, "unit": "words/min", "status": "warning"}
            },
            "health_indicators": {
                "fatigue_score": 0.58,
                "stress_indicator": 0.36,
                "overall_status": "attention_needed"
            },
            "recommendations": ["Consider follow-up"]
        }))
        .unwrap()
    }

    #[test]
    fn test_analysis_view_severities() {
        let view = build_analysis_view(&record());
        assert_eq!(view.timestamp, "2024-05-01T10:15:30Z");
        assert_eq!(view.overall_severity, SeverityTier::Warning);
        assert_eq!(view.overall_badge, "warning");

        let by_name = |n: &str| view.metrics.iter().find(|m| m.name == n).unwrap();
        assert_eq!(by_name("pitch").severity, SeverityTier::Normal);
        assert_eq!(by_name("pitch").badge, "success");
        assert_eq!(by_name("pause_duration").severity, SeverityTier::Critical);
        assert_eq!(by_name("pause_duration").badge, "error");
        assert_eq!(by_name("speech_rate").severity, SeverityTier::Warning);
    }

    #[test]
    fn test_analysis_view_serializes_lowercase_tiers() {
        let value = serde_json::to_value(build_analysis_view(&record())).unwrap();
        assert_eq!(value["overall_severity"], "warning");
        assert_eq!(value["metrics"][0]["name"], "pause_duration");
        assert_eq!(value["metrics"][0]["severity"], "critical");
    }

    #[test]
    fn test_chart_payload_shape() {
        let payload = build_chart_payload(&project(&[record()]));
        let series = payload["series"].as_array().unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[1]["metric"], "pitch");
        assert_eq!(series[1]["unit"], "Hz");
        assert_eq!(series[1]["points"][0]["t"], "2024-05-01T10:15:30Z");
        assert_eq!(series[1]["points"][0]["v"], 182.4);

        let empty = build_chart_payload(&HistoryProjection::new());
        assert_eq!(empty["series"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_render_text() {
        let text = render_analysis_text(&record());
        assert!(text.contains("pitch: 182.4 Hz [normal]"));
        assert!(text.contains("pause_duration: 2.4 seconds [critical]"));
        assert!(text.contains("Overall status: attention_needed [warning]"));
        assert!(text.contains("- Consider follow-up"));

        let history = render_history_text(&HistoryProjection::new());
        assert!(history.contains("No history available."));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let snapshot = DashboardSnapshot {
            patient_id: "P001".to_string(),
            ..Default::default()
        };
        let text = render_snapshot_text(&snapshot);
        assert!(text.contains("Patient P001"));
        assert!(text.contains("No analysis available."));

        let value = build_snapshot_json(&snapshot);
        assert!(value["latest"].is_null());
    }
}
