use serde_json::{json, Value};
use voice_health_dashboard::{
    build_snapshot_json, classify, load_config_with_env, normalize, normalize_history, project,
    project_sorted, project_with, render_snapshot_text, AnalysisRecord, DashboardError,
    DashboardSnapshot, HistoryOrdering, MockEnvironment, SeverityTier,
};

fn payload(timestamp: &str, metrics: Value) -> Value {
    json!({
        "timestamp": timestamp,
        "metrics": metrics,
        "health_indicators": {
            "fatigue_score": 0.4,
            "stress_indicator": 0.3,
            "overall_status": "normal"
        },
        "recommendations": ["No action needed"]
    })
}

fn metric(value: f64, unit: &str, status: &str) -> Value {
    json!({"value": value, "unit": unit, "status": status})
}

fn record(timestamp: &str, metrics: Value) -> AnalysisRecord {
    normalize(&payload(timestamp, metrics)).unwrap()
}

#[test]
fn test_classify_is_total() {
    assert_eq!(classify("critical"), SeverityTier::Critical);
    assert_eq!(classify("warning"), SeverityTier::Warning);
    assert_eq!(classify("attention_needed"), SeverityTier::Warning);
    assert_eq!(classify("ok"), SeverityTier::Normal);
    assert_eq!(classify(""), SeverityTier::Normal);

    for s in ["normal", "unknown", "Critical", "warning ", "\n", "status:critical"] {
        // Never panics, always one of the three tiers
        let tier = classify(s);
        assert!(matches!(tier, SeverityTier::Normal | SeverityTier::Warning | SeverityTier::Critical));
    }
}

#[test]
fn test_metric_and_overall_share_classification() {
    let mut raw = payload(
        "2024-05-01T10:00:00Z",
        json!({
            "pitch": metric(310.0, "Hz", "critical"),
            "speech_rate": metric(150.0, "words/min", "warning"),
        }),
    );
    for status in ["critical", "warning", "attention_needed", "normal", "brand_new_status"] {
        raw["health_indicators"]["overall_status"] = json!(status);
        raw["metrics"]["pitch"]["status"] = json!(status);
        let record = normalize(&raw).unwrap();
        assert_eq!(record.overall_severity(), classify(status));
        assert_eq!(record.metric("pitch").unwrap().severity(), record.overall_severity());
    }
}

#[test]
fn test_highest_metric_severity() {
    let r = record(
        "2024-05-01T10:00:00Z",
        json!({
            "pitch": metric(310.0, "Hz", "critical"),
            "speech_rate": metric(150.0, "words/min", "warning"),
        }),
    );
    assert_eq!(r.highest_metric_severity(), SeverityTier::Critical);

    let empty = record("2024-05-01T10:00:00Z", json!({}));
    assert_eq!(empty.highest_metric_severity(), SeverityTier::Normal);
}

#[test]
fn test_normalize_failures_produce_no_record() {
    let mut no_overall = payload("2024-05-01T10:00:00Z", json!({}));
    no_overall["health_indicators"].as_object_mut().unwrap().remove("overall_status");
    assert!(matches!(normalize(&no_overall), Err(DashboardError::MalformedPayload { .. })));

    let mut no_metrics = payload("2024-05-01T10:00:00Z", json!({}));
    no_metrics.as_object_mut().unwrap().remove("metrics");
    assert!(matches!(normalize(&no_metrics), Err(DashboardError::MalformedPayload { .. })));

    let bad_time = payload("not a time", json!({}));
    assert!(matches!(normalize(&bad_time), Err(DashboardError::MalformedPayload { .. })));
}

#[test]
fn test_missing_recommendations_is_not_a_failure() {
    let mut raw = payload("2024-05-01T10:00:00Z", json!({"pitch": metric(180.0, "Hz", "normal")}));
    raw.as_object_mut().unwrap().remove("recommendations");
    let record = normalize(&raw).unwrap();
    assert!(record.recommendations().is_empty());
    assert_eq!(record.metrics().len(), 1);
}

#[test]
fn test_series_lengths_match_records_containing_key() {
    let records = vec![
        record("2024-05-01T10:00:00Z", json!({"pitch": metric(180.0, "Hz", "normal"), "speech_rate": metric(120.0, "words/min", "normal")})),
        record("2024-05-02T10:00:00Z", json!({"pitch": metric(182.0, "Hz", "normal")})),
        record("2024-05-03T10:00:00Z", json!({"speech_rate": metric(118.0, "words/min", "normal")})),
        record("2024-05-04T10:00:00Z", json!({"pitch": metric(179.0, "Hz", "normal"), "pause_duration": metric(0.8, "seconds", "normal")})),
    ];

    let projection = project(&records);
    for (name, series) in &projection {
        let expected = records.iter().filter(|r| r.metric(name).is_some()).count();
        assert_eq!(series.len(), expected, "series {}", name);

        // Same relative order as the source records
        let source_times: Vec<_> = records
            .iter()
            .filter(|r| r.metric(name).is_some())
            .map(|r| r.timestamp())
            .collect();
        let series_times: Vec<_> = series.points().iter().map(|p| p.at).collect();
        assert_eq!(series_times, source_times);
    }
    assert_eq!(projection.len(), 3);
    assert!(!projection.contains_key("voice_energy"));
}

#[test]
fn test_two_records_project_in_order() {
    let records = normalize_history(&json!([
        payload("2024-05-01T10:00:00", json!({"pitch": metric(180.5, "Hz", "normal")})),
        payload("2024-05-01T11:00:00", json!({"pitch": metric(176.0, "Hz", "warning")})),
    ]))
    .unwrap();

    let projection = project(&records);
    let points = projection["pitch"].points();
    assert_eq!(points.len(), 2);
    assert!(points[0].at < points[1].at);
    assert_eq!((points[0].at, points[0].value), (records[0].timestamp(), 180.5));
    assert_eq!((points[1].at, points[1].value), (records[1].timestamp(), 176.0));
}

#[test]
fn test_empty_history_projects_to_nothing() {
    let records = normalize_history(&json!([])).unwrap();
    assert!(project(&records).is_empty());
    assert!(project_sorted(&records).is_empty());
}

#[test]
fn test_ordering_variants_on_unsorted_feed() {
    let records = vec![
        record("2024-05-02T10:00:00Z", json!({"pitch": metric(2.0, "Hz", "normal")})),
        record("2024-05-01T10:00:00Z", json!({"pitch": metric(1.0, "Hz", "normal")})),
    ];

    let strict = project_with(&records, HistoryOrdering::AsReceived);
    let defensive = project_with(&records, HistoryOrdering::ByTimestamp);
    assert_eq!(strict["pitch"].points()[0].value, 2.0);
    assert_eq!(defensive["pitch"].points()[0].value, 1.0);
    assert!(defensive["pitch"].points().windows(2).all(|w| w[0].at <= w[1].at));
}

#[test]
fn test_snapshot_rendering_end_to_end() {
    let records = vec![
        record("2024-05-01T10:00:00Z", json!({"pitch": metric(180.0, "Hz", "normal")})),
        record("2024-05-02T10:00:00Z", json!({"pitch": metric(185.0, "Hz", "warning")})),
    ];
    let snapshot = DashboardSnapshot {
        patient_id: "P001".to_string(),
        latest: records.last().cloned(),
        series: project(&records),
        history: records,
    };

    let text = render_snapshot_text(&snapshot);
    assert!(text.contains("pitch: 185 Hz [warning]"));
    assert!(text.contains("pitch: 2 points, latest 185 Hz (+5.00), range 180..185"));

    let value = build_snapshot_json(&snapshot);
    assert_eq!(value["patient_id"], "P001");
    assert_eq!(value["latest"]["metrics"][0]["severity"], "warning");
    assert_eq!(value["history"]["series"][0]["points"].as_array().unwrap().len(), 2);
}

#[test]
fn test_config_environment_isolation() {
    let empty_env = MockEnvironment::new();
    assert!(load_config_with_env(&empty_env).is_err());

    let env = MockEnvironment::new()
        .with_var("VOICE_API_KEY", "mysecretkey")
        .with_var("PATIENT_ID", "P001");
    let config = load_config_with_env(&env).unwrap();
    assert_eq!(config.patient_id.as_deref(), Some("P001"));
    assert_eq!(config.history_ordering, HistoryOrdering::ByTimestamp);
}
