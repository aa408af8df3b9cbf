//! Cross-vintage compatibility: a legacy payload and a modern payload
//! describing the same run must reconcile to views that agree, and the
//! canonical serialization must itself re-ingest without loss.

use lakeview_core::report::ingest::ingest;
use lakeview_core::report::PenaltySource;
use lakeview_core::score::{grade_view, penalty_breakdown, Tone};
use lakeview_core::trend::{trend_view, ChartGeometry, DEFAULT_WINDOW};
use serde_json::json;

/// Payload as the current service emits it.
fn modern_payload() -> serde_json::Value {
    json!({
        "dataset_name": "customer_orders",
        "run_id": "run-42",
        "generated_at": "2024-06-10T09:00:00Z",
        "overall_score": 78.5,
        "score_grade": { "letter": "B", "label": "Good", "reason": "minor gaps" },
        "summary": {
            "row_count": 5000,
            "column_count": 12,
            "missing_cells": 120,
            "missing_ratio": 0.002,
            "duplicate_rows": 10,
            "duplicate_ratio": 0.002,
            "outlier_ratio": 0.01,
            "has_drift": false,
        },
        "pii": {
            "columns": [{ "column": "email", "detected_types": ["email"] }],
            "column_count": 1,
            "has_pii": true,
        },
        "policy": { "passed": true, "failures": [] },
        "history": { "points": [
            { "timestamp": "2024-06-08T09:00:00Z", "overall_score": 70.0 },
            { "timestamp": "2024-06-09T09:00:00Z", "overall_score": 75.0 },
        ]},
    })
}

/// The same run as an early producer would have shipped it.
fn legacy_payload() -> serde_json::Value {
    json!({
        "dataset_name": "customer_orders",
        "run_id": "run-42",
        "timestamp": "2024-06-10T09:00:00Z",
        "quality_score": 78.5,
        "quality_label": "Good",
        "summary": {
            "row_count": 5000,
            "column_count": 12,
            "total_missing_cells": 120,
            "missing_ratio": 0.002,
            "duplicate_rows": 10,
            "duplicate_ratio": 0.002,
            "overall_outlier_ratio": 0.01,
            "has_drift": false,
        },
        "pii_columns": [{ "column": "email", "detected_types": ["email"] }],
        "pii_column_count": 1,
        "runs": [
            { "generated_at": "2024-06-08T09:00:00Z", "quality_score": 70.0 },
            { "generated_at": "2024-06-09T09:00:00Z", "quality_score": 75.0 },
        ],
    })
}

#[test]
fn vintages_agree_on_identity_and_score() {
    let modern = ingest(&modern_payload()).unwrap();
    let legacy = ingest(&legacy_payload()).unwrap();

    assert_eq!(modern.dataset_name, legacy.dataset_name);
    assert_eq!(modern.run_id, legacy.run_id);
    assert_eq!(modern.generated_at, legacy.generated_at);
    assert_eq!(modern.score.overall, legacy.score.overall);
    assert_eq!(modern.summary, legacy.summary);
    assert_eq!(modern.pii, legacy.pii);
    assert_eq!(modern.policy.passed, legacy.policy.passed);
}

#[test]
fn vintages_agree_on_grade_presentation() {
    let modern = grade_view(&ingest(&modern_payload()).unwrap());
    let legacy = grade_view(&ingest(&legacy_payload()).unwrap());

    assert_eq!(modern.label, "Good");
    assert_eq!(legacy.label, "Good");
    assert_eq!(modern.tone, Tone::Success);
    assert_eq!(legacy.tone, modern.tone);
}

#[test]
fn vintages_agree_on_trend() {
    let geom = ChartGeometry::default();
    let modern = trend_view(
        &ingest(&modern_payload()).unwrap().history,
        DEFAULT_WINDOW,
        &geom,
    );
    let legacy = trend_view(
        &ingest(&legacy_payload()).unwrap().history,
        DEFAULT_WINDOW,
        &geom,
    );

    assert_eq!(modern.delta, Some(5.0));
    assert_eq!(legacy.delta, modern.delta);
    assert_eq!(legacy.coords.len(), modern.coords.len());
    for (a, b) in modern.coords.iter().zip(&legacy.coords) {
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }
}

#[test]
fn both_vintages_fall_back_to_approximated_penalties() {
    let modern = penalty_breakdown(&ingest(&modern_payload()).unwrap());
    let legacy = penalty_breakdown(&ingest(&legacy_payload()).unwrap());

    assert_eq!(modern.source, PenaltySource::Approximated);
    assert_eq!(modern.penalty_pii, 5.0);
    assert_eq!(legacy.penalty_pii, 5.0);
    assert!((modern.penalty_missing - legacy.penalty_missing).abs() < 1e-12);
}

#[test]
fn canonical_report_serializes_without_raw_vintage_fields() {
    let report = ingest(&legacy_payload()).unwrap();
    let out = serde_json::to_value(&report).unwrap();
    let obj = out.as_object().unwrap();
    assert!(obj.contains_key("summary"));
    assert!(!obj.contains_key("quality_score"));
    assert!(!obj.contains_key("pii_column_count"));
    assert_eq!(out["score"]["overall"], json!(78.5));
}

// `view` and `compose` accept a report saved by `analyze --out`, so the
// canonical output has to come back through ingest unchanged.
#[test]
fn canonical_output_reingests_losslessly() {
    let first = ingest(&modern_payload()).unwrap();
    let saved = serde_json::to_value(&first).unwrap();
    let second = ingest(&saved).unwrap();

    assert_eq!(second.score.overall, 78.5);
    assert_eq!(second.score.grade.as_ref().unwrap().label, "Good");
    assert_eq!(first, second);
}

#[test]
fn canonical_legacy_plan_keeps_its_lock() {
    let mut payload = legacy_payload();
    payload.as_object_mut().unwrap().insert(
        "autofix_script".to_owned(),
        json!("df = df.drop_duplicates()\n"),
    );

    let first = ingest(&payload).unwrap();
    let saved = serde_json::to_value(&first).unwrap();
    let second = ingest(&saved).unwrap();

    let step = &second.autofix.plan.as_ref().unwrap().steps[0];
    assert!(step.locked, "the synthesized step must stay locked on reload");
    assert_eq!(first, second);
}
