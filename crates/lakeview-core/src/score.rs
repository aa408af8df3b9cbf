//! Score grading: clamping, tone buckets, and the penalty fallback.
//!
//! Tone is always derived locally from the clamped score so that two
//! renderers never disagree about color. The producer's grade label, when
//! present, is displayed as-is next to the locally derived tone.

use crate::report::{AlertLevel, PenaltyBreakdown, PenaltySource, Report};

/// Presentation tone attached to scores, alerts, and policy verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
}

impl Tone {
    /// Stable lowercase name, used for CSS-class-style styling hooks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Warning => "warning",
            Tone::Danger => "danger",
            Tone::Info => "info",
        }
    }
}

/// Grade bucket for a clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneBucket {
    pub label: &'static str,
    pub tone: Tone,
}

/// Normalize a raw score to `[0, 100]`. Absent and NaN both read as 0.
pub fn clamp_score(raw: Option<f64>) -> f64 {
    match raw {
        Some(x) if !x.is_nan() => x.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Bucket a clamped score. Bounds are inclusive at the bottom of each
/// bucket: 90 is Excellent, 75 is Good, 60 is Fair.
pub fn tone_bucket(score: f64) -> ToneBucket {
    if score >= 90.0 {
        ToneBucket {
            label: "Excellent",
            tone: Tone::Success,
        }
    } else if score >= 75.0 {
        ToneBucket {
            label: "Good",
            tone: Tone::Success,
        }
    } else if score >= 60.0 {
        ToneBucket {
            label: "Fair",
            tone: Tone::Warning,
        }
    } else {
        ToneBucket {
            label: "Needs Attention",
            tone: Tone::Danger,
        }
    }
}

/// Tone for an alert row. Error-level alerts share the danger tone with
/// failing scores; informational ones get their own.
pub fn alert_tone(level: AlertLevel) -> Tone {
    match level {
        AlertLevel::Error => Tone::Danger,
        AlertLevel::Warning => Tone::Warning,
        AlertLevel::Info => Tone::Info,
    }
}

/// Grade as shown to the user: producer label when one was supplied,
/// bucket label otherwise. Tone always comes from the local bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeView {
    pub score: f64,
    pub label: String,
    pub tone: Tone,
    pub reason: Option<String>,
}

pub fn grade_view(report: &Report) -> GradeView {
    let bucket = tone_bucket(report.score.overall);
    let (label, reason) = match &report.score.grade {
        Some(grade) => (grade.label.clone(), grade.reason.clone()),
        None => (bucket.label.to_owned(), None),
    };
    GradeView {
        score: report.score.overall,
        label,
        tone: bucket.tone,
        reason,
    }
}

/// Penalty breakdown for display. Uses the producer's numbers when the
/// payload carried them, otherwise approximates from summary ratios so the
/// breakdown panel never goes blank. The two are distinguishable by
/// [`PenaltySource`].
pub fn penalty_breakdown(report: &Report) -> PenaltyBreakdown {
    match &report.score.breakdown {
        Some(producer) => producer.clone(),
        None => approximate_breakdown(report),
    }
}

fn approximate_breakdown(report: &Report) -> PenaltyBreakdown {
    let summary = &report.summary;
    PenaltyBreakdown {
        penalty_missing: summary.missing_ratio * 100.0,
        penalty_outliers: summary.outlier_ratio * 100.0,
        penalty_duplicates: summary.duplicate_ratio * 100.0,
        penalty_pii: if report.pii.has_pii { 5.0 } else { 0.0 },
        penalty_drift: if summary.has_drift { 5.0 } else { 0.0 },
        source: PenaltySource::Approximated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ingest::ingest;
    use serde_json::json;

    #[test]
    fn clamp_handles_absent_and_out_of_range() {
        assert_eq!(clamp_score(None), 0.0);
        assert_eq!(clamp_score(Some(f64::NAN)), 0.0);
        assert_eq!(clamp_score(Some(-10.0)), 0.0);
        assert_eq!(clamp_score(Some(101.0)), 100.0);
        assert_eq!(clamp_score(Some(55.5)), 55.5);
    }

    #[test]
    fn bucket_bounds_are_inclusive_below() {
        assert_eq!(tone_bucket(90.0).label, "Excellent");
        assert_eq!(tone_bucket(89.9).label, "Good");
        assert_eq!(tone_bucket(75.0).label, "Good");
        assert_eq!(tone_bucket(74.9).label, "Fair");
        assert_eq!(tone_bucket(60.0).label, "Fair");
        assert_eq!(tone_bucket(59.9).label, "Needs Attention");
        assert_eq!(tone_bucket(0.0).tone, Tone::Danger);
        assert_eq!(tone_bucket(100.0).tone, Tone::Success);
    }

    #[test]
    fn alert_levels_map_to_tones() {
        assert_eq!(alert_tone(AlertLevel::Error), Tone::Danger);
        assert_eq!(alert_tone(AlertLevel::Warning), Tone::Warning);
        assert_eq!(alert_tone(AlertLevel::Info), Tone::Info);
    }

    #[test]
    fn grade_view_prefers_producer_label_but_local_tone() {
        let payload = json!({
            "dataset_name": "d", "run_id": "r",
            "overall_score": 40.0,
            "score_grade": { "label": "RED", "reason": "too many gaps" },
        });
        let view = grade_view(&ingest(&payload).unwrap());
        assert_eq!(view.label, "RED");
        assert_eq!(view.tone, Tone::Danger);
        assert_eq!(view.reason.as_deref(), Some("too many gaps"));
    }

    #[test]
    fn grade_view_falls_back_to_bucket_label() {
        let payload = json!({
            "dataset_name": "d", "run_id": "r",
            "overall_score": 95.0,
        });
        let view = grade_view(&ingest(&payload).unwrap());
        assert_eq!(view.label, "Excellent");
        assert_eq!(view.tone, Tone::Success);
    }

    #[test]
    fn approximated_breakdown_from_summary() {
        let payload = json!({
            "dataset_name": "d", "run_id": "r",
            "summary": {
                "missing_ratio": 0.12,
                "duplicate_ratio": 0.05,
                "outlier_ratio": 0.02,
                "has_drift": true,
            },
            "pii_columns": [{ "column": "email" }],
        });
        let breakdown = penalty_breakdown(&ingest(&payload).unwrap());
        assert_eq!(breakdown.source, PenaltySource::Approximated);
        assert!((breakdown.penalty_missing - 12.0).abs() < 1e-9);
        assert!((breakdown.penalty_duplicates - 5.0).abs() < 1e-9);
        assert_eq!(breakdown.penalty_pii, 5.0);
        assert_eq!(breakdown.penalty_drift, 5.0);
    }

    #[test]
    fn producer_breakdown_is_not_replaced() {
        let payload = json!({
            "dataset_name": "d", "run_id": "r",
            "summary": { "missing_ratio": 0.5 },
            "score_breakdown": { "penalty_missing": 3.0 },
        });
        let breakdown = penalty_breakdown(&ingest(&payload).unwrap());
        assert_eq!(breakdown.source, PenaltySource::Producer);
        assert_eq!(breakdown.penalty_missing, 3.0);
    }
}
