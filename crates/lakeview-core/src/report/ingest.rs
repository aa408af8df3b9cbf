//! Reconciles raw analyze payloads into the canonical [`Report`].
//!
//! The analysis service has shipped several payload vintages. Rather than
//! version-gating, ingest probes each section for every shape it has ever
//! had and upgrades in place. The rules per section:
//!
//! * score: `overall_score`, else the nested `score.overall` this crate
//!   itself writes, else `score_grade.final_score`, else the legacy
//!   top-level `quality_score`, else `0`, clamped to `[0, 100]`
//! * pii: nested `pii` object, else flat top-level fields
//! * autofix: structured plan, else a plan synthesized from the legacy
//!   flat script
//! * history: `history.points`, else a bare `history` array, else `runs`
//!
//! The canonical serialization of [`Report`] is one of the accepted
//! shapes: a report saved to disk re-ingests without loss.
//!
//! Unknown top-level fields are ignored. Only a non-object payload or a
//! missing `dataset_name` / `run_id` is rejected outright.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::errors::{ViewError, ViewResult};
use crate::report::{
    Alert, AlertLevel, AutofixPlan, AutofixSection, AutofixStep, History, HistoryPoint, Insight,
    PenaltyBreakdown, PenaltySource, PiiChange, PiiColumn, PiiSection, PiiState, PolicyFailure,
    PolicySection, Report, SchemaChangeStatus, SchemaChanges, Score, ScoreGrade, Summary,
    TypeChange, LEGACY_STEP_ID,
};
use crate::score::clamp_score;

type Obj = Map<String, Value>;

/// Parse raw JSON bytes and reconcile them into a [`Report`].
pub fn ingest_slice(bytes: &[u8]) -> ViewResult<Report> {
    let raw: Value = serde_json::from_slice(bytes)
        .map_err(|e| ViewError::validation(format!("payload is not JSON: {e}")))?;
    ingest(&raw)
}

/// Reconcile an already-parsed payload into a [`Report`].
pub fn ingest(raw: &Value) -> ViewResult<Report> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ViewError::validation("report payload must be a JSON object"))?;

    let dataset_name = required_string(obj, "dataset_name")?;
    let run_id = required_string(obj, "run_id")?;
    let generated_at = first(obj, &["generated_at", "timestamp"])
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let summary = read_summary(obj.get("summary"));
    let pii = read_pii(obj);

    Ok(Report {
        score: read_score(obj),
        policy: read_policy(obj),
        schema_changes: read_schema_changes(obj.get("schema_changes")),
        autofix: read_autofix(obj),
        history: read_history(obj),
        alerts: read_alerts(obj.get("alerts")),
        insights: read_insights(obj.get("insights")),
        contract_yaml: obj
            .get("contract_yaml")
            .and_then(Value::as_str)
            .map(str::to_owned),
        dataset_name,
        run_id,
        generated_at,
        summary,
        pii,
    })
}

fn required_string(obj: &Obj, key: &str) -> ViewResult<String> {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_owned()),
        _ => Err(ViewError::validation(format!(
            "report is missing required field `{key}`"
        ))),
    }
}

/// First value present under any of the given keys.
fn first<'a>(obj: &'a Obj, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn num(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64)
}

fn uint(v: Option<&Value>) -> Option<u64> {
    match v {
        Some(val) => val.as_u64().or_else(|| {
            // Some serializers write whole counts as floats.
            val.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        None => None,
    }
}

fn boolean(v: Option<&Value>) -> Option<bool> {
    v.and_then(Value::as_bool)
}

fn string(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).map(str::to_owned)
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Parse a producer timestamp. RFC 3339 first, then the naive forms older
/// producers emitted.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn read_summary(value: Option<&Value>) -> Summary {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Summary::default();
    };
    Summary {
        row_count: uint(obj.get("row_count")).unwrap_or(0),
        column_count: uint(obj.get("column_count")).unwrap_or(0),
        missing_cells: uint(first(obj, &["missing_cells", "total_missing_cells"])).unwrap_or(0),
        missing_ratio: clamp01(num(obj.get("missing_ratio")).unwrap_or(0.0)),
        duplicate_rows: uint(obj.get("duplicate_rows")).unwrap_or(0),
        duplicate_ratio: clamp01(num(obj.get("duplicate_ratio")).unwrap_or(0.0)),
        outlier_ratio: clamp01(
            num(first(obj, &["outlier_ratio", "overall_outlier_ratio"])).unwrap_or(0.0),
        ),
        has_drift: boolean(obj.get("has_drift")).unwrap_or(false),
    }
}

fn read_score(obj: &Obj) -> Score {
    // A nested `score` object is the canonical shape written back out by
    // this crate; a saved report must re-ingest with nothing lost.
    let canonical = obj.get("score").and_then(Value::as_object);
    let grade_obj = obj
        .get("score_grade")
        .and_then(Value::as_object)
        .or_else(|| canonical.and_then(|c| c.get("grade")).and_then(Value::as_object));

    let overall = num(obj.get("overall_score"))
        .or_else(|| canonical.and_then(|c| num(c.get("overall"))))
        .or_else(|| grade_obj.and_then(|g| num(g.get("final_score"))))
        .or_else(|| num(obj.get("quality_score")));
    if overall.is_none() {
        tracing::warn!("payload carries no score in any known position, defaulting to 0");
    }

    let grade = match grade_obj {
        Some(g) => {
            let letter = string(g.get("letter"));
            string(g.get("label"))
                .or_else(|| letter.clone())
                .map(|label| ScoreGrade {
                    letter,
                    label,
                    reason: string(g.get("reason")),
                })
        }
        // Oldest vintage: a bare label string next to quality_score.
        None => string(obj.get("quality_label")).map(|label| ScoreGrade {
            letter: None,
            label,
            reason: None,
        }),
    };

    let breakdown = obj
        .get("score_breakdown")
        .and_then(Value::as_object)
        .or_else(|| canonical.and_then(|c| c.get("breakdown")).and_then(Value::as_object))
        .map(|b| PenaltyBreakdown {
            penalty_missing: num(b.get("penalty_missing")).unwrap_or(0.0),
            penalty_outliers: num(b.get("penalty_outliers")).unwrap_or(0.0),
            penalty_duplicates: num(b.get("penalty_duplicates")).unwrap_or(0.0),
            penalty_pii: num(b.get("penalty_pii")).unwrap_or(0.0),
            penalty_drift: num(b.get("penalty_drift")).unwrap_or(0.0),
            // Producers never tag a source; canonical files do.
            source: match b.get("source").and_then(Value::as_str) {
                Some("approximated") => PenaltySource::Approximated,
                _ => PenaltySource::Producer,
            },
        });

    Score {
        overall: clamp_score(overall),
        grade,
        breakdown,
    }
}

fn read_pii(obj: &Obj) -> PiiSection {
    // Newer producers nest a `pii` object. Older ones spread pii_-prefixed
    // fields across the top level; only those names are trusted there, so
    // an unrelated top-level `columns` list cannot be misread.
    let (src, column_keys, count_keys): (&Obj, &[&str], &[&str]) =
        match obj.get("pii").and_then(Value::as_object) {
            Some(nested) => (
                nested,
                &["columns", "pii_columns"][..],
                &["column_count", "pii_column_count"][..],
            ),
            None => (obj, &["pii_columns"][..], &["pii_column_count"][..]),
        };

    let columns: Vec<PiiColumn> = first(src, column_keys)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let col = e.as_object()?;
                    Some(PiiColumn {
                        column: string(col.get("column"))?,
                        detected_types: string_list(col.get("detected_types")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let column_count =
        uint(first(src, count_keys)).unwrap_or(columns.len() as u64);
    let has_pii = boolean(src.get("has_pii")).unwrap_or(column_count > 0);

    PiiSection {
        columns,
        column_count,
        has_pii,
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(|e| string(Some(e))).collect())
        .unwrap_or_default()
}

fn read_policy(obj: &Obj) -> PolicySection {
    let nested = obj.get("policy").and_then(Value::as_object);

    let failures_value = match nested {
        Some(p) => p.get("failures"),
        None => obj.get("policy_failures"),
    };
    let failures: Vec<PolicyFailure> = failures_value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| match e {
                    Value::Object(f) => Some(PolicyFailure {
                        code: string(f.get("code")).unwrap_or_else(|| "UNKNOWN".into()),
                        message: string(f.get("message")).unwrap_or_default(),
                    }),
                    // Oldest vintage sent bare strings.
                    Value::String(msg) => Some(PolicyFailure {
                        code: "POLICY".into(),
                        message: msg.clone(),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let passed = match nested {
        Some(p) => boolean(p.get("passed")),
        None => boolean(obj.get("policy_passed")),
    }
    .unwrap_or_else(|| failures.is_empty());

    PolicySection { passed, failures }
}

fn read_schema_changes(value: Option<&Value>) -> Option<SchemaChanges> {
    let obj = value?.as_object()?;
    let status = match obj.get("status").and_then(Value::as_str) {
        Some("baseline_created") => SchemaChangeStatus::BaselineCreated,
        Some("no_change") => SchemaChangeStatus::NoChange,
        Some("changed") => SchemaChangeStatus::Changed,
        other => {
            tracing::warn!(status = ?other, "unrecognized schema change status, dropping section");
            return None;
        }
    };

    let type_changes = obj
        .get("type_changes")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let c = e.as_object()?;
                    Some(TypeChange {
                        column: string(c.get("column"))?,
                        before: string(c.get("before")),
                        after: string(c.get("after")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let pii_changes = obj
        .get("pii_changes")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let c = e.as_object()?;
                    Some(PiiChange {
                        column: string(c.get("column"))?,
                        before: read_pii_state(c.get("before")),
                        after: read_pii_state(c.get("after")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(SchemaChanges {
        status,
        added_columns: string_list(obj.get("added_columns")),
        removed_columns: string_list(obj.get("removed_columns")),
        type_changes,
        pii_changes,
        is_breaking: boolean(obj.get("is_breaking")).unwrap_or(false),
    })
}

fn read_pii_state(v: Option<&Value>) -> PiiState {
    let Some(obj) = v.and_then(Value::as_object) else {
        return PiiState::default();
    };
    PiiState {
        has_pii: boolean(obj.get("has_pii")).unwrap_or(false),
        pii_types: string_list(obj.get("pii_types")),
    }
}

fn read_autofix(obj: &Obj) -> AutofixSection {
    let nested = obj.get("autofix").and_then(Value::as_object);

    let plan_value = nested
        .and_then(|a| a.get("plan"))
        .or_else(|| obj.get("autofix_plan"));
    let plan = plan_value.and_then(Value::as_object).map(read_plan);

    // Flat script, wherever a legacy producer put it; `legacy_script` is
    // the key the canonical serialization uses.
    let legacy_script = string(obj.get("autofix_script"))
        .or_else(|| nested.and_then(|a| string(a.get("script"))))
        .or_else(|| nested.and_then(|a| string(a.get("legacy_script"))));

    let plan = match plan {
        Some(p) => Some(p),
        None => legacy_script
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(synthesize_plan),
    };

    AutofixSection {
        plan,
        legacy_script,
    }
}

fn read_plan(obj: &Obj) -> AutofixPlan {
    let mut seen: HashSet<String> = HashSet::new();
    let steps = obj
        .get("steps")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| {
                    let s = e.as_object()?;
                    let id = match string(s.get("id")).filter(|id| !id.is_empty()) {
                        Some(id) => id,
                        None => {
                            tracing::warn!("autofix step without an id, skipping");
                            return None;
                        }
                    };
                    if !seen.insert(id.clone()) {
                        tracing::warn!(step = %id, "duplicate autofix step id, keeping first");
                        return None;
                    }
                    Some(AutofixStep {
                        label: string(s.get("label")).unwrap_or_else(|| id.clone()),
                        id,
                        category: string(s.get("category")),
                        description: string(s.get("description")),
                        code: string(s.get("code")).unwrap_or_default(),
                        enabled: boolean(s.get("enabled")).unwrap_or(true),
                        locked: boolean(s.get("locked")).unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    AutofixPlan {
        steps,
        header: string(obj.get("header")).unwrap_or_default(),
        footer: string(obj.get("footer")).unwrap_or_default(),
    }
}

/// A legacy flat script becomes a single-step plan. The step is locked so
/// the composer cannot produce a partial script the producer never wrote.
fn synthesize_plan(script: &str) -> AutofixPlan {
    AutofixPlan {
        steps: vec![AutofixStep {
            id: LEGACY_STEP_ID.into(),
            label: "Generated script".into(),
            category: None,
            description: None,
            code: script.to_owned(),
            enabled: true,
            locked: true,
        }],
        header: String::new(),
        footer: String::new(),
    }
}

fn read_history(obj: &Obj) -> History {
    let entries = match obj.get("history") {
        Some(Value::Object(h)) => h.get("points").and_then(Value::as_array),
        Some(Value::Array(points)) => Some(points),
        _ => obj.get("runs").and_then(Value::as_array),
    };
    let Some(entries) = entries else {
        return History::default();
    };

    // Duplicate raw timestamps collapse to the last occurrence in input
    // order, then everything sorts ascending. Stable sort keeps input
    // order among unparseable timestamps, which all sort first.
    let mut points: Vec<HistoryPoint> = Vec::with_capacity(entries.len());
    let mut by_timestamp: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let Some(e) = entry.as_object() else { continue };
        let Some(timestamp) = string(first(e, &["timestamp", "generated_at"])) else {
            tracing::warn!("history entry without a timestamp, skipping");
            continue;
        };
        let point = HistoryPoint {
            at: parse_timestamp(&timestamp),
            overall_score: num(first(e, &["overall_score", "quality_score", "score"]))
                .map(|s| clamp_score(Some(s))),
            missing_ratio: num(e.get("missing_ratio")).map(clamp01),
            outlier_ratio: num(first(e, &["outlier_ratio", "overall_outlier_ratio"]))
                .map(clamp01),
            timestamp,
        };
        match by_timestamp.get(&point.timestamp) {
            Some(&idx) => points[idx] = point,
            None => {
                by_timestamp.insert(point.timestamp.clone(), points.len());
                points.push(point);
            }
        }
    }
    points.sort_by_key(|p| p.at.map(|dt| dt.timestamp_millis()).unwrap_or(i64::MIN));

    History { points }
}

fn read_alerts(value: Option<&Value>) -> Vec<Alert> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|e| {
            let a = e.as_object()?;
            let level = match a.get("level").and_then(Value::as_str) {
                Some("error") => AlertLevel::Error,
                Some("warning" | "warn") => AlertLevel::Warning,
                // Absent or unrecognized both read as informational.
                _ => AlertLevel::Info,
            };
            Some(Alert {
                level,
                code: string(a.get("code")).unwrap_or_default(),
                message: string(a.get("message")).unwrap_or_default(),
            })
        })
        .collect()
}

fn read_insights(value: Option<&Value>) -> Vec<Insight> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|e| {
            let i = e.as_object()?;
            Some(Insight {
                message: string(i.get("message"))?,
                category: string(i.get("category")).unwrap_or_else(|| "general".into()),
                severity: string(i.get("severity")).unwrap_or_else(|| "info".into()),
            })
        })
        .collect()
}
