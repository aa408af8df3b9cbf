//! Text rendering for the schema-change section.
//!
//! Strictly a consumer: it formats whatever the ingestor reconciled and
//! never recomputes verdicts. In particular `is_breaking` is the
//! producer's call and is displayed verbatim, even when the listed
//! buckets would suggest otherwise.

use crate::report::{PiiState, SchemaChangeStatus, SchemaChanges};

/// One-line status headline.
pub fn headline(changes: &SchemaChanges) -> String {
    let status = match changes.status {
        SchemaChangeStatus::BaselineCreated => "first run, baseline recorded",
        SchemaChangeStatus::NoChange => "no change against baseline",
        SchemaChangeStatus::Changed => "changed against baseline",
    };
    if changes.is_breaking {
        format!("Schema: {status} (breaking)")
    } else {
        format!("Schema: {status}")
    }
}

/// Detail lines for the four change buckets, in a fixed order. Empty
/// buckets contribute nothing. A report with a status but no bucket
/// content yields an empty vec.
pub fn bucket_lines(changes: &SchemaChanges) -> Vec<String> {
    let mut lines = Vec::new();
    for col in &changes.added_columns {
        lines.push(format!("  + {col}"));
    }
    for col in &changes.removed_columns {
        lines.push(format!("  - {col}"));
    }
    for tc in &changes.type_changes {
        let before = tc.before.as_deref().unwrap_or("?");
        let after = tc.after.as_deref().unwrap_or("?");
        lines.push(format!("  ~ {}: {before} -> {after}", tc.column));
    }
    for pc in &changes.pii_changes {
        lines.push(format!(
            "  ~ {}: {}",
            pc.column,
            pii_transition(&pc.before, &pc.after)
        ));
    }
    lines
}

/// Headline plus buckets.
pub fn render_lines(changes: &SchemaChanges) -> Vec<String> {
    let mut lines = vec![headline(changes)];
    lines.extend(bucket_lines(changes));
    lines
}

fn pii_transition(before: &PiiState, after: &PiiState) -> String {
    match (before.has_pii, after.has_pii) {
        (false, true) => format!("pii detected ({})", after.pii_types.join(", ")),
        (true, false) => "pii cleared".to_owned(),
        (true, true) => format!("pii types now ({})", after.pii_types.join(", ")),
        (false, false) => "pii unchanged".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ingest::ingest;
    use serde_json::json;

    fn changes(value: serde_json::Value) -> SchemaChanges {
        ingest(&json!({
            "dataset_name": "d", "run_id": "r",
            "schema_changes": value,
        }))
        .unwrap()
        .schema_changes
        .unwrap()
    }

    #[test]
    fn baseline_headline() {
        let c = changes(json!({ "status": "baseline_created" }));
        assert_eq!(headline(&c), "Schema: first run, baseline recorded");
        assert!(bucket_lines(&c).is_empty());
    }

    #[test]
    fn breaking_flag_is_displayed_verbatim() {
        // Producer says breaking even though no bucket content is listed.
        let c = changes(json!({ "status": "no_change", "is_breaking": true }));
        assert_eq!(headline(&c), "Schema: no change against baseline (breaking)");
    }

    #[test]
    fn buckets_render_in_fixed_order() {
        let c = changes(json!({
            "status": "changed",
            "added_columns": ["city"],
            "removed_columns": ["fax"],
            "type_changes": [{ "column": "age", "before": "int64", "after": "object" }],
            "pii_changes": [{
                "column": "contact",
                "before": { "has_pii": false },
                "after": { "has_pii": true, "pii_types": ["email"] },
            }],
        }));
        let lines = bucket_lines(&c);
        assert_eq!(
            lines,
            vec![
                "  + city",
                "  - fax",
                "  ~ age: int64 -> object",
                "  ~ contact: pii detected (email)",
            ]
        );
    }

    #[test]
    fn unknown_types_render_as_placeholder() {
        let c = changes(json!({
            "status": "changed",
            "type_changes": [{ "column": "ts", "after": "datetime64" }],
        }));
        assert_eq!(bucket_lines(&c)[0], "  ~ ts: ? -> datetime64");
    }
}
