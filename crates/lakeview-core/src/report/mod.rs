//! Canonical report model.
//!
//! Every analyze response, whatever vintage the producer was, is reconciled
//! into this one shape by [`crate::report::ingest`]. Downstream consumers
//! (grading, trend, composer, diff view, renderers) read only these types
//! and never look at raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod ingest;

/// Step id used when a plan is synthesized from a legacy flat script.
pub const LEGACY_STEP_ID: &str = "__legacy__";

/// A fully reconciled quality report for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub dataset_name: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub summary: Summary,
    pub score: Score,
    pub pii: PiiSection,
    pub policy: PolicySection,
    /// Absent when the producer ran without a schema baseline feature at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_changes: Option<SchemaChanges>,
    pub autofix: AutofixSection,
    pub history: History,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<Insight>,
    /// Producer-rendered data contract, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_yaml: Option<String>,
}

/// Dataset-level counters and ratios. Ratios are in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub row_count: u64,
    pub column_count: u64,
    pub missing_cells: u64,
    pub missing_ratio: f64,
    pub duplicate_rows: u64,
    pub duplicate_ratio: f64,
    pub outlier_ratio: f64,
    pub has_drift: bool,
}

/// Overall score plus whatever grading detail the producer supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Always present after ingest, clamped to `[0, 100]`.
    pub overall: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<ScoreGrade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<PenaltyBreakdown>,
}

/// Producer-assigned grade. Newer producers send letter and reason; older
/// ones only a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreGrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Where a penalty breakdown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltySource {
    /// Values reported by the analysis service itself.
    Producer,
    /// Values reconstructed locally from summary ratios.
    Approximated,
}

/// Per-dimension score deductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub penalty_missing: f64,
    pub penalty_outliers: f64,
    pub penalty_duplicates: f64,
    pub penalty_pii: f64,
    pub penalty_drift: f64,
    pub source: PenaltySource,
}

impl PenaltyBreakdown {
    pub fn total(&self) -> f64 {
        self.penalty_missing
            + self.penalty_outliers
            + self.penalty_duplicates
            + self.penalty_pii
            + self.penalty_drift
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiiSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<PiiColumn>,
    pub column_count: u64,
    pub has_pii: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiColumn {
    pub column: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySection {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PolicyFailure>,
}

impl Default for PolicySection {
    fn default() -> Self {
        // No policy section in the payload means nothing was violated.
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFailure {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaChangeStatus {
    BaselineCreated,
    NoChange,
    Changed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChanges {
    pub status: SchemaChangeStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_changes: Vec<TypeChange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pii_changes: Vec<PiiChange>,
    pub is_breaking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChange {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiChange {
    pub column: String,
    pub before: PiiState,
    pub after: PiiState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiiState {
    pub has_pii: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pii_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutofixSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<AutofixPlan>,
    /// Flat script as sent by legacy producers, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_script: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutofixPlan {
    pub steps: Vec<AutofixStep>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub header: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutofixStep {
    /// Unique within the plan.
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub code: String,
    /// Producer's recommendation whether the step starts selected.
    pub enabled: bool,
    /// Locked steps cannot be toggled off. Synthesized legacy steps are
    /// always locked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub points: Vec<HistoryPoint>,
}

/// One prior run. `timestamp` is the producer's raw string; `at` is the
/// parsed instant used for ordering, `None` when the string is unparseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    #[serde(skip)]
    pub at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Error,
    Warning,
    #[default]
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub severity: String,
    pub message: String,
}

impl Report {
    /// Steps of the structured plan, empty when none exists.
    pub fn plan_steps(&self) -> &[AutofixStep] {
        self.autofix
            .plan
            .as_ref()
            .map(|p| p.steps.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this run carries anything the composer can work with.
    pub fn has_plan(&self) -> bool {
        !self.plan_steps().is_empty()
    }
}
