//! Presentation engine for data-lake quality reports.
//!
//! The analysis service computes quality verdicts; this crate makes them
//! viewable. It reconciles every payload vintage the service has ever
//! produced into one canonical [`report::Report`], derives grading, trend
//! and schema-diff views from it, and manages interactive autofix
//! composition. It performs no data-quality analysis of its own.

pub mod autofix;
pub mod client;
pub mod errors;
pub mod export;
pub mod report;
pub mod schema_diff;
pub mod score;
pub mod session;
pub mod trend;

pub use autofix::{composed_script, plan_key, ComposerState, PlanKey};
pub use client::AnalyzeClient;
pub use errors::{ViewError, ViewResult};
pub use report::{ingest::ingest, ingest::ingest_slice, Report, LEGACY_STEP_ID};
pub use score::{alert_tone, clamp_score, grade_view, tone_bucket, Tone};
pub use session::ViewSession;
pub use trend::{trend_view, ChartGeometry, TrendView, DEFAULT_WINDOW};
