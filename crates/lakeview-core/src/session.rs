//! View session: the one current report plus composer state.
//!
//! This is the surface for embedders that keep a report loaded across
//! analyses (a desktop shell, a notebook kernel). The one-shot CLI
//! commands build their state per invocation and drive [`ComposerState`]
//! directly instead.
//!
//! Refresh is wholesale replacement. A failed analyze leaves the previous
//! report on screen untouched; only a successful one swaps it and folds
//! the composer forward. At most one analyze may be in flight.

use std::sync::Arc;

use crate::autofix::{self, ComposerState};
use crate::report::Report;

#[derive(Debug, Default)]
pub struct ViewSession {
    current: Option<Arc<Report>>,
    composer: ComposerState,
    analyze_in_flight: bool,
}

impl ViewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<Report>> {
        self.current.as_ref()
    }

    pub fn composer(&self) -> &ComposerState {
        &self.composer
    }

    pub fn analyze_in_flight(&self) -> bool {
        self.analyze_in_flight
    }

    /// Claim the single analyze slot. Returns false when one is already
    /// pending, in which case the caller must not start another.
    pub fn try_begin_analyze(&mut self) -> bool {
        if self.analyze_in_flight {
            return false;
        }
        self.analyze_in_flight = true;
        true
    }

    /// Swap in a fresh report and fold composer state forward.
    pub fn finish_analyze(&mut self, report: Report) {
        self.analyze_in_flight = false;
        self.composer = self.composer.reconcile(&report);
        self.current = Some(Arc::new(report));
    }

    /// Release the analyze slot without touching the current view.
    pub fn fail_analyze(&mut self) {
        self.analyze_in_flight = false;
    }

    /// Drop the loaded source and everything derived from it.
    pub fn clear(&mut self) {
        self.current = None;
        self.composer = ComposerState::NoPlan;
    }

    /// Toggle one autofix step of the current plan.
    pub fn toggle_step(&mut self, id: &str) {
        if let Some(report) = self.current.as_ref() {
            if let Some(plan) = report.autofix.plan.as_ref() {
                self.composer = self.composer.toggle(plan, id);
            }
        }
    }

    /// Script for the current report and selection.
    pub fn composed_script(&self) -> Option<String> {
        let report = self.current.as_ref()?;
        autofix::script_for(report, &self.composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ingest::ingest;
    use serde_json::json;

    fn report(run_id: &str, enabled: bool) -> Report {
        ingest(&json!({
            "dataset_name": "orders",
            "run_id": run_id,
            "autofix_plan": {
                "steps": [{ "id": "a", "code": "A", "enabled": enabled }],
            },
        }))
        .unwrap()
    }

    #[test]
    fn single_analyze_slot() {
        let mut session = ViewSession::new();
        assert!(session.try_begin_analyze());
        assert!(!session.try_begin_analyze());
        session.fail_analyze();
        assert!(session.try_begin_analyze());
    }

    #[test]
    fn failed_analyze_keeps_previous_report() {
        let mut session = ViewSession::new();
        assert!(session.try_begin_analyze());
        session.finish_analyze(report("r1", true));
        assert!(session.try_begin_analyze());
        session.fail_analyze();
        assert_eq!(session.current().unwrap().run_id, "r1");
        assert!(session.composed_script().is_some());
    }

    #[test]
    fn refresh_same_run_preserves_toggles() {
        let mut session = ViewSession::new();
        session.finish_analyze(report("r1", false));
        session.toggle_step("a");
        assert!(session.composer().is_selected("a"));

        session.finish_analyze(report("r1", false));
        assert!(session.composer().is_selected("a"));

        session.finish_analyze(report("r2", false));
        assert!(!session.composer().is_selected("a"));
    }

    #[test]
    fn clear_drops_everything() {
        let mut session = ViewSession::new();
        session.finish_analyze(report("r1", true));
        session.clear();
        assert!(session.current().is_none());
        assert_eq!(session.composer(), &ComposerState::NoPlan);
        assert!(session.composed_script().is_none());
    }
}
