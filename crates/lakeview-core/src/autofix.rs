//! Stateful autofix step selection and deterministic script composition.
//!
//! The composer survives report refreshes: as long as consecutive reports
//! describe the same plan for the same run, user toggles are preserved
//! wholesale. The moment the run or the plan's step set changes, the
//! selection re-initializes from the producer's `enabled` flags. Plan
//! identity is a digest over the run id and the ordered step ids, so
//! reordered or renamed steps count as a new plan.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::report::{AutofixPlan, Report};

/// Identity of one plan within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanKey(String);

impl PlanKey {
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Digest over the run id and the ordered step ids.
pub fn plan_key(run_id: &str, plan: &AutofixPlan) -> PlanKey {
    let mut hasher = Sha256::new();
    hasher.update(run_id.as_bytes());
    hasher.update([0u8]);
    for step in &plan.steps {
        hasher.update(step.id.as_bytes());
        hasher.update([0u8]);
    }
    PlanKey(hex::encode(hasher.finalize()))
}

/// Composer state. Selection is an id set; order never matters because
/// composition follows plan order, not toggle order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComposerState {
    #[default]
    NoPlan,
    PlanLoaded {
        key: PlanKey,
        selection: BTreeSet<String>,
    },
}

impl ComposerState {
    /// Steps the producer recommends on, plus locked steps unconditionally.
    pub fn initial_selection(plan: &AutofixPlan) -> BTreeSet<String> {
        plan.steps
            .iter()
            .filter(|s| s.enabled || s.locked)
            .map(|s| s.id.clone())
            .collect()
    }

    /// Fold a fresh report into the state. Same run and same plan shape
    /// keep the current selection; anything else re-initializes.
    pub fn reconcile(&self, report: &Report) -> ComposerState {
        let Some(plan) = report.autofix.plan.as_ref().filter(|p| !p.steps.is_empty()) else {
            return ComposerState::NoPlan;
        };
        let key = plan_key(&report.run_id, plan);
        match self {
            ComposerState::PlanLoaded {
                key: current,
                selection,
            } if *current == key => ComposerState::PlanLoaded {
                key,
                selection: selection.clone(),
            },
            _ => ComposerState::PlanLoaded {
                selection: Self::initial_selection(plan),
                key,
            },
        }
    }

    /// Flip one step's membership. Unknown ids and locked steps are
    /// no-ops, as is any toggle while no plan is loaded.
    pub fn toggle(&self, plan: &AutofixPlan, id: &str) -> ComposerState {
        let ComposerState::PlanLoaded { key, selection } = self else {
            return ComposerState::NoPlan;
        };
        let mut next = selection.clone();
        match plan.steps.iter().find(|s| s.id == id) {
            Some(step) if !step.locked => {
                if !next.remove(id) {
                    next.insert(id.to_owned());
                }
            }
            _ => {}
        }
        ComposerState::PlanLoaded {
            key: key.clone(),
            selection: next,
        }
    }

    /// Select every step of the plan.
    pub fn select_all(&self, plan: &AutofixPlan) -> ComposerState {
        self.replace_selection(plan.steps.iter().map(|s| s.id.clone()).collect())
    }

    /// Clear the selection. Locked steps stay selected.
    pub fn select_none(&self, plan: &AutofixPlan) -> ComposerState {
        self.replace_selection(
            plan.steps
                .iter()
                .filter(|s| s.locked)
                .map(|s| s.id.clone())
                .collect(),
        )
    }

    fn replace_selection(&self, selection: BTreeSet<String>) -> ComposerState {
        match self {
            ComposerState::NoPlan => ComposerState::NoPlan,
            ComposerState::PlanLoaded { key, .. } => ComposerState::PlanLoaded {
                key: key.clone(),
                selection,
            },
        }
    }

    pub fn selection(&self) -> Option<&BTreeSet<String>> {
        match self {
            ComposerState::NoPlan => None,
            ComposerState::PlanLoaded { selection, .. } => Some(selection),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection().is_some_and(|s| s.contains(id))
    }
}

/// Compose the runnable script for a selection. Header and footer always
/// frame the output; selected step bodies appear in plan order, separated
/// by blank lines. Empty segments are dropped rather than stacking blank
/// lines, so a synthesized legacy plan reproduces its script verbatim.
pub fn composed_script(plan: &AutofixPlan, selection: &BTreeSet<String>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let header = plan.header.trim_end();
    if !header.is_empty() {
        parts.push(header);
    }
    for step in &plan.steps {
        if selection.contains(&step.id) && !step.code.is_empty() {
            parts.push(&step.code);
        }
    }
    let footer = plan.footer.trim_start();
    if !footer.is_empty() {
        parts.push(footer);
    }
    parts.join("\n\n")
}

/// Script for the current report and composer state, `None` without a
/// loaded plan.
pub fn script_for(report: &Report, state: &ComposerState) -> Option<String> {
    let plan = report.autofix.plan.as_ref()?;
    let selection = state.selection()?;
    Some(composed_script(plan, selection))
}

/// Selected ids in plan order, the order the service applies them in.
pub fn ordered_selection(plan: &AutofixPlan, selection: &BTreeSet<String>) -> Vec<String> {
    plan.steps
        .iter()
        .filter(|s| selection.contains(&s.id))
        .map(|s| s.id.clone())
        .collect()
}
