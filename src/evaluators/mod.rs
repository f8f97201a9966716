mod contents;
mod existence;
mod registry;
mod version;

use crate::checks::{CheckResult, Comparator};
use crate::issues::{Category, Issue, IssueDocument, IssueMeta};
use crate::ledger::ScoringLedger;
use crate::store::DefinitionStore;

/// Scores one category's entries against the live machine.
pub trait Evaluator: Send + Sync {
    fn category(&self) -> Category;

    /// Check every entry of `document`, feed the verdicts to `ledger`, and
    /// store the new trigger state on each entry.
    fn evaluate(
        &self,
        document: &mut IssueDocument,
        comparator: &dyn Comparator,
        ledger: &mut ScoringLedger,
    );
}

/// One evaluator per category.
pub fn all_evaluators() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(existence::ExistenceEvaluator),
        Box::new(contents::ContentsEvaluator),
        Box::new(registry::RegistryEvaluator),
        Box::new(version::VersionEvaluator),
    ]
}

/// Run one full sweep: reset the ledger, then evaluate every loaded category.
///
/// Sweeps must not overlap; the exclusive borrows enforce that for a
/// single store and ledger.
pub fn sweep(store: &mut DefinitionStore, comparator: &dyn Comparator, ledger: &mut ScoringLedger) {
    ledger.reset();

    for evaluator in all_evaluators() {
        if let Some(document) = store.get_mut(evaluator.category()) {
            evaluator.evaluate(document, comparator, ledger);
        }
    }

    tracing::info!(
        tracked = ledger.total_issues_tracked,
        gained = ledger.points_gained_total,
        lost = ledger.points_lost_total,
        changed_gained = ledger.change_status.gained,
        changed_lost = ledger.change_status.lost,
        "sweep complete"
    );
}

/// Check each entry in order. An unsupported category abandons the rest.
fn score_entries<T: Issue>(
    category: Category,
    entries: &mut [T],
    check: impl Fn(&T) -> CheckResult,
    ledger: &mut ScoringLedger,
) {
    for entry in entries.iter_mut() {
        ledger.track(entry.meta().points);

        let matched = match check(entry) {
            Ok(matched) => matched,
            Err(unsupported) => {
                tracing::warn!(%category, error = %unsupported, "skipping category for this sweep");
                return;
            }
        };

        apply_verdict(entry.meta_mut(), matched, ledger);
    }
}

/// Per-entry state machine.
///
/// | matched | was triggered | ledger call           | triggered after |
/// |---------|---------------|-----------------------|-----------------|
/// | yes     | no            | outcome (new)         | yes             |
/// | yes     | yes           | outcome (reconfirmed) | yes             |
/// | no      | yes           | regression            | no              |
/// | no      | no            | none                  | no              |
fn apply_verdict(meta: &mut IssueMeta, matched: bool, ledger: &mut ScoringLedger) {
    tracing::debug!(description = %meta.description, matched, triggered = meta.triggered, "checked");

    match (matched, meta.triggered) {
        (true, was_triggered) => {
            ledger.record_outcome(meta.points, &meta.description, was_triggered);
            meta.triggered = true;
        }
        (false, true) => {
            ledger.record_regression(meta.points, &meta.description);
            meta.triggered = false;
        }
        (false, false) => {}
    }
}
