use super::{score_entries, Evaluator};
use crate::checks::Comparator;
use crate::issues::{Category, IssueDocument};
use crate::ledger::ScoringLedger;

/// The OS version the machine should have been upgraded to.
pub struct VersionEvaluator;

impl Evaluator for VersionEvaluator {
    fn category(&self) -> Category {
        Category::OsVersion
    }

    fn evaluate(
        &self,
        document: &mut IssueDocument,
        comparator: &dyn Comparator,
        ledger: &mut ScoringLedger,
    ) {
        let IssueDocument::OsVersion(issues) = document else {
            return;
        };
        score_entries(
            self.category(),
            issues,
            |issue| comparator.os_version(issue),
            ledger,
        );
    }
}
