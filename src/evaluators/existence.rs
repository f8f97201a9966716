use super::{score_entries, Evaluator};
use crate::checks::Comparator;
use crate::issues::{Category, IssueDocument};
use crate::ledger::ScoringLedger;

/// Files that should or should not be present.
pub struct ExistenceEvaluator;

impl Evaluator for ExistenceEvaluator {
    fn category(&self) -> Category {
        Category::FileExistence
    }

    fn evaluate(
        &self,
        document: &mut IssueDocument,
        comparator: &dyn Comparator,
        ledger: &mut ScoringLedger,
    ) {
        let IssueDocument::FileExistence(issues) = document else {
            return;
        };
        score_entries(
            self.category(),
            issues,
            |issue| comparator.file_exists(issue),
            ledger,
        );
    }
}
