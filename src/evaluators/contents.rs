use super::{score_entries, Evaluator};
use crate::checks::Comparator;
use crate::issues::{Category, IssueDocument};
use crate::ledger::ScoringLedger;

/// Files that must contain specific lines or fragments.
pub struct ContentsEvaluator;

impl Evaluator for ContentsEvaluator {
    fn category(&self) -> Category {
        Category::FileContents
    }

    fn evaluate(
        &self,
        document: &mut IssueDocument,
        comparator: &dyn Comparator,
        ledger: &mut ScoringLedger,
    ) {
        let IssueDocument::FileContents(issues) = document else {
            return;
        };
        score_entries(
            self.category(),
            issues,
            |issue| comparator.file_contents(issue),
            ledger,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::linux::LinuxComparator;
    use crate::issues::{ContentsIssue, IssueMeta};

    #[test]
    fn edit_and_revert_of_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sshd_config");
        std::fs::write(&path, "PermitRootLogin yes\n").unwrap();

        let mut document = IssueDocument::FileContents(vec![ContentsIssue {
            meta: IssueMeta::new(3, "Disabled root SSH login"),
            path: path.clone(),
            contents: vec!["PermitRootLogin no".into()],
        }]);
        let comparator = LinuxComparator::new("Ubuntu 22.04".into());
        let mut ledger = ScoringLedger::new();

        ContentsEvaluator.evaluate(&mut document, &comparator, &mut ledger);
        assert_eq!(ledger.points_gained_total, 0);

        std::fs::write(&path, "PermitRootLogin no\n").unwrap();
        ledger.reset();
        ContentsEvaluator.evaluate(&mut document, &comparator, &mut ledger);
        assert_eq!(ledger.points_gained_total, 3);
        assert!(ledger.change_status.gained);

        std::fs::remove_file(&path).unwrap();
        ledger.reset();
        ContentsEvaluator.evaluate(&mut document, &comparator, &mut ledger);
        assert!(ledger.change_status.lost);
        assert!(document.metas().all(|m| !m.triggered));
    }
}
