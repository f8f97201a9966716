use super::{score_entries, Evaluator};
use crate::checks::Comparator;
use crate::issues::{Category, IssueDocument};
use crate::ledger::ScoringLedger;

/// Registry values, on platforms that have a registry.
pub struct RegistryEvaluator;

impl Evaluator for RegistryEvaluator {
    fn category(&self) -> Category {
        Category::RegistryValue
    }

    fn evaluate(
        &self,
        document: &mut IssueDocument,
        comparator: &dyn Comparator,
        ledger: &mut ScoringLedger,
    ) {
        let IssueDocument::RegistryValue(issues) = document else {
            return;
        };
        score_entries(
            self.category(),
            issues,
            |issue| comparator.registry_value(issue),
            ledger,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::registry::tests::{issue, FakeRegistry};
    use crate::checks::registry::RegistryValue;
    use crate::checks::windows::WindowsComparator;

    #[test]
    fn denied_access_scores_as_unmatched() {
        let registry = FakeRegistry {
            denied: vec!["SOFTWARE\\Policies\\Test".into()],
            ..Default::default()
        };
        let comparator = WindowsComparator::new("Windows 10 Pro".into(), Box::new(registry));

        let mut entry = issue(Some("1"), true);
        entry.meta.triggered = true;
        let mut document = IssueDocument::RegistryValue(vec![entry]);
        let mut ledger = ScoringLedger::new();

        RegistryEvaluator.evaluate(&mut document, &comparator, &mut ledger);

        assert!(ledger.change_status.lost);
        assert!(document.metas().all(|m| !m.triggered));
    }

    #[test]
    fn matching_value_is_rewarded() {
        let registry = FakeRegistry::default().with(
            "SOFTWARE\\Policies\\Test",
            "Setting",
            RegistryValue::Dword(1),
        );
        let comparator = WindowsComparator::new("Windows 10 Pro".into(), Box::new(registry));
        let mut document = IssueDocument::RegistryValue(vec![issue(Some("1"), true)]);
        let mut ledger = ScoringLedger::new();

        RegistryEvaluator.evaluate(&mut document, &comparator, &mut ledger);

        assert_eq!(ledger.points_gained_descriptions, vec!["Registry hardening - 5 points"]);
    }
}
