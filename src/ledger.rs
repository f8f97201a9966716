//! Running score for one sweep.
//!
//! The ledger is reset at the start of every sweep, written by each
//! category evaluator while the sweep runs, and read by reporters once it
//! finishes. Totals describe current standing; [`ChangeStatus`] records
//! whether anything moved since the previous sweep.

use serde::{Deserialize, Serialize};

/// What changed during the sweep. Both flags may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub gained: bool,
    pub lost: bool,
}

impl ChangeStatus {
    pub fn is_unchanged(&self) -> bool {
        !self.gained && !self.lost
    }
}

/// Score totals and award/penalty descriptions for the current sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringLedger {
    /// Entries with positive points seen this sweep, matched or not.
    pub total_issues_tracked: usize,
    pub points_gained_total: i64,
    pub points_gained_descriptions: Vec<String>,
    /// Sum of negative points; never positive.
    pub points_lost_total: i64,
    pub points_lost_descriptions: Vec<String>,
    pub change_status: ChangeStatus,
}

impl ScoringLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything ahead of a new sweep.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count an entry toward the "issues to find" denominator.
    pub fn track(&mut self, points: i32) {
        if points > 0 {
            self.total_issues_tracked += 1;
        }
    }

    /// Score an entry whose condition currently holds.
    ///
    /// `was_triggered` is the entry's state from the previous sweep; only a
    /// newly satisfied entry raises a change flag.
    pub fn record_outcome(&mut self, points: i32, description: &str, was_triggered: bool) {
        if points > 0 {
            self.points_gained_total += i64::from(points);
            self.points_gained_descriptions
                .push(describe(description, points));
            if !was_triggered {
                self.change_status.gained = true;
            }
        } else if points < 0 {
            self.points_lost_total += i64::from(points);
            self.points_lost_descriptions
                .push(describe(description, points));
            if !was_triggered {
                self.change_status.lost = true;
            }
        }
    }

    /// Note an entry that held last sweep but no longer does.
    ///
    /// A rewarded fix that came undone is a loss; a penalty that no longer
    /// applies is a gain. Totals are untouched because the entry is simply
    /// absent from this sweep's standing.
    pub fn record_regression(&mut self, points: i32, description: &str) {
        if points > 0 {
            self.change_status.lost = true;
        } else if points < 0 {
            self.change_status.gained = true;
        }
        tracing::debug!(points, description, "regressed");
    }

    pub fn net_points(&self) -> i64 {
        self.points_gained_total + self.points_lost_total
    }
}

fn describe(description: &str, points: i32) -> String {
    format!("{} - {} points", description, points.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn new_gain_sets_flag() {
        let mut ledger = ScoringLedger::new();
        ledger.record_outcome(5, "X", false);

        assert_eq!(ledger.points_gained_total, 5);
        assert_eq!(ledger.points_lost_total, 0);
        assert_eq!(ledger.points_gained_descriptions, vec!["X - 5 points"]);
        assert!(ledger.change_status.gained);
        assert!(!ledger.change_status.lost);
    }

    #[test]
    fn new_penalty_uses_absolute_value_in_text() {
        let mut ledger = ScoringLedger::new();
        ledger.record_outcome(-5, "Y", false);

        assert_eq!(ledger.points_lost_total, -5);
        assert_eq!(ledger.points_gained_total, 0);
        assert_eq!(ledger.points_lost_descriptions, vec!["Y - 5 points"]);
        assert!(ledger.change_status.lost);
        assert!(!ledger.change_status.gained);
    }

    #[test]
    fn gains_accumulate_in_call_order() {
        let mut ledger = ScoringLedger::new();
        ledger.record_outcome(5, "first", false);
        ledger.record_outcome(10, "second", true);

        assert_eq!(ledger.points_gained_total, 15);
        assert_eq!(
            ledger.points_gained_descriptions,
            vec!["first - 5 points", "second - 10 points"]
        );
    }

    #[test]
    fn reconfirmation_keeps_status_unchanged() {
        let mut ledger = ScoringLedger::new();
        ledger.record_outcome(5, "X", true);
        ledger.record_outcome(-3, "Y", true);

        assert_eq!(ledger.net_points(), 2);
        assert!(ledger.change_status.is_unchanged());
    }

    #[test]
    fn zero_points_is_a_no_op() {
        let mut ledger = ScoringLedger::new();
        ledger.record_outcome(0, "nothing", false);
        assert_eq!(ledger, ScoringLedger::default());
    }

    #[test]
    fn regression_flags_are_inverted() {
        let mut ledger = ScoringLedger::new();
        ledger.record_regression(5, "undid fix");
        assert!(ledger.change_status.lost);
        assert!(!ledger.change_status.gained);

        let mut ledger = ScoringLedger::new();
        ledger.record_regression(-5, "penalty resolved");
        assert!(ledger.change_status.gained);
        assert!(!ledger.change_status.lost);
        assert_eq!(ledger.net_points(), 0);
    }

    #[test]
    fn reset_clears_a_busy_ledger() {
        let mut ledger = ScoringLedger::new();
        ledger.track(5);
        ledger.record_outcome(5, "X", false);
        ledger.record_outcome(-2, "Y", false);

        ledger.reset();

        assert_eq!(ledger, ScoringLedger::default());
        assert_eq!(ledger.total_issues_tracked, 0);
        assert!(ledger.change_status.is_unchanged());

        ledger.reset();
        assert_eq!(ledger, ScoringLedger::default());
    }

    #[test]
    fn only_positive_entries_are_tracked() {
        let mut ledger = ScoringLedger::new();
        ledger.track(5);
        ledger.track(-5);
        ledger.track(1);
        assert_eq!(ledger.total_issues_tracked, 2);
    }

    proptest! {
        #[test]
        fn descriptions_match_scoring_calls(points in prop::collection::vec(-50i32..50, 0..40)) {
            let mut ledger = ScoringLedger::new();
            for (i, p) in points.iter().enumerate() {
                ledger.record_outcome(*p, &format!("issue {i}"), i % 2 == 0);
            }

            let gained: Vec<i64> = points.iter().filter(|p| **p > 0).map(|p| i64::from(*p)).collect();
            let lost: Vec<i64> = points.iter().filter(|p| **p < 0).map(|p| i64::from(*p)).collect();

            prop_assert_eq!(ledger.points_gained_descriptions.len(), gained.len());
            prop_assert_eq!(ledger.points_lost_descriptions.len(), lost.len());
            prop_assert_eq!(ledger.points_gained_total, gained.iter().sum::<i64>());
            prop_assert_eq!(ledger.points_lost_total, lost.iter().sum::<i64>());
            prop_assert!(ledger.points_lost_total <= 0);
        }
    }
}
