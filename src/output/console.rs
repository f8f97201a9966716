use crate::SweepReport;

/// Render a sweep report as plain console text.
pub fn render(report: &SweepReport) -> String {
    let ledger = &report.ledger;
    let mut output = String::new();

    output.push_str(&format!(
        "\n  {} ({}) checked at {}\n\n",
        report.os,
        report.os_version,
        report.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if ledger.points_gained_descriptions.is_empty() && ledger.points_lost_descriptions.is_empty() {
        output.push_str("  No issues scored yet.\n\n");
    }

    for description in &ledger.points_gained_descriptions {
        output.push_str(&format!("  [+] {}\n", description));
    }
    for description in &ledger.points_lost_descriptions {
        output.push_str(&format!("  [-] {}\n", description));
    }
    if !ledger.points_gained_descriptions.is_empty() || !ledger.points_lost_descriptions.is_empty()
    {
        output.push('\n');
    }

    let found = ledger.points_gained_descriptions.len();
    output.push_str(&format!(
        "  Score: {} ({} gained, {} lost), {} of {} issues found\n",
        ledger.net_points(),
        ledger.points_gained_total,
        ledger.points_lost_total.unsigned_abs(),
        found,
        ledger.total_issues_tracked,
    ));

    let status = match (ledger.change_status.gained, ledger.change_status.lost) {
        (true, true) => "points gained and lost",
        (true, false) => "points gained",
        (false, true) => "points lost",
        (false, false) => "no change",
    };
    output.push_str(&format!("  Since last check: {}\n\n", status));

    output
}
