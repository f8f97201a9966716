use crate::error::Result;
use crate::SweepReport;

/// Render a sweep report as pretty JSON.
pub fn render(report: &SweepReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}
