//! Report export.
//!
//! Workflow state is in-memory only; the sole persistence is an explicit
//! JSON export of the current analysis report.

use crate::model::AnalysisReport;
use anyhow::{Context, Result};
use std::path::Path;

pub fn export_json(path: &Path, report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport {
            analyzed_at_utc: "2026-01-01T00:00:00Z".into(),
            file_name: Some("contract.pdf".into()),
            document_type: None,
            summary: Some("S".into()),
            clauses: vec![],
            key_points: vec!["point".into()],
        };

        export_json(&path, &report).unwrap();
        let loaded: AnalysisReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.summary.as_deref(), Some("S"));
        assert_eq!(loaded.key_points, vec!["point".to_string()]);
    }
}
