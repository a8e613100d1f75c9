//! Text report builder for CLI output.
//!
//! Formats an analysis report as human-readable lines for text mode.

use crate::model::AnalysisReport;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the text rendering of an analysis report.
pub(crate) fn build_text_summary(report: &AnalysisReport) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(name) = report.file_name.as_deref() {
        lines.push(format!("Document: {name}"));
    }
    if let Some(kind) = report.document_type.as_deref() {
        lines.push(format!("Type: {kind}"));
    }

    // An absent summary renders nothing; it is not an error.
    if let Some(summary) = report.summary.as_deref() {
        lines.push(String::new());
        lines.push("Summary".to_string());
        lines.push(format!("  {summary}"));
    }

    lines.push(String::new());
    if report.clauses.is_empty() {
        lines.push("No clauses identified.".to_string());
    } else {
        lines.push(format!("Clauses ({})", report.clauses.len()));
        for (i, clause) in report.clauses.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!("  {}. {}", i + 1, clause.display_title(i)));
            lines.push(format!("     Original:   {}", clause.original));
            lines.push(format!("     Simplified: {}", clause.simplified));
            if let Some(explanation) = clause.explanation.as_deref() {
                lines.push(format!("     Explanation: {explanation}"));
            }
        }
    }

    if !report.key_points.is_empty() {
        lines.push(String::new());
        lines.push("Key points".to_string());
        for point in &report.key_points {
            lines.push(format!("  - {point}"));
        }
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Clause;

    fn report_with(clauses: Vec<Clause>) -> AnalysisReport {
        AnalysisReport {
            analyzed_at_utc: "2026-01-01T00:00:00Z".into(),
            file_name: Some("contract.pdf".into()),
            document_type: Some("employment contract".into()),
            summary: Some("S".into()),
            clauses,
            key_points: vec![],
        }
    }

    #[test]
    fn empty_clause_list_renders_placeholder() {
        let summary = build_text_summary(&report_with(vec![]));
        assert!(summary
            .lines
            .iter()
            .any(|l| l == "No clauses identified."));
        assert!(!summary.lines.iter().any(|l| l.contains("Clause 1")));
    }

    #[test]
    fn explanation_line_only_when_present() {
        let with = report_with(vec![Clause {
            title: Some("Term".into()),
            original: "O1".into(),
            simplified: "Si1".into(),
            explanation: Some("E1".into()),
        }]);
        let lines = build_text_summary(&with).lines;
        assert!(lines.iter().any(|l| l.contains("Explanation: E1")));

        let without = report_with(vec![Clause {
            title: Some("Term".into()),
            original: "O1".into(),
            simplified: "Si1".into(),
            explanation: None,
        }]);
        let lines = build_text_summary(&without).lines;
        assert!(!lines.iter().any(|l| l.contains("Explanation")));
        assert!(lines.iter().any(|l| l.contains("1. Term")));
    }

    #[test]
    fn untitled_clauses_get_numbered_labels() {
        let report = report_with(vec![
            Clause {
                title: None,
                original: "O1".into(),
                simplified: "Si1".into(),
                explanation: None,
            },
            Clause {
                title: None,
                original: "O2".into(),
                simplified: "Si2".into(),
                explanation: None,
            },
        ]);
        let lines = build_text_summary(&report).lines;
        assert!(lines.iter().any(|l| l.contains("1. Clause 1")));
        assert!(lines.iter().any(|l| l.contains("2. Clause 2")));
    }

    #[test]
    fn absent_summary_renders_no_summary_block() {
        let mut report = report_with(vec![]);
        report.summary = None;
        let lines = build_text_summary(&report).lines;
        assert!(!lines.iter().any(|l| l == "Summary"));
    }
}
