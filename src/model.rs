use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub progress_step: Duration,
    #[serde(with = "humantime_serde")]
    pub progress_linger: Duration,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

/// One clause from the analyze response. Only `original` and `simplified`
/// are guaranteed by the service; everything else may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    #[serde(default)]
    pub title: Option<String>,
    pub original: String,
    pub simplified: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Clause {
    /// Title to display for the clause at `index` (0-based), falling back
    /// to a numbered label when the service supplied none.
    pub fn display_title(&self, index: usize) -> String {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => format!("Clause {}", index + 1),
        }
    }
}

/// Body of a successful `POST /` or `GET /demo` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub clauses: Option<Vec<Clause>>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a `POST /ask` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Client-side view of one analysis. Replaces the previous report entirely
/// whenever a new analyze (or demo load) succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub analyzed_at_utc: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

impl AnalysisReport {
    pub fn from_response(resp: &AnalyzeResponse, file_name: Option<&str>) -> Self {
        Self {
            analyzed_at_utc: now_rfc3339(),
            file_name: file_name.map(str::to_string),
            document_type: resp.document_type.clone(),
            summary: resp.summary.clone(),
            clauses: resp.clauses.clone().unwrap_or_default(),
            key_points: resp.key_points.clone().unwrap_or_default(),
        }
    }
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

/// One question/answer exchange in the session history. The id is assigned
/// by the controller and ties a server response back to the exchange that
/// asked it, so overlapping questions cannot mis-attribute answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaExchange {
    pub id: u64,
    pub question: String,
    pub answer: AnswerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerState {
    Pending,
    Answered(String),
    Failed(String),
}

impl AnswerState {
    /// Text shown for this answer, with the loading placeholder for
    /// exchanges still waiting on the service.
    pub fn display_text(&self) -> &str {
        match self {
            AnswerState::Pending => "Thinking...",
            AnswerState::Answered(text) | AnswerState::Failed(text) => text,
        }
    }
}

/// Events emitted by the workflow controller and consumed by presentation
/// layers (TUI, text/JSON one-shot modes, tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    SelectionAccepted {
        file_name: String,
        size_display: String,
    },
    SelectionRejected {
        reason: String,
    },
    DocumentCleared,
    SubmitStarted,
    ProgressStep {
        percent: u8,
        label: String,
    },
    AnalysisReady {
        // Box to keep WorkflowEvent small; reports carry full clause text.
        report: Box<AnalysisReport>,
        session_key: Option<String>,
    },
    AnalyzeFailed {
        message: String,
    },
    ProgressFinished,
    QuestionPending {
        id: u64,
        question: String,
    },
    AnswerReady {
        id: u64,
        answer: String,
    },
    AnswerFailed {
        id: u64,
        message: String,
    },
    AskRejected {
        reason: String,
    },
    HealthChecked {
        healthy: bool,
    },
    Info(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_title_falls_back_to_numbered_label() {
        let clause = Clause {
            title: None,
            original: "O".into(),
            simplified: "S".into(),
            explanation: None,
        };
        assert_eq!(clause.display_title(0), "Clause 1");
        assert_eq!(clause.display_title(4), "Clause 5");

        let titled = Clause {
            title: Some("Term".into()),
            ..clause.clone()
        };
        assert_eq!(titled.display_title(0), "Term");

        let blank = Clause {
            title: Some("   ".into()),
            ..clause
        };
        assert_eq!(blank.display_title(1), "Clause 2");
    }

    #[test]
    fn analyze_response_tolerates_missing_fields() {
        let parsed: AnalyzeResponse = serde_json::from_str(r#"{"summary":"S"}"#).unwrap();
        assert_eq!(parsed.summary.as_deref(), Some("S"));
        assert!(parsed.clauses.is_none());
        assert!(parsed.session_key.is_none());
        assert!(parsed.error.is_none());
    }

    #[test]
    fn report_replaces_absent_lists_with_empty() {
        let resp: AnalyzeResponse = serde_json::from_str(r#"{"summary":"S"}"#).unwrap();
        let report = AnalysisReport::from_response(&resp, Some("a.txt"));
        assert!(report.clauses.is_empty());
        assert!(report.key_points.is_empty());
        assert_eq!(report.file_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn pending_answer_shows_placeholder() {
        assert_eq!(AnswerState::Pending.display_text(), "Thinking...");
        assert_eq!(AnswerState::Answered("yes".into()).display_text(), "yes");
    }
}
