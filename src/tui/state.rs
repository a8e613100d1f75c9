use crate::model::{AnalysisReport, AnswerState, QaExchange, WorkflowEvent};

/// Which pane receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Clauses,
    Question,
}

/// Presentation state mirrored from workflow events. Owned by the UI thread
/// only; the controller never touches it.
pub struct UiState {
    pub document_name: Option<String>,
    pub document_size: Option<String>,
    pub submitting: bool,
    pub upload_error: bool,
    pub progress: Option<(u8, String)>,
    pub info: String,
    pub session_key_present: bool,
    pub report: Option<AnalysisReport>,
    pub selected_clause: usize,
    pub open_clause: Option<usize>,
    pub exchanges: Vec<QaExchange>,
    pub question_input: String,
    pub focus: Focus,
    pub show_help: bool,
    pub healthy: Option<bool>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            document_name: None,
            document_size: None,
            submitting: false,
            upload_error: false,
            progress: None,
            info: String::new(),
            session_key_present: false,
            report: None,
            selected_clause: 0,
            open_clause: None,
            exchanges: Vec::new(),
            question_input: String::new(),
            focus: Focus::Clauses,
            show_help: false,
            healthy: None,
        }
    }
}

impl UiState {
    pub fn clause_count(&self) -> usize {
        self.report.as_ref().map(|r| r.clauses.len()).unwrap_or(0)
    }

    /// Submit affordance: needs a document and no analyze in flight.
    pub fn submit_enabled(&self) -> bool {
        self.document_name.is_some() && !self.submitting
    }

    /// Ask affordance: non-empty trimmed input and an active session.
    /// Re-evaluated on every keystroke by the render loop.
    pub fn ask_enabled(&self) -> bool {
        !self.question_input.trim().is_empty() && self.session_key_present
    }

    /// Accordion toggle: at most one clause open; opening one closes any
    /// other, and toggling the open one closes it.
    pub fn toggle_clause(&mut self, index: usize) {
        if index >= self.clause_count() {
            return;
        }
        self.open_clause = if self.open_clause == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn select_next_clause(&mut self) {
        let count = self.clause_count();
        if count > 0 && self.selected_clause + 1 < count {
            self.selected_clause += 1;
        }
    }

    pub fn select_prev_clause(&mut self) {
        self.selected_clause = self.selected_clause.saturating_sub(1);
    }

    /// Fold a workflow event into the presentation state.
    pub fn apply_event(&mut self, ev: WorkflowEvent) {
        match ev {
            WorkflowEvent::SelectionAccepted {
                file_name,
                size_display,
            } => {
                self.info = format!("Selected {file_name} ({size_display})");
                self.document_name = Some(file_name);
                self.document_size = Some(size_display);
                self.upload_error = false;
            }
            WorkflowEvent::SelectionRejected { reason } => {
                // Rejected selections leave no document behind.
                self.document_name = None;
                self.document_size = None;
                self.info = reason;
            }
            WorkflowEvent::DocumentCleared => {
                self.document_name = None;
                self.document_size = None;
                self.session_key_present = false;
                self.report = None;
                self.exchanges.clear();
                self.selected_clause = 0;
                self.open_clause = None;
                self.upload_error = false;
                self.info = "Document cleared".into();
            }
            WorkflowEvent::SubmitStarted => {
                self.submitting = true;
                self.upload_error = false;
                self.progress = Some((0, "Starting".into()));
            }
            WorkflowEvent::ProgressStep { percent, label } => {
                self.progress = Some((percent, label));
            }
            WorkflowEvent::AnalysisReady {
                report,
                session_key,
            } => {
                self.report = Some(*report);
                self.session_key_present = session_key.is_some();
                self.exchanges.clear();
                self.selected_clause = 0;
                self.open_clause = None;
                self.info = "Analysis complete".into();
            }
            WorkflowEvent::AnalyzeFailed { message } => {
                self.upload_error = true;
                self.info = message;
            }
            WorkflowEvent::ProgressFinished => {
                self.submitting = false;
                self.progress = None;
            }
            WorkflowEvent::QuestionPending { id, question } => {
                self.exchanges.push(QaExchange {
                    id,
                    question,
                    answer: AnswerState::Pending,
                });
                self.question_input.clear();
            }
            WorkflowEvent::AnswerReady { id, answer } => {
                if let Some(x) = self.exchanges.iter_mut().find(|x| x.id == id) {
                    x.answer = AnswerState::Answered(answer);
                }
            }
            WorkflowEvent::AnswerFailed { id, message } => {
                if let Some(x) = self.exchanges.iter_mut().find(|x| x.id == id) {
                    x.answer = AnswerState::Failed(message);
                }
            }
            WorkflowEvent::AskRejected { reason } => {
                self.info = reason;
            }
            WorkflowEvent::HealthChecked { healthy } => {
                self.healthy = Some(healthy);
                self.info = if healthy {
                    "Service is healthy".into()
                } else {
                    "Service is unreachable or unhealthy".into()
                };
            }
            WorkflowEvent::Info(msg) => {
                self.info = msg;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Clause;

    fn state_with_clauses(n: usize) -> UiState {
        let clauses = (0..n)
            .map(|i| Clause {
                title: Some(format!("C{i}")),
                original: "O".into(),
                simplified: "S".into(),
                explanation: None,
            })
            .collect();
        let mut state = UiState::default();
        state.apply_event(WorkflowEvent::AnalysisReady {
            report: Box::new(AnalysisReport {
                analyzed_at_utc: String::new(),
                file_name: None,
                document_type: None,
                summary: None,
                clauses,
                key_points: vec![],
            }),
            session_key: Some("sk1".into()),
        });
        state
    }

    #[test]
    fn accordion_allows_at_most_one_open_entry() {
        let mut state = state_with_clauses(3);
        state.toggle_clause(0);
        assert_eq!(state.open_clause, Some(0));

        // Opening another entry closes the first.
        state.toggle_clause(2);
        assert_eq!(state.open_clause, Some(2));

        // Toggling the open entry closes it; nothing is forced open.
        state.toggle_clause(2);
        assert_eq!(state.open_clause, None);
    }

    #[test]
    fn toggle_out_of_range_is_ignored() {
        let mut state = state_with_clauses(1);
        state.toggle_clause(5);
        assert_eq!(state.open_clause, None);
    }

    #[test]
    fn ask_enabled_tracks_input_and_session() {
        let mut state = UiState::default();
        assert!(!state.ask_enabled());

        state.question_input = "What is the term?".into();
        // Still disabled without a session key.
        assert!(!state.ask_enabled());

        state.apply_event(WorkflowEvent::AnalysisReady {
            report: Box::new(AnalysisReport {
                analyzed_at_utc: String::new(),
                file_name: None,
                document_type: None,
                summary: Some("S".into()),
                clauses: vec![],
                key_points: vec![],
            }),
            session_key: Some("abc".into()),
        });
        state.question_input = "What is the term?".into();
        assert!(state.ask_enabled());

        // Whitespace-only input disables again.
        state.question_input = "   ".into();
        assert!(!state.ask_enabled());
    }

    #[test]
    fn submit_enabled_requires_document_and_idle() {
        let mut state = UiState::default();
        assert!(!state.submit_enabled());

        state.apply_event(WorkflowEvent::SelectionAccepted {
            file_name: "contract.pdf".into(),
            size_display: "0.01 MiB".into(),
        });
        assert!(state.submit_enabled());

        state.apply_event(WorkflowEvent::SubmitStarted);
        assert!(!state.submit_enabled());

        // Re-enabled only once the indicator is dismissed.
        state.apply_event(WorkflowEvent::AnalysisReady {
            report: Box::new(AnalysisReport {
                analyzed_at_utc: String::new(),
                file_name: None,
                document_type: None,
                summary: None,
                clauses: vec![],
                key_points: vec![],
            }),
            session_key: None,
        });
        assert!(!state.submit_enabled());
        state.apply_event(WorkflowEvent::ProgressFinished);
        assert!(state.submit_enabled());
    }

    #[test]
    fn answers_land_on_their_own_exchange() {
        let mut state = state_with_clauses(0);
        state.apply_event(WorkflowEvent::QuestionPending {
            id: 0,
            question: "first".into(),
        });
        state.apply_event(WorkflowEvent::QuestionPending {
            id: 1,
            question: "second".into(),
        });
        assert_eq!(state.exchanges[0].answer, AnswerState::Pending);
        assert_eq!(state.exchanges[1].answer, AnswerState::Pending);

        // The second answer arrives first and must not touch exchange 0.
        state.apply_event(WorkflowEvent::AnswerReady {
            id: 1,
            answer: "A2".into(),
        });
        assert_eq!(state.exchanges[0].answer, AnswerState::Pending);
        assert_eq!(
            state.exchanges[1].answer,
            AnswerState::Answered("A2".into())
        );

        state.apply_event(WorkflowEvent::AnswerFailed {
            id: 0,
            message: "Sorry, rate limited".into(),
        });
        assert_eq!(
            state.exchanges[0].answer,
            AnswerState::Failed("Sorry, rate limited".into())
        );
    }

    #[test]
    fn question_input_clears_when_exchange_is_appended() {
        let mut state = state_with_clauses(0);
        state.question_input = "What is the term?".into();
        state.apply_event(WorkflowEvent::QuestionPending {
            id: 0,
            question: "What is the term?".into(),
        });
        assert!(state.question_input.is_empty());
        assert_eq!(state.exchanges.len(), 1);
    }

    #[test]
    fn analyze_failure_flips_upload_error_state() {
        let mut state = UiState::default();
        state.apply_event(WorkflowEvent::SelectionAccepted {
            file_name: "contract.pdf".into(),
            size_display: "0.01 MiB".into(),
        });
        state.apply_event(WorkflowEvent::SubmitStarted);
        state.apply_event(WorkflowEvent::AnalyzeFailed {
            message: "boom".into(),
        });
        assert!(state.upload_error);

        // A fresh selection clears the error state.
        state.apply_event(WorkflowEvent::SelectionAccepted {
            file_name: "contract.pdf".into(),
            size_display: "0.01 MiB".into(),
        });
        assert!(!state.upload_error);
    }

    #[test]
    fn new_analysis_replaces_prior_view_entirely() {
        let mut state = state_with_clauses(2);
        state.toggle_clause(1);
        state.apply_event(WorkflowEvent::QuestionPending {
            id: 0,
            question: "q".into(),
        });

        state.apply_event(WorkflowEvent::AnalysisReady {
            report: Box::new(AnalysisReport {
                analyzed_at_utc: String::new(),
                file_name: None,
                document_type: None,
                summary: Some("new".into()),
                clauses: vec![],
                key_points: vec![],
            }),
            session_key: Some("sk2".into()),
        });
        assert!(state.exchanges.is_empty());
        assert_eq!(state.open_clause, None);
        assert_eq!(state.report.as_ref().unwrap().summary.as_deref(), Some("new"));
    }

    #[test]
    fn clearing_resets_session_and_results() {
        let mut state = state_with_clauses(1);
        assert!(state.session_key_present);
        state.apply_event(WorkflowEvent::DocumentCleared);
        assert!(!state.session_key_present);
        assert!(state.report.is_none());
        assert!(state.exchanges.is_empty());
    }
}
