//! Upload/session workflow controller.
//!
//! Owns the workflow state (selected document, session key, submit state,
//! Q&A history) and mutates it from one task only. Surfaces
//! send `WorkflowCommand`s and mirror state from `WorkflowEvent`s, so the
//! workflow is testable without any terminal attached.

use crate::api::LegalZenClient;
use crate::document::SelectedDocument;
use crate::model::{
    AnalysisReport, AnalyzeResponse, AnswerState, ClientConfig, QaExchange, WorkflowEvent,
};
use crate::workflow::progress;
use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands presentation layers send to the controller.
#[derive(Debug, Clone)]
pub(crate) enum WorkflowCommand {
    SelectDocument(PathBuf),
    ClearDocument,
    Submit,
    Ask(String),
    LoadDemo,
    HealthCheck,
    Quit,
}

/// Submission state machine. `Submitting` covers the whole indicator
/// lifetime, including the trailing linger after the outcome is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SubmitState {
    #[default]
    Idle,
    Submitting,
}

#[derive(Default)]
struct WorkflowState {
    document: Option<SelectedDocument>,
    session_key: Option<String>,
    submit: SubmitState,
    exchanges: Vec<QaExchange>,
    next_exchange_id: u64,
}

/// Spawn the analyze pipeline. The upload starts immediately and runs
/// concurrently with the paced progress steps; the full step sequence
/// completes before the outcome is handed back.
fn start_analyze(
    client: &LegalZenClient,
    cfg: &ClientConfig,
    doc: SelectedDocument,
    event_tx: UnboundedSender<WorkflowEvent>,
) -> JoinHandle<Result<AnalyzeResponse>> {
    let client = client.clone();
    let step = cfg.progress_step;
    tokio::spawn(async move {
        let request = tokio::spawn(async move { client.analyze(&doc).await });
        progress::run_progress_steps(step, &event_tx).await;
        match request.await {
            Ok(res) => res,
            Err(e) => Err(anyhow::anyhow!("analyze request task failed: {e}")),
        }
    })
}

/// Install a successful analyze (or demo) response: replace the report and
/// Q&A history wholesale, and store the session key when one is carried.
/// A response without a session key still renders.
fn install_report(
    state: &mut WorkflowState,
    resp: &AnalyzeResponse,
    file_name: Option<&str>,
    event_tx: &UnboundedSender<WorkflowEvent>,
) {
    if let Some(key) = resp.session_key.clone() {
        state.session_key = Some(key);
    }
    // A new analysis replaces everything derived from the previous one.
    state.exchanges.clear();
    let _ = event_tx.send(WorkflowEvent::AnalysisReady {
        report: Box::new(AnalysisReport::from_response(resp, file_name)),
        session_key: state.session_key.clone(),
    });
}

/// Drive the workflow until `Quit` (or the command channel closes).
pub(crate) async fn run_controller(
    cfg: ClientConfig,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<WorkflowCommand>,
) -> Result<()> {
    let client = LegalZenClient::new(&cfg)?;
    let mut state = WorkflowState::default();

    // In-flight analyze run, joined in the select loop below.
    let mut analyze: Option<JoinHandle<Result<AnalyzeResponse>>> = None;
    let mut submitted_file: Option<String> = None;
    let mut linger_until: Option<tokio::time::Instant> = None;

    // Ask/demo tasks report back through internal channels so this loop
    // stays the only mutator of the workflow state.
    let (ask_tx, mut ask_rx) = mpsc::unbounded_channel::<(u64, Result<String>)>();
    let (demo_tx, mut demo_rx) = mpsc::unbounded_channel::<Result<AnalyzeResponse>>();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(WorkflowCommand::SelectDocument(path)) => {
                        if state.submit == SubmitState::Submitting {
                            let _ = event_tx.send(WorkflowEvent::Info(
                                "Analysis in progress; selection is locked".into(),
                            ));
                            continue;
                        }
                        match SelectedDocument::load(&path).await {
                            Ok(doc) => {
                                let _ = event_tx.send(WorkflowEvent::SelectionAccepted {
                                    file_name: doc.file_name.clone(),
                                    size_display: doc.size_display(),
                                });
                                // Last selection wins.
                                state.document = Some(doc);
                            }
                            Err(e) => {
                                // No partial acceptance: a rejected selection leaves
                                // no document behind. Session key and report stay.
                                state.document = None;
                                let _ = event_tx.send(WorkflowEvent::SelectionRejected {
                                    reason: format!("{e:#}"),
                                });
                            }
                        }
                    }
                    Some(WorkflowCommand::ClearDocument) => {
                        if state.submit == SubmitState::Submitting {
                            let _ = event_tx.send(WorkflowEvent::Info(
                                "Analysis in progress; cannot clear yet".into(),
                            ));
                            continue;
                        }
                        state.document = None;
                        state.session_key = None;
                        state.exchanges.clear();
                        let _ = event_tx.send(WorkflowEvent::DocumentCleared);
                    }
                    Some(WorkflowCommand::Submit) => {
                        // Idempotent guard: no-op while submitting or without a document.
                        if state.submit == SubmitState::Submitting {
                            continue;
                        }
                        let Some(doc) = state.document.clone() else {
                            continue;
                        };
                        state.submit = SubmitState::Submitting;
                        submitted_file = Some(doc.file_name.clone());
                        let _ = event_tx.send(WorkflowEvent::SubmitStarted);
                        analyze = Some(start_analyze(&client, &cfg, doc, event_tx.clone()));
                    }
                    Some(WorkflowCommand::Ask(question)) => {
                        let question = question.trim().to_string();
                        if question.is_empty() {
                            // Empty question: silent no-op.
                            continue;
                        }
                        let Some(key) = state.session_key.clone() else {
                            let _ = event_tx.send(WorkflowEvent::AskRejected {
                                reason: "Please upload and analyze a document first.".into(),
                            });
                            continue;
                        };
                        let id = state.next_exchange_id;
                        state.next_exchange_id += 1;
                        state.exchanges.push(QaExchange {
                            id,
                            question: question.clone(),
                            answer: AnswerState::Pending,
                        });
                        let _ = event_tx.send(WorkflowEvent::QuestionPending {
                            id,
                            question: question.clone(),
                        });
                        let client = client.clone();
                        let ask_tx = ask_tx.clone();
                        tokio::spawn(async move {
                            let res = client.ask(&key, &question).await;
                            let _ = ask_tx.send((id, res));
                        });
                    }
                    Some(WorkflowCommand::LoadDemo) => {
                        if state.submit == SubmitState::Submitting {
                            continue;
                        }
                        let client = client.clone();
                        let demo_tx = demo_tx.clone();
                        tokio::spawn(async move {
                            let _ = demo_tx.send(client.demo().await);
                        });
                    }
                    Some(WorkflowCommand::HealthCheck) => {
                        let client = client.clone();
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            let healthy = client.health().await.unwrap_or(false);
                            let _ = event_tx.send(WorkflowEvent::HealthChecked { healthy });
                        });
                    }
                    Some(WorkflowCommand::Quit) | None => {
                        if let Some(h) = analyze.take() {
                            h.abort();
                        }
                        break;
                    }
                }
            }
            // Analyze outcome. The handle must stay in place until this branch
            // wins, or completion would never be observed.
            maybe_done = async {
                match analyze.as_mut() {
                    Some(h) => Some(h.await),
                    None => futures::future::pending().await,
                }
            } => {
                if let Some(join_res) = maybe_done {
                    analyze = None;
                    match join_res {
                        Ok(Ok(resp)) => {
                            install_report(&mut state, &resp, submitted_file.as_deref(), &event_tx);
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(WorkflowEvent::AnalyzeFailed {
                                message: format!("{e:#}"),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(WorkflowEvent::AnalyzeFailed {
                                message: format!("analysis task failed: {e}"),
                            });
                        }
                    }
                    submitted_file = None;
                    // The indicator stays up through a trailing linger so the
                    // outcome is visible before it is dismissed.
                    linger_until = Some(tokio::time::Instant::now() + cfg.progress_linger);
                }
            }
            // Dismiss the indicator and return to Idle once the linger elapses.
            _ = async {
                match linger_until {
                    Some(t) => tokio::time::sleep_until(t).await,
                    None => futures::future::pending().await,
                }
            } => {
                linger_until = None;
                state.submit = SubmitState::Idle;
                let _ = event_tx.send(WorkflowEvent::ProgressFinished);
            }
            Some((id, res)) = ask_rx.recv() => {
                let outcome = match res {
                    Ok(answer) => {
                        let _ = event_tx.send(WorkflowEvent::AnswerReady {
                            id,
                            answer: answer.clone(),
                        });
                        AnswerState::Answered(answer)
                    }
                    Err(e) => {
                        let message = format!(
                            "Sorry, I couldn't answer that question ({e:#}). Please try again."
                        );
                        let _ = event_tx.send(WorkflowEvent::AnswerFailed {
                            id,
                            message: message.clone(),
                        });
                        AnswerState::Failed(message)
                    }
                };
                if let Some(exchange) = state.exchanges.iter_mut().find(|x| x.id == id) {
                    exchange.answer = outcome;
                }
            }
            Some(res) = demo_rx.recv() => {
                match res {
                    Ok(resp) => install_report(&mut state, &resp, None, &event_tx),
                    Err(e) => {
                        let _ = event_tx.send(WorkflowEvent::Info(
                            format!("Demo load failed: {e:#}"),
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}
