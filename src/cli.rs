use crate::model::{AnalysisReport, AnswerState, ClientConfig, QaExchange, WorkflowEvent};
use crate::workflow::{self, WorkflowCommand};
use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::io::Write;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "legalzen",
    version,
    about = "LegalZen document analysis client with optional TUI"
)]
pub struct Cli {
    /// Document to analyze (PDF, DOC, DOCX, or TXT)
    pub document: Option<std::path::PathBuf>,

    /// Base URL for the LegalZen service
    #[arg(long, default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Print the analysis result as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text report and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except the JSON result and errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Populate results from the demo endpoint instead of uploading a document
    #[arg(long)]
    pub demo: bool,

    /// Follow-up question to ask after analysis (repeatable, one-shot modes only)
    #[arg(long)]
    pub question: Vec<String>,

    /// Check service connectivity and exit
    #[arg(long)]
    pub health: bool,

    /// Cadence of the simulated analysis progress steps
    #[arg(long, default_value = "600ms")]
    pub progress_step: humantime::Duration,

    /// Trailing delay before the progress indicator is dismissed
    #[arg(long, default_value = "1s")]
    pub progress_linger: humantime::Duration,

    /// HTTP request timeout (transport default when unset)
    #[arg(long)]
    pub request_timeout: Option<humantime::Duration>,

    /// Export the analysis report as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    if args.demo && args.document.is_some() {
        return Err(anyhow::anyhow!(
            "--demo replaces the upload; drop the document argument to use it."
        ));
    }

    if args.health {
        return run_health(&args).await;
    }

    // Silent mode takes precedence over other output modes
    if args.silent {
        return run_one_shot(args, true, true).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_one_shot(args, false, false).await;
        }
    }

    if args.json {
        return run_one_shot(args, true, false).await;
    }

    run_one_shot(args, false, false).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        progress_step: args.progress_step.into(),
        progress_linger: args.progress_linger.into(),
        request_timeout: args.request_timeout.map(Into::into),
        user_agent: format!("legalzen-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn run_health(args: &Cli) -> Result<()> {
    let cfg = build_config(args);
    let client = crate::api::LegalZenClient::new(&cfg)?;
    let healthy = client.health().await?;
    if healthy {
        println!("Service at {} is healthy", cfg.base_url);
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "service at {} reported unhealthy",
            cfg.base_url
        ))
    }
}

/// Drive the workflow controller through one analyze (or demo load) plus any
/// scripted questions, then render the result.
/// `json_output` selects JSON over the text report; `silent` suppresses
/// progress and info lines.
async fn run_one_shot(args: Cli, json_output: bool, silent: bool) -> Result<()> {
    if !args.demo && args.document.is_none() {
        return Err(anyhow::anyhow!(
            "a document path is required (or pass --demo)"
        ));
    }

    let cfg = build_config(&args);
    let (out_tx, out_handle) = if silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };
    let stderr_line = |tx: &Option<mpsc::UnboundedSender<OutputLine>>, msg: String| {
        if let Some(tx) = tx.as_ref() {
            let _ = tx.send(OutputLine::Stderr(msg));
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WorkflowCommand>();
    let controller = tokio::spawn(workflow::run_controller(cfg, event_tx, cmd_rx));

    if args.demo {
        let _ = cmd_tx.send(WorkflowCommand::LoadDemo);
    } else if let Some(path) = args.document.clone() {
        let _ = cmd_tx.send(WorkflowCommand::SelectDocument(path));
        let _ = cmd_tx.send(WorkflowCommand::Submit);
    }

    let mut report: Option<AnalysisReport> = None;
    let mut failure: Option<String> = None;
    let mut questions_by_id: BTreeMap<u64, String> = BTreeMap::new();
    let mut answers_by_id: BTreeMap<u64, AnswerState> = BTreeMap::new();
    let mut outstanding = 0usize;

    while let Some(ev) = event_rx.recv().await {
        match ev {
            WorkflowEvent::SelectionAccepted {
                file_name,
                size_display,
            } => {
                stderr_line(&out_tx, format!("Selected {file_name} ({size_display})"));
            }
            WorkflowEvent::SelectionRejected { reason } => {
                failure = Some(reason);
                let _ = cmd_tx.send(WorkflowCommand::Quit);
            }
            WorkflowEvent::SubmitStarted => {
                stderr_line(&out_tx, "Analyzing...".into());
            }
            WorkflowEvent::ProgressStep { percent, label } => {
                if !json_output {
                    stderr_line(&out_tx, format!("[{percent:>3}%] {label}"));
                }
            }
            WorkflowEvent::AnalysisReady {
                report: ready,
                session_key,
            } => {
                report = Some(*ready);
                if args.question.is_empty() {
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                } else if session_key.is_none() {
                    stderr_line(
                        &out_tx,
                        "No session key returned; follow-up questions skipped".into(),
                    );
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                } else {
                    outstanding = args.question.len();
                    for q in &args.question {
                        let _ = cmd_tx.send(WorkflowCommand::Ask(q.clone()));
                    }
                }
            }
            WorkflowEvent::AnalyzeFailed { message } => {
                failure = Some(message);
                let _ = cmd_tx.send(WorkflowCommand::Quit);
            }
            WorkflowEvent::QuestionPending { id, question } => {
                questions_by_id.insert(id, question);
            }
            WorkflowEvent::AnswerReady { id, answer } => {
                answers_by_id.insert(id, AnswerState::Answered(answer));
                outstanding = outstanding.saturating_sub(1);
                if outstanding == 0 {
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                }
            }
            WorkflowEvent::AnswerFailed { id, message } => {
                answers_by_id.insert(id, AnswerState::Failed(message));
                outstanding = outstanding.saturating_sub(1);
                if outstanding == 0 {
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                }
            }
            WorkflowEvent::AskRejected { reason } => {
                stderr_line(&out_tx, format!("Question skipped: {reason}"));
                outstanding = outstanding.saturating_sub(1);
                if outstanding == 0 {
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                }
            }
            WorkflowEvent::Info(msg) => {
                stderr_line(&out_tx, msg);
            }
            WorkflowEvent::ProgressFinished
            | WorkflowEvent::DocumentCleared
            | WorkflowEvent::HealthChecked { .. } => {}
        }
    }

    controller
        .await
        .context("workflow controller task failed")??;

    let exchanges: Vec<QaExchange> = questions_by_id
        .into_iter()
        .map(|(id, question)| QaExchange {
            id,
            question,
            answer: answers_by_id
                .remove(&id)
                .unwrap_or(AnswerState::Pending),
        })
        .collect();

    if let Some(report) = report.as_ref() {
        if let Some(p) = args.export_json.as_deref() {
            crate::storage::export_json(p, report)?;
            stderr_line(&out_tx, format!("Exported: {}", p.display()));
        }

        if json_output {
            let out = serde_json::to_string_pretty(&serde_json::json!({
                "report": report,
                "qa": exchanges,
            }))?;
            match out_tx.as_ref() {
                Some(tx) => {
                    let _ = tx.send(OutputLine::Stdout(out));
                }
                None => println!("{out}"),
            }
        } else if let Some(tx) = out_tx.as_ref() {
            for line in crate::text_summary::build_text_summary(report).lines {
                let _ = tx.send(OutputLine::Stdout(line));
            }
            if !exchanges.is_empty() {
                let _ = tx.send(OutputLine::Stdout(String::new()));
                let _ = tx.send(OutputLine::Stdout("Questions".to_string()));
                for x in &exchanges {
                    let _ = tx.send(OutputLine::Stdout(format!("  Q: {}", x.question)));
                    let _ = tx.send(OutputLine::Stdout(format!(
                        "  A: {}",
                        x.answer.display_text()
                    )));
                }
            }
        }
    }

    if let Some(tx) = out_tx {
        drop(tx);
    }
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }

    match failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}
