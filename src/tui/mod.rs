mod help;
mod state;

use crate::cli::Cli;
use crate::model::{AnswerState, WorkflowEvent};
use crate::workflow::{self, WorkflowCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use state::{Focus, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the
    // controller task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WorkflowCommand>();

    let cfg = crate::cli::build_config(&args);

    // Preselect the document given on the command line; submission stays a
    // user action.
    if let Some(path) = args.document.clone() {
        let _ = cmd_tx.send(WorkflowCommand::SelectDocument(path));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the
    // Tokio runtime. It owns the command sender: if the UI goes away, the
    // controller observes the closed channel and stops.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));

    let res = workflow::run_controller(cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<WorkflowCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        let mut disconnected = false;
        loop {
            match event_rx.try_recv() {
                Ok(ev) => state.apply_event(ev),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            // Controller is gone; nothing left to drive.
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if state.show_help {
                    state.show_help = false;
                    continue;
                }
                if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                    let _ = cmd_tx.send(WorkflowCommand::Quit);
                    break Ok(());
                }
                match state.focus {
                    Focus::Question => match k.code {
                        KeyCode::Esc => {
                            state.focus = Focus::Clauses;
                        }
                        KeyCode::Enter => {
                            // Enabled exactly when input is non-empty and a
                            // session exists; the controller re-checks anyway.
                            if state.ask_enabled() {
                                let _ = cmd_tx
                                    .send(WorkflowCommand::Ask(state.question_input.clone()));
                            }
                        }
                        KeyCode::Backspace => {
                            state.question_input.pop();
                        }
                        KeyCode::Char(c) => {
                            state.question_input.push(c);
                        }
                        _ => {}
                    },
                    Focus::Clauses => match k.code {
                        KeyCode::Char('q') => {
                            let _ = cmd_tx.send(WorkflowCommand::Quit);
                            break Ok(());
                        }
                        KeyCode::Char('s') => {
                            let _ = cmd_tx.send(WorkflowCommand::Submit);
                        }
                        KeyCode::Char('c') => {
                            let _ = cmd_tx.send(WorkflowCommand::ClearDocument);
                        }
                        KeyCode::Char('d') => {
                            let _ = cmd_tx.send(WorkflowCommand::LoadDemo);
                        }
                        KeyCode::Char('h') => {
                            let _ = cmd_tx.send(WorkflowCommand::HealthCheck);
                        }
                        KeyCode::Char('e') => {
                            export_report(&mut state);
                        }
                        KeyCode::Char('a') | KeyCode::Char('/') => {
                            state.focus = Focus::Question;
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            state.select_prev_clause();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            state.select_next_clause();
                        }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            state.toggle_clause(state.selected_clause);
                        }
                        KeyCode::Char('?') => {
                            state.show_help = true;
                        }
                        _ => {}
                    },
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn export_report(state: &mut UiState) {
    let Some(report) = state.report.as_ref() else {
        state.info = "Nothing to export yet".into();
        return;
    };
    let path = std::path::PathBuf::from(format!(
        "legalzen-report-{}.json",
        time::OffsetDateTime::now_utc().unix_timestamp()
    ));
    match crate::storage::export_json(&path, report) {
        Ok(()) => {
            state.info = format!("Exported: {}", path.display());
        }
        Err(e) => {
            state.info = format!("Export failed: {e:#}");
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    if state.show_help {
        help::draw_help(area, f);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(9),
        ])
        .split(area);

    draw_status(rows[0], f, state);
    draw_progress(rows[1], f, state);
    draw_analysis(rows[2], f, state);
    draw_qa(rows[3], f, state);
}

fn kv_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = Vec::new();
    match (state.document_name.as_deref(), state.document_size.as_deref()) {
        (Some(name), Some(size)) => lines.push(kv_line("Document", format!("{name} ({size})"))),
        _ => lines.push(kv_line(
            "Document",
            "none selected (pass a path, or press d for demo)".into(),
        )),
    }
    lines.push(kv_line(
        "Session",
        if state.session_key_present {
            "active, questions enabled".into()
        } else {
            "none".into()
        },
    ));
    if let Some(healthy) = state.healthy {
        lines.push(kv_line(
            "Service",
            if healthy { "healthy".into() } else { "unhealthy".into() },
        ));
    }
    if !state.info.is_empty() {
        let style = if state.upload_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        lines.push(Line::from(Span::styled(state.info.clone(), style)));
    }

    let border_style = if state.upload_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("LegalZen"),
    );
    f.render_widget(p, area);
}

fn draw_progress(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    match state.progress.as_ref() {
        Some((percent, label)) => {
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Analyzing"))
                .gauge_style(Style::default().fg(Color::Cyan))
                .percent(u16::from(*percent))
                .label(format!("{percent}% - {label}"));
            f.render_widget(gauge, area);
        }
        None => {
            let hint = if state.submit_enabled() {
                "Press s to analyze the selected document"
            } else if state.document_name.is_none() {
                "Select a document to begin"
            } else {
                "Working..."
            };
            let p = Paragraph::new(hint)
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title("Status"));
            f.render_widget(p, area);
        }
    }
}

fn draw_analysis(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    draw_summary(cols[0], f, state);
    draw_clauses(cols[1], f, state);
}

fn draw_summary(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    match state.report.as_ref() {
        Some(report) => {
            if let Some(kind) = report.document_type.as_deref() {
                lines.push(kv_line("Type", kind.to_string()));
                lines.push(Line::from(""));
            }
            if let Some(summary) = report.summary.as_deref() {
                lines.push(Line::from(summary.to_string()));
            }
            if !report.key_points.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Key points",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for point in &report.key_points {
                    lines.push(Line::from(format!("- {point}")));
                }
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No analysis yet",
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(p, area);
}

fn draw_clauses(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    match state.report.as_ref() {
        Some(report) if !report.clauses.is_empty() => {
            for (i, clause) in report.clauses.iter().enumerate() {
                let open = state.open_clause == Some(i);
                let marker = if open { "v" } else { ">" };
                let mut style = Style::default();
                if i == state.selected_clause {
                    style = style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
                }
                lines.push(Line::from(Span::styled(
                    format!("{marker} {}. {}", i + 1, clause.display_title(i)),
                    style,
                )));
                if open {
                    lines.push(Line::from(Span::styled(
                        "  Original",
                        Style::default().fg(Color::Gray),
                    )));
                    lines.push(Line::from(format!("    {}", clause.original)));
                    lines.push(Line::from(Span::styled(
                        "  Simplified",
                        Style::default().fg(Color::Gray),
                    )));
                    lines.push(Line::from(format!("    {}", clause.simplified)));
                    if let Some(explanation) = clause.explanation.as_deref() {
                        lines.push(Line::from(Span::styled(
                            "  Explanation",
                            Style::default().fg(Color::Gray),
                        )));
                        lines.push(Line::from(format!("    {explanation}")));
                    }
                    lines.push(Line::from(""));
                }
            }
        }
        Some(_) => {
            lines.push(Line::from(Span::styled(
                "No clauses identified.",
                Style::default().fg(Color::Gray),
            )));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Clauses appear here after analysis",
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Clauses"));
    f.render_widget(p, area);
}

fn draw_qa(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if state.exchanges.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask a question about the analyzed document",
            Style::default().fg(Color::Gray),
        )));
    }
    // Most recent exchanges fit the pane; older ones scroll off the top.
    for x in state.exchanges.iter().rev().take(2).rev() {
        lines.push(Line::from(vec![
            Span::styled("Q: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(x.question.clone()),
        ]));
        let answer_style = match &x.answer {
            AnswerState::Pending => Style::default().fg(Color::Gray),
            AnswerState::Answered(_) => Style::default(),
            AnswerState::Failed(_) => Style::default().fg(Color::Red),
        };
        lines.push(Line::from(vec![
            Span::styled("A: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(x.answer.display_text().to_string(), answer_style),
        ]));
    }
    let history = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Questions & Answers"),
    );
    f.render_widget(history, rows[0]);

    let (title, border_style) = if state.focus == Focus::Question {
        if state.ask_enabled() {
            ("Ask (Enter to send, Esc to leave)", Style::default().fg(Color::Cyan))
        } else if state.session_key_present {
            ("Ask (type a question)", Style::default().fg(Color::Cyan))
        } else {
            (
                "Ask (upload and analyze a document first)",
                Style::default().fg(Color::Red),
            )
        }
    } else {
        ("Ask (press a or / to focus)", Style::default())
    };
    let cursor = if state.focus == Focus::Question { "_" } else { "" };
    let input = Paragraph::new(format!("{}{}", state.question_input, cursor)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    f.render_widget(input, rows[1]);
}
