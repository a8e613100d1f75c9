use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw_help(area: Rect, f: &mut Frame) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Magenta));
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            key("q"),
            Span::raw(" / "),
            key("Ctrl-C"),
            Span::raw("  Quit"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("s"),
            Span::raw("           Analyze the selected document"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("c"),
            Span::raw("           Clear document and session"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("d"),
            Span::raw("           Load the demo analysis"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("h"),
            Span::raw("           Check service health"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("e"),
            Span::raw("           Export report as JSON"),
        ]),
        Line::from(""),
        Line::from("Clauses:"),
        Line::from(vec![
            Span::raw("  "),
            key("↑/↓"),
            Span::raw(" or "),
            key("j/k"),
            Span::raw("  Navigate"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Enter"),
            Span::raw(" / "),
            key("Space"),
            Span::raw("  Expand/collapse (one open at a time)"),
        ]),
        Line::from(""),
        Line::from("Questions:"),
        Line::from(vec![
            Span::raw("  "),
            key("a"),
            Span::raw(" / "),
            key("/"),
            Span::raw("       Focus the question input"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Enter"),
            Span::raw("       Send, "),
            key("Esc"),
            Span::raw(" to leave the input"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            key("?"),
            Span::raw("           Show this help"),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
