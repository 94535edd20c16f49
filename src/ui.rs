use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, FocusPane, InputMode};
use crate::state::{display_name, Speaker};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Body: chat column on the left, proposal + artifact on the right
    let [chat_column, side_column] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    render_chat_column(app, frame, chat_column);
    render_side_column(app, frame, side_column);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending_indicator = if app.state.proposal.is_empty() {
        String::new()
    } else {
        format!(" [{} pending]", app.state.proposal.len())
    };

    let title = Line::from(vec![
        Span::styled(" Architect Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(pending_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat_column(app: &mut App, frame: &mut Frame, area: Rect) {
    let confirm_height = if app.state.awaiting_confirmation() { 3 } else { 0 };

    let [chat_area, confirm_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(confirm_height),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area and dimensions for mouse hit-testing and scroll math
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;
    let chat_border_color = if chat_focused { Color::Cyan } else { Color::DarkGray };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(chat_border_color))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();
    for turn in &app.state.turns {
        match turn.speaker {
            Speaker::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            Speaker::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Architect:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
        }
        for line in turn.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        if turn.text.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());
    }

    if app.request_in_flight() {
        lines.push(Line::from(Span::styled(
            "Architect:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Confirmation affordance replaces free input while the gate is up
    if app.state.awaiting_confirmation() {
        let confirm = Paragraph::new(Line::from(vec![
            Span::styled(" y ", Style::default().bg(Color::Green).fg(Color::Black).bold()),
            Span::raw(" Yes, proceed   "),
            Span::styled(" n ", Style::default().bg(Color::Red).fg(Color::White).bold()),
            Span::raw(" No, adjust"),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Confirm proposal "),
        );
        frame.render_widget(confirm, confirm_area);
    }

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let gated = app.state.awaiting_confirmation();
    let editing = app.input_mode == InputMode::Editing && !gated;

    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if gated {
        " Answer the proposal first (y/n) "
    } else {
        " Describe your architecture (Enter to send) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if gated {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let input = Paragraph::new(visible_text).style(text_style).block(input_block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = area.x + 1 + (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

fn render_side_column(app: &mut App, frame: &mut Frame, area: Rect) {
    // Proposal panel only appears while the ledger is non-empty
    let proposal_height = if app.state.proposal.is_empty() {
        0
    } else {
        (app.state.proposal.len().min(6) + 2) as u16
    };

    let [proposal_area, artifact_area] = Layout::vertical([
        Constraint::Length(proposal_height),
        Constraint::Min(0),
    ])
    .areas(area);

    if proposal_height > 0 {
        let items: Vec<ListItem> = app
            .state
            .proposal
            .iter()
            .map(|item| ListItem::new(format!(" • {}", display_name(item))))
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Current Proposal (Pending) "),
        );
        frame.render_widget(list, proposal_area);
    }

    app.artifact_area = Some(artifact_area);

    let artifact_focused = app.focus == FocusPane::Artifact;
    let artifact_border_color = if artifact_focused { Color::Cyan } else { Color::DarkGray };

    let artifact = Paragraph::new(app.state.artifact.as_str())
        .style(Style::default().fg(Color::Green))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(artifact_border_color))
                .title(" Architecture Output "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.artifact_scroll, 0));

    frame.render_widget(artifact, artifact_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints: Vec<Span> = if app.state.awaiting_confirmation() {
        vec![
            Span::styled(" y/n ", key_style),
            Span::styled(" answer ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
        ]
    } else if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" browse ", label_style),
        ]
    } else {
        vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    hints.extend(vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" ^R ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    if let Some(status) = &app.status {
        hints.push(Span::raw(" "));
        hints.push(Span::styled(
            format!(" {} ", status),
            Style::default().bg(Color::Red).fg(Color::White),
        ));
    }

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}
