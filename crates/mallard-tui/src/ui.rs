use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use mallard_core::{ChatRole, ReplyPhase, Scheduler};

use crate::app::{App, SPINNER_DOTS};

const PLACEHOLDER: &str = "Ask me a question...";
const MAX_INPUT_LINES: u16 = 6;

pub fn render<S: Scheduler>(app: &mut App<S>, frame: &mut Frame) {
    let area = frame.area();

    let input_lines = (app.controller.input().as_str().split('\n').count() as u16)
        .max(1)
        .min(MAX_INPUT_LINES);

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" LLMallard ", Style::default().fg(Color::Yellow).bold()),
        Span::styled(
            "The surprisingly helpful rubber duck.",
            Style::default().fg(Color::Gray).italic(),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn role_line(role: ChatRole) -> Line<'static> {
    let color = match role {
        ChatRole::User => Color::Cyan,
        ChatRole::Bot => Color::Yellow,
    };
    Line::from(Span::styled(
        format!("{}:", role.label()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Five dots with one lit, cycling while the duck thinks.
fn spinner_line(frame_idx: usize) -> Line<'static> {
    let spans: Vec<Span> = (0..SPINNER_DOTS)
        .map(|i| {
            if i == frame_idx {
                Span::styled("● ", Style::default().fg(Color::Yellow))
            } else {
                Span::styled("○ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    Line::from(spans)
}

/// The transcript as drawn in the chat area: finished messages, then the
/// pending reply's spinner or partial text.
fn chat_text<S: Scheduler>(app: &App<S>) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.controller.timeline() {
        lines.push(role_line(msg.role));
        for line in msg.text.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if let Some(pending) = app.controller.pending() {
        lines.push(role_line(ChatRole::Bot));
        match pending.phase() {
            ReplyPhase::Waiting => lines.push(spinner_line(app.animation_frame)),
            ReplyPhase::Revealing => {
                let shown = pending.revealed_text().unwrap_or_default();
                let mut revealed: Vec<Line> =
                    shown.lines().map(|l| Line::from(l.to_string())).collect();
                if revealed.is_empty() {
                    revealed.push(Line::default());
                }
                if let Some(last) = revealed.last_mut() {
                    last.push_span(Span::styled("▌", Style::default().fg(Color::Yellow)));
                }
                lines.extend(revealed);
            }
            ReplyPhase::Idle => {}
        }
    }

    if lines.is_empty() {
        Text::from(Span::styled(
            "The duck is listening...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    }
}

fn render_chat<S: Scheduler>(app: &mut App<S>, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");
    let inner = chat_block.inner(area);

    // Measure with the same wrapping the widget renders with
    let chat = Paragraph::new(chat_text(app)).wrap(Wrap { trim: false });
    let rows = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    app.set_viewport(inner.height, rows);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input<S: Scheduler>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let ready = app.controller.accepts_input();
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if ready { Color::Yellow } else { Color::DarkGray }))
        .title(if ready { " Ask " } else { " The duck is thinking... " });

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let input = app.controller.input();
    let (cursor_line, cursor_col) = input.cursor_line_col();

    // Keep the cursor visible in both directions
    let col_offset = if inner_width == 0 || cursor_col < inner_width {
        0
    } else {
        cursor_col - inner_width + 1
    };
    let line_offset = if inner_height == 0 || cursor_line < inner_height {
        0
    } else {
        cursor_line - inner_height + 1
    };

    let body = if input.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        // split('\n') keeps a trailing empty line so the cursor has a row
        let visible: Vec<Line> = input
            .as_str()
            .split('\n')
            .skip(line_offset)
            .take(inner_height)
            .map(|l| Line::from(l.chars().skip(col_offset).take(inner_width).collect::<String>()))
            .collect();
        // Cyan matches the "You:" label
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(body.block(input_block), area);

    // Input regains focus whenever the duck is idle
    if ready {
        let x = (cursor_col - col_offset) as u16;
        let y = (cursor_line - line_offset) as u16;
        frame.set_cursor_position((area.x + x + 1, area.y + y + 1));
    }
}

fn render_footer<S: Scheduler>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.controller.reply_phase() {
        ReplyPhase::Idle => (" READY ", Style::default().bg(Color::Blue).fg(Color::White)),
        ReplyPhase::Waiting => (" THINKING ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        ReplyPhase::Revealing => (" QUACKING ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(
            " Enter send | Alt+Enter newline | PgUp/PgDn scroll | Esc quit ",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}
