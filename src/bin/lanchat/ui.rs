//! Terminal UI rendering using ratatui

use crate::app::{App, InputMode};
use lanchat::EntryKind;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Draw the main UI
pub fn draw(f: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(f.area());

    draw_sidebar(f, columns[0], app);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Transcript
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(columns[1]);

    draw_transcript(f, rows[0], app);
    draw_input(f, rows[1], app);
    draw_status(f, rows[2], app);
}

/// Draw the contacts/conversations sidebar
fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem<'_>> = app
        .sidebar()
        .iter()
        .map(|row| {
            let marker = if row.conversation.is_some() {
                "● "
            } else {
                "  "
            };
            let style = if row.conversation.is_some() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(format!("{}{}", marker, row.label)).style(style)
        })
        .collect();

    let sidebar = List::new(items)
        .block(Block::default().title(" Connections ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(sidebar, area, &mut state);
}

/// Draw the transcript of the focused conversation
fn draw_transcript(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(" {} ", app.focused_title());
    let entries = app.focused_transcript();

    let lines: Vec<Line<'_>> = entries
        .iter()
        .map(|entry| match entry.kind {
            // Local text sits on the right.
            EntryKind::Outgoing => Line::from(entry.text.clone()).alignment(Alignment::Right),
            EntryKind::Notice => Line::from(Span::styled(
                entry.text.clone(),
                Style::default().fg(Color::Red),
            )),
            EntryKind::TimeMarker => Line::from(Span::styled(
                entry.text.clone(),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Center),
            EntryKind::Incoming => Line::from(vec![
                Span::styled(
                    format!("{}: ", app.focused_title().trim()),
                    Style::default().fg(Color::Blue),
                ),
                Span::raw(entry.text.clone()),
            ]),
        })
        .collect();

    // Keep the bottom of the transcript in view.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    f.render_widget(transcript, area);
}

/// Draw the input box
fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let (title, border_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default()),
        InputMode::Editing => (" INSERT ", Style::default().fg(Color::Yellow)),
    };

    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(input, area);
}

/// Draw the status bar
fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let status = Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, area);
}
