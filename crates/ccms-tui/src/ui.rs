//! Layout and rendering for the interactive search screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, Status};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_search_bar(frame, app, chunks[0]);
    render_results(frame, app, chunks[1]);
    render_status_line(frame, app, chunks[2]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let text = if app.input.is_empty() {
        Span::styled("type a query, Enter to search...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.input.as_str(), Style::default().fg(Color::White))
    };

    let line = Line::from(vec![
        Span::styled("search> ", Style::default().fg(Color::Cyan)),
        text,
    ]);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                " ccms ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    if app.results.is_empty() {
        let message = match &app.status {
            Status::Searching => "searching...",
            Status::Error(_) => "query failed, see status line",
            _ => "no results",
        };
        let paragraph = Paragraph::new(message).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" results "),
        );
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .results
        .iter()
        .map(|result| {
            let timestamp = result
                .message
                .timestamp
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            let header = format!(
                "{timestamp} {} {}",
                result.message.kind.as_str(),
                result.message.uuid
            );
            ListItem::new(vec![
                Line::from(Span::styled(header, Style::default().fg(Color::Cyan))),
                Line::from(result.snippet.clone()),
            ])
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.selected));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" results "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.status {
        Status::Idle => "ready".to_string(),
        Status::Searching => "searching...".to_string(),
        Status::Done {
            elapsed,
            total_matches,
        } => format!(
            "{} result(s) of {} total match(es) in {}ms — Enter: search, ↑/↓: select, Ctrl+Y: copy, Esc: quit",
            app.results.len(),
            total_matches,
            elapsed.as_millis()
        ),
        Status::Error(message) => format!("error: {message}"),
    };

    let text = app
        .clipboard_message
        .as_ref()
        .map(|m| format!("{text} | {m}"))
        .unwrap_or(text);

    frame.render_widget(Paragraph::new(text), area);
}
