//! Command Box
//!
//! Vim-style `:` prompt on the bottom rows. Completions sit above the
//! prompt with the screen each route opens and its number shortcut.

use crate::app::App;
use crate::nav::Route;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

const MAX_SUGGESTIONS: usize = 8;

/// What a completion does, plus its sidebar shortcut when it is a route
fn describe(app: &App, name: &str) -> (String, Option<char>) {
    match name {
        "q" | "quit" => ("Salir de sygt".to_string(), None),
        "refresh" => (
            format!("Recargar {}", app.current_resource().display_name),
            None,
        ),
        "help" => ("Atajos de teclado".to_string(), None),
        _ => match Route::parse(name) {
            Some(route) => (
                format!("Ir a {}", route.label()),
                char::from_digit(route.index() as u32 + 1, 10),
            ),
            None => (String::new(), None),
        },
    }
}

/// Typed text followed by the untyped rest of the completion
fn prompt_line<'a>(typed: &'a str, completion: Option<&'a str>) -> Line<'a> {
    let mut spans = vec![
        Span::styled(":", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(typed, Style::default().fg(Color::White)),
    ];
    if let Some(rest) = completion.and_then(|c| c.strip_prefix(typed)) {
        spans.push(Span::styled(rest, Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
    Line::from(spans)
}

pub fn render(f: &mut Frame, app: &App) {
    let shown = app.command_suggestions.len().min(MAX_SUGGESTIONS);
    let height = shown as u16 + 3;
    let [_, box_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(height)])
        .areas(f.area());

    f.render_widget(Clear, box_area);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} coincidencias · Tab completa · Enter ejecuta ", app.command_suggestions.len()),
            Style::default().fg(Color::DarkGray),
        ));
    let inner = block.inner(box_area);
    f.render_widget(block, box_area);

    let [list_area, prompt_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    // Keep the selection on screen when there are more matches than rows
    let first = app
        .command_suggestion_selected
        .saturating_sub(MAX_SUGGESTIONS.saturating_sub(1));

    let rows: Vec<Row> = app
        .command_suggestions
        .iter()
        .enumerate()
        .skip(first)
        .take(MAX_SUGGESTIONS)
        .map(|(i, name)| {
            let (description, shortcut) = describe(app, name);
            let style = if i == app.command_suggestion_selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(vec![
                shortcut.map(|c| c.to_string()).unwrap_or_default(),
                name.clone(),
                description,
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(18),
            Constraint::Min(10),
        ],
    );
    f.render_widget(table, list_area);

    f.render_widget(
        Paragraph::new(prompt_line(&app.command_text, app.command_preview.as_deref())),
        prompt_area,
    );
}
