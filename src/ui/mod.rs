//! Terminal User Interface rendering module
//!
//! This module handles all UI rendering for sygt using the ratatui framework.
//! Each screen shows the sidebar of routes next to a table of records, with
//! popups for forms, confirmations and alerts.
//!
//! # Architecture
//!
//! - [`splash`] - Startup splash screen
//! - `header` - Header bar with backend and screen info
//! - `sidebar` - Route list with number shortcuts
//! - `form` - Create/edit form popup
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Delete confirmation and blocking alerts
//! - `command_box` - Command mode input (`:` key)
//!
//! # Virtual Scrolling
//!
//! The table rendering uses virtual scrolling for performance with large datasets.
//! Only visible rows are rendered, with a scrollbar indicating position.
//!
//! # JSON Highlighting
//!
//! The detail view highlights JSON output:
//! - Keys in cyan
//! - Strings in green
//! - Numbers in light blue
//! - Booleans in magenta
//! - Null values in dark gray

mod command_box;
mod dialog;
mod form;
mod header;
mod help;
mod sidebar;
pub mod splash;

use crate::app::{App, Mode};
use crate::resource::{extract_json_value, get_color_for_value, ColumnDef, ResourceKind};
use crate::view::{format_cell, table_rows, DetailState, TableRow};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState,
    },
    Frame,
};
use serde_json::Value;

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header
            Constraint::Min(1),    // Sidebar + content
            Constraint::Length(1), // Footer/crumb
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(1)])
        .split(chunks[1]);

    sidebar::render(f, app, body[0]);

    match app.mode {
        Mode::Detail => render_detail_view(f, app, body[1]),
        _ => render_table(f, app, body[1]),
    }

    render_crumb(f, app, chunks[2]);

    // The form stays visible underneath an alert raised by its submit
    if app.controller.modal_open() {
        form::render(f, app);
    }

    // Overlays
    match app.mode {
        Mode::Help => help::render(f, app),
        Mode::Confirm | Mode::Alert => dialog::render(f, app),
        Mode::Command => command_box::render(f, app),
        _ => {},
    }
}

/// Render the current resource list.
/// Uses virtual scrolling for performance with large datasets.
fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let resource = app.current_resource();

    let title = if app.loading() {
        format!(" {} [cargando...] ", resource.display_name)
    } else {
        format!(" {}[{}] ", resource.display_name, app.items().len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    // Resources without a list only ever show their placeholder
    if resource.columns.is_empty() {
        let hint = Paragraph::new(resource.empty_message.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, inner_area);
        return;
    }

    // Calculate viewport - account for header row
    let visible_height = (inner_area.height as usize).saturating_sub(1);
    let total_items = app.items().len();
    app.view.update_viewport(visible_height);
    app.view.ensure_visible(total_items);

    let needs_scrollbar = total_items > visible_height;

    let table_area = if needs_scrollbar {
        Rect {
            width: inner_area.width.saturating_sub(1),
            ..inner_area
        }
    } else {
        inner_area
    };

    let header_cells: Vec<Cell> = resource
        .columns
        .iter()
        .map(|col| {
            Cell::from(format!(" {}", col.header)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let widths: Vec<Constraint> = resource
        .columns
        .iter()
        .map(|col| Constraint::Percentage(col.width))
        .collect();

    let range = app.view.visible_range(total_items);
    let visible = &app.items()[range.clone()];

    let mut placeholder = None;
    let rows: Vec<Row> = if total_items == 0 {
        placeholder = table_rows(resource, visible)
            .into_iter()
            .find_map(|row| match row {
                TableRow::Placeholder(message) => Some(message),
                TableRow::Record(_) => None,
            });
        Vec::new()
    } else {
        table_rows(resource, visible)
            .into_iter()
            .zip(visible)
            .filter_map(|(row, item)| match row {
                TableRow::Record(cells) => Some(Row::new(
                    cells
                        .into_iter()
                        .zip(&resource.columns)
                        .map(|(text, col)| {
                            Cell::from(format!(" {}", truncate_string(&text, 38)))
                                .style(get_cell_style(item, col))
                        })
                        .collect::<Vec<_>>(),
                )),
                TableRow::Placeholder(_) => None,
            })
            .collect()
    };

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    // Adjust selected index for virtual scrolling
    let mut state = TableState::default();
    if total_items > 0 && app.view.selected >= range.start && app.view.selected < range.end {
        state.select(Some(app.view.selected - range.start));
    }

    f.render_stateful_widget(table, table_area, &mut state);

    // Empty list: one row spanning every column
    if let Some(message) = placeholder {
        let row_area = Rect {
            y: table_area.y.saturating_add(1),
            height: table_area.height.saturating_sub(1).min(1),
            ..table_area
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, row_area);
    }

    if needs_scrollbar {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(symbols::scrollbar::VERTICAL)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::new(total_items.saturating_sub(visible_height))
            .position(app.view.scroll_offset);

        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

/// Get cell style based on the raw value and column definition
fn get_cell_style(item: &Value, col: &ColumnDef) -> Style {
    if let Some(ref color_map_name) = col.color_map {
        let value = extract_json_value(item, &col.json_path);
        if let Some([r, g, b]) = get_color_for_value(color_map_name, &value) {
            return Style::default().fg(Color::Rgb(r, g, b));
        }
    }
    Style::default()
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn render_detail_view(f: &mut Frame, app: &App, area: Rect) {
    let resource = app.current_resource();

    let (title, lines): (String, Vec<Line>) = match &app.view.detail {
        DetailState::Empty => (
            format!(" {} ", resource.singular),
            vec![Line::from("Ningún registro seleccionado")],
        ),
        DetailState::Loading => (
            format!(" {} ", resource.singular),
            vec![Line::from(Span::styled(
                "Cargando...",
                Style::default().fg(Color::Yellow),
            ))],
        ),
        DetailState::Failed(message) => (
            format!(" {} ", resource.singular),
            vec![Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            ))],
        ),
        DetailState::Loaded(record) if app.controller.kind() == ResourceKind::Recibos => {
            receipt_lines(resource, record)
        },
        DetailState::Loaded(record) => {
            let json = serde_json::to_string_pretty(record).unwrap_or_default();
            (
                format!(" {} {} ", resource.singular, detail_id(app)),
                json.lines().map(highlight_json_line).collect(),
            )
        },
    };

    let total_lines = lines.len();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    // Calculate max scroll based on inner area (content area without borders)
    let visible_lines = inner_area.height as usize;
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let scroll = app.detail_scroll.min(max_scroll);

    let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(paragraph, inner_area);

    if total_lines > visible_lines {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(max_scroll + visible_lines).position(scroll);
        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

fn detail_id(app: &App) -> String {
    app.view
        .selected_id
        .as_ref()
        .map(|id| format!("#{}", id))
        .unwrap_or_default()
}

/// Receipt summary: number, issue date, total and state
fn receipt_lines(
    resource: &crate::resource::ResourceDef,
    record: &Value,
) -> (String, Vec<Line<'static>>) {
    let title = format!(" Recibo #{} ", extract_json_value(record, "numero_recibo"));

    let label = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let lines = resource
        .columns
        .iter()
        .filter(|col| col.json_path != "id")
        .map(|col| {
            let value = format_cell(record, col);
            let style = get_cell_style(record, col);
            Line::from(vec![
                Span::styled(format!("{:<12}", col.header), label),
                Span::styled(value, style),
            ])
        })
        .collect();

    (title, lines)
}

/// Apply JSON syntax highlighting to a single line
fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = line.chars().peekable();
    let mut current = String::new();
    let mut is_key = true;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if !current.is_empty() {
                    spans.push(Span::raw(current.clone()));
                    current.clear();
                }

                let mut string_content = String::from("\"");
                while let Some(&next_c) = chars.peek() {
                    chars.next();
                    string_content.push(next_c);
                    if next_c == '"' {
                        break;
                    }
                    if next_c == '\\' {
                        if let Some(&escaped) = chars.peek() {
                            chars.next();
                            string_content.push(escaped);
                        }
                    }
                }

                let style = if is_key {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Green)
                };
                spans.push(Span::styled(string_content, style));
            },
            ':' => {
                current.push(c);
                spans.push(Span::styled(
                    current.clone(),
                    Style::default().fg(Color::White),
                ));
                current.clear();
                is_key = false;
            },
            ',' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::styled(",", Style::default().fg(Color::White)));
                is_key = true;
            },
            '{' | '}' | '[' | ']' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
                if c == '{' || c == '[' {
                    is_key = c == '{';
                }
            },
            ' ' | '\t' => {
                if !current.is_empty() {
                    spans.push(Span::styled(current.clone(), get_json_value_style(&current)));
                    current.clear();
                }
                spans.push(Span::raw(c.to_string()));
            },
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        let style = get_json_value_style(&current);
        spans.push(Span::styled(current, style));
    }

    Line::from(spans)
}

/// Get style for JSON values (numbers, booleans, null)
fn get_json_value_style(value: &str) -> Style {
    let trimmed = value.trim();
    if trimmed == "null" {
        Style::default().fg(Color::DarkGray)
    } else if trimmed == "true" || trimmed == "false" {
        Style::default().fg(Color::Magenta)
    } else if trimmed.parse::<f64>().is_ok() {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_crumb(f: &mut Frame, app: &App, area: Rect) {
    let hint = match app.mode {
        Mode::Detail => "j/k: scroll | q/d/Esc: back",
        Mode::Form => "Tab: next field | Space/←→: option | Enter: save | Esc: cancel",
        _ => "n: new | e: edit | x: delete | Enter: detail | 1-6: screens | ?: help",
    };

    let (status_text, style) = if let Some(err) = &app.error_message {
        (
            format!("Error: {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if app.loading() {
        ("Cargando...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(status) = &app.status_message {
        (status.clone(), Style::default().fg(Color::Green))
    } else {
        (hint.to_string(), Style::default().fg(Color::DarkGray))
    };

    let crumb = Line::from(vec![
        Span::styled(
            format!("<{}>", app.route.path()),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(status_text, style),
    ]);

    f.render_widget(Paragraph::new(crumb), area);
}
