//! Dialog Components
//!
//! Delete confirmation showing the record about to go, and blocking alerts.
//! An alert raised over an open form is a save failure and says so.

use crate::app::{App, Mode, PendingAction};
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    match app.mode {
        Mode::Confirm => {
            if let Some(pending) = &app.pending_action {
                render_delete_confirm(f, app, pending);
            }
        },
        Mode::Alert => {
            if let Some(message) = &app.alert_message {
                render_alert(f, app, message);
            }
        },
        _ => {},
    }
}

fn render_delete_confirm(f: &mut Frame, app: &App, pending: &PendingAction) {
    let accent = if pending.destructive {
        Color::Red
    } else {
        Color::Yellow
    };
    let title = format!(
        " Eliminar {} #{} ",
        app.current_resource().singular,
        pending.resource_id
    );

    let mut lines = vec![
        Line::from(Span::styled(
            pending.message.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(summary_lines(&pending.summary));

    // Message, record summary, buttons
    let height = lines.len() as u16 + 4;
    let inner = popup(f, 56, height, &title, accent);

    let [body, answers] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    f.render_widget(
        Paragraph::new(answer_line(pending.selected_yes, accent)).alignment(Alignment::Center),
        answers,
    );
}

/// `Header: value` rows, headers padded to a common width
fn summary_lines(summary: &[(String, String)]) -> Vec<Line<'_>> {
    let width = summary
        .iter()
        .map(|(header, _)| header.chars().count())
        .max()
        .unwrap_or(0);

    summary
        .iter()
        .map(|(header, value)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<width$}  ", header, width = width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(value.as_str(), Style::default().fg(Color::White)),
            ])
        })
        .collect()
}

fn answer_line(yes_selected: bool, accent: Color) -> Line<'static> {
    let chosen = |bg: Color| {
        Style::default()
            .fg(Color::Black)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    };
    let idle = Style::default().fg(Color::DarkGray);

    let (yes, no) = if yes_selected {
        (chosen(accent), idle)
    } else {
        (idle, chosen(Color::White))
    };

    Line::from(vec![
        Span::styled(" [y] Eliminar ", yes),
        Span::raw("   "),
        Span::styled(" [n] Conservar ", no),
    ])
}

fn render_alert(f: &mut Frame, app: &App, message: &str) {
    let over_form = *app.alert_return() == Mode::Form;
    let title = if over_form {
        format!(" No se pudo guardar: {} ", app.current_resource().singular)
    } else {
        " Aviso ".to_string()
    };

    let mut lines = vec![Line::from(Span::styled(
        message,
        Style::default().fg(Color::White),
    ))];

    // Backend reason, already reduced to a user message
    if over_form {
        if let Some(reason) = &app.form.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                reason.as_str(),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if over_form {
            "Enter/Esc: volver al formulario"
        } else {
            "Enter/Esc: cerrar"
        },
        Style::default().fg(Color::DarkGray),
    )));

    let height = lines.len() as u16 + 4;
    let inner = popup(f, 60, height, &title, Color::Red);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

/// Clear a centered box of `width_pct` x `height` rows and draw its frame
fn popup(f: &mut Frame, width_pct: u16, height: u16, title: &str, accent: Color) -> Rect {
    let outer = f.area();
    let height = height.min(outer.height);
    let [band] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(outer);
    let area = centered_rect(width_pct, 100, band);

    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

/// Area of `percent_x` by `percent_y` of `r`, centered on both axes
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(r);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    area
}
