//! Form Popup
//!
//! Create/edit form for the current resource. Choice fields cycle through
//! their options; every other field is edited as text and committed when
//! the focus leaves it.

use super::dialog::centered_rect;
use crate::app::App;
use crate::controller::{EditTarget, ModalState};
use crate::resource::FieldKind;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let resource = app.current_resource();
    let area = f.area();
    let popup_area = centered_rect(60, 80, area);

    f.render_widget(Clear, popup_area);

    let (title, submitting) = match app.controller.modal() {
        ModalState::Editing(EditTarget::Create) => (format!(" Nuevo {} ", resource.singular), false),
        ModalState::Editing(EditTarget::Update(id)) => {
            (format!(" Editar {} #{} ", resource.singular, id), false)
        },
        ModalState::Submitting(_) => (format!(" Guardando {}... ", resource.singular), true),
        ModalState::Closed => return,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if submitting {
            Color::Yellow
        } else {
            Color::Cyan
        }))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    let label_width = resource
        .fields
        .iter()
        .map(|field| field.label.chars().count())
        .max()
        .unwrap_or(0)
        + 2;

    let lines: Vec<Line> = resource
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let focused = idx == app.form.focused;
            let value = if focused {
                app.form.input.clone()
            } else {
                app.controller.form().display_value(field)
            };

            let shown = match (&field.kind, focused) {
                (FieldKind::Choice { .. }, _) => format!("< {} >", value),
                (_, true) => format!("{}_", value),
                _ => value,
            };

            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let value_style = if focused {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let marker = if field.required { "*" } else { " " };

            Line::from(vec![
                Span::styled(
                    format!(" {}{:<width$}", marker, field.label, width = label_width),
                    label_style,
                ),
                Span::styled(shown, value_style),
            ])
        })
        .collect();

    // Keep the focused field on screen in long forms
    let visible = chunks[0].height as usize;
    let scroll = app.form.focused.saturating_sub(visible.saturating_sub(1));
    f.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), chunks[0]);

    let footer = match &app.form.error {
        Some(error) => Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled(
            " Tab: siguiente  Space/←→: opción  Enter: guardar  Esc: cancelar",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(footer), chunks[1]);
}
