//! Header Component
//!
//! Displays backend, screen and record count.

use crate::app::App;
use crate::resource::Operation;
use crate::VERSION;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" sygt v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: Backend
    let backend = Line::from(vec![
        Span::styled(" Backend: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.registry.base_url(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(backend), rows[0]);

    // Row 2: Current resource and count
    let resource = app.current_resource();
    let mut resource_info = vec![
        Span::styled(" Vista: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            &resource.display_name,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if resource.supports(Operation::List) {
        resource_info.push(Span::raw("  "));
        resource_info.push(Span::styled("Registros: ", Style::default().fg(Color::DarkGray)));
        resource_info.push(Span::styled(
            app.items().len().to_string(),
            Style::default().fg(Color::White),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(resource_info)), rows[1]);

    // Row 3: Help hint
    let help_line = Line::from(vec![
        Span::styled(
            " ?:help  ::cmd  n:nuevo  e:editar  x:eliminar  R:refresh  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
        if app.readonly {
            Span::styled(
                "  [READ-ONLY]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("")
        },
    ]);
    f.render_widget(Paragraph::new(help_line), rows[2]);
}
