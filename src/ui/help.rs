//! Help Overlay
//!
//! Shows keyboard shortcuts and help information.

use super::dialog::centered_rect;
use crate::app::App;
use crate::nav::Route;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn key(keys: &str, description: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", keys), Style::default().fg(color)),
        Span::raw(description.to_string()),
    ])
}

pub fn render(f: &mut Frame, _app: &App) {
    let area = f.area();
    let popup_area = centered_rect(70, 80, area);

    f.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Atajos de teclado",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Navegación"),
        key("j/k, ↑/↓", "Mover selección", Color::Yellow),
        key("gg / G", "Ir al inicio / final", Color::Yellow),
        key("Ctrl+d/u", "Página abajo / arriba", Color::Yellow),
        key("Tab", "Pantalla siguiente", Color::Yellow),
    ];

    help_text.extend(Route::ALL.iter().enumerate().map(|(i, route)| {
        key(&(i + 1).to_string(), route.label(), Color::Yellow)
    }));

    help_text.extend([
        Line::from(""),
        section("Registros"),
        key("Enter/d", "Ver detalle", Color::Yellow),
        key("n", "Nuevo registro", Color::Yellow),
        key("e", "Editar registro", Color::Yellow),
        key("x/Delete", "Eliminar registro (con confirmación)", Color::Red),
        key("R", "Recargar lista", Color::Yellow),
        Line::from(""),
        section("Formulario"),
        key("Tab/↓ ↑", "Campo siguiente / anterior", Color::Yellow),
        key("Space/←→", "Cambiar opción", Color::Yellow),
        key("Enter", "Guardar", Color::Yellow),
        key("Esc", "Cancelar", Color::Yellow),
        Line::from(""),
        section("Comandos"),
        key(":", "Modo comando (:pagos, :refresh, :q)", Color::Yellow),
        Line::from(""),
        key("?/Esc", "Cerrar ayuda", Color::Yellow),
        key("q", "Salir", Color::Yellow),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Ayuda ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}
