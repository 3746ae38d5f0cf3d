//! Event Handling
//!
//! Keyboard and event handling for sygt.

use crate::app::{App, Mode};
use crate::nav::Route;
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(false);
            }
            return handle_key_event(app, key.code, key.modifiers).await;
        }
    }
    Ok(false)
}

pub async fn handle_key_event(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Command => handle_command_mode(app, code, modifiers).await,
        Mode::Help => handle_help_mode(app, code),
        Mode::Form => handle_form_mode(app, code, modifiers).await,
        Mode::Confirm => handle_confirm_mode(app, code).await,
        Mode::Alert => handle_alert_mode(app, code),
        Mode::Detail => handle_detail_mode(app, code, modifiers),
    }
}

async fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Double-g goes to top
    if code == KeyCode::Char('g') {
        if let Some((KeyCode::Char('g'), time)) = app.last_key_press {
            if time.elapsed() < Duration::from_millis(1000) {
                app.go_to_top();
                app.last_key_press = None;
                return Ok(false);
            }
        }
        app.last_key_press = Some((code, std::time::Instant::now()));
        return Ok(false);
    }

    app.last_key_press = None;

    match code {
        // Quit
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::PageUp => app.page_up(10),

        // Ctrl+D/U for page navigation
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down(10);
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_up(10);
        },

        // Sidebar entries
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(route) = Route::from_shortcut(c) {
                app.navigate(route).await;
            }
        },
        KeyCode::Tab => {
            let route = app.route.next();
            app.navigate(route).await;
        },
        KeyCode::BackTab => {
            let route = app.route.previous();
            app.navigate(route).await;
        },

        // Refresh
        KeyCode::Char('R') => {
            app.refresh_current().await;
        },

        // Record actions
        KeyCode::Char('n') => app.open_create(),
        KeyCode::Char('e') => app.open_edit(),
        KeyCode::Delete | KeyCode::Char('x') => app.request_delete(),
        KeyCode::Enter | KeyCode::Char('d') => {
            app.enter_detail_mode().await;
        },

        // Command mode
        KeyCode::Char(':') => {
            app.enter_command_mode();
        },

        // Help
        KeyCode::Char('?') => {
            app.enter_help_mode();
        },

        KeyCode::Esc => {
            app.error_message = None;
            app.status_message = None;
        },

        _ => {},
    }

    Ok(false)
}

async fn handle_command_mode(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        },
        KeyCode::Enter => {
            app.exit_mode();
            return Ok(app.execute_command().await);
        },
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        },
        KeyCode::Tab | KeyCode::Right => {
            app.apply_suggestion();
        },
        KeyCode::Down => {
            app.next_suggestion();
        },
        KeyCode::Up => {
            app.prev_suggestion();
        },
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.exit_mode();
        },
        _ => {},
    }
    Ok(false)
}

async fn handle_form_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.cancel_form();
        },
        KeyCode::Enter => {
            app.submit_form().await;
        },
        KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.submit_form().await;
        },
        KeyCode::Tab | KeyCode::Down => {
            app.focus_next_field();
        },
        KeyCode::BackTab | KeyCode::Up => {
            app.focus_prev_field();
        },
        KeyCode::Left | KeyCode::Right => {
            app.form_cycle_choice();
        },
        KeyCode::Backspace => {
            app.form_backspace();
        },
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.form_type(c);
        },
        _ => {},
    }
    Ok(false)
}

async fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.resolve_pending(false).await;
        },
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        },
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        },
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.resolve_pending(true).await;
        },
        KeyCode::Enter => {
            let accept = app
                .pending_action
                .as_ref()
                .is_some_and(|pending| pending.selected_yes);
            app.resolve_pending(accept).await;
        },
        _ => {},
    }
    Ok(false)
}

fn handle_alert_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Enter => {
            app.dismiss_alert();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_detail_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            app.exit_mode();
        },
        KeyCode::Char('j') | KeyCode::Down => {
            app.detail_scroll = app.detail_scroll.saturating_add(1);
        },
        KeyCode::Char('k') | KeyCode::Up => {
            app.detail_scroll = app.detail_scroll.saturating_sub(1);
        },
        KeyCode::PageDown => {
            app.detail_scroll = app.detail_scroll.saturating_add(10);
        },
        KeyCode::PageUp => {
            app.detail_scroll = app.detail_scroll.saturating_sub(10);
        },
        KeyCode::Char('d') => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                app.detail_scroll = app.detail_scroll.saturating_add(10);
            } else {
                app.exit_mode();
            }
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.detail_scroll = app.detail_scroll.saturating_sub(10);
        },
        KeyCode::Char('g') | KeyCode::Home => {
            app.detail_scroll = 0;
        },
        _ => {},
    }
    Ok(false)
}
