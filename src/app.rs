//! Application State
//!
//! Central application state management for sygt.

use crate::api::ApiClient;
use crate::config::Config;
use crate::controller::{ControllerError, CrudController};
use crate::nav::{self, Route};
use crate::resource::{FieldDef, FieldKind, Operation, RecordId, ResourceDef, ResourceRegistry};
use crate::view::{format_cell, DetailState, ListView};
use crossterm::event::KeyCode;
use serde_json::Value;
use std::path::PathBuf;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,  // Viewing list
    Command, // : command input
    Help,    // ? help popup
    Form,    // Create/edit form
    Confirm, // Delete confirmation dialog
    Alert,   // Blocking message (OK only)
    Detail,  // Single record view
}

/// Delete waiting for the user's answer
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub resource_id: RecordId,
    pub message: String,
    /// Header/value pairs identifying the record
    pub summary: Vec<(String, String)>,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// Cursor and raw text of the field being edited
#[derive(Debug, Clone, Default)]
pub struct FormEditor {
    pub focused: usize,
    pub input: String,
    pub error: Option<String>,
}

/// Main application state
pub struct App {
    pub registry: ResourceRegistry,
    pub api: ApiClient,

    // Current screen
    pub route: Route,
    pub controller: CrudController,
    pub view: ListView,
    pub mode: Mode,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_suggestion_selected: usize,
    pub command_preview: Option<String>,

    // Confirmation
    pub pending_action: Option<PendingAction>,

    // Form
    pub form: FormEditor,

    // UI state
    pub error_message: Option<String>,
    pub status_message: Option<String>,
    pub alert_message: Option<String>,
    alert_return: Mode,
    pub detail_scroll: usize,

    // Persistent configuration; `None` keeps it in memory only
    pub config: Config,
    pub config_path: Option<PathBuf>,

    // Key press tracking
    pub last_key_press: Option<(KeyCode, std::time::Instant)>,

    // Read-only mode
    pub readonly: bool,
}

impl App {
    /// Create App on `route`; nothing is fetched until the first refresh
    pub fn new(
        registry: ResourceRegistry,
        api: ApiClient,
        route: Route,
        config: Config,
        readonly: bool,
    ) -> Self {
        let controller = CrudController::new(&registry, route.resource(), api.clone());

        Self {
            registry,
            api,
            route,
            controller,
            view: ListView::new(),
            mode: Mode::Normal,
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_suggestion_selected: 0,
            command_preview: None,
            pending_action: None,
            form: FormEditor::default(),
            error_message: None,
            status_message: None,
            alert_message: None,
            alert_return: Mode::Normal,
            detail_scroll: 0,
            config,
            config_path: Config::config_path(),
            last_key_press: None,
            readonly,
        }
    }

    pub fn current_resource(&self) -> &'static ResourceDef {
        self.controller.def()
    }

    pub fn items(&self) -> &[Value] {
        self.controller.items()
    }

    pub fn selected_item(&self) -> Option<&Value> {
        self.view.selected_item(self.controller.items())
    }

    pub fn selected_id(&self) -> Option<RecordId> {
        let id_field = &self.current_resource().id_field;
        self.selected_item()
            .and_then(|item| RecordId::from_record(item, id_field))
    }

    pub fn loading(&self) -> bool {
        self.controller.loading()
    }

    pub fn get_available_commands(&self) -> Vec<String> {
        nav::command_names()
    }

    // =========================================================================
    // Data Fetching
    // =========================================================================

    /// Reload the current list; resources without a list stay empty
    pub async fn refresh_current(&mut self) {
        if !self.current_resource().supports(Operation::List) {
            return;
        }

        self.error_message = None;
        if let Err(e) = self.controller.load().await {
            self.error_message = Some(e.user_message());
        }
        self.sync_view();
    }

    fn sync_view(&mut self) {
        let len = self.controller.items().len();
        self.view.clamp(len);
        self.view.ensure_visible(len);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn next(&mut self) {
        let len = self.items().len();
        self.view.next(len);
        self.view.ensure_visible(len);
    }

    pub fn previous(&mut self) {
        self.view.previous();
        self.view.ensure_visible(self.items().len());
    }

    pub fn go_to_top(&mut self) {
        self.view.go_to_top();
        self.view.ensure_visible(self.items().len());
    }

    pub fn go_to_bottom(&mut self) {
        let len = self.items().len();
        self.view.go_to_bottom(len);
        self.view.ensure_visible(len);
    }

    pub fn page_down(&mut self, page_size: usize) {
        let len = self.items().len();
        self.view.page_down(page_size, len);
        self.view.ensure_visible(len);
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.view.page_up(page_size);
        self.view.ensure_visible(self.items().len());
    }

    /// Switch screens; the previous controller and its cached list are dropped
    pub async fn navigate(&mut self, route: Route) {
        self.route = route;
        self.controller = CrudController::new(&self.registry, route.resource(), self.api.clone());
        self.view = ListView::new();
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.form = FormEditor::default();
        self.error_message = None;
        self.status_message = None;

        if let Err(e) = self
            .config
            .set_last_view(route.path(), self.config_path.as_deref())
        {
            tracing::warn!("Failed to save last view to config: {}", e);
        }

        self.refresh_current().await;
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_text.clear();
        self.command_suggestions = self.get_available_commands();
        self.command_suggestion_selected = 0;
        self.command_preview = None;
    }

    pub fn update_command_suggestions(&mut self) {
        let input = self.command_text.to_lowercase();
        let all_commands = self.get_available_commands();

        if input.is_empty() {
            self.command_suggestions = all_commands;
        } else {
            self.command_suggestions = all_commands
                .into_iter()
                .filter(|cmd| cmd.contains(&input))
                .collect();
        }

        if self.command_suggestion_selected >= self.command_suggestions.len() {
            self.command_suggestion_selected = 0;
        }

        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.command_preview = self
            .command_suggestions
            .get(self.command_suggestion_selected)
            .cloned();
    }

    pub fn next_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected =
                (self.command_suggestion_selected + 1) % self.command_suggestions.len();
            self.update_preview();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            if self.command_suggestion_selected == 0 {
                self.command_suggestion_selected = self.command_suggestions.len() - 1;
            } else {
                self.command_suggestion_selected -= 1;
            }
            self.update_preview();
        }
    }

    pub fn apply_suggestion(&mut self) {
        if let Some(preview) = &self.command_preview {
            self.command_text = preview.clone();
            self.update_command_suggestions();
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    /// Show the selected record; refetched only when the selection changed
    pub async fn enter_detail_mode(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };

        self.mode = Mode::Detail;
        self.detail_scroll = 0;

        let stale = !matches!(self.view.detail, DetailState::Loaded(_));
        if self.view.select_for_detail(Some(id)) || stale {
            self.view.refresh_detail(&mut self.controller).await;
        }
    }

    /// Blocking message; dismissing it returns to the current mode
    pub fn show_alert(&mut self, message: &str) {
        if self.mode != Mode::Alert {
            self.alert_return = self.mode.clone();
        }
        self.alert_message = Some(message.to_string());
        self.mode = Mode::Alert;
    }

    /// Mode restored when the alert is dismissed
    pub fn alert_return(&self) -> &Mode {
        &self.alert_return
    }

    pub fn dismiss_alert(&mut self) {
        self.alert_message = None;
        self.mode = std::mem::replace(&mut self.alert_return, Mode::Normal);
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
    }

    // =========================================================================
    // Create / Edit
    // =========================================================================

    pub fn open_create(&mut self) {
        if self.readonly {
            self.show_alert("Modo solo lectura: no se permiten cambios");
            return;
        }

        match self.controller.open_create() {
            Ok(()) => self.enter_form(),
            Err(e) => self.error_message = Some(e.user_message()),
        }
    }

    pub fn open_edit(&mut self) {
        if self.readonly {
            self.show_alert("Modo solo lectura: no se permiten cambios");
            return;
        }

        let Some(item) = self.selected_item().cloned() else {
            return;
        };

        match self.controller.open_edit(&item) {
            Ok(()) => self.enter_form(),
            Err(e) => self.error_message = Some(e.user_message()),
        }
    }

    fn enter_form(&mut self) {
        self.form = FormEditor::default();
        self.load_focused_input();
        self.error_message = None;
        self.mode = Mode::Form;
    }

    pub fn form_fields(&self) -> &'static [FieldDef] {
        &self.current_resource().fields
    }

    pub fn focused_field(&self) -> Option<&'static FieldDef> {
        self.form_fields().get(self.form.focused)
    }

    fn load_focused_input(&mut self) {
        self.form.input = self
            .focused_field()
            .map(|f| self.controller.form().display_value(f))
            .unwrap_or_default();
    }

    /// Store the raw input of the focused field; false when it was rejected
    pub fn commit_input(&mut self) -> bool {
        let Some(field) = self.focused_field() else {
            return true;
        };
        if matches!(field.kind, FieldKind::Choice { .. }) {
            return true;
        }

        match self.controller.set_input(&field.name, &self.form.input) {
            Ok(()) => {
                self.form.error = None;
                true
            },
            Err(e) => {
                self.form.error = Some(e.user_message());
                false
            },
        }
    }

    pub fn focus_next_field(&mut self) {
        let count = self.form_fields().len();
        if count == 0 || !self.commit_input() {
            return;
        }
        self.form.focused = (self.form.focused + 1) % count;
        self.load_focused_input();
    }

    pub fn focus_prev_field(&mut self) {
        let count = self.form_fields().len();
        if count == 0 || !self.commit_input() {
            return;
        }
        self.form.focused = (self.form.focused + count - 1) % count;
        self.load_focused_input();
    }

    pub fn form_type(&mut self, c: char) {
        match self.focused_field().map(|f| &f.kind) {
            Some(FieldKind::Choice { .. }) => {
                if c == ' ' {
                    self.form_cycle_choice();
                }
            },
            Some(_) => self.form.input.push(c),
            None => {},
        }
    }

    pub fn form_backspace(&mut self) {
        self.form.input.pop();
    }

    pub fn form_cycle_choice(&mut self) {
        if let Some(field) = self.focused_field() {
            if matches!(field.kind, FieldKind::Choice { .. }) {
                self.controller.cycle_choice(&field.name);
                self.load_focused_input();
            }
        }
    }

    /// Send the form. Pagos failures raise a blocking alert on top of the form.
    pub async fn submit_form(&mut self) {
        if !self.commit_input() {
            return;
        }

        let def = self.current_resource();
        match self.controller.submit().await {
            Ok(outcome) => {
                self.mode = Mode::Normal;
                self.form = FormEditor::default();
                self.status_message = Some(
                    def.submit_success
                        .clone()
                        .unwrap_or_else(|| format!("{} guardado", def.singular)),
                );
                self.error_message = None;
                if !outcome.reloaded && def.supports(Operation::List) {
                    self.error_message = self.controller.last_error().map(|e| e.user_message());
                }
                self.sync_view();
            },
            Err(ControllerError::Api(e)) => {
                self.form.error = Some(e.user_message());
                if let Some(alert) = &def.submit_error_alert {
                    self.show_alert(alert);
                }
            },
            Err(e) => {
                self.form.error = Some(e.user_message());
            },
        }
    }

    pub fn cancel_form(&mut self) {
        self.controller.close_modal();
        self.form = FormEditor::default();
        self.mode = Mode::Normal;
    }

    // =========================================================================
    // Delete
    // =========================================================================

    pub fn request_delete(&mut self) {
        if self.readonly {
            self.show_alert("Modo solo lectura: no se permiten cambios");
            return;
        }

        let Some(id) = self.selected_id() else {
            return;
        };

        if let Err(e) = self.controller.request_delete(id.clone()) {
            self.error_message = Some(e.user_message());
            return;
        }

        let def = self.current_resource();
        let confirm = def.delete_confirm.clone().unwrap_or_default();
        let summary = self
            .selected_item()
            .map(|item| record_summary(def, item))
            .unwrap_or_default();
        self.pending_action = Some(PendingAction {
            resource_id: id,
            message: def.delete_message(),
            summary,
            destructive: confirm.destructive,
            selected_yes: false,
        });
        self.mode = Mode::Confirm;
    }

    /// Answer the confirmation: Yes sends one DELETE, No sends nothing
    pub async fn resolve_pending(&mut self, accept: bool) {
        let Some(pending) = self.pending_action.take() else {
            self.exit_mode();
            return;
        };

        if accept {
            match self.controller.confirm_delete().await {
                Ok(_) => {
                    self.error_message = None;
                    self.status_message = Some(format!(
                        "{} {} eliminado",
                        self.current_resource().singular,
                        pending.resource_id
                    ));
                },
                Err(e) => self.error_message = Some(e.user_message()),
            }
            self.sync_view();
        } else {
            self.controller.cancel_delete();
        }

        self.exit_mode();
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    /// Run the command line; returns true when the app should quit
    pub async fn execute_command(&mut self) -> bool {
        let command_text = if self.command_text.is_empty() {
            self.command_preview.clone().unwrap_or_default()
        } else if let Some(preview) = &self.command_preview {
            if preview.contains(&self.command_text) {
                preview.clone()
            } else {
                self.command_text.clone()
            }
        } else {
            self.command_text.clone()
        };

        let Some(cmd) = command_text.split_whitespace().next() else {
            return false;
        };

        match cmd {
            "q" | "quit" => return true,
            "refresh" => self.refresh_current().await,
            "help" => self.enter_help_mode(),
            _ => match Route::parse(cmd) {
                Some(route) => self.navigate(route).await,
                None => self.error_message = Some(format!("Comando desconocido: {}", cmd)),
            },
        }

        false
    }
}

/// Non-id columns of `item`, as shown in the list
fn record_summary(def: &ResourceDef, item: &Value) -> Vec<(String, String)> {
    def.columns
        .iter()
        .filter(|col| col.json_path != def.id_field)
        .take(SUMMARY_COLUMNS)
        .map(|col| (col.header.clone(), format_cell(item, col)))
        .collect()
}

const SUMMARY_COLUMNS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DEFAULT_TIMEOUT;
    use crate::resource::ResourceKind;
    use serde_json::json;

    fn app(route: Route) -> App {
        let registry = ResourceRegistry::new("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(DEFAULT_TIMEOUT).unwrap();
        let mut app = App::new(registry, api, route, Config::default(), false);
        app.config_path = None;
        app
    }

    #[test]
    fn test_command_suggestions_filter() {
        let mut app = app(Route::Cajeros);
        app.enter_command_mode();
        assert!(app.command_suggestions.len() > Route::ALL.len());

        app.command_text = "caj".to_string();
        app.update_command_suggestions();
        assert_eq!(app.command_suggestions, vec!["cajeros".to_string()]);
        assert_eq!(app.command_preview.as_deref(), Some("cajeros"));

        app.apply_suggestion();
        assert_eq!(app.command_text, "cajeros");
    }

    #[test]
    fn test_suggestion_wraps() {
        let mut app = app(Route::Cajeros);
        app.enter_command_mode();
        app.command_text = "con".to_string();
        app.update_command_suggestions();
        let count = app.command_suggestions.len();
        assert!(count >= 2);

        app.prev_suggestion();
        assert_eq!(app.command_suggestion_selected, count - 1);
        app.next_suggestion();
        assert_eq!(app.command_suggestion_selected, 0);
    }

    #[test]
    fn test_open_create_enters_form_with_defaults() {
        let mut app = app(Route::Cajeros);
        app.open_create();
        assert_eq!(app.mode, Mode::Form);
        assert!(app.controller.modal_open());
        assert_eq!(app.form.focused, 0);
        assert_eq!(app.form.input, "");
    }

    #[test]
    fn test_readonly_blocks_create() {
        let mut app = app(Route::Cajeros);
        app.readonly = true;
        app.open_create();
        assert_eq!(app.mode, Mode::Alert);
        assert!(!app.controller.modal_open());
        app.dismiss_alert();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_create_unsupported_shows_error() {
        let mut app = app(Route::Recibos);
        app.open_create();
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.error_message.is_some());
    }

    #[test]
    fn test_invalid_integer_keeps_focus() {
        let mut app = app(Route::Cajeros);
        app.open_create();

        let idx = app
            .form_fields()
            .iter()
            .position(|f| f.name == "numeracion_inicial_recibo")
            .unwrap();
        app.form.focused = idx;
        app.form.input = "abc".to_string();
        app.focus_next_field();

        assert_eq!(app.form.focused, idx);
        assert!(app.form.error.is_some());
        assert_eq!(app.controller.form().get("numeracion_inicial_recibo"), Some(&json!(1)));
    }

    #[test]
    fn test_typing_commits_on_focus_change() {
        let mut app = app(Route::Cajeros);
        app.open_create();
        for c in "Ana".chars() {
            app.form_type(c);
        }
        app.focus_next_field();
        assert_eq!(app.controller.form().get("nombres"), Some(&json!("Ana")));
        assert_eq!(app.form.focused, 1);
    }

    #[test]
    fn test_choice_cycles_with_space() {
        let mut app = app(Route::Cajeros);
        app.open_create();
        let idx = app.form_fields().iter().position(|f| f.name == "estado").unwrap();
        app.form.focused = idx;
        app.form_type(' ');
        assert_eq!(app.controller.form().get("estado"), Some(&json!("INACTIVO")));
        assert_eq!(app.form.input, "INACTIVO");
    }

    #[test]
    fn test_cancel_form() {
        let mut app = app(Route::Cajeros);
        app.open_create();
        app.cancel_form();
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.controller.modal_open());
    }

    #[test]
    fn test_alert_returns_to_form() {
        let mut app = app(Route::Pagos);
        app.open_create();
        app.show_alert("Error");
        assert_eq!(app.mode, Mode::Alert);
        app.dismiss_alert();
        assert_eq!(app.mode, Mode::Form);
    }

    #[test]
    fn test_record_summary_skips_id() {
        let def = ResourceRegistry::new("http://localhost:3000")
            .unwrap()
            .resource(ResourceKind::ConceptosPago);
        let item = json!({"id": 4, "descripcion": "Arbitrios", "monto": 12.5});
        assert_eq!(
            record_summary(def, &item),
            vec![
                ("Descripción".to_string(), "Arbitrios".to_string()),
                ("Monto".to_string(), "S/ 12.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_delete_without_selection_does_nothing() {
        let mut app = app(Route::Cajeros);
        app.request_delete();
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.pending_action.is_none());
    }

    #[tokio::test]
    async fn test_execute_quit_and_unknown() {
        let mut app = app(Route::Cajeros);
        app.command_text = "quit".to_string();
        assert!(app.execute_command().await);

        app.command_text = "usuarios".to_string();
        app.command_preview = None;
        assert!(!app.execute_command().await);
        assert_eq!(
            app.error_message.as_deref(),
            Some("Comando desconocido: usuarios")
        );
    }

    #[test]
    fn test_edit_with_server_timestamp_tabs_through_every_field() {
        let mut app = app(Route::Pagos);
        let record = json!({
            "id": 12,
            "id_cajero": 4,
            "fecha_pago": "2024-05-01T00:00:00.000Z",
            "total": 30,
            "observaciones": "caja 1"
        });
        app.controller.open_edit(&record).unwrap();
        app.enter_form();

        let count = app.form_fields().len();
        let fecha = app.form_fields().iter().position(|f| f.name == "fecha_pago").unwrap();

        for step in 1..=count {
            if app.form.focused == fecha {
                assert_eq!(app.form.input, "2024-05-01");
            }
            app.focus_next_field();
            assert_eq!(app.form.error, None);
            assert_eq!(app.form.focused, step % count);
        }

        assert_eq!(
            app.controller.form().get("fecha_pago"),
            Some(&json!("2024-05-01T00:00:00.000Z"))
        );
        assert_eq!(app.controller.form().get("id_cajero"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn test_navigate_discards_controller_state() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cajeros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/recibos"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let registry = ResourceRegistry::new(&server.uri()).unwrap();
        let api = ApiClient::new(DEFAULT_TIMEOUT).unwrap();
        let mut app = App::new(registry, api, Route::Cajeros, Config::default(), false);

        let dir = std::env::temp_dir().join(format!("sygt-app-nav-{}", std::process::id()));
        let config_path = dir.join("config.json");
        app.config_path = Some(config_path.clone());

        app.refresh_current().await;
        assert_eq!(app.items().len(), 2);
        app.next();
        app.request_delete();
        assert_eq!(app.mode, Mode::Confirm);
        let pending = app.pending_action.as_ref().unwrap();
        assert_eq!(pending.resource_id, RecordId::from(2));
        assert!(!pending.selected_yes);
        assert_eq!(pending.summary.len(), 4);

        app.navigate(Route::Recibos).await;

        assert_eq!(app.controller.kind(), ResourceKind::Recibos);
        assert!(app.items().is_empty());
        assert!(app.pending_action.is_none());
        assert_eq!(app.controller.pending_delete(), None);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.view.selected, 0);
        assert!(app.error_message.is_some());
        assert_eq!(
            Config::load_from(&config_path).last_view.as_deref(),
            Some("/recibos")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_navigate_to_list_less_resource_sends_nothing() {
        let mut app = app(Route::Extornos);
        app.refresh_current().await;
        assert!(app.error_message.is_none());
        assert!(app.items().is_empty());
    }
}
