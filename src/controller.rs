//! CRUD Resource Controller
//!
//! One generic state machine drives every resource screen: load the list,
//! open a create or edit form, submit it, and delete with a two-step
//! confirmation. A controller is bound to one registry entry and is dropped
//! when the user navigates away, taking its cached list with it.
//!
//! Modal lifecycle:
//!
//! ```text
//! Closed --open_create/open_edit--> Editing --submit--> Submitting
//!    ^                                 ^                    |
//!    |                                 +------ failure -----+
//!    +------------------------------------------ success ---+
//! ```
//!
//! Loading is tracked separately in [`LoadState`] and never touches the modal.

use crate::api::{ApiClient, ApiError};
use crate::resource::{
    Endpoints, FieldError, FormState, Operation, RecordId, ResourceDef, ResourceKind,
    ResourceRegistry, ValidationError,
};
use serde_json::Value;
use thiserror::Error;

/// State of the list fetch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(ApiError),
}

/// Which record a form submission targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Create,
    Update(RecordId),
}

/// State of the create/edit modal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Editing(EditTarget),
    Submitting(EditTarget),
}

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Body returned by the backend (`Null` when empty)
    pub response: Value,
    /// Whether the follow-up list reload succeeded
    pub reloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: ResourceKind,
        operation: Operation,
    },

    #[error("no form is open")]
    NotEditing,

    #[error("no delete is awaiting confirmation")]
    NothingPending,

    #[error("record has no identifier")]
    MissingId,

    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl ControllerError {
    /// Short message suitable for the status line
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub struct CrudController {
    kind: ResourceKind,
    def: &'static ResourceDef,
    endpoints: Endpoints,
    api: ApiClient,
    items: Vec<Value>,
    load_state: LoadState,
    modal: ModalState,
    form: FormState,
    pending_delete: Option<RecordId>,
    last_error: Option<ControllerError>,
}

impl CrudController {
    pub fn new(registry: &ResourceRegistry, kind: ResourceKind, api: ApiClient) -> Self {
        let def = registry.resource(kind);
        Self {
            kind,
            def,
            endpoints: registry.endpoints(kind),
            api,
            items: Vec::new(),
            load_state: LoadState::Idle,
            modal: ModalState::Closed,
            form: FormState::defaults(def),
            pending_delete: None,
            last_error: None,
        }
    }

    // =========================================================================
    // State Access
    // =========================================================================

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn modal_open(&self) -> bool {
        self.modal != ModalState::Closed
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        match &self.modal {
            ModalState::Editing(EditTarget::Update(id))
            | ModalState::Submitting(EditTarget::Update(id)) => Some(id),
            _ => None,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn pending_delete(&self) -> Option<&RecordId> {
        self.pending_delete.as_ref()
    }

    pub fn last_error(&self) -> Option<&ControllerError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // =========================================================================
    // List
    // =========================================================================

    /// Replace the cached list with the backend's, in received order.
    /// On failure the previous list is kept.
    pub async fn load(&mut self) -> Result<usize, ControllerError> {
        self.require(Operation::List)?;

        self.load_state = LoadState::Loading;

        let result = self
            .api
            .get(&self.endpoints.list())
            .await
            .and_then(|body| match body {
                Value::Array(items) => Ok(items),
                other => Err(ApiError::Decode(format!(
                    "expected a JSON array, got {}",
                    json_type(&other)
                ))),
            });

        match result {
            Ok(items) => {
                tracing::debug!("Loaded {} {}", items.len(), self.kind);
                self.items = items;
                self.load_state = LoadState::Loaded;
                Ok(self.items.len())
            },
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", self.kind, e);
                self.load_state = LoadState::Failed(e.clone());
                Err(self.fail(e.into()))
            },
        }
    }

    pub async fn fetch_one(&mut self, id: &RecordId) -> Result<Value, ControllerError> {
        self.require(Operation::GetOne)?;

        match self.api.get(&self.endpoints.by_id(id)).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!("Error fetching {} {}: {}", self.def.singular, id, e);
                Err(self.fail(e.into()))
            },
        }
    }

    // =========================================================================
    // Create / Edit
    // =========================================================================

    pub fn open_create(&mut self) -> Result<(), ControllerError> {
        self.require(Operation::Create)?;

        self.form = FormState::defaults(self.def);
        self.modal = ModalState::Editing(EditTarget::Create);
        self.last_error = None;
        Ok(())
    }

    pub fn open_edit(&mut self, record: &Value) -> Result<(), ControllerError> {
        self.require(Operation::Update)?;

        let id = RecordId::from_record(record, &self.def.id_field)
            .ok_or(ControllerError::MissingId)?;

        self.form = FormState::from_record(self.def, record);
        self.modal = ModalState::Editing(EditTarget::Update(id));
        self.last_error = None;
        Ok(())
    }

    /// Cancel the form without touching the backend
    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
    }

    /// Apply raw text input to a form field
    pub fn set_input(&mut self, field_name: &str, raw: &str) -> Result<(), ControllerError> {
        let field = self
            .def
            .field(field_name)
            .ok_or_else(|| ControllerError::UnknownField(field_name.to_string()))?;
        self.form.set_input(field, raw)?;
        Ok(())
    }

    pub fn cycle_choice(&mut self, field_name: &str) {
        if let Some(field) = self.def.field(field_name) {
            self.form.cycle_choice(field);
        }
    }

    /// Create or update from the current form, then reload the list.
    /// Validation failures send nothing; backend failures keep the form open.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ControllerError> {
        let target = match &self.modal {
            ModalState::Editing(target) => target.clone(),
            _ => return Err(ControllerError::NotEditing),
        };

        if let Err(e) = self.form.validate(self.def) {
            tracing::debug!("{} form rejected: {}", self.kind, e);
            return Err(self.fail(e.into()));
        }

        let body = self.form.to_body(self.def);
        self.modal = ModalState::Submitting(target.clone());

        let result = match &target {
            EditTarget::Create => self.api.post(&self.endpoints.create(), &body).await,
            EditTarget::Update(id) => self.api.put(&self.endpoints.update(id), &body).await,
        };

        match result {
            Ok(response) => {
                tracing::info!("Saved {} ({:?})", self.def.singular, target);
                self.modal = ModalState::Closed;
                self.form = FormState::defaults(self.def);
                self.last_error = None;

                let reloaded = if self.def.supports(Operation::List) {
                    match self.load().await {
                        Ok(_) => true,
                        Err(e) => {
                            tracing::warn!("Reload after save failed: {}", e);
                            false
                        },
                    }
                } else {
                    false
                };

                Ok(SubmitOutcome { response, reloaded })
            },
            Err(e) => {
                tracing::error!("Error saving {}: {}", self.def.singular, e);
                self.modal = ModalState::Editing(target);
                Err(self.fail(e.into()))
            },
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// First step of a delete: remember what to delete, send nothing
    pub fn request_delete(&mut self, id: RecordId) -> Result<(), ControllerError> {
        self.require(Operation::Delete)?;
        self.pending_delete = Some(id);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Send the pending DELETE, then reload whatever its outcome
    pub async fn confirm_delete(&mut self) -> Result<Value, ControllerError> {
        let Some(id) = self.pending_delete.take() else {
            return Err(ControllerError::NothingPending);
        };

        let result = self.api.delete(&self.endpoints.delete(&id)).await;

        if let Err(e) = &result {
            tracing::error!("Error deleting {} {}: {}", self.def.singular, id, e);
        }

        if let Err(e) = self.load().await {
            tracing::warn!("Reload after delete failed: {}", e);
        }

        match result {
            Ok(response) => Ok(response),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require(&self, operation: Operation) -> Result<(), ControllerError> {
        if self.def.supports(operation) {
            Ok(())
        } else {
            Err(ControllerError::Unsupported {
                resource: self.kind,
                operation,
            })
        }
    }

    fn fail(&mut self, err: ControllerError) -> ControllerError {
        self.last_error = Some(err.clone());
        err
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
