//! Resource abstraction layer
//!
//! Data-driven description of every backend resource. Definitions live in
//! JSON files under `src/resources/` and are embedded at compile time, so a
//! field or column change needs no code change.
//!
//! # Architecture
//!
//! - [`registry`] - Resource definitions bound to the injected base URL, endpoint builders
//! - [`schema`] - Field descriptors and the form state they drive
//! - [`record`] - Record identifiers and JSON path extraction
//!
//! # Example
//!
//! ```ignore
//! use sygt::resource::{ResourceKind, ResourceRegistry};
//!
//! let registry = ResourceRegistry::new("http://localhost:3000")?;
//! let url = registry.endpoints(ResourceKind::Cajeros).list();
//! assert_eq!(url, "http://localhost:3000/cajeros");
//! ```

mod record;
mod registry;
pub mod schema;

pub use record::{extract_json_value, RecordId};
pub use registry::*;
pub use schema::{FieldDef, FieldError, FieldKind, FormState, ValidationError};
