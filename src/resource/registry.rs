//! Resource Registry - Load resource definitions from JSON
//!
//! All resource definitions are embedded at compile time. The registry binds
//! them to the backend base URL injected at startup and hands out endpoint
//! builders; nothing else in the crate knows a URL.

use super::record::RecordId;
use super::schema::FieldDef;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/common.json"),
    include_str!("../resources/catalog.json"),
    include_str!("../resources/collections.json"),
];

/// Every resource the dashboard manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cajeros,
    Contribuyentes,
    ConceptosPago,
    Pagos,
    Recibos,
    Extornos,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Cajeros,
        ResourceKind::Contribuyentes,
        ResourceKind::ConceptosPago,
        ResourceKind::Pagos,
        ResourceKind::Recibos,
        ResourceKind::Extornos,
    ];

    /// Key of the resource in the embedded registry
    pub fn key(self) -> &'static str {
        match self {
            Self::Cajeros => "cajeros",
            Self::Contribuyentes => "contribuyentes",
            Self::ConceptosPago => "conceptos-pago",
            Self::Pagos => "pagos",
            Self::Recibos => "recibos",
            Self::Extornos => "extornos",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Operations a backend resource may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    GetOne,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::GetOne => "get one",
        };
        f.write_str(name)
    }
}

/// Color definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColorDef {
    pub value: String,
    pub color: [u8; 3],
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
    #[serde(default)]
    pub color_map: Option<String>,
    /// Prepended to non-empty values (currency symbol)
    #[serde(default)]
    pub prefix: Option<String>,
    /// Show only the date part of an ISO timestamp
    #[serde(default)]
    pub date_only: bool,
}

/// Confirmation config for destructive actions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfirmConfig {
    /// Message to show in confirmation dialog
    #[serde(default)]
    pub message: Option<String>,
    /// If true, action is destructive (shown in red)
    #[serde(default)]
    pub destructive: bool,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub singular: String,
    pub base_path: String,
    pub operations: Vec<Operation>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    pub empty_message: String,
    #[serde(default)]
    pub delete_confirm: Option<ConfirmConfig>,
    /// Blocking alert shown when a create/update fails
    #[serde(default)]
    pub submit_error_alert: Option<String>,
    /// Status line text after a successful create/update
    #[serde(default)]
    pub submit_success: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl ResourceDef {
    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Whether a failed create/update must interrupt the user with an alert
    pub fn alert_on_submit_error(&self) -> bool {
        self.submit_error_alert.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Confirmation text for deleting a record
    pub fn delete_message(&self) -> String {
        self.delete_confirm
            .as_ref()
            .and_then(|c| c.message.clone())
            .unwrap_or_else(|| format!("¿Eliminar {}?", self.singular.to_lowercase()))
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub color_maps: HashMap<String, Vec<ColorDef>>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global definitions loaded from JSON
static DEFINITIONS: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the embedded definitions (parsed on first access)
pub fn get_definitions() -> &'static ResourceConfig {
    DEFINITIONS.get_or_init(|| {
        let mut final_config = ResourceConfig {
            color_maps: HashMap::new(),
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.color_maps.extend(partial.color_maps);
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a color map by name
pub fn get_color_map(name: &str) -> Option<&'static Vec<ColorDef>> {
    get_definitions().color_maps.get(name)
}

/// Get color for a value based on color map name
pub fn get_color_for_value(color_map_name: &str, value: &str) -> Option<[u8; 3]> {
    get_color_map(color_map_name)?
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.color)
}

/// Resource definitions bound to a backend base URL
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    base_url: String,
    defs: Vec<&'static ResourceDef>,
}

impl ResourceRegistry {
    /// Bind the embedded definitions to `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https: {}", base_url);
        }

        let definitions = get_definitions();
        let defs = ResourceKind::ALL
            .iter()
            .map(|kind| {
                definitions
                    .resources
                    .get(kind.key())
                    .with_context(|| format!("Missing resource definition: {}", kind))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_url: trimmed.to_string(),
            defs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resource(&self, kind: ResourceKind) -> &'static ResourceDef {
        self.defs[kind.index()]
    }

    pub fn endpoints(&self, kind: ResourceKind) -> Endpoints {
        Endpoints {
            root: format!("{}{}", self.base_url, self.resource(kind).base_path),
        }
    }
}

/// URL builders for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: String,
}

impl Endpoints {
    pub fn list(&self) -> String {
        self.root.clone()
    }

    pub fn create(&self) -> String {
        self.root.clone()
    }

    pub fn update(&self, id: &RecordId) -> String {
        self.item(id)
    }

    pub fn delete(&self, id: &RecordId) -> String {
        self.item(id)
    }

    pub fn by_id(&self, id: &RecordId) -> String {
        self.item(id)
    }

    fn item(&self, id: &RecordId) -> String {
        format!("{}/{}", self.root, urlencoding::encode(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_definitions_load_successfully() {
        let defs = get_definitions();
        assert_eq!(defs.resources.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_every_kind_has_a_definition() {
        for kind in ResourceKind::ALL {
            assert!(
                get_definitions().resources.contains_key(kind.key()),
                "missing definition for {}",
                kind
            );
        }
    }

    #[test]
    fn test_kind_key_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ResourceKind::from_key("conceptos_pago"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let registry = ResourceRegistry::new("http://api.local:8080/").unwrap();
        assert_eq!(registry.base_url(), "http://api.local:8080");
        assert_eq!(
            registry.endpoints(ResourceKind::Cajeros).list(),
            "http://api.local:8080/cajeros"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(ResourceRegistry::new("not a url").is_err());
        assert!(ResourceRegistry::new("ftp://files.local").is_err());
    }

    #[test]
    fn test_endpoint_builders() {
        let endpoints = registry().endpoints(ResourceKind::Cajeros);
        let id = RecordId::from("7");
        assert_eq!(endpoints.list(), "http://localhost:3000/cajeros");
        assert_eq!(endpoints.create(), "http://localhost:3000/cajeros");
        assert_eq!(endpoints.update(&id), "http://localhost:3000/cajeros/7");
        assert_eq!(endpoints.delete(&id), "http://localhost:3000/cajeros/7");
        assert_eq!(endpoints.by_id(&id), "http://localhost:3000/cajeros/7");
    }

    #[test]
    fn test_canonical_concepts_path() {
        let endpoints = registry().endpoints(ResourceKind::ConceptosPago);
        assert_eq!(endpoints.list(), "http://localhost:3000/conceptos-pago");
    }

    #[test]
    fn test_ids_are_percent_encoded() {
        let endpoints = registry().endpoints(ResourceKind::Recibos);
        let id = RecordId::from("a b/c");
        assert_eq!(endpoints.by_id(&id), "http://localhost:3000/recibos/a%20b%2Fc");
    }

    #[test]
    fn test_capabilities() {
        let registry = registry();
        let recibos = registry.resource(ResourceKind::Recibos);
        assert!(recibos.supports(Operation::List));
        assert!(recibos.supports(Operation::GetOne));
        assert!(!recibos.supports(Operation::Create));
        assert!(!recibos.supports(Operation::Delete));

        let extornos = registry.resource(ResourceKind::Extornos);
        assert!(extornos.supports(Operation::Create));
        assert!(!extornos.supports(Operation::List));

        let cajeros = registry.resource(ResourceKind::Cajeros);
        assert!(!cajeros.supports(Operation::GetOne));
        assert!(cajeros.supports(Operation::Update));
    }

    #[test]
    fn test_only_pagos_alerts_on_submit_error() {
        let registry = registry();
        for kind in ResourceKind::ALL {
            let alerts = registry.resource(kind).alert_on_submit_error();
            assert_eq!(alerts, kind == ResourceKind::Pagos, "{}", kind);
        }
    }

    #[test]
    fn test_delete_messages() {
        let registry = registry();
        assert_eq!(
            registry.resource(ResourceKind::Cajeros).delete_message(),
            "¿Seguro que quieres eliminar este cajero?"
        );
    }

    #[test]
    fn test_color_for_estado() {
        assert!(get_color_for_value("estado", "ACTIVO").is_some());
        assert!(get_color_for_value("estado", "UNKNOWN").is_none());
        assert!(get_color_for_value("missing", "ACTIVO").is_none());
    }

    #[test]
    fn test_columns_reference_schema_or_id() {
        let registry = registry();
        for kind in ResourceKind::ALL {
            let def = registry.resource(kind);
            if def.fields.is_empty() {
                continue;
            }
            for col in &def.columns {
                assert!(
                    col.json_path == def.id_field || def.field(&col.json_path).is_some(),
                    "{} column {} has no field",
                    kind,
                    col.json_path
                );
            }
        }
    }
}
