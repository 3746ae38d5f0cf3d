//! Form schema
//!
//! Field descriptors for each resource and the form state they drive. The
//! form is a JSON object: what the user edits is exactly what gets sent,
//! after the per-field normalisation in [`FormState::to_body`].

use super::registry::ResourceDef;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input kind of a form field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Integer,
    Decimal,
    Date,
    Choice { options: Vec<String> },
    /// Opaque foreign key, entered as an integer
    Id,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Id)
    }
}

/// Transformation applied to a value right before submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalize {
    /// `YYYY-MM-DD` becomes `YYYY-MM-DDT00:00:00.000Z`
    IsoInstant,
}

/// Field definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Absent means the field starts unset and is omitted from the body
    #[serde(default)]
    pub default: Option<Value>,
    /// Default to the current date
    #[serde(default)]
    pub default_today: bool,
    #[serde(default)]
    pub required: bool,
    /// Minimum length of the trimmed value
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub trim: bool,
    #[serde(default)]
    pub normalize: Option<Normalize>,
}

impl FieldDef {
    fn default_value(&self, today: NaiveDate) -> Option<Value> {
        if self.default_today {
            return Some(Value::String(today.format(DATE_FORMAT).to_string()));
        }
        self.default.clone()
    }
}

/// Rejected keystroke-level input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field}: '{input}' no es un número entero")]
    NotInteger { field: String, input: String },

    #[error("{field}: '{input}' no es un número válido")]
    NotNumber { field: String, input: String },

    #[error("{field}: '{input}' no es una fecha AAAA-MM-DD")]
    InvalidDate { field: String, input: String },

    #[error("{field}: '{input}' no es una opción válida")]
    NotAnOption { field: String, input: String },
}

/// Form rejected before submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} es obligatorio")]
    Required { field: String },

    #[error("{field} requiere al menos {min} caracteres (tiene {actual})")]
    TooShort {
        field: String,
        min: usize,
        actual: usize,
    },
}

/// Editable values of one record, minus its identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
}

impl FormState {
    /// Every field at its documented default
    pub fn defaults(def: &ResourceDef) -> Self {
        Self::defaults_on(def, Utc::now().date_naive())
    }

    pub fn defaults_on(def: &ResourceDef, today: NaiveDate) -> Self {
        let values = def
            .fields
            .iter()
            .filter_map(|f| f.default_value(today).map(|v| (f.name.clone(), v)))
            .collect();
        Self { values }
    }

    /// Copy of `record` without its identifier.
    /// Schema fields the record lacks fall back to their defaults.
    pub fn from_record(def: &ResourceDef, record: &Value) -> Self {
        let mut values = record.as_object().cloned().unwrap_or_default();
        values.remove(&def.id_field);

        let today = Utc::now().date_naive();
        for field in &def.fields {
            if values.contains_key(&field.name) {
                continue;
            }
            if let Some(default) = field.default_value(today) {
                values.insert(field.name.clone(), default);
            }
        }

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Text shown in the input for `field`
    pub fn display_value(&self, field: &FieldDef) -> String {
        match self.values.get(&field.name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) if field.kind == FieldKind::Date => date_part(s).to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Store raw text input, coerced to the field's kind.
    /// On error the form is left untouched.
    pub fn set_input(&mut self, field: &FieldDef, raw: &str) -> Result<(), FieldError> {
        let input = raw.trim();
        let value = match &field.kind {
            FieldKind::Text | FieldKind::TextArea => Some(Value::String(raw.to_string())),
            FieldKind::Date => {
                if !input.is_empty() && !is_date_input(input) {
                    return Err(FieldError::InvalidDate {
                        field: field.label.clone(),
                        input: input.to_string(),
                    });
                }
                // An untouched server timestamp shows as its date; keep the original
                match self.values.get(&field.name) {
                    Some(Value::String(current))
                        if !input.is_empty() && date_part(current) == input =>
                    {
                        return Ok(());
                    },
                    _ => Some(Value::String(input.to_string())),
                }
            },
            FieldKind::Integer => Some(Value::from(parse_integer(field, input)?.unwrap_or(0))),
            FieldKind::Decimal => Some(parse_decimal(field, input)?),
            FieldKind::Id => parse_integer(field, input)?.map(Value::from),
            FieldKind::Choice { options } => {
                if !options.iter().any(|o| o == input) {
                    return Err(FieldError::NotAnOption {
                        field: field.label.clone(),
                        input: input.to_string(),
                    });
                }
                Some(Value::String(input.to_string()))
            },
        };

        match value {
            Some(v) => {
                self.values.insert(field.name.clone(), v);
            },
            None => {
                self.values.remove(&field.name);
            },
        }
        Ok(())
    }

    /// Step a choice field to its next option (wrapping)
    pub fn cycle_choice(&mut self, field: &FieldDef) {
        let FieldKind::Choice { options } = &field.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }

        let current = self.values.get(&field.name).and_then(|v| v.as_str());
        let next = current
            .and_then(|c| options.iter().position(|o| o == c))
            .map(|idx| (idx + 1) % options.len())
            .unwrap_or(0);

        self.values
            .insert(field.name.clone(), Value::String(options[next].clone()));
    }

    /// Minimal checks requested by individual fields
    pub fn validate(&self, def: &ResourceDef) -> Result<(), ValidationError> {
        for field in &def.fields {
            let value = self.values.get(&field.name);

            let text = match value {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.trim().to_string()),
                Some(other) => Some(other.to_string()),
            };

            if field.required && text.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::Required {
                    field: field.label.clone(),
                });
            }

            if let Some(min) = field.min_len {
                let actual = text.as_deref().map_or(0, |t| t.chars().count());
                if actual < min {
                    return Err(ValidationError::TooShort {
                        field: field.label.clone(),
                        min,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// JSON body for create/update
    pub fn to_body(&self, def: &ResourceDef) -> Value {
        let mut body = self.values.clone();
        body.remove(&def.id_field);

        for field in &def.fields {
            if field.trim {
                if let Some(Value::String(s)) = body.get_mut(&field.name) {
                    *s = s.trim().to_string();
                }
            }

            if field.normalize == Some(Normalize::IsoInstant) {
                let normalized = match body.get(&field.name) {
                    Some(Value::String(s)) if s.trim().is_empty() => None,
                    Some(Value::String(s)) => Some(Value::String(to_iso_instant(s))),
                    Some(other) => Some(other.clone()),
                    None => None,
                };
                match normalized {
                    Some(v) => {
                        body.insert(field.name.clone(), v);
                    },
                    None => {
                        body.remove(&field.name);
                    },
                }
            }
        }

        Value::Object(body)
    }
}

/// `YYYY-MM-DD` of a date or timestamp string
fn date_part(value: &str) -> &str {
    value.split('T').next().unwrap_or(value)
}

/// A bare date, or an RFC 3339 timestamp as returned by the backend
fn is_date_input(input: &str) -> bool {
    NaiveDate::parse_from_str(input, DATE_FORMAT).is_ok()
        || DateTime::parse_from_rfc3339(input).is_ok()
}

/// A bare date becomes midnight UTC; anything else is passed through
fn to_iso_instant(value: &str) -> String {
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => format!("{}T00:00:00.000Z", date.format(DATE_FORMAT)),
        Err(_) => value.to_string(),
    }
}

fn parse_integer(field: &FieldDef, input: &str) -> Result<Option<i64>, FieldError> {
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<i64>()
        .map(Some)
        .map_err(|_| FieldError::NotInteger {
            field: field.label.clone(),
            input: input.to_string(),
        })
}

fn parse_decimal(field: &FieldDef, input: &str) -> Result<Value, FieldError> {
    if input.is_empty() {
        return Ok(Value::from(0));
    }
    if let Ok(n) = input.parse::<i64>() {
        return Ok(Value::from(n));
    }
    input
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| FieldError::NotNumber {
            field: field.label.clone(),
            input: input.to_string(),
        })
}
