use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::tier::TRUTHY_FLAG_VALUES;
use crate::errors::EngineError;

pub use crate::types::{FieldName, RecordId};

/// A single raw field value as delivered by upstream loaders and models.
///
/// Deserializes from JSON scalars: `null`, booleans, numbers, and strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value.
    ///
    /// Numbers and numeric strings (surrounding whitespace ignored) yield
    /// `Some` when finite. Everything else, including `NaN` and infinities,
    /// yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(value) => *value,
            FieldValue::Text(text) => text.trim().parse::<f64>().ok()?,
            FieldValue::Null | FieldValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Text view of the value (strings only).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether the value reads as a set categorical flag.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(flag) => *flag,
            FieldValue::Number(value) => value.is_finite() && *value != 0.0,
            FieldValue::Text(text) => {
                let text = text.trim();
                TRUTHY_FLAG_VALUES
                    .iter()
                    .any(|truthy| text.eq_ignore_ascii_case(truthy))
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Read access to named record fields.
///
/// Every engine operation is generic over this trait so callers can layer
/// injected lookups (see [`crate::lookup::FieldLookup`]) over records without
/// copying them.
pub trait FieldSource {
    /// Stable identifier of the underlying record.
    fn record_id(&self) -> &str;

    /// Raw value for `name`, if present.
    fn field(&self, name: &str) -> Option<&FieldValue>;

    /// Finite numeric value for `name`, if present and numeric.
    fn number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_number)
    }

    /// String value for `name`, if present and textual.
    fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// First finite numeric value among `names`, in order.
    fn first_number(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.number(name))
    }

    /// First non-blank string value among `names`, in order.
    fn first_text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.text(name))
            .find(|text| !text.trim().is_empty())
    }

    /// Whether `name` holds a set categorical flag.
    fn flag(&self, name: &str) -> bool {
        self.field(name).is_some_and(FieldValue::is_truthy)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn record_id(&self) -> &str {
        (**self).record_id()
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        (**self).field(name)
    }
}

/// Canonical record payload: a stable id plus an open-ended field map.
///
/// Serialized as a flat JSON object, e.g.
/// `{"id": "npi::1", "tier_raw": "Tier 1", "ngd_decile": 3}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable record identifier.
    pub id: RecordId,
    /// Raw fields in input order.
    #[serde(flatten)]
    pub fields: IndexMap<FieldName, FieldValue>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insert.
    pub fn with(mut self, name: impl Into<FieldName>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, name: impl Into<FieldName>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Parse a JSON array of flat record objects.
    pub fn population_from_json_str(raw: &str) -> Result<Vec<Record>, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl FieldSource for Record {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}
