//! Boolean, date, JSON and identifier items

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolItem {
    pub value: bool,
}

impl BoolItem {
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    /// Accepts booleans, `"true"`/`"false"` and `1`/`0`
    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            Value::Number(n) if n.as_f64() == Some(1.0) => true,
            Value::Number(n) if n.as_f64() == Some(0.0) => false,
            _ => return Err(Error::validation(name, "expected a boolean")),
        };
        Ok(())
    }
}

/// A timestamp in milliseconds since the Unix epoch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateItem {
    pub value: Option<i64>,
    /// Replace the value with the current time on every validation
    pub use_now: bool,
    /// Fill in the current time when validating a value that was never set
    pub default_now: bool,
}

impl DateItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(millis: i64) -> Self {
        Self {
            value: Some(millis),
            ..Self::default()
        }
    }

    pub fn use_now(mut self) -> Self {
        self.use_now = true;
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }

    /// Accepts millisecond numbers and RFC 3339 strings
    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = match value {
            Value::Null => None,
            Value::Number(n) => Some(
                n.as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .ok_or_else(|| Error::validation(name, "is not a valid timestamp"))?,
            ),
            Value::String(s) => Some(
                DateTime::parse_from_rfc3339(s)
                    .map_err(|e| Error::validation(name, format!("'{}' is not a date: {}", s, e)))?
                    .timestamp_millis(),
            ),
            _ => return Err(Error::validation(name, "expected a timestamp")),
        };
        Ok(())
    }

    pub(crate) fn validate(&mut self) {
        if self.use_now || (self.default_now && self.value.is_none()) {
            self.value = Some(Utc::now().timestamp_millis());
        }
    }

    pub fn db_value(&self) -> Value {
        self.value.map(Value::from).unwrap_or(Value::Null)
    }
}

/// Any JSON value, stored as-is
#[derive(Debug, Clone, PartialEq)]
pub struct JsonItem {
    pub value: Value,
}

impl Default for JsonItem {
    fn default() -> Self {
        Self { value: Value::Null }
    }
}

impl JsonItem {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// An opaque record identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdItem {
    pub value: Option<Uuid>,
}

impl IdItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = parse_optional_id(name, value)?;
        Ok(())
    }

    pub fn db_value(&self) -> Value {
        id_value(self.value.as_ref())
    }
}

/// Parse an identifier from a string, or from an expanded record's `_id`
pub(crate) fn parse_id(name: &str, value: &Value) -> Result<Uuid> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation(name, "object has no '_id' identifier"))?,
        _ => return Err(Error::validation(name, "expected an identifier")),
    };
    Uuid::parse_str(raw)
        .map_err(|_| Error::validation(name, format!("'{}' is not a valid identifier", raw)))
}

pub(crate) fn parse_optional_id(name: &str, value: &Value) -> Result<Option<Uuid>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        other => parse_id(name, other).map(Some),
    }
}

pub(crate) fn id_value(id: Option<&Uuid>) -> Value {
    id.map(|id| Value::String(id.to_string()))
        .unwrap_or(Value::Null)
}
