//! Numeric items

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
pub const MAX_DECIMAL_PLACES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberType {
    Integer,
    Float,
}

/// Coercion and bounds shared by `NumberItem` and `NumberArrayItem`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRule {
    pub min: f64,
    pub max: f64,
    pub number_type: NumberType,
    pub decimal_places: u32,
}

impl Default for NumberRule {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
            number_type: NumberType::Integer,
            decimal_places: DEFAULT_DECIMAL_PLACES,
        }
    }
}

impl NumberRule {
    /// Integers truncate, floats round to `decimal_places`
    pub fn coerce(&self, value: f64) -> f64 {
        match self.number_type {
            NumberType::Integer => value.trunc(),
            NumberType::Float => {
                let factor = 10f64.powi(self.decimal_places.min(MAX_DECIMAL_PLACES) as i32);
                (value * factor).round() / factor
            }
        }
    }

    /// Coerce, then check the result against `[min, max]`
    pub fn apply(&self, name: &str, value: f64) -> Result<f64> {
        let coerced = self.coerce(value);
        if coerced < self.min {
            return Err(Error::validation(
                name,
                format!("must be at least {}", self.min),
            ));
        }
        if coerced > self.max {
            return Err(Error::validation(
                name,
                format!("must be no more than {}", self.max),
            ));
        }
        Ok(coerced)
    }

    pub fn to_json(&self, value: f64) -> Value {
        match self.number_type {
            NumberType::Integer if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                Value::from(value as i64)
            }
            _ => serde_json::Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

/// Read a JSON value as a number; numeric strings are parsed
pub(crate) fn coerce_number(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::validation(name, "is not a representable number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::validation(name, format!("'{}' is not a number", s))),
        _ => Err(Error::validation(name, "expected a number")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberItem {
    pub value: f64,
    pub rule: NumberRule,
}

impl Default for NumberItem {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl NumberItem {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            rule: NumberRule::default(),
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.rule.min = min;
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.rule.max = max;
        self
    }

    pub fn float(mut self) -> Self {
        self.rule.number_type = NumberType::Float;
        self
    }

    /// Rounding precision for floats, capped at `MAX_DECIMAL_PLACES`
    pub fn decimal_places(mut self, places: u32) -> Self {
        self.rule.decimal_places = places.min(MAX_DECIMAL_PLACES);
        self
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = coerce_number(name, value)?;
        Ok(())
    }

    pub(crate) fn validate(&mut self, name: &str) -> Result<()> {
        self.value = self.rule.apply(name, self.value)?;
        Ok(())
    }

    pub fn db_value(&self) -> Value {
        self.rule.to_json(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_truncates_and_is_idempotent() {
        let mut item = NumberItem::new(7.9);
        item.validate("views").unwrap();
        assert_eq!(item.value, 7.0);
        item.validate("views").unwrap();
        assert_eq!(item.value, 7.0);
        assert_eq!(item.db_value(), json!(7));
    }

    #[test]
    fn test_float_rounds_to_decimal_places() {
        let mut item = NumberItem::new(1.2345).float();
        item.validate("price").unwrap();
        assert_eq!(item.value, 1.23);
        item.validate("price").unwrap();
        assert_eq!(item.value, 1.23);

        let mut precise = NumberItem::new(1.23456).float().decimal_places(4);
        precise.validate("price").unwrap();
        assert_eq!(precise.value, 1.2346);
        assert_eq!(NumberItem::new(0.0).decimal_places(50).rule.decimal_places, 20);
    }

    #[test]
    fn test_bounds_checked_after_coercion() {
        let mut item = NumberItem::new(10.9).max(10.0);
        assert!(item.validate("rating").is_ok());

        let mut item = NumberItem::new(11.0).max(10.0);
        assert!(item.validate("rating").is_err());

        let mut item = NumberItem::new(-1.0).min(0.0);
        assert!(item.validate("rating").is_err());
    }

    #[test]
    fn test_set_parses_numeric_strings() {
        let mut item = NumberItem::default();
        item.set("views", &json!(" 12 ")).unwrap();
        assert_eq!(item.value, 12.0);
        assert!(item.set("views", &json!("twelve")).is_err());
        assert!(item.set("views", &json!([1])).is_err());
    }
}
