//! Text and number arrays

use super::number::{coerce_number, NumberRule, NumberType, MAX_DECIMAL_PLACES};
use super::text::{check_length, coerce_text, DEFAULT_MAX_CHARACTERS};
use crate::error::{Error, Result};
use serde_json::Value;

pub(crate) fn check_count(name: &str, count: usize, min: usize, max: usize) -> Result<()> {
    if count < min {
        return Err(Error::validation(
            name,
            format!("must contain at least {} items", min),
        ));
    }
    if count > max {
        return Err(Error::validation(
            name,
            format!("must contain no more than {} items", max),
        ));
    }
    Ok(())
}

pub(crate) fn array_elements<'a>(name: &str, value: &'a Value) -> Result<&'a [Value]> {
    match value {
        Value::Null => Ok(&[][..]),
        Value::Array(items) => Ok(items),
        _ => Err(Error::validation(name, "expected an array")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextArrayItem {
    pub value: Vec<String>,
    pub min_items: usize,
    pub max_items: usize,
    pub min_characters: usize,
    pub max_characters: usize,
}

impl Default for TextArrayItem {
    fn default() -> Self {
        Self {
            value: Vec::new(),
            min_items: 0,
            max_items: usize::MAX,
            min_characters: 0,
            max_characters: DEFAULT_MAX_CHARACTERS,
        }
    }
}

impl TextArrayItem {
    pub fn new<I, S>(value: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: value.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    pub fn min_characters(mut self, min: usize) -> Self {
        self.min_characters = min;
        self
    }

    pub fn max_characters(mut self, max: usize) -> Self {
        self.max_characters = max;
        self
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = array_elements(name, value)?
            .iter()
            .map(|v| coerce_text(name, v))
            .collect::<Result<_>>()?;
        Ok(())
    }

    pub(crate) fn validate(&mut self, name: &str) -> Result<()> {
        check_count(name, self.value.len(), self.min_items, self.max_items)?;
        for text in &self.value {
            check_length(name, text, self.min_characters, self.max_characters)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberArrayItem {
    pub value: Vec<f64>,
    pub min_items: usize,
    pub max_items: usize,
    pub rule: NumberRule,
}

impl Default for NumberArrayItem {
    fn default() -> Self {
        Self {
            value: Vec::new(),
            min_items: 0,
            max_items: usize::MAX,
            rule: NumberRule::default(),
        }
    }
}

impl NumberArrayItem {
    pub fn new(value: Vec<f64>) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
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

    pub fn decimal_places(mut self, places: u32) -> Self {
        self.rule.decimal_places = places.min(MAX_DECIMAL_PLACES);
        self
    }

    pub(crate) fn set(&mut self, name: &str, value: &Value) -> Result<()> {
        self.value = array_elements(name, value)?
            .iter()
            .map(|v| coerce_number(name, v))
            .collect::<Result<_>>()?;
        Ok(())
    }

    pub(crate) fn validate(&mut self, name: &str) -> Result<()> {
        check_count(name, self.value.len(), self.min_items, self.max_items)?;
        self.value = self
            .value
            .iter()
            .map(|v| self.rule.apply(name, *v))
            .collect::<Result<_>>()?;
        Ok(())
    }

    pub fn db_value(&self) -> Value {
        Value::Array(self.value.iter().map(|v| self.rule.to_json(*v)).collect())
    }
}
