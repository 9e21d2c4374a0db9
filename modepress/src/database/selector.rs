//! MongoDB-style selector evaluation
//!
//! Supports field equality (array fields match by containment), the
//! comparison operators `$eq $ne $gt $gte $lt $lte`, the set operators
//! `$in $nin $all`, `$exists`, and the logical combinators `$and $or $nor`.
//! Field names may be dotted paths.

use crate::database::Document;
use crate::error::{Error, Result};
use crate::utils::object;
use serde_json::Value;
use std::cmp::Ordering;

/// Check whether a document satisfies a selector
///
/// `null` and `{}` match every document.
pub fn matches(doc: &Document, selector: &Value) -> Result<bool> {
    let conditions = match selector {
        Value::Null => return Ok(true),
        Value::Object(map) => map,
        other => {
            return Err(Error::database_query(format!(
                "Selector must be an object, got {}",
                other
            )))
        }
    };

    for (key, condition) in conditions {
        let matched = match key.as_str() {
            "$and" => sub_selectors(key, condition)?
                .iter()
                .map(|s| matches(doc, s))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .all(|m| m),
            "$or" => {
                let mut any = false;
                for s in sub_selectors(key, condition)? {
                    if matches(doc, s)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for s in sub_selectors(key, condition)? {
                    if matches(doc, s)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(Error::database_query(format!(
                    "Unsupported top-level operator '{}'",
                    op
                )))
            }
            path => match_field(object::get(doc, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn sub_selectors<'a>(op: &str, condition: &'a Value) -> Result<&'a Vec<Value>> {
    match condition {
        Value::Array(list) if !list.is_empty() => Ok(list),
        _ => Err(Error::database_query(format!(
            "'{}' expects a non-empty array of selectors",
            op
        ))),
    }
}

fn is_operator_object(condition: &Value) -> bool {
    match condition {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn match_field(field: Option<&Value>, condition: &Value) -> Result<bool> {
    if !is_operator_object(condition) {
        return Ok(field_equals(field, condition));
    }

    let Value::Object(operators) = condition else {
        return Ok(false);
    };

    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => field_equals(field, operand),
            "$ne" => !field_equals(field, operand),
            "$gt" => field_compares(field, operand, |o| o == Ordering::Greater),
            "$gte" => field_compares(field, operand, |o| o != Ordering::Less),
            "$lt" => field_compares(field, operand, |o| o == Ordering::Less),
            "$lte" => field_compares(field, operand, |o| o != Ordering::Greater),
            "$in" => list_operand(op, operand)?
                .iter()
                .any(|candidate| field_equals(field, candidate)),
            "$nin" => !list_operand(op, operand)?
                .iter()
                .any(|candidate| field_equals(field, candidate)),
            "$all" => {
                let required = list_operand(op, operand)?;
                match field {
                    Some(Value::Array(items)) => required
                        .iter()
                        .all(|r| items.iter().any(|item| values_equal(item, r))),
                    _ => false,
                }
            }
            "$exists" => {
                let wanted = operand.as_bool().ok_or_else(|| {
                    Error::database_query("'$exists' expects a boolean".to_string())
                })?;
                field.is_some() == wanted
            }
            other => {
                return Err(Error::database_query(format!(
                    "Unsupported operator '{}'",
                    other
                )))
            }
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn list_operand<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| Error::database_query(format!("'{}' expects an array", op)))
}

/// Equality with MongoDB's array semantics: a scalar matches an array field
/// containing it, and a missing field matches `null`
fn field_equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn field_compares<F>(field: Option<&Value>, operand: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match field {
        None => false,
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare_values(item, operand).is_some_and(&accept)),
        Some(value) => compare_values(value, operand).is_some_and(accept),
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Order two values of the same kind; mixed kinds are unordered
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used for sorting: missing and null first, then by type, then by value
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y)
            .unwrap_or_else(|| type_rank(Some(x)).cmp(&type_rank(Some(y)))),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
