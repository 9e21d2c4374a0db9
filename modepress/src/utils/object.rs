//! Dotted-path access into JSON documents
//!
//! Selectors, sorts and projections address nested fields the way MongoDB
//! does (`"meta.author.name"`, `"tags.0"`); these helpers do the traversal.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Get a nested property from a document
///
/// Returns None if any part of the path doesn't exist or is not accessible.
///
/// # Example
/// ```rust
/// use modepress::utils::object;
/// use serde_json::json;
///
/// let doc = json!({"meta": {"author": "ann"}, "tags": ["a", "b"]});
/// let doc = doc.as_object().unwrap();
///
/// assert_eq!(object::get(doc, "meta.author"), Some(&json!("ann")));
/// assert_eq!(object::get(doc, "tags.1"), Some(&json!("b")));
/// assert_eq!(object::get(doc, "meta.email"), None);
/// ```
pub fn get<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Set a nested property, creating intermediate objects as needed
pub fn set(doc: &mut Map<String, Value>, path: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = path.split('.').collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| Error::invalid_input("Empty path provided"))?;

    let mut current = doc;
    for part in parents {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(Error::invalid_input(format!(
                    "Cannot set '{}': '{}' is not an object",
                    path, part
                )))
            }
        };
    }

    current.insert(last.to_string(), value);
    Ok(())
}

/// Get a mutable reference to a nested property
pub fn get_mut<'a>(doc: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut parts = path.split('.');
    let mut current = doc.get_mut(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(map) => map.get_mut(part)?,
            Value::Array(arr) => arr.get_mut(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
