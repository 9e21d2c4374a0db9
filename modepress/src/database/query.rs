//! Query and update descriptions passed to a `Collection`

use crate::database::Document;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// A find request: selector plus paging, ordering and projection
///
/// Example usage:
/// ```rust
/// use modepress::database::{FindQuery, OrderDirection};
/// use serde_json::json;
///
/// let query = FindQuery::new(json!({ "public": true }))
///     .sort_by("createdOn", OrderDirection::Desc)
///     .index(20)
///     .limit(10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub selector: Value,
    pub sort: Vec<(String, OrderDirection)>,
    /// Number of matching documents to skip
    pub index: usize,
    /// Maximum number of documents to return, `-1` for no limit
    pub limit: i64,
    /// Fields to return; `None` returns whole documents. `_id` is always kept.
    pub projection: Option<Vec<String>>,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            selector: json!({}),
            sort: Vec::new(),
            index: 0,
            limit: -1,
            projection: None,
        }
    }
}

impl FindQuery {
    pub fn new(selector: Value) -> Self {
        Self {
            selector,
            ..Self::default()
        }
    }

    /// Add a sort key; earlier keys take precedence
    pub fn sort_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// A single-document update in the spirit of MongoDB update operators
///
/// `set` maps to `$set`, and the array operators to `$addToSet`, `$push`
/// and `$pull`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Document,
    pub add_to_set: Vec<(String, Value)>,
    pub push: Vec<(String, Value)>,
    pub pull: Vec<(String, Value)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$set` every field of a document
    pub fn set(mut self, document: Document) -> Self {
        self.set.extend(document);
        self
    }

    /// `$set` a single (possibly dotted) field
    pub fn set_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.insert(field.into(), value);
        self
    }

    /// Append `value` to an array field unless an equal element is present
    pub fn add_to_set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.add_to_set.push((field.into(), value));
        self
    }

    /// Append `value` to an array field
    pub fn push(mut self, field: impl Into<String>, value: Value) -> Self {
        self.push.push((field.into(), value));
        self
    }

    /// Remove every element equal to `value` from an array field
    pub fn pull(mut self, field: impl Into<String>, value: Value) -> Self {
        self.pull.push((field.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.add_to_set.is_empty()
            && self.push.is_empty()
            && self.pull.is_empty()
    }
}
