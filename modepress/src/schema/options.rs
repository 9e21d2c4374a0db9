//! Options controlling how a record is projected for clients

use crate::config::ExpansionConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client projection options
///
/// Deserializes from the camelCase shape controllers receive on the wire
/// (`{"verbose": true, "expandForeignKeys": true, "expandMaxDepth": 1}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonOptions {
    /// Include items flagged `sensitive`
    pub verbose: bool,
    /// Resolve foreign keys and id arrays into nested objects
    pub expand_foreign_keys: bool,
    /// Recursion ceiling for expansion, `-1` for unlimited.
    /// Must be present whenever `expand_foreign_keys` is set.
    pub expand_max_depth: Option<i32>,
    /// Item names that are never expanded
    pub expand_schema_blacklist: Vec<String>,
}

impl JsonOptions {
    /// Verbose projection without expansion
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    /// Expand references up to `max_depth` levels (`-1` for unlimited)
    pub fn expanded(max_depth: i32) -> Self {
        Self {
            expand_foreign_keys: true,
            expand_max_depth: Some(max_depth),
            ..Self::default()
        }
    }

    /// Expand references to the configured default depth
    pub fn expanded_default(config: &ExpansionConfig) -> Self {
        Self::expanded(config.default_max_depth)
    }

    /// Copy of these options with the depth held under the configured ceiling
    pub fn clamped(&self, config: &ExpansionConfig) -> Self {
        let mut options = self.clone();
        options.expand_max_depth = options.expand_max_depth.map(|d| config.clamp_depth(d));
        options
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Never expand the named item
    pub fn blacklist(mut self, name: impl Into<String>) -> Self {
        self.expand_schema_blacklist.push(name.into());
        self
    }

    /// Reject incoherent option combinations
    pub fn validate(&self) -> Result<()> {
        match (self.expand_foreign_keys, self.expand_max_depth) {
            (true, None) => Err(Error::invalid_options(
                "expandMaxDepth is required when expandForeignKeys is set",
            )),
            (_, Some(depth)) if depth < -1 => Err(Error::invalid_options(format!(
                "expandMaxDepth must be -1 or greater, got {}",
                depth
            ))),
            _ => Ok(()),
        }
    }

    /// Whether the item `name` at traversal `depth` should be expanded
    pub(crate) fn should_expand(&self, name: &str, depth: u32) -> bool {
        if !self.expand_foreign_keys {
            return false;
        }
        if self.expand_schema_blacklist.iter().any(|n| n == name) {
            return false;
        }
        match self.expand_max_depth {
            Some(-1) => true,
            Some(max) => i64::from(depth) < i64::from(max),
            None => false,
        }
    }
}

/// State carried through one expansion traversal
///
/// `depth` counts the references followed from the root record; `path`
/// holds the records on the way down so a reference back into it is left
/// unexpanded, which bounds traversal even with unlimited depth.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpandContext {
    pub depth: u32,
    path: Vec<(String, Uuid)>,
}

impl ExpandContext {
    pub fn root(collection: &str, id: Uuid) -> Self {
        Self {
            depth: 0,
            path: vec![(collection.to_string(), id)],
        }
    }

    pub fn is_on_path(&self, collection: &str, id: &Uuid) -> bool {
        self.path.iter().any(|(c, i)| c == collection && i == id)
    }

    pub fn descend(&self, collection: &str, id: Uuid) -> Self {
        let mut path = self.path.clone();
        path.push((collection.to_string(), id));
        Self {
            depth: self.depth + 1,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_requires_depth() {
        let options = JsonOptions {
            expand_foreign_keys: true,
            ..JsonOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidOptions(_))));
        assert!(JsonOptions::expanded(1).validate().is_ok());
        assert!(JsonOptions::expanded(-2).validate().is_err());
    }

    #[test]
    fn test_should_expand() {
        let options = JsonOptions::expanded(1).blacklist("parent");
        assert!(options.should_expand("author", 0));
        assert!(!options.should_expand("author", 1));
        assert!(!options.should_expand("parent", 0));
        assert!(JsonOptions::expanded(-1).should_expand("author", 40));
        assert!(!JsonOptions::verbose().should_expand("author", 0));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let options: JsonOptions = serde_json::from_str(
            r#"{"verbose": true, "expandForeignKeys": true, "expandMaxDepth": 2, "expandSchemaBlacklist": ["parent"]}"#,
        )
        .unwrap();
        assert!(options.verbose);
        assert_eq!(options.expand_max_depth, Some(2));
        assert_eq!(options.expand_schema_blacklist, vec!["parent"]);

        let empty: JsonOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, JsonOptions::default());
    }

    #[test]
    fn test_clamped_to_ceiling() {
        let config = ExpansionConfig {
            default_max_depth: 2,
            max_depth_ceiling: Some(3),
        };
        assert_eq!(JsonOptions::expanded(-1).clamped(&config).expand_max_depth, Some(3));
        assert_eq!(JsonOptions::expanded(2).clamped(&config).expand_max_depth, Some(2));
        assert_eq!(JsonOptions::expanded_default(&config).expand_max_depth, Some(2));
        assert_eq!(JsonOptions::verbose().clamped(&config).expand_max_depth, None);
    }

    #[test]
    fn test_context_path() {
        let root_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let root = ExpandContext::root("posts", root_id);
        let child = root.descend("users", child_id);

        assert_eq!(child.depth, 1);
        assert!(child.is_on_path("posts", &root_id));
        assert!(child.is_on_path("users", &child_id));
        assert!(!root.is_on_path("users", &child_id));
    }
}
