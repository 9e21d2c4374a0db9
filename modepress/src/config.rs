use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[cfg(feature = "config")]
use std::fs;
#[cfg(feature = "config")]
use std::path::Path;

/// Configuration for the model layer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OdmConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub expansion: ExpansionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Prepended to every model name when binding it to a collection
    #[serde(default)]
    pub collection_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Depth used by `JsonOptions::expanded_default`
    #[serde(default = "default_max_depth")]
    pub default_max_depth: i32,

    /// Hard ceiling applied to any requested depth; `None` leaves requests as-is
    #[serde(default)]
    pub max_depth_ceiling: Option<i32>,
}

fn default_max_depth() -> i32 {
    1
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            max_depth_ceiling: None,
        }
    }
}

impl ExpansionConfig {
    /// Clamp a requested depth to the configured ceiling.
    ///
    /// `-1` (unlimited) becomes the ceiling when one is set.
    pub fn clamp_depth(&self, requested: i32) -> i32 {
        match self.max_depth_ceiling {
            Some(ceiling) if requested == -1 || requested > ceiling => ceiling,
            _ => requested,
        }
    }
}

impl OdmConfig {
    /// Load configuration from TOML file
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let content = fs::read_to_string(path_ref).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content).map_err(|e| {
            e.with_context(format!("Invalid config file '{}'", path_ref.display()))
        })?;

        log::debug!(
            "Successfully loaded configuration from: {}",
            path_ref.display()
        );
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: OdmConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from defaults plus environment variable overrides
    pub fn from_env() -> Result<Self> {
        let mut config = OdmConfig::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MODEPRESS_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("MODEPRESS_COLLECTION_PREFIX") {
            self.database.collection_prefix = prefix;
        }

        if let Some(depth) = lookup("MODEPRESS_EXPAND_MAX_DEPTH") {
            self.expansion.default_max_depth = depth.trim().parse().map_err(|_| {
                Error::config(format!(
                    "MODEPRESS_EXPAND_MAX_DEPTH must be an integer, got '{}'",
                    depth
                ))
            })?;
        }

        if let Some(ceiling) = lookup("MODEPRESS_EXPAND_DEPTH_CEILING") {
            let ceiling: i32 = ceiling.trim().parse().map_err(|_| {
                Error::config(format!(
                    "MODEPRESS_EXPAND_DEPTH_CEILING must be an integer, got '{}'",
                    ceiling
                ))
            })?;
            self.expansion.max_depth_ceiling = Some(ceiling);
        }

        self.validate()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.expansion.default_max_depth < -1 {
            return Err(Error::config(format!(
                "expansion.default_max_depth must be -1 or greater, got {}",
                self.expansion.default_max_depth
            )));
        }

        if let Some(ceiling) = self.expansion.max_depth_ceiling {
            if ceiling < 0 {
                return Err(Error::config(format!(
                    "expansion.max_depth_ceiling must be 0 or greater, got {}",
                    ceiling
                )));
            }
        }

        if self
            .database
            .collection_prefix
            .chars()
            .any(|c| c.is_whitespace() || c == '$')
        {
            return Err(Error::config(
                "database.collection_prefix may not contain whitespace or '$'",
            ));
        }

        Ok(())
    }

    /// Collection name a model called `name` is bound to
    pub fn collection_name(&self, name: &str) -> String {
        format!("{}{}", self.database.collection_prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = OdmConfig::default();
        assert_eq!(config.expansion.default_max_depth, 1);
        assert_eq!(config.collection_name("posts"), "posts");
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\ncollection_prefix = \"mp_\"\n\n[expansion]\ndefault_max_depth = 2\nmax_depth_ceiling = 4"
        )
        .unwrap();

        let config = OdmConfig::from_file(file.path()).unwrap();
        assert_eq!(config.collection_name("posts"), "mp_posts");
        assert_eq!(config.expansion.default_max_depth, 2);
        assert_eq!(config.expansion.max_depth_ceiling, Some(4));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = OdmConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(
            result,
            Err(Error::Config(ref message)) if message.contains("missing.toml")
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_rejects_bad_depth() {
        let result = OdmConfig::from_toml_str("[expansion]\ndefault_max_depth = -3");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MODEPRESS_COLLECTION_PREFIX", "test_"),
            ("MODEPRESS_EXPAND_MAX_DEPTH", "-1"),
        ]
        .into_iter()
        .collect();

        let mut config = OdmConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.collection_prefix, "test_");
        assert_eq!(config.expansion.default_max_depth, -1);
    }

    #[test]
    fn test_env_override_must_be_numeric() {
        let mut config = OdmConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "MODEPRESS_EXPAND_MAX_DEPTH").then(|| "deep".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_clamp_depth() {
        let expansion = ExpansionConfig {
            default_max_depth: 1,
            max_depth_ceiling: Some(3),
        };
        assert_eq!(expansion.clamp_depth(-1), 3);
        assert_eq!(expansion.clamp_depth(5), 3);
        assert_eq!(expansion.clamp_depth(2), 2);
        assert_eq!(ExpansionConfig::default().clamp_depth(-1), -1);
    }
}
