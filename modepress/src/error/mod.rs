use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export context helpers
pub use context::{ErrorChain, ErrorContext, OptionExt};

/// Main error type for the Modepress model layer
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error on '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("{0} is required")]
    RequiredField(String),

    #[error("{} must be unique", .fields.join(", "))]
    UniquenessConflict { fields: Vec<String> },

    #[error(
        "'{field}' references {} in '{collection}' which could not be found",
        .missing.join(", ")
    )]
    ReferenceIntegrity {
        field: String,
        collection: String,
        missing: Vec<String>,
    },

    #[error("{} validation errors: {}", .0.len(), join_errors(.0))]
    ValidationFailures(Vec<Error>),

    #[error("Could not find any records in '{collection}' matching the selector")]
    NotFound { collection: String },

    #[error("Model '{0}' has not been initialized")]
    NotInitialized(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn not_found(collection: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
        }
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the error was caused by the data a caller supplied rather
    /// than by the store or the model setup
    pub fn is_validation(&self) -> bool {
        match self {
            Error::Validation { .. }
            | Error::RequiredField(_)
            | Error::UniquenessConflict { .. }
            | Error::ReferenceIntegrity { .. }
            | Error::ValidationFailures(_)
            | Error::InvalidInput(_) => true,
            Error::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Get a stable error code for controllers to map onto their responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "E_VALIDATION",
            Error::RequiredField(_) => "E_REQUIRED",
            Error::UniquenessConflict { .. } => "E_NOT_UNIQUE",
            Error::ReferenceIntegrity { .. } => "E_REFERENCE",
            Error::ValidationFailures(_) => "E_VALIDATION",
            Error::NotFound { .. } => "E_NOT_FOUND",
            Error::NotInitialized(_) => "E_NOT_INITIALIZED",
            Error::ModelNotFound(_) => "E_MODEL_NOT_FOUND",
            Error::Registry(_) => "E_REGISTRY",
            Error::Schema(_) => "E_SCHEMA",
            Error::InvalidInput(_) => "E_INVALID_INPUT",
            Error::InvalidOptions(_) => "E_INVALID_OPTIONS",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::Json(_) => "E_JSON",
            Error::Config(_) => "E_CONFIG",
            Error::Internal(_) => "E_INTERNAL",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}
