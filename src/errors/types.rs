//! # Error Types
//!
//! Error taxonomy for topology builds using `thiserror`.

/// Custom result type for gatelink operations
pub type Result<T> = std::result::Result<T, GatelinkError>;

/// Main error type for topology builds and submissions
#[derive(thiserror::Error, Debug)]
pub enum GatelinkError {
    /// A referenced external resource does not exist at build time
    #[error("Resource not found: {resource_type} '{handle}'")]
    NotFound { resource_type: String, handle: String },

    /// Malformed configuration (unsupported method, empty stage name, bad CIDR...)
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Structurally invalid topology (zero routes, dangling references)
    #[error("Deployment error: {message}")]
    Deployment { message: String },

    /// Opaque rejection returned by the deployment engine, reason passed through verbatim
    #[error("Provider rejected stack '{stack}': {reason}")]
    ProviderRejected { stack: String, reason: String },

    /// Configuration loading errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GatelinkError {
    /// Create a not found error
    pub fn not_found<R: Into<String>, H: Into<String>>(resource_type: R, handle: H) -> Self {
        Self::NotFound { resource_type: resource_type.into(), handle: handle.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a deployment (topology structure) error
    pub fn deployment<S: Into<String>>(message: S) -> Self {
        Self::Deployment { message: message.into() }
    }

    /// Wrap a rejection reported by the deployment engine
    pub fn provider_rejected<S: Into<String>, R: Into<String>>(stack: S, reason: R) -> Self {
        Self::ProviderRejected { stack: stack.into(), reason: reason.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(context: S) -> Self {
        Self::Serialization { context: context.into(), source: None }
    }

    /// True when the error was raised locally, before anything reached the engine
    pub fn is_local(&self) -> bool {
        !matches!(self, GatelinkError::ProviderRejected { .. })
    }

    /// Stable short name of the error kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            GatelinkError::NotFound { .. } => "not_found",
            GatelinkError::Validation { .. } => "validation",
            GatelinkError::Deployment { .. } => "deployment",
            GatelinkError::ProviderRejected { .. } => "provider_rejected",
            GatelinkError::Config { .. } => "config",
            GatelinkError::Io { .. } => "io",
            GatelinkError::Serialization { .. } => "serialization",
        }
    }
}

impl From<std::io::Error> for GatelinkError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<serde_json::Error> for GatelinkError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            context: "JSON serialization failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<serde_yaml::Error> for GatelinkError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization {
            context: "YAML serialization failed".to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<config::ConfigError> for GatelinkError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for GatelinkError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation_errors("", &errors, &mut fields);
        fields.sort();

        let first_field = fields.first().map(|(field, _)| field.clone());
        let message = fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages))
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message: format!("Validation failed: {}", message), field: first_field }
    }
}

/// Collect `(dotted.path, messages)` pairs from nested validation errors
fn flatten_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, String)>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                out.push((path, messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => flatten_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}
