//! Custom error types for bizlog
//!
//! This module defines the error hierarchy for the audit engine using thiserror
//! for ergonomic error definitions. Business errors raised by the audited
//! operation are never wrapped here; they flow back to the caller untouched.

use thiserror::Error;

/// The main error type for bizlog operations
#[derive(Error, Debug)]
pub enum BizlogError {
    /// Malformed operation declaration, fatal at registration time
    #[error("Configuration error: {0}")]
    Config(String),

    /// A template failed to evaluate against the runtime context
    #[error("Evaluation error in '{template}': {reason}")]
    Evaluation { template: String, reason: String },

    /// A record could not be built from resolved values
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// No operator could be attributed to the action
    #[error("No operator available for {method}")]
    MissingOperator { method: String },

    /// Persistence collaborator refused a record
    #[error("Sink error: {0}")]
    Sink(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(String),
}

impl BizlogError {
    /// Create an evaluation error for a template
    pub fn evaluation(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Create a "missing operator" error for a method
    pub fn missing_operator(method: impl Into<String>) -> Self {
        Self::MissingOperator {
            method: method.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an evaluation error
    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }

    /// Check if this error prevented a record from being assembled
    pub fn is_assembly(&self) -> bool {
        matches!(self, Self::Assembly(_) | Self::MissingOperator { .. })
    }
}

impl From<std::io::Error> for BizlogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BizlogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for BizlogError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

/// Result type alias for bizlog operations
pub type BizlogResult<T> = Result<T, BizlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BizlogError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
        assert!(err.is_config());
    }

    #[test]
    fn test_evaluation_error() {
        let err = BizlogError::evaluation("{{#order.id}}", "unknown variable 'order'");
        assert_eq!(
            err.to_string(),
            "Evaluation error in '{{#order.id}}': unknown variable 'order'"
        );
        assert!(err.is_evaluation());
        assert!(!err.is_assembly());
    }

    #[test]
    fn test_missing_operator_is_assembly() {
        let err = BizlogError::missing_operator("OrderService::create");
        assert_eq!(err.to_string(), "No operator available for OrderService::create");
        assert!(err.is_assembly());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BizlogError = io_err.into();
        assert!(matches!(err, BizlogError::Io(_)));
    }
}
