//! Domain error types
//!
//! This module defines the error hierarchy for Tally. Report generation
//! distinguishes errors that are fatal to a single rule (the rule is skipped
//! and the report continues) from errors that abort the whole report.

use thiserror::Error;

/// Main Tally error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A rule id that is not registered in the catalog
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// A rule set id that is not registered in the catalog
    #[error("Unknown rule set: {0}")]
    UnknownRuleSet(String),

    /// No evaluator is registered for the rule's category
    #[error("Unsupported rule type '{category}' for rule {rule_id}")]
    UnsupportedRuleType { rule_id: String, category: String },

    /// A row required a scope transition the document cannot make
    #[error("Malformed report scope: {0}")]
    MalformedScope(String),

    /// Patient source errors
    #[error("Patient source error: {0}")]
    Source(#[from] SourceError),

    /// XML writer errors
    #[error("XML error: {0}")]
    Xml(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl TallyError {
    /// Whether the error only affects a single rule
    ///
    /// Rule-scoped errors are logged and recorded in the report summary;
    /// everything else aborts report generation.
    pub fn is_rule_scoped(&self) -> bool {
        matches!(
            self,
            TallyError::UnknownRule(_) | TallyError::UnsupportedRuleType { .. }
        )
    }
}

/// Patient source errors
///
/// Errors raised by [`PatientSource`](crate::adapters::source::PatientSource)
/// implementations. These errors don't expose the underlying parser types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source file could not be opened or read
    #[error("Failed to read source {path}: {message}")]
    ReadFailed { path: String, message: String },

    /// A record could not be decoded
    #[error("Invalid record at {location}: {message}")]
    InvalidRecord { location: String, message: String },

    /// Provider referenced by a query does not exist
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

/// Percentage computation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateError {
    /// The denominator of a rate was zero
    #[error("division by zero")]
    DivisionByZero,
}

// Conversion from std::io::Error
impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        TallyError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        TallyError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TallyError {
    fn from(err: toml::de::Error) -> Self {
        TallyError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_error_display() {
        let err = TallyError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_unsupported_rule_type_display() {
        let err = TallyError::UnsupportedRuleType {
            rule_id: "rule_flu".to_string(),
            category: "standard".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported rule type 'standard' for rule rule_flu"
        );
    }

    #[test]
    fn test_rule_scoped_errors() {
        assert!(TallyError::UnknownRule("x".to_string()).is_rule_scoped());
        assert!(TallyError::UnsupportedRuleType {
            rule_id: "x".to_string(),
            category: "standard".to_string(),
        }
        .is_rule_scoped());
        assert!(!TallyError::MalformedScope("x".to_string()).is_rule_scoped());
        assert!(!TallyError::UnknownRuleSet("x".to_string()).is_rule_scoped());
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::ProviderNotFound("7".to_string());
        let err: TallyError = source_err.into();
        assert!(matches!(err, TallyError::Source(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: TallyError = io_err.into();
        assert!(matches!(err, TallyError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: TallyError = json_err.into();
        assert!(matches!(err, TallyError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: TallyError = toml_err.into();
        assert!(matches!(err, TallyError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_rate_error_display() {
        assert_eq!(RateError::DivisionByZero.to_string(), "division by zero");
    }
}
