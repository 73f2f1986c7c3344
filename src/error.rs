//! Error types for the icon embedder

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid include pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Dataset error in {package}: {message}")]
    Dataset { package: String, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, EmbedError>;

impl EmbedError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn dataset(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dataset {
            package: package.into(),
            message: message.into(),
        }
    }
}

/// Non-fatal condition recorded while transforming a module.
///
/// None of these abort a transform; each one leaves the smallest possible
/// scope (a call site, an import target, a configuration entry) untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A call site was replaced with an embedded literal
    Replaced { identifier: String, literal: String },

    /// Identifier absent from the dataset, call site left verbatim
    NotFound { identifier: String },

    /// A configured extractor strategy does not exist, entry skipped
    MissingExtractor { name: String, strategy: String },

    /// A dataset failed to load, its entry skipped for this module
    DatasetUnavailable { dataset: String, message: String },

    /// No include patterns were configured
    NoIncludePatterns,

    /// Module text could not be parsed, imports left untouched
    ParseFailure { module_id: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Replaced { identifier, literal } => {
                write!(f, "  - {} -> {}", identifier, crate::utils::truncate(literal))
            }
            Diagnostic::NotFound { identifier } => {
                write!(f, " > {} -> Not found, not replaced.", identifier)
            }
            Diagnostic::MissingExtractor { name, strategy } => {
                write!(f, "extractor '{}' uses unknown strategy '{}', skipped", name, strategy)
            }
            Diagnostic::DatasetUnavailable { dataset, message } => {
                write!(f, "dataset {} unavailable: {}", dataset, message)
            }
            Diagnostic::NoIncludePatterns => write!(f, "`include` option was not provided."),
            Diagnostic::ParseFailure { module_id } => {
                write!(f, "{} could not be parsed, imports left in place", module_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmbedError::dataset("icons-pkg", "binding 'fas' not found");
        assert_eq!(
            err.to_string(),
            "Dataset error in icons-pkg: binding 'fas' not found"
        );

        let err = EmbedError::pattern("[", "unclosed character class");
        assert!(err.to_string().contains("'['"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::NotFound {
            identifier: "unknownGlyph".to_string(),
        };
        assert_eq!(diag.to_string(), " > unknownGlyph -> Not found, not replaced.");
    }
}
