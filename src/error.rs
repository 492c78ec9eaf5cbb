//! Error types for the translator.
//!
//! Untranslatable constructs are not errors: they become notes on the tree.
//! These variants cover input that cannot be read at all and environment
//! failures around a translation.

use thiserror::Error;

/// The main error type for translator operations.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The source text could not be split into tokens.
    #[error("Lex error at position {position}: {message}")]
    Lex { position: usize, message: String },

    /// A statement could not be parsed.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A placeholder pattern from the configuration is not a valid regex.
    #[error("Invalid placeholder pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// Create a lex error at the given position.
    pub fn lex(position: usize, message: impl Into<String>) -> Self {
        Self::Lex {
            position,
            message: message.into(),
        }
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for translator operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslateError::parse(5, "expected FROM");
        assert_eq!(err.to_string(), "Parse error at position 5: expected FROM");
        let err = TranslateError::lex(0, "unterminated comment");
        assert_eq!(err.to_string(), "Lex error at position 0: unterminated comment");
    }
}
