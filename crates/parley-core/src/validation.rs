//! Validation rules for function names exposed to the language model.

use thiserror::Error;

/// Validation rules for string identifiers
#[derive(Debug, Clone, Copy)]
pub struct IdentifierRules {
    /// Maximum allowed length in characters
    pub max_length: usize,
}

impl IdentifierRules {
    /// Rules for function names exposed to the language model.
    ///
    /// - Max length: 64 characters
    /// - Allows: ASCII alphanumeric, `_`, `-`
    pub const FUNCTION_NAME: Self = Self { max_length: 64 };

    /// Validate a string against these rules, returning it unchanged.
    ///
    /// Surrounding whitespace is rejected rather than trimmed.
    pub fn validate(&self, input: &str) -> Result<String, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError::Empty);
        }

        if input != input.trim() {
            return Err(ValidationError::LeadingTrailingWhitespace);
        }

        if input.len() > self.max_length {
            return Err(ValidationError::TooLong {
                length: input.len(),
                max: self.max_length,
            });
        }

        if let Some(ch) = input
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'))
        {
            return Err(ValidationError::InvalidChar {
                char: ch,
                input: input.to_string(),
            });
        }

        Ok(input.to_string())
    }
}

/// Errors that can occur during identifier validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is empty
    #[error("Identifier cannot be empty")]
    Empty,
    /// Identifier has leading or trailing whitespace
    #[error("Identifier cannot have leading or trailing whitespace")]
    LeadingTrailingWhitespace,
    /// Identifier exceeds maximum allowed length
    #[error("Identifier too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },
    /// Identifier contains an invalid character
    #[error("Identifier '{input}' contains invalid character '{char}'")]
    InvalidChar { char: char, input: String },
}
