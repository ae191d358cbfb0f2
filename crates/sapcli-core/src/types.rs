//! Common type definitions shared across the codec.

use std::fmt;

use crate::error::SapCliError;

/// Characters that never appear in an element name written by the codec.
const FORBIDDEN: &[char] = &['<', '>', '&', '"', '\'', '/', '=', '?'];

/// A validated XML element name.
///
/// Field names, record type names, table type names and scalar row names are
/// all written verbatim as tags, so they must be usable as XML element names.
/// Namespace prefixes (`asx:values`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Create a new identifier.
    ///
    /// # Errors
    /// Returns an error if the name is empty, starts with a digit, `-` or `.`,
    /// or contains whitespace or markup characters.
    pub fn new(name: impl Into<String>) -> Result<Self, SapCliError> {
        let name = name.into();
        let valid = match name.chars().next() {
            None => false,
            Some(first) => {
                !(first.is_ascii_digit() || first == '-' || first == '.')
                    && !name
                        .chars()
                        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c))
            }
        };
        if !valid {
            return Err(SapCliError::InvalidIdentifier(name));
        }
        Ok(Self(name))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for Identifier {
    type Error = SapCliError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = SapCliError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}
