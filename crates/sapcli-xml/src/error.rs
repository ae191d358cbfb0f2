//! Error types for ABAP XML encoding and decoding.
//!
//! Every failure is reported at the point of detection. A failing decode
//! drops its in-progress frames, so no partially populated value ever
//! reaches the caller.

use std::io;

use sapcli_core::SapCliError;

/// Errors that can occur while building schemas or converting ABAP XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A record mutation or a parsed tag names a field the record type does not declare.
    #[error("{type_name} has no member {field_name}")]
    UnknownMember {
        /// The record type that was consulted.
        type_name: String,
        /// The undeclared field name.
        field_name: String,
    },

    /// A value does not have the declared row or field type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The declared type name.
        expected: String,
        /// The type name of the offered value.
        actual: String,
    },

    /// A parsed tag is not the one the current frame predicted.
    #[error("unexpected XML element: expected {expected}, got {actual}")]
    UnexpectedTag {
        /// What the schema or envelope predicted.
        expected: String,
        /// The tag actually found.
        actual: String,
    },

    /// A multiplexed body appeared out of the declared order.
    #[error("body sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch {
        /// The next expected type name.
        expected: String,
        /// The tag actually found.
        actual: String,
    },

    /// Character data where only child elements are allowed.
    #[error("unexpected text inside {0}")]
    UnexpectedText(String),

    /// The document ended before a required element was complete.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// A record type declares the same field twice.
    #[error("{type_name} declares member {field_name} more than once")]
    DuplicateMember {
        /// The record type being built.
        type_name: String,
        /// The repeated field name.
        field_name: String,
    },

    /// Two different types were registered under one name.
    #[error("type {0} is already registered")]
    DuplicateType(String),

    /// A type name is not present in the schema registry.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// An error decoding text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// An identifier or configuration error.
    #[error(transparent)]
    Core(#[from] SapCliError),
}

impl XmlError {
    pub(crate) fn unknown_member(
        type_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self::UnknownMember {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn unexpected_tag(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UnexpectedTag {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
