//! Configuration for the XML codec.
//!
//! All configuration is driven by environment variables with defaults that
//! reproduce the ABAP XML envelopes byte for byte.

use std::str::FromStr;

use crate::error::{SapCliError, SapCliResult};

/// Largest indentation width accepted by [`CodecConfig::validate`].
const MAX_INDENT_WIDTH: usize = 16;

/// Codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodecConfig {
    /// Spaces written per nesting level.
    pub indent_width: usize,
    /// `version` attribute of the `<abapGit>` interchange root.
    pub interchange_version: String,
    /// `serializer_version` attribute of the `<abapGit>` interchange root.
    pub serializer_version: String,
    /// Fail multiplexed decodes that end before every expected body was seen.
    pub strict_sequence: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            indent_width: 1,
            interchange_version: "v1.0.0".to_owned(),
            serializer_version: "v1.0.0".to_owned(),
            strict_sequence: false,
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SAPCLI_XML_INDENT") {
            config.indent_width = parse_or(&v, "SAPCLI_XML_INDENT", config.indent_width);
        }
        if let Ok(v) = std::env::var("SAPCLI_ABAPGIT_VERSION") {
            config.interchange_version = v;
        }
        if let Ok(v) = std::env::var("SAPCLI_SERIALIZER_VERSION") {
            config.serializer_version = v;
        }
        if let Ok(v) = std::env::var("SAPCLI_STRICT_SEQUENCE") {
            config.strict_sequence = v == "1" || v.eq_ignore_ascii_case("true");
        }

        config
    }

    /// Check that the configuration can produce well-formed documents.
    ///
    /// # Errors
    /// Returns [`SapCliError::Config`] for an oversized indentation or an empty
    /// version label.
    pub fn validate(&self) -> SapCliResult<()> {
        if self.indent_width > MAX_INDENT_WIDTH {
            return Err(SapCliError::Config(format!(
                "indent width {} exceeds {MAX_INDENT_WIDTH}",
                self.indent_width
            )));
        }
        if self.interchange_version.is_empty() {
            return Err(SapCliError::Config("empty interchange version".to_owned()));
        }
        if self.serializer_version.is_empty() {
            return Err(SapCliError::Config("empty serializer version".to_owned()));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr + Copy>(raw: &str, var: &str, fallback: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(var, value = raw, "ignoring unparseable configuration value");
        fallback
    })
}
