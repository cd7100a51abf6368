//! Payload decoding.
//!
//! Turns the raw bytes fetched from a source into a typed configuration.
//! Decoding is pure: nothing shared is touched, so a failure leaves the
//! store exactly as it was.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::validation::{join_errors, Validate, ValidationError};

/// Error returned when a payload cannot become a configuration.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a well-formed document of the expected format.
    #[error("malformed {format} payload: {message}")]
    Syntax { format: Format, message: String },

    /// The document parsed but failed semantic validation.
    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

/// Deserializes raw configuration bytes into `T`.
pub trait ConfigDecoder<T>: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Infer the format from a file extension. Unknown extensions are YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }

    fn syntax_error(self, message: impl fmt::Display) -> DecodeError {
        DecodeError::Syntax {
            format: self,
            message: message.to_string(),
        }
    }
}

impl<T> ConfigDecoder<T> for Format
where
    T: DeserializeOwned + Validate,
{
    fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let value: T = match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| self.syntax_error(e))?,
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| self.syntax_error(e))?,
            Format::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| self.syntax_error(e))?;
                toml::from_str(text).map_err(|e| self.syntax_error(e))?
            }
        };

        value.validate().map_err(DecodeError::Invalid)?;
        Ok(value)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "toml" => Ok(Format::Toml),
            other => Err(format!("unknown format '{}' (expected json, yaml or toml)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn decode(format: Format, text: &str) -> Result<AppConfig, DecodeError> {
        format.decode(text.as_bytes())
    }

    #[test]
    fn test_all_formats_decode_same_shape() {
        let expected = AppConfig { mode: "a".into(), cache_size: 10 };

        assert_eq!(decode(Format::Json, r#"{"mode": "a", "cacheSize": 10}"#).unwrap(), expected);
        assert_eq!(decode(Format::Yaml, "mode: a\ncacheSize: 10\n").unwrap(), expected);
        assert_eq!(decode(Format::Toml, "mode = \"a\"\ncacheSize = 10\n").unwrap(), expected);
    }

    #[test]
    fn test_malformed_payload() {
        let err = decode(Format::Json, "{\"mode\": ").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { format: Format::Json, .. }));
        assert!(err.to_string().starts_with("malformed JSON payload"));

        let err = decode(Format::Yaml, "mode: [unclosed").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { format: Format::Yaml, .. }));
    }

    #[test]
    fn test_missing_field_is_syntax_error() {
        let err = decode(Format::Json, r#"{"mode": "a"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { .. }));
    }

    #[test]
    fn test_invalid_utf8_toml() {
        let result: Result<AppConfig, _> = Format::Toml.decode(&[0xff, 0xfe]);
        assert!(matches!(result, Err(DecodeError::Syntax { format: Format::Toml, .. })));
    }

    #[test]
    fn test_validation_failure() {
        let err = decode(Format::Json, r#"{"mode": "", "cacheSize": 1}"#).unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: mode: must not be empty");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("app.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("app.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("app.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("app")), Format::Yaml);
        assert_eq!("YML".parse::<Format>(), Ok(Format::Yaml));
    }
}
