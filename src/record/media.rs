//! Media type tags and payload checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::types::ValidationError;

/// Declared media type of a record payload, e.g. `application/json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType(String);

impl MediaType {
    pub const TEXT: &'static str = "text/plain";
    pub const MARKDOWN: &'static str = "text/markdown";
    pub const JSON: &'static str = "application/json";
    pub const BINARY: &'static str = "application/octet-stream";

    /// Parse and normalize a media type string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase();
        let essence = normalized.split(';').next().unwrap_or_default().trim();

        let valid = match essence.split_once('/') {
            Some((ty, sub)) => {
                !ty.is_empty()
                    && !sub.is_empty()
                    && !sub.contains('/')
                    && !essence.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(ValidationError::MalformedMediaType(value.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn json() -> Self {
        Self(Self::JSON.to_string())
    }

    pub fn text() -> Self {
        Self(Self::TEXT.to_string())
    }

    pub fn binary() -> Self {
        Self(Self::BINARY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type and subtype without parameters.
    pub fn essence(&self) -> &str {
        self.0.split(';').next().unwrap_or_default().trim()
    }

    pub fn is_json(&self) -> bool {
        let essence = self.essence();
        essence == Self::JSON || essence.ends_with("+json")
    }

    pub fn is_text(&self) -> bool {
        self.essence().starts_with("text/")
    }

    /// Check that `payload` can be encoded as this media type.
    pub fn validate_payload(&self, payload: &[u8]) -> Result<(), ValidationError> {
        if payload.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        if self.is_json() {
            serde_json::from_slice::<serde_json::Value>(payload).map_err(|e| {
                ValidationError::InvalidJson {
                    media_type: self.0.clone(),
                    reason: e.to_string(),
                }
            })?;
        } else if self.is_text() && std::str::from_utf8(payload).is_err() {
            return Err(ValidationError::InvalidText {
                media_type: self.0.clone(),
            });
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MediaType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
