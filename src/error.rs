use thiserror::Error;

use crate::format::Format;

/// Returned when a scheme token does not name a known scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} scheme {token:?}")]
pub struct ParseSchemeError {
    pub(crate) kind: &'static str,
    pub(crate) token: String,
}

impl ParseSchemeError {
    pub(crate) fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_owned(),
        }
    }

    /// The token that failed to parse.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("the process-wide name configuration was already installed")]
    AlreadyInstalled,
}

/// Errors produced while writing metric families.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("metric family has no name")]
    MissingName,

    /// The format has no encoder in this crate (protobuf formats, or a
    /// content type that is not recognized at all).
    #[error("no encoder for format {0}")]
    UnsupportedFormat(Format),
}
