use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ParseSchemeError};

/// How metric and label names are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationScheme {
    /// Names must match `^[a-zA-Z_:][a-zA-Z0-9_:]*$`.
    #[default]
    Legacy,
    /// Names only need to be non-empty valid UTF-8.
    Utf8,
}

impl ValidationScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Utf8 => "utf8",
        }
    }
}

impl fmt::Display for ValidationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationScheme {
    type Err = ParseSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "utf8" => Ok(Self::Utf8),
            other => Err(ParseSchemeError::new("validation", other)),
        }
    }
}

/// How names that are not legal under the legacy rules get rewritten for
/// consumers that cannot handle UTF-8 names.
///
/// The [`Display`](fmt::Display) and [`FromStr`] forms are the tokens used in
/// the `escaping=` parameter of a content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscapingScheme {
    /// Names are passed through unchanged.
    #[serde(rename = "none")]
    NoEscaping,

    /// Every illegal character becomes `_`.
    #[default]
    #[serde(rename = "underscores")]
    Underscores,

    /// Like [`Underscores`](Self::Underscores), but `.` becomes `_dot_` and
    /// `_` becomes `__`.
    #[serde(rename = "dots")]
    Dots,

    /// The name is prefixed with `U__` and every illegal character is
    /// replaced by its code point in hex, surrounded by underscores.
    #[serde(rename = "values")]
    Values,
}

impl EscapingScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEscaping => "none",
            Self::Underscores => "underscores",
            Self::Dots => "dots",
            Self::Values => "values",
        }
    }
}

impl fmt::Display for EscapingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscapingScheme {
    type Err = ParseSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::NoEscaping),
            "underscores" => Ok(Self::Underscores),
            "dots" => Ok(Self::Dots),
            "values" => Ok(Self::Values),
            other => Err(ParseSchemeError::new("escaping", other)),
        }
    }
}

static GLOBAL: OnceLock<NameConfig> = OnceLock::new();

/// Name handling configuration shared by validation, escaping and
/// negotiation.
///
/// Every component exchanging metrics with a given peer has to agree on these
/// values, so a process usually builds one at startup and either passes it
/// around or [installs](Self::install) it once before serving requests.
///
/// ```rust
/// use prometheus_expfmt::{EscapingScheme, NameConfig, ValidationScheme};
///
/// let config = NameConfig::new()
///     .with_validation_scheme(ValidationScheme::Utf8)
///     .with_default_escaping_scheme(EscapingScheme::Values);
///
/// assert!(config.is_valid_metric_name("http.server.duration"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    pub validation_scheme: ValidationScheme,
    pub default_escaping_scheme: EscapingScheme,
}

impl NameConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validation_scheme: ValidationScheme::Legacy,
            default_escaping_scheme: EscapingScheme::Underscores,
        }
    }

    #[must_use]
    pub const fn with_validation_scheme(mut self, scheme: ValidationScheme) -> Self {
        self.validation_scheme = scheme;
        self
    }

    #[must_use]
    pub const fn with_default_escaping_scheme(mut self, scheme: EscapingScheme) -> Self {
        self.default_escaping_scheme = scheme;
        self
    }

    /// Install this configuration as the process-wide one.
    ///
    /// This should happen once during startup, before anything reads
    /// [`NameConfig::global`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyInstalled`] if a configuration was
    /// installed before. The existing configuration is kept.
    pub fn install(self) -> Result<(), ConfigError> {
        GLOBAL.set(self).map_err(|_| ConfigError::AlreadyInstalled)?;
        tracing::debug!(
            validation_scheme = %self.validation_scheme,
            default_escaping_scheme = %self.default_escaping_scheme,
            "installed process-wide name configuration"
        );
        Ok(())
    }

    /// The installed process-wide configuration, or the default one if
    /// nothing was installed.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.get().copied().unwrap_or_default()
    }
}
