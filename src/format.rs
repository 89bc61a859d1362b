//! Exposition format identifiers.
//!
//! A [`Format`] is the content type of a response, e.g.
//! `text/plain; version=0.0.4; charset=utf-8; escaping=underscores`. Peers
//! compare these strings, so the constants here are exact.

use std::borrow::Cow;
use std::fmt;

use crate::accept::{MediaRange, split_params};
use crate::config::{EscapingScheme, NameConfig};
use crate::error::ParseSchemeError;

pub const TEXT_VERSION_0_0_4: &str = "0.0.4";
pub const TEXT_VERSION_1_0_0: &str = "1.0.0";
pub const OPEN_METRICS_VERSION_0_0_1: &str = "0.0.1";
pub const OPEN_METRICS_VERSION_1_0_0: &str = "1.0.0";
pub const OPEN_METRICS_VERSION_2_0_0: &str = "2.0.0";

pub const TEXT_TYPE: &str = "text/plain";
pub const PROTO_TYPE: &str = "application/vnd.google.protobuf";
pub const PROTO_PROTOCOL: &str = "io.prometheus.client.MetricFamily";
pub const OPEN_METRICS_TYPE: &str = "application/openmetrics-text";

/// Value of `validchars` (and of the `validation-scheme` request parameter)
/// meaning names are not escaped.
pub const UTF8_VALID: &str = "utf8";

/// Content type of a metrics exposition, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Format(Cow<'static, str>);

impl Format {
    pub const UNKNOWN: Self = Self::from_static("<unknown>");
    pub const TEXT_0_0_4: Self = Self::from_static("text/plain; version=0.0.4; charset=utf-8");
    pub const TEXT_1_0_0: Self = Self::from_static("text/plain; version=1.0.0; charset=utf-8");
    pub const PROTO_DELIM: Self = Self::from_static(
        "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=delimited",
    );
    pub const PROTO_TEXT: Self = Self::from_static(
        "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=text",
    );
    pub const PROTO_COMPACT: Self = Self::from_static(
        "application/vnd.google.protobuf; proto=io.prometheus.client.MetricFamily; encoding=compact-text",
    );
    pub const OPEN_METRICS_0_0_1: Self =
        Self::from_static("application/openmetrics-text; version=0.0.1; charset=utf-8");
    pub const OPEN_METRICS_1_0_0: Self =
        Self::from_static("application/openmetrics-text; version=1.0.0; charset=utf-8");
    pub const OPEN_METRICS_2_0_0: Self =
        Self::from_static("application/openmetrics-text; version=2.0.0; charset=utf-8");

    #[must_use]
    pub const fn from_static(format: &'static str) -> Self {
        Self(Cow::Borrowed(format))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends `; validchars=utf8`.
    #[must_use]
    pub fn with_utf8_names(self) -> Self {
        Self(Cow::Owned(format!("{self}; validchars={UTF8_VALID}")))
    }

    /// Appends `; escaping=<scheme>`.
    #[must_use]
    pub fn with_escaping_scheme(self, scheme: EscapingScheme) -> Self {
        Self(Cow::Owned(format!(
            "{self}; escaping={}",
            escaping_scheme_to_format(scheme)
        )))
    }

    /// Classifies the format by its base type and parameters.
    #[must_use]
    pub fn content_type(&self) -> FormatType {
        let Some(range) = MediaRange::parse(self.as_str()) else {
            return FormatType::Unknown;
        };

        if range.is(PROTO_TYPE) {
            if range.param("proto") != Some(PROTO_PROTOCOL) {
                return FormatType::Unknown;
            }
            return match range.param("encoding") {
                Some("delimited") => FormatType::ProtoDelim,
                Some("text") => FormatType::ProtoText,
                Some("compact-text") => FormatType::ProtoCompact,
                _ => FormatType::Unknown,
            };
        }

        let utf8_charset = range.param("charset") == Some("utf-8");
        if range.is(OPEN_METRICS_TYPE) && utf8_charset {
            FormatType::OpenMetrics
        } else if range.is(TEXT_TYPE) && utf8_charset {
            FormatType::TextPlain
        } else {
            FormatType::Unknown
        }
    }

    /// The escaping scheme this format was negotiated with.
    ///
    /// `validchars=utf8` means [`EscapingScheme::NoEscaping`]; otherwise the
    /// `escaping=` parameter decides. Formats carrying neither use the
    /// default scheme of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `escaping=` parameter names no known scheme.
    pub fn try_escaping_scheme(
        &self,
        config: &NameConfig,
    ) -> Result<EscapingScheme, ParseSchemeError> {
        for (key, value) in split_params(self.as_str()) {
            if key == "validchars" && value == UTF8_VALID {
                return Ok(EscapingScheme::NoEscaping);
            }
            if key == "escaping" {
                return value.parse();
            }
        }
        Ok(config.default_escaping_scheme)
    }

    /// Same as [`try_escaping_scheme`](Self::try_escaping_scheme) with the
    /// process-wide [`NameConfig`].
    ///
    /// # Panics
    ///
    /// Panics if the `escaping=` parameter names no known scheme. Formats
    /// coming out of negotiation never do; anything else is a bug in the
    /// caller.
    #[must_use]
    pub fn to_escaping_scheme(&self) -> EscapingScheme {
        match self.try_escaping_scheme(&NameConfig::global()) {
            Ok(scheme) => scheme,
            Err(err) => panic!("invalid format {self}: {err}"),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Format {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for Format {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&'static str> for Format {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    Unknown,
    ProtoCompact,
    ProtoDelim,
    ProtoText,
    TextPlain,
    OpenMetrics,
}

/// The token used for `scheme` in an `escaping=` parameter.
#[must_use]
pub const fn escaping_scheme_to_format(scheme: EscapingScheme) -> &'static str {
    scheme.as_str()
}

/// Maps a finalized format back to its escaping scheme, using the
/// process-wide [`NameConfig`] for formats without an escaping annotation.
///
/// # Panics
///
/// See [`Format::to_escaping_scheme`].
#[must_use]
pub fn format_to_escaping_scheme(format: &Format) -> EscapingScheme {
    format.to_escaping_scheme()
}
