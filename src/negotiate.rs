use crate::accept::{MediaRange, parse_accept};
use crate::config::{EscapingScheme, NameConfig};
use crate::format::{
    Format, OPEN_METRICS_TYPE, OPEN_METRICS_VERSION_0_0_1, OPEN_METRICS_VERSION_1_0_0,
    OPEN_METRICS_VERSION_2_0_0, PROTO_PROTOCOL, PROTO_TYPE, TEXT_TYPE, TEXT_VERSION_1_0_0,
    UTF8_VALID,
};

/// Picks an exposition format and escaping scheme from an `Accept` header.
///
/// Offers are tried from most to least preferred. The first one matching a
/// supported format wins, in this order of precedence for a single offer:
/// protobuf, OpenMetrics (only with
/// [`negotiate_including_open_metrics`](Self::negotiate_including_open_metrics)),
/// then plain text. If nothing matches, the legacy text format is used.
///
/// The chosen format is then annotated with either `validchars=utf8`, when the
/// offer asked for `validation-scheme=utf8` and the format can carry UTF-8
/// names, or `escaping=<scheme>`, from the offer's `escaping` parameter or
/// the configured default.
///
/// ```rust
/// use prometheus_expfmt::{EscapingScheme, NameConfig, Negotiator};
///
/// let negotiator = Negotiator::new(
///     NameConfig::new().with_default_escaping_scheme(EscapingScheme::Underscores),
/// );
///
/// let format = negotiator.negotiate("text/plain;version=1.0.0;validation-scheme=utf8");
/// assert_eq!(format.as_str(), "text/plain; version=1.0.0; charset=utf-8; validchars=utf8");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negotiator {
    config: NameConfig,
}

impl Negotiator {
    #[must_use]
    pub const fn new(config: NameConfig) -> Self {
        Self { config }
    }

    /// A negotiator using the process-wide [`NameConfig`].
    #[must_use]
    pub fn global() -> Self {
        Self::new(NameConfig::global())
    }

    #[must_use]
    pub const fn config(&self) -> &NameConfig {
        &self.config
    }

    /// Negotiates among the protobuf and plain text formats.
    #[must_use]
    pub fn negotiate(&self, accept: &str) -> Format {
        self.negotiate_with(accept, Offered::PROTOBUF_AND_TEXT)
    }

    /// Negotiates among the protobuf, OpenMetrics and plain text formats.
    #[must_use]
    pub fn negotiate_including_open_metrics(&self, accept: &str) -> Format {
        self.negotiate_with(accept, Offered::ALL)
    }

    /// Negotiates among the OpenMetrics and plain text formats only, for
    /// producers without a protobuf encoder.
    pub(crate) fn negotiate_text(&self, accept: &str) -> Format {
        self.negotiate_with(accept, Offered::TEXT)
    }

    /// The escaping scheme a negotiated format was annotated with.
    ///
    /// A format without annotation maps to the configured default scheme.
    ///
    /// # Panics
    ///
    /// Panics if the format carries an unknown `escaping=` token, which
    /// negotiation never produces.
    #[must_use]
    pub fn format_to_escaping_scheme(&self, format: &Format) -> EscapingScheme {
        match format.try_escaping_scheme(&self.config) {
            Ok(scheme) => scheme,
            Err(err) => panic!("invalid format {format}: {err}"),
        }
    }

    fn negotiate_with(&self, accept: &str, offered: Offered) -> Format {
        for offer in parse_accept(accept) {
            let Some(candidate) = match_offer(&offer, offered) else {
                continue;
            };
            let format = self.annotate(&offer, candidate);
            tracing::debug!(accept, %format, "negotiated exposition format");
            return format;
        }

        let format = Format::TEXT_0_0_4.with_escaping_scheme(self.config.default_escaping_scheme);
        tracing::debug!(accept, %format, "no acceptable offer, using the default format");
        format
    }

    fn annotate(&self, offer: &MediaRange, candidate: Candidate) -> Format {
        if offer.param("validation-scheme") == Some(UTF8_VALID) {
            if candidate.utf8_names {
                return candidate.format.with_utf8_names();
            }
            tracing::debug!(
                format = %candidate.format,
                "format does not support UTF-8 names, escaping them instead"
            );
        }

        let scheme = match offer.param("escaping") {
            None => self.config.default_escaping_scheme,
            Some(token) => token.parse().unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring escaping parameter of Accept offer");
                self.config.default_escaping_scheme
            }),
        };
        candidate.format.with_escaping_scheme(scheme)
    }
}

/// Format families a negotiation may pick from. Plain text is always offered.
#[derive(Debug, Clone, Copy)]
struct Offered {
    protobuf: bool,
    open_metrics: bool,
}

impl Offered {
    const ALL: Self = Self {
        protobuf: true,
        open_metrics: true,
    };
    const PROTOBUF_AND_TEXT: Self = Self {
        protobuf: true,
        open_metrics: false,
    };
    const TEXT: Self = Self {
        protobuf: false,
        open_metrics: true,
    };
}

/// A supported format matched by an offer, before annotation.
struct Candidate {
    format: Format,
    utf8_names: bool,
}

impl Candidate {
    const fn new(format: Format, utf8_names: bool) -> Self {
        Self { format, utf8_names }
    }
}

fn match_offer(offer: &MediaRange, offered: Offered) -> Option<Candidate> {
    if offered.protobuf && offer.is(PROTO_TYPE) {
        if offer.param("proto") != Some(PROTO_PROTOCOL) {
            return None;
        }
        return match offer.param("encoding") {
            Some("delimited") => Some(Candidate::new(Format::PROTO_DELIM, true)),
            Some("text") => Some(Candidate::new(Format::PROTO_TEXT, true)),
            Some("compact-text") => Some(Candidate::new(Format::PROTO_COMPACT, true)),
            _ => None,
        };
    }

    if offered.open_metrics && offer.is(OPEN_METRICS_TYPE) {
        return match offer.param("version").unwrap_or_default() {
            "" | OPEN_METRICS_VERSION_0_0_1 => Some(Candidate::new(Format::OPEN_METRICS_0_0_1, false)),
            OPEN_METRICS_VERSION_1_0_0 => Some(Candidate::new(Format::OPEN_METRICS_1_0_0, false)),
            OPEN_METRICS_VERSION_2_0_0 => Some(Candidate::new(Format::OPEN_METRICS_2_0_0, true)),
            version => {
                tracing::debug!(version, "unsupported OpenMetrics version");
                None
            }
        };
    }

    if offer.is(TEXT_TYPE) {
        return Some(match offer.param("version") {
            Some(TEXT_VERSION_1_0_0) => Candidate::new(Format::TEXT_1_0_0, true),
            _ => Candidate::new(Format::TEXT_0_0_4, false),
        });
    }

    None
}

/// Negotiates among the protobuf and plain text formats with the
/// process-wide [`NameConfig`].
#[must_use]
pub fn negotiate(accept: &str) -> Format {
    Negotiator::global().negotiate(accept)
}

/// Negotiates among the protobuf, OpenMetrics and plain text formats with the
/// process-wide [`NameConfig`].
#[must_use]
pub fn negotiate_including_open_metrics(accept: &str) -> Format {
    Negotiator::global().negotiate_including_open_metrics(accept)
}
