//! Prometheus exposition format negotiation and name escaping
//!
//! Prometheus metric and label names used to be restricted to
//! `[a-zA-Z_:][a-zA-Z0-9_:]*`. Newer consumers accept any UTF-8 name, older
//! ones do not, so a producer has to find out what each scraper supports and
//! rewrite names for the ones that need it. This crate provides:
//!
//! - **Name validation**: [`is_valid_legacy_metric_name`] and
//!   [`is_valid_metric_name`], the latter following the configured
//!   [`ValidationScheme`]
//! - **Escaping**: [`escape_name`] and [`escape_metric_family`], with the
//!   four [`EscapingScheme`]s, copying only what actually changes
//! - **Negotiation**: [`Negotiator`] turns an `Accept` header into a
//!   [`Format`], and [`Format::to_escaping_scheme`] reads the scheme back
//! - **Encoding**: an [`Encoder`] for the Prometheus text and OpenMetrics
//!   formats
//! - **OpenTelemetry export**: [`PrometheusExporter`], a metric reader that
//!   serves collected metrics in the negotiated format
//!
//! # Example
//!
//! ```rust
//! use opentelemetry::{KeyValue, metrics::MeterProvider};
//! use opentelemetry_sdk::metrics::SdkMeterProvider;
//! use prometheus_expfmt::{EscapingScheme, NameConfig, PrometheusExporter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = PrometheusExporter::builder()
//!     .with_name_config(NameConfig::new().with_default_escaping_scheme(EscapingScheme::Underscores))
//!     .without_target_info()
//!     .build();
//! let provider = SdkMeterProvider::builder()
//!     .with_reader(exporter.clone())
//!     .build();
//!
//! let meter = provider.meter("example");
//! let counter = meter
//!     .u64_counter("http.server.requests")
//!     .with_description("Number of HTTP server requests")
//!     .build();
//! counter.add(1, &[KeyValue::new("method", "GET")]);
//!
//! // A scraper that understands UTF-8 names gets them as they are
//! let mut buffer = Vec::new();
//! let format = exporter.export_negotiated(
//!     "application/openmetrics-text;version=2.0.0;validation-scheme=utf8",
//!     &mut buffer,
//! )?;
//! assert_eq!(
//!     format.as_str(),
//!     "application/openmetrics-text; version=2.0.0; charset=utf-8; validchars=utf8"
//! );
//!
//! // Others get escaped names
//! let mut buffer = Vec::new();
//! exporter.export_negotiated("text/plain;version=0.0.4", &mut buffer)?;
//! let output = String::from_utf8(buffer)?;
//! assert!(output.contains("http_server_requests{method=\"GET\""));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Everything exchanging metrics with a given peer has to agree on the
//! validation scheme and the default escaping scheme. Either pass a
//! [`NameConfig`] explicitly, or [install](NameConfig::install) one at startup
//! and use the free functions, which read the installed value.

#[deny(clippy::all, clippy::pedantic)]
pub(crate) mod exporter;

mod accept;
mod bridge;
mod config;
mod encode;
mod error;
mod escape;
mod format;
mod model;
mod negotiate;
mod validate;

pub use self::accept::{MediaRange, parse_accept};
pub use self::config::{EscapingScheme, NameConfig, ValidationScheme};
pub use self::encode::Encoder;
pub use self::error::{ConfigError, EncodeError, ParseSchemeError};
pub use self::escape::{escape_metric_family, escape_name, escape_name_bytes};
pub use self::exporter::{ExporterBuilder, PrometheusExporter};
pub use self::format::{
    Format, FormatType, OPEN_METRICS_TYPE, OPEN_METRICS_VERSION_0_0_1,
    OPEN_METRICS_VERSION_1_0_0, OPEN_METRICS_VERSION_2_0_0, PROTO_PROTOCOL, PROTO_TYPE,
    TEXT_TYPE, TEXT_VERSION_0_0_4, TEXT_VERSION_1_0_0, UTF8_VALID, escaping_scheme_to_format,
    format_to_escaping_scheme,
};
pub use self::model::{
    Bucket, Histogram, LabelPair, METRIC_NAME_LABEL, Metric, MetricFamily, MetricType, Quantile,
    Sample, Summary,
};
pub use self::negotiate::{Negotiator, negotiate, negotiate_including_open_metrics};
pub use self::validate::{
    is_valid_legacy_metric_name, is_valid_legacy_metric_name_bytes, is_valid_metric_name,
};
