use std::sync::{Arc, Weak};

use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::data::ResourceMetrics;
use opentelemetry_sdk::metrics::reader::MetricReader;
use opentelemetry_sdk::metrics::{ManualReader, ManualReaderBuilder, Pipeline};

use crate::bridge::to_metric_families;
use crate::config::NameConfig;
use crate::encode::Encoder;
use crate::error::EncodeError;
use crate::format::Format;
use crate::negotiate::Negotiator;

/// What the exporter adds on top of the collected metrics
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExporterConfig {
    pub disable_target_info: bool,
    pub disable_scope_info: bool,
}

#[derive(Clone, Debug)]
pub struct PrometheusExporter {
    inner: Arc<ManualReader>,
    config: ExporterConfig,
    negotiator: Negotiator,
}

impl MetricReader for PrometheusExporter {
    fn register_pipeline(&self, pipeline: Weak<Pipeline>) {
        self.inner.register_pipeline(pipeline);
    }

    fn collect(&self, rm: &mut ResourceMetrics) -> OTelSdkResult {
        self.inner.collect(rm)
    }

    fn force_flush(&self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn shutdown_with_timeout(&self, timeout: std::time::Duration) -> OTelSdkResult {
        self.inner.shutdown_with_timeout(timeout)
    }

    fn temporality(
        &self,
        kind: opentelemetry_sdk::metrics::InstrumentKind,
    ) -> opentelemetry_sdk::metrics::Temporality {
        self.inner.temporality(kind)
    }
}

impl PrometheusExporter {
    /// Create a new exporter with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new exporter builder
    #[must_use]
    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::default()
    }

    /// The name configuration used for negotiation and escaping.
    #[must_use]
    pub fn name_config(&self) -> &NameConfig {
        self.negotiator.config()
    }

    /// Export the collected metrics to the given writer, in the legacy text
    /// format escaped with the default escaping scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or the writer fails.
    pub fn export<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let format =
            Format::TEXT_0_0_4.with_escaping_scheme(self.name_config().default_escaping_scheme);
        self.export_with_format(&format, writer)
            .map_err(|err| match err {
                EncodeError::Io(err) => err,
                other => std::io::Error::other(other),
            })
    }

    /// Export the collected metrics in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnsupportedFormat`] for formats other than the
    /// text ones, or an error if the collection or the writer fails.
    ///
    /// # Panics
    ///
    /// Panics if the format carries an unknown `escaping=` token.
    pub fn export_with_format<W: std::io::Write>(
        &self,
        format: &Format,
        writer: &mut W,
    ) -> Result<(), EncodeError> {
        let mut encoder = Encoder::with_config(writer, format.clone(), self.name_config())?;

        let mut rm = ResourceMetrics::default();
        self.inner
            .collect(&mut rm)
            .map_err(std::io::Error::other)?;

        let families = to_metric_families(&rm, &self.config);
        tracing::debug!(families = families.len(), %format, "exporting metrics");
        for family in &families {
            encoder.encode(family)?;
        }
        encoder.finish()?;
        Ok(())
    }

    /// Negotiate a format from an `Accept` header value, then export the
    /// collected metrics in it.
    ///
    /// The returned format is meant to be sent back as the `Content-Type` of
    /// the response. Protobuf formats cannot be written by this exporter, so
    /// protobuf offers are skipped and the negotiation picks among the
    /// OpenMetrics and plain text offers.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or the writer fails.
    pub fn export_negotiated<W: std::io::Write>(
        &self,
        accept: &str,
        writer: &mut W,
    ) -> Result<Format, EncodeError> {
        let format = self.negotiator.negotiate_text(accept);
        self.export_with_format(&format, writer)?;
        Ok(format)
    }
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring [`PrometheusExporter`].
///
/// # Configuration Options
///
/// ## Name handling
/// - [`with_name_config()`]: Sets the validation scheme and the default
///   escaping scheme used when the scraper does not ask for one. Defaults to
///   [`NameConfig::global()`] at build time.
///
/// ## Resource Information
/// - [`without_target_info()`]: Disables the `target_info` metric that contains
///   resource attributes
///
/// ## Scope Information
/// - [`without_scope_info()`]: Disables the `otel_scope_name` label on every
///   metric point
///
/// # Example Usage
///
/// ```rust
/// use prometheus_expfmt::{EscapingScheme, NameConfig, PrometheusExporter};
///
/// # fn main() {
/// let exporter = PrometheusExporter::builder()
///     .with_name_config(NameConfig::new().with_default_escaping_scheme(EscapingScheme::Dots))
///     .without_scope_info()
///     .build();
///
/// assert_eq!(exporter.name_config().default_escaping_scheme, EscapingScheme::Dots);
/// # }
/// ```
///
/// [`with_name_config()`]: ExporterBuilder::with_name_config
/// [`without_target_info()`]: ExporterBuilder::without_target_info
/// [`without_scope_info()`]: ExporterBuilder::without_scope_info
#[derive(Default)]
pub struct ExporterBuilder {
    disable_target_info: bool,
    disable_scope_info: bool,
    name_config: Option<NameConfig>,
    reader: ManualReaderBuilder,
}

impl std::fmt::Debug for ExporterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterBuilder")
            .field("disable_target_info", &self.disable_target_info)
            .field("disable_scope_info", &self.disable_scope_info)
            .field("name_config", &self.name_config)
            .finish_non_exhaustive()
    }
}

impl ExporterBuilder {
    /// Sets the name configuration instead of using the process-wide one.
    #[must_use]
    pub fn with_name_config(mut self, name_config: NameConfig) -> Self {
        self.name_config = Some(name_config);
        self
    }

    /// Configures the exporter to not export the resource `target_info` metric.
    ///
    /// If not specified, the exporter will create a `target_info` metric
    /// containing the metrics' [Resource] attributes.
    ///
    /// [Resource]: opentelemetry_sdk::Resource
    #[must_use]
    pub fn without_target_info(mut self) -> Self {
        self.disable_target_info = true;
        self
    }

    /// Configures the exporter to not add the `otel_scope_name` label.
    #[must_use]
    pub fn without_scope_info(mut self) -> Self {
        self.disable_scope_info = true;
        self
    }

    /// Creates a new [`PrometheusExporter`] from this configuration.
    #[must_use]
    pub fn build(self) -> PrometheusExporter {
        let inner = Arc::new(self.reader.build());

        let config = ExporterConfig {
            disable_target_info: self.disable_target_info,
            disable_scope_info: self.disable_scope_info,
        };

        let negotiator = Negotiator::new(self.name_config.unwrap_or_else(NameConfig::global));

        PrometheusExporter {
            inner,
            config,
            negotiator,
        }
    }
}
