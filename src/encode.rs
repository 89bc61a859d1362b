//! Text encoders for the Prometheus and OpenMetrics exposition formats.

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use crate::config::{EscapingScheme, NameConfig};
use crate::error::EncodeError;
use crate::escape::{escape_metric_family, escape_name};
use crate::format::{Format, FormatType};
use crate::model::{Histogram, LabelPair, MetricFamily, MetricType, Sample, Summary};
use crate::validate::is_valid_legacy_metric_name;

trait Numeric: Copy {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
}

impl Numeric for f64 {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.is_nan() {
            writer.write_all(b"NaN")
        } else if self.is_infinite() {
            writer.write_all(if self.is_sign_positive() { b"+Inf" } else { b"-Inf" })
        } else {
            write!(writer, "{self}")
        }
    }
}

impl Numeric for u64 {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(writer, "{self}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Prometheus,
    OpenMetrics,
}

/// Writes metric families in a negotiated text format.
///
/// Families are escaped with the scheme carried by the format before being
/// written, so the output matches what the peer asked for.
///
/// ```rust
/// use std::sync::Arc;
/// use prometheus_expfmt::{Encoder, Format, Metric, MetricFamily, MetricType, Sample};
///
/// # fn main() -> Result<(), prometheus_expfmt::EncodeError> {
/// let family = Arc::new(
///     MetricFamily::new("foo.metric", MetricType::Untyped)
///         .with_metric(Metric::new(Sample::Untyped(1.234))),
/// );
///
/// let format = Format::TEXT_0_0_4.with_escaping_scheme(prometheus_expfmt::EscapingScheme::Underscores);
/// let mut encoder = Encoder::new(Vec::new(), format)?;
/// encoder.encode(&family)?;
/// let output = encoder.finish()?;
///
/// assert_eq!(output, b"# TYPE foo_metric untyped\nfoo_metric 1.234\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Encoder<W> {
    writer: W,
    format: Format,
    scheme: EscapingScheme,
    dialect: Dialect,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder, reading the escaping scheme with the process-wide
    /// [`NameConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnsupportedFormat`] unless the format is one of
    /// the text formats.
    ///
    /// # Panics
    ///
    /// Panics if the format carries an unknown `escaping=` token, see
    /// [`Format::to_escaping_scheme`].
    pub fn new(writer: W, format: Format) -> Result<Self, EncodeError> {
        Self::with_config(writer, format, &NameConfig::global())
    }

    /// Creates an encoder, falling back to the default scheme of `config`
    /// when the format has no escaping annotation.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnsupportedFormat`] unless the format is one of
    /// the text formats.
    ///
    /// # Panics
    ///
    /// Panics if the format carries an unknown `escaping=` token.
    pub fn with_config(writer: W, format: Format, config: &NameConfig) -> Result<Self, EncodeError> {
        let dialect = match format.content_type() {
            FormatType::TextPlain => Dialect::Prometheus,
            FormatType::OpenMetrics => Dialect::OpenMetrics,
            FormatType::ProtoDelim
            | FormatType::ProtoText
            | FormatType::ProtoCompact
            | FormatType::Unknown => return Err(EncodeError::UnsupportedFormat(format)),
        };

        let scheme = match format.try_escaping_scheme(config) {
            Ok(scheme) => scheme,
            Err(err) => panic!("invalid format {format}: {err}"),
        };

        Ok(Self {
            writer,
            format,
            scheme,
            dialect,
        })
    }

    #[must_use]
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Escapes and writes one family.
    ///
    /// # Errors
    ///
    /// Returns an error if the family has no name or the writer fails.
    pub fn encode(&mut self, family: &Arc<MetricFamily>) -> Result<(), EncodeError> {
        let family = escape_metric_family(family, self.scheme);
        if family.name().is_empty() {
            return Err(EncodeError::MissingName);
        }

        match self.dialect {
            Dialect::Prometheus => self.write_prometheus(&family)?,
            Dialect::OpenMetrics => self.write_open_metrics(&family)?,
        }
        Ok(())
    }

    /// Writes the trailer the format needs, if any, and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn finish(mut self) -> Result<W, EncodeError> {
        if self.dialect == Dialect::OpenMetrics {
            self.writer.write_all(b"# EOF\n")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_prometheus(&mut self, family: &MetricFamily) -> std::io::Result<()> {
        let name = family.name();
        let metric_type = family.metric_type.unwrap_or(MetricType::Untyped);
        let writer = &mut self.writer;

        if let Some(help) = family.help.as_deref() {
            writer.write_all(b"# HELP ")?;
            write_name(name, writer)?;
            writer.write_all(b" ")?;
            write_escaped(help, false, writer)?;
            writer.write_all(b"\n")?;
        }

        writer.write_all(b"# TYPE ")?;
        write_name(name, writer)?;
        writer.write_all(b" ")?;
        writer.write_all(metric_type.as_str().as_bytes())?;
        writer.write_all(b"\n")?;

        for metric in &family.metrics {
            let series = Series {
                name,
                labels: &metric.labels,
                timestamp: metric.timestamp_ms.map(Timestamp::Millis),
                scheme: self.scheme,
            };
            write_metric(&series, "", &metric.sample, writer)?;
        }

        Ok(())
    }

    fn write_open_metrics(&mut self, family: &MetricFamily) -> std::io::Result<()> {
        let metric_type = family.metric_type.unwrap_or(MetricType::Untyped);
        let name = family.name();
        // Counter metadata names the family without its sample suffix
        let name = match metric_type {
            MetricType::Counter => name.strip_suffix("_total").unwrap_or(name),
            _ => name,
        };
        let writer = &mut self.writer;

        writer.write_all(b"# TYPE ")?;
        write_name(name, writer)?;
        writer.write_all(b" ")?;
        writer.write_all(match metric_type {
            MetricType::Untyped => b"unknown".as_slice(),
            other => other.as_str().as_bytes(),
        })?;
        writer.write_all(b"\n")?;

        if let Some(help) = family.help.as_deref() {
            writer.write_all(b"# HELP ")?;
            write_name(name, writer)?;
            writer.write_all(b" ")?;
            write_escaped(help, true, writer)?;
            writer.write_all(b"\n")?;
        }

        let suffix = if metric_type == MetricType::Counter {
            "_total"
        } else {
            ""
        };
        for metric in &family.metrics {
            #[allow(clippy::cast_precision_loss)]
            let timestamp = metric
                .timestamp_ms
                .map(|ms| Timestamp::Seconds(ms as f64 / 1000.0));
            let series = Series {
                name,
                labels: &metric.labels,
                timestamp,
                scheme: self.scheme,
            };
            write_metric(&series, suffix, &metric.sample, writer)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Timestamp {
    Millis(i64),
    Seconds(f64),
}

/// What every sample line of one metric shares.
struct Series<'a> {
    name: &'a str,
    labels: &'a [Arc<LabelPair>],
    timestamp: Option<Timestamp>,
    scheme: EscapingScheme,
}

fn write_metric<W: Write>(
    series: &Series<'_>,
    counter_suffix: &str,
    sample: &Sample,
    writer: &mut W,
) -> std::io::Result<()> {
    match sample {
        Sample::Counter(value) => write_sample(series, counter_suffix, None, *value, writer),
        Sample::Gauge(value) | Sample::Untyped(value) => {
            write_sample(series, "", None, *value, writer)
        }
        Sample::Summary(summary) => write_summary(series, summary, writer),
        Sample::Histogram(histogram) => write_histogram(series, histogram, writer),
    }
}

fn write_summary<W: Write>(
    series: &Series<'_>,
    summary: &Summary,
    writer: &mut W,
) -> std::io::Result<()> {
    for quantile in &summary.quantiles {
        let extra_label = Some(("quantile", quantile.quantile));
        write_sample(series, "", extra_label, quantile.value, writer)?;
    }
    write_sample(series, "_sum", None, summary.sample_sum, writer)?;
    write_sample(series, "_count", None, summary.sample_count, writer)
}

fn write_histogram<W: Write>(
    series: &Series<'_>,
    histogram: &Histogram,
    writer: &mut W,
) -> std::io::Result<()> {
    let mut has_inf = false;
    for bucket in &histogram.buckets {
        has_inf |= bucket.upper_bound.is_infinite() && bucket.upper_bound.is_sign_positive();
        let extra_label = Some(("le", bucket.upper_bound));
        write_sample(series, "_bucket", extra_label, bucket.cumulative_count, writer)?;
    }
    if !has_inf {
        let extra_label = Some(("le", f64::INFINITY));
        write_sample(series, "_bucket", extra_label, histogram.sample_count, writer)?;
    }
    write_sample(series, "_sum", None, histogram.sample_sum, writer)?;
    write_sample(series, "_count", None, histogram.sample_count, writer)
}

fn write_sample<T: Numeric, W: Write>(
    series: &Series<'_>,
    suffix: &str,
    extra_label: Option<(&str, f64)>,
    value: T,
    writer: &mut W,
) -> std::io::Result<()> {
    let name = series.name;
    let quoted = !is_valid_legacy_metric_name(name);
    if quoted {
        // UTF-8 names move inside the braces: {"my.metric",label="value"}
        writer.write_all(b"{\"")?;
        write_escaped(name, true, writer)?;
        write_escaped(suffix, true, writer)?;
        writer.write_all(b"\"")?;
    } else {
        writer.write_all(name.as_bytes())?;
        writer.write_all(suffix.as_bytes())?;
    }

    let mut has_written = quoted;
    for label in series.labels {
        write_label_separator(&mut has_written, writer)?;
        write_name(&label_name(label.name(), series.scheme), writer)?;
        writer.write_all(b"=\"")?;
        write_escaped(label.value(), true, writer)?;
        writer.write_all(b"\"")?;
    }
    if let Some((label, bound)) = extra_label {
        write_label_separator(&mut has_written, writer)?;
        writer.write_all(label.as_bytes())?;
        writer.write_all(b"=\"")?;
        bound.serialize(writer)?;
        writer.write_all(b"\"")?;
    }
    if has_written {
        writer.write_all(b"}")?;
    }

    writer.write_all(b" ")?;
    value.serialize(writer)?;

    match series.timestamp {
        Some(Timestamp::Millis(ms)) => write!(writer, " {ms}")?,
        Some(Timestamp::Seconds(seconds)) => {
            writer.write_all(b" ")?;
            seconds.serialize(writer)?;
        }
        None => {}
    }

    writer.write_all(b"\n")
}

/// Label names that are still illegal after family escaping, because the
/// metric was kept for having only legal values, get escaped here.
fn label_name(name: &str, scheme: EscapingScheme) -> Cow<'_, str> {
    if scheme == EscapingScheme::NoEscaping || is_valid_legacy_metric_name(name) {
        Cow::Borrowed(name)
    } else {
        escape_name(name, scheme)
    }
}

fn write_label_separator<W: Write>(has_written: &mut bool, writer: &mut W) -> std::io::Result<()> {
    if *has_written {
        writer.write_all(b",")
    } else {
        *has_written = true;
        writer.write_all(b"{")
    }
}

fn write_name<W: Write>(name: &str, writer: &mut W) -> std::io::Result<()> {
    if is_valid_legacy_metric_name(name) {
        writer.write_all(name.as_bytes())
    } else {
        writer.write_all(b"\"")?;
        write_escaped(name, true, writer)?;
        writer.write_all(b"\"")
    }
}

/// Escapes `\` and newlines, and `"` when `quotes` is set.
fn write_escaped<W: Write>(value: &str, quotes: bool, writer: &mut W) -> std::io::Result<()> {
    let mut start = 0;
    for (index, c) in value.char_indices() {
        let replacement: &[u8] = match c {
            '\\' => b"\\\\",
            '\n' => b"\\n",
            '"' if quotes => b"\\\"",
            _ => continue,
        };
        writer.write_all(&value.as_bytes()[start..index])?;
        writer.write_all(replacement)?;
        start = index + c.len_utf8();
    }
    writer.write_all(&value.as_bytes()[start..])
}
