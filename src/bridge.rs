//! Conversion of collected OpenTelemetry metrics into metric families.
//!
//! Instrument names are kept as they are, dots included. Making them fit the
//! legacy character set is left to escaping, which depends on what the
//! scraper negotiated.

use std::sync::Arc;

use opentelemetry::KeyValue;
use opentelemetry_sdk::{
    Resource,
    metrics::data::{AggregatedMetrics, Gauge, Histogram, MetricData, ResourceMetrics, Sum},
};

use crate::exporter::ExporterConfig;
use crate::model::{self, Bucket, Metric, MetricFamily, MetricType, Sample};

pub(crate) const TARGET_INFO_NAME: &str = "target_info";
pub(crate) const TARGET_INFO_HELP: &str = "Target metadata";
pub(crate) const SCOPE_NAME_LABEL: &str = "otel_scope_name";

trait Numeric: Copy {
    fn as_f64(self) -> f64;
}

impl Numeric for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

impl Numeric for u64 {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Numeric for i64 {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

pub(crate) fn to_metric_families(
    rm: &ResourceMetrics,
    config: &ExporterConfig,
) -> Vec<Arc<MetricFamily>> {
    let mut families = Vec::new();

    for sm in rm.scope_metrics() {
        let scope = (!config.disable_scope_info).then(|| sm.scope().name());
        for metric in sm.metrics() {
            if let Some(family) = convert_metric(metric, scope) {
                families.push(Arc::new(family));
            }
        }
    }

    if !config.disable_target_info {
        families.push(Arc::new(target_info(rm.resource())));
    }

    families
}

fn target_info(resource: &Resource) -> MetricFamily {
    let mut metric = Metric::new(Sample::Gauge(1.0));
    for (key, value) in resource.iter() {
        metric = metric.with_label(key.to_string(), value.to_string());
    }

    MetricFamily::new(TARGET_INFO_NAME, MetricType::Gauge)
        .with_help(TARGET_INFO_HELP)
        .with_metric(metric)
}

fn convert_metric(
    metric: &opentelemetry_sdk::metrics::data::Metric,
    scope: Option<&str>,
) -> Option<MetricFamily> {
    let (metric_type, metrics) = match metric.data() {
        AggregatedMetrics::F64(data) => convert_data(data, scope),
        AggregatedMetrics::U64(data) => convert_data(data, scope),
        AggregatedMetrics::I64(data) => convert_data(data, scope),
    }?;

    let description = metric.description();
    let help = (!description.is_empty()).then(|| Arc::from(description));

    Some(MetricFamily {
        name: Some(metric.name().to_owned()),
        help,
        metric_type: Some(metric_type),
        metrics,
    })
}

fn convert_data<T: Numeric>(
    data: &MetricData<T>,
    scope: Option<&str>,
) -> Option<(MetricType, Vec<Arc<Metric>>)> {
    match data {
        MetricData::Gauge(gauge) => Some((MetricType::Gauge, convert_gauge(gauge, scope))),
        // Non-monotonic sums can go down, which only a gauge allows
        MetricData::Sum(sum) if sum.is_monotonic() => {
            Some((MetricType::Counter, convert_sum(sum, scope, Sample::Counter)))
        }
        MetricData::Sum(sum) => Some((MetricType::Gauge, convert_sum(sum, scope, Sample::Gauge))),
        MetricData::Histogram(histogram) => Some((
            MetricType::Histogram,
            convert_histogram(histogram, scope),
        )),
        // Unsupported
        MetricData::ExponentialHistogram(_) => None,
    }
}

fn data_point<'a>(
    attributes: impl Iterator<Item = &'a KeyValue>,
    scope: Option<&str>,
    sample: Sample,
) -> Arc<Metric> {
    let mut metric = Metric::new(sample);
    for attr in attributes {
        metric = metric.with_label(attr.key.to_string(), attr.value.to_string());
    }
    if let Some(scope) = scope {
        metric = metric.with_label(SCOPE_NAME_LABEL, scope);
    }
    Arc::new(metric)
}

fn convert_gauge<T: Numeric>(gauge: &Gauge<T>, scope: Option<&str>) -> Vec<Arc<Metric>> {
    gauge
        .data_points()
        .map(|dp| data_point(dp.attributes(), scope, Sample::Gauge(dp.value().as_f64())))
        .collect()
}

fn convert_sum<T: Numeric>(
    sum: &Sum<T>,
    scope: Option<&str>,
    sample: fn(f64) -> Sample,
) -> Vec<Arc<Metric>> {
    sum.data_points()
        .map(|dp| data_point(dp.attributes(), scope, sample(dp.value().as_f64())))
        .collect()
}

fn convert_histogram<T: Numeric>(
    histogram: &Histogram<T>,
    scope: Option<&str>,
) -> Vec<Arc<Metric>> {
    histogram
        .data_points()
        .map(|dp| {
            let mut cumulative = 0;
            let buckets = dp
                .bounds()
                .zip(dp.bucket_counts())
                .map(|(upper_bound, count)| {
                    cumulative += count;
                    Bucket {
                        upper_bound,
                        cumulative_count: cumulative,
                    }
                })
                .collect();

            let sample = Sample::Histogram(model::Histogram {
                sample_count: dp.count(),
                sample_sum: dp.sum().as_f64(),
                buckets,
            });
            data_point(dp.attributes(), scope, sample)
        })
        .collect()
}
