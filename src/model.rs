//! In-memory metric families, shaped after `io.prometheus.client.MetricFamily`.
//!
//! Sub-structures are held behind [`Arc`] so that transformations such as
//! [`escape_metric_family`](crate::escape_metric_family) can hand back the
//! parts they did not touch without copying them. Nothing in this module is
//! ever mutated through a shared handle.

use std::sync::Arc;

/// Reserved label holding the metric name when a name is label-encoded.
pub const METRIC_NAME_LABEL: &str = "__name__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Summary,
    Untyped,
    Histogram,
}

impl MetricType {
    /// The type as written on a `# TYPE` line of the Prometheus text format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
            Self::Untyped => "untyped",
            Self::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricFamily {
    pub name: Option<String>,
    pub help: Option<Arc<str>>,
    pub metric_type: Option<MetricType>,
    pub metrics: Vec<Arc<Metric>>,
}

impl MetricFamily {
    #[must_use]
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: Some(name.into()),
            help: None,
            metric_type: Some(metric_type),
            metrics: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<Arc<str>>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<Arc<Metric>>) -> Self {
        self.metrics.push(metric.into());
        self
    }

    /// The family name, or an empty string when it is not set.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// One time series of a family: its labels and a single sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub labels: Vec<Arc<LabelPair>>,
    pub sample: Arc<Sample>,
    pub timestamp_ms: Option<i64>,
}

impl Metric {
    #[must_use]
    pub fn new(sample: Sample) -> Self {
        Self {
            labels: Vec::new(),
            sample: Arc::new(sample),
            timestamp_ms: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(Arc::new(LabelPair::new(name, value)));
        self
    }

    #[must_use]
    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelPair {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl LabelPair {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Counter(f64),
    Gauge(f64),
    Untyped(f64),
    Summary(Summary),
    Histogram(Histogram),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub sample_count: u64,
    pub sample_sum: f64,
    pub quantiles: Vec<Quantile>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    pub sample_count: u64,
    pub sample_sum: f64,
    /// Buckets in increasing upper bound order with cumulative counts. The
    /// `+Inf` bucket is implied by `sample_count`.
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}
