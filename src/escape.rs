use std::borrow::Cow;
use std::sync::Arc;

use crate::config::EscapingScheme;
use crate::model::{LabelPair, METRIC_NAME_LABEL, Metric, MetricFamily};
use crate::validate::{is_legacy_valid_char, is_valid_legacy_metric_name};

/// Escapes `name` with the given scheme.
///
/// Names are only copied when the scheme changes them: [`NoEscaping`] never
/// does, [`Underscores`] and [`Values`] leave legacy-legal names alone, and
/// [`Dots`] always rewrites, since it also recodes `_` and `.`.
///
/// No validation happens here; an empty name is returned as is.
///
/// ```rust
/// use prometheus_expfmt::{EscapingScheme, escape_name};
///
/// assert_eq!(escape_name("foo.metric", EscapingScheme::Underscores), "foo_metric");
/// assert_eq!(escape_name("foo.metric", EscapingScheme::Dots), "foo_dot_metric");
/// assert_eq!(escape_name("http.status:200", EscapingScheme::Values), "U__http_002e_status:200");
/// ```
///
/// [`NoEscaping`]: EscapingScheme::NoEscaping
/// [`Underscores`]: EscapingScheme::Underscores
/// [`Dots`]: EscapingScheme::Dots
/// [`Values`]: EscapingScheme::Values
#[must_use]
pub fn escape_name(name: &str, scheme: EscapingScheme) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed(name);
    }

    match scheme {
        EscapingScheme::NoEscaping => Cow::Borrowed(name),
        EscapingScheme::Underscores | EscapingScheme::Values
            if is_valid_legacy_metric_name(name) =>
        {
            Cow::Borrowed(name)
        }
        EscapingScheme::Underscores | EscapingScheme::Dots | EscapingScheme::Values => {
            let mut escaped = start_escaped(name.len(), scheme);
            for (index, c) in name.chars().enumerate() {
                push_escaped_char(&mut escaped, c, index, scheme);
            }
            Cow::Owned(escaped)
        }
    }
}

/// Like [`escape_name`], for names that may contain invalid UTF-8.
///
/// Every invalid byte is treated as one illegal character: `_` for
/// [`Underscores`](EscapingScheme::Underscores) and
/// [`Dots`](EscapingScheme::Dots), `_FFFD_` for
/// [`Values`](EscapingScheme::Values). [`NoEscaping`] replaces invalid
/// sequences with U+FFFD, since the result has to be a `str`.
///
/// [`NoEscaping`]: EscapingScheme::NoEscaping
#[must_use]
pub fn escape_name_bytes(name: &[u8], scheme: EscapingScheme) -> Cow<'_, str> {
    if let Ok(name) = std::str::from_utf8(name) {
        return escape_name(name, scheme);
    }

    if scheme == EscapingScheme::NoEscaping {
        return String::from_utf8_lossy(name);
    }

    // Invalid UTF-8 is never legacy-legal, so there is no shortcut here.
    let mut escaped = start_escaped(name.len(), scheme);
    let mut index = 0;
    for chunk in name.utf8_chunks() {
        for c in chunk.valid().chars() {
            push_escaped_char(&mut escaped, c, index, scheme);
            index += 1;
        }
        for _ in chunk.invalid() {
            if scheme == EscapingScheme::Values {
                escaped.push_str("_FFFD_");
            } else {
                escaped.push('_');
            }
            index += 1;
        }
    }
    Cow::Owned(escaped)
}

fn start_escaped(capacity: usize, scheme: EscapingScheme) -> String {
    let mut escaped = String::with_capacity(capacity + 3);
    if scheme == EscapingScheme::Values {
        escaped.push_str("U__");
    }
    escaped
}

fn push_escaped_char(escaped: &mut String, c: char, index: usize, scheme: EscapingScheme) {
    match scheme {
        EscapingScheme::NoEscaping => escaped.push(c),
        EscapingScheme::Underscores => {
            escaped.push(if is_legacy_valid_char(c, index) { c } else { '_' });
        }
        EscapingScheme::Dots => match c {
            '_' => escaped.push_str("__"),
            '.' => escaped.push_str("_dot_"),
            c if is_legacy_valid_char(c, index) => escaped.push(c),
            _ => escaped.push('_'),
        },
        EscapingScheme::Values => {
            if is_legacy_valid_char(c, index) {
                escaped.push(c);
            } else {
                push_code_point(escaped, c);
            }
        }
    }
}

/// Writes `_<hex>_` with at least four lowercase hex digits.
fn push_code_point(escaped: &mut String, c: char) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let code = u32::from(c);
    let digits = (u32::BITS - code.leading_zeros()).div_ceil(4).max(4);
    escaped.push('_');
    for nibble in (0..digits).rev() {
        let digit = (code >> (nibble * 4)) & 0xf;
        escaped.push(char::from(HEX[digit as usize]));
    }
    escaped.push('_');
}

/// Escapes the metric name, label names and label-encoded metric names of a
/// family.
///
/// The input is never modified. With [`EscapingScheme::NoEscaping`] the same
/// handle is returned. Otherwise a new family is built, but metrics and label
/// pairs that need no change are shared with the input rather than copied.
///
/// A metric is rebuilt when any of its label values is not legacy-legal. In
/// the rebuilt metric the `__name__` label gets its value escaped and every
/// other label gets its name escaped; label values of ordinary labels are
/// never touched.
#[must_use]
pub fn escape_metric_family(
    family: &Arc<MetricFamily>,
    scheme: EscapingScheme,
) -> Arc<MetricFamily> {
    if scheme == EscapingScheme::NoEscaping {
        return Arc::clone(family);
    }

    let name = match family.name.as_deref() {
        Some(name) if !is_valid_legacy_metric_name(name) => {
            Some(escape_name(name, scheme).into_owned())
        }
        _ => family.name.clone(),
    };

    let metrics = family
        .metrics
        .iter()
        .map(|metric| {
            if metric_needs_escaping(metric) {
                Arc::new(escape_metric(metric, scheme))
            } else {
                Arc::clone(metric)
            }
        })
        .collect();

    Arc::new(MetricFamily {
        name,
        help: family.help.clone(),
        metric_type: family.metric_type,
        metrics,
    })
}

fn metric_needs_escaping(metric: &Metric) -> bool {
    metric
        .labels
        .iter()
        .any(|label| !is_valid_legacy_metric_name(label.value()))
}

fn escape_metric(metric: &Metric, scheme: EscapingScheme) -> Metric {
    let labels = metric
        .labels
        .iter()
        .map(|label| escape_label_pair(label, scheme))
        .collect();

    Metric {
        labels,
        sample: Arc::clone(&metric.sample),
        timestamp_ms: metric.timestamp_ms,
    }
}

fn escape_label_pair(label: &Arc<LabelPair>, scheme: EscapingScheme) -> Arc<LabelPair> {
    if label.name.as_deref() == Some(METRIC_NAME_LABEL) {
        return match label.value.as_deref() {
            Some(value) if !is_valid_legacy_metric_name(value) => Arc::new(LabelPair {
                name: Some(METRIC_NAME_LABEL.to_owned()),
                value: Some(escape_name(value, scheme).into_owned()),
            }),
            _ => Arc::clone(label),
        };
    }

    match label.name.as_deref() {
        Some(name) if !is_valid_legacy_metric_name(name) => Arc::new(LabelPair {
            name: Some(escape_name(name, scheme).into_owned()),
            value: label.value.clone(),
        }),
        _ => Arc::clone(label),
    }
}
