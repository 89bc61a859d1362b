use crate::config::{NameConfig, ValidationScheme};

/// Whether `c` may appear at char position `index` of a legacy name.
#[inline]
pub(crate) const fn is_legacy_valid_char(c: char, index: usize) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || (c.is_ascii_digit() && index > 0)
}

/// Checks `name` against the legacy character rules, whatever the configured
/// validation scheme is.
///
/// A legacy name is non-empty, made of ASCII letters, digits, `_` and `:`,
/// and does not start with a digit.
#[must_use]
pub fn is_valid_legacy_metric_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(index, c)| is_legacy_valid_char(c, index))
}

/// Like [`is_valid_legacy_metric_name`], for names that may not be valid
/// UTF-8.
#[must_use]
pub fn is_valid_legacy_metric_name_bytes(name: &[u8]) -> bool {
    // Legacy names are pure ASCII, so bytes and chars line up.
    !name.is_empty()
        && name
            .iter()
            .enumerate()
            .all(|(index, &b)| b.is_ascii() && is_legacy_valid_char(b as char, index))
}

impl NameConfig {
    /// Checks a metric name according to the configured validation scheme.
    #[must_use]
    pub fn is_valid_metric_name(&self, name: impl AsRef<[u8]>) -> bool {
        let name = name.as_ref();
        match self.validation_scheme {
            ValidationScheme::Legacy => is_valid_legacy_metric_name_bytes(name),
            ValidationScheme::Utf8 => !name.is_empty() && std::str::from_utf8(name).is_ok(),
        }
    }
}

/// Checks a metric name according to the process-wide [`NameConfig`].
#[must_use]
pub fn is_valid_metric_name(name: impl AsRef<[u8]>) -> bool {
    NameConfig::global().is_valid_metric_name(name)
}
