//! Media range parsing for `Accept` and `Content-Type` header values.

use std::cmp::Ordering;

use smartstring::alias::String as SmartString;

/// One offer of an `Accept` header, e.g. `text/plain;version=0.0.4;q=0.5`.
///
/// Types and parameter keys are lowercased; parameter values are kept as
/// written, minus surrounding whitespace and quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    media_type: SmartString,
    sub_type: SmartString,
    q: f32,
    params: Vec<(SmartString, SmartString)>,
}

impl MediaRange {
    /// Parses a single media range. `*` alone is read as `*/*`.
    ///
    /// Returns `None` if there is no `type/subtype` part.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (range, params) = match input.split_once(';') {
            Some((range, params)) => (range, Some(params)),
            None => (input, None),
        };

        let range = range.trim();
        let (media_type, sub_type) = if range == "*" {
            ("*", "*")
        } else {
            let (media_type, sub_type) = range.split_once('/')?;
            (media_type.trim(), sub_type.trim())
        };
        if media_type.is_empty() || sub_type.is_empty() {
            return None;
        }

        let mut media_range = Self {
            media_type: lowercase(media_type),
            sub_type: lowercase(sub_type),
            q: 1.0,
            params: Vec::new(),
        };

        for (key, value) in params.into_iter().flat_map(split_params) {
            if key.eq_ignore_ascii_case("q") {
                // Unparsable weights rank the offer as not acceptable
                media_range.q = value.parse::<f32>().map_or(0.0, |q| q.clamp(0.0, 1.0));
            } else {
                media_range.params.push((lowercase(key), value.into()));
            }
        }

        Some(media_range)
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Compares against a full `type/subtype` string, ignoring case.
    #[must_use]
    pub fn is(&self, essence: &str) -> bool {
        essence.split_once('/').is_some_and(|(media_type, sub_type)| {
            self.media_type.eq_ignore_ascii_case(media_type)
                && self.sub_type.eq_ignore_ascii_case(sub_type)
        })
    }

    /// The quality weight, `1.0` when not given.
    #[must_use]
    pub fn q(&self) -> f32 {
        self.q
    }

    /// The value of the first parameter named `key` (lowercase).
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn precedence(&self, other: &Self) -> Ordering {
        other
            .q
            .partial_cmp(&self.q)
            .unwrap_or(Ordering::Equal)
            .then_with(|| is_wildcard(&self.media_type).cmp(&is_wildcard(&other.media_type)))
            .then_with(|| is_wildcard(&self.sub_type).cmp(&is_wildcard(&other.sub_type)))
            .then_with(|| other.params.len().cmp(&self.params.len()))
    }
}

/// Parses a comma-separated `Accept` header into offers, most preferred
/// first.
///
/// Offers are ranked by weight, then concrete types before wildcards, then
/// offers with more parameters first; the sort is stable so ties keep header
/// order. Malformed offers and offers with `q=0` are dropped.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut offers: Vec<MediaRange> = header
        .split(',')
        .filter_map(MediaRange::parse)
        .filter(|offer| offer.q > 0.0)
        .collect();
    offers.sort_by(MediaRange::precedence);
    offers
}

/// Splits `key=value` pairs separated by `;`, skipping pieces without `=`.
pub(crate) fn split_params(input: &str) -> impl Iterator<Item = (&str, &str)> {
    input.split(';').filter_map(|param| {
        let (key, value) = param.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key, unquote(value.trim())))
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn lowercase(input: &str) -> SmartString {
    input.chars().map(|c| c.to_ascii_lowercase()).collect()
}

fn is_wildcard(part: &str) -> bool {
    part == "*"
}
