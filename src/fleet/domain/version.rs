//! Runtime version parsing and the freshness comparison.
//!
//! Versions are compared as dot-separated numeric components. Parsing is
//! lenient: a leading `v` is ignored, each segment contributes its leading
//! digits (or `0` when it has none), and missing trailing components count as
//! `0`. The comparison is total and never panics.

use std::cmp::Ordering;
use std::fmt;

/// Parsed, comparable runtime version.
#[derive(Debug, Clone)]
pub struct RuntimeVersion {
    components: Vec<u64>,
}

impl RuntimeVersion {
    /// Parses a version string such as `v0.4.10` or `1.2`.
    ///
    /// Returns `None` when no segment starts with a digit, so that wholly
    /// non-numeric input is never mistaken for version `0`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let mut saw_digit = false;
        let components = unprefixed
            .split('.')
            .map(|segment| {
                let parsed = leading_number(segment);
                saw_digit |= parsed.is_some();
                parsed.unwrap_or(0)
            })
            .collect();

        saw_digit.then_some(Self { components })
    }

    /// Returns the numeric components as parsed.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, position: usize) -> u64 {
        self.components.get(position).copied().unwrap_or(0)
    }
}

impl PartialEq for RuntimeVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RuntimeVersion {}

impl PartialOrd for RuntimeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RuntimeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.components.len().max(other.components.len());
        (0..width)
            .map(|position| self.component(position).cmp(&other.component(position)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.components.iter().map(u64::to_string).collect();
        formatter.write_str(&rendered.join("."))
    }
}

/// Returns whether `current` is at or beyond `latest`.
///
/// An absent or unparsable `current` is never up to date, and neither is any
/// version measured against an unparsable `latest`.
#[must_use]
pub fn is_up_to_date(current: Option<&str>, latest: &str) -> bool {
    let Some(current_version) = current.and_then(RuntimeVersion::parse) else {
        return false;
    };
    let Some(latest_version) = RuntimeVersion::parse(latest) else {
        return false;
    };
    current_version >= latest_version
}

fn leading_number(segment: &str) -> Option<u64> {
    let digits = segment
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .filter_map(|c| c.to_digit(10));

    let mut seen = false;
    let mut value: u64 = 0;
    for digit in digits {
        seen = true;
        value = value.saturating_mul(10).saturating_add(u64::from(digit));
    }
    seen.then_some(value)
}
