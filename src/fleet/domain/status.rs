//! Raw server status reported by orchestration and its display form.

use std::borrow::Cow;
use std::fmt;

/// Display token for servers whose setup has not completed.
pub const SETUP_NOT_FINISHED: &str = "setup_not_finished";

/// Status value written by external orchestration.
///
/// Orchestration reports either a numeric code or a label such as `up` or
/// `down`. A server that has never reported anything is [`RawStatus::Unset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RawStatus {
    /// No status has been reported yet.
    #[default]
    Unset,
    /// Numeric status code; `0` means setup has not finished.
    Code(i64),
    /// Textual status label, displayed verbatim unless it reads as zero.
    Label(String),
}

impl RawStatus {
    /// Creates a label status.
    #[must_use]
    pub fn label(value: impl Into<String>) -> Self {
        Self::Label(value.into())
    }

    /// Reconstructs a status from its persisted text form.
    ///
    /// `None` and blank strings become [`RawStatus::Unset`] and text written
    /// by [`RawStatus::Code`] becomes a code again. Anything else, including
    /// non-canonical integers such as `007`, is kept verbatim as a label.
    #[must_use]
    pub fn from_persisted(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::Unset;
        };
        if raw.trim().is_empty() {
            return Self::Unset;
        }
        match raw.parse::<i64>() {
            Ok(code) if code.to_string() == raw => Self::Code(code),
            _ => Self::Label(raw.to_owned()),
        }
    }

    /// Returns the persisted text form, `None` for [`RawStatus::Unset`].
    #[must_use]
    pub fn to_persisted(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Code(code) => Some(code.to_string()),
            Self::Label(label) => Some(label.clone()),
        }
    }

    /// Returns whether orchestration has finished setting the server up.
    #[must_use]
    pub fn is_setup_finished(&self) -> bool {
        match self {
            Self::Unset => false,
            Self::Code(code) => *code != 0,
            Self::Label(label) => {
                let trimmed = label.trim();
                !trimmed.is_empty() && !matches!(trimmed.parse::<i64>(), Ok(0))
            }
        }
    }

    /// Maps the raw status to its canonical display token.
    ///
    /// Unset, blank and zero statuses (coded or written out) read
    /// `setup_not_finished`; every other value is passed through unchanged.
    #[must_use]
    pub fn display_token(&self) -> Cow<'_, str> {
        if !self.is_setup_finished() {
            return Cow::Borrowed(SETUP_NOT_FINISHED);
        }
        match self {
            Self::Code(code) => Cow::Owned(code.to_string()),
            Self::Label(label) => Cow::Borrowed(label.as_str()),
            Self::Unset => Cow::Borrowed(SETUP_NOT_FINISHED),
        }
    }
}

impl fmt::Display for RawStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_token())
    }
}
