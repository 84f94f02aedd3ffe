//! Placeholder markers
//!
//! A [`Marker`] is the opaque token upstream planning writes wherever a real
//! entity will eventually appear (`某某公司5`, `SLOT_A`, ...).

use crate::error::IdentityError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Opaque placeholder token standing in for a real-looking entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Marker(String);

impl Marker {
    /// Create a marker from raw text
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns [`IdentityError::EmptyMarker`] if nothing remains after trimming
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyMarker);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Marker text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes)
    #[inline]
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Split a slot marker into its prefix and trailing number
    ///
    /// `某某公司12` yields `("某某公司", 12)`. Markers without trailing ASCII
    /// digits, or made only of digits, yield `None`.
    #[must_use]
    pub fn slot(&self) -> Option<(&str, u32)> {
        let digits_start = self
            .0
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        if digits_start == 0 {
            return None;
        }
        let number = self.0[digits_start..].parse().ok()?;
        Some((&self.0[..digits_start], number))
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Marker {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Marker {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.0
    }
}

impl AsRef<str> for Marker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
