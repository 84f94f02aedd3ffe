//! Error types for identity resolution
//!
//! Resolution itself never fails: an unmapped marker is left in place for
//! the quality gate to report. Only map construction can be rejected.

/// Errors raised while building an [`IdentityMap`](crate::IdentityMap)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Marker text was empty or whitespace only
    #[error("marker must not be empty")]
    EmptyMarker,

    /// Two distinct profiles claim the same marker
    #[error("marker '{marker}' is claimed by both '{first}' and '{second}'")]
    DuplicateMarker {
        /// The contested marker
        marker: String,
        /// Primary marker of the profile that claimed it first
        first: String,
        /// Primary marker of the conflicting profile
        second: String,
    },
}

impl IdentityError {
    /// Create duplicate marker error
    pub fn duplicate(
        marker: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateMarker {
            marker: marker.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

/// Result type alias for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;
