//! Error types for layout

use thiserror::Error;

/// Layout errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Page geometry leaves no usable area, or a width is not positive
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// Explicit column widths do not match the table
    #[error("column width mismatch: table has {expected} columns, {actual} widths given")]
    ColumnMismatch {
        /// Columns in the table
        expected: usize,
        /// Widths supplied
        actual: usize,
    },
}

impl LayoutError {
    /// Create geometry error
    #[inline]
    #[must_use]
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry(reason.into())
    }
}

/// Result type for layout
pub type LayoutResult<T> = Result<T, LayoutError>;
