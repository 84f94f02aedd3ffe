//! Error types for package generation
//!
//! Only planning-input defects and persistence failures are errors. A single
//! item that never produced clean text is reported, not raised.

use crate::policy::PolicyViolation;
use epa_identity::IdentityError;
use std::path::PathBuf;

/// Errors that abort a package run
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Identity map could not be built
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// An item carries an invented value in a field that must come from the case record
    #[error("fabrication policy violated: {0}")]
    Policy(#[from] PolicyViolation),

    /// IO error while persisting an artifact
    #[error("io error writing {path}: {source}")]
    Io {
        /// Path relative to the store root
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Manifest or report could not be encoded
    #[error("manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Configuration file could not be decoded
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// An item references a group that was not declared
    #[error("item references undeclared evidence group {0}")]
    UnknownGroup(u32),
}

impl PackageError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for package operations
pub type PackageResult<T> = Result<T, PackageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_path() {
        let err = PackageError::io_error(
            "证据组1/证据组1_E001_融资租赁合同.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "io error writing 证据组1/证据组1_E001_融资租赁合同.txt: denied"
        );
    }

    #[test]
    fn unknown_group_display() {
        assert_eq!(
            PackageError::UnknownGroup(7).to_string(),
            "item references undeclared evidence group 7"
        );
    }
}
