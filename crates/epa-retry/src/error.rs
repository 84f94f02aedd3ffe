//! Generation backend failures

use serde::{Deserialize, Serialize};

/// Failure raised by the opaque generation call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationFailure {
    /// Connection, timeout or other transport-level error
    #[error("transport failure: {message}")]
    Transport {
        /// Backend-provided description
        message: String,
    },

    /// Backend answered with an error status
    #[error("backend error {status}: {message}")]
    Backend {
        /// Status code reported by the backend
        status: u16,
        /// Backend-provided description
        message: String,
    },

    /// Backend answered with no usable text
    #[error("generation returned an empty response")]
    EmptyResponse,
}

impl GenerationFailure {
    /// Create transport failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create backend failure
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure reflects infrastructure rather than content
    ///
    /// Transport errors, rate limiting (429) and server errors (5xx) qualify
    /// for backoff; everything else is retried immediately.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(GenerationFailure::transport("connection reset").is_transport());
        assert!(GenerationFailure::backend(503, "overloaded").is_transport());
        assert!(GenerationFailure::backend(429, "slow down").is_transport());
        assert!(!GenerationFailure::backend(400, "bad prompt").is_transport());
        assert!(!GenerationFailure::EmptyResponse.is_transport());
    }

    #[test]
    fn failure_display() {
        assert_eq!(
            GenerationFailure::backend(500, "internal").to_string(),
            "backend error 500: internal"
        );
    }
}
