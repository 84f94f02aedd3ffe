//! Package generation configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.

use crate::error::PackageResult;
use epa_retry::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport-failure backoff, in milliseconds
///
/// `initial_ms = 0` disables backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first transport failure
    pub initial_ms: u64,
    /// Growth factor per further failure
    pub factor: u32,
    /// Upper bound on a single delay
    pub cap_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 0,
            factor: 2,
            cap_ms: 30_000,
        }
    }
}

impl BackoffConfig {
    /// Backoff schedule for the retry orchestrator
    #[must_use]
    pub fn to_backoff(&self) -> Backoff {
        if self.initial_ms == 0 {
            return Backoff::None;
        }
        Backoff::exponential(
            Duration::from_millis(self.initial_ms),
            self.factor,
            Duration::from_millis(self.cap_ms.max(self.initial_ms)),
        )
    }
}

/// Package generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Start every exhibit on a new page when assembled
    pub evidence_page_break: bool,
    /// Case type shown on cover pages, e.g. `融资租赁合同纠纷`
    pub case_type_label: String,
    /// Retries after the first generation attempt
    pub max_retries: u32,
    /// Transport-failure backoff
    pub backoff: BackoffConfig,
    /// Prefix of group directory names and default group names
    pub group_label_prefix: String,
    /// Manifest file name at the store root
    pub manifest_file_name: String,
    /// Report file name at the store root
    pub report_file_name: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            evidence_page_break: false,
            case_type_label: String::new(),
            max_retries: 3,
            backoff: BackoffConfig::default(),
            group_label_prefix: "证据组".to_string(),
            manifest_file_name: "evidence_index.json".to_string(),
            report_file_name: "generation_report.json".to_string(),
        }
    }
}

impl PackageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns [`PackageError::Config`](crate::PackageError::Config) on malformed TOML
    pub fn from_toml_str(text: &str) -> PackageResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// With per-exhibit page breaks
    #[inline]
    #[must_use]
    pub fn with_evidence_page_break(mut self, enabled: bool) -> Self {
        self.evidence_page_break = enabled;
        self
    }

    /// With cover-page case type
    #[inline]
    #[must_use]
    pub fn with_case_type_label(mut self, label: impl Into<String>) -> Self {
        self.case_type_label = label.into();
        self
    }

    /// With retry count
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// With backoff
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Retry policy for each exhibit
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_backoff(self.backoff.to_backoff())
    }

    /// Directory and default display name of a group
    #[must_use]
    pub fn group_label(&self, group: u32) -> String {
        format!("{}{group}", self.group_label_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackageError;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(PackageConfig::from_toml_str("").unwrap(), PackageConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let config = PackageConfig::from_toml_str(
            r#"
            evidence_page_break = true
            case_type_label = "融资租赁合同纠纷"
            max_retries = 5

            [backoff]
            initial_ms = 200
            cap_ms = 1000
            "#,
        )
        .unwrap();

        assert!(config.evidence_page_break);
        assert_eq!(config.case_type_label, "融资租赁合同纠纷");
        assert_eq!(config.backoff.factor, 2);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(5).with_backoff(Backoff::exponential(
                Duration::from_millis(200),
                2,
                Duration::from_millis(1000)
            ))
        );
        assert_eq!(config.group_label(3), "证据组3");
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = PackageConfig::from_toml_str("max_retries = \"three\"").unwrap_err();
        assert!(matches!(err, PackageError::Config(_)));
    }

    #[test]
    fn zero_initial_disables_backoff() {
        assert_eq!(BackoffConfig::default().to_backoff(), Backoff::None);
    }
}
