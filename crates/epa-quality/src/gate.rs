//! Quality gate and report types

use crate::pattern::{PatternClass, BUILT_IN_PATTERNS};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One residual placeholder occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Pattern class that matched
    pub class: PatternClass,
    /// Matched text
    pub token: String,
    /// Byte offset of the match in the inspected text
    pub offset: usize,
}

/// Result of inspecting one text
///
/// Findings are ordered by class, then by position. Repeated tokens are
/// reported once per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    findings: Vec<Finding>,
}

impl GateReport {
    /// Whether no placeholder was found
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// All findings
    #[inline]
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Matched tokens in report order
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.token.clone()).collect()
    }

    /// Occurrences per token, in order of first report
    #[must_use]
    pub fn frequency(&self) -> IndexMap<String, usize> {
        let mut counts = IndexMap::new();
        for finding in &self.findings {
            *counts.entry(finding.token.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Findings of one class
    pub fn of_class(&self, class: PatternClass) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.class == class)
    }

    /// Consume into the `(is_clean, tokens)` pair
    #[must_use]
    pub fn into_verdict(self) -> (bool, Vec<String>) {
        let clean = self.is_clean();
        (clean, self.findings.into_iter().map(|f| f.token).collect())
    }
}

/// Stateless detector for residual placeholders
///
/// Deliberately over-inclusive: an extra retry is cheap, a placeholder in a
/// delivered exhibit is not.
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    literal_markers: Vec<String>,
    disabled: Vec<PatternClass>,
}

impl QualityGate {
    /// Gate with the full built-in pattern library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also flag these literal markers as [`PatternClass::CaseMarker`]
    ///
    /// Blank markers are ignored. Longer markers are matched first.
    #[must_use]
    pub fn with_literal_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.literal_markers.extend(
            markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_string())
                .filter(|m| !m.is_empty()),
        );
        self.literal_markers
            .sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        self.literal_markers.dedup();
        self
    }

    /// Disable one built-in class
    #[must_use]
    pub fn without_class(mut self, class: PatternClass) -> Self {
        if !self.disabled.contains(&class) {
            self.disabled.push(class);
        }
        self
    }

    /// Number of registered literal markers
    #[inline]
    #[must_use]
    pub fn literal_marker_count(&self) -> usize {
        self.literal_markers.len()
    }

    /// Verdict plus every offending token, not deduplicated
    #[must_use]
    pub fn check(&self, text: &str) -> (bool, Vec<String>) {
        self.inspect(text).into_verdict()
    }

    /// Full report with class and position of every finding
    #[must_use]
    pub fn inspect(&self, text: &str) -> GateReport {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut findings = Vec::new();

        let mut accept = |class: PatternClass, offset: usize, token: &str| {
            let end = offset + token.len();
            if claimed.iter().any(|&(s, e)| offset < e && s < end) {
                return;
            }
            claimed.push((offset, end));
            findings.push(Finding {
                class,
                token: token.to_string(),
                offset,
            });
        };

        for marker in &self.literal_markers {
            for (offset, token) in text.match_indices(marker.as_str()) {
                accept(PatternClass::CaseMarker, offset, token);
            }
        }
        for pattern in BUILT_IN_PATTERNS.iter().filter(|p| !self.disabled.contains(&p.class)) {
            for (offset, token) in pattern.spans(text) {
                accept(pattern.class, offset, token);
            }
        }

        findings.sort_by_key(|f| (f.class, f.offset));
        if !findings.is_empty() {
            tracing::debug!(findings = findings.len(), "residual placeholders found");
        }
        GateReport { findings }
    }
}

static DEFAULT_GATE: Lazy<QualityGate> = Lazy::new(QualityGate::new);

/// Check text against the built-in pattern library
#[must_use]
pub fn check(text: &str) -> (bool, Vec<String>) {
    DEFAULT_GATE.check(text)
}

/// Inspect text against the built-in pattern library
#[must_use]
pub fn inspect(text: &str) -> GateReport {
    DEFAULT_GATE.inspect(text)
}
