//! Generation report
//!
//! Companion to the manifest: what happened per exhibit, for human triage.

use crate::index::EntryStatus;
use chrono::{DateTime, Utc};
use epa_retry::{AttemptRecord, ExhaustionReason, GenerationOutcome};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A marker an exhibit involves that has no profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityGap {
    /// Exhibit that referenced the marker
    pub evidence_id: String,
    /// The unmapped marker
    pub marker: String,
}

/// Per-exhibit generation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    /// Evidence id
    pub evidence_id: String,
    /// Exhibit name
    pub name: String,
    /// Review status
    pub status: EntryStatus,
    /// Attempts consumed
    pub attempts: u32,
    /// Placeholders left in the artifact
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Why generation gave up, for flagged exhibits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaustion: Option<ExhaustionReason>,
    /// Every attempt in order
    pub history: Vec<AttemptRecord>,
}

impl ItemReport {
    /// Record an outcome
    #[must_use]
    pub fn from_outcome(evidence_id: impl Into<String>, name: impl Into<String>, outcome: &GenerationOutcome) -> Self {
        Self {
            evidence_id: evidence_id.into(),
            name: name.into(),
            status: if outcome.success { EntryStatus::Clean } else { EntryStatus::Flagged },
            attempts: outcome.attempts,
            unresolved: outcome.unresolved.clone(),
            exhaustion: outcome.exhaustion,
            history: outcome.history.clone(),
        }
    }
}

/// Run-level generation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Unique, time-ordered run id
    pub run_id: Ulid,
    /// When generation started
    pub started_at: DateTime<Utc>,
    /// When the last artifact was written
    pub finished_at: DateTime<Utc>,
    /// Clean exhibits
    pub clean: usize,
    /// Flagged exhibits
    pub flagged: usize,
    /// Per-exhibit records, in generation order
    pub items: Vec<ItemReport>,
    /// Markers without a profile
    #[serde(default)]
    pub identity_gaps: Vec<IdentityGap>,
}

impl GenerationReport {
    /// Empty report for a run starting now
    #[must_use]
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Ulid::new(),
            started_at: now,
            finished_at: now,
            clean: 0,
            flagged: 0,
            items: Vec::new(),
            identity_gaps: Vec::new(),
        }
    }

    /// Append an item record
    pub fn record(&mut self, item: ItemReport) {
        match item.status {
            EntryStatus::Clean => self.clean += 1,
            EntryStatus::Flagged => self.flagged += 1,
        }
        self.items.push(item);
    }

    /// Append identity gaps
    pub fn record_gaps(&mut self, gaps: impl IntoIterator<Item = IdentityGap>) {
        self.identity_gaps.extend(gaps);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Whether every exhibit passed the gate
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.flagged == 0
    }

    /// Pretty JSON, as persisted
    ///
    /// # Errors
    /// Returns the serializer error
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epa_retry::{run, GenerationFailure};

    #[test]
    fn counts_follow_status() {
        let clean = run(|| Ok::<_, GenerationFailure>("合同已签署".to_string()), 0);
        let dirty = run(|| Ok::<_, GenerationFailure>("某某公司1".to_string()), 1);

        let mut report = GenerationReport::start();
        report.record(ItemReport::from_outcome("E001", "融资租赁合同", &clean));
        report.record(ItemReport::from_outcome("E002", "付款凭证", &dirty));
        report.finish();

        assert_eq!((report.clean, report.flagged), (1, 1));
        assert!(!report.is_clean());
        assert_eq!(report.items[1].attempts, 2);
        assert_eq!(report.items[1].exhaustion, Some(ExhaustionReason::BudgetSpent));
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn json_has_run_id_and_history() {
        let mut report = GenerationReport::start();
        let outcome = run(|| Ok::<_, GenerationFailure>("正文".to_string()), 0);
        report.record(ItemReport::from_outcome("E001", "合同", &outcome));
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["run_id"], report.run_id.to_string());
        assert_eq!(json["items"][0]["history"][0]["status"], "clean");
        assert!(json["items"][0].get("unresolved").is_none());
    }
}
