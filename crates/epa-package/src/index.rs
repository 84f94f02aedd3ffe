//! Evidence index manifest
//!
//! The authoritative list of generated exhibits, consumed by assembly and by
//! downstream auditing. The totals are computed, never supplied:
//! `total == entries.len() == Σ groups[i].item_count`.

use crate::model::{DeclaredType, Party};
use crate::store::ContentDigest;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Review status of an exhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Passed the quality gate
    Clean,
    /// Exhausted its retry budget; content kept for review
    Flagged,
}

/// One exhibit in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Evidence id (`E001`)
    pub id: String,
    /// Group id
    pub group: u32,
    /// Full exhibit name
    pub name: String,
    /// File-safe short name
    pub short_name: String,
    /// Declared type
    pub declared_type: DeclaredType,
    /// Submitting party
    pub party: Party,
    /// Artifact path relative to the store root
    pub path: PathBuf,
    /// Artifact size in bytes
    pub byte_size: u64,
    /// Review status
    pub status: EntryStatus,
    /// Generation attempts consumed
    pub attempts: u32,
    /// Placeholders left in a flagged artifact
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Artifact digest
    pub digest: ContentDigest,
}

/// Per-group totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group id
    pub group_id: u32,
    /// Group display name
    pub group_name: String,
    /// Exhibits in the group
    pub item_count: usize,
    /// Proof purpose of the first exhibit that states one
    pub proof_purpose: String,
}

/// Manifest of a generated package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceIndex {
    /// Number of exhibits
    pub total: usize,
    /// Number of groups
    pub group_count: usize,
    /// Exhibits in generation order
    pub entries: Vec<IndexEntry>,
    /// Groups in order of first appearance
    pub groups: Vec<GroupSummary>,
}

impl EvidenceIndex {
    /// Start collecting entries
    #[must_use]
    pub fn builder() -> IndexBuilder {
        IndexBuilder::default()
    }

    /// Entries that exhausted their budget
    pub fn flagged(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter().filter(|e| e.status == EntryStatus::Flagged)
    }

    /// Number of clean entries
    #[must_use]
    pub fn clean_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status == EntryStatus::Clean).count()
    }

    /// Entry by evidence id
    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Pretty JSON, as persisted
    ///
    /// # Errors
    /// Returns the serializer error
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a persisted manifest
    ///
    /// # Errors
    /// Returns the deserializer error
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Accumulates entries and derives the group summaries
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: Vec<IndexEntry>,
    groups: IndexMap<u32, GroupSummary>,
    names: IndexMap<u32, String>,
}

impl IndexBuilder {
    /// Name a group; unnamed groups get `{prefix}{id}` at [`finish`](Self::finish)
    #[must_use]
    pub fn with_group_name(mut self, group: u32, name: impl Into<String>) -> Self {
        self.names.insert(group, name.into());
        self
    }

    /// Append an entry
    pub fn push(&mut self, entry: IndexEntry, proof_purpose: &str) {
        let summary = self.groups.entry(entry.group).or_insert_with(|| GroupSummary {
            group_id: entry.group,
            group_name: String::new(),
            item_count: 0,
            proof_purpose: String::new(),
        });
        summary.item_count += 1;
        if summary.proof_purpose.is_empty() && !proof_purpose.trim().is_empty() {
            summary.proof_purpose = proof_purpose.trim().to_string();
        }
        self.entries.push(entry);
    }

    /// Number of entries so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was pushed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into a manifest
    #[must_use]
    pub fn finish(self, default_prefix: &str) -> EvidenceIndex {
        let Self {
            entries,
            groups,
            names,
        } = self;
        let groups: Vec<GroupSummary> = groups
            .into_values()
            .map(|mut summary| {
                summary.group_name = names
                    .get(&summary.group_id)
                    .cloned()
                    .unwrap_or_else(|| format!("{default_prefix}{}", summary.group_id));
                summary
            })
            .collect();
        EvidenceIndex {
            total: entries.len(),
            group_count: groups.len(),
            entries,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, group: u32, status: EntryStatus) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            group,
            name: "付款凭证".to_string(),
            short_name: "付款凭证".to_string(),
            declared_type: DeclaredType::Voucher,
            party: Party::Plaintiff,
            path: PathBuf::from(format!("证据组{group}/证据组{group}_{id}_付款凭证.txt")),
            byte_size: 12,
            status,
            attempts: 1,
            unresolved: Vec::new(),
            digest: ContentDigest::compute(id.as_bytes()),
        }
    }

    #[test]
    fn summaries_follow_first_appearance() {
        let mut builder = EvidenceIndex::builder().with_group_name(2, "租金支付");
        builder.push(entry("E001", 2, EntryStatus::Clean), "");
        builder.push(entry("E002", 1, EntryStatus::Flagged), "证明合同成立");
        builder.push(entry("E003", 2, EntryStatus::Clean), "证明已付租金");
        let index = builder.finish("证据组");

        assert_eq!(index.total, 3);
        assert_eq!(index.group_count, 2);
        assert_eq!(
            index.groups,
            vec![
                GroupSummary {
                    group_id: 2,
                    group_name: "租金支付".into(),
                    item_count: 2,
                    proof_purpose: "证明已付租金".into(),
                },
                GroupSummary {
                    group_id: 1,
                    group_name: "证据组1".into(),
                    item_count: 1,
                    proof_purpose: "证明合同成立".into(),
                },
            ]
        );
        assert_eq!(index.clean_count(), 2);
        assert_eq!(index.flagged().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["E002"]);
    }

    #[test]
    fn json_roundtrip_keeps_digest_as_hex() {
        let mut builder = EvidenceIndex::builder();
        builder.push(entry("E001", 1, EntryStatus::Clean), "证明合同成立");
        let index = builder.finish("证据组");

        let json = index.to_json().unwrap();
        assert!(json.contains(&ContentDigest::compute(b"E001").to_string()));
        assert!(!json.contains("unresolved"));
        assert_eq!(EvidenceIndex::from_json(&json).unwrap(), index);
    }
}
