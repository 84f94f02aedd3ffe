//! Artifact naming
//!
//! Files are named `{group_label}_{evidence_id}_{short_name}.{ext}` inside a
//! directory per group. Name claims are serialised per group so concurrent
//! workers can never hand out the same file name twice.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static TRAILING_NOTARIZATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"及公证书$").expect("valid regex"));
static TRAILING_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:（.+）|\(.+\))$").expect("valid regex"));
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"*?]"#).expect("valid regex"));

/// Evidence id for a sequence number: `E001`, `E042`, `E1000`
#[must_use]
pub fn evidence_id(sequence: u32) -> String {
    format!("E{sequence:03}")
}

/// File-safe short form of an exhibit name
///
/// Title marks and a trailing `及公证书` or parenthetical are dropped, path
/// separators become `和`, other path-unsafe characters are removed.
#[must_use]
pub fn short_name(name: &str) -> String {
    let name = name.replace(['《', '》'], "");
    let name = TRAILING_NOTARIZATION.replace(&name, "");
    let name = TRAILING_PAREN.replace(&name, "");
    let name = name.replace(['/', '\\'], "和");
    UNSAFE_CHARS.replace_all(&name, "").trim().to_string()
}

/// Base artifact name without extension
#[must_use]
pub fn artifact_stem(group_label: &str, evidence_id: &str, short_name: &str) -> String {
    format!("{group_label}_{evidence_id}_{short_name}")
}

/// Hands out unique artifact names per group
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: Mutex<HashMap<u32, HashSet<String>>>,
}

impl NameRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `stem` in `group`
    ///
    /// A taken stem gets `_{loop_index}` appended, then a counter if even that
    /// is taken.
    pub fn claim(&self, group: u32, stem: &str, loop_index: usize) -> String {
        let mut claimed = self.claimed.lock();
        let taken = claimed.entry(group).or_default();

        let mut candidate = stem.to_string();
        if taken.contains(&candidate) {
            candidate = format!("{stem}_{loop_index}");
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{stem}_{loop_index}_{n}");
                n += 1;
            }
            tracing::debug!(group, stem, name = %candidate, "artifact name collision");
        }
        taken.insert(candidate.clone());
        candidate
    }

    /// Number of names claimed in a group
    #[must_use]
    pub fn claimed_in(&self, group: u32) -> usize {
        self.claimed.lock().get(&group).map_or(0, HashSet::len)
    }
}
