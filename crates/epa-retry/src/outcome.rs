//! Attempt history and terminal outcomes

use crate::error::GenerationFailure;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// How one attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Text passed the quality gate
    Clean,
    /// Text still contained placeholders
    Dirty {
        /// Offending tokens, one per occurrence
        unresolved: Vec<String>,
    },
    /// The generation call failed
    Failed {
        /// Failure reported by the backend
        error: GenerationFailure,
    },
}

/// One entry of the attempt history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,
    /// How the attempt ended
    #[serde(flatten)]
    pub status: AttemptStatus,
}

/// Terminal ACCEPTED state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Clean text
    pub content: String,
    /// Attempts consumed, including the accepted one
    pub attempts: u32,
    /// Every attempt in order
    pub history: Vec<AttemptRecord>,
}

/// Why a run ended without clean content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// Every allowed attempt was used
    BudgetSpent,
    /// Cancellation was requested before the budget ran out
    Cancelled,
}

impl Display for ExhaustionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetSpent => f.write_str("retry budget spent"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal EXHAUSTED state
///
/// Reported, not fatal: the last produced text is retained so callers can
/// still emit a flagged artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("generation exhausted after {attempts} attempts: {reason}")]
pub struct Exhausted {
    /// Why the loop stopped
    pub reason: ExhaustionReason,
    /// Attempts actually made
    pub attempts: u32,
    /// Text of the last attempt that returned any, dirty or not
    pub last_content: Option<String>,
    /// Placeholders found in `last_content`
    pub unresolved: Vec<String>,
    /// Every attempt in order
    pub history: Vec<AttemptRecord>,
}

/// Flattened result of one retry loop, ready for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Whether the content passed the quality gate
    pub success: bool,
    /// Attempts consumed
    pub attempts: u32,
    /// Final text; `None` only when no attempt returned any
    pub content: Option<String>,
    /// Placeholders left in `content`
    pub unresolved: Vec<String>,
    /// Set when the run ended without clean content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaustion: Option<ExhaustionReason>,
    /// Every attempt in order
    pub history: Vec<AttemptRecord>,
}

impl GenerationOutcome {
    /// Content, or an empty string when no attempt produced any
    #[must_use]
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Whether the artifact must be flagged for review
    #[inline]
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        !self.success
    }
}

impl From<Accepted> for GenerationOutcome {
    fn from(accepted: Accepted) -> Self {
        Self {
            success: true,
            attempts: accepted.attempts,
            content: Some(accepted.content),
            unresolved: Vec::new(),
            exhaustion: None,
            history: accepted.history,
        }
    }
}

impl From<Exhausted> for GenerationOutcome {
    fn from(exhausted: Exhausted) -> Self {
        Self {
            success: false,
            attempts: exhausted.attempts,
            content: exhausted.last_content,
            unresolved: exhausted.unresolved,
            exhaustion: Some(exhausted.reason),
            history: exhausted.history,
        }
    }
}

impl From<Result<Accepted, Exhausted>> for GenerationOutcome {
    fn from(result: Result<Accepted, Exhausted>) -> Self {
        match result {
            Ok(accepted) => accepted.into(),
            Err(exhausted) => exhausted.into(),
        }
    }
}
