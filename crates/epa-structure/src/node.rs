//! Structural node types

use serde::{Deserialize, Serialize};

/// Role of a paragraph within the document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphRole {
    /// Free prose
    Body,
    /// Numbered contract clause (`3.2 ...`), kept on its own
    Clause,
}

/// One parsed unit of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralNode {
    /// Section heading
    Heading {
        /// Heading text without markers
        text: String,
        /// Nesting level, 1 is outermost
        level: u8,
    },
    /// `label: value` pair
    Field {
        /// Text before the first colon
        label: String,
        /// Text after the first colon
        value: String,
    },
    /// Prose block; line breaks preserved
    Paragraph {
        /// Lines joined with `\n`
        text: String,
        /// Body prose or contract clause
        role: ParagraphRole,
    },
    /// Grid of cells; every row has the same number of columns
    Table {
        /// Rows in order, header first when `header` is set
        rows: Vec<Vec<String>>,
        /// Whether the first row was marked as a header by a separator row
        header: bool,
    },
}

impl StructuralNode {
    /// Create heading node
    #[must_use]
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    /// Create field node
    #[must_use]
    pub fn field(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create body paragraph
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            text: text.into(),
            role: ParagraphRole::Body,
        }
    }

    /// Create clause paragraph
    #[must_use]
    pub fn clause(text: impl Into<String>) -> Self {
        Self::Paragraph {
            text: text.into(),
            role: ParagraphRole::Clause,
        }
    }

    /// Kind name as serialized
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Field { .. } => "field",
            Self::Paragraph { .. } => "paragraph",
            Self::Table { .. } => "table",
        }
    }

    /// Column count of a table node
    #[must_use]
    pub fn columns(&self) -> Option<usize> {
        match self {
            Self::Table { rows, .. } => Some(rows.first().map_or(0, Vec::len)),
            _ => None,
        }
    }

    /// Whether this is a table node
    #[inline]
    #[must_use]
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }
}
