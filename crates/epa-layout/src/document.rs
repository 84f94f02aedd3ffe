//! Layout blocks, pages and pagination
//!
//! A [`DocumentBuilder`] collects blocks and explicit page breaks; pagination
//! then flows them onto pages of a [`PageGeometry`]. Breaks exist only in the
//! builder stream: a run of breaks collapses into one and a break on an empty
//! page is dropped. Tables are never split; prose paragraphs may be split
//! between their source lines.

use crate::geometry::PageGeometry;
use crate::text::{display_width, wrap};
use epa_structure::ParagraphRole;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display columns of the first-line indent (two full-width spaces)
pub const FIRST_LINE_INDENT: usize = 4;

/// One laid-out unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    /// Page or exhibit title
    Title {
        /// Title text
        text: String,
    },
    /// Section heading
    Heading {
        /// Heading text
        text: String,
        /// 1 for group headings, deeper for headings inside an exhibit
        level: u8,
    },
    /// Inline `label：value`
    Field {
        /// Label
        label: String,
        /// Value, numbers already formatted
        value: String,
    },
    /// Prose; every source line starts indented unless it is a clause
    Paragraph {
        /// Lines joined with `\n`
        text: String,
        /// Body prose or contract clause
        role: ParagraphRole,
    },
    /// Grid with resolved column widths
    Table {
        /// Rows, header first when `header` is set
        rows: Vec<Vec<String>>,
        /// Whether the first row is styled as a header
        header: bool,
        /// Column widths in millimetres
        widths: Vec<f32>,
    },
    /// Reviewer note on a flagged exhibit
    Note {
        /// Note text
        text: String,
    },
    /// Table-of-contents line
    TocEntry {
        /// Entry text
        text: String,
        /// 1 for groups, 2 for exhibits
        level: u8,
        /// Page the entry starts on
        page: u32,
    },
}

impl Block {
    /// Create title block
    #[must_use]
    pub fn title(text: impl Into<String>) -> Self {
        Self::Title { text: text.into() }
    }

    /// Create heading block
    #[must_use]
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    /// Create field block
    #[must_use]
    pub fn field(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create body paragraph block
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            text: text.into(),
            role: ParagraphRole::Body,
        }
    }

    /// Create note block
    #[must_use]
    pub fn note(text: impl Into<String>) -> Self {
        Self::Note { text: text.into() }
    }

    /// Whether this is a table block
    #[inline]
    #[must_use]
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }

    /// Estimated height in body lines on `geometry`
    #[must_use]
    pub fn line_count(&self, geometry: &PageGeometry) -> usize {
        let columns = geometry.columns_for(geometry.usable_width());
        match self {
            Self::Title { text } => wrap(text, columns, columns).len() + 1,
            Self::Heading { text, level } => {
                wrap(text, columns, columns).len() + usize::from(*level <= 1)
            }
            Self::Field { label, value } => {
                let label_width = display_width(label) + 2;
                wrap(value, columns.saturating_sub(label_width), columns.saturating_sub(label_width)).len()
            }
            Self::Paragraph { text, role } => paragraph_lines(text, *role, columns),
            Self::Note { text } => wrap(text, columns, columns).len(),
            Self::TocEntry { .. } => 1,
            Self::Table { rows, widths, .. } => {
                let cell_columns: Vec<usize> = widths
                    .iter()
                    .map(|w| geometry.columns_for(*w).saturating_sub(2).max(1))
                    .collect();
                let body: usize = rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .zip(&cell_columns)
                            .map(|(cell, cols)| wrap(cell, *cols, *cols).len())
                            .max()
                            .unwrap_or(1)
                    })
                    .sum();
                body + rows.len() + 1
            }
        }
    }
}

fn paragraph_lines(text: &str, role: ParagraphRole, columns: usize) -> usize {
    text.split('\n').map(|line| source_line_count(line, role, columns)).sum()
}

fn source_line_count(line: &str, role: ParagraphRole, columns: usize) -> usize {
    let indent = if role == ParagraphRole::Body { FIRST_LINE_INDENT } else { 0 };
    wrap(line, columns.saturating_sub(indent), columns).len()
}

/// One page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the whole document
    pub number: u32,
    /// Blocks in reading order
    pub blocks: Vec<Block>,
}

/// Laid-out document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedDocument {
    /// Pages in order, numbered from 1
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    /// Number of pages
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every block in reading order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Page by number
    #[must_use]
    pub fn page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Page on which the first block matching `predicate` sits
    pub fn find_page(&self, mut predicate: impl FnMut(&Block) -> bool) -> Option<u32> {
        self.pages
            .iter()
            .find(|p| p.blocks.iter().any(&mut predicate))
            .map(|p| p.number)
    }
}

/// Handle to a block whose page is wanted after pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(usize);

#[derive(Debug, Clone)]
enum Entry {
    Block(Block, Option<Anchor>),
    Break,
}

/// Pages produced by one pagination pass
#[derive(Debug, Clone, Default)]
pub struct PageRun {
    /// Pages, numbered from the requested first page
    pub pages: Vec<Page>,
    anchors: HashMap<Anchor, u32>,
}

impl PageRun {
    /// Page an anchored block landed on
    #[must_use]
    pub fn page_of(&self, anchor: Anchor) -> Option<u32> {
        self.anchors.get(&anchor).copied()
    }
}

/// Block stream with explicit page breaks
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    entries: Vec<Entry>,
    anchors: usize,
}

impl DocumentBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block
    pub fn push(&mut self, block: Block) {
        self.entries.push(Entry::Block(block, None));
    }

    /// Append a block and return a handle to look up its page later
    pub fn push_anchored(&mut self, block: Block) -> Anchor {
        let anchor = Anchor(self.anchors);
        self.anchors += 1;
        self.entries.push(Entry::Block(block, Some(anchor)));
        anchor
    }

    /// Start a new page before the next block
    pub fn page_break(&mut self) {
        self.entries.push(Entry::Break);
    }

    /// Number of blocks, breaks excluded
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, Entry::Block(..))).count()
    }

    /// Whether no block was pushed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Flow the stream onto pages numbered from `first_page`
    #[must_use]
    pub fn paginate(self, geometry: &PageGeometry, first_page: u32) -> PageRun {
        let mut flow = Flow::new(geometry, first_page);
        for entry in self.entries {
            match entry {
                Entry::Break => flow.close_page(),
                Entry::Block(block, anchor) => flow.place(block, anchor),
            }
        }
        flow.finish()
    }
}

struct Flow<'g> {
    geometry: &'g PageGeometry,
    capacity: usize,
    next_number: u32,
    blocks: Vec<Block>,
    used: usize,
    run: PageRun,
}

impl<'g> Flow<'g> {
    fn new(geometry: &'g PageGeometry, first_page: u32) -> Self {
        Self {
            geometry,
            capacity: geometry.lines_per_page().max(1),
            next_number: first_page,
            blocks: Vec::new(),
            used: 0,
            run: PageRun::default(),
        }
    }

    fn close_page(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        self.run.pages.push(Page {
            number: self.next_number,
            blocks: std::mem::take(&mut self.blocks),
        });
        self.next_number += 1;
        self.used = 0;
    }

    fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.used)
    }

    fn place(&mut self, block: Block, anchor: Option<Anchor>) {
        if let Block::Paragraph { text, role } = &block {
            if text.contains('\n') && block.line_count(self.geometry) > self.remaining() {
                self.place_split(text.clone(), *role, anchor);
                return;
            }
        }

        let height = block.line_count(self.geometry);
        if height > self.remaining() && !self.blocks.is_empty() {
            self.close_page();
        }
        if height > self.capacity {
            tracing::debug!(height, capacity = self.capacity, "block taller than a page kept whole");
        }
        self.push(block, anchor, height);
    }

    fn place_split(&mut self, text: String, role: ParagraphRole, mut anchor: Option<Anchor>) {
        let columns = self.geometry.columns_for(self.geometry.usable_width());
        let mut chunk: Vec<&str> = Vec::new();
        let mut chunk_height = 0;

        for line in text.split('\n') {
            let height = source_line_count(line, role, columns);
            if chunk_height + height > self.remaining() {
                if !chunk.is_empty() {
                    let block = Block::Paragraph {
                        text: chunk.join("\n"),
                        role,
                    };
                    self.push(block, anchor.take(), chunk_height);
                    chunk.clear();
                    chunk_height = 0;
                }
                self.close_page();
            }
            chunk.push(line);
            chunk_height += height;
        }
        if !chunk.is_empty() {
            let block = Block::Paragraph {
                text: chunk.join("\n"),
                role,
            };
            self.push(block, anchor, chunk_height);
        }
    }

    fn push(&mut self, block: Block, anchor: Option<Anchor>, height: usize) {
        if let Some(anchor) = anchor {
            self.run.anchors.insert(anchor, self.next_number);
        }
        self.blocks.push(block);
        self.used += height;
    }

    fn finish(mut self) -> PageRun {
        self.close_page();
        self.run
    }
}
