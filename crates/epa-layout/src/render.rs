//! Plain-text rendering
//!
//! A preview of a [`PaginatedDocument`] on a fixed-width terminal: pages are
//! separated by a form feed and end with a centred page number.

use crate::document::{Block, Page, PaginatedDocument, FIRST_LINE_INDENT};
use crate::text::{center, display_width, pad, wrap};
use epa_structure::ParagraphRole;

/// Renders documents as plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRenderer {
    columns: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self { columns: 80 }
    }
}

impl TextRenderer {
    /// Renderer for a `columns`-wide display; at least 20 columns
    #[inline]
    #[must_use]
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(20),
        }
    }

    /// Display width in use
    #[inline]
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Render a whole document
    #[must_use]
    pub fn render(&self, document: &PaginatedDocument) -> String {
        document
            .pages
            .iter()
            .map(|page| self.render_page(page))
            .collect::<Vec<_>>()
            .join("\u{c}")
    }

    /// Render one page, footer included
    #[must_use]
    pub fn render_page(&self, page: &Page) -> String {
        let mut lines = Vec::new();
        for block in &page.blocks {
            self.render_block(block, &mut lines);
        }
        lines.push(String::new());
        lines.push(center(&format!("- {} -", page.number), self.columns));
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn render_block(&self, block: &Block, out: &mut Vec<String>) {
        let width = self.columns;
        match block {
            Block::Title { text } => {
                out.extend(wrap(text, width, width).iter().map(|l| center(l, width)));
                out.push(String::new());
            }
            Block::Heading { text, level } => {
                if *level <= 1 {
                    out.push(String::new());
                }
                out.extend(wrap(text, width, width));
            }
            Block::Field { label, value } => {
                let head = format!("{label}：");
                let hang = display_width(&head);
                let room = width.saturating_sub(hang);
                for (i, line) in wrap(value, room, room).into_iter().enumerate() {
                    let lead = if i == 0 { head.clone() } else { " ".repeat(hang) };
                    out.push(format!("{lead}{line}"));
                }
            }
            Block::Paragraph { text, role } => {
                let indent = if *role == ParagraphRole::Body { FIRST_LINE_INDENT } else { 0 };
                for source in text.split('\n') {
                    for (i, line) in wrap(source, width.saturating_sub(indent), width).into_iter().enumerate() {
                        if i == 0 {
                            out.push(format!("{}{line}", " ".repeat(indent)));
                        } else {
                            out.push(line);
                        }
                    }
                }
            }
            Block::Note { text } => {
                let head = "【注】";
                let hang = display_width(head);
                for (i, line) in wrap(text, width.saturating_sub(hang), width.saturating_sub(hang)).into_iter().enumerate() {
                    let lead = if i == 0 { head.to_string() } else { " ".repeat(hang) };
                    out.push(format!("{lead}{line}"));
                }
            }
            Block::TocEntry { text, level, page } => {
                out.push(self.toc_line(text, *level, *page));
            }
            Block::Table { rows, header, widths } => {
                out.extend(self.grid(rows, *header, widths));
            }
        }
    }

    fn toc_line(&self, text: &str, level: u8, page: u32) -> String {
        let indent = " ".repeat(usize::from(level.saturating_sub(1)) * 2);
        let number = page.to_string();
        let room = self
            .columns
            .saturating_sub(indent.len() + number.len() + 2);
        let text = wrap(text, room, room).into_iter().next().unwrap_or_default();
        let dots = room.saturating_sub(display_width(&text)).max(1);
        format!("{indent}{text} {} {number}", ".".repeat(dots))
    }

    /// Cell widths in display columns, proportional to the millimetre widths
    fn cell_columns(&self, widths: &[f32]) -> Vec<usize> {
        let n = widths.len();
        let available = self.columns.saturating_sub(3 * n + 1).max(n);
        let total: f32 = widths.iter().sum();
        widths
            .iter()
            .map(|w| {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let share = if total > 0.0 {
                    (available as f32 * w / total).floor() as usize
                } else {
                    available / n.max(1)
                };
                share.max(1)
            })
            .collect()
    }

    fn grid(&self, rows: &[Vec<String>], header: bool, widths: &[f32]) -> Vec<String> {
        let cells = self.cell_columns(widths);
        let rule = |ch: char| {
            let mut line = String::from("+");
            for w in &cells {
                line.push_str(&ch.to_string().repeat(w + 2));
                line.push('+');
            }
            line
        };

        let mut out = vec![rule('-')];
        for (r, row) in rows.iter().enumerate() {
            let wrapped: Vec<Vec<String>> = cells
                .iter()
                .enumerate()
                .map(|(c, w)| wrap(row.get(c).map_or("", String::as_str), *w, *w))
                .collect();
            let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            for i in 0..height {
                let mut line = String::from("|");
                for (cell, w) in wrapped.iter().zip(&cells) {
                    let text = cell.get(i).map_or("", String::as_str);
                    line.push(' ');
                    line.push_str(&pad(text, *w));
                    line.push_str(" |");
                }
                out.push(line);
            }
            out.push(rule(if header && r == 0 { '=' } else { '-' }));
        }
        out
    }
}
