//! Line-oriented structural parser
//!
//! Precedence per line: table run, heading, clause, field, prose. A heading
//! marker therefore never becomes a field label, and a table line never
//! becomes anything else unless its block is too short to be a table.

use crate::line::{self, FieldRejection};
use crate::node::StructuralNode;
use crate::prestage;
use crate::table;

/// Structural parser with an optional extended furniture blacklist
#[derive(Debug, Clone, Default)]
pub struct Parser {
    extra_furniture: Vec<String>,
}

impl Parser {
    /// Parser with the built-in furniture blacklist
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat this exact label as furniture
    #[must_use]
    pub fn with_furniture_label(mut self, label: impl Into<String>) -> Self {
        self.extra_furniture.push(label.into());
        self
    }

    /// Parse raw generated text into ordered nodes
    ///
    /// Empty input yields an empty list. Never fails: ambiguous blocks are
    /// downgraded to paragraphs.
    #[must_use]
    pub fn parse(&self, raw: &str) -> Vec<StructuralNode> {
        let text = prestage::prepare(raw);
        let lines: Vec<&str> = text.lines().collect();
        let mut out = NodeSink::default();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();

            if line.is_empty() {
                out.end_paragraph();
                i += 1;
                continue;
            }

            if table::is_table_line(line) {
                let start = i;
                while i < lines.len() && table::is_table_line(lines[i]) {
                    i += 1;
                }
                let block = &lines[start..i];
                out.end_paragraph();
                match table::build(block) {
                    Some(node) => out.push(node),
                    None => out.push(StructuralNode::paragraph(
                        block.iter().map(|l| l.trim()).collect::<Vec<_>>().join("\n"),
                    )),
                }
                continue;
            }

            if let Some((text, level)) = line::heading(line) {
                out.push(StructuralNode::heading(text, level));
            } else if line::is_clause(line) {
                out.push(StructuralNode::clause(line));
            } else {
                match self.field(line) {
                    Ok((label, value)) => out.push(StructuralNode::field(label, value)),
                    Err(FieldRejection::Furniture) => {
                        tracing::trace!(line, "furniture label kept as prose");
                        out.prose(line);
                    }
                    Err(FieldRejection::NotAField) => out.prose(line),
                }
            }
            i += 1;
        }

        let nodes = out.finish();
        tracing::debug!(nodes = nodes.len(), "parsed structural nodes");
        nodes
    }

    fn field(&self, line: &str) -> Result<(String, String), FieldRejection> {
        let (label, value) = line::field(line)?;
        if self.extra_furniture.iter().any(|f| f == &label) {
            return Err(FieldRejection::Furniture);
        }
        Ok((label, value))
    }
}

/// Parse with the default parser
#[must_use]
pub fn parse(raw: &str) -> Vec<StructuralNode> {
    Parser::new().parse(raw)
}

#[derive(Default)]
struct NodeSink {
    nodes: Vec<StructuralNode>,
    prose: Vec<String>,
}

impl NodeSink {
    fn prose(&mut self, line: &str) {
        self.prose.push(line.to_string());
    }

    fn push(&mut self, node: StructuralNode) {
        self.end_paragraph();
        self.nodes.push(node);
    }

    fn end_paragraph(&mut self) {
        if !self.prose.is_empty() {
            let text = self.prose.join("\n");
            self.prose.clear();
            self.nodes.push(StructuralNode::paragraph(text));
        }
    }

    fn finish(mut self) -> Vec<StructuralNode> {
        self.end_paragraph();
        self.nodes
    }
}
