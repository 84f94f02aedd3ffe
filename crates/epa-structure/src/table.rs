//! Markdown-style table blocks

use crate::node::StructuralNode;

/// Whether a trimmed line is bounded by column separators on both ends
#[must_use]
pub fn is_table_line(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

/// Cells between the outer separators, trimmed, whitespace collapsed
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let inner = line
        .strip_prefix('|')
        .and_then(|l| l.strip_suffix('|'))
        .unwrap_or(line);
    inner
        .split('|')
        .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Whether a row consists only of alignment marks (`---`, `:---:`)
#[must_use]
pub fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().any(|c| c.contains('-'))
        && cells
            .iter()
            .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Build a table node from a contiguous run of table lines
///
/// Returns `None` when fewer than two rows remain after separator removal
/// and continuation merging; the caller then degrades the block to prose.
#[must_use]
pub fn build(lines: &[&str]) -> Option<StructuralNode> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut header = false;

    for line in lines {
        let cells = split_cells(line);
        if is_separator_row(&cells) {
            header |= rows.len() == 1;
            continue;
        }

        let populated: Vec<&String> = cells.iter().filter(|c| !c.is_empty()).collect();
        if populated.is_empty() {
            continue;
        }

        let continues_previous = populated.len() == 1
            && rows
                .last()
                .is_some_and(|prev| prev.iter().filter(|c| !c.is_empty()).count() > 1);
        if continues_previous {
            let text = populated[0].clone();
            if let Some(last_cell) = rows.last_mut().and_then(|prev| prev.last_mut()) {
                if last_cell.is_empty() {
                    *last_cell = text;
                } else {
                    last_cell.push('\n');
                    last_cell.push_str(&text);
                }
            }
            continue;
        }

        rows.push(cells);
    }

    if rows.len() < 2 {
        tracing::debug!(rows = rows.len(), "table block too short, degrading to paragraph");
        return None;
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(columns, String::new());
    }
    Some(StructuralNode::Table { rows, header })
}
