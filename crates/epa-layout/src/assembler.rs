//! Document assembler
//!
//! Builds one paginated document out of generated exhibits. Each submitting
//! party gets its own section: a cover page, a table of contents, then its
//! groups in order with every exhibit's text resolved, parsed and laid out.
//!
//! Table-of-contents page numbers are only known once the body has been
//! paginated, so each party section is laid out body first and the contents
//! pages are filled in afterwards. Contents entries are one line each, so the
//! number of contents pages does not change when the numbers are filled in.

use crate::document::{Anchor, Block, DocumentBuilder, Page, PaginatedDocument};
use crate::error::LayoutResult;
use crate::numeric::{classify, format_labelled, format_value};
use crate::options::LayoutOptions;
use epa_identity::IdentityMap;
use epa_package::{DeclaredType, EvidenceItem, EvidencePackage, Party};
use epa_retry::GenerationOutcome;
use epa_structure::{parse, StructuralNode};
use std::collections::HashMap;
use tracing::{debug, info};

/// Exhibits of one group, in order, with how their generation ended
pub type AssemblyGroup<'a> = (u32, Vec<(&'a EvidenceItem, &'a GenerationOutcome)>);

const GROUP_PREFIX: &str = "证据组";

/// Lays out evidence packages
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    options: LayoutOptions,
    group_names: HashMap<u32, String>,
}

impl DocumentAssembler {
    /// Create assembler
    #[inline]
    #[must_use]
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            group_names: HashMap::new(),
        }
    }

    /// With a group display name
    #[must_use]
    pub fn with_group_name(mut self, group: u32, name: impl Into<String>) -> Self {
        self.group_names.insert(group, name.into());
        self
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Assemble groups of exhibits into one document
    ///
    /// Parties appear in order of their first exhibit. Every marker in
    /// exhibit text is resolved through `identity` before parsing.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidGeometry`](crate::LayoutError::InvalidGeometry)
    /// when the page geometry is unusable
    pub fn assemble(&self, groups: &[AssemblyGroup<'_>], identity: &IdentityMap) -> LayoutResult<PaginatedDocument> {
        self.options.validate()?;

        let mut parties: Vec<Party> = Vec::new();
        for (item, _) in groups.iter().flat_map(|(_, items)| items) {
            if !parties.contains(&item.party) {
                parties.push(item.party);
            }
        }

        let mut document = PaginatedDocument::default();
        for party in parties {
            let section: Vec<AssemblyGroup<'_>> = groups
                .iter()
                .map(|(id, items)| {
                    let own: Vec<_> = items.iter().copied().filter(|(item, _)| item.party == party).collect();
                    (*id, own)
                })
                .filter(|(_, items): &AssemblyGroup<'_>| !items.is_empty())
                .collect();
            let next_page = u32::try_from(document.pages.len()).unwrap_or(u32::MAX).saturating_add(1);
            let pages = self.assemble_party(party, &section, identity, next_page)?;
            info!(party = %party, pages = pages.len(), "party section assembled");
            document.pages.extend(pages);
        }
        Ok(document)
    }

    /// Assemble a generated package; group names come from its manifest
    ///
    /// # Errors
    /// Same as [`DocumentAssembler::assemble`]
    pub fn assemble_package(&self, package: &EvidencePackage, identity: &IdentityMap) -> LayoutResult<PaginatedDocument> {
        let mut assembler = self.clone();
        for summary in &package.index.groups {
            assembler
                .group_names
                .entry(summary.group_id)
                .or_insert_with(|| summary.group_name.clone());
        }
        let groups: Vec<AssemblyGroup<'_>> = package
            .groups()
            .into_iter()
            .map(|(id, artifacts)| (id, artifacts.into_iter().map(|a| (&a.item, &a.outcome)).collect()))
            .collect();
        assembler.assemble(&groups, identity)
    }

    fn group_heading(&self, group: u32) -> String {
        match self.group_names.get(&group) {
            Some(name) if !name.is_empty() => format!("{GROUP_PREFIX}{group}：{name}"),
            _ => format!("{GROUP_PREFIX}{group}"),
        }
    }

    fn assemble_party(
        &self,
        party: Party,
        groups: &[AssemblyGroup<'_>],
        identity: &IdentityMap,
        first_page: u32,
    ) -> LayoutResult<Vec<Page>> {
        let geometry = &self.options.geometry;

        let mut body = DocumentBuilder::new();
        let mut contents: Vec<(String, u8, Anchor)> = Vec::new();
        for (group, items) in groups {
            let heading = self.group_heading(*group);
            if self.options.evidence_page_break {
                body.page_break();
            }
            let anchor = body.push_anchored(Block::heading(heading.clone(), 1));
            contents.push((heading, 1, anchor));

            let mut attachment_table_seen = false;
            for (index, (item, outcome)) in items.iter().enumerate() {
                if self.options.evidence_page_break && index > 0 {
                    body.page_break();
                }
                let title = format!("{} {}", item.id(), identity.apply(&item.name));
                let anchor = body.push_anchored(Block::title(title.clone()));
                contents.push((title, 2, anchor));
                self.layout_item(&mut body, item, outcome, identity, &mut attachment_table_seen)?;
            }
        }

        let toc_pages = contents_builder(&contents, |_| 0).paginate(geometry, first_page + 1).pages.len();
        let body_start = first_page + 1 + u32::try_from(toc_pages).unwrap_or(u32::MAX);
        let body = body.paginate(geometry, body_start);
        let toc = contents_builder(&contents, |anchor| body.page_of(anchor).unwrap_or(body_start))
            .paginate(geometry, first_page + 1);

        let mut pages = self.cover(party, groups).paginate(geometry, first_page).pages;
        pages.extend(toc.pages);
        pages.extend(body.pages);
        Ok(pages)
    }

    fn cover(&self, party: Party, groups: &[AssemblyGroup<'_>]) -> DocumentBuilder {
        let count: usize = groups.iter().map(|(_, items)| items.len()).sum();
        let mut cover = DocumentBuilder::new();
        cover.push(Block::title(format!("{}证据材料", party.label())));
        if !self.options.case_type_label.is_empty() {
            cover.push(Block::field("案由", self.options.case_type_label.clone()));
        }
        cover.push(Block::field("提交方", party.label()));
        cover.push(Block::field("证据组数", format!("{}组", groups.len())));
        cover.push(Block::field("证据数量", format!("{count}份")));
        cover.push(Block::field(
            "生成日期",
            self.options.cover_date().format("%Y年%m月%d日").to_string(),
        ));
        cover.page_break();
        cover
    }

    fn layout_item(
        &self,
        body: &mut DocumentBuilder,
        item: &EvidenceItem,
        outcome: &GenerationOutcome,
        identity: &IdentityMap,
        attachment_table_seen: &mut bool,
    ) -> LayoutResult<()> {
        if !item.proof_purpose.trim().is_empty() {
            body.push(Block::field("证明目的", identity.apply(&item.proof_purpose)));
        }
        if outcome.is_flagged() {
            body.push(Block::note(flag_note(outcome)));
        }

        let resolved = identity.apply(outcome.content_or_empty());
        let nodes = parse(&resolved);
        if nodes.is_empty() {
            body.push(Block::paragraph("（无内容）"));
            return Ok(());
        }

        for node in nodes {
            if node.is_table() && item.declared_type() == DeclaredType::Attachment && !*attachment_table_seen {
                debug!(evidence_id = %item.id(), "page break before first attachment table");
                body.page_break();
                *attachment_table_seen = true;
            }
            body.push(self.block_for(node)?);
        }
        Ok(())
    }

    fn block_for(&self, node: StructuralNode) -> LayoutResult<Block> {
        Ok(match node {
            StructuralNode::Heading { text, level } => Block::heading(text, level.saturating_add(1)),
            StructuralNode::Field { label, value } => {
                let value = format_labelled(&label, &value);
                Block::Field { label, value }
            }
            StructuralNode::Paragraph { text, role } => Block::Paragraph { text, role },
            StructuralNode::Table { rows, header } => self.table_block(rows, header)?,
        })
    }

    fn table_block(&self, mut rows: Vec<Vec<String>>, header: bool) -> LayoutResult<Block> {
        let columns = rows.first().map_or(0, Vec::len);
        let geometry = &self.options.geometry;

        let key_value = columns == 2;
        let explicit = key_value.then(|| {
            let label = self.options.label_width();
            [label, (geometry.usable_width() - label).max(label)]
        });
        let widths = geometry.column_widths(columns, explicit.as_ref().map(|w| w.as_slice()))?;

        let kinds: Vec<_> = if header {
            rows.first().map_or_else(Vec::new, |head| head.iter().map(|h| classify(h)).collect())
        } else {
            vec![None; columns]
        };
        let body_start = usize::from(header);
        for row in rows.iter_mut().skip(body_start) {
            let row_label = if key_value { row.first().and_then(|label| classify(label)) } else { None };
            for (col, cell) in row.iter_mut().enumerate() {
                let kind = kinds.get(col).copied().flatten().or(if col == 1 { row_label } else { None });
                if let Some(formatted) = kind.and_then(|k| format_value(k, cell)) {
                    *cell = formatted;
                }
            }
        }

        Ok(Block::Table { rows, header, widths })
    }
}

fn contents_builder(entries: &[(String, u8, Anchor)], page_of: impl Fn(Anchor) -> u32) -> DocumentBuilder {
    let mut builder = DocumentBuilder::new();
    builder.push(Block::title("目  录"));
    for (text, level, anchor) in entries {
        builder.push(Block::TocEntry {
            text: text.clone(),
            level: *level,
            page: page_of(*anchor),
        });
    }
    builder
}

fn flag_note(outcome: &GenerationOutcome) -> String {
    if outcome.unresolved.is_empty() {
        let reason = outcome
            .exhaustion
            .map_or_else(|| "生成失败".to_string(), |r| r.to_string());
        format!("本证据未通过生成质量检查（{reason}），需人工核实。")
    } else {
        format!("本证据含未能解析的占位符，需人工核实：{}", outcome.unresolved.join("、"))
    }
}

/// Assemble with default options and group names
///
/// # Errors
/// Same as [`DocumentAssembler::assemble`]
pub fn assemble(groups: &[AssemblyGroup<'_>], identity: &IdentityMap) -> LayoutResult<PaginatedDocument> {
    DocumentAssembler::default().assemble(groups, identity)
}
