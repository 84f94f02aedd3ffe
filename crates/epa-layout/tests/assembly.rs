//! Generated package → paginated document → plain text

use chrono::NaiveDate;
use epa_layout::{Block, DocumentAssembler, LayoutOptions, PaginatedDocument, TextRenderer};
use epa_package::{EvidencePackage, EvidencePackageGenerator, MemoryArtifactStore, PackageConfig};
use epa_test_utils::{init_tracing, sample_groups, sample_identity_map, sample_items, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const CONTRACT_REPLY: &str = "出租人：某某公司1\n承租人：某某公司2\n租金总额：3600000元\n\n1.1 承租人应按期足额支付租金。";
const SCHEDULE_REPLY: &str =
    "租赁物清单如下\n| 名称 | 型号 | 数量 | 价款 |\n|---|---|---|---|\n| 挖掘机 | 小松PC200-8 | 2 | 1800000 |";
const STUBBORN_REPLY: &str = "付款人：某某公司2\n收款人：某某公司5";

fn package(config: &PackageConfig) -> EvidencePackage {
    let mut generator = EvidencePackageGenerator::new(
        config.clone(),
        Arc::new(sample_identity_map()),
        MemoryArtifactStore::new(),
    );
    for group in sample_groups() {
        generator = generator.with_group(group);
    }
    let mut backend = ScriptedGenerator::always(CONTRACT_REPLY)
        .for_evidence("E002", &[SCHEDULE_REPLY])
        .for_evidence("E003", &[STUBBORN_REPLY]);
    generator.generate(&sample_items(), &mut backend).unwrap()
}

fn layout(config: &PackageConfig) -> PaginatedDocument {
    let options = LayoutOptions::from(config).with_generated_on(NaiveDate::from_ymd_opt(2022, 3, 1).unwrap());
    DocumentAssembler::new(options)
        .assemble_package(&package(config), &sample_identity_map())
        .unwrap()
}

fn config() -> PackageConfig {
    PackageConfig::default()
        .with_max_retries(1)
        .with_case_type_label("融资租赁合同纠纷")
}

#[test]
fn sample_case_lays_out_with_matching_contents() {
    init_tracing();
    let doc = layout(&config());

    assert_eq!(doc.pages[0].blocks[0], Block::title("原告证据材料"));
    assert!(doc.pages[0].blocks.contains(&Block::field("案由", "融资租赁合同纠纷")));
    assert!(doc.pages[0].blocks.contains(&Block::field("证据数量", "5份")));

    let entries: Vec<(String, u32)> = doc
        .blocks()
        .filter_map(|b| match b {
            Block::TocEntry { text, page, .. } => Some((text.clone(), *page)),
            _ => None,
        })
        .collect();
    assert_eq!(entries.len(), 3 + 5);
    assert_eq!(entries[0].0, "证据组1：融资租赁基础法律关系");
    assert_eq!(entries[1].0, "E001 《融资租赁合同》及公证书");
    for (text, page) in &entries {
        let landed = doc.find_page(|b| match b {
            Block::Heading { text: t, level: 1 } | Block::Title { text: t } => t == text,
            _ => false,
        });
        assert_eq!(landed, Some(*page), "contents entry {text}");
    }
    assert_eq!(
        doc.pages.iter().map(|p| p.number).collect::<Vec<_>>(),
        (1..=u32::try_from(doc.page_count()).unwrap()).collect::<Vec<_>>()
    );
}

#[test]
fn resolved_text_and_formatted_numbers() {
    let doc = layout(&config());

    assert!(doc.blocks().any(|b| *b == Block::field("出租人", "东方国际融资租赁有限公司")));
    assert!(doc.blocks().any(|b| *b == Block::field("租金总额", "3,600,000.00元")));
    let schedule = doc
        .blocks()
        .find_map(|b| match b {
            Block::Table { rows, header: true, .. } => Some(rows.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(schedule[1], vec!["挖掘机", "小松PC200-8", "2", "1,800,000.00"]);
}

#[test]
fn attachment_table_opens_a_page() {
    let doc = layout(&config());
    let page = doc.pages.iter().find(|p| p.blocks.iter().any(Block::is_table)).unwrap();
    assert!(page.blocks[0].is_table());
}

#[test]
fn flagged_exhibit_noted_not_dropped() {
    let doc = layout(&config());
    let mut blocks = doc.blocks().skip_while(|b| !matches!(b, Block::Title { text } if text.starts_with("E003")));
    assert_eq!(blocks.next(), Some(&Block::title("E003 租金支付凭证")));
    assert_eq!(blocks.next(), Some(&Block::field("证明目的", "证明被告仅支付了第一期租金")));
    assert_eq!(
        blocks.next(),
        Some(&Block::note("本证据含未能解析的占位符，需人工核实：某某公司5"))
    );
}

#[test]
fn per_exhibit_pagination() {
    let doc = layout(&config().with_evidence_page_break(true));

    for page in &doc.pages {
        let titles = page
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Title { text } if text.starts_with('E')))
            .count();
        assert!(titles <= 1, "page {} holds {titles} exhibits", page.number);
        let Some(position) = page
            .blocks
            .iter()
            .position(|b| matches!(b, Block::Title { text } if text.starts_with('E')))
        else {
            continue;
        };
        assert!(position == 0 || matches!(page.blocks[0], Block::Heading { level: 1, .. }));
        assert_eq!(position, usize::from(position != 0));
    }
}

#[test]
fn rendered_preview() {
    let doc = layout(&config());
    let text = TextRenderer::new(60).render(&doc);

    assert_eq!(text.matches('\u{c}').count(), doc.page_count() - 1);
    assert!(text.contains("东方国际融资租赁有限公司"));
    assert!(text.contains("目  录"));
    assert!(!text.contains("某某公司1"));
}
