//! End-to-end package generation over the sample finance-lease case

use epa_package::{
    DocumentFacts, EntryStatus, EvidenceFacts, EvidenceIndex, EvidenceItem, EvidencePackageGenerator,
    FsArtifactStore, MemoryArtifactStore, PackageConfig, PackageError, Party, Sourced,
};
use epa_identity::{EntityProfile, IdentityMapBuilder};
use epa_retry::CancellationToken;
use epa_test_utils::{init_tracing, marker, sample_groups, sample_identity_map, sample_items, ScriptedGenerator};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const CLEAN_REPLY: &str = "出租人：某某公司1\n承租人：某某公司2\n保证人：某某1";

fn generator<S: epa_package::ArtifactStore>(store: S) -> EvidencePackageGenerator<S> {
    let mut generator = EvidencePackageGenerator::new(
        PackageConfig::default().with_max_retries(2),
        Arc::new(sample_identity_map()),
        store,
    );
    for group in sample_groups() {
        generator = generator.with_group(group);
    }
    generator
}

#[test]
fn sample_case_with_one_stubborn_exhibit() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let generator = generator(FsArtifactStore::new(dir.path()));
    let mut backend = ScriptedGenerator::always(CLEAN_REPLY)
        .for_evidence("E003", &["付款人：某某公司2\n收款人：某某公司5"]);

    let package = generator.generate(&sample_items(), &mut backend).unwrap();

    // index
    assert_eq!(package.index.total, 5);
    assert_eq!(
        package
            .index
            .groups
            .iter()
            .map(|g| (g.group_name.as_str(), g.item_count))
            .collect::<Vec<_>>(),
        vec![("融资租赁基础法律关系", 2), ("租金支付及违约情况", 2), ("催收过程", 1)]
    );
    let flagged: Vec<_> = package.index.flagged().collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].id, "E003");
    assert_eq!(flagged[0].attempts, 3);
    assert_eq!(flagged[0].unresolved, vec!["某某公司5"]);

    // flagged exhibit still written, dirty content kept, identities resolved
    let stubborn = std::fs::read_to_string(dir.path().join(&flagged[0].path)).unwrap();
    assert_eq!(stubborn, "付款人：南昌宏昌商业零售有限公司\n收款人：某某公司5");
    let first = std::fs::read_to_string(dir.path().join("证据组1/证据组1_E001_融资租赁合同.txt")).unwrap();
    assert_eq!(first, "出租人：东方国际融资租赁有限公司\n承租人：南昌宏昌商业零售有限公司\n保证人：王建国");
    assert_eq!(
        package.index.entry("E005").map(|e| e.path.clone()),
        Some("证据组3/证据组3_E005_催款函和律师函.txt".into())
    );

    // manifest and report on disk
    let manifest = std::fs::read_to_string(dir.path().join("evidence_index.json")).unwrap();
    assert_eq!(EvidenceIndex::from_json(&manifest).unwrap(), package.index);
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("generation_report.json")).unwrap())
            .unwrap();
    assert_eq!(report["flagged"], 1);
    assert_eq!(report["clean"], 4);

    // prompts never carry markers
    assert_eq!(backend.calls(), 4 + 3);
    assert!(backend.prompts().iter().all(|p| !p.contains("某某")));
    assert!(backend.prompts()[0].contains("东方国际融资租赁有限公司"));
}

#[test]
fn invented_party_aborts_before_generation() {
    let store = MemoryArtifactStore::new();
    let generator = generator(&store);
    let mut items = sample_items();
    items.push(EvidenceItem::new(
        6,
        "担保函",
        Party::Plaintiff,
        1,
        EvidenceFacts::Document(DocumentFacts {
            issuer: Sourced::fabricated("星河担保有限公司".into()),
            recipient: None,
            issued_on: None,
            document_number: None,
            summary: None,
        }),
    ));
    let mut backend = ScriptedGenerator::always(CLEAN_REPLY);

    let err = generator.generate(&items, &mut backend).unwrap_err();
    assert!(matches!(err, PackageError::Policy(ref v) if v.evidence_id == "E006"));
    assert_eq!(backend.calls(), 0);
    assert!(store.is_empty());
}

#[test]
fn cancelled_run_still_indexes_every_exhibit() {
    let token = CancellationToken::new();
    token.cancel();
    let store = MemoryArtifactStore::new();
    let generator = generator(&store).with_cancellation(token);
    let mut backend = ScriptedGenerator::always(CLEAN_REPLY);

    let package = generator.generate(&sample_items(), &mut backend).unwrap();
    assert_eq!(backend.calls(), 0);
    assert_eq!(package.index.total, 5);
    assert!(package.index.entries.iter().all(|e| e.status == EntryStatus::Flagged && e.byte_size == 0));
    assert_eq!(store.len(), 5 + 2);
}

#[test]
fn short_name_alias_inside_legal_name_stays_clean() {
    let identity = IdentityMapBuilder::new()
        .with_profile(EntityProfile::company(marker("某某公司1"), "宏昌租赁有限公司").with_alias(marker("宏昌租赁")))
        .build()
        .unwrap();
    let store = MemoryArtifactStore::new();
    let generator = EvidencePackageGenerator::new(PackageConfig::default(), Arc::new(identity), &store);
    let mut backend = ScriptedGenerator::always("出租人：宏昌租赁\n签收单位：某某公司1");

    let package = generator.generate(&[notice(1, 1)], &mut backend).unwrap();
    assert_eq!(package.index.entries[0].status, EntryStatus::Clean);
    assert_eq!(backend.calls(), 1);
    assert_eq!(
        store.read_to_string(&package.index.entries[0].path).as_deref(),
        Some("出租人：宏昌租赁有限公司\n签收单位：宏昌租赁有限公司")
    );
}

fn notice(sequence: u32, group: u32) -> EvidenceItem {
    EvidenceItem::new(
        sequence,
        "催款函",
        Party::Plaintiff,
        group,
        EvidenceFacts::Document(DocumentFacts {
            issuer: Sourced::case_record("某某公司1".into()),
            recipient: None,
            issued_on: None,
            document_number: None,
            summary: None,
        }),
    )
}

proptest! {
    #[test]
    fn prop_index_complete(groups in proptest::collection::vec(1u32..6, 0..24)) {
        let items: Vec<EvidenceItem> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| notice(u32::try_from(i).unwrap() + 1, *g))
            .collect();
        let generator = EvidencePackageGenerator::new(
            PackageConfig::default(),
            Arc::new(sample_identity_map()),
            MemoryArtifactStore::new(),
        );
        let mut backend = ScriptedGenerator::always("正文");

        let index = generator.generate(&items, &mut backend).unwrap().index;
        let distinct: BTreeSet<u32> = groups.iter().copied().collect();

        prop_assert_eq!(index.total, items.len());
        prop_assert_eq!(index.entries.len(), items.len());
        prop_assert_eq!(index.groups.iter().map(|g| g.item_count).sum::<usize>(), items.len());
        prop_assert_eq!(index.group_count, distinct.len());
    }
}
