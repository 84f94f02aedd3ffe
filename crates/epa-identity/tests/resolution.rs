//! Identity resolution properties
//!
//! Covers idempotence of [`IdentityMap::apply`] (including markers that occur
//! inside their own replacement), longest-marker precedence and the
//! cross-document consistency a shared map provides.

use epa_identity::{EntityProfile, IdentityMap, IdentityMapBuilder, Marker, ProfileField};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn marker(s: &str) -> Marker {
    Marker::new(s).unwrap()
}

fn case_map() -> IdentityMap {
    IdentityMapBuilder::new()
        .with_profile(
            EntityProfile::company(marker("某某公司1"), "东方国际融资租赁有限公司")
                .with_address("上海市浦东新区世纪大道100号")
                .with_field_marker(marker("某某公司1地址"), ProfileField::Address),
        )
        .with_profile(EntityProfile::company(marker("某某公司12"), "南昌宏昌商业零售有限公司"))
        .with_profile(EntityProfile::company(marker("SLOT_A"), "Harbor Leasing Co."))
        .with_profile(EntityProfile::person(marker("张某"), "张伟"))
        .build()
        .unwrap()
}

fn fragment() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("某某公司1"),
        Just("某某公司12"),
        Just("某某公司1地址"),
        Just("SLOT_A"),
        Just("张某"),
        Just("某某银行"),
        Just("某"),
        Just("【】"),
        Just("（ ）"),
        Just(" "),
        Just("，"),
        Just("签署"),
        Just("2021年XX月"),
        Just("日"),
        Just("\n"),
    ]
}

fn aliased_map() -> IdentityMap {
    IdentityMapBuilder::new()
        .without_fallbacks()
        .with_profile(EntityProfile::company(marker("某某公司1"), "宏昌租赁有限公司").with_alias(marker("宏昌租赁")))
        .with_override("东方", "上海东方国际租赁")
        .build()
        .unwrap()
}

fn aliased_fragment() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("宏昌租赁"),
        Just("宏昌租赁有限公司"),
        Just("宏昌"),
        Just("有限公司"),
        Just("某某公司1"),
        Just("东方"),
        Just("上海东方国际租赁"),
        Just("某"),
        Just("【】"),
        Just("与"),
        Just(" "),
    ]
}

proptest! {
    #[test]
    fn prop_marker_inside_replacement_is_idempotent(parts in proptest::collection::vec(aliased_fragment(), 0..24)) {
        let map = aliased_map();
        let text: String = parts.concat();
        let once = map.apply(&text);
        prop_assert!(!once.contains("某某公司1"));
        prop_assert_eq!(map.apply(&once), once);
    }

    #[test]
    fn prop_resolution_is_idempotent(parts in proptest::collection::vec(fragment(), 0..24)) {
        let map = case_map();
        let text: String = parts.concat();
        let once = map.apply(&text);
        prop_assert_eq!(map.apply(&once), once);
    }

    #[test]
    fn prop_longer_marker_always_wins(parts in proptest::collection::vec(
        prop_oneof![Just("甲方公司"), Just("甲方公司上海分部"), Just("上海分部"), Just("与"), Just(" ")],
        0..20,
    )) {
        let map = IdentityMapBuilder::new()
            .without_fallbacks()
            .with_override("甲方公司", "Alpha")
            .with_override("甲方公司上海分部", "Beta")
            .build()
            .unwrap();

        let text: String = parts.concat();
        let resolved = map.apply(&text);

        prop_assert_eq!(
            resolved.matches("Beta").count(),
            text.matches("甲方公司上海分部").count()
        );
        prop_assert!(!resolved.contains("Alpha上海分部"));
        prop_assert!(!resolved.contains("甲方公司"));
    }
}

#[test]
fn alias_expands_once_and_stays_expanded() {
    let map = aliased_map();
    let once = map.apply("出租人宏昌租赁与承租人签约");
    assert_eq!(once, "出租人宏昌租赁有限公司与承租人签约");
    assert_eq!(map.apply(&once), once);
    assert_eq!(map.apply("上海东方国际租赁与东方"), "上海东方国际租赁与上海东方国际租赁");
}

#[test]
fn harbor_leasing_example() {
    let map = case_map();
    assert_eq!(
        map.apply("SLOT_A某 signed on DATE_PLACEHOLDER"),
        "Harbor Leasing Co. signed on DATE_PLACEHOLDER"
    );
}

#[test]
fn shared_map_keeps_documents_consistent() {
    let map = case_map();
    let contract = map.apply("出租人：某某公司1\n承租人：某某公司12");
    let voucher = map.apply("收款单位：某某公司 1（盖章）\n付款单位：某某公司（12）");

    for name in ["东方国际融资租赁有限公司", "南昌宏昌商业零售有限公司"] {
        assert!(contract.contains(name));
        assert!(voucher.contains(name));
    }
}

#[test]
fn field_marker_and_fallback_resolution() {
    let map = case_map();
    assert_eq!(
        map.apply("住所地：某某公司1地址，开户行：某某银行"),
        "住所地：上海市浦东新区世纪大道100号，开户行：中国工商银行"
    );
}

#[test]
fn unmapped_marker_left_in_place() {
    let map = case_map();
    let text = "担保人某某公司7与张某签署";
    assert_eq!(map.apply(text), "担保人某某公司7与张伟签署");
}

#[test]
fn partial_dates_canonicalised() {
    let map = case_map();
    assert_eq!(map.apply("签订日期：2021年XX月××日"), "签订日期：2021年X月X日");
}
