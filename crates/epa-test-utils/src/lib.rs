//! Testing utilities for EPA workspace
//!
//! Shared fixtures: a sample case, a scripted generation backend and tracing
//! setup for tests.

#![allow(missing_docs)]

use chrono::NaiveDate;
use epa_identity::{BankAccount, EntityProfile, IdentityMap, IdentityMapBuilder, Marker, ProfileField};
use epa_package::{
    AttachmentFacts, ContractFacts, DocumentFacts, EvidenceFacts, EvidenceGroup, EvidenceItem,
    KeyData, Party, Sourced, VoucherFacts,
};
use epa_retry::{GenerationFailure, Generator};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a test-friendly subscriber once; `RUST_LOG` controls the filter
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub fn marker(raw: &str) -> Marker {
    Marker::new(raw).unwrap()
}

fn money(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Lessor, lessee and guarantor of a finance-lease dispute
pub fn sample_profiles() -> Vec<EntityProfile> {
    vec![
        EntityProfile::company(marker("某某公司1"), "东方国际融资租赁有限公司")
            .with_registration_code("91310115MA1H7KQ25N")
            .with_address("上海市浦东新区陆家嘴环路1000号15楼")
            .with_representative("陈志远")
            .with_bank_account(BankAccount::new("中国工商银行上海市分行营业部", "1001202919026538791"))
            .with_alias(marker("东方租赁"))
            .with_field_marker(marker("某某公司1地址"), ProfileField::Address),
        EntityProfile::company(marker("某某公司2"), "南昌宏昌商业零售有限公司")
            .with_registration_code("91360100MA35F6RT3K")
            .with_address("江西省南昌市红谷滩区丰和中大道926号")
            .with_representative("刘海峰"),
        EntityProfile::person(marker("某某1"), "王建国")
            .with_registration_code("360102197805126617")
            .with_address("江西省南昌市东湖区八一大道357号"),
    ]
}

/// Identity map over [`sample_profiles`] with the default fallbacks
pub fn sample_identity_map() -> IdentityMap {
    IdentityMapBuilder::new()
        .with_profiles(sample_profiles())
        .build()
        .unwrap()
}

/// `SLOT_A` → `Harbor Leasing Co.`
pub fn harbor_identity_map() -> IdentityMap {
    IdentityMapBuilder::new()
        .with_profile(EntityProfile::company(marker("SLOT_A"), "Harbor Leasing Co."))
        .build()
        .unwrap()
}

pub fn sample_groups() -> Vec<EvidenceGroup> {
    vec![
        EvidenceGroup::new(1, "融资租赁基础法律关系"),
        EvidenceGroup::new(2, "租金支付及违约情况"),
        EvidenceGroup::new(3, "催收过程"),
    ]
}

/// Five plaintiff exhibits across three groups
pub fn sample_items() -> Vec<EvidenceItem> {
    let parties = || KeyData {
        amount: None,
        date: None,
        markers: vec![marker("某某公司1"), marker("某某公司2"), marker("某某1")],
    };

    vec![
        EvidenceItem::new(
            1,
            "《融资租赁合同》及公证书",
            Party::Plaintiff,
            1,
            EvidenceFacts::Contract(ContractFacts {
                parties: vec![
                    Sourced::case_record("某某公司1".into()),
                    Sourced::case_record("某某公司2".into()),
                ],
                contract_number: Some(Sourced::fabricated("DFZL-2021-0315".into())),
                amount: Some(Sourced::case_record(money("3600000"))),
                signed_on: Some(Sourced::case_record(date(2021, 3, 15))),
                subject_matter: Some(Sourced::fabricated("小松PC200-8挖掘机两台".into())),
                term: Some(Sourced::case_record("36个月".into())),
            }),
        )
        .with_proof_purpose("证明原告与被告之间存在融资租赁合同关系")
        .with_hints(KeyData {
            amount: Some(money("3600000")),
            date: Some(date(2021, 3, 15)),
            ..parties()
        }),
        EvidenceItem::new(
            2,
            "租赁物清单（附件一）",
            Party::Plaintiff,
            1,
            EvidenceFacts::Attachment(AttachmentFacts {
                attached_to: Some("《融资租赁合同》".into()),
                description: Some(Sourced::fabricated("租赁物名称、型号、数量及价款".into())),
                line_items: vec![
                    Sourced::fabricated("挖掘机 小松PC200-8 2台 1,800,000.00元".into()),
                ],
            }),
        ),
        EvidenceItem::new(
            3,
            "租金支付凭证",
            Party::Plaintiff,
            2,
            EvidenceFacts::Voucher(VoucherFacts {
                payer: Sourced::case_record("某某公司2".into()),
                payee: Sourced::case_record("某某公司1".into()),
                amount: Sourced::case_record(money("125000")),
                paid_on: Some(Sourced::case_record(date(2021, 4, 15))),
                purpose: Some(Sourced::fabricated("第一期租金".into())),
                voucher_number: None,
            }),
        )
        .with_proof_purpose("证明被告仅支付了第一期租金")
        .with_hints(parties()),
        EvidenceItem::new(
            4,
            "逾期租金明细表",
            Party::Plaintiff,
            2,
            EvidenceFacts::Document(DocumentFacts {
                issuer: Sourced::case_record("某某公司1".into()),
                recipient: Some(Sourced::case_record("某某公司2".into())),
                issued_on: Some(Sourced::case_record(date(2022, 1, 10))),
                document_number: None,
                summary: Some(Sourced::fabricated("列明第二期至第四期逾期租金".into())),
            }),
        ),
        EvidenceItem::new(
            5,
            "催款函/律师函",
            Party::Plaintiff,
            3,
            EvidenceFacts::Document(DocumentFacts {
                issuer: Sourced::case_record("某某律师事务所".into()),
                recipient: Some(Sourced::case_record("某某公司2".into())),
                issued_on: Some(Sourced::case_record(date(2022, 2, 20))),
                document_number: Some(Sourced::fabricated("（2022）中伦函字第018号".into())),
                summary: None,
            }),
        )
        .with_proof_purpose("证明原告已履行催告义务")
        .with_hints(parties()),
    ]
}

/// Generation backend replaying scripted replies
///
/// Replies are looked up by the evidence id in the prompt (`证据编号：E003`)
/// first, then taken from the default queue. When a queue runs dry its last
/// reply repeats; with nothing scripted at all, calls fail with an empty
/// response.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    default: VecDeque<Result<String, GenerationFailure>>,
    by_evidence: HashMap<String, VecDeque<Result<String, GenerationFailure>>>,
    last: HashMap<String, Result<String, GenerationFailure>>,
    prompts: Vec<String>,
}

const DEFAULT_KEY: &str = "";

fn evidence_id_of(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("证据编号："))
        .map(str::trim)
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same clean reply for every call
    pub fn always(text: &str) -> Self {
        Self::new().then_reply(text)
    }

    pub fn then_reply(mut self, text: &str) -> Self {
        self.default.push_back(Ok(text.to_string()));
        self
    }

    pub fn then_fail(mut self, failure: GenerationFailure) -> Self {
        self.default.push_back(Err(failure));
        self
    }

    /// Replies for one exhibit, in order
    pub fn for_evidence(mut self, evidence_id: &str, replies: &[&str]) -> Self {
        self.by_evidence
            .entry(evidence_id.to_string())
            .or_default()
            .extend(replies.iter().map(|r| Ok((*r).to_string())));
        self
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn calls(&self) -> usize {
        self.prompts.len()
    }

    fn next_for(&mut self, key: &str) -> Option<Result<String, GenerationFailure>> {
        let queue = if key == DEFAULT_KEY {
            Some(&mut self.default)
        } else {
            self.by_evidence.get_mut(key)
        }?;
        match queue.pop_front() {
            Some(reply) => {
                self.last.insert(key.to_string(), reply.clone());
                Some(reply)
            }
            None => self.last.get(key).cloned(),
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&mut self, prompt: &str) -> Result<String, GenerationFailure> {
        self.prompts.push(prompt.to_string());
        let keyed = evidence_id_of(prompt)
            .filter(|id| self.by_evidence.contains_key(*id))
            .map(str::to_string);
        keyed
            .and_then(|id| self.next_for(&id))
            .or_else(|| self.next_for(DEFAULT_KEY))
            .unwrap_or(Err(GenerationFailure::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_replies_then_default_and_repeat() {
        let mut generator = ScriptedGenerator::always("正文").for_evidence("E002", &["某某公司9", "修正稿"]);

        assert_eq!(generator.generate("证据编号：E001"), Ok("正文".to_string()));
        assert_eq!(generator.generate("证据编号：E002"), Ok("某某公司9".to_string()));
        assert_eq!(generator.generate("证据编号：E002"), Ok("修正稿".to_string()));
        assert_eq!(generator.generate("证据编号：E002"), Ok("修正稿".to_string()));
        assert_eq!(generator.generate("无编号"), Ok("正文".to_string()));
        assert_eq!(generator.calls(), 5);
    }

    #[test]
    fn unscripted_calls_fail() {
        let mut generator = ScriptedGenerator::new();
        assert_eq!(generator.generate("x"), Err(GenerationFailure::EmptyResponse));
    }

    #[test]
    fn sample_case_is_consistent() {
        let map = sample_identity_map();
        assert_eq!(map.resolve("某某公司2"), Some("南昌宏昌商业零售有限公司"));
        assert_eq!(sample_items().len(), 5);
        assert!(sample_items().iter().all(|i| epa_package::enforce(i).is_ok()));
    }
}
