//! Evidence data model
//!
//! # Core Concepts
//!
//! - [`EvidenceItem`]: one exhibit as planned upstream; never mutated here
//! - [`EvidenceFacts`]: typed fact set per declared evidence type
//! - [`Sourced`]: a fact value tagged with where it came from
//! - [`FactField`]: addressable fact slot, the unit the fabrication policy rules on

use chrono::NaiveDate;
use epa_identity::Marker;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Side of the case that submits an exhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// 原告
    Plaintiff,
    /// 被告
    Defendant,
    /// 第三人
    ThirdParty,
}

impl Party {
    /// Label used in documents
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plaintiff => "原告",
            Self::Defendant => "被告",
            Self::ThirdParty => "第三人",
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared evidence type, derived from the fact variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    /// Contracts and agreements
    Contract,
    /// Payment vouchers, receipts, bank slips
    Voucher,
    /// Notices, letters, certificates
    Document,
    /// Schedules and lists attached to another exhibit
    Attachment,
}

impl DeclaredType {
    /// Label used in documents
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contract => "合同类",
            Self::Voucher => "凭证类",
            Self::Document => "文书类",
            Self::Attachment => "附件类",
        }
    }
}

impl DeclaredType {
    /// Fact slots a fact set of this type can carry
    #[must_use]
    pub const fn fields(self) -> &'static [FactField] {
        match self {
            Self::Contract => &[
                FactField::ContractParty,
                FactField::ContractNumber,
                FactField::Amount,
                FactField::Date,
                FactField::SubjectMatter,
                FactField::Term,
            ],
            Self::Voucher => &[
                FactField::Payer,
                FactField::Payee,
                FactField::Amount,
                FactField::Date,
                FactField::Purpose,
                FactField::VoucherNumber,
            ],
            Self::Document => &[
                FactField::Issuer,
                FactField::Recipient,
                FactField::Date,
                FactField::DocumentNumber,
                FactField::Summary,
            ],
            Self::Attachment => &[FactField::Description, FactField::LineItem],
        }
    }
}

impl Display for DeclaredType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Origin of a fact value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Taken from the source judgment or case setup
    CaseRecord,
    /// Invented during planning
    Fabricated,
}

/// Fact value with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sourced<T> {
    /// The value
    pub value: T,
    /// Where it came from
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    /// Value taken from the case record
    #[inline]
    #[must_use]
    pub fn case_record(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::CaseRecord,
        }
    }

    /// Value invented during planning
    #[inline]
    #[must_use]
    pub fn fabricated(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Fabricated,
        }
    }
}

/// Addressable fact slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactField {
    /// Contracting party
    ContractParty,
    /// Contract number
    ContractNumber,
    /// Money amount of a contract or payment
    Amount,
    /// Signing, payment or issue date
    Date,
    /// Leased or sold goods, equipment descriptions
    SubjectMatter,
    /// Contract term
    Term,
    /// Paying party
    Payer,
    /// Receiving party
    Payee,
    /// Payment purpose
    Purpose,
    /// Voucher, receipt or transfer number
    VoucherNumber,
    /// Issuing party of a document
    Issuer,
    /// Addressee of a document
    Recipient,
    /// Document reference number
    DocumentNumber,
    /// Document content summary
    Summary,
    /// Attachment description
    Description,
    /// Attachment schedule line
    LineItem,
}

impl FactField {
    /// Label used in prompts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ContractParty => "合同当事人",
            Self::ContractNumber => "合同编号",
            Self::Amount => "金额",
            Self::Date => "日期",
            Self::SubjectMatter => "标的物",
            Self::Term => "期限",
            Self::Payer => "付款方",
            Self::Payee => "收款方",
            Self::Purpose => "用途",
            Self::VoucherNumber => "凭证编号",
            Self::Issuer => "出具方",
            Self::Recipient => "接收方",
            Self::DocumentNumber => "文号",
            Self::Summary => "内容摘要",
            Self::Description => "附件说明",
            Self::LineItem => "清单明细",
        }
    }
}

/// Contract facts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFacts {
    /// Contracting parties, usually markers
    #[serde(default)]
    pub parties: Vec<Sourced<String>>,
    /// Contract number
    #[serde(default)]
    pub contract_number: Option<Sourced<String>>,
    /// Total contract amount
    #[serde(default)]
    pub amount: Option<Sourced<Decimal>>,
    /// Signing date
    #[serde(default)]
    pub signed_on: Option<Sourced<NaiveDate>>,
    /// Goods or equipment
    #[serde(default)]
    pub subject_matter: Option<Sourced<String>>,
    /// Contract term, free text
    #[serde(default)]
    pub term: Option<Sourced<String>>,
}

/// Payment voucher facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherFacts {
    /// Paying party
    pub payer: Sourced<String>,
    /// Receiving party
    pub payee: Sourced<String>,
    /// Amount paid
    pub amount: Sourced<Decimal>,
    /// Payment date
    #[serde(default)]
    pub paid_on: Option<Sourced<NaiveDate>>,
    /// Payment purpose
    #[serde(default)]
    pub purpose: Option<Sourced<String>>,
    /// Voucher number
    #[serde(default)]
    pub voucher_number: Option<Sourced<String>>,
}

/// Notice, letter or certificate facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFacts {
    /// Issuing party
    pub issuer: Sourced<String>,
    /// Addressee
    #[serde(default)]
    pub recipient: Option<Sourced<String>>,
    /// Issue date
    #[serde(default)]
    pub issued_on: Option<Sourced<NaiveDate>>,
    /// Reference number
    #[serde(default)]
    pub document_number: Option<Sourced<String>>,
    /// What the document says
    #[serde(default)]
    pub summary: Option<Sourced<String>>,
}

/// Attachment facts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFacts {
    /// Name of the exhibit this is attached to
    #[serde(default)]
    pub attached_to: Option<String>,
    /// What the attachment is
    #[serde(default)]
    pub description: Option<Sourced<String>>,
    /// Schedule lines
    #[serde(default)]
    pub line_items: Vec<Sourced<String>>,
}

/// Typed fact set of an exhibit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceFacts {
    /// Contract
    Contract(ContractFacts),
    /// Payment voucher
    Voucher(VoucherFacts),
    /// Notice, letter or certificate
    Document(DocumentFacts),
    /// Attachment schedule
    Attachment(AttachmentFacts),
}

/// One fact rendered as text, with its slot and origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactEntry {
    /// Slot
    pub field: FactField,
    /// Value as text
    pub value: String,
    /// Origin
    pub provenance: Provenance,
}

fn entry<T: Display>(field: FactField, sourced: &Sourced<T>) -> FactEntry {
    FactEntry {
        field,
        value: sourced.value.to_string(),
        provenance: sourced.provenance,
    }
}

fn money(sourced: &Sourced<Decimal>) -> FactEntry {
    FactEntry {
        field: FactField::Amount,
        value: format!("{}元", sourced.value.round_dp(2)),
        provenance: sourced.provenance,
    }
}

fn date(sourced: &Sourced<NaiveDate>) -> FactEntry {
    FactEntry {
        field: FactField::Date,
        value: sourced.value.format("%Y年%-m月%-d日").to_string(),
        provenance: sourced.provenance,
    }
}

impl EvidenceFacts {
    /// Declared type of this fact set
    #[must_use]
    pub const fn declared_type(&self) -> DeclaredType {
        match self {
            Self::Contract(_) => DeclaredType::Contract,
            Self::Voucher(_) => DeclaredType::Voucher,
            Self::Document(_) => DeclaredType::Document,
            Self::Attachment(_) => DeclaredType::Attachment,
        }
    }

    /// Every present fact, in field declaration order of the variant
    #[must_use]
    pub fn entries(&self) -> Vec<FactEntry> {
        let mut out = Vec::new();
        match self {
            Self::Contract(c) => {
                out.extend(c.parties.iter().map(|p| entry(FactField::ContractParty, p)));
                out.extend(c.contract_number.iter().map(|n| entry(FactField::ContractNumber, n)));
                out.extend(c.amount.iter().map(money));
                out.extend(c.signed_on.iter().map(date));
                out.extend(c.subject_matter.iter().map(|s| entry(FactField::SubjectMatter, s)));
                out.extend(c.term.iter().map(|t| entry(FactField::Term, t)));
            }
            Self::Voucher(v) => {
                out.push(entry(FactField::Payer, &v.payer));
                out.push(entry(FactField::Payee, &v.payee));
                out.push(money(&v.amount));
                out.extend(v.paid_on.iter().map(date));
                out.extend(v.purpose.iter().map(|p| entry(FactField::Purpose, p)));
                out.extend(v.voucher_number.iter().map(|n| entry(FactField::VoucherNumber, n)));
            }
            Self::Document(d) => {
                out.push(entry(FactField::Issuer, &d.issuer));
                out.extend(d.recipient.iter().map(|r| entry(FactField::Recipient, r)));
                out.extend(d.issued_on.iter().map(date));
                out.extend(d.document_number.iter().map(|n| entry(FactField::DocumentNumber, n)));
                out.extend(d.summary.iter().map(|s| entry(FactField::Summary, s)));
            }
            Self::Attachment(a) => {
                out.extend(a.description.iter().map(|d| entry(FactField::Description, d)));
                out.extend(a.line_items.iter().map(|l| entry(FactField::LineItem, l)));
            }
        }
        out
    }
}

/// Key-data hints planning attaches to an exhibit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyData {
    /// Headline amount
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Headline date
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Entity markers the exhibit involves
    #[serde(default)]
    pub markers: Vec<Marker>,
}

/// One exhibit as planned upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Sequence number, unique within a party's package
    pub sequence: u32,
    /// Full exhibit name, e.g. `《融资租赁合同》及公证书`
    pub name: String,
    /// Submitting party
    pub party: Party,
    /// Evidence group id
    pub group: u32,
    /// What the exhibit is offered to prove
    #[serde(default)]
    pub proof_purpose: String,
    /// Typed facts
    pub facts: EvidenceFacts,
    /// Key-data hints
    #[serde(default)]
    pub hints: KeyData,
    /// Artifact file extension
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "txt".to_string()
}

impl EvidenceItem {
    /// Create item with empty hints and a `txt` artifact
    #[must_use]
    pub fn new(
        sequence: u32,
        name: impl Into<String>,
        party: Party,
        group: u32,
        facts: EvidenceFacts,
    ) -> Self {
        Self {
            sequence,
            name: name.into(),
            party,
            group,
            proof_purpose: String::new(),
            facts,
            hints: KeyData::default(),
            extension: default_extension(),
        }
    }

    /// With proof purpose
    #[inline]
    #[must_use]
    pub fn with_proof_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.proof_purpose = purpose.into();
        self
    }

    /// With key-data hints
    #[inline]
    #[must_use]
    pub fn with_hints(mut self, hints: KeyData) -> Self {
        self.hints = hints;
        self
    }

    /// Evidence id, `E` plus the zero-padded sequence
    #[must_use]
    pub fn id(&self) -> String {
        crate::naming::evidence_id(self.sequence)
    }

    /// Declared type, from the fact variant
    #[inline]
    #[must_use]
    pub fn declared_type(&self) -> DeclaredType {
        self.facts.declared_type()
    }
}

/// Named evidence group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceGroup {
    /// Group id
    pub id: u32,
    /// Display name, e.g. `融资租赁基础法律关系`
    pub name: String,
}

impl EvidenceGroup {
    /// Create group
    #[inline]
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn declared_type_follows_variant() {
        let item = EvidenceItem::new(
            3,
            "租金支付凭证",
            Party::Plaintiff,
            2,
            EvidenceFacts::Voucher(VoucherFacts {
                payer: Sourced::case_record("某某公司2".into()),
                payee: Sourced::case_record("某某公司1".into()),
                amount: Sourced::case_record(dec("125000")),
                paid_on: None,
                purpose: None,
                voucher_number: Some(Sourced::fabricated("HD20210415".into())),
            }),
        );
        assert_eq!(item.declared_type(), DeclaredType::Voucher);
        assert_eq!(item.id(), "E003");
    }

    #[test]
    fn entries_render_amounts_and_dates() {
        let facts = EvidenceFacts::Contract(ContractFacts {
            amount: Some(Sourced::case_record(dec("3600000.5"))),
            signed_on: Some(Sourced::case_record(NaiveDate::from_ymd_opt(2021, 3, 5).unwrap())),
            ..ContractFacts::default()
        });
        let values: Vec<_> = facts.entries().into_iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["3600000.5元", "2021年3月5日"]);
    }

    #[test]
    fn facts_tagged_by_type() {
        let facts = EvidenceFacts::Attachment(AttachmentFacts::default());
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["type"], "attachment");
    }
}
