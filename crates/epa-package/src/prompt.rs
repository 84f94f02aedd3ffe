//! Prompt context
//!
//! Everything generation is told about one exhibit, with every marker already
//! resolved to its entity's real fields. A fact whose value would still carry
//! a placeholder after resolution is withheld and its tokens are listed in
//! [`PromptContext::unresolved`] instead: generation never sees a marker.

use crate::model::{DeclaredType, EvidenceItem, FactField, Party};
use crate::policy::FabricationPolicy;
use epa_identity::{EntityKind, IdentityMap};
use epa_quality::QualityGate;

/// Resolved entity an exhibit involves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBrief {
    /// Company or person; `None` for override and fallback names
    pub kind: Option<EntityKind>,
    /// Legal name
    pub legal_name: String,
    /// Registration or ID code
    pub registration_code: Option<String>,
    /// Address
    pub address: Option<String>,
    /// Legal representative
    pub representative: Option<String>,
    /// Bank account, `bank number`
    pub bank_account: Option<String>,
}

/// One fact as generation sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFact {
    /// Slot
    pub field: FactField,
    /// Resolved value
    pub value: String,
}

/// Generation context for one exhibit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Evidence id
    pub evidence_id: String,
    /// Exhibit name
    pub name: String,
    /// Declared type
    pub declared_type: DeclaredType,
    /// Submitting party
    pub party: Party,
    /// Group display name
    pub group_name: String,
    /// Proof purpose, resolved; empty when withheld
    pub proof_purpose: String,
    /// Headline amount, two decimals
    pub amount: Option<String>,
    /// Headline date
    pub date: Option<String>,
    /// Involved entities
    pub entities: Vec<EntityBrief>,
    /// Facts generation must use as given
    pub facts: Vec<PromptFact>,
    /// Slots of this type generation may invent
    pub inventable: Vec<FactField>,
    /// Markers and placeholder tokens withheld from generation
    pub unresolved: Vec<String>,
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn brief(map: &IdentityMap, marker: &str) -> Option<EntityBrief> {
    if let Some(profile) = map.profile(marker) {
        return Some(EntityBrief {
            kind: Some(profile.kind),
            legal_name: profile.legal_name.clone(),
            registration_code: non_empty(&profile.registration_code),
            address: non_empty(&profile.address),
            representative: profile.legal_representative.as_deref().and_then(non_empty),
            bank_account: profile.bank_account.as_ref().map(ToString::to_string),
        });
    }
    map.resolve(marker).map(|name| EntityBrief {
        kind: None,
        legal_name: name.to_string(),
        registration_code: None,
        address: None,
        representative: None,
        bank_account: None,
    })
}

struct Withheld(Vec<String>);

impl Withheld {
    fn add(&mut self, token: String) {
        if !self.0.contains(&token) {
            self.0.push(token);
        }
    }

    /// Resolve `text`; `None` and its tokens recorded when it stays dirty
    fn resolve(&mut self, map: &IdentityMap, gate: &QualityGate, text: &str) -> Option<String> {
        let resolved = map.apply(text);
        let (clean, found) = gate.check(&resolved);
        if clean {
            Some(resolved)
        } else {
            found.into_iter().for_each(|t| self.add(t));
            None
        }
    }
}

impl PromptContext {
    /// Build the context for an item
    #[must_use]
    pub fn build(
        item: &EvidenceItem,
        group_name: &str,
        map: &IdentityMap,
        gate: &QualityGate,
        policy: &FabricationPolicy,
    ) -> Self {
        let mut withheld = Withheld(Vec::new());
        let declared_type = item.declared_type();

        let mut entities: Vec<EntityBrief> = Vec::new();
        for marker in &item.hints.markers {
            match brief(map, marker.as_str()) {
                Some(entity) if !entities.iter().any(|e| e.legal_name == entity.legal_name) => {
                    entities.push(entity);
                }
                Some(_) => {}
                None => withheld.add(marker.to_string()),
            }
        }

        let facts = item
            .facts
            .entries()
            .into_iter()
            .filter_map(|entry| {
                withheld
                    .resolve(map, gate, &entry.value)
                    .map(|value| PromptFact { field: entry.field, value })
            })
            .collect();

        let name = withheld
            .resolve(map, gate, &item.name)
            .unwrap_or_else(|| declared_type.label().to_string());
        let proof_purpose = withheld
            .resolve(map, gate, &item.proof_purpose)
            .unwrap_or_default();
        let group_name = withheld.resolve(map, gate, group_name).unwrap_or_default();

        let inventable = declared_type
            .fields()
            .iter()
            .copied()
            .filter(|f| policy.may_fabricate(*f))
            .collect();

        Self {
            evidence_id: item.id(),
            name,
            declared_type,
            party: item.party,
            group_name,
            proof_purpose,
            amount: item.hints.amount.map(|a| format!("{:.2}元", a.round_dp(2))),
            date: item.hints.date.map(|d| d.format("%Y年%-m月%-d日").to_string()),
            entities,
            facts,
            inventable,
            unresolved: withheld.0,
        }
    }

    /// Whether anything had to be withheld
    #[inline]
    #[must_use]
    pub fn has_gaps(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Prompt text handed to generation
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = vec![
            "【证据信息】".to_string(),
            format!("证据编号：{}", self.evidence_id),
            format!("证据名称：{}", self.name),
            format!("证据类型：{}", self.declared_type),
            format!("提交方：{}", self.party),
        ];
        if !self.group_name.is_empty() {
            lines.push(format!("所属证据组：{}", self.group_name));
        }
        if !self.proof_purpose.is_empty() {
            lines.push(format!("证明目的：{}", self.proof_purpose));
        }

        if !self.entities.is_empty() {
            lines.push("\n【当事人信息】".to_string());
            for entity in &self.entities {
                lines.push(entity.legal_name.clone());
                let code_label = match entity.kind {
                    Some(EntityKind::Person) => "身份证号",
                    _ => "统一社会信用代码",
                };
                let details = [
                    (code_label, &entity.registration_code),
                    ("住所地", &entity.address),
                    ("法定代表人", &entity.representative),
                    ("开户行及账号", &entity.bank_account),
                ];
                lines.extend(
                    details
                        .into_iter()
                        .filter_map(|(label, value)| value.as_ref().map(|v| format!("  {label}：{v}"))),
                );
            }
        }

        lines.push("\n【关键事实】".to_string());
        if let Some(amount) = &self.amount {
            lines.push(format!("金额：{amount}"));
        }
        if let Some(date) = &self.date {
            lines.push(format!("日期：{date}"));
        }
        lines.extend(self.facts.iter().map(|fact| format!("{}：{}", fact.field.label(), fact.value)));

        if !self.inventable.is_empty() {
            let labels: Vec<&str> = self.inventable.iter().map(|f| f.label()).collect();
            lines.push("\n【可补充的细节】".to_string());
            lines.push(format!("以下字段可以合理编造：{}", labels.join("、")));
            lines.push("其余字段必须严格使用上述信息，不得编造。".to_string());
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContractFacts, EvidenceFacts, KeyData, Sourced};
    use epa_identity::{EntityProfile, IdentityMapBuilder, Marker};

    fn map() -> IdentityMap {
        IdentityMapBuilder::new()
            .with_profile(
                EntityProfile::company(Marker::new("某某公司1").unwrap(), "东方国际融资租赁有限公司")
                    .with_registration_code("91310000MA1FL0QR01")
                    .with_address("上海市浦东新区陆家嘴环路1000号")
                    .with_representative("陈志远"),
            )
            .build()
            .unwrap()
    }

    fn item() -> EvidenceItem {
        EvidenceItem::new(
            1,
            "《融资租赁合同》",
            Party::Plaintiff,
            1,
            EvidenceFacts::Contract(ContractFacts {
                parties: vec![
                    Sourced::case_record("某某公司1".into()),
                    Sourced::case_record("某某公司9".into()),
                ],
                subject_matter: Some(Sourced::fabricated("挖掘机两台".into())),
                ..ContractFacts::default()
            }),
        )
        .with_proof_purpose("证明某某公司1与承租人存在融资租赁关系")
        .with_hints(KeyData {
            amount: Some("3600000".parse().unwrap()),
            date: None,
            markers: vec![Marker::new("某某公司1").unwrap(), Marker::new("某某公司9").unwrap()],
        })
    }

    fn context() -> PromptContext {
        let map = map();
        let gate = QualityGate::new().with_literal_markers(map.residual_markers());
        PromptContext::build(&item(), "融资租赁基础法律关系", &map, &gate, &FabricationPolicy::default())
    }

    #[test]
    fn markers_resolved_and_gaps_withheld() {
        let ctx = context();
        assert_eq!(ctx.entities.len(), 1);
        assert_eq!(ctx.entities[0].legal_name, "东方国际融资租赁有限公司");
        assert_eq!(ctx.unresolved, vec!["某某公司9"]);
        assert_eq!(ctx.facts.len(), 2);
        assert_eq!(ctx.proof_purpose, "证明东方国际融资租赁有限公司与承租人存在融资租赁关系");
        assert!(ctx.has_gaps());
    }

    #[test]
    fn rendered_prompt_never_contains_markers() {
        let prompt = context().render();
        assert!(!prompt.contains("某某公司"));
        assert!(prompt.contains("统一社会信用代码：91310000MA1FL0QR01"));
        assert!(prompt.contains("金额：3600000.00元"));
        assert!(prompt.contains("标的物：挖掘机两台"));
        assert!(prompt.contains("以下字段可以合理编造：合同编号、标的物、期限"));
    }

    #[test]
    fn rendered_prompt_section_layout() {
        let prompt = context().render();
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "【证据信息】");
        assert_eq!(lines[1], "证据编号：E001");
        let parties = lines.iter().position(|l| *l == "【当事人信息】").unwrap();
        assert_eq!(lines[parties - 1], "");
        assert_eq!(lines[parties + 1], "东方国际融资租赁有限公司");
        assert_eq!(lines[parties + 2], "  统一社会信用代码：91310000MA1FL0QR01");
        assert!(lines.iter().position(|l| *l == "【关键事实】").unwrap() > parties);
        assert!(prompt.ends_with("不得编造。\n"));
    }
}
