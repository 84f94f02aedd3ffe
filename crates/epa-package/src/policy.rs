//! Fabrication policy
//!
//! Decides which fact slots generation (and planning) may invent and which
//! must come verbatim from the case record. Party identity, amounts and dates
//! are verbatim by default; numbering and descriptive detail are fabricatable.

use crate::model::{EvidenceItem, FactField, Provenance};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ruling for one fact slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Must come from the case record
    Verbatim,
    /// May be invented
    Fabricatable,
}

/// A fabricated value found in a verbatim slot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{evidence_id} carries an invented {field:?} value '{value}'")]
pub struct PolicyViolation {
    /// Offending exhibit
    pub evidence_id: String,
    /// Offending slot
    pub field: FactField,
    /// Offending value
    pub value: String,
}

/// Slot-by-slot ruling on what may be invented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricationPolicy {
    rules: IndexMap<FactField, FieldRule>,
}

const VERBATIM: &[FactField] = &[
    FactField::ContractParty,
    FactField::Amount,
    FactField::Date,
    FactField::Payer,
    FactField::Payee,
    FactField::Issuer,
    FactField::Recipient,
];

const FABRICATABLE: &[FactField] = &[
    FactField::ContractNumber,
    FactField::SubjectMatter,
    FactField::Term,
    FactField::Purpose,
    FactField::VoucherNumber,
    FactField::DocumentNumber,
    FactField::Summary,
    FactField::Description,
    FactField::LineItem,
];

impl Default for FabricationPolicy {
    fn default() -> Self {
        let rules = VERBATIM
            .iter()
            .map(|f| (*f, FieldRule::Verbatim))
            .chain(FABRICATABLE.iter().map(|f| (*f, FieldRule::Fabricatable)))
            .collect();
        Self { rules }
    }
}

impl FabricationPolicy {
    /// Built-in policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the ruling for one slot
    #[must_use]
    pub fn with_rule(mut self, field: FactField, rule: FieldRule) -> Self {
        self.rules.insert(field, rule);
        self
    }

    /// Ruling for a slot; unknown slots are verbatim
    #[must_use]
    pub fn rule(&self, field: FactField) -> FieldRule {
        self.rules.get(&field).copied().unwrap_or(FieldRule::Verbatim)
    }

    /// Whether generation may invent this slot
    #[inline]
    #[must_use]
    pub fn may_fabricate(&self, field: FactField) -> bool {
        self.rule(field) == FieldRule::Fabricatable
    }

    /// Slots generation may invent, in declaration order
    pub fn fabricatable(&self) -> impl Iterator<Item = FactField> + '_ {
        self.rules
            .iter()
            .filter(|(_, rule)| **rule == FieldRule::Fabricatable)
            .map(|(field, _)| *field)
    }

    /// Reject an item that carries an invented value in a verbatim slot
    ///
    /// # Errors
    /// Returns the first [`PolicyViolation`] found, in fact order
    pub fn enforce(&self, item: &EvidenceItem) -> Result<(), PolicyViolation> {
        let violation = item.facts.entries().into_iter().find(|entry| {
            entry.provenance == Provenance::Fabricated && !self.may_fabricate(entry.field)
        });
        match violation {
            Some(entry) => Err(PolicyViolation {
                evidence_id: item.id(),
                field: entry.field,
                value: entry.value,
            }),
            None => Ok(()),
        }
    }
}

/// Check an item against the built-in policy
///
/// # Errors
/// See [`FabricationPolicy::enforce`]
pub fn enforce(item: &EvidenceItem) -> Result<(), PolicyViolation> {
    FabricationPolicy::default().enforce(item)
}
