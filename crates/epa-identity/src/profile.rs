//! Entity profiles
//!
//! A profile is the real-looking company or person a marker resolves to.
//! Profiles are created once per case during setup and never mutated by
//! downstream stages; adding one means rebuilding the identity map.

use crate::marker::Marker;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of entity a profile describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Legal person (company, institution)
    Company,
    /// Natural person
    Person,
}

/// Bank account attached to a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Bank and branch name
    pub bank_name: String,
    /// Account number
    pub account_number: String,
}

impl BankAccount {
    /// Create new bank account
    #[inline]
    #[must_use]
    pub fn new(bank_name: impl Into<String>, account_number: impl Into<String>) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
        }
    }
}

impl Display for BankAccount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.bank_name, self.account_number)
    }
}

/// Addressable field of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    /// Company name or person's full name
    LegalName,
    /// Unified social credit code or ID number
    RegistrationCode,
    /// Registered or home address
    Address,
    /// Legal representative (companies only)
    LegalRepresentative,
    /// Bank account, rendered as `bank number`
    BankAccount,
}

/// Marker that resolves to a specific field of its profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMarker {
    /// Placeholder token
    pub marker: Marker,
    /// Field it stands for
    pub field: ProfileField,
}

/// Real-world-like fictitious entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    /// Company or person
    pub kind: EntityKind,
    /// Primary marker, resolves to the legal name
    pub marker: Marker,
    /// Company name or person's full name
    pub legal_name: String,
    /// Registration or ID code
    #[serde(default)]
    pub registration_code: String,
    /// Registered or home address
    #[serde(default)]
    pub address: String,
    /// Legal representative
    #[serde(default)]
    pub legal_representative: Option<String>,
    /// Bank account
    #[serde(default)]
    pub bank_account: Option<BankAccount>,
    /// Additional markers resolving to the legal name
    #[serde(default)]
    pub aliases: Vec<Marker>,
    /// Markers resolving to other fields of this profile
    #[serde(default)]
    pub field_markers: Vec<FieldMarker>,
}

impl EntityProfile {
    /// Create company profile
    #[must_use]
    pub fn company(marker: Marker, legal_name: impl Into<String>) -> Self {
        Self::new(EntityKind::Company, marker, legal_name)
    }

    /// Create person profile
    #[must_use]
    pub fn person(marker: Marker, legal_name: impl Into<String>) -> Self {
        Self::new(EntityKind::Person, marker, legal_name)
    }

    fn new(kind: EntityKind, marker: Marker, legal_name: impl Into<String>) -> Self {
        Self {
            kind,
            marker,
            legal_name: legal_name.into(),
            registration_code: String::new(),
            address: String::new(),
            legal_representative: None,
            bank_account: None,
            aliases: Vec::new(),
            field_markers: Vec::new(),
        }
    }

    /// With registration code
    #[inline]
    #[must_use]
    pub fn with_registration_code(mut self, code: impl Into<String>) -> Self {
        self.registration_code = code.into();
        self
    }

    /// With address
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// With legal representative
    #[inline]
    #[must_use]
    pub fn with_representative(mut self, name: impl Into<String>) -> Self {
        self.legal_representative = Some(name.into());
        self
    }

    /// With bank account
    #[inline]
    #[must_use]
    pub fn with_bank_account(mut self, account: BankAccount) -> Self {
        self.bank_account = Some(account);
        self
    }

    /// With alias marker
    #[inline]
    #[must_use]
    pub fn with_alias(mut self, alias: Marker) -> Self {
        self.aliases.push(alias);
        self
    }

    /// With field marker
    #[inline]
    #[must_use]
    pub fn with_field_marker(mut self, marker: Marker, field: ProfileField) -> Self {
        self.field_markers.push(FieldMarker { marker, field });
        self
    }

    /// Whether the primary identity field is populated
    #[inline]
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.legal_name.trim().is_empty()
    }

    /// Text of a field, `None` when empty or absent
    #[must_use]
    pub fn field(&self, field: ProfileField) -> Option<String> {
        let value = match field {
            ProfileField::LegalName => Some(self.legal_name.clone()),
            ProfileField::RegistrationCode => Some(self.registration_code.clone()),
            ProfileField::Address => Some(self.address.clone()),
            ProfileField::LegalRepresentative => self.legal_representative.clone(),
            ProfileField::BankAccount => self.bank_account.as_ref().map(ToString::to_string),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Every marker this profile claims, primary first
    pub fn claimed_markers(&self) -> impl Iterator<Item = &Marker> {
        std::iter::once(&self.marker)
            .chain(self.aliases.iter())
            .chain(self.field_markers.iter().map(|f| &f.marker))
    }
}
