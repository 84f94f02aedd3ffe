//! EPA Evidence Package Generator
//!
//! Drives generation for every planned exhibit of a case and produces the
//! persisted evidence package: one artifact per exhibit, the evidence index
//! manifest and a generation report.
//!
//! # Core Concepts
//!
//! - [`EvidenceItem`]: one planned exhibit with typed [`EvidenceFacts`]
//! - [`FabricationPolicy`]: which fact slots may be invented, enforced before generation
//! - [`PromptContext`]: marker-free generation context for one exhibit
//! - [`EvidencePackageGenerator`]: prompt → retry loop → artifact → index
//! - [`EvidenceIndex`]: authoritative manifest; totals always match its entries
//! - [`ArtifactStore`]: where artifacts land (filesystem or memory)
//!
//! # Example
//!
//! ```rust
//! use epa_identity::{EntityProfile, IdentityMapBuilder, Marker};
//! use epa_package::{
//!     DocumentFacts, EvidenceFacts, EvidenceItem, EvidencePackageGenerator, MemoryArtifactStore,
//!     PackageConfig, Party, Sourced,
//! };
//! use epa_retry::GenerationFailure;
//! use std::sync::Arc;
//!
//! let map = IdentityMapBuilder::new()
//!     .with_profile(EntityProfile::company(Marker::new("SLOT_A").unwrap(), "Harbor Leasing Co."))
//!     .build()
//!     .unwrap();
//! let item = EvidenceItem::new(
//!     1,
//!     "催款函",
//!     Party::Plaintiff,
//!     1,
//!     EvidenceFacts::Document(DocumentFacts {
//!         issuer: Sourced::case_record("SLOT_A".to_string()),
//!         recipient: None,
//!         issued_on: None,
//!         document_number: None,
//!         summary: None,
//!     }),
//! );
//!
//! let generator =
//!     EvidencePackageGenerator::new(PackageConfig::default(), Arc::new(map), MemoryArtifactStore::new());
//! let mut backend = |_: &str| Ok::<_, GenerationFailure>("SLOT_A hereby demands payment.".to_string());
//! let package = generator.generate(&[item], &mut backend).unwrap();
//!
//! assert_eq!(package.index.total, 1);
//! assert_eq!(
//!     package.artifacts[0].outcome.content.as_deref(),
//!     Some("Harbor Leasing Co. hereby demands payment.")
//! );
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod generator;
mod index;
mod model;
pub mod naming;
mod policy;
mod prompt;
mod report;
mod store;

pub use config::{BackoffConfig, PackageConfig};
pub use error::{PackageError, PackageResult};
pub use generator::{EvidencePackage, EvidencePackageGenerator, GeneratedArtifact};
pub use index::{EntryStatus, EvidenceIndex, GroupSummary, IndexBuilder, IndexEntry};
pub use model::{
    AttachmentFacts, ContractFacts, DeclaredType, DocumentFacts, EvidenceFacts, EvidenceGroup,
    EvidenceItem, FactEntry, FactField, KeyData, Party, Provenance, Sourced, VoucherFacts,
};
pub use naming::NameRegistry;
pub use policy::{enforce, FabricationPolicy, FieldRule, PolicyViolation};
pub use prompt::{EntityBrief, PromptContext, PromptFact};
pub use report::{GenerationReport, IdentityGap, ItemReport};
pub use store::{ArtifactStore, ContentDigest, DigestParseError, FsArtifactStore, MemoryArtifactStore, StoredArtifact};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ArtifactStore, EvidenceFacts, EvidenceIndex, EvidenceItem, EvidencePackage,
        EvidencePackageGenerator, FabricationPolicy, PackageConfig, PackageError, Party, Sourced,
    };
}
