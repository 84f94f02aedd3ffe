//! EPA Identity Resolver
//!
//! Maps placeholder markers to the fictitious entities of a case and applies
//! that mapping to generated text.
//!
//! # Core Concepts
//!
//! - [`Marker`]: opaque placeholder token written during planning
//! - [`EntityProfile`]: real-looking company or person a marker resolves to
//! - [`IdentityMap`]: immutable, longest-marker-first substitution table
//! - [`ResolutionPipeline`]: ordered repair stages run by [`IdentityMap::apply`]
//!
//! # Example
//!
//! ```rust
//! use epa_identity::{EntityProfile, IdentityMapBuilder, Marker};
//!
//! let map = IdentityMapBuilder::new()
//!     .with_profile(EntityProfile::company(Marker::new("SLOT_A")?, "Harbor Leasing Co."))
//!     .build()?;
//!
//! assert_eq!(
//!     map.apply("SLOT_A某 signed on DATE_PLACEHOLDER"),
//!     "Harbor Leasing Co. signed on DATE_PLACEHOLDER"
//! );
//! # Ok::<(), epa_identity::IdentityError>(())
//! ```

#![warn(unreachable_pub)]

mod error;
mod map;
mod marker;
mod profile;
pub mod repair;

pub use error::{IdentityError, IdentityResult};
pub use map::{build, IdentityMap, IdentityMapBuilder, PairSource, SubstitutionPair, DEFAULT_FALLBACKS};
pub use marker::Marker;
pub use profile::{BankAccount, EntityKind, EntityProfile, FieldMarker, ProfileField};
pub use repair::{RepairStage, ResolutionPipeline};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        EntityKind, EntityProfile, IdentityError, IdentityMap, IdentityMapBuilder, Marker,
        ProfileField,
    };
}
