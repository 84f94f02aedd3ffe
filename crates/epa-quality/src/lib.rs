//! EPA Quality Gate
//!
//! Detects residual placeholders in generated text.
//!
//! # Core Concepts
//!
//! - [`QualityGate`]: stateless scanner over a fixed pattern library
//! - [`PatternClass`]: families of placeholder shapes (filler names, slots, dates, ...)
//! - [`GateReport`]: every finding with class and position, never deduplicated
//!
//! # Example
//!
//! ```rust
//! use epa_quality::QualityGate;
//!
//! let gate = QualityGate::new().with_literal_markers(["SLOT_A"]);
//! let (clean, found) = gate.check("Harbor Leasing Co. signed on DATE_PLACEHOLDER");
//! assert!(!clean);
//! assert_eq!(found, vec!["DATE_PLACEHOLDER"]);
//! ```

#![warn(unreachable_pub)]

mod gate;
mod pattern;

pub use gate::{check, inspect, Finding, GateReport, QualityGate};
pub use pattern::PatternClass;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{Finding, GateReport, PatternClass, QualityGate};
}
