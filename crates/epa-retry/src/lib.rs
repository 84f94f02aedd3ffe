//! EPA Generation Retry Orchestrator
//!
//! Calls an opaque generation function, gates its output, and retries within
//! a fixed budget.
//!
//! # Core Concepts
//!
//! - [`RetryOrchestrator`]: bounded loop returning `Result<Accepted, Exhausted>`
//! - [`RetryPolicy`] and [`Backoff`]: budget and transport-failure delays
//! - [`GenerationOutcome`]: flattened result with attempt history
//! - [`Generator`]: the `generate(prompt) -> text` backend boundary
//!
//! # Example
//!
//! ```rust
//! let mut replies = vec!["甲方：某某公司1", "甲方：东方国际融资租赁有限公司"].into_iter();
//! let outcome = epa_retry::run(|| Ok(replies.next().unwrap_or_default().to_string()), 2);
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.attempts, 2);
//! ```

#![warn(unreachable_pub)]

mod error;
mod orchestrator;
mod outcome;
mod policy;

pub use error::GenerationFailure;
pub use orchestrator::{run, Generator, RetryOrchestrator};
pub use outcome::{
    Accepted, AttemptRecord, AttemptStatus, Exhausted, ExhaustionReason, GenerationOutcome,
};
pub use policy::{Backoff, CancellationToken, RetryPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Backoff, GenerationFailure, GenerationOutcome, Generator, RetryOrchestrator, RetryPolicy,
    };
}
