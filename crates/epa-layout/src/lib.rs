//! EPA Document Assembler
//!
//! Lays out generated exhibits as a paginated document: per submitting
//! party a cover page, a table of contents and the exhibits in group order.
//!
//! # Core Concepts
//!
//! - [`DocumentAssembler`]: exhibits → resolved text → parsed nodes → blocks → pages
//! - [`DocumentBuilder`]: block stream with explicit page breaks, flowed onto pages
//! - [`PageGeometry`]: usable area and table column widths
//! - [`numeric`]: thousands separators for amounts, `%` for percentages
//! - [`TextRenderer`]: plain-text preview of a [`PaginatedDocument`]
//!
//! # Example
//!
//! ```rust
//! use epa_identity::{EntityProfile, IdentityMapBuilder, Marker};
//! use epa_layout::{Block, DocumentAssembler, LayoutOptions, TextRenderer};
//! use epa_package::{DocumentFacts, EvidenceFacts, EvidenceItem, Party, Sourced};
//! use epa_retry::GenerationOutcome;
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
//! let outcome = epa_retry::run(|| Ok("欠付租金：125000元".to_string()), 0);
//!
//! let document = DocumentAssembler::new(LayoutOptions::new())
//!     .assemble(&[(1, vec![(&item, &outcome)])], &map)
//!     .unwrap();
//!
//! assert_eq!(document.page_count(), 3);
//! assert!(document.blocks().any(|b| *b == Block::field("欠付租金", "125,000.00元")));
//! assert!(TextRenderer::default().render(&document).contains("E001 催款函"));
//! ```

#![warn(unreachable_pub)]

mod assembler;
mod document;
mod error;
mod geometry;
pub mod numeric;
mod options;
mod render;
pub mod text;

pub use assembler::{assemble, AssemblyGroup, DocumentAssembler};
pub use document::{Anchor, Block, DocumentBuilder, Page, PageRun, PaginatedDocument, FIRST_LINE_INDENT};
pub use error::{LayoutError, LayoutResult};
pub use geometry::PageGeometry;
pub use numeric::NumericKind;
pub use options::{LayoutOptions, DEFAULT_LABEL_WIDTH_MM};
pub use render::TextRenderer;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        assemble, Block, DocumentAssembler, LayoutError, LayoutOptions, PageGeometry, PaginatedDocument,
        TextRenderer,
    };
}
