//! EPA Structural Text Parser
//!
//! Turns loosely formatted generated text into an ordered list of
//! [`StructuralNode`]s: headings, `label: value` fields, prose paragraphs and
//! tables. Wrapping and pagination are left to layout.
//!
//! # Example
//!
//! ```rust
//! use epa_structure::{parse, StructuralNode};
//!
//! let nodes = parse("【租赁物】\n| 名称 | 数量 |\n|---|---|\n| 挖掘机 | 1 |");
//! assert_eq!(nodes[0], StructuralNode::heading("租赁物", 2));
//! assert_eq!(nodes[1].columns(), Some(2));
//! ```

#![warn(unreachable_pub)]

pub mod line;
mod node;
mod parser;
pub mod prestage;
pub mod table;

pub use node::{ParagraphRole, StructuralNode};
pub use parser::{parse, Parser};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{parse, ParagraphRole, Parser, StructuralNode};
}
