//! Parser for the structured requirement-authoring format.
//!
//! A requirement document is YAML frontmatter delimited by `---`
//! lines, a numbered `Flow:` of steps with indented alternative paths,
//! optional labeled technical sections (`API:`, `Performance:`, ...),
//! and an optional machine-checkable `Validate:` block.
//!
//! [`parse_document`] runs the whole pipeline in one pass and either
//! returns a complete immutable [`Document`] (with any non-fatal
//! warnings) or a [`reqflow_core::ParseReport`] carrying every
//! violation found, never a partial document.

pub mod assemble;
pub mod document;
pub mod flow;
pub mod frontmatter;
pub mod lexer;
pub mod sections;
pub mod serialize;
pub mod validate;

pub use assemble::{parse_document, ParseOutcome};
pub use document::{
    AlternativePath, ContractStatement, Document, FlowStep, Frontmatter, InvariantStatement,
    Priority, Scope, Section, SectionLabel, Status, TestCase, Tolerance, ValidateBlock,
};
pub use serialize::serialize;
