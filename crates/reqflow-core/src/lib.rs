//! Reqflow common core types.
//!
//! This crate provides the primitives shared by the parser, corpus
//! resolver, and validation runner: the tagged [`Value`] type used in
//! test-case inputs and outputs, and the parse issue taxonomy that
//! lets a single parse pass report every violation at once.

pub mod issue;
pub mod value;

pub use issue::{Issue, IssueKind, Issues, ParseReport, Severity};
pub use value::{Value, ValueError, NON_EMPTY};
