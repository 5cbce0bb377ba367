//! The validation-loop orchestrator.
//!
//! Scores one candidate implementation against a requirement
//! document's `Validate:` block: happy-path and boundary test cases
//! are executed through an external [`Adapter`], invariants and
//! contracts are checked against the captured outputs, and the result
//! is a structured [`Report`] an automated fix-and-retry loop can act
//! on without a human reading logs. Re-running against an unchanged
//! document and adapter yields identical outcomes.

pub mod adapter;
pub mod orchestrator;
pub mod policy;
pub mod report;

pub use adapter::{Adapter, AdapterError, EchoAdapter, ScriptedAdapter};
pub use orchestrator::{Orchestrator, RunConfig};
pub use policy::EqualityPolicy;
pub use report::{CaseOutcome, CaseResult, DocumentOutcome, LoopState, Report, Subsection};
