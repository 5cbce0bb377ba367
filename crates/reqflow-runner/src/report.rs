//! Structured run reports.
//!
//! Every failure carries the document ID, subsection, case index, and
//! a human-readable detail, so a fix-and-retry loop can act on the
//! report mechanically.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four Validate subsections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsection {
    HappyPath,
    Boundaries,
    Invariants,
    Contracts,
}

impl fmt::Display for Subsection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsection::HappyPath => "happy_path",
            Subsection::Boundaries => "boundaries",
            Subsection::Invariants => "invariants",
            Subsection::Contracts => "contracts",
        };
        f.write_str(name)
    }
}

/// Outcome of one case, statement, or contract check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The check passed.
    Pass,
    /// The adapter answered and the output missed the expectation.
    Fail,
    /// The adapter did not answer within the per-case timeout. Never
    /// treated as a silent pass.
    Timeout,
    /// The adapter raised, or the criteria themselves conflict.
    Error,
}

impl CaseOutcome {
    /// Whether this outcome counts toward a passing subsection.
    pub fn is_pass(self) -> bool {
        matches!(self, CaseOutcome::Pass)
    }
}

/// Result of one check within a subsection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Which subsection the check belongs to.
    pub subsection: Subsection,
    /// Zero-based index within the subsection, in document order.
    pub case_index: usize,
    /// Outcome of the check.
    pub outcome: CaseOutcome,
    /// Human-readable detail; always present for non-pass outcomes.
    pub detail: Option<String>,
}

/// States of the validation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    Generated,
    HappyPathChecked,
    BoundariesChecked,
    InvariantsChecked,
    ContractsChecked,
    Passed,
    Failed,
}

/// Document-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentOutcome {
    Passed,
    Failed,
}

/// The structured result of scoring one candidate against one
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The requirement that was scored.
    pub document_id: String,
    /// Per-check results in execution order.
    pub cases: Vec<CaseResult>,
    /// States the loop passed through, ending in `Passed` or `Failed`.
    pub state_trace: Vec<LoopState>,
    /// Document-level verdict.
    pub outcome: DocumentOutcome,
}

impl Report {
    /// Results that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.outcome.is_pass())
    }

    /// The terminal state of the loop.
    pub fn final_state(&self) -> LoopState {
        *self.state_trace.last().unwrap_or(&LoopState::Generated)
    }
}
