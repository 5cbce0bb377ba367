//! The parsed requirement document model.
//!
//! All values here are immutable once assembled from a single parse
//! pass; a document is re-parsed wholesale on any source change.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use reqflow_core::Value;
use serde::{Deserialize, Serialize};

/// A fully parsed requirement document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Requirement ID, unique within a corpus.
    pub id: String,
    /// Decoded frontmatter metadata.
    pub frontmatter: Frontmatter,
    /// Ordered numbered steps of the primary success scenario.
    pub flow: Vec<FlowStep>,
    /// Technical sections in document order.
    pub sections: Vec<Section>,
    /// Machine-checkable acceptance criteria, when present.
    pub validate: Option<ValidateBlock>,
}

impl Document {
    /// Body of the first section with the given label.
    pub fn section(&self, label: &SectionLabel) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| &s.label == label)
            .map(|s| s.body.as_str())
    }
}

/// Frontmatter metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Requirement ID.
    pub id: String,
    /// Who the requirement serves.
    pub user: String,
    /// Situation in which the requirement applies.
    pub context: String,
    /// Event that initiates the flow.
    pub trigger: String,
    /// What the user gets out of it.
    pub user_outcome: String,
    /// Business value, when stated.
    pub business_outcome: Option<String>,
    /// Author-assigned priority.
    pub priority: Option<Priority>,
    /// Lifecycle status.
    pub status: Option<Status>,
    /// Effort estimate, kept as the author's verbatim duration string.
    pub estimate: Option<String>,
    /// Referenced requirement IDs, deduplicated preserving first
    /// occurrence; order is kept for reporting.
    pub depends_on: Vec<String>,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Unknown fields, retained for forward compatibility.
    pub extensions: BTreeMap<String, Value>,
}

/// Priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Parse a priority, case-insensitively.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Approved,
    Implemented,
}

impl Status {
    /// Parse a status, case-insensitively.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "implemented" => Some(Self::Implemented),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Implemented => "implemented",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One numbered step of the flow.
///
/// A step exclusively owns its alternatives; they never detach from
/// the step they were parsed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    /// Step number as written (1-based; gaps are warnings).
    pub number: u32,
    /// Step text.
    pub text: String,
    /// Alternative paths indented under this step.
    pub alternatives: Vec<AlternativePath>,
}

/// A dash-prefixed branch under a flow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePath {
    /// Condition clause; always begins with `If`, `When`, or `On`.
    pub condition: String,
    /// Outcome clause.
    pub outcome: String,
}

/// A labeled technical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section label.
    pub label: SectionLabel,
    /// Raw section text, newlines preserved.
    pub body: String,
}

/// Known technical section labels, plus an open set of custom labels
/// retained verbatim but not semantically interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionLabel {
    Api,
    Performance,
    Security,
    Data,
    Rule,
    /// Unrecognized label, retained for forward compatibility.
    Custom(String),
}

impl SectionLabel {
    /// Classify a raw label.
    pub fn from_label(label: &str) -> Self {
        match label {
            "API" => Self::Api,
            "Performance" => Self::Performance,
            "Security" => Self::Security,
            "Data" => Self::Data,
            "Rule" => Self::Rule,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The label as written in a document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Api => "API",
            Self::Performance => "Performance",
            Self::Security => "Security",
            Self::Data => "Data",
            Self::Rule => "Rule",
            Self::Custom(s) => s,
        }
    }

    /// Whether this label is one of the recognized section names.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The machine-checkable acceptance-criteria block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidateBlock {
    /// Primary success cases.
    pub happy_path: Vec<TestCase>,
    /// Edge and limit cases; order matters for stateful adapters.
    pub boundaries: Vec<TestCase>,
    /// Conditions that must hold for all inputs.
    pub invariants: Vec<InvariantStatement>,
    /// Quantitative or logical input/output relationships.
    pub contracts: Vec<ContractStatement>,
}

impl ValidateBlock {
    /// Whether no subsection carries any entry.
    pub fn is_empty(&self) -> bool {
        self.happy_path.is_empty()
            && self.boundaries.is_empty()
            && self.invariants.is_empty()
            && self.contracts.is_empty()
    }
}

/// One `input`/`expect` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Input mapping handed to the adapter.
    pub input: BTreeMap<String, Value>,
    /// Expected output mapping.
    pub expect: BTreeMap<String, Value>,
}

/// Scope of an invariant statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Holds within the declaring document.
    OwnDocument,
    /// References another requirement by ID.
    Foreign(String),
}

/// A natural-language invariant, optionally scoped to another
/// requirement via an `"OTHER-ID: ..."` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantStatement {
    /// Own-document or foreign scope.
    pub scope: Scope,
    /// Statement text, without the foreign-ID prefix.
    pub text: String,
}

/// A contract statement with an optional `± N unit` tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStatement {
    /// Full statement text as written, tolerance suffix included.
    pub text: String,
    /// Parsed tolerance, when the statement carries one.
    pub tolerance: Option<Tolerance>,
}

/// Numeric tolerance bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Allowed deviation.
    pub value: f64,
    /// Unit the deviation is expressed in.
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parsing() {
        assert_eq!(Priority::from_str_opt("critical"), Some(Priority::Critical));
        assert_eq!(Priority::from_str_opt("HIGH"), Some(Priority::High));
        assert_eq!(Priority::from_str_opt(" medium "), Some(Priority::Medium));
        assert_eq!(Priority::from_str_opt("urgent"), None);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(Status::from_str_opt("draft"), Some(Status::Draft));
        assert_eq!(Status::from_str_opt("Approved"), Some(Status::Approved));
        assert_eq!(Status::from_str_opt("done"), None);
    }

    #[test]
    fn test_section_label_classification() {
        assert_eq!(SectionLabel::from_label("API"), SectionLabel::Api);
        assert_eq!(SectionLabel::from_label("Rule"), SectionLabel::Rule);
        // Labels are matched exactly; "api" is not the known "API".
        assert_eq!(
            SectionLabel::from_label("api"),
            SectionLabel::Custom("api".to_string())
        );
        assert!(!SectionLabel::from_label("Notes").is_known());
        assert_eq!(SectionLabel::from_label("Notes").as_str(), "Notes");
    }

    #[test]
    fn test_validate_block_empty() {
        assert!(ValidateBlock::default().is_empty());
        let block = ValidateBlock {
            invariants: vec![InvariantStatement {
                scope: Scope::OwnDocument,
                text: "passwords are never logged".into(),
            }],
            ..Default::default()
        };
        assert!(!block.is_empty());
    }
}
