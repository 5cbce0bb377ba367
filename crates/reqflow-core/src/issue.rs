//! Parse issue taxonomy.
//!
//! A single parse pass collects every violation it finds rather than
//! failing on the first, so an author sees all problems at once. Fatal
//! issues prevent a document from being produced; warnings ride along
//! with a successful parse.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a parse issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// BOM present or invalid UTF-8. The document is unusable.
    Encoding,
    /// Grammar violated at a fixed structural point: missing
    /// frontmatter delimiters, missing `Flow:` keyword.
    Structural,
    /// A field or section violates the schema. Fatal for that field,
    /// but collection continues so all violations are reported.
    Schema,
    /// Step numbering gap or restart. Non-fatal.
    Sequence,
    /// The `Validate:` block is present but empty. Non-fatal.
    NoAcceptanceCriteria,
}

impl IssueKind {
    /// Severity implied by the kind.
    pub fn severity(self) -> Severity {
        match self {
            IssueKind::Encoding | IssueKind::Structural | IssueKind::Schema => Severity::Fatal,
            IssueKind::Sequence | IssueKind::NoAcceptanceCriteria => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::Encoding => "encoding error",
            IssueKind::Structural => "structural error",
            IssueKind::Schema => "schema violation",
            IssueKind::Sequence => "sequence warning",
            IssueKind::NoAcceptanceCriteria => "no acceptance criteria",
        };
        f.write_str(name)
    }
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Non-fatal; the document is still usable.
    Warning,
    /// The document (or the offending field) is rejected.
    Fatal,
}

/// One problem found while parsing a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// What kind of problem this is.
    pub kind: IssueKind,
    /// 1-based source line, when the issue is tied to a line.
    pub line: Option<usize>,
    /// Frontmatter field or subsection name, when tied to one.
    pub field: Option<String>,
    /// Human-readable cause.
    pub message: String,
}

impl Issue {
    /// Create an issue with neither line nor field context.
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            field: None,
            message: message.into(),
        }
    }

    /// Attach a 1-based source line.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a field or subsection name.
    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Severity of this issue.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        if let Some(field) = &self.field {
            write!(f, " [{field}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Accumulator for issues found during one parse pass.
#[derive(Debug, Clone, Default)]
pub struct Issues {
    items: Vec<Issue>,
}

impl Issues {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue.
    pub fn push(&mut self, issue: Issue) {
        self.items.push(issue);
    }

    /// Record a schema violation.
    pub fn schema(&mut self, message: impl Into<String>) {
        self.items.push(Issue::new(IssueKind::Schema, message));
    }

    /// Merge another accumulator into this one.
    pub fn extend(&mut self, other: Issues) {
        self.items.extend(other.items);
    }

    /// Whether any fatal issue has been recorded.
    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Fatal)
    }

    /// All recorded issues, in discovery order.
    pub fn items(&self) -> &[Issue] {
        &self.items
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the accumulator into a report.
    pub fn into_report(self, document_id: Option<String>) -> ParseReport {
        ParseReport {
            document_id,
            issues: self.items,
        }
    }
}

/// The full set of issues from one parse of one document.
///
/// Produced as an error when any fatal issue exists; a successful
/// parse carries its warnings separately on the parse outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Document ID when one could be extracted before failure.
    pub document_id: Option<String>,
    /// All issues found, in discovery order.
    pub issues: Vec<Issue>,
}

impl ParseReport {
    /// Issues with fatal severity.
    pub fn fatal(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Fatal)
    }

    /// Issues with warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document_id {
            Some(id) => writeln!(f, "document {id}: {} issue(s)", self.issues.len())?,
            None => writeln!(f, "document: {} issue(s)", self.issues.len())?,
        }
        for issue in &self.issues {
            writeln!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_kind() {
        assert_eq!(IssueKind::Encoding.severity(), Severity::Fatal);
        assert_eq!(IssueKind::Structural.severity(), Severity::Fatal);
        assert_eq!(IssueKind::Schema.severity(), Severity::Fatal);
        assert_eq!(IssueKind::Sequence.severity(), Severity::Warning);
        assert_eq!(IssueKind::NoAcceptanceCriteria.severity(), Severity::Warning);
    }

    #[test]
    fn test_issue_collection_keeps_all() {
        let mut issues = Issues::new();
        issues.push(Issue::new(IssueKind::Schema, "missing required field: user").in_field("user"));
        issues.push(
            Issue::new(IssueKind::Schema, "missing required field: trigger").in_field("trigger"),
        );
        issues.push(Issue::new(IssueKind::Sequence, "step 3 follows step 1").at_line(12));

        assert_eq!(issues.items().len(), 3);
        assert!(issues.has_fatal());

        let report = issues.into_report(Some("LOGIN-001".into()));
        assert_eq!(report.fatal().count(), 2);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_display_carries_line_and_field() {
        let issue = Issue::new(IssueKind::Schema, "bad priority")
            .at_line(4)
            .in_field("priority");
        let text = issue.to_string();
        assert!(text.contains("line 4"));
        assert!(text.contains("priority"));
        assert!(text.contains("schema violation"));
    }
}
