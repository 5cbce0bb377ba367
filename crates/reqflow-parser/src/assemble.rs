//! Document assembler: runs the full pipeline and produces one
//! immutable [`Document`] or the complete list of violations.

use once_cell::sync::Lazy;
use regex::Regex;
use reqflow_core::{Issue, IssueKind, Issues, ParseReport};
use tracing::debug;

use crate::document::{Document, Section, SectionLabel};
use crate::flow::parse_flow;
use crate::frontmatter::parse_frontmatter;
use crate::lexer::{segment, Line};
use crate::sections::{is_label_line, split_sections};
use crate::validate::{parse_validate, VALIDATE_LABEL};

/// The keyword that opens the body.
const FLOW_KEYWORD: &str = "Flow:";

/// Best-effort ID extraction for error reports when frontmatter
/// decoding itself failed.
static ID_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^id:\s*"?([^"\n]+)"?\s*$"#).unwrap());

/// A successfully parsed document plus its non-fatal warnings.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The assembled immutable document.
    pub document: Document,
    /// Sequence warnings and other non-fatal issues.
    pub warnings: Vec<Issue>,
}

/// Parse one requirement document.
///
/// Single-document parsing never partially succeeds: either a complete
/// [`Document`] is produced, or the error carries every violation
/// found in the pass.
pub fn parse_document(raw: &str) -> Result<ParseOutcome, ParseReport> {
    let mut issues = Issues::new();

    let Some(segments) = segment(raw, &mut issues) else {
        return Err(issues.into_report(None));
    };

    let frontmatter = parse_frontmatter(&segments.frontmatter, segments.frontmatter_start, &mut issues);
    let document_id = frontmatter
        .as_ref()
        .map(|fm| fm.id.clone())
        .or_else(|| fallback_id(&segments.frontmatter));

    let (flow_lines, section_lines, flow_line_number) = split_body(&segments.body, &mut issues);

    let flow = parse_flow(flow_lines, &mut issues);
    if flow.is_empty() && flow_line_number.is_some() {
        issues.push(
            Issue::new(IssueKind::Schema, "flow contains no steps")
                .at_line(flow_line_number.unwrap()),
        );
    }

    let raw_sections = split_sections(section_lines, &mut issues);
    let mut sections = Vec::new();
    let mut validate = None;
    for raw_section in &raw_sections {
        if raw_section.label == VALIDATE_LABEL {
            if validate.is_some() {
                issues.push(
                    Issue::new(IssueKind::Schema, "duplicate Validate block")
                        .in_field(VALIDATE_LABEL)
                        .at_line(raw_section.line),
                );
                continue;
            }
            validate = parse_validate(raw_section, &mut issues);
        } else {
            sections.push(Section {
                label: SectionLabel::from_label(&raw_section.label),
                body: raw_section.body.clone(),
            });
        }
    }

    let frontmatter = match frontmatter {
        Some(fm) if !issues.has_fatal() => fm,
        _ => return Err(issues.into_report(document_id)),
    };

    let document = Document {
        id: frontmatter.id.clone(),
        frontmatter,
        flow,
        sections,
        validate,
    };
    debug!(
        id = %document.id,
        steps = document.flow.len(),
        sections = document.sections.len(),
        "parsed document"
    );

    Ok(ParseOutcome {
        document,
        warnings: issues.items().to_vec(),
    })
}

/// Locate `Flow:` and split the body into the flow region and the
/// section region.
fn split_body<'a>(
    body: &'a [Line],
    issues: &mut Issues,
) -> (&'a [Line], &'a [Line], Option<usize>) {
    let Some(first) = body.iter().position(|l| !l.is_blank()) else {
        issues.push(Issue::new(IssueKind::Structural, "document body is empty"));
        return (&[], &[], None);
    };

    let flow_line = &body[first];
    if flow_line.indent != 0 || flow_line.text.trim_end() != FLOW_KEYWORD {
        issues.push(
            Issue::new(IssueKind::Structural, "body must begin with the `Flow:` keyword")
                .at_line(flow_line.number),
        );
        return (&[], &[], None);
    }

    let after_flow = first + 1;
    let flow_end = body[after_flow..]
        .iter()
        .position(is_label_line)
        .map(|offset| after_flow + offset)
        .unwrap_or(body.len());

    (
        &body[after_flow..flow_end],
        &body[flow_end..],
        Some(flow_line.number),
    )
}

fn fallback_id(frontmatter: &str) -> Option<String> {
    ID_LINE
        .captures(frontmatter)
        .map(|caps| caps[1].trim().to_string())
}
