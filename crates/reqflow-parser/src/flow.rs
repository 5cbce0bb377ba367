//! Flow parser: numbered steps and their alternative paths.

use once_cell::sync::Lazy;
use regex::Regex;
use reqflow_core::{Issue, IssueKind, Issues};

use crate::document::{AlternativePath, FlowStep};
use crate::lexer::Line;

/// Indentation of an alternative path relative to its owning step.
pub const ALTERNATIVE_INDENT: usize = 3;

/// Words an alternative condition may open with.
const CUE_WORDS: [&str; 3] = ["If", "When", "On"];

static STEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(\S.*)$").unwrap());

/// Parse the flow region (the lines between `Flow:` and the first
/// technical section or `Validate:`).
///
/// Numbering gaps produce non-fatal sequence warnings; indentation and
/// dash-syntax violations are fatal schema violations because they are
/// unambiguous grammar breaks.
pub fn parse_flow(lines: &[Line], issues: &mut Issues) -> Vec<FlowStep> {
    let mut steps: Vec<FlowStep> = Vec::new();

    for line in lines {
        if line.is_blank() {
            continue;
        }

        if line.indent == 0 {
            match STEP.captures(&line.text) {
                Some(caps) => {
                    let number: u32 = match caps[1].parse() {
                        Ok(n) if n > 0 => n,
                        _ => {
                            issues.push(
                                Issue::new(
                                    IssueKind::Schema,
                                    format!("invalid step number `{}`", &caps[1]),
                                )
                                .at_line(line.number),
                            );
                            continue;
                        }
                    };
                    let expected = steps.last().map(|s| s.number + 1).unwrap_or(1);
                    if number != expected {
                        issues.push(
                            Issue::new(
                                IssueKind::Sequence,
                                format!("step numbered {number}, expected {expected}"),
                            )
                            .at_line(line.number),
                        );
                    }
                    steps.push(FlowStep {
                        number,
                        text: caps[2].trim_end().to_string(),
                        alternatives: Vec::new(),
                    });
                }
                None => {
                    issues.push(
                        Issue::new(
                            IssueKind::Schema,
                            format!("unrecognized line in flow: `{}`", line.text),
                        )
                        .at_line(line.number),
                    );
                }
            }
            continue;
        }

        // Indented line: must be an alternative path under the current
        // step, at exactly the fixed relative depth.
        let Some(step) = steps.last_mut() else {
            issues.push(
                Issue::new(IssueKind::Schema, "alternative path before any numbered step")
                    .at_line(line.number),
            );
            continue;
        };

        if !line.text.starts_with("- ") {
            issues.push(
                Issue::new(
                    IssueKind::Schema,
                    format!("indented flow line must be a `- ` alternative path: `{}`", line.text),
                )
                .at_line(line.number),
            );
            continue;
        }

        if line.indent != ALTERNATIVE_INDENT {
            issues.push(
                Issue::new(
                    IssueKind::Schema,
                    format!(
                        "alternative path indented {} spaces; expected exactly {}",
                        line.indent, ALTERNATIVE_INDENT
                    ),
                )
                .at_line(line.number),
            );
            continue;
        }

        match parse_alternative(&line.text[2..]) {
            Ok(alt) => step.alternatives.push(alt),
            Err(message) => {
                issues.push(Issue::new(IssueKind::Schema, message).at_line(line.number));
            }
        }
    }

    steps
}

fn parse_alternative(text: &str) -> Result<AlternativePath, String> {
    let Some((condition, outcome)) = text.split_once(':') else {
        return Err(format!(
            "alternative path missing `:` between condition and outcome: `{text}`"
        ));
    };
    let condition = condition.trim();
    let outcome = outcome.trim();

    let cue = condition.split_whitespace().next().unwrap_or("");
    if !CUE_WORDS.contains(&cue) {
        return Err(format!(
            "alternative condition must begin with If, When, or On: `{condition}`"
        ));
    }
    if outcome.is_empty() {
        return Err(format!("alternative path has no outcome: `{text}`"));
    }

    Ok(AlternativePath {
        condition: condition.to_string(),
        outcome: outcome.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(spec: &[(usize, &str)]) -> Vec<Line> {
        spec.iter()
            .enumerate()
            .map(|(i, (indent, text))| Line {
                number: i + 1,
                indent: *indent,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_steps_and_alternatives() {
        let body = lines(&[
            (0, "1. User submits the login form"),
            (3, "- If the password is wrong: show an error"),
            (3, "- When the account is locked: show the lockout notice"),
            (0, "2. System issues a session token"),
            (3, "- On token service outage: retry once"),
        ]);
        let mut issues = Issues::new();
        let steps = parse_flow(&body, &mut issues);
        assert!(!issues.has_fatal(), "{:?}", issues.items());

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].alternatives.len(), 2);
        assert_eq!(steps[1].alternatives.len(), 1);
        assert_eq!(steps[0].alternatives[1].condition, "When the account is locked");
        assert_eq!(steps[1].alternatives[0].outcome, "retry once");
    }

    #[test]
    fn test_alternatives_attach_to_owning_step_only() {
        // Steps with differing alternative counts; nothing leaks
        // between them.
        let body = lines(&[
            (0, "1. First"),
            (0, "2. Second"),
            (3, "- If x: y"),
            (3, "- If z: w"),
            (3, "- If q: r"),
            (0, "3. Third"),
        ]);
        let mut issues = Issues::new();
        let steps = parse_flow(&body, &mut issues);

        assert_eq!(steps[0].alternatives.len(), 0);
        assert_eq!(steps[1].alternatives.len(), 3);
        assert_eq!(steps[2].alternatives.len(), 0);
    }

    #[test]
    fn test_numbering_gap_is_warning_not_fatal() {
        let body = lines(&[(0, "1. First"), (0, "3. Renumbered later")]);
        let mut issues = Issues::new();
        let steps = parse_flow(&body, &mut issues);

        assert_eq!(steps.len(), 2);
        assert!(!issues.has_fatal());
        let warning = &issues.items()[0];
        assert_eq!(warning.kind, IssueKind::Sequence);
        assert!(warning.message.contains("expected 2"));
    }

    #[test]
    fn test_first_step_not_one_is_warning() {
        let body = lines(&[(0, "2. Starts late")]);
        let mut issues = Issues::new();
        parse_flow(&body, &mut issues);
        assert_eq!(issues.items()[0].kind, IssueKind::Sequence);
    }

    #[test]
    fn test_wrong_indent_is_schema_violation() {
        // Two spaces instead of three must not be reinterpreted as
        // step text.
        let body = lines(&[(0, "1. First"), (2, "- If x: y")]);
        let mut issues = Issues::new();
        let steps = parse_flow(&body, &mut issues);

        assert!(issues.has_fatal());
        assert_eq!(issues.items()[0].kind, IssueKind::Schema);
        assert!(issues.items()[0].message.contains("expected exactly 3"));
        assert!(steps[0].alternatives.is_empty());
    }

    #[test]
    fn test_missing_cue_word_is_schema_violation() {
        let body = lines(&[(0, "1. First"), (3, "- Because reasons: outcome")]);
        let mut issues = Issues::new();
        parse_flow(&body, &mut issues);
        assert!(issues.has_fatal());
        assert!(issues.items()[0].message.contains("If, When, or On"));
    }

    #[test]
    fn test_missing_colon_is_schema_violation() {
        let body = lines(&[(0, "1. First"), (3, "- If it breaks entirely")]);
        let mut issues = Issues::new();
        parse_flow(&body, &mut issues);
        assert!(issues.has_fatal());
        assert!(issues.items()[0].message.contains("missing `:`"));
    }

    #[test]
    fn test_alternative_before_any_step() {
        let body = lines(&[(3, "- If x: y")]);
        let mut issues = Issues::new();
        let steps = parse_flow(&body, &mut issues);
        assert!(steps.is_empty());
        assert!(issues.has_fatal());
    }
}
