//! Technical section parser.
//!
//! Splits the post-flow body into labeled raw-text chunks. A section
//! starts at a depth-0 `Label: ...` line and runs until the next
//! depth-0 labeled line; its value keeps newlines verbatim so a parsed
//! document can be re-serialized field-for-field.

use once_cell::sync::Lazy;
use regex::Regex;
use reqflow_core::{Issue, IssueKind, Issues};

use crate::lexer::Line;

static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*(?: [A-Za-z0-9_-]+)*):(.*)$").unwrap());

/// A labeled chunk of raw body text, before semantic interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// Label as written.
    pub label: String,
    /// 1-based source line of the label.
    pub line: usize,
    /// Raw value: remainder of the label line plus all following lines
    /// until the next depth-0 label, trailing blank lines trimmed.
    pub body: String,
}

/// Whether a body line opens a labeled section.
pub fn is_label_line(line: &Line) -> bool {
    line.indent == 0 && !line.is_blank() && LABEL.is_match(&line.text)
}

/// Split body lines into labeled sections.
///
/// The slice must start at a label line; anything before one is
/// reported and skipped.
pub fn split_sections(lines: &[Line], issues: &mut Issues) -> Vec<RawSection> {
    let mut sections: Vec<RawSection> = Vec::new();
    let mut current: Option<(String, usize, Vec<String>)> = None;

    for line in lines {
        if is_label_line(line) {
            if let Some(section) = current.take() {
                sections.push(finish(section));
            }
            let caps = LABEL.captures(&line.text).unwrap();
            let label = caps[1].to_string();
            let rest = caps[2].strip_prefix(' ').unwrap_or(&caps[2]).to_string();
            current = Some((label, line.number, vec![rest]));
            continue;
        }

        match &mut current {
            Some((_, _, body)) => {
                // Reconstruct the line verbatim, indentation included.
                let mut raw = " ".repeat(line.indent);
                raw.push_str(&line.text);
                body.push(raw);
            }
            None if line.is_blank() => {}
            None => {
                issues.push(
                    Issue::new(
                        IssueKind::Schema,
                        format!("text outside any labeled section: `{}`", line.text),
                    )
                    .at_line(line.number),
                );
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(finish(section));
    }
    sections
}

fn finish((label, line, mut body): (String, usize, Vec<String>)) -> RawSection {
    while body.len() > 1 && body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }
    RawSection {
        label,
        line,
        body: body.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &str) -> Vec<Line> {
        raw.lines()
            .enumerate()
            .map(|(i, l)| {
                let stripped = l.trim_start_matches(' ');
                Line {
                    number: i + 1,
                    indent: l.len() - stripped.len(),
                    text: stripped.to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_single_line_sections() {
        let body = lines("API: POST /login returns 200 with token\nRule: lock after 5 failures\n");
        let mut issues = Issues::new();
        let sections = split_sections(&body, &mut issues);
        assert!(issues.is_empty());

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].label, "API");
        assert_eq!(sections[0].body, "POST /login returns 200 with token");
        assert_eq!(sections[1].label, "Rule");
    }

    #[test]
    fn test_multi_line_section_preserves_newlines() {
        let body = lines("Data: users table\n  email: unique index\n  password_hash: argon2\n\nSecurity: rate limited\n");
        let mut issues = Issues::new();
        let sections = split_sections(&body, &mut issues);

        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0].body,
            "users table\n  email: unique index\n  password_hash: argon2"
        );
        assert_eq!(sections[1].body, "rate limited");
    }

    #[test]
    fn test_unknown_labels_are_sections_too() {
        let body = lines("Rollout Notes: staged by region\n");
        let mut issues = Issues::new();
        let sections = split_sections(&body, &mut issues);
        assert_eq!(sections[0].label, "Rollout Notes");
    }

    #[test]
    fn test_order_is_preserved() {
        let body = lines("Security: a\nAPI: b\nData: c\n");
        let mut issues = Issues::new();
        let labels: Vec<String> = split_sections(&body, &mut issues)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["Security", "API", "Data"]);
    }

    #[test]
    fn test_text_before_any_label_is_reported() {
        let body = lines("stray text\nAPI: x\n");
        let mut issues = Issues::new();
        let sections = split_sections(&body, &mut issues);
        assert_eq!(sections.len(), 1);
        assert!(issues.has_fatal());
    }

    #[test]
    fn test_step_lines_are_not_labels() {
        let step = Line {
            number: 1,
            indent: 0,
            text: "2. do the thing: carefully".into(),
        };
        assert!(!is_label_line(&step));
    }
}
