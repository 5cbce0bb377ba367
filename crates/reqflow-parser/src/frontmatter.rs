//! Frontmatter decoder.
//!
//! Decodes the isolated YAML block into a typed [`Frontmatter`],
//! collecting every missing or invalid field in one pass so an author
//! sees all problems at once. Unknown fields are retained under
//! `extensions` rather than rejected.

use std::collections::{BTreeMap, BTreeSet};

use reqflow_core::{Issue, IssueKind, Issues, Value};

use crate::document::{Frontmatter, Priority, Status};

const REQUIRED_FIELDS: [&str; 5] = ["id", "user", "context", "trigger", "user_outcome"];

/// Decode the frontmatter block.
///
/// `start_line` is the 1-based source line of the block's first line,
/// used to report YAML errors against the original document.
pub fn parse_frontmatter(
    block: &str,
    start_line: usize,
    issues: &mut Issues,
) -> Option<Frontmatter> {
    let mapping = match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(serde_yaml::Value::Mapping(m)) => m,
        Ok(serde_yaml::Value::Null) => {
            issues.push(Issue::new(IssueKind::Schema, "frontmatter block is empty").at_line(start_line));
            return None;
        }
        Ok(_) => {
            issues.push(
                Issue::new(IssueKind::Schema, "frontmatter must be a mapping").at_line(start_line),
            );
            return None;
        }
        Err(e) => {
            let line = e
                .location()
                .map(|l| start_line + l.line().saturating_sub(1))
                .unwrap_or(start_line);
            issues.push(
                Issue::new(IssueKind::Schema, format!("invalid frontmatter YAML: {e}"))
                    .at_line(line),
            );
            return None;
        }
    };

    let mut fields: BTreeMap<String, serde_yaml::Value> = BTreeMap::new();
    for (key, value) in &mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s.clone(),
            other => {
                issues.schema(format!("frontmatter key must be a string, found {other:?}"));
                continue;
            }
        };
        if fields.insert(key.clone(), value.clone()).is_some() {
            issues.push(
                Issue::new(IssueKind::Schema, format!("duplicate frontmatter field `{key}`"))
                    .in_field(key),
            );
        }
    }

    // Required fields: every absence is its own violation, reported
    // together rather than fail-fast.
    let mut required: BTreeMap<&str, String> = BTreeMap::new();
    for name in REQUIRED_FIELDS {
        match fields.remove(name) {
            Some(value) => match string_field(&value) {
                Some(s) if !s.trim().is_empty() => {
                    required.insert(name, s);
                }
                Some(_) => {
                    issues.push(
                        Issue::new(IssueKind::Schema, format!("required field `{name}` is empty"))
                            .in_field(name),
                    );
                }
                None => {
                    issues.push(
                        Issue::new(
                            IssueKind::Schema,
                            format!("required field `{name}` must be a string"),
                        )
                        .in_field(name),
                    );
                }
            },
            None => {
                issues.push(
                    Issue::new(IssueKind::Schema, format!("missing required field `{name}`"))
                        .in_field(name),
                );
            }
        }
    }

    let business_outcome = optional_string(&mut fields, "business_outcome", issues);
    let estimate = optional_string(&mut fields, "estimate", issues);

    let priority = optional_string(&mut fields, "priority", issues).and_then(|s| {
        Priority::from_str_opt(&s).or_else(|| {
            issues.push(
                Issue::new(
                    IssueKind::Schema,
                    format!("invalid priority `{s}`; expected critical, high, medium, or low"),
                )
                .in_field("priority"),
            );
            None
        })
    });

    let status = optional_string(&mut fields, "status", issues).and_then(|s| {
        Status::from_str_opt(&s).or_else(|| {
            issues.push(
                Issue::new(
                    IssueKind::Schema,
                    format!("invalid status `{s}`; expected draft, approved, or implemented"),
                )
                .in_field("status"),
            );
            None
        })
    });

    let depends_on = match fields.remove("depends_on") {
        None => Vec::new(),
        Some(value) => string_sequence(&value, "depends_on", issues)
            .map(dedup_preserving_order)
            .unwrap_or_default(),
    };

    let tags: BTreeSet<String> = match fields.remove("tags") {
        None => BTreeSet::new(),
        Some(value) => string_sequence(&value, "tags", issues)
            .map(|v| v.into_iter().collect())
            .unwrap_or_default(),
    };

    // Everything left over is retained verbatim for forward
    // compatibility.
    let mut extensions = BTreeMap::new();
    for (key, value) in fields {
        match Value::from_yaml(&value) {
            Ok(v) => {
                extensions.insert(key, v);
            }
            Err(e) => {
                issues.push(
                    Issue::new(IssueKind::Schema, format!("unsupported value in `{key}`: {e}"))
                        .in_field(key.clone()),
                );
            }
        }
    }

    if required.len() != REQUIRED_FIELDS.len() {
        return None;
    }

    Some(Frontmatter {
        id: required.remove("id").unwrap(),
        user: required.remove("user").unwrap(),
        context: required.remove("context").unwrap(),
        trigger: required.remove("trigger").unwrap(),
        user_outcome: required.remove("user_outcome").unwrap(),
        business_outcome,
        priority,
        status,
        estimate,
        depends_on,
        tags,
        extensions,
    })
}

fn string_field(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn optional_string(
    fields: &mut BTreeMap<String, serde_yaml::Value>,
    name: &str,
    issues: &mut Issues,
) -> Option<String> {
    let value = fields.remove(name)?;
    match string_field(&value) {
        Some(s) => Some(s),
        None => {
            issues.push(
                Issue::new(IssueKind::Schema, format!("field `{name}` must be a string"))
                    .in_field(name),
            );
            None
        }
    }
}

fn string_sequence(
    value: &serde_yaml::Value,
    name: &str,
    issues: &mut Issues,
) -> Option<Vec<String>> {
    let seq = match value {
        serde_yaml::Value::Sequence(seq) => seq,
        _ => {
            issues.push(
                Issue::new(IssueKind::Schema, format!("field `{name}` must be a sequence"))
                    .in_field(name),
            );
            return None;
        }
    };
    let mut out = Vec::with_capacity(seq.len());
    for item in seq {
        match item {
            serde_yaml::Value::String(s) => out.push(s.clone()),
            other => {
                issues.push(
                    Issue::new(
                        IssueKind::Schema,
                        format!("entries of `{name}` must be strings, found {other:?}"),
                    )
                    .in_field(name),
                );
                return None;
            }
        }
    }
    Some(out)
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"id: LOGIN-001
user: registered account holder
context: on the login page with a confirmed account
trigger: submits the login form
user_outcome: reaches the dashboard
business_outcome: fewer support tickets
priority: high
status: draft
estimate: 3d
depends_on: [ACCOUNT-001, SESSION-002, ACCOUNT-001]
tags: [auth, web]
team_owner: identity
"#;

    #[test]
    fn test_full_frontmatter() {
        let mut issues = Issues::new();
        let fm = parse_frontmatter(FULL, 2, &mut issues).unwrap();
        assert!(!issues.has_fatal(), "{:?}", issues.items());

        assert_eq!(fm.id, "LOGIN-001");
        assert_eq!(fm.priority, Some(Priority::High));
        assert_eq!(fm.status, Some(Status::Draft));
        assert_eq!(fm.estimate.as_deref(), Some("3d"));
        assert!(fm.tags.contains("auth"));
        assert_eq!(
            fm.extensions.get("team_owner"),
            Some(&Value::String("identity".into()))
        );
    }

    #[test]
    fn test_depends_on_deduplicated_in_order() {
        let mut issues = Issues::new();
        let fm = parse_frontmatter(FULL, 2, &mut issues).unwrap();
        assert_eq!(fm.depends_on, vec!["ACCOUNT-001", "SESSION-002"]);
    }

    #[test]
    fn test_all_missing_fields_reported_together() {
        let mut issues = Issues::new();
        let fm = parse_frontmatter("id: A-001\nuser: someone\n", 2, &mut issues);
        assert!(fm.is_none());

        let missing: Vec<_> = issues
            .items()
            .iter()
            .filter(|i| i.message.contains("missing required field"))
            .collect();
        assert_eq!(missing.len(), 3);
        let fields: Vec<_> = missing.iter().filter_map(|i| i.field.as_deref()).collect();
        assert_eq!(fields, vec!["context", "trigger", "user_outcome"]);
    }

    #[test]
    fn test_empty_required_field_is_violation() {
        let mut issues = Issues::new();
        let block = "id: A-001\nuser: \"\"\ncontext: c\ntrigger: t\nuser_outcome: u\n";
        assert!(parse_frontmatter(block, 2, &mut issues).is_none());
        assert!(issues
            .items()
            .iter()
            .any(|i| i.field.as_deref() == Some("user") && i.message.contains("empty")));
    }

    #[test]
    fn test_invalid_priority_rejected() {
        let mut issues = Issues::new();
        let block = "id: A\nuser: u\ncontext: c\ntrigger: t\nuser_outcome: o\npriority: urgent\n";
        // The record itself still decodes; the bad enum is a fatal
        // issue collected alongside.
        let fm = parse_frontmatter(block, 2, &mut issues).unwrap();
        assert_eq!(fm.priority, None);
        assert!(issues.has_fatal());
        assert!(issues.items().iter().any(|i| i.message.contains("invalid priority")));
    }

    #[test]
    fn test_unknown_fields_are_retained_not_rejected() {
        let mut issues = Issues::new();
        let block =
            "id: A\nuser: u\ncontext: c\ntrigger: t\nuser_outcome: o\nrollout: {stage: 2}\n";
        let fm = parse_frontmatter(block, 2, &mut issues).unwrap();
        assert!(!issues.has_fatal());
        assert!(matches!(fm.extensions.get("rollout"), Some(Value::Map(_))));
    }

    #[test]
    fn test_yaml_error_reports_source_line() {
        let mut issues = Issues::new();
        let block = "id: A\nuser: [unclosed\n";
        assert!(parse_frontmatter(block, 10, &mut issues).is_none());
        let issue = &issues.items()[0];
        assert_eq!(issue.kind, IssueKind::Schema);
        assert!(issue.line.unwrap_or(0) >= 10);
    }
}
