//! Validate block parser.
//!
//! Decodes the `Validate:` section into the four typed subsections.
//! `happy_path` and `boundaries` alternate `input`/`expect` mapping
//! entries; `invariants` and `contracts` are bare strings.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use reqflow_core::{Issue, IssueKind, Issues, Value};

use crate::document::{
    ContractStatement, InvariantStatement, Scope, TestCase, Tolerance, ValidateBlock,
};
use crate::sections::RawSection;

/// The section label that opens the block.
pub const VALIDATE_LABEL: &str = "Validate";

const SUBSECTIONS: [&str; 4] = ["happy_path", "boundaries", "invariants", "contracts"];

/// `"AUTH-001: ..."`-style prefix marking a foreign-scoped invariant.
static FOREIGN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9]*(?:-[A-Z0-9]+)+):\s*(.*)$").unwrap());

/// `± N unit` tolerance suffix.
static TOLERANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"±\s*([0-9]+(?:\.[0-9]+)?)\s*([A-Za-z%][A-Za-z0-9%/]*)\s*$").unwrap());

/// Parse the raw `Validate` section.
///
/// An empty block is valid but produces a warning that no acceptance
/// criteria exist.
pub fn parse_validate(section: &RawSection, issues: &mut Issues) -> Option<ValidateBlock> {
    let text = reconstruct_yaml(section);
    let value = match serde_yaml::from_str::<serde_yaml::Value>(&text) {
        Ok(v) => v,
        Err(e) => {
            let line = e
                .location()
                .map(|l| section.line + l.line().saturating_sub(1))
                .unwrap_or(section.line);
            issues.push(
                Issue::new(IssueKind::Schema, format!("malformed Validate block: {e}"))
                    .in_field(VALIDATE_LABEL)
                    .at_line(line),
            );
            return None;
        }
    };

    let inner = match value {
        serde_yaml::Value::Mapping(mut outer) => outer
            .remove(serde_yaml::Value::String(VALIDATE_LABEL.to_string()))
            .unwrap_or(serde_yaml::Value::Null),
        _ => serde_yaml::Value::Null,
    };

    let mut block = ValidateBlock::default();
    match inner {
        serde_yaml::Value::Null => {}
        serde_yaml::Value::Mapping(subsections) => {
            for (key, value) in subsections {
                let name = match key {
                    serde_yaml::Value::String(s) => s,
                    other => {
                        issues.push(
                            Issue::new(
                                IssueKind::Schema,
                                format!("Validate subsection key must be a string, found {other:?}"),
                            )
                            .in_field(VALIDATE_LABEL)
                            .at_line(section.line),
                        );
                        continue;
                    }
                };
                match name.as_str() {
                    "happy_path" => block.happy_path = parse_cases(&value, "happy_path", section.line, issues),
                    "boundaries" => block.boundaries = parse_cases(&value, "boundaries", section.line, issues),
                    "invariants" => block.invariants = parse_invariants(&value, section.line, issues),
                    "contracts" => block.contracts = parse_contracts(&value, section.line, issues),
                    other => {
                        issues.push(
                            Issue::new(
                                IssueKind::Schema,
                                format!(
                                    "unknown Validate subsection `{other}`; expected one of {}",
                                    SUBSECTIONS.join(", ")
                                ),
                            )
                            .in_field(other)
                            .at_line(section.line),
                        );
                    }
                }
            }
        }
        _ => {
            issues.push(
                Issue::new(IssueKind::Schema, "Validate block must be a mapping of subsections")
                    .in_field(VALIDATE_LABEL)
                    .at_line(section.line),
            );
            return None;
        }
    }

    if block.is_empty() {
        issues.push(
            Issue::new(
                IssueKind::NoAcceptanceCriteria,
                "Validate block declares no acceptance criteria",
            )
            .in_field(VALIDATE_LABEL)
            .at_line(section.line),
        );
    }

    Some(block)
}

fn reconstruct_yaml(section: &RawSection) -> String {
    let mut text = String::from("Validate:");
    if !section.body.is_empty() {
        if !section.body.starts_with('\n') {
            text.push(' ');
        }
        text.push_str(&section.body);
    }
    text
}

/// Parse an alternating `input`/`expect` entry list into paired cases.
fn parse_cases(
    value: &serde_yaml::Value,
    subsection: &str,
    line: usize,
    issues: &mut Issues,
) -> Vec<TestCase> {
    let entries = match value {
        serde_yaml::Value::Sequence(seq) => seq,
        _ => {
            issues.push(
                Issue::new(IssueKind::Schema, format!("`{subsection}` must be a list of entries"))
                    .in_field(subsection)
                    .at_line(line),
            );
            return Vec::new();
        }
    };

    let mut cases = Vec::new();
    let mut pending: Option<BTreeMap<String, Value>> = None;

    for entry in entries {
        let Some((key, mapping)) = single_key_mapping(entry) else {
            issues.push(
                Issue::new(
                    IssueKind::Schema,
                    format!("`{subsection}` entries must be single `input:` or `expect:` mappings"),
                )
                .in_field(subsection)
                .at_line(line),
            );
            continue;
        };

        let fields = match to_value_map(mapping) {
            Ok(fields) => fields,
            Err(e) => {
                issues.push(
                    Issue::new(IssueKind::Schema, format!("bad `{key}` entry in `{subsection}`: {e}"))
                        .in_field(subsection)
                        .at_line(line),
                );
                continue;
            }
        };

        match key.as_str() {
            "input" => {
                if pending.is_some() {
                    issues.push(
                        Issue::new(
                            IssueKind::Schema,
                            format!("`{subsection}` has an `input` with no matching `expect`"),
                        )
                        .in_field(subsection)
                        .at_line(line),
                    );
                }
                pending = Some(fields);
            }
            "expect" => match pending.take() {
                Some(input) => cases.push(TestCase {
                    input,
                    expect: fields,
                }),
                None => {
                    issues.push(
                        Issue::new(
                            IssueKind::Schema,
                            format!("`{subsection}` has an `expect` with no preceding `input`"),
                        )
                        .in_field(subsection)
                        .at_line(line),
                    );
                }
            },
            other => {
                issues.push(
                    Issue::new(
                        IssueKind::Schema,
                        format!("unexpected `{other}` entry in `{subsection}`; expected input or expect"),
                    )
                    .in_field(subsection)
                    .at_line(line),
                );
            }
        }
    }

    if pending.is_some() {
        issues.push(
            Issue::new(
                IssueKind::Schema,
                format!("`{subsection}` ends with an unmatched trailing `input`"),
            )
            .in_field(subsection)
            .at_line(line),
        );
    }

    cases
}

fn parse_invariants(
    value: &serde_yaml::Value,
    line: usize,
    issues: &mut Issues,
) -> Vec<InvariantStatement> {
    string_entries(value, "invariants", line, issues)
        .into_iter()
        .map(|text| match FOREIGN_PREFIX.captures(&text) {
            Some(caps) => InvariantStatement {
                scope: Scope::Foreign(caps[1].to_string()),
                text: caps[2].to_string(),
            },
            None => InvariantStatement {
                scope: Scope::OwnDocument,
                text,
            },
        })
        .collect()
}

fn parse_contracts(
    value: &serde_yaml::Value,
    line: usize,
    issues: &mut Issues,
) -> Vec<ContractStatement> {
    string_entries(value, "contracts", line, issues)
        .into_iter()
        .filter_map(|text| {
            let tolerance = if text.contains('±') {
                match TOLERANCE.captures(&text) {
                    Some(caps) => Some(Tolerance {
                        // The regex only admits well-formed numbers.
                        value: caps[1].parse().unwrap(),
                        unit: caps[2].to_string(),
                    }),
                    None => {
                        issues.push(
                            Issue::new(
                                IssueKind::Schema,
                                format!(
                                    "contract has `±` without a parseable `± N unit` tolerance: `{text}`"
                                ),
                            )
                            .in_field("contracts")
                            .at_line(line),
                        );
                        return None;
                    }
                }
            } else {
                None
            };
            Some(ContractStatement { text, tolerance })
        })
        .collect()
}

fn string_entries(
    value: &serde_yaml::Value,
    subsection: &str,
    line: usize,
    issues: &mut Issues,
) -> Vec<String> {
    let entries = match value {
        serde_yaml::Value::Sequence(seq) => seq,
        _ => {
            issues.push(
                Issue::new(IssueKind::Schema, format!("`{subsection}` must be a list of strings"))
                    .in_field(subsection)
                    .at_line(line),
            );
            return Vec::new();
        }
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            serde_yaml::Value::String(s) => out.push(s.clone()),
            other => {
                issues.push(
                    Issue::new(
                        IssueKind::Schema,
                        format!("`{subsection}` entries must be strings, found {other:?}"),
                    )
                    .in_field(subsection)
                    .at_line(line),
                );
            }
        }
    }
    out
}

fn single_key_mapping(entry: &serde_yaml::Value) -> Option<(String, &serde_yaml::Mapping)> {
    let serde_yaml::Value::Mapping(m) = entry else {
        return None;
    };
    if m.len() != 1 {
        return None;
    }
    let (key, value) = m.iter().next()?;
    let key = key.as_str()?.to_string();
    match value {
        serde_yaml::Value::Mapping(inner) => Some((key, inner)),
        _ => None,
    }
}

fn to_value_map(mapping: &serde_yaml::Mapping) -> Result<BTreeMap<String, Value>, String> {
    let yaml = serde_yaml::Value::Mapping(mapping.clone());
    match Value::from_yaml(&yaml).map_err(|e| e.to_string())? {
        Value::Map(m) => Ok(m),
        _ => Err("expected a mapping".to_string()),
    }
}
