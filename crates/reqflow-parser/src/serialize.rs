//! Document serializer.
//!
//! Re-serializing a parsed [`Document`] must reproduce an equivalent
//! document: not byte-identical, but field-for-field equal after a
//! second parse. Scalar values are written in JSON form, which YAML
//! accepts verbatim.

use std::fmt::Write;

use reqflow_core::Value;

use crate::document::{Document, Scope, ValidateBlock};

/// Render a document back to source text.
pub fn serialize(document: &Document) -> String {
    let mut out = String::new();

    out.push_str("---\n");
    let fm = &document.frontmatter;
    push_field(&mut out, "id", &fm.id);
    push_field(&mut out, "user", &fm.user);
    push_field(&mut out, "context", &fm.context);
    push_field(&mut out, "trigger", &fm.trigger);
    push_field(&mut out, "user_outcome", &fm.user_outcome);
    if let Some(v) = &fm.business_outcome {
        push_field(&mut out, "business_outcome", v);
    }
    if let Some(p) = fm.priority {
        let _ = writeln!(out, "priority: {p}");
    }
    if let Some(s) = fm.status {
        let _ = writeln!(out, "status: {s}");
    }
    if let Some(v) = &fm.estimate {
        push_field(&mut out, "estimate", v);
    }
    if !fm.depends_on.is_empty() {
        let _ = writeln!(out, "depends_on: {}", string_list(&fm.depends_on));
    }
    if !fm.tags.is_empty() {
        let tags: Vec<String> = fm.tags.iter().cloned().collect();
        let _ = writeln!(out, "tags: {}", string_list(&tags));
    }
    for (key, value) in &fm.extensions {
        let _ = writeln!(out, "{key}: {}", json(value));
    }
    out.push_str("---\n\nFlow:\n");

    for step in &document.flow {
        let _ = writeln!(out, "{}. {}", step.number, step.text);
        for alt in &step.alternatives {
            let _ = writeln!(out, "   - {}: {}", alt.condition, alt.outcome);
        }
    }

    for section in &document.sections {
        out.push('\n');
        push_labeled(&mut out, section.label.as_str(), &section.body);
    }

    if let Some(validate) = &document.validate {
        out.push('\n');
        push_validate(&mut out, validate);
    }

    out
}

fn push_field(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "{name}: {}", quote(value));
}

fn push_labeled(out: &mut String, label: &str, body: &str) {
    let mut lines = body.lines();
    match lines.next() {
        Some(first) if !first.is_empty() => {
            let _ = writeln!(out, "{label}: {first}");
        }
        _ => {
            let _ = writeln!(out, "{label}:");
        }
    }
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
}

fn push_validate(out: &mut String, block: &ValidateBlock) {
    out.push_str("Validate:\n");
    for (name, cases) in [("happy_path", &block.happy_path), ("boundaries", &block.boundaries)] {
        if cases.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {name}:");
        for case in cases {
            let _ = writeln!(out, "    - input: {}", json(&Value::Map(case.input.clone())));
            let _ = writeln!(out, "    - expect: {}", json(&Value::Map(case.expect.clone())));
        }
    }
    if !block.invariants.is_empty() {
        out.push_str("  invariants:\n");
        for inv in &block.invariants {
            let text = match &inv.scope {
                Scope::OwnDocument => inv.text.clone(),
                Scope::Foreign(id) => format!("{id}: {}", inv.text),
            };
            let _ = writeln!(out, "    - {}", quote(&text));
        }
    }
    if !block.contracts.is_empty() {
        out.push_str("  contracts:\n");
        for contract in &block.contracts {
            let _ = writeln!(out, "    - {}", quote(&contract.text));
        }
    }
}

fn quote(s: &str) -> String {
    // JSON string escaping is valid YAML.
    serde_json::to_string(s).expect("string serialization is infallible")
}

fn string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn json(value: &Value) -> String {
    serde_json::to_string(value).expect("value serialization is infallible")
}
