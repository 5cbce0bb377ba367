//! Check command implementation.

use std::path::PathBuf;

use clap::Parser;
use reqflow_core::{Issue, IssueKind, ParseReport};
use reqflow_corpus::load_dir;
use reqflow_parser::parse_document;
use serde_json::json;
use tokio::fs;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Parse requirement files and report every violation
#[derive(Debug, Parser)]
pub struct CheckCommand {
    /// Requirement files or directories to check
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

impl CheckCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut checked = 0usize;
        let mut failures: Vec<(PathBuf, ParseReport)> = Vec::new();
        let mut warnings: Vec<(String, Vec<Issue>)> = Vec::new();

        for path in &self.paths {
            if path.is_dir() {
                let loaded = load_dir(path).await?;
                checked += loaded.corpus.len() + loaded.failures.len();
                failures.extend(loaded.failures.into_iter().map(|f| (f.path, f.report)));
                warnings.extend(loaded.warnings);
            } else {
                checked += 1;
                // Invalid UTF-8 is an encoding violation of the
                // document, not an I/O failure.
                let text = match String::from_utf8(fs::read(path).await?) {
                    Ok(text) => text,
                    Err(_) => {
                        failures.push((
                            path.clone(),
                            ParseReport {
                                document_id: None,
                                issues: vec![Issue::new(
                                    IssueKind::Encoding,
                                    "file is not valid UTF-8",
                                )],
                            },
                        ));
                        continue;
                    }
                };
                match parse_document(&text) {
                    Ok(outcome) => {
                        if !outcome.warnings.is_empty() {
                            warnings.push((outcome.document.id.clone(), outcome.warnings));
                        }
                    }
                    Err(report) => failures.push((path.clone(), report)),
                }
            }
        }

        match ctx.format {
            OutputFormat::Json => {
                let report = json!({
                    "checked": checked,
                    "failures": failures
                        .iter()
                        .map(|(path, report)| {
                            json!({
                                "path": path.display().to_string(),
                                "document_id": report.document_id,
                                "issues": report.issues,
                            })
                        })
                        .collect::<Vec<_>>(),
                    "warnings": warnings
                        .iter()
                        .map(|(id, issues)| json!({"document_id": id, "issues": issues}))
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for (path, report) in &failures {
                    println!("{}: FAILED", path.display());
                    for issue in &report.issues {
                        println!("  - {issue}");
                    }
                }
                for (id, issues) in &warnings {
                    println!("{id}: {} warning(s)", issues.len());
                    for issue in issues {
                        println!("  - {issue}");
                    }
                }
                if failures.is_empty() {
                    println!("{checked} document(s) checked, no errors");
                }
            }
        }

        if !failures.is_empty() {
            return Err(CliError::Validation(format!(
                "{} of {checked} document(s) failed to parse",
                failures.len()
            )));
        }
        if self.deny_warnings && !warnings.is_empty() {
            return Err(CliError::Validation(format!(
                "{} document(s) carry warnings",
                warnings.len()
            )));
        }
        Ok(())
    }
}
