//! Resolve command implementation.

use std::path::PathBuf;

use clap::Parser;
use reqflow_corpus::{load_dir, resolve};
use serde_json::json;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Load a corpus and resolve cross-document references
#[derive(Debug, Parser)]
pub struct ResolveCommand {
    /// Directory containing the requirement corpus
    pub dir: PathBuf,
}

impl ResolveCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let loaded = load_dir(&self.dir).await?;
        let parse_failures = loaded.failures;

        // A dependency cycle aborts the pass here, naming the cycle.
        let resolution = resolve(loaded.corpus)?;

        match ctx.format {
            OutputFormat::Json => {
                let report = json!({
                    "documents": resolution.corpus.ids().collect::<Vec<_>>(),
                    "resolved": resolution.resolved,
                    "failures": resolution
                        .failures
                        .iter()
                        .map(|(id, errors)| {
                            (
                                id.clone(),
                                errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
                            )
                        })
                        .collect::<std::collections::BTreeMap<_, _>>(),
                    "parse_failures": parse_failures
                        .iter()
                        .map(|f| {
                            json!({
                                "path": f.path.display().to_string(),
                                "issues": f.report.issues,
                            })
                        })
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for failure in &parse_failures {
                    println!("{}: FAILED", failure.path.display());
                    for issue in &failure.report.issues {
                        println!("  - {issue}");
                    }
                }
                println!("{} document(s) loaded", resolution.corpus.len());
                for (id, resolved) in &resolution.resolved {
                    for invariant in resolved {
                        println!("{id} -> {}: {}", invariant.target, invariant.text);
                    }
                }
                for (id, errors) in &resolution.failures {
                    println!("{id}: {} resolution error(s)", errors.len());
                    for error in errors {
                        println!("  - {error}");
                    }
                }
            }
        }

        if !parse_failures.is_empty() || !resolution.is_clean() {
            return Err(CliError::Validation(format!(
                "corpus has {} parse failure(s) and {} document(s) with resolution errors",
                parse_failures.len(),
                resolution.failures.len()
            )));
        }
        Ok(())
    }
}
