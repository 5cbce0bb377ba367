//! Run command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqflow_core::Value;
use reqflow_parser::parse_document;
use reqflow_runner::{
    Adapter, DocumentOutcome, EchoAdapter, EqualityPolicy, Orchestrator, RunConfig,
    ScriptedAdapter,
};
use tokio::fs;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Which adapter executes the test cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AdapterKind {
    /// Return each case's input unchanged
    #[default]
    Echo,
    /// Replay outputs from a JSON responses file, in call order
    Script,
}

/// Score a candidate implementation against a document's acceptance
/// criteria
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Requirement document to validate against
    pub document: PathBuf,

    /// Adapter to execute test cases with
    #[arg(long, value_enum, default_value = "echo")]
    pub adapter: AdapterKind,

    /// JSON file holding an array of output mappings for the script
    /// adapter
    #[arg(long, required_if_eq("adapter", "script"))]
    pub responses: Option<PathBuf>,

    /// Per-case execution timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Reject output keys the expectation does not mention
    #[arg(long)]
    pub strict: bool,
}

impl RunCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let text = fs::read_to_string(&self.document).await?;
        let outcome = parse_document(&text)?;
        for warning in &outcome.warnings {
            tracing::warn!("{warning}");
        }

        let adapter = self.build_adapter().await?;
        let orchestrator = Orchestrator::new(RunConfig {
            case_timeout: Duration::from_secs(self.timeout_secs),
            policy: if self.strict {
                EqualityPolicy::strict()
            } else {
                EqualityPolicy::lenient()
            },
        });
        let report = orchestrator.run(&outcome.document, adapter.as_ref()).await;

        match ctx.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for case in &report.cases {
                    match &case.detail {
                        Some(detail) => println!(
                            "{} [{}] case {}: {detail}",
                            outcome_label(case.outcome.is_pass()),
                            case.subsection,
                            case.case_index
                        ),
                        None => println!(
                            "{} [{}] case {}",
                            outcome_label(case.outcome.is_pass()),
                            case.subsection,
                            case.case_index
                        ),
                    }
                }
                println!("{}: {:?}", report.document_id, report.outcome);
            }
        }

        if report.outcome == DocumentOutcome::Failed {
            return Err(CliError::Validation(format!(
                "{}: {} check(s) did not pass",
                report.document_id,
                report.failures().count()
            )));
        }
        Ok(())
    }

    async fn build_adapter(&self) -> Result<Box<dyn Adapter>, CliError> {
        match self.adapter {
            AdapterKind::Echo => Ok(Box::new(EchoAdapter)),
            AdapterKind::Script => {
                // required_if_eq guarantees the path is present.
                let Some(path) = &self.responses else {
                    return Err(CliError::Validation(
                        "--responses is required with the script adapter".into(),
                    ));
                };
                let text = fs::read_to_string(path).await?;
                let responses: Vec<BTreeMap<String, Value>> = serde_json::from_str(&text)?;
                Ok(Box::new(ScriptedAdapter::new(responses)))
            }
        }
    }
}

fn outcome_label(pass: bool) -> &'static str {
    if pass {
        "PASS"
    } else {
        "FAIL"
    }
}
