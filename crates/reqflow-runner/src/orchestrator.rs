//! The validation-loop state machine.
//!
//! `GENERATED → HAPPY_PATH_CHECKED → BOUNDARIES_CHECKED →
//! INVARIANTS_CHECKED → CONTRACTS_CHECKED → {PASSED, FAILED}`.
//!
//! The orchestrator never produces or modifies the candidate
//! implementation; it scores one candidate per invocation through the
//! [`Adapter`] and stops at the first subsection whose checks do not
//! all pass.

use std::collections::BTreeMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqflow_core::Value;
use reqflow_parser::{ContractStatement, Document, Scope, TestCase, ValidateBlock};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::adapter::{Adapter, AdapterError};
use crate::policy::EqualityPolicy;
use crate::report::{CaseOutcome, CaseResult, DocumentOutcome, LoopState, Report, Subsection};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Per-case execution timeout. A case that exceeds it is a
    /// `Timeout` failure, never a silent pass.
    pub case_timeout: Duration,
    /// Output comparison rules.
    pub policy: EqualityPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            case_timeout: Duration::from_secs(10),
            policy: EqualityPolicy::lenient(),
        }
    }
}

/// Drives the generate → execute → score → report cycle for one
/// document against one adapter.
#[derive(Debug, Default)]
pub struct Orchestrator {
    config: RunConfig,
}

enum SubsectionStatus {
    Passed,
    Failed,
    /// Fatal adapter error: stop everything, keep results so far.
    Aborted,
}

impl Orchestrator {
    /// Orchestrator with the given configuration.
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Score one candidate. Re-running against an unchanged document
    /// and adapter yields an identical report.
    #[instrument(skip_all, fields(document = %document.id))]
    pub async fn run(&self, document: &Document, adapter: &dyn Adapter) -> Report {
        let mut cases = Vec::new();
        let mut trace = vec![LoopState::Generated];
        let mut captured: BTreeMap<String, Value> = BTreeMap::new();

        let Some(validate) = &document.validate else {
            // Nothing to check; vacuously passing.
            trace.push(LoopState::Passed);
            return Report {
                document_id: document.id.clone(),
                cases,
                state_trace: trace,
                outcome: DocumentOutcome::Passed,
            };
        };

        let conflicts = conflicting_fields(validate);
        if !conflicts.is_empty() {
            warn!(?conflicts, "invariant/contract conflicts detected");
        }

        let executable = [
            (Subsection::HappyPath, &validate.happy_path, LoopState::HappyPathChecked),
            (Subsection::Boundaries, &validate.boundaries, LoopState::BoundariesChecked),
        ];

        let mut aborted = false;
        for (subsection, list, checked) in executable {
            let status = self
                .run_cases(subsection, list, adapter, &mut captured, &mut cases)
                .await;
            match status {
                SubsectionStatus::Passed => trace.push(checked),
                SubsectionStatus::Failed | SubsectionStatus::Aborted => {
                    aborted = true;
                    break;
                }
            }
        }

        if !aborted {
            let status = score_invariants(validate, &conflicts, &mut cases);
            if matches!(status, SubsectionStatus::Passed) {
                trace.push(LoopState::InvariantsChecked);
                let status = score_contracts(validate, &conflicts, &captured, &mut cases);
                if matches!(status, SubsectionStatus::Passed) {
                    trace.push(LoopState::ContractsChecked);
                } else {
                    aborted = true;
                }
            } else {
                aborted = true;
            }
        }

        let outcome = if aborted {
            trace.push(LoopState::Failed);
            DocumentOutcome::Failed
        } else {
            trace.push(LoopState::Passed);
            DocumentOutcome::Passed
        };

        debug!(?outcome, checks = cases.len(), "validation loop finished");
        Report {
            document_id: document.id.clone(),
            cases,
            state_trace: trace,
            outcome,
        }
    }

    /// Execute one subsection's cases, sequentially and in document
    /// order: later boundary cases are defined relative to the
    /// cumulative effect of earlier ones on a stateful adapter.
    async fn run_cases(
        &self,
        subsection: Subsection,
        list: &[TestCase],
        adapter: &dyn Adapter,
        captured: &mut BTreeMap<String, Value>,
        out: &mut Vec<CaseResult>,
    ) -> SubsectionStatus {
        let mut all_passed = true;

        for (case_index, case) in list.iter().enumerate() {
            let (outcome, detail) = match timeout(self.config.case_timeout, adapter.execute(&case.input)).await
            {
                Err(_) => (
                    CaseOutcome::Timeout,
                    Some(format!(
                        "adapter gave no answer within {:?}",
                        self.config.case_timeout
                    )),
                ),
                Ok(Err(AdapterError::Unreachable(message))) => {
                    out.push(CaseResult {
                        subsection,
                        case_index,
                        outcome: CaseOutcome::Error,
                        detail: Some(format!("adapter unreachable: {message}")),
                    });
                    return SubsectionStatus::Aborted;
                }
                Ok(Err(e)) => (CaseOutcome::Error, Some(e.to_string())),
                Ok(Ok(output)) => {
                    let result = match self.config.policy.compare(&case.expect, &output) {
                        Ok(()) => (CaseOutcome::Pass, None),
                        Err(mismatches) => (CaseOutcome::Fail, Some(mismatches.join("; "))),
                    };
                    captured.extend(output);
                    result
                }
            };
            all_passed &= outcome.is_pass();
            out.push(CaseResult {
                subsection,
                case_index,
                outcome,
                detail,
            });
        }

        if all_passed {
            SubsectionStatus::Passed
        } else {
            SubsectionStatus::Failed
        }
    }
}

fn score_invariants(
    validate: &ValidateBlock,
    conflicts: &BTreeMap<String, (f64, f64)>,
    out: &mut Vec<CaseResult>,
) -> SubsectionStatus {
    let mut all_passed = true;
    for (case_index, invariant) in validate.invariants.iter().enumerate() {
        let (outcome, detail) = if let Some((field, (a, b))) =
            conflicts.iter().find(|(field, _)| invariant.text.contains(*field))
        {
            (
                CaseOutcome::Error,
                Some(format!(
                    "conflicting criteria for `{field}`: invariant claims {a}, contract claims {b}"
                )),
            )
        } else {
            match &invariant.scope {
                Scope::Foreign(id) => (
                    CaseOutcome::Pass,
                    Some(format!("delegated to corpus resolution of {id}")),
                ),
                Scope::OwnDocument => (
                    CaseOutcome::Pass,
                    Some("assertion recorded; not mechanically verified".to_string()),
                ),
            }
        };
        all_passed &= outcome.is_pass();
        out.push(CaseResult {
            subsection: Subsection::Invariants,
            case_index,
            outcome,
            detail,
        });
    }
    if all_passed {
        SubsectionStatus::Passed
    } else {
        SubsectionStatus::Failed
    }
}

fn score_contracts(
    validate: &ValidateBlock,
    conflicts: &BTreeMap<String, (f64, f64)>,
    captured: &BTreeMap<String, Value>,
    out: &mut Vec<CaseResult>,
) -> SubsectionStatus {
    let mut all_passed = true;
    for (case_index, contract) in validate.contracts.iter().enumerate() {
        let (outcome, detail) = if let Some((field, (a, b))) =
            conflicts.iter().find(|(field, _)| contract.text.contains(*field))
        {
            (
                CaseOutcome::Error,
                Some(format!(
                    "conflicting criteria for `{field}`: invariant claims {a}, contract claims {b}"
                )),
            )
        } else {
            check_contract(contract, captured)
        };
        all_passed &= outcome.is_pass();
        out.push(CaseResult {
            subsection: Subsection::Contracts,
            case_index,
            outcome,
            detail,
        });
    }
    if all_passed {
        SubsectionStatus::Passed
    } else {
        SubsectionStatus::Failed
    }
}

/// Check one contract against the outputs captured while executing
/// test cases.
///
/// A contract is machine-checkable when it carries a tolerance, names
/// a captured output field, and states a numeric target: the captured
/// value must lie within `target ± tolerance`. Contracts outside that
/// shape are recorded but not mechanically verified.
fn check_contract(
    contract: &ContractStatement,
    captured: &BTreeMap<String, Value>,
) -> (CaseOutcome, Option<String>) {
    let Some(tolerance) = &contract.tolerance else {
        return (
            CaseOutcome::Pass,
            Some("assertion recorded; not mechanically verified".to_string()),
        );
    };

    let body = contract.text.split('±').next().unwrap_or("");
    let field = captured
        .keys()
        .find(|key| body.contains(key.as_str()))
        .cloned();
    let target = NUMBER
        .find(body)
        .and_then(|m| m.as_str().parse::<f64>().ok());

    match (field, target) {
        (Some(field), Some(target)) => match captured.get(&field).and_then(Value::as_f64) {
            Some(actual) if (actual - target).abs() <= tolerance.value => (
                CaseOutcome::Pass,
                Some(format!(
                    "`{field}` = {actual} within {target} ± {} {}",
                    tolerance.value, tolerance.unit
                )),
            ),
            Some(actual) => (
                CaseOutcome::Fail,
                Some(format!(
                    "`{field}` = {actual} outside {target} ± {} {}",
                    tolerance.value, tolerance.unit
                )),
            ),
            None => (
                CaseOutcome::Fail,
                Some(format!("`{field}` captured but not numeric")),
            ),
        },
        _ => (
            CaseOutcome::Pass,
            Some("no captured output matches this contract; not mechanically verified".to_string()),
        ),
    }
}

/// Fields claimed with different numeric targets by an invariant and
/// a contract. The format leaves such conflicts undefined, so they are
/// flagged as errors rather than silently resolved.
fn conflicting_fields(validate: &ValidateBlock) -> BTreeMap<String, (f64, f64)> {
    let expect_keys: Vec<&String> = validate
        .happy_path
        .iter()
        .chain(&validate.boundaries)
        .flat_map(|case| case.expect.keys())
        .collect();

    let claim = |text: &str| -> Option<(String, f64)> {
        let key = expect_keys.iter().find(|k| text.contains(k.as_str()))?;
        let number = NUMBER.find(text)?.as_str().parse().ok()?;
        Some(((*key).clone(), number))
    };

    let mut conflicts = BTreeMap::new();
    for invariant in &validate.invariants {
        let Some((field, a)) = claim(&invariant.text) else {
            continue;
        };
        for contract in &validate.contracts {
            let body = contract.text.split('±').next().unwrap_or("");
            if let Some((other, b)) = claim(body) {
                if other == field && a != b {
                    conflicts.insert(field.clone(), (a, b));
                }
            }
        }
    }
    conflicts
}
