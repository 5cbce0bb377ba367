//! The candidate-implementation adapter boundary.
//!
//! The orchestrator is agnostic to what the adapter is (an HTTP call,
//! an in-process function, a subprocess); it constrains only the
//! `execute(input) -> output` contract.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqflow_core::Value;
use thiserror::Error;

/// Errors an adapter may raise for one execution.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// The adapter cannot be reached at all. Fatal: remaining cases
    /// and subsections are aborted.
    #[error("adapter unreachable: {0}")]
    Unreachable(String),

    /// One execution failed. Scoped to that test case.
    #[error("adapter execution failed: {0}")]
    Failed(String),
}

/// A capability that executes one test-case input against the
/// candidate implementation.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Execute one input mapping and return the output mapping.
    async fn execute(
        &self,
        input: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, AdapterError>;
}

/// Adapter that returns its input unchanged. Useful for demos and for
/// exercising the orchestrator without a candidate implementation.
#[derive(Debug, Default)]
pub struct EchoAdapter;

#[async_trait]
impl Adapter for EchoAdapter {
    async fn execute(
        &self,
        input: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, AdapterError> {
        Ok(input.clone())
    }
}

/// Adapter that replays a fixed list of outputs in call order.
///
/// Deterministic by construction: the nth call returns the nth
/// scripted output, so repeated runs over a fresh instance behave
/// identically.
#[derive(Debug)]
pub struct ScriptedAdapter {
    responses: Vec<BTreeMap<String, Value>>,
    cursor: Mutex<usize>,
}

impl ScriptedAdapter {
    /// Script the outputs to replay.
    pub fn new(responses: Vec<BTreeMap<String, Value>>) -> Self {
        Self {
            responses,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Adapter for ScriptedAdapter {
    async fn execute(
        &self,
        _input: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, AdapterError> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| AdapterError::Unreachable("scripted adapter poisoned".into()))?;
        let response = self
            .responses
            .get(*cursor)
            .cloned()
            .ok_or_else(|| AdapterError::Failed(format!("no scripted response for call {cursor}")))?;
        *cursor += 1;
        Ok(response)
    }
}
