//! Error Types
//!
//! Typed failures raised by the registries, phases and the engine.
//! Loopback delivery problems never appear here: they are absorbed
//! into the router's pending slot.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::monitoring::ProjectTimeline;

/// Boxed error used at the edges where any backend error is accepted.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a text-generation backend.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Generation request rejected: {0}")]
    Rejected(String),
}

/// Failure raised from inside a phase that the phase did not recover from.
#[derive(Debug, Error)]
pub enum PhaseError {
    /// The phase factory refused to build an instance from its config.
    #[error("Could not construct phase '{phase}': {reason}")]
    Construction { phase: String, reason: String },

    #[error("Text generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("Missing required input field '{0}'")]
    MissingInput(String),

    #[error("{0}")]
    Other(String),
}

/// Errors that abort a single workflow execution.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown workflow type: {0}")]
    UnknownWorkflowType(String),

    #[error("Unknown phase type: {0}")]
    UnknownPhaseType(String),

    #[error("Phase '{phase}' failed: {source}")]
    PhaseExecutionFailure {
        phase: String,
        #[source]
        source: PhaseError,
    },
}

/// Top-level failure for one project execution.
///
/// Carries what was observed before the abort so callers can decide
/// whether to retry, skip or stop a batch.
#[derive(Debug, Error)]
#[error("Project execution failed: {source}")]
pub struct ExecutionFailure {
    pub run_id: String,
    pub description: String,
    /// Phase that was running when the execution aborted, if any.
    pub failed_phase: Option<String>,
    pub partial_results: Map<String, Value>,
    pub timeline: ProjectTimeline,
    #[source]
    pub source: EngineError,
}

impl ExecutionFailure {
    /// Returns the underlying engine error.
    pub fn kind(&self) -> &EngineError {
        &self.source
    }
}

/// Failures while loading catalog or project files.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}. Check the file format.")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}. Check the file format.")]
    Json(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    Validation(String),
}
