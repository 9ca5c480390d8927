//! Workflow Execution Module
//!
//! Runs project specifications through their workflow phases.
//!
//! # Architecture
//!
//! - [`engine`]: Orchestrator resolving workflows and running phases in order
//! - [`generator`]: Text-generation backend seam
//! - [`phases`]: Built-in analysis and content-generation phases
//! - [`prompt`]: Prompt templates and placeholder substitution

pub mod engine;
pub mod generator;
pub mod phases;
pub mod prompt;

pub use engine::{ExecutionReport, InputWiring, WorkflowEngine};
pub use generator::{EchoGenerator, TextGenerator};
pub use phases::{register_builtin_phases, ContentGenerationPhase, InputAnalysisPhase};
