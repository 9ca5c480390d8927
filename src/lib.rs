//! Sparkflow - Phased Content Workflow Engine
//!
//! Runs project specifications through ordered, typed workflows. Each
//! workflow phase is built from a registered factory, matched against the
//! model catalog by capability, and recorded on a per-run timeline.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`workflow`]: Catalog data structures, parsing and validation
//! - [`registry`]: Model, workflow and phase registries
//! - [`execution`]: The engine, built-in phases and generation backends
//! - [`loopback`]: Callback routing for intermediate phase results
//! - [`monitoring`]: Per-execution timeline tracking
//! - [`error`]: Error types shared across modules
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sparkflow::execution::{register_builtin_phases, EchoGenerator, WorkflowEngine};
//! use sparkflow::load_catalog;
//! use sparkflow::workflow::ProjectSpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load models and workflows from YAML
//!     let catalog = load_catalog("catalog.yaml")?;
//!
//!     // Create the engine and register phase implementations
//!     let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
//!     register_builtin_phases(engine.phases_mut());
//!     engine.load_catalog(catalog);
//!
//!     // Execute a project
//!     let spec = ProjectSpec::new("Generate a technical blog post")
//!         .with_workflow_type("text_generation")
//!         .with_input("topic", "Advances in AI Workflow Automation");
//!     let report = engine.execute_project(&spec).await?;
//!     println!("{}", report.timeline.gantt_chart());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod execution;
pub mod loopback;
pub mod monitoring;
pub mod registry;
pub mod workflow;

// Re-export commonly used types
pub use error::{EngineError, ExecutionFailure, PhaseError};
pub use execution::engine::{ExecutionReport, InputWiring, WorkflowEngine};
pub use loopback::LoopbackRouter;
pub use monitoring::ProjectTimeline;
pub use workflow::model::{ModelDescriptor, PhaseConfig, ProjectSpec, WorkflowType};
pub use workflow::parser::load_catalog;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Sparkflow";
