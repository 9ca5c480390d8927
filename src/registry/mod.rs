//! Registries Module
//!
//! Lookup tables the engine consults while running a project.
//!
//! - [`model`]: Model descriptors and capability matching
//! - [`phase`]: Phase factories and the [`Phase`] trait
//! - [`workflow`]: Workflow types and type resolution

pub mod model;
pub mod phase;
pub mod workflow;

pub use model::{match_score, ModelRegistry, ModelRequirements};
pub use phase::{Phase, PhaseContext, PhaseFactory, PhaseRegistry};
pub use workflow::WorkflowRegistry;
