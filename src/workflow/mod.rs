//! Workflow Definition Module
//!
//! Provides data structures and utilities for defining, loading and
//! validating models, workflow types and project specifications.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (ModelDescriptor, PhaseConfig, WorkflowType, ProjectSpec)
//! - [`parser`]: YAML/JSON catalog and project loading
//! - [`validator`]: Validation rules for catalogs

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{ModelDescriptor, ModelStatus, PhaseConfig, ProjectSpec, WorkflowType};
pub use parser::{load_catalog, load_project_specs, save_catalog, Catalog};
pub use validator::{validate_catalog, validate_workflow, ValidationError};
