//! Catalog Validation
//!
//! Checks model and workflow definitions before they reach the registries:
//! - Identifier fields are present
//! - Identifiers are unique within a catalog
//! - Phase lists are usable

use std::collections::HashSet;

use log::{debug, info, warn};

use super::model::{ModelDescriptor, WorkflowType};
use super::parser::Catalog;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyModelId,
    DuplicateModelId(String),
    EmptyTypeCode,
    DuplicateTypeCode(String),
    EmptyPhaseName { workflow: String, position: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyModelId => write!(f, "Model has empty or whitespace-only model_id"),
            Self::DuplicateModelId(id) => write!(f, "Duplicate model_id: '{}'", id),
            Self::EmptyTypeCode => write!(f, "Workflow has empty or whitespace-only type_code"),
            Self::DuplicateTypeCode(code) => write!(f, "Duplicate workflow type_code: '{}'", code),
            Self::EmptyPhaseName { workflow, position } => write!(
                f,
                "Workflow '{}': phase #{} has no phase_name",
                workflow, position
            ),
        }
    }
}

/// Validates a single model descriptor.
fn validate_model(model: &ModelDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if model.model_id.trim().is_empty() {
        errors.push(ValidationError::EmptyModelId);
        return errors;
    }

    if model.capabilities.is_empty() {
        warn!(
            "Model '{}' declares no capabilities and will only match empty requirements",
            model.model_id
        );
    }

    if !model.is_active() {
        debug!("Model '{}' is inactive", model.model_id);
    }

    errors
}

/// Validates a single workflow type.
///
/// Empty phase lists and repeated phase names are legal but logged: an
/// empty workflow yields an empty result set, and a repeated name makes
/// the later phase overwrite the earlier one's result entry.
pub fn validate_workflow(workflow: &WorkflowType) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if workflow.type_code.trim().is_empty() {
        errors.push(ValidationError::EmptyTypeCode);
        return errors;
    }

    if workflow.phases.is_empty() {
        warn!(
            "Workflow '{}' has no phases; executions will produce no results",
            workflow.type_code
        );
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (index, phase) in workflow.phases.iter().enumerate() {
        if phase.phase_name.trim().is_empty() {
            errors.push(ValidationError::EmptyPhaseName {
                workflow: workflow.type_code.clone(),
                position: index + 1,
            });
            continue;
        }

        if !seen.insert(phase.phase_name.as_str()) {
            warn!(
                "Workflow '{}' lists phase '{}' more than once",
                workflow.type_code, phase.phase_name
            );
        }
    }

    let hints_ordered = workflow
        .phases
        .windows(2)
        .all(|pair| pair[0].phase_number <= pair[1].phase_number);
    if !hints_ordered {
        debug!(
            "Workflow '{}': phase_number hints disagree with list order; list order wins",
            workflow.type_code
        );
    }

    errors
}

/// Validates an entire catalog.
///
/// Collects every problem rather than stopping at the first one, and
/// returns them joined into a single message.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), String> {
    info!(
        "Validating catalog with {} models and {} workflows",
        catalog.models.len(),
        catalog.workflows.len()
    );

    let mut errors: Vec<ValidationError> = Vec::new();

    let mut model_ids: HashSet<&str> = HashSet::new();
    for model in &catalog.models {
        errors.extend(validate_model(model));
        if !model.model_id.trim().is_empty() && !model_ids.insert(model.model_id.as_str()) {
            errors.push(ValidationError::DuplicateModelId(model.model_id.clone()));
        }
    }

    let mut type_codes: HashSet<&str> = HashSet::new();
    for workflow in &catalog.workflows {
        errors.extend(validate_workflow(workflow));
        if !workflow.type_code.trim().is_empty() && !type_codes.insert(workflow.type_code.as_str())
        {
            errors.push(ValidationError::DuplicateTypeCode(workflow.type_code.clone()));
        }
    }

    if errors.is_empty() {
        info!("Catalog validated");
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Err(messages.join("; "))
    }
}
