//! Workflow Registry
//!
//! Maps workflow type codes to their phase sequences.

use std::collections::HashMap;

use log::{debug, info};

use crate::workflow::{validate_workflow, WorkflowType};

/// Registry of workflow types keyed by `type_code`, in registration order.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    order: Vec<String>,
    workflows: HashMap<String, WorkflowType>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a workflow type.
    ///
    /// Validation problems are logged, not rejected; strict checking
    /// happens when catalogs are loaded from disk.
    pub fn register(&mut self, workflow: WorkflowType) {
        for problem in validate_workflow(&workflow) {
            debug!("Registering workflow with problem: {}", problem);
        }

        let type_code = workflow.type_code.clone();
        if self.workflows.contains_key(&type_code) {
            info!("Replacing workflow type: {}", type_code);
        } else {
            info!(
                "Registered workflow type: {} ({} phases)",
                type_code,
                workflow.phases.len()
            );
            self.order.push(type_code.clone());
        }
        self.workflows.insert(type_code, workflow);
    }

    pub fn get(&self, type_code: &str) -> Option<&WorkflowType> {
        self.workflows.get(type_code)
    }

    /// Picks a workflow type for a free-text description.
    ///
    /// The description is not interpreted: this returns the first
    /// registered type code, or `None` when the registry is empty. Callers
    /// that need a specific workflow must name it in the project spec.
    pub fn identify_type(&self, description: &str) -> Option<&str> {
        let chosen = self.order.first().map(String::as_str);
        debug!(
            "Identified workflow type {:?} for description '{}'",
            chosen, description
        );
        chosen
    }

    /// Type codes in registration order.
    pub fn type_codes(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
