//! Workflow Data Model
//!
//! Core data structures describing models, phases, workflow types and
//! the project specifications fed to the engine.
//!
//! # Example YAML Format
//!
//! ```yaml
//! models:
//!   - model_id: gpt_default
//!     provider: openai
//!     model_name: gpt-4-turbo
//!     version: 1.0.0
//!     capabilities: [text_generation, qa, summarization]
//!     parameters:
//!       temperature: 0.7
//!
//! workflows:
//!   - type_code: text_generation
//!     name: Text Generation Workflow
//!     description: Workflow for generating text-based content
//!     phases:
//!       - phase_number: 1
//!         phase_name: input_analysis
//!         description: Analyze input requirements
//!         required_capabilities: text_generation
//!         prompt_template: "Analyze the following input: {input}"
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Availability of a registered model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    #[default]
    Active,
    Inactive,
}

/// Describes a text-generation model and the capabilities it offers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    /// Unique key within a model registry
    #[serde(deserialize_with = "trimmed")]
    pub model_id: String,

    pub provider: String,

    pub model_name: String,

    #[serde(default)]
    pub version: String,

    /// Capability tags (e.g., "text_generation", "qa")
    #[serde(deserialize_with = "single_or_set", default)]
    pub capabilities: BTreeSet<String>,

    /// Backend-specific settings such as temperature or max_tokens
    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default)]
    pub status: ModelStatus,
}

impl ModelDescriptor {
    /// Creates an active descriptor with no capabilities.
    pub fn new(
        model_id: impl Into<String>,
        provider: impl Into<String>,
        model_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into().trim().to_string(),
            provider: provider.into(),
            model_name: model_name.into(),
            version: version.into(),
            capabilities: BTreeSet::new(),
            parameters: Map::new(),
            status: ModelStatus::Active,
        }
    }

    /// Adds capability tags.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Sets a single backend parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_status(mut self, status: ModelStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ModelStatus::Active
    }
}

/// Configuration for one phase of a workflow.
///
/// `phase_name` selects the implementation in the phase registry. It is
/// not unique across workflows: two workflows may use the same name with
/// different prompt templates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhaseConfig {
    /// Ordering hint only; list order in the workflow is authoritative
    #[serde(default)]
    pub phase_number: u32,

    #[serde(deserialize_with = "trimmed")]
    pub phase_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(deserialize_with = "single_or_vec", default)]
    pub required_capabilities: Vec<String>,

    /// Prompt text with `{placeholder}` markers
    #[serde(default)]
    pub prompt_template: String,
}

impl PhaseConfig {
    /// Creates a phase configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use sparkflow::workflow::PhaseConfig;
    ///
    /// let phase = PhaseConfig::new(1, "input_analysis", "Analyze input requirements")
    ///     .with_capabilities(["text_generation"])
    ///     .with_prompt_template("Analyze the following input: {input}");
    /// ```
    pub fn new(
        phase_number: u32,
        phase_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            phase_number,
            phase_name: phase_name.into().trim().to_string(),
            description: description.into(),
            required_capabilities: Vec::new(),
            prompt_template: String::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }
}

/// A named, ordered sequence of phases.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowType {
    #[serde(deserialize_with = "trimmed")]
    pub type_code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Execution order is the list order
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

impl WorkflowType {
    pub fn new(
        type_code: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            type_code: type_code.into().trim().to_string(),
            name: name.into(),
            description: description.into(),
            phases: Vec::new(),
        }
    }

    /// Appends a phase to the end of the sequence.
    pub fn with_phase(mut self, phase: PhaseConfig) -> Self {
        self.phases.push(phase);
        self
    }

    /// Returns phase names in execution order.
    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.phase_name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Inbound project description consumed by the engine.
///
/// Fields not known here are kept in `extra` and handed to phases as-is.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProjectSpec {
    #[serde(default)]
    pub description: String,

    /// Explicit workflow type; skips description-based resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<String>,

    /// Open fields such as topic, tone and length
    #[serde(default)]
    pub input_data: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_workflow_type(mut self, type_code: impl Into<String>) -> Self {
        self.workflow_type = Some(type_code.into());
        self
    }

    /// Sets one `input_data` field.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input_data.insert(key.into(), value.into());
        self
    }

    /// Returns the JSON form handed to phases.
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(ref workflow_type) = self.workflow_type {
            map.insert(
                "workflow_type".to_string(),
                Value::String(workflow_type.clone()),
            );
        }
        map.insert(
            "input_data".to_string(),
            Value::Object(self.input_data.clone()),
        );
        Value::Object(map)
    }
}

/// Deserializes an identifier with surrounding whitespace removed
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

fn single_or_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    single_or_vec(deserializer).map(|tags| tags.into_iter().collect())
}
