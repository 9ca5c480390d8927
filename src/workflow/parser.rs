//! Catalog and Project Parser
//!
//! Loads model/workflow catalogs and project specifications from YAML or
//! JSON files. The format is chosen by file extension: `.json` is read as
//! JSON, anything else as YAML.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::model::{ModelDescriptor, ProjectSpec, WorkflowType};
use super::validator::validate_catalog;
use crate::error::CatalogError;

/// Model and workflow definitions loaded together at startup.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Catalog {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,

    #[serde(default)]
    pub workflows: Vec<WorkflowType>,
}

/// Project files may hold one specification or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ProjectSpec>),
    One(ProjectSpec),
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn read_file(path: &Path) -> Result<String, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!("Loaded {} ({} bytes)", path.display(), content.len());
    Ok(content)
}

/// Parses and validates catalog text.
pub fn parse_catalog(content: &str, json: bool) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = if json {
        serde_json::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };

    validate_catalog(&catalog).map_err(CatalogError::Validation)?;
    Ok(catalog)
}

/// Loads a catalog from a file.
///
/// # Example
///
/// ```rust,no_run
/// use sparkflow::workflow::load_catalog;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = load_catalog("catalog.yaml")?;
///     println!("Loaded {} workflows", catalog.workflows.len());
///     Ok(())
/// }
/// ```
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    info!("Loading catalog from: {}", path.display());

    let catalog = parse_catalog(&read_file(path)?, is_json(path))?;

    info!(
        "Parsed {} models, {} workflow types",
        catalog.models.len(),
        catalog.workflows.len()
    );
    Ok(catalog)
}

/// Loads one or more project specifications from a file.
pub fn load_project_specs(path: impl AsRef<Path>) -> Result<Vec<ProjectSpec>, CatalogError> {
    let path = path.as_ref();
    info!("Loading projects from: {}", path.display());

    let content = read_file(path)?;
    let parsed: OneOrMany = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    let specs = match parsed {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![spec],
    };

    info!("Parsed {} project specification(s)", specs.len());
    Ok(specs)
}

/// Writes a catalog as YAML.
pub fn save_catalog(catalog: &Catalog, path: impl AsRef<Path>) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let yaml_content = serde_yaml::to_string(catalog)?;
    fs::write(path, yaml_content).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Catalog saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CATALOG_YAML: &str = r#"
models:
  - model_id: gpt_default
    provider: openai
    model_name: gpt-4-turbo
    version: 1.0.0
    capabilities: [text_generation, qa, summarization]
    parameters:
      temperature: 0.7
      max_tokens: 1000

workflows:
  - type_code: text_generation
    name: Text Generation Workflow
    description: Workflow for generating text-based content
    phases:
      - phase_number: 1
        phase_name: input_analysis
        description: Analyze input requirements
        required_capabilities: [text_generation]
        prompt_template: "Analyze the following input: {input}"
      - phase_number: 2
        phase_name: content_generation
        description: Generate content based on analysis
        required_capabilities: [text_generation]
        prompt_template: "Generate content based on: {analysis}"
"#;

    #[test]
    fn test_parse_catalog_yaml() {
        let catalog = parse_catalog(CATALOG_YAML, false).unwrap();

        assert_eq!(catalog.models.len(), 1);
        assert_eq!(catalog.models[0].parameters["max_tokens"], 1000);
        assert_eq!(catalog.workflows[0].phase_names(), vec!["input_analysis", "content_generation"]);
    }

    #[test]
    fn test_parse_catalog_json() {
        let json = r#"{"workflows": [{"type_code": "wf", "phases": [{"phase_name": "p"}]}]}"#;
        let catalog = parse_catalog(json, true).unwrap();

        assert!(catalog.models.is_empty());
        assert_eq!(catalog.workflows[0].type_code, "wf");
    }

    #[test]
    fn test_parse_catalog_rejects_duplicates() {
        let yaml = r#"
workflows:
  - type_code: wf
  - type_code: wf
"#;
        let result = parse_catalog(yaml, false);
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_parse_catalog_invalid_yaml() {
        let result = parse_catalog("this is not valid yaml: [[[", false);
        assert!(matches!(result, Err(CatalogError::Yaml(_))));
    }

    #[test]
    fn test_load_catalog_file_not_found() {
        let result = load_catalog("/nonexistent/path/catalog.yaml");
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_save_then_load_catalog() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("catalog.yaml");

        let catalog = parse_catalog(CATALOG_YAML, false).unwrap();
        save_catalog(&catalog, &path).unwrap();

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded.workflows, catalog.workflows);
        assert_eq!(loaded.models, catalog.models);
    }

    #[test]
    fn test_load_single_project_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("project.yaml");
        std::fs::write(
            &path,
            r#"
description: Generate a technical blog post
workflow_type: text_generation
input_data:
  topic: Advances in AI Workflow Automation
  tone: professional
  length: medium
"#,
        )
        .unwrap();

        let specs = load_project_specs(&path).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].workflow_type.as_deref(), Some("text_generation"));
        assert_eq!(specs[0].input_data["tone"], "professional");
    }

    #[test]
    fn test_load_project_list_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("projects.json");
        std::fs::write(
            &path,
            r#"[{"description": "first"}, {"description": "second", "input_data": {"topic": "X"}}]"#,
        )
        .unwrap();

        let specs = load_project_specs(&path).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].description, "second");
    }
}
