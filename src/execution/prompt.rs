//! Prompt Construction
//!
//! Handles placeholder substitution for phase prompt templates and the
//! extraction of template variables from phase inputs.
//!
//! # Placeholder Substitution
//!
//! - `{description}` - Project description
//! - `{topic}`, `{tone}`, `{length}` and any other string `input_data` field
//! - `{input}` - The whole `input_data` object as compact JSON
//! - `{analysis}` - Analysis text, when the phase has one

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Tone used when the project does not specify one.
pub const DEFAULT_TONE: &str = "professional";

/// Length used when the project does not specify one.
pub const DEFAULT_LENGTH: &str = "medium";

/// Locates the project specification inside a phase input.
///
/// Phase outputs wrap the input they received under `input_data`, so a
/// chained input may nest the original project one or more levels deep.
pub fn project_spec(input: &Value) -> &Value {
    let mut current = input;
    while let Some(inner) = current.get("input_data") {
        if inner.get("input_data").map_or(false, Value::is_object) {
            current = inner;
        } else {
            break;
        }
    }
    current
}

/// Returns the `input_data` fields of the project found in `input`.
pub fn input_fields(input: &Value) -> Map<String, Value> {
    project_spec(input)
        .get("input_data")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Builds template variables from a phase input.
pub fn prompt_vars(input: &Value) -> HashMap<String, String> {
    let spec = project_spec(input);
    let fields = input_fields(input);
    let mut vars = HashMap::new();

    for (key, value) in &fields {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        vars.insert(key.clone(), text);
    }

    vars.entry("topic".to_string()).or_insert_with(String::new);
    vars.entry("tone".to_string())
        .or_insert_with(|| DEFAULT_TONE.to_string());
    vars.entry("length".to_string())
        .or_insert_with(|| DEFAULT_LENGTH.to_string());

    let description = spec
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    vars.insert("description".to_string(), description.to_string());
    vars.insert("input".to_string(), Value::Object(fields).to_string());

    if let Some(analysis) = input.get("analysis").and_then(Value::as_str) {
        vars.insert("analysis".to_string(), analysis.to_string());
    }

    vars
}

/// Substitutes `{name}` markers with values from `vars`.
///
/// Markers without a value are left in place. Substituted text is not
/// scanned again.
pub fn render_prompt(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after
            .find('}')
            .and_then(|close| vars.get(&after[..close]).map(|value| (close, value)));
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Lists `{name}` markers in a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };

        let name = &after[..close];
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            names.push(name.to_string());
        }
        rest = &after[close + 1..];
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Value {
        json!({
            "description": "Generate a technical blog post",
            "input_data": {"topic": "X", "tone": "casual", "words": 800}
        })
    }

    #[test]
    fn test_prompt_vars_from_project() {
        let vars = prompt_vars(&project());

        assert_eq!(vars["description"], "Generate a technical blog post");
        assert_eq!(vars["topic"], "X");
        assert_eq!(vars["tone"], "casual");
        assert_eq!(vars["length"], DEFAULT_LENGTH);
        assert_eq!(vars["words"], "800");
        assert!(vars["input"].contains("\"topic\":\"X\""));
        assert!(!vars.contains_key("analysis"));
    }

    #[test]
    fn test_prompt_vars_from_chained_output() {
        let chained = json!({"analysis": "key points", "input_data": project()});
        let vars = prompt_vars(&chained);

        assert_eq!(vars["analysis"], "key points");
        assert_eq!(vars["topic"], "X");
        assert_eq!(vars["description"], "Generate a technical blog post");
    }

    #[test]
    fn test_project_spec_unwraps_nested_outputs() {
        let nested = json!({"generated_content": "c", "input_data": {"analysis": "a", "input_data": project()}});
        assert_eq!(project_spec(&nested), &project());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let vars = prompt_vars(&json!({}));

        assert_eq!(vars["topic"], "");
        assert_eq!(vars["tone"], DEFAULT_TONE);
        assert_eq!(vars["description"], "");
        assert_eq!(vars["input"], "{}");
    }

    #[test]
    fn test_render_prompt() {
        let vars = prompt_vars(&project());
        let text = render_prompt("Write about {topic} in a {tone} tone. {unknown}", &vars);

        assert_eq!(text, "Write about X in a casual tone. {unknown}");
    }

    #[test]
    fn test_render_prompt_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("analysis".to_string(), "uses {topic} literally".to_string());
        vars.insert("topic".to_string(), "X".to_string());

        let text = render_prompt("{analysis} / {topic} / {", &vars);

        assert_eq!(text, "uses {topic} literally / X / {");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("Analyze {input} then {analysis}; {not valid} {"),
            vec!["input", "analysis"]
        );
        assert!(placeholders("no markers").is_empty());
    }
}
