//! Built-in Phases
//!
//! The two phases of the standard text-generation workflow:
//! - `input_analysis` breaks the project requirements down
//! - `content_generation` writes the content from that analysis
//!
//! Both recover from backend failures by returning an
//! `{"error": ..., "input_data": ...}` output instead of an `Err`.

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::{json, Value};

use super::prompt::{placeholders, prompt_vars, render_prompt};
use crate::error::PhaseError;
use crate::registry::{Phase, PhaseContext, PhaseRegistry};
use crate::workflow::PhaseConfig;

/// Registry name of [`InputAnalysisPhase`].
pub const INPUT_ANALYSIS: &str = "input_analysis";

/// Registry name of [`ContentGenerationPhase`].
pub const CONTENT_GENERATION: &str = "content_generation";

/// Loopback stage carrying analysis results.
pub const ANALYSIS_STAGE: &str = "analysis";

/// Loopback stage carrying generated content.
pub const CONTENT_STAGE: &str = "content";

const ANALYSIS_PROMPT: &str = "Provide a comprehensive analysis of the following input requirements:
Description: {description}
Topic: {topic}
Tone: {tone}
Length: {length}

Break down the requirements, provide context, and outline key considerations for content creation.";

const CONTENT_PROMPT: &str = "Based on the following comprehensive analysis, generate a technical blog post:

Analysis Background:
{analysis}

Content Requirements:
- Topic: {topic}
- Tone: {tone}
- Length: {length}

Guidelines:
- Maintain a professional and technical tone
- Provide in-depth insights into the topic
- Ensure the content is informative and engaging
- Structure the post with a clear introduction, body, and conclusion
- Include relevant technical details and examples

Generate the blog post content:";

/// Registers the built-in phases under their standard names.
pub fn register_builtin_phases(registry: &mut PhaseRegistry) {
    registry.register(INPUT_ANALYSIS, |config| {
        Ok(Box::new(InputAnalysisPhase::new(config)) as Box<dyn Phase>)
    });
    registry.register(CONTENT_GENERATION, |config| {
        Ok(Box::new(ContentGenerationPhase::new(config)) as Box<dyn Phase>)
    });
}

/// Renders the configured template, or `fallback` when none is set.
fn build_prompt(config: &PhaseConfig, fallback: &str, input: &Value) -> String {
    let template = if config.prompt_template.trim().is_empty() {
        fallback
    } else {
        config.prompt_template.as_str()
    };

    let vars = prompt_vars(input);
    let unresolved: Vec<String> = placeholders(template)
        .into_iter()
        .filter(|name| !vars.contains_key(name))
        .collect();
    if !unresolved.is_empty() {
        warn!(
            "Phase '{}': no value for placeholders {:?}",
            config.phase_name, unresolved
        );
    }

    render_prompt(template, &vars)
}

/// Attaches the selected model id to an output object.
fn with_model(mut output: Value, ctx: &PhaseContext) -> Value {
    if let (Some(model), Some(map)) = (ctx.model.as_ref(), output.as_object_mut()) {
        map.insert("model_id".to_string(), Value::String(model.model_id.clone()));
    }
    output
}

/// Analyzes the project requirements.
#[derive(Debug, Clone)]
pub struct InputAnalysisPhase {
    config: PhaseConfig,
}

impl InputAnalysisPhase {
    pub fn new(config: PhaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Phase for InputAnalysisPhase {
    fn config(&self) -> &PhaseConfig {
        &self.config
    }

    async fn execute(&self, input: &Value, ctx: &PhaseContext) -> Result<Value, PhaseError> {
        let prompt = build_prompt(&self.config, ANALYSIS_PROMPT, input);

        match ctx.generator.generate(&prompt).await {
            Ok(analysis) => {
                let output = with_model(
                    json!({"analysis": analysis, "input_data": input.clone()}),
                    ctx,
                );
                ctx.loopback
                    .send(&ctx.channel(ANALYSIS_STAGE), output.clone())
                    .await;
                Ok(output)
            }
            Err(e) => {
                error!("Input analysis failed: {}", e);
                Ok(json!({
                    "error": format!("Analysis failed: {}", e),
                    "input_data": input.clone(),
                }))
            }
        }
    }
}

/// Generates content from an analysis.
///
/// The analysis is read from the input's `analysis` field when present
/// (chained wiring), otherwise from the run's analysis loopback channel.
#[derive(Debug, Clone)]
pub struct ContentGenerationPhase {
    config: PhaseConfig,
}

impl ContentGenerationPhase {
    pub fn new(config: PhaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Phase for ContentGenerationPhase {
    fn config(&self) -> &PhaseConfig {
        &self.config
    }

    async fn execute(&self, input: &Value, ctx: &PhaseContext) -> Result<Value, PhaseError> {
        // Always drain the channel so nothing is left behind for this run.
        let queued = ctx.loopback.retrieve(&ctx.channel(ANALYSIS_STAGE));

        let prompt_input = if input.get("analysis").is_some() {
            input.clone()
        } else {
            let analysis = queued
                .as_ref()
                .and_then(|payload| payload.get("analysis"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if analysis.is_empty() {
                debug!("No analysis available for run {}", ctx.run_id);
            }
            json!({"analysis": analysis, "input_data": input.clone()})
        };

        let prompt = build_prompt(&self.config, CONTENT_PROMPT, &prompt_input);

        match ctx.generator.generate(&prompt).await {
            Ok(content) => {
                let output = with_model(
                    json!({"generated_content": content, "input_data": input.clone()}),
                    ctx,
                );
                ctx.loopback
                    .send(&ctx.channel(CONTENT_STAGE), output.clone())
                    .await;
                Ok(output)
            }
            Err(e) => {
                error!("Content generation failed: {}", e);
                Ok(json!({
                    "error": format!("Content generation failed: {}", e),
                    "input_data": input.clone(),
                }))
            }
        }
    }
}
