//! Workflow Execution Engine
//!
//! The orchestrator that runs one project specification end-to-end:
//! - Workflow type resolution
//! - Sequential phase instantiation and execution
//! - Model selection per phase from required capabilities
//! - Timeline tracking and failure propagation

use std::sync::Arc;

use log::{debug, error, info};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::generator::TextGenerator;
use crate::error::{EngineError, ExecutionFailure};
use crate::loopback::LoopbackRouter;
use crate::monitoring::ProjectTimeline;
use crate::registry::{
    ModelRegistry, ModelRequirements, PhaseContext, PhaseRegistry, WorkflowRegistry,
};
use crate::workflow::{Catalog, PhaseConfig, ProjectSpec, WorkflowType};

/// What each phase receives as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputWiring {
    /// Every phase receives the original project specification. Phases
    /// share intermediate results through the loopback router.
    #[default]
    Original,
    /// Each phase after the first receives the previous phase's output.
    Chained,
}

/// Result of a successful execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: String,
    pub workflow_type: String,
    /// Phase outputs keyed by phase name, in execution order
    pub results: Map<String, Value>,
    pub timeline: ProjectTimeline,
}

/// Workflow execution engine.
///
/// Owns the registries and the loopback router. Register models,
/// workflows and phases through the `*_mut` accessors before sharing the
/// engine; [`execute_project`](Self::execute_project) only needs `&self`,
/// so independent projects may run concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sparkflow::execution::{register_builtin_phases, EchoGenerator, WorkflowEngine};
/// use sparkflow::workflow::{load_catalog, ProjectSpec};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
///     register_builtin_phases(engine.phases_mut());
///     engine.load_catalog(load_catalog("catalog.yaml")?);
///
///     let spec = ProjectSpec::new("Generate a technical blog post")
///         .with_input("topic", "Rust async runtimes");
///     let report = engine.execute_project(&spec).await?;
///     println!("{}", report.timeline.gantt_chart());
///     Ok(())
/// }
/// ```
pub struct WorkflowEngine {
    workflows: WorkflowRegistry,
    phases: PhaseRegistry,
    models: ModelRegistry,
    loopback: Arc<LoopbackRouter>,
    generator: Arc<dyn TextGenerator>,
    input_wiring: InputWiring,
}

impl WorkflowEngine {
    /// Creates an engine with empty registries.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            workflows: WorkflowRegistry::new(),
            phases: PhaseRegistry::new(),
            models: ModelRegistry::new(),
            loopback: Arc::new(LoopbackRouter::new()),
            generator,
            input_wiring: InputWiring::default(),
        }
    }

    /// Sets how phase inputs are wired.
    pub fn set_input_wiring(&mut self, wiring: InputWiring) {
        self.input_wiring = wiring;
    }

    pub fn input_wiring(&self) -> InputWiring {
        self.input_wiring
    }

    /// Replaces the text-generation backend.
    pub fn set_generator(&mut self, generator: Arc<dyn TextGenerator>) {
        self.generator = generator;
    }

    pub fn workflows(&self) -> &WorkflowRegistry {
        &self.workflows
    }

    pub fn workflows_mut(&mut self) -> &mut WorkflowRegistry {
        &mut self.workflows
    }

    pub fn phases(&self) -> &PhaseRegistry {
        &self.phases
    }

    pub fn phases_mut(&mut self) -> &mut PhaseRegistry {
        &mut self.phases
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut ModelRegistry {
        &mut self.models
    }

    /// Router shared with every phase this engine runs.
    pub fn loopback(&self) -> &Arc<LoopbackRouter> {
        &self.loopback
    }

    /// Registers every model and workflow of a catalog.
    pub fn load_catalog(&mut self, catalog: Catalog) {
        for model in catalog.models {
            self.models.register(model);
        }
        for workflow in catalog.workflows {
            self.workflows.register(workflow);
        }
    }

    /// Executes a project workflow.
    ///
    /// Phases run strictly one after another in list order. The first
    /// error aborts the remaining phases; the returned failure carries the
    /// timeline and the results gathered up to that point.
    pub async fn execute_project(
        &self,
        spec: &ProjectSpec,
    ) -> Result<ExecutionReport, ExecutionFailure> {
        self.execute_project_with_run_id(spec, Uuid::new_v4().to_string())
            .await
    }

    /// Executes a project under a caller-chosen run id.
    ///
    /// Lets callers register loopback callbacks on
    /// [`channel_id`](crate::loopback::channel_id)`(run_id, stage)` before
    /// the run starts. Every channel scoped to the run, callbacks and
    /// unclaimed payloads alike, is dropped when the run ends. Phase
    /// outputs remain available in the report or failure.
    pub async fn execute_project_with_run_id(
        &self,
        spec: &ProjectSpec,
        run_id: impl Into<String>,
    ) -> Result<ExecutionReport, ExecutionFailure> {
        let run_id = run_id.into();
        let mut timeline = ProjectTimeline::new();
        let mut results = Map::new();
        let mut current_phase: Option<String> = None;

        info!("Starting project '{}' (run {})", spec.description, run_id);

        let outcome = self
            .run_phases(&run_id, spec, &mut timeline, &mut results, &mut current_phase)
            .await;
        self.loopback.clear_run(&run_id);

        match outcome {
            Ok(workflow_type) => {
                info!(
                    "Project '{}' completed: {} phases in {} ms",
                    spec.description,
                    results.len(),
                    timeline.elapsed().num_milliseconds()
                );
                Ok(ExecutionReport {
                    run_id,
                    workflow_type,
                    results,
                    timeline,
                })
            }
            Err(source) => {
                error!("Project '{}' failed: {}", spec.description, source);
                Err(ExecutionFailure {
                    run_id,
                    description: spec.description.clone(),
                    failed_phase: current_phase,
                    partial_results: results,
                    timeline,
                    source,
                })
            }
        }
    }

    /// Executes several projects one after another.
    ///
    /// A failed project does not stop the batch.
    pub async fn execute_batch(
        &self,
        specs: &[ProjectSpec],
    ) -> Vec<Result<ExecutionReport, ExecutionFailure>> {
        let mut outcomes = Vec::with_capacity(specs.len());
        for spec in specs {
            outcomes.push(self.execute_project(spec).await);
        }
        outcomes
    }

    /// Resolves the workflow for a project.
    fn resolve_workflow(&self, spec: &ProjectSpec) -> Result<&WorkflowType, EngineError> {
        let explicit = spec
            .workflow_type
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        let type_code = match explicit {
            Some(code) => code,
            None => self
                .workflows
                .identify_type(&spec.description)
                .ok_or_else(|| EngineError::UnknownWorkflowType("<none>".to_string()))?,
        };

        self.workflows
            .get(type_code)
            .ok_or_else(|| EngineError::UnknownWorkflowType(type_code.to_string()))
    }

    async fn run_phases(
        &self,
        run_id: &str,
        spec: &ProjectSpec,
        timeline: &mut ProjectTimeline,
        results: &mut Map<String, Value>,
        current_phase: &mut Option<String>,
    ) -> Result<String, EngineError> {
        let workflow = self.resolve_workflow(spec)?;
        info!(
            "Using workflow '{}' ({} phases, {:?} wiring)",
            workflow.type_code,
            workflow.phases.len(),
            self.input_wiring
        );

        let original = spec.to_value();
        let mut previous: Option<Value> = None;

        for config in &workflow.phases {
            let phase_name = config.phase_name.as_str();
            *current_phase = Some(phase_name.to_string());

            info!("Starting phase: {}", phase_name);
            timeline.start(phase_name);

            let input = match (self.input_wiring, previous.as_ref()) {
                (InputWiring::Chained, Some(output)) => output,
                _ => &original,
            };

            let outcome = self.run_phase(run_id, config, input).await;

            match outcome {
                Ok(output) => {
                    info!("Phase '{}' completed", phase_name);
                    timeline.complete(phase_name, output.clone());
                    results.insert(phase_name.to_string(), output.clone());
                    previous = Some(output);
                }
                Err(e) => {
                    error!("Phase '{}' failed: {}", phase_name, e);
                    timeline.fail(phase_name, e.to_string());
                    return Err(e);
                }
            }
        }

        *current_phase = None;
        Ok(workflow.type_code.clone())
    }

    async fn run_phase(
        &self,
        run_id: &str,
        config: &PhaseConfig,
        input: &Value,
    ) -> Result<Value, EngineError> {
        let phase = self.phases.instantiate(config)?;

        let requirements = ModelRequirements::new(config.required_capabilities.iter().cloned());
        let model = self
            .models
            .find_best_match(&requirements)
            .and_then(|model_id| self.models.get(model_id))
            .cloned();

        match model {
            Some(ref m) => debug!("Phase '{}' matched model '{}'", config.phase_name, m.model_id),
            None => debug!("Phase '{}' has no matching model", config.phase_name),
        }

        let ctx = PhaseContext {
            run_id: run_id.to_string(),
            model,
            generator: Arc::clone(&self.generator),
            loopback: Arc::clone(&self.loopback),
        };

        self.phases
            .execute(phase.as_ref(), input, &ctx)
            .await
            .map_err(|source| EngineError::PhaseExecutionFailure {
                phase: config.phase_name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("workflows", &self.workflows.type_codes())
            .field("phases", &self.phases)
            .field("models", &self.models.len())
            .field("generator", &self.generator.name())
            .field("input_wiring", &self.input_wiring)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhaseError;
    use crate::execution::generator::EchoGenerator;
    use crate::execution::phases::register_builtin_phases;
    use crate::monitoring::PhaseStatus;
    use crate::registry::Phase;
    use crate::workflow::ModelDescriptor;
    use async_trait::async_trait;
    use serde_json::json;

    /// Returns its input unchanged, tagged with the phase name.
    struct TagPhase {
        config: PhaseConfig,
    }

    #[async_trait]
    impl Phase for TagPhase {
        fn config(&self) -> &PhaseConfig {
            &self.config
        }

        async fn execute(&self, input: &Value, ctx: &PhaseContext) -> Result<Value, PhaseError> {
            Ok(json!({
                "tag": self.config.phase_name,
                "model": ctx.model.as_ref().map(|m| m.model_id.clone()),
                "input": input.clone(),
            }))
        }
    }

    struct ExplodingPhase {
        config: PhaseConfig,
    }

    #[async_trait]
    impl Phase for ExplodingPhase {
        fn config(&self) -> &PhaseConfig {
            &self.config
        }

        async fn execute(&self, _input: &Value, _ctx: &PhaseContext) -> Result<Value, PhaseError> {
            Err(PhaseError::Other("backend hung up".to_string()))
        }
    }

    fn engine() -> WorkflowEngine {
        let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
        engine.phases_mut().register("tag_a", |config| {
            Ok(Box::new(TagPhase { config }) as Box<dyn Phase>)
        });
        engine.phases_mut().register("tag_b", |config| {
            Ok(Box::new(TagPhase { config }) as Box<dyn Phase>)
        });
        engine.phases_mut().register("explode", |config| {
            Ok(Box::new(ExplodingPhase { config }) as Box<dyn Phase>)
        });
        engine.workflows_mut().register(
            WorkflowType::new("tags", "Tags", "")
                .with_phase(PhaseConfig::new(1, "tag_a", "").with_capabilities(["qa"]))
                .with_phase(PhaseConfig::new(2, "tag_b", "")),
        );
        engine
    }

    #[test]
    fn test_engine_defaults() {
        let engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));

        assert_eq!(engine.input_wiring(), InputWiring::Original);
        assert!(engine.workflows().is_empty());
        assert!(engine.models().is_empty());
        assert!(engine.phases().names().is_empty());
    }

    #[test]
    fn test_load_catalog_registers_everything() {
        let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
        engine.load_catalog(Catalog {
            models: vec![ModelDescriptor::new("m", "openai", "gpt-4", "1")],
            workflows: vec![WorkflowType::new("wf", "", "")],
        });

        assert!(engine.models().get("m").is_some());
        assert!(engine.workflows().get("wf").is_some());
    }

    #[tokio::test]
    async fn test_original_wiring_passes_spec_to_every_phase() {
        let engine = engine();
        let spec = ProjectSpec::new("demo").with_input("topic", "X");

        let report = engine.execute_project(&spec).await.unwrap();

        assert_eq!(report.workflow_type, "tags");
        assert_eq!(report.results["tag_b"]["input"], spec.to_value());
        assert_eq!(report.results["tag_a"]["input"], spec.to_value());
    }

    #[tokio::test]
    async fn test_chained_wiring_passes_previous_output() {
        let mut engine = engine();
        engine.set_input_wiring(InputWiring::Chained);
        let spec = ProjectSpec::new("demo");

        let report = engine.execute_project(&spec).await.unwrap();

        assert_eq!(report.results["tag_a"]["input"], spec.to_value());
        assert_eq!(report.results["tag_b"]["input"], report.results["tag_a"]);
    }

    #[tokio::test]
    async fn test_model_is_selected_per_phase() {
        let mut engine = engine();
        engine.models_mut().register(
            ModelDescriptor::new("general", "openai", "gpt-4", "1")
                .with_capabilities(["text_generation"]),
        );
        engine.models_mut().register(
            ModelDescriptor::new("qa-model", "openai", "gpt-4", "1").with_capabilities(["qa"]),
        );

        let report = engine.execute_project(&ProjectSpec::new("demo")).await.unwrap();

        assert_eq!(report.results["tag_a"]["model"], "qa-model");
        // no requirements: first active model wins
        assert_eq!(report.results["tag_b"]["model"], "general");
    }

    #[tokio::test]
    async fn test_explicit_unknown_workflow_type() {
        let engine = engine();
        let spec = ProjectSpec::new("demo").with_workflow_type("nope");

        let failure = engine.execute_project(&spec).await.unwrap_err();

        assert!(matches!(failure.kind(), EngineError::UnknownWorkflowType(code) if code == "nope"));
        assert!(failure.failed_phase.is_none());
        assert!(failure.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_empty_registry_cannot_resolve() {
        let engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));

        let failure = engine
            .execute_project(&ProjectSpec::new("demo"))
            .await
            .unwrap_err();
        assert!(matches!(failure.kind(), EngineError::UnknownWorkflowType(_)));
    }

    #[tokio::test]
    async fn test_empty_workflow_yields_empty_results() {
        let mut engine = engine();
        engine.workflows_mut().register(WorkflowType::new("empty", "Empty", ""));
        let spec = ProjectSpec::new("demo").with_workflow_type("empty");

        let report = engine.execute_project(&spec).await.unwrap();

        assert!(report.results.is_empty());
        assert!(report.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_phase_error_aborts_and_keeps_partial_results() {
        let mut engine = engine();
        engine.workflows_mut().register(
            WorkflowType::new("boom", "Boom", "")
                .with_phase(PhaseConfig::new(1, "tag_a", ""))
                .with_phase(PhaseConfig::new(2, "explode", ""))
                .with_phase(PhaseConfig::new(3, "tag_b", "")),
        );
        let spec = ProjectSpec::new("demo").with_workflow_type("boom");

        let failure = engine.execute_project(&spec).await.unwrap_err();

        assert!(matches!(
            failure.kind(),
            EngineError::PhaseExecutionFailure { phase, .. } if phase == "explode"
        ));
        assert_eq!(failure.failed_phase.as_deref(), Some("explode"));
        assert!(failure.partial_results.contains_key("tag_a"));
        assert_eq!(failure.timeline.status("tag_a"), PhaseStatus::Completed);
        assert_eq!(failure.timeline.status("explode"), PhaseStatus::Failed);
        assert_eq!(failure.timeline.status("tag_b"), PhaseStatus::NotStarted);
        assert!(failure.to_string().contains("backend hung up"));
    }

    #[tokio::test]
    async fn test_factory_failure_marks_phase_failed() {
        let mut engine = engine();
        engine.phases_mut().register("misconfigured", |config: PhaseConfig| {
            Err(PhaseError::Construction {
                phase: config.phase_name,
                reason: "missing prompt template".to_string(),
            })
        });
        engine.workflows_mut().register(
            WorkflowType::new("broken", "Broken", "")
                .with_phase(PhaseConfig::new(1, "tag_a", ""))
                .with_phase(PhaseConfig::new(2, "misconfigured", ""))
                .with_phase(PhaseConfig::new(3, "tag_b", "")),
        );
        let spec = ProjectSpec::new("demo").with_workflow_type("broken");

        let failure = engine.execute_project(&spec).await.unwrap_err();

        assert!(matches!(
            failure.kind(),
            EngineError::PhaseExecutionFailure {
                phase,
                source: PhaseError::Construction { .. },
            } if phase == "misconfigured"
        ));
        assert_eq!(failure.failed_phase.as_deref(), Some("misconfigured"));
        assert_eq!(failure.timeline.status("tag_a"), PhaseStatus::Completed);
        assert_eq!(failure.timeline.status("misconfigured"), PhaseStatus::Failed);
        let entry = failure.timeline.get("misconfigured").unwrap();
        assert!(entry.error.as_deref().unwrap().contains("missing prompt template"));
        assert!(failure.timeline.get("tag_b").is_none());
        assert!(!failure.partial_results.contains_key("tag_b"));
    }

    #[tokio::test]
    async fn test_caller_supplied_run_id() {
        let engine = engine();

        let report = engine
            .execute_project_with_run_id(&ProjectSpec::new("demo"), "run-42")
            .await
            .unwrap();

        assert_eq!(report.run_id, "run-42");
    }

    #[tokio::test]
    async fn test_runs_get_distinct_ids_and_timelines() {
        let engine = engine();
        let spec = ProjectSpec::new("demo");

        let (first, second) = tokio::join!(
            engine.execute_project(&spec),
            engine.execute_project(&spec)
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.timeline.len(), 2);
        assert_eq!(second.timeline.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_batch_continues_after_failure() {
        let engine = engine();
        let specs = vec![
            ProjectSpec::new("bad").with_workflow_type("missing"),
            ProjectSpec::new("good"),
        ];

        let outcomes = engine.execute_batch(&specs).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_err());
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test]
    async fn test_report_serializes_to_outbound_shape() {
        let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
        register_builtin_phases(engine.phases_mut());
        engine.workflows_mut().register(
            WorkflowType::new("text_generation", "Text", "")
                .with_phase(PhaseConfig::new(1, "input_analysis", "")),
        );

        let report = engine.execute_project(&ProjectSpec::new("demo")).await.unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["workflow_type"], "text_generation");
        assert!(value["results"]["input_analysis"]["analysis"].is_string());
        assert_eq!(value["timeline"]["input_analysis"]["status"], "completed");
        assert!(value["timeline"]["input_analysis"]["end_time"].is_string());
    }
}
