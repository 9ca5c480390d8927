//! Phase Registry
//!
//! Maps phase names to factories that build [`Phase`] instances from a
//! [`PhaseConfig`]. The registry is a plain value owned by the engine;
//! there is no process-wide table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{EngineError, PhaseError};
use crate::execution::generator::TextGenerator;
use crate::loopback::{channel_id, LoopbackRouter};
use crate::workflow::{ModelDescriptor, PhaseConfig};

/// Everything a phase may use besides its input.
#[derive(Clone)]
pub struct PhaseContext {
    /// Identity of the current execution
    pub run_id: String,

    /// Best active model for the phase's required capabilities, if any
    pub model: Option<ModelDescriptor>,

    pub generator: Arc<dyn TextGenerator>,

    pub loopback: Arc<LoopbackRouter>,
}

impl PhaseContext {
    /// Loopback channel for `stage`, scoped to this execution.
    pub fn channel(&self, stage: &str) -> String {
        channel_id(&self.run_id, stage)
    }
}

/// One unit of work in a workflow.
///
/// Implementations are expected to turn backend failures into an
/// `{"error": ..., "input_data": ...}` output and return `Ok`. An `Err`
/// aborts the whole execution.
#[async_trait]
pub trait Phase: Send + Sync {
    /// Configuration this instance was built from.
    fn config(&self) -> &PhaseConfig;

    fn name(&self) -> &str {
        &self.config().phase_name
    }

    async fn execute(&self, input: &Value, ctx: &PhaseContext) -> Result<Value, PhaseError>;
}

/// Builds a phase instance bound to a configuration.
pub type PhaseFactory =
    Arc<dyn Fn(PhaseConfig) -> Result<Box<dyn Phase>, PhaseError> + Send + Sync>;

/// Registry of phase factories keyed by phase name.
#[derive(Clone, Default)]
pub struct PhaseRegistry {
    factories: HashMap<String, PhaseFactory>,
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`. A later registration with the
    /// same name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(PhaseConfig) -> Result<Box<dyn Phase>, PhaseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            warn!("Phase '{}' is already registered; replacing it", name);
        }
        self.factories.insert(name.clone(), Arc::new(factory));
        info!("Registered phase: {}", name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered phase names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a phase for `config`.
    ///
    /// # Errors
    ///
    /// * `UnknownPhaseType` - no factory is registered under `config.phase_name`
    /// * `PhaseExecutionFailure` - the factory rejected the configuration
    pub fn instantiate(&self, config: &PhaseConfig) -> Result<Box<dyn Phase>, EngineError> {
        let factory = self.factories.get(&config.phase_name).ok_or_else(|| {
            debug!("Registered phases: {:?}", self.names());
            EngineError::UnknownPhaseType(config.phase_name.clone())
        })?;

        factory(config.clone()).map_err(|source| EngineError::PhaseExecutionFailure {
            phase: config.phase_name.clone(),
            source,
        })
    }

    /// Runs a phase against its input.
    pub async fn execute(
        &self,
        phase: &dyn Phase,
        input: &Value,
        ctx: &PhaseContext,
    ) -> Result<Value, PhaseError> {
        debug!(
            "Executing phase '{}' (run {}, model {:?})",
            phase.name(),
            ctx.run_id,
            ctx.model.as_ref().map(|m| m.model_id.as_str())
        );
        phase.execute(input, ctx).await
    }
}

impl std::fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseRegistry")
            .field("phases", &self.names())
            .finish()
    }
}
