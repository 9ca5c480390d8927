//! Model Registry
//!
//! Stores model descriptors and picks the best active model for a set of
//! required capabilities.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::workflow::ModelDescriptor;

/// Capabilities a caller needs from a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequirements {
    pub capabilities: BTreeSet<String>,
}

impl ModelRequirements {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct RegisteredModel {
    descriptor: ModelDescriptor,
    registered_at: DateTime<Utc>,
}

/// Registry of model descriptors keyed by `model_id`.
///
/// Iteration follows first-registration order. Re-registering an id
/// replaces the descriptor but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    order: Vec<String>,
    models: HashMap<String, RegisteredModel>,
}

/// Fraction of the required capabilities the model offers.
///
/// Empty requirements score 0.
pub fn match_score(descriptor: &ModelDescriptor, requirements: &ModelRequirements) -> f64 {
    if requirements.capabilities.is_empty() {
        return 0.0;
    }

    let matched = requirements
        .capabilities
        .intersection(&descriptor.capabilities)
        .count();

    matched as f64 / requirements.capabilities.len() as f64
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a descriptor.
    pub fn register(&mut self, descriptor: ModelDescriptor) {
        let model_id = descriptor.model_id.clone();

        if self.models.contains_key(&model_id) {
            info!("Replacing model: {}", model_id);
        } else {
            info!("Registered model: {} ({}/{})", model_id, descriptor.provider, descriptor.model_name);
            self.order.push(model_id.clone());
        }

        self.models.insert(
            model_id,
            RegisteredModel {
                descriptor,
                registered_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.get(model_id).map(|m| &m.descriptor)
    }

    /// When the descriptor for `model_id` was last registered.
    pub fn registered_at(&self, model_id: &str) -> Option<DateTime<Utc>> {
        self.models.get(model_id).map(|m| m.registered_at)
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.models.get(id).map(|m| &m.descriptor))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the id of the active model that best covers `requirements`.
    ///
    /// Scans in registration order and only replaces the current choice on
    /// a strictly higher score, so ties go to the earliest registration.
    /// Returns `None` when no active model exists.
    pub fn find_best_match(&self, requirements: &ModelRequirements) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;

        for descriptor in self.iter().filter(|d| d.is_active()) {
            let score = match_score(descriptor, requirements);
            debug!("Model '{}' scores {:.2}", descriptor.model_id, score);

            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((descriptor.model_id.as_str(), score)),
            }
        }

        best.map(|(model_id, _)| model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ModelStatus;

    fn model(id: &str, caps: &[&str]) -> ModelDescriptor {
        ModelDescriptor::new(id, "openai", "gpt-4", "1.0").with_capabilities(caps.iter().copied())
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ModelRegistry::new();
        registry.register(model("test-model", &["text-generation"]));

        let found = registry.get("test-model").unwrap();
        assert_eq!(found.model_id, "test-model");
        assert!(registry.registered_at("test-model").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_overwrites_in_place() {
        let mut registry = ModelRegistry::new();
        registry.register(model("a", &["x"]));
        registry.register(model("b", &["x"]));
        registry.register(model("a", &["y"]));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").unwrap().capabilities.contains("y"));
        let ids: Vec<&str> = registry.iter().map(|m| m.model_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_find_best_model_prefers_more_capabilities() {
        let mut registry = ModelRegistry::new();
        registry.register(model("model2", &["text-generation"]));
        registry.register(model("model1", &["text-generation", "code"]));

        let requirements = ModelRequirements::new(["text-generation", "code"]);
        assert_eq!(registry.find_best_match(&requirements), Some("model1"));
    }

    #[test]
    fn test_find_best_match_tie_goes_to_first_registered() {
        let mut registry = ModelRegistry::new();
        registry.register(model("first", &["qa"]));
        registry.register(model("second", &["qa", "summarization"]));

        let requirements = ModelRequirements::new(["qa"]);
        assert_eq!(registry.find_best_match(&requirements), Some("first"));
    }

    #[test]
    fn test_find_best_match_skips_inactive() {
        let mut registry = ModelRegistry::new();
        registry.register(model("retired", &["qa", "code"]).with_status(ModelStatus::Inactive));
        registry.register(model("current", &["qa"]));

        let requirements = ModelRequirements::new(["qa", "code"]);
        assert_eq!(registry.find_best_match(&requirements), Some("current"));
    }

    #[test]
    fn test_find_best_match_none_when_nothing_active() {
        let mut registry = ModelRegistry::new();
        let requirements = ModelRequirements::new(["qa"]);
        assert_eq!(registry.find_best_match(&requirements), None);

        registry.register(model("off", &["qa"]).with_status(ModelStatus::Inactive));
        assert_eq!(registry.find_best_match(&requirements), None);
    }

    #[test]
    fn test_empty_requirements_pick_first_active() {
        let mut registry = ModelRegistry::new();
        registry.register(model("off", &["qa"]).with_status(ModelStatus::Inactive));
        registry.register(model("on", &[]));
        registry.register(model("also-on", &["qa"]));

        assert_eq!(registry.find_best_match(&ModelRequirements::default()), Some("on"));
    }

    #[test]
    fn test_match_score() {
        let descriptor = model("m", &["qa", "code"]);

        assert_eq!(match_score(&descriptor, &ModelRequirements::new(["qa"])), 1.0);
        assert_eq!(match_score(&descriptor, &ModelRequirements::new(["qa", "vision"])), 0.5);
        assert_eq!(match_score(&descriptor, &ModelRequirements::new(["vision"])), 0.0);
        assert_eq!(match_score(&descriptor, &ModelRequirements::default()), 0.0);
    }

    #[test]
    fn test_requirements_are_deduplicated() {
        let descriptor = model("m", &["qa"]);
        let requirements = ModelRequirements::new(["qa", "qa", "code"]);

        assert_eq!(match_score(&descriptor, &requirements), 0.5);
    }
}
