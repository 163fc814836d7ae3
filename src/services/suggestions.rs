use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::{error::GenerationError, services::gateway::GenerationGateway};

#[derive(Debug, Default)]
struct GeneratorState {
    is_loading: bool,
    error: Option<String>,
}

/// Thin wrapper over the gateway with its own loading and error flags.
/// Nothing is cached; every call is a fresh round trip.
#[derive(Clone)]
pub struct SuggestionGenerator {
    gateway: Arc<dyn GenerationGateway>,
    model: String,
    state: Arc<RwLock<GeneratorState>>,
}

impl SuggestionGenerator {
    pub fn new(gateway: Arc<dyn GenerationGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            state: Arc::new(RwLock::new(GeneratorState::default())),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_with_model(prompt, &self.model).await
    }

    pub async fn generate_with_model(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<String, GenerationError> {
        self.set(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = self.gateway.generate(prompt, model).await;

        match &result {
            Ok(text) => {
                debug!(model, chars = text.len(), "generated suggestions");
                self.set(|state| state.is_loading = false);
            }
            Err(err) => {
                warn!(model, "suggestion generation failed: {err}");
                self.set(|state| {
                    state.is_loading = false;
                    state.error = Some(err.message.clone());
                });
            }
        }
        result
    }

    pub fn is_loading(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }

    fn set(&self, update: impl FnOnce(&mut GeneratorState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut state);
    }
}
