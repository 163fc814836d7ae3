use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    models::trip::Trip,
    notice::NoticeSink,
    services::{
        editor::TripEditor, gateway::GenerationGateway, repository::TripRepository,
        suggestions::SuggestionGenerator,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repository: TripRepository,
    pub gateway: Arc<dyn GenerationGateway>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repository: TripRepository,
        gateway: Arc<dyn GenerationGateway>,
    ) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            repository,
            gateway,
            cookie_key,
        }
    }

    /// Every editor gets its own generator so loading flags stay per form.
    pub fn suggestion_generator(&self) -> SuggestionGenerator {
        SuggestionGenerator::new(self.gateway.clone(), self.config.generation_model.clone())
    }

    pub fn editor(&self, notices: Arc<dyn NoticeSink>) -> TripEditor {
        TripEditor::create(
            self.repository.clone(),
            self.suggestion_generator(),
            notices,
        )
    }

    pub fn editor_for(&self, trip: Trip, notices: Arc<dyn NoticeSink>) -> TripEditor {
        TripEditor::edit(
            trip,
            self.repository.clone(),
            self.suggestion_generator(),
            notices,
        )
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
