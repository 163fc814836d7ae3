pub mod editor;
pub mod gateway;
pub mod repository;
pub mod rest_store;
pub mod sqlite_store;
pub mod store;
pub mod suggestions;

#[cfg(test)]
pub(crate) mod fakes;

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{AppConfig, StoreBackend},
    db::{init_pool, run_migrations},
    error::AppError,
};

use self::{
    gateway::{FunctionGateway, GenerationGateway, UnconfiguredGateway},
    rest_store::RestTripStore,
    sqlite_store::SqliteTripStore,
    store::TripStore,
};

/// Opens the configured store. The local backend is migrated before use.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn TripStore>, AppError> {
    match &config.store {
        StoreBackend::Rest {
            project_url,
            api_key,
        } => {
            info!("using hosted trip store at {project_url}");
            let store = RestTripStore::new(project_url, api_key.clone(), config.access_token.clone())?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite { database_url } => {
            info!("using local trip store at {database_url}");
            let db = init_pool(database_url).await?;
            run_migrations(&db).await?;
            Ok(Arc::new(SqliteTripStore::new(db)))
        }
    }
}

pub fn build_gateway(config: &AppConfig) -> Result<Arc<dyn GenerationGateway>, AppError> {
    match &config.functions_url {
        Some(url) => {
            let gateway = FunctionGateway::new(
                url,
                config.api_key().map(str::to_string),
                config.access_token.clone(),
            )?;
            info!("suggestions via {}", gateway.endpoint());
            Ok(Arc::new(gateway))
        }
        None => {
            info!("no functions url configured, suggestions are disabled");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}
