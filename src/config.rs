use std::{env, net::SocketAddr};

use url::Url;

use crate::{error::AppError, services::gateway::DEFAULT_MODEL};

const DEFAULT_DATABASE_URL: &str = "sqlite://trips.db";

/// Where trips are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted PostgREST API below `{project_url}/rest/v1/`.
    Rest { project_url: Url, api_key: String },
    Sqlite { database_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub store: StoreBackend,
    pub access_token: Option<String>,
    pub functions_url: Option<Url>,
    pub generation_model: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_addr: SocketAddr = var("APP_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let cookie_secret = var("COOKIE_SECRET")
            .unwrap_or_else(|| "change-me-trip-planner-flash-cookie-secret".to_string());

        let project_url = var("SUPABASE_URL")
            .map(|raw| parse_url("SUPABASE_URL", &raw))
            .transpose()?;

        let store = match &project_url {
            Some(project_url) => {
                let api_key = var("SUPABASE_ANON_KEY").ok_or_else(|| {
                    AppError::Config("SUPABASE_ANON_KEY is required with SUPABASE_URL".into())
                })?;
                StoreBackend::Rest {
                    project_url: project_url.clone(),
                    api_key,
                }
            }
            None => StoreBackend::Sqlite {
                database_url: var("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
        };

        let functions_url = match var("FUNCTIONS_URL") {
            Some(raw) => Some(parse_url("FUNCTIONS_URL", &raw)?),
            None => project_url
                .as_ref()
                .map(|url| url.join("functions/v1/"))
                .transpose()
                .map_err(|err| AppError::Config(format!("invalid SUPABASE_URL: {err}")))?,
        };

        let generation_model =
            var("GENERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            listen_addr,
            cookie_secret,
            store,
            access_token: var("SUPABASE_ACCESS_TOKEN"),
            functions_url,
            generation_model,
        })
    }

    /// Key sent as `apikey` to the hosted backend, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        match &self.store {
            StoreBackend::Rest { api_key, .. } => Some(api_key),
            StoreBackend::Sqlite { .. } => None,
        }
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, AppError> {
    let mut url =
        Url::parse(raw).map_err(|err| AppError::Config(format!("invalid {name}: {err}")))?;
    // Relative joins replace the last segment unless the path ends in a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
