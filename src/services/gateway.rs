//! Hosted text-generation function.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::GenerationError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const GENERATE_FUNCTION: &str = "generate-with-gemini";

/// Accepts a prompt and a model identifier and answers with generated text.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    generated_text: Option<String>,
    error: Option<String>,
}

/// Invokes the named function below the service's functions root.
#[derive(Debug, Clone)]
pub struct FunctionGateway {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl FunctionGateway {
    pub fn new(
        functions_url: &Url,
        api_key: Option<String>,
        access_token: Option<String>,
    ) -> Result<Self, GenerationError> {
        let endpoint = functions_url
            .join(GENERATE_FUNCTION)
            .map_err(|err| GenerationError::new(format!("invalid functions url: {err}")))?;
        let http = Client::builder()
            .user_agent(concat!("trip-planner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            access_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationGateway for FunctionGateway {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
        let mut req = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateRequest { prompt, model });
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key);
        }
        if let Some(bearer) = self.access_token.as_ref().or(self.api_key.as_ref()) {
            req = req.header(header::AUTHORIZATION, format!("Bearer {bearer}"));
        }

        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;
        let parsed = serde_json::from_str::<GenerateResponse>(&body).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|p| p.error)
                .unwrap_or_else(|| format!("generation function returned {status}"));
            warn!(%status, "generation request failed: {message}");
            return Err(GenerationError::new(message));
        }

        match parsed {
            Some(GenerateResponse {
                generated_text: Some(text),
                ..
            }) => Ok(text),
            Some(GenerateResponse {
                error: Some(message),
                ..
            }) => Err(GenerationError::new(message)),
            _ => Err(GenerationError::new(
                "generation response did not include generatedText",
            )),
        }
    }
}

/// Stand-in used when no functions endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl GenerationGateway for UnconfiguredGateway {
    async fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
        Err(GenerationError::new(
            "no generation gateway configured (set SUPABASE_URL or FUNCTIONS_URL)",
        ))
    }
}
