//! HTTP client for a local Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{GenerationError, TextGenerator};

const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

/// Installed model names from an `/api/tags` body. Nameless entries are skipped.
fn parse_model_names(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let tags: TagsResponse = serde_json::from_slice(body)?;
    Ok(tags
        .models
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| !name.is_empty())
        .collect())
}

/// Server reachability and whether the configured model is pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmStatus {
    pub available: bool,
    pub models: Vec<String>,
    pub configured_model: String,
    pub model_ready: bool,
}

impl LlmStatus {
    pub fn new(available: bool, models: Vec<String>, configured_model: &str) -> Self {
        let model_ready = available
            && models
                .iter()
                .any(|name| model_matches(name, configured_model));
        Self {
            available,
            models,
            configured_model: configured_model.to_string(),
            model_ready,
        }
    }
}

/// An untagged model name refers to its `:latest` tag.
fn model_matches(installed: &str, configured: &str) -> bool {
    if installed == configured {
        return true;
    }
    match (installed.split_once(':'), configured.contains(':')) {
        (Some((base, "latest")), false) => base == configured,
        _ => false,
    }
}

impl OllamaClient {
    /// `base_url` should be like `http://localhost:11434` (no trailing slash needed).
    pub fn new(settings: OllamaSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model,
            timeout: settings.timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
            .map_err(GenerationError::Connection)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.bytes().await.map_err(GenerationError::Decode)?;
        parse_model_names(&body).map_err(GenerationError::Payload)
    }

    pub async fn status(&self) -> LlmStatus {
        let available = self.is_available().await;
        let models = if available {
            match self.list_models().await {
                Ok(models) => models,
                Err(err) => {
                    warn!(error = %err, "failed to list ollama models");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        LlmStatus::new(available, models, &self.model)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(AVAILABILITY_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(url = %url, error = %err, "ollama availability check failed");
                false
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        info!(url = %url, model = %self.model, "requesting generation");
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(GenerationError::Connection)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = resp.json().await.map_err(GenerationError::Decode)?;
        let text = payload.response.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
