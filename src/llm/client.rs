//! Async LLM client for agent decisions
//!
//! Model-agnostic HTTP client for the reference decision layer.
//! Supports a local Ollama server and OpenAI-compatible chat APIs.
//! The engine never talks to a model; only the agent runner does.

use crate::core::config::AgentRunnerConfig;
use crate::core::error::{Result, SocietyError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Ollama,
    OpenAI,
}

/// Async LLM client for making API calls
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    api_format: ApiFormat,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let api_format = Self::detect_api_format(&api_url);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            api_url,
            api_format,
        })
    }

    /// Build from runner config; the API key is read from the configured
    /// environment variable and may be absent for a local Ollama
    pub fn from_config(config: &AgentRunnerConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(
            config.llm_url.clone(),
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("/api/generate") {
            ApiFormat::Ollama
        } else {
            ApiFormat::OpenAI
        }
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    /// Send a completion request for one model and return its raw text
    pub async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        match self.api_format {
            ApiFormat::Ollama => self.complete_ollama(model, system, user).await,
            ApiFormat::OpenAI => self.complete_openai(model, system, user).await,
        }
    }

    async fn complete_ollama(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt: format!("{system}\n{user}"),
            stream: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SocietyError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SocietyError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SocietyError::LlmError(e.to_string()))?;

        if completion.response.trim().is_empty() {
            return Err(SocietyError::LlmError("Empty response".into()));
        }
        Ok(completion.response)
    }

    async fn complete_openai(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder
            .send()
            .await
            .map_err(|e| SocietyError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SocietyError::LlmError(format!("API error: {}", error_text)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| SocietyError::LlmError(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SocietyError::LlmError("Empty response".into()))
    }
}

/// Ask an Ollama server which models it has installed
///
/// Names containing any of `exclude` are dropped (embedding models and
/// models known to answer outside the JSON schema).
pub async fn list_models(ollama_url: &str, exclude: &[String]) -> Result<Vec<String>> {
    let url = format!("{}/api/tags", ollama_url.trim_end_matches('/'));
    let tags: TagsResponse = Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(filter_models(tags.models.into_iter().map(|m| m.name), exclude))
}

fn filter_models(names: impl Iterator<Item = String>, exclude: &[String]) -> Vec<String> {
    names
        .filter(|name| {
            let lower = name.to_lowercase();
            !exclude.iter().any(|ex| lower.contains(&ex.to_lowercase()))
        })
        .collect()
}

// Ollama format
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

// OpenAI-compatible format
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}
