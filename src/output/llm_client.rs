//! HTTP client for the model service that performs the conversion.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConverterError, Result};
use crate::processing::language::LanguageDescriptor;
use crate::types::ConverterConfig;

/// Upper bound on the delay between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One file to convert.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub path: PathBuf,
    pub source_language: &'static LanguageDescriptor,
    pub target_language: &'static LanguageDescriptor,
    pub source: String,
}

/// Anything that can turn source code in one language into another.
#[async_trait]
pub trait CodeConverter: Send + Sync {
    async fn convert(&self, request: &ConversionRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Converter backed by an OpenAI-compatible chat-completions endpoint.
pub struct HttpConverter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
    backoff: Duration,
}

impl HttpConverter {
    /// Create a new client.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            model: model.to_string(),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(500),
        })
    }

    /// Build a client from the run configuration.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        let mut converter = Self::new(
            &config.llm_api_url,
            &config.llm_model,
            config.request_timeout(),
        )?
        .with_retries(config.max_retries, config.retry_backoff());
        converter.api_key = config.llm_api_key.clone();
        Ok(converter)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the number of extra attempts and the base delay between them.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    fn build_messages(request: &ConversionRequest) -> Vec<ChatMessage> {
        let system = format!(
            "You convert {} source code into idiomatic {}. Reply with the converted code only.",
            request.source_language.display_name, request.target_language.display_name
        );
        let user = format!(
            "File: {}\n\n{}",
            request.path.display(),
            request.source
        );
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: system,
            },
            ChatMessage {
                role: "user".to_string(),
                content: user,
            },
        ]
    }

    /// A single call, without retries.
    async fn send_once(&self, request: &ConversionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(request),
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ConverterError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ConverterError::EmptyCompletion)
    }

    /// Check if the model service is reachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl CodeConverter for HttpConverter {
    async fn convert(&self, request: &ConversionRequest) -> Result<String> {
        let mut attempt = 0;

        loop {
            match self.send_once(request).await {
                Ok(content) => {
                    debug!(path = %request.path.display(), attempt, "Conversion received");
                    return Ok(content);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        path = %request.path.display(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    info!(
                        path = %request.path.display(),
                        attempts = attempt + 1,
                        "Retries exhausted"
                    );
                    return Err(ConverterError::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
