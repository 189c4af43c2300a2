// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama API client for local vision inference

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{AppConfig, EngineConfig};
use crate::vision::{encode_image, parse_labels, ImageClassifier, LabelScore};
use crate::{Result, WastewiseError};

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

/// Strip a trailing API path so both `host:port` and full endpoint URLs work
/// Backoff before retry `attempt` (1-based): 1s, 2s, 4s, capped at 64s
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.saturating_sub(1).min(6)))
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/')
        .replace("/api/generate", "")
        .replace("/api/chat", "")
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WastewiseError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn from_config(engine: &EngineConfig) -> Result<Self> {
        Self::new(&engine.url, Duration::from_secs(engine.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                WastewiseError::OllamaUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client
            .get(&url)
            .send()
            .await?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if a specific model is available
    pub async fn model_available(&self, model: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| {
            m.starts_with(model) || m == &format!("{}:latest", model)
        }))
    }

    /// Generate with image (for vision models)
    pub async fn generate_with_image(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            images: Some(vec![image_base64.to_string()]),
        };

        debug!("Sending vision request to Ollama: model={}", model);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WastewiseError::OllamaUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: GenerateResponse = response.json().await?;
        Ok(result.response)
    }

    /// Vision generation with retry logic
    pub async fn generate_with_image_retry(
        &self,
        model: &str,
        prompt: &str,
        image_base64: &str,
        retries: u32,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                warn!("Retrying Ollama request in {:?} (attempt {})", delay, attempt.saturating_add(1));
                tokio::time::sleep(delay).await;
            }

            match self.generate_with_image(model, prompt, image_base64).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            WastewiseError::OllamaUnavailable("Unknown error".to_string())
        }))
    }
}

/// Vision model behind Ollama, asked for a ranked list of object labels
pub struct OllamaClassifier {
    client: OllamaClient,
    model: String,
    prompt: String,
    top_k: usize,
    retries: u32,
}

impl OllamaClassifier {
    pub fn new(client: OllamaClient, model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            prompt: prompt.into(),
            top_k: 5,
            retries: 0,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = OllamaClient::from_config(&config.ai_engine)?;
        Ok(Self::new(client, &config.ai_engine.vision_model, &config.prompts.labels)
            .with_top_k(config.ai_engine.top_k)
            .with_retries(config.ai_engine.retries))
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageClassifier for OllamaClassifier {
    fn name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, image: &[u8]) -> Result<Vec<LabelScore>> {
        let image_data = encode_image(image);

        let reply = self.client
            .generate_with_image_retry(&self.model, &self.prompt, &image_data, self.retries)
            .await?;
        debug!("Vision model reply: {:?}", reply);

        Ok(parse_labels(&reply, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_is_capped() {
        assert_eq!(retry_delay(1), Duration::from_secs(1));
        assert_eq!(retry_delay(3), Duration::from_secs(4));
        assert_eq!(retry_delay(7), Duration::from_secs(64));
        assert_eq!(retry_delay(65), Duration::from_secs(64));
        assert_eq!(retry_delay(u32::MAX), Duration::from_secs(64));
    }

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://localhost:11434/api/generate"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://gpu-box:11434/api/chat"), "http://gpu-box:11434");
    }

    #[test]
    fn test_classifier_from_config() {
        let mut config = AppConfig::default();
        config.ai_engine.url = "http://localhost:11434/api/generate".to_string();
        config.ai_engine.vision_model = "llava".to_string();
        config.ai_engine.top_k = 3;

        let classifier = OllamaClassifier::from_config(&config).unwrap();
        assert_eq!(classifier.name(), "llava");
        assert_eq!(classifier.client().base_url(), "http://localhost:11434");
        assert_eq!(classifier.top_k, 3);
        assert_eq!(classifier.retries, config.ai_engine.retries);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_reported() {
        let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, WastewiseError::OllamaUnavailable(_)));
    }
}
