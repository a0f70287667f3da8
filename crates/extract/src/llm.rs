use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decoding constraints for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Prompts longer than this are cut at a token boundary before sending.
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
    pub beams: usize,
    pub early_stopping: bool,
}

impl GenerationParams {
    pub const fn new(max_input_tokens: usize, max_output_tokens: usize) -> Self {
        Self {
            max_input_tokens,
            max_output_tokens,
            beams: 4,
            early_stopping: true,
        }
    }

    pub fn extract() -> Self {
        Self::new(1024, 512)
    }

    pub fn compare() -> Self {
        Self::new(512, 512)
    }

    pub fn faq() -> Self {
        Self::new(512, 1024)
    }
}

/// Text-generation service: prompt in, one decoded string out.
///
/// Implementations must not retry or cache; a failed call is reported as an
/// error and the caller decides how to degrade.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Run one generation call, abandoning it once `timeout` elapses.
pub async fn generate_with_timeout(
    generator: &dyn Generator,
    prompt: &str,
    params: &GenerationParams,
    timeout: Duration,
) -> Result<String> {
    tokio::time::timeout(timeout, generator.generate(prompt, params))
        .await
        .with_context(|| format!("Generation timed out after {}s", timeout.as_secs_f32()))?
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "all-tasks-t5-swedish".to_string(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str, params: &GenerationParams) -> OllamaRequest {
        // Ollama has no beam search; greedy decoding is the closest single best hypothesis
        let temperature = if params.beams > 1 { 0.0 } else { 0.8 };

        OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                num_predict: params.max_output_tokens,
                temperature,
            },
        }
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = self.build_request(prompt, params);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }
}
