//! Ollama client implementation
//!
//! Async HTTP client for the Ollama completion API with streaming support.
//! Prompts are sent in raw mode so the assembled ReAct prompt reaches the
//! model untouched by any chat template.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::PricingConfig;
use crate::core::{Config, ErgonError, Result};
use crate::llm::traits::{
    Completion, CompletionClient, CompletionEvent, CompletionStream, CompletionSummary,
};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    pricing: PricingConfig,
    debug: bool,
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions<'a>>,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

/// Ollama generate response chunk (one NDJSON line when streaming,
/// the whole body otherwise)
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.ollama_url(),
            model: config.model.completion.clone(),
            pricing: config.model.pricing,
            debug: config.agent.debug,
        }
    }

    /// Create a client with custom base URL and model
    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            pricing: PricingConfig::default(),
            debug: false,
        }
    }

    /// Enable or disable debug output
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// The model this client completes with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Debug print if enabled
    fn debug_print(&self, label: &str, content: &str) {
        if self.debug {
            if content.len() > 500 {
                eprintln!("DEBUG {}: {}...", label, &content[..500]);
            } else {
                eprintln!("DEBUG {}: {}", label, content);
            }
        }
    }

    fn summary_from_chunk(&self, chunk: &GenerateChunk) -> CompletionSummary {
        let input_tokens = chunk.prompt_eval_count.unwrap_or(0);
        let output_tokens = chunk.eval_count.unwrap_or(0);
        CompletionSummary {
            stop_reason: chunk.done_reason.clone(),
            input_tokens,
            output_tokens,
            price: self.pricing.price(input_tokens, output_tokens),
        }
    }

    async fn send_generate(
        &self,
        prompt: &str,
        stop: &[String],
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream,
            options: if stop.is_empty() {
                None
            } else {
                Some(GenerateOptions { stop: Some(stop) })
            },
        };

        let request_json = serde_json::to_string(&request)?;
        self.debug_print("Request", &request_json);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ErgonError::transport(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    ErgonError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(ErgonError::ModelNotFound(self.model.clone()));
            }

            return Err(ErgonError::transport(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ErgonError::transport(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else {
                    ErgonError::from(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(ErgonError::transport("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if the configured model is available
    pub async fn is_model_available(&self) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m == &self.model || m.split(':').next() == self.model.split(':').next()))
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn invoke(&self, prompt: &str, stop: &[String]) -> Result<Completion> {
        let response = self.send_generate(prompt, stop, false).await?;

        let response_text = response.text().await?;
        self.debug_print("Response", &response_text);

        let chunk: GenerateChunk = serde_json::from_str(&response_text)
            .map_err(|e| ErgonError::transport(format!("Failed to parse response: {}", e)))?;

        let summary = self.summary_from_chunk(&chunk);
        Ok(Completion {
            text: chunk.response,
            summary: Some(summary),
        })
    }

    async fn stream(&self, prompt: &str, stop: &[String]) -> Result<CompletionStream> {
        let response = self.send_generate(prompt, stop, true).await?;

        let this = self.clone();
        let mut byte_stream = response.bytes_stream();

        let stream = try_stream! {
            let mut buffer = String::new();
            let mut finished = false;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = chunk_result
                    .map_err(|e| ErgonError::transport(format!("Stream error: {}", e)))?;
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete JSON lines from buffer
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer = buffer[newline_pos + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    let chunk: GenerateChunk = serde_json::from_str(&line).map_err(|e| {
                        ErgonError::transport(format!("Malformed stream chunk: {}", e))
                    })?;

                    if !chunk.response.is_empty() {
                        yield CompletionEvent::Token(chunk.response.clone());
                    }

                    // The terminal chunk carries the usage metrics
                    if chunk.done {
                        yield CompletionEvent::Summary(this.summary_from_chunk(&chunk));
                        finished = true;
                    }
                }
            }

            // Process any remaining buffer content
            if !finished {
                let trailing = buffer.trim();
                if !trailing.is_empty() {
                    if let Ok(chunk) = serde_json::from_str::<GenerateChunk>(trailing) {
                        if !chunk.response.is_empty() {
                            yield CompletionEvent::Token(chunk.response.clone());
                        }
                        if chunk.done {
                            yield CompletionEvent::Summary(this.summary_from_chunk(&chunk));
                            finished = true;
                        }
                    }
                }
            }

            if !finished {
                Err(ErgonError::transport(
                    "Stream ended without a terminal summary chunk",
                ))?;
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::from_config(&Config::default());
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_serialization() {
        let stop = vec!["<observation>".to_string()];
        let request = GenerateRequest {
            model: "qwen3:8b",
            prompt: "hello",
            raw: true,
            stream: true,
            options: Some(GenerateOptions { stop: Some(&stop) }),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"raw\":true"));
        assert!(json.contains("<observation>"));
    }

    #[test]
    fn test_chunk_parsing() {
        let line = r#"{"model":"qwen3:8b","response":"Hi","done":false}"#;
        let chunk: GenerateChunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.response, "Hi");
        assert!(!chunk.done);

        let line = r#"{"model":"qwen3:8b","response":"","done":true,"done_reason":"stop","prompt_eval_count":12,"eval_count":30}"#;
        let chunk: GenerateChunk = serde_json::from_str(line).unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.prompt_eval_count, Some(12));
    }

    #[test]
    fn test_summary_pricing() {
        let mut config = Config::default();
        config.model.pricing = PricingConfig {
            input_per_1k: 1.0,
            output_per_1k: 2.0,
        };
        let client = OllamaClient::from_config(&config);

        let chunk = GenerateChunk {
            response: String::new(),
            done: true,
            done_reason: Some("stop".to_string()),
            prompt_eval_count: Some(1000),
            eval_count: Some(500),
        };

        let summary = client.summary_from_chunk(&chunk);
        assert_eq!(summary.input_tokens, 1000);
        assert!((summary.price - 2.0).abs() < 1e-9);
    }
}
