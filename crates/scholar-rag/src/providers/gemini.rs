//! Gemini clients for embeddings and answer generation
//!
//! Talks to the Google Generative Language API with API-key authentication.
//! Requests that hit rate limits (429) or transient server errors are
//! retried with exponential backoff up to the configured retry count.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Shared HTTP client for the Generative Language API
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.config.base_url, model, method, self.config.api_key
        )
    }

    /// POST with retry on 429 and 5xx responses
    async fn post_with_retry<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
        what: &str,
        make_err: fn(String) -> Error,
    ) -> Result<reqwest::Response> {
        let mut attempt = 0u32;

        loop {
            let response = self.http.post(url).json(body).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }

                    let retryable = status == StatusCode::TOO_MANY_REQUESTS
                        || status.is_server_error();

                    if retryable && attempt < self.config.max_retries {
                        attempt += 1;
                        let backoff = Duration::from_millis(500 * (1 << attempt.min(6)) as u64);
                        tracing::warn!(
                            "{} returned {}, retrying in {:?} (attempt {}/{})",
                            what,
                            status,
                            backoff,
                            attempt,
                            self.config.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    let text = resp.text().await.unwrap_or_default();
                    return Err(make_err(format!("{} failed ({}): {}", what, status, text)));
                }
                Err(e) => {
                    if attempt < self.config.max_retries {
                        attempt += 1;
                        let backoff = Duration::from_millis(500 * (1 << attempt.min(6)) as u64);
                        tracing::warn!(
                            "{} request error: {}, retrying in {:?} (attempt {}/{})",
                            what,
                            e,
                            backoff,
                            attempt,
                            self.config.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(make_err(format!("{} request failed: {}", what, e)));
                }
            }
        }
    }

    /// Embed a single text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint(&self.config.embed_model, "embedContent");
        let request = EmbedContentRequest {
            model: format!("models/{}", self.config.embed_model),
            content: Content::user_text(text),
        };

        let response = self
            .post_with_retry(&url, &request, "Gemini embedding", Error::Embedding)
            .await?;

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(parsed.embedding.values)
    }

    /// Embed multiple texts, splitting into API-sized sub-batches
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&self.config.embed_model, "batchEmbedContents");
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.embed_batch_size.max(1)) {
            let request = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|text| EmbedContentRequest {
                        model: format!("models/{}", self.config.embed_model),
                        content: Content::user_text(text),
                    })
                    .collect(),
            };

            let response = self
                .post_with_retry(&url, &request, "Gemini batch embedding", Error::Embedding)
                .await?;

            let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
                Error::Embedding(format!("Failed to parse batch embedding response: {}", e))
            })?;

            if parsed.embeddings.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "Batch embedding returned {} vectors for {} texts",
                    parsed.embeddings.len(),
                    batch.len()
                )));
            }

            all_embeddings.extend(parsed.embeddings.into_iter().map(|e| e.values));
        }

        Ok(all_embeddings)
    }

    /// Generate a completion for a prompt
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint(&self.config.generate_model, "generateContent");
        let request = GenerateRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .post_with_retry(&url, &request, "Gemini generation", Error::Llm)
            .await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse generation response: {}", e)))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Llm("No text in Gemini response".to_string()))
    }

    /// Probe the API by listing models
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models?key={}", self.config.base_url, self.config.api_key);
        let response = self.http.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

// Wire types for the Generative Language API

#[derive(serde::Serialize)]
struct EmbedContentRequest {
    model: String,
    content: Content,
}

#[derive(serde::Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(serde::Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(serde::Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini embedding provider (text-embedding-004, 768 dimensions)
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Create a new embedder from an existing client
    pub fn from_client(client: Arc<GeminiClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Gemini LLM provider for answer generation
pub struct GeminiLlm {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiLlm {
    /// Create a new LLM provider from an existing client
    pub fn from_client(client: Arc<GeminiClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build both providers sharing a single client
pub fn build_providers(
    config: &GeminiConfig,
    dimensions: usize,
) -> Result<(GeminiEmbedder, GeminiLlm)> {
    let client = Arc::new(GeminiClient::new(config)?);
    Ok((
        GeminiEmbedder::from_client(Arc::clone(&client), dimensions),
        GeminiLlm::from_client(client, config.generate_model.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_serializes_with_camel_case_config() {
        let request = GenerateRequest {
            contents: vec![Content::user_text("What is an algorithm?")],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 2048,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "What is an algorithm?"
        );
    }

    #[test]
    fn generate_response_parses_candidate_text() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "An algorithm is a procedure."}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.candidates[0].content.parts[0].text,
            "An algorithm is a procedure."
        );
    }

    #[test]
    fn embed_response_parses_values() {
        let body = r#"{"embedding": {"values": [0.1, -0.2, 0.3]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values.len(), 3);
    }
}
