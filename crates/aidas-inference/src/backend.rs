//! OpenAI-compatible completion engine backend.

use std::time::Duration;

use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use tracing::{debug, info};

use aidas_core::{
    ChatBackend, ChatMessage, EmbeddingBackend, Error, GenerationOptions, Result, TokenStream,
};

use super::streaming::parse_sse_stream;
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-ada-002";

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = "gpt-4o";

/// Default embedding dimension for text-embedding-ada-002.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Default timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for generation.
    pub gen_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            embed_dimension: DEFAULT_DIMENSION,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible completion engine backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            op = "init",
            base_url = %config.base_url,
            embed_model = %config.embed_model,
            gen_model = %config.gen_model,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            embed_model: std::env::var("OPENAI_EMBED_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
            gen_model: std::env::var("OPENAI_GEN_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string()),
            embed_dimension: std::env::var("OPENAI_EMBED_DIM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DIMENSION),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let body = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.to_vec(),
            temperature: None,
            max_tokens: None,
            stream: true,
        };

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "chat_stream",
            message_count = messages.len(),
            "Submitting streaming chat completion"
        );

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Chat endpoint returned {}: {}",
                status, detail
            )));
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }

    async fn chat(&self, messages: &[ChatMessage], options: GenerationOptions) -> Result<String> {
        let body = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.to_vec(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Chat endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse chat response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Chat response contained no choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    async fn embed_text(&self, text: &str) -> Result<Vector> {
        let body = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .build_request("/embeddings")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Embedding endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        let data = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Embedding response contained no data".to_string()))?;

        if data.embedding.len() != self.config.embed_dimension {
            return Err(Error::Embedding(format!(
                "Unexpected embedding dimension: got {}, expected {}",
                data.embedding.len(),
                self.config.embed_dimension
            )));
        }

        Ok(Vector::from(data.embedding))
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn embed_model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, DEFAULT_OPENAI_URL);
        assert_eq!(config.embed_dimension, 1536);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_backend_reports_models() {
        let backend = OpenAIBackend::new(OpenAIConfig::default()).unwrap();
        assert_eq!(backend.model_name(), DEFAULT_GEN_MODEL);
        assert_eq!(backend.embed_model_name(), DEFAULT_EMBED_MODEL);
        assert_eq!(backend.dimension(), DEFAULT_DIMENSION);
    }
}
