//! Mock backend for deterministic testing.
//!
//! Implements the backend traits with scripted replies and deterministic
//! embeddings so the turn pipeline can be tested without a live endpoint.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use pgvector::Vector;

use aidas_core::{
    ChatBackend, ChatMessage, EmbeddingBackend, Error, GenerationOptions, Result, TokenStream,
};

/// Mock backend for testing.
#[derive(Clone)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    stream_fragments: Vec<String>,
    reply: String,
    fail_chat: bool,
    fail_embed: bool,
    fail_mid_stream: bool,
}

/// A recorded call for assertion.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            stream_fragments: vec!["Labas".to_string(), "!".to_string()],
            reply: "Mock atsakymas".to_string(),
            fail_chat: false,
            fail_embed: false,
            fail_mid_stream: false,
        }
    }
}

impl MockBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the fragments yielded by streaming completions.
    pub fn with_stream_fragments(mut self, fragments: &[&str]) -> Self {
        Arc::make_mut(&mut self.config).stream_fragments =
            fragments.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the reply returned by non-streaming completions.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).reply = reply.into();
        self
    }

    /// Make chat completions fail.
    pub fn failing_chat(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_chat = true;
        self
    }

    /// Make embedding requests fail.
    pub fn failing_embed(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_embed = true;
        self
    }

    /// Yield the scripted fragments, then error mid-stream.
    pub fn failing_mid_stream(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_mid_stream = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Get number of calls for one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    /// Deterministic embedding from text, normalized to unit length.
    pub fn embedding_for(text: &str, dimension: usize) -> Vector {
        let mut vec = vec![0.0f32; dimension];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        Vector::from(vec)
    }

    fn last_user_content(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        self.log_call("chat_stream", &Self::last_user_content(messages));

        if self.config.fail_chat {
            return Err(Error::Inference("scripted chat failure".to_string()));
        }

        let mut items: Vec<Result<String>> = self
            .config
            .stream_fragments
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if self.config.fail_mid_stream {
            items.push(Err(Error::Inference("scripted stream failure".to_string())));
        }

        Ok(Box::pin(stream::iter(items)))
    }

    async fn chat(&self, messages: &[ChatMessage], _options: GenerationOptions) -> Result<String> {
        self.log_call("chat", &Self::last_user_content(messages));

        if self.config.fail_chat {
            return Err(Error::Inference("scripted chat failure".to_string()));
        }

        Ok(self.config.reply.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

#[async_trait]
impl EmbeddingBackend for MockBackend {
    async fn embed_text(&self, text: &str) -> Result<Vector> {
        self.log_call("embed", text);

        if self.config.fail_embed {
            return Err(Error::Embedding("scripted embedding failure".to_string()));
        }

        Ok(Self::embedding_for(text, self.config.dimension))
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed_model_name(&self) -> &str {
        "mock-embed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidas_core::MessageRole;
    use futures::StreamExt;

    fn user_msg(content: &str) -> ChatMessage {
        ChatMessage::new(MessageRole::User, content)
    }

    #[tokio::test]
    async fn test_stream_yields_scripted_fragments() {
        let backend = MockBackend::new().with_stream_fragments(&["Labas", " rytas"]);

        let mut stream = backend.chat_stream(&[user_msg("sveiki")]).await.unwrap();
        let mut collected = String::new();
        while let Some(fragment) = stream.next().await {
            collected.push_str(&fragment.unwrap());
        }
        assert_eq!(collected, "Labas rytas");
    }

    #[tokio::test]
    async fn test_mid_stream_failure() {
        let backend = MockBackend::new()
            .with_stream_fragments(&["dalis"])
            .failing_mid_stream();

        let mut stream = backend.chat_stream(&[user_msg("sveiki")]).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "dalis");
        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let backend = MockBackend::new().with_dimension(128);

        let e1 = backend.embed_text("kvantinė fizika").await.unwrap();
        let e2 = backend.embed_text("kvantinė fizika").await.unwrap();
        assert_eq!(e1.as_slice(), e2.as_slice());
        assert_eq!(e1.as_slice().len(), 128);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let backend = MockBackend::new().failing_chat().failing_embed();

        assert!(backend.chat_stream(&[user_msg("x")]).await.is_err());
        assert!(backend
            .chat(&[user_msg("x")], GenerationOptions::default())
            .await
            .is_err());
        assert!(backend.embed_text("x").await.is_err());
    }

    #[tokio::test]
    async fn test_call_logging() {
        let backend = MockBackend::new();

        backend.embed_text("pirmas").await.unwrap();
        backend.embed_text("antras").await.unwrap();
        backend
            .chat(&[user_msg("klausimas")], GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(backend.call_count("embed"), 2);
        assert_eq!(backend.call_count("chat"), 1);
        assert_eq!(backend.calls()[2].input, "klausimas");
    }
}
