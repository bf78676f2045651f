//! Completion engine clients for aidas.
//!
//! Talks to any OpenAI-compatible endpoint for streaming chat completions
//! and text embeddings, and ships a scripted mock for pipeline tests.

pub mod backend;
pub mod mock;
pub mod streaming;
pub mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use mock::MockBackend;
pub use streaming::parse_sse_stream;

// Re-export the trait surface so callers need only this crate.
pub use aidas_core::{
    ChatBackend, ChatMessage, EmbeddingBackend, GenerationOptions, InferenceBackend, TokenStream,
};
