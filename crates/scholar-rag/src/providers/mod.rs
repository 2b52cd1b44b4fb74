//! Provider abstractions for embeddings, LLM, and vector storage
//!
//! Trait seams keep the external services (Gemini, Qdrant) swappable and
//! mockable in tests.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod qdrant;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiLlm};
pub use llm::LlmProvider;
pub use qdrant::QdrantStore;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
