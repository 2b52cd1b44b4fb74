//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::Chunk;

/// Search result from the vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (cosine, higher is more similar)
    pub similarity: f32,
    /// Stored embedding vector, present when requested (needed for MMR)
    pub vector: Option<Vec<f32>>,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `QdrantStore`: Qdrant over its HTTP API
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self) -> Result<()>;

    /// Check whether the collection exists
    async fn collection_exists(&self) -> Result<bool>;

    /// Drop and recreate the collection
    async fn reset(&self) -> Result<()>;

    /// Insert chunks with their embeddings (batched by the implementation)
    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Search for similar chunks
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        with_vectors: bool,
        document_filter: Option<&[Uuid]>,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Delete all chunks for a document, returning the prior point count
    async fn delete_by_document(&self, document_id: &Uuid) -> Result<()>;

    /// Get total number of vectors stored
    async fn count(&self) -> Result<usize>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
