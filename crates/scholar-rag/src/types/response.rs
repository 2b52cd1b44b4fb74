//! Response types for RAG queries and ingestion

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document, FileType};

/// A source reference attached to an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (if applicable)
    pub page_number: Option<u32>,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Snippet from the source, truncated at a word boundary
    pub snippet: String,
    /// Snippet with highlighted query terms (<mark> tags)
    pub snippet_highlighted: String,
    /// Similarity score (0.0-1.0)
    pub similarity_score: f32,
}

impl SourceRef {
    /// Create a source reference from a chunk and similarity score
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32, snippet_max_len: usize) -> Self {
        let snippet = crate::generation::truncate_snippet(&chunk.content, snippet_max_len);
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            filename: chunk.source.filename.clone(),
            file_type: chunk.source.file_type.clone(),
            page_number: chunk.source.page_number,
            chunk_index: chunk.chunk_index,
            snippet_highlighted: snippet.clone(),
            snippet,
            similarity_score,
        }
    }

    /// Highlight query terms in the snippet
    pub fn highlight_terms(&mut self, terms: &[&str]) {
        self.snippet_highlighted = crate::generation::highlight_snippet(&self.snippet, terms);
    }

    /// Format source for display in text
    pub fn format_inline(&self) -> String {
        match self.page_number {
            Some(page) => format!("[Source: {}, Page {}]", self.filename, page),
            None => format!("[Source: {}]", self.filename),
        }
    }
}

/// Response from a RAG query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The question asked
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Source references with snippets
    pub sources: Vec<SourceRef>,
    /// Number of sources used
    pub num_sources: usize,
    /// Overall confidence score (mean similarity, 0.0-1.0)
    pub confidence: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Interaction ID for feedback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<Uuid>,
    /// Raw chunks (if include_chunks was true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_chunks: Option<Vec<Chunk>>,
    /// Error message if the query failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Create a new query response
    pub fn new(
        question: String,
        answer: String,
        sources: Vec<SourceRef>,
        processing_time_ms: u64,
    ) -> Self {
        let confidence = if sources.is_empty() {
            0.0
        } else {
            sources.iter().map(|s| s.similarity_score).sum::<f32>() / sources.len() as f32
        };

        Self {
            question,
            answer,
            num_sources: sources.len(),
            sources,
            confidence,
            processing_time_ms,
            interaction_id: None,
            raw_chunks: None,
            error: None,
        }
    }

    /// Response when no relevant information is found
    pub fn not_found(question: String, processing_time_ms: u64) -> Self {
        Self {
            question,
            answer: "I couldn't find relevant information in the documents to answer this question."
                .to_string(),
            sources: Vec::new(),
            num_sources: 0,
            confidence: 0.0,
            processing_time_ms,
            interaction_id: None,
            raw_chunks: None,
            error: None,
        }
    }

    /// Response carrying an error, mirroring the answer shape so callers
    /// always have something to display
    pub fn from_error(question: String, error: String, processing_time_ms: u64) -> Self {
        Self {
            question,
            answer: format!("An error occurred while processing your question: {}", error),
            sources: Vec::new(),
            num_sources: 0,
            confidence: 0.0,
            processing_time_ms,
            interaction_id: None,
            raw_chunks: None,
            error: Some(error),
        }
    }
}

/// Response from document ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Whether ingestion was successful
    pub success: bool,
    /// Ingested documents
    pub documents: Vec<DocumentSummary>,
    /// Files skipped by deduplication
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<String>,
    /// Total chunks created across all documents
    pub total_chunks_created: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Any errors encountered (partial success)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<IngestError>,
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            file_type: doc.file_type.clone(),
            total_pages: doc.total_pages,
            total_chunks: doc.total_chunks,
            file_size: doc.file_size,
            ingested_at: doc.ingested_at,
        }
    }
}

/// Error during ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    /// Filename that failed
    pub filename: String,
    /// Error message
    pub error: String,
}

/// Response for listing documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// List of documents
    pub documents: Vec<DocumentSummary>,
    /// Total count
    pub total_count: usize,
}

/// Statistics about the vector collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Status string
    pub status: String,
    /// Collection name
    pub collection_name: String,
    /// Total indexed chunks
    pub total_chunks: usize,
    /// Registered documents
    pub total_documents: usize,
    /// Qdrant URL
    pub qdrant_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::ChunkSource;

    #[test]
    fn confidence_is_mean_similarity() {
        let doc_id = Uuid::new_v4();
        let make = |score: f32| {
            let chunk = Chunk::new(
                doc_id,
                "content".to_string(),
                ChunkSource::text("a.txt".to_string(), FileType::Txt),
                0,
                7,
                0,
            );
            SourceRef::from_chunk(&chunk, score, 200)
        };

        let response = QueryResponse::new(
            "q".to_string(),
            "a".to_string(),
            vec![make(0.8), make(0.6)],
            12,
        );
        assert!((response.confidence - 0.7).abs() < 1e-6);
        assert_eq!(response.num_sources, 2);
    }

    #[test]
    fn not_found_has_zero_confidence() {
        let response = QueryResponse::not_found("q".to_string(), 5);
        assert_eq!(response.confidence, 0.0);
        assert!(response.sources.is_empty());
        assert!(response.error.is_none());
    }
}
