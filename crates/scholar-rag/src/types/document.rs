//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename.rsplit('.').next().unwrap_or("");
        Self::from_extension(ext)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// A document that has been ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Content hash for deduplication
    pub content_hash: String,
    /// Total number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document
    pub fn new(filename: String, file_type: FileType, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            total_pages: None,
            total_chunks: 0,
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Original filename (used in citations)
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed, for PDFs)
    pub page_number: Option<u32>,
    /// Total pages in document
    pub page_count: Option<u32>,
}

impl ChunkSource {
    /// Create source info for a text file
    pub fn text(filename: String, file_type: FileType) -> Self {
        Self {
            filename,
            file_type,
            page_number: None,
            page_count: None,
        }
    }

    /// Create source info for a PDF
    pub fn pdf(filename: String, page: Option<u32>, total_pages: Option<u32>) -> Self {
        Self {
            filename,
            file_type: FileType::Pdf,
            page_number: page,
            page_count: total_pages,
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        match self.page_number {
            Some(page) => format!("{}, Page {}", self.filename, page),
            None => self.filename.clone(),
        }
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Embedding vector (768 dimensions for text-embedding-004)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character position in original document
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within document
    pub chunk_index: u32,
    /// Total chunks in document (set after chunking completes)
    pub total_chunks: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: Uuid,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            source,
            char_start,
            char_end,
            chunk_index,
            total_chunks: 0,
        }
    }

    /// Convert to a vector-store payload
    pub fn to_payload(&self) -> HashMap<String, serde_json::Value> {
        let mut payload = HashMap::new();
        payload.insert("chunk_id".to_string(), serde_json::json!(self.id.to_string()));
        payload.insert(
            "document_id".to_string(),
            serde_json::json!(self.document_id.to_string()),
        );
        payload.insert("filename".to_string(), serde_json::json!(self.source.filename));
        payload.insert("file_type".to_string(), serde_json::json!(self.source.file_type));
        payload.insert("chunk_index".to_string(), serde_json::json!(self.chunk_index));
        payload.insert("total_chunks".to_string(), serde_json::json!(self.total_chunks));
        payload.insert("char_start".to_string(), serde_json::json!(self.char_start));
        payload.insert("char_end".to_string(), serde_json::json!(self.char_end));
        payload.insert("content".to_string(), serde_json::json!(self.content));

        if let Some(page) = self.source.page_number {
            payload.insert("page_number".to_string(), serde_json::json!(page));
        }
        if let Some(count) = self.source.page_count {
            payload.insert("page_count".to_string(), serde_json::json!(count));
        }

        payload
    }

    /// Rebuild a chunk from a vector-store payload
    pub fn from_payload(id: &str, payload: &HashMap<String, serde_json::Value>) -> Self {
        let chunk_id = payload
            .get("chunk_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(|| Uuid::parse_str(id).unwrap_or_else(|_| Uuid::new_v4()));

        let document_id = payload
            .get("document_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let filename = payload
            .get("filename")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let file_type = payload
            .get("file_type")
            .map(|v| serde_json::from_value(v.clone()).unwrap_or(FileType::Unknown))
            .unwrap_or(FileType::Unknown);

        let content = payload
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let chunk_index = payload
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let total_chunks = payload
            .get("total_chunks")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let char_start = payload
            .get("char_start")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let char_end = payload
            .get("char_end")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let page_number = payload
            .get("page_number")
            .and_then(|v| v.as_u64())
            .map(|p| p as u32);

        let page_count = payload
            .get("page_count")
            .and_then(|v| v.as_u64())
            .map(|p| p as u32);

        Self {
            id: chunk_id,
            document_id,
            content,
            embedding: Vec::new(),
            source: ChunkSource {
                filename,
                file_type,
                page_number,
                page_count,
            },
            char_start,
            char_end,
            chunk_index,
            total_chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_detection() {
        assert_eq!(FileType::from_extension("pdf"), FileType::Pdf);
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("txt"), FileType::Txt);
        assert_eq!(FileType::from_extension("md"), FileType::Markdown);
        assert_eq!(FileType::from_extension("docx"), FileType::Unknown);
        assert!(!FileType::Unknown.is_supported());
        assert_eq!(FileType::from_filename("notes.on.algorithms.txt"), FileType::Txt);
    }

    #[test]
    fn payload_roundtrip() {
        let doc_id = Uuid::new_v4();
        let mut chunk = Chunk::new(
            doc_id,
            "Big O notation describes asymptotic growth.".to_string(),
            ChunkSource::pdf("algorithms.pdf".to_string(), Some(12), Some(300)),
            100,
            143,
            4,
        );
        chunk.total_chunks = 87;

        let payload = chunk.to_payload();
        let rebuilt = Chunk::from_payload(&chunk.id.to_string(), &payload);

        assert_eq!(rebuilt.id, chunk.id);
        assert_eq!(rebuilt.document_id, doc_id);
        assert_eq!(rebuilt.content, chunk.content);
        assert_eq!(rebuilt.chunk_index, 4);
        assert_eq!(rebuilt.total_chunks, 87);
        assert_eq!(rebuilt.source.page_number, Some(12));
        assert_eq!(rebuilt.source.file_type, FileType::Pdf);
    }

    #[test]
    fn citation_formatting() {
        let source = ChunkSource::pdf("intro.pdf".to_string(), Some(3), Some(10));
        assert_eq!(source.format_citation(), "intro.pdf, Page 3");

        let source = ChunkSource::text("notes.txt".to_string(), FileType::Txt);
        assert_eq!(source.format_citation(), "notes.txt");
    }
}
