//! Parse-then-chunk ingestion pipeline

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Result;
use crate::types::{Chunk, Document, FileType};

use super::chunker::TextChunker;
use super::parser::{FileParser, ParsedDocument};

/// Ingestion pipeline combining parsing and chunking
pub struct IngestPipeline {
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a new pipeline with the given chunking parameters
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap),
        }
    }

    /// Set the minimum chunk size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.chunker = self.chunker.with_min_size(min_size);
        self
    }

    /// Parse a file into text and metadata
    pub fn parse_file(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        FileParser::parse(filename, data)
    }

    /// Chunk a parsed document
    pub fn create_chunks(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        self.chunker.chunk_document(doc, parsed)
    }

    /// Parse and chunk every supported file under a directory
    ///
    /// Unsupported files are skipped with a log line; parse failures are
    /// logged and do not abort the walk.
    pub fn process_directory(&self, dir: impl AsRef<Path>) -> Vec<(Document, Vec<Chunk>)> {
        let dir = dir.as_ref();
        if !dir.exists() {
            tracing::warn!("Data directory {} does not exist", dir.display());
            return Vec::new();
        }

        let mut results = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let filename = entry.file_name().to_string_lossy().into_owned();

            if !FileType::from_filename(&filename).is_supported() {
                tracing::debug!("Skipping unsupported file: {}", filename);
                continue;
            }

            let data = match std::fs::read(entry.path()) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", filename, e);
                    continue;
                }
            };

            match self.parse_file(&filename, &data) {
                Ok(parsed) => {
                    let mut doc = Document::new(
                        filename.clone(),
                        parsed.file_type.clone(),
                        parsed.content_hash.clone(),
                        data.len() as u64,
                    );
                    doc.total_pages = parsed.total_pages;

                    let chunks = self.create_chunks(&doc, &parsed);
                    doc.total_chunks = chunks.len() as u32;

                    tracing::info!("Processed {}: {} chunks", filename, chunks.len());
                    results.push((doc, chunks));
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", filename, e);
                }
            }
        }

        results
    }
}

/// Statistics about a processed corpus
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub total_chunks: usize,
    pub total_documents: usize,
    pub total_characters: usize,
    pub average_chunk_size: usize,
    pub sources: Vec<String>,
}

impl CorpusStats {
    /// Compute stats over processed documents
    pub fn from_results(results: &[(Document, Vec<Chunk>)]) -> Self {
        let total_chunks: usize = results.iter().map(|(_, chunks)| chunks.len()).sum();
        let total_characters: usize = results
            .iter()
            .flat_map(|(_, chunks)| chunks.iter())
            .map(|c| c.content.len())
            .sum();

        Self {
            total_chunks,
            total_documents: results.len(),
            total_characters,
            average_chunk_size: if total_chunks > 0 {
                total_characters / total_chunks
            } else {
                0
            },
            sources: results.iter().map(|(doc, _)| doc.filename.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_directory_of_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.txt"),
            "Binary search halves the search space on every comparison step.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.md"),
            "Linked lists trade random access for constant-time insertion.",
        )
        .unwrap();
        std::fs::write(dir.path().join("ignored.docx"), "binary").unwrap();

        let pipeline = IngestPipeline::new(1000, 200);
        let results = pipeline.process_directory(dir.path());

        assert_eq!(results.len(), 2);
        for (doc, chunks) in &results {
            assert_eq!(doc.total_chunks, chunks.len() as u32);
            assert!(!chunks.is_empty());
        }

        let stats = CorpusStats::from_results(&results);
        assert_eq!(stats.total_documents, 2);
        assert!(stats.total_chunks >= 2);
        assert!(stats.average_chunk_size > 0);
    }

    #[test]
    fn missing_directory_yields_empty() {
        let pipeline = IngestPipeline::new(1000, 200);
        let results = pipeline.process_directory("/nonexistent/path/for/test");
        assert!(results.is_empty());
    }
}
