//! Application state for the RAG server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::Result;
use crate::learning::FeedbackStore;
use crate::providers::VectorStoreProvider;
use crate::pipeline::RagPipeline;
use crate::types::Document;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// The RAG pipeline (providers, retriever, ingestion)
    pipeline: RagPipeline,
    /// Feedback and interaction log
    feedback: FeedbackStore,
    /// Document registry (persisted to disk)
    documents: DashMap<Uuid, Document>,
    /// Path to the document registry file
    documents_path: PathBuf,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by Gemini and Qdrant from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        let pipeline = RagPipeline::from_config(config)?;
        Ok(Self::with_pipeline(pipeline))
    }

    /// Create state around an existing pipeline
    pub fn with_pipeline(pipeline: RagPipeline) -> Self {
        let storage = &pipeline.config().storage;
        let feedback = FeedbackStore::new(storage.feedback_path.clone());
        let documents_path = storage.documents_path.clone();
        let documents = Self::load_documents(&documents_path);

        tracing::info!("Loaded {} documents from registry", documents.len());

        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                feedback,
                documents,
                documents_path,
                ready: RwLock::new(false),
            }),
        }
    }

    /// Initialize the vector collection, ingesting the data directory when
    /// it is empty, and mark the server ready
    pub async fn initialize(&self, force_recreate: bool) -> Result<()> {
        let ingested = self.inner.pipeline.initialize(force_recreate).await?;

        for doc in ingested {
            self.add_document(doc);
        }

        self.set_ready(true);
        Ok(())
    }

    fn load_documents(path: &PathBuf) -> DashMap<Uuid, Document> {
        let documents = DashMap::new();

        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<Vec<Document>>(&content) {
                    Ok(docs) => {
                        for doc in docs {
                            documents.insert(doc.id, doc);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        documents
    }

    fn save_documents(&self) {
        let docs: Vec<Document> = self
            .inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        match serde_json::to_string_pretty(&docs) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.inner.documents_path, content) {
                    tracing::error!("Failed to save document registry: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize document registry: {}", e);
            }
        }
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Get the configuration
    pub fn config(&self) -> &RagConfig {
        self.inner.pipeline.config()
    }

    /// Get the feedback store
    pub fn feedback(&self) -> &FeedbackStore {
        &self.inner.feedback
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Add a document to the registry (persisted to disk)
    pub fn add_document(&self, doc: Document) {
        self.inner.documents.insert(doc.id, doc);
        self.save_documents();
    }

    /// Get a document by ID
    pub fn get_document(&self, id: &Uuid) -> Option<Document> {
        self.inner.documents.get(id).map(|d| d.clone())
    }

    /// List all documents
    pub fn list_documents(&self) -> Vec<Document> {
        self.inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of registered documents
    pub fn document_count(&self) -> usize {
        self.inner.documents.len()
    }

    /// Find document by filename
    pub fn find_by_filename(&self, filename: &str) -> Option<Document> {
        self.inner
            .documents
            .iter()
            .find(|entry| entry.value().filename == filename)
            .map(|entry| entry.value().clone())
    }

    /// Find document by content hash
    pub fn find_by_hash(&self, content_hash: &str) -> Option<Document> {
        self.inner
            .documents
            .iter()
            .find(|entry| entry.value().content_hash == content_hash)
            .map(|entry| entry.value().clone())
    }

    /// Classify an incoming file against the registry
    pub fn check_file_status(&self, filename: &str, content_hash: &str) -> FileStatus {
        if let Some(existing) = self.find_by_hash(content_hash) {
            if existing.filename == filename {
                return FileStatus::Unchanged(existing);
            }
            return FileStatus::Duplicate(existing);
        }

        if let Some(existing) = self.find_by_filename(filename) {
            return FileStatus::Modified(existing);
        }

        FileStatus::New
    }

    /// Delete a document and its indexed chunks
    pub async fn delete_document_with_chunks(&self, doc_id: &Uuid) -> Result<Option<Document>> {
        self.inner
            .pipeline
            .store()
            .delete_by_document(doc_id)
            .await?;

        let removed = self.inner.documents.remove(doc_id).map(|(_, d)| d);
        if removed.is_some() {
            self.save_documents();
        }

        Ok(removed)
    }
}

/// Status of a file for deduplication
#[derive(Debug, Clone)]
pub enum FileStatus {
    /// File is new, process it
    New,
    /// File exists with same content - skip processing
    Unchanged(Document),
    /// Same content exists under different filename - skip
    Duplicate(Document),
    /// File exists but content changed - delete old and reprocess
    Modified(Document),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn state_for_registry() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.gemini.api_key = "test-key".to_string();
        config.storage.feedback_path = dir.path().join("feedback.json");
        config.storage.documents_path = dir.path().join("documents.json");

        let pipeline = RagPipeline::from_config(config).unwrap();
        (dir, AppState::with_pipeline(pipeline))
    }

    #[test]
    fn dedup_classification() {
        let (_dir, state) = state_for_registry();

        let doc = Document::new(
            "intro.pdf".to_string(),
            FileType::Pdf,
            "hash-a".to_string(),
            1000,
        );
        state.add_document(doc.clone());

        assert!(matches!(
            state.check_file_status("intro.pdf", "hash-a"),
            FileStatus::Unchanged(_)
        ));
        assert!(matches!(
            state.check_file_status("copy.pdf", "hash-a"),
            FileStatus::Duplicate(_)
        ));
        assert!(matches!(
            state.check_file_status("intro.pdf", "hash-b"),
            FileStatus::Modified(_)
        ));
        assert!(matches!(
            state.check_file_status("new.pdf", "hash-c"),
            FileStatus::New
        ));
    }

    #[test]
    fn registry_persists_documents() {
        let (dir, state) = state_for_registry();

        let doc = Document::new(
            "algo.txt".to_string(),
            FileType::Txt,
            "hash-x".to_string(),
            512,
        );
        let doc_id = doc.id;
        state.add_document(doc);

        assert!(dir.path().join("documents.json").exists());
        assert_eq!(state.document_count(), 1);
        assert!(state.get_document(&doc_id).is_some());
        assert!(state.find_by_filename("algo.txt").is_some());
    }
}
