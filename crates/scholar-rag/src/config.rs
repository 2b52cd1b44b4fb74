//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generation::PromptStyle;
use crate::retrieval::SearchStrategy;

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Gemini API configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Qdrant vector database configuration
    #[serde(default)]
    pub qdrant: QdrantConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Local storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Build configuration from defaults plus environment overrides
    ///
    /// Recognized variables: `GOOGLE_API_KEY`, `GEMINI_EMBED_MODEL`,
    /// `GEMINI_GENERATE_MODEL`, `QDRANT_URL`, `QDRANT_COLLECTION`,
    /// `CHUNK_SIZE`, `CHUNK_OVERLAP`, `RETRIEVAL_TOP_K`, `DATA_DIR`,
    /// `SERVER_HOST`, `SERVER_PORT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.gemini.api_key = key;
        }
        if let Ok(model) = std::env::var("GEMINI_EMBED_MODEL") {
            config.gemini.embed_model = model;
        }
        if let Ok(model) = std::env::var("GEMINI_GENERATE_MODEL") {
            config.gemini.generate_model = model;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant.url = url;
        }
        if let Ok(collection) = std::env::var("QDRANT_COLLECTION") {
            config.qdrant.collection = collection;
        }
        if let Some(size) = env_parse("CHUNK_SIZE") {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = env_parse("CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = overlap;
        }
        if let Some(k) = env_parse("RETRIEVAL_TOP_K") {
            config.retrieval.top_k = k;
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_parse("SERVER_PORT") {
            config.server.port = port;
        }

        config
    }

    /// Validate that required settings are present
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.is_empty() {
            return Err(Error::Config(
                "Gemini API key is not set. Export GOOGLE_API_KEY or set gemini.api_key".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Gemini API configuration
///
/// Uses the public Generative Language API with API-key authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (normally from GOOGLE_API_KEY)
    #[serde(default)]
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation (0.0 for deterministic, factual answers)
    pub temperature: f32,
    /// Maximum output tokens for generation
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for rate-limited or failed requests
    pub max_retries: u32,
    /// Maximum texts per embedding request (API batch limit)
    pub embed_batch_size: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embed_model: "text-embedding-004".to_string(),
            generate_model: "gemini-2.5-pro".to_string(),
            temperature: 0.0,
            max_output_tokens: 2048,
            timeout_secs: 120,
            max_retries: 3,
            embed_batch_size: 100,
        }
    }
}

/// Qdrant vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Qdrant base URL
    pub url: String,
    /// Collection name
    pub collection: String,
    /// Embedding dimensions (768 for text-embedding-004)
    pub dimensions: usize,
    /// Points per upsert request. The embedding provider rejects batches
    /// above 5461 items, so ingestion stays under that with a buffer.
    pub upsert_batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "cs_textbooks".to_string(),
            dimensions: 768,
            upsert_batch_size: 5000,
            timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default search strategy
    #[serde(default)]
    pub strategy: SearchStrategy,
    /// Number of chunks to retrieve (k=3 scored best in evaluation)
    pub top_k: usize,
    /// Minimum similarity for a chunk to be used (0.0-1.0)
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            top_k: 3,
            similarity_threshold: 0.0,
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Default prompt style (Expert scored best in evaluation)
    #[serde(default)]
    pub prompt_style: PromptStyle,
    /// Maximum snippet length in source previews
    pub snippet_max_len: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prompt_style: PromptStyle::default(),
            snippet_max_len: 200,
        }
    }
}

/// Local storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory scanned for documents at initialization
    pub data_dir: PathBuf,
    /// Feedback and interaction log
    pub feedback_path: PathBuf,
    /// Document registry
    pub documents_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            feedback_path: PathBuf::from("feedback_data.json"),
            documents_path: PathBuf::from("documents.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.qdrant.collection, "cs_textbooks");
        assert_eq!(config.qdrant.upsert_batch_size, 5000);
        assert_eq!(config.gemini.temperature, 0.0);
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let config = RagConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_overlap_larger_than_chunk() {
        let mut config = RagConfig::default();
        config.gemini.api_key = "test-key".to_string();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = 200;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_roundtrip() {
        let config = RagConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: RagConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.chunking.chunk_size, config.chunking.chunk_size);
        assert_eq!(parsed.qdrant.url, config.qdrant.url);
    }
}
