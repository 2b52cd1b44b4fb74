//! scholar-rag: retrieval-augmented document Q&A with source citations
//!
//! Ingests PDF and text documents, indexes their chunks in Qdrant, and
//! answers questions by retrieving relevant passages and asking Gemini for a
//! grounded, cited answer. Ships an evaluation harness comparing retrieval
//! strategies and prompt templates, plus a feedback log with monitoring
//! metrics.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod ingestion;
pub mod learning;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use types::{
    document::{Chunk, ChunkSource, Document, FileType},
    query::QueryRequest,
    response::{QueryResponse, SourceRef},
};
