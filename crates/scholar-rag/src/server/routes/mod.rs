//! API routes for the RAG server

pub mod documents;
pub mod feedback;
pub mod ingest;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Ingestion - with larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Query
        .route("/query", post(query::query_rag))
        // Feedback and monitoring
        .route("/feedback", post(feedback::submit_feedback))
        .route("/stats", get(feedback::collection_stats))
        .route("/metrics", get(feedback::dashboard_metrics))
        // Built-in evaluation
        .route("/evaluate", post(feedback::run_evaluation))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "scholar-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented document Q&A with source citations",
        "endpoints": {
            "POST /api/ingest": "Upload and process PDF/TXT documents",
            "POST /api/query": "Ask a question, get a cited answer",
            "POST /api/feedback": "Submit thumbs up/down on an answer",
            "GET /api/documents": "List all documents",
            "GET /api/documents/:id": "Get document details",
            "DELETE /api/documents/:id": "Delete a document and its chunks",
            "GET /api/stats": "Vector collection statistics",
            "GET /api/metrics": "Monitoring dashboard aggregates",
            "POST /api/evaluate": "Run the built-in evaluation question set"
        },
        "features": {
            "deduplication": "Content-hash based file deduplication",
            "retrieval_strategies": "Similarity and MMR search",
            "prompt_styles": "Detailed, concise, structured, and expert templates",
            "feedback_log": "Append-only feedback and interaction log"
        }
    }))
}
