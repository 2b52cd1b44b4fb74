//! Document management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentListResponse, DocumentSummary};

/// GET /api/documents - List all documents
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let mut documents: Vec<DocumentSummary> = state
        .list_documents()
        .iter()
        .map(DocumentSummary::from)
        .collect();
    documents.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));

    let total_count = documents.len();
    Json(DocumentListResponse {
        documents,
        total_count,
    })
}

/// GET /api/documents/:id - Get document details
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    state
        .get_document(&id)
        .map(|doc| Json(DocumentSummary::from(&doc)))
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
}

/// DELETE /api/documents/:id - Delete a document and its chunks
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let removed = state.delete_document_with_chunks(&id).await?;

    match removed {
        Some(doc) => Ok(Json(serde_json::json!({
            "deleted": true,
            "id": doc.id,
            "filename": doc.filename,
        }))),
        None => Err(Error::DocumentNotFound(id.to_string())),
    }
}
