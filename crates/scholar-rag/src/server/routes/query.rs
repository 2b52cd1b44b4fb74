//! Query endpoint with retrieval, generation, and interaction logging

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Query the RAG system
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("Query: \"{}\"", request.question);

    let mut response = state.pipeline().query(&request).await?;

    // Log the interaction so feedback can reference it later
    match state.feedback().add_interaction(
        &request.question,
        response.answer.split_whitespace().count(),
        response.num_sources,
        response.processing_time_ms as f64 / 1000.0,
    ) {
        Ok(interaction_id) => response.interaction_id = Some(interaction_id),
        Err(e) => tracing::warn!("Failed to log interaction: {}", e),
    }

    tracing::info!(
        "Query completed in {}ms, {} sources",
        response.processing_time_ms,
        response.num_sources
    );

    Ok(Json(response))
}
