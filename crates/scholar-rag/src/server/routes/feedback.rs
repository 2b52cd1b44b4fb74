//! Feedback, statistics, metrics, and built-in evaluation endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::evaluation::system::default_test_questions;
use crate::learning::{compute_metrics, DashboardMetrics, FeedbackType};
use crate::pipeline::SimpleEvaluation;
use crate::server::state::AppState;
use crate::types::CollectionStats;

/// Feedback submission
///
/// Either references a logged interaction by ID or carries the
/// question/answer pair directly.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Interaction to attach feedback to (from a query response)
    #[serde(default)]
    pub interaction_id: Option<Uuid>,
    /// Question, required when no interaction ID is given
    #[serde(default)]
    pub question: Option<String>,
    /// Answer, required when no interaction ID is given
    #[serde(default)]
    pub answer: Option<String>,
    /// Positive or negative
    pub feedback: FeedbackType,
    /// Sources shown with the answer
    #[serde(default)]
    pub sources_count: usize,
    /// Optional free-form comment
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/feedback - Submit feedback on an answer
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>> {
    let (question, answer, sources_count) = match request.interaction_id {
        Some(id) => {
            let interaction = state.feedback().get_interaction(&id).ok_or_else(|| {
                Error::Config(format!("Unknown interaction_id: {}", id))
            })?;
            (
                interaction.question,
                request.answer.unwrap_or_default(),
                interaction.sources_count,
            )
        }
        None => {
            let question = request.question.ok_or_else(|| {
                Error::Config("question is required without interaction_id".to_string())
            })?;
            let answer = request.answer.ok_or_else(|| {
                Error::Config("answer is required without interaction_id".to_string())
            })?;
            (question, answer, request.sources_count)
        }
    };

    state.feedback().add_feedback(
        &question,
        &answer,
        request.feedback,
        sources_count,
        request.comment,
        request.interaction_id,
    )?;

    tracing::info!("Recorded {:?} feedback for \"{}\"", request.feedback, question);

    Ok(Json(serde_json::json!({ "recorded": true })))
}

/// GET /api/stats - Vector collection statistics
pub async fn collection_stats(State(state): State<AppState>) -> Result<Json<CollectionStats>> {
    let stats = state.pipeline().stats(state.document_count()).await?;
    Ok(Json(stats))
}

/// GET /api/metrics - Monitoring dashboard aggregates
pub async fn dashboard_metrics(State(state): State<AppState>) -> Json<DashboardMetrics> {
    Json(compute_metrics(state.feedback()))
}

/// POST /api/evaluate - Run the built-in evaluation question set
pub async fn run_evaluation(State(state): State<AppState>) -> Result<Json<SimpleEvaluation>> {
    let questions: Vec<String> = default_test_questions()
        .into_iter()
        .map(|q| q.question)
        .collect();

    let evaluation = state.pipeline().simple_evaluation(&questions).await;

    tracing::info!(
        "Evaluation: {}/{} successful, {:.1} avg sources",
        evaluation.successful_queries,
        evaluation.total_questions,
        evaluation.average_sources_retrieved
    );

    Ok(Json(evaluation))
}
