//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::{AppState, FileStatus};
use crate::types::{DocumentSummary, IngestError, IngestResponse};

/// Upper bound for processing a single file
const FILE_TIMEOUT: Duration = Duration::from_secs(300);

/// POST /api/ingest - Upload and process files
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();
    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    let mut errors = Vec::new();
    let mut total_chunks = 0u32;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4()));

        let data = match field.bytes().await {
            Ok(d) => d,
            Err(e) => {
                errors.push(IngestError {
                    filename,
                    error: format!("Failed to read file: {}", e),
                });
                continue;
            }
        };

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());
        let file_start = Instant::now();

        let process_result = timeout(
            FILE_TIMEOUT,
            process_file_with_dedup(&state, &filename, &data),
        )
        .await;

        match process_result {
            Ok(Ok(ProcessResult::New(doc, chunk_count))) => {
                total_chunks += chunk_count;
                documents.push(DocumentSummary::from(&doc));
                state.add_document(doc);
                tracing::info!(
                    "Ingested new file: {} in {:.1}s",
                    filename,
                    file_start.elapsed().as_secs_f64()
                );
            }
            Ok(Ok(ProcessResult::Updated(doc, chunk_count))) => {
                total_chunks += chunk_count;
                documents.push(DocumentSummary::from(&doc));
                state.add_document(doc);
                tracing::info!(
                    "Updated file: {} ({} new chunks) in {:.1}s",
                    filename,
                    chunk_count,
                    file_start.elapsed().as_secs_f64()
                );
            }
            Ok(Ok(ProcessResult::Skipped(reason))) => {
                tracing::info!("Skipped file: {} ({})", filename, reason);
                skipped.push(format!("{}: {}", filename, reason));
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to process {}: {}", filename, e);
                errors.push(IngestError {
                    filename,
                    error: e.to_string(),
                });
            }
            Err(_) => {
                tracing::error!(
                    "Timeout processing '{}' after {:.1}s (size: {} bytes)",
                    filename,
                    file_start.elapsed().as_secs_f64(),
                    data.len()
                );
                errors.push(IngestError {
                    filename,
                    error: format!(
                        "Processing timeout after {}s - file may be too large or complex",
                        FILE_TIMEOUT.as_secs()
                    ),
                });
            }
        }
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;

    Ok(Json(IngestResponse {
        success: !documents.is_empty(),
        documents,
        skipped,
        total_chunks_created: total_chunks,
        processing_time_ms,
        errors,
    }))
}

/// Result of processing a file with deduplication
enum ProcessResult {
    /// New file, successfully processed
    New(crate::types::Document, u32),
    /// File was modified, old chunks replaced
    Updated(crate::types::Document, u32),
    /// File was skipped (unchanged or duplicate)
    Skipped(String),
}

/// Process a single file with deduplication check
async fn process_file_with_dedup(
    state: &AppState,
    filename: &str,
    data: &[u8],
) -> Result<ProcessResult> {
    // Parse first to get the content hash for dedup
    let parsed = state.pipeline().ingest_pipeline().parse_file(filename, data)?;

    match state.check_file_status(filename, &parsed.content_hash) {
        FileStatus::Unchanged(existing) => Ok(ProcessResult::Skipped(format!(
            "unchanged (hash: {}...)",
            &existing.content_hash[..existing.content_hash.len().min(12)]
        ))),
        FileStatus::Duplicate(existing) => Ok(ProcessResult::Skipped(format!(
            "duplicate of '{}'",
            existing.filename
        ))),
        FileStatus::Modified(existing) => {
            let deleted = state.delete_document_with_chunks(&existing.id).await?;
            tracing::info!(
                "File '{}' modified, removed previous version {}",
                filename,
                deleted.map(|d| d.id.to_string()).unwrap_or_default()
            );

            let (doc, chunk_count) = state
                .pipeline()
                .ingest_parsed(filename, data.len() as u64, &parsed)
                .await?;
            Ok(ProcessResult::Updated(doc, chunk_count))
        }
        FileStatus::New => {
            let (doc, chunk_count) = state
                .pipeline()
                .ingest_parsed(filename, data.len() as u64, &parsed)
                .await?;
            Ok(ProcessResult::New(doc, chunk_count))
        }
    }
}
