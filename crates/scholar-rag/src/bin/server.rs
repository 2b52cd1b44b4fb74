//! RAG server binary
//!
//! Run with: cargo run -p scholar-rag --bin scholar-rag-server

use scholar_rag::providers::{EmbeddingProvider, VectorStoreProvider};
use scholar_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholar_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env();
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.gemini.embed_model);
    tracing::info!("  - Generation model: {}", config.gemini.generate_model);
    tracing::info!("  - Qdrant: {} (collection '{}')", config.qdrant.url, config.qdrant.collection);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;

    // Probe external services before taking traffic
    let state = server.state();
    match state.pipeline().store().health_check().await {
        Ok(true) => tracing::info!("Qdrant is reachable"),
        _ => tracing::warn!("Qdrant is not reachable - start it with: docker run -p 6333:6333 qdrant/qdrant"),
    }
    match state.pipeline().embedder().health_check().await {
        Ok(true) => tracing::info!("Gemini API is reachable"),
        _ => tracing::warn!("Gemini API is not reachable - check GOOGLE_API_KEY"),
    }

    // Populate the collection from the data directory when empty
    if let Err(e) = state.initialize(false).await {
        tracing::warn!("Initialization incomplete: {}", e);
        state.set_ready(true);
    }

    println!("\nServer starting...");
    println!("  API:    http://{}/api", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ingest    - Upload documents");
    println!("  POST /api/query     - Ask questions");
    println!("  POST /api/feedback  - Rate answers");
    println!("  GET  /api/metrics   - Dashboard metrics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
