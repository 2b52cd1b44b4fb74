//! RAG pipeline orchestration: index management, ingestion, and querying

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::ingestion::{IngestPipeline, ParsedDocument};
use crate::providers::{
    gemini, EmbeddingProvider, LlmProvider, QdrantStore, VectorStoreProvider,
};
use crate::retrieval::{Retriever, SearchStrategy};
use crate::types::{Chunk, CollectionStats, Document, QueryRequest, QueryResponse, SourceRef};

/// The RAG pipeline: load → chunk → embed → store → retrieve → prompt → generate
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStoreProvider>,
    retriever: Retriever,
    ingest: IngestPipeline,
}

impl RagPipeline {
    /// Create a pipeline with injected providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&store));
        let ingest = IngestPipeline::new(
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )
        .with_min_size(config.chunking.min_chunk_size);

        Self {
            config,
            embedder,
            llm,
            store,
            retriever,
            ingest,
        }
    }

    /// Create a pipeline backed by Gemini and Qdrant from configuration
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;

        let (embedder, llm) = gemini::build_providers(&config.gemini, config.qdrant.dimensions)?;
        let store = QdrantStore::new(&config.qdrant)?;

        Ok(Self::new(
            config,
            Arc::new(embedder),
            Arc::new(llm),
            Arc::new(store),
        ))
    }

    /// Pipeline configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Vector store provider
    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Retriever
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Ingestion pipeline
    pub fn ingest_pipeline(&self) -> &IngestPipeline {
        &self.ingest
    }

    /// Initialize the vector collection
    ///
    /// Ensures the collection exists; when it is empty (or `force_recreate`
    /// is set, which drops it first) the data directory is ingested. Returns
    /// the documents ingested during initialization.
    pub async fn initialize(&self, force_recreate: bool) -> Result<Vec<Document>> {
        if force_recreate {
            self.store.reset().await?;
        } else {
            self.store.ensure_collection().await?;
        }

        let count = self.store.count().await?;
        if count > 0 {
            tracing::info!("Collection already holds {} chunks", count);
            return Ok(Vec::new());
        }

        let data_dir = self.config.storage.data_dir.clone();
        tracing::info!("Collection empty, ingesting {}", data_dir.display());

        let results = self.ingest.process_directory(&data_dir);
        if results.is_empty() {
            tracing::warn!("No documents available to populate the collection");
            return Ok(Vec::new());
        }

        let mut documents = Vec::with_capacity(results.len());
        for (doc, chunks) in results {
            self.index_chunks(chunks).await?;
            documents.push(doc);
        }

        tracing::info!("Ingested {} documents at initialization", documents.len());
        Ok(documents)
    }

    /// Parse, chunk, embed, and index a single uploaded file
    pub async fn ingest_file(&self, filename: &str, data: &[u8]) -> Result<(Document, u32)> {
        let parsed = self.ingest.parse_file(filename, data)?;
        self.ingest_parsed(filename, data.len() as u64, &parsed).await
    }

    /// Chunk, embed, and index an already-parsed file
    pub async fn ingest_parsed(
        &self,
        filename: &str,
        file_size: u64,
        parsed: &ParsedDocument,
    ) -> Result<(Document, u32)> {
        let mut doc = Document::new(
            filename.to_string(),
            parsed.file_type.clone(),
            parsed.content_hash.clone(),
            file_size,
        );
        doc.total_pages = parsed.total_pages;

        let chunks = self.ingest.create_chunks(&doc, parsed);
        let chunk_count = chunks.len() as u32;
        doc.total_chunks = chunk_count;

        self.index_chunks(chunks).await?;

        tracing::info!(
            "Ingested '{}': {} pages, {} chunks",
            filename,
            doc.total_pages.unwrap_or(1),
            chunk_count
        );

        Ok((doc, chunk_count))
    }

    /// Embed chunks and upsert them into the vector store
    ///
    /// Embeddings are generated through the provider's batch API and points
    /// are upserted in groups sized to stay under the provider batch limit.
    pub async fn index_chunks(&self, mut chunks: Vec<Chunk>) -> Result<u32> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch_size = self.config.qdrant.upsert_batch_size.max(1);
        let mut indexed = 0u32;

        for batch in chunks.chunks_mut(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }

            self.store.upsert_chunks(batch).await?;
            indexed += batch.len() as u32;
            tracing::debug!("Indexed {} chunks so far", indexed);
        }

        Ok(indexed)
    }

    /// Resolve the effective strategy for a request
    fn resolve_strategy(&self, request: &QueryRequest) -> SearchStrategy {
        if let Some(strategy) = request.strategy {
            return strategy;
        }

        match self.config.retrieval.strategy {
            SearchStrategy::Similarity { .. } => SearchStrategy::similarity(request.top_k),
            SearchStrategy::Mmr { lambda, .. } => SearchStrategy::Mmr {
                k: request.top_k,
                fetch_k: request.top_k * 2,
                lambda,
            },
        }
    }

    /// Answer a question with retrieved context and source references
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let start = Instant::now();

        let strategy = self.resolve_strategy(request);
        let threshold = if request.similarity_threshold > 0.0 {
            request.similarity_threshold
        } else {
            self.config.retrieval.similarity_threshold
        };

        tracing::info!("Query ({}): \"{}\"", strategy.label(), request.question);

        let results = self
            .retriever
            .retrieve(
                &request.question,
                strategy,
                threshold,
                request.document_filter.as_deref(),
            )
            .await?;

        if results.is_empty() {
            let elapsed = start.elapsed().as_millis() as u64;
            return Ok(QueryResponse::not_found(request.question.clone(), elapsed));
        }

        let style = request
            .prompt_style
            .unwrap_or(self.config.generation.prompt_style);
        let prompt = PromptBuilder::build(style, &request.question, &results);

        let answer = self.llm.generate(&prompt).await?;

        let terms: Vec<&str> = request.question.split_whitespace().collect();
        let sources: Vec<SourceRef> = results
            .iter()
            .map(|r| {
                let mut source = SourceRef::from_chunk(
                    &r.chunk,
                    r.similarity,
                    self.config.generation.snippet_max_len,
                );
                source.highlight_terms(&terms);
                source
            })
            .collect();

        let elapsed = start.elapsed().as_millis() as u64;
        let mut response =
            QueryResponse::new(request.question.clone(), answer, sources, elapsed);

        if request.include_chunks {
            response.raw_chunks = Some(results.into_iter().map(|r| r.chunk).collect());
        }

        tracing::info!(
            "Query answered in {}ms with {} sources",
            elapsed,
            response.num_sources
        );

        Ok(response)
    }

    /// Statistics about the current collection
    pub async fn stats(&self, total_documents: usize) -> Result<CollectionStats> {
        let total_chunks = self.store.count().await?;

        Ok(CollectionStats {
            status: "active".to_string(),
            collection_name: self.config.qdrant.collection.clone(),
            total_chunks,
            total_documents,
            qdrant_url: self.config.qdrant.url.clone(),
        })
    }

    /// Run a question list through the pipeline and summarize the outcome
    ///
    /// Per-question errors are captured in the result rather than aborting
    /// the run.
    pub async fn simple_evaluation(&self, questions: &[String]) -> SimpleEvaluation {
        let mut results = Vec::with_capacity(questions.len());

        for question in questions {
            tracing::info!("Evaluating question: {}", question);
            let request = QueryRequest::new(question.clone());

            let response = match self.query(&request).await {
                Ok(response) => response,
                Err(e) => QueryResponse::from_error(question.clone(), e.to_string(), 0),
            };
            results.push(response);
        }

        SimpleEvaluation::from_results(results)
    }
}

/// Summary of a simple evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleEvaluation {
    pub total_questions: usize,
    pub successful_queries: usize,
    pub success_rate: f64,
    pub average_sources_retrieved: f64,
    pub results: Vec<QueryResponse>,
}

impl SimpleEvaluation {
    /// Aggregate per-question results
    pub fn from_results(results: Vec<QueryResponse>) -> Self {
        let total_questions = results.len();
        let successful_queries = results.iter().filter(|r| r.error.is_none()).count();
        let total_sources: usize = results.iter().map(|r| r.num_sources).sum();

        Self {
            total_questions,
            successful_queries,
            success_rate: if total_questions > 0 {
                successful_queries as f64 / total_questions as f64
            } else {
                0.0
            },
            average_sources_retrieved: if total_questions > 0 {
                total_sources as f64 / total_questions as f64
            } else {
                0.0
            },
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use crate::retrieval::cosine_similarity;
    use crate::types::{ChunkSource, FileType};

    /// Text containing "algorithm" embeds along one axis, everything else
    /// along another; queries rank accordingly.
    fn embedding_for(text: &str) -> Vec<f32> {
        if text.to_lowercase().contains("algorithm") {
            vec![1.0, 0.0, 0.0]
        } else {
            vec![0.0, 1.0, 0.0]
        }
    }

    struct MockEmbedder;

    #[async_trait]
    impl crate::providers::EmbeddingProvider for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(embedding_for(text))
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock-embedder"
        }
    }

    #[derive(Default)]
    struct MockLlm {
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl crate::providers::LlmProvider for MockLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock() = Some(prompt.to_string());
            Ok("An algorithm is a finite procedure for solving a problem.".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock-llm"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[derive(Default)]
    struct MockStore {
        chunks: parking_lot::RwLock<Vec<Chunk>>,
    }

    #[async_trait]
    impl crate::providers::VectorStoreProvider for MockStore {
        async fn ensure_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn collection_exists(&self) -> Result<bool> {
            Ok(true)
        }

        async fn reset(&self) -> Result<()> {
            self.chunks.write().clear();
            Ok(())
        }

        async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
            self.chunks.write().extend_from_slice(chunks);
            Ok(())
        }

        async fn search(
            &self,
            query_embedding: &[f32],
            limit: usize,
            with_vectors: bool,
            _document_filter: Option<&[Uuid]>,
        ) -> Result<Vec<crate::providers::VectorSearchResult>> {
            let mut results: Vec<crate::providers::VectorSearchResult> = self
                .chunks
                .read()
                .iter()
                .map(|chunk| crate::providers::VectorSearchResult {
                    similarity: cosine_similarity(query_embedding, &chunk.embedding),
                    vector: with_vectors.then(|| chunk.embedding.clone()),
                    chunk: chunk.clone(),
                })
                .collect();

            results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
            results.truncate(limit);
            Ok(results)
        }

        async fn delete_by_document(&self, document_id: &Uuid) -> Result<()> {
            self.chunks.write().retain(|c| &c.document_id != document_id);
            Ok(())
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.chunks.read().len())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "mock-store"
        }
    }

    fn mock_pipeline() -> (RagPipeline, Arc<MockLlm>, Arc<MockStore>) {
        let llm = Arc::new(MockLlm::default());
        let store = Arc::new(MockStore::default());
        let pipeline = RagPipeline::new(
            RagConfig::default(),
            Arc::new(MockEmbedder),
            Arc::clone(&llm) as Arc<dyn crate::providers::LlmProvider>,
            Arc::clone(&store) as Arc<dyn crate::providers::VectorStoreProvider>,
        );
        (pipeline, llm, store)
    }

    fn chunk(content: &str) -> Chunk {
        Chunk::new(
            Uuid::new_v4(),
            content.to_string(),
            ChunkSource::text("notes.txt".to_string(), FileType::Txt),
            0,
            content.len(),
            0,
        )
    }

    #[tokio::test]
    async fn query_returns_cited_answer() {
        let (pipeline, llm, store) = mock_pipeline();

        pipeline
            .index_chunks(vec![
                chunk("An algorithm is a step-by-step procedure."),
                chunk("Pasta should be cooked al dente."),
            ])
            .await
            .unwrap();
        assert_eq!(store.chunks.read().len(), 2);

        let request = QueryRequest::new("What is an algorithm?").with_top_k(1);
        let response = pipeline.query(&request).await.unwrap();

        assert!(response.answer.contains("algorithm"));
        assert_eq!(response.num_sources, 1);
        assert_eq!(response.sources[0].filename, "notes.txt");
        assert!(response.confidence > 0.9);

        // The rendered prompt embeds both the retrieved context and the question
        let prompt = llm.last_prompt.lock().clone().unwrap();
        assert!(prompt.contains("step-by-step procedure"));
        assert!(prompt.contains("What is an algorithm?"));
        assert!(!prompt.contains("al dente"));
    }

    #[test]
    fn query_with_empty_store_returns_not_found() {
        let (pipeline, _llm, _store) = mock_pipeline();

        let response = tokio_test::block_on(async {
            pipeline
                .query(&QueryRequest::new("What is an algorithm?"))
                .await
                .unwrap()
        });

        assert_eq!(response.num_sources, 0);
        assert!(response.answer.contains("couldn't find relevant information"));
    }

    #[tokio::test]
    async fn index_chunks_attaches_embeddings() {
        let (pipeline, _llm, store) = mock_pipeline();

        let indexed = pipeline
            .index_chunks(vec![chunk("algorithm analysis"), chunk("cooking")])
            .await
            .unwrap();

        assert_eq!(indexed, 2);
        for stored in store.chunks.read().iter() {
            assert_eq!(stored.embedding.len(), 3);
        }
    }

    #[test]
    fn simple_evaluation_aggregates() {
        let results = vec![
            QueryResponse::new("q1".to_string(), "a1".to_string(), Vec::new(), 10),
            QueryResponse::from_error("q2".to_string(), "boom".to_string(), 5),
        ];

        let eval = SimpleEvaluation::from_results(results);
        assert_eq!(eval.total_questions, 2);
        assert_eq!(eval.successful_queries, 1);
        assert!((eval.success_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_evaluation_is_zeroed() {
        let eval = SimpleEvaluation::from_results(Vec::new());
        assert_eq!(eval.total_questions, 0);
        assert_eq!(eval.success_rate, 0.0);
        assert_eq!(eval.average_sources_retrieved, 0.0);
    }
}
