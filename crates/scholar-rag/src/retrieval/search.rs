//! Search strategy selection and execution
//!
//! Two strategy families are supported: plain similarity search, and maximal
//! marginal relevance (MMR), which re-ranks a larger candidate pool to trade
//! relevance against diversity.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorSearchResult, VectorStoreProvider};

/// Retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Top-k semantic similarity search
    Similarity {
        /// Number of chunks to retrieve
        k: usize,
    },
    /// Maximal marginal relevance: fetch a candidate pool, then re-rank
    /// balancing query relevance against inter-result diversity
    Mmr {
        /// Number of chunks to return
        k: usize,
        /// Candidate pool size (default 2k)
        fetch_k: usize,
        /// Relevance/diversity trade-off in [0, 1]; 1.0 is pure relevance
        lambda: f32,
    },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Similarity { k: 3 }
    }
}

impl SearchStrategy {
    /// Similarity search with the given k
    pub fn similarity(k: usize) -> Self {
        Self::Similarity { k }
    }

    /// MMR with the given k and the default pool size and lambda
    pub fn mmr(k: usize) -> Self {
        Self::Mmr {
            k,
            fetch_k: k * 2,
            lambda: 0.5,
        }
    }

    /// Number of results this strategy returns
    pub fn k(&self) -> usize {
        match self {
            Self::Similarity { k } => *k,
            Self::Mmr { k, .. } => *k,
        }
    }

    /// Human-readable label for evaluation reports
    pub fn label(&self) -> String {
        match self {
            Self::Similarity { k } => format!("Semantic Search (k={})", k),
            Self::Mmr { k, .. } => format!("MMR Search (k={})", k),
        }
    }
}

/// Executes retrieval strategies against the vector store
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve chunks for a question using the given strategy
    pub async fn retrieve(
        &self,
        question: &str,
        strategy: SearchStrategy,
        similarity_threshold: f32,
        document_filter: Option<&[Uuid]>,
    ) -> Result<Vec<VectorSearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;

        let mut results = match strategy {
            SearchStrategy::Similarity { k } => {
                self.store
                    .search(&query_embedding, k, false, document_filter)
                    .await?
            }
            SearchStrategy::Mmr { k, fetch_k, lambda } => {
                let candidates = self
                    .store
                    .search(&query_embedding, fetch_k.max(k), true, document_filter)
                    .await?;
                mmr_select(candidates, k, lambda)
            }
        };

        results.retain(|r| r.similarity >= similarity_threshold);
        results.truncate(strategy.k());

        Ok(results)
    }
}

/// Re-rank candidates by maximal marginal relevance
///
/// Greedily picks the candidate maximizing
/// `lambda * sim(query, c) - (1 - lambda) * max_selected sim(c, s)`,
/// where query similarity comes from the store's score and inter-candidate
/// similarity is cosine over the stored vectors.
pub fn mmr_select(
    mut candidates: Vec<VectorSearchResult>,
    k: usize,
    lambda: f32,
) -> Vec<VectorSearchResult> {
    let mut selected: Vec<VectorSearchResult> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !candidates.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in candidates.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| match (&candidate.vector, &s.vector) {
                    (Some(a), Some(b)) => cosine_similarity(a, b),
                    _ => 0.0,
                })
                .fold(0.0f32, f32::max);

            let score = lambda * candidate.similarity - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }

        selected.push(candidates.swap_remove(best_idx));
    }

    selected
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
