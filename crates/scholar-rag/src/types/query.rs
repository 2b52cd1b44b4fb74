//! Query request types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::PromptStyle;
use crate::retrieval::SearchStrategy;

/// Query request for RAG search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default: 3, the evaluation winner)
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity threshold (0.0-1.0)
    #[serde(default)]
    pub similarity_threshold: f32,

    /// Retrieval strategy override
    #[serde(default)]
    pub strategy: Option<SearchStrategy>,

    /// Prompt style override
    #[serde(default)]
    pub prompt_style: Option<PromptStyle>,

    /// Filter by specific document IDs (optional)
    #[serde(default)]
    pub document_filter: Option<Vec<Uuid>>,

    /// Include raw chunks in response (default: false)
    #[serde(default)]
    pub include_chunks: bool,
}

fn default_top_k() -> usize {
    3
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            question: String::new(),
            top_k: 3,
            similarity_threshold: 0.0,
            strategy: None,
            prompt_style: None,
            document_filter: None,
            include_chunks: false,
        }
    }
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Set the retrieval strategy
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the prompt style
    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = Some(style);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_from_json() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "What is an algorithm?"}"#).unwrap();
        assert_eq!(request.top_k, 3);
        assert!(request.strategy.is_none());
        assert!(!request.include_chunks);
    }

    #[test]
    fn builder_overrides() {
        let request = QueryRequest::new("What is Big O notation?")
            .with_top_k(10)
            .with_strategy(SearchStrategy::Mmr {
                k: 5,
                fetch_k: 10,
                lambda: 0.5,
            });
        assert_eq!(request.top_k, 10);
        assert!(matches!(
            request.strategy,
            Some(SearchStrategy::Mmr { k: 5, .. })
        ));
    }
}
