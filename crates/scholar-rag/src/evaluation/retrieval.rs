//! Retrieval evaluation: compares retrieval approaches and selects the best
//!
//! Each approach runs the same test queries; retrieved chunks are scored
//! against expected-keyword lists. The combined score weighs precision at
//! 70% and keyword relevance at 30%.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::RagPipeline;
use crate::retrieval::SearchStrategy;

/// Weight of precision in the combined score
const PRECISION_WEIGHT: f64 = 0.7;
/// Weight of keyword relevance in the combined score
const KEYWORD_WEIGHT: f64 = 0.3;

/// A test query with expected retrieval characteristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTestQuery {
    pub query: String,
    pub expected_topic: String,
    pub expected_keywords: Vec<String>,
}

impl RetrievalTestQuery {
    fn new(query: &str, topic: &str, keywords: &[&str]) -> Self {
        Self {
            query: query.to_string(),
            expected_topic: topic.to_string(),
            expected_keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Default test queries for the evaluation corpus
pub fn default_test_queries() -> Vec<RetrievalTestQuery> {
    vec![
        RetrievalTestQuery::new(
            "What is the Floyd-Warshall algorithm?",
            "algorithms",
            &["floyd", "warshall", "shortest", "path", "dynamic"],
        ),
        RetrievalTestQuery::new(
            "Explain dynamic programming",
            "algorithms",
            &["dynamic", "programming", "optimization", "subproblem"],
        ),
        RetrievalTestQuery::new(
            "How does gradient descent work?",
            "machine learning",
            &["gradient", "descent", "optimization", "loss"],
        ),
        RetrievalTestQuery::new(
            "What is object-oriented programming?",
            "programming",
            &["object", "oriented", "class", "inheritance"],
        ),
        RetrievalTestQuery::new(
            "What are sorting algorithms?",
            "algorithms",
            &["sort", "algorithm", "complexity", "time"],
        ),
    ]
}

/// The approaches compared by the evaluation
pub fn default_approaches() -> Vec<SearchStrategy> {
    vec![
        SearchStrategy::similarity(3),
        SearchStrategy::similarity(5),
        SearchStrategy::similarity(10),
        SearchStrategy::mmr(5),
    ]
}

/// Per-query evaluation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvalResult {
    pub query: String,
    pub retrieved_count: usize,
    pub relevant_count: usize,
    pub precision: f64,
    pub avg_keyword_matches: f64,
}

/// Aggregate metrics for an approach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachMetrics {
    pub total_queries: usize,
    pub total_retrieved: usize,
    pub total_relevant: usize,
    pub overall_precision: f64,
    pub avg_keyword_score: f64,
}

/// Evaluation result for one retrieval approach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachResult {
    pub name: String,
    pub strategy: SearchStrategy,
    pub query_results: Vec<QueryEvalResult>,
    pub overall_metrics: ApproachMetrics,
    pub combined_score: f64,
}

/// Full retrieval evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalEvalReport {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub approaches: Vec<ApproachResult>,
    pub best_approach: String,
    pub best_score: f64,
}

/// Evaluates retrieval approaches against keyword expectations
pub struct RetrievalEvaluator<'a> {
    pipeline: &'a RagPipeline,
    test_queries: Vec<RetrievalTestQuery>,
}

impl<'a> RetrievalEvaluator<'a> {
    /// Create an evaluator with the default test queries
    pub fn new(pipeline: &'a RagPipeline) -> Self {
        Self {
            pipeline,
            test_queries: default_test_queries(),
        }
    }

    /// Replace the test query set
    pub fn with_queries(mut self, queries: Vec<RetrievalTestQuery>) -> Self {
        self.test_queries = queries;
        self
    }

    /// Evaluate all approaches and select the best one
    pub async fn run(&self) -> Result<RetrievalEvalReport> {
        let mut approaches = Vec::new();

        for strategy in default_approaches() {
            tracing::info!("Evaluating approach: {}", strategy.label());
            approaches.push(self.evaluate_approach(strategy).await?);
        }

        Ok(select_best_approach(approaches))
    }

    /// Evaluate a single retrieval approach over the test queries
    pub async fn evaluate_approach(&self, strategy: SearchStrategy) -> Result<ApproachResult> {
        let mut query_results = Vec::with_capacity(self.test_queries.len());
        let mut total_relevant = 0usize;
        let mut total_retrieved = 0usize;
        let mut keyword_scores = Vec::with_capacity(self.test_queries.len());

        for test_query in &self.test_queries {
            let results = self
                .pipeline
                .retriever()
                .retrieve(&test_query.query, strategy, 0.0, None)
                .await?;

            let contents: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
            let keywords: Vec<&str> = test_query
                .expected_keywords
                .iter()
                .map(|s| s.as_str())
                .collect();

            let (relevant_count, keyword_match_count) = score_retrieved(&contents, &keywords);

            let precision = if contents.is_empty() {
                0.0
            } else {
                relevant_count as f64 / contents.len() as f64
            };
            let avg_keyword_matches = if contents.is_empty() {
                0.0
            } else {
                keyword_match_count as f64 / contents.len() as f64
            };

            tracing::info!(
                "  \"{}\": {} retrieved, {} relevant, precision {:.2}",
                test_query.query,
                contents.len(),
                relevant_count,
                precision
            );

            total_relevant += relevant_count;
            total_retrieved += contents.len();
            keyword_scores.push(avg_keyword_matches);

            query_results.push(QueryEvalResult {
                query: test_query.query.clone(),
                retrieved_count: contents.len(),
                relevant_count,
                precision,
                avg_keyword_matches,
            });
        }

        let overall_precision = if total_retrieved > 0 {
            total_relevant as f64 / total_retrieved as f64
        } else {
            0.0
        };
        let avg_keyword_score = if keyword_scores.is_empty() {
            0.0
        } else {
            keyword_scores.iter().sum::<f64>() / keyword_scores.len() as f64
        };

        Ok(ApproachResult {
            name: strategy.label(),
            strategy,
            overall_metrics: ApproachMetrics {
                total_queries: self.test_queries.len(),
                total_retrieved,
                total_relevant,
                overall_precision,
                avg_keyword_score,
            },
            combined_score: combined_score(overall_precision, avg_keyword_score),
            query_results,
        })
    }
}

/// Score retrieved chunk contents against expected keywords
///
/// Returns (chunks containing at least one keyword, total keyword hits).
pub fn score_retrieved(contents: &[&str], keywords: &[&str]) -> (usize, usize) {
    let mut relevant_count = 0;
    let mut keyword_match_count = 0;

    for content in contents {
        let content_lower = content.to_lowercase();
        let matches = keywords
            .iter()
            .filter(|keyword| content_lower.contains(&keyword.to_lowercase()))
            .count();

        if matches > 0 {
            relevant_count += 1;
            keyword_match_count += matches;
        }
    }

    (relevant_count, keyword_match_count)
}

/// Combined score: 70% precision + 30% keyword relevance
pub fn combined_score(precision: f64, keyword_score: f64) -> f64 {
    precision * PRECISION_WEIGHT + keyword_score * KEYWORD_WEIGHT
}

/// Rank approaches by combined score and build the final report
pub fn select_best_approach(approaches: Vec<ApproachResult>) -> RetrievalEvalReport {
    let best = approaches
        .iter()
        .max_by(|a, b| {
            a.combined_score
                .partial_cmp(&b.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|a| (a.name.clone(), a.combined_score))
        .unwrap_or_else(|| ("none".to_string(), 0.0));

    RetrievalEvalReport {
        timestamp: chrono::Utc::now(),
        approaches,
        best_approach: best.0,
        best_score: best.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_keyword_hits_per_chunk() {
        let contents = vec![
            "The Floyd-Warshall algorithm computes shortest paths.",
            "Unrelated text about cooking pasta.",
            "Dynamic programming underlies Floyd-Warshall.",
        ];
        let keywords = vec!["floyd", "warshall", "shortest", "dynamic"];

        let (relevant, matches) = score_retrieved(&contents, &keywords);
        assert_eq!(relevant, 2);
        // chunk 1 hits floyd+warshall+shortest, chunk 3 hits floyd+warshall+dynamic
        assert_eq!(matches, 6);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(score_retrieved(&[], &["x"]), (0, 0));
        assert_eq!(score_retrieved(&["text"], &[]), (0, 0));
    }

    #[test]
    fn combined_score_weights() {
        assert!((combined_score(1.0, 0.0) - 0.7).abs() < 1e-9);
        assert!((combined_score(0.0, 1.0) - 0.3).abs() < 1e-9);
        assert!((combined_score(0.8, 2.0) - (0.56 + 0.6)).abs() < 1e-9);
    }

    #[test]
    fn best_approach_selection() {
        let make = |name: &str, score: f64| ApproachResult {
            name: name.to_string(),
            strategy: SearchStrategy::similarity(3),
            query_results: Vec::new(),
            overall_metrics: ApproachMetrics {
                total_queries: 0,
                total_retrieved: 0,
                total_relevant: 0,
                overall_precision: 0.0,
                avg_keyword_score: 0.0,
            },
            combined_score: score,
        };

        let report = select_best_approach(vec![
            make("Semantic Search (k=5)", 0.55),
            make("Semantic Search (k=3)", 0.72),
            make("MMR Search (k=5)", 0.61),
        ]);

        assert_eq!(report.best_approach, "Semantic Search (k=3)");
        assert!((report.best_score - 0.72).abs() < 1e-9);
        assert_eq!(report.approaches.len(), 3);
    }

    #[test]
    fn default_sets_match_evaluated_grid() {
        assert_eq!(default_test_queries().len(), 5);
        let approaches = default_approaches();
        assert_eq!(approaches.len(), 4);
        assert_eq!(approaches[0], SearchStrategy::similarity(3));
        assert_eq!(approaches[3].k(), 5);
    }
}
