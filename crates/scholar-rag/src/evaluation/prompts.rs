//! Prompt template evaluation: compares the prompt styles and selects
//! the best
//!
//! Answers are scored on a 0-10 heuristic. An out-of-corpus probe question
//! rewards honest "I don't know" answers and penalizes hallucination.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::PromptStyle;
use crate::pipeline::RagPipeline;
use crate::types::QueryRequest;

/// Phrases that count as admitting the answer is unknown
const UNKNOWN_PHRASES: [&str; 5] = [
    "don't know",
    "do not know",
    "cannot",
    "not contain",
    "don't have",
];

/// A test query with expected answer qualities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTestQuery {
    pub query: String,
    pub expected_qualities: Vec<String>,
    pub topic: String,
}

impl PromptTestQuery {
    fn new(query: &str, qualities: &[&str], topic: &str) -> Self {
        Self {
            query: query.to_string(),
            expected_qualities: qualities.iter().map(|s| s.to_string()).collect(),
            topic: topic.to_string(),
        }
    }

    /// True for the probe question whose answer is not in the corpus
    pub fn is_out_of_corpus(&self) -> bool {
        self.topic == "not_in_dataset"
    }
}

/// Default test queries, including the out-of-corpus probe
pub fn default_test_queries() -> Vec<PromptTestQuery> {
    vec![
        PromptTestQuery::new(
            "What is the Floyd-Warshall algorithm?",
            &["algorithm_name", "purpose", "complexity"],
            "algorithms",
        ),
        PromptTestQuery::new(
            "Explain dynamic programming",
            &["definition", "approach", "examples"],
            "algorithms",
        ),
        PromptTestQuery::new(
            "How does gradient descent work?",
            &["process", "optimization", "mathematical"],
            "machine_learning",
        ),
        PromptTestQuery::new(
            "What is cryptography?",
            &["definition", "purpose", "techniques"],
            "cryptography",
        ),
        PromptTestQuery::new(
            "What is reinforcement learning?",
            &["honest_unknown"],
            "not_in_dataset",
        ),
    ]
}

/// Per-query evaluation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptQueryResult {
    pub query: String,
    pub answer_preview: String,
    pub word_count: usize,
    pub has_unknown_admission: bool,
    pub quality_score: f64,
    pub sources_count: usize,
}

/// Aggregate metrics for one prompt style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetrics {
    pub average_quality_score: f64,
    pub average_word_count: f64,
    pub total_queries: usize,
}

/// Evaluation result for one prompt style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResult {
    pub prompt_key: String,
    pub prompt_name: String,
    pub query_results: Vec<PromptQueryResult>,
    pub overall_metrics: PromptMetrics,
}

/// Full prompt evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEvalReport {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub prompt_evaluations: Vec<PromptResult>,
    pub best_prompt: String,
    pub best_prompt_key: String,
    pub best_score: f64,
}

/// Evaluates prompt styles against answer-quality heuristics
pub struct PromptEvaluator<'a> {
    pipeline: &'a RagPipeline,
    test_queries: Vec<PromptTestQuery>,
    /// Chunks retrieved per query during evaluation
    top_k: usize,
}

impl<'a> PromptEvaluator<'a> {
    /// Create an evaluator with the default test queries and k=3 retrieval
    pub fn new(pipeline: &'a RagPipeline) -> Self {
        Self {
            pipeline,
            test_queries: default_test_queries(),
            top_k: 3,
        }
    }

    /// Replace the test query set
    pub fn with_queries(mut self, queries: Vec<PromptTestQuery>) -> Self {
        self.test_queries = queries;
        self
    }

    /// Evaluate every prompt style and select the best one
    pub async fn run(&self) -> Result<PromptEvalReport> {
        let mut prompt_evaluations = Vec::new();

        for style in PromptStyle::ALL {
            tracing::info!("Evaluating prompt: {}", style.display_name());
            prompt_evaluations.push(self.evaluate_style(style).await?);
        }

        Ok(select_best_prompt(prompt_evaluations))
    }

    /// Evaluate a single prompt style over the test queries
    pub async fn evaluate_style(&self, style: PromptStyle) -> Result<PromptResult> {
        let mut query_results = Vec::with_capacity(self.test_queries.len());
        let mut total_score = 0.0;

        for test_query in &self.test_queries {
            let request = QueryRequest::new(test_query.query.clone())
                .with_top_k(self.top_k)
                .with_prompt_style(style);

            let response = self.pipeline.query(&request).await?;
            let score = score_answer(&response.answer, test_query);
            total_score += score;

            let word_count = response.answer.split_whitespace().count();
            query_results.push(PromptQueryResult {
                query: test_query.query.clone(),
                answer_preview: crate::generation::truncate_snippet(&response.answer, 200),
                word_count,
                has_unknown_admission: has_unknown_admission(&response.answer),
                quality_score: score,
                sources_count: response.num_sources,
            });

            tracing::info!(
                "  \"{}\": {:.2}/10 ({} words, {} sources)",
                test_query.query,
                score,
                word_count,
                response.num_sources
            );
        }

        let count = self.test_queries.len().max(1);
        let average_quality_score = total_score / count as f64;
        let average_word_count =
            query_results.iter().map(|r| r.word_count).sum::<usize>() as f64 / count as f64;

        Ok(PromptResult {
            prompt_key: style.key().to_string(),
            prompt_name: style.display_name().to_string(),
            overall_metrics: PromptMetrics {
                average_quality_score,
                average_word_count,
                total_queries: self.test_queries.len(),
            },
            query_results,
        })
    }
}

/// Check whether the answer admits not knowing
pub fn has_unknown_admission(answer: &str) -> bool {
    let answer_lower = answer.to_lowercase();
    UNKNOWN_PHRASES
        .iter()
        .any(|phrase| answer_lower.contains(phrase))
}

/// Score an answer on a 0-10 scale
///
/// Starts at 5.0. For the out-of-corpus probe an honest admission earns +5
/// and anything else -3. Otherwise: +2 when an algorithm-related quality is
/// expected and algorithm terms appear, +1.5 for sufficient detail when a
/// definition is expected, +1 for example phrases when examples are
/// expected, +1 for multi-sentence structure, -2 for answers under 20
/// words, +0.5 for answers over 100 words. Clamped to [0, 10].
pub fn score_answer(answer: &str, test_query: &PromptTestQuery) -> f64 {
    let mut score: f64 = 5.0;
    let answer_lower = answer.to_lowercase();
    let word_count = answer.split_whitespace().count();

    if test_query.is_out_of_corpus() {
        if has_unknown_admission(answer) {
            score += 5.0;
        } else {
            score -= 3.0;
        }
        return score.clamp(0.0, 10.0);
    }

    let expects = |needle: &str| {
        test_query
            .expected_qualities
            .iter()
            .any(|q| q.contains(needle))
    };

    if expects("algorithm")
        && ["algorithm", "complexity", "time"]
            .iter()
            .any(|w| answer_lower.contains(w))
    {
        score += 2.0;
    }

    if expects("definition") && word_count > 30 {
        score += 1.5;
    }

    if expects("examples")
        && ["example", "such as", "like", "for instance"]
            .iter()
            .any(|phrase| answer_lower.contains(phrase))
    {
        score += 1.0;
    }

    // Structure and clarity: multiple sentences
    if answer.split('.').count() >= 3 {
        score += 1.0;
    }

    // Likely incomplete
    if word_count < 20 {
        score -= 2.0;
    }

    // Detailed technical content
    if word_count > 100 {
        score += 0.5;
    }

    score.clamp(0.0, 10.0)
}

/// Rank prompt styles by average quality score and build the final report
pub fn select_best_prompt(prompt_evaluations: Vec<PromptResult>) -> PromptEvalReport {
    let best = prompt_evaluations
        .iter()
        .max_by(|a, b| {
            a.overall_metrics
                .average_quality_score
                .partial_cmp(&b.overall_metrics.average_quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|p| {
            (
                p.prompt_name.clone(),
                p.prompt_key.clone(),
                p.overall_metrics.average_quality_score,
            )
        })
        .unwrap_or_else(|| ("none".to_string(), "none".to_string(), 0.0));

    PromptEvalReport {
        timestamp: chrono::Utc::now(),
        prompt_evaluations,
        best_prompt: best.0,
        best_prompt_key: best.1,
        best_score: best.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn algo_query() -> PromptTestQuery {
        PromptTestQuery::new(
            "What is the Floyd-Warshall algorithm?",
            &["algorithm_name", "purpose", "complexity"],
            "algorithms",
        )
    }

    fn probe_query() -> PromptTestQuery {
        PromptTestQuery::new(
            "What is reinforcement learning?",
            &["honest_unknown"],
            "not_in_dataset",
        )
    }

    #[test]
    fn honest_unknown_scores_perfect_on_probe() {
        let answer = "I don't know based on the provided context.";
        let score = score_answer(answer, &probe_query());
        assert!((score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn hallucination_is_penalized_on_probe() {
        let answer = "Reinforcement learning is a paradigm where agents maximize reward.";
        let score = score_answer(answer, &probe_query());
        assert!((score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn detailed_algorithm_answer_scores_high() {
        let answer = "The Floyd-Warshall algorithm computes all-pairs shortest paths. \
                      It runs in cubic time complexity over the vertex count. \
                      It is a classic dynamic programming algorithm used in routing. \
                      Each iteration relaxes paths through an intermediate vertex.";
        let score = score_answer(answer, &algo_query());
        // base 5 + algorithm terms 2 + multi-sentence 1 = 8
        assert!((score - 8.0).abs() < 1e-9);
    }

    #[test]
    fn short_answer_is_penalized() {
        let answer = "It finds shortest paths.";
        let score = score_answer(answer, &algo_query());
        // base 5 + algorithm? no ("paths" only)... "It finds shortest paths."
        // has no algorithm/complexity/time term, single sentence, <20 words
        assert!((score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_clamped() {
        let long_answer = "algorithm complexity time. ".repeat(40);
        let query = PromptTestQuery::new(
            "q",
            &["algorithm_name", "definition", "examples"],
            "algorithms",
        );
        // Would exceed 10 without clamping; "like" never appears so the
        // examples bonus depends on the text, keep it simple and just
        // assert the bound.
        let score = score_answer(&long_answer, &query);
        assert!(score <= 10.0);
        assert!(score >= 0.0);
    }

    #[test]
    fn unknown_admission_detection() {
        assert!(has_unknown_admission("The context does not contain this."));
        assert!(has_unknown_admission("I don't know."));
        assert!(!has_unknown_admission("Quicksort is a sorting algorithm."));
    }

    #[test]
    fn best_prompt_selection() {
        let make = |key: &str, name: &str, score: f64| PromptResult {
            prompt_key: key.to_string(),
            prompt_name: name.to_string(),
            query_results: Vec::new(),
            overall_metrics: PromptMetrics {
                average_quality_score: score,
                average_word_count: 0.0,
                total_queries: 0,
            },
        };

        let report = select_best_prompt(vec![
            make("detailed", "Detailed Context-Based", 7.1),
            make("expert", "Expert Technical Style", 8.0),
            make("concise", "Concise Direct", 6.4),
        ]);

        assert_eq!(report.best_prompt_key, "expert");
        assert!((report.best_score - 8.0).abs() < 1e-9);
    }
}
