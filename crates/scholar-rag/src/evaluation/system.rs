//! End-to-end system evaluation: keyword relevance, answer quality, and
//! latency over a categorized question set

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::pipeline::RagPipeline;
use crate::types::QueryRequest;

/// Phrases that indicate an explanatory answer
const EXPLANATION_PHRASES: [&str; 4] = ["because", "therefore", "since", "due to"];
/// Phrases that indicate concrete examples
const EXAMPLE_PHRASES: [&str; 3] = ["example", "for instance", "such as"];

/// A categorized test question with expected keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemTestQuestion {
    pub question: String,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

impl SystemTestQuestion {
    fn new(question: &str, keywords: &[&str], category: &str) -> Self {
        Self {
            question: question.to_string(),
            expected_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            category: category.to_string(),
        }
    }
}

/// Default test questions for the evaluation corpus
pub fn default_test_questions() -> Vec<SystemTestQuestion> {
    vec![
        SystemTestQuestion::new(
            "What is an algorithm?",
            &["step-by-step", "procedure", "instructions", "solve", "problem"],
            "definitions",
        ),
        SystemTestQuestion::new(
            "What are the main properties of good algorithms?",
            &["correctness", "efficiency", "scalability", "performance"],
            "properties",
        ),
        SystemTestQuestion::new(
            "What is Big O notation?",
            &["complexity", "time", "space", "asymptotic", "growth"],
            "complexity",
        ),
        SystemTestQuestion::new(
            "What are common data structures in computer science?",
            &["arrays", "linked lists", "stacks", "queues", "trees", "graphs"],
            "data_structures",
        ),
        SystemTestQuestion::new(
            "What is time complexity?",
            &["runtime", "input size", "growth", "performance"],
            "complexity",
        ),
        SystemTestQuestion::new(
            "How do you analyze algorithm efficiency?",
            &["benchmarking", "profiling", "complexity analysis", "measurement"],
            "analysis",
        ),
        SystemTestQuestion::new(
            "What are the main programming paradigms?",
            &["imperative", "declarative", "object-oriented", "functional"],
            "paradigms",
        ),
        SystemTestQuestion::new(
            "What is computer architecture about?",
            &["CPU", "memory", "storage", "hardware", "organization"],
            "architecture",
        ),
    ]
}

/// Answer quality metrics, each normalized to [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Prefer longer answers, saturating at 200 characters
    pub length_score: f64,
    /// Full credit for explanatory phrasing, half otherwise
    pub has_explanation: f64,
    /// Full credit for concrete examples, half otherwise
    pub has_examples: f64,
    /// Prefer detailed answers, saturating at 50 words
    pub completeness: f64,
}

impl QualityMetrics {
    /// Mean of the individual metrics
    pub fn overall(&self) -> f64 {
        (self.length_score + self.has_explanation + self.has_examples + self.completeness) / 4.0
    }
}

/// Result for a single evaluated question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemQuestionResult {
    pub question: String,
    pub category: String,
    pub answer_preview: String,
    pub keyword_score: f64,
    pub quality_metrics: QualityMetrics,
    pub overall_quality: f64,
    pub num_sources: usize,
    pub has_sources: bool,
    pub response_time_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-category aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySummary {
    pub questions: usize,
    pub avg_keyword_score: f64,
    pub avg_quality: f64,
}

/// Overall evaluation summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSummary {
    pub total_questions: usize,
    pub successful_queries: usize,
    pub avg_keyword_score: f64,
    pub avg_quality: f64,
    pub avg_response_time_secs: f64,
    pub questions_with_sources: usize,
}

/// Full system evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvalReport {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub results: Vec<SystemQuestionResult>,
    pub by_category: BTreeMap<String, CategorySummary>,
    pub summary: SystemSummary,
}

/// Runs the end-to-end system evaluation
pub struct SystemEvaluator<'a> {
    pipeline: &'a RagPipeline,
    test_questions: Vec<SystemTestQuestion>,
}

impl<'a> SystemEvaluator<'a> {
    /// Create an evaluator with the default question set
    pub fn new(pipeline: &'a RagPipeline) -> Self {
        Self {
            pipeline,
            test_questions: default_test_questions(),
        }
    }

    /// Load questions from a JSON file, falling back to the defaults
    pub fn with_questions_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match std::fs::read_to_string(path)
                .map_err(crate::error::Error::from)
                .and_then(|s| serde_json::from_str(&s).map_err(crate::error::Error::from))
            {
                Ok(questions) => self.test_questions = questions,
                Err(e) => tracing::warn!("Failed to load {}: {}, using defaults", path.display(), e),
            }
        }
        self
    }

    /// Replace the question set
    pub fn with_questions(mut self, questions: Vec<SystemTestQuestion>) -> Self {
        self.test_questions = questions;
        self
    }

    /// Evaluate every question and aggregate the results
    pub async fn run(&self) -> Result<SystemEvalReport> {
        let mut results = Vec::with_capacity(self.test_questions.len());

        for question in &self.test_questions {
            tracing::info!("Evaluating: {}", question.question);
            results.push(self.evaluate_question(question).await);
        }

        Ok(build_report(results))
    }

    /// Evaluate a single question; errors are recorded, not propagated
    async fn evaluate_question(&self, question: &SystemTestQuestion) -> SystemQuestionResult {
        let start = Instant::now();
        let request = QueryRequest::new(question.question.clone());

        match self.pipeline.query(&request).await {
            Ok(response) => {
                let response_time = start.elapsed().as_secs_f64();
                let keywords: Vec<&str> = question
                    .expected_keywords
                    .iter()
                    .map(|s| s.as_str())
                    .collect();

                let keyword_score = keyword_relevance_score(&response.answer, &keywords);
                let quality_metrics = answer_quality_score(&response.answer);
                let overall_quality = quality_metrics.overall();

                SystemQuestionResult {
                    question: question.question.clone(),
                    category: question.category.clone(),
                    answer_preview: crate::generation::truncate_snippet(&response.answer, 200),
                    keyword_score,
                    quality_metrics,
                    overall_quality,
                    num_sources: response.num_sources,
                    has_sources: response.num_sources > 0,
                    response_time_secs: response_time,
                    error: None,
                }
            }
            Err(e) => SystemQuestionResult {
                question: question.question.clone(),
                category: question.category.clone(),
                answer_preview: String::new(),
                keyword_score: 0.0,
                quality_metrics: answer_quality_score(""),
                overall_quality: 0.0,
                num_sources: 0,
                has_sources: false,
                response_time_secs: start.elapsed().as_secs_f64(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Fraction of expected keywords present in the answer
pub fn keyword_relevance_score(answer: &str, keywords: &[&str]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }

    let answer_lower = answer.to_lowercase();
    let found = keywords
        .iter()
        .filter(|keyword| answer_lower.contains(&keyword.to_lowercase()))
        .count();

    found as f64 / keywords.len() as f64
}

/// Heuristic answer quality metrics
pub fn answer_quality_score(answer: &str) -> QualityMetrics {
    let answer_lower = answer.to_lowercase();
    let word_count = answer.split_whitespace().count();

    QualityMetrics {
        length_score: (answer.len() as f64 / 200.0).min(1.0),
        has_explanation: if EXPLANATION_PHRASES.iter().any(|p| answer_lower.contains(p)) {
            1.0
        } else {
            0.5
        },
        has_examples: if EXAMPLE_PHRASES.iter().any(|p| answer_lower.contains(p)) {
            1.0
        } else {
            0.5
        },
        completeness: (word_count as f64 / 50.0).min(1.0),
    }
}

/// Aggregate per-question results into the final report
pub fn build_report(results: Vec<SystemQuestionResult>) -> SystemEvalReport {
    let total = results.len();
    let successful = results.iter().filter(|r| r.error.is_none()).count();

    let mut by_category: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();
    for result in &results {
        let entry = by_category.entry(result.category.clone()).or_default();
        entry.0 += 1;
        entry.1 += result.keyword_score;
        entry.2 += result.overall_quality;
    }

    let by_category = by_category
        .into_iter()
        .map(|(category, (count, keyword_sum, quality_sum))| {
            (
                category,
                CategorySummary {
                    questions: count,
                    avg_keyword_score: keyword_sum / count as f64,
                    avg_quality: quality_sum / count as f64,
                },
            )
        })
        .collect();

    let summary = SystemSummary {
        total_questions: total,
        successful_queries: successful,
        avg_keyword_score: mean(results.iter().map(|r| r.keyword_score)),
        avg_quality: mean(results.iter().map(|r| r.overall_quality)),
        avg_response_time_secs: mean(results.iter().map(|r| r.response_time_secs)),
        questions_with_sources: results.iter().filter(|r| r.has_sources).count(),
    };

    SystemEvalReport {
        timestamp: chrono::Utc::now(),
        results,
        by_category,
        summary,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_relevance_is_a_fraction() {
        let answer = "An algorithm is a step-by-step procedure to solve a problem.";
        let keywords = vec!["step-by-step", "procedure", "instructions", "solve", "problem"];
        let score = keyword_relevance_score(answer, &keywords);
        assert!((score - 0.8).abs() < 1e-9);

        assert_eq!(keyword_relevance_score(answer, &[]), 0.0);
    }

    #[test]
    fn quality_metrics_saturate() {
        let long_answer = "word ".repeat(100);
        let metrics = answer_quality_score(&long_answer);
        assert_eq!(metrics.length_score, 1.0);
        assert_eq!(metrics.completeness, 1.0);
        assert_eq!(metrics.has_explanation, 0.5);

        let explained = "Quicksort is fast because partitioning is linear, for instance on arrays.";
        let metrics = answer_quality_score(explained);
        assert_eq!(metrics.has_explanation, 1.0);
        assert_eq!(metrics.has_examples, 1.0);
    }

    #[test]
    fn overall_quality_is_mean_of_metrics() {
        let metrics = QualityMetrics {
            length_score: 1.0,
            has_explanation: 0.5,
            has_examples: 0.5,
            completeness: 1.0,
        };
        assert!((metrics.overall() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn report_aggregates_by_category() {
        let make = |category: &str, keyword: f64, quality: f64| SystemQuestionResult {
            question: "q".to_string(),
            category: category.to_string(),
            answer_preview: String::new(),
            keyword_score: keyword,
            quality_metrics: answer_quality_score(""),
            overall_quality: quality,
            num_sources: 2,
            has_sources: true,
            response_time_secs: 1.0,
            error: None,
        };

        let report = build_report(vec![
            make("complexity", 0.8, 0.9),
            make("complexity", 0.4, 0.5),
            make("definitions", 1.0, 1.0),
        ]);

        assert_eq!(report.summary.total_questions, 3);
        assert_eq!(report.summary.questions_with_sources, 3);
        assert_eq!(report.by_category.len(), 2);

        let complexity = &report.by_category["complexity"];
        assert_eq!(complexity.questions, 2);
        assert!((complexity.avg_keyword_score - 0.6).abs() < 1e-9);
        assert!((complexity.avg_quality - 0.7).abs() < 1e-9);
    }

    #[test]
    fn default_question_set_is_categorized() {
        let questions = default_test_questions();
        assert_eq!(questions.len(), 8);
        assert!(questions.iter().all(|q| !q.expected_keywords.is_empty()));
        assert!(questions.iter().any(|q| q.category == "complexity"));
    }
}
