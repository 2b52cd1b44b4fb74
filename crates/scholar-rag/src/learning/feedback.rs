//! File-backed feedback and interaction log
//!
//! A single JSON document with `feedback` and `interactions` arrays,
//! appended on every write. The log is the data source for the monitoring
//! metrics.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::Result;
use crate::generation::truncate_snippet;

/// Type of feedback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    /// Answer was helpful
    Positive,
    /// Answer was not helpful
    Negative,
}

/// A user feedback record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    /// Truncated answer, enough for review without storing full generations
    pub answer_preview: String,
    pub feedback: FeedbackType,
    pub sources_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Answer length in words
    pub answer_length: usize,
    /// Interaction this feedback refers to, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<Uuid>,
}

/// A logged query interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    /// Question length in words
    pub question_length: usize,
    /// Answer length in words
    pub answer_length: usize,
    pub sources_count: usize,
    pub response_time_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FeedbackData {
    feedback: Vec<FeedbackEntry>,
    interactions: Vec<InteractionEntry>,
}

/// Statistics over feedback entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
}

/// Statistics over interaction entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionStats {
    pub total_queries: usize,
    pub avg_response_time: f64,
    pub avg_answer_length: f64,
    pub avg_sources_count: f64,
    pub max_response_time: f64,
    pub min_response_time: f64,
}

/// Manages storage and retrieval of user feedback
pub struct FeedbackStore {
    path: PathBuf,
    data: RwLock<FeedbackData>,
}

impl FeedbackStore {
    /// Open (or create) the feedback log at the given path
    pub fn new(path: PathBuf) -> Self {
        let data = Self::load(&path);
        Self {
            path,
            data: RwLock::new(data),
        }
    }

    fn load(path: &PathBuf) -> FeedbackData {
        if !path.exists() {
            return FeedbackData::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    FeedbackData::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                FeedbackData::default()
            }
        }
    }

    fn save(&self) -> Result<()> {
        let data = self.data.read();
        let json = serde_json::to_string_pretty(&*data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Add user feedback for a question-answer pair
    pub fn add_feedback(
        &self,
        question: &str,
        answer: &str,
        feedback: FeedbackType,
        sources_count: usize,
        comment: Option<String>,
        interaction_id: Option<Uuid>,
    ) -> Result<()> {
        let entry = FeedbackEntry {
            timestamp: Utc::now(),
            question: question.to_string(),
            answer_preview: truncate_snippet(answer, 200),
            feedback,
            sources_count,
            comment,
            answer_length: answer.split_whitespace().count(),
            interaction_id,
        };

        self.data.write().feedback.push(entry);
        self.save()
    }

    /// Log a query interaction, returning its ID for later feedback
    pub fn add_interaction(
        &self,
        question: &str,
        answer_length: usize,
        sources_count: usize,
        response_time_seconds: f64,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let entry = InteractionEntry {
            id,
            timestamp: Utc::now(),
            question: question.to_string(),
            question_length: question.split_whitespace().count(),
            answer_length,
            sources_count,
            response_time_seconds,
        };

        self.data.write().interactions.push(entry);
        self.save()?;
        Ok(id)
    }

    /// Look up a logged interaction by ID
    pub fn get_interaction(&self, id: &Uuid) -> Option<InteractionEntry> {
        self.data
            .read()
            .interactions
            .iter()
            .find(|i| &i.id == id)
            .cloned()
    }

    /// All feedback entries
    pub fn all_feedback(&self) -> Vec<FeedbackEntry> {
        self.data.read().feedback.clone()
    }

    /// All interaction entries
    pub fn all_interactions(&self) -> Vec<InteractionEntry> {
        self.data.read().interactions.clone()
    }

    /// Statistics over feedback entries
    pub fn feedback_stats(&self) -> FeedbackStats {
        let data = self.data.read();
        let total = data.feedback.len();

        if total == 0 {
            return FeedbackStats::default();
        }

        let positive = data
            .feedback
            .iter()
            .filter(|f| f.feedback == FeedbackType::Positive)
            .count();
        let negative = total - positive;

        FeedbackStats {
            total_feedback: total,
            positive_count: positive,
            negative_count: negative,
            positive_percentage: positive as f64 / total as f64 * 100.0,
            negative_percentage: negative as f64 / total as f64 * 100.0,
        }
    }

    /// Statistics over interaction entries
    pub fn interaction_stats(&self) -> InteractionStats {
        let data = self.data.read();
        let total = data.interactions.len();

        if total == 0 {
            return InteractionStats::default();
        }

        let times: Vec<f64> = data
            .interactions
            .iter()
            .map(|i| i.response_time_seconds)
            .collect();

        InteractionStats {
            total_queries: total,
            avg_response_time: times.iter().sum::<f64>() / total as f64,
            avg_answer_length: data.interactions.iter().map(|i| i.answer_length).sum::<usize>()
                as f64
                / total as f64,
            avg_sources_count: data.interactions.iter().map(|i| i.sources_count).sum::<usize>()
                as f64
                / total as f64,
            max_response_time: times.iter().copied().fold(f64::MIN, f64::max),
            min_response_time: times.iter().copied().fold(f64::MAX, f64::min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FeedbackStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback_data.json"));
        (dir, store)
    }

    #[test]
    fn feedback_stats_split() {
        let (_dir, store) = store();

        store
            .add_feedback("q1", "a1", FeedbackType::Positive, 3, None, None)
            .unwrap();
        store
            .add_feedback("q2", "a2", FeedbackType::Positive, 2, None, None)
            .unwrap();
        store
            .add_feedback(
                "q3",
                "a3",
                FeedbackType::Negative,
                1,
                Some("missed the point".to_string()),
                None,
            )
            .unwrap();

        let stats = store.feedback_stats();
        assert_eq!(stats.total_feedback, 3);
        assert_eq!(stats.positive_count, 2);
        assert_eq!(stats.negative_count, 1);
        assert!((stats.positive_percentage - 66.666).abs() < 0.01);
    }

    #[test]
    fn interaction_stats_aggregate() {
        let (_dir, store) = store();

        store.add_interaction("what is x", 40, 3, 1.5).unwrap();
        store.add_interaction("what is y", 60, 5, 2.5).unwrap();

        let stats = store.interaction_stats();
        assert_eq!(stats.total_queries, 2);
        assert!((stats.avg_response_time - 2.0).abs() < 1e-9);
        assert!((stats.avg_answer_length - 50.0).abs() < 1e-9);
        assert!((stats.avg_sources_count - 4.0).abs() < 1e-9);
        assert!((stats.max_response_time - 2.5).abs() < 1e-9);
        assert!((stats.min_response_time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_store_yields_zeroed_stats() {
        let (_dir, store) = store();
        assert_eq!(store.feedback_stats().total_feedback, 0);
        assert_eq!(store.interaction_stats().total_queries, 0);
    }

    #[test]
    fn log_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback_data.json");

        let store = FeedbackStore::new(path.clone());
        let id = store.add_interaction("persisted?", 10, 1, 0.2).unwrap();
        store
            .add_feedback("persisted?", "yes", FeedbackType::Positive, 1, None, Some(id))
            .unwrap();

        let reopened = FeedbackStore::new(path);
        assert_eq!(reopened.all_interactions().len(), 1);
        assert_eq!(reopened.all_feedback().len(), 1);
        assert_eq!(reopened.all_feedback()[0].interaction_id, Some(id));
        assert!(reopened.get_interaction(&id).is_some());
    }

    #[test]
    fn answer_preview_is_truncated() {
        let (_dir, store) = store();
        let long_answer = "word ".repeat(100);

        store
            .add_feedback("q", &long_answer, FeedbackType::Positive, 1, None, None)
            .unwrap();

        let feedback = store.all_feedback();
        assert!(feedback[0].answer_preview.len() <= 203);
        assert_eq!(feedback[0].answer_length, 100);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback_data.json");
        std::fs::write(&path, "not json{{").unwrap();

        let store = FeedbackStore::new(path);
        assert_eq!(store.all_feedback().len(), 0);
    }
}
