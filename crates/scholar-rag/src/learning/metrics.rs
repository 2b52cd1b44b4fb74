//! Dashboard metrics computed from the feedback log
//!
//! These aggregates back the monitoring dashboard's charts: feedback
//! distribution and timeline, response-time histogram, daily query volume,
//! sources-retrieved distribution, answer-length stats, and hourly
//! activity.

use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feedback::{
    FeedbackEntry, FeedbackStats, FeedbackStore, FeedbackType, InteractionEntry, InteractionStats,
};

/// Number of buckets in the response-time histogram
const HISTOGRAM_BINS: usize = 20;

/// Daily feedback counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFeedback {
    pub date: NaiveDate,
    pub positive: usize,
    pub negative: usize,
}

/// Daily query count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// A histogram bucket over response times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub count: usize,
}

/// Answer length summary (in words)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerLengthStats {
    pub min: usize,
    pub mean: f64,
    pub max: usize,
}

/// All dashboard aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub feedback_stats: FeedbackStats,
    pub interaction_stats: InteractionStats,
    pub feedback_timeline: Vec<DailyFeedback>,
    pub query_volume: Vec<DailyCount>,
    pub response_time_histogram: Vec<HistogramBucket>,
    pub sources_distribution: BTreeMap<usize, usize>,
    pub answer_length: AnswerLengthStats,
    /// Query counts by hour of day (0-23)
    pub hourly_activity: Vec<usize>,
}

/// Compute dashboard metrics from the feedback store
pub fn compute_metrics(store: &FeedbackStore) -> DashboardMetrics {
    let feedback = store.all_feedback();
    let interactions = store.all_interactions();

    DashboardMetrics {
        feedback_stats: store.feedback_stats(),
        interaction_stats: store.interaction_stats(),
        feedback_timeline: feedback_timeline(&feedback),
        query_volume: query_volume(&interactions),
        response_time_histogram: response_time_histogram(&interactions),
        sources_distribution: sources_distribution(&interactions),
        answer_length: answer_length_stats(&interactions),
        hourly_activity: hourly_activity(&interactions),
    }
}

/// Daily positive/negative feedback counts, sorted by date
pub fn feedback_timeline(feedback: &[FeedbackEntry]) -> Vec<DailyFeedback> {
    let mut by_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for entry in feedback {
        let day = entry.timestamp.date_naive();
        let counts = by_day.entry(day).or_default();
        match entry.feedback {
            FeedbackType::Positive => counts.0 += 1,
            FeedbackType::Negative => counts.1 += 1,
        }
    }

    by_day
        .into_iter()
        .map(|(date, (positive, negative))| DailyFeedback {
            date,
            positive,
            negative,
        })
        .collect()
}

/// Daily query counts, sorted by date
pub fn query_volume(interactions: &[InteractionEntry]) -> Vec<DailyCount> {
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for entry in interactions {
        *by_day.entry(entry.timestamp.date_naive()).or_default() += 1;
    }

    by_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Response times bucketed into a fixed number of bins
pub fn response_time_histogram(interactions: &[InteractionEntry]) -> Vec<HistogramBucket> {
    if interactions.is_empty() {
        return Vec::new();
    }

    let times: Vec<f64> = interactions
        .iter()
        .map(|i| i.response_time_seconds)
        .collect();

    let min = times.iter().copied().fold(f64::MAX, f64::min);
    let max = times.iter().copied().fold(f64::MIN, f64::max);
    let span = (max - min).max(f64::EPSILON);
    let width = span / HISTOGRAM_BINS as f64;

    let mut buckets: Vec<HistogramBucket> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBucket {
            range_start: min + i as f64 * width,
            range_end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for time in times {
        let idx = (((time - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        buckets[idx].count += 1;
    }

    buckets
}

/// Distribution of sources-retrieved counts
pub fn sources_distribution(interactions: &[InteractionEntry]) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for entry in interactions {
        *distribution.entry(entry.sources_count).or_default() += 1;
    }
    distribution
}

/// Answer length summary over interactions
pub fn answer_length_stats(interactions: &[InteractionEntry]) -> AnswerLengthStats {
    if interactions.is_empty() {
        return AnswerLengthStats::default();
    }

    let lengths: Vec<usize> = interactions.iter().map(|i| i.answer_length).collect();
    let sum: usize = lengths.iter().sum();

    AnswerLengthStats {
        min: *lengths.iter().min().unwrap_or(&0),
        mean: sum as f64 / lengths.len() as f64,
        max: *lengths.iter().max().unwrap_or(&0),
    }
}

/// Query counts by hour of day
pub fn hourly_activity(interactions: &[InteractionEntry]) -> Vec<usize> {
    let mut hours = vec![0usize; 24];
    for entry in interactions {
        hours[entry.timestamp.hour() as usize] += 1;
    }
    hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn interaction(day: u32, hour: u32, time: f64, sources: usize, words: usize) -> InteractionEntry {
        InteractionEntry {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            question: "q".to_string(),
            question_length: 3,
            answer_length: words,
            sources_count: sources,
            response_time_seconds: time,
        }
    }

    fn feedback(day: u32, feedback: FeedbackType) -> FeedbackEntry {
        FeedbackEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            question: "q".to_string(),
            answer_preview: "a".to_string(),
            feedback,
            sources_count: 1,
            comment: None,
            answer_length: 10,
            interaction_id: None,
        }
    }

    #[test]
    fn timeline_groups_by_day() {
        let entries = vec![
            feedback(1, FeedbackType::Positive),
            feedback(1, FeedbackType::Negative),
            feedback(2, FeedbackType::Positive),
        ];

        let timeline = feedback_timeline(&entries);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].positive, 1);
        assert_eq!(timeline[0].negative, 1);
        assert_eq!(timeline[1].positive, 1);
        assert!(timeline[0].date < timeline[1].date);
    }

    #[test]
    fn query_volume_counts_per_day() {
        let interactions = vec![
            interaction(1, 9, 1.0, 3, 50),
            interaction(1, 10, 1.0, 3, 50),
            interaction(3, 9, 1.0, 3, 50),
        ];

        let volume = query_volume(&interactions);
        assert_eq!(volume.len(), 2);
        assert_eq!(volume[0].count, 2);
        assert_eq!(volume[1].count, 1);
    }

    #[test]
    fn histogram_covers_all_samples() {
        let interactions: Vec<InteractionEntry> = (1..=10)
            .map(|i| interaction(1, 9, i as f64 * 0.5, 3, 50))
            .collect();

        let histogram = response_time_histogram(&interactions);
        assert_eq!(histogram.len(), 20);
        let total: usize = histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn histogram_empty_for_no_data() {
        assert!(response_time_histogram(&[]).is_empty());
    }

    #[test]
    fn sources_and_lengths_aggregate() {
        let interactions = vec![
            interaction(1, 9, 1.0, 3, 40),
            interaction(1, 9, 1.0, 3, 60),
            interaction(1, 9, 1.0, 5, 80),
        ];

        let distribution = sources_distribution(&interactions);
        assert_eq!(distribution[&3], 2);
        assert_eq!(distribution[&5], 1);

        let lengths = answer_length_stats(&interactions);
        assert_eq!(lengths.min, 40);
        assert_eq!(lengths.max, 80);
        assert!((lengths.mean - 60.0).abs() < 1e-9);
    }

    #[test]
    fn hourly_activity_buckets() {
        let interactions = vec![
            interaction(1, 9, 1.0, 3, 50),
            interaction(2, 9, 1.0, 3, 50),
            interaction(1, 23, 1.0, 3, 50),
        ];

        let hours = hourly_activity(&interactions);
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[9], 2);
        assert_eq!(hours[23], 1);
        assert_eq!(hours[0], 0);
    }
}
