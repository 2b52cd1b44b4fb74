//! Feedback logging and the metrics behind the monitoring dashboard

pub mod feedback;
pub mod metrics;

pub use feedback::{
    FeedbackEntry, FeedbackStats, FeedbackStore, FeedbackType, InteractionEntry, InteractionStats,
};
pub use metrics::{compute_metrics, DashboardMetrics};
