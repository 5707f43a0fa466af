//! Data models for goldrec-qe

pub mod feedback;
pub mod recipe;
pub mod user;

pub use feedback::{
    FeedbackSubmission, Metric, MetricsInput, QualityFeedbackRecord, QualityMetrics, TestResult,
    DEFAULT_FEEDBACK_SOURCE,
};
pub use recipe::{
    CertificationEvent, CertificationEventKind, CertificationStatus, QualityStats, QualityTrend,
    Recipe, ReviewerEntry, ReviewerStatus,
};
pub use user::{Role, User};
