//! Recipe record and its certification state
//!
//! Identity, name and parameters belong to the recipe repository. Everything
//! else (statistics snapshot, score, golden flag, reviewer list and audit
//! fields) is derived or written by the quality engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Manual certification state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

impl CertificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationStatus::None => "none",
            CertificationStatus::Pending => "pending",
            CertificationStatus::Approved => "approved",
            CertificationStatus::Rejected => "rejected",
        }
    }
}

/// Decision state of one reviewer entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewerStatus::Pending => "pending",
            ReviewerStatus::Approved => "approved",
            ReviewerStatus::Rejected => "rejected",
        }
    }
}

/// One assigned reviewer on a manual certification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerEntry {
    pub reviewer_id: String,
    pub status: ReviewerStatus,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Administrator who decided on this reviewer's behalf
    #[serde(default)]
    pub proxy_by: Option<String>,
}

impl ReviewerEntry {
    pub fn new(reviewer_id: impl Into<String>, assigned_at: DateTime<Utc>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            status: ReviewerStatus::Pending,
            assigned_at,
            reviewed_at: None,
            comment: None,
            rejection_reason: None,
            proxy_by: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewerStatus::Pending
    }

    pub fn is_proxied(&self) -> bool {
        self.proxy_by.is_some()
    }
}

/// Direction of recent yield relative to the preceding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTrend {
    Improving,
    Stable,
    Declining,
    /// Fewer than five records; no opinion
    InsufficientData,
}

impl QualityTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTrend::Improving => "improving",
            QualityTrend::Stable => "stable",
            QualityTrend::Declining => "declining",
            QualityTrend::InsufficientData => "insufficient-data",
        }
    }
}

/// Aggregated snapshot persisted on the recipe after each recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub total_executions: usize,
    pub avg_yield: f64,
    pub avg_efficiency: f64,
    pub avg_lifespan: f64,
    pub avg_cpk: f64,
    pub avg_defect_rate: f64,
    pub avg_stability_score: f64,
    /// Test date of the most recently appended record
    pub last_execution_date: Option<DateTime<Utc>>,
    pub quality_trend: QualityTrend,
}

/// Kind of certification audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationEventKind {
    AutoCertified,
    Requested,
    ReviewerApproved,
    ReviewerRejected,
    Certified,
    Rejected,
    Degraded,
}

/// Append-only audit entry on a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationEvent {
    pub kind: CertificationEventKind,
    /// User id, or `system` for automatic transitions
    pub actor: String,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default)]
    pub proxy_by: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}

impl CertificationEvent {
    pub fn new(kind: CertificationEventKind, actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            actor: actor.into(),
            reviewer_id: None,
            proxy_by: None,
            reason: None,
            comment: None,
            at,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_reviewer(mut self, reviewer_id: impl Into<String>, proxy_by: Option<String>) -> Self {
        self.reviewer_id = Some(reviewer_id.into());
        self.proxy_by = proxy_by;
        self
    }
}

/// A named production parameter set under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// Static manufacturing parameters, opaque to the engine
    #[serde(default)]
    pub parameters: serde_json::Value,

    #[serde(default)]
    pub quality_stats: Option<QualityStats>,
    #[serde(default)]
    pub golden_score: Option<f64>,
    #[serde(default)]
    pub is_golden: bool,

    #[serde(default)]
    pub certification_status: CertificationStatus,
    #[serde(default)]
    pub reviewers: Vec<ReviewerEntry>,
    #[serde(default)]
    pub certification_requested_by: Option<String>,
    #[serde(default)]
    pub certification_requested_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub certified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub certified_by: Option<String>,
    #[serde(default)]
    pub certification_reason: Option<String>,

    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_by: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,

    #[serde(default)]
    pub degraded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub degraded_reason: Option<String>,

    #[serde(default)]
    pub certification_history: Vec<CertificationEvent>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Fresh recipe: no feedback, no score, not golden
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parameters: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
            quality_stats: None,
            golden_score: None,
            is_golden: false,
            certification_status: CertificationStatus::None,
            reviewers: Vec::new(),
            certification_requested_by: None,
            certification_requested_at: None,
            certified_at: None,
            certified_by: None,
            certification_reason: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            degraded_at: None,
            degraded_reason: None,
            certification_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reviewer(&self, reviewer_id: &str) -> Option<&ReviewerEntry> {
        self.reviewers.iter().find(|r| r.reviewer_id == reviewer_id)
    }

    /// True when a reviewer list exists and every entry approved
    pub fn all_reviewers_approved(&self) -> bool {
        !self.reviewers.is_empty()
            && self
                .reviewers
                .iter()
                .all(|r| r.status == ReviewerStatus::Approved)
    }

    pub(crate) fn record(&mut self, event: CertificationEvent) {
        self.updated_at = event.at;
        self.certification_history.push(event);
    }
}
