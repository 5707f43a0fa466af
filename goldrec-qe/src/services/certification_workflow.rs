//! Manual certification workflow
//!
//! ```text
//! none ──certify(reviewers)──▶ pending ──all approved──▶ approved (golden)
//!   │                            └──any rejection───▶ rejected
//!   └──certify(no reviewers)──────────────────────────▶ approved (golden)
//!
//! degrade: golden flag cleared with a reason, status untouched
//! ```
//!
//! Quorum is unanimous. One rejection fails the round immediately.
//!
//! **Proxy assignment:** when the deciding user is not on the reviewer list
//! but holds the admin role, the decision lands on the first entry that is
//! still pending, and the entry records the admin's id in `proxy_by`.
//!
//! These functions mutate a recipe in memory only; the engine persists the
//! result while holding the recipe's lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{
    CertificationEvent, CertificationEventKind, CertificationStatus, Recipe, ReviewerEntry,
    ReviewerStatus, User,
};
use crate::services::errors::{EngineError, EngineResult};

/// `certify` input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationRequest {
    pub certified_by: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Empty list certifies immediately
    #[serde(default)]
    pub reviewers: Vec<String>,
}

/// `approve` input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

/// `reject` input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectionRequest {
    pub reason: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// `degrade` input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradeRequest {
    pub reason: String,
    #[serde(default)]
    pub degraded_by: Option<String>,
}

/// Entry a decision applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTarget {
    pub index: usize,
    pub reviewer_id: String,
    /// Set when an admin decides on behalf of `reviewer_id`
    pub proxy_by: Option<String>,
}

/// Result of `certify`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertifyOutcome {
    /// Reviewers assigned, awaiting decisions
    Pending,
    /// Self-certified without review
    Certified,
}

/// Result of a reviewer decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub target: ReviewTarget,
    pub decision: ReviewerStatus,
    /// Recipe status if this decision closed the round
    pub finalized: Option<CertificationStatus>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Open a manual certification, or certify directly when no reviewers are named
///
/// Reviewer ids are trimmed and de-duplicated in the given order. A new
/// request replaces the active reviewer list; earlier decisions stay in the
/// certification history. Opening a review clears the golden flag until the
/// reviewers decide.
pub fn certify(
    recipe: &mut Recipe,
    request: CertificationRequest,
    now: DateTime<Utc>,
) -> EngineResult<CertifyOutcome> {
    let certified_by = request.certified_by.trim().to_string();
    if certified_by.is_empty() {
        return Err(EngineError::InvalidInput(
            "certification requires certified_by".to_string(),
        ));
    }
    let reason = non_blank(request.reason);

    let mut reviewer_ids: Vec<String> = Vec::new();
    for id in request.reviewers {
        let id = id.trim().to_string();
        if !id.is_empty() && !reviewer_ids.contains(&id) {
            reviewer_ids.push(id);
        }
    }

    recipe.certification_requested_by = Some(certified_by.clone());
    recipe.certification_requested_at = Some(now);
    recipe.rejected_at = None;
    recipe.rejected_by = None;
    recipe.rejection_reason = None;

    if reviewer_ids.is_empty() {
        recipe.reviewers.clear();
        recipe.is_golden = true;
        recipe.certification_status = CertificationStatus::Approved;
        recipe.certified_at = Some(now);
        recipe.certified_by = Some(certified_by.clone());
        recipe.certification_reason = reason.clone();
        recipe.record(
            CertificationEvent::new(CertificationEventKind::Certified, &certified_by, now)
                .with_reason(reason),
        );
        info!(recipe_id = %recipe.id, certified_by = %certified_by, "Recipe self-certified");
        return Ok(CertifyOutcome::Certified);
    }

    recipe.reviewers = reviewer_ids
        .iter()
        .map(|id| ReviewerEntry::new(id.clone(), now))
        .collect();
    recipe.is_golden = false;
    recipe.certification_status = CertificationStatus::Pending;
    recipe.certification_reason = reason.clone();
    recipe.record(
        CertificationEvent::new(CertificationEventKind::Requested, &certified_by, now)
            .with_reason(reason),
    );
    info!(
        recipe_id = %recipe.id,
        requested_by = %certified_by,
        reviewers = ?reviewer_ids,
        "Manual certification requested"
    );
    Ok(CertifyOutcome::Pending)
}

/// Locate the entry a decision by `reviewer_id` applies to
///
/// `caller` is the identity-provider view of `reviewer_id`; it is consulted
/// only when the id is not on the reviewer list.
pub fn resolve_target(
    recipe: &Recipe,
    reviewer_id: &str,
    caller: Option<&User>,
) -> EngineResult<ReviewTarget> {
    if recipe.reviewers.is_empty() {
        return Err(EngineError::InvalidState(format!(
            "recipe {} needs no review: it has no reviewer list",
            recipe.id
        )));
    }

    let (index, proxy_by) = match recipe
        .reviewers
        .iter()
        .position(|r| r.reviewer_id == reviewer_id)
    {
        Some(index) => (index, None),
        None => {
            let is_admin = caller.map(|u| u.is_admin()).unwrap_or(false);
            if !is_admin {
                warn!(recipe_id = %recipe.id, reviewer_id, "Review refused: not an assigned reviewer");
                return Err(EngineError::InvalidState(format!(
                    "{} is not a reviewer of recipe {}",
                    reviewer_id, recipe.id
                )));
            }
            let index = recipe
                .reviewers
                .iter()
                .position(|r| r.is_pending())
                .ok_or_else(|| EngineError::Conflict {
                    recipe_id: recipe.id.clone(),
                    reviewer_id: reviewer_id.to_string(),
                    message: "found no pending reviewer entry to proxy".to_string(),
                })?;
            (index, Some(reviewer_id.to_string()))
        }
    };

    let entry = &recipe.reviewers[index];
    if !entry.is_pending() {
        return Err(EngineError::Conflict {
            recipe_id: recipe.id.clone(),
            reviewer_id: entry.reviewer_id.clone(),
            message: format!("already {}", entry.status.as_str()),
        });
    }

    Ok(ReviewTarget {
        index,
        reviewer_id: entry.reviewer_id.clone(),
        proxy_by,
    })
}

/// Record an approval; certifies the recipe once every entry approved
pub fn approve(
    recipe: &mut Recipe,
    target: ReviewTarget,
    request: ApprovalRequest,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let comment = non_blank(request.comment);
    let actor = target
        .proxy_by
        .clone()
        .unwrap_or_else(|| target.reviewer_id.clone());

    {
        let entry = &mut recipe.reviewers[target.index];
        entry.status = ReviewerStatus::Approved;
        entry.reviewed_at = Some(now);
        entry.comment = comment.clone();
        entry.proxy_by = target.proxy_by.clone();
    }
    recipe.record(
        CertificationEvent::new(CertificationEventKind::ReviewerApproved, &actor, now)
            .with_reviewer(&target.reviewer_id, target.proxy_by.clone())
            .with_comment(comment),
    );

    let mut finalized = None;
    if recipe.all_reviewers_approved() {
        let certified_by = recipe
            .certification_requested_by
            .clone()
            .unwrap_or_else(|| actor.clone());
        recipe.is_golden = true;
        recipe.certification_status = CertificationStatus::Approved;
        recipe.certified_at = Some(now);
        recipe.certified_by = Some(certified_by);
        recipe.record(
            CertificationEvent::new(CertificationEventKind::Certified, &actor, now)
                .with_reason(recipe.certification_reason.clone()),
        );
        finalized = Some(CertificationStatus::Approved);
        info!(recipe_id = %recipe.id, "All reviewers approved, recipe certified");
    }

    ReviewOutcome {
        target,
        decision: ReviewerStatus::Approved,
        finalized,
    }
}

/// Record a rejection; fails the whole certification immediately
pub fn reject(
    recipe: &mut Recipe,
    target: ReviewTarget,
    request: RejectionRequest,
    now: DateTime<Utc>,
) -> EngineResult<ReviewOutcome> {
    let reason = request.reason.trim().to_string();
    if reason.is_empty() {
        return Err(EngineError::InvalidInput(
            "rejection requires a reason".to_string(),
        ));
    }
    let comment = non_blank(request.comment);
    let actor = target
        .proxy_by
        .clone()
        .unwrap_or_else(|| target.reviewer_id.clone());

    {
        let entry = &mut recipe.reviewers[target.index];
        entry.status = ReviewerStatus::Rejected;
        entry.reviewed_at = Some(now);
        entry.comment = comment.clone();
        entry.rejection_reason = Some(reason.clone());
        entry.proxy_by = target.proxy_by.clone();
    }

    recipe.is_golden = false;
    recipe.certification_status = CertificationStatus::Rejected;
    recipe.rejected_at = Some(now);
    recipe.rejected_by = Some(target.reviewer_id.clone());
    recipe.rejection_reason = Some(reason.clone());
    recipe.record(
        CertificationEvent::new(CertificationEventKind::ReviewerRejected, &actor, now)
            .with_reviewer(&target.reviewer_id, target.proxy_by.clone())
            .with_reason(Some(reason.clone()))
            .with_comment(comment),
    );
    recipe.record(
        CertificationEvent::new(CertificationEventKind::Rejected, &actor, now)
            .with_reviewer(&target.reviewer_id, target.proxy_by.clone())
            .with_reason(Some(reason.clone())),
    );
    info!(
        recipe_id = %recipe.id,
        reviewer_id = %target.reviewer_id,
        reason = %reason,
        "Certification rejected"
    );

    Ok(ReviewOutcome {
        target,
        decision: ReviewerStatus::Rejected,
        finalized: Some(CertificationStatus::Rejected),
    })
}

/// Revoke golden status; certification status and reviewer history stay
pub fn degrade(recipe: &mut Recipe, request: DegradeRequest, now: DateTime<Utc>) -> EngineResult<()> {
    let reason = request.reason.trim().to_string();
    if reason.is_empty() {
        return Err(EngineError::InvalidInput(
            "degradation requires a reason".to_string(),
        ));
    }
    let actor = non_blank(request.degraded_by).unwrap_or_else(|| "unattributed".to_string());

    let was_golden = recipe.is_golden;
    recipe.is_golden = false;
    recipe.degraded_at = Some(now);
    recipe.degraded_reason = Some(reason.clone());
    recipe.record(
        CertificationEvent::new(CertificationEventKind::Degraded, &actor, now)
            .with_reason(Some(reason.clone())),
    );
    info!(recipe_id = %recipe.id, was_golden, reason = %reason, "Recipe degraded");
    Ok(())
}
