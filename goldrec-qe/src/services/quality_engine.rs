//! Quality engine facade
//!
//! Wires the pure pipeline (statistics → scoring → auto-certification) and
//! the manual workflow to the injected collaborators. Each read-modify-write
//! of a recipe happens under that recipe's lock from [`RecipeLocks`]; two
//! concurrent approvals of the last pending reviewers are serialized, so the
//! second one always observes the first.
//!
//! Ingestion runs in one of two modes:
//! - immediate: [`QualityEngine::submit_feedback`] recomputes after every append
//! - deferred: appends collect recipe ids in a caller-owned [`FeedbackBatch`];
//!   [`QualityEngine::commit_batch`] recomputes each touched recipe once

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use goldrec_common::{EventBus, GoldrecEvent};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{FeedbackStore, RecipeRepository, Stores, UserDirectory};
use crate::models::{
    CertificationStatus, FeedbackSubmission, QualityFeedbackRecord, QualityStats, Recipe,
    ReviewerEntry, ReviewerStatus,
};
use crate::services::auto_certification::{self, CriterionOutcome};
use crate::services::candidate_ranking;
use crate::services::certification_workflow::{
    self, ApprovalRequest, CertificationRequest, CertifyOutcome, DegradeRequest,
    RejectionRequest, ReviewOutcome,
};
use crate::services::errors::{EngineError, EngineResult};
use crate::services::recipe_locks::RecipeLocks;
use crate::services::scoring::score_stats;
use crate::services::statistics::aggregate;

/// Recipe ids awaiting recompute in deferred ingestion mode
///
/// Owned by the caller that opened it; nothing is shared across batches.
#[derive(Debug, Default)]
pub struct FeedbackBatch {
    pending: BTreeSet<String>,
    appended: usize,
}

impl FeedbackBatch {
    /// Touched recipe ids, sorted
    pub fn pending_recipes(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Records appended through this batch
    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Point-in-time quality view of one recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub recipe_id: String,
    pub stats: QualityStats,
    pub score: f64,
    pub is_golden: bool,
    pub certification_status: CertificationStatus,
    pub meets_auto_criteria: bool,
    /// Every gate, evaluated without short-circuit
    pub criteria: Vec<CriterionOutcome>,
    pub reviewers: Vec<ReviewerEntry>,
}

pub struct QualityEngine {
    recipes: Arc<dyn RecipeRepository>,
    feedback: Arc<dyn FeedbackStore>,
    users: Arc<dyn UserDirectory>,
    event_bus: EventBus,
    locks: RecipeLocks,
}

impl QualityEngine {
    pub fn new(stores: Stores, event_bus: EventBus) -> Self {
        Self {
            recipes: stores.recipes,
            feedback: stores.feedback,
            users: stores.users,
            event_bus,
            locks: RecipeLocks::new(),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Recipes with a review or recompute currently in flight
    pub fn active_recipe_locks(&self) -> usize {
        self.locks.tracked()
    }

    async fn load(&self, recipe_id: &str) -> EngineResult<Recipe> {
        self.recipes
            .get_by_id(recipe_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(recipe_id.to_string()))
    }

    /// Place a recipe in the repository
    ///
    /// Re-registering an existing id updates name and parameters only.
    pub async fn register_recipe(
        &self,
        recipe_id: &str,
        name: &str,
        parameters: serde_json::Value,
    ) -> EngineResult<Recipe> {
        let recipe_id = recipe_id.trim();
        if recipe_id.is_empty() {
            return Err(EngineError::InvalidInput("recipe id must not be empty".to_string()));
        }

        let _guard = self.locks.acquire(recipe_id).await;
        let now = Utc::now();
        let recipe = match self.recipes.get_by_id(recipe_id).await? {
            Some(mut existing) => {
                existing.name = name.to_string();
                existing.parameters = parameters;
                existing.updated_at = now;
                existing
            }
            None => {
                info!(recipe_id, name, "Registering recipe");
                Recipe::new(recipe_id, name, parameters, now)
            }
        };
        self.recipes.save(&recipe).await?;
        Ok(recipe)
    }

    pub async fn get_recipe(&self, recipe_id: &str) -> EngineResult<Recipe> {
        self.load(recipe_id).await
    }

    /// Append one batch record and recompute immediately
    pub async fn submit_feedback(
        &self,
        recipe_id: &str,
        submission: FeedbackSubmission,
    ) -> EngineResult<QualityFeedbackRecord> {
        let _guard = self.locks.acquire(recipe_id).await;
        let recipe = self.load_for_feedback(recipe_id).await?;
        let record = self.append(recipe_id, submission, true).await?;
        self.recompute_locked(recipe).await?;
        Ok(record)
    }

    /// Open a deferred-recompute batch
    pub fn begin_batch(&self) -> FeedbackBatch {
        FeedbackBatch::default()
    }

    /// Append without recomputing; the recipe is queued on `batch`
    ///
    /// The recipe's score and golden flag stay stale until the batch commits.
    pub async fn submit_feedback_deferred(
        &self,
        batch: &mut FeedbackBatch,
        recipe_id: &str,
        submission: FeedbackSubmission,
    ) -> EngineResult<QualityFeedbackRecord> {
        let _guard = self.locks.acquire(recipe_id).await;
        self.load_for_feedback(recipe_id).await?;
        let record = self.append(recipe_id, submission, false).await?;
        batch.pending.insert(record.recipe_id.clone());
        batch.appended += 1;
        Ok(record)
    }

    /// Recompute every recipe the batch touched, once each
    pub async fn commit_batch(&self, batch: FeedbackBatch) -> EngineResult<Vec<Recipe>> {
        info!(
            recipes = batch.pending.len(),
            records = batch.appended,
            "Committing deferred feedback batch"
        );
        let mut recomputed = Vec::with_capacity(batch.pending.len());
        for recipe_id in batch.pending {
            recomputed.push(self.recompute(&recipe_id).await?);
        }
        Ok(recomputed)
    }

    /// Recompute statistics and score, then run the auto-certification gate
    pub async fn recompute(&self, recipe_id: &str) -> EngineResult<Recipe> {
        let _guard = self.locks.acquire(recipe_id).await;
        let recipe = self.load(recipe_id).await?;
        self.recompute_locked(recipe).await
    }

    async fn load_for_feedback(&self, recipe_id: &str) -> EngineResult<Recipe> {
        if recipe_id.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "feedback requires a recipe id".to_string(),
            ));
        }
        self.load(recipe_id).await
    }

    async fn append(
        &self,
        recipe_id: &str,
        submission: FeedbackSubmission,
        recomputed: bool,
    ) -> EngineResult<QualityFeedbackRecord> {
        let (record, defaulted) = submission.into_record(recipe_id, Utc::now());
        if !defaulted.is_empty() {
            let metrics: Vec<&str> = defaulted.iter().map(|m| m.as_str()).collect();
            warn!(
                recipe_id,
                batch_no = ?record.batch_no,
                ?metrics,
                "Missing or invalid metrics defaulted to 0"
            );
        }

        self.feedback.append(&record).await?;
        debug!(recipe_id, feedback_id = %record.id, "Feedback appended");

        self.event_bus.emit_lossy(GoldrecEvent::FeedbackRecorded {
            recipe_id: recipe_id.to_string(),
            feedback_id: record.id,
            batch_no: record.batch_no.clone(),
            recomputed,
            timestamp: record.created_at,
        });
        Ok(record)
    }

    /// Caller must hold the recipe's lock
    async fn recompute_locked(&self, mut recipe: Recipe) -> EngineResult<Recipe> {
        let records = self.feedback.query_by_recipe(&recipe.id).await?;
        let stats = aggregate(&records);
        let score = score_stats(&stats);
        let meets_criteria = auto_certification::meets_auto_criteria(&records, score);
        let now = Utc::now();

        debug!(
            recipe_id = %recipe.id,
            total_executions = stats.total_executions,
            score,
            trend = stats.quality_trend.as_str(),
            meets_criteria,
            "Recomputed quality statistics"
        );

        let trend = stats.quality_trend.as_str().to_string();
        let total_executions = stats.total_executions;
        recipe.quality_stats = Some(stats);
        recipe.golden_score = Some(score);
        recipe.updated_at = now;
        let newly_certified = auto_certification::apply(&mut recipe, meets_criteria, now);

        self.recipes.save(&recipe).await?;

        self.event_bus.emit_lossy(GoldrecEvent::QualityRecomputed {
            recipe_id: recipe.id.clone(),
            golden_score: score,
            total_executions,
            quality_trend: trend,
            timestamp: now,
        });
        if newly_certified {
            info!(recipe_id = %recipe.id, score, "Recipe auto-certified as golden");
            self.event_bus.emit_lossy(GoldrecEvent::RecipeAutoCertified {
                recipe_id: recipe.id.clone(),
                golden_score: score,
                timestamp: now,
            });
        }
        Ok(recipe)
    }

    /// Open manual certification, or certify directly when no reviewers are given
    pub async fn certify(
        &self,
        recipe_id: &str,
        request: CertificationRequest,
    ) -> EngineResult<Recipe> {
        let _guard = self.locks.acquire(recipe_id).await;
        let mut recipe = self.load(recipe_id).await?;
        let now = Utc::now();
        let outcome = certification_workflow::certify(&mut recipe, request, now)?;
        self.recipes.save(&recipe).await?;

        let requested_by = recipe.certification_requested_by.clone().unwrap_or_default();
        let event = match outcome {
            CertifyOutcome::Pending => GoldrecEvent::CertificationRequested {
                recipe_id: recipe.id.clone(),
                requested_by,
                reviewers: recipe.reviewers.iter().map(|r| r.reviewer_id.clone()).collect(),
                timestamp: now,
            },
            CertifyOutcome::Certified => GoldrecEvent::RecipeCertified {
                recipe_id: recipe.id.clone(),
                certified_by: requested_by,
                timestamp: now,
            },
        };
        self.event_bus.emit_lossy(event);
        Ok(recipe)
    }

    /// Record `reviewer_id`'s approval (or an admin's proxy approval)
    pub async fn approve(
        &self,
        recipe_id: &str,
        reviewer_id: &str,
        request: ApprovalRequest,
    ) -> EngineResult<Recipe> {
        let _guard = self.locks.acquire(recipe_id).await;
        let mut recipe = self.load(recipe_id).await?;
        let target = self.review_target(&recipe, reviewer_id).await?;
        let now = Utc::now();
        let outcome = certification_workflow::approve(&mut recipe, target, request, now);
        self.recipes.save(&recipe).await?;
        self.emit_review(&recipe, &outcome, now);
        Ok(recipe)
    }

    /// Record a rejection; the certification fails immediately
    pub async fn reject(
        &self,
        recipe_id: &str,
        reviewer_id: &str,
        request: RejectionRequest,
    ) -> EngineResult<Recipe> {
        let _guard = self.locks.acquire(recipe_id).await;
        let mut recipe = self.load(recipe_id).await?;
        let target = self.review_target(&recipe, reviewer_id).await?;
        let now = Utc::now();
        let outcome = certification_workflow::reject(&mut recipe, target, request, now)?;
        self.recipes.save(&recipe).await?;
        self.emit_review(&recipe, &outcome, now);
        Ok(recipe)
    }

    /// Revoke golden status with a reason
    pub async fn degrade(&self, recipe_id: &str, request: DegradeRequest) -> EngineResult<Recipe> {
        let _guard = self.locks.acquire(recipe_id).await;
        let mut recipe = self.load(recipe_id).await?;
        let now = Utc::now();
        certification_workflow::degrade(&mut recipe, request, now)?;
        self.recipes.save(&recipe).await?;

        self.event_bus.emit_lossy(GoldrecEvent::RecipeDegraded {
            recipe_id: recipe.id.clone(),
            reason: recipe.degraded_reason.clone().unwrap_or_default(),
            timestamp: now,
        });
        Ok(recipe)
    }

    /// The identity provider is consulted only for ids off the reviewer list
    async fn review_target(
        &self,
        recipe: &Recipe,
        reviewer_id: &str,
    ) -> EngineResult<certification_workflow::ReviewTarget> {
        let caller = if recipe.reviewers.is_empty() || recipe.reviewer(reviewer_id).is_some() {
            None
        } else {
            self.users.get_user_by_id(reviewer_id).await?
        };
        certification_workflow::resolve_target(recipe, reviewer_id, caller.as_ref())
    }

    fn emit_review(&self, recipe: &Recipe, outcome: &ReviewOutcome, now: DateTime<Utc>) {
        self.event_bus.emit_lossy(GoldrecEvent::ReviewerDecided {
            recipe_id: recipe.id.clone(),
            reviewer_id: outcome.target.reviewer_id.clone(),
            decision: outcome.decision.as_str().to_string(),
            proxy_by: outcome.target.proxy_by.clone(),
            timestamp: now,
        });

        match (outcome.decision, outcome.finalized) {
            (ReviewerStatus::Approved, Some(CertificationStatus::Approved)) => {
                self.event_bus.emit_lossy(GoldrecEvent::RecipeCertified {
                    recipe_id: recipe.id.clone(),
                    certified_by: recipe.certified_by.clone().unwrap_or_default(),
                    timestamp: now,
                });
            }
            (ReviewerStatus::Rejected, _) => {
                self.event_bus.emit_lossy(GoldrecEvent::CertificationRejected {
                    recipe_id: recipe.id.clone(),
                    reviewer_id: outcome.target.reviewer_id.clone(),
                    reason: recipe.rejection_reason.clone().unwrap_or_default(),
                    timestamp: now,
                });
            }
            _ => {}
        }
    }

    /// Non-golden recipes scoring at least 85, best first
    pub async fn get_candidates(&self) -> EngineResult<Vec<Recipe>> {
        let recipes = self.recipes.list_all().await?;
        Ok(candidate_ranking::candidates(recipes))
    }

    pub async fn get_all_golden(&self) -> EngineResult<Vec<Recipe>> {
        let recipes = self.recipes.list_all().await?;
        Ok(candidate_ranking::all_golden(recipes))
    }

    /// Fresh statistics, score and gate breakdown; nothing is persisted
    pub async fn get_quality_report(&self, recipe_id: &str) -> EngineResult<QualityReport> {
        let recipe = self.load(recipe_id).await?;
        let records = self.feedback.query_by_recipe(recipe_id).await?;
        let stats = aggregate(&records);
        let score = score_stats(&stats);
        let criteria = auto_certification::evaluate_all(&records, score);
        let meets_auto_criteria = criteria.iter().all(|c| c.passed);

        Ok(QualityReport {
            recipe_id: recipe.id,
            stats,
            score,
            is_golden: recipe.is_golden,
            certification_status: recipe.certification_status,
            meets_auto_criteria,
            criteria,
            reviewers: recipe.reviewers,
        })
    }

    /// Feedback history of an existing recipe, in append order
    pub async fn list_feedback(&self, recipe_id: &str) -> EngineResult<Vec<QualityFeedbackRecord>> {
        self.load(recipe_id).await?;
        Ok(self.feedback.query_by_recipe(recipe_id).await?)
    }
}
