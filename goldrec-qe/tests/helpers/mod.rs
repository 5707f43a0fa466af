//! Shared fixtures for goldrec-qe integration tests
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, Utc};
use goldrec_common::EventBus;
use goldrec_qe::db::Stores;
use goldrec_qe::models::{FeedbackSubmission, MetricsInput, Role, TestResult, User};
use goldrec_qe::services::QualityEngine;

/// Days between consecutive fixture test dates
pub const DAYS_BETWEEN_BATCHES: i64 = 4;

/// Metrics that average to a score of exactly 93.0
///
/// yield 98, efficiency 96, lifespan 33.4, defect 0.3, cpk 1.5, stability 95
pub fn reference_metrics() -> MetricsInput {
    MetricsInput {
        yield_rate: Some(98.0),
        filter_efficiency: Some(96.0),
        lifespan: Some(33.4),
        defect_rate: Some(0.3),
        cpk: Some(1.5),
        stability_score: Some(95.0),
    }
}

pub fn test_result(test_date: DateTime<Utc>) -> TestResult {
    TestResult {
        passed: true,
        test_date,
        inspector: "qa-inspector".to_string(),
    }
}

/// Fixed origin for fixture test dates, well in the past
pub fn history_start() -> DateTime<Utc> {
    static START: OnceLock<DateTime<Utc>> = OnceLock::new();
    *START.get_or_init(|| Utc::now() - Duration::days(90))
}

/// Test date of the `index`-th fixture batch
pub fn batch_date(index: usize) -> DateTime<Utc> {
    history_start() + Duration::days(DAYS_BETWEEN_BATCHES * index as i64)
}

/// Submission with the reference metrics for the `index`-th batch
pub fn qualifying_submission(index: usize) -> FeedbackSubmission {
    FeedbackSubmission::new(reference_metrics(), test_result(batch_date(index)))
        .with_batch_no(format!("B-{:04}", index + 1))
}

/// Same as the reference batch but with custom yield and cpk
pub fn submission_with(index: usize, yield_rate: f64, cpk: f64) -> FeedbackSubmission {
    let mut metrics = reference_metrics();
    metrics.yield_rate = Some(yield_rate);
    metrics.cpk = Some(cpk);
    FeedbackSubmission::new(metrics, test_result(batch_date(index)))
}

/// In-memory engine with an event bus
pub fn engine() -> Arc<QualityEngine> {
    Arc::new(QualityEngine::new(Stores::in_memory(), EventBus::new(256)))
}

/// In-memory engine whose identity provider knows `users`
pub async fn engine_with_users(users: &[(&str, Role)]) -> (Arc<QualityEngine>, Stores) {
    let stores = Stores::in_memory();
    for (id, role) in users {
        stores
            .users
            .upsert_user(&User::new(*id, *role))
            .await
            .expect("seed user");
    }
    let engine = Arc::new(QualityEngine::new(stores.clone(), EventBus::new(256)));
    (engine, stores)
}

/// Register `recipe_id` and submit `count` qualifying batches immediately
pub async fn recipe_with_history(engine: &QualityEngine, recipe_id: &str, count: usize) {
    engine
        .register_recipe(recipe_id, &format!("Recipe {}", recipe_id), serde_json::json!({}))
        .await
        .expect("register recipe");
    for i in 0..count {
        engine
            .submit_feedback(recipe_id, qualifying_submission(i))
            .await
            .expect("submit feedback");
    }
}
