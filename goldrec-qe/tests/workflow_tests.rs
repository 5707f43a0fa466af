//! Manual certification workflow through the engine
//!
//! Unanimous approval, immediate rejection, admin proxy review, degradation
//! and the audit trail.

mod helpers;

use std::sync::Arc;

use goldrec_common::GoldrecEvent;
use goldrec_qe::models::{CertificationEventKind, CertificationStatus, ReviewerStatus, Role};
use goldrec_qe::services::{
    ApprovalRequest, CertificationRequest, DegradeRequest, EngineError, RejectionRequest,
};
use goldrec_qe::services::QualityEngine;
use helpers::*;

fn request(reviewers: &[&str]) -> CertificationRequest {
    CertificationRequest {
        certified_by: "qa-lead".to_string(),
        reason: Some("line 3 qualification".to_string()),
        reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
    }
}

fn rejection(reason: &str) -> RejectionRequest {
    RejectionRequest {
        reason: reason.to_string(),
        comment: None,
    }
}

fn degradation(reason: &str) -> DegradeRequest {
    DegradeRequest {
        reason: reason.to_string(),
        degraded_by: Some("qa-lead".to_string()),
    }
}

async fn pending_recipe(engine: &QualityEngine, recipe_id: &str, reviewers: &[&str]) {
    recipe_with_history(engine, recipe_id, 0).await;
    engine.certify(recipe_id, request(reviewers)).await.unwrap();
}

#[tokio::test]
async fn test_both_reviewers_approve_certifies() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A", "B"]).await;

    let after_a = engine
        .approve("r-1", "A", ApprovalRequest::default())
        .await
        .unwrap();
    assert!(!after_a.is_golden);
    assert_eq!(after_a.certification_status, CertificationStatus::Pending);

    let after_b = engine
        .approve(
            "r-1",
            "B",
            ApprovalRequest {
                comment: Some("looks good".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(after_b.is_golden);
    assert_eq!(after_b.certification_status, CertificationStatus::Approved);
    assert_eq!(after_b.certified_by.as_deref(), Some("qa-lead"));
    assert_eq!(after_b.reviewer("B").unwrap().comment.as_deref(), Some("looks good"));
}

#[tokio::test]
async fn test_rejection_after_approval_fails_certification() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A", "B"]).await;

    engine.approve("r-1", "A", ApprovalRequest::default()).await.unwrap();
    let recipe = engine
        .reject("r-1", "B", rejection("delamination at 200h"))
        .await
        .unwrap();

    assert!(!recipe.is_golden);
    assert_eq!(recipe.certification_status, CertificationStatus::Rejected);
    assert_eq!(recipe.rejected_by.as_deref(), Some("B"));
    assert_eq!(recipe.rejection_reason.as_deref(), Some("delamination at 200h"));
    assert_eq!(recipe.reviewer("A").unwrap().status, ReviewerStatus::Approved);
}

#[tokio::test]
async fn test_reapproval_is_conflict() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A", "B"]).await;
    engine.approve("r-1", "A", ApprovalRequest::default()).await.unwrap();

    let err = engine
        .approve("r-1", "A", ApprovalRequest::default())
        .await
        .unwrap_err();
    match err {
        EngineError::Conflict { recipe_id, reviewer_id, message } => {
            assert_eq!(recipe_id, "r-1");
            assert_eq!(reviewer_id, "A");
            assert!(message.contains("approved"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_self_certification_without_reviewers() {
    let engine = engine();
    recipe_with_history(&engine, "r-1", 0).await;

    let recipe = engine.certify("r-1", request(&[])).await.unwrap();
    assert!(recipe.is_golden);
    assert_eq!(recipe.certification_status, CertificationStatus::Approved);
    assert_eq!(recipe.certification_reason.as_deref(), Some("line 3 qualification"));

    // Nothing to review
    assert!(matches!(
        engine.approve("r-1", "A", ApprovalRequest::default()).await,
        Err(EngineError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_unlisted_non_admin_is_invalid_state() {
    let (engine, _stores) = engine_with_users(&[("carol", Role::Reviewer)]).await;
    pending_recipe(&engine, "r-1", &["A"]).await;

    for caller in ["carol", "unknown-user"] {
        assert!(matches!(
            engine.approve("r-1", caller, ApprovalRequest::default()).await,
            Err(EngineError::InvalidState(_))
        ));
    }
    let recipe = engine.get_recipe("r-1").await.unwrap();
    assert!(recipe.reviewer("A").unwrap().is_pending());
}

#[tokio::test]
async fn test_admin_proxy_approval_is_recorded() {
    let (engine, _stores) = engine_with_users(&[("boss", Role::Admin)]).await;
    pending_recipe(&engine, "r-1", &["A", "B"]).await;

    let recipe = engine
        .approve("r-1", "boss", ApprovalRequest::default())
        .await
        .unwrap();
    let a = recipe.reviewer("A").unwrap();
    assert_eq!(a.status, ReviewerStatus::Approved);
    assert_eq!(a.proxy_by.as_deref(), Some("boss"));
    assert!(recipe.reviewer("B").unwrap().is_pending());

    let recipe = engine
        .approve("r-1", "boss", ApprovalRequest::default())
        .await
        .unwrap();
    assert!(recipe.is_golden);
    assert!(recipe.reviewers.iter().all(|r| r.is_proxied()));

    // Every entry decided: nothing left to proxy
    assert!(matches!(
        engine.approve("r-1", "boss", ApprovalRequest::default()).await,
        Err(EngineError::Conflict { .. })
    ));
}

#[tokio::test]
async fn test_admin_proxy_rejection() {
    let (engine, _stores) = engine_with_users(&[("boss", Role::Admin)]).await;
    pending_recipe(&engine, "r-1", &["A", "B"]).await;
    engine.approve("r-1", "A", ApprovalRequest::default()).await.unwrap();

    let recipe = engine
        .reject("r-1", "boss", rejection("supplier change"))
        .await
        .unwrap();
    let b = recipe.reviewer("B").unwrap();
    assert_eq!(b.status, ReviewerStatus::Rejected);
    assert_eq!(b.proxy_by.as_deref(), Some("boss"));
    assert_eq!(recipe.rejected_by.as_deref(), Some("B"));
    assert_eq!(recipe.certification_status, CertificationStatus::Rejected);
}

#[tokio::test]
async fn test_reject_without_reason_is_invalid_input() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A"]).await;
    assert!(matches!(
        engine.reject("r-1", "A", rejection("")).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(engine.get_recipe("r-1").await.unwrap().reviewer("A").unwrap().is_pending());
}

#[tokio::test]
async fn test_unknown_recipe_is_not_found() {
    let engine = engine();
    assert!(matches!(
        engine.certify("ghost", request(&[])).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.approve("ghost", "A", ApprovalRequest::default()).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.reject("ghost", "A", rejection("x")).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.degrade("ghost", degradation("x")).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_degrade_keeps_status_and_reviewers() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A", "B"]).await;
    engine.approve("r-1", "A", ApprovalRequest::default()).await.unwrap();
    let approved = engine.approve("r-1", "B", ApprovalRequest::default()).await.unwrap();

    let degraded = engine
        .degrade("r-1", degradation("field returns"))
        .await
        .unwrap();
    assert!(!degraded.is_golden);
    assert_eq!(degraded.certification_status, CertificationStatus::Approved);
    assert_eq!(degraded.reviewers, approved.reviewers);
    assert_eq!(degraded.degraded_reason.as_deref(), Some("field returns"));
    assert_eq!(degraded.certified_at, approved.certified_at);

    assert!(matches!(
        engine.degrade("r-1", degradation(" ")).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_degraded_auto_certified_recipe_requalifies_on_recompute() {
    let engine = engine();
    recipe_with_history(&engine, "r-auto", 10).await;
    assert!(engine.get_recipe("r-auto").await.unwrap().is_golden);

    let degraded = engine
        .degrade("r-auto", degradation("customer audit"))
        .await
        .unwrap();
    assert!(!degraded.is_golden);
    assert_eq!(degraded.certification_status, CertificationStatus::None);

    let recomputed = engine.recompute("r-auto").await.unwrap();
    assert!(recomputed.is_golden);
    let kinds: Vec<CertificationEventKind> = recomputed
        .certification_history
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CertificationEventKind::AutoCertified,
            CertificationEventKind::Degraded,
            CertificationEventKind::AutoCertified,
        ]
    );
}

#[tokio::test]
async fn test_audit_trail_survives_new_request() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A"]).await;
    engine.reject("r-1", "A", rejection("burrs")).await.unwrap();

    let recipe = engine.certify("r-1", request(&["B"])).await.unwrap();
    assert_eq!(recipe.certification_status, CertificationStatus::Pending);
    assert!(recipe.reviewer("A").is_none());
    assert!(recipe.rejection_reason.is_none());

    let kinds: Vec<CertificationEventKind> =
        recipe.certification_history.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CertificationEventKind::Requested,
            CertificationEventKind::ReviewerRejected,
            CertificationEventKind::Rejected,
            CertificationEventKind::Requested,
        ]
    );
    assert_eq!(recipe.certification_history[1].reason.as_deref(), Some("burrs"));
}

#[tokio::test]
async fn test_concurrent_final_approvals_certify() {
    for _ in 0..10 {
        let engine = engine();
        pending_recipe(&engine, "race", &["A", "B"]).await;

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.approve("race", "A", ApprovalRequest::default()).await })
        };
        let second = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.approve("race", "B", ApprovalRequest::default()).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let recipe = engine.get_recipe("race").await.unwrap();
        assert!(recipe.is_golden);
        assert_eq!(recipe.certification_status, CertificationStatus::Approved);
    }
}

#[tokio::test]
async fn test_review_events() {
    let engine = engine();
    pending_recipe(&engine, "r-1", &["A", "B"]).await;
    let mut rx = engine.event_bus().subscribe();

    engine.approve("r-1", "A", ApprovalRequest::default()).await.unwrap();
    engine.reject("r-1", "B", rejection("porosity")).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec!["ReviewerDecided", "ReviewerDecided", "CertificationRejected"]
    );
    match &events[2] {
        GoldrecEvent::CertificationRejected { reviewer_id, reason, .. } => {
            assert_eq!(reviewer_id, "B");
            assert_eq!(reason, "porosity");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_review_of_golden_recipe_clears_flag_until_decided() {
    let engine = engine();
    recipe_with_history(&engine, "r-auto", 10).await;
    assert!(engine.get_recipe("r-auto").await.unwrap().is_golden);

    let pending = engine.certify("r-auto", request(&["A"])).await.unwrap();
    assert!(!pending.is_golden);
    assert_eq!(pending.certification_status, CertificationStatus::Pending);

    // Qualifying history does not pre-empt the open review
    let recomputed = engine.recompute("r-auto").await.unwrap();
    assert!(!recomputed.is_golden);
    assert_eq!(recomputed.certification_status, CertificationStatus::Pending);

    let approved = engine
        .approve("r-auto", "A", ApprovalRequest::default())
        .await
        .unwrap();
    assert!(approved.is_golden);
    assert_eq!(approved.certification_status, CertificationStatus::Approved);
}
