//! Manual certification workflow endpoints
//!
//! POST /recipes/:id/certify, /approve, /reject, /degrade

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::ApiResult,
    models::Recipe,
    services::{ApprovalRequest, CertificationRequest, DegradeRequest, RejectionRequest},
    AppState,
};

/// POST /recipes/:id/approve request
#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    /// Assigned reviewer, or an admin deciding by proxy
    pub reviewer_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /recipes/:id/reject request
#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reviewer_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /recipes/:id/certify
pub async fn certify(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(request): Json<CertificationRequest>,
) -> ApiResult<Json<Recipe>> {
    let result = state.engine.certify(&recipe_id, request).await;
    Ok(Json(state.check(result).await?))
}

/// POST /recipes/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> ApiResult<Json<Recipe>> {
    let request = ApprovalRequest {
        comment: body.comment,
    };
    let result = state
        .engine
        .approve(&recipe_id, &body.reviewer_id, request)
        .await;
    Ok(Json(state.check(result).await?))
}

/// POST /recipes/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(body): Json<RejectBody>,
) -> ApiResult<Json<Recipe>> {
    let request = RejectionRequest {
        reason: body.reason,
        comment: body.comment,
    };
    let result = state
        .engine
        .reject(&recipe_id, &body.reviewer_id, request)
        .await;
    Ok(Json(state.check(result).await?))
}

/// POST /recipes/:id/degrade
pub async fn degrade(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(request): Json<DegradeRequest>,
) -> ApiResult<Json<Recipe>> {
    let result = state.engine.degrade(&recipe_id, request).await;
    Ok(Json(state.check(result).await?))
}

/// Build certification routes
pub fn certification_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/:id/certify", post(certify))
        .route("/recipes/:id/approve", post(approve))
        .route("/recipes/:id/reject", post(reject))
        .route("/recipes/:id/degrade", post(degrade))
}
