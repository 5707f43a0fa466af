//! Recipe registration, recompute, reports and listings
//!
//! POST /recipes, GET /recipes/:id, POST /recipes/:id/recompute,
//! GET /recipes/:id/quality-report, GET /recipes/candidates, GET /recipes/golden

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{error::ApiResult, models::Recipe, services::QualityReport, AppState};

/// POST /recipes request
#[derive(Debug, Deserialize)]
pub struct RegisterRecipeRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// POST /recipes
///
/// Creates the recipe, or updates name and parameters of an existing one.
pub async fn register_recipe(
    State(state): State<AppState>,
    Json(request): Json<RegisterRecipeRequest>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let result = state
        .engine
        .register_recipe(&request.id, &request.name, request.parameters)
        .await;
    let recipe = state.check(result).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// GET /recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<Recipe>> {
    let result = state.engine.get_recipe(&recipe_id).await;
    Ok(Json(state.check(result).await?))
}

/// POST /recipes/:id/recompute
///
/// Explicit recompute, required after deferred ingestion.
pub async fn recompute(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<Recipe>> {
    let result = state.engine.recompute(&recipe_id).await;
    let recipe = state.check(result).await?;
    tracing::debug!(recipe_id = %recipe.id, score = ?recipe.golden_score, "Recompute requested");
    Ok(Json(recipe))
}

/// GET /recipes/:id/quality-report
pub async fn quality_report(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<QualityReport>> {
    let result = state.engine.get_quality_report(&recipe_id).await;
    Ok(Json(state.check(result).await?))
}

/// GET /recipes/candidates
pub async fn candidates(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    let result = state.engine.get_candidates().await;
    Ok(Json(state.check(result).await?))
}

/// GET /recipes/golden
pub async fn golden(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    let result = state.engine.get_all_golden().await;
    Ok(Json(state.check(result).await?))
}

/// Build recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(register_recipe))
        .route("/recipes/candidates", get(candidates))
        .route("/recipes/golden", get(golden))
        .route("/recipes/:id", get(get_recipe))
        .route("/recipes/:id/recompute", post(recompute))
        .route("/recipes/:id/quality-report", get(quality_report))
}
