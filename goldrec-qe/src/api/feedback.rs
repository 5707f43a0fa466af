//! Feedback ingestion
//!
//! POST /recipes/:id/feedback (immediate recompute), GET /recipes/:id/feedback,
//! POST /feedback/bulk (deferred recompute, one pass per touched recipe,
//! 207 on a partial load)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiResult, ErrorBody},
    models::{FeedbackSubmission, QualityFeedbackRecord, Recipe},
    AppState,
};

/// One entry of a bulk load
#[derive(Debug, Deserialize)]
pub struct BulkFeedbackItem {
    pub recipe_id: String,
    #[serde(flatten)]
    pub submission: FeedbackSubmission,
}

/// POST /feedback/bulk request
#[derive(Debug, Deserialize)]
pub struct BulkFeedbackRequest {
    pub items: Vec<BulkFeedbackItem>,
}

/// POST /feedback/bulk response
#[derive(Debug, Serialize)]
pub struct BulkFeedbackResponse {
    /// Items stored, counted from the start of the request
    pub appended: usize,
    pub recomputed: Vec<Recipe>,
    /// First refused item; nothing after it was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<BulkItemFailure>,
}

/// Refused bulk item
#[derive(Debug, Serialize)]
pub struct BulkItemFailure {
    /// Position in `items`
    pub index: usize,
    pub recipe_id: String,
    pub error: ErrorBody,
}

/// POST /recipes/:id/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
    Json(submission): Json<FeedbackSubmission>,
) -> ApiResult<(StatusCode, Json<QualityFeedbackRecord>)> {
    let result = state.engine.submit_feedback(&recipe_id, submission).await;
    let record = state.check(result).await?;
    tracing::info!(
        recipe_id = %record.recipe_id,
        feedback_id = %record.id,
        batch_no = ?record.batch_no,
        "Feedback recorded"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /recipes/:id/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Json<Vec<QualityFeedbackRecord>>> {
    let result = state.engine.list_feedback(&recipe_id).await;
    Ok(Json(state.check(result).await?))
}

/// POST /feedback/bulk
///
/// Items are appended in request order and processing stops at the first
/// refused item. Whatever was appended before it is still recomputed. A
/// partial load answers 207 naming the refused item, so a client retries
/// only the remainder; a request that stored nothing answers with the
/// item's own error status.
pub async fn submit_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkFeedbackRequest>,
) -> ApiResult<(StatusCode, Json<BulkFeedbackResponse>)> {
    let mut batch = state.engine.begin_batch();
    let mut failure = None;

    for (index, item) in request.items.into_iter().enumerate() {
        let result = state
            .engine
            .submit_feedback_deferred(&mut batch, &item.recipe_id, item.submission)
            .await;
        if let Err(err) = result {
            tracing::warn!(index, recipe_id = %item.recipe_id, error = %err, "Bulk item refused");
            failure = Some((index, item.recipe_id, err));
            break;
        }
    }

    let appended = batch.appended();
    let committed = state.engine.commit_batch(batch).await;
    let recomputed = state.check(committed).await?;

    let failed = match failure {
        None => None,
        Some((index, recipe_id, err)) => {
            let err = state.api_error(err).await;
            if appended == 0 {
                return Err(err);
            }
            Some(BulkItemFailure {
                index,
                recipe_id,
                error: err.body(),
            })
        }
    };

    let status = if failed.is_some() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };
    tracing::info!(
        appended,
        recipes = recomputed.len(),
        partial = failed.is_some(),
        "Bulk feedback committed"
    );
    Ok((
        status,
        Json(BulkFeedbackResponse {
            appended,
            recomputed,
            failed,
        }),
    ))
}

/// Build feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes/:id/feedback",
            post(submit_feedback).get(list_feedback),
        )
        .route("/feedback/bulk", post(submit_bulk))
}
