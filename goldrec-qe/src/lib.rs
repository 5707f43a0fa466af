//! goldrec-qe library interface
//!
//! Quality scoring and golden-recipe certification engine, plus the HTTP
//! surface that wraps it. Exposed as a library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use goldrec_common::events::EventBus;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{EngineError, EngineResult, QualityEngine};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QualityEngine>,
    /// Same bus the engine emits on; SSE clients subscribe here
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last storage failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(engine: Arc<QualityEngine>) -> Self {
        let event_bus = engine.event_bus().clone();
        Self {
            engine,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Convert an engine result through [`AppState::api_error`]
    pub async fn check<T>(&self, result: EngineResult<T>) -> ApiResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(self.api_error(err).await),
        }
    }

    /// Convert an engine error, remembering storage failures for `/health`
    pub async fn api_error(&self, err: EngineError) -> ApiError {
        let err = ApiError::from(err);
        if let ApiError::Common(inner) = &err {
            *self.last_error.write().await = Some(inner.to_string());
        }
        err
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::recipe_routes())
        .merge(api::feedback_routes())
        .merge(api::certification_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local browser access
        .layer(CorsLayer::permissive())
        .with_state(state)
}
