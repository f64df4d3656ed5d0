use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Router,
};
use facematch_common::store::EmbeddingStore;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{attendance::attendance, recognize::recognize, register::register};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EmbeddingStore>,
}

pub fn router(state: AppState, max_body_size: usize) -> Router {
    // Browser clients post embeddings straight from the page, so allow any origin.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_origin(AllowOrigin::mirror_request());

    let status_router = Router::new()
        .route("/", get(index))
        .route("/_liveness", get(liveness))
        .route("/_readiness", get(readiness));

    let api_router = Router::new()
        .route("/register", post(register))
        .route("/recognize", post(recognize))
        .route("/attendance", post(attendance))
        .layer(DefaultBodyLimit::max(max_body_size));

    Router::new()
        .merge(status_router)
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn index() -> &'static str {
    "facematch api"
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "readiness check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok("ok")
}
