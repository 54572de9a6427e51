//! API route definitions.

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use super::state::AppState;
use super::{analyses, breaches};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/breaches",
            get(breaches::list_breaches).post(breaches::create_breach),
        )
        .route("/breaches/stats", get(breaches::breach_stats))
        .route(
            "/breaches/{id}",
            get(breaches::get_breach)
                .put(breaches::update_breach)
                .delete(breaches::delete_breach),
        )
        .route(
            "/analysis",
            get(analyses::list_analyses).post(analyses::create_analysis),
        )
        .route("/analysis/predictive", post(analyses::predictive_analysis))
        .route("/analysis/trends/yearly", get(analyses::yearly_trends))
        .route("/analysis/trends/by-type", get(analyses::breach_types))
        .route("/analysis/trends/by-org", get(analyses::top_organizations))
        .route("/analysis/trends/by-industry", get(analyses::top_industries))
        .route("/analysis/{id}", get(analyses::get_analysis))
        .route("/analysis/{id}/results", put(analyses::record_results))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
