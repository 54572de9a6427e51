//! API layer -- axum routes, handlers, and middleware.

mod analyses;
pub mod auth;
mod breaches;
mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use self::state::AppState;
use crate::analysis::BreachAggregator;
use crate::error::{ApiResult, AppError};
use crate::records::{BreachFilter, RecordSource};

/// Build the application router with all API routes.
pub fn router(state: AppState) -> Router {
    let protected = routes::protected_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_token,
    ));

    let mut app = Router::new()
        .nest("/api", routes::public_routes().merge(protected))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http());

    if state.permissive_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

async fn fallback() -> AppError {
    AppError::NotFound("route not found".to_string())
}

/// Run synchronous storage work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Load every stored breach and run `f` over the snapshot.
pub(crate) async fn with_snapshot<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(BreachAggregator<'_>) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = state.breaches.clone();
    blocking(move || {
        let records = store.fetch_records(&BreachFilter::default())?;
        Ok(f(BreachAggregator::new(&records)))
    })
    .await
}
