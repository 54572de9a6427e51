//! Breach CRUD, listing and the stats snapshot.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::auth::Principal;
use super::state::AppState;
use super::{blocking, with_snapshot};
use crate::analysis::StatsReport;
use crate::error::{ApiResult, AppError};
use crate::records::{BreachFilter, BreachRecord};
use crate::storage::{Page, PageRequest, StoredBreach};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    year: Option<String>,
    organization: Option<String>,
    breach_type: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl ListQuery {
    fn filter(&self) -> BreachFilter {
        BreachFilter {
            year: non_empty(&self.year),
            organization: non_empty(&self.organization),
            breach_type: non_empty(&self.breach_type),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachList {
    breaches: Vec<StoredBreach>,
    total_pages: u64,
    current_page: u32,
    total: u64,
}

impl From<Page<StoredBreach>> for BreachList {
    fn from(page: Page<StoredBreach>) -> Self {
        Self {
            breaches: page.items,
            total_pages: page.total_pages,
            current_page: page.current_page,
            total: page.total,
        }
    }
}

/// A single breach with its derived severity and age.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachDetail {
    #[serde(flatten)]
    breach: StoredBreach,
    severity_score: u8,
    breach_age: Option<i64>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("breach {id} not found"))
}

pub async fn list_breaches(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<BreachList>> {
    let filter = query.filter();
    let request = PageRequest::new(query.page, query.limit);
    let store = state.breaches.clone();

    let page = blocking(move || store.list(&filter, request)).await?;
    Ok(Json(page.into()))
}

pub async fn breach_stats(State(state): State<AppState>) -> ApiResult<Json<StatsReport>> {
    let report = with_snapshot(&state, |aggregator| aggregator.stats_report()).await?;
    Ok(Json(report))
}

pub async fn get_breach(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BreachDetail>> {
    let store = state.breaches.clone();
    let breach = blocking(move || store.get(id))
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(BreachDetail {
        severity_score: breach.record.severity_score(),
        breach_age: breach.record.breach_age_days(chrono::Utc::now()),
        breach,
    }))
}

pub async fn create_breach(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(document): Json<Value>,
) -> ApiResult<(StatusCode, Json<StoredBreach>)> {
    let record = BreachRecord::from_document(document)?;
    let store = state.breaches.clone();

    let stored = blocking(move || store.insert(&record, Some(&principal.name))).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update_breach(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(document): Json<Value>,
) -> ApiResult<Json<StoredBreach>> {
    let record = BreachRecord::from_document(document)?;
    let store = state.breaches.clone();

    let updated = blocking(move || store.update(id, &record))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(updated))
}

pub async fn delete_breach(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let store = state.breaches.clone();
    if !blocking(move || store.delete(id)).await? {
        return Err(not_found(id));
    }
    Ok(Json(json!({ "message": "breach deleted", "id": id })))
}
