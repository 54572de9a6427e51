//! Saved analyses, trend reports and predictive analysis.
//!
//! Trend endpoints are computed on demand from the current breach snapshot;
//! nothing is cached between requests. Saved analyses are scoped to the
//! principal that created them when listed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use super::auth::Principal;
use super::state::AppState;
use super::{blocking, with_snapshot};
use crate::analysis::{PeriodStats, RankedGroup, TypeStats};
use crate::error::{ApiResult, AppError};
use crate::predict::PredictionRequest;
use crate::storage::{Analysis, AnalysisStatus, AnalysisType, NewAnalysis};

const MAX_RANK_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequest {
    #[serde(default)]
    name: Option<String>,
    analysis_type: AnalysisType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "empty_object")]
    parameters: Value,
}

fn empty_object() -> Value {
    json!({})
}

#[derive(Debug, Deserialize)]
pub struct RecordResultsRequest {
    results: Value,
    #[serde(default = "completed")]
    status: AnalysisStatus,
}

fn completed() -> AnalysisStatus {
    AnalysisStatus::Completed
}

#[derive(Debug, Default, Deserialize)]
pub struct RankQuery {
    limit: Option<usize>,
}

impl RankQuery {
    fn resolve(&self, default: usize) -> ApiResult<usize> {
        let limit = self.limit.unwrap_or(default);
        if !(1..=MAX_RANK_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_RANK_LIMIT}, got {limit}"
            )));
        }
        Ok(limit)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("analysis {id} not found"))
}

pub async fn list_analyses(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<Analysis>>> {
    let store = state.analyses.clone();
    let analyses = blocking(move || store.list_for(&principal.name)).await?;
    Ok(Json(analyses))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Analysis>> {
    let store = state.analyses.clone();
    let analysis = blocking(move || store.get(id))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(analysis))
}

pub async fn create_analysis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateAnalysisRequest>,
) -> ApiResult<(StatusCode, Json<Analysis>)> {
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| request.analysis_type.as_str().to_string());

    let new = NewAnalysis {
        name,
        analysis_type: request.analysis_type,
        description: request.description,
        parameters: request.parameters,
        results: None,
        status: AnalysisStatus::Pending,
    };
    let store = state.analyses.clone();
    let analysis = blocking(move || store.create(new, &principal.name)).await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

pub async fn record_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordResultsRequest>,
) -> ApiResult<Json<Analysis>> {
    let store = state.analyses.clone();
    let analysis = blocking(move || store.record_results(id, &request.results, request.status))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(analysis))
}

pub async fn yearly_trends(State(state): State<AppState>) -> ApiResult<Json<Vec<PeriodStats>>> {
    let trends = with_snapshot(&state, |aggregator| aggregator.yearly_trends()).await?;
    Ok(Json(trends))
}

pub async fn breach_types(State(state): State<AppState>) -> ApiResult<Json<Vec<TypeStats>>> {
    let breakdown = with_snapshot(&state, |aggregator| aggregator.breach_type_breakdown()).await?;
    Ok(Json(breakdown))
}

pub async fn top_organizations(
    State(state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> ApiResult<Json<Vec<RankedGroup>>> {
    let limit = query.resolve(state.top_n)?;
    let ranking =
        with_snapshot(&state, move |aggregator| aggregator.top_by_organization(limit)).await?;
    Ok(Json(ranking))
}

pub async fn top_industries(
    State(state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> ApiResult<Json<Vec<RankedGroup>>> {
    let limit = query.resolve(state.top_n)?;
    let ranking =
        with_snapshot(&state, move |aggregator| aggregator.top_by_industry(limit)).await?;
    Ok(Json(ranking))
}

/// Forward parameters to the prediction service and save its answer as a
/// completed `predictive` analysis.
pub async fn predictive_analysis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<PredictionRequest>,
) -> ApiResult<Json<Analysis>> {
    let prediction = state.predictor.predict(&request).await.map_err(|e| {
        error!(error = %e, url = state.predictor.url(), "prediction request failed");
        AppError::Upstream("failed to get prediction from ML service".to_string())
    })?;

    let parameters =
        serde_json::to_value(&request).map_err(|e| AppError::Internal(e.to_string()))?;
    let new = NewAnalysis {
        name: AnalysisType::Predictive.as_str().to_string(),
        analysis_type: AnalysisType::Predictive,
        description: None,
        parameters,
        results: Some(prediction),
        status: AnalysisStatus::Completed,
    };

    let store = state.analyses.clone();
    let analysis = blocking(move || store.create(new, &principal.name)).await?;
    info!(id = %analysis.id, principal = %analysis.created_by, "predictive analysis saved");
    Ok(Json(analysis))
}
