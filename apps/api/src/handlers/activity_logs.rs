use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use domaris_application::AuditEntryQuery;
use domaris_core::Principal;
use domaris_domain::{AuditEntry, RequestMeta};
use uuid::Uuid;

use crate::dto::{
    ActivityCleanupRequest, ActivityCleanupResponse, ActivityLogEntryResponse,
    ActivityLogListParams, ActivityStatsParams, ActivityStatsResponse, CreateActivityLogRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn into_responses(entries: Vec<AuditEntry>) -> Json<Vec<ActivityLogEntryResponse>> {
    Json(entries.into_iter().map(Into::into).collect())
}

pub async fn list_activity_logs_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ActivityLogListParams>,
) -> ApiResult<Json<Vec<ActivityLogEntryResponse>>> {
    let query = AuditEntryQuery::try_from(params)?;
    let entries = state.activity_log_service.list(&principal, query).await?;

    Ok(into_responses(entries))
}

pub async fn get_activity_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<Json<ActivityLogEntryResponse>> {
    let entry = state
        .activity_log_service
        .get(&principal, entry_id)
        .await?;

    Ok(Json(entry.into()))
}

pub async fn create_activity_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request_meta): Extension<RequestMeta>,
    Json(payload): Json<CreateActivityLogRequest>,
) -> ApiResult<(StatusCode, Json<ActivityLogEntryResponse>)> {
    let entry = state
        .activity_log_service
        .create(&principal, payload.into(), request_meta)
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn my_activity_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ActivityLogEntryResponse>>> {
    let entries = state.activity_log_service.mine(&principal).await?;

    Ok(into_responses(entries))
}

pub async fn critical_activity_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ActivityLogListParams>,
) -> ApiResult<Json<Vec<ActivityLogEntryResponse>>> {
    let query = AuditEntryQuery::try_from(params)?;
    let entries = state
        .activity_log_service
        .critical(&principal, query)
        .await?;

    Ok(into_responses(entries))
}

pub async fn activity_stats_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ActivityStatsParams>,
) -> ApiResult<Json<ActivityStatsResponse>> {
    let stats = state
        .activity_log_service
        .stats(&principal, params.days)
        .await?;

    Ok(Json(stats.into()))
}

pub async fn cleanup_activity_logs_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Option<Json<ActivityCleanupRequest>>,
) -> ApiResult<Json<ActivityCleanupResponse>> {
    let days = payload.and_then(|Json(payload)| payload.days);
    let result = state
        .activity_log_service
        .cleanup(&principal, days)
        .await?;

    Ok(Json(result.into()))
}
