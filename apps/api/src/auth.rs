use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use domaris_core::{AppError, Principal, RoleContext};
use domaris_domain::RequestMeta;
use tower_sessions::Session;

use crate::dto::{LoginRequest, SessionPrincipalResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated principal id.
pub const SESSION_PRINCIPAL_KEY: &str = "principal_id";

pub async fn login_handler(
    State(state): State<AppState>,
    Extension(request_meta): Extension<RequestMeta>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<SessionPrincipalResponse>> {
    let principal = state
        .principal_service
        .authenticate(&payload.email, &payload.password, request_meta)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to rotate session id: {error}")))?;
    session
        .insert(SESSION_PRINCIPAL_KEY, principal.id())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok(Json(SessionPrincipalResponse::new(
        &principal,
        principal.role_context(),
    )))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request_meta): Extension<RequestMeta>,
    session: Session,
) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    state.principal_service.logout(&principal, request_meta).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extension(principal): Extension<Principal>,
    Extension(role_context): Extension<RoleContext>,
) -> Json<SessionPrincipalResponse> {
    Json(SessionPrincipalResponse::new(&principal, role_context))
}
