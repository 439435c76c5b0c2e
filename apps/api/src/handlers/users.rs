use axum::Json;
use axum::extract::{Extension, Path, State};
use domaris_core::{Principal, PrincipalId};
use domaris_domain::RequestMeta;

use crate::dto::PrincipalResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<PrincipalResponse>>> {
    let principals = state.principal_service.list(&principal).await?;

    Ok(Json(principals.into_iter().map(Into::into).collect()))
}

pub async fn deactivate_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request_meta): Extension<RequestMeta>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<PrincipalResponse>> {
    let updated = state
        .principal_service
        .deactivate(&principal, PrincipalId::new(user_id), request_meta)
        .await?;

    Ok(Json(updated.into()))
}

pub async fn activate_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request_meta): Extension<RequestMeta>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<PrincipalResponse>> {
    let updated = state
        .principal_service
        .activate(&principal, PrincipalId::new(user_id), request_meta)
        .await?;

    Ok(Json(updated.into()))
}
