use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use domaris_application::{CreateResourceInput, ResourceMutation, UpdateMode};
use domaris_core::{AppError, Principal};
use domaris_domain::ResourceType;

use crate::dto::{CreateResourceRequest, ResourceResponse, UpdateResourceRequest};
use crate::error::ApiResult;
use crate::middleware::MutationTrail;
use crate::state::AppState;

type MutationResponse = (StatusCode, Extension<MutationTrail>, Json<ResourceResponse>);

fn mutation_response(status: StatusCode, mutation: ResourceMutation) -> ApiResult<MutationResponse> {
    let trail = MutationTrail::from(&mutation);
    let record = mutation.record.ok_or_else(|| {
        AppError::Internal("resource mutation returned no record".to_owned())
    })?;

    Ok((status, Extension(trail), Json(record.into())))
}

pub async fn list_resources_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<ResourceResponse>>> {
    let records = state
        .resource_service
        .list(&principal, resource_type)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub async fn get_resource_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ResourceResponse>> {
    let record = state
        .resource_service
        .get(&principal, resource_type, id)
        .await?;

    Ok(Json(record.into()))
}

pub async fn create_resource_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateResourceRequest>,
) -> ApiResult<MutationResponse> {
    let input = CreateResourceInput::try_from(payload)?;
    let mutation = state
        .resource_service
        .create(&principal, resource_type, input)
        .await?;

    mutation_response(StatusCode::CREATED, mutation)
}

pub async fn replace_resource_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateResourceRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = state
        .resource_service
        .update(
            &principal,
            resource_type,
            id,
            payload.into_input(UpdateMode::Replace),
        )
        .await?;

    mutation_response(StatusCode::OK, mutation)
}

pub async fn patch_resource_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateResourceRequest>,
) -> ApiResult<MutationResponse> {
    let mutation = state
        .resource_service
        .update(
            &principal,
            resource_type,
            id,
            payload.into_input(UpdateMode::Merge),
        )
        .await?;

    mutation_response(StatusCode::OK, mutation)
}

pub async fn delete_resource_handler(
    State(state): State<AppState>,
    Extension(resource_type): Extension<ResourceType>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Extension<MutationTrail>)> {
    let mutation = state
        .resource_service
        .delete(&principal, resource_type, id)
        .await?;

    Ok((StatusCode::NO_CONTENT, Extension(MutationTrail::from(&mutation))))
}
