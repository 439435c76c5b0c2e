use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

mod checks;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = checks::check_postgres(state.postgres_pool.clone()).await;

    let ready = postgres.status != "error";
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if ready { "ok" } else { "degraded" },
            ready,
            postgres,
        }),
    )
}

fn dependency_status(status: &'static str, detail: Option<String>) -> HealthDependencyStatus {
    HealthDependencyStatus { status, detail }
}
