mod activity_logs;
mod health;
mod principals;
mod resources;

pub use activity_logs::{
    ActivityActorCountResponse, ActivityCleanupRequest, ActivityCleanupResponse,
    ActivityCountResponse, ActivityLogEntryResponse, ActivityLogListParams,
    ActivityStatsParams, ActivityStatsResponse, ActivityTimelineBucketResponse,
    CreateActivityLogRequest,
};
pub use health::{HealthDependencyStatus, HealthResponse};
pub use principals::{LoginRequest, PrincipalResponse, SessionPrincipalResponse};
pub use resources::{CreateResourceRequest, ResourceResponse, UpdateResourceRequest};

fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::{
        ActivityActorCountResponse, ActivityCleanupRequest, ActivityCleanupResponse,
        ActivityCountResponse, ActivityLogEntryResponse, ActivityStatsResponse,
        ActivityTimelineBucketResponse, CreateActivityLogRequest, CreateResourceRequest,
        HealthDependencyStatus, HealthResponse, LoginRequest, PrincipalResponse,
        ResourceResponse, SessionPrincipalResponse, UpdateResourceRequest,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();
        ActivityLogEntryResponse::export(&config)?;
        ActivityCountResponse::export(&config)?;
        ActivityActorCountResponse::export(&config)?;
        ActivityTimelineBucketResponse::export(&config)?;
        ActivityStatsResponse::export(&config)?;
        ActivityCleanupRequest::export(&config)?;
        ActivityCleanupResponse::export(&config)?;
        CreateActivityLogRequest::export(&config)?;
        CreateResourceRequest::export(&config)?;
        UpdateResourceRequest::export(&config)?;
        ResourceResponse::export(&config)?;
        LoginRequest::export(&config)?;
        PrincipalResponse::export(&config)?;
        SessionPrincipalResponse::export(&config)?;
        HealthDependencyStatus::export(&config)?;
        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }
}
