use std::sync::Arc;

use domaris_application::{
    ActivityAuditRecorder, ActivityLogService, ActivityLogSettings, AuditEntryRepository,
    PasswordHasher, PrincipalRepository, PrincipalService, ResourceService, ResourceStore,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub principal_service: PrincipalService,
    pub activity_log_service: ActivityLogService,
    pub resource_service: ResourceService,
    pub audit_recorder: ActivityAuditRecorder,
    pub postgres_pool: Option<PgPool>,
}

impl AppState {
    /// Wires every service over one set of ports.
    pub fn from_ports(
        audit_repository: Arc<dyn AuditEntryRepository>,
        principal_repository: Arc<dyn PrincipalRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        resource_store: Arc<dyn ResourceStore>,
        settings: ActivityLogSettings,
    ) -> Self {
        let audit_recorder = ActivityAuditRecorder::new(audit_repository.clone());

        Self {
            principal_service: PrincipalService::new(
                principal_repository,
                password_hasher,
                audit_recorder.clone(),
            ),
            activity_log_service: ActivityLogService::new(
                audit_repository,
                audit_recorder.clone(),
                settings,
            ),
            resource_service: ResourceService::new(resource_store),
            audit_recorder,
            postgres_pool: None,
        }
    }
}
