use std::sync::Arc;

use domaris_application::ActivityLogSettings;
use domaris_infrastructure::{
    Argon2PasswordHasher, PostgresAuditEntryRepository, PostgresPrincipalRepository,
    PostgresResourceStore,
};
use sqlx::PgPool;

use crate::state::AppState;

pub fn build_app_state(pool: PgPool, settings: ActivityLogSettings) -> AppState {
    let mut app_state = AppState::from_ports(
        Arc::new(PostgresAuditEntryRepository::new(pool.clone())),
        Arc::new(PostgresPrincipalRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(PostgresResourceStore::new(pool.clone())),
        settings,
    );
    app_state.postgres_pool = Some(pool);
    app_state
}
