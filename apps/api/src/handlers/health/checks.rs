use sqlx::PgPool;

use super::dependency_status;
use crate::dto::HealthDependencyStatus;

pub(super) async fn check_postgres(pool: Option<PgPool>) -> HealthDependencyStatus {
    let Some(pool) = pool else {
        return dependency_status("disabled", None);
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => dependency_status("ok", None),
        Err(error) => dependency_status("error", Some(format!("postgres check failed: {error}"))),
    }
}
