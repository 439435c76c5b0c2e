use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use domaris_application::{NewPrincipal, PrincipalCredentials, PrincipalRepository};
use domaris_core::{AppError, AppResult, Principal, PrincipalId, Role};

/// PostgreSQL-backed principal repository.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: i64,
    display_name: String,
    email: String,
    role: String,
    is_active: bool,
    password_hash: String,
}

impl PrincipalRow {
    fn into_principal(self) -> AppResult<Principal> {
        Ok(self.into_credentials()?.principal)
    }

    fn into_credentials(self) -> AppResult<PrincipalCredentials> {
        let role = Role::from_str(self.role.as_str()).map_err(|error| {
            AppError::Internal(format!("stored principal {} has bad role: {error}", self.id))
        })?;

        Ok(PrincipalCredentials {
            principal: Principal::new(
                PrincipalId::new(self.id),
                self.display_name,
                self.email,
                role,
                self.is_active,
            ),
            password_hash: self.password_hash,
        })
    }
}

const SELECT_COLUMNS: &str = "id, display_name, email, role, is_active, password_hash";

fn email_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an account with this email already exists".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

fn principal_not_found(principal_id: PrincipalId) -> AppError {
    AppError::NotFound(format!("principal '{principal_id}' not found"))
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals WHERE id = $1"
        ))
        .bind(principal_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find principal by id: {error}")))?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|credentials| credentials.principal))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<PrincipalCredentials>> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find principal by email: {error}"))
        })?;

        row.map(PrincipalRow::into_credentials).transpose()
    }

    async fn list(&self) -> AppResult<Vec<Principal>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list principals: {error}")))?;

        rows.into_iter().map(PrincipalRow::into_principal).collect()
    }

    async fn create(&self, principal: NewPrincipal) -> AppResult<Principal> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            INSERT INTO principals (display_name, email, role, password_hash)
            VALUES ($1, LOWER($2), $3, $4)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(principal.display_name.as_str())
        .bind(principal.email.as_str())
        .bind(principal.role.as_str())
        .bind(principal.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create principal"))?;

        debug!(principal_id = row.id, role = %principal.role.as_str(), "principal created");
        row.into_principal()
    }

    async fn set_role(&self, principal_id: PrincipalId, role: Role) -> AppResult<Principal> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            UPDATE principals
            SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(principal_id.as_i64())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set principal role: {error}")))?;

        row.ok_or_else(|| principal_not_found(principal_id))?
            .into_principal()
    }

    async fn set_active(
        &self,
        principal_id: PrincipalId,
        is_active: bool,
    ) -> AppResult<Principal> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            r#"
            UPDATE principals
            SET is_active = $2, updated_at = now()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(principal_id.as_i64())
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update principal status: {error}"))
        })?;

        row.ok_or_else(|| principal_not_found(principal_id))?
            .into_principal()
    }
}

#[cfg(test)]
mod tests;
