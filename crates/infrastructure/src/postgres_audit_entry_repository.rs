use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use domaris_application::{AuditEntryQuery, AuditEntryRepository, AuditSummary};
use domaris_core::{AppError, AppResult, PrincipalId};
use domaris_domain::{
    AuditActionKind, AuditEntry, NewAuditEntry, RequestMeta, ResourceRef, ResourceType, Severity,
};

/// Serialises appends so `created_at` stays strictly increasing.
const APPEND_LOCK_KEY: i64 = 0x646f_6d61_7269_7301;

/// PostgreSQL-backed append-only audit store.
#[derive(Clone)]
pub struct PostgresAuditEntryRepository {
    pool: PgPool,
}

impl PostgresAuditEntryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    entry_id: Uuid,
    created_at: DateTime<Utc>,
    actor_id: Option<i64>,
    actor_display: Option<String>,
    action: String,
    description: String,
    severity: String,
    resource_type: Option<String>,
    resource_id: Option<i64>,
    resource_display: Option<String>,
    changes: Option<Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = AppError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let action = AuditActionKind::from_str(row.action.as_str()).map_err(stored_value)?;
        let severity = Severity::from_str(row.severity.as_str()).map_err(stored_value)?;
        let resource = row
            .resource_type
            .as_deref()
            .map(ResourceType::from_str)
            .transpose()
            .map_err(stored_value)?
            .map(|resource_type| ResourceRef {
                resource_type,
                resource_id: row.resource_id,
                display: row.resource_display.unwrap_or_default(),
            });

        Ok(AuditEntry::new(
            row.entry_id,
            row.created_at,
            NewAuditEntry {
                actor_id: row.actor_id.map(PrincipalId::new),
                actor_display: row.actor_display,
                action,
                description: row.description,
                severity,
                resource,
                changes: row.changes,
                request: RequestMeta {
                    ip_address: row.ip_address,
                    user_agent: row.user_agent,
                },
            },
        ))
    }
}

fn stored_value(error: AppError) -> AppError {
    AppError::Internal(format!("invalid audit entry row: {error}"))
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Escapes `LIKE` metacharacters so the search term matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        entry_id,
        created_at,
        actor_id,
        actor_display,
        action,
        description,
        severity,
        resource_type,
        resource_id,
        resource_display,
        changes,
        ip_address,
        user_agent
    FROM audit_entries
"#;

#[derive(Debug, FromRow)]
struct KeyCountRow {
    key: String,
    count: i64,
}

#[derive(Debug, FromRow)]
struct ActorCountRow {
    actor_id: Option<i64>,
    actor_display: Option<String>,
    count: i64,
}

#[derive(Debug, FromRow)]
struct DayCountRow {
    day: NaiveDate,
    count: i64,
}

mod summary;

#[async_trait]
impl AuditEntryRepository for PostgresAuditEntryRepository {
    async fn append(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start audit append transaction: {error}"))
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to acquire audit append lock: {error}"))
            })?;

        let entry_id = Uuid::new_v4();
        let resource = entry.resource.as_ref();
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO audit_entries (
                entry_id,
                created_at,
                actor_id,
                actor_display,
                action,
                description,
                severity,
                resource_type,
                resource_id,
                resource_display,
                changes,
                ip_address,
                user_agent
            )
            VALUES (
                $1,
                GREATEST(
                    clock_timestamp(),
                    COALESCE(
                        (SELECT max(created_at) FROM audit_entries) + interval '1 microsecond',
                        clock_timestamp()
                    )
                ),
                $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            )
            RETURNING created_at
            "#,
        )
        .bind(entry_id)
        .bind(entry.actor_id.map(|actor_id| actor_id.as_i64()))
        .bind(entry.actor_display.as_deref())
        .bind(entry.action.as_str())
        .bind(entry.description.as_str())
        .bind(entry.severity.as_str())
        .bind(resource.map(|resource| resource.resource_type.as_str()))
        .bind(resource.and_then(|resource| resource.resource_id))
        .bind(resource.map(|resource| resource.display.as_str()))
        .bind(entry.changes.as_ref())
        .bind(entry.request.ip_address.as_deref())
        .bind(entry.request.user_agent.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit audit entry: {error}"))
        })?;

        Ok(AuditEntry::new(entry_id, created_at, entry))
    }

    async fn find(&self, entry_id: Uuid) -> AppResult<Option<AuditEntry>> {
        let row = sqlx::query_as::<_, AuditEntryRow>(&format!(
            "{SELECT_COLUMNS} WHERE entry_id = $1"
        ))
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find audit entry: {error}")))?;

        row.map(AuditEntry::try_from).transpose()
    }

    async fn list(&self, query: &AuditEntryQuery) -> AppResult<Vec<AuditEntry>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditEntryRow>(&format!(
            r#"{SELECT_COLUMNS}
            WHERE ($1::BIGINT IS NULL OR actor_id = $1)
                AND ($2::TEXT IS NULL OR action = $2)
                AND ($3::TEXT IS NULL OR severity = $3)
                AND ($4::TEXT IS NULL OR resource_type = $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
                AND ($6::TIMESTAMPTZ IS NULL OR created_at <= $6)
                AND (
                    $7::TEXT IS NULL
                    OR description ILIKE $7
                    OR resource_display ILIKE $7
                    OR resource_type ILIKE $7
                )
            ORDER BY created_at DESC
            LIMIT $8
            OFFSET $9
            "#
        ))
        .bind(query.actor_id.map(|actor_id| actor_id.as_i64()))
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.severity.map(|severity| severity.as_str()))
        .bind(query.resource_type.map(|resource_type| resource_type.as_str()))
        .bind(query.created_from)
        .bind(query.created_to)
        .bind(query.search.as_deref().map(like_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit entries: {error}")))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    async fn summarize(
        &self,
        since: DateTime<Utc>,
        actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary> {
        self.summarize_impl(since, actor_id).await
    }

    async fn purge(&self, cutoff: DateTime<Utc>, excluded: &[Severity]) -> AppResult<u64> {
        let excluded: Vec<String> = excluded
            .iter()
            .map(|severity| severity.as_str().to_owned())
            .collect();

        let result = sqlx::query(
            r#"
            DELETE FROM audit_entries
            WHERE created_at < $1
                AND NOT (severity = ANY($2))
            "#,
        )
        .bind(cutoff)
        .bind(excluded)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to purge audit entries: {error}")))?;

        Ok(result.rows_affected())
    }
}
