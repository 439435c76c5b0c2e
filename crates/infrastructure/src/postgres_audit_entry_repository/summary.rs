use std::str::FromStr;

use chrono::{DateTime, Utc};

use domaris_application::{
    ActionCount, ActorCount, AuditSummary, ResourceTypeCount, SeverityCount, TimelineBucket,
};
use domaris_core::{AppError, AppResult, PrincipalId};
use domaris_domain::{AuditActionKind, ResourceType, Severity};

use super::{
    ActorCountRow, DayCountRow, KeyCountRow, PostgresAuditEntryRepository, count, stored_value,
};

impl PostgresAuditEntryRepository {
    pub(super) async fn summarize_impl(
        &self,
        since: DateTime<Utc>,
        actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary> {
        let actor_id = actor_id.map(|actor_id| actor_id.as_i64());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM audit_entries
            WHERE created_at >= $1 AND ($2::BIGINT IS NULL OR actor_id = $2)
            "#,
        )
        .bind(since)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit entries: {error}")))?;

        let by_action = self
            .count_by_column("action", since, actor_id)
            .await?
            .into_iter()
            .map(|row| {
                Ok(ActionCount {
                    action: AuditActionKind::from_str(&row.key).map_err(stored_value)?,
                    count: count(row.count),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let by_severity = self
            .count_by_column("severity", since, actor_id)
            .await?
            .into_iter()
            .map(|row| {
                Ok(SeverityCount {
                    severity: Severity::from_str(&row.key).map_err(stored_value)?,
                    count: count(row.count),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let by_resource_type = self
            .count_by_column("resource_type", since, actor_id)
            .await?
            .into_iter()
            .map(|row| {
                Ok(ResourceTypeCount {
                    resource_type: ResourceType::from_str(&row.key).map_err(stored_value)?,
                    count: count(row.count),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let by_actor = sqlx::query_as::<_, ActorCountRow>(
            r#"
            SELECT
                actor_id,
                (array_agg(actor_display ORDER BY created_at DESC))[1] AS actor_display,
                COUNT(*) AS count
            FROM audit_entries
            WHERE created_at >= $1 AND ($2::BIGINT IS NULL OR actor_id = $2)
            GROUP BY actor_id
            ORDER BY count DESC, actor_id
            "#,
        )
        .bind(since)
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count audit entries by actor: {error}"))
        })?
        .into_iter()
        .map(|row| ActorCount {
            actor_id: row.actor_id.map(PrincipalId::new),
            actor_display: row.actor_display,
            count: count(row.count),
        })
        .collect();

        let by_day = sqlx::query_as::<_, DayCountRow>(
            r#"
            SELECT
                (created_at AT TIME ZONE 'UTC')::DATE AS day,
                COUNT(*) AS count
            FROM audit_entries
            WHERE created_at >= $1 AND ($2::BIGINT IS NULL OR actor_id = $2)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since)
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count audit entries by day: {error}"))
        })?
        .into_iter()
        .map(|row| TimelineBucket {
            day: row.day,
            count: count(row.count),
        })
        .collect();

        Ok(AuditSummary {
            total: count(total),
            by_action,
            by_severity,
            by_actor,
            by_resource_type,
            by_day,
        })
    }

    /// Groups by one of the fixed text columns; `column` is never user input.
    async fn count_by_column(
        &self,
        column: &'static str,
        since: DateTime<Utc>,
        actor_id: Option<i64>,
    ) -> AppResult<Vec<KeyCountRow>> {
        sqlx::query_as::<_, KeyCountRow>(&format!(
            r#"
            SELECT {column} AS key, COUNT(*) AS count
            FROM audit_entries
            WHERE created_at >= $1
                AND ($2::BIGINT IS NULL OR actor_id = $2)
                AND {column} IS NOT NULL
            GROUP BY {column}
            "#
        ))
        .bind(since)
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count audit entries by {column}: {error}"))
        })
    }
}
