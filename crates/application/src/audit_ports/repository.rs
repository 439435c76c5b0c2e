use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domaris_core::{AppResult, PrincipalId};
use domaris_domain::{AuditEntry, NewAuditEntry, Severity};
use uuid::Uuid;

use super::query::AuditEntryQuery;
use super::stats::AuditSummary;

/// Append-only persistence port for audit entries.
///
/// Implementations assign `entry_id` and a strictly increasing `created_at`.
/// Entries are never updated; the only deletion path is [`Self::purge`].
#[async_trait]
pub trait AuditEntryRepository: Send + Sync {
    /// Persists one entry and returns it with its store-assigned identity.
    async fn append(&self, entry: NewAuditEntry) -> AppResult<AuditEntry>;

    /// Finds one entry by id.
    async fn find(&self, entry_id: Uuid) -> AppResult<Option<AuditEntry>>;

    /// Lists entries matching the query, newest first.
    async fn list(&self, query: &AuditEntryQuery) -> AppResult<Vec<AuditEntry>>;

    /// Aggregates entries created at or after `since`.
    ///
    /// `actor_id` narrows the aggregation to a single actor.
    async fn summarize(
        &self,
        since: DateTime<Utc>,
        actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary>;

    /// Deletes entries created strictly before `cutoff` whose severity is not
    /// in `excluded`. All-or-nothing; returns the exact number removed.
    async fn purge(&self, cutoff: DateTime<Utc>, excluded: &[Severity]) -> AppResult<u64>;
}
