use std::sync::Arc;

use uuid::Uuid;

use domaris_core::{AppError, AppResult, Principal};
use domaris_domain::{AccessAction, AuditEntry, RequestMeta, ResourceType, Severity};

use crate::{
    AccessControlService, ActivityAuditRecorder, AuditEntryQuery, AuditEntryRepository,
    AuditPurgeResult, AuditStats, RawAuditInput,
};

mod stats;

/// Tunables for the activity log surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityLogSettings {
    /// Retention window used when a cleanup request omits `days`.
    pub purge_default_days: u32,
    /// Statistics window used when a stats request omits `days`.
    pub stats_default_days: u32,
}

impl Default for ActivityLogSettings {
    fn default() -> Self {
        Self {
            purge_default_days: 90,
            stats_default_days: 30,
        }
    }
}

/// Read and administration use-cases over the activity log.
///
/// Admins see every entry; everybody else only sees entries they wrote.
#[derive(Clone)]
pub struct ActivityLogService {
    repository: Arc<dyn AuditEntryRepository>,
    recorder: ActivityAuditRecorder,
    access_control: AccessControlService,
    settings: ActivityLogSettings,
}

impl ActivityLogService {
    /// Number of entries returned by [`Self::mine`].
    pub const MINE_LIMIT: usize = 50;

    /// Creates the service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditEntryRepository>,
        recorder: ActivityAuditRecorder,
        settings: ActivityLogSettings,
    ) -> Self {
        Self {
            repository,
            recorder,
            access_control: AccessControlService::new(),
            settings,
        }
    }

    /// Returns the configured settings.
    #[must_use]
    pub fn settings(&self) -> ActivityLogSettings {
        self.settings
    }

    /// Lists entries visible to `actor`, newest first.
    pub async fn list(
        &self,
        actor: &Principal,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        self.access_control
            .require(actor, AccessAction::List, ResourceType::AuditLog, None)?;

        self.repository
            .list(&scoped(actor, query).normalized())
            .await
    }

    /// Returns one entry. Entries outside the actor's visibility are reported as missing.
    pub async fn get(&self, actor: &Principal, entry_id: Uuid) -> AppResult<AuditEntry> {
        self.access_control
            .require(actor, AccessAction::View, ResourceType::AuditLog, None)?;

        self.repository
            .find(entry_id)
            .await?
            .filter(|entry| actor.is_admin() || entry.actor_id() == Some(actor.id()))
            .ok_or_else(|| AppError::NotFound(format!("activity log entry '{entry_id}' not found")))
    }

    /// Returns the actor's own most recent entries.
    pub async fn mine(&self, actor: &Principal) -> AppResult<Vec<AuditEntry>> {
        self.access_control
            .require(actor, AccessAction::List, ResourceType::AuditLog, None)?;

        self.repository
            .list(&AuditEntryQuery {
                actor_id: Some(actor.id()),
                limit: Self::MINE_LIMIT,
                ..AuditEntryQuery::default()
            })
            .await
    }

    /// Lists critical entries visible to `actor`.
    pub async fn critical(
        &self,
        actor: &Principal,
        query: AuditEntryQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        self.list(
            actor,
            AuditEntryQuery {
                severity: Some(Severity::Critical),
                ..query
            },
        )
        .await
    }

    /// Computes statistics over the trailing `days` window.
    pub async fn stats(&self, actor: &Principal, days: Option<u32>) -> AppResult<AuditStats> {
        self.access_control
            .require(actor, AccessAction::List, ResourceType::AuditLog, None)?;

        let days = days.unwrap_or(self.settings.stats_default_days);
        stats::compute(self.repository.as_ref(), actor, days).await
    }

    /// Records a manual entry written by `actor`.
    pub async fn create(
        &self,
        actor: &Principal,
        input: RawAuditInput,
        request: RequestMeta,
    ) -> AppResult<AuditEntry> {
        self.recorder.record_raw(actor, input, request).await
    }

    /// Purges old non-critical entries.
    pub async fn cleanup(&self, actor: &Principal, days: Option<u32>) -> AppResult<AuditPurgeResult> {
        let days = days.unwrap_or(self.settings.purge_default_days);
        self.recorder.purge(actor, days, &[Severity::Critical]).await
    }
}

fn scoped(actor: &Principal, query: AuditEntryQuery) -> AuditEntryQuery {
    if actor.is_admin() {
        query
    } else {
        AuditEntryQuery {
            actor_id: Some(actor.id()),
            ..query
        }
    }
}

#[cfg(test)]
mod tests;
