use std::str::FromStr;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use tracing::{error, info};

use domaris_core::{AppError, AppResult, Principal};
use domaris_domain::{
    AccessAction, AuditActionKind, AuditEntry, NewAuditEntry, RequestMeta, ResourceRef,
    ResourceType, Severity,
};

use crate::{AccessControlService, AuditEntryRepository, AuditPurgeResult};

/// Untyped audit input as received from a transport layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAuditInput {
    /// Action kind storage value.
    pub action: String,
    /// Free-text description.
    pub description: String,
    /// Severity storage value; defaults to `low`.
    pub severity: Option<String>,
    /// Affected resource type storage value.
    pub resource_type: Option<String>,
    /// Affected resource id.
    pub resource_id: Option<i64>,
    /// Affected resource display snapshot.
    pub resource_display: Option<String>,
    /// Structured change payload.
    pub changes: Option<Value>,
}

/// Appends activity entries and runs the retention sweep.
#[derive(Clone)]
pub struct ActivityAuditRecorder {
    repository: Arc<dyn AuditEntryRepository>,
    access_control: AccessControlService,
}

impl ActivityAuditRecorder {
    /// Creates a recorder over an audit store.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditEntryRepository>) -> Self {
        Self {
            repository,
            access_control: AccessControlService::new(),
        }
    }

    /// Records an entry on a best-effort basis.
    ///
    /// Failures are reported through `tracing` and never reach the caller, so
    /// the audited operation's outcome is unaffected.
    pub async fn record(&self, entry: NewAuditEntry) -> Option<AuditEntry> {
        let action = entry.action;
        let actor_id = entry.actor_id;

        match self.try_record(entry).await {
            Ok(entry) => Some(entry),
            Err(error) => {
                error!(
                    action = action.as_str(),
                    actor_id = actor_id.map(|actor_id| actor_id.as_i64()),
                    %error,
                    "failed to record activity"
                );
                None
            }
        }
    }

    /// Records an entry and surfaces validation or store failures.
    pub async fn try_record(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let entry = entry.validate()?;
        self.repository.append(entry).await
    }

    /// Validates transport strings and records a manual entry for `actor`.
    pub async fn record_raw(
        &self,
        actor: &Principal,
        input: RawAuditInput,
        request: RequestMeta,
    ) -> AppResult<AuditEntry> {
        self.access_control
            .require(actor, AccessAction::Create, ResourceType::AuditLog, None)?;

        let action = AuditActionKind::from_str(input.action.trim())?;
        let severity = input
            .severity
            .as_deref()
            .map(|severity| Severity::from_str(severity.trim()))
            .transpose()?
            .unwrap_or_default();
        let resource = raw_resource_ref(
            input.resource_type.as_deref(),
            input.resource_id,
            input.resource_display,
        )?;

        let mut entry = NewAuditEntry::new(action, input.description)
            .with_actor(actor.id(), actor.display_name())
            .with_severity(severity)
            .with_request(request);
        if let Some(resource) = resource {
            entry = entry.with_resource(resource);
        }
        if let Some(changes) = input.changes {
            entry = entry.with_changes(changes);
        }

        self.try_record(entry).await
    }

    /// Deletes entries older than `older_than_days`, never touching critical ones.
    ///
    /// Restricted to principals allowed to delete audit logs. A summary entry
    /// describing the sweep is appended afterwards.
    pub async fn purge(
        &self,
        actor: &Principal,
        older_than_days: u32,
        excluded: &[Severity],
    ) -> AppResult<AuditPurgeResult> {
        self.access_control
            .require(actor, AccessAction::Delete, ResourceType::AuditLog, None)?;

        if older_than_days == 0 {
            return Err(AppError::Validation(
                "older_than_days must be at least 1".to_owned(),
            ));
        }

        let mut excluded_severities = excluded.to_vec();
        excluded_severities.push(Severity::Critical);
        excluded_severities.sort();
        excluded_severities.dedup();

        let cutoff = Utc::now()
            .checked_sub_signed(TimeDelta::days(i64::from(older_than_days)))
            .ok_or_else(|| AppError::Validation("older_than_days is out of range".to_owned()))?;

        let deleted_count = self
            .repository
            .purge(cutoff, excluded_severities.as_slice())
            .await?;

        info!(
            actor_id = %actor.id(),
            deleted_count,
            older_than_days,
            "purged activity log entries"
        );

        let excluded_labels: Vec<&str> = excluded_severities
            .iter()
            .map(|severity| severity.as_str())
            .collect();
        self.record(
            NewAuditEntry::new(
                AuditActionKind::Delete,
                format!(
                    "purged {deleted_count} activity log entries older than {older_than_days} day(s)"
                ),
            )
            .with_actor(actor.id(), actor.display_name())
            .with_severity(Severity::High)
            .with_changes(json!({
                "deleted_count": deleted_count,
                "older_than_days": older_than_days,
                "excluded_severities": excluded_labels,
            })),
        )
        .await;

        Ok(AuditPurgeResult {
            deleted_count,
            older_than_days,
            cutoff,
            excluded_severities,
        })
    }
}

fn raw_resource_ref(
    resource_type: Option<&str>,
    resource_id: Option<i64>,
    resource_display: Option<String>,
) -> AppResult<Option<ResourceRef>> {
    let Some(resource_type) = resource_type.map(str::trim).filter(|value| !value.is_empty())
    else {
        if resource_id.is_some() || resource_display.is_some() {
            return Err(AppError::Validation(
                "resource_type is required when a resource id or display is given".to_owned(),
            ));
        }
        return Ok(None);
    };

    let resource_type = ResourceType::from_str(resource_type)?;
    let display = resource_display
        .filter(|display| !display.trim().is_empty())
        .unwrap_or_else(|| match resource_id {
            Some(resource_id) => format!("{} #{resource_id}", resource_type.as_str()),
            None => resource_type.as_str().to_owned(),
        });

    Ok(Some(ResourceRef {
        resource_type,
        resource_id,
        display,
    }))
}
