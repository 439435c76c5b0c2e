use std::str::FromStr;

use chrono::{DateTime, Utc};
use domaris_application::{
    ActionCount, ActorCount, AuditEntryQuery, AuditPurgeResult, AuditStats, RawAuditInput,
    ResourceTypeCount, SeverityCount, TimelineBucket,
};
use domaris_core::{AppError, PrincipalId};
use domaris_domain::{AuditActionKind, AuditEntry, ResourceType, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::timestamp;

/// API representation of one activity log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-log-entry-response.ts"
)]
pub struct ActivityLogEntryResponse {
    pub entry_id: String,
    pub created_at: String,
    #[ts(type = "number | null")]
    pub actor_id: Option<i64>,
    pub actor_display: Option<String>,
    pub action: String,
    pub action_label: String,
    pub description: String,
    pub severity: String,
    pub resource_type: Option<String>,
    #[ts(type = "number | null")]
    pub resource_id: Option<i64>,
    pub resource_display: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub changes: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<AuditEntry> for ActivityLogEntryResponse {
    fn from(value: AuditEntry) -> Self {
        let resource = value.resource();
        Self {
            entry_id: value.entry_id().to_string(),
            created_at: timestamp(value.created_at()),
            actor_id: value.actor_id().map(|actor_id| actor_id.as_i64()),
            actor_display: value.actor_display().map(ToOwned::to_owned),
            action: value.action().as_str().to_owned(),
            action_label: value.action().label().to_owned(),
            description: value.description().to_owned(),
            severity: value.severity().as_str().to_owned(),
            resource_type: resource.map(|resource| resource.resource_type.as_str().to_owned()),
            resource_id: resource.and_then(|resource| resource.resource_id),
            resource_display: resource.map(|resource| resource.display.clone()),
            changes: value.changes().cloned(),
            ip_address: value.request().ip_address.clone(),
            user_agent: value.request().user_agent.clone(),
        }
    }
}

/// Query string accepted by the activity log listings.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityLogListParams {
    pub actor_id: Option<i64>,
    pub action: Option<String>,
    pub severity: Option<String>,
    pub resource_type: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TryFrom<ActivityLogListParams> for AuditEntryQuery {
    type Error = AppError;

    fn try_from(value: ActivityLogListParams) -> Result<Self, Self::Error> {
        Ok(Self {
            actor_id: value.actor_id.map(PrincipalId::new),
            action: parse_optional::<AuditActionKind>(value.action)?,
            severity: parse_optional::<Severity>(value.severity)?,
            resource_type: parse_optional::<ResourceType>(value.resource_type)?,
            created_from: value.created_from,
            created_to: value.created_to,
            search: value.search,
            limit: value.limit.unwrap_or(Self::DEFAULT_LIMIT),
            offset: value.offset.unwrap_or(0),
        })
    }
}

fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = AppError>,
{
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| T::from_str(value.trim()))
        .transpose()
}

/// Incoming payload for a manual activity log entry.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-activity-log-request.ts"
)]
pub struct CreateActivityLogRequest {
    pub action: String,
    pub description: String,
    pub severity: Option<String>,
    pub resource_type: Option<String>,
    #[ts(type = "number | null")]
    pub resource_id: Option<i64>,
    pub resource_display: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub changes: Option<Value>,
}

impl From<CreateActivityLogRequest> for RawAuditInput {
    fn from(value: CreateActivityLogRequest) -> Self {
        Self {
            action: value.action,
            description: value.description,
            severity: value.severity,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            resource_display: value.resource_display,
            changes: value.changes,
        }
    }
}

/// Query string accepted by the statistics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityStatsParams {
    pub days: Option<u32>,
}

/// Count for one grouping key.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-count-response.ts"
)]
pub struct ActivityCountResponse {
    pub key: String,
    pub label: String,
    #[ts(type = "number")]
    pub count: u64,
}

impl From<ActionCount> for ActivityCountResponse {
    fn from(value: ActionCount) -> Self {
        Self {
            key: value.action.as_str().to_owned(),
            label: value.action.label().to_owned(),
            count: value.count,
        }
    }
}

impl From<SeverityCount> for ActivityCountResponse {
    fn from(value: SeverityCount) -> Self {
        Self {
            key: value.severity.as_str().to_owned(),
            label: value.severity.as_str().to_owned(),
            count: value.count,
        }
    }
}

impl From<ResourceTypeCount> for ActivityCountResponse {
    fn from(value: ResourceTypeCount) -> Self {
        Self {
            key: value.resource_type.as_str().to_owned(),
            label: value.resource_type.as_str().replace('_', " "),
            count: value.count,
        }
    }
}

/// Count for one actor.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-actor-count-response.ts"
)]
pub struct ActivityActorCountResponse {
    #[ts(type = "number | null")]
    pub actor_id: Option<i64>,
    pub actor_display: Option<String>,
    #[ts(type = "number")]
    pub count: u64,
}

impl From<ActorCount> for ActivityActorCountResponse {
    fn from(value: ActorCount) -> Self {
        Self {
            actor_id: value.actor_id.map(|actor_id| actor_id.as_i64()),
            actor_display: value.actor_display,
            count: value.count,
        }
    }
}

/// Entry count for one UTC day.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-timeline-bucket-response.ts"
)]
pub struct ActivityTimelineBucketResponse {
    pub date: String,
    #[ts(type = "number")]
    pub count: u64,
}

impl From<TimelineBucket> for ActivityTimelineBucketResponse {
    fn from(value: TimelineBucket) -> Self {
        Self {
            date: value.day.format("%Y-%m-%d").to_string(),
            count: value.count,
        }
    }
}

/// Activity statistics over a trailing window.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-stats-response.ts"
)]
pub struct ActivityStatsResponse {
    pub window_days: u32,
    pub since: String,
    #[ts(type = "number")]
    pub total_activities: u64,
    pub by_action: Vec<ActivityCountResponse>,
    pub by_severity: Vec<ActivityCountResponse>,
    pub by_user: Vec<ActivityActorCountResponse>,
    pub by_resource_type: Vec<ActivityCountResponse>,
    pub recent_critical: Vec<ActivityLogEntryResponse>,
    pub timeline: Vec<ActivityTimelineBucketResponse>,
}

impl From<AuditStats> for ActivityStatsResponse {
    fn from(value: AuditStats) -> Self {
        Self {
            window_days: value.window_days,
            since: timestamp(value.since),
            total_activities: value.total,
            by_action: value.by_action.into_iter().map(Into::into).collect(),
            by_severity: value.by_severity.into_iter().map(Into::into).collect(),
            by_user: value.top_actors.into_iter().map(Into::into).collect(),
            by_resource_type: value
                .top_resource_types
                .into_iter()
                .map(Into::into)
                .collect(),
            recent_critical: value.recent_critical.into_iter().map(Into::into).collect(),
            timeline: value.timeline.into_iter().map(Into::into).collect(),
        }
    }
}

/// Incoming payload for the retention sweep.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-cleanup-request.ts"
)]
pub struct ActivityCleanupRequest {
    #[serde(default)]
    pub days: Option<u32>,
}

/// Retention sweep outcome.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/activity-cleanup-response.ts"
)]
pub struct ActivityCleanupResponse {
    #[ts(type = "number")]
    pub deleted: u64,
    pub older_than_days: u32,
    pub cutoff: String,
    pub excluded_severities: Vec<String>,
    pub message: String,
}

impl From<AuditPurgeResult> for ActivityCleanupResponse {
    fn from(value: AuditPurgeResult) -> Self {
        Self {
            deleted: value.deleted_count,
            older_than_days: value.older_than_days,
            cutoff: timestamp(value.cutoff),
            excluded_severities: value
                .excluded_severities
                .iter()
                .map(|severity| severity.as_str().to_owned())
                .collect(),
            message: format!(
                "Deleted activity logs older than {} days",
                value.older_than_days
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use domaris_application::AuditEntryQuery;
    use domaris_domain::{AuditActionKind, ResourceType};

    use super::ActivityLogListParams;

    #[test]
    fn list_params_parse_into_typed_query() {
        let query = AuditEntryQuery::try_from(ActivityLogListParams {
            action: Some("delete".to_owned()),
            resource_type: Some("cost_estimate".to_owned()),
            severity: Some(" ".to_owned()),
            ..ActivityLogListParams::default()
        });

        let Ok(query) = query else {
            panic!("valid params should parse");
        };
        assert_eq!(query.action, Some(AuditActionKind::Delete));
        assert_eq!(query.resource_type, Some(ResourceType::CostEstimate));
        assert_eq!(query.severity, None);
        assert_eq!(query.limit, AuditEntryQuery::DEFAULT_LIMIT);
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let query = AuditEntryQuery::try_from(ActivityLogListParams {
            action: Some("teleport".to_owned()),
            ..ActivityLogListParams::default()
        });
        assert!(query.is_err());
    }
}
