use chrono::{DateTime, NaiveDate, Utc};
use domaris_core::PrincipalId;
use domaris_domain::{AuditActionKind, AuditEntry, ResourceType, Severity};
use serde::Serialize;

/// Entry count for one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    /// Action kind.
    pub action: AuditActionKind,
    /// Number of entries.
    pub count: u64,
}

/// Entry count for one severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    /// Severity.
    pub severity: Severity,
    /// Number of entries.
    pub count: u64,
}

/// Entry count for one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorCount {
    /// Actor id; `None` groups system entries.
    pub actor_id: Option<PrincipalId>,
    /// Most recent display snapshot for the actor.
    pub actor_display: Option<String>,
    /// Number of entries.
    pub count: u64,
}

/// Entry count for one referenced resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceTypeCount {
    /// Resource type.
    pub resource_type: ResourceType,
    /// Number of entries.
    pub count: u64,
}

/// Entry count for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    /// UTC day.
    pub day: NaiveDate,
    /// Number of entries.
    pub count: u64,
}

/// Raw aggregation returned by the store. Groups are unordered and sparse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// Total entries in the window.
    pub total: u64,
    /// Counts per action kind.
    pub by_action: Vec<ActionCount>,
    /// Counts per severity.
    pub by_severity: Vec<SeverityCount>,
    /// Counts per actor.
    pub by_actor: Vec<ActorCount>,
    /// Counts per referenced resource type.
    pub by_resource_type: Vec<ResourceTypeCount>,
    /// Counts per day that has at least one entry.
    pub by_day: Vec<TimelineBucket>,
}

/// Activity statistics over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStats {
    /// Window length in days.
    pub window_days: u32,
    /// Window start.
    pub since: DateTime<Utc>,
    /// Total entries in the window.
    pub total: u64,
    /// Counts per action kind, most frequent first.
    pub by_action: Vec<ActionCount>,
    /// Counts per severity, most frequent first.
    pub by_severity: Vec<SeverityCount>,
    /// Ten most active actors.
    pub top_actors: Vec<ActorCount>,
    /// Ten most referenced resource types.
    pub top_resource_types: Vec<ResourceTypeCount>,
    /// Ten most recent critical entries.
    pub recent_critical: Vec<AuditEntry>,
    /// One bucket per day, oldest first, zero-filled.
    pub timeline: Vec<TimelineBucket>,
}
