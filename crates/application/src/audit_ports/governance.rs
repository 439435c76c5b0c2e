use chrono::{DateTime, Utc};
use domaris_domain::Severity;
use serde::Serialize;

/// Audit retention sweep result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditPurgeResult {
    /// Number of deleted entries.
    pub deleted_count: u64,
    /// Age threshold in days.
    pub older_than_days: u32,
    /// Entries created strictly before this instant were eligible.
    pub cutoff: DateTime<Utc>,
    /// Severities that were kept regardless of age.
    pub excluded_severities: Vec<Severity>,
}
