use std::str::FromStr;

use chrono::{DateTime, Utc};
use domaris_core::{AppError, AppResult, PrincipalId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::resource::ResourceRef;

/// Maximum length of free-text audit fields (description, display snapshot).
pub const AUDIT_TEXT_MAX_LENGTH: usize = 500;

/// Kind of activity recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActionKind {
    /// Resource created.
    Create,
    /// Resource modified.
    Update,
    /// Resource removed.
    Delete,
    /// Resource read.
    View,
    /// Principal signed in.
    Login,
    /// Principal signed out.
    Logout,
    /// File uploaded.
    Upload,
    /// File downloaded.
    Download,
    /// Data exported.
    Export,
    /// Data imported.
    Import,
    /// Item approved.
    Approve,
    /// Item rejected.
    Reject,
    /// Principal assigned.
    Assign,
    /// Assignment removed.
    Unassign,
    /// Item archived or disabled.
    Archive,
    /// Item restored.
    Restore,
    /// Anything else.
    Other,
}

impl AuditActionKind {
    /// Returns the stable storage value for this action kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::View => "view",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Export => "export",
            Self::Import => "import",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Assign => "assign",
            Self::Unassign => "unassign",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Other => "other",
        }
    }

    /// Human readable label used in listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::View => "View",
            Self::Login => "Login",
            Self::Logout => "Logout",
            Self::Upload => "Upload",
            Self::Download => "Download",
            Self::Export => "Export",
            Self::Import => "Import",
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Assign => "Assign",
            Self::Unassign => "Unassign",
            Self::Archive => "Archive",
            Self::Restore => "Restore",
            Self::Other => "Other",
        }
    }

    /// Returns all known action kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditActionKind] = &[
            AuditActionKind::Create,
            AuditActionKind::Update,
            AuditActionKind::Delete,
            AuditActionKind::View,
            AuditActionKind::Login,
            AuditActionKind::Logout,
            AuditActionKind::Upload,
            AuditActionKind::Download,
            AuditActionKind::Export,
            AuditActionKind::Import,
            AuditActionKind::Approve,
            AuditActionKind::Reject,
            AuditActionKind::Assign,
            AuditActionKind::Unassign,
            AuditActionKind::Archive,
            AuditActionKind::Restore,
            AuditActionKind::Other,
        ];

        ALL
    }
}

impl FromStr for AuditActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}

/// Audit entry severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine activity.
    #[default]
    Low,
    /// Modifications worth reviewing.
    Medium,
    /// Destructive activity.
    High,
    /// Never removed by retention sweeps.
    Critical,
}

impl Severity {
    /// Returns the stable storage value for this severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns all severities, least severe first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }

    /// Default severity derived from the action kind.
    #[must_use]
    pub fn for_action(action: AuditActionKind) -> Self {
        match action {
            AuditActionKind::Update => Self::Medium,
            AuditActionKind::Delete => Self::High,
            _ => Self::Low,
        }
    }
}

impl FromStr for Severity {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown severity '{value}', expected one of: low, medium, high, critical"
            ))),
        }
    }
}

/// Requester metadata captured alongside an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Client network address.
    pub ip_address: Option<String>,
    /// Client user agent string.
    pub user_agent: Option<String>,
}

/// Audit entry before the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Acting principal; `None` for system activity.
    pub actor_id: Option<PrincipalId>,
    /// Actor display name at write time.
    pub actor_display: Option<String>,
    /// Action kind.
    pub action: AuditActionKind,
    /// Free-text description.
    pub description: String,
    /// Severity.
    pub severity: Severity,
    /// Affected resource snapshot.
    pub resource: Option<ResourceRef>,
    /// Structured change payload.
    pub changes: Option<Value>,
    /// Requester metadata.
    pub request: RequestMeta,
}

impl NewAuditEntry {
    /// Starts a new entry with `low` severity and no attachments.
    #[must_use]
    pub fn new(action: AuditActionKind, description: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            actor_display: None,
            action,
            description: description.into(),
            severity: Severity::Low,
            resource: None,
            changes: None,
            request: RequestMeta::default(),
        }
    }

    /// Sets the acting principal.
    #[must_use]
    pub fn with_actor(mut self, actor_id: PrincipalId, actor_display: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id);
        self.actor_display = Some(actor_display.into());
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attaches a resource snapshot.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Attaches a change payload.
    #[must_use]
    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Attaches requester metadata.
    #[must_use]
    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = request;
        self
    }

    /// Checks invariants and clamps free-text fields to storage limits.
    pub fn validate(mut self) -> AppResult<Self> {
        if self.description.trim().is_empty() {
            return Err(AppError::Validation(
                "audit description must not be empty".to_owned(),
            ));
        }

        if self.changes.as_ref().is_some_and(|changes| !changes.is_object()) {
            return Err(AppError::Validation(
                "audit changes must be a JSON object".to_owned(),
            ));
        }

        self.description = truncate_chars(self.description, AUDIT_TEXT_MAX_LENGTH);
        if let Some(resource) = self.resource.as_mut() {
            resource.display =
                truncate_chars(std::mem::take(&mut resource.display), AUDIT_TEXT_MAX_LENGTH);
        }

        Ok(self)
    }
}

fn truncate_chars(value: String, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_owned(),
        None => value,
    }
}

/// Immutable, persisted audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    entry_id: Uuid,
    created_at: DateTime<Utc>,
    actor_id: Option<PrincipalId>,
    actor_display: Option<String>,
    action: AuditActionKind,
    description: String,
    severity: Severity,
    resource: Option<ResourceRef>,
    changes: Option<Value>,
    request: RequestMeta,
}

impl AuditEntry {
    /// Materialises a stored entry from its store-assigned identity.
    #[must_use]
    pub fn new(entry_id: Uuid, created_at: DateTime<Utc>, entry: NewAuditEntry) -> Self {
        Self {
            entry_id,
            created_at,
            actor_id: entry.actor_id,
            actor_display: entry.actor_display,
            action: entry.action,
            description: entry.description,
            severity: entry.severity,
            resource: entry.resource,
            changes: entry.changes,
            request: entry.request,
        }
    }

    /// Returns the entry id.
    #[must_use]
    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    /// Returns the server-assigned creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the actor id, if any.
    #[must_use]
    pub fn actor_id(&self) -> Option<PrincipalId> {
        self.actor_id
    }

    /// Returns the actor display snapshot, if any.
    #[must_use]
    pub fn actor_display(&self) -> Option<&str> {
        self.actor_display.as_deref()
    }

    /// Returns the action kind.
    #[must_use]
    pub fn action(&self) -> AuditActionKind {
        self.action
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the affected resource snapshot.
    #[must_use]
    pub fn resource(&self) -> Option<&ResourceRef> {
        self.resource.as_ref()
    }

    /// Returns the change payload.
    #[must_use]
    pub fn changes(&self) -> Option<&Value> {
        self.changes.as_ref()
    }

    /// Returns requester metadata.
    #[must_use]
    pub fn request(&self) -> &RequestMeta {
        &self.request
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use domaris_core::PrincipalId;
    use serde_json::json;
    use uuid::Uuid;

    use super::{AUDIT_TEXT_MAX_LENGTH, AuditActionKind, AuditEntry, NewAuditEntry, Severity};
    use crate::{ResourceRef, ResourceType};

    #[test]
    fn action_kind_roundtrips_storage_value() {
        for kind in AuditActionKind::all() {
            let parsed = AuditActionKind::from_str(kind.as_str());
            assert!(matches!(parsed, Ok(value) if value == *kind));
        }
        assert!(AuditActionKind::from_str("explode").is_err());
    }

    #[test]
    fn severity_defaults_follow_action() {
        assert_eq!(Severity::for_action(AuditActionKind::Create), Severity::Low);
        assert_eq!(
            Severity::for_action(AuditActionKind::Update),
            Severity::Medium
        );
        assert_eq!(Severity::for_action(AuditActionKind::Delete), Severity::High);
        assert_eq!(Severity::for_action(AuditActionKind::Login), Severity::Low);
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn unknown_severity_is_rejected() {
        assert!(Severity::from_str("urgent").is_err());
        assert!(matches!(Severity::from_str("critical"), Ok(Severity::Critical)));
    }

    #[test]
    fn blank_description_is_rejected() {
        let entry = NewAuditEntry::new(AuditActionKind::Create, "   ").validate();
        assert!(entry.is_err());
    }

    #[test]
    fn non_object_changes_are_rejected() {
        let entry = NewAuditEntry::new(AuditActionKind::Update, "changed price")
            .with_changes(json!([1, 2, 3]))
            .validate();
        assert!(entry.is_err());
    }

    #[test]
    fn long_text_is_truncated_on_char_boundary() {
        let description = "é".repeat(AUDIT_TEXT_MAX_LENGTH + 20);
        let entry = NewAuditEntry::new(AuditActionKind::Update, description)
            .with_resource(ResourceRef::new(
                ResourceType::Property,
                1,
                "x".repeat(AUDIT_TEXT_MAX_LENGTH * 2),
            ))
            .validate();

        let Ok(entry) = entry else {
            panic!("entry should validate");
        };
        assert_eq!(entry.description.chars().count(), AUDIT_TEXT_MAX_LENGTH);
        assert_eq!(
            entry
                .resource
                .map(|resource| resource.display.len())
                .unwrap_or_default(),
            AUDIT_TEXT_MAX_LENGTH
        );
    }

    #[test]
    fn stored_entry_keeps_every_attachment() {
        let entry_id = Uuid::new_v4();
        let created_at = Utc::now();
        let entry = AuditEntry::new(
            entry_id,
            created_at,
            NewAuditEntry::new(AuditActionKind::Delete, "DELETE request to /api/documents/4")
                .with_actor(PrincipalId::new(7), "Dana Agent")
                .with_severity(Severity::High)
                .with_resource(ResourceRef::new(ResourceType::Document, 4, "Deed.pdf"))
                .with_changes(json!({"status": ["draft", "deleted"]})),
        );

        assert_eq!(entry.entry_id(), entry_id);
        assert_eq!(entry.created_at(), created_at);
        assert_eq!(entry.actor_id(), Some(PrincipalId::new(7)));
        assert_eq!(entry.actor_display(), Some("Dana Agent"));
        assert_eq!(entry.severity(), Severity::High);
        assert_eq!(
            entry.resource().map(|resource| resource.display.as_str()),
            Some("Deed.pdf")
        );
        assert!(entry.changes().is_some());
    }
}
