use chrono::{DateTime, Utc};
use domaris_core::PrincipalId;
use domaris_domain::{AuditActionKind, AuditEntry, ResourceType, Severity};

/// Filters and pagination for audit log listing.
///
/// Results are always ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntryQuery {
    /// Only entries written by this actor.
    pub actor_id: Option<PrincipalId>,
    /// Only entries with this action kind.
    pub action: Option<AuditActionKind>,
    /// Only entries with this severity.
    pub severity: Option<Severity>,
    /// Only entries referencing this resource type.
    pub resource_type: Option<ResourceType>,
    /// Inclusive lower bound on creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring over description, display snapshot and resource type.
    pub search: Option<String>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl AuditEntryQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 50;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: usize = 200;

    /// Returns the query with its page size clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, Self::MAX_LIMIT);
        self.search = self
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());
        self
    }

    /// Returns whether one entry satisfies every filter of this query.
    ///
    /// Pagination is not applied here.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if self
            .actor_id
            .is_some_and(|actor_id| entry.actor_id() != Some(actor_id))
        {
            return false;
        }

        if self.action.is_some_and(|action| entry.action() != action) {
            return false;
        }

        if self
            .severity
            .is_some_and(|severity| entry.severity() != severity)
        {
            return false;
        }

        if self.resource_type.is_some_and(|resource_type| {
            entry.resource().map(|resource| resource.resource_type) != Some(resource_type)
        }) {
            return false;
        }

        if self
            .created_from
            .is_some_and(|created_from| entry.created_at() < created_from)
        {
            return false;
        }

        if self
            .created_to
            .is_some_and(|created_to| entry.created_at() > created_to)
        {
            return false;
        }

        match self.search.as_deref() {
            Some(search) => {
                let needle = search.to_lowercase();
                let resource = entry.resource();
                entry.description().to_lowercase().contains(&needle)
                    || resource
                        .is_some_and(|resource| resource.display.to_lowercase().contains(&needle))
                    || resource.is_some_and(|resource| {
                        resource.resource_type.as_str().contains(&needle)
                    })
            }
            None => true,
        }
    }
}

impl Default for AuditEntryQuery {
    fn default() -> Self {
        Self {
            actor_id: None,
            action: None,
            severity: None,
            resource_type: None,
            created_from: None,
            created_to: None,
            search: None,
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domaris_core::PrincipalId;
    use domaris_domain::{
        AuditActionKind, AuditEntry, NewAuditEntry, ResourceRef, ResourceType, Severity,
    };
    use uuid::Uuid;

    use super::AuditEntryQuery;

    fn entry() -> AuditEntry {
        AuditEntry::new(
            Uuid::new_v4(),
            Utc::now(),
            NewAuditEntry::new(AuditActionKind::Update, "PATCH request to /api/properties/3")
                .with_actor(PrincipalId::new(4), "Ana")
                .with_severity(Severity::Medium)
                .with_resource(ResourceRef::new(ResourceType::Property, 3, "Harbor Loft")),
        )
    }

    #[test]
    fn search_covers_description_snapshot_and_type() {
        let entry = entry();
        for term in ["patch", "HARBOR", "property"] {
            let query = AuditEntryQuery {
                search: Some(term.to_owned()),
                ..AuditEntryQuery::default()
            };
            assert!(query.matches(&entry), "{term}");
        }

        let query = AuditEntryQuery {
            search: Some("invoice".to_owned()),
            ..AuditEntryQuery::default()
        };
        assert!(!query.matches(&entry));
    }

    #[test]
    fn filters_combine_conjunctively() {
        let entry = entry();
        let query = AuditEntryQuery {
            actor_id: Some(PrincipalId::new(4)),
            severity: Some(Severity::Medium),
            resource_type: Some(ResourceType::Property),
            ..AuditEntryQuery::default()
        };
        assert!(query.matches(&entry));

        let query = AuditEntryQuery {
            actor_id: Some(PrincipalId::new(4)),
            severity: Some(Severity::Critical),
            ..AuditEntryQuery::default()
        };
        assert!(!query.matches(&entry));
    }

    #[test]
    fn normalized_clamps_limit_and_blank_search() {
        let query = AuditEntryQuery {
            limit: 10_000,
            search: Some("   ".to_owned()),
            ..AuditEntryQuery::default()
        }
        .normalized();
        assert_eq!(query.limit, AuditEntryQuery::MAX_LIMIT);
        assert_eq!(query.search, None);

        let query = AuditEntryQuery {
            limit: 0,
            ..AuditEntryQuery::default()
        }
        .normalized();
        assert_eq!(query.limit, 1);
    }
}
