use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use domaris_application::{
    ActionCount, ActorCount, AuditEntryQuery, AuditEntryRepository, AuditSummary,
    ResourceTypeCount, SeverityCount, TimelineBucket,
};
use domaris_core::{AppResult, PrincipalId};
use domaris_domain::{AuditEntry, NewAuditEntry, ResourceType, Severity};

/// In-memory audit store for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryAuditEntryRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditEntryRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditEntryRepository for InMemoryAuditEntryRepository {
    async fn append(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let mut entries = self.entries.write().await;

        // Entries are pushed in timestamp order, so the last one is the latest.
        let now = Utc::now();
        let created_at = match entries.last() {
            Some(last) => now.max(last.created_at() + TimeDelta::microseconds(1)),
            None => now,
        };

        let entry = AuditEntry::new(Uuid::new_v4(), created_at, entry);
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn find(&self, entry_id: Uuid) -> AppResult<Option<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| entry.entry_id() == entry_id)
            .cloned())
    }

    async fn list(&self, query: &AuditEntryQuery) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.read().await;

        Ok(entries
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn summarize(
        &self,
        since: DateTime<Utc>,
        actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary> {
        let entries = self.entries.read().await;

        let mut total = 0_u64;
        let mut by_action: HashMap<_, u64> = HashMap::new();
        let mut by_severity: HashMap<Severity, u64> = HashMap::new();
        let mut by_actor: HashMap<Option<PrincipalId>, (Option<String>, u64)> = HashMap::new();
        let mut by_resource_type: HashMap<ResourceType, u64> = HashMap::new();
        let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();

        // Newest first, so the first display seen per actor is the latest.
        for entry in entries
            .iter()
            .rev()
            .filter(|entry| entry.created_at() >= since)
            .filter(|entry| actor_id.is_none() || entry.actor_id() == actor_id)
        {
            total += 1;
            *by_action.entry(entry.action()).or_default() += 1;
            *by_severity.entry(entry.severity()).or_default() += 1;
            by_actor
                .entry(entry.actor_id())
                .or_insert_with(|| (entry.actor_display().map(str::to_owned), 0))
                .1 += 1;
            if let Some(resource) = entry.resource() {
                *by_resource_type.entry(resource.resource_type).or_default() += 1;
            }
            *by_day.entry(entry.created_at().date_naive()).or_default() += 1;
        }

        let mut by_actor: Vec<ActorCount> = by_actor
            .into_iter()
            .map(|(actor_id, (actor_display, count))| ActorCount {
                actor_id,
                actor_display,
                count,
            })
            .collect();
        by_actor.sort_by_key(|group| (Reverse(group.count), group.actor_id));

        Ok(AuditSummary {
            total,
            by_action: by_action
                .into_iter()
                .map(|(action, count)| ActionCount { action, count })
                .collect(),
            by_severity: by_severity
                .into_iter()
                .map(|(severity, count)| SeverityCount { severity, count })
                .collect(),
            by_actor,
            by_resource_type: by_resource_type
                .into_iter()
                .map(|(resource_type, count)| ResourceTypeCount {
                    resource_type,
                    count,
                })
                .collect(),
            by_day: by_day
                .into_iter()
                .map(|(day, count)| TimelineBucket { day, count })
                .collect(),
        })
    }

    async fn purge(&self, cutoff: DateTime<Utc>, excluded: &[Severity]) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.created_at() >= cutoff || excluded.contains(&entry.severity()));

        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use domaris_application::{AuditEntryQuery, AuditEntryRepository};
    use domaris_core::{AppResult, PrincipalId};
    use domaris_domain::{AuditActionKind, NewAuditEntry, Severity};

    use super::InMemoryAuditEntryRepository;

    #[tokio::test]
    async fn append_assigns_strictly_increasing_timestamps() -> AppResult<()> {
        let repository = InMemoryAuditEntryRepository::new();
        let mut previous = None;

        for _ in 0..50 {
            let entry = repository
                .append(NewAuditEntry::new(AuditActionKind::View, "same"))
                .await?;
            if let Some(previous) = previous {
                assert!(entry.created_at() > previous);
            }
            previous = Some(entry.created_at());
        }

        Ok(())
    }

    #[tokio::test]
    async fn list_pages_newest_first() -> AppResult<()> {
        let repository = InMemoryAuditEntryRepository::new();
        for index in 0..5 {
            repository
                .append(NewAuditEntry::new(
                    AuditActionKind::Create,
                    format!("entry {index}"),
                ))
                .await?;
        }

        let page = repository
            .list(&AuditEntryQuery {
                limit: 2,
                offset: 1,
                ..AuditEntryQuery::default()
            })
            .await?;
        let descriptions: Vec<&str> = page.iter().map(|entry| entry.description()).collect();
        assert_eq!(descriptions, vec!["entry 3", "entry 2"]);
        Ok(())
    }

    #[tokio::test]
    async fn purge_with_future_cutoff_spares_excluded_severities() -> AppResult<()> {
        let repository = InMemoryAuditEntryRepository::new();
        repository
            .append(NewAuditEntry::new(AuditActionKind::Delete, "gone").with_severity(Severity::High))
            .await?;
        repository
            .append(
                NewAuditEntry::new(AuditActionKind::Other, "kept")
                    .with_severity(Severity::Critical),
            )
            .await?;

        let cutoff = Utc::now() + TimeDelta::days(1);
        assert_eq!(repository.purge(cutoff, &[Severity::Critical]).await?, 1);
        assert_eq!(repository.purge(cutoff, &[Severity::Critical]).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn summarize_scopes_to_actor() -> AppResult<()> {
        let repository = InMemoryAuditEntryRepository::new();
        repository
            .append(
                NewAuditEntry::new(AuditActionKind::Login, "in")
                    .with_actor(PrincipalId::new(1), "Ana"),
            )
            .await?;
        repository
            .append(
                NewAuditEntry::new(AuditActionKind::Login, "in")
                    .with_actor(PrincipalId::new(2), "Rui"),
            )
            .await?;

        let since = Utc::now() - TimeDelta::hours(1);
        let everyone = repository.summarize(since, None).await?;
        let ana = repository.summarize(since, Some(PrincipalId::new(1))).await?;

        assert_eq!(everyone.total, 2);
        assert_eq!(ana.total, 1);
        assert_eq!(ana.by_actor[0].actor_display.as_deref(), Some("Ana"));
        Ok(())
    }
}
