use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use domaris_core::{AppError, AppResult, Principal, PrincipalId, Role};
use domaris_domain::{AuditEntry, NewAuditEntry, ResourceRecord, ResourceType, Severity};

use crate::{
    ActionCount, ActorCount, AuditEntryQuery, AuditEntryRepository, AuditSummary, NewPrincipal,
    NewResource, PasswordHasher, PrincipalCredentials, PrincipalRepository, ResourceStore,
    ResourceTypeCount, SeverityCount, TimelineBucket,
};

pub fn principal(id: i64, role: Role) -> Principal {
    Principal::new(
        PrincipalId::new(id),
        format!("{} {id}", role.as_str()),
        format!("{}{id}@example.com", role.as_str()),
        role,
        true,
    )
}

#[derive(Default)]
pub struct FakeAuditEntryRepository {
    pub entries: Mutex<Vec<AuditEntry>>,
}

impl FakeAuditEntryRepository {
    /// Stores an entry with an explicit timestamp, bypassing `append`.
    pub async fn seed(&self, created_at: DateTime<Utc>, entry: NewAuditEntry) -> AuditEntry {
        let entry = AuditEntry::new(Uuid::new_v4(), created_at, entry);
        self.entries.lock().await.push(entry.clone());
        entry
    }
}

#[async_trait]
impl AuditEntryRepository for FakeAuditEntryRepository {
    async fn append(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        let created_at = entries
            .iter()
            .map(AuditEntry::created_at)
            .max()
            .map(|last| (last + TimeDelta::microseconds(1)).max(now))
            .unwrap_or(now);
        let entry = AuditEntry::new(Uuid::new_v4(), created_at, entry);
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn find(&self, entry_id: Uuid) -> AppResult<Option<AuditEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.entry_id() == entry_id)
            .cloned())
    }

    async fn list(&self, query: &AuditEntryQuery) -> AppResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.created_at()));
        Ok(entries
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn summarize(
        &self,
        since: DateTime<Utc>,
        actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary> {
        let entries = self.entries.lock().await;
        let window: Vec<&AuditEntry> = entries
            .iter()
            .filter(|entry| entry.created_at() >= since)
            .filter(|entry| actor_id.is_none() || entry.actor_id() == actor_id)
            .collect();

        let mut by_action = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        let mut by_actor: BTreeMap<Option<PrincipalId>, (Option<String>, u64)> = BTreeMap::new();
        let mut by_resource_type = BTreeMap::new();
        let mut by_day = BTreeMap::new();
        for entry in &window {
            by_action
                .entry(entry.action().as_str())
                .or_insert(ActionCount {
                    action: entry.action(),
                    count: 0,
                })
                .count += 1;
            *by_severity.entry(entry.severity()).or_insert(0_u64) += 1;
            let actor = by_actor
                .entry(entry.actor_id())
                .or_insert((entry.actor_display().map(str::to_owned), 0));
            actor.1 += 1;
            if let Some(resource) = entry.resource() {
                *by_resource_type.entry(resource.resource_type).or_insert(0_u64) += 1;
            }
            *by_day.entry(entry.created_at().date_naive()).or_insert(0_u64) += 1;
        }

        Ok(AuditSummary {
            total: window.len() as u64,
            by_action: by_action.into_values().collect(),
            by_severity: by_severity
                .into_iter()
                .map(|(severity, count)| SeverityCount { severity, count })
                .collect(),
            by_actor: by_actor
                .into_iter()
                .map(|(actor_id, (actor_display, count))| ActorCount {
                    actor_id,
                    actor_display,
                    count,
                })
                .collect(),
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
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| {
            entry.created_at() >= cutoff || excluded.contains(&entry.severity())
        });
        Ok((before - entries.len()) as u64)
    }
}

/// Audit store whose every call fails.
pub struct FailingAuditEntryRepository;

fn store_down() -> AppError {
    AppError::Internal("audit store unavailable".to_owned())
}

#[async_trait]
impl AuditEntryRepository for FailingAuditEntryRepository {
    async fn append(&self, _entry: NewAuditEntry) -> AppResult<AuditEntry> {
        Err(store_down())
    }

    async fn find(&self, _entry_id: Uuid) -> AppResult<Option<AuditEntry>> {
        Err(store_down())
    }

    async fn list(&self, _query: &AuditEntryQuery) -> AppResult<Vec<AuditEntry>> {
        Err(store_down())
    }

    async fn summarize(
        &self,
        _since: DateTime<Utc>,
        _actor_id: Option<PrincipalId>,
    ) -> AppResult<AuditSummary> {
        Err(store_down())
    }

    async fn purge(&self, _cutoff: DateTime<Utc>, _excluded: &[Severity]) -> AppResult<u64> {
        Err(store_down())
    }
}

#[derive(Default)]
pub struct FakePrincipalRepository {
    pub principals: Mutex<Vec<PrincipalCredentials>>,
}

impl FakePrincipalRepository {
    pub async fn insert(&self, principal: Principal, password_hash: &str) {
        self.principals.lock().await.push(PrincipalCredentials {
            principal,
            password_hash: password_hash.to_owned(),
        });
    }

    async fn update(
        &self,
        principal_id: PrincipalId,
        change: impl FnOnce(&Principal) -> Principal,
    ) -> AppResult<Principal> {
        let mut principals = self.principals.lock().await;
        let stored = principals
            .iter_mut()
            .find(|stored| stored.principal.id() == principal_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{principal_id}' not found")))?;
        stored.principal = change(&stored.principal);
        Ok(stored.principal.clone())
    }
}

#[async_trait]
impl PrincipalRepository for FakePrincipalRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .find(|stored| stored.principal.id() == principal_id)
            .map(|stored| stored.principal.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|stored| stored.principal))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<PrincipalCredentials>> {
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .find(|stored| stored.principal.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Principal>> {
        Ok(self
            .principals
            .lock()
            .await
            .iter()
            .map(|stored| stored.principal.clone())
            .collect())
    }

    async fn create(&self, principal: NewPrincipal) -> AppResult<Principal> {
        let mut principals = self.principals.lock().await;
        if principals
            .iter()
            .any(|stored| stored.principal.email() == principal.email)
        {
            return Err(AppError::Conflict("email already registered".to_owned()));
        }

        let created = Principal::new(
            PrincipalId::new(principals.len() as i64 + 1),
            principal.display_name,
            principal.email,
            principal.role,
            true,
        );
        principals.push(PrincipalCredentials {
            principal: created.clone(),
            password_hash: principal.password_hash,
        });
        Ok(created)
    }

    async fn set_role(&self, principal_id: PrincipalId, role: Role) -> AppResult<Principal> {
        self.update(principal_id, |principal| {
            Principal::new(
                principal.id(),
                principal.display_name(),
                principal.email(),
                role,
                principal.is_active(),
            )
        })
        .await
    }

    async fn set_active(&self, principal_id: PrincipalId, is_active: bool) -> AppResult<Principal> {
        self.update(principal_id, |principal| {
            Principal::new(
                principal.id(),
                principal.display_name(),
                principal.email(),
                principal.role(),
                is_active,
            )
        })
        .await
    }
}

pub struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

#[derive(Default)]
pub struct FakeResourceStore {
    pub records: Mutex<Vec<ResourceRecord>>,
}

#[async_trait]
impl ResourceStore for FakeResourceStore {
    async fn get(&self, resource_type: ResourceType, id: i64) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|record| record.resource_type() == resource_type && record.id() == id)
            .cloned())
    }

    async fn list(&self, resource_type: ResourceType) -> AppResult<Vec<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.resource_type() == resource_type)
            .cloned()
            .collect())
    }

    async fn insert(&self, resource: NewResource) -> AppResult<ResourceRecord> {
        let mut records = self.records.lock().await;
        let id = records.iter().map(ResourceRecord::id).max().unwrap_or(0) + 1;
        let record = ResourceRecord::new(
            id,
            resource.display_name,
            resource.ownership,
            resource.attributes,
        )?;
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, resource: ResourceRecord) -> AppResult<ResourceRecord> {
        let mut records = self.records.lock().await;
        let stored = records
            .iter_mut()
            .find(|record| {
                record.resource_type() == resource.resource_type() && record.id() == resource.id()
            })
            .ok_or_else(|| AppError::NotFound("resource not found".to_owned()))?;
        *stored = resource.clone();
        Ok(resource)
    }

    async fn delete(&self, resource_type: ResourceType, id: i64) -> AppResult<bool> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| !(record.resource_type() == resource_type && record.id() == id));
        Ok(records.len() < before)
    }
}
