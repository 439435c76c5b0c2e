use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domaris_application::{NewResource, ResourceStore};
use domaris_core::{AppError, AppResult};
use domaris_domain::{ResourceRecord, ResourceType};

/// In-memory resource store for local runs and tests.
///
/// Ids are allocated from one sequence shared by every resource type.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    records: RwLock<BTreeMap<i64, ResourceRecord>>,
}

impl InMemoryResourceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(&self, resource_type: ResourceType, id: i64) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&id)
            .filter(|record| record.resource_type() == resource_type)
            .cloned())
    }

    async fn list(&self, resource_type: ResourceType) -> AppResult<Vec<ResourceRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.resource_type() == resource_type)
            .cloned()
            .collect())
    }

    async fn insert(&self, resource: NewResource) -> AppResult<ResourceRecord> {
        let mut records = self.records.write().await;
        let id = records.keys().next_back().map_or(1, |last| last + 1);
        let record = ResourceRecord::new(
            id,
            resource.display_name,
            resource.ownership,
            resource.attributes,
        )?;

        records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, resource: ResourceRecord) -> AppResult<ResourceRecord> {
        let mut records = self.records.write().await;
        match records.get_mut(&resource.id()) {
            Some(stored) if stored.resource_type() == resource.resource_type() => {
                *stored = resource.clone();
                Ok(resource)
            }
            _ => Err(AppError::NotFound(format!(
                "{} '{}' not found",
                resource.resource_type().as_str(),
                resource.id()
            ))),
        }
    }

    async fn delete(&self, resource_type: ResourceType, id: i64) -> AppResult<bool> {
        let mut records = self.records.write().await;
        if records
            .get(&id)
            .is_some_and(|record| record.resource_type() == resource_type)
        {
            records.remove(&id);
            return Ok(true);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use domaris_application::{NewResource, ResourceStore};
    use domaris_core::{AppResult, PrincipalId};
    use domaris_domain::{ResourceOwnership, ResourceType};
    use serde_json::json;

    use super::InMemoryResourceStore;

    #[tokio::test]
    async fn lookups_are_scoped_by_resource_type() -> AppResult<()> {
        let store = InMemoryResourceStore::new();
        let document = store
            .insert(NewResource {
                ownership: ResourceOwnership::Document {
                    uploaded_by: Some(PrincipalId::new(1)),
                },
                display_name: "Deed.pdf".to_owned(),
                attributes: json!({}),
            })
            .await?;

        assert!(store.get(ResourceType::Document, document.id()).await?.is_some());
        assert!(store.get(ResourceType::Property, document.id()).await?.is_none());
        assert!(!store.delete(ResourceType::Property, document.id()).await?);
        assert!(store.delete(ResourceType::Document, document.id()).await?);
        assert!(store.list(ResourceType::Document).await?.is_empty());
        Ok(())
    }
}
