use async_trait::async_trait;
use serde_json::Value;

use domaris_core::AppResult;
use domaris_domain::{ResourceOwnership, ResourceRecord, ResourceType};

/// Input for inserting a resource row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    /// Ownership relations; also fixes the resource type.
    pub ownership: ResourceOwnership,
    /// Display name.
    pub display_name: String,
    /// Attribute payload (JSON object).
    pub attributes: Value,
}

/// Generic persistence store for collaborator-owned resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Loads one resource.
    async fn get(&self, resource_type: ResourceType, id: i64) -> AppResult<Option<ResourceRecord>>;

    /// Lists every resource of a type ordered by id.
    async fn list(&self, resource_type: ResourceType) -> AppResult<Vec<ResourceRecord>>;

    /// Inserts a resource and returns it with its assigned id.
    async fn insert(&self, resource: NewResource) -> AppResult<ResourceRecord>;

    /// Replaces display name and attributes of an existing resource.
    async fn update(&self, resource: ResourceRecord) -> AppResult<ResourceRecord>;

    /// Deletes a resource; returns whether a row was removed.
    async fn delete(&self, resource_type: ResourceType, id: i64) -> AppResult<bool>;
}
