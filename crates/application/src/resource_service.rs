use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use domaris_core::{AppError, AppResult, Principal, PrincipalId};
use domaris_domain::{
    AccessAction, OwnershipKind, ResourceOwnership, ResourceRecord, ResourceRef, ResourceType,
};

use crate::{AccessControlService, NewResource, ResourceStore};

/// Input for creating a collaborator resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResourceInput {
    /// Display name.
    pub display_name: String,
    /// Attribute payload (JSON object).
    pub attributes: Value,
    /// Explicit ownership relations, for example a transaction's buyer.
    pub relations: Vec<(OwnershipKind, PrincipalId)>,
}

/// How update attributes are combined with the stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Provided attributes replace the stored object.
    Replace,
    /// Provided keys overwrite stored keys; `null` removes a key.
    Merge,
}

/// Input for updating a collaborator resource.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResourceInput {
    /// New display name, if changed.
    pub display_name: Option<String>,
    /// Attribute payload (JSON object), if changed.
    pub attributes: Option<Value>,
    /// Combination mode.
    pub mode: UpdateMode,
}

/// Outcome of a successful mutation, carrying what the audit entry needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMutation {
    /// Resulting record; `None` after a delete.
    pub record: Option<ResourceRecord>,
    /// Snapshot captured at mutation time.
    pub snapshot: ResourceRef,
    /// Field-level diff as `{field: {"old": .., "new": ..}}`.
    pub changes: Option<Value>,
}

/// Policy-checked CRUD over the collaborator resource store.
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn ResourceStore>,
    access_control: AccessControlService,
}

impl ResourceService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            access_control: AccessControlService::new(),
        }
    }

    /// Lists the resources of a type that `actor` may view.
    pub async fn list(
        &self,
        actor: &Principal,
        resource_type: ResourceType,
    ) -> AppResult<Vec<ResourceRecord>> {
        self.access_control
            .require(actor, AccessAction::List, resource_type, None)?;

        let records = self.store.list(resource_type).await?;
        Ok(records
            .into_iter()
            .filter(|record| {
                self.access_control
                    .decide(
                        actor,
                        AccessAction::View,
                        resource_type,
                        Some(record.ownership()),
                    )
                    .is_allowed()
            })
            .collect())
    }

    /// Loads one resource `actor` may view.
    pub async fn get(
        &self,
        actor: &Principal,
        resource_type: ResourceType,
        id: i64,
    ) -> AppResult<ResourceRecord> {
        let record = self.load(resource_type, id).await?;
        self.access_control.require(
            actor,
            AccessAction::View,
            resource_type,
            Some(record.ownership()),
        )?;
        Ok(record)
    }

    /// Creates a resource owned by `actor`.
    ///
    /// The type's creator relation is always filled with `actor`; only admins
    /// may hand it to someone else through explicit relations.
    pub async fn create(
        &self,
        actor: &Principal,
        resource_type: ResourceType,
        input: CreateResourceInput,
    ) -> AppResult<ResourceMutation> {
        self.access_control
            .require(actor, AccessAction::Create, resource_type, None)?;

        let declared = resource_type.ownership_kinds();
        if let Some((kind, _)) = input
            .relations
            .iter()
            .find(|(kind, _)| !declared.contains(kind))
        {
            return Err(AppError::Validation(format!(
                "resource type '{}' has no '{}' relation",
                resource_type.as_str(),
                kind.as_str()
            )));
        }

        require_object(&input.attributes)?;

        let creator_kind = resource_type.creator_kind();
        let explicit = |kind: OwnershipKind| {
            input
                .relations
                .iter()
                .find(|(candidate, _)| *candidate == kind)
                .map(|(_, principal_id)| *principal_id)
        };
        let ownership = ResourceOwnership::from_relations(resource_type, |kind| {
            let is_creator_kind = Some(kind) == creator_kind;
            match explicit(kind) {
                Some(principal_id) if !is_creator_kind || actor.is_admin() => Some(principal_id),
                _ if is_creator_kind => Some(actor.id()),
                _ => None,
            }
        });

        let record = self
            .store
            .insert(NewResource {
                ownership,
                display_name: input.display_name.trim().to_owned(),
                attributes: input.attributes,
            })
            .await?;

        Ok(ResourceMutation {
            snapshot: record.snapshot(),
            record: Some(record),
            changes: None,
        })
    }

    /// Updates a resource `actor` owns (or may edit by role).
    pub async fn update(
        &self,
        actor: &Principal,
        resource_type: ResourceType,
        id: i64,
        input: UpdateResourceInput,
    ) -> AppResult<ResourceMutation> {
        let existing = self.load(resource_type, id).await?;
        self.access_control.require(
            actor,
            AccessAction::Update,
            resource_type,
            Some(existing.ownership()),
        )?;

        let attributes = match (input.attributes, input.mode) {
            (None, _) => existing.attributes().clone(),
            (Some(attributes), UpdateMode::Replace) => {
                require_object(&attributes)?;
                attributes
            }
            (Some(patch), UpdateMode::Merge) => {
                require_object(&patch)?;
                merge_attributes(existing.attributes(), patch)
            }
        };
        let display_name = input
            .display_name
            .map(|display_name| display_name.trim().to_owned())
            .unwrap_or_else(|| existing.display_name().to_owned());

        let updated = ResourceRecord::new(
            existing.id(),
            display_name,
            *existing.ownership(),
            attributes,
        )?;
        let changes = diff(&existing, &updated);
        let record = self.store.update(updated).await?;

        Ok(ResourceMutation {
            snapshot: record.snapshot(),
            record: Some(record),
            changes,
        })
    }

    /// Deletes a resource `actor` owns (or may delete by role).
    ///
    /// The returned snapshot outlives the row.
    pub async fn delete(
        &self,
        actor: &Principal,
        resource_type: ResourceType,
        id: i64,
    ) -> AppResult<ResourceMutation> {
        let existing = self.load(resource_type, id).await?;
        self.access_control.require(
            actor,
            AccessAction::Delete,
            resource_type,
            Some(existing.ownership()),
        )?;

        if !self.store.delete(resource_type, id).await? {
            return Err(not_found(resource_type, id));
        }

        Ok(ResourceMutation {
            snapshot: existing.snapshot(),
            record: None,
            changes: None,
        })
    }

    async fn load(&self, resource_type: ResourceType, id: i64) -> AppResult<ResourceRecord> {
        self.store
            .get(resource_type, id)
            .await?
            .ok_or_else(|| not_found(resource_type, id))
    }
}

fn not_found(resource_type: ResourceType, id: i64) -> AppError {
    AppError::NotFound(format!("{} '{id}' not found", resource_type.as_str()))
}

fn require_object(attributes: &Value) -> AppResult<()> {
    if attributes.is_object() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "attributes must be a JSON object".to_owned(),
        ))
    }
}

fn merge_attributes(existing: &Value, patch: Value) -> Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    if let Value::Object(patch) = patch {
        for (key, value) in patch {
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
    }

    Value::Object(merged)
}

fn diff(before: &ResourceRecord, after: &ResourceRecord) -> Option<Value> {
    let mut changes = Map::new();
    if before.display_name() != after.display_name() {
        changes.insert(
            "display_name".to_owned(),
            json!({ "old": before.display_name(), "new": after.display_name() }),
        );
    }

    let empty = Map::new();
    let old_attributes = before.attributes().as_object().unwrap_or(&empty);
    let new_attributes = after.attributes().as_object().unwrap_or(&empty);
    let keys: BTreeSet<&String> = old_attributes.keys().chain(new_attributes.keys()).collect();
    for key in keys {
        let old = old_attributes.get(key);
        let new = new_attributes.get(key);
        if old != new {
            changes.insert(key.clone(), json!({ "old": old, "new": new }));
        }
    }

    (!changes.is_empty()).then_some(Value::Object(changes))
}
