use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use domaris_application::{NewResource, ResourceStore};
use domaris_core::{AppError, AppResult, PrincipalId};
use domaris_domain::{OwnershipKind, ResourceOwnership, ResourceRecord, ResourceType};

/// PostgreSQL-backed store for collaborator-owned resources.
///
/// Every resource type shares the `resources` table; each ownership relation
/// has its own nullable principal column.
#[derive(Clone)]
pub struct PostgresResourceStore {
    pool: PgPool,
}

impl PostgresResourceStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    id: i64,
    resource_type: String,
    display_name: String,
    agent_id: Option<i64>,
    buyer_id: Option<i64>,
    seller_id: Option<i64>,
    uploaded_by_id: Option<i64>,
    owner_id: Option<i64>,
    client_id: Option<i64>,
    created_by_id: Option<i64>,
    attributes: Value,
}

impl ResourceRow {
    fn relation(&self, kind: OwnershipKind) -> Option<PrincipalId> {
        let column = match kind {
            OwnershipKind::Agent => self.agent_id,
            OwnershipKind::Buyer => self.buyer_id,
            OwnershipKind::Seller => self.seller_id,
            OwnershipKind::UploadedBy => self.uploaded_by_id,
            OwnershipKind::Owner => self.owner_id,
            OwnershipKind::Client => self.client_id,
            OwnershipKind::CreatedBy => self.created_by_id,
        };

        column.map(PrincipalId::new)
    }
}

impl TryFrom<ResourceRow> for ResourceRecord {
    type Error = AppError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let resource_type = ResourceType::from_str(row.resource_type.as_str()).map_err(|error| {
            AppError::Internal(format!("stored resource {} has bad type: {error}", row.id))
        })?;
        let ownership = ResourceOwnership::from_relations(resource_type, |kind| row.relation(kind));

        ResourceRecord::new(row.id, row.display_name, ownership, row.attributes)
    }
}

/// Relation column values in the table's column order.
fn relation_columns(ownership: &ResourceOwnership) -> [Option<i64>; 7] {
    let column = |kind| {
        ownership
            .relation(kind)
            .flatten()
            .map(|principal_id| principal_id.as_i64())
    };

    [
        column(OwnershipKind::Agent),
        column(OwnershipKind::Buyer),
        column(OwnershipKind::Seller),
        column(OwnershipKind::UploadedBy),
        column(OwnershipKind::Owner),
        column(OwnershipKind::Client),
        column(OwnershipKind::CreatedBy),
    ]
}

fn validate_payload(display_name: &str, attributes: &Value) -> AppResult<()> {
    if display_name.trim().is_empty() {
        return Err(AppError::Validation(
            "resource display name must not be empty".to_owned(),
        ));
    }

    if !attributes.is_object() {
        return Err(AppError::Validation(
            "resource attributes must be a JSON object".to_owned(),
        ));
    }

    Ok(())
}

fn unknown_principal_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Validation("resource references an unknown principal".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

const SELECT_COLUMNS: &str = r#"
    id,
    resource_type,
    display_name,
    agent_id,
    buyer_id,
    seller_id,
    uploaded_by_id,
    owner_id,
    client_id,
    created_by_id,
    attributes
"#;

#[async_trait]
impl ResourceStore for PostgresResourceStore {
    async fn get(&self, resource_type: ResourceType, id: i64) -> AppResult<Option<ResourceRecord>> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM resources WHERE id = $1 AND resource_type = $2"
        ))
        .bind(id)
        .bind(resource_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load resource: {error}")))?;

        row.map(ResourceRecord::try_from).transpose()
    }

    async fn list(&self, resource_type: ResourceType) -> AppResult<Vec<ResourceRecord>> {
        let rows = sqlx::query_as::<_, ResourceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM resources WHERE resource_type = $1 ORDER BY id"
        ))
        .bind(resource_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list resources: {error}")))?;

        rows.into_iter().map(ResourceRecord::try_from).collect()
    }

    async fn insert(&self, resource: NewResource) -> AppResult<ResourceRecord> {
        validate_payload(resource.display_name.as_str(), &resource.attributes)?;
        let [agent, buyer, seller, uploaded_by, owner, client, created_by] =
            relation_columns(&resource.ownership);

        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            INSERT INTO resources (
                resource_type,
                display_name,
                agent_id,
                buyer_id,
                seller_id,
                uploaded_by_id,
                owner_id,
                client_id,
                created_by_id,
                attributes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(resource.ownership.resource_type().as_str())
        .bind(resource.display_name.as_str())
        .bind(agent)
        .bind(buyer)
        .bind(seller)
        .bind(uploaded_by)
        .bind(owner)
        .bind(client)
        .bind(created_by)
        .bind(&resource.attributes)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| unknown_principal_or_internal(error, "insert resource"))?;

        debug!(
            resource_type = %row.resource_type,
            resource_id = row.id,
            "resource inserted"
        );
        ResourceRecord::try_from(row)
    }

    async fn update(&self, resource: ResourceRecord) -> AppResult<ResourceRecord> {
        let row = sqlx::query_as::<_, ResourceRow>(&format!(
            r#"
            UPDATE resources
            SET display_name = $3, attributes = $4, updated_at = now()
            WHERE id = $1 AND resource_type = $2
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(resource.id())
        .bind(resource.resource_type().as_str())
        .bind(resource.display_name())
        .bind(resource.attributes())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update resource: {error}")))?;

        let Some(row) = row else {
            return Err(AppError::NotFound(format!(
                "{} '{}' not found",
                resource.resource_type().as_str(),
                resource.id()
            )));
        };

        ResourceRecord::try_from(row)
    }

    async fn delete(&self, resource_type: ResourceType, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1 AND resource_type = $2")
            .bind(id)
            .bind(resource_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete resource: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
