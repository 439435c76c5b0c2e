use std::str::FromStr;

use domaris_core::{AppError, PrincipalId};
use serde::{Deserialize, Serialize};

use crate::resource::ResourceOwnership;

/// Relation through which a principal owns a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipKind {
    /// Responsible agent.
    Agent,
    /// Buying party of a transaction.
    Buyer,
    /// Selling party of a transaction.
    Seller,
    /// Uploader of a document.
    UploadedBy,
    /// Generic owner or recipient.
    Owner,
    /// Client attached to the resource.
    Client,
    /// Author or sender.
    CreatedBy,
}

impl OwnershipKind {
    /// Returns the stable storage value for this relation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::UploadedBy => "uploaded_by",
            Self::Owner => "owner",
            Self::Client => "client",
            Self::CreatedBy => "created_by",
        }
    }

    /// Every relation, highest priority first.
    #[must_use]
    pub fn priority_order() -> &'static [Self] {
        const ORDER: &[OwnershipKind] = &[
            OwnershipKind::Agent,
            OwnershipKind::Buyer,
            OwnershipKind::Seller,
            OwnershipKind::UploadedBy,
            OwnershipKind::Owner,
            OwnershipKind::Client,
            OwnershipKind::CreatedBy,
        ];

        ORDER
    }
}

impl FromStr for OwnershipKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::priority_order()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown ownership relation '{value}'")))
    }
}

/// One resolved ownership relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRelation {
    /// Relation kind.
    pub kind: OwnershipKind,
    /// Principal filling the relation, if any.
    pub principal_id: Option<PrincipalId>,
}

/// Resolves the ownership relations of a resource in priority order.
///
/// Kinds the resource type does not declare are skipped. Declared but empty
/// relations are returned with `principal_id: None`.
#[must_use]
pub fn resolve_owners(resource: &ResourceOwnership) -> Vec<OwnerRelation> {
    let declared = resource.resource_type().ownership_kinds();

    OwnershipKind::priority_order()
        .iter()
        .filter(|kind| declared.contains(kind))
        .filter_map(|kind| {
            resource.relation(*kind).map(|principal_id| OwnerRelation {
                kind: *kind,
                principal_id,
            })
        })
        .collect()
}

/// Returns the first populated relation, which acts as the resolved owner.
#[must_use]
pub fn primary_owner(relations: &[OwnerRelation]) -> Option<OwnerRelation> {
    relations
        .iter()
        .find(|relation| relation.principal_id.is_some())
        .copied()
}
