use std::str::FromStr;

use domaris_core::{AppError, AppResult, PrincipalId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ownership::OwnershipKind;

/// Domain entity types subject to access control and audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Property listing.
    Property,
    /// Image attached to a property listing.
    PropertyImage,
    /// Sale or rental transaction.
    Transaction,
    /// Uploaded document.
    Document,
    /// Construction material catalog entry.
    Material,
    /// Material supplier.
    Supplier,
    /// Recorded material price point.
    MaterialPrice,
    /// Price alert subscription.
    PriceAlert,
    /// Construction cost estimate.
    CostEstimate,
    /// Reusable estimate template.
    ProjectTemplate,
    /// Scheduled appointment.
    Appointment,
    /// Messaging conversation.
    Conversation,
    /// Message inside a conversation.
    Message,
    /// In-app notification.
    Notification,
    /// Public content page.
    Page,
    /// Generated report.
    Report,
    /// Activity audit log.
    AuditLog,
    /// Platform user account.
    User,
}

impl ResourceType {
    /// Returns the stable storage value for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::PropertyImage => "property_image",
            Self::Transaction => "transaction",
            Self::Document => "document",
            Self::Material => "material",
            Self::Supplier => "supplier",
            Self::MaterialPrice => "material_price",
            Self::PriceAlert => "price_alert",
            Self::CostEstimate => "cost_estimate",
            Self::ProjectTemplate => "project_template",
            Self::Appointment => "appointment",
            Self::Conversation => "conversation",
            Self::Message => "message",
            Self::Notification => "notification",
            Self::Page => "page",
            Self::Report => "report",
            Self::AuditLog => "audit_log",
            Self::User => "user",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceType] = &[
            ResourceType::Property,
            ResourceType::PropertyImage,
            ResourceType::Transaction,
            ResourceType::Document,
            ResourceType::Material,
            ResourceType::Supplier,
            ResourceType::MaterialPrice,
            ResourceType::PriceAlert,
            ResourceType::CostEstimate,
            ResourceType::ProjectTemplate,
            ResourceType::Appointment,
            ResourceType::Conversation,
            ResourceType::Message,
            ResourceType::Notification,
            ResourceType::Page,
            ResourceType::Report,
            ResourceType::AuditLog,
            ResourceType::User,
        ];

        ALL
    }

    /// Ownership relations declared by this resource type.
    ///
    /// This table is the single registry the resolver consults; kinds not
    /// listed here are skipped for the type.
    #[must_use]
    pub fn ownership_kinds(&self) -> &'static [OwnershipKind] {
        use OwnershipKind::{Agent, Buyer, Client, CreatedBy, Owner, Seller, UploadedBy};

        match self {
            Self::Property => &[Agent, Owner],
            Self::Transaction => &[Agent, Buyer, Seller],
            Self::Document => &[UploadedBy],
            Self::PriceAlert | Self::CostEstimate | Self::Notification => &[Owner],
            Self::ProjectTemplate | Self::Conversation | Self::Message => &[CreatedBy],
            Self::Appointment => &[Agent, Client, CreatedBy],
            Self::PropertyImage
            | Self::Material
            | Self::Supplier
            | Self::MaterialPrice
            | Self::Page
            | Self::Report
            | Self::AuditLog
            | Self::User => &[],
        }
    }

    /// Relation filled by the principal who creates an instance.
    #[must_use]
    pub fn creator_kind(&self) -> Option<OwnershipKind> {
        match self {
            Self::Property | Self::Transaction => Some(OwnershipKind::Agent),
            Self::Document => Some(OwnershipKind::UploadedBy),
            Self::PriceAlert | Self::CostEstimate | Self::Notification => {
                Some(OwnershipKind::Owner)
            }
            Self::ProjectTemplate | Self::Conversation | Self::Message | Self::Appointment => {
                Some(OwnershipKind::CreatedBy)
            }
            Self::PropertyImage
            | Self::Material
            | Self::Supplier
            | Self::MaterialPrice
            | Self::Page
            | Self::Report
            | Self::AuditLog
            | Self::User => None,
        }
    }

    /// Returns whether instances of this type carry ownership relations.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        !self.ownership_kinds().is_empty()
    }

    /// Returns whether any authenticated principal may read this type.
    #[must_use]
    pub fn is_public_content(&self) -> bool {
        matches!(
            self,
            Self::Property
                | Self::PropertyImage
                | Self::Material
                | Self::Supplier
                | Self::MaterialPrice
                | Self::Page
        )
    }
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource_type| resource_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource type '{value}'")))
    }
}

/// Ownership relations of one resource instance, per resource type.
///
/// A relation set to `None` is declared on the type but currently empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOwnership {
    /// Property listing relations.
    Property {
        /// Listing agent.
        agent: Option<PrincipalId>,
        /// Property owner.
        owner: Option<PrincipalId>,
    },
    /// Property image.
    PropertyImage,
    /// Transaction relations.
    Transaction {
        /// Handling agent.
        agent: Option<PrincipalId>,
        /// Buying party.
        buyer: Option<PrincipalId>,
        /// Selling party.
        seller: Option<PrincipalId>,
    },
    /// Document relations.
    Document {
        /// Uploading principal.
        uploaded_by: Option<PrincipalId>,
    },
    /// Material catalog entry.
    Material,
    /// Supplier.
    Supplier,
    /// Material price point.
    MaterialPrice,
    /// Price alert relations.
    PriceAlert {
        /// Subscribed principal.
        owner: Option<PrincipalId>,
    },
    /// Cost estimate relations.
    CostEstimate {
        /// Principal the estimate was prepared for.
        owner: Option<PrincipalId>,
    },
    /// Project template relations.
    ProjectTemplate {
        /// Template author.
        created_by: Option<PrincipalId>,
    },
    /// Appointment relations.
    Appointment {
        /// Attending agent.
        agent: Option<PrincipalId>,
        /// Attending client.
        client: Option<PrincipalId>,
        /// Principal who scheduled it.
        created_by: Option<PrincipalId>,
    },
    /// Conversation relations.
    Conversation {
        /// Principal who opened it.
        created_by: Option<PrincipalId>,
    },
    /// Message relations.
    Message {
        /// Sending principal.
        sender: Option<PrincipalId>,
    },
    /// Notification relations.
    Notification {
        /// Receiving principal.
        recipient: Option<PrincipalId>,
    },
    /// Public page.
    Page,
    /// Report.
    Report,
    /// Audit log.
    AuditLog,
    /// User account.
    User,
}

impl ResourceOwnership {
    /// Builds ownership for a type by reading each declared relation from `lookup`.
    #[must_use]
    pub fn from_relations(
        resource_type: ResourceType,
        lookup: impl Fn(OwnershipKind) -> Option<PrincipalId>,
    ) -> Self {
        use OwnershipKind::{Agent, Buyer, Client, CreatedBy, Owner, Seller, UploadedBy};

        match resource_type {
            ResourceType::Property => Self::Property {
                agent: lookup(Agent),
                owner: lookup(Owner),
            },
            ResourceType::PropertyImage => Self::PropertyImage,
            ResourceType::Transaction => Self::Transaction {
                agent: lookup(Agent),
                buyer: lookup(Buyer),
                seller: lookup(Seller),
            },
            ResourceType::Document => Self::Document {
                uploaded_by: lookup(UploadedBy),
            },
            ResourceType::Material => Self::Material,
            ResourceType::Supplier => Self::Supplier,
            ResourceType::MaterialPrice => Self::MaterialPrice,
            ResourceType::PriceAlert => Self::PriceAlert {
                owner: lookup(Owner),
            },
            ResourceType::CostEstimate => Self::CostEstimate {
                owner: lookup(Owner),
            },
            ResourceType::ProjectTemplate => Self::ProjectTemplate {
                created_by: lookup(CreatedBy),
            },
            ResourceType::Appointment => Self::Appointment {
                agent: lookup(Agent),
                client: lookup(Client),
                created_by: lookup(CreatedBy),
            },
            ResourceType::Conversation => Self::Conversation {
                created_by: lookup(CreatedBy),
            },
            ResourceType::Message => Self::Message {
                sender: lookup(CreatedBy),
            },
            ResourceType::Notification => Self::Notification {
                recipient: lookup(Owner),
            },
            ResourceType::Page => Self::Page,
            ResourceType::Report => Self::Report,
            ResourceType::AuditLog => Self::AuditLog,
            ResourceType::User => Self::User,
        }
    }

    /// Ownership with every declared relation empty.
    #[must_use]
    pub fn unassigned(resource_type: ResourceType) -> Self {
        Self::from_relations(resource_type, |_| None)
    }

    /// Ownership where the creating principal fills the type's creator relation.
    ///
    /// Types without relations return [`ResourceOwnership::unassigned`].
    #[must_use]
    pub fn created_by(resource_type: ResourceType, creator: PrincipalId) -> Self {
        let creator_kind = resource_type.creator_kind();
        Self::from_relations(resource_type, |kind| {
            (Some(kind) == creator_kind).then_some(creator)
        })
    }

    /// Returns the resource type of these relations.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Property { .. } => ResourceType::Property,
            Self::PropertyImage => ResourceType::PropertyImage,
            Self::Transaction { .. } => ResourceType::Transaction,
            Self::Document { .. } => ResourceType::Document,
            Self::Material => ResourceType::Material,
            Self::Supplier => ResourceType::Supplier,
            Self::MaterialPrice => ResourceType::MaterialPrice,
            Self::PriceAlert { .. } => ResourceType::PriceAlert,
            Self::CostEstimate { .. } => ResourceType::CostEstimate,
            Self::ProjectTemplate { .. } => ResourceType::ProjectTemplate,
            Self::Appointment { .. } => ResourceType::Appointment,
            Self::Conversation { .. } => ResourceType::Conversation,
            Self::Message { .. } => ResourceType::Message,
            Self::Notification { .. } => ResourceType::Notification,
            Self::Page => ResourceType::Page,
            Self::Report => ResourceType::Report,
            Self::AuditLog => ResourceType::AuditLog,
            Self::User => ResourceType::User,
        }
    }

    /// Reads one relation.
    ///
    /// The outer `None` means the type does not declare `kind`; the inner
    /// `None` means the relation is declared but empty.
    #[must_use]
    pub fn relation(&self, kind: OwnershipKind) -> Option<Option<PrincipalId>> {
        use OwnershipKind::{Agent, Buyer, Client, CreatedBy, Owner, Seller, UploadedBy};

        match (*self, kind) {
            (Self::Property { agent, .. }, Agent) => Some(agent),
            (Self::Property { owner, .. }, Owner) => Some(owner),
            (Self::Transaction { agent, .. }, Agent) => Some(agent),
            (Self::Transaction { buyer, .. }, Buyer) => Some(buyer),
            (Self::Transaction { seller, .. }, Seller) => Some(seller),
            (Self::Document { uploaded_by }, UploadedBy) => Some(uploaded_by),
            (Self::PriceAlert { owner }, Owner) => Some(owner),
            (Self::CostEstimate { owner }, Owner) => Some(owner),
            (Self::ProjectTemplate { created_by }, CreatedBy) => Some(created_by),
            (Self::Appointment { agent, .. }, Agent) => Some(agent),
            (Self::Appointment { client, .. }, Client) => Some(client),
            (Self::Appointment { created_by, .. }, CreatedBy) => Some(created_by),
            (Self::Conversation { created_by }, CreatedBy) => Some(created_by),
            (Self::Message { sender }, CreatedBy) => Some(sender),
            (Self::Notification { recipient }, Owner) => Some(recipient),
            _ => None,
        }
    }
}

/// Weak reference to an affected resource, captured at write time.
///
/// The display string is a snapshot; it is never refreshed from the live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource type tag.
    pub resource_type: ResourceType,
    /// Numeric row id, when the resource had one.
    pub resource_id: Option<i64>,
    /// Human readable representation at write time.
    pub display: String,
}

impl ResourceRef {
    /// Creates a reference for a stored resource row.
    #[must_use]
    pub fn new(resource_type: ResourceType, resource_id: i64, display: impl Into<String>) -> Self {
        Self {
            resource_type,
            resource_id: Some(resource_id),
            display: display.into(),
        }
    }
}

/// Collaborator-owned resource row the access layer wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    id: i64,
    display_name: String,
    ownership: ResourceOwnership,
    attributes: Value,
}

impl ResourceRecord {
    /// Creates a resource record.
    pub fn new(
        id: i64,
        display_name: impl Into<String>,
        ownership: ResourceOwnership,
        attributes: Value,
    ) -> AppResult<Self> {
        let display_name = display_name.into();
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

        Ok(Self {
            id,
            display_name,
            ownership,
            attributes,
        })
    }

    /// Returns the row id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the ownership relations.
    #[must_use]
    pub fn ownership(&self) -> &ResourceOwnership {
        &self.ownership
    }

    /// Returns the free-form attribute payload.
    #[must_use]
    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.ownership.resource_type()
    }

    /// Captures an audit reference for this record.
    #[must_use]
    pub fn snapshot(&self) -> ResourceRef {
        ResourceRef::new(self.resource_type(), self.id, self.display_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use domaris_core::PrincipalId;
    use serde_json::json;

    use super::{ResourceOwnership, ResourceRecord, ResourceType};
    use crate::OwnershipKind;

    #[test]
    fn resource_type_roundtrips_storage_value() {
        for resource_type in ResourceType::all() {
            let parsed = ResourceType::from_str(resource_type.as_str());
            assert!(matches!(parsed, Ok(value) if value == *resource_type));
        }
    }

    #[test]
    fn registry_agrees_with_relation_lookup() {
        for resource_type in ResourceType::all() {
            let ownership = ResourceOwnership::unassigned(*resource_type);
            assert_eq!(ownership.resource_type(), *resource_type);

            for kind in OwnershipKind::priority_order() {
                let declared = resource_type.ownership_kinds().contains(kind);
                assert_eq!(
                    ownership.relation(*kind).is_some(),
                    declared,
                    "{} / {}",
                    resource_type.as_str(),
                    kind.as_str()
                );
            }
        }
    }

    #[test]
    fn created_by_fills_the_creator_relation() {
        let creator = PrincipalId::new(3);
        let ownership = ResourceOwnership::created_by(ResourceType::Transaction, creator);
        assert_eq!(
            ownership,
            ResourceOwnership::Transaction {
                agent: Some(creator),
                buyer: None,
                seller: None,
            }
        );

        let appointment = ResourceOwnership::created_by(ResourceType::Appointment, creator);
        assert_eq!(
            appointment,
            ResourceOwnership::Appointment {
                agent: None,
                client: None,
                created_by: Some(creator),
            }
        );

        let material = ResourceOwnership::created_by(ResourceType::Material, creator);
        assert_eq!(material, ResourceOwnership::Material);
    }

    #[test]
    fn creator_relation_is_declared_by_its_type() {
        for resource_type in ResourceType::all() {
            match resource_type.creator_kind() {
                Some(kind) => assert!(resource_type.ownership_kinds().contains(&kind)),
                None => assert!(!resource_type.is_owned()),
            }
        }
    }

    #[test]
    fn record_snapshot_copies_display_name() {
        let record = ResourceRecord::new(
            12,
            "Harbor Loft",
            ResourceOwnership::unassigned(ResourceType::Property),
            json!({"city": "Lisbon"}),
        );
        assert!(record.is_ok());

        let snapshot = record.map(|record| record.snapshot());
        assert!(matches!(
            snapshot,
            Ok(ref value) if value.display == "Harbor Loft"
                && value.resource_id == Some(12)
                && value.resource_type == ResourceType::Property
        ));
    }

    #[test]
    fn record_rejects_non_object_attributes() {
        let record = ResourceRecord::new(
            1,
            "Invoice",
            ResourceOwnership::unassigned(ResourceType::Document),
            json!(["not", "an", "object"]),
        );
        assert!(record.is_err());
    }
}
