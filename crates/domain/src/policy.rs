//! Stateless access policy engine.
//!
//! Every decision is a pure function of the principal, the requested action,
//! the resource type and, when an instance exists, its already-resolved
//! ownership relations. Nothing here performs I/O.

use std::str::FromStr;

use domaris_core::{AppError, AppResult, Principal, Role};
use serde::{Deserialize, Serialize};

use crate::ownership::{OwnershipKind, primary_owner, resolve_owners};
use crate::resource::{ResourceOwnership, ResourceType};

/// Action a principal attempts on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    /// Read one resource.
    View,
    /// Read a collection.
    List,
    /// Create a resource.
    Create,
    /// Modify a resource.
    Update,
    /// Remove a resource.
    Delete,
    /// Attach a file.
    Upload,
    /// Fetch a file.
    Download,
    /// Export data.
    Export,
    /// Import data.
    Import,
    /// Approve a pending item.
    Approve,
    /// Reject a pending item.
    Reject,
    /// Assign a principal.
    Assign,
    /// Remove an assignment.
    Unassign,
    /// Archive or disable.
    Archive,
    /// Restore from archive.
    Restore,
}

impl AccessAction {
    /// Returns the stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
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
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AccessAction] = &[
            AccessAction::View,
            AccessAction::List,
            AccessAction::Create,
            AccessAction::Update,
            AccessAction::Delete,
            AccessAction::Upload,
            AccessAction::Download,
            AccessAction::Export,
            AccessAction::Import,
            AccessAction::Approve,
            AccessAction::Reject,
            AccessAction::Assign,
            AccessAction::Unassign,
            AccessAction::Archive,
            AccessAction::Restore,
        ];

        ALL
    }

    /// Returns whether the action leaves state untouched.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            Self::View | Self::List | Self::Download | Self::Export
        )
    }
}

impl FromStr for AccessAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown access action '{value}'")))
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Principal does not fill the required ownership relation.
    NotOwner,
    /// Principal's role is outside the allow-list.
    RoleNotPermitted,
    /// Supplied instance belongs to another resource type.
    ResourceTypeMismatch,
    /// No rule granted access.
    NoMatchingRule,
}

impl DenyReason {
    /// Returns a short human readable reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOwner => "not owner",
            Self::RoleNotPermitted => "role not permitted",
            Self::ResourceTypeMismatch => "resource type mismatch",
            Self::NoMatchingRule => "no matching rule",
        }
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Access granted.
    Allow,
    /// Access refused.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns `true` for [`AccessDecision::Allow`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the deny reason, if any.
    #[must_use]
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(*reason),
        }
    }

    /// Converts the decision into the uniform forbidden error.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AppError::Forbidden(reason.as_str().to_owned())),
        }
    }
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const EVERY_ROLE: &[Role] = &[
    Role::Admin,
    Role::Agent,
    Role::Client,
    Role::Developer,
    Role::Investor,
];
const CATALOG_EDITORS: &[Role] = &[Role::Admin, Role::Agent, Role::Developer];
const REPORT_READERS: &[Role] = &[Role::Admin, Role::Agent, Role::Developer, Role::Investor];
const LISTING_CREATORS: &[Role] = &[Role::Admin, Role::Agent];

/// Evaluates the access policy. First matching rule wins.
#[must_use]
pub fn decide(
    principal: &Principal,
    action: AccessAction,
    resource_type: ResourceType,
    resource: Option<&ResourceOwnership>,
) -> AccessDecision {
    if principal.role() == Role::Admin {
        return AccessDecision::Allow;
    }

    if resource.is_some_and(|resource| resource.resource_type() != resource_type) {
        return AccessDecision::Deny(DenyReason::ResourceTypeMismatch);
    }

    if action.is_safe() && resource_type.is_public_content() {
        return AccessDecision::Allow;
    }

    if let Some(resource) = resource.filter(|_| !action.is_safe() && resource_type.is_owned()) {
        return owner_may_mutate(principal, resource);
    }

    if let Some(allowed_roles) = role_gate(resource_type, action) {
        return role_decision(principal.role(), allowed_roles);
    }

    if let Some(resource) = resource.filter(|_| action.is_safe() && resource_type.is_owned()) {
        let is_related = resolve_owners(resource)
            .iter()
            .any(|relation| relation.principal_id == Some(principal.id()));
        return if is_related {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny(DenyReason::NotOwner)
        };
    }

    if resource.is_none() && resource_type.is_owned() {
        match action {
            AccessAction::List => return AccessDecision::Allow,
            AccessAction::Create => {
                return role_decision(principal.role(), creator_roles(resource_type));
            }
            _ => {}
        }
    }

    AccessDecision::Deny(DenyReason::NoMatchingRule)
}

fn owner_may_mutate(principal: &Principal, resource: &ResourceOwnership) -> AccessDecision {
    let relations = resolve_owners(resource);

    // Transactions are only ever mutated by their agent, even when the buyer
    // or seller fills an earlier populated relation.
    let owner = if resource.resource_type() == ResourceType::Transaction {
        relations
            .iter()
            .find(|relation| relation.kind == OwnershipKind::Agent)
            .and_then(|relation| relation.principal_id)
    } else {
        primary_owner(&relations).and_then(|relation| relation.principal_id)
    };

    if owner == Some(principal.id()) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(DenyReason::NotOwner)
    }
}

fn role_gate(resource_type: ResourceType, action: AccessAction) -> Option<&'static [Role]> {
    match resource_type {
        ResourceType::AuditLog => Some(match action {
            AccessAction::View | AccessAction::List | AccessAction::Create | AccessAction::Export => {
                EVERY_ROLE
            }
            _ => ADMIN_ONLY,
        }),
        ResourceType::User => Some(ADMIN_ONLY),
        ResourceType::Material
        | ResourceType::Supplier
        | ResourceType::MaterialPrice
        | ResourceType::PropertyImage
            if !action.is_safe() =>
        {
            Some(CATALOG_EDITORS)
        }
        ResourceType::Page if !action.is_safe() => Some(ADMIN_ONLY),
        ResourceType::Report if action.is_safe() => Some(REPORT_READERS),
        ResourceType::Report => Some(ADMIN_ONLY),
        _ => None,
    }
}

fn creator_roles(resource_type: ResourceType) -> &'static [Role] {
    match resource_type {
        ResourceType::Property | ResourceType::Transaction => LISTING_CREATORS,
        _ => EVERY_ROLE,
    }
}

fn role_decision(role: Role, allowed_roles: &[Role]) -> AccessDecision {
    if allowed_roles.contains(&role) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(DenyReason::RoleNotPermitted)
    }
}
