//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod ownership;
mod policy;
mod resource;

pub use audit::{
    AUDIT_TEXT_MAX_LENGTH, AuditActionKind, AuditEntry, NewAuditEntry, RequestMeta, Severity,
};
pub use ownership::{OwnerRelation, OwnershipKind, primary_owner, resolve_owners};
pub use policy::{AccessAction, AccessDecision, DenyReason, decide};
pub use resource::{ResourceOwnership, ResourceRecord, ResourceRef, ResourceType};
