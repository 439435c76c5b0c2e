//! Application services and ports.

#![forbid(unsafe_code)]

mod access_control_service;
mod activity_audit_recorder;
mod activity_log_service;
mod audit_ports;
mod principal_ports;
mod principal_service;
mod resource_ports;
mod resource_service;

#[cfg(test)]
mod test_support;

pub use access_control_service::AccessControlService;
pub use activity_audit_recorder::{ActivityAuditRecorder, RawAuditInput};
pub use activity_log_service::{ActivityLogService, ActivityLogSettings};
pub use audit_ports::{
    ActionCount, ActorCount, AuditEntryQuery, AuditEntryRepository, AuditPurgeResult, AuditStats,
    AuditSummary, ResourceTypeCount, SeverityCount, TimelineBucket,
};
pub use principal_ports::{NewPrincipal, PasswordHasher, PrincipalCredentials, PrincipalRepository};
pub use principal_service::{PrincipalService, RegisterPrincipalInput};
pub use resource_ports::{NewResource, ResourceStore};
pub use resource_service::{
    CreateResourceInput, ResourceMutation, ResourceService, UpdateMode, UpdateResourceInput,
};
