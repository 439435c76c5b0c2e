mod governance;
mod query;
mod repository;
mod stats;

pub use governance::AuditPurgeResult;
pub use query::AuditEntryQuery;
pub use repository::AuditEntryRepository;
pub use stats::{
    ActionCount, ActorCount, AuditStats, AuditSummary, ResourceTypeCount, SeverityCount,
    TimelineBucket,
};
