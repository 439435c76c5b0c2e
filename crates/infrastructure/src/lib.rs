//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_audit_entry_repository;
mod in_memory_principal_repository;
mod in_memory_resource_store;
mod postgres_audit_entry_repository;
mod postgres_principal_repository;
mod postgres_resource_store;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_audit_entry_repository::InMemoryAuditEntryRepository;
pub use in_memory_principal_repository::InMemoryPrincipalRepository;
pub use in_memory_resource_store::InMemoryResourceStore;
pub use postgres_audit_entry_repository::PostgresAuditEntryRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_resource_store::PostgresResourceStore;

#[cfg(test)]
mod postgres_test_support;
