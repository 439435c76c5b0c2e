//! Principal lifecycle: sign-in, session resolution, role assignment and
//! account enable/disable.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use domaris_core::{AppError, AppResult, Principal, PrincipalId, Role};
use domaris_domain::{
    AccessAction, AuditActionKind, NewAuditEntry, RequestMeta, ResourceRef, ResourceType, Severity,
};

use crate::{
    AccessControlService, ActivityAuditRecorder, NewPrincipal, PasswordHasher, PrincipalRepository,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";
const MIN_PASSWORD_LENGTH: usize = 8;

/// Input for registering a principal from an operator command.
#[derive(Debug, Clone)]
pub struct RegisterPrincipalInput {
    /// Display name.
    pub display_name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Initial role.
    pub role: Role,
}

/// Application service for principals.
#[derive(Clone)]
pub struct PrincipalService {
    repository: Arc<dyn PrincipalRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    recorder: ActivityAuditRecorder,
    access_control: AccessControlService,
}

impl PrincipalService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PrincipalRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        recorder: ActivityAuditRecorder,
    ) -> Self {
        Self {
            repository,
            password_hasher,
            recorder,
            access_control: AccessControlService::new(),
        }
    }

    /// Verifies credentials and records a login entry.
    ///
    /// Unknown emails, wrong passwords and disabled accounts share one
    /// generic error.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        request: RequestMeta,
    ) -> AppResult<Principal> {
        let email = normalize_email(email);
        let Some(credentials) = self.repository.find_credentials_by_email(&email).await? else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        let is_valid = self
            .password_hasher
            .verify_password(password, &credentials.password_hash)?;
        if !is_valid || !credentials.principal.is_active() {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        }

        let principal = credentials.principal;
        self.recorder
            .record(
                NewAuditEntry::new(
                    AuditActionKind::Login,
                    format!("{} signed in", principal.email()),
                )
                .with_actor(principal.id(), principal.display_name())
                .with_request(request),
            )
            .await;

        Ok(principal)
    }

    /// Records a logout entry.
    pub async fn logout(&self, principal: &Principal, request: RequestMeta) {
        self.recorder
            .record(
                NewAuditEntry::new(
                    AuditActionKind::Logout,
                    format!("{} signed out", principal.email()),
                )
                .with_actor(principal.id(), principal.display_name())
                .with_request(request),
            )
            .await;
    }

    /// Loads the principal behind a session.
    ///
    /// Missing or disabled principals yield `Unauthorized`.
    pub async fn resolve_session(&self, principal_id: PrincipalId) -> AppResult<Principal> {
        self.repository
            .find_by_id(principal_id)
            .await?
            .filter(Principal::is_active)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }

    /// Lists every principal.
    pub async fn list(&self, actor: &Principal) -> AppResult<Vec<Principal>> {
        self.access_control
            .require(actor, AccessAction::List, ResourceType::User, None)?;
        self.repository.list().await
    }

    /// Disables a principal account.
    pub async fn deactivate(
        &self,
        actor: &Principal,
        principal_id: PrincipalId,
        request: RequestMeta,
    ) -> AppResult<Principal> {
        self.access_control
            .require(actor, AccessAction::Archive, ResourceType::User, None)?;

        if actor.id() == principal_id {
            return Err(AppError::Conflict(
                "principals cannot deactivate themselves".to_owned(),
            ));
        }

        self.set_active(actor, principal_id, false, request).await
    }

    /// Re-enables a principal account.
    pub async fn activate(
        &self,
        actor: &Principal,
        principal_id: PrincipalId,
        request: RequestMeta,
    ) -> AppResult<Principal> {
        self.access_control
            .require(actor, AccessAction::Restore, ResourceType::User, None)?;

        self.set_active(actor, principal_id, true, request).await
    }

    async fn set_active(
        &self,
        actor: &Principal,
        principal_id: PrincipalId,
        is_active: bool,
        request: RequestMeta,
    ) -> AppResult<Principal> {
        let updated = self.repository.set_active(principal_id, is_active).await?;

        let (action, verb) = if is_active {
            (AuditActionKind::Restore, "activated")
        } else {
            (AuditActionKind::Archive, "deactivated")
        };
        self.recorder
            .record(
                NewAuditEntry::new(action, format!("{verb} user {}", updated.email()))
                    .with_actor(actor.id(), actor.display_name())
                    .with_severity(Severity::Medium)
                    .with_resource(user_ref(&updated))
                    .with_changes(json!({ "is_active": [!is_active, is_active] }))
                    .with_request(request),
            )
            .await;

        Ok(updated)
    }

    /// Operator action: assigns a role to the principal with `email`.
    pub async fn assign_role(&self, email: &str, role: Role) -> AppResult<Principal> {
        let email = normalize_email(email);
        let existing = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no principal with email '{email}'")))?;

        let updated = self.repository.set_role(existing.id(), role).await?;
        info!(
            principal_id = %updated.id(),
            previous_role = existing.role().as_str(),
            role = role.as_str(),
            "assigned role"
        );

        self.recorder
            .record(
                NewAuditEntry::new(
                    AuditActionKind::Assign,
                    format!("assigned role '{}' to {}", role.as_str(), updated.email()),
                )
                .with_severity(Severity::High)
                .with_resource(user_ref(&updated))
                .with_changes(json!({ "role": [existing.role().as_str(), role.as_str()] })),
            )
            .await;

        Ok(updated)
    }

    /// Operator action: registers a principal with a hashed password.
    pub async fn register(&self, input: RegisterPrincipalInput) -> AppResult<Principal> {
        let email = normalize_email(&input.email);
        if !email.contains('@') {
            return Err(AppError::Validation(format!("invalid email '{email}'")));
        }

        if input.display_name.trim().is_empty() {
            return Err(AppError::Validation(
                "display name must not be empty".to_owned(),
            ));
        }

        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let password_hash = self.password_hasher.hash_password(&input.password)?;
        let principal = self
            .repository
            .create(NewPrincipal {
                display_name: input.display_name.trim().to_owned(),
                email,
                role: input.role,
                password_hash,
            })
            .await?;

        self.recorder
            .record(
                NewAuditEntry::new(
                    AuditActionKind::Create,
                    format!("registered user {}", principal.email()),
                )
                .with_resource(user_ref(&principal)),
            )
            .await;

        Ok(principal)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn user_ref(principal: &Principal) -> ResourceRef {
    ResourceRef::new(
        ResourceType::User,
        principal.id().as_i64(),
        principal.email(),
    )
}
