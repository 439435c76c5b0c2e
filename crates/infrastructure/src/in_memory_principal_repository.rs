use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domaris_application::{NewPrincipal, PrincipalCredentials, PrincipalRepository};
use domaris_core::{AppError, AppResult, Principal, PrincipalId, Role};

/// In-memory principal store for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalRepository {
    principals: RwLock<BTreeMap<PrincipalId, PrincipalCredentials>>,
}

impl InMemoryPrincipalRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn replace(
        &self,
        principal_id: PrincipalId,
        rebuild: impl FnOnce(&Principal) -> Principal + Send,
    ) -> AppResult<Principal> {
        let mut principals = self.principals.write().await;
        let stored = principals
            .get_mut(&principal_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{principal_id}' not found")))?;

        stored.principal = rebuild(&stored.principal);
        Ok(stored.principal.clone())
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self
            .principals
            .read()
            .await
            .get(&principal_id)
            .map(|stored| stored.principal.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|stored| stored.principal))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<PrincipalCredentials>> {
        Ok(self
            .principals
            .read()
            .await
            .values()
            .find(|stored| stored.principal.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Principal>> {
        Ok(self
            .principals
            .read()
            .await
            .values()
            .map(|stored| stored.principal.clone())
            .collect())
    }

    async fn create(&self, principal: NewPrincipal) -> AppResult<Principal> {
        let mut principals = self.principals.write().await;
        if principals
            .values()
            .any(|stored| stored.principal.email().eq_ignore_ascii_case(&principal.email))
        {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        let next_id = principals
            .keys()
            .next_back()
            .map_or(1, |last| last.as_i64() + 1);
        let created = Principal::new(
            PrincipalId::new(next_id),
            principal.display_name,
            principal.email,
            principal.role,
            true,
        );
        principals.insert(
            created.id(),
            PrincipalCredentials {
                principal: created.clone(),
                password_hash: principal.password_hash,
            },
        );

        Ok(created)
    }

    async fn set_role(&self, principal_id: PrincipalId, role: Role) -> AppResult<Principal> {
        self.replace(principal_id, |current| {
            Principal::new(
                current.id(),
                current.display_name(),
                current.email(),
                role,
                current.is_active(),
            )
        })
        .await
    }

    async fn set_active(&self, principal_id: PrincipalId, is_active: bool) -> AppResult<Principal> {
        self.replace(principal_id, |current| {
            Principal::new(
                current.id(),
                current.display_name(),
                current.email(),
                current.role(),
                is_active,
            )
        })
        .await
    }
}
