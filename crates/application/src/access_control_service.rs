use domaris_core::{AppResult, Principal};
use domaris_domain::{AccessAction, AccessDecision, ResourceOwnership, ResourceType, decide};
use tracing::warn;

/// Object-level access checks for application services.
///
/// Stateless wrapper over the policy engine that logs denials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlService;

impl AccessControlService {
    /// Creates the service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluates the policy without side effects.
    #[must_use]
    pub fn decide(
        &self,
        principal: &Principal,
        action: AccessAction,
        resource_type: ResourceType,
        resource: Option<&ResourceOwnership>,
    ) -> AccessDecision {
        decide(principal, action, resource_type, resource)
    }

    /// Evaluates the policy and converts a denial into `Forbidden`.
    pub fn require(
        &self,
        principal: &Principal,
        action: AccessAction,
        resource_type: ResourceType,
        resource: Option<&ResourceOwnership>,
    ) -> AppResult<()> {
        let decision = self.decide(principal, action, resource_type, resource);
        if let Some(reason) = decision.deny_reason() {
            warn!(
                principal_id = %principal.id(),
                role = principal.role().as_str(),
                action = action.as_str(),
                resource_type = resource_type.as_str(),
                reason = reason.as_str(),
                "access denied"
            );
        }

        decision.into_result()
    }
}

#[cfg(test)]
mod tests {
    use domaris_core::{AppError, Principal, PrincipalId, Role};
    use domaris_domain::{AccessAction, ResourceOwnership, ResourceType};

    use super::AccessControlService;

    #[test]
    fn require_maps_denial_to_forbidden_with_reason() {
        let client = Principal::new(PrincipalId::new(2), "Cli", "cli@example.com", Role::Client, true);
        let document = ResourceOwnership::Document {
            uploaded_by: Some(PrincipalId::new(9)),
        };

        let result = AccessControlService::new().require(
            &client,
            AccessAction::Delete,
            ResourceType::Document,
            Some(&document),
        );
        assert!(matches!(result, Err(AppError::Forbidden(ref reason)) if reason == "not owner"));
    }

    #[test]
    fn require_passes_allowed_actions() {
        let agent = Principal::new(PrincipalId::new(2), "Age", "age@example.com", Role::Agent, true);
        let result = AccessControlService::new().require(
            &agent,
            AccessAction::Create,
            ResourceType::Property,
            None,
        );
        assert!(result.is_ok());
    }
}
