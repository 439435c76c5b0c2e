use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Stable numeric identifier of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrincipalId(i64);

impl PrincipalId {
    /// Creates a principal identifier from a stored row id.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for PrincipalId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The single role every principal holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Real-estate agent managing listings and transactions.
    Agent,
    /// Buyer, seller or tenant served by agents.
    Client,
    /// Construction or property developer.
    Developer,
    /// Property investor.
    Investor,
}

impl Role {
    /// Returns the stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
            Self::Client => "client",
            Self::Developer => "developer",
            Self::Investor => "investor",
        }
    }

    /// Returns every role in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Admin,
            Role::Agent,
            Role::Client,
            Role::Developer,
            Role::Investor,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "client" => Ok(Self::Client),
            "developer" => Ok(Self::Developer),
            "investor" => Ok(Self::Investor),
            _ => Err(AppError::Validation(format!(
                "unknown role '{value}', expected one of: admin, agent, client, developer, investor"
            ))),
        }
    }
}

/// Authenticated actor every access decision is made against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    display_name: String,
    email: String,
    role: Role,
    is_active: bool,
}

impl Principal {
    /// Creates a principal from stored identity data.
    #[must_use]
    pub fn new(
        id: PrincipalId,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            role,
            is_active,
        }
    }

    /// Returns the stable principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Returns the display name for the principal.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the principal's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns whether the principal may still authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns `true` when the principal holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Derives the per-request role flags for this principal.
    #[must_use]
    pub fn role_context(&self) -> RoleContext {
        RoleContext::for_role(self.role)
    }
}

/// Boolean role flags computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleContext {
    /// Principal is an administrator.
    pub is_admin: bool,
    /// Principal is an agent.
    pub is_agent: bool,
    /// Principal is a client.
    pub is_client: bool,
    /// Principal is an administrator or an agent.
    pub is_staff_member: bool,
}

impl RoleContext {
    /// Computes the flags for one role.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        Self {
            is_admin: role == Role::Admin,
            is_agent: role == Role::Agent,
            is_client: role == Role::Client,
            is_staff_member: matches!(role, Role::Admin | Role::Agent),
        }
    }

    /// Flags for a request without a principal.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Principal, PrincipalId, Role, RoleContext};

    #[test]
    fn role_roundtrips_storage_value() {
        for role in Role::all() {
            let parsed = Role::from_str(role.as_str());
            assert!(matches!(parsed, Ok(value) if value == *role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn staff_flag_covers_admin_and_agent_only() {
        assert!(RoleContext::for_role(Role::Admin).is_staff_member);
        assert!(RoleContext::for_role(Role::Agent).is_staff_member);
        assert!(!RoleContext::for_role(Role::Client).is_staff_member);
        assert!(!RoleContext::for_role(Role::Developer).is_staff_member);
        assert!(!RoleContext::for_role(Role::Investor).is_staff_member);
    }

    #[test]
    fn principal_role_context_matches_role() {
        let principal = Principal::new(PrincipalId::new(7), "Ava", "ava@example.com", Role::Client, true);
        let context = principal.role_context();
        assert!(context.is_client);
        assert!(!context.is_admin);
        assert!(!context.is_agent);
    }

    #[test]
    fn anonymous_context_has_no_flags() {
        assert_eq!(RoleContext::anonymous(), RoleContext::default());
        assert!(!RoleContext::anonymous().is_staff_member);
    }
}
