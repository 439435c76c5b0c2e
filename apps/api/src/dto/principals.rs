use domaris_core::{Principal, RoleContext};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for password login.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// API representation of a principal account.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/principal-response.ts"
)]
pub struct PrincipalResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl From<Principal> for PrincipalResponse {
    fn from(value: Principal) -> Self {
        Self {
            id: value.id().as_i64(),
            display_name: value.display_name().to_owned(),
            email: value.email().to_owned(),
            role: value.role().as_str().to_owned(),
            is_active: value.is_active(),
        }
    }
}

/// The authenticated principal together with its role flags.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-principal-response.ts"
)]
pub struct SessionPrincipalResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub is_agent: bool,
    pub is_client: bool,
    pub is_staff_member: bool,
}

impl SessionPrincipalResponse {
    pub fn new(principal: &Principal, role_context: RoleContext) -> Self {
        Self {
            id: principal.id().as_i64(),
            display_name: principal.display_name().to_owned(),
            email: principal.email().to_owned(),
            role: principal.role().as_str().to_owned(),
            is_admin: role_context.is_admin,
            is_agent: role_context.is_agent,
            is_client: role_context.is_client,
            is_staff_member: role_context.is_staff_member,
        }
    }
}
