use std::env;
use std::str::FromStr;

use domaris_application::RegisterPrincipalInput;
use domaris_core::{AppError, Role};
use tracing::info;

use crate::state::AppState;

/// Environment variable holding the password for `create-principal`.
pub const PRINCIPAL_PASSWORD_ENV: &str = "PRINCIPAL_PASSWORD";

const USAGE: &str = "usage: domaris-api [migrate | assign-role <email> <role> | \
                     create-principal <email> <display_name> <role>]";

/// Command selected by the first CLI argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    AssignRole {
        email: String,
        role: Role,
    },
    CreatePrincipal {
        email: String,
        display_name: String,
        role: Role,
    },
}

impl ApiCommand {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let args: Vec<String> = args.into_iter().collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] | ["serve"] => Ok(Self::Serve),
            ["migrate"] => Ok(Self::Migrate),
            ["assign-role", email, role] => Ok(Self::AssignRole {
                email: (*email).to_owned(),
                role: Role::from_str(role)?,
            }),
            ["create-principal", email, display_name, role] => Ok(Self::CreatePrincipal {
                email: (*email).to_owned(),
                display_name: (*display_name).to_owned(),
                role: Role::from_str(role)?,
            }),
            _ => Err(AppError::Validation(USAGE.to_owned())),
        }
    }
}

/// Runs a one-shot operator command against the configured services.
pub async fn run_operator_command(state: &AppState, command: ApiCommand) -> Result<(), AppError> {
    match command {
        ApiCommand::AssignRole { email, role } => {
            let principal = state.principal_service.assign_role(&email, role).await?;
            info!(
                principal_id = %principal.id(),
                email = principal.email(),
                role = principal.role().as_str(),
                "role assigned"
            );
        }
        ApiCommand::CreatePrincipal {
            email,
            display_name,
            role,
        } => {
            let password = env::var(PRINCIPAL_PASSWORD_ENV).map_err(|_| {
                AppError::Validation(format!("{PRINCIPAL_PASSWORD_ENV} is required"))
            })?;
            let principal = state
                .principal_service
                .register(RegisterPrincipalInput {
                    display_name,
                    email,
                    password,
                    role,
                })
                .await?;
            info!(
                principal_id = %principal.id(),
                email = principal.email(),
                role = principal.role().as_str(),
                "principal created"
            );
        }
        ApiCommand::Serve | ApiCommand::Migrate => {
            return Err(AppError::Internal(
                "serve and migrate are not operator commands".to_owned(),
            ));
        }
    }

    Ok(())
}
