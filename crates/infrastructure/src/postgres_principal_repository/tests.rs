use domaris_application::{NewPrincipal, PrincipalRepository};
use domaris_core::{AppError, AppResult, PrincipalId, Role};

use super::PostgresPrincipalRepository;
use crate::postgres_test_support::test_pool;

fn new_principal(email: String) -> NewPrincipal {
    NewPrincipal {
        display_name: "Dana Broker".to_owned(),
        email,
        role: Role::Agent,
        password_hash: "$argon2id$placeholder".to_owned(),
    }
}

#[tokio::test]
async fn create_then_lookup_is_case_insensitive() -> AppResult<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let repository = PostgresPrincipalRepository::new(pool);
    let email = format!("dana-{}@example.test", uuid::Uuid::new_v4());

    let created = repository.create(new_principal(email.clone())).await?;
    assert!(created.is_active());
    assert_eq!(created.role(), Role::Agent);

    let found = repository
        .find_credentials_by_email(email.to_uppercase().as_str())
        .await?;
    let Some(found) = found else {
        panic!("principal should be found regardless of email case");
    };
    assert_eq!(found.principal.id(), created.id());
    assert_eq!(found.password_hash, "$argon2id$placeholder");

    let duplicate = repository
        .create(new_principal(email.to_uppercase()))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn role_and_status_updates_return_the_new_state() -> AppResult<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let repository = PostgresPrincipalRepository::new(pool);
    let created = repository
        .create(new_principal(format!(
            "promote-{}@example.test",
            uuid::Uuid::new_v4()
        )))
        .await?;

    let promoted = repository.set_role(created.id(), Role::Admin).await?;
    assert!(promoted.is_admin());

    let deactivated = repository.set_active(created.id(), false).await?;
    assert!(!deactivated.is_active());
    assert_eq!(deactivated.role(), Role::Admin);
    Ok(())
}

#[tokio::test]
async fn updates_for_unknown_principals_are_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresPrincipalRepository::new(pool);
    let missing = PrincipalId::new(i64::MAX);

    assert!(matches!(
        repository.set_role(missing, Role::Client).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repository.set_active(missing, true).await,
        Err(AppError::NotFound(_))
    ));
}
