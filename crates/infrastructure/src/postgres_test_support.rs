use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations; `None` when unset.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

/// Inserts a principal with a unique email and returns its id.
pub async fn insert_principal(pool: &PgPool, role: &str) -> i64 {
    let email = format!("{role}-{}@example.test", uuid::Uuid::new_v4());
    let inserted = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO principals (display_name, email, role, password_hash)
        VALUES ($1, $2, $3, 'not-a-real-hash')
        RETURNING id
        "#,
    )
    .bind(format!("Test {role}"))
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(id) => id,
        Err(error) => panic!("failed to insert test principal: {error}"),
    }
}
