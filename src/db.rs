use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::errors::AppError;
use crate::models::user::{self, NewUser, Role};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the default administrator if no account uses `email` yet.
/// Returns true when a user was created.
pub async fn seed_admin(pool: &PgPool, email: &str, password_hash: &str) -> Result<bool, AppError> {
    if user::find_by_email(pool, email).await?.is_some() {
        log::info!("Admin user {email} already exists, skipping seed");
        return Ok(false);
    }

    let admin = NewUser {
        email: email.to_string(),
        password: password_hash.to_string(),
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        role: Role::Admin,
    };
    let id = user::create(pool, &admin).await?;
    log::info!("Seeded admin user {email} (id={id})");
    Ok(true)
}
