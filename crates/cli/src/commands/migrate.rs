//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wishbox-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `WISHBOX_DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migration files live in `crates/api/migrations/` and are embedded at
//! compile time.

use secrecy::SecretString;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the API database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("WISHBOX_DATABASE_URL")
        .map_err(|_| MigrationError::MissingEnvVar("WISHBOX_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = wishbox_api::db::create_pool(&SecretString::from(database_url)).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
