//! Session table migration.
//!
//! # Usage
//!
//! ```bash
//! saasbay-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Records live in the record store, so the session table is the only
//! schema this database holds. Safe to run repeatedly.

use saasbay_admin::config::get_database_url;
use saasbay_admin::db;
use saasbay_admin::middleware::session::{SESSION_SCHEMA, SESSION_TABLE, postgres_session_store};

use super::CommandError;

/// Create the admin session schema and table.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing, the connection
/// fails, or the DDL is rejected.
pub async fn sessions() -> Result<(), CommandError> {
    let database_url = get_database_url("ADMIN_DATABASE_URL")?;

    tracing::info!("Connecting to admin database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!(
        schema = SESSION_SCHEMA,
        table = SESSION_TABLE,
        "Creating session table..."
    );
    postgres_session_store(&pool).migrate().await?;

    tracing::info!("Session migration complete");
    Ok(())
}
