//! Database pool and schema migration management.

use rocket_db_pools::Database;
use sqlx::PgPool;
use sqlx::migrate::Migrator;

#[derive(Database)]
#[database("accounts_db")]
pub struct AccountsDb(sqlx::PgPool);

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations before the server starts serving traffic.
///
/// Idempotent: SQLx tracks applied migrations and verifies checksums, so a
/// drifted schema aborts startup instead of limping along.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}
