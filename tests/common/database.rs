//! Test database setup
#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection, DbErr};
use std::env;

/// A fresh database with the schema and default reference rows.
///
/// Uses an in-memory SQLite database unless `TEST_DATABASE_URL` is set.
/// The in-memory database lives as long as the returned connection, so
/// every test starts from an empty site.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    let db = Database::connect(&database_url).await?;
    bandtogether::db::create_schema(&db).await?;
    bandtogether::taxonomy::seed_defaults(&db).await?;

    Ok(db)
}
