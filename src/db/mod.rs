use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod error;
pub mod migrations;
pub mod repositories;

/// Opens the process-wide store connection.
///
/// A single connection, opened once at startup and closed once at shutdown;
/// repositories and sweep workers all share it and serialize through the
/// event loop, so no SQL ever runs concurrently.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = sea_orm::ConnectOptions::new(database_url);
    opt.max_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    info!("Connecting to database...");
    let db = Database::connect(opt).await?;
    info!("Database connection established");

    Ok(db)
}

/// Reads the schema version stamped on the store (`PRAGMA user_version`).
pub async fn stamped_version(db: &DatabaseConnection) -> Result<i32, DbErr> {
    let row = db
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA user_version",
        ))
        .await?
        .ok_or_else(|| DbErr::Custom("PRAGMA user_version returned no row".into()))?;
    Ok(row.try_get_by_index::<i32>(0)?)
}

/// Advances the stamped schema version. Never called with a value lower
/// than the current stamp; the migrator enforces monotonicity.
pub async fn stamp_version(db: &DatabaseConnection, version: i32) -> Result<(), DbErr> {
    db.execute_unprepared(&format!("PRAGMA user_version = {version}"))
        .await?;
    Ok(())
}

/// Extracts the on-disk file behind a sqlite URL, if there is one.
/// In-memory databases have no file and therefore nothing to back up.
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}
