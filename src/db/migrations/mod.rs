//! Version-ordered schema migrations.
//!
//! Each script under `sql/` moves the schema from version `k-1` to `k` and
//! runs as one transaction. The `user_version` stamp is written only after
//! the whole batch succeeded, so a half-applied batch never advances the
//! stamp. A fresh database is version `-1`: script v0 builds the initial
//! schema and every later script applies on top, exactly once.

use crate::db::error::MigrationError;
use regex::Regex;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// The schema version this build expects. Startup refuses to serve a store
/// it cannot bring to this version.
pub const TARGET_VERSION: i32 = 4;

/// Script k migrates from version k-1 to version k.
const SCRIPTS: [&str; (TARGET_VERSION + 1) as usize] = [
    include_str!("sql/v0_initial_schema.sql"),
    include_str!("sql/v1_create_giveaways.sql"),
    include_str!("sql/v2_create_application_bans.sql"),
    include_str!("sql/v3_ticket_archival.sql"),
    include_str!("sql/v4_ban_reason.sql"),
];

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\|([^}]*)\}\}").unwrap())
}

/// Resolves `{{NAME|default}}` placeholders against the given lookup in a
/// single pass. Substituted values are never re-scanned, so a placeholder
/// inside a resolved value stays literal.
fn substitute_with(sql: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    placeholder_re()
        .replace_all(sql, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[2].to_string())
        })
        .into_owned()
}

/// Resolves placeholders from the process environment, once per load.
pub fn substitute_placeholders(sql: &str) -> String {
    substitute_with(sql, |name| std::env::var(name).ok())
}

/// Deterministic sibling path for the pre-migration snapshot.
pub fn backup_path(store_file: &Path) -> PathBuf {
    let name = store_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    store_file.with_file_name(format!("{name}.bak"))
}

/// Brings the store from `current` to `target`.
///
/// No-op when the versions already match; refuses to downgrade. When
/// `backup` is set and the store is an existing on-disk file, a full
/// byte-for-byte copy is taken first and any copy failure aborts the
/// migration. `current = -1` means "build a schema from nothing"; callers
/// pass `backup = false` there since there is nothing to protect.
pub async fn migrate(
    db: &DatabaseConnection,
    current: i32,
    target: i32,
    backup: bool,
    store_file: Option<&Path>,
) -> Result<(), MigrationError> {
    if current == target {
        info!("Schema already at version {current}, nothing to migrate");
        return Ok(());
    }
    if current > target {
        return Err(MigrationError::Downgrade { current, target });
    }

    if backup && current >= 0 {
        if let Some(path) = store_file {
            let dest = backup_path(path);
            info!("Backing up {} to {}", path.display(), dest.display());
            std::fs::copy(path, &dest).map_err(MigrationError::Backup)?;
        }
    }

    for version in (current + 1)..=target {
        let script = SCRIPTS
            .get(version as usize)
            .ok_or(MigrationError::MissingScript(version))?;
        let sql = substitute_placeholders(script);

        info!("Applying migration v{version}");
        let txn = db.begin().await?;
        txn.execute_unprepared(&sql)
            .await
            .map_err(|source| MigrationError::Script { version, source })?;
        txn.commit()
            .await
            .map_err(|source| MigrationError::Script { version, source })?;
    }

    // Stamp only after the whole batch went through.
    crate::db::stamp_version(db, target).await?;
    info!("Schema migrated to version {target}");
    Ok(())
}

/// Startup entry point: reads the stamp (or takes `-1` for a database that
/// did not exist before this process connected) and migrates to
/// [`TARGET_VERSION`].
pub async fn ensure_latest(
    db: &DatabaseConnection,
    fresh: bool,
    backup: bool,
    store_file: Option<&Path>,
) -> Result<(), MigrationError> {
    let current = if fresh {
        -1
    } else {
        crate::db::stamped_version(db).await?
    };
    migrate(db, current, TARGET_VERSION, backup && !fresh, store_file).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, stamped_version};
    use sea_orm::{DbBackend, Statement};

    async fn fresh_db() -> DatabaseConnection {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        migrate(&db, -1, TARGET_VERSION, false, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_fresh_migration_reaches_target() {
        let db = fresh_db().await;
        assert_eq!(stamped_version(&db).await.unwrap(), TARGET_VERSION);

        // Every table from every script exists and is queryable.
        for table in ["tickets", "categories", "constants", "giveaways", "application_bans"] {
            db.query_one(Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT COUNT(*) FROM {table}"),
            ))
            .await
            .unwrap()
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_migrate_same_version_is_noop() {
        let db = fresh_db().await;
        migrate(&db, TARGET_VERSION, TARGET_VERSION, false, None)
            .await
            .unwrap();
        assert_eq!(stamped_version(&db).await.unwrap(), TARGET_VERSION);
    }

    #[tokio::test]
    async fn test_downgrade_is_fatal() {
        let db = fresh_db().await;
        let err = migrate(&db, TARGET_VERSION, TARGET_VERSION - 1, false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Downgrade { .. }));
        assert_eq!(stamped_version(&db).await.unwrap(), TARGET_VERSION);
    }

    #[tokio::test]
    async fn test_missing_script_is_fatal() {
        let db = fresh_db().await;
        let err = migrate(&db, TARGET_VERSION, TARGET_VERSION + 1, false, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MissingScript(v) if v == TARGET_VERSION + 1
        ));
        assert_eq!(stamped_version(&db).await.unwrap(), TARGET_VERSION);
    }

    #[tokio::test]
    async fn test_backup_artifact_written_for_partial_upgrade() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steward.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = establish_connection(&url).await.unwrap();

        migrate(&db, -1, 2, false, Some(&path)).await.unwrap();
        assert!(!backup_path(&path).exists());

        migrate(&db, 2, TARGET_VERSION, true, Some(&path))
            .await
            .unwrap();
        assert!(backup_path(&path).exists());
        assert_eq!(stamped_version(&db).await.unwrap(), TARGET_VERSION);
    }

    #[test]
    fn test_placeholder_substitution() {
        let sql = "ALTER TABLE t ADD COLUMN flag INTEGER DEFAULT {{FLAG_DEFAULT|0}};";
        assert_eq!(
            substitute_with(sql, |_| None),
            "ALTER TABLE t ADD COLUMN flag INTEGER DEFAULT 0;"
        );
        assert_eq!(
            substitute_with(sql, |name| (name == "FLAG_DEFAULT").then(|| "1".to_string())),
            "ALTER TABLE t ADD COLUMN flag INTEGER DEFAULT 1;"
        );
    }

    #[test]
    fn test_placeholder_substitution_is_single_pass() {
        // A resolved value containing placeholder syntax stays literal.
        let out = substitute_with("x = {{OUTER|a}}", |_| Some("{{INNER|b}}".to_string()));
        assert_eq!(out, "x = {{INNER|b}}");
    }

    #[test]
    fn test_backup_path_is_deterministic() {
        assert_eq!(
            backup_path(Path::new("data/steward.db")),
            PathBuf::from("data/steward.db.bak")
        );
    }
}
