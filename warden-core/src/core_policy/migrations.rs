//! Database migrations for the policy store
//!
//! Versioned migrations applied atomically and tracked in the
//! warden_schema_version table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version for the policy store
pub const CURRENT_POLICY_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial protections and whitelist schema",
        up_sql: r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS warden_schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- Per-group protection policies
            CREATE TABLE IF NOT EXISTS protections (
                group_id TEXT PRIMARY KEY,
                name_locked INTEGER NOT NULL DEFAULT 0,
                picture_locked INTEGER NOT NULL DEFAULT 0,
                url_locked INTEGER NOT NULL DEFAULT 0,
                invite_locked INTEGER NOT NULL DEFAULT 0,
                canonical_name TEXT,
                canonical_picture TEXT,
                inviter TEXT NOT NULL,
                sub_admin TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_protections_inviter ON protections(inviter);

            -- Inviter authorization whitelist (expires_at in epoch millis,
            -- NULL = never expires)
            CREATE TABLE IF NOT EXISTS whitelist (
                actor_id TEXT PRIMARY KEY,
                expires_at INTEGER
            );
        "#,
    }]
}

/// Apply any migrations newer than the recorded schema version
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(format!(
            "failed to get connection: {}",
            e
        ))))
    })?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS warden_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let current: i32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM warden_schema_version", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    for migration in get_migrations() {
        if migration.version <= current {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up_sql)?;
        let applied_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        tx.execute(
            "INSERT INTO warden_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, applied_at],
        )?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();

        migrate(&pool).unwrap();
        migrate(&pool).unwrap();

        let conn = pool.get().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM warden_schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_POLICY_SCHEMA_VERSION);
    }
}
