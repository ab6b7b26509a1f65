//! SQL-backed policy store on SQLite

use super::error::{PolicyError, PolicyResult};
use super::policy::{LockKind, ProtectionPolicy};
use super::store::{now_millis, PolicyStore};
use crate::core_platform::{ActorId, GroupId};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

fn storage_err(e: rusqlite::Error) -> PolicyError {
    PolicyError::Storage(e.to_string())
}

/// SQLite-backed [`PolicyStore`]
pub struct SqlPolicyStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlPolicyStore {
    /// Create a store on an existing connection pool, running migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> PolicyResult<Self> {
        super::migrations::migrate(&pool).map_err(storage_err)?;
        Ok(Self { pool })
    }

    /// Open (or create) a store at the given database path
    pub fn open(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(|e| PolicyError::Pool(e.to_string()))?;
        Self::new(pool)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn memory() -> PolicyResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| PolicyError::Pool(e.to_string()))?;
        Self::new(pool)
    }

    fn conn(&self) -> PolicyResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| PolicyError::Pool(e.to_string()))
    }

    fn row_to_policy(row: &Row<'_>) -> Result<ProtectionPolicy, rusqlite::Error> {
        Ok(ProtectionPolicy {
            group: GroupId::new(row.get::<_, String>(0)?),
            name_locked: row.get(1)?,
            picture_locked: row.get(2)?,
            url_locked: row.get(3)?,
            invite_locked: row.get(4)?,
            canonical_name: row.get(5)?,
            canonical_picture: row.get(6)?,
            inviter: ActorId::new(row.get::<_, String>(7)?),
            sub_admin: row.get::<_, Option<String>>(8)?.map(ActorId::new),
        })
    }
}

impl PolicyStore for SqlPolicyStore {
    fn policy(&self, group: &GroupId) -> PolicyResult<Option<ProtectionPolicy>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT group_id, name_locked, picture_locked, url_locked, invite_locked,
                    canonical_name, canonical_picture, inviter, sub_admin
             FROM protections WHERE group_id = ?",
            params![group.as_str()],
            Self::row_to_policy,
        )
        .optional()
        .map_err(storage_err)
    }

    fn create_policy(&self, policy: &ProtectionPolicy) -> PolicyResult<bool> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO protections
                    (group_id, name_locked, picture_locked, url_locked, invite_locked,
                     canonical_name, canonical_picture, inviter, sub_admin)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    policy.group.as_str(),
                    policy.name_locked,
                    policy.picture_locked,
                    policy.url_locked,
                    policy.invite_locked,
                    policy.canonical_name,
                    policy.canonical_picture,
                    policy.inviter.as_str(),
                    policy.sub_admin.as_ref().map(|a| a.as_str().to_string()),
                ],
            )
            .map_err(storage_err)?;
        Ok(inserted > 0)
    }

    fn set_lock(&self, group: &GroupId, kind: LockKind, enabled: bool) -> PolicyResult<()> {
        let column = match kind {
            LockKind::Name => "name_locked",
            LockKind::Picture => "picture_locked",
            LockKind::Url => "url_locked",
            LockKind::Invite => "invite_locked",
        };
        let conn = self.conn()?;
        conn.execute(
            &format!("UPDATE protections SET {} = ? WHERE group_id = ?", column),
            params![enabled, group.as_str()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn set_canonical_name(&self, group: &GroupId, name: &str) -> PolicyResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE protections SET canonical_name = ? WHERE group_id = ?",
            params![name, group.as_str()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn set_canonical_picture(&self, group: &GroupId, picture_ref: &str) -> PolicyResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE protections SET canonical_picture = ? WHERE group_id = ?",
            params![picture_ref, group.as_str()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn set_sub_admin(&self, group: &GroupId, actor: Option<&ActorId>) -> PolicyResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE protections SET sub_admin = ? WHERE group_id = ?",
            params![actor.map(|a| a.as_str().to_string()), group.as_str()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn is_whitelisted(&self, actor: &ActorId) -> PolicyResult<bool> {
        let conn = self.conn()?;
        let expires_at: Option<Option<i64>> = conn
            .query_row(
                "SELECT expires_at FROM whitelist WHERE actor_id = ?",
                params![actor.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_err)?;
        Ok(match expires_at {
            None => false,
            Some(None) => true,
            Some(Some(at)) => at >= now_millis() as i64,
        })
    }

    fn set_whitelisted(&self, actor: &ActorId, expires_at_ms: Option<u64>) -> PolicyResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO whitelist (actor_id, expires_at) VALUES (?, ?)
             ON CONFLICT(actor_id) DO UPDATE SET expires_at = excluded.expires_at",
            params![actor.as_str(), expires_at_ms.map(|v| v as i64)],
        )
        .map_err(storage_err)?;
        Ok(())
    }
}
