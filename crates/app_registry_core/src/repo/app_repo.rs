//! App record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage port the registry service depends on.
//! - Keep SQL details inside the persistence boundary.
//! - Surface uniqueness violations as `RepoError::Conflict`.
//!
//! # Invariants
//! - Normal reads never return soft-deleted rows.
//! - Update statements never write `app_id`.
//! - The partial unique index `idx_apps_app_id_active` guarantees at most one
//!   live row per `app_id`, independently of service-level pre-checks.

use crate::db::migrations::ensure_schema_ready;
use crate::db::DbError;
use crate::model::app::{App, AppId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const APP_SELECT_SQL: &str = "SELECT
    id,
    app_id,
    name,
    org_id,
    org_name,
    owner_name,
    owner_email,
    is_deleted,
    deleted_by,
    deleted_at,
    created_by,
    created_at,
    last_modified_by,
    last_modified_at
FROM apps";

const NOW_MS_SQL: &str = "(CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for app persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Transport or engine failure, including an unavailable database.
    Db(DbError),
    /// No live row matches the given app id.
    NotFound(AppId),
    /// A live row already holds the given app id.
    Conflict(AppId),
    /// A persisted row could not be decoded.
    InvalidData(String),
}

impl RepoError {
    fn from_write(err: rusqlite::Error, app_id: &str) -> Self {
        let err = DbError::from(err);
        if err.is_unique_violation() {
            Self::Conflict(app_id.to_string())
        } else {
            Self::Db(err)
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(app_id) => write!(f, "app not found: {app_id}"),
            Self::Conflict(app_id) => write!(f, "app id already taken: {app_id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted app data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whether a soft-deleted app keeps its identifier out of circulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedAppIdPolicy {
    /// Existence checks ignore tombstones; a deleted id may be created again.
    #[default]
    Reusable,
    /// Existence checks include tombstones; a deleted id stays taken.
    Reserved,
}

/// Zero-based page selector for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Clamps `size` to `1..=max_size`.
    pub fn normalized(self, max_size: u32) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Storage port for app records.
pub trait AppRepository {
    /// Persists a new live app and returns the stored row.
    ///
    /// Fails with `Conflict` when a live row already holds `app.app_id`.
    fn insert(&self, app: &App) -> RepoResult<App>;
    /// Finds one app by business key, optionally including tombstones.
    fn find_by_app_id(&self, app_id: &str, include_deleted: bool) -> RepoResult<Option<App>>;
    /// Existence check governed by the store's [`DeletedAppIdPolicy`].
    fn is_app_id_taken(&self, app_id: &str) -> RepoResult<bool>;
    /// Lists live apps whose name equals `name`, ordered by `id`.
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<App>>;
    /// Lists one page of live apps ordered by `id`.
    fn find_all(&self, page: &PageRequest) -> RepoResult<Vec<App>>;
    /// Rewrites the mutable fields of the live app keyed by `app.app_id`.
    fn update(&self, app: &App) -> RepoResult<()>;
    /// Tombstones the live app keyed by `app_id`, recording `operator`.
    fn mark_deleted(&self, app_id: &str, operator: &str) -> RepoResult<()>;
}

/// SQLite-backed app repository.
pub struct SqliteAppRepository<'conn> {
    conn: &'conn Connection,
    policy: DeletedAppIdPolicy,
}

impl<'conn> SqliteAppRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self {
            conn,
            policy: DeletedAppIdPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: DeletedAppIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DeletedAppIdPolicy {
        self.policy
    }

    fn find_by_row_id(&self, id: i64) -> RepoResult<Option<App>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{APP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_app_row(row)?)),
            None => Ok(None),
        }
    }

    fn collect_apps(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<App>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut apps = Vec::new();
        while let Some(row) = rows.next()? {
            apps.push(parse_app_row(row)?);
        }
        Ok(apps)
    }
}

impl AppRepository for SqliteAppRepository<'_> {
    fn insert(&self, app: &App) -> RepoResult<App> {
        let last_modified_by = app
            .data_change_last_modified_by
            .as_deref()
            .or(app.data_change_created_by.as_deref());

        self.conn
            .execute(
                "INSERT INTO apps (
                    app_id,
                    name,
                    org_id,
                    org_name,
                    owner_name,
                    owner_email,
                    created_by,
                    last_modified_by
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    app.app_id.as_str(),
                    app.name.as_str(),
                    app.org_id.as_str(),
                    app.org_name.as_str(),
                    app.owner_name.as_str(),
                    app.owner_email.as_str(),
                    app.data_change_created_by.as_deref(),
                    last_modified_by,
                ],
            )
            .map_err(|err| RepoError::from_write(err, &app.app_id))?;

        let id = self.conn.last_insert_rowid();
        self.find_by_row_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted app row {id} missing on read-back"))
        })
    }

    fn find_by_app_id(&self, app_id: &str, include_deleted: bool) -> RepoResult<Option<App>> {
        // Live row first; among tombstones the most recent one wins.
        let mut stmt = self.conn.prepare(&format!(
            "{APP_SELECT_SQL}
             WHERE app_id = ?1
               AND (?2 = 1 OR is_deleted = 0)
             ORDER BY is_deleted ASC, id DESC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![app_id, bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_app_row(row)?));
        }

        Ok(None)
    }

    fn is_app_id_taken(&self, app_id: &str) -> RepoResult<bool> {
        let include_deleted = self.policy == DeletedAppIdPolicy::Reserved;
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM apps
                 WHERE app_id = ?1
                   AND (?2 = 1 OR is_deleted = 0)
                 LIMIT 1;",
                params![app_id, bool_to_int(include_deleted)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<App>> {
        self.collect_apps(
            &format!("{APP_SELECT_SQL} WHERE name = ?1 AND is_deleted = 0 ORDER BY id ASC;"),
            [name],
        )
    }

    fn find_all(&self, page: &PageRequest) -> RepoResult<Vec<App>> {
        let offset = i64::try_from(page.offset()).map_err(|_| {
            RepoError::InvalidData(format!("page offset {} out of range", page.offset()))
        })?;
        self.collect_apps(
            &format!("{APP_SELECT_SQL} WHERE is_deleted = 0 ORDER BY id ASC LIMIT ?1 OFFSET ?2;"),
            params![i64::from(page.size), offset],
        )
    }

    fn update(&self, app: &App) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE apps
                     SET
                        name = ?2,
                        org_id = ?3,
                        org_name = ?4,
                        owner_name = ?5,
                        owner_email = ?6,
                        last_modified_by = COALESCE(?7, last_modified_by),
                        last_modified_at = {NOW_MS_SQL}
                     WHERE app_id = ?1
                       AND is_deleted = 0;"
                ),
                params![
                    app.app_id.as_str(),
                    app.name.as_str(),
                    app.org_id.as_str(),
                    app.org_name.as_str(),
                    app.owner_name.as_str(),
                    app.owner_email.as_str(),
                    app.data_change_last_modified_by.as_deref(),
                ],
            )
            .map_err(|err| RepoError::from_write(err, &app.app_id))?;

        if changed == 0 {
            return Err(RepoError::NotFound(app.app_id.clone()));
        }

        Ok(())
    }

    fn mark_deleted(&self, app_id: &str, operator: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE apps
                 SET
                    is_deleted = 1,
                    deleted_by = ?2,
                    deleted_at = {NOW_MS_SQL},
                    last_modified_by = ?2,
                    last_modified_at = {NOW_MS_SQL}
                 WHERE app_id = ?1
                   AND is_deleted = 0;"
            ),
            params![app_id, operator],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(app_id.to_string()));
        }

        Ok(())
    }
}

fn parse_app_row(row: &Row<'_>) -> RepoResult<App> {
    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in apps.is_deleted"
            )));
        }
    };

    Ok(App {
        id: row.get("id")?,
        app_id: row.get("app_id")?,
        name: row.get("name")?,
        org_id: row.get("org_id")?,
        org_name: row.get("org_name")?,
        owner_name: row.get("owner_name")?,
        owner_email: row.get("owner_email")?,
        is_deleted,
        deleted_by: row.get("deleted_by")?,
        deleted_at: row.get("deleted_at")?,
        data_change_created_by: row.get("created_by")?,
        data_change_created_time: row.get("created_at")?,
        data_change_last_modified_by: row.get("last_modified_by")?,
        data_change_last_modified_time: row.get("last_modified_at")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

#[cfg(test)]
mod tests {
    use super::PageRequest;

    #[test]
    fn page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).normalized(500).size, 1);
        assert_eq!(PageRequest::new(3, 9_999).normalized(500).size, 500);
        assert_eq!(PageRequest::new(2, 10).normalized(500), PageRequest::new(2, 10));
    }

    #[test]
    fn page_request_offset_does_not_overflow() {
        let page = PageRequest::new(u32::MAX, u32::MAX);
        assert_eq!(page.offset(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }
}
