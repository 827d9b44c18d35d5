use crate::db::models::{DbAdministrator, NewAdministrator};
use crate::db::schema::{ADMINISTRATOR_COLUMNS, SQLITE_INDEXES, SQLITE_INIT};
use crate::error::NotebookError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

const ADMIN_TABLE: &str = "administrators";

/// Open the database file, creating it when missing, and build the pool shared
/// by the whole process. WAL lets readers proceed while one writer holds the
/// lock; `synchronous=FULL` fsyncs every commit.
pub async fn open_pool(
    path: &Path,
    max_connections: u32,
    busy_timeout: Duration,
) -> Result<SqlitePool, NotebookError> {
    let connect_opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct AdminStorage {
    pool: SqlitePool,
}

impl AdminStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create the table, add columns missing from older files, then build indexes.
    pub async fn init_schema(&self) -> Result<(), NotebookError> {
        self.execute_script(SQLITE_INIT).await?;
        self.migrate_columns().await?;
        self.execute_script(SQLITE_INDEXES).await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<(), NotebookError> {
        // sqlx::query runs one statement at a time
        for stmt in script.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Add every column from [`ADMINISTRATOR_COLUMNS`] the table lacks.
    /// Returns the names that were added by this call.
    pub async fn migrate_columns(&self) -> Result<Vec<&'static str>, NotebookError> {
        let existing = self.column_names(ADMIN_TABLE).await?;
        let mut added = Vec::new();

        for &(column, ty) in ADMINISTRATOR_COLUMNS {
            if existing.contains(column) {
                continue;
            }
            let ddl = format!("ALTER TABLE {ADMIN_TABLE} ADD COLUMN {column} {ty}");
            if let Err(e) = sqlx::query(&ddl).execute(&self.pool).await {
                // A concurrent startup may have added it first.
                if !self.column_names(ADMIN_TABLE).await?.contains(column) {
                    return Err(e.into());
                }
                debug!(column, error = %e, "column already added by another connection");
                continue;
            }
            info!(table = ADMIN_TABLE, column, "added missing column");
            added.push(column);
        }

        Ok(added)
    }

    async fn column_names(&self, table: &str) -> Result<HashSet<String>, NotebookError> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    pub async fn count(&self) -> Result<i64, NotebookError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM administrators")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert the seed administrator only if the table is empty.
    ///
    /// The emptiness check and the insert are a single statement, so SQLite's
    /// write lock covers both. Returns the new row id, or `None` when any
    /// administrator already existed.
    pub async fn insert_seed_if_absent(
        &self,
        username: &str,
        credential_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<i64>, NotebookError> {
        let result = sqlx::query(
            r#"
            INSERT INTO administrators (username, credential_hash, is_seed, created_at)
            SELECT ?, ?, 1, ?
            WHERE NOT EXISTS (SELECT 1 FROM administrators)
            "#,
        )
        .bind(username)
        .bind(credential_hash)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Unconditional insert. Fails on a duplicate username or a second seed row.
    pub async fn create(&self, admin: NewAdministrator) -> Result<i64, NotebookError> {
        let seed_i = if admin.is_seed { 1 } else { 0 };
        let result = sqlx::query(
            r#"INSERT INTO administrators (username, credential_hash, is_seed, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(admin.username)
        .bind(admin.credential_hash)
        .bind(seed_i)
        .bind(admin.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DbAdministrator>, NotebookError> {
        let row = sqlx::query(
            r#"SELECT id, username, credential_hash, is_seed, created_at, updated_at
               FROM administrators WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn list(&self) -> Result<Vec<DbAdministrator>, NotebookError> {
        let rows = sqlx::query(
            r#"SELECT id, username, credential_hash, is_seed, created_at, updated_at
               FROM administrators ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    /// Replace the stored hash for `username`. Returns false when no such row exists.
    pub async fn update_credential(
        &self,
        username: &str,
        credential_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, NotebookError> {
        let result = sqlx::query(
            "UPDATE administrators SET credential_hash = ?, updated_at = ? WHERE username = ?",
        )
        .bind(credential_hash)
        .bind(updated_at.to_rfc3339())
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_model(row: SqliteRow) -> Result<DbAdministrator, NotebookError> {
        let id: i64 = row.try_get("id")?;
        let username: String = row.try_get("username")?;
        let credential_hash: String = row.try_get("credential_hash")?;
        let is_seed_i: i64 = row.try_get("is_seed")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: Option<String> = row.try_get("updated_at")?;

        let created_at = parse_timestamp(&created_at_str)?;
        let updated_at = updated_at_str.as_deref().map(parse_timestamp).transpose()?;

        Ok(DbAdministrator {
            id,
            username,
            credential_hash,
            is_seed: is_seed_i != 0,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, NotebookError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_db_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "people-notebook-{tag}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        path
    }

    fn remove_db(path: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    async fn open_storage(path: &Path) -> AdminStorage {
        let pool = open_pool(path, 2, Duration::from_secs(5))
            .await
            .expect("failed to open pool");
        AdminStorage::new(pool)
    }

    fn new_admin(username: &str, is_seed: bool) -> NewAdministrator {
        NewAdministrator {
            username: username.to_string(),
            credential_hash: format!("hash-of-{username}"),
            is_seed,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn legacy_table_gains_missing_columns() {
        let path = temp_db_path("legacy");
        let storage = open_storage(&path).await;

        sqlx::query(
            r#"CREATE TABLE administrators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                credential_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )"#,
        )
        .execute(storage.pool())
        .await
        .expect("failed to create legacy table");
        sqlx::query(
            "INSERT INTO administrators (username, credential_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind("legacy")
        .bind("old-hash")
        .bind(Utc::now().to_rfc3339())
        .execute(storage.pool())
        .await
        .expect("failed to insert legacy row");

        storage.init_schema().await.expect("init_schema failed");

        let admins = storage.list().await.expect("list failed");
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "legacy");
        assert!(!admins[0].is_seed);
        assert_eq!(admins[0].updated_at, None);

        let added = storage.migrate_columns().await.expect("second migration failed");
        assert!(added.is_empty());

        storage.close().await;
        remove_db(&path);
    }

    #[tokio::test]
    async fn seed_insert_is_skipped_when_any_admin_exists() {
        let path = temp_db_path("seed-skip");
        let storage = open_storage(&path).await;
        storage.init_schema().await.expect("init_schema failed");

        storage
            .create(new_admin("root", false))
            .await
            .expect("create failed");

        let inserted = storage
            .insert_seed_if_absent("admin", "hash", Utc::now())
            .await
            .expect("seed insert failed");
        assert_eq!(inserted, None);
        assert_eq!(storage.count().await.expect("count failed"), 1);
        assert!(
            storage
                .get_by_username("admin")
                .await
                .expect("lookup failed")
                .is_none()
        );

        storage.close().await;
        remove_db(&path);
    }

    #[tokio::test]
    async fn only_one_seed_row_may_exist() {
        let path = temp_db_path("single-seed");
        let storage = open_storage(&path).await;
        storage.init_schema().await.expect("init_schema failed");

        let id = storage
            .insert_seed_if_absent("admin", "hash", Utc::now())
            .await
            .expect("seed insert failed");
        assert!(id.is_some());

        let err = storage
            .create(new_admin("second", true))
            .await
            .expect_err("second seed row must be rejected");
        assert!(err.is_unique_violation());

        let err = storage
            .create(new_admin("admin", false))
            .await
            .expect_err("duplicate username must be rejected");
        assert!(err.is_unique_violation());

        storage.close().await;
        remove_db(&path);
    }

    #[tokio::test]
    async fn update_credential_reports_missing_user() {
        let path = temp_db_path("update");
        let storage = open_storage(&path).await;
        storage.init_schema().await.expect("init_schema failed");
        storage
            .create(new_admin("admin", true))
            .await
            .expect("create failed");

        let now = Utc::now();
        assert!(
            storage
                .update_credential("admin", "new-hash", now)
                .await
                .expect("update failed")
        );
        assert!(
            !storage
                .update_credential("ghost", "new-hash", now)
                .await
                .expect("update failed")
        );

        let admin = storage
            .get_by_username("admin")
            .await
            .expect("lookup failed")
            .expect("admin missing");
        assert_eq!(admin.credential_hash, "new-hash");
        assert!(admin.updated_at.is_some());

        storage.close().await;
        remove_db(&path);
    }
}
