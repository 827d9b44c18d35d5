//! SQL DDL for the administrator store.
//! Statements are applied in order: table, additive column migration, indexes.

/// Base table. Older databases may predate some columns; those are listed in
/// [`ADMINISTRATOR_COLUMNS`] and added in place.
/// - `username` UNIQUE
/// - `credential_hash` argon2id PHC string with the salt embedded
/// - `is_seed` INTEGER 0/1, set only on the row created from `ADMIN_USER`/`ADMIN_PASS`
/// - `created_at`/`updated_at` RFC3339 text
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS administrators (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    credential_hash TEXT NOT NULL,
    is_seed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NULL
);
"#;

/// Columns added after the first release, with the type clause used by
/// `ALTER TABLE ... ADD COLUMN`.
pub const ADMINISTRATOR_COLUMNS: &[(&str, &str)] = &[
    ("is_seed", "INTEGER NOT NULL DEFAULT 0"),
    ("updated_at", "TEXT NULL"),
];

/// Indexes depending on migrated columns; applied after migration.
pub const SQLITE_INDEXES: &str = r#"
-- At most one seed row may ever exist.
CREATE UNIQUE INDEX IF NOT EXISTS idx_administrators_single_seed
    ON administrators(is_seed) WHERE is_seed = 1;
"#;
