//! Storage initializer: the volume directories and the database file.
//!
//! Runs before anything else touches the database. Every failure here is
//! reported as [`StartupError::StorageUnavailable`].

use crate::config::Config;
use crate::db::sqlite::{AdminStorage, open_pool};
use crate::error::{NotebookError, StartupError};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Ensure the database directory and upload directory exist and are writable,
/// then open the database and apply the schema. Safe to call on an already
/// initialized volume.
pub async fn initialize(cfg: &Config) -> Result<AdminStorage, StartupError> {
    prepare_dir(&cfg.database_dir())?;
    prepare_dir(&cfg.upload_dir)?;

    let pool = open_pool(&cfg.db_path, cfg.db_max_connections, cfg.busy_timeout())
        .await
        .map_err(|source| unavailable(&cfg.db_path, source))?;
    let storage = AdminStorage::new(pool);
    if let Err(source) = storage.init_schema().await {
        storage.close().await;
        return Err(unavailable(&cfg.db_path, source));
    }

    info!(
        db_path = %cfg.db_path.display(),
        upload_dir = %cfg.upload_dir.display(),
        "storage ready"
    );
    Ok(storage)
}

/// Create `dir` (and parents) if absent and prove a file can be written in it.
pub fn prepare_dir(dir: &Path) -> Result<(), StartupError> {
    fs::create_dir_all(dir).map_err(|e| unavailable(dir, e.into()))?;
    probe_writable(dir).map_err(|e| unavailable(dir, e))?;
    debug!(path = %dir.display(), "directory writable");
    Ok(())
}

fn probe_writable(dir: &Path) -> Result<(), NotebookError> {
    let probe = dir.join(format!(".write-probe-{}", std::process::id()));
    let written = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .and_then(|mut file| {
            file.write_all(b"ok")?;
            file.sync_all()
        });
    let _ = fs::remove_file(&probe);
    written.map_err(|source| NotebookError::NotWritable {
        path: dir.to_path_buf(),
        source,
    })
}

fn unavailable(path: &Path, source: NotebookError) -> StartupError {
    StartupError::StorageUnavailable {
        path: path.to_path_buf(),
        source,
    }
}
