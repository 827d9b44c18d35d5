use crate::config::Config;
use crate::db::sqlite::AdminStorage;
use crate::error::{NotebookError, StartupError};
use crate::service::password;
use chrono::Utc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The table was empty; the configured credentials became the first administrator.
    Created { id: i64, username: String },
    /// Administrators already existed; nothing was written.
    AlreadyPresent { administrators: i64 },
}

/// Make sure at least one administrator exists, seeding one from
/// `ADMIN_USER`/`ADMIN_PASS` only when the table is empty.
///
/// Existing rows are never touched, whatever the configured credentials are now.
/// If another process seeds between the emptiness check and the insert, this
/// call fails instead of adding a second administrator.
pub async fn seed_admin(
    storage: &AdminStorage,
    cfg: &Config,
) -> Result<SeedOutcome, StartupError> {
    seed_inner(storage, cfg)
        .await
        .map_err(StartupError::BootstrapFailed)
}

async fn seed_inner(storage: &AdminStorage, cfg: &Config) -> Result<SeedOutcome, NotebookError> {
    let administrators = storage.count().await?;
    if administrators > 0 {
        info!(administrators, "administrator present; seed credentials ignored");
        return Ok(SeedOutcome::AlreadyPresent { administrators });
    }

    let username = cfg.admin_user.trim();
    if username.is_empty() {
        return Err(NotebookError::InvalidCredential("ADMIN_USER must not be empty"));
    }
    if cfg.admin_pass.is_empty() {
        return Err(NotebookError::InvalidCredential(
            "ADMIN_PASS must be set to seed the first administrator",
        ));
    }

    let credential_hash = password::hash_password_blocking(cfg.admin_pass.clone()).await?;

    match storage
        .insert_seed_if_absent(username, &credential_hash, Utc::now())
        .await?
    {
        Some(id) => {
            info!(id, username, "created seed administrator");
            Ok(SeedOutcome::Created {
                id,
                username: username.to_string(),
            })
        }
        None => {
            warn!(username, "administrator appeared while seeding");
            Err(NotebookError::SeedConflict)
        }
    }
}
