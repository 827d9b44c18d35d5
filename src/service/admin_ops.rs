use crate::config::Secret;
use crate::db::models::DbAdministrator;
use crate::db::sqlite::AdminStorage;
use crate::error::NotebookError;
use crate::service::password;
use chrono::Utc;
use tracing::info;

/// Check a username/password pair against the stored administrators.
/// Unknown users and wrong passwords both return `Ok(false)`.
pub async fn authenticate(
    storage: &AdminStorage,
    username: &str,
    password: &Secret,
) -> Result<bool, NotebookError> {
    let Some(admin) = storage.get_by_username(username).await? else {
        return Ok(false);
    };
    password::verify_password_blocking(password.clone(), admin.credential_hash).await
}

/// Replace the password of an existing administrator.
///
/// This is the only path that changes a stored credential; startup seeding
/// never does.
pub async fn rotate_admin_password(
    storage: &AdminStorage,
    username: &str,
    new_password: &Secret,
) -> Result<DbAdministrator, NotebookError> {
    if storage.get_by_username(username).await?.is_none() {
        return Err(NotebookError::AdminNotFound(username.to_string()));
    }

    let credential_hash = password::hash_password_blocking(new_password.clone()).await?;
    if !storage
        .update_credential(username, &credential_hash, Utc::now())
        .await?
    {
        return Err(NotebookError::AdminNotFound(username.to_string()));
    }
    info!(username, "administrator credential rotated");

    storage
        .get_by_username(username)
        .await?
        .ok_or_else(|| NotebookError::AdminNotFound(username.to_string()))
}
