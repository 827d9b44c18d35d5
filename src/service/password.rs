use crate::config::Secret;
use crate::error::NotebookError;
use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

/// Derive an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &Secret) -> Result<String, NotebookError> {
    if password.is_empty() {
        return Err(NotebookError::InvalidCredential("password must not be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| NotebookError::PasswordHash(e.to_string()))
}

/// Check `password` against a stored PHC string. A mismatch is `Ok(false)`;
/// only a malformed hash is an error.
pub fn verify_password(password: &Secret, credential_hash: &str) -> Result<bool, NotebookError> {
    let parsed =
        PasswordHash::new(credential_hash).map_err(|e| NotebookError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.expose().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(NotebookError::PasswordHash(e.to_string())),
    }
}

/// [`hash_password`] on the blocking pool so the runtime workers stay free.
pub async fn hash_password_blocking(password: Secret) -> Result<String, NotebookError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(
    password: Secret,
    credential_hash: String,
) -> Result<bool, NotebookError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &credential_hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password(&Secret::from("changeme")).expect("hashing failed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("changeme"));

        assert!(verify_password(&Secret::from("changeme"), &hash).expect("verify failed"));
        for wrong in ["", "changeme ", "Changeme", "changem", "admin"] {
            assert!(
                !verify_password(&Secret::from(wrong), &hash).expect("verify failed"),
                "{wrong:?} must not verify"
            );
        }
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password(&Secret::from("same")).expect("hashing failed");
        let b = hash_password(&Secret::from("same")).expect("hashing failed");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = hash_password(&Secret::default()).expect_err("empty password must fail");
        assert!(matches!(err, NotebookError::InvalidCredential(_)));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let err = verify_password(&Secret::from("changeme"), "plaintext")
            .expect_err("malformed hash must fail");
        assert!(matches!(err, NotebookError::PasswordHash(_)));
    }

    #[tokio::test]
    async fn blocking_helpers_round_trip() {
        let hash = hash_password_blocking(Secret::from("s3cret"))
            .await
            .expect("hashing failed");
        assert!(
            verify_password_blocking(Secret::from("s3cret"), hash)
                .await
                .expect("verify failed")
        );
    }
}
