//! Login gate backed by the local store.
//!
//! Credentials are fixed placeholders. The username is trimmed before
//! comparison; the password is compared as typed.

use crate::storage::{KvStore, StoreError, KEY_LOGGED_IN};
use thiserror::Error;

const VALID_USERNAME: &str = "user";
const VALID_PASSWORD: &str = "pass";

/// Rejection line shown on a failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password. Please try again.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Check credentials and persist the logged-in flag on success.
pub async fn login(store: &mut KvStore, username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim() == VALID_USERNAME && password == VALID_PASSWORD {
        store.set(KEY_LOGGED_IN, "true").await?;
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Clear the logged-in flag.
pub async fn logout(store: &mut KvStore) -> Result<(), AuthError> {
    store.remove(KEY_LOGGED_IN).await?;
    Ok(())
}

pub fn is_logged_in(store: &KvStore) -> bool {
    store.get(KEY_LOGGED_IN) == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, KvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path().join("state.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_valid_credentials_log_in() {
        let (_dir, mut store) = store().await;
        assert!(!is_logged_in(&store));

        login(&mut store, "user", "pass").await.unwrap();
        assert!(is_logged_in(&store));
    }

    #[tokio::test]
    async fn test_username_is_trimmed_password_is_not() {
        let (_dir, mut store) = store().await;

        login(&mut store, "  user  ", "pass").await.unwrap();
        assert!(is_logged_in(&store));

        logout(&mut store).await.unwrap();
        let result = login(&mut store, "user", " pass ").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!is_logged_in(&store));
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_flag_unset() {
        let (_dir, mut store) = store().await;
        let result = login(&mut store, "admin", "hunter2").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!is_logged_in(&store));
    }

    #[tokio::test]
    async fn test_logout_clears_flag() {
        let (_dir, mut store) = store().await;
        login(&mut store, "user", "pass").await.unwrap();
        logout(&mut store).await.unwrap();
        assert!(!is_logged_in(&store));
    }
}
