//! services/api/src/adapters/prefs.rs
//!
//! This module contains the preferences adapter, the concrete implementation
//! of the `CredentialStore` port from the `core` crate. It persists the
//! remember-me triple as a small JSON file, standing in for the platform
//! key-value store of the reference application.

use async_trait::async_trait;
use attendance_core::domain::SavedCredentials;
use attendance_core::ports::{CredentialStore, PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed credential store implementing the `CredentialStore` port.
#[derive(Clone)]
pub struct PrefsAdapter {
    path: PathBuf,
}

impl PrefsAdapter {
    /// Creates a new `PrefsAdapter` writing to the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

//=========================================================================================
// "Impure" File Record Struct
//=========================================================================================

/// The on-disk shape, keyed the way the reference preferences store keys
/// its entries.
#[derive(Default, Serialize, Deserialize)]
struct PrefsRecord {
    user_email: String,
    user_password: String,
    remember_me: bool,
}

impl PrefsRecord {
    fn to_domain(self) -> SavedCredentials {
        SavedCredentials {
            email: self.user_email,
            password: self.user_password,
            remember_me: self.remember_me,
        }
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for PrefsAdapter {
    async fn save(&self, email: &str, password: &str) -> PortResult<()> {
        let record = PrefsRecord {
            user_email: email.to_string(),
            user_password: password.to_string(),
            remember_me: true,
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn clear(&self) -> PortResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            // Clearing an already-empty store is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn load(&self) -> PortResult<SavedCredentials> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            // A store that has never been written yields empty credentials.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SavedCredentials::default())
            }
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        let record: PrefsRecord =
            serde_json::from_str(&json).map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_in(dir: &tempfile::TempDir) -> PrefsAdapter {
        PrefsAdapter::new(dir.path().join("prefs.json"))
    }

    #[tokio::test]
    async fn load_of_missing_file_yields_empty_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = adapter_in(&dir);

        let creds = prefs.load().await.unwrap();
        assert!(creds.email.is_empty());
        assert!(creds.password.is_empty());
        assert!(!creds.remember_me);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = adapter_in(&dir);

        prefs.save("a@u.edu", "pw").await.unwrap();
        let creds = prefs.load().await.unwrap();
        assert_eq!(creds.email, "a@u.edu");
        assert_eq!(creds.password, "pw");
        assert!(creds.remember_me);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = adapter_in(&dir);

        prefs.clear().await.unwrap();
        prefs.save("a@u.edu", "pw").await.unwrap();
        prefs.clear().await.unwrap();
        prefs.clear().await.unwrap();

        assert!(!prefs.load().await.unwrap().remember_me);
    }
}
