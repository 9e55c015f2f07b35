//! crates/attendance_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! platform key-value store or a remote identity backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Profile, SavedCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external collaborators
/// (e.g., the filesystem, a remote identity service).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remember-me collaborator: a key-value store holding the saved
/// `(email, password, remember_me)` triple under an app-scoped namespace.
///
/// Used only to support auto-login on process start. Saving implies
/// `remember_me = true`; clearing resets it to `false`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save(&self, email: &str, password: &str) -> PortResult<()>;

    async fn clear(&self) -> PortResult<()>;

    /// Loads whatever is persisted. A store that has never been written
    /// returns empty strings and `remember_me = false` rather than an error.
    async fn load(&self) -> PortResult<SavedCredentials>;
}

/// The remote identity/database collaborator used by the externally-backed
/// auth variant: account creation and sign-in keyed by email+password, plus
/// a document store keyed by account id holding the profile fields.
///
/// Each primitive can fail independently of the others.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> PortResult<Uuid>;

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<Uuid>;

    async fn get_profile(&self, account_id: Uuid) -> PortResult<Profile>;

    async fn set_profile(&self, account_id: Uuid, profile: &Profile) -> PortResult<()>;

    async fn update_profile_fields(
        &self,
        account_id: Uuid,
        name: &str,
        department: &str,
        student_id: &str,
    ) -> PortResult<()>;

    async fn send_password_reset(&self, email: &str) -> PortResult<()>;
}
