//! crates/attendance_core/src/remote.rs
//!
//! The externally-backed auth variant: thin orchestrations over the
//! [`IdentityService`] port for account creation, sign-in, password reset,
//! and profile updates. Remote calls may suspend, so completions are gated
//! by a monotonic request sequence number: a stale response never
//! overwrites state written by a newer request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Profile, Role};
use crate::ports::{IdentityService, PortError};

//=========================================================================================
// Auth Phase
//=========================================================================================

/// The observable outcome of the most recent auth operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Loading,
    Success,
    Error(String),
}

//=========================================================================================
// AuthManager
//=========================================================================================

/// Orchestrates the remote identity/database collaborator. Publishes the
/// current phase and profile through `watch` channels so callers observe
/// the latest state without polling.
pub struct AuthManager {
    identity: Arc<dyn IdentityService>,
    phase_tx: watch::Sender<Option<AuthPhase>>,
    profile_tx: watch::Sender<Option<Profile>>,
    seq: AtomicU64,
}

impl AuthManager {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        let (phase_tx, _) = watch::channel(None);
        let (profile_tx, _) = watch::channel(None);
        Self {
            identity,
            phase_tx,
            profile_tx,
            seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Option<AuthPhase>> {
        self.phase_tx.subscribe()
    }

    pub fn subscribe_profile(&self) -> watch::Receiver<Option<Profile>> {
        self.profile_tx.subscribe()
    }

    pub fn current_profile(&self) -> Option<Profile> {
        self.profile_tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.profile_tx.borrow().is_some()
    }

    //-------------------------------------------------------------------------------------
    // Operations
    //-------------------------------------------------------------------------------------

    /// Creates the remote account, then writes the profile document. Either
    /// step can fail independently; a failure after account creation leaves
    /// the account without a profile, which `login` surfaces as an error.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
        student_id: &str,
        department: &str,
    ) -> AuthPhase {
        let ticket = self.begin();

        let result = async {
            let account_id = self.identity.create_account(email, password).await?;
            let profile = Profile {
                account_id,
                email: email.to_string(),
                name: name.to_string(),
                role,
                student_id: student_id.to_string(),
                department: department.to_string(),
            };
            self.identity.set_profile(account_id, &profile).await?;
            Ok(profile)
        }
        .await;

        match result {
            Ok(profile) => self.finish(ticket, Some(profile), AuthPhase::Success),
            Err(e) => self.finish_err(ticket, registration_message(&e)),
        }
    }

    /// Signs in and loads the profile document for the account.
    pub async fn login(&self, email: &str, password: &str) -> AuthPhase {
        let ticket = self.begin();

        let result = async {
            let account_id = self.identity.sign_in(email, password).await?;
            self.identity.get_profile(account_id).await
        }
        .await;

        match result {
            Ok(profile) => self.finish(ticket, Some(profile), AuthPhase::Success),
            Err(e) => self.finish_err(ticket, login_message(&e)),
        }
    }

    /// Asks the backend to send a password-reset email.
    pub async fn reset_password(&self, email: &str) -> AuthPhase {
        let ticket = self.begin();

        match self.identity.send_password_reset(email).await {
            Ok(()) => self.finish(ticket, self.current_profile(), AuthPhase::Success),
            Err(e) => self.finish_err(ticket, reset_message(&e)),
        }
    }

    /// Updates the mutable profile fields for the signed-in account and
    /// reloads the profile document.
    pub async fn update_profile(
        &self,
        name: &str,
        department: &str,
        student_id: &str,
    ) -> AuthPhase {
        let Some(account_id) = self.current_profile().map(|p| p.account_id) else {
            return AuthPhase::Error("No user logged in".to_string());
        };
        let ticket = self.begin();

        let result = async {
            self.identity
                .update_profile_fields(account_id, name, department, student_id)
                .await?;
            self.identity.get_profile(account_id).await
        }
        .await;

        match result {
            Ok(profile) => self.finish(ticket, Some(profile), AuthPhase::Success),
            Err(e) => self.finish_err(ticket, update_message(&e)),
        }
    }

    /// Drops the signed-in profile and resets the phase.
    pub fn logout(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        let _ = self.profile_tx.send(None);
        let _ = self.phase_tx.send(None);
    }

    //-------------------------------------------------------------------------------------
    // Sequence gating
    //-------------------------------------------------------------------------------------

    fn begin(&self) -> u64 {
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.phase_tx.send(Some(AuthPhase::Loading));
        ticket
    }

    fn finish(&self, ticket: u64, profile: Option<Profile>, phase: AuthPhase) -> AuthPhase {
        if self.seq.load(Ordering::SeqCst) != ticket {
            debug!("dropping stale auth completion (ticket {ticket})");
            return phase;
        }
        let _ = self.profile_tx.send(profile);
        let _ = self.phase_tx.send(Some(phase.clone()));
        phase
    }

    fn finish_err(&self, ticket: u64, message: String) -> AuthPhase {
        let phase = AuthPhase::Error(message);
        if self.seq.load(Ordering::SeqCst) != ticket {
            debug!("dropping stale auth failure (ticket {ticket})");
            return phase;
        }
        let _ = self.phase_tx.send(Some(phase.clone()));
        phase
    }
}

//=========================================================================================
// Error Categorization
//=========================================================================================

/// Maps a remote failure onto the user-facing login message by matching
/// substrings of the underlying error text.
fn login_message(err: &PortError) -> String {
    let text = err.to_string();
    if text.contains("password") {
        "Invalid password".to_string()
    } else if text.contains("email") {
        "Invalid email".to_string()
    } else if text.contains("network") {
        "Network error".to_string()
    } else {
        text
    }
}

fn registration_message(err: &PortError) -> String {
    match err {
        PortError::Unexpected(text) => text.clone(),
        _ => "Registration failed".to_string(),
    }
}

fn reset_message(err: &PortError) -> String {
    match err {
        PortError::Unexpected(text) => text.clone(),
        _ => "Failed to send reset email".to_string(),
    }
}

fn update_message(err: &PortError) -> String {
    match err {
        PortError::Unexpected(text) => text.clone(),
        _ => "Failed to update profile".to_string(),
    }
}

//=========================================================================================
// Tests
//=========================================================================================
