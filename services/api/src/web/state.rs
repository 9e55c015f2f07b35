//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use attendance_core::store::DomainStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all
/// handlers.
///
/// The domain store models a single logical session, so it sits behind one
/// mutex; the lock serializes operations the way the reference design's
/// single-threaded event loop does.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<DomainStore>>,
    pub config: Arc<Config>,
}
