//! Process-wide engine initialization
//!
//! The engine library is a process singleton. Every [`LibraryGuard`] counts
//! as one user: the first guard initializes the library, dropping the last
//! one tears it down. The count is kept under one global lock since guards
//! come and go on different threads.

use crate::backend::Backend;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

static LIBRARY_USERS: Mutex<usize> = Mutex::new(0);

/// One counted user of the engine library.
pub struct LibraryGuard<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> LibraryGuard<B> {
    /// Register a user, initializing the library if this is the first.
    pub fn acquire(backend: Arc<B>) -> Self {
        let mut users = LIBRARY_USERS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *users == 0 {
            debug!("initializing engine library");
            backend.init_library();
        }
        *users += 1;
        Self { backend }
    }

    /// The engine this guard keeps alive.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

/// Number of live guards in the process.
pub fn active_count() -> usize {
    *LIBRARY_USERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

impl<B: Backend> Drop for LibraryGuard<B> {
    fn drop(&mut self) {
        let mut users = LIBRARY_USERS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *users = users.saturating_sub(1);
        if *users == 0 {
            debug!("destroying engine library");
            self.backend.destroy_library();
        }
    }
}

impl<B: Backend> std::fmt::Debug for LibraryGuard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryGuard").finish_non_exhaustive()
    }
}
