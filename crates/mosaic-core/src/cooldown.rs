//! Authorization cool-down shared by an adapter and its queued requests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Authorization cool-down for one adapter.
///
/// Tripped by a 401/403 from the upstream. While active, searches return an
/// empty result without touching the network or the quota gate. Once the
/// window has elapsed the state clears itself and the next call reaches the
/// upstream again.
#[derive(Debug)]
pub struct Cooldown {
    window: Option<Duration>,
    tripped_at: Mutex<Option<Instant>>,
}

impl Cooldown {
    /// `None` disables the cool-down entirely.
    pub fn new(window: Option<Duration>) -> Self {
        Self {
            window,
            tripped_at: Mutex::new(None),
        }
    }

    pub const fn window(&self) -> Option<Duration> {
        self.window
    }

    pub fn is_active(&self) -> bool {
        self.remaining().is_some()
    }

    /// Time left in the current window, clearing expired state.
    pub fn remaining(&self) -> Option<Duration> {
        let window = self.window?;
        let mut tripped_at = self
            .tripped_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let elapsed = tripped_at.as_ref()?.elapsed();

        if elapsed >= window {
            *tripped_at = None;
            return None;
        }
        Some(window - elapsed)
    }

    /// Start (or restart) the window. Returns `false` when disabled.
    pub fn trip(&self) -> bool {
        if self.window.is_none() {
            return false;
        }
        *self
            .tripped_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        true
    }

    pub fn reset(&self) {
        *self
            .tripped_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(300)))
    }
}
