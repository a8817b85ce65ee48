//! The process-wide active-engine slot.
//!
//! At most one engine runs at a time in a process. An engine takes the slot
//! with [`ActiveGuard::try_acquire`] when a run starts; the slot is released
//! when the guard drops, on every exit path including errors and panics.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::DispatchError;

static ACTIVE: Mutex<Option<u64>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<u64>> {
    // Poisoning is ignored: the slot is a plain id.
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the active-engine slot until dropped.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct ActiveGuard {
    id: u64,
}

impl ActiveGuard {
    /// Claims the slot for engine `id`.
    ///
    /// Fails with [`DispatchError::AlreadyRunning`] if any engine, including
    /// `id` itself, holds it.
    pub fn try_acquire(id: u64) -> Result<Self, DispatchError> {
        let mut slot = slot();
        if let Some(active) = *slot {
            tracing::debug!(engine = id, active, "engine slot occupied");
            return Err(DispatchError::AlreadyRunning);
        }
        *slot = Some(id);
        Ok(Self { id })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut slot = slot();
        if *slot == Some(self.id) {
            *slot = None;
        }
    }
}

/// Id of the engine currently running, if any.
pub fn current() -> Option<u64> {
    *slot()
}
