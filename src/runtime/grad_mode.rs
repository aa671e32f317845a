//! Thread-local gradient mode.
//!
//! A tensor's effective `requires_grad` is its own flag masked by the
//! gradient mode of the thread evaluating the guard.

use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

pub fn is_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Sets gradient mode for the current thread and returns the previous value.
pub fn set_enabled(enabled: bool) -> bool {
    GRAD_ENABLED.with(|cell| cell.replace(enabled))
}

/// Disables gradient mode on the current thread until dropped.
#[must_use = "gradient mode is restored as soon as the guard is dropped"]
pub struct NoGradGuard {
    previous: bool,
}

impl NoGradGuard {
    pub fn new() -> Self {
        Self {
            previous: set_enabled(false),
        }
    }
}

impl Default for NoGradGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NoGradGuard {
    fn drop(&mut self) {
        set_enabled(self.previous);
    }
}
