use std::sync::atomic::{AtomicBool, Ordering};

/// Ownership flag for the single in-flight attempt of one controller.
///
/// Never shared between controllers: each controller owns its own guard.
#[derive(Debug, Default)]
pub struct SessionGuard {
    owned: AtomicBool,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of the attempt slot.
    ///
    /// Returns `false` if an attempt is already owned.
    pub fn try_acquire(&self) -> bool {
        self.owned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear ownership unconditionally.
    pub fn release(&self) {
        self.owned.store(false, Ordering::Release);
    }
}
