use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot latch for the problem-pod warning
///
/// The first call to [`WarningGate::fire_once`] runs its action, every later
/// call is a no-op. Concurrent callers race on a single atomic flag, so the
/// action runs at most once.
#[derive(Debug, Default)]
pub struct WarningGate {
    fired: AtomicBool,
}

impl WarningGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` if the gate has not fired yet
    pub fn fire_once<F: FnOnce()>(&self, action: F) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            action();
        }
    }

    #[cfg(test)]
    fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
