//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag polled between files and groups
///
/// Cancelling never interrupts a file mid-way; work stops at the next
/// file or group boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; safe to call from a signal handler thread
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let handler_copy = token.clone();
        assert!(!token.is_cancelled());

        std::thread::spawn(move || handler_copy.cancel())
            .join()
            .unwrap();

        assert!(token.is_cancelled());
    }
}
