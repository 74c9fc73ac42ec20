//! Move-only ownership guard for a single device handle.
//!
//! The serial link hands its writer handle to a [`Scoped`] so the device
//! is released exactly once on every exit path — normal drop, explicit
//! `clear`, or replacement via `reset`. `release` detaches the handle
//! without dropping it, for callers that take over ownership.

/// Exclusive owner of one handle of type `T`.
///
/// Move semantics come for free in Rust (no `Clone` is derived); the
/// interesting part is the release discipline: whatever was held is
/// dropped exactly once, and never after `release`.
#[derive(Debug, Default)]
pub struct Scoped<T> {
    value: Option<T>,
}

impl<T> Scoped<T> {
    /// An empty guard holding nothing.
    pub fn empty() -> Self {
        Self { value: None }
    }

    /// Take ownership of `value`.
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// Replace the held handle, dropping any previous one.
    pub fn reset(&mut self, new_value: T) {
        self.value = Some(new_value);
    }

    /// Drop the held handle, if any. Idempotent.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Detach and return the handle without dropping it.
    pub fn release(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Borrow the held handle.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutably borrow the held handle.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Whether a handle is currently held.
    pub fn is_held(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Bumps its counter once when dropped.
    struct Counted(Arc<AtomicU32>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted() -> (Counted, Arc<AtomicU32>) {
        let drops = Arc::new(AtomicU32::new(0));
        (Counted(Arc::clone(&drops)), drops)
    }

    #[test]
    fn drop_releases_exactly_once() {
        let (value, drops) = counted();
        {
            let guard = Scoped::new(value);
            assert!(guard.is_held());
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_releases_previous_value() {
        let (first, drops) = counted();
        let (second, _) = counted();
        let mut guard = Scoped::new(first);
        guard.reset(second);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_detaches_without_dropping() {
        let (value, drops) = counted();
        let mut guard = Scoped::new(value);
        let detached = guard.release();
        assert!(detached.is_some());
        assert!(!guard.is_held());
        drop(guard);
        // Only the detached value itself drops, when we let it.
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(detached);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let (value, drops) = counted();
        let mut guard = Scoped::new(value);
        guard.clear();
        guard.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(guard.get().is_none());
    }

    #[test]
    fn move_transfers_ownership() {
        let (value, drops) = counted();
        let guard = Scoped::new(value);
        let moved = guard;
        assert!(moved.is_held());
        drop(moved);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
