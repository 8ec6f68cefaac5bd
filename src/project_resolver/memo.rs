//! Thread-safe memoization cell for computed resolution data.
//!
//! Providers keep one of these around so repeated lookups within a single
//! sync/watch cycle don't recompute SHA sets or re-walk config files; the
//! on-disk [`super::persist::ResolutionPersistence`] cache is the
//! cross-run source of truth, this is just the in-process fast path.

use parking_lot::RwLock;

#[derive(Debug)]
pub struct ResolutionMemo<T> {
    value: RwLock<Option<T>>,
}

impl<T> Default for ResolutionMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResolutionMemo<T> {
    pub fn new() -> Self {
        Self { value: RwLock::new(None) }
    }

    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T
    where
        T: Clone,
    {
        if let Some(v) = self.value.read().as_ref() {
            return v.clone();
        }
        let computed = compute();
        *self.value.write() = Some(computed.clone());
        computed
    }

    pub fn invalidate(&self) {
        *self.value.write() = None;
    }

    pub fn is_populated(&self) -> bool {
        self.value.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn computes_once_then_caches() {
        let calls = AtomicU32::new(0);
        let memo: ResolutionMemo<u32> = ResolutionMemo::new();

        let v1 = memo.get_or_compute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        });
        let v2 = memo.get_or_compute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            99
        });

        assert_eq!(v1, 42);
        assert_eq!(v2, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let memo: ResolutionMemo<u32> = ResolutionMemo::new();
        memo.get_or_compute(|| 1);
        memo.invalidate();
        assert!(!memo.is_populated());
        let v = memo.get_or_compute(|| 2);
        assert_eq!(v, 2);
    }
}
