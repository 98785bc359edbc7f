//! A cache-line padded, atomically updated sequence counter.
//!
//! Every [`Sequence`] the sequencer touches — the cursor, the claim
//! counter, each consumer's gating sequence — lives on its own cache line.
//! Two sequences sharing a cache line would bounce that line between
//! producer and consumer cores on every update, which defeats the entire
//! point of a lock-free hand-off. This follows the same padded-atomic
//! layout the ring buffer uses for its producer/consumer cursors, just
//! sized to a single 64-byte line rather than 128 bytes.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::INITIAL_CURSOR_VALUE;

/// Bytes of padding needed on each side of the atomic so the whole struct
/// occupies exactly one 64-byte cache line (8 bytes for the `AtomicI64`
/// itself, 56 bytes of filler).
const PADDING_BYTES: usize = 64 - std::mem::size_of::<AtomicI64>();

/// A single atomic sequence number, padded to avoid false sharing.
#[repr(align(64))]
pub struct Sequence {
    value: AtomicI64,
    _padding: [u8; PADDING_BYTES],
}

impl Sequence {
    /// Create a new sequence initialized to `value`.
    pub fn new(value: i64) -> Self {
        Self {
            value: AtomicI64::new(value),
            _padding: [0; PADDING_BYTES],
        }
    }

    /// Read the current value with acquire ordering.
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Read the current value with relaxed ordering, for callers that
    /// already hold a happens-before relationship from elsewhere (e.g. the
    /// claiming thread re-reading its own counter).
    #[inline]
    pub fn get_relaxed(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Overwrite the value with release ordering.
    #[inline]
    pub fn set(&self, new_value: i64) {
        self.value.store(new_value, Ordering::Release);
    }

    /// Overwrite the value with relaxed ordering.
    #[inline]
    pub fn set_relaxed(&self, new_value: i64) {
        self.value.store(new_value, Ordering::Relaxed);
    }

    /// Atomically set to `new` if currently `expected`, acquire-release on
    /// success, acquire on failure (so the caller can retry with a fresh
    /// read). Returns whether the swap happened.
    #[inline]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Atomically add one and return the new value.
    #[inline]
    pub fn increment_and_get(&self) -> i64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Atomically add `delta` and return the new value.
    #[inline]
    pub fn add_and_get(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::AcqRel) + delta
    }
}

impl Default for Sequence {
    /// The conventional starting point for a sequence that hasn't been
    /// assigned an explicit initial value: "nothing published yet".
    fn default() -> Self {
        Self::new(INITIAL_CURSOR_VALUE)
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence").field("value", &self.get()).finish()
    }
}

static_assertions::const_assert_eq!(std::mem::size_of::<Sequence>(), 64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_starts_at_initial_cursor_value() {
        assert_eq!(Sequence::default().get(), INITIAL_CURSOR_VALUE);
    }

    #[test]
    fn get_set_round_trip() {
        let seq = Sequence::new(0);
        seq.set(42);
        assert_eq!(seq.get(), 42);
    }

    #[test]
    fn compare_and_set_only_succeeds_on_match() {
        let seq = Sequence::new(5);
        assert!(!seq.compare_and_set(4, 10));
        assert_eq!(seq.get(), 5);
        assert!(seq.compare_and_set(5, 10));
        assert_eq!(seq.get(), 10);
    }

    #[test]
    fn increment_and_get_returns_new_value() {
        let seq = Sequence::new(0);
        assert_eq!(seq.increment_and_get(), 1);
        assert_eq!(seq.increment_and_get(), 2);
    }

    #[test]
    fn add_and_get_returns_new_value() {
        let seq = Sequence::new(10);
        assert_eq!(seq.add_and_get(5), 15);
    }

    #[test]
    fn occupies_a_single_cache_line() {
        assert_eq!(std::mem::size_of::<Sequence>(), 64);
        assert_eq!(std::mem::align_of::<Sequence>(), 64);
    }
}
