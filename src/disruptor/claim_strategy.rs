//! Claim strategies: how a producer allocates the next sequence(s).
//!
//! A claim strategy owns the producer-side counter (the "next to claim"
//! position) and knows how to block a producer when the ring is full —
//! when claiming would lap the slowest gating consumer. Two variants
//! exist because a single producer never needs a compare-and-swap to
//! allocate; it can simply own its counter outright.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crossbeam::utils::Backoff;

use crate::constants::{CLAIM_BACKOFF_PARK_NS, CLAIM_BACKOFF_YIELD_TRIES, INITIAL_CURSOR_VALUE};
use crate::disruptor::sequence::Sequence;
use crate::error::{Result, SequencerError};

/// Minimum of the gating sequences, or `i64::MAX` if there are none (an
/// ungated sequencer never blocks on capacity).
#[inline]
fn min_gating(gating: &[Arc<Sequence>]) -> i64 {
    gating.iter().map(|s| s.get()).min().unwrap_or(i64::MAX)
}

/// Spin a bounded number of times via [`Backoff`], then yield the thread a
/// bounded number of times, then park for [`CLAIM_BACKOFF_PARK_NS`] per
/// iteration. Used whenever a claim strategy must wait for a gating
/// consumer to catch up; the producer is not registered with any wait
/// strategy, so it has no way to be signalled and must poll.
#[inline]
fn back_off_until<F>(backoff: &Backoff, mut ready: F)
where
    F: FnMut() -> bool,
{
    let mut yields = 0usize;
    while !ready() {
        if !backoff.is_completed() {
            backoff.snooze();
        } else if yields < CLAIM_BACKOFF_YIELD_TRIES {
            std::thread::yield_now();
            yields += 1;
        } else {
            std::thread::sleep(std::time::Duration::from_nanos(CLAIM_BACKOFF_PARK_NS));
        }
    }
}

/// Policy for allocating producer sequences against a bounded capacity.
pub trait ClaimStrategy: Send + Sync {
    /// Allocate exactly one sequence, blocking while the ring is full.
    fn increment_and_get(&self, gating: &[Arc<Sequence>]) -> i64 {
        self.increment_and_get_n(1, gating)
    }

    /// Allocate a contiguous run of `n` sequences, returning the highest.
    /// Blocks until the whole run fits against `gating`.
    fn increment_and_get_n(&self, n: i64, gating: &[Arc<Sequence>]) -> i64;

    /// Force the claim counter to exactly `sequence`, blocking until doing
    /// so respects `gating`.
    fn set_sequence(&self, sequence: i64, gating: &[Arc<Sequence>]);

    /// Non-blocking capacity check: would the next single claim succeed
    /// without blocking?
    fn has_available_capacity(&self, gating: &[Arc<Sequence>]) -> bool;

    /// The highest sequence claimed so far (not necessarily published).
    fn claimed_sequence(&self) -> i64;

    /// Mark `sequence` as published. Single-threaded strategies can do
    /// this by simply advancing the cursor; multi-threaded strategies must
    /// record availability and let the cursor catch up over any
    /// contiguous published run.
    fn publish(&self, sequence: i64, cursor: &Sequence, capacity: i64);

    /// Mark the whole inclusive range `[low, high]` as published.
    fn publish_range(&self, low: i64, high: i64, cursor: &Sequence, capacity: i64) {
        for sequence in low..=high {
            self.publish(sequence, cursor, capacity);
        }
    }

    /// Block until every producer that claimed a sequence up to and
    /// including `sequence` has also published it. Only meaningful for
    /// multi-threaded strategies where claim order and publish order can
    /// diverge; single-threaded strategies are always caught up.
    fn wait_for_publishers(&self, _sequence: i64, _cursor: &Sequence) {}
}

/// Claim strategy for exactly one producer thread. The claim counter is
/// written only by that thread, so no compare-and-swap is needed to
/// allocate — a plain read-modify-write suffices, and publish can just set
/// the cursor directly since claim order and publish order always match.
pub struct SingleThreadedClaimStrategy {
    capacity: i64,
    claimed: Sequence,
}

impl SingleThreadedClaimStrategy {
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity,
            claimed: Sequence::new(INITIAL_CURSOR_VALUE),
        }
    }
}

impl ClaimStrategy for SingleThreadedClaimStrategy {
    fn increment_and_get_n(&self, n: i64, gating: &[Arc<Sequence>]) -> i64 {
        let next = self.claimed.get_relaxed() + n;
        let wrap_point = next - self.capacity;

        let backoff = Backoff::new();
        back_off_until(&backoff, || wrap_point <= min_gating(gating));

        self.claimed.set_relaxed(next);
        next
    }

    fn set_sequence(&self, sequence: i64, gating: &[Arc<Sequence>]) {
        let wrap_point = sequence - self.capacity;
        let backoff = Backoff::new();
        back_off_until(&backoff, || wrap_point <= min_gating(gating));
        self.claimed.set_relaxed(sequence);
    }

    fn has_available_capacity(&self, gating: &[Arc<Sequence>]) -> bool {
        let next = self.claimed.get_relaxed() + 1;
        next - self.capacity <= min_gating(gating)
    }

    fn claimed_sequence(&self) -> i64 {
        self.claimed.get()
    }

    fn publish(&self, sequence: i64, cursor: &Sequence, _capacity: i64) {
        cursor.set(sequence);
    }

    fn publish_range(&self, _low: i64, high: i64, cursor: &Sequence, _capacity: i64) {
        cursor.set(high);
    }
}

/// Claim strategy for multiple concurrent producer threads. Allocation is
/// a fetch-add on an atomic counter. Because producers can publish out of
/// claim order, a per-slot availability marker records which "lap" of the
/// ring last published each slot; the cursor only advances over a
/// contiguous run of slots whose marker matches the lap the cursor is
/// currently on.
pub struct MultiThreadedClaimStrategy {
    capacity: i64,
    claimed: AtomicI64,
    /// `available[slot]` holds the lap number (`sequence / capacity`) of
    /// the most recent publish to that slot, or `-1` if never published.
    /// A full `i64` per slot (rather than a single byte) avoids the lap
    /// counter wrapping and re-introducing an ABA hazard on any
    /// long-running producer.
    available: Box<[AtomicI64]>,
}

impl MultiThreadedClaimStrategy {
    pub fn new(capacity: i64) -> Self {
        let slots = capacity as usize;
        let available = (0..slots).map(|_| AtomicI64::new(-1)).collect::<Vec<_>>().into_boxed_slice();
        Self {
            capacity,
            claimed: AtomicI64::new(INITIAL_CURSOR_VALUE),
            available,
        }
    }

    #[inline]
    fn slot_index(&self, sequence: i64) -> usize {
        (sequence & (self.capacity - 1)) as usize
    }

    #[inline]
    fn lap_of(&self, sequence: i64) -> i64 {
        sequence.div_euclid(self.capacity)
    }

    /// Whether `sequence` has been published: its slot's recorded lap
    /// matches the lap `sequence` belongs to.
    fn is_available(&self, sequence: i64) -> bool {
        let slot = self.slot_index(sequence);
        self.available[slot].load(Ordering::Acquire) == self.lap_of(sequence)
    }

    fn mark_available(&self, sequence: i64) {
        let slot = self.slot_index(sequence);
        self.available[slot].store(self.lap_of(sequence), Ordering::Release);
    }
}

impl ClaimStrategy for MultiThreadedClaimStrategy {
    fn increment_and_get_n(&self, n: i64, gating: &[Arc<Sequence>]) -> i64 {
        let backoff = Backoff::new();
        let mut yields = 0usize;
        loop {
            let current = self.claimed.load(Ordering::Relaxed);
            let next = current + n;
            let wrap_point = next - self.capacity;
            if wrap_point > min_gating(gating) {
                if !backoff.is_completed() {
                    backoff.snooze();
                } else if yields < CLAIM_BACKOFF_YIELD_TRIES {
                    std::thread::yield_now();
                    yields += 1;
                } else {
                    std::thread::sleep(std::time::Duration::from_nanos(CLAIM_BACKOFF_PARK_NS));
                }
                continue;
            }
            if self
                .claimed
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return next;
            }
            backoff.spin();
        }
    }

    fn set_sequence(&self, sequence: i64, gating: &[Arc<Sequence>]) {
        let wrap_point = sequence - self.capacity;
        let backoff = Backoff::new();
        back_off_until(&backoff, || wrap_point <= min_gating(gating));
        self.claimed.store(sequence, Ordering::Release);
    }

    fn has_available_capacity(&self, gating: &[Arc<Sequence>]) -> bool {
        let next = self.claimed.load(Ordering::Relaxed) + 1;
        next - self.capacity <= min_gating(gating)
    }

    fn claimed_sequence(&self) -> i64 {
        self.claimed.load(Ordering::Acquire)
    }

    fn publish(&self, sequence: i64, cursor: &Sequence, _capacity: i64) {
        self.mark_available(sequence);

        // Advance the cursor over every contiguous published sequence
        // starting just past its current value. Only one producer will
        // ever win this race for a given sequence (CAS), so at most one
        // thread does the walking for any given advance.
        let mut current = cursor.get();
        loop {
            let candidate = current + 1;
            if !self.is_available(candidate) {
                break;
            }
            if !cursor.compare_and_set(current, candidate) {
                // Another publisher already advanced the cursor past us;
                // resume the walk from wherever it landed.
                current = cursor.get();
                continue;
            }
            current = candidate;
        }
    }

    fn wait_for_publishers(&self, sequence: i64, cursor: &Sequence) {
        let backoff = Backoff::new();
        back_off_until(&backoff, || cursor.get() >= sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gating(values: &[i64]) -> Vec<Arc<Sequence>> {
        values.iter().map(|&v| Arc::new(Sequence::new(v))).collect()
    }

    #[test]
    fn single_threaded_claims_are_monotonic() {
        let strategy = SingleThreadedClaimStrategy::new(8);
        let gate = gating(&[i64::MAX]);
        assert_eq!(strategy.increment_and_get(&gate), 0);
        assert_eq!(strategy.increment_and_get(&gate), 1);
        assert_eq!(strategy.increment_and_get_n(3, &gate), 4);
    }

    #[test]
    fn single_threaded_has_available_capacity_reflects_gating() {
        let strategy = SingleThreadedClaimStrategy::new(4);
        let consumed = Arc::new(Sequence::new(INITIAL_CURSOR_VALUE));
        let gate = vec![consumed.clone()];

        for _ in 0..4 {
            strategy.increment_and_get(&gate);
        }
        assert!(!strategy.has_available_capacity(&gate));

        consumed.set(0);
        assert!(strategy.has_available_capacity(&gate));
    }

    #[test]
    fn single_threaded_publish_sets_cursor_directly() {
        let strategy = SingleThreadedClaimStrategy::new(4);
        let cursor = Sequence::new(INITIAL_CURSOR_VALUE);
        let gate = gating(&[i64::MAX]);
        let s = strategy.increment_and_get(&gate);
        strategy.publish(s, &cursor, 4);
        assert_eq!(cursor.get(), 0);
    }

    #[test]
    fn multi_threaded_claims_are_distinct_and_contiguous() {
        let strategy = MultiThreadedClaimStrategy::new(8);
        let gate = gating(&[i64::MAX]);
        let a = strategy.increment_and_get(&gate);
        let b = strategy.increment_and_get(&gate);
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn multi_threaded_publish_advances_cursor_only_over_contiguous_run() {
        let strategy = MultiThreadedClaimStrategy::new(8);
        let cursor = Sequence::new(INITIAL_CURSOR_VALUE);
        let gate = gating(&[i64::MAX]);

        let s0 = strategy.increment_and_get(&gate);
        let s1 = strategy.increment_and_get(&gate);
        let s2 = strategy.increment_and_get(&gate);

        // Publish out of order: 1 then 2 must not move the cursor, since
        // 0 is still missing.
        strategy.publish(s1, &cursor, 8);
        assert_eq!(cursor.get(), INITIAL_CURSOR_VALUE);
        strategy.publish(s2, &cursor, 8);
        assert_eq!(cursor.get(), INITIAL_CURSOR_VALUE);

        // Publishing 0 now lets the cursor sweep all the way to 2.
        strategy.publish(s0, &cursor, 8);
        assert_eq!(cursor.get(), s2);
    }

    #[test]
    fn multi_threaded_has_available_capacity_reflects_gating() {
        let strategy = MultiThreadedClaimStrategy::new(4);
        let consumed = Arc::new(Sequence::new(INITIAL_CURSOR_VALUE));
        let gate = vec![consumed.clone()];

        for _ in 0..4 {
            strategy.increment_and_get(&gate);
        }
        assert!(!strategy.has_available_capacity(&gate));

        consumed.set(0);
        assert!(strategy.has_available_capacity(&gate));
    }

    #[test]
    fn wait_for_publishers_blocks_until_cursor_catches_up() {
        let strategy = Arc::new(MultiThreadedClaimStrategy::new(8));
        let cursor = Arc::new(Sequence::new(INITIAL_CURSOR_VALUE));
        let gate = gating(&[i64::MAX]);

        let s0 = strategy.increment_and_get(&gate);
        let s1 = strategy.increment_and_get(&gate);

        let s = strategy.clone();
        let c = cursor.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            s.publish(s0, &c, 8);
            s.publish(s1, &c, 8);
        });

        // Waits until both sequences have actually been published, not just
        // claimed.
        strategy.wait_for_publishers(s1, &cursor);
        assert_eq!(cursor.get(), s1);
        handle.join().unwrap();
    }
}
