//! A waitable view over the producer cursor and a consumer's upstream
//! dependencies.
//!
//! Each consumer gets its own barrier built from [`Sequencer::new_barrier`](
//! crate::disruptor::sequencer::Sequencer::new_barrier). Waiting on the
//! barrier blocks (per the sequencer's wait strategy) until the cursor and
//! every dependent sequence have reached the requested target, or until
//! the barrier is alerted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::disruptor::sequence::Sequence;
use crate::disruptor::wait_strategy::WaitStrategy;
use crate::error::Result;

/// A waitable barrier combining a producer cursor with zero or more
/// upstream consumer sequences.
pub struct SequenceBarrier {
    cursor: Arc<Sequence>,
    dependents: Vec<Arc<Sequence>>,
    wait_strategy: Arc<dyn WaitStrategy>,
    alerted: AtomicBool,
}

impl SequenceBarrier {
    pub(crate) fn new(
        cursor: Arc<Sequence>,
        dependents: Vec<Arc<Sequence>>,
        wait_strategy: Arc<dyn WaitStrategy>,
    ) -> Self {
        Self {
            cursor,
            dependents,
            wait_strategy,
            alerted: AtomicBool::new(false),
        }
    }

    /// Block until `min(cursor, dependents) >= target` or the barrier is
    /// alerted. Returns the actual observed sequence, which may exceed
    /// `target`.
    pub fn wait_for(&self, target: i64) -> Result<i64> {
        self.wait_strategy
            .wait_for(target, &self.cursor, &self.dependents, &self.alerted, None)
    }

    /// As [`SequenceBarrier::wait_for`], but fails with
    /// [`crate::error::SequencerError::Timeout`] if `timeout` elapses
    /// first.
    pub fn wait_for_timeout(&self, target: i64, timeout: Duration) -> Result<i64> {
        let deadline = Instant::now() + timeout;
        self.wait_strategy.wait_for(
            target,
            &self.cursor,
            &self.dependents,
            &self.alerted,
            Some(deadline),
        )
    }

    /// The latest observed cursor value, ignoring dependents.
    pub fn get_cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Whether this barrier is currently alerted.
    pub fn is_alerted(&self) -> bool {
        self.alerted.load(Ordering::Acquire)
    }

    /// Raise the alerted flag and wake any thread currently parked in
    /// [`SequenceBarrier::wait_for`].
    pub fn alert(&self) {
        self.alerted.store(true, Ordering::Release);
        self.wait_strategy.signal_all_when_blocking();
    }

    /// Lower the alerted flag so the barrier can be waited on again.
    pub fn clear_alert(&self) {
        self.alerted.store(false, Ordering::Release);
    }
}
