//! Wait strategies for sequence barriers.
//!
//! A wait strategy controls how a barrier waiter behaves while it cannot
//! yet make progress — how much CPU it is willing to burn in exchange for
//! lower wake-up latency. Every strategy here re-checks the alerted flag
//! and, when one was supplied, the deadline on every iteration, so
//! cancellation and timeouts are never more than one back-off step late.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::{
    SLEEP_STRATEGY_BASE_SLEEP_NS, SLEEP_STRATEGY_MAX_SLEEP_NS, SLEEP_STRATEGY_SPIN_TRIES,
    YIELD_STRATEGY_SPIN_TRIES, YIELD_STRATEGY_YIELD_TRIES,
};
use crate::disruptor::sequence::Sequence;
use crate::error::{Result, SequencerError};

/// The highest sequence simultaneously available from the cursor and every
/// dependent (upstream) sequence. Returns `cursor.get()` unchanged when
/// there are no dependents.
#[inline]
fn highest_available(cursor: &Sequence, dependents: &[Arc<Sequence>]) -> i64 {
    let mut available = cursor.get();
    for dependent in dependents {
        available = available.min(dependent.get());
    }
    available
}

/// Checks the alerted flag and, if present, the deadline. Returns the
/// first failure encountered, if any.
#[inline]
fn check_cancellation(alerted: &AtomicBool, deadline: Option<Instant>) -> Result<()> {
    if alerted.load(Ordering::Acquire) {
        return Err(SequencerError::Alerted);
    }
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Err(SequencerError::Timeout);
        }
    }
    Ok(())
}

/// Policy for how a barrier waiter behaves while blocked on a sequence
/// that has not yet become available.
pub trait WaitStrategy: Send + Sync {
    /// Block until `min(cursor, dependents) >= target`, the barrier is
    /// alerted, or `deadline` (if given) elapses. Returns the observed
    /// available sequence, which may exceed `target` — the batching
    /// effect — so callers should process through the returned value
    /// rather than just `target`.
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> Result<i64>;

    /// Wake every thread parked inside this strategy's `wait_for`. Called
    /// by the sequencer after a publish advances the cursor, and by a
    /// barrier when it is alerted.
    fn signal_all_when_blocking(&self);
}

/// Pure spin loop. Lowest latency, pins a full core while waiting.
#[derive(Debug, Default)]
pub struct BusySpinWaitStrategy;

impl BusySpinWaitStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl WaitStrategy for BusySpinWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> Result<i64> {
        loop {
            check_cancellation(alerted, deadline)?;
            let available = highest_available(cursor, dependents);
            if available >= target {
                return Ok(available);
            }
            std::hint::spin_loop();
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: there are no parked threads to wake.
    }
}

/// Mutex + condition variable. Lowest CPU usage, highest wake-up latency.
pub struct BlockingWaitStrategy {
    mutex: parking_lot::Mutex<()>,
    condition: parking_lot::Condvar,
}

impl BlockingWaitStrategy {
    pub fn new() -> Self {
        Self {
            mutex: parking_lot::Mutex::new(()),
            condition: parking_lot::Condvar::new(),
        }
    }
}

impl Default for BlockingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for BlockingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> Result<i64> {
        const POLL_INTERVAL: Duration = Duration::from_micros(100);

        loop {
            check_cancellation(alerted, deadline)?;
            let available = highest_available(cursor, dependents);
            if available >= target {
                return Ok(available);
            }

            let mut guard = self.mutex.lock();
            // Re-check under the lock: a publish may have landed, and
            // signalled, between our unlocked read above and taking the
            // lock.
            let available = highest_available(cursor, dependents);
            if available >= target {
                return Ok(available);
            }
            self.condition.wait_for(&mut guard, POLL_INTERVAL);
        }
    }

    fn signal_all_when_blocking(&self) {
        let _guard = self.mutex.lock();
        self.condition.notify_all();
    }
}

/// Spin, then yield, then sleep for progressively longer intervals.
/// Lowest CPU usage among the strategies that still spin initially.
pub struct SleepingWaitStrategy {
    spin_tries: usize,
    base_sleep: Duration,
    max_sleep: Duration,
}

impl SleepingWaitStrategy {
    pub fn new(base_sleep: Duration, max_sleep: Duration) -> Self {
        Self {
            spin_tries: SLEEP_STRATEGY_SPIN_TRIES,
            base_sleep,
            max_sleep,
        }
    }

    pub fn default_sleep() -> Self {
        Self::new(
            Duration::from_nanos(SLEEP_STRATEGY_BASE_SLEEP_NS),
            Duration::from_nanos(SLEEP_STRATEGY_MAX_SLEEP_NS),
        )
    }
}

impl Default for SleepingWaitStrategy {
    fn default() -> Self {
        Self::default_sleep()
    }
}

impl WaitStrategy for SleepingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> Result<i64> {
        let mut misses: u32 = 0;

        loop {
            check_cancellation(alerted, deadline)?;
            let available = highest_available(cursor, dependents);
            if available >= target {
                return Ok(available);
            }

            if (misses as usize) < self.spin_tries {
                std::hint::spin_loop();
            } else {
                let backoff = self.base_sleep * 2u32.saturating_pow(misses - self.spin_tries as u32);
                thread::sleep(backoff.min(self.max_sleep));
            }
            misses += 1;
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: sleeping threads wake on their own on the next tick.
    }
}

/// Spin, then yield the thread, then fall back to a short fixed sleep.
/// A middle ground between busy-spin and sleeping.
pub struct YieldingWaitStrategy {
    spin_tries: usize,
    yield_tries: usize,
}

impl YieldingWaitStrategy {
    pub fn new() -> Self {
        Self {
            spin_tries: YIELD_STRATEGY_SPIN_TRIES,
            yield_tries: YIELD_STRATEGY_YIELD_TRIES,
        }
    }

    pub fn with_tries(spin_tries: usize, yield_tries: usize) -> Self {
        Self {
            spin_tries,
            yield_tries,
        }
    }
}

impl Default for YieldingWaitStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitStrategy for YieldingWaitStrategy {
    fn wait_for(
        &self,
        target: i64,
        cursor: &Sequence,
        dependents: &[Arc<Sequence>],
        alerted: &AtomicBool,
        deadline: Option<Instant>,
    ) -> Result<i64> {
        let mut counter: usize = 0;

        loop {
            check_cancellation(alerted, deadline)?;
            let available = highest_available(cursor, dependents);
            if available >= target {
                return Ok(available);
            }

            if counter < self.spin_tries {
                std::hint::spin_loop();
            } else if counter < self.spin_tries + self.yield_tries {
                thread::yield_now();
            } else {
                thread::sleep(Duration::from_nanos(1));
            }
            counter += 1;
        }
    }

    fn signal_all_when_blocking(&self) {
        // No-op: yielding/spinning threads re-poll on their own.
    }
}
