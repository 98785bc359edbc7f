//! Validated configuration for constructing a [`Sequencer`].
//!
//! Mirrors the builder shape used elsewhere in this codebase for
//! multi-field, validated construction: fields are set incrementally and
//! validation happens once, at `build()`, rather than being scattered
//! across individual setters.
//!
//! [`Sequencer`]: crate::disruptor::sequencer::Sequencer

use crate::disruptor::sequencer::Sequencer;
use crate::error::Result;

/// Which claim strategy a [`Sequencer`] should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStrategyKind {
    /// Exactly one producer thread will ever claim sequences.
    SingleThreaded,
    /// Multiple producer threads may claim sequences concurrently.
    MultiThreaded,
}

/// Which wait strategy a [`Sequencer`]'s barriers should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategyKind {
    /// Mutex + condition variable. Lowest CPU usage, highest latency.
    Blocking,
    /// Spin, then yield. A middle ground.
    Yielding,
    /// Pure spin loop. Lowest latency, highest CPU usage.
    BusySpin,
    /// Spin, then sleep with back-off. Lowest CPU usage among the
    /// strategies that still spin initially.
    Sleeping,
}

/// Builder for [`Sequencer`] construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    capacity: i64,
    claim_strategy: ClaimStrategyKind,
    wait_strategy: WaitStrategyKind,
}

impl SequencerConfig {
    /// Start a config for a ring of `capacity` slots. Defaults to a
    /// single-threaded claim strategy and a blocking wait strategy; call
    /// the `with_*` methods to change either.
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity,
            claim_strategy: ClaimStrategyKind::SingleThreaded,
            wait_strategy: WaitStrategyKind::Blocking,
        }
    }

    pub fn with_claim_strategy(mut self, kind: ClaimStrategyKind) -> Self {
        self.claim_strategy = kind;
        self
    }

    pub fn with_wait_strategy(mut self, kind: WaitStrategyKind) -> Self {
        self.wait_strategy = kind;
        self
    }

    /// Validate the configuration and construct the sequencer.
    pub fn build(self) -> Result<Sequencer> {
        Sequencer::new(self.capacity, self.claim_strategy, self.wait_strategy)
    }
}
