//! The sequencer and its supporting types.
//!
//! Module layout mirrors the component breakdown of a Disruptor-style
//! coordination primitive: a padded atomic [`sequence::Sequence`], the
//! [`wait_strategy`] and [`claim_strategy`] policy axes, a
//! [`batch_descriptor::BatchDescriptor`] value object, a waitable
//! [`sequence_barrier::SequenceBarrier`], and the
//! [`sequencer::Sequencer`] that orchestrates all of them. [`invariants`]
//! holds the debug-only assertion macros the sequencer checks itself
//! against.

pub mod batch_descriptor;
pub mod claim_strategy;
pub mod invariants;
pub mod sequence;
pub mod sequence_barrier;
pub mod sequencer;
pub mod wait_strategy;

pub use batch_descriptor::BatchDescriptor;
pub use claim_strategy::{ClaimStrategy, MultiThreadedClaimStrategy, SingleThreadedClaimStrategy};
pub use sequence::Sequence;
pub use sequence_barrier::SequenceBarrier;
pub use sequencer::Sequencer;
pub use wait_strategy::{
    BlockingWaitStrategy, BusySpinWaitStrategy, SleepingWaitStrategy, WaitStrategy, YieldingWaitStrategy,
};
