//! flux-sequencer - the Disruptor-style sequencer at the heart of a
//! bounded ring-buffer hand-off.
//!
//! This crate is the coordination primitive only: a [`Sequencer`] hands
//! out monotonically increasing sequence numbers to producers and lets
//! consumers wait on them via a [`SequenceBarrier`], entirely through
//! atomics and a pluggable wait strategy. It does not own ring slot
//! storage, event-processor run loops, or any transport around the ring;
//! callers address their own storage by `sequence & (capacity - 1)`.
//!
//! ```
//! use flux_sequencer::config::{ClaimStrategyKind, WaitStrategyKind, SequencerConfig};
//!
//! let sequencer = SequencerConfig::new(8)
//!     .with_claim_strategy(ClaimStrategyKind::SingleThreaded)
//!     .with_wait_strategy(WaitStrategyKind::BusySpin)
//!     .build()
//!     .expect("capacity is a power of two");
//!
//! let next = sequencer.next();
//! sequencer.publish(next);
//! assert_eq!(sequencer.get_cursor(), next);
//! ```

pub mod config;
pub mod constants;
pub mod disruptor;
pub mod error;

pub use config::{ClaimStrategyKind, SequencerConfig, WaitStrategyKind};
pub use disruptor::batch_descriptor::BatchDescriptor;
pub use disruptor::sequence::Sequence;
pub use disruptor::sequence_barrier::SequenceBarrier;
pub use disruptor::sequencer::Sequencer;
pub use error::{Result, SequencerError};

/// Version information, exposed for parity with callers that report a
/// component version alongside their own.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
