//! Descriptor for a contiguous run of claimed sequences.
//!
//! A producer that wants to claim several slots at once hands the
//! sequencer a `BatchDescriptor` rather than calling `next()` in a loop;
//! the sequencer fills in `end` once the whole run has been allocated.

use crate::constants::INITIAL_CURSOR_VALUE;
use crate::error::{Result, SequencerError};

/// A requested (and, once allocated, realized) contiguous batch of
/// sequences `[start(), end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDescriptor {
    size: i64,
    end: i64,
}

impl BatchDescriptor {
    /// Create an unallocated descriptor requesting `size` contiguous
    /// sequences. `size` must be positive.
    pub fn new(size: i64) -> Result<Self> {
        if size <= 0 {
            return Err(SequencerError::invalid_argument(format!(
                "batch size must be positive, got {size}"
            )));
        }
        Ok(Self {
            size,
            end: INITIAL_CURSOR_VALUE,
        })
    }

    /// The requested batch size.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Whether the sequencer has allocated this descriptor a range yet.
    pub fn is_allocated(&self) -> bool {
        self.end != INITIAL_CURSOR_VALUE
    }

    /// The last (highest) sequence in the batch. Only meaningful once
    /// [`BatchDescriptor::is_allocated`] is true.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// The first (lowest) sequence in the batch. Only meaningful once
    /// [`BatchDescriptor::is_allocated`] is true.
    pub fn start(&self) -> i64 {
        self.end - self.size + 1
    }

    /// Called by the sequencer once it has claimed the range ending at
    /// `end` for this descriptor.
    pub(crate) fn set_end(&mut self, end: i64) {
        self.end = end;
    }

    /// Return the descriptor to its unallocated state so it can be reused
    /// for another claim.
    pub fn reset(&mut self) {
        self.end = INITIAL_CURSOR_VALUE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_size() {
        assert!(BatchDescriptor::new(0).is_err());
        assert!(BatchDescriptor::new(-1).is_err());
    }

    #[test]
    fn starts_unallocated() {
        let batch = BatchDescriptor::new(3).unwrap();
        assert!(!batch.is_allocated());
    }

    #[test]
    fn start_is_derived_from_end_and_size() {
        let mut batch = BatchDescriptor::new(3).unwrap();
        batch.set_end(2);
        assert!(batch.is_allocated());
        assert_eq!(batch.start(), 0);
        assert_eq!(batch.end(), 2);
    }

    #[test]
    fn reset_returns_to_unallocated() {
        let mut batch = BatchDescriptor::new(3).unwrap();
        batch.set_end(2);
        batch.reset();
        assert!(!batch.is_allocated());
    }
}
