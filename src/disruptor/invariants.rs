//! Debug-only assertions for sequencer invariants.
//!
//! These compile to nothing in release builds (`debug_assert!` is a no-op
//! under `#[cfg(not(debug_assertions))]`), so they cost nothing on the hot
//! path in production while still catching contract violations — a
//! gating sequence moving backwards, a claim colliding with an
//! unconsumed slot — during development and testing.

/// The cursor must never move backwards.
macro_rules! debug_assert_cursor_monotonic {
    ($previous:expr, $current:expr) => {
        debug_assert!(
            $current >= $previous,
            "cursor regressed from {} to {}",
            $previous,
            $current
        );
    };
}

/// A claim must never outrun the slowest gating consumer by more than one
/// full lap of the ring.
macro_rules! debug_assert_claim_within_capacity {
    ($claimed:expr, $min_gating:expr, $capacity:expr) => {
        debug_assert!(
            $claimed - $min_gating <= $capacity,
            "claimed sequence {} outran gating minimum {} by more than capacity {}",
            $claimed,
            $min_gating,
            $capacity
        );
    };
}

/// The cursor must never be published past what has actually been
/// claimed.
macro_rules! debug_assert_publish_within_claimed {
    ($sequence:expr, $claimed:expr) => {
        debug_assert!(
            $sequence <= $claimed,
            "published sequence {} exceeds highest claimed sequence {}",
            $sequence,
            $claimed
        );
    };
}

pub(crate) use debug_assert_claim_within_capacity;
pub(crate) use debug_assert_cursor_monotonic;
pub(crate) use debug_assert_publish_within_claimed;
