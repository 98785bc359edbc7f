//! Sequencer tuning constants.
//!
//! Everything here is either a structural invariant (the cursor sentinel,
//! cache-line size) or a default tunable for one of the wait/claim
//! strategies. None of it is required for correctness beyond the sentinel
//! and cache-line size; the rest exists so callers get reasonable defaults
//! without having to pick numbers themselves.

/// Sentinel cursor value meaning "nothing has been published yet".
pub const INITIAL_CURSOR_VALUE: i64 = -1;

/// Smallest capacity the sequencer accepts. A ring of one slot is
/// degenerate but not invalid: it serializes every producer against every
/// consumer, which is occasionally useful in tests.
pub const MIN_CAPACITY: i64 = 1;

/// Cache line size assumed for padding calculations (64 bytes on every
/// mainstream desktop/server CPU).
pub const CACHE_LINE_SIZE: usize = 64;

/// Iterations of pure spinning before a sleeping/yielding wait strategy
/// falls back to yielding the thread.
pub const YIELD_STRATEGY_SPIN_TRIES: usize = 100;

/// Iterations of thread-yielding before a yielding wait strategy falls
/// back to a brief sleep.
pub const YIELD_STRATEGY_YIELD_TRIES: usize = 100;

/// Iterations of pure spinning before a sleeping wait strategy falls back
/// to sleeping.
pub const SLEEP_STRATEGY_SPIN_TRIES: usize = 10;

/// Base sleep duration, in nanoseconds, for a sleeping wait strategy; the
/// actual sleep grows from this value across consecutive misses.
pub const SLEEP_STRATEGY_BASE_SLEEP_NS: u64 = 1_000;

/// Maximum sleep duration, in nanoseconds, a sleeping wait strategy will
/// back off to.
pub const SLEEP_STRATEGY_MAX_SLEEP_NS: u64 = 1_000_000;

/// Thread-yield iterations a claim strategy's back-off loop performs, once
/// its bounded spin has completed, before it starts parking the thread.
pub const CLAIM_BACKOFF_YIELD_TRIES: usize = 100;

/// Polling interval a claim strategy re-checks gating sequences at while
/// backed off waiting for capacity to free up, once spinning and yielding
/// have both been exhausted.
pub const CLAIM_BACKOFF_PARK_NS: u64 = 50_000;

/// Validate that the constants above are internally consistent.
pub fn validate_constants() -> Result<(), &'static str> {
    if INITIAL_CURSOR_VALUE != -1 {
        return Err("INITIAL_CURSOR_VALUE must be -1");
    }
    if MIN_CAPACITY < 1 {
        return Err("MIN_CAPACITY must be at least 1");
    }
    if !CACHE_LINE_SIZE.is_power_of_two() {
        return Err("CACHE_LINE_SIZE must be a power of 2");
    }
    if SLEEP_STRATEGY_BASE_SLEEP_NS == 0 || SLEEP_STRATEGY_MAX_SLEEP_NS == 0 {
        return Err("sleep durations must be greater than 0");
    }
    if SLEEP_STRATEGY_BASE_SLEEP_NS > SLEEP_STRATEGY_MAX_SLEEP_NS {
        return Err("SLEEP_STRATEGY_BASE_SLEEP_NS must not exceed SLEEP_STRATEGY_MAX_SLEEP_NS");
    }
    if CLAIM_BACKOFF_PARK_NS == 0 {
        return Err("CLAIM_BACKOFF_PARK_NS must be greater than 0");
    }
    Ok(())
}
