//! Error type for heap operations
//!
//! Every variant describes a caller-side precondition violation. Operations
//! validate their input before touching the structure, so an `Err` always
//! leaves the heap exactly as it was.

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    /// Insert was called with a key below zero
    #[error("key {key} is negative")]
    NegativeKey { key: i64 },
    /// decrease_key was called with a zero or negative delta
    #[error("delta {delta} is not positive")]
    NonPositiveDelta { delta: i64 },
    /// Decreasing `key` by `delta` would leave the allowed key range
    #[error("decreasing key {key} by {delta} leaves the allowed key range")]
    KeyUnderflow { key: i64, delta: i64 },
    /// The handle's item was removed, or it was issued by an unrelated heap
    #[error("handle is stale or belongs to another heap")]
    InvalidHandle,
}

/// Result alias used throughout the crate
pub type Result<T, E = HeapError> = std::result::Result<T, E>;
