//! Construction-time options for [`BinomialHeap`](crate::BinomialHeap)

/// Options applied when a heap is created
///
/// # Example
///
/// ```rust
/// use binomial_heap::{BinomialHeap, HeapConfig};
///
/// let config = HeapConfig::default().with_negative_keys(true);
/// let mut heap: BinomialHeap = BinomialHeap::with_config(config);
/// heap.insert(-5, "below zero".to_string()).unwrap();
/// assert_eq!(heap.find_min().map(|(k, _)| k), Some(-5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapConfig {
    /// Accept keys below zero on insert and decrease_key
    pub allow_negative_keys: bool,
}

impl HeapConfig {
    /// Sets whether insert and decrease_key accept keys below zero
    pub fn with_negative_keys(mut self, allow: bool) -> Self {
        self.allow_negative_keys = allow;
        self
    }

    /// Smallest key this configuration accepts
    pub(crate) fn key_floor(&self) -> i64 {
        if self.allow_negative_keys {
            i64::MIN
        } else {
            0
        }
    }
}
