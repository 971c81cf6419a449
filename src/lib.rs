//! Binomial heap for Rust
//!
//! This crate provides [`BinomialHeap`], a mergeable min-priority queue over
//! `i64` keys with opaque payloads and checked item handles.
//!
//! # Features
//!
//! - **Insert**: O(1) amortized, O(log n) worst-case
//! - **Find-min**: O(1)
//! - **Delete-min**, **decrease-key**, **delete**: O(log n)
//! - **Meld**: O(log n + log m), a root-list merge with carry propagation
//!
//! Nodes are reference counted (`Rc<RefCell<_>>` with `Weak` back-links), so
//! melding only relinks roots and never moves a node. Handles returned by
//! [`BinomialHeap::insert`] are validated on every use, so a handle whose
//! item was removed, or one from an unrelated heap, is rejected with
//! [`HeapError::InvalidHandle`] instead of corrupting the heap.
//!
//! # Example
//!
//! ```rust
//! use binomial_heap::BinomialHeap;
//!
//! let mut heap: BinomialHeap = BinomialHeap::new();
//! let handle1 = heap.insert(5, "item1".to_string()).unwrap();
//! let _handle2 = heap.insert(3, "item2".to_string()).unwrap();
//! heap.decrease_key(&handle1, 4).unwrap();
//! assert_eq!(heap.find_min(), Some((1, &"item1".to_string())));
//!
//! let mut other = BinomialHeap::new();
//! other.insert(0, "item3".to_string()).unwrap();
//! heap.meld(other);
//! assert_eq!(heap.size(), 3);
//! assert_eq!(heap.delete_min().map(|(key, _)| key), Some(0));
//! ```

pub mod binomial;
pub mod config;
pub mod error;
mod storage;

pub use binomial::{BinomialHeap, ItemHandle};
pub use config::HeapConfig;
pub use error::{HeapError, Result};
