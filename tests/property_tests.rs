//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations, mirror them in a
//! simple reference model, and verify after every step that the heap agrees
//! with the model and that all structural invariants hold.

use binomial_heap::{BinomialHeap, HeapError, ItemHandle};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op {
    Insert(i64),
    DeleteMin,
    DecreaseKey(usize, i64),
    Delete(usize),
    Meld(Vec<i64>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..1000).prop_map(Op::Insert),
        2 => Just(Op::DeleteMin),
        2 => (any::<usize>(), 1i64..500).prop_map(|(i, d)| Op::DecreaseKey(i, d)),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => prop::collection::vec(0i64..1000, 0..20).prop_map(Op::Meld),
    ]
}

/// Live items keyed by their payload id: (handle, current key)
struct Model {
    live: BTreeMap<u64, (ItemHandle<u64>, i64)>,
    next: u64,
}

impl Model {
    fn new() -> Self {
        Model {
            live: BTreeMap::new(),
            next: 0,
        }
    }

    fn add(&mut self, handle: ItemHandle<u64>, key: i64) -> u64 {
        let id = self.next;
        self.next += 1;
        self.live.insert(id, (handle, key));
        id
    }

    fn pick(&self, index: usize) -> Option<(u64, ItemHandle<u64>, i64)> {
        if self.live.is_empty() {
            return None;
        }
        let (&id, (handle, key)) = self.live.iter().nth(index % self.live.len())?;
        Some((id, handle.clone(), *key))
    }

    fn min_key(&self) -> Option<i64> {
        self.live.values().map(|&(_, key)| key).min()
    }
}

fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut heap: BinomialHeap<u64> = BinomialHeap::new();
    let mut model = Model::new();

    for op in ops {
        match op {
            Op::Insert(key) => {
                let id = model.next;
                let handle = heap.insert(key, id).unwrap();
                model.add(handle, key);
            }
            Op::DeleteMin => {
                let popped = heap.delete_min();
                match model.min_key() {
                    None => prop_assert!(popped.is_none()),
                    Some(expected) => {
                        let (key, id) = popped.unwrap();
                        prop_assert_eq!(key, expected);
                        let removed = model.live.remove(&id);
                        prop_assert_eq!(removed.map(|(_, k)| k), Some(key));
                    }
                }
            }
            Op::DecreaseKey(index, delta) => {
                if let Some((id, handle, key)) = model.pick(index) {
                    let result = heap.decrease_key(&handle, delta);
                    if delta > key {
                        prop_assert_eq!(result, Err(HeapError::KeyUnderflow { key, delta }));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        prop_assert_eq!(heap.get(&handle).map(|(k, _)| k), Ok(key - delta));
                        model.live.insert(id, (handle, key - delta));
                    }
                }
            }
            Op::Delete(index) => {
                if let Some((id, handle, key)) = model.pick(index) {
                    prop_assert_eq!(heap.delete(&handle), Ok((key, id)));
                    model.live.remove(&id);
                    prop_assert!(!heap.contains(&handle));
                }
            }
            Op::Meld(keys) => {
                let mut other = BinomialHeap::new();
                for key in keys {
                    let id = model.next;
                    let handle = other.insert(key, id).unwrap();
                    model.add(handle, key);
                }
                let expected = heap.size() + other.size();
                heap.meld(other);
                prop_assert_eq!(heap.size(), expected);
            }
        }

        prop_assert_eq!(heap.size(), model.live.len());
        prop_assert_eq!(heap.tree_count(), heap.size().count_ones() as usize);
        prop_assert_eq!(heap.find_min().map(|(k, _)| k), model.min_key());
        if let Err(msg) = heap.check_invariants() {
            return Err(TestCaseError::fail(msg));
        }
    }

    for (handle, key) in model.live.values() {
        prop_assert_eq!(heap.get(handle).map(|(k, _)| k), Ok(*key));
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_random_operation_sequences(ops in prop::collection::vec(op_strategy(), 0..200)) {
        run_ops(ops)?;
    }

    #[test]
    fn test_tree_count_is_popcount(keys in prop::collection::vec(0i64..10_000, 0..300)) {
        let mut heap = BinomialHeap::new();
        for (i, key) in keys.iter().enumerate() {
            heap.insert(*key, ()).unwrap();
            prop_assert_eq!(heap.size(), i + 1);
            prop_assert_eq!(heap.tree_count(), (i + 1).count_ones() as usize);
        }
    }

    #[test]
    fn test_drain_is_sorted(keys in prop::collection::vec(0i64..1000, 0..300)) {
        let mut heap: BinomialHeap<()> = keys.iter().map(|&k| (k, ())).collect();
        let mut drained = Vec::with_capacity(keys.len());
        while let Some((key, ())) = heap.delete_min() {
            drained.push(key);
        }
        let mut sorted = keys;
        sorted.sort_unstable();
        prop_assert_eq!(drained, sorted);
    }

    #[test]
    fn test_meld_counts(
        left in prop::collection::vec(0i64..1000, 0..100),
        right in prop::collection::vec(0i64..1000, 0..100)
    ) {
        let mut a: BinomialHeap<()> = left.iter().map(|&k| (k, ())).collect();
        let b: BinomialHeap<()> = right.iter().map(|&k| (k, ())).collect();
        let expected_min = left.iter().chain(&right).min().copied();

        a.meld(b);
        prop_assert_eq!(a.size(), left.len() + right.len());
        prop_assert_eq!(a.tree_count(), a.size().count_ones() as usize);
        prop_assert_eq!(a.find_min().map(|(k, _)| k), expected_min);
        prop_assert!(a.check_invariants().is_ok());
    }

    #[test]
    fn test_decrease_below_parent(
        size in 2usize..128,
        pick in any::<usize>(),
        target in 0i64..200
    ) {
        let mut heap = BinomialHeap::new();
        let handles: Vec<_> = (0..size)
            .map(|i| heap.insert(1000 + i as i64, i).unwrap())
            .collect();
        let handle = handles[pick % size].clone();
        let (key, _) = heap.get(&handle).unwrap();

        heap.decrease_key(&handle, key - target).unwrap();
        prop_assert!(heap.check_invariants().is_ok());
        prop_assert_eq!(heap.get(&handle).map(|(k, _)| k), Ok(target));
        // every other key is at least 1000, so the item must be the new minimum
        prop_assert_eq!(heap.min_handle(), Some(handle));
    }

    #[test]
    fn test_shuffled_thousand(keys in Just((1..=1000i64).collect::<Vec<_>>()).prop_shuffle()) {
        let mut heap = BinomialHeap::new();
        for key in keys {
            heap.insert(key, ()).unwrap();
        }
        let drained: Vec<i64> = std::iter::from_fn(|| heap.delete_min().map(|(k, _)| k)).collect();
        prop_assert_eq!(drained, (1..=1000).collect::<Vec<_>>());
    }
}
