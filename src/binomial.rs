//! Binomial Heap implementation
//!
//! A binomial heap is a forest of heap-ordered binomial trees with:
//! - O(1) amortized insert (O(log n) worst case)
//! - O(1) find_min
//! - O(log n) delete_min, decrease_key and delete
//! - O(log n) meld
//!
//! # Algorithm Overview
//!
//! **Binomial Tree Bₖ**: Recursively defined:
//! - B₀ is a single node
//! - Bₖ is formed by linking two B_{k-1} trees
//! - Bₖ has exactly 2ᵏ nodes and its root has k children of ranks 0..k-1
//!
//! The root list holds at most one tree per rank, in increasing rank order,
//! so the heap's trees mirror the binary representation of its size and
//! `tree_count() == size().count_ones()`.
//!
//! **Key Operations**:
//! - **Insert**: meld a single-node forest into the heap (binary increment)
//! - **Delete-min**: detach the minimum root, promote its children to a forest, meld
//! - **Decrease-key**: sift the item up by swapping items with the parent
//! - **Delete**: sift the item to its root unconditionally, then remove that root
//! - **Meld**: walk both root lists by rank with a carry, like binary addition
//!
//! # Handles
//!
//! [`insert`](BinomialHeap::insert) returns an [`ItemHandle`]. Handles are
//! checked on every use: once the item is removed, or when the handle comes
//! from a heap that was never melded into this one, operations fail with
//! [`HeapError::InvalidHandle`]. Handles stay valid across melds in either
//! direction.

use crate::config::HeapConfig;
use crate::error::{HeapError, Result};
use crate::storage::{
    into_item, key_of, link, new_node, rank_of, sift_up, upgrade, ItemCell, NodePtr, NodeRef,
    Owner, WeakNodeRef,
};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Handle to an item in a [`BinomialHeap`]
///
/// Returned by [`BinomialHeap::insert`] and accepted by
/// [`decrease_key`](BinomialHeap::decrease_key), [`delete`](BinomialHeap::delete)
/// and [`get`](BinomialHeap::get). The handle holds a weak reference to the
/// item, so it never keeps a removed item alive.
pub struct ItemHandle<T = String> {
    item: Weak<ItemCell<T>>,
}

impl<T> Clone for ItemHandle<T> {
    fn clone(&self) -> Self {
        ItemHandle {
            item: self.item.clone(),
        }
    }
}

impl<T> PartialEq for ItemHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item.ptr_eq(&other.item)
    }
}

impl<T> Eq for ItemHandle<T> {}

impl<T> fmt::Debug for ItemHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemHandle")
            .field("live", &(self.item.strong_count() > 0))
            .finish()
    }
}

/// Root list bookkeeping
///
/// A forest owns its first root; the other roots hang off `next_sibling`.
/// The last root and the minimum root are weak references.
struct Forest<T> {
    first: NodePtr<T>,
    last: Option<WeakNodeRef<T>>,
    trees: usize,
    min: Option<WeakNodeRef<T>>,
    size: usize,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Forest {
            first: None,
            last: None,
            trees: 0,
            min: None,
            size: 0,
        }
    }
}

impl<T> Forest<T> {
    fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// A forest of `size` nodes with no trees yet
    fn sized(size: usize) -> Self {
        Forest {
            size,
            ..Forest::default()
        }
    }

    /// Appends a tree to the root list; `size` is left to the caller
    fn push(&mut self, node: NodeRef<T>) {
        {
            let mut root = node.borrow_mut();
            root.parent = None;
            root.next_sibling = None;
        }
        self.min = Some(Rc::downgrade(&smaller(upgrade(self.min.as_ref()), &node)));

        let tail = Rc::downgrade(&node);
        match upgrade(self.last.as_ref()) {
            Some(last) => last.borrow_mut().next_sibling = Some(node),
            None => self.first = Some(node),
        }
        self.last = Some(tail);
        self.trees += 1;
    }
}

/// Detaches the head of a root list and advances the list past it
fn pop_front<T>(list: &mut NodePtr<T>) -> NodePtr<T> {
    let head = list.take()?;
    *list = head.borrow_mut().next_sibling.take();
    Some(head)
}

/// The smaller-keyed of `current` and `candidate`; `current` wins ties
fn smaller<T>(current: NodePtr<T>, candidate: &NodeRef<T>) -> NodeRef<T> {
    match current {
        Some(c) if key_of(&c) <= key_of(candidate) => c,
        _ => Rc::clone(candidate),
    }
}

/// Melds two root lists
///
/// **Algorithm**: like binary addition, walking both lists by increasing rank
/// with at most one carry (a linked tree not yet placed):
/// - no carry and equal ranks: link both roots into the carry
/// - carry and both sides at the carry's rank: emit the carry, the two
///   roots are linked on the next step
/// - carry and one side at the carry's rank: link them into a new carry
/// - carry matching neither side: emit it (its rank is the smallest left)
/// - otherwise emit the lower-ranked root
///
/// Only roots are visited, so this costs O(trees(a) + trees(b)). On links
/// between two roots of `a` and `b`, the root from `a` wins ties.
fn merge_forests<T>(a: Forest<T>, b: Forest<T>) -> Forest<T> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }

    let mut out = Forest::sized(a.size + b.size);
    let mut left = a.first;
    let mut right = b.first;
    let mut carry: NodePtr<T> = None;
    let mut links = 0usize;

    loop {
        let l = left.as_ref().map(rank_of);
        let r = right.as_ref().map(rank_of);

        match carry.take() {
            Some(c) => {
                let rank = rank_of(&c);
                let side = if l == Some(rank) && r == Some(rank) {
                    None
                } else if l == Some(rank) {
                    pop_front(&mut left)
                } else if r == Some(rank) {
                    pop_front(&mut right)
                } else {
                    None
                };
                match side {
                    Some(node) => {
                        carry = Some(link(c, node));
                        links += 1;
                    }
                    None => out.push(c),
                }
            }
            None => match (l, r) {
                (Some(lr), Some(rr)) if lr == rr => {
                    match (pop_front(&mut left), pop_front(&mut right)) {
                        (Some(x), Some(y)) => {
                            carry = Some(link(x, y));
                            links += 1;
                        }
                        (x, y) => x.into_iter().chain(y).for_each(|n| out.push(n)),
                    }
                }
                (Some(lr), Some(rr)) if lr < rr => {
                    if let Some(node) = pop_front(&mut left) {
                        out.push(node);
                    }
                }
                (Some(_), None) => {
                    if let Some(node) = pop_front(&mut left) {
                        out.push(node);
                    }
                }
                (_, Some(_)) => {
                    if let Some(node) = pop_front(&mut right) {
                        out.push(node);
                    }
                }
                (None, None) => break,
            },
        }
    }

    trace!(trees = out.trees, links, size = out.size, "merged root lists");
    out
}

/// Turns the children of `root` into a standalone forest
///
/// The children are already in increasing rank order and their minimum is
/// the cached `subtree_min`, so only the parent links are rewritten.
fn promote_children<T>(root: &NodeRef<T>) -> Forest<T> {
    let forest = {
        let mut node = root.borrow_mut();
        let rank = node.rank;
        node.rank = 0;
        Forest {
            first: node.first_child.take(),
            last: node.last_child.take(),
            trees: rank,
            min: node.subtree_min.take(),
            size: (1usize << rank) - 1,
        }
    };

    let mut current = forest.first.clone();
    while let Some(child) = current {
        let mut node = child.borrow_mut();
        node.parent = None;
        current = node.next_sibling.clone();
    }
    forest
}

/// Binomial Heap
///
/// Keys are `i64`, payloads are opaque values of type `T` (a `String` by
/// default).
///
/// # Example
///
/// ```rust
/// use binomial_heap::BinomialHeap;
///
/// let mut heap: BinomialHeap = BinomialHeap::new();
/// let handle = heap.insert(5, "item".to_string()).unwrap();
/// heap.insert(3, "other".to_string()).unwrap();
/// heap.decrease_key(&handle, 4).unwrap();
/// assert_eq!(heap.find_min(), Some((1, &"item".to_string())));
/// ```
pub struct BinomialHeap<T = String> {
    roots: Forest<T>,
    /// Representative of this heap's owner set
    owner: Rc<Owner>,
    config: HeapConfig,
}

impl<T> Default for BinomialHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BinomialHeap<T> {
    /// Creates an empty heap with the default configuration
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Creates an empty heap with the given configuration
    pub fn with_config(config: HeapConfig) -> Self {
        BinomialHeap {
            roots: Forest::default(),
            owner: Owner::new(),
            config,
        }
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Number of items in the heap
    pub fn size(&self) -> usize {
        self.roots.size
    }

    /// Same as [`size`](Self::size)
    pub fn len(&self) -> usize {
        self.roots.size
    }

    pub fn is_empty(&self) -> bool {
        self.roots.size == 0
    }

    /// Number of binomial trees in the root list
    pub fn tree_count(&self) -> usize {
        self.roots.trees
    }

    /// Inserts `payload` with priority `key`
    ///
    /// **Time Complexity**: O(1) amortized, O(log n) worst-case
    ///
    /// A single-node forest is melded into the root list. Like incrementing a
    /// binary counter, one insert may cascade through a carry per rank, but a
    /// sequence of inserts performs O(1) links each on average.
    ///
    /// # Errors
    /// [`HeapError::NegativeKey`] if `key < 0` and the configuration does not
    /// allow negative keys.
    pub fn insert(&mut self, key: i64, payload: T) -> Result<ItemHandle<T>> {
        if key < self.config.key_floor() {
            debug!(key, "rejecting insert with negative key");
            return Err(HeapError::NegativeKey { key });
        }

        let node = new_node(key, payload, Rc::clone(&self.owner));
        let handle = ItemHandle {
            item: Rc::downgrade(&node.borrow().item),
        };
        let mut single = Forest::sized(1);
        single.push(node);
        let roots = mem::take(&mut self.roots);
        self.roots = merge_forests(roots, single);
        Ok(handle)
    }

    /// Returns the minimum key and its payload
    ///
    /// **Time Complexity**: O(1)
    pub fn find_min(&self) -> Option<(i64, &T)> {
        let min = upgrade(self.roots.min.as_ref())?;
        Some(self.view(&min))
    }

    /// Returns a handle to the minimum item
    pub fn min_handle(&self) -> Option<ItemHandle<T>> {
        let min = upgrade(self.roots.min.as_ref())?;
        let item = Rc::downgrade(&min.borrow().item);
        Some(ItemHandle { item })
    }

    /// Returns the current key and payload of the handle's item
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the item is not in this heap.
    pub fn get(&self, handle: &ItemHandle<T>) -> Result<(i64, &T)> {
        let node = self.resolve(handle)?;
        Ok(self.view(&node))
    }

    /// Returns true if the handle's item is currently in this heap
    pub fn contains(&self, handle: &ItemHandle<T>) -> bool {
        self.locate(handle).is_some()
    }

    /// Removes and returns the minimum item
    ///
    /// **Time Complexity**: O(log n) worst-case
    ///
    /// **Algorithm**:
    /// 1. Detach the minimum root; the remaining roots form forest A and its
    ///    minimum is found by scanning them (O(log n) roots)
    /// 2. The minimum root's children Bₖ₋₁ ... B₀ form forest B. They are
    ///    already linked in increasing rank order, and B's minimum is the
    ///    cached `subtree_min`
    /// 3. Meld A and B
    pub fn delete_min(&mut self) -> Option<(i64, T)> {
        let min = upgrade(self.roots.min.as_ref())?;
        let (key, payload) = self.remove_root(min);
        trace!(key, size = self.roots.size, "deleted minimum");
        Some((key, payload))
    }

    /// Decreases the key of the handle's item by `delta`
    ///
    /// **Time Complexity**: O(log n) worst-case, O(1) if heap order still holds
    ///
    /// The item is swapped with its parent's item while its key is strictly
    /// smaller. Swapping items rather than nodes keeps every tree's shape
    /// intact. If the item reaches a root with a key below the current
    /// minimum, it becomes the new minimum.
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the item is not in this heap
    /// - [`HeapError::NonPositiveDelta`] if `delta <= 0`
    /// - [`HeapError::KeyUnderflow`] if the new key would be negative (and the
    ///   configuration forbids that) or would overflow `i64`
    pub fn decrease_key(&mut self, handle: &ItemHandle<T>, delta: i64) -> Result<()> {
        let node = self.resolve(handle)?;
        if delta <= 0 {
            debug!(delta, "rejecting decrease_key with non-positive delta");
            return Err(HeapError::NonPositiveDelta { delta });
        }

        let key = key_of(&node);
        let new_key = key
            .checked_sub(delta)
            .filter(|k| *k >= self.config.key_floor())
            .ok_or_else(|| {
                debug!(key, delta, "rejecting decrease_key below the key floor");
                HeapError::KeyUnderflow { key, delta }
            })?;

        node.borrow().item.key.set(new_key);
        let settled = sift_up(node, false);

        if settled.borrow().parent.is_none() {
            let is_new_min = match upgrade(self.roots.min.as_ref()) {
                Some(min) => new_key < key_of(&min),
                None => true,
            };
            if is_new_min {
                self.roots.min = Some(Rc::downgrade(&settled));
            }
        }
        Ok(())
    }

    /// Removes the handle's item and returns its key and payload
    ///
    /// **Time Complexity**: O(log n) worst-case
    ///
    /// The item is carried to the root of its tree as if its key had dropped
    /// to the heap minimum, and that root is removed exactly like the minimum
    /// in [`delete_min`](Self::delete_min). Keys of other items never change.
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the item is not in this heap.
    pub fn delete(&mut self, handle: &ItemHandle<T>) -> Result<(i64, T)> {
        let node = self.resolve(handle)?;
        let root = sift_up(node, true);
        let (key, payload) = self.remove_root(root);
        trace!(key, size = self.roots.size, "deleted item");
        Ok((key, payload))
    }

    /// Melds another heap into this one, consuming it
    ///
    /// **Time Complexity**: O(log n + log m)
    ///
    /// Only the two root lists are walked; no node of either heap is moved
    /// or copied. Handles issued by either heap remain valid in the result.
    ///
    /// The receiver's configuration is kept and governs every later insert
    /// and decrease. Keys already in `other` are taken as they are, so
    /// melding a heap that allows negative keys into one that does not
    /// carries those negative keys over.
    pub fn meld(&mut self, other: BinomialHeap<T>) {
        self.owner = Owner::union(&self.owner, &other.owner);
        if other.is_empty() {
            return;
        }

        debug!(
            receiver_trees = self.roots.trees,
            donor_trees = other.roots.trees,
            "melding heaps"
        );
        // the receiver's roots come first so they win ties on link
        let roots = mem::take(&mut self.roots);
        self.roots = merge_forests(roots, other.roots);
    }

    /// Key and payload of the item held by `node`
    fn view(&self, node: &NodeRef<T>) -> (i64, &T) {
        let item = Rc::as_ptr(&node.borrow().item);
        // SAFETY: We return references tied to the &self lifetime.
        // 1. The item is owned by a node reachable from `self.roots`
        // 2. Nodes and items are only dropped or unwrapped through &mut self
        // 3. The payload is never mutated in place, and moving the item's Rc
        //    between nodes does not move the item itself
        unsafe { ((*item).key.get(), &(*item).payload) }
    }

    /// Node holding the handle's item, if the item lives in this heap
    fn locate(&self, handle: &ItemHandle<T>) -> NodePtr<T> {
        let item = handle.item.upgrade()?;
        if !Owner::same_set(&item.owner, &self.owner) {
            return None;
        }
        let node = item.node.borrow().upgrade();
        node
    }

    fn resolve(&self, handle: &ItemHandle<T>) -> Result<NodeRef<T>> {
        self.locate(handle).ok_or_else(|| {
            debug!(?handle, "rejecting unknown handle");
            HeapError::InvalidHandle
        })
    }

    /// Removes a root from the root list and returns its item
    fn remove_root(&mut self, root: NodeRef<T>) -> (i64, T) {
        let rest = self.detach_root(&root);
        let children = promote_children(&root);
        self.roots = merge_forests(rest, children);
        into_item(root)
    }

    /// The root list without `root`, with its minimum recomputed by scanning
    fn detach_root(&mut self, root: &NodeRef<T>) -> Forest<T> {
        let old = mem::take(&mut self.roots);
        let mut rest = Forest::sized(old.size - (1usize << rank_of(root)));

        let mut current = old.first;
        while let Some(node) = pop_front(&mut current) {
            if !Rc::ptr_eq(&node, root) {
                rest.push(node);
            }
        }
        rest
    }

    /// Verifies every structural invariant and cache
    ///
    /// Checks rank order and uniqueness in the root list, heap order, child
    /// ranks `0..rank`, 2ʳ nodes per rank-r tree, parent links, the
    /// `last_child` and `subtree_min` caches, the minimum pointer, the size
    /// and tree counters, and each item's back-link and owner.
    ///
    /// **Time Complexity**: O(n)
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut trees = 0usize;
        let mut size = 0usize;
        let mut min: NodePtr<T> = None;
        let mut last: NodePtr<T> = None;
        let mut prev_rank: Option<usize> = None;

        let mut current = self.roots.first.clone();
        while let Some(root) = current {
            if root.borrow().parent.is_some() {
                return Err(format!("root of rank {} has a parent", rank_of(&root)));
            }
            let rank = rank_of(&root);
            if let Some(prev) = prev_rank {
                if rank <= prev {
                    return Err(format!(
                        "root ranks not strictly increasing: {prev} then {rank}"
                    ));
                }
            }
            prev_rank = Some(rank);
            size += self.check_tree(&root)?;
            trees += 1;
            min = Some(smaller(min, &root));
            current = root.borrow().next_sibling.clone();
            last = Some(root);
        }

        if trees != self.roots.trees {
            return Err(format!("tree_count {} but {trees} roots", self.roots.trees));
        }
        if size != self.roots.size {
            return Err(format!("size {} but {size} nodes", self.roots.size));
        }
        if size.count_ones() as usize != trees {
            return Err(format!("{trees} trees for size {size}"));
        }
        let cached_last = upgrade(self.roots.last.as_ref());
        let last_matches = match (&last, &cached_last) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if !last_matches {
            return Err("last_root does not end the root list".to_string());
        }
        match (min, upgrade(self.roots.min.as_ref())) {
            (None, None) => {}
            (Some(expected), Some(actual)) => {
                if actual.borrow().parent.is_some() {
                    return Err("min_root is not a root".to_string());
                }
                if key_of(&expected) != key_of(&actual) {
                    return Err(format!(
                        "min_root key {} but minimum is {}",
                        key_of(&actual),
                        key_of(&expected)
                    ));
                }
            }
            _ => return Err("min_root disagrees with emptiness".to_string()),
        }
        Ok(())
    }

    /// Checks one subtree and returns its node count
    fn check_tree(&self, node: &NodeRef<T>) -> std::result::Result<usize, String> {
        let key = key_of(node);
        let rank = rank_of(node);
        {
            let n = node.borrow();
            let back = n.item.node.borrow().upgrade();
            if !back.is_some_and(|b| Rc::ptr_eq(&b, node)) {
                return Err(format!("item with key {key} does not point at its node"));
            }
            if !Owner::same_set(&n.item.owner, &self.owner) {
                return Err(format!("item with key {key} belongs to another heap"));
            }
        }

        let mut count = 1usize;
        let mut expected_rank = 0usize;
        let mut min_child: NodePtr<T> = None;
        let mut last: NodePtr<T> = None;

        let mut current = node.borrow().first_child.clone();
        while let Some(child) = current {
            let parent = upgrade(child.borrow().parent.as_ref());
            if !parent.is_some_and(|p| Rc::ptr_eq(&p, node)) {
                return Err(format!("child of key {} has a wrong parent link", key_of(&child)));
            }
            if rank_of(&child) != expected_rank {
                return Err(format!(
                    "child rank {} where {expected_rank} was expected",
                    rank_of(&child)
                ));
            }
            if key_of(&child) < key {
                return Err(format!(
                    "heap order violated: child key {} below parent key {key}",
                    key_of(&child)
                ));
            }
            count += self.check_tree(&child)?;
            min_child = Some(smaller(min_child, &child));
            expected_rank += 1;
            current = child.borrow().next_sibling.clone();
            last = Some(child);
        }

        if expected_rank != rank {
            return Err(format!("node of rank {rank} has {expected_rank} children"));
        }
        if count != 1usize << rank {
            return Err(format!("rank {rank} tree holds {count} nodes"));
        }
        let cached_last = upgrade(node.borrow().last_child.as_ref());
        let last_ok = match (&last, &cached_last) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        if !last_ok {
            return Err(format!("last_child cache under key {key} is stale"));
        }
        let cached_min = upgrade(node.borrow().subtree_min.as_ref());
        let min_ok = match (&min_child, &cached_min) {
            (None, None) => true,
            (Some(expected), Some(actual)) => {
                let is_child = upgrade(actual.borrow().parent.as_ref())
                    .is_some_and(|p| Rc::ptr_eq(&p, node));
                is_child && key_of(expected) == key_of(actual)
            }
            _ => false,
        };
        if !min_ok {
            return Err(format!("subtree_min cache under key {key} is stale"));
        }
        Ok(count)
    }
}

impl<T> fmt::Debug for BinomialHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinomialHeap")
            .field("size", &self.roots.size)
            .field("tree_count", &self.roots.trees)
            .field("min_key", &upgrade(self.roots.min.as_ref()).map(|m| key_of(&m)))
            .finish()
    }
}

impl<T> Extend<(i64, T)> for BinomialHeap<T> {
    /// # Panics
    /// Panics if a key is rejected by [`insert`](BinomialHeap::insert).
    fn extend<I: IntoIterator<Item = (i64, T)>>(&mut self, iter: I) {
        for (key, payload) in iter {
            if let Err(err) = self.insert(key, payload) {
                panic!("cannot extend heap: {err}");
            }
        }
    }
}

impl<T> FromIterator<(i64, T)> for BinomialHeap<T> {
    /// # Panics
    /// Panics if a key is negative.
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let mut heap = BinomialHeap::new();
        heap.extend(iter);
        heap
    }
}
