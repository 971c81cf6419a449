//! Reference-counted storage for binomial heap nodes
//!
//! Nodes are `Rc<RefCell<Node>>`. Strong references flow downward and along
//! lists, weak references flow upward or act as caches:
//!
//! - `first_child` / `next_sibling`: strong; a node's children, ranks `0..rank`
//!   in order, and the root list itself
//! - `parent`: weak upward link (None for roots)
//! - `last_child`: weak tail of the child list (O(1) append when linking)
//! - `subtree_min`: weak link to the child holding the smallest key, so the
//!   minimum of a subtree below its root is known without rescanning
//!
//! Because a node is never copied once allocated, melding two heaps only
//! relinks their roots.
//!
//! Items live in their own `Rc` and move between nodes when sift-up swaps two
//! items. Each item keeps a weak back-reference to the node currently holding
//! it, and caller handles hold a weak reference to the item. A handle whose
//! item was removed fails to upgrade; a handle from another heap is caught by
//! comparing [`Owner`] sets.

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};

/// Type alias for node reference
pub(crate) type NodeRef<T> = Rc<RefCell<Node<T>>>;

/// Type alias for optional node reference
pub(crate) type NodePtr<T> = Option<NodeRef<T>>;

/// Type alias for weak node reference (parent links, caches, item back-links)
pub(crate) type WeakNodeRef<T> = Weak<RefCell<Node<T>>>;

/// Heap membership token
///
/// Every heap owns one `Owner` and every item records the owner of the heap
/// it was inserted into. Melding unions the two owner sets (by rank, with
/// path compression), so membership checks stay near O(1) and a meld never
/// has to visit the donor's items.
#[derive(Debug, Default)]
pub(crate) struct Owner {
    parent: RefCell<Option<Rc<Owner>>>,
    rank: Cell<u32>,
}

impl Owner {
    pub(crate) fn new() -> Rc<Owner> {
        Rc::new(Owner::default())
    }

    /// Representative of the set `this` belongs to
    pub(crate) fn root(this: &Rc<Owner>) -> Rc<Owner> {
        let mut root = Rc::clone(this);
        loop {
            let parent = root.parent.borrow().clone();
            match parent {
                Some(p) => root = p,
                None => break,
            }
        }

        // path compression
        let mut current = Rc::clone(this);
        while !Rc::ptr_eq(&current, &root) {
            match current.parent.replace(Some(Rc::clone(&root))) {
                Some(next) => current = next,
                None => break,
            }
        }
        root
    }

    /// Merges the sets of `a` and `b` and returns the new representative
    pub(crate) fn union(a: &Rc<Owner>, b: &Rc<Owner>) -> Rc<Owner> {
        let (ra, rb) = (Owner::root(a), Owner::root(b));
        if Rc::ptr_eq(&ra, &rb) {
            return ra;
        }
        let (winner, loser) = if ra.rank.get() < rb.rank.get() {
            (rb, ra)
        } else {
            (ra, rb)
        };
        if winner.rank.get() == loser.rank.get() {
            winner.rank.set(winner.rank.get() + 1);
        }
        *loser.parent.borrow_mut() = Some(Rc::clone(&winner));
        winner
    }

    pub(crate) fn same_set(a: &Rc<Owner>, b: &Rc<Owner>) -> bool {
        Rc::ptr_eq(&Owner::root(a), &Owner::root(b))
    }
}

/// A key/payload pair stored in the heap
///
/// The payload is never mutated in place; only the key changes, through
/// decrease-key.
pub(crate) struct ItemCell<T> {
    pub(crate) key: Cell<i64>,
    pub(crate) payload: T,
    /// Node currently holding this item
    pub(crate) node: RefCell<WeakNodeRef<T>>,
    pub(crate) owner: Rc<Owner>,
}

/// Internal node of a binomial tree
///
/// A node of rank r has exactly r children whose ranks are `0, 1, ..., r-1`
/// from `first_child` to `last_child`, and its subtree holds 2^r nodes.
pub(crate) struct Node<T> {
    pub(crate) item: Rc<ItemCell<T>>,
    pub(crate) rank: usize,
    pub(crate) parent: Option<WeakNodeRef<T>>,
    pub(crate) first_child: NodePtr<T>,
    pub(crate) next_sibling: NodePtr<T>,
    pub(crate) last_child: Option<WeakNodeRef<T>>,
    /// Child with the smallest key, None for rank 0
    pub(crate) subtree_min: Option<WeakNodeRef<T>>,
}

/// Allocates a rank-0 node for a new item
pub(crate) fn new_node<T>(key: i64, payload: T, owner: Rc<Owner>) -> NodeRef<T> {
    let item = Rc::new(ItemCell {
        key: Cell::new(key),
        payload,
        node: RefCell::new(Weak::new()),
        owner,
    });
    let node = Rc::new(RefCell::new(Node {
        item: Rc::clone(&item),
        rank: 0,
        parent: None,
        first_child: None,
        next_sibling: None,
        last_child: None,
        subtree_min: None,
    }));
    *item.node.borrow_mut() = Rc::downgrade(&node);
    node
}

#[inline]
pub(crate) fn key_of<T>(node: &NodeRef<T>) -> i64 {
    node.borrow().item.key.get()
}

#[inline]
pub(crate) fn rank_of<T>(node: &NodeRef<T>) -> usize {
    node.borrow().rank
}

#[inline]
pub(crate) fn upgrade<T>(link: Option<&WeakNodeRef<T>>) -> NodePtr<T> {
    link.and_then(Weak::upgrade)
}

/// Links two trees of equal rank into one tree of rank + 1
///
/// The root with the smaller key wins; on equal keys `a` wins. The loser
/// becomes the new last child of the winner, so the child list keeps its
/// increasing-rank order.
pub(crate) fn link<T>(a: NodeRef<T>, b: NodeRef<T>) -> NodeRef<T> {
    debug_assert_eq!(rank_of(&a), rank_of(&b));

    let (root, child) = if key_of(&b) < key_of(&a) { (b, a) } else { (a, b) };
    let child_key = key_of(&child);

    {
        let mut child_node = child.borrow_mut();
        child_node.parent = Some(Rc::downgrade(&root));
        child_node.next_sibling = None;
    }

    let last = upgrade(root.borrow().last_child.as_ref());
    let kept_min = upgrade(root.borrow().subtree_min.as_ref()).filter(|m| key_of(m) <= child_key);

    {
        let mut root_node = root.borrow_mut();
        if last.is_none() {
            root_node.first_child = Some(Rc::clone(&child));
        }
        root_node.last_child = Some(Rc::downgrade(&child));
        root_node.subtree_min = Some(Rc::downgrade(kept_min.as_ref().unwrap_or(&child)));
        root_node.rank += 1;
    }
    if let Some(last) = last {
        last.borrow_mut().next_sibling = Some(child);
    }
    root
}

/// Moves the item at `start` toward the root of its tree
///
/// Items are swapped with the parent while the item's key is strictly
/// smaller, or all the way to the root when `to_root` is set. Returns the
/// node that ends up holding the item.
///
/// Every node on the path ends with a key no larger than before, so each
/// parent's `subtree_min` only needs one comparison against the child
/// that changed.
pub(crate) fn sift_up<T>(start: NodeRef<T>, to_root: bool) -> NodeRef<T> {
    let mut current = start;
    loop {
        let parent = upgrade(current.borrow().parent.as_ref());
        let Some(parent) = parent else {
            return current;
        };
        if !to_root && key_of(&current) >= key_of(&parent) {
            refresh_min_child(&parent, &current);
            return current;
        }
        swap_items(&current, &parent);
        refresh_min_child(&parent, &current);
        current = parent;
    }
}

/// Re-points `parent.subtree_min` at `child` if its key dropped below the cached one
fn refresh_min_child<T>(parent: &NodeRef<T>, child: &NodeRef<T>) {
    let cached = upgrade(parent.borrow().subtree_min.as_ref());
    let replace = match &cached {
        Some(current) => !Rc::ptr_eq(current, child) && key_of(child) < key_of(current),
        None => true,
    };
    if replace {
        parent.borrow_mut().subtree_min = Some(Rc::downgrade(child));
    }
}

fn swap_items<T>(a: &NodeRef<T>, b: &NodeRef<T>) {
    mem::swap(&mut a.borrow_mut().item, &mut b.borrow_mut().item);
    *a.borrow().item.node.borrow_mut() = Rc::downgrade(a);
    *b.borrow().item.node.borrow_mut() = Rc::downgrade(b);
}

/// Consumes a node that has been unlinked from every tree and list
///
/// Its children must already have been promoted.
pub(crate) fn into_item<T>(node: NodeRef<T>) -> (i64, T) {
    let node = Rc::try_unwrap(node)
        .ok()
        .expect("unlinked node should have no other strong references")
        .into_inner();
    debug_assert!(node.first_child.is_none() && node.next_sibling.is_none());
    let item = Rc::try_unwrap(node.item)
        .ok()
        .expect("item should only be owned by its node");
    (item.key.get(), item.payload)
}
