// src/heap/fibonacci.rs

//! Fibonacci heap over a slot arena.
//!
//! | Operation | Bound |
//! |-----------|-------|
//! | insert | O(1) amortized |
//! | find_min / peek | O(1) |
//! | extract_min / pop | O(log n) amortized |
//! | decrease_key | O(1) amortized |
//! | delete / remove | O(log n) amortized |
//! | merge | O(1) root splice, plus relocating the absorbed arena |

use crate::errors::HeapError;
use crate::heap::arena::{Arena, NodeHandle};
use crate::heap::node::HeapNode;

/// Golden ratio; a node of degree `d` roots a subtree of at least `phi^d` nodes.
const PHI: f64 = 1.618_033_988_749_895;

/// Mergeable min-priority queue with handle-based `decrease_key` and `delete`.
///
/// Equal keys come out in an unspecified (but deterministic) order.
///
/// ```
/// use fibdag::heap::FibHeap;
///
/// let mut heap = FibHeap::new();
/// let handle = heap.insert(5, "item");
/// heap.insert(3, "other");
/// heap.decrease_key(handle, 1).unwrap();
/// assert_eq!(heap.peek(), Some((&1, &"item")));
/// ```
#[derive(Debug, Clone)]
pub struct FibHeap<K, T> {
    pub(super) arena: Arena<HeapNode<K, T>>,
    /// Minimum root, `None` iff the heap is empty.
    pub(super) min: Option<usize>,
    pub(super) count: usize,
}

/// Translates handles issued by a heap that was absorbed by [`FibHeap::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedHandles {
    offset: usize,
}

impl MergedHandles {
    /// The handle that now refers to the same node inside the merged heap.
    pub fn translate(&self, handle: NodeHandle) -> NodeHandle {
        NodeHandle {
            index: handle.index + self.offset,
            generation: handle.generation,
        }
    }
}

impl<K: Ord, T> Default for FibHeap<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, T> FibHeap<K, T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::default(),
            min: None,
            count: 0,
        }
    }

    #[doc(alias = "size")]
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Insert a new element as a singleton root.
    pub fn insert(&mut self, key: K, value: T) -> NodeHandle {
        let index = self.arena.vacant_index();
        let handle = self.arena.insert(HeapNode::new(key, value, index));
        debug_assert_eq!(handle.index, index);
        self.add_root(index);
        self.count += 1;
        handle
    }

    /// Value at the minimum root.
    pub fn find_min(&self) -> Option<&T> {
        self.min.map(|m| &self.arena.get(m).value)
    }

    /// Key and value at the minimum root.
    pub fn peek(&self) -> Option<(&K, &T)> {
        self.min.map(|m| {
            let node = self.arena.get(m);
            (&node.key, &node.value)
        })
    }

    /// Key and value behind a handle, if it is still live.
    pub fn get(&self, handle: NodeHandle) -> Option<(&K, &T)> {
        let index = self.arena.resolve(handle)?;
        let node = self.arena.get(index);
        Some((&node.key, &node.value))
    }

    pub fn key_of(&self, handle: NodeHandle) -> Option<&K> {
        self.get(handle).map(|(k, _)| k)
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.arena.resolve(handle).is_some()
    }

    /// Remove and return the minimum value.
    pub fn extract_min(&mut self) -> Option<T> {
        self.pop().map(|(_, value)| value)
    }

    /// Remove and return the minimum entry.
    pub fn pop(&mut self) -> Option<(K, T)> {
        let z = self.min?;

        if let Some(child) = self.arena.get_mut(z).child.take() {
            for c in self.ring(child) {
                let node = self.arena.get_mut(c);
                node.parent = None;
                node.marked = false;
                self.unlink(c);
                self.splice_after(z, c);
            }
            self.arena.get_mut(z).degree = 0;
        }

        let right = self.arena.get(z).right;
        if right == z {
            // Lone root without children: nothing to consolidate.
            self.min = None;
        } else {
            self.unlink(z);
            self.min = Some(right);
            self.consolidate();
        }

        self.count -= 1;
        let node = self.arena.remove(z);
        Some((node.key, node.value))
    }

    /// Lower the key behind `handle` to `key`.
    ///
    /// Raising a key is rejected with [`HeapError::KeyIncrease`] and leaves
    /// the heap untouched.
    pub fn decrease_key(&mut self, handle: NodeHandle, key: K) -> Result<(), HeapError> {
        let x = self.arena.resolve(handle).ok_or(HeapError::StaleHandle)?;
        if key > self.arena.get(x).key {
            return Err(HeapError::KeyIncrease);
        }
        self.arena.get_mut(x).key = key;

        if let Some(p) = self.arena.get(x).parent {
            if self.arena.get(x).key < self.arena.get(p).key {
                self.cut(x, p);
                self.cascading_cut(p);
            }
        }

        if let Some(m) = self.min {
            if self.arena.get(x).key < self.arena.get(m).key {
                self.min = Some(x);
            }
        }
        Ok(())
    }

    /// Delete the element behind `handle` and return its value.
    pub fn delete(&mut self, handle: NodeHandle) -> Result<T, HeapError> {
        self.remove(handle).map(|(_, value)| value)
    }

    /// Delete the element behind `handle` and return its entry.
    ///
    /// Equivalent to decreasing the key to negative infinity and extracting
    /// the minimum: the node is cut to the root list and forced to be `min`.
    pub fn remove(&mut self, handle: NodeHandle) -> Result<(K, T), HeapError> {
        let x = self.arena.resolve(handle).ok_or(HeapError::StaleHandle)?;
        if let Some(p) = self.arena.get(x).parent {
            self.cut(x, p);
            self.cascading_cut(p);
        }
        self.min = Some(x);
        self.pop().ok_or(HeapError::StaleHandle)
    }

    /// Absorb `other`, splicing its root list into this one.
    ///
    /// Splicing the root lists is O(1), but `other`'s slots are moved into
    /// this heap's arena, so the whole call is O(slots in `other`).
    ///
    /// Handles issued by `other` must be passed through the returned
    /// [`MergedHandles`] before being used with this heap.
    pub fn merge(&mut self, other: FibHeap<K, T>) -> MergedHandles {
        let FibHeap { arena, min, count } = other;
        let offset = self.arena.absorb(arena, |node, off| node.shift(off));
        self.count += count;

        if let Some(other_min) = min.map(|m| m + offset) {
            match self.min {
                None => self.min = Some(other_min),
                Some(m) => {
                    self.join_rings(m, other_min);
                    if self.arena.get(other_min).key < self.arena.get(m).key {
                        self.min = Some(other_min);
                    }
                }
            }
        }

        MergedHandles { offset }
    }

    fn consolidate(&mut self) {
        let Some(start) = self.min else {
            return;
        };

        let mut table: Vec<Option<usize>> = vec![None; max_degree(self.count) + 1];
        for root in self.ring(start) {
            let mut x = root;
            let mut degree = self.arena.get(x).degree;
            loop {
                if degree >= table.len() {
                    table.resize(degree + 1, None);
                }
                let Some(mut y) = table[degree].take() else {
                    break;
                };
                if self.arena.get(y).key < self.arena.get(x).key {
                    std::mem::swap(&mut x, &mut y);
                }
                self.link(y, x);
                degree += 1;
            }
            table[degree] = Some(x);
        }

        // The surviving roots are exactly the table entries.
        self.min = None;
        for root in table.into_iter().flatten() {
            match self.min {
                Some(m) if self.arena.get(m).key <= self.arena.get(root).key => {}
                _ => self.min = Some(root),
            }
        }
    }

    /// Make root `y` a child of root `x`.
    fn link(&mut self, y: usize, x: usize) {
        self.unlink(y);
        {
            let node = self.arena.get_mut(y);
            node.parent = Some(x);
            node.marked = false;
        }
        match self.arena.get(x).child {
            Some(c) => self.splice_after(c, y),
            None => self.arena.get_mut(x).child = Some(y),
        }
        self.arena.get_mut(x).degree += 1;
    }

    /// Detach `x` from its parent `p` and make it an unmarked root.
    fn cut(&mut self, x: usize, p: usize) {
        let next = self.arena.get(x).right;
        let parent = self.arena.get_mut(p);
        if parent.child == Some(x) {
            parent.child = (next != x).then_some(next);
        }
        parent.degree -= 1;

        self.unlink(x);
        let node = self.arena.get_mut(x);
        node.parent = None;
        node.marked = false;
        self.add_root(x);
    }

    fn cascading_cut(&mut self, mut y: usize) {
        while let Some(z) = self.arena.get(y).parent {
            let node = self.arena.get_mut(y);
            if !node.marked {
                node.marked = true;
                return;
            }
            self.cut(y, z);
            y = z;
        }
    }

    /// Splice singleton `x` into the root list, updating `min`.
    fn add_root(&mut self, x: usize) {
        match self.min {
            None => self.min = Some(x),
            Some(m) => {
                self.splice_after(m, x);
                if self.arena.get(x).key < self.arena.get(m).key {
                    self.min = Some(x);
                }
            }
        }
    }

    /// Insert singleton `x` to the right of `anchor` in anchor's ring.
    fn splice_after(&mut self, anchor: usize, x: usize) {
        let right = self.arena.get(anchor).right;
        {
            let node = self.arena.get_mut(x);
            node.left = anchor;
            node.right = right;
        }
        self.arena.get_mut(anchor).right = x;
        self.arena.get_mut(right).left = x;
    }

    /// Concatenate the ring containing `a` with the ring containing `b`.
    fn join_rings(&mut self, a: usize, b: usize) {
        let a_right = self.arena.get(a).right;
        let b_left = self.arena.get(b).left;
        self.arena.get_mut(a).right = b;
        self.arena.get_mut(b).left = a;
        self.arena.get_mut(b_left).right = a_right;
        self.arena.get_mut(a_right).left = b_left;
    }

    /// Remove `x` from its sibling ring, leaving it a singleton.
    fn unlink(&mut self, x: usize) {
        let (left, right) = {
            let node = self.arena.get(x);
            (node.left, node.right)
        };
        assert_eq!(self.arena.get(left).right, x, "sibling ring corrupted at node {x}");
        assert_eq!(self.arena.get(right).left, x, "sibling ring corrupted at node {x}");

        self.arena.get_mut(left).right = right;
        self.arena.get_mut(right).left = left;
        let node = self.arena.get_mut(x);
        node.left = x;
        node.right = x;
    }

    /// Indices of the ring containing `start`, beginning at `start`.
    pub(super) fn ring(&self, start: usize) -> Vec<usize> {
        let mut out = vec![start];
        let mut cur = self.arena.get(start).right;
        while cur != start {
            assert!(
                out.len() <= self.arena.capacity(),
                "sibling ring starting at node {start} never closes"
            );
            out.push(cur);
            cur = self.arena.get(cur).right;
        }
        out
    }
}

/// Upper bound on root degree after consolidation: floor(log_phi(n)) + 1.
fn max_degree(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    ((n as f64).ln() / PHI.ln()).floor() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<K: Ord, T>(heap: &mut FibHeap<K, T>) -> Vec<K> {
        let mut out = Vec::new();
        while let Some((k, _)) = heap.pop() {
            heap.assert_invariants();
            out.push(k);
        }
        out
    }

    #[test]
    fn extracts_in_ascending_order() {
        let mut heap = FibHeap::new();
        for k in [5, 3, 8, 1, 9] {
            heap.insert(k, k * 10);
        }
        heap.assert_invariants();

        let mut values = Vec::new();
        while let Some(v) = heap.extract_min() {
            values.push(v);
        }
        assert_eq!(values, vec![10, 30, 50, 80, 90]);
        assert!(heap.is_empty());
        assert_eq!(heap.find_min(), None);
    }

    #[test]
    fn single_node_extract_empties_heap() {
        let mut heap = FibHeap::new();
        let h = heap.insert(7, "only");
        assert_eq!(heap.extract_min(), Some("only"));
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.peek(), None);
        assert!(!heap.contains(h));
        assert_eq!(heap.extract_min(), None);
    }

    #[test]
    fn merge_of_two_singletons() {
        let mut a = FibHeap::new();
        a.insert(10, "A");
        let mut b = FibHeap::new();
        b.insert(5, "B");

        a.merge(b);
        a.assert_invariants();
        assert_eq!(a.len(), 2);
        assert_eq!(a.find_min(), Some(&"B"));
        assert_eq!(a.extract_min(), Some("B"));
        assert_eq!(a.extract_min(), Some("A"));
        assert_eq!(a.extract_min(), None);
    }

    #[test]
    fn merge_translates_absorbed_handles() {
        let mut a = FibHeap::new();
        a.insert(4, 'a');
        a.insert(6, 'b');
        a.pop();

        let mut b = FibHeap::new();
        let hb = b.insert(9, 'z');
        b.insert(7, 'y');
        b.pop();
        b.insert(8, 'x');

        let remap = a.merge(b);
        let hb = remap.translate(hb);
        assert_eq!(a.get(hb), Some((&9, &'z')));

        a.decrease_key(hb, 1).unwrap();
        a.assert_invariants();
        assert_eq!(a.extract_min(), Some('z'));
        assert_eq!(drain(&mut a), vec![6, 8]);
    }

    #[test]
    fn merge_into_empty_heap() {
        let mut a: FibHeap<i32, ()> = FibHeap::new();
        let mut b = FibHeap::new();
        b.insert(3, ());
        b.insert(1, ());
        a.merge(b);
        assert_eq!(a.peek(), Some((&1, &())));
        assert_eq!(drain(&mut a), vec![1, 3]);
    }

    #[test]
    fn decrease_key_rejects_increase_without_mutation() {
        let mut heap = FibHeap::new();
        let h = heap.insert(5, "x");
        heap.insert(2, "y");

        assert_eq!(heap.decrease_key(h, 6), Err(HeapError::KeyIncrease));
        assert_eq!(heap.key_of(h), Some(&5));
        assert_eq!(heap.peek(), Some((&2, &"y")));

        // Equal keys are allowed.
        assert_eq!(heap.decrease_key(h, 5), Ok(()));
    }

    #[test]
    fn decrease_key_cuts_and_cascades() {
        let mut heap = FibHeap::new();
        let handles: Vec<_> = (0..32).map(|k| heap.insert(k, k)).collect();
        // Force a consolidation so that real trees exist.
        assert_eq!(heap.extract_min(), Some(0));
        heap.assert_invariants();

        // Cut deep nodes repeatedly so parents get marked and then cut.
        for (i, h) in handles.iter().enumerate().skip(1).rev() {
            if i % 3 == 0 {
                heap.decrease_key(*h, -(i as i32)).unwrap();
                heap.assert_invariants();
            }
        }

        let drained = drain(&mut heap);
        let mut sorted = drained.clone();
        sorted.sort();
        assert_eq!(drained, sorted);
        assert_eq!(drained.len(), 31);
    }

    #[test]
    fn cascading_cut_marks_then_cuts_parent() {
        let mut heap = FibHeap::new();
        for k in 0..9 {
            heap.insert(k * 10, k);
        }
        heap.pop();
        // 8 equal-degree roots consolidate into a single tree of degree 3.
        assert_eq!(heap.ring(heap.min.unwrap()).len(), 1);

        // A non-root node with at least two children.
        let (p, _) = heap
            .arena
            .iter()
            .find(|(_, n)| n.parent.is_some() && n.degree >= 2)
            .expect("degree-3 tree has an interior node of degree 2");
        let children = heap.ring(heap.arena.get(p).child.unwrap());
        let first = heap.arena.handle_of(children[0]);
        let second = heap.arena.handle_of(children[1]);

        // First lost child marks the parent.
        heap.decrease_key(first, -1).unwrap();
        heap.assert_invariants();
        assert!(heap.arena.get(p).marked);
        assert!(heap.arena.get(p).parent.is_some());

        // Second lost child cuts the marked parent to the root list.
        heap.decrease_key(second, -2).unwrap();
        heap.assert_invariants();
        assert!(heap.arena.get(p).parent.is_none());
        assert!(!heap.arena.get(p).marked);
        assert_eq!(heap.peek().map(|(k, _)| *k), Some(-2));

        let drained = drain(&mut heap);
        assert_eq!(drained.len(), 8);
        assert!(drained.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn delete_interior_node() {
        let mut heap = FibHeap::new();
        let handles: Vec<_> = (0..10).map(|k| heap.insert(k, k)).collect();
        heap.pop();

        assert_eq!(heap.delete(handles[5]), Ok(5));
        assert_eq!(heap.delete(handles[5]), Err(HeapError::StaleHandle));
        assert_eq!(heap.len(), 8);
        heap.assert_invariants();
        assert_eq!(drain(&mut heap), vec![1, 2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn stale_handle_after_extract() {
        let mut heap = FibHeap::new();
        let h = heap.insert(1, ());
        heap.pop();
        heap.insert(2, ());
        assert_eq!(heap.decrease_key(h, 0), Err(HeapError::StaleHandle));
        assert_eq!(heap.get(h), None);
    }

    #[test]
    fn max_degree_grows_logarithmically() {
        assert_eq!(max_degree(0), 1);
        assert_eq!(max_degree(1), 1);
        assert!(max_degree(1_000_000) < 32);
    }
}
