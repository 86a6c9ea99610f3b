// src/heap/invariants.rs

//! Full structural audit of a [`FibHeap`].

use crate::heap::FibHeap;

impl<K: Ord, T> FibHeap<K, T> {
    /// Walk the whole structure and panic on the first broken invariant:
    ///
    /// - every sibling ring is symmetric (`x.right.left == x`);
    /// - roots have no parent, children point back at their parent;
    /// - `degree` equals the size of the child ring;
    /// - no child key is smaller than its parent key;
    /// - `min` is the smallest root and `count` matches the live node count.
    ///
    /// O(n); intended for tests and debugging.
    pub fn assert_invariants(&self) {
        assert_eq!(
            self.count,
            self.arena.len(),
            "heap count disagrees with live arena nodes"
        );

        let Some(min) = self.min else {
            assert_eq!(self.count, 0, "empty min pointer on a non-empty heap");
            return;
        };

        let min_key = &self.arena.get(min).key;
        let mut visited = 0;
        let mut stack = Vec::new();

        for root in self.ring(min) {
            let node = self.arena.get(root);
            assert!(node.parent.is_none(), "root {root} has a parent link");
            assert!(
                *min_key <= node.key,
                "min pointer does not reference the smallest root"
            );
            stack.push(root);
        }

        while let Some(x) = stack.pop() {
            visited += 1;
            let node = self.arena.get(x);
            assert_eq!(self.arena.get(node.right).left, x, "asymmetric ring at node {x}");
            assert_eq!(self.arena.get(node.left).right, x, "asymmetric ring at node {x}");

            let children = match node.child {
                Some(c) => self.ring(c),
                None => Vec::new(),
            };
            assert_eq!(
                children.len(),
                node.degree,
                "degree of node {x} disagrees with its child ring"
            );

            for c in children {
                let child = self.arena.get(c);
                assert_eq!(child.parent, Some(x), "child {c} does not point at parent {x}");
                assert!(
                    node.key <= child.key,
                    "heap order violated between {x} and child {c}"
                );
                stack.push(c);
            }
        }

        assert_eq!(visited, self.count, "nodes unreachable from the root list");
    }
}
