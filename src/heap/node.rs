// src/heap/node.rs

/// A node of the Fibonacci heap.
///
/// All links are arena indices. `left`/`right` form a circular sibling ring
/// that always contains the node itself; a lone node points to itself on
/// both sides. `child` is the entry point into the ring of children.
#[derive(Debug, Clone)]
pub(crate) struct HeapNode<K, T> {
    pub(crate) key: K,
    pub(crate) value: T,
    /// Number of children currently linked under this node.
    pub(crate) degree: usize,
    /// Set once a non-root node has lost a child since it was last linked.
    pub(crate) marked: bool,
    pub(crate) parent: Option<usize>,
    pub(crate) child: Option<usize>,
    pub(crate) left: usize,
    pub(crate) right: usize,
}

impl<K, T> HeapNode<K, T> {
    /// A singleton ring at `index`.
    pub(crate) fn new(key: K, value: T, index: usize) -> Self {
        Self {
            key,
            value,
            degree: 0,
            marked: false,
            parent: None,
            child: None,
            left: index,
            right: index,
        }
    }

    pub(crate) fn shift(&mut self, offset: usize) {
        self.left += offset;
        self.right += offset;
        self.parent = self.parent.map(|p| p + offset);
        self.child = self.child.map(|c| c + offset);
    }
}
