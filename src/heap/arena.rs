// src/heap/arena.rs

//! Generational slot arena backing the heap's node graph.
//!
//! Nodes refer to each other by raw slot index; callers outside the heap hold
//! a [`NodeHandle`], which also carries the slot's generation so that a handle
//! to an extracted node can never alias a node inserted later into the same
//! slot.

/// Stable reference to a node inside a [`crate::heap::FibHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone)]
struct Slot<N> {
    generation: u64,
    value: Option<N>,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<N> {
    slots: Vec<Slot<N>>,
    free: Vec<usize>,
    len: usize,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<N> Arena<N> {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Number of slots, occupied or not.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index the next `insert` will occupy.
    pub(crate) fn vacant_index(&self) -> usize {
        self.free.last().copied().unwrap_or(self.slots.len())
    }

    pub(crate) fn insert(&mut self, value: N) -> NodeHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return NodeHandle {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        NodeHandle {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Resolve a handle to its slot index if the node is still live.
    pub(crate) fn resolve(&self, handle: NodeHandle) -> Option<usize> {
        let slot = self.slots.get(handle.index)?;
        (slot.generation == handle.generation && slot.value.is_some()).then_some(handle.index)
    }

    #[cfg(test)]
    pub(crate) fn handle_of(&self, index: usize) -> NodeHandle {
        NodeHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    pub(crate) fn get(&self, index: usize) -> &N {
        match self.slots.get(index).and_then(|s| s.value.as_ref()) {
            Some(node) => node,
            None => panic!("heap arena slot {index} is vacant but still linked"),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut N {
        match self.slots.get_mut(index).and_then(|s| s.value.as_mut()) {
            Some(node) => node,
            None => panic!("heap arena slot {index} is vacant but still linked"),
        }
    }

    /// Vacate a slot, bumping its generation so outstanding handles go stale.
    pub(crate) fn remove(&mut self, index: usize) -> N {
        let slot = &mut self.slots[index];
        let Some(value) = slot.value.take() else {
            panic!("heap arena slot {index} removed twice");
        };
        slot.generation += 1;
        self.free.push(index);
        self.len -= 1;
        value
    }

    /// Move every slot of `other` to the end of this arena, rewriting the
    /// node-internal indices with `relink`. Returns the index offset applied.
    pub(crate) fn absorb(&mut self, other: Arena<N>, mut relink: impl FnMut(&mut N, usize)) -> usize {
        let offset = self.slots.len();
        self.free.extend(other.free.into_iter().map(|i| i + offset));
        self.len += other.len;
        self.slots.extend(other.slots.into_iter().map(|mut slot| {
            if let Some(node) = slot.value.as_mut() {
                relink(node, offset);
            }
            slot
        }));
        offset
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &N)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|n| (i, n)))
    }
}
