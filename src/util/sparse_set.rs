/*!
Sparse sets of state identifiers.

Every NFA simulation in this crate (the PikeVM, lazy DFA determinization and
one-pass DFA construction) tracks the states it has already visited in one of
these. Insertion, membership and clearing are all constant time, and
iteration yields states in insertion order. That last property is what lets
the sets double as priority-ordered thread lists.

The layout follows https://research.swtch.com/sparse, except that both
vectors are zero-initialized up front instead of relying on uninitialized
memory.
*/

use crate::util::primitives::StateID;

/// A pair of sparse sets, typically the current and next state sets of an
/// NFA simulation.
///
/// The fields are public so that callers can borrow each set on its own.
#[derive(Clone, Debug)]
pub(crate) struct SparseSets {
    pub(crate) set1: SparseSet,
    pub(crate) set2: SparseSet,
}

impl SparseSets {
    pub(crate) fn new(capacity: usize) -> SparseSets {
        SparseSets {
            set1: SparseSet::new(capacity),
            set2: SparseSet::new(capacity),
        }
    }

    /// Swap set1 with set2.
    pub(crate) fn swap(&mut self) {
        core::mem::swap(&mut self.set1, &mut self.set2);
    }

    pub(crate) fn clear(&mut self) {
        self.set1.clear();
        self.set2.clear();
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.set1.memory_usage() + self.set2.memory_usage()
    }
}

/// A fixed capacity set of state identifiers that remembers insertion order.
#[derive(Clone)]
pub(crate) struct SparseSet {
    /// The number of elements currently in this set.
    len: usize,
    /// The members, in insertion order.
    dense: Vec<StateID>,
    /// Maps a member to its position in `dense`. A state is a member if and
    /// only if sparse[id] < len && dense[sparse[id]] == id.
    sparse: Vec<StateID>,
}

impl SparseSet {
    /// Create a new sparse set that can hold the identifiers
    /// `0..capacity`.
    ///
    /// This panics if the capacity given is bigger than `StateID::LIMIT`.
    pub(crate) fn new(capacity: usize) -> SparseSet {
        assert!(
            capacity <= StateID::LIMIT,
            "sparse set capacity cannot exceed {:?}",
            StateID::LIMIT
        );
        SparseSet {
            len: 0,
            dense: vec![StateID::ZERO; capacity],
            sparse: vec![StateID::ZERO; capacity],
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert the given state and return true if it was not already a
    /// member.
    ///
    /// Panics when the state is outside of this set's capacity.
    #[inline(always)]
    pub(crate) fn insert(&mut self, id: StateID) -> bool {
        if self.contains(id) {
            return false;
        }
        let i = self.len;
        assert!(
            i < self.capacity(),
            "{:?} exceeds capacity of {:?} when inserting {:?}",
            i,
            self.capacity(),
            id,
        );
        self.dense[i] = id;
        self.sparse[id] = StateID::new_unchecked(i);
        self.len += 1;
        true
    }

    #[inline]
    pub(crate) fn contains(&self, id: StateID) -> bool {
        let i = self.sparse[id];
        i.as_usize() < self.len && self.dense[i] == id
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns the members of this set in insertion order.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[StateID] {
        &self.dense[..self.len]
    }

    pub(crate) fn iter(&self) -> core::iter::Copied<core::slice::Iter<'_, StateID>> {
        self.as_slice().iter().copied()
    }

    pub(crate) fn memory_usage(&self) -> usize {
        2 * self.dense.len() * core::mem::size_of::<StateID>()
    }
}

impl core::fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("SparseSet").field(&self.as_slice()).finish()
    }
}
