/*!
Identifier types shared by every automaton in this crate.

A [`StateID`] is a `u32` under the hood, which keeps transition tables
compact. Each engine interprets the value differently: the eager DFA and the
one-pass DFA use it as an index into their state lists, while the Thompson
NFA uses it to index its state graph.
*/

use core::fmt;

/// The identifier of a state in an automaton.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID(u32);

impl StateID {
    /// The maximum state identifier.
    pub const MAX: StateID = StateID(i32::MAX as u32 - 1);

    /// The total number of identifiers that can be represented.
    pub const LIMIT: usize = StateID::MAX.as_usize() + 1;

    /// The zero identifier.
    pub const ZERO: StateID = StateID(0);

    /// Create a new state identifier, or return an error if the value
    /// exceeds [`StateID::MAX`].
    #[inline]
    pub fn new(id: usize) -> Result<StateID, StateIDError> {
        if id > StateID::MAX.as_usize() {
            return Err(StateIDError { attempted: id as u64 });
        }
        Ok(StateID::new_unchecked(id))
    }

    /// Create a new state identifier without checking it against the
    /// maximum. An out of range value leads to panics or wrong results, but
    /// never to undefined behavior.
    #[inline]
    pub const fn new_unchecked(id: usize) -> StateID {
        StateID(id as u32)
    }

    /// Like `new`, but panics if the given value is not valid.
    #[inline]
    pub fn must(id: usize) -> StateID {
        StateID::new(id).expect("invalid state ID value")
    }

    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl<T> core::ops::Index<StateID> for [T] {
    type Output = T;

    #[inline]
    fn index(&self, index: StateID) -> &T {
        &self[index.as_usize()]
    }
}

impl<T> core::ops::IndexMut<StateID> for [T] {
    #[inline]
    fn index_mut(&mut self, index: StateID) -> &mut T {
        &mut self[index.as_usize()]
    }
}

impl<T> core::ops::Index<StateID> for Vec<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: StateID) -> &T {
        &self[index.as_usize()]
    }
}

impl<T> core::ops::IndexMut<StateID> for Vec<T> {
    #[inline]
    fn index_mut(&mut self, index: StateID) -> &mut T {
        &mut self[index.as_usize()]
    }
}

/// The error returned when an identifier would exceed [`StateID::MAX`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateIDError {
    attempted: u64,
}

impl StateIDError {
    /// Returns the value that could not be converted.
    pub fn attempted(&self) -> u64 {
        self.attempted
    }
}

impl std::error::Error for StateIDError {}

impl fmt::Display for StateIDError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to create state ID from {:?}, which exceeds {:?}",
            self.attempted,
            StateID::MAX,
        )
    }
}
