/// An error that occurs when a lazy DFA's cache has no room for another
/// state.
///
/// This error never reaches callers of a search. The search responds to it
/// by evicting the least recently used states and trying again, which is
/// always possible since the capacity is at least one state.
#[derive(Clone, Debug)]
pub struct CacheError {
    capacity: usize,
}

impl CacheError {
    pub(crate) fn capacity_exceeded(capacity: usize) -> CacheError {
        CacheError { capacity }
    }

    /// The capacity of the cache that was full.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::error::Error for CacheError {}

impl core::fmt::Display for CacheError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "lazy DFA cache capacity of {} states exceeded",
            self.capacity,
        )
    }
}
