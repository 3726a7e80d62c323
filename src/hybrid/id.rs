/// The identifier of a state in a lazy DFA's cache.
///
/// Besides an index into the cache, an ID carries tag bits. The search loop
/// can tell from the ID alone whether a transition leads to a state that
/// hasn't been computed yet, to the dead state, or to a match state, without
/// touching the state itself.
///
/// An ID is only meaningful for the [`Cache`](crate::hybrid::Cache) that
/// handed it out, and only until that cache evicts the state.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord,
)]
pub struct LazyStateID(u32);

impl LazyStateID {
    const MASK_UNKNOWN: u32 = 1 << 31;
    const MASK_DEAD: u32 = 1 << 30;
    const MASK_MATCH: u32 = 1 << 29;
    const MAX: usize = LazyStateID::MASK_MATCH as usize - 1;

    /// Create a new lazy state ID, or return `None` if the index is too big
    /// to be tagged.
    #[inline]
    pub(crate) fn new(index: usize) -> Option<LazyStateID> {
        if index > LazyStateID::MAX {
            return None;
        }
        Some(LazyStateID(index as u32))
    }

    /// The placeholder for a transition that hasn't been computed.
    #[inline]
    pub(crate) const fn unknown() -> LazyStateID {
        LazyStateID(LazyStateID::MASK_UNKNOWN)
    }

    /// The state reached once no NFA thread is left. It has no index.
    #[inline]
    pub(crate) const fn dead() -> LazyStateID {
        LazyStateID(LazyStateID::MASK_DEAD)
    }

    #[inline]
    pub(crate) const fn to_match(self) -> LazyStateID {
        LazyStateID(self.0 | LazyStateID::MASK_MATCH)
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.0 & LazyStateID::MASK_UNKNOWN != 0
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.0 & LazyStateID::MASK_DEAD != 0
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        self.0 & LazyStateID::MASK_MATCH != 0
    }

    /// Returns the index of this state in its cache, with all tags removed.
    #[inline]
    pub(crate) fn as_usize(&self) -> usize {
        (self.0 as usize) & LazyStateID::MAX
    }
}
