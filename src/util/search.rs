/*!
Types shared by the search routines of every engine.
*/

use core::ops::Range;

/// A single match in a haystack.
///
/// The group is `0` for an overall match and the capture group index
/// otherwise. Offsets are byte offsets, so `haystack[m.range()]` is the
/// matched text. A match may be empty, in which case `start == end`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Match {
    group: usize,
    start: usize,
    end: usize,
}

impl Match {
    /// Create an overall match (group `0`).
    ///
    /// This panics if `end < start`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Match {
        Match::with_group(0, start, end)
    }

    /// Create a match for the given capture group.
    ///
    /// This panics if `end < start`.
    #[inline]
    pub fn with_group(group: usize, start: usize, end: usize) -> Match {
        assert!(start <= end, "invalid match span {}..{}", start, end);
        Match { group, start, end }
    }

    #[inline]
    pub fn group(&self) -> usize {
        self.group
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl core::fmt::Debug for Match {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.group == 0 {
            write!(f, "Match({:?}..{:?})", self.start, self.end)
        } else {
            write!(
                f,
                "Match(group: {:?}, {:?}..{:?})",
                self.group, self.start, self.end
            )
        }
    }
}

/// The match semantics used when determinizing an NFA.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchKind {
    /// Report the match a backtracking engine would find first. Threads of
    /// lower priority than a matching thread are discarded.
    LeftmostFirst,
    /// Keep every thread alive. This is used when a match must extend to the
    /// end of the haystack anyway, so priority can't change the outcome.
    All,
}

impl Default for MatchKind {
    fn default() -> MatchKind {
        MatchKind::LeftmostFirst
    }
}
