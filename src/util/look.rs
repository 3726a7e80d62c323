/*!
Zero-width assertions.

The engines that can evaluate assertions (the PikeVM and the one-pass DFA)
check them against the haystack at a position. The eager and lazy DFAs only
accept the two boundary anchors, which they strip off up front and handle in
their search loops.
*/

use crate::util::alphabet::ByteClassSet;

/// A look-around assertion.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Look {
    /// Matches only at position `0`.
    Start = 1 << 0,
    /// Matches only at position `haystack.len()`.
    End = 1 << 1,
    /// Matches at position `0` or just after a `\n`.
    StartLine = 1 << 2,
    /// Matches at `haystack.len()` or just before a `\n`.
    EndLine = 1 << 3,
    /// An ASCII word boundary, `\b`.
    WordBoundary = 1 << 4,
    /// The negation of an ASCII word boundary, `\B`.
    WordBoundaryNegate = 1 << 5,
}

impl Look {
    #[inline]
    pub const fn as_repr(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Look::Start => 'A',
            Look::End => 'z',
            Look::StartLine => '^',
            Look::EndLine => '$',
            Look::WordBoundary => 'b',
            Look::WordBoundaryNegate => 'B',
        }
    }

    /// The assertion that holds at the same position once the haystack is
    /// reversed.
    #[inline]
    pub const fn reversed(self) -> Look {
        match self {
            Look::Start => Look::End,
            Look::End => Look::Start,
            Look::StartLine => Look::EndLine,
            Look::EndLine => Look::StartLine,
            Look::WordBoundary => Look::WordBoundary,
            Look::WordBoundaryNegate => Look::WordBoundaryNegate,
        }
    }

    /// Returns true when the position `at` in `haystack` satisfies this
    /// assertion.
    ///
    /// This panics if `at > haystack.len()`.
    #[inline]
    pub fn matches(self, haystack: &[u8], at: usize) -> bool {
        match self {
            Look::Start => at == 0,
            Look::End => at == haystack.len(),
            Look::StartLine => at == 0 || haystack[at - 1] == b'\n',
            Look::EndLine => {
                at == haystack.len() || haystack[at] == b'\n'
            }
            Look::WordBoundary => {
                is_word_before(haystack, at) != is_word_after(haystack, at)
            }
            Look::WordBoundaryNegate => {
                is_word_before(haystack, at) == is_word_after(haystack, at)
            }
        }
    }

    /// Split the given byte classes so that no class straddles a byte this
    /// assertion can tell apart.
    pub(crate) fn add_to_byteset(self, set: &mut ByteClassSet) {
        match self {
            Look::Start | Look::End => {}
            Look::StartLine | Look::EndLine => set.set_range(b'\n', b'\n'),
            Look::WordBoundary | Look::WordBoundaryNegate => {
                set.set_range(b'0', b'9');
                set.set_range(b'A', b'Z');
                set.set_range(b'_', b'_');
                set.set_range(b'a', b'z');
            }
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

fn is_word_before(haystack: &[u8], at: usize) -> bool {
    at > 0 && is_word_byte(haystack[at - 1])
}

fn is_word_after(haystack: &[u8], at: usize) -> bool {
    at < haystack.len() && is_word_byte(haystack[at])
}

/// A set of look-around assertions, stored as a bitset.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct LookSet {
    bits: u8,
}

impl LookSet {
    #[inline]
    pub fn empty() -> LookSet {
        LookSet { bits: 0 }
    }

    #[inline]
    pub fn singleton(look: Look) -> LookSet {
        LookSet { bits: look.as_repr() }
    }

    #[inline]
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn contains(self, look: Look) -> bool {
        self.bits & look.as_repr() != 0
    }

    #[inline]
    pub fn insert(self, look: Look) -> LookSet {
        LookSet { bits: self.bits | look.as_repr() }
    }

    #[inline]
    pub fn union(self, other: LookSet) -> LookSet {
        LookSet { bits: self.bits | other.bits }
    }

    pub fn iter(self) -> impl Iterator<Item = Look> {
        [
            Look::Start,
            Look::End,
            Look::StartLine,
            Look::EndLine,
            Look::WordBoundary,
            Look::WordBoundaryNegate,
        ]
        .into_iter()
        .filter(move |&look| self.contains(look))
    }

    /// Returns true if every assertion in this set holds at `at`.
    #[inline]
    pub fn matches(self, haystack: &[u8], at: usize) -> bool {
        self.is_empty() || self.iter().all(|look| look.matches(haystack, at))
    }
}

impl core::fmt::Debug for LookSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        for look in self.iter() {
            write!(f, "{}", look.as_char())?;
        }
        Ok(())
    }
}
