/*!
Fast candidate scanning ahead of an automaton.

A [`Prefilter`] finds the next position where a match could possibly begin
(or the next occurrence of a literal every match must contain) using
`memchr`'s vectorized routines. Engines then only run their automaton from
candidate positions.
*/

use memchr::{memchr, memchr2, memchr3, memmem};

use crate::util::{alphabet::ByteSet, search::Match};

/// A literal or byte set scanner.
#[derive(Clone, Debug)]
pub struct Prefilter {
    kind: Kind,
}

#[derive(Clone, Debug)]
enum Kind {
    Memchr(u8),
    Memchr2(u8, u8),
    Memchr3(u8, u8, u8),
    ByteSet(ByteSet),
    Memmem(memmem::Finder<'static>),
}

impl Prefilter {
    /// Build a prefilter that finds occurrences of the given literal.
    ///
    /// Returns `None` for an empty literal, since it occurs everywhere.
    pub fn from_literal(needle: &[u8]) -> Option<Prefilter> {
        let kind = match needle.len() {
            0 => {
                debug!("prefilter building failed: empty literal");
                return None;
            }
            1 => {
                debug!("prefilter built: memchr");
                Kind::Memchr(needle[0])
            }
            _ => {
                debug!("prefilter built: memmem");
                Kind::Memmem(memmem::Finder::new(needle).into_owned())
            }
        };
        Some(Prefilter { kind })
    }

    /// Build a prefilter that finds any byte in the given set.
    ///
    /// Returns `None` when the set is empty or so large that scanning for it
    /// wouldn't skip anything.
    pub fn from_byteset(set: &ByteSet) -> Option<Prefilter> {
        let mut bytes = set.iter();
        let kind = match set.len() {
            0 => {
                debug!("prefilter building failed: empty byte set");
                return None;
            }
            1 => {
                debug!("prefilter built: memchr");
                Kind::Memchr(bytes.next()?)
            }
            2 => {
                debug!("prefilter built: memchr2");
                Kind::Memchr2(bytes.next()?, bytes.next()?)
            }
            3 => {
                debug!("prefilter built: memchr3");
                Kind::Memchr3(bytes.next()?, bytes.next()?, bytes.next()?)
            }
            n if n <= 128 => {
                debug!("prefilter built: byteset");
                Kind::ByteSet(*set)
            }
            _ => {
                debug!("prefilter building failed: byte set too big");
                return None;
            }
        };
        Some(Prefilter { kind })
    }

    /// Find the next candidate at or after `start`. The span returned covers
    /// the literal occurrence (or the single byte found).
    #[inline]
    pub fn find(&self, haystack: &[u8], start: usize) -> Option<Match> {
        let hay = haystack.get(start..)?;
        let (i, len) = match self.kind {
            Kind::Memchr(b1) => (memchr(b1, hay)?, 1),
            Kind::Memchr2(b1, b2) => (memchr2(b1, b2, hay)?, 1),
            Kind::Memchr3(b1, b2, b3) => (memchr3(b1, b2, b3, hay)?, 1),
            Kind::ByteSet(ref set) => (set.find(hay, 0)?, 1),
            Kind::Memmem(ref finder) => {
                (finder.find(hay)?, finder.needle().len())
            }
        };
        Some(Match::new(start + i, start + i + len))
    }

    /// Returns true if the candidate this prefilter looks for occurs exactly
    /// at `at`.
    #[inline]
    pub fn is_prefix(&self, haystack: &[u8], at: usize) -> bool {
        let hay = match haystack.get(at..) {
            None => return false,
            Some(hay) => hay,
        };
        match self.kind {
            Kind::Memmem(ref finder) => hay.starts_with(finder.needle()),
            _ => hay.first().map_or(false, |&b| self.contains_byte(b)),
        }
    }

    /// Returns the length of the literal this prefilter scans for, or `1`
    /// for byte set scanners.
    pub fn len(&self) -> usize {
        match self.kind {
            Kind::Memmem(ref finder) => finder.needle().len(),
            _ => 1,
        }
    }

    pub fn memory_usage(&self) -> usize {
        match self.kind {
            Kind::Memmem(ref finder) => finder.needle().len(),
            _ => 0,
        }
    }

    fn contains_byte(&self, b: u8) -> bool {
        match self.kind {
            Kind::Memchr(b1) => b == b1,
            Kind::Memchr2(b1, b2) => b == b1 || b == b2,
            Kind::Memchr3(b1, b2, b3) => b == b1 || b == b2 || b == b3,
            Kind::ByteSet(ref set) => set.contains(b),
            Kind::Memmem(ref finder) => finder.needle() == [b],
        }
    }
}
