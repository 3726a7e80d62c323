/*!
Non-overlapping match iteration shared by every engine.

All engines in this crate report the same sequence of matches for the same
pattern and haystack. That only holds if they agree on how iteration moves
past a match, so the rule lives here instead of in each engine:

1. Search from the current position. If nothing matches, stop.
2. Report the match.
3. If the match was empty, resume one byte past its end. Otherwise resume at
   its end.

Rule 3 means an empty match may immediately follow a non-empty one. For
example, `a*` on `aab` yields `0..2`, `2..2` and `3..3`.
*/

use crate::util::search::Match;

/// A searcher for advancing through all non-overlapping matches in a
/// haystack.
///
/// A `Searcher` isn't itself an iterator. Its [`Searcher::advance`] routine
/// accepts a closure that runs an engine's "find the next match at or after
/// this position" search.
#[derive(Clone, Debug)]
pub struct Searcher {
    haystack_len: usize,
    at: usize,
}

impl Searcher {
    /// Create a new searcher for a haystack of the given length.
    pub fn new(haystack_len: usize) -> Searcher {
        Searcher { haystack_len, at: 0 }
    }

    /// Returns the position the next search will start from.
    pub fn position(&self) -> usize {
        self.at
    }

    /// Find the next match, or return `None` once iteration is done.
    #[inline]
    pub fn advance<F>(&mut self, mut finder: F) -> Option<Match>
    where
        F: FnMut(usize) -> Option<Match>,
    {
        if self.at > self.haystack_len {
            return None;
        }
        let m = match finder(self.at) {
            None => {
                self.at = self.haystack_len + 1;
                return None;
            }
            Some(m) => m,
        };
        debug_assert!(m.start() >= self.at);
        self.at = if m.is_empty() { m.end() + 1 } else { m.end() };
        Some(m)
    }
}

/// Collect every non-overlapping match using the given finder.
pub(crate) fn find_all<F>(haystack: &[u8], mut finder: F) -> Vec<Match>
where
    F: FnMut(usize) -> Option<Match>,
{
    let mut searcher = Searcher::new(haystack.len());
    let mut matches = vec![];
    while let Some(m) = searcher.advance(&mut finder) {
        matches.push(m);
    }
    matches
}
