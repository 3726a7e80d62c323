// Search routines for eager DFAs.
//
// Every routine here returns the leftmost match, and at that position the
// longest one. The accelerated routines only apply to shapes where they
// give exactly what the table walk would.

use crate::{
    dfa::automaton::Automaton,
    util::{alphabet::ByteSet, prefilter::Prefilter, search::Match},
};

/// Find the longest match beginning exactly at `start` by walking the
/// transition table one byte at a time.
#[inline]
pub(crate) fn find_fwd_at(
    dfa: &Automaton,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    dfa.longest_match_end(haystack, start).map(|end| Match::new(start, end))
}

/// Find the leftmost match at or after `start` by walking the table from
/// each candidate position.
///
/// When `first` is given, a match can't be empty and must start with one of
/// its bytes, so positions starting with any other byte are skipped. The
/// prefilter, if present, must scan for exactly the bytes in `first`.
pub(crate) fn find_fwd(
    dfa: &Automaton,
    first: Option<&ByteSet>,
    pre: Option<&Prefilter>,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    let mut at = start;
    while at <= haystack.len() {
        if let Some(first) = first {
            at = match pre {
                Some(pre) => pre.find(haystack, at)?.start(),
                None => first.find(haystack, at)?,
            };
        }
        if let Some(m) = find_fwd_at(dfa, haystack, at) {
            return Some(m);
        }
        at += 1;
    }
    None
}

/// Match a literal exactly at `start`.
#[inline]
pub(crate) fn find_literal_at(
    finder: &Prefilter,
    has_end_anchor: bool,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    let end = start + finder.len();
    if !finder.is_prefix(haystack, start)
        || (has_end_anchor && end != haystack.len())
    {
        return None;
    }
    Some(Match::new(start, end))
}

/// Find the first occurrence of a literal at or after `start`.
pub(crate) fn find_literal(
    finder: &Prefilter,
    has_end_anchor: bool,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    if has_end_anchor {
        // Only one occurrence can end at the end of the haystack.
        let at = haystack.len().checked_sub(finder.len())?;
        if at < start {
            return None;
        }
        return find_literal_at(finder, true, haystack, at);
    }
    finder.find(haystack, start)
}

/// Match a run of at least `min` bytes from `set` exactly at `start`.
#[inline]
pub(crate) fn find_run_at(
    set: &ByteSet,
    min: usize,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    if start > haystack.len() {
        return None;
    }
    let len = set.count_run(haystack, start);
    if len < min {
        return None;
    }
    Some(Match::new(start, start + len))
}

/// Find the first run of at least `min` bytes from `set` at or after
/// `start`.
///
/// Runs are maximal, so a run that is too short is skipped as a whole: no
/// position inside it can begin a longer one.
pub(crate) fn find_run(
    set: &ByteSet,
    min: usize,
    haystack: &[u8],
    start: usize,
) -> Option<Match> {
    if min == 0 {
        return find_run_at(set, 0, haystack, start);
    }
    let mut at = start;
    loop {
        at = set.find(haystack, at)?;
        let len = set.count_run(haystack, at);
        if len >= min {
            return Some(Match::new(at, at + len));
        }
        at += len;
    }
}
