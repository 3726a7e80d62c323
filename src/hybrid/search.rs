use crate::{
    hybrid::{dfa::DFA, Cache},
    util::search::MatchKind,
};

/// Return the end of the leftmost-first match at or after `start`.
///
/// The scan runs until the DFA dies or the haystack runs out. Threads that
/// started later than a match have lower priority than it, so once a match
/// is seen only the threads that could extend it survive.
#[inline(never)]
pub(crate) fn find_leftmost_end(
    dfa: &DFA,
    cache: &mut Cache,
    haystack: &[u8],
    start: usize,
) -> Option<usize> {
    find_fwd(dfa, cache, haystack, start, false)
}

/// Return the end of the match beginning exactly at `start`.
#[inline(never)]
pub(crate) fn find_anchored(
    dfa: &DFA,
    cache: &mut Cache,
    haystack: &[u8],
    start: usize,
) -> Option<usize> {
    let end = find_fwd(dfa, cache, haystack, start, true)?;
    if dfa.has_end_anchor() && end != haystack.len() {
        return None;
    }
    Some(end)
}

/// Return the smallest position in `min..=end` at which a match ending at
/// `end` begins. `rev` must match the reverse of the forward pattern.
///
/// Every match the reverse DFA reports is kept, not just the preferred one,
/// so the scan goes back as far as any thread survives.
#[inline(never)]
pub(crate) fn find_leftmost_start(
    rev: &DFA,
    cache: &mut Cache,
    haystack: &[u8],
    min: usize,
    end: usize,
) -> Option<usize> {
    let mut sid = rev.start_state(cache, true, MatchKind::All);
    if sid.is_dead() {
        return None;
    }
    let mut leftmost = if sid.is_match() { Some(end) } else { None };
    let mut at = end;
    while at > min {
        at -= 1;
        sid = rev.next_state(cache, sid, haystack[at]);
        if sid.is_dead() {
            break;
        }
        if sid.is_match() {
            leftmost = Some(at);
        }
    }
    leftmost
}

#[inline(always)]
fn find_fwd(
    dfa: &DFA,
    cache: &mut Cache,
    haystack: &[u8],
    start: usize,
    anchored: bool,
) -> Option<usize> {
    let mut sid = dfa.start_state(cache, anchored, dfa.match_kind());
    if sid.is_dead() {
        return None;
    }
    let mut last_match = if sid.is_match() { Some(start) } else { None };
    for at in start..haystack.len() {
        sid = dfa.next_state(cache, sid, haystack[at]);
        if sid.is_dead() {
            break;
        }
        if sid.is_match() {
            last_match = Some(at + 1);
        }
    }
    last_match
}
