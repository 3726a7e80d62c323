/*!
Lazy DFA states and the determinization steps that produce them.

A lazy DFA state is identified by its [`Signature`]: the ordered set of NFA
states its threads occupy, plus flags. Two states are equal exactly when
their signatures are. The hash is computed once, when the signature is built,
so the cache never rehashes a state set.

Only NFA states that consume input or match are kept in a signature. Epsilon
states are followed when a signature is built and never need to be visited
again.
*/

use std::sync::Arc;

use crate::{
    nfa::thompson::{State, NFA},
    util::{
        fnv, primitives::StateID, search::MatchKind, sparse_set::SparseSet,
    },
};

#[derive(Clone, Debug)]
pub(crate) struct Signature {
    hash: u64,
    flags: u32,
    set: Arc<[StateID]>,
}

impl Signature {
    const FLAG_MATCH: u32 = 1 << 0;
    const FLAG_ALL: u32 = 1 << 1;

    fn new(kind: MatchKind, is_match: bool, set: Vec<StateID>) -> Signature {
        let mut flags = 0;
        if is_match {
            flags |= Signature::FLAG_MATCH;
        }
        if kind == MatchKind::All {
            flags |= Signature::FLAG_ALL;
        }
        let hash = fnv::hash_states(flags, &set);
        Signature { hash, flags, set: Arc::from(set) }
    }

    pub(crate) fn is_match(&self) -> bool {
        self.flags & Signature::FLAG_MATCH != 0
    }

    /// Returns true if no thread is alive in this state.
    pub(crate) fn is_dead(&self) -> bool {
        self.set.is_empty()
    }

    pub(crate) fn kind(&self) -> MatchKind {
        if self.flags & Signature::FLAG_ALL != 0 {
            MatchKind::All
        } else {
            MatchKind::LeftmostFirst
        }
    }

    pub(crate) fn states(&self) -> &[StateID] {
        &self.set
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.set.len() * core::mem::size_of::<StateID>()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Signature) -> bool {
        self.hash == other.hash
            && self.flags == other.flags
            && self.set == other.set
    }
}

impl Eq for Signature {}

impl core::hash::Hash for Signature {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Compute the signature of the start state.
pub(crate) fn start(
    nfa: &NFA,
    anchored: bool,
    kind: MatchKind,
    stack: &mut Vec<StateID>,
    set: &mut SparseSet,
) -> Signature {
    let start =
        if anchored { nfa.start_anchored() } else { nfa.start_unanchored() };
    set.clear();
    epsilon_closure(nfa, start, kind, stack, set);
    signature(nfa, kind, set)
}

/// Compute the signature reached from `current` on `byte`.
///
/// Threads are advanced in priority order. Under leftmost-first semantics,
/// every thread of lower priority than the first one to reach a match is
/// discarded.
pub(crate) fn next(
    nfa: &NFA,
    current: &Signature,
    byte: u8,
    stack: &mut Vec<StateID>,
    set: &mut SparseSet,
) -> Signature {
    let kind = current.kind();
    set.clear();
    for &sid in current.states() {
        let next = match *nfa.state(sid) {
            State::ByteRange { ref trans } if trans.matches_byte(byte) => {
                Some(trans.next)
            }
            State::Sparse(ref sparse) => sparse.matches_byte(byte),
            _ => None,
        };
        if let Some(next) = next {
            if epsilon_closure(nfa, next, kind, stack, set) {
                break;
            }
        }
    }
    signature(nfa, kind, set)
}

/// Add every state reachable from `start` through epsilon transitions to
/// `set`, in priority order. Returns true if a match state was reached and
/// the match kind says nothing after it matters.
fn epsilon_closure(
    nfa: &NFA,
    start: StateID,
    kind: MatchKind,
    stack: &mut Vec<StateID>,
    set: &mut SparseSet,
) -> bool {
    stack.clear();
    stack.push(start);
    while let Some(mut id) = stack.pop() {
        loop {
            if !set.insert(id) {
                break;
            }
            match *nfa.state(id) {
                State::ByteRange { .. }
                | State::Sparse(_)
                | State::Look { .. }
                | State::Fail => break,
                State::Match => {
                    if kind == MatchKind::LeftmostFirst {
                        stack.clear();
                        return true;
                    }
                    break;
                }
                State::Capture { next, .. } => {
                    id = next;
                }
                State::Union { ref alternates } => {
                    id = match alternates.first() {
                        None => break,
                        Some(&id) => id,
                    };
                    stack.extend(alternates[1..].iter().rev());
                }
            }
        }
    }
    false
}

fn signature(nfa: &NFA, kind: MatchKind, set: &SparseSet) -> Signature {
    let mut is_match = false;
    let mut states = Vec::with_capacity(set.len());
    for sid in set.iter() {
        match *nfa.state(sid) {
            State::ByteRange { .. } | State::Sparse(_) => states.push(sid),
            State::Match => {
                is_match = true;
                states.push(sid);
            }
            _ => {}
        }
    }
    Signature::new(kind, is_match, states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::thompson::Compiler;

    fn closure(pattern: &str, kind: MatchKind) -> Signature {
        let nfa = Compiler::new().build(pattern).unwrap();
        let mut set = SparseSet::new(nfa.len());
        start(&nfa, true, kind, &mut vec![], &mut set)
    }

    #[test]
    fn leftmost_first_truncates() {
        // The lazy loop puts the match state ahead of the `a` thread.
        let sig = closure("a*?", MatchKind::LeftmostFirst);
        assert!(sig.is_match());
        assert_eq!(1, sig.states().len());

        let sig = closure("a*?", MatchKind::All);
        assert!(sig.is_match());
        assert_eq!(2, sig.states().len());

        let sig = closure("a*", MatchKind::LeftmostFirst);
        assert!(sig.is_match());
        assert_eq!(2, sig.states().len());
    }

    #[test]
    fn equality_is_structural() {
        let a = closure("a|b", MatchKind::LeftmostFirst);
        let b = closure("a|b", MatchKind::LeftmostFirst);
        assert_eq!(a, b);
        assert_ne!(a, closure("a|b", MatchKind::All));
    }

    #[test]
    fn dead_after_mismatch() {
        let nfa = Compiler::new().build("ab").unwrap();
        let mut set = SparseSet::new(nfa.len());
        let mut stack = vec![];
        let s = start(&nfa, true, MatchKind::LeftmostFirst, &mut stack, &mut set);
        let s = next(&nfa, &s, b'a', &mut stack, &mut set);
        assert!(!s.is_dead() && !s.is_match());
        let s2 = next(&nfa, &s, b'x', &mut stack, &mut set);
        assert!(s2.is_dead());
        let s3 = next(&nfa, &s, b'b', &mut stack, &mut set);
        assert!(s3.is_match());
    }
}
