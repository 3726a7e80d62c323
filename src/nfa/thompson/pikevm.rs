/*!
A Pike VM: a breadth first simulation of a Thompson NFA.

This is the general engine. It handles every pattern the compiler accepts,
reports capture groups and implements leftmost-first match semantics, the
semantics of backtracking engines: among all matches starting at the
leftmost position, the one preferred by the pattern's priorities wins. It is
also the slowest engine, and the router only uses it when nothing else can
do the job.

Search time is `O(m * n)` for an NFA with `m` states and a haystack of
length `n`.
*/

use crate::{
    error::Error,
    nfa::thompson::{compiler::Compiler, nfa::State, nfa::NFA},
    util::{
        captures::Captures, iter, primitives::StateID, search::Match,
        sparse_set::SparseSet,
    },
};

type Slot = Option<usize>;

/// A Pike VM for a single pattern.
#[derive(Clone, Debug)]
pub struct PikeVM {
    nfa: NFA,
}

impl PikeVM {
    /// Parse and compile a pattern with the default NFA configuration.
    pub fn new(pattern: &str) -> Result<PikeVM, Error> {
        Ok(PikeVM::new_from_nfa(Compiler::new().build(pattern)?))
    }

    pub fn new_from_nfa(nfa: NFA) -> PikeVM {
        PikeVM { nfa }
    }

    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    pub fn create_cache(&self) -> Cache {
        Cache::new(&self.nfa)
    }

    /// Create captures with room for every group of this VM's NFA.
    pub fn create_captures(&self) -> Captures {
        Captures::new(self.nfa.group_len())
    }

    pub fn is_match(&self, cache: &mut Cache, haystack: &[u8]) -> bool {
        self.match_next(cache, haystack, 0).is_some()
    }

    /// Return the match that starts exactly at `start`, if any.
    pub fn match_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        let mut caps = Captures::new(1);
        self.captures_at(cache, haystack, start, true, &mut caps);
        caps.get_match()
    }

    /// Return the leftmost-first match at or after `start`, if any.
    pub fn match_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        let mut caps = Captures::new(1);
        self.captures_at(cache, haystack, start, false, &mut caps);
        caps.get_match()
    }

    /// Return every non-overlapping match, from left to right.
    pub fn match_all(&self, cache: &mut Cache, haystack: &[u8]) -> Vec<Match> {
        iter::find_all(haystack, |at| self.match_next(cache, haystack, at))
    }

    /// Run a search beginning at `start` and write the spans of the matching
    /// thread's groups to `caps`. When `anchored` is true, only a match
    /// starting exactly at `start` is reported.
    ///
    /// Only as many groups as `caps` has room for are tracked, so passing
    /// captures with a single group makes this a plain match search.
    pub fn captures_at(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        anchored: bool,
        caps: &mut Captures,
    ) {
        caps.clear();
        if start > haystack.len() {
            return;
        }
        let slot_len = caps.slots().len().min(self.nfa.slot_len());
        cache.clear(&self.nfa);

        // The unanchored prefix in the NFA is implemented here instead: the
        // closure of the anchored start state is added at every position
        // until a match is found. Threads added this way have the lowest
        // priority, which gives the same result as a lazy `(?s:.)*?` loop.
        let start_id = self.nfa.start_anchored();
        let Cache { ref mut stack, ref mut scratch, ref mut clist, ref mut nlist } =
            *cache;
        let scratch = &mut scratch[..slot_len];
        let mut matched = false;
        let mut at = start;
        while at <= haystack.len() {
            if clist.set.is_empty() && (matched || (anchored && at > start)) {
                break;
            }
            if !matched && (!anchored || at == start) {
                self.epsilon_closure(
                    stack, clist, scratch, start_id, haystack, at,
                );
            }
            if self.steps(stack, clist, nlist, haystack, at, slot_len, caps) {
                matched = true;
            }
            at += 1;
            core::mem::swap(clist, nlist);
            nlist.set.clear();
        }
        trace!(
            "PikeVM search from {} (anchored: {}) found {:?}",
            start,
            anchored,
            caps.get_match(),
        );
    }

    /// Advance every thread in `clist` over the byte at `at`. Returns true
    /// if a thread reached a match. Threads with a lower priority than the
    /// matching thread are dropped.
    fn steps(
        &self,
        stack: &mut Vec<FollowEpsilon>,
        clist: &mut Threads,
        nlist: &mut Threads,
        haystack: &[u8],
        at: usize,
        slot_len: usize,
        caps: &mut Captures,
    ) -> bool {
        let mut matched = false;
        let Threads { ref set, caps: ref mut thread_caps, slots_per_thread } =
            *clist;
        for sid in set.iter() {
            let i = sid.as_usize() * slots_per_thread;
            let slots = &mut thread_caps[i..i + slot_len];
            if self.step(stack, nlist, slots, sid, haystack, at) {
                matched = true;
                caps.slots_mut()[..slot_len].copy_from_slice(slots);
                break;
            }
        }
        matched
    }

    /// Follow the transition of `sid` over the byte at `at`, adding the
    /// epsilon closure of its target to `nlist`. Returns true if `sid` is a
    /// match state.
    fn step(
        &self,
        stack: &mut Vec<FollowEpsilon>,
        nlist: &mut Threads,
        thread_caps: &mut [Slot],
        sid: StateID,
        haystack: &[u8],
        at: usize,
    ) -> bool {
        let next = match *self.nfa.state(sid) {
            State::Fail
            | State::Look { .. }
            | State::Union { .. }
            | State::Capture { .. } => return false,
            State::Match => return true,
            State::ByteRange { ref trans } => {
                if !trans.matches(haystack, at) {
                    return false;
                }
                trans.next
            }
            State::Sparse(ref sparse) => match sparse.matches(haystack, at) {
                None => return false,
                Some(next) => next,
            },
        };
        self.epsilon_closure(stack, nlist, thread_caps, next, haystack, at + 1);
        false
    }

    fn epsilon_closure(
        &self,
        stack: &mut Vec<FollowEpsilon>,
        nlist: &mut Threads,
        thread_caps: &mut [Slot],
        sid: StateID,
        haystack: &[u8],
        at: usize,
    ) {
        stack.push(FollowEpsilon::StateID(sid));
        while let Some(frame) = stack.pop() {
            match frame {
                FollowEpsilon::StateID(sid) => {
                    self.epsilon_closure_step(
                        stack,
                        nlist,
                        thread_caps,
                        sid,
                        haystack,
                        at,
                    );
                }
                FollowEpsilon::Capture { slot, pos } => {
                    thread_caps[slot] = pos;
                }
            }
        }
    }

    fn epsilon_closure_step(
        &self,
        stack: &mut Vec<FollowEpsilon>,
        nlist: &mut Threads,
        thread_caps: &mut [Slot],
        mut sid: StateID,
        haystack: &[u8],
        at: usize,
    ) {
        loop {
            if !nlist.set.insert(sid) {
                return;
            }
            match *self.nfa.state(sid) {
                State::Fail
                | State::Match
                | State::ByteRange { .. }
                | State::Sparse { .. } => {
                    let i = sid.as_usize() * nlist.slots_per_thread;
                    nlist.caps[i..i + thread_caps.len()]
                        .copy_from_slice(thread_caps);
                    return;
                }
                State::Look { look, next } => {
                    if !look.matches(haystack, at) {
                        return;
                    }
                    sid = next;
                }
                State::Union { ref alternates } => {
                    sid = match alternates.get(0) {
                        None => return,
                        Some(&sid) => sid,
                    };
                    stack.extend(
                        alternates[1..]
                            .iter()
                            .copied()
                            .rev()
                            .map(FollowEpsilon::StateID),
                    );
                }
                State::Capture { next, slot } => {
                    if slot < thread_caps.len() {
                        stack.push(FollowEpsilon::Capture {
                            slot,
                            pos: thread_caps[slot],
                        });
                        thread_caps[slot] = Some(at);
                    }
                    sid = next;
                }
            }
        }
    }
}

/// Mutable scratch space for a [`PikeVM`] search.
///
/// A cache may only be used with the VM that created it.
#[derive(Clone, Debug)]
pub struct Cache {
    stack: Vec<FollowEpsilon>,
    scratch: Vec<Slot>,
    clist: Threads,
    nlist: Threads,
}

impl Cache {
    pub fn new(nfa: &NFA) -> Cache {
        Cache {
            stack: vec![],
            scratch: vec![None; nfa.slot_len()],
            clist: Threads::new(nfa),
            nlist: Threads::new(nfa),
        }
    }

    pub fn memory_usage(&self) -> usize {
        let slot = core::mem::size_of::<Slot>();
        self.stack.len() * core::mem::size_of::<FollowEpsilon>()
            + self.scratch.len() * slot
            + self.clist.memory_usage()
            + self.nlist.memory_usage()
    }

    fn clear(&mut self, nfa: &NFA) {
        if self.clist.set.capacity() != nfa.len() {
            *self = Cache::new(nfa);
            return;
        }
        self.stack.clear();
        self.clist.set.clear();
        self.nlist.set.clear();
        for slot in self.scratch.iter_mut() {
            *slot = None;
        }
    }
}

/// A set of threads, each with its own copy of the capture slots. The
/// order of insertion into `set` is the thread priority.
#[derive(Clone, Debug)]
struct Threads {
    set: SparseSet,
    caps: Vec<Slot>,
    slots_per_thread: usize,
}

impl Threads {
    fn new(nfa: &NFA) -> Threads {
        Threads {
            set: SparseSet::new(nfa.len()),
            caps: vec![None; nfa.slot_len() * nfa.len()],
            slots_per_thread: nfa.slot_len(),
        }
    }

    fn memory_usage(&self) -> usize {
        self.set.memory_usage() + self.caps.len() * core::mem::size_of::<Slot>()
    }
}

/// A frame on the explicit stack used to compute epsilon closures.
#[derive(Clone, Debug)]
enum FollowEpsilon {
    /// Explore the epsilon closure of this state.
    StateID(StateID),
    /// Restore a capture slot once every state explored after it is done.
    Capture { slot: usize, pos: Slot },
}
