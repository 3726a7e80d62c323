/*!
A lazy DFA: a DFA whose states are built during the search, as they are
first needed, and kept in a bounded cache.

Building every state of a DFA up front can take exponential time and space.
A lazy DFA only ever builds the states a search actually visits, which is at
most one new state per byte of haystack. When the cache fills up, the least
recently used states are evicted and rebuilt if they're needed again. The
capacity only affects speed. Every capacity, down to a single state, reports
the same matches.

The DFA's states are computed from a Thompson NFA compiled without capture
states. Only leading `^` and trailing `$` assertions are supported. Both are
handled by the search itself, outside of the automaton.

An unanchored search runs in two passes, each linear in the haystack. A
forward scan finds where the leftmost match ends, and a second lazy DFA, built
from the reversed pattern, scans backwards from there to find where it
begins.
*/

use crate::{
    error::Error,
    hybrid::{
        error::CacheError,
        id::LazyStateID,
        search,
        state::{self, Signature},
    },
    nfa::thompson::{self, NFA},
    syntax::Ast,
    util::{
        fnv::HashMap, iter, primitives::StateID, search::Match,
        search::MatchKind, sparse_set::SparseSet,
    },
};

const DEFAULT_CACHE_CAPACITY: usize = 512;
const DEFAULT_EVICTION_BATCH_SIZE: usize = 16;

/// The largest number of states a lazy DFA's cache may hold.
pub const MAX_CACHE_CAPACITY: usize = 8192;

/// The configuration of a lazy DFA.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    cache_capacity: Option<usize>,
    eviction_batch_size: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the maximum number of states held in a cache. The value is
    /// clamped to `1..=8192`.
    pub fn cache_capacity(mut self, capacity: usize) -> Config {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Set how far past the least recently used state eviction reaches.
    ///
    /// When the cache is full, every state whose last access is within this
    /// many clock ticks of the oldest access is evicted at once.
    pub fn eviction_batch_size(mut self, size: usize) -> Config {
        self.eviction_batch_size = Some(size);
        self
    }

    pub fn get_cache_capacity(&self) -> usize {
        self.cache_capacity
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
            .clamp(1, MAX_CACHE_CAPACITY)
    }

    pub fn get_eviction_batch_size(&self) -> usize {
        self.eviction_batch_size.unwrap_or(DEFAULT_EVICTION_BATCH_SIZE)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            cache_capacity: o.cache_capacity.or(self.cache_capacity),
            eviction_batch_size: o
                .eviction_batch_size
                .or(self.eviction_batch_size),
        }
    }
}

/// A builder for a lazy [`DFA`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
    thompson: thompson::Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    /// Set the configuration of the NFA the DFA's states are computed from.
    /// Capture states are never compiled, whatever this says.
    pub fn thompson(&mut self, config: thompson::Config) -> &mut Builder {
        self.thompson = self.thompson.overwrite(config);
        self
    }

    pub fn build(&self, pattern: &str) -> Result<DFA, Error> {
        self.build_from_ast(&Ast::parse(pattern)?)
    }

    pub fn build_from_ast(&self, ast: &Ast) -> Result<DFA, Error> {
        let (has_start_anchor, ast, has_end_anchor) = ast.strip_anchors();
        if !ast.look_set().is_empty() {
            return Err(Error::rejected(
                "lazy DFA only supports a leading ^ and a trailing $",
            ));
        }
        let nfa = thompson::Compiler::new()
            .configure(self.thompson.captures(false).reverse(false))
            .build_from_ast(&ast)?;
        // A search anchored at the start never has to look for where a
        // match begins.
        let rev = if has_start_anchor {
            None
        } else {
            let nfa = thompson::Compiler::new()
                .configure(self.thompson.captures(false).reverse(true))
                .build_from_ast(&ast)?;
            Some(Box::new(DFA {
                config: self.config,
                nfa,
                has_start_anchor: has_end_anchor,
                has_end_anchor: has_start_anchor,
                rev: None,
            }))
        };
        debug!(
            "built lazy DFA over an NFA with {} states, cache capacity {}",
            nfa.len(),
            self.config.get_cache_capacity(),
        );
        Ok(DFA {
            config: self.config,
            nfa,
            has_start_anchor,
            has_end_anchor,
            rev,
        })
    }
}

/// A lazy DFA.
///
/// The DFA itself is immutable and can be shared between threads. All
/// mutable state lives in a [`Cache`], which each search borrows exclusively.
#[derive(Clone, Debug)]
pub struct DFA {
    config: Config,
    nfa: NFA,
    has_start_anchor: bool,
    has_end_anchor: bool,
    /// Matches the reverse of what this DFA matches.
    rev: Option<Box<DFA>>,
}

impl DFA {
    /// Parse and compile a pattern into a lazy DFA with a default
    /// configuration.
    pub fn new(pattern: &str) -> Result<DFA, Error> {
        DFA::builder().build(pattern)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn create_cache(&self) -> Cache {
        Cache::new(self)
    }

    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_start_anchor(&self) -> bool {
        self.has_start_anchor
    }

    pub fn has_end_anchor(&self) -> bool {
        self.has_end_anchor
    }

    /// The DFA for the reversed pattern, used to find where matches begin.
    /// Patterns with a leading `^` don't have one.
    pub fn reverse(&self) -> Option<&DFA> {
        self.rev.as_deref()
    }

    /// Return the start state for an anchored or unanchored search.
    pub fn start_state(
        &self,
        cache: &mut Cache,
        anchored: bool,
        kind: MatchKind,
    ) -> LazyStateID {
        let index = (usize::from(anchored) << 1)
            | usize::from(kind == MatchKind::All);
        let sid = cache.starts[index];
        if !sid.is_unknown() {
            cache.stats.hits += 1;
            cache.touch(sid);
            return sid;
        }
        let sig = state::start(
            &self.nfa,
            anchored,
            kind,
            &mut cache.stack,
            &mut cache.set,
        );
        let sid = cache.get_or_insert(sig);
        cache.starts[index] = sid;
        sid
    }

    /// Return the state reached from `current` on `byte`.
    ///
    /// `current` should have been returned by this cache since its last
    /// eviction. The dead state, and any state the cache no longer holds,
    /// lead to the dead state.
    #[inline]
    pub fn next_state(
        &self,
        cache: &mut Cache,
        current: LazyStateID,
        byte: u8,
    ) -> LazyStateID {
        if current.is_dead() || current.is_unknown() {
            return LazyStateID::dead();
        }
        let class = usize::from(self.nfa.byte_classes().get(byte));
        let next = cache.transition(current, class);
        if !next.is_unknown() {
            cache.stats.hits += 1;
            cache.touch(next);
            return next;
        }
        let current_sig = match cache.signature(current) {
            Some(sig) => sig,
            None => {
                trace!("lazy DFA state {:?} is not cached", current);
                return LazyStateID::dead();
            }
        };
        let sig = state::next(
            &self.nfa,
            &current_sig,
            byte,
            &mut cache.stack,
            &mut cache.set,
        );
        let epoch = cache.epoch;
        let next = cache.get_or_insert(sig);
        // An eviction may have taken `current` with it, and its slot may
        // already belong to `next`.
        if cache.epoch == epoch {
            cache.set_transition(current, class, next);
        }
        next
    }

    /// Return the match beginning exactly at `start`, if one exists.
    pub fn match_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if start > haystack.len() || (self.has_start_anchor && start != 0) {
            return None;
        }
        let end = search::find_anchored(self, cache, haystack, start)?;
        Some(Match::new(start, end))
    }

    /// Return the leftmost match beginning at or after `start`.
    pub fn match_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if start > haystack.len() {
            return None;
        }
        if self.has_start_anchor {
            return if start == 0 {
                self.match_first(cache, haystack, start)
            } else {
                None
            };
        }
        // With a trailing `$` the end is known, and the reverse scan alone
        // decides whether there is a match.
        let end = if self.has_end_anchor {
            haystack.len()
        } else {
            search::find_leftmost_end(self, cache, haystack, start)?
        };
        let (rev, rev_cache) = match (self.rev.as_deref(), cache.rev.as_mut()) {
            (Some(rev), Some(rev_cache)) => (rev, rev_cache),
            _ => return None,
        };
        let begin =
            search::find_leftmost_start(rev, rev_cache, haystack, start, end)?;
        Some(Match::new(begin, end))
    }

    pub fn match_all(&self, cache: &mut Cache, haystack: &[u8]) -> Vec<Match> {
        iter::find_all(haystack, |at| self.match_next(cache, haystack, at))
    }

    /// The match semantics searches with this DFA use. A trailing `$` fixes
    /// where a match ends, so thread priority can't change the result.
    pub(crate) fn match_kind(&self) -> MatchKind {
        if self.has_end_anchor {
            MatchKind::All
        } else {
            MatchKind::LeftmostFirst
        }
    }
}

/// Counters describing how well a [`Cache`] has served its searches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) evictions: u64,
}

impl Stats {
    /// The number of times a state was found in the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// The number of times a state had to be built.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// The number of states evicted to make room for new ones.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub(crate) fn add(&mut self, o: &Stats) {
        self.hits += o.hits;
        self.misses += o.misses;
        self.evictions += o.evictions;
    }
}

/// The mutable state of a lazy DFA search: built states, their transitions
/// and the bookkeeping for evicting them.
#[derive(Clone, Debug)]
pub struct Cache {
    /// Cached states, indexed by `LazyStateID`. Evicted slots are `None`
    /// until they're reused.
    states: Vec<Option<CachedState>>,
    free: Vec<usize>,
    map: HashMap<Signature, LazyStateID>,
    /// Start states, indexed by anchoring and match kind.
    starts: [LazyStateID; 4],
    capacity: usize,
    eviction_batch_size: usize,
    alphabet_len: usize,
    clock: u64,
    /// Incremented by every eviction, so that IDs held across an insertion
    /// can be checked for staleness.
    epoch: u64,
    stack: Vec<StateID>,
    set: SparseSet,
    stats: Stats,
    /// The cache of the reverse DFA.
    rev: Option<Box<Cache>>,
}

#[derive(Clone, Debug)]
struct CachedState {
    sig: Signature,
    trans: Box<[LazyStateID]>,
    access_count: u64,
    last_access: u64,
}

impl Cache {
    pub fn new(dfa: &DFA) -> Cache {
        Cache {
            states: vec![],
            free: vec![],
            map: HashMap::default(),
            starts: [LazyStateID::unknown(); 4],
            capacity: dfa.config.get_cache_capacity(),
            eviction_batch_size: dfa.config.get_eviction_batch_size(),
            alphabet_len: dfa.nfa.byte_classes().alphabet_len(),
            clock: 0,
            epoch: 0,
            stack: vec![],
            set: SparseSet::new(dfa.nfa.len()),
            stats: Stats::default(),
            rev: dfa.rev.as_deref().map(|rev| Box::new(Cache::new(rev))),
        }
    }

    /// The number of states currently cached, in both directions.
    pub fn len(&self) -> usize {
        self.map.len() + self.rev.as_ref().map_or(0, |rev| rev.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of states each direction may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> Stats {
        let mut stats = self.stats;
        if let Some(ref rev) = self.rev {
            stats.add(&rev.stats());
        }
        stats
    }

    /// Drop every cached state. The statistics are kept.
    pub fn clear(&mut self) {
        self.states.clear();
        self.free.clear();
        self.map.clear();
        self.starts = [LazyStateID::unknown(); 4];
        self.epoch += 1;
        if let Some(ref mut rev) = self.rev {
            rev.clear();
        }
    }

    pub fn memory_usage(&self) -> usize {
        use core::mem::size_of;

        let per_state = size_of::<Option<CachedState>>()
            + size_of::<(Signature, LazyStateID)>()
            + self.alphabet_len * size_of::<LazyStateID>();
        let sets: usize = self
            .states
            .iter()
            .flatten()
            .map(|state| state.sig.memory_usage())
            .sum();
        self.states.len() * per_state
            + sets
            + self.stack.capacity() * size_of::<StateID>()
            + self.set.memory_usage()
            + self.rev.as_ref().map_or(0, |rev| rev.memory_usage())
    }

    fn get_or_insert(&mut self, sig: Signature) -> LazyStateID {
        if sig.is_dead() {
            return LazyStateID::dead();
        }
        if let Some(&sid) = self.map.get(&sig) {
            self.stats.hits += 1;
            self.touch(sid);
            return sid;
        }
        self.stats.misses += 1;
        loop {
            match self.insert(&sig) {
                Ok(sid) => return sid,
                Err(_err) => {
                    trace!("{}, evicting", _err);
                    self.evict();
                }
            }
        }
    }

    fn insert(&mut self, sig: &Signature) -> Result<LazyStateID, CacheError> {
        if self.map.len() >= self.capacity {
            return Err(CacheError::capacity_exceeded(self.capacity));
        }
        let index = self.free.pop().unwrap_or(self.states.len());
        let mut sid = LazyStateID::new(index)
            .ok_or_else(|| CacheError::capacity_exceeded(self.capacity))?;
        if sig.is_match() {
            sid = sid.to_match();
        }
        self.clock += 1;
        let state = CachedState {
            sig: sig.clone(),
            trans: vec![LazyStateID::unknown(); self.alphabet_len]
                .into_boxed_slice(),
            access_count: 1,
            last_access: self.clock,
        };
        if index == self.states.len() {
            self.states.push(Some(state));
        } else {
            self.states[index] = Some(state);
        }
        self.map.insert(sig.clone(), sid);
        Ok(sid)
    }

    /// Evict the least recently used states: every state last accessed
    /// within the eviction batch size of the oldest access.
    fn evict(&mut self) {
        let oldest = self
            .states
            .iter()
            .flatten()
            .map(|state| state.last_access)
            .min();
        let cutoff = match oldest {
            None => return,
            Some(oldest) => {
                oldest.saturating_add(self.eviction_batch_size as u64)
            }
        };
        let mut evicted = 0;
        let mut gone = vec![false; self.states.len()];
        for (index, slot) in self.states.iter_mut().enumerate() {
            let expired =
                slot.as_ref().map_or(false, |s| s.last_access <= cutoff);
            if !expired {
                continue;
            }
            if let Some(state) = slot.take() {
                self.map.remove(&state.sig);
                self.free.push(index);
                gone[index] = true;
                evicted += 1;
            }
        }
        // Surviving states may still point at evicted ones.
        for state in self.states.iter_mut().flatten() {
            for next in state.trans.iter_mut() {
                if !next.is_unknown() && !next.is_dead() && gone[next.as_usize()]
                {
                    *next = LazyStateID::unknown();
                }
            }
        }
        self.starts = [LazyStateID::unknown(); 4];
        self.epoch += 1;
        self.stats.evictions += evicted;
        trace!("evicted {} lazy DFA states, {} remain", evicted, self.len());
    }

    #[inline]
    fn touch(&mut self, sid: LazyStateID) {
        if sid.is_dead() {
            return;
        }
        self.clock += 1;
        if let Some(Some(ref mut state)) = self.states.get_mut(sid.as_usize())
        {
            state.access_count += 1;
            state.last_access = self.clock;
        }
    }

    #[inline]
    fn transition(&self, current: LazyStateID, class: usize) -> LazyStateID {
        match self.states.get(current.as_usize()) {
            Some(Some(ref state)) => state.trans[class],
            _ => LazyStateID::unknown(),
        }
    }

    fn set_transition(
        &mut self,
        current: LazyStateID,
        class: usize,
        next: LazyStateID,
    ) {
        if let Some(Some(ref mut state)) =
            self.states.get_mut(current.as_usize())
        {
            state.trans[class] = next;
        }
    }

    fn signature(&self, sid: LazyStateID) -> Option<Signature> {
        match self.states.get(sid.as_usize()) {
            Some(Some(ref state)) => Some(state.sig.clone()),
            _ => None,
        }
    }

    #[cfg(test)]
    fn access_count(&self, sid: LazyStateID) -> u64 {
        self.states[sid.as_usize()].as_ref().map_or(0, |s| s.access_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_all(dfa: &DFA, haystack: &str) -> Vec<(usize, usize)> {
        let mut cache = dfa.create_cache();
        dfa.match_all(&mut cache, haystack.as_bytes())
            .into_iter()
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn leftmost_first() {
        let dfa = DFA::new("samwise|sam").unwrap();
        assert_eq!(find_all(&dfa, "samwise sam"), vec![(0, 7), (8, 11)]);
        let dfa = DFA::new("sam|samwise").unwrap();
        assert_eq!(find_all(&dfa, "samwise"), vec![(0, 3)]);
        let dfa = DFA::new("a+?").unwrap();
        assert_eq!(find_all(&dfa, "aaa"), vec![(0, 1), (1, 2), (2, 3)]);
        let dfa = DFA::new(r"\w+\s+\w+").unwrap();
        assert_eq!(find_all(&dfa, "  foo   bar baz"), vec![(2, 11)]);
    }

    #[test]
    fn anchors() {
        let dfa = DFA::new("^abc$").unwrap();
        assert_eq!(find_all(&dfa, "abc"), vec![(0, 3)]);
        assert_eq!(find_all(&dfa, "xabc"), vec![]);
        assert_eq!(find_all(&dfa, "abcx"), vec![]);

        // A trailing `$` must not let an earlier branch win.
        let dfa = DFA::new("(a|ab)$").unwrap();
        assert_eq!(find_all(&dfa, "xab"), vec![(1, 3)]);

        let dfa = DFA::new("^a+").unwrap();
        let mut cache = dfa.create_cache();
        assert_eq!(dfa.match_next(&mut cache, b"baa", 0), None);
        assert_eq!(dfa.match_first(&mut cache, b"aab", 1), None);
    }

    #[test]
    fn empty_matches() {
        let dfa = DFA::new("a*").unwrap();
        assert_eq!(
            find_all(&dfa, "bbb"),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)],
        );
        assert_eq!(find_all(&dfa, "aab"), vec![(0, 2), (2, 2), (3, 3)]);
    }

    #[test]
    fn eviction_preserves_matches() {
        let pattern = r"(foo|bar|baz|quux)+[0-9]{2}|x[a-z]*y";
        let haystack = "foobar12 xabcy quux99 bazfoo1 xy barbar00".repeat(4);
        let small = DFA::builder()
            .configure(Config::new().cache_capacity(1))
            .build(pattern)
            .unwrap();
        let big = DFA::builder()
            .configure(Config::new().cache_capacity(8192))
            .build(pattern)
            .unwrap();
        assert_eq!(find_all(&small, &haystack), find_all(&big, &haystack));

        let mut cache = small.create_cache();
        small.match_all(&mut cache, haystack.as_bytes());
        // One state for each direction.
        assert!(cache.len() <= 2);
        assert!(cache.stats().evictions() > 0);

        let mut cache = big.create_cache();
        big.match_all(&mut cache, haystack.as_bytes());
        assert_eq!(0, cache.stats().evictions());
    }

    #[test]
    fn batch_eviction() {
        let dfa = DFA::builder()
            .configure(Config::new().cache_capacity(4).eviction_batch_size(0))
            .build("abcdefgh")
            .unwrap();
        let mut cache = dfa.create_cache();
        dfa.match_first(&mut cache, b"abcdefgh", 0);
        assert_eq!(4, cache.len());
        assert!(cache.stats().evictions() >= 5);
    }

    #[test]
    fn cache_hits() {
        let dfa = DFA::new("[a-z]+").unwrap();
        let mut cache = dfa.create_cache();
        let start = dfa.start_state(&mut cache, true, MatchKind::LeftmostFirst);
        let s1 = dfa.next_state(&mut cache, start, b'a');
        let misses = cache.stats().misses();
        let s2 = dfa.next_state(&mut cache, start, b'b');
        assert_eq!(s1, s2);
        assert_eq!(misses, cache.stats().misses());
        assert!(cache.access_count(s1) >= 2);
        assert!(s1.is_match());
        assert!(dfa.next_state(&mut cache, s1, b'0').is_dead());
    }

    #[test]
    fn stale_states_are_dead() {
        let dfa = DFA::new("[a-z]+").unwrap();
        let mut cache = dfa.create_cache();
        let start = dfa.start_state(&mut cache, true, MatchKind::LeftmostFirst);
        let s1 = dfa.next_state(&mut cache, start, b'a');
        cache.clear();
        assert!(dfa.next_state(&mut cache, s1, b'a').is_dead());
        assert!(dfa.next_state(&mut cache, start, b'a').is_dead());
        assert!(dfa.next_state(&mut cache, LazyStateID::dead(), b'a').is_dead());
        assert!(dfa.next_state(&mut cache, LazyStateID::unknown(), b'a').is_dead());
    }

    #[test]
    fn unanchored_search_is_linear() {
        let dfa = DFA::new("(a|b)+c|d").unwrap();
        let haystack = format!("{}d", "ab".repeat(2000));
        let mut cache = dfa.create_cache();
        let matches = dfa.match_all(&mut cache, haystack.as_bytes());
        let n = haystack.len();
        assert_eq!(matches, vec![Match::new(n - 1, n)]);
        let stats = cache.stats();
        assert!(stats.hits() + stats.misses() < 3 * n as u64);
    }

    #[test]
    fn reverse_finds_leftmost_start() {
        let dfa = DFA::new("a+b|b").unwrap();
        assert_eq!(find_all(&dfa, "xaaab b"), vec![(1, 5), (6, 7)]);
        let dfa = DFA::new("[a-z]+[0-9]").unwrap();
        assert_eq!(find_all(&dfa, "..abc1 z9"), vec![(2, 6), (7, 9)]);
        let dfa = DFA::new("x*$").unwrap();
        assert_eq!(find_all(&dfa, "axx"), vec![(1, 3), (3, 3)]);

        assert!(DFA::new("ab").unwrap().reverse().is_some());
        assert!(DFA::new("^ab").unwrap().reverse().is_none());
        let rev = DFA::new("ab").unwrap();
        let rev = rev.reverse().unwrap();
        let mut cache = rev.create_cache();
        assert_eq!(rev.match_first(&mut cache, b"ba", 0), Some(Match::new(0, 2)));
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(1, Config::new().cache_capacity(0).get_cache_capacity());
        assert_eq!(
            MAX_CACHE_CAPACITY,
            Config::new().cache_capacity(1 << 20).get_cache_capacity(),
        );
        assert_eq!(512, Config::new().get_cache_capacity());
    }

    #[test]
    fn rejects_inner_assertions() {
        assert!(DFA::new(r"\bfoo").unwrap_err().is_rejected());
        assert!(DFA::new(r"(?m)^foo").unwrap_err().is_rejected());
        assert!(DFA::new(r"a$b").unwrap_err().is_rejected());
    }
}
