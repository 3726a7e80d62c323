/*!
A one-pass DFA that reports capture groups.

A pattern is one-pass when, at every position, at most one thread of the
Thompson NFA can make progress: every byte determines a unique next state
and a unique set of capture actions. Such a pattern can be executed by a
DFA whose transitions carry the capture slots to update, which is much
faster than the Pike VM and still reports every group.

Whether a pattern is one-pass is decided in two steps.
[`can_build_one_pass_dfa`] is a cheap structural check on the pattern. It
may reject patterns that are one-pass. The construction from the NFA then
settles the question: it fails as soon as two threads could be active at
once. Searches are always anchored, and leftmost-first preferences are
honored by dropping every transition with lower priority than a match.
*/

use crate::{
    error::Error,
    nfa::thompson::{self, State, NFA},
    syntax::Ast,
    util::{
        alphabet::{ByteClasses, ByteSet},
        captures::Captures,
        iter,
        look::{Look, LookSet},
        primitives::StateID,
        search::Match,
        sparse_set::SparseSet,
    },
};

/// The largest number of explicit capture groups a one-pass DFA tracks.
/// Each group needs two bits in a transition's slot set.
pub const MAX_GROUPS: usize = 32;

/// The largest alternation the structural check admits when its branches
/// aren't all single leaves.
const MAX_ALTERNATES: usize = 4;

const DEAD: StateID = StateID::ZERO;

#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    max_groups: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the number of explicit capture groups a pattern may have. Values
    /// above [`MAX_GROUPS`] are clamped to it.
    pub fn max_groups(mut self, limit: usize) -> Config {
        self.max_groups = Some(limit);
        self
    }

    pub fn get_max_groups(&self) -> usize {
        self.max_groups.unwrap_or(MAX_GROUPS).min(MAX_GROUPS)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config { max_groups: o.max_groups.or(self.max_groups) }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    pub fn build(&self, pattern: &str) -> Result<OnePass, Error> {
        self.build_from_ast(&Ast::parse(pattern)?)
    }

    pub fn build_from_ast(&self, ast: &Ast) -> Result<OnePass, Error> {
        let groups = ast.captures_len();
        let limit = self.config.get_max_groups();
        if groups > limit {
            return Err(Error::capture_slot_overflow(groups, limit));
        }
        if !can_build_one_pass_dfa(ast) {
            return Err(Error::rejected("pattern failed one-pass admission"));
        }
        let nfa = thompson::Compiler::new().build_from_ast(ast)?;
        InternalBuilder::new(&nfa).build()
    }
}

/// A cheap structural test for whether a pattern is one-pass.
///
/// Leaves and assertions always pass. A repeated group passes only when its
/// contents are plain literals and classes. An alternation passes when every
/// branch passes and either every branch is a single leaf or there are at
/// most four branches. The test is conservative: it admits no pattern that
/// the construction wouldn't also check, and rejects some that are in fact
/// one-pass.
pub fn can_build_one_pass_dfa(ast: &Ast) -> bool {
    match *ast {
        Ast::Empty
        | Ast::Literal(_)
        | Ast::Dot { .. }
        | Ast::Class(_)
        | Ast::Look(_) => true,
        Ast::Group(ref group) => can_build_one_pass_dfa(&group.ast),
        Ast::Repetition(ref rep) => {
            if let Ast::Group(ref group) = *rep.ast {
                if !is_plain(&group.ast) {
                    return false;
                }
            }
            can_build_one_pass_dfa(&rep.ast)
        }
        Ast::Concat(ref asts) => asts.iter().all(can_build_one_pass_dfa),
        Ast::Alternation(ref asts) => {
            asts.iter().all(can_build_one_pass_dfa)
                && (asts.iter().all(is_leaf) || asts.len() <= MAX_ALTERNATES)
        }
    }
}

fn is_leaf(ast: &Ast) -> bool {
    matches!(*ast, Ast::Literal(_) | Ast::Dot { .. } | Ast::Class(_))
}

/// Returns true if the expression is built from literals and classes only.
fn is_plain(ast: &Ast) -> bool {
    match *ast {
        Ast::Empty | Ast::Literal(_) | Ast::Dot { .. } | Ast::Class(_) => true,
        Ast::Group(ref group) => is_plain(&group.ast),
        Ast::Concat(ref asts) => asts.iter().all(is_plain),
        _ => false,
    }
}

#[derive(Debug)]
struct InternalBuilder<'a> {
    nfa: &'a NFA,
    dfa: OnePass,
    nfa_to_dfa_id: Vec<StateID>,
    uncompiled_nfa_ids: Vec<StateID>,
    seen: SparseSet,
    stack: Vec<(StateID, Info)>,
    /// Set once the closure being compiled reaches a match that holds
    /// without conditions. Lower priority transitions are dropped.
    matched: bool,
    /// Set once the closure reaches a match guarded by assertions. Lower
    /// priority transitions would have to lose to it only where the
    /// assertions hold, which a one-pass table can't express.
    conditional: bool,
}

impl<'a> InternalBuilder<'a> {
    fn new(nfa: &'a NFA) -> InternalBuilder<'a> {
        let classes = *nfa.byte_classes();
        let dfa = OnePass {
            nfa: nfa.clone(),
            table: vec![],
            matches: vec![],
            start: DEAD,
            classes,
            alphabet_len: classes.alphabet_len(),
            first: None,
        };
        InternalBuilder {
            nfa,
            dfa,
            nfa_to_dfa_id: vec![DEAD; nfa.len()],
            uncompiled_nfa_ids: vec![],
            seen: SparseSet::new(nfa.len()),
            stack: vec![],
            matched: false,
            conditional: false,
        }
    }

    fn build(mut self) -> Result<OnePass, Error> {
        self.add_empty_state()?;
        self.dfa.start =
            self.add_dfa_state_for_nfa_state(self.nfa.start_anchored())?;
        while let Some(nfa_id) = self.uncompiled_nfa_ids.pop() {
            let dfa_id = self.nfa_to_dfa_id[nfa_id];
            self.matched = false;
            self.conditional = false;
            self.seen.clear();
            self.stack_push(nfa_id, Info::default())?;
            while let Some((id, info)) = self.stack.pop() {
                match *self.nfa.state(id) {
                    State::ByteRange { ref trans } => {
                        self.compile_transition(dfa_id, trans, info)?;
                    }
                    State::Sparse(ref sparse) => {
                        for trans in sparse.transitions.iter() {
                            self.compile_transition(dfa_id, trans, info)?;
                        }
                    }
                    State::Look { look, next } => {
                        self.stack_push(next, info.look_insert(look))?;
                    }
                    State::Union { ref alternates } => {
                        for &sid in alternates.iter().rev() {
                            self.stack_push(sid, info)?;
                        }
                    }
                    State::Capture { next, slot } => {
                        // The implicit group is tracked by the search itself.
                        let info = if slot < 2 {
                            info
                        } else {
                            info.slot_insert(slot - 2)
                        };
                        self.stack_push(next, info)?;
                    }
                    State::Fail => {}
                    State::Match => {
                        if self.dfa.matches[dfa_id].is_some() {
                            return Err(Error::rejected(
                                "multiple epsilon transitions to match state",
                            ));
                        }
                        if info.looks.is_empty() {
                            self.matched = true;
                        } else {
                            self.conditional = true;
                        }
                        self.dfa.matches[dfa_id] = Some(info);
                    }
                }
            }
        }
        let start = self.dfa.start;
        if self.dfa.matches[start].is_none() {
            let live = (0..=255u8)
                .filter(|&b| self.dfa.transition(start, b).next != DEAD);
            self.dfa.first = Some(ByteSet::from_bytes(live));
        }
        debug!(
            "built one-pass DFA with {} states from an NFA with {} states",
            self.dfa.state_len(),
            self.nfa.len(),
        );
        Ok(self.dfa)
    }

    fn stack_push(&mut self, nfa_id: StateID, info: Info) -> Result<(), Error> {
        if !self.seen.insert(nfa_id) {
            return Err(Error::rejected(
                "multiple epsilon transitions to same state",
            ));
        }
        self.stack.push((nfa_id, info));
        Ok(())
    }

    fn compile_transition(
        &mut self,
        dfa_id: StateID,
        trans: &thompson::Transition,
        info: Info,
    ) -> Result<(), Error> {
        // Anything explored after a match has a lower priority than it, and
        // leftmost-first semantics never pick it.
        if self.matched {
            return Ok(());
        }
        if self.conditional {
            return Err(Error::rejected(
                "transition after a match guarded by an assertion",
            ));
        }
        let next = self.add_dfa_state_for_nfa_state(trans.next)?;
        let newtrans = Transition { next, info };
        for byte in trans.start..=trans.end {
            let oldtrans = self.dfa.transition(dfa_id, byte);
            if oldtrans.next == DEAD {
                self.dfa.set_transition(dfa_id, byte, newtrans);
            } else if oldtrans != newtrans {
                return Err(Error::rejected("conflicting transition"));
            }
        }
        Ok(())
    }

    fn add_dfa_state_for_nfa_state(
        &mut self,
        nfa_id: StateID,
    ) -> Result<StateID, Error> {
        let existing = self.nfa_to_dfa_id[nfa_id];
        if existing != DEAD {
            return Ok(existing);
        }
        let dfa_id = self.add_empty_state()?;
        self.nfa_to_dfa_id[nfa_id] = dfa_id;
        self.uncompiled_nfa_ids.push(nfa_id);
        Ok(dfa_id)
    }

    fn add_empty_state(&mut self) -> Result<StateID, Error> {
        let id = StateID::new(self.dfa.state_len())
            .map_err(|_| Error::too_many_states(StateID::LIMIT))?;
        let dead = Transition { next: DEAD, info: Info::default() };
        self.dfa
            .table
            .extend(core::iter::repeat(dead).take(self.dfa.alphabet_len));
        self.dfa.matches.push(None);
        Ok(id)
    }
}

/// A one-pass DFA.
///
/// The DFA is immutable once built. Searches need a [`Cache`] for the
/// capture slots of the match in progress.
#[derive(Clone, Debug)]
pub struct OnePass {
    nfa: NFA,
    table: Vec<Transition>,
    /// For each state, the captures to apply and the assertions that must
    /// hold when the state is reached and its thread can match.
    matches: Vec<Option<Info>>,
    start: StateID,
    classes: ByteClasses,
    alphabet_len: usize,
    /// The bytes a match can begin with, unless a match can be empty.
    first: Option<ByteSet>,
}

impl OnePass {
    /// Parse and compile a pattern into a one-pass DFA.
    pub fn new(pattern: &str) -> Result<OnePass, Error> {
        OnePass::builder().build(pattern)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn create_cache(&self) -> Cache {
        Cache::new(self)
    }

    pub fn create_captures(&self) -> Captures {
        Captures::new(self.nfa.group_len())
    }

    pub fn nfa(&self) -> &NFA {
        &self.nfa
    }

    /// The number of groups, including the implicit group `0`.
    pub fn group_len(&self) -> usize {
        self.nfa.group_len()
    }

    /// Find the match beginning exactly at `start`, writing every group's
    /// span to `caps`. Returns true on a match.
    pub fn captures_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        caps.clear();
        self.search_imp(cache, haystack, start, caps.slots_mut())
    }

    /// Find the leftmost match at or after `start`, writing every group's
    /// span to `caps`. Returns true on a match.
    pub fn captures_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        caps.clear();
        let mut at = start;
        while at <= haystack.len() {
            if let Some(ref first) = self.first {
                at = match first.find(haystack, at) {
                    None => return false,
                    Some(at) => at,
                };
            }
            if self.search_imp(cache, haystack, at, caps.slots_mut()) {
                return true;
            }
            at += 1;
        }
        false
    }

    pub fn match_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        let mut caps = Captures::new(1);
        self.captures_first(cache, haystack, start, &mut caps);
        caps.get_match()
    }

    pub fn match_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        let mut caps = Captures::new(1);
        self.captures_next(cache, haystack, start, &mut caps);
        caps.get_match()
    }

    pub fn match_all(&self, cache: &mut Cache, haystack: &[u8]) -> Vec<Match> {
        iter::find_all(haystack, |at| self.match_next(cache, haystack, at))
    }

    /// Run an anchored search at `start`. `slots` receives the implicit
    /// group in its first two entries and as many explicit slots as it has
    /// room for after that.
    fn search_imp(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        slots: &mut [Option<usize>],
    ) -> bool {
        for slot in slots.iter_mut() {
            *slot = None;
        }
        if start > haystack.len() {
            return false;
        }
        cache.reset();
        let mut matched = false;
        let mut sid = self.start;
        for at in start..haystack.len() {
            if let Some(info) = self.matches[sid] {
                if info.looks.matches(haystack, at) {
                    matched = true;
                    self.record(cache, info, start, at, slots);
                }
            }
            let trans = self.transition(sid, haystack[at]);
            if trans.next == DEAD || !trans.info.looks.matches(haystack, at) {
                return matched;
            }
            trans.info.slot_apply(at, &mut cache.explicit_slots);
            sid = trans.next;
        }
        if let Some(info) = self.matches[sid] {
            if info.looks.matches(haystack, haystack.len()) {
                matched = true;
                self.record(cache, info, start, haystack.len(), slots);
            }
        }
        matched
    }

    fn record(
        &self,
        cache: &Cache,
        info: Info,
        start: usize,
        at: usize,
        slots: &mut [Option<usize>],
    ) {
        if slots.len() < 2 {
            return;
        }
        slots[0] = Some(start);
        slots[1] = Some(at);
        let explicit = &mut slots[2..];
        let len = explicit.len().min(cache.explicit_slots.len());
        explicit[..len].copy_from_slice(&cache.explicit_slots[..len]);
        info.slot_apply(at, explicit);
    }

    #[inline]
    fn transition(&self, sid: StateID, byte: u8) -> Transition {
        let class = self.classes.get(byte) as usize;
        self.table[sid.as_usize() * self.alphabet_len + class]
    }

    fn set_transition(&mut self, sid: StateID, byte: u8, to: Transition) {
        let class = self.classes.get(byte) as usize;
        self.table[sid.as_usize() * self.alphabet_len + class] = to;
    }

    fn state_len(&self) -> usize {
        self.table.len() / self.alphabet_len
    }

    pub fn memory_usage(&self) -> usize {
        use core::mem::size_of;

        self.table.len() * size_of::<Transition>()
            + self.matches.len() * size_of::<Option<Info>>()
            + self.nfa.memory_usage()
    }
}

/// Scratch space for a [`OnePass`] search: the explicit capture slots of
/// the match in progress.
#[derive(Clone, Debug)]
pub struct Cache {
    explicit_slots: Vec<Option<usize>>,
}

impl Cache {
    pub fn new(re: &OnePass) -> Cache {
        Cache { explicit_slots: vec![None; re.nfa.slot_len() - 2] }
    }

    pub fn memory_usage(&self) -> usize {
        self.explicit_slots.len() * core::mem::size_of::<Option<usize>>()
    }

    fn reset(&mut self) {
        for slot in self.explicit_slots.iter_mut() {
            *slot = None;
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Transition {
    next: StateID,
    info: Info,
}

/// What happens when a transition is taken, or when a match is reported:
/// the explicit slots to set, and the assertions that must hold first.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
struct Info {
    slots: u64,
    looks: LookSet,
}

impl Info {
    fn slot_insert(self, slot: usize) -> Info {
        Info { slots: self.slots | (1 << slot), ..self }
    }

    fn look_insert(self, look: Look) -> Info {
        Info { looks: self.looks.insert(look), ..self }
    }

    fn slot_apply(self, at: usize, slots: &mut [Option<usize>]) {
        if self.slots == 0 {
            return;
        }
        for (i, slot) in slots.iter_mut().enumerate().take(64) {
            if self.slots & (1 << i) != 0 {
                *slot = Some(at);
            }
        }
    }
}

impl core::fmt::Debug for Info {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let slots: Vec<usize> =
            (0..64).filter(|&i| self.slots & (1 << i) != 0).collect();
        write!(f, "Info(slots: {:?}, looks: {:?})", slots, self.looks)
    }
}
