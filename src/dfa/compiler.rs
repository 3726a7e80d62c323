use crate::{
    complexity::{literal_branches, sequence, unwrap_groups, Shape},
    dfa::automaton::{Automaton, State, DEAD},
    error::Error,
    syntax::Ast,
    util::{
        alphabet::{ByteClassSet, ByteSet},
        fnv::HashMap,
        primitives::StateID,
    },
};

/// The default maximum number of states in a compiled automaton.
const DEFAULT_STATE_LIMIT: usize = 10_000;

/// The configuration used for compiling an eager DFA.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    state_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Set the maximum number of states the compiler may create. Patterns
    /// that need more fail to compile with a "too complex" error.
    pub fn state_limit(mut self, limit: usize) -> Config {
        self.state_limit = Some(limit);
        self
    }

    pub fn get_state_limit(&self) -> usize {
        self.state_limit.unwrap_or(DEFAULT_STATE_LIMIT)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config { state_limit: o.state_limit.or(self.state_limit) }
    }
}

/// Compiles patterns of a restricted shape into eager DFAs.
///
/// Only the shapes recognized by [`Shape::detect`] are supported. Anything
/// else fails with an error for which
/// [`Error::is_too_complex`](crate::Error::is_too_complex) returns true, and
/// callers are expected to fall back to another engine.
///
/// Compilation happens in two steps. First, each element of the pattern is
/// laid down with one of a few templates (a required copy, an optional copy
/// or a loop) onto a small automaton whose transitions are labeled with byte
/// sets. Elements are glued together through a frontier: the set of states
/// at which the previous element may have ended. That automaton can be
/// ambiguous, for example in `\d+\.?\d*`, where a digit after the first run
/// may belong to either run. So the second step is a subset construction
/// that merges ambiguous states into the final table.
///
/// The resulting automaton finds the longest match at a position. For the
/// supported shapes this is the same match a backtracking engine prefers,
/// with one exception: an alternation where an earlier branch is a prefix
/// of a later one, such as `a|ab`. Unrepeated alternations drop the later
/// branches (they can never win), and repeated ones are rejected.
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    config: Config,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Compiler {
        self.config = self.config.overwrite(config);
        self
    }

    /// Parse and compile a pattern.
    pub fn build(&self, pattern: &str) -> Result<Automaton, Error> {
        self.compile(&Ast::parse(pattern)?)
    }

    /// Compile an already lowered pattern.
    pub fn compile(&self, ast: &Ast) -> Result<Automaton, Error> {
        let shape = Shape::detect(ast)
            .ok_or_else(|| Error::too_complex("unsupported pattern shape"))?;
        let (has_start_anchor, body, has_end_anchor) = ast.strip_anchors();
        let elements = sequence(&body)
            .into_iter()
            .map(|item| Element::new(item, has_end_anchor))
            .collect::<Result<Vec<Element>, Error>>()?;

        let limit = self.config.get_state_limit();
        let mut skel = Skeleton { states: vec![], limit };
        let mut frontier = vec![skel.add_state()?];
        for element in elements.iter() {
            frontier = skel.repeat(frontier, element)?;
        }
        for &id in frontier.iter() {
            skel.states[id].accepting = true;
        }
        let (states, start) = skel.determinize()?;
        debug!(
            "compiled {:?} pattern into eager DFA with {} states \
             ({} before determinization)",
            shape,
            states.len(),
            skel.states.len(),
        );
        Ok(Automaton { states, start, has_start_anchor, has_end_anchor, shape })
    }
}

/// One element of a pattern, matched `min` to `max` times.
#[derive(Clone, Debug)]
struct Element {
    unit: Unit,
    min: u32,
    max: Option<u32>,
}

/// What a single repetition of an element consumes.
#[derive(Clone, Debug)]
enum Unit {
    /// Any one byte from a set.
    Bytes(ByteSet),
    /// Any one of several literals, laid down as a prefix sharing trie.
    Trie(Vec<Vec<u8>>),
}

impl Element {
    fn new(item: &Ast, has_end_anchor: bool) -> Result<Element, Error> {
        let once = |unit| Element { unit, min: 1, max: Some(1) };
        match *item {
            Ast::Literal(ref bytes) => Ok(once(Unit::Trie(vec![bytes.clone()]))),
            Ast::Dot { .. } | Ast::Class(_) => match item.byte_set() {
                Some(set) => Ok(once(Unit::Bytes(set))),
                None => Err(Error::too_complex("unsupported element")),
            },
            Ast::Alternation(ref branches) => {
                let lits = literal_branches(branches).ok_or_else(|| {
                    Error::too_complex("alternation of non-literals")
                })?;
                // With an end anchor, every match ends at the same place, so
                // there is no choice between branches to get wrong.
                let lits =
                    if has_end_anchor { lits } else { drop_shadowed(lits) };
                Ok(once(Unit::Trie(lits)))
            }
            Ast::Repetition(ref rep) => {
                let inner = unwrap_groups(&rep.ast);
                let unit = if let Some(set) = inner.byte_set() {
                    Unit::Bytes(set)
                } else if let Ast::Alternation(ref branches) = *inner {
                    let lits = literal_branches(branches).ok_or_else(|| {
                        Error::too_complex("alternation of non-literals")
                    })?;
                    if !is_prefix_free(&lits) {
                        return Err(Error::too_complex(
                            "repeated alternation is not prefix free",
                        ));
                    }
                    Unit::Trie(lits)
                } else {
                    match inner.as_literal() {
                        Some(lit) if !lit.is_empty() => Unit::Trie(vec![lit]),
                        _ => {
                            return Err(Error::too_complex(
                                "unsupported repetition",
                            ))
                        }
                    }
                };
                Ok(Element { unit, min: rep.min, max: rep.max })
            }
            _ => Err(Error::too_complex("unsupported element")),
        }
    }
}

/// Remove every branch that an earlier branch is a prefix of. Such a branch
/// can never be the preferred match.
fn drop_shadowed(lits: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut kept: Vec<Vec<u8>> = vec![];
    for lit in lits {
        if !kept.iter().any(|k| lit.starts_with(k)) {
            kept.push(lit);
        }
    }
    kept
}

/// Returns true if no literal is empty or a proper prefix of another.
fn is_prefix_free(lits: &[Vec<u8>]) -> bool {
    lits.iter().all(|short| {
        !short.is_empty()
            && lits
                .iter()
                .all(|long| long.len() <= short.len() || !long.starts_with(short))
    })
}

/// An automaton whose transitions are labeled with byte sets and which may
/// have several transitions on the same byte.
#[derive(Debug)]
struct Skeleton {
    states: Vec<SkeletonState>,
    limit: usize,
}

#[derive(Clone, Debug, Default)]
struct SkeletonState {
    trans: Vec<(ByteSet, usize)>,
    accepting: bool,
}

/// The transitions into one copy of a unit, so that a loop can repeat them
/// from the copy's exits.
type Entry = Vec<(ByteSet, usize)>;

impl Skeleton {
    fn add_state(&mut self) -> Result<usize, Error> {
        if self.states.len() >= self.limit {
            return Err(Error::too_complex("too many DFA states"));
        }
        self.states.push(SkeletonState::default());
        Ok(self.states.len() - 1)
    }

    fn add_transition(&mut self, from: usize, set: ByteSet, to: usize) {
        let trans = &mut self.states[from].trans;
        if !trans.contains(&(set, to)) {
            trans.push((set, to));
        }
    }

    /// Lay down `element` after every state in `frontier`, and return the
    /// states at which the element may end.
    fn repeat(
        &mut self,
        mut frontier: Vec<usize>,
        element: &Element,
    ) -> Result<Vec<usize>, Error> {
        let mut last: Option<Entry> = None;
        for _ in 0..element.min {
            let (entry, exits) = self.once(&frontier, &element.unit)?;
            frontier = exits;
            last = Some(entry);
        }
        match element.max {
            None => {
                let (entry, exits) = match last {
                    Some(entry) => (entry, frontier.clone()),
                    None => {
                        let (entry, exits) =
                            self.once(&frontier, &element.unit)?;
                        frontier.extend(exits.iter().copied());
                        (entry, exits)
                    }
                };
                for &exit in exits.iter() {
                    for &(set, to) in entry.iter() {
                        self.add_transition(exit, set, to);
                    }
                }
            }
            Some(max) => {
                let mut current = frontier.clone();
                for _ in element.min..max {
                    let (_, exits) = self.once(&current, &element.unit)?;
                    frontier.extend(exits.iter().copied());
                    current = exits;
                }
            }
        }
        frontier.sort_unstable();
        frontier.dedup();
        Ok(frontier)
    }

    /// Lay down exactly one copy of `unit` after every state in `frontier`.
    fn once(
        &mut self,
        frontier: &[usize],
        unit: &Unit,
    ) -> Result<(Entry, Vec<usize>), Error> {
        match *unit {
            Unit::Bytes(set) => {
                let id = self.add_state()?;
                for &from in frontier.iter() {
                    self.add_transition(from, set, id);
                }
                Ok((vec![(set, id)], vec![id]))
            }
            Unit::Trie(ref lits) => self.trie(frontier, lits),
        }
    }

    fn trie(
        &mut self,
        frontier: &[usize],
        lits: &[Vec<u8>],
    ) -> Result<(Entry, Vec<usize>), Error> {
        // Trie nodes as (state, children). Node 0 stands for the frontier.
        let mut nodes: Vec<(usize, Vec<(u8, usize)>)> = vec![(0, vec![])];
        let mut entry = vec![];
        let mut exits = vec![];
        for lit in lits.iter() {
            let mut node = 0;
            for &byte in lit.iter() {
                let existing =
                    nodes[node].1.iter().find(|&&(b, _)| b == byte).map(|c| c.1);
                node = match existing {
                    Some(child) => child,
                    None => {
                        let id = self.add_state()?;
                        let set = ByteSet::from_bytes(Some(byte));
                        if node == 0 {
                            entry.push((set, id));
                            for &from in frontier.iter() {
                                self.add_transition(from, set, id);
                            }
                        } else {
                            self.add_transition(nodes[node].0, set, id);
                        }
                        nodes.push((id, vec![]));
                        let child = nodes.len() - 1;
                        nodes[node].1.push((byte, child));
                        child
                    }
                };
            }
            if node == 0 {
                exits.extend(frontier.iter().copied());
            } else {
                exits.push(nodes[node].0);
            }
        }
        exits.sort_unstable();
        exits.dedup();
        Ok((entry, exits))
    }

    /// Convert this automaton into a deterministic one via the subset
    /// construction. Returns the states and the start state.
    fn determinize(&self) -> Result<(Vec<State>, StateID), Error> {
        let mut set = ByteClassSet::empty();
        for state in self.states.iter() {
            for &(ref bytes, _) in state.trans.iter() {
                for (start, end) in bytes.iter_ranges() {
                    set.set_range(start, end);
                }
            }
        }
        let classes = set.byte_classes();
        let members: Vec<Vec<u8>> = (0..classes.alphabet_len())
            .map(|class| classes.elements(class as u8).collect())
            .collect();

        let mut states = vec![State::new()];
        let mut sets: Vec<Vec<usize>> = vec![vec![]];
        let mut map: HashMap<Vec<usize>, StateID> = HashMap::default();
        map.insert(vec![], DEAD);
        let start = StateID::new_unchecked(1);
        map.insert(vec![0], start);
        sets.push(vec![0]);
        states.push(State::new());

        let mut i = 1;
        while i < sets.len() {
            let accepting = sets[i].iter().any(|&s| self.states[s].accepting);
            states[i].set_accepting(accepting);
            for bytes in members.iter() {
                let rep = bytes[0];
                let mut next: Vec<usize> = sets[i]
                    .iter()
                    .flat_map(|&s| self.states[s].trans.iter())
                    .filter(|&&(ref set, _)| set.contains(rep))
                    .map(|&(_, to)| to)
                    .collect();
                if next.is_empty() {
                    continue;
                }
                next.sort_unstable();
                next.dedup();
                let id = match map.get(&next) {
                    Some(&id) => id,
                    None => {
                        if states.len() >= self.limit {
                            return Err(Error::too_complex(
                                "too many DFA states",
                            ));
                        }
                        let id = StateID::new_unchecked(states.len());
                        map.insert(next.clone(), id);
                        sets.push(next);
                        states.push(State::new());
                        id
                    }
                };
                for &b in bytes.iter() {
                    states[i].set_next(b, id);
                }
            }
            i += 1;
        }
        set_match_lengths(&mut states, start);
        Ok((states, start))
    }
}

/// Record, for every state, the number of bytes consumed to reach it when
/// that number is the same on every path.
fn set_match_lengths(states: &mut [State], start: StateID) {
    let successors: Vec<Vec<StateID>> = states
        .iter()
        .map(|state| {
            let mut next: Vec<StateID> = (0..=255u8)
                .map(|b| state.next(b))
                .filter(|&id| id != DEAD)
                .collect();
            next.sort_unstable();
            next.dedup();
            next
        })
        .collect();

    let mut dist: Vec<Option<usize>> = vec![None; states.len()];
    dist[start] = Some(0);
    let mut queue = std::collections::VecDeque::from(vec![start]);
    while let Some(id) = queue.pop_front() {
        let d = dist[id].map_or(0, |d| d + 1);
        for &next in successors[id].iter() {
            if dist[next].is_none() {
                dist[next] = Some(d);
                queue.push_back(next);
            }
        }
    }

    // A state's length is ambiguous if some edge into it doesn't come from
    // exactly one byte earlier, and ambiguity flows along every edge.
    let mut fixed = vec![true; states.len()];
    let mut stack = vec![];
    for (id, nexts) in successors.iter().enumerate() {
        for &next in nexts.iter() {
            let expected = dist[id].map(|d| d + 1);
            if dist[next] != expected && fixed[next] {
                fixed[next] = false;
                stack.push(next);
            }
        }
    }
    while let Some(id) = stack.pop() {
        for &next in successors[id].iter() {
            if fixed[next] {
                fixed[next] = false;
                stack.push(next);
            }
        }
    }
    for (id, state) in states.iter_mut().enumerate() {
        state.set_match_length(if fixed[id] { dist[id] } else { None });
    }
}
