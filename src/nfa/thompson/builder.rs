use crate::{
    error::Error,
    nfa::thompson::nfa::{Inner, SparseTransitions, State, Transition, NFA},
    util::{
        alphabet::ByteClassSet,
        look::{Look, LookSet},
        primitives::StateID,
    },
};

/// A state while an NFA is still under construction.
///
/// Unlike a finished [`State`], a builder state may be an `Empty` state,
/// which is an unconditional epsilon transition. Empty states make patching
/// fragments together trivial, and are removed when the NFA is finished.
#[derive(Clone, Debug)]
enum BState {
    Empty { next: StateID },
    ByteRange { trans: Transition },
    Sparse { transitions: Vec<Transition> },
    Look { look: Look, next: StateID },
    Union { alternates: Vec<StateID> },
    Capture { next: StateID, slot: usize },
    Fail,
    Match,
}

/// Assembles NFA states, then lowers them into an [`NFA`].
#[derive(Clone, Debug)]
pub(crate) struct Builder {
    states: Vec<BState>,
    size_limit: Option<usize>,
}

impl Builder {
    pub(crate) fn new(size_limit: Option<usize>) -> Builder {
        Builder { states: vec![], size_limit }
    }

    pub(crate) fn add_empty(&mut self) -> Result<StateID, Error> {
        self.add(BState::Empty { next: StateID::ZERO })
    }

    pub(crate) fn add_range(
        &mut self,
        start: u8,
        end: u8,
    ) -> Result<StateID, Error> {
        let trans = Transition { start, end, next: StateID::ZERO };
        self.add(BState::ByteRange { trans })
    }

    pub(crate) fn add_sparse(
        &mut self,
        ranges: &[(u8, u8)],
    ) -> Result<StateID, Error> {
        let transitions = ranges
            .iter()
            .map(|&(start, end)| Transition { start, end, next: StateID::ZERO })
            .collect();
        self.add(BState::Sparse { transitions })
    }

    pub(crate) fn add_look(&mut self, look: Look) -> Result<StateID, Error> {
        self.add(BState::Look { look, next: StateID::ZERO })
    }

    pub(crate) fn add_union(&mut self) -> Result<StateID, Error> {
        self.add(BState::Union { alternates: vec![] })
    }

    pub(crate) fn add_capture(&mut self, slot: usize) -> Result<StateID, Error> {
        self.add(BState::Capture { next: StateID::ZERO, slot })
    }

    pub(crate) fn add_fail(&mut self) -> Result<StateID, Error> {
        self.add(BState::Fail)
    }

    pub(crate) fn add_match(&mut self) -> Result<StateID, Error> {
        self.add(BState::Match)
    }

    /// Add a transition from `from` to `to`. For a union, this appends a new
    /// alternate with the lowest priority so far.
    pub(crate) fn patch(&mut self, from: StateID, to: StateID) {
        match self.states[from] {
            BState::Empty { ref mut next }
            | BState::Look { ref mut next, .. }
            | BState::Capture { ref mut next, .. } => *next = to,
            BState::ByteRange { ref mut trans } => trans.next = to,
            BState::Sparse { ref mut transitions } => {
                for t in transitions.iter_mut() {
                    t.next = to;
                }
            }
            BState::Union { ref mut alternates } => alternates.push(to),
            BState::Fail | BState::Match => {}
        }
    }

    /// Finish building, dropping every `Empty` state.
    pub(crate) fn build(
        self,
        start_anchored: StateID,
        start_unanchored: StateID,
        group_len: usize,
    ) -> Result<NFA, Error> {
        // Map each builder state to the state it ends up as. An empty state
        // is replaced by the first non-empty state its chain leads to.
        let mut remap = vec![StateID::ZERO; self.states.len()];
        let mut len = 0;
        for (i, state) in self.states.iter().enumerate() {
            if !matches!(*state, BState::Empty { .. }) {
                remap[i] = StateID::new(len)
                    .map_err(|_| Error::too_many_states(StateID::LIMIT))?;
                len += 1;
            }
        }
        for i in 0..self.states.len() {
            if let BState::Empty { .. } = self.states[i] {
                remap[i] = remap[self.resolve(StateID::new_unchecked(i))];
            }
        }

        let mut states = Vec::with_capacity(len);
        let mut classes = ByteClassSet::empty();
        let mut look_set = LookSet::empty();
        for state in self.states.iter() {
            let map = |id: StateID| remap[id];
            states.push(match *state {
                BState::Empty { .. } => continue,
                BState::ByteRange { trans } => {
                    classes.set_range(trans.start, trans.end);
                    State::ByteRange {
                        trans: Transition { next: map(trans.next), ..trans },
                    }
                }
                BState::Sparse { ref transitions } => {
                    let transitions = transitions
                        .iter()
                        .map(|&t| {
                            classes.set_range(t.start, t.end);
                            Transition { next: map(t.next), ..t }
                        })
                        .collect();
                    State::Sparse(SparseTransitions { transitions })
                }
                BState::Look { look, next } => {
                    look.add_to_byteset(&mut classes);
                    look_set = look_set.insert(look);
                    State::Look { look, next: map(next) }
                }
                BState::Union { ref alternates } => State::Union {
                    alternates: alternates.iter().map(|&id| map(id)).collect(),
                },
                BState::Capture { next, slot } => {
                    State::Capture { next: map(next), slot }
                }
                BState::Fail => State::Fail,
                BState::Match => State::Match,
            });
        }
        let nfa = NFA::from_inner(Inner {
            states,
            start_anchored: remap[start_anchored],
            start_unanchored: remap[start_unanchored],
            group_len,
            byte_classes: classes.byte_classes(),
            look_set,
        });
        debug!(
            "built Thompson NFA with {} states ({} before removing \
             empty states)",
            nfa.len(),
            self.states.len(),
        );
        Ok(nfa)
    }

    /// Follow a chain of empty states to the first non-empty one.
    fn resolve(&self, mut id: StateID) -> StateID {
        // Every chain is acyclic, since every loop the compiler creates
        // passes through a union. The bound only guards against bugs.
        for _ in 0..=self.states.len() {
            match self.states[id] {
                BState::Empty { next } => id = next,
                _ => return id,
            }
        }
        id
    }

    fn add(&mut self, state: BState) -> Result<StateID, Error> {
        if let Some(limit) = self.size_limit {
            if self.states.len() >= limit {
                return Err(Error::too_many_states(limit));
            }
        }
        let id = StateID::new(self.states.len())
            .map_err(|_| Error::too_many_states(StateID::LIMIT))?;
        self.states.push(state);
        Ok(id)
    }
}
