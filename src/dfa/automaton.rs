use core::fmt;

use crate::{
    complexity::Shape,
    util::{
        alphabet::{ByteSet, DebugByte},
        primitives::StateID,
    },
};

/// The dead state. Every transition out of it leads back to it, and it never
/// accepts. A transition to the dead state means "no transition".
pub const DEAD: StateID = StateID::ZERO;

/// A single state in an eager DFA.
///
/// The transition table is total: every byte maps to a state, with missing
/// transitions pointing at [`DEAD`].
#[derive(Clone, Eq, PartialEq)]
pub struct State {
    next: Box<[StateID; 256]>,
    accepting: bool,
    match_length: Option<usize>,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            next: Box::new([DEAD; 256]),
            accepting: false,
            match_length: None,
        }
    }

    #[inline]
    pub fn next(&self, byte: u8) -> StateID {
        self.next[byte as usize]
    }

    #[inline]
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// The number of bytes consumed on every path from the start state to
    /// this one, or `None` if paths of different lengths (or a loop) lead
    /// here.
    #[inline]
    pub fn match_length(&self) -> Option<usize> {
        self.match_length
    }

    /// Returns every byte with a transition out of this state.
    pub fn live_bytes(&self) -> ByteSet {
        ByteSet::from_bytes((0..=255u8).filter(|&b| self.next(b) != DEAD))
    }

    pub(crate) fn set_next(&mut self, byte: u8, to: StateID) {
        self.next[byte as usize] = to;
    }

    pub(crate) fn set_accepting(&mut self, yes: bool) {
        self.accepting = yes;
    }

    pub(crate) fn set_match_length(&mut self, len: Option<usize>) {
        self.match_length = len;
    }

    /// Iterate over the ranges of bytes that share a target, skipping
    /// transitions to the dead state.
    fn ranges(&self) -> Vec<(u8, u8, StateID)> {
        let mut ranges: Vec<(u8, u8, StateID)> = vec![];
        for b in 0..=255u8 {
            let to = self.next(b);
            if let Some(last) = ranges.last_mut() {
                if last.2 == to && last.1 as usize + 1 == b as usize {
                    last.1 = b;
                    continue;
                }
            }
            ranges.push((b, b, to));
        }
        ranges.retain(|&(_, _, to)| to != DEAD);
        ranges
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (start, end, to)) in self.ranges().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if start == end {
                write!(f, "{:?} => {:?}", DebugByte(start), to.as_usize())?;
            } else {
                write!(
                    f,
                    "{:?}-{:?} => {:?}",
                    DebugByte(start),
                    DebugByte(end),
                    to.as_usize(),
                )?;
            }
        }
        Ok(())
    }
}

/// A table driven deterministic automaton for a single pattern.
///
/// An automaton is built once by a [`Compiler`](crate::dfa::Compiler) and is
/// immutable afterwards. State `0` is always [`DEAD`].
#[derive(Clone)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) start: StateID,
    pub(crate) has_start_anchor: bool,
    pub(crate) has_end_anchor: bool,
    pub(crate) shape: Shape,
}

impl Automaton {
    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[inline]
    pub fn state(&self, id: StateID) -> &State {
        &self.states[id]
    }

    #[inline]
    pub fn start_state(&self) -> StateID {
        self.start
    }

    #[inline]
    pub fn next_state(&self, id: StateID, byte: u8) -> StateID {
        self.states[id].next(byte)
    }

    #[inline]
    pub fn is_accepting(&self, id: StateID) -> bool {
        self.states[id].is_accepting()
    }

    /// Whether a match may only begin at the start of the haystack.
    #[inline]
    pub fn has_start_anchor(&self) -> bool {
        self.has_start_anchor
    }

    /// Whether a match must end at the end of the haystack.
    #[inline]
    pub fn has_end_anchor(&self) -> bool {
        self.has_end_anchor
    }

    /// The shape of the pattern this automaton was compiled from.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the set of bytes a non-empty match can start with.
    pub fn first_bytes(&self) -> ByteSet {
        self.states[self.start].live_bytes()
    }

    /// Returns the end of the longest match starting exactly at `start`.
    ///
    /// This walks the table without any acceleration. When the automaton has
    /// an end anchor, only a match ending at the end of the haystack counts.
    pub fn longest_match_end(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<usize> {
        if start > haystack.len() {
            return None;
        }
        let mut sid = self.start;
        let mut last = if self.is_accepting(sid) { Some(start) } else { None };
        for (at, &byte) in haystack[start..].iter().enumerate() {
            sid = self.next_state(sid, byte);
            if sid == DEAD {
                break;
            }
            if self.is_accepting(sid) {
                last = Some(start + at + 1);
            }
        }
        if self.has_end_anchor && last != Some(haystack.len()) {
            return None;
        }
        last
    }

    pub fn memory_usage(&self) -> usize {
        self.states.len()
            * (core::mem::size_of::<State>()
                + 256 * core::mem::size_of::<StateID>())
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dfa::Automaton({:?})", self.shape)?;
        for (id, state) in self.states.iter().enumerate() {
            let start = if id == self.start.as_usize() { '>' } else { ' ' };
            let accept = if state.is_accepting() { '*' } else { ' ' };
            writeln!(f, "{}{}{:06?}: {:?}", start, accept, id, state)?;
        }
        if self.has_start_anchor || self.has_end_anchor {
            writeln!(
                f,
                "anchors: start={:?}, end={:?}",
                self.has_start_anchor, self.has_end_anchor
            )?;
        }
        Ok(())
    }
}
