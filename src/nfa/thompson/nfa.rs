use core::fmt;

use std::sync::Arc;

use crate::util::{
    alphabet::{ByteClasses, DebugByte},
    look::{Look, LookSet},
    primitives::StateID,
};

/// A byte oriented Thompson NFA.
///
/// Cloning an `NFA` is cheap: the states are shared behind an `Arc`.
///
/// Every NFA has two start states. The anchored start state only matches at
/// the position a search begins. The unanchored start state is preceded by
/// a non-greedy `(?s:.)*?` loop, so that an engine can find a match starting
/// anywhere without restarting its search at every position.
#[derive(Clone)]
pub struct NFA(Arc<Inner>);

pub(crate) struct Inner {
    pub(crate) states: Vec<State>,
    pub(crate) start_anchored: StateID,
    pub(crate) start_unanchored: StateID,
    pub(crate) group_len: usize,
    pub(crate) byte_classes: ByteClasses,
    pub(crate) look_set: LookSet,
}

impl NFA {
    pub(crate) fn from_inner(inner: Inner) -> NFA {
        NFA(Arc::new(inner))
    }

    /// Returns every state in this NFA. A `StateID` indexes this slice.
    #[inline]
    pub fn states(&self) -> &[State] {
        &self.0.states
    }

    #[inline]
    pub fn state(&self, id: StateID) -> &State {
        &self.0.states[id]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.states.len()
    }

    #[inline]
    pub fn start_anchored(&self) -> StateID {
        self.0.start_anchored
    }

    #[inline]
    pub fn start_unanchored(&self) -> StateID {
        self.0.start_unanchored
    }

    /// Returns the number of capture groups, including the implicit group
    /// `0` for the overall match.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.0.group_len
    }

    /// Returns the number of capture slots, which is twice the number of
    /// groups.
    #[inline]
    pub fn slot_len(&self) -> usize {
        self.0.group_len * 2
    }

    /// Returns the equivalence classes of bytes that no transition in this
    /// NFA can distinguish.
    #[inline]
    pub fn byte_classes(&self) -> &ByteClasses {
        &self.0.byte_classes
    }

    /// Returns every assertion used in this NFA.
    #[inline]
    pub fn look_set(&self) -> LookSet {
        self.0.look_set
    }

    pub fn memory_usage(&self) -> usize {
        let states = self.0.states.len() * core::mem::size_of::<State>();
        let heap: usize = self.0.states.iter().map(|s| s.memory_usage()).sum();
        states + heap
    }
}

impl fmt::Debug for NFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "thompson::NFA(")?;
        for (sid, state) in self.0.states.iter().enumerate() {
            let status = if sid == self.start_anchored().as_usize() {
                '^'
            } else if sid == self.start_unanchored().as_usize() {
                '>'
            } else {
                ' '
            };
            writeln!(f, "{}{:06?}: {:?}", status, sid, state)?;
        }
        writeln!(f, ")")
    }
}

/// A state in a Thompson NFA.
#[derive(Clone, Eq, PartialEq)]
pub enum State {
    /// Consume one byte in the given range.
    ByteRange { trans: Transition },
    /// Consume one byte from any of several ranges. The ranges are sorted
    /// and don't overlap.
    Sparse(SparseTransitions),
    /// An epsilon transition guarded by an assertion.
    Look { look: Look, next: StateID },
    /// Epsilon transitions to each alternate, in priority order.
    Union { alternates: Box<[StateID]> },
    /// An epsilon transition that records the current position in a slot.
    Capture { next: StateID, slot: usize },
    /// A state with no transitions.
    Fail,
    /// A match state.
    Match,
}

impl State {
    /// Returns true if this state only has epsilon transitions.
    #[inline]
    pub fn is_epsilon(&self) -> bool {
        match *self {
            State::ByteRange { .. }
            | State::Sparse { .. }
            | State::Fail
            | State::Match => false,
            State::Look { .. }
            | State::Union { .. }
            | State::Capture { .. } => true,
        }
    }

    fn memory_usage(&self) -> usize {
        match *self {
            State::Sparse(SparseTransitions { ref transitions }) => {
                transitions.len() * core::mem::size_of::<Transition>()
            }
            State::Union { ref alternates } => {
                alternates.len() * core::mem::size_of::<StateID>()
            }
            _ => 0,
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            State::ByteRange { ref trans } => trans.fmt(f),
            State::Sparse(SparseTransitions { ref transitions }) => {
                let rs = transitions
                    .iter()
                    .map(|t| format!("{:?}", t))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "sparse({})", rs)
            }
            State::Look { ref look, next } => {
                write!(f, "{:?} => {:?}", look, next.as_usize())
            }
            State::Union { ref alternates } => {
                let alts = alternates
                    .iter()
                    .map(|id| format!("{:?}", id.as_usize()))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "union({})", alts)
            }
            State::Capture { next, slot } => {
                write!(f, "capture(slot={:?}) => {:?}", slot, next.as_usize())
            }
            State::Fail => write!(f, "FAIL"),
            State::Match => write!(f, "MATCH"),
        }
    }
}

/// A transition on any byte in an inclusive range.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Transition {
    pub start: u8,
    pub end: u8,
    pub next: StateID,
}

impl Transition {
    #[inline]
    pub fn matches_byte(&self, byte: u8) -> bool {
        self.start <= byte && byte <= self.end
    }

    /// Returns true if the byte at `at` is in this transition's range.
    /// Returns false when `at` is at or past the end of the haystack.
    #[inline]
    pub fn matches(&self, haystack: &[u8], at: usize) -> bool {
        haystack.get(at).map_or(false, |&b| self.matches_byte(b))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Transition { start, end, next } = *self;
        if start == end {
            write!(f, "{:?} => {:?}", DebugByte(start), next.as_usize())
        } else {
            write!(
                f,
                "{:?}-{:?} => {:?}",
                DebugByte(start),
                DebugByte(end),
                next.as_usize(),
            )
        }
    }
}

/// A set of non-overlapping transitions, sorted by range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SparseTransitions {
    pub transitions: Box<[Transition]>,
}

impl SparseTransitions {
    /// Returns the next state for the given byte, if any range holds it.
    #[inline]
    pub fn matches_byte(&self, byte: u8) -> Option<StateID> {
        for t in self.transitions.iter() {
            if t.start > byte {
                break;
            } else if t.matches_byte(byte) {
                return Some(t.next);
            }
        }
        None
    }

    #[inline]
    pub fn matches(&self, haystack: &[u8], at: usize) -> Option<StateID> {
        haystack.get(at).and_then(|&b| self.matches_byte(b))
    }
}
