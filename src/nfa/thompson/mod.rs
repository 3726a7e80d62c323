/*!
Thompson NFAs and the Pike VM that simulates them.

The NFA is the one representation every pattern can be compiled to, so the
Pike VM built on top of it is the fallback engine for everything the
automaton engines decline. The one-pass DFA and the lazy DFA are also
built from it.
*/

mod builder;
mod compiler;
mod nfa;
pub mod pikevm;

pub use self::{
    compiler::{Compiler, Config},
    nfa::{SparseTransitions, State, Transition, NFA},
};
