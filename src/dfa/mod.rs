/*!
Deterministic engines: an eager DFA and a one-pass DFA.

The eager DFA in [`regex`] compiles a restricted family of patterns into a
complete transition table up front. Literals, classes with repetitions,
sequences of classes, literal alternations and quantified groups all fit. It
reports overall matches only. Anything outside that family fails to build
with an error for which [`Error::is_too_complex`](crate::Error::is_too_complex)
returns true.

The one-pass DFA in [`onepass`] reports capture groups, but only for
patterns where a single NFA thread is ever active.
*/

pub use self::{
    automaton::{Automaton, State, DEAD},
    compiler::{Compiler, Config},
};

mod automaton;
mod compiler;
pub mod onepass;
pub mod regex;
mod search;
