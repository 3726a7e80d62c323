/*!
A regex engine that compiles each pattern to the cheapest automaton able to
run it.

A pattern is parsed once and classified by [`complexity::classify`]. Simple
patterns (literals, quantified classes, class sequences, literal
alternations and similar) compile to an eager [`dfa`] whose transition table
is complete before the first search. Alternation-heavy patterns run on a lazy
DFA from [`hybrid`], which builds states on demand in a bounded cache.
Patterns where only one NFA thread is ever active compile to a one-pass DFA,
which also reports capture groups. Everything else runs on the
[`PikeVM`](nfa::thompson::pikevm::PikeVM), which every engine agrees with.

Most callers only need [`meta::Regex`], or [`compile_regex`] for a cached
one:

```
use regex_hybrid::compile_regex;

let re = compile_regex(r"[a-z]+@[a-z]+\.com")?;
let m = re.match_next(b"mail bob@example.com", 0).unwrap();
assert_eq!(5..20, m.range());

# Ok::<(), regex_hybrid::Error>(())
```

Searches use leftmost-first semantics. [`match_first`](meta::Regex::match_first)
only matches at the given position, [`match_next`](meta::Regex::match_next)
finds the leftmost match at or after it and
[`match_all`](meta::Regex::match_all) finds every non-overlapping match.
Alternations prefer their earliest branch and repetitions are greedy unless
marked lazy.

# Crate features

* **logging** - Report engine selection, prefilter construction and lazy DFA
cache evictions through the `log` crate. Enabled by default.
*/

pub use crate::{
    error::Error,
    meta::{clear_regex_cache, compile_regex, get_stats, Regex},
    util::{captures::Captures, search::Match},
};

#[macro_use]
mod macros;

pub mod complexity;
pub mod dfa;
mod error;
pub mod hybrid;
pub mod meta;
pub mod nfa;
pub mod syntax;
pub mod util;
