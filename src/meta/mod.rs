/*!
The top level regex: parses a pattern once, picks the cheapest engine that
can run it and dispatches every search to it.

Engines are tried from cheapest to most general: an eager DFA for simple
patterns, then a lazy DFA, then a one-pass DFA, and finally the PikeVM, which
runs anything. An engine that rejects a pattern is skipped. Plain literals
bypass the engines entirely, and other patterns may be scanned for a literal
every match contains before an engine runs. [`Regex::stats`] reports what
was picked.

[`PatternCache`] and [`compile_regex`] memoize compiled patterns by their
exact text.
*/

pub use self::{
    cache::{clear_regex_cache, compile_regex, get_stats, PatternCache},
    regex::{Builder, Config, Regex},
    stats::{Engine, Optimization, Stats},
};

mod cache;
mod regex;
mod stats;
mod strategy;
