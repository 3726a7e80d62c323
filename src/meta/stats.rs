use core::fmt;

use crate::{complexity::PatternComplexity, hybrid};

/// The engine that finds the overall matches of a [`Regex`](super::Regex).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Engine {
    /// An eager DFA.
    DFA,
    /// A lazy DFA.
    LazyDFA,
    /// A one-pass DFA.
    OnePass,
    /// The PikeVM simulation of a Thompson NFA.
    NFA,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Engine::DFA => write!(f, "DFA"),
            Engine::LazyDFA => write!(f, "lazy DFA"),
            Engine::OnePass => write!(f, "one-pass DFA"),
            Engine::NFA => write!(f, "NFA"),
        }
    }
}

/// What runs in front of the engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Optimization {
    None,
    /// The pattern is a plain literal. Searches use `memmem` and never run
    /// the engine.
    ExactLiteral,
    /// A literal every match contains is searched for first. A prefix tells
    /// the engine where to start. Any other required literal rules out
    /// haystacks that don't contain it.
    Prefilter,
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Optimization::None => write!(f, "none"),
            Optimization::ExactLiteral => write!(f, "exact-literal-bypass"),
            Optimization::Prefilter => write!(f, "prefilter"),
        }
    }
}

/// A description of how a [`Regex`](super::Regex) was built and how its
/// lazy DFA caches have performed.
#[derive(Clone, Debug)]
pub struct Stats {
    pub(crate) pattern: String,
    pub(crate) engine: Engine,
    pub(crate) optimization: Optimization,
    pub(crate) complexity: PatternComplexity,
    pub(crate) lazy: Option<hybrid::Stats>,
}

impl Stats {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn optimization(&self) -> Optimization {
        self.optimization
    }

    pub fn complexity(&self) -> PatternComplexity {
        self.complexity
    }

    /// Cache counters summed over every idle lazy DFA cache, or `None` if
    /// no lazy DFA was built.
    pub fn lazy(&self) -> Option<hybrid::Stats> {
        self.lazy
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "pattern: {:?}", self.pattern)?;
        writeln!(f, "engine: {}", self.engine)?;
        writeln!(f, "optimization: {}", self.optimization)?;
        writeln!(f, "complexity: {}", self.complexity)?;
        match self.lazy {
            None => write!(f, "lazy DFA cache: unused"),
            Some(ref lazy) => write!(
                f,
                "lazy DFA cache: {} hits, {} misses, {} evictions",
                lazy.hits(),
                lazy.misses(),
                lazy.evictions(),
            ),
        }
    }
}
