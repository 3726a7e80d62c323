/*!
Engine selection and dispatch.

A [`Strategy`] is decided once, when a regex is built, and consulted on every
search. Building tries the engines from cheapest to most general and keeps
the first one that accepts the pattern:

1. An eager DFA, for patterns classified as simple.
2. A lazy DFA, for patterns the complexity census says are worth it.
3. A one-pass DFA.
4. The PikeVM, which accepts everything.

The PikeVM is always built, since it is the only engine that reports
capture groups for every pattern. A one-pass DFA is also built for patterns
with capture groups, even when another engine finds the overall matches,
because it reports groups much faster than the PikeVM.
*/

use crate::{
    complexity::{self, PatternComplexity},
    dfa::{self, onepass},
    error::Error,
    hybrid,
    meta::{
        regex::Config,
        stats::{Engine, Optimization},
    },
    nfa::thompson::{self, pikevm::{self, PikeVM}},
    syntax::Ast,
    util::{
        captures::Captures, literal, prefilter::Prefilter, search::Match,
    },
};

#[derive(Debug)]
pub(crate) struct Strategy {
    engine: Engine,
    optimization: Optimization,
    complexity: PatternComplexity,
    group_len: usize,
    dfa: Option<dfa::regex::Regex>,
    hybrid: Option<hybrid::DFA>,
    onepass: Option<onepass::OnePass>,
    pikevm: PikeVM,
    /// Set when the pattern is a plain literal.
    literal: Option<ExactLiteral>,
    /// Set when a literal every match contains is worth scanning for.
    required: Option<RequiredLiteral>,
}

#[derive(Debug)]
struct ExactLiteral {
    bytes: Vec<u8>,
    finder: Prefilter,
}

#[derive(Debug)]
struct RequiredLiteral {
    pre: Prefilter,
    prefix: bool,
}

/// Scratch space for every engine that needs it.
#[derive(Clone, Debug)]
pub(crate) struct Cache {
    hybrid: Option<hybrid::Cache>,
    onepass: Option<onepass::Cache>,
    pikevm: pikevm::Cache,
}

impl Cache {
    pub(crate) fn lazy_stats(&self) -> Option<hybrid::Stats> {
        self.hybrid.as_ref().map(|cache| cache.stats())
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.hybrid.as_ref().map_or(0, |c| c.memory_usage())
            + self.onepass.as_ref().map_or(0, |c| c.memory_usage())
            + self.pikevm.memory_usage()
    }
}

impl Strategy {
    pub(crate) fn new(config: &Config, ast: &Ast) -> Result<Strategy, Error> {
        let complexity = complexity::classify(ast);
        // The PikeVM is the fallback for everything, so its errors are the
        // only engine errors that reach the caller.
        let nfa = thompson::Compiler::new()
            .configure(
                thompson::Config::new()
                    .size_limit(config.get_nfa_size_limit()),
            )
            .build_from_ast(ast)?;
        let pikevm = PikeVM::new_from_nfa(nfa);

        let mut dfa = None;
        if config.get_dfa() && complexity == PatternComplexity::Simple {
            match dfa::regex::Builder::new().build_from_ast(ast) {
                Ok(re) => dfa = Some(re),
                Err(_err) => {
                    debug!("eager DFA rejected pattern: {}", _err);
                }
            }
        }
        let mut lazy = None;
        if dfa.is_none()
            && config.get_hybrid()
            && complexity::should_use_lazy_dfa(ast)
        {
            let result = hybrid::DFA::builder()
                .configure(config.get_hybrid_config())
                .thompson(
                    thompson::Config::new()
                        .size_limit(config.get_nfa_size_limit()),
                )
                .build_from_ast(ast);
            match result {
                Ok(re) => lazy = Some(re),
                Err(_err) => {
                    debug!("lazy DFA rejected pattern: {}", _err);
                }
            }
        }
        let group_len = ast.captures_len() + 1;
        let mut one = None;
        let wanted = group_len > 1 || (dfa.is_none() && lazy.is_none());
        if config.get_onepass() && wanted {
            match onepass::Builder::new().build_from_ast(ast) {
                Ok(re) => one = Some(re),
                Err(_err) => {
                    debug!("one-pass DFA rejected pattern: {}", _err);
                }
            }
        }
        let engine = if dfa.is_some() {
            Engine::DFA
        } else if lazy.is_some() {
            Engine::LazyDFA
        } else if one.is_some() {
            Engine::OnePass
        } else {
            Engine::NFA
        };

        let literal = if config.get_literal_bypass() {
            ast.as_literal().and_then(|bytes| {
                let finder = Prefilter::from_literal(&bytes)?;
                Some(ExactLiteral { bytes, finder })
            })
        } else {
            None
        };
        // The eager DFA runs its own prefilter.
        let required = if literal.is_none()
            && engine != Engine::DFA
            && config.get_prefilter()
        {
            literal::get_best_literal(ast).and_then(|lit| {
                let pre = Prefilter::from_literal(lit.as_bytes())?;
                Some(RequiredLiteral { pre, prefix: lit.is_prefix() })
            })
        } else {
            None
        };
        let optimization = if literal.is_some() {
            Optimization::ExactLiteral
        } else if required.is_some() {
            Optimization::Prefilter
        } else {
            Optimization::None
        };
        debug!(
            "selected engine {} with optimization {} for {} pattern",
            engine, optimization, complexity,
        );
        Ok(Strategy {
            engine,
            optimization,
            complexity,
            group_len,
            dfa,
            hybrid: lazy,
            onepass: one,
            pikevm,
            literal,
            required,
        })
    }

    pub(crate) fn engine(&self) -> Engine {
        self.engine
    }

    pub(crate) fn optimization(&self) -> Optimization {
        self.optimization
    }

    pub(crate) fn complexity(&self) -> PatternComplexity {
        self.complexity
    }

    pub(crate) fn group_len(&self) -> usize {
        self.group_len
    }

    pub(crate) fn create_cache(&self) -> Cache {
        Cache {
            hybrid: self.hybrid.as_ref().map(|re| re.create_cache()),
            onepass: self.onepass.as_ref().map(|re| re.create_cache()),
            pikevm: self.pikevm.create_cache(),
        }
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.dfa.as_ref().map_or(0, |re| re.memory_usage())
            + self.onepass.as_ref().map_or(0, |re| re.memory_usage())
            + self.pikevm.nfa().memory_usage()
    }

    pub(crate) fn match_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if start > haystack.len() {
            return None;
        }
        if let Some(ref lit) = self.literal {
            if !haystack[start..].starts_with(&lit.bytes) {
                return None;
            }
            return Some(Match::new(start, start + lit.bytes.len()));
        }
        if let Some(ref req) = self.required {
            let possible = if req.prefix {
                req.pre.is_prefix(haystack, start)
            } else {
                req.pre.find(haystack, start).is_some()
            };
            if !possible {
                return None;
            }
        }
        self.engine_first(cache, haystack, start)
    }

    pub(crate) fn match_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if start > haystack.len() {
            return None;
        }
        if let Some(ref lit) = self.literal {
            return lit.finder.find(haystack, start);
        }
        let mut at = start;
        if let Some(ref req) = self.required {
            let candidate = req.pre.find(haystack, start)?;
            if req.prefix {
                at = candidate.start();
            }
        }
        self.engine_next(cache, haystack, at)
    }

    /// Fill `caps` with the groups of the match beginning exactly at
    /// `start`. Returns true on a match.
    pub(crate) fn captures_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        if self.match_first(cache, haystack, start).is_none() {
            caps.clear();
            return false;
        }
        self.captures_at(cache, haystack, start, caps)
    }

    /// Fill `caps` with the groups of the leftmost match at or after
    /// `start`. The fastest engine finds where the match begins, then a
    /// capture-aware engine runs from there.
    pub(crate) fn captures_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        match self.match_next(cache, haystack, start) {
            None => {
                caps.clear();
                false
            }
            Some(m) => self.captures_at(cache, haystack, m.start(), caps),
        }
    }

    fn captures_at(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
        caps: &mut Captures,
    ) -> bool {
        if let (Some(re), Some(c)) = (&self.onepass, cache.onepass.as_mut()) {
            return re.captures_first(c, haystack, start, caps);
        }
        self.pikevm.captures_at(&mut cache.pikevm, haystack, start, true, caps);
        caps.is_match()
    }

    fn engine_first(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if let Some(ref re) = self.dfa {
            return re.match_first(haystack, start);
        }
        if let (Some(re), Some(c)) = (&self.hybrid, cache.hybrid.as_mut()) {
            return re.match_first(c, haystack, start);
        }
        if let (Some(re), Some(c)) = (&self.onepass, cache.onepass.as_mut()) {
            return re.match_first(c, haystack, start);
        }
        self.pikevm.match_first(&mut cache.pikevm, haystack, start)
    }

    fn engine_next(
        &self,
        cache: &mut Cache,
        haystack: &[u8],
        start: usize,
    ) -> Option<Match> {
        if let Some(ref re) = self.dfa {
            return re.match_next(haystack, start);
        }
        if let (Some(re), Some(c)) = (&self.hybrid, cache.hybrid.as_mut()) {
            return re.match_next(c, haystack, start);
        }
        if let (Some(re), Some(c)) = (&self.onepass, cache.onepass.as_mut()) {
            return re.match_next(c, haystack, start);
        }
        self.pikevm.match_next(&mut cache.pikevm, haystack, start)
    }
}
