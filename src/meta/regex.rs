use std::{
    panic::{RefUnwindSafe, UnwindSafe},
    sync::Arc,
};

use crate::{
    complexity::PatternComplexity,
    error::Error,
    hybrid,
    meta::{
        stats::{Engine, Optimization, Stats},
        strategy::{Cache, Strategy},
    },
    syntax::Ast,
    util::{captures::Captures, iter, pool::Pool, search::Match},
};

type CachePoolFn =
    Box<dyn Fn() -> Cache + Send + Sync + UnwindSafe + RefUnwindSafe>;

/// A compiled pattern that routes every search to the cheapest engine able
/// to run it.
///
/// A `Regex` is cheap to clone and safe to share between threads. Engines
/// that need scratch space during a search take it from an internal pool, so
/// concurrent searches never contend on more than the pool's lock.
///
/// `match_first` only reports a match beginning exactly at the given
/// position, `match_next` reports the leftmost match at or after it and
/// `match_all` reports every non-overlapping match. Offsets are byte offsets.
///
/// # Example
///
/// ```
/// use regex_hybrid::meta::{Engine, Regex};
///
/// let re = Regex::new(r"[0-9]{4}-[0-9]{2}")?;
/// assert_eq!(Engine::DFA, re.engine());
///
/// let spans: Vec<_> = re
///     .match_all(b"1999-12, 2023-01")
///     .into_iter()
///     .map(|m| m.range())
///     .collect();
/// assert_eq!(spans, vec![0..7, 9..16]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: Arc<str>,
    strat: Arc<Strategy>,
    pool: Arc<Pool<Cache, CachePoolFn>>,
}

impl Regex {
    /// Compile a pattern with the default configuration.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Regex::builder().build(pattern)
    }

    pub fn config() -> Config {
        Config::new()
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The number of groups, including the implicit group `0` for the
    /// overall match.
    pub fn group_len(&self) -> usize {
        self.strat.group_len()
    }

    pub fn engine(&self) -> Engine {
        self.strat.engine()
    }

    pub fn optimization(&self) -> Optimization {
        self.strat.optimization()
    }

    pub fn complexity(&self) -> PatternComplexity {
        self.strat.complexity()
    }

    /// Describe how this regex was built. Lazy DFA counters are collected
    /// from caches not currently in use by a search.
    pub fn stats(&self) -> Stats {
        let mut lazy: Option<hybrid::Stats> = None;
        self.pool.for_each_idle(|cache| {
            if let Some(stats) = cache.lazy_stats() {
                lazy.get_or_insert_with(hybrid::Stats::default).add(&stats);
            }
        });
        if lazy.is_none() && self.engine() == Engine::LazyDFA {
            lazy = Some(hybrid::Stats::default());
        }
        Stats {
            pattern: self.pattern.to_string(),
            engine: self.engine(),
            optimization: self.optimization(),
            complexity: self.complexity(),
            lazy,
        }
    }

    #[cfg(test)]
    pub(crate) fn strategy(&self) -> Arc<Strategy> {
        Arc::clone(&self.strat)
    }

    /// Heap memory used by the compiled engines, not counting caches.
    pub fn memory_usage(&self) -> usize {
        self.strat.memory_usage()
    }

    pub fn create_captures(&self) -> Captures {
        Captures::new(self.group_len())
    }

    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.match_next(haystack, 0).is_some()
    }

    /// Return the match that begins exactly at `start`.
    pub fn match_first(&self, haystack: &[u8], start: usize) -> Option<Match> {
        let mut cache = self.pool.get();
        self.strat.match_first(&mut cache, haystack, start)
    }

    /// Return the leftmost match that begins at or after `start`.
    pub fn match_next(&self, haystack: &[u8], start: usize) -> Option<Match> {
        let mut cache = self.pool.get();
        self.strat.match_next(&mut cache, haystack, start)
    }

    /// Return every non-overlapping match from left to right. After an
    /// empty match, the next search begins one byte further on.
    pub fn match_all(&self, haystack: &[u8]) -> Vec<Match> {
        let mut cache = self.pool.get();
        iter::find_all(haystack, |at| {
            self.strat.match_next(&mut cache, haystack, at)
        })
    }

    /// Return the groups of the match that begins exactly at `start`.
    pub fn captures_first(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<Captures> {
        let mut cache = self.pool.get();
        let mut caps = self.create_captures();
        if self.strat.captures_first(&mut cache, haystack, start, &mut caps) {
            Some(caps)
        } else {
            None
        }
    }

    /// Return the groups of the leftmost match at or after `start`.
    pub fn captures_next(
        &self,
        haystack: &[u8],
        start: usize,
    ) -> Option<Captures> {
        let mut cache = self.pool.get();
        let mut caps = self.create_captures();
        if self.strat.captures_next(&mut cache, haystack, start, &mut caps) {
            Some(caps)
        } else {
            None
        }
    }

    /// Return the groups of every non-overlapping match.
    pub fn captures_all(&self, haystack: &[u8]) -> Vec<Captures> {
        let mut cache = self.pool.get();
        let mut all = vec![];
        let mut searcher = iter::Searcher::new(haystack.len());
        let mut caps = self.create_captures();
        loop {
            let found = searcher.advance(|at| {
                self.strat.captures_next(&mut cache, haystack, at, &mut caps);
                caps.get_match()
            });
            if found.is_none() {
                break;
            }
            all.push(caps.clone());
        }
        all
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &self.pattern)
            .field("engine", &self.engine())
            .field("optimization", &self.optimization())
            .finish()
    }
}

/// The configuration of a [`Regex`]. Every engine and optimization can be
/// turned off, which is mostly useful for testing one against another.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    dfa: Option<bool>,
    hybrid: Option<bool>,
    onepass: Option<bool>,
    literal_bypass: Option<bool>,
    prefilter: Option<bool>,
    nfa_size_limit: Option<Option<usize>>,
    hybrid_config: Option<hybrid::Config>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn dfa(self, yes: bool) -> Config {
        Config { dfa: Some(yes), ..self }
    }

    pub fn hybrid(self, yes: bool) -> Config {
        Config { hybrid: Some(yes), ..self }
    }

    pub fn onepass(self, yes: bool) -> Config {
        Config { onepass: Some(yes), ..self }
    }

    /// Whether plain literal patterns are searched for with `memmem`
    /// instead of an engine.
    pub fn literal_bypass(self, yes: bool) -> Config {
        Config { literal_bypass: Some(yes), ..self }
    }

    /// Whether a required literal is scanned for ahead of the engine.
    pub fn prefilter(self, yes: bool) -> Config {
        Config { prefilter: Some(yes), ..self }
    }

    pub fn nfa_size_limit(self, limit: Option<usize>) -> Config {
        Config { nfa_size_limit: Some(limit), ..self }
    }

    /// Set the configuration of the lazy DFA, such as its cache capacity.
    pub fn hybrid_config(self, config: hybrid::Config) -> Config {
        Config { hybrid_config: Some(config), ..self }
    }

    pub fn get_dfa(&self) -> bool {
        self.dfa.unwrap_or(true)
    }

    pub fn get_hybrid(&self) -> bool {
        self.hybrid.unwrap_or(true)
    }

    pub fn get_onepass(&self) -> bool {
        self.onepass.unwrap_or(true)
    }

    pub fn get_literal_bypass(&self) -> bool {
        self.literal_bypass.unwrap_or(true)
    }

    pub fn get_prefilter(&self) -> bool {
        self.prefilter.unwrap_or(true)
    }

    pub fn get_nfa_size_limit(&self) -> Option<usize> {
        self.nfa_size_limit.unwrap_or(Some(1 << 20))
    }

    pub fn get_hybrid_config(&self) -> hybrid::Config {
        self.hybrid_config.unwrap_or_default()
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. Options not set in `o` keep their value from `self`.
    pub(crate) fn overwrite(&self, o: Config) -> Config {
        Config {
            dfa: o.dfa.or(self.dfa),
            hybrid: o.hybrid.or(self.hybrid),
            onepass: o.onepass.or(self.onepass),
            literal_bypass: o.literal_bypass.or(self.literal_bypass),
            prefilter: o.prefilter.or(self.prefilter),
            nfa_size_limit: o.nfa_size_limit.or(self.nfa_size_limit),
            hybrid_config: match (self.hybrid_config, o.hybrid_config) {
                (Some(a), Some(b)) => Some(a.overwrite(b)),
                (a, b) => b.or(a),
            },
        }
    }
}

/// A builder for a [`Regex`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    pub fn build(&self, pattern: &str) -> Result<Regex, Error> {
        let ast = Ast::parse(pattern)?;
        let strat = Arc::new(Strategy::new(&self.config, &ast)?);
        let pool = {
            let strat = Arc::clone(&strat);
            let create: CachePoolFn = Box::new(move || strat.create_cache());
            Arc::new(Pool::new(create))
        };
        Ok(Regex { pattern: Arc::from(pattern), strat, pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(re: &Regex, haystack: &str) -> Vec<(usize, usize)> {
        re.match_all(haystack.as_bytes())
            .into_iter()
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn routing() {
        let engine = |p: &str| Regex::new(p).unwrap().engine();
        assert_eq!(Engine::DFA, engine("[a-z]+[0-9]+"));
        assert_eq!(Engine::DFA, engine("cat|dog"));
        assert_eq!(Engine::LazyDFA, engine(r"(\d+|[a-z]+)@(\w|-)+\.com"));
        assert_eq!(Engine::OnePass, engine(r"\bfoo\b"));
        assert_eq!(Engine::NFA, engine(r"\b(a|ab|abc|abcd|abcde)\b"));

        let re = Regex::builder()
            .configure(Config::new().dfa(false).hybrid(false).onepass(false))
            .build("[a-z]+")
            .unwrap();
        assert_eq!(Engine::NFA, re.engine());
    }

    #[test]
    fn optimizations() {
        let re = Regex::new("hello").unwrap();
        assert_eq!(Optimization::ExactLiteral, re.optimization());
        assert_eq!(spans(&re, "hello hellohello"), vec![(0, 5), (6, 11), (11, 16)]);
        assert_eq!(re.match_first(b"xhello", 0), None);
        assert_eq!(re.match_first(b"xhello", 1), Some(Match::new(1, 6)));

        let re = Regex::new(r"\bfoo\w+").unwrap();
        assert_eq!(Optimization::Prefilter, re.optimization());
        assert_eq!(spans(&re, "a foobar xfoo food"), vec![(2, 8), (14, 18)]);

        let re = Regex::builder()
            .configure(Config::new().literal_bypass(false))
            .build("hello")
            .unwrap();
        assert_eq!(Optimization::None, re.optimization());
        assert_eq!(spans(&re, "hellohello"), vec![(0, 5), (5, 10)]);
    }

    #[test]
    fn captures() {
        let re = Regex::new(r"([a-z]+)@([a-z]+)\.com").unwrap();
        let caps = re.captures_next(b"mail bob@example.com now", 0).unwrap();
        assert_eq!(Some(Match::new(5, 20)), caps.get_match());
        assert_eq!(Some(Match::with_group(1, 5, 8)), caps.get_group(1));
        assert_eq!(Some(Match::with_group(2, 9, 16)), caps.get_group(2));

        let re = Regex::new(r"(a)|b").unwrap();
        let all = re.captures_all(b"ab");
        assert_eq!(2, all.len());
        assert!(all[0].get_group(1).is_some());
        assert!(all[1].get_group(1).is_none());
        assert!(re.captures_first(b"xab", 0).is_none());
    }

    #[test]
    fn stats() {
        let re = Regex::new("(foo|bar)+baz").unwrap();
        assert_eq!(Engine::LazyDFA, re.engine());
        re.match_all(b"foobarbaz foofoobaz");
        let stats = re.stats();
        let lazy = stats.lazy().unwrap();
        assert!(lazy.misses() > 0);
        assert!(lazy.hits() > 0);
        let text = stats.to_string();
        assert!(text.contains("engine: lazy DFA"));
        assert!(text.contains("optimization: prefilter"));

        let stats = Regex::new("abc").unwrap().stats();
        assert!(stats.lazy().is_none());
        assert!(stats.to_string().contains("exact-literal-bypass"));
    }

    #[test]
    fn errors() {
        assert!(Regex::new("a(").unwrap_err().is_syntax());
        let err = Regex::builder()
            .configure(Config::new().nfa_size_limit(Some(10)))
            .build("[a-z]{100}")
            .unwrap_err();
        assert!(err.is_too_many_states());
    }
}
