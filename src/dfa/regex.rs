/*!
The eager DFA matcher.

A [`Regex`] wraps a compiled [`Automaton`] and picks the fastest way to
search with it when it's built:

* A plain literal is searched for with `memchr::memmem` and never walks the
table.
* A single class with an unbounded repetition (such as `[a-z]+` or `.*`)
counts runs of class members, eight bytes at a time. A class with an upper
bound (such as `[0-9]{2,4}`) can't be decided by run length alone and always
walks the table.
* Everything else walks the table from each candidate start position.
Candidates are found by scanning for the bytes a match can start with.
*/

use crate::{
    complexity::{sequence, unwrap_groups, Shape},
    dfa::{
        automaton::Automaton,
        compiler::{Compiler, Config},
        search,
    },
    error::Error,
    syntax::Ast,
    util::{alphabet::ByteSet, iter, prefilter::Prefilter, search::Match},
};

/// A builder for an eager DFA [`Regex`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    compiler: Compiler,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.compiler.configure(config);
        self
    }

    pub fn build(&self, pattern: &str) -> Result<Regex, Error> {
        self.build_from_ast(&Ast::parse(pattern)?)
    }

    pub fn build_from_ast(&self, ast: &Ast) -> Result<Regex, Error> {
        let dfa = self.compiler.compile(ast)?;
        let accel = Accel::new(&dfa, ast);
        let first = if dfa.is_accepting(dfa.start_state()) {
            None
        } else {
            Some(dfa.first_bytes())
        };
        let prefilter = first.as_ref().and_then(Prefilter::from_byteset);
        Ok(Regex { dfa, accel, first, prefilter })
    }
}

/// A regex backed by an eager DFA.
///
/// Searching never allocates (apart from collecting [`Regex::match_all`]
/// results) and never mutates the regex, so one value may be shared freely
/// between threads.
#[derive(Clone, Debug)]
pub struct Regex {
    dfa: Automaton,
    accel: Accel,
    /// The bytes a match can start with, unless a match can be empty.
    first: Option<ByteSet>,
    prefilter: Option<Prefilter>,
}

#[derive(Clone, Debug)]
enum Accel {
    Table,
    Literal(Prefilter),
    ClassRun { set: ByteSet, min: usize },
}

impl Accel {
    fn new(dfa: &Automaton, ast: &Ast) -> Accel {
        let (_, body, _) = ast.strip_anchors();
        match dfa.shape() {
            Shape::Literal => match body.as_literal() {
                Some(lit) => match Prefilter::from_literal(&lit) {
                    Some(finder) => Accel::Literal(finder),
                    None => Accel::Table,
                },
                None => Accel::Table,
            },
            Shape::QuantifiedClass | Shape::Wildcard
                if !dfa.has_end_anchor() =>
            {
                let items = sequence(&body);
                match items.as_slice() {
                    [Ast::Repetition(rep)] if rep.max.is_none() => {
                        match unwrap_groups(&rep.ast).byte_set() {
                            Some(set) => {
                                Accel::ClassRun { set, min: rep.min as usize }
                            }
                            None => Accel::Table,
                        }
                    }
                    _ => Accel::Table,
                }
            }
            _ => Accel::Table,
        }
    }
}

impl Regex {
    /// Parse and compile a pattern into an eager DFA regex.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Regex::builder().build(pattern)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn automaton(&self) -> &Automaton {
        &self.dfa
    }

    /// Returns true if searches skip the transition table entirely.
    pub fn is_accelerated(&self) -> bool {
        !matches!(self.accel, Accel::Table)
    }

    /// Return the match that begins exactly at `start`, if any.
    pub fn match_first(&self, haystack: &[u8], start: usize) -> Option<Match> {
        if start > haystack.len() || (self.dfa.has_start_anchor() && start != 0)
        {
            return None;
        }
        match self.accel {
            Accel::Table => search::find_fwd_at(&self.dfa, haystack, start),
            Accel::Literal(ref finder) => search::find_literal_at(
                finder,
                self.dfa.has_end_anchor(),
                haystack,
                start,
            ),
            Accel::ClassRun { ref set, min } => {
                search::find_run_at(set, min, haystack, start)
            }
        }
    }

    /// Return the leftmost match that begins at or after `start`, if any.
    pub fn match_next(&self, haystack: &[u8], start: usize) -> Option<Match> {
        if start > haystack.len() {
            return None;
        }
        if self.dfa.has_start_anchor() {
            return if start == 0 { self.match_first(haystack, 0) } else { None };
        }
        match self.accel {
            Accel::Table => search::find_fwd(
                &self.dfa,
                self.first.as_ref(),
                self.prefilter.as_ref(),
                haystack,
                start,
            ),
            Accel::Literal(ref finder) => search::find_literal(
                finder,
                self.dfa.has_end_anchor(),
                haystack,
                start,
            ),
            Accel::ClassRun { ref set, min } => {
                search::find_run(set, min, haystack, start)
            }
        }
    }

    /// Return every non-overlapping match, from left to right.
    pub fn match_all(&self, haystack: &[u8]) -> Vec<Match> {
        iter::find_all(haystack, |at| self.match_next(haystack, at))
    }

    pub fn memory_usage(&self) -> usize {
        self.dfa.memory_usage()
            + self.prefilter.as_ref().map_or(0, |p| p.memory_usage())
            + match self.accel {
                Accel::Literal(ref finder) => finder.memory_usage(),
                _ => 0,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_all(pattern: &str, haystack: &str) -> Vec<(usize, usize)> {
        Regex::new(pattern)
            .unwrap()
            .match_all(haystack.as_bytes())
            .into_iter()
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    #[test]
    fn quantifier_boundary() {
        let re = Regex::new("[0-9]{2,4}").unwrap();
        assert!(!re.is_accelerated());
        assert_eq!(re.match_first(b"1", 0), None);
        assert_eq!(re.match_first(b"12", 0), Some(Match::new(0, 2)));
        assert_eq!(re.match_first(b"12345", 0), Some(Match::new(0, 4)));
        assert_eq!(find_all("[0-9]{2,4}", "12345"), vec![(0, 4)]);
    }

    #[test]
    fn anchors() {
        let re = Regex::new("^abc$").unwrap();
        assert_eq!(re.match_next(b"abc", 0), Some(Match::new(0, 3)));
        assert_eq!(re.match_next(b"xabc", 0), None);
        assert_eq!(re.match_next(b"abcx", 0), None);
        assert_eq!(find_all("^a", "aaa"), vec![(0, 1)]);
        assert_eq!(find_all("xyz$", "xyzxyz"), vec![(3, 6)]);
    }

    #[test]
    fn zero_width_progress() {
        assert_eq!(
            find_all("a*", "bbb"),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)],
        );
        assert_eq!(find_all("a*", "aab"), vec![(0, 2), (2, 2), (3, 3)]);
    }

    #[test]
    fn literal_acceleration() {
        let re = Regex::new("hello").unwrap();
        assert!(re.is_accelerated());
        assert_eq!(re.match_first(b"say hello", 0), None);
        assert_eq!(re.match_first(b"say hello", 4), Some(Match::new(4, 9)));
        assert_eq!(find_all("aa", "aaaaa"), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn class_run_acceleration() {
        let re = Regex::new("[0-9]{3,}").unwrap();
        assert!(re.is_accelerated());
        assert_eq!(re.match_next(b"12 345 6789", 0), Some(Match::new(3, 6)));
        assert_eq!(
            find_all("[a-z]+", "abc DEF ghijklmnopqrstu v"),
            vec![(0, 3), (8, 23), (24, 25)],
        );
        assert_eq!(find_all(".*", "ab\ncd"), vec![(0, 2), (2, 2), (3, 5), (5, 5)]);
    }

    #[test]
    fn table_walk_with_candidates() {
        assert_eq!(
            find_all("abc|def|ghi", "xxdefabcxghi"),
            vec![(2, 5), (5, 8), (9, 12)],
        );
        assert_eq!(
            find_all(r"\d+\.?\d*", "pi is 3.14, e is 2.71 and 42."),
            vec![(6, 10), (17, 21), (26, 29)],
        );
        assert_eq!(find_all("(a|b)*", "abc"), vec![(0, 2), (2, 2), (3, 3)]);
    }

    #[test]
    fn determinism() {
        let re = Regex::new("[a-z]+[0-9]+").unwrap();
        let haystack = b"abc123 def ghi45";
        let first = re.match_all(haystack);
        for _ in 0..10 {
            assert_eq!(first, re.match_all(haystack));
        }
        assert_eq!(first, vec![Match::new(0, 6), Match::new(11, 16)]);
    }
}
