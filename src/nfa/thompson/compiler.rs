use crate::{
    error::Error,
    nfa::thompson::{builder::Builder, nfa::NFA},
    syntax::{Ast, Group, Repetition},
    util::primitives::StateID,
};

/// The default maximum number of states an NFA may hold while it is built.
const DEFAULT_SIZE_LIMIT: usize = 1 << 20;

/// The configuration used for compiling a Thompson NFA.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    size_limit: Option<Option<usize>>,
    captures: Option<bool>,
    reverse: Option<bool>,
}

impl Config {
    /// Return a new default Thompson NFA compiler configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Set a limit on the number of states the NFA may contain. Compiling a
    /// pattern that needs more returns an error. `None` disables the limit.
    ///
    /// The limit counts every state the compiler creates, including the
    /// empty states that are removed when the NFA is finished.
    pub fn size_limit(mut self, limit: Option<usize>) -> Config {
        self.size_limit = Some(limit);
        self
    }

    /// Whether to compile capture states for explicit groups. The implicit
    /// group `0` is always present, since it is how the PikeVM reports
    /// where a match starts.
    pub fn captures(mut self, yes: bool) -> Config {
        self.captures = Some(yes);
        self
    }

    /// Compile the NFA so that it matches the reverse of what the pattern
    /// matches. Searching it from the end of a match backwards finds where
    /// the match begins.
    pub fn reverse(mut self, yes: bool) -> Config {
        self.reverse = Some(yes);
        self
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit.unwrap_or(Some(DEFAULT_SIZE_LIMIT))
    }

    pub fn get_captures(&self) -> bool {
        self.captures.unwrap_or(true)
    }

    pub fn get_reverse(&self) -> bool {
        self.reverse.unwrap_or(false)
    }

    pub(crate) fn overwrite(self, o: Config) -> Config {
        Config {
            size_limit: o.size_limit.or(self.size_limit),
            captures: o.captures.or(self.captures),
            reverse: o.reverse.or(self.reverse),
        }
    }
}

/// A compiler from patterns to Thompson NFAs.
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    config: Config,
}

/// A fragment of the NFA under construction, with one way in and one way
/// out. The `end` state still needs to be patched to whatever follows.
#[derive(Clone, Copy, Debug)]
struct ThompsonRef {
    start: StateID,
    end: StateID,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    pub fn configure(&mut self, config: Config) -> &mut Compiler {
        self.config = self.config.overwrite(config);
        self
    }

    /// Parse and compile the given pattern.
    pub fn build(&self, pattern: &str) -> Result<NFA, Error> {
        self.build_from_ast(&Ast::parse(pattern)?)
    }

    /// Compile an already lowered pattern.
    pub fn build_from_ast(&self, ast: &Ast) -> Result<NFA, Error> {
        let mut c = Compile {
            builder: Builder::new(self.config.get_size_limit()),
            captures: self.config.get_captures(),
            reverse: self.config.get_reverse(),
        };
        let group_len =
            if c.captures { ast.captures_len() + 1 } else { 1 };

        let (open, close) = c.slots(0);
        let cap_start = c.builder.add_capture(open)?;
        let body = c.c(ast)?;
        let cap_end = c.builder.add_capture(close)?;
        let matched = c.builder.add_match()?;
        c.builder.patch(cap_start, body.start);
        c.builder.patch(body.end, cap_end);
        c.builder.patch(cap_end, matched);

        // The unanchored start state is a non-greedy `(?s:.)*?` loop in
        // front of the anchored start state.
        let unanchored = c.builder.add_union()?;
        let any = c.builder.add_range(0x00, 0xFF)?;
        c.builder.patch(unanchored, cap_start);
        c.builder.patch(unanchored, any);
        c.builder.patch(any, unanchored);

        c.builder.build(cap_start, unanchored, group_len)
    }
}

struct Compile {
    builder: Builder,
    captures: bool,
    reverse: bool,
}

impl Compile {
    /// The slots a group records its start and end in. A reverse NFA sees
    /// the end of a group first.
    fn slots(&self, index: usize) -> (usize, usize) {
        if self.reverse {
            (index * 2 + 1, index * 2)
        } else {
            (index * 2, index * 2 + 1)
        }
    }

    fn c(&mut self, ast: &Ast) -> Result<ThompsonRef, Error> {
        match *ast {
            Ast::Empty => self.c_empty(),
            Ast::Literal(ref bytes) if self.reverse => {
                let bytes: Vec<u8> = bytes.iter().rev().copied().collect();
                self.c_literal(&bytes)
            }
            Ast::Literal(ref bytes) => self.c_literal(bytes),
            Ast::Dot { .. } | Ast::Class(_) => match ast.byte_set() {
                Some(set) => {
                    let ranges: Vec<(u8, u8)> = set.iter_ranges().collect();
                    self.c_ranges(&ranges)
                }
                None => self.c_empty(),
            },
            Ast::Look(look) => {
                let look = if self.reverse { look.reversed() } else { look };
                let id = self.builder.add_look(look)?;
                Ok(ThompsonRef { start: id, end: id })
            }
            Ast::Repetition(ref rep) => self.c_repetition(rep),
            Ast::Group(ref group) => self.c_group(group),
            Ast::Concat(ref asts) if self.reverse => {
                self.c_concat(asts.iter().rev())
            }
            Ast::Concat(ref asts) => self.c_concat(asts.iter()),
            Ast::Alternation(ref asts) => self.c_alternation(asts),
        }
    }

    fn c_concat<'a, I>(&mut self, mut it: I) -> Result<ThompsonRef, Error>
    where
        I: Iterator<Item = &'a Ast>,
    {
        let first = match it.next() {
            None => return self.c_empty(),
            Some(ast) => self.c(ast)?,
        };
        let mut end = first.end;
        for ast in it {
            let compiled = self.c(ast)?;
            self.builder.patch(end, compiled.start);
            end = compiled.end;
        }
        Ok(ThompsonRef { start: first.start, end })
    }

    fn c_alternation(&mut self, asts: &[Ast]) -> Result<ThompsonRef, Error> {
        if asts.len() == 1 {
            return self.c(&asts[0]);
        }
        let union = self.builder.add_union()?;
        let end = self.builder.add_empty()?;
        for ast in asts.iter() {
            let compiled = self.c(ast)?;
            self.builder.patch(union, compiled.start);
            self.builder.patch(compiled.end, end);
        }
        Ok(ThompsonRef { start: union, end })
    }

    fn c_group(&mut self, group: &Group) -> Result<ThompsonRef, Error> {
        let index = match group.index {
            Some(index) if self.captures => index as usize,
            _ => return self.c(&group.ast),
        };
        let (open, close) = self.slots(index);
        let start = self.builder.add_capture(open)?;
        let inner = self.c(&group.ast)?;
        let end = self.builder.add_capture(close)?;
        self.builder.patch(start, inner.start);
        self.builder.patch(inner.end, end);
        Ok(ThompsonRef { start, end })
    }

    fn c_repetition(&mut self, rep: &Repetition) -> Result<ThompsonRef, Error> {
        let (ast, greedy) = (&*rep.ast, rep.greedy);
        match (rep.min, rep.max) {
            (0, Some(1)) => self.c_zero_or_one(ast, greedy),
            (min, None) => self.c_at_least(ast, greedy, min),
            (min, Some(max)) if min == max => self.c_exactly(ast, min),
            (min, Some(max)) => self.c_bounded(ast, greedy, min, max),
        }
    }

    fn c_bounded(
        &mut self,
        ast: &Ast,
        greedy: bool,
        min: u32,
        max: u32,
    ) -> Result<ThompsonRef, Error> {
        let prefix = self.c_exactly(ast, min)?;
        if min >= max {
            return Ok(prefix);
        }
        // Each optional copy may be skipped, and skipping one skips every
        // copy after it.
        let empty = self.builder.add_empty()?;
        let mut prev_end = prefix.end;
        for _ in min..max {
            let union = self.builder.add_union()?;
            let compiled = self.c(ast)?;
            self.builder.patch(prev_end, union);
            self.patch_choice(union, compiled.start, empty, greedy);
            prev_end = compiled.end;
        }
        self.builder.patch(prev_end, empty);
        Ok(ThompsonRef { start: prefix.start, end: empty })
    }

    fn c_at_least(
        &mut self,
        ast: &Ast,
        greedy: bool,
        n: u32,
    ) -> Result<ThompsonRef, Error> {
        if n == 0 && ast.can_match_empty() {
            self.c_star_empty(ast, greedy)
        } else if n == 0 {
            let union = self.builder.add_union()?;
            let compiled = self.c(ast)?;
            let empty = self.builder.add_empty()?;
            self.patch_choice(union, compiled.start, empty, greedy);
            self.builder.patch(compiled.end, union);
            Ok(ThompsonRef { start: union, end: empty })
        } else if ast.can_match_empty() {
            // The required copies come first. Only iterations past them may
            // end the loop by matching nothing.
            let prefix = self.c_exactly(ast, n)?;
            let rest = self.c_star_empty(ast, greedy)?;
            self.builder.patch(prefix.end, rest.start);
            Ok(ThompsonRef { start: prefix.start, end: rest.end })
        } else if n == 1 {
            let compiled = self.c(ast)?;
            let union = self.builder.add_union()?;
            let empty = self.builder.add_empty()?;
            self.builder.patch(compiled.end, union);
            self.patch_choice(union, compiled.start, empty, greedy);
            Ok(ThompsonRef { start: compiled.start, end: empty })
        } else {
            let prefix = self.c_exactly(ast, n - 1)?;
            let last = self.c_at_least(ast, greedy, 1)?;
            self.builder.patch(prefix.end, last.start);
            Ok(ThompsonRef { start: prefix.start, end: last.end })
        }
    }

    /// Compile `x*` for an `x` that can match the empty string.
    ///
    /// A plain loop back to the union would discard an empty iteration,
    /// since the union was already visited at that position. An empty
    /// iteration should instead be kept and end the loop. So the loop is
    /// compiled as `(?:x+)?`, and the union closing each iteration may also
    /// leave through one more copy of `x`, which catches a final empty
    /// iteration whose path through the looping copy was cut off.
    fn c_star_empty(
        &mut self,
        ast: &Ast,
        greedy: bool,
    ) -> Result<ThompsonRef, Error> {
        let outer = self.builder.add_union()?;
        let body = self.c(ast)?;
        let inner = self.builder.add_union()?;
        let last = self.c(ast)?;
        let empty = self.builder.add_empty()?;
        self.patch_choice(outer, body.start, empty, greedy);
        self.builder.patch(body.end, inner);
        if greedy {
            self.builder.patch(inner, body.start);
            self.builder.patch(inner, last.start);
            self.builder.patch(inner, empty);
        } else {
            self.builder.patch(inner, empty);
            self.builder.patch(inner, body.start);
            self.builder.patch(inner, last.start);
        }
        self.builder.patch(last.end, empty);
        Ok(ThompsonRef { start: outer, end: empty })
    }

    fn c_zero_or_one(
        &mut self,
        ast: &Ast,
        greedy: bool,
    ) -> Result<ThompsonRef, Error> {
        let union = self.builder.add_union()?;
        let compiled = self.c(ast)?;
        let empty = self.builder.add_empty()?;
        self.patch_choice(union, compiled.start, empty, greedy);
        self.builder.patch(compiled.end, empty);
        Ok(ThompsonRef { start: union, end: empty })
    }

    fn c_exactly(&mut self, ast: &Ast, n: u32) -> Result<ThompsonRef, Error> {
        self.c_concat((0..n).map(|_| ast))
    }

    fn c_literal(&mut self, bytes: &[u8]) -> Result<ThompsonRef, Error> {
        let mut it = bytes.iter();
        let start = match it.next() {
            None => return self.c_empty(),
            Some(&b) => self.builder.add_range(b, b)?,
        };
        let mut end = start;
        for &b in it {
            let next = self.builder.add_range(b, b)?;
            self.builder.patch(end, next);
            end = next;
        }
        Ok(ThompsonRef { start, end })
    }

    fn c_ranges(&mut self, ranges: &[(u8, u8)]) -> Result<ThompsonRef, Error> {
        let id = match ranges.len() {
            0 => self.builder.add_fail()?,
            1 => self.builder.add_range(ranges[0].0, ranges[0].1)?,
            _ => self.builder.add_sparse(ranges)?,
        };
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_empty(&mut self) -> Result<ThompsonRef, Error> {
        let id = self.builder.add_empty()?;
        Ok(ThompsonRef { start: id, end: id })
    }

    /// Patch both branches of a repetition's union, preferring `body` when
    /// greedy and `skip` otherwise.
    fn patch_choice(
        &mut self,
        union: StateID,
        body: StateID,
        skip: StateID,
        greedy: bool,
    ) {
        if greedy {
            self.builder.patch(union, body);
            self.builder.patch(union, skip);
        } else {
            self.builder.patch(union, skip);
            self.builder.patch(union, body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nfa::thompson::nfa::State, util::look::Look};

    fn build(pattern: &str) -> NFA {
        Compiler::new().build(pattern).unwrap()
    }

    /// Follow a chain of single byte transitions from the anchored start
    /// state to the match state.
    fn chain(nfa: &NFA) -> Vec<u8> {
        let mut sid = nfa.start_anchored();
        let mut bytes = vec![];
        loop {
            match *nfa.state(sid) {
                State::Capture { next, .. } => sid = next,
                State::ByteRange { ref trans } => {
                    bytes.push(trans.start);
                    sid = trans.next;
                }
                State::Match => break,
                ref state => panic!("unexpected state {:?}", state),
            }
        }
        bytes
    }

    #[test]
    fn literal_is_a_chain() {
        assert_eq!(chain(&build("ab")), b"ab");
    }

    #[test]
    fn reverse() {
        let nfa = Compiler::new()
            .configure(Config::new().reverse(true))
            .build("a(bc)d")
            .unwrap();
        assert_eq!(chain(&nfa), b"dcba");
        assert_eq!(nfa.group_len(), 2);
        assert_eq!(Look::Start.reversed(), Look::End);
        assert_eq!(Look::EndLine.reversed(), Look::StartLine);
    }

    #[test]
    fn empty_states_are_removed() {
        let nfa = build("a|b|c");
        // Two implicit captures, a union, three ranges, a match and the
        // unanchored prefix.
        assert_eq!(nfa.len(), 2 + 1 + 3 + 1 + 2);
    }

    #[test]
    fn group_count() {
        assert_eq!(build("(a)(?:b)(c)").group_len(), 3);
        let nfa = Compiler::new()
            .configure(Config::new().captures(false))
            .build("(a)(c)")
            .unwrap();
        assert_eq!(nfa.group_len(), 1);
    }

    #[test]
    fn size_limit() {
        let err = Compiler::new()
            .configure(Config::new().size_limit(Some(100)))
            .build("a{200}")
            .unwrap_err();
        assert!(err.is_too_many_states());
        assert!(Compiler::new()
            .configure(Config::new().size_limit(None))
            .build("a{200}")
            .is_ok());
    }

    #[test]
    fn byte_classes_split_on_ranges() {
        let nfa = build("[a-c]x");
        let classes = nfa.byte_classes();
        assert_eq!(classes.get(b'a'), classes.get(b'c'));
        assert_ne!(classes.get(b'a'), classes.get(b'x'));
        assert_ne!(classes.get(b'a'), classes.get(b'd'));
    }
}
