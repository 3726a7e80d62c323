/*!
Static analysis of patterns, used to pick an engine before compiling one.

[`classify`] sorts a pattern into one of three tiers. Only patterns in the
[`PatternComplexity::Simple`] tier have a shape the eager DFA compiler
handles, and [`Shape::detect`] is the single place those shapes are
recognized. The compiler runs the same detection again, so the two never
disagree.
*/

use core::fmt;

use crate::{syntax::Ast, util::look::LookSet};

/// Patterns scoring above this are never `Simple`.
const SIMPLE_SCORE_LIMIT: usize = 30;
/// Patterns scoring above this are `Complex`.
const MEDIUM_SCORE_LIMIT: usize = 80;
/// Patterns nested deeper than this are `Complex`.
const MEDIUM_DEPTH_LIMIT: usize = 4;

/// The cost tier of a pattern.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum PatternComplexity {
    Simple,
    Medium,
    Complex,
}

impl fmt::Display for PatternComplexity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PatternComplexity::Simple => write!(f, "SIMPLE"),
            PatternComplexity::Medium => write!(f, "MEDIUM"),
            PatternComplexity::Complex => write!(f, "COMPLEX"),
        }
    }
}

/// The pattern shapes an eager DFA can represent exactly.
///
/// Every shape may be wrapped in a leading start anchor and a trailing end
/// anchor. No other assertion is allowed, and neither are non-greedy
/// repetitions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Shape {
    /// A plain literal such as `hello`.
    Literal,
    /// Nothing but anchors, such as `^`, `$` or `^$`.
    AnchorOnly,
    /// One quantified class or byte, such as `[a-z]+` or `[0-9]{2,4}`.
    QuantifiedClass,
    /// A sequence of classes, bytes and literals, each of which may be
    /// quantified, such as `[a-z]+[0-9]+`.
    ClassSequence,
    /// An alternation of literals, such as `abc|def|ghi`.
    LiteralAlternation,
    /// A quantified alternation of literals, such as `(a|b)*`.
    QuantifiedAlternation,
    /// A quantified literal group, such as `(abc)+`.
    QuantifiedGroup,
    /// A quantified wildcard, such as `.*`.
    Wildcard,
    /// An alternation of literals sharing a common prefix, such as
    /// `(hello|help|helicopter)`.
    PrefixAlternation,
}

impl Shape {
    /// Detect the shape of the given pattern, or return `None` if it has no
    /// shape an eager DFA supports.
    pub fn detect(ast: &Ast) -> Option<Shape> {
        let (_, body, _) = ast.strip_anchors();
        if !body.look_set().is_empty() || body.has_lazy_repetition() {
            return None;
        }
        let items = sequence(&body);
        if items.is_empty() {
            return Some(Shape::AnchorOnly);
        }
        if items.iter().all(|item| matches!(**item, Ast::Literal(_))) {
            return Some(Shape::Literal);
        }
        if items.len() == 1 {
            return Shape::detect_single(items[0]);
        }
        if items.iter().all(|item| is_atom(item)) {
            return Some(Shape::ClassSequence);
        }
        None
    }

    fn detect_single(item: &Ast) -> Option<Shape> {
        match *item {
            Ast::Dot { .. } => Some(Shape::Wildcard),
            Ast::Class(_) => Some(Shape::QuantifiedClass),
            Ast::Alternation(ref branches) => {
                let lits = literal_branches(branches)?;
                if common_prefix_len(&lits) >= 2 {
                    Some(Shape::PrefixAlternation)
                } else {
                    Some(Shape::LiteralAlternation)
                }
            }
            Ast::Repetition(ref rep) => {
                let inner = unwrap_groups(&rep.ast);
                if let Ast::Dot { .. } = *inner {
                    return Some(Shape::Wildcard);
                }
                if inner.byte_set().is_some() {
                    return Some(Shape::QuantifiedClass);
                }
                if let Ast::Alternation(ref branches) = *inner {
                    literal_branches(branches)?;
                    return Some(Shape::QuantifiedAlternation);
                }
                match inner.as_literal() {
                    Some(ref lit) if !lit.is_empty() => {
                        Some(Shape::QuantifiedGroup)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Flatten a pattern body into the sequence of elements it matches one
/// after the other. Concatenations and groups that aren't repeated are looked
/// through, since they don't change what an eager DFA needs to build.
pub(crate) fn sequence(ast: &Ast) -> Vec<&Ast> {
    fn go<'a>(ast: &'a Ast, items: &mut Vec<&'a Ast>) {
        match *ast {
            Ast::Empty => {}
            Ast::Concat(ref asts) => {
                for ast in asts.iter() {
                    go(ast, items);
                }
            }
            Ast::Group(ref group) => go(&group.ast, items),
            _ => items.push(ast),
        }
    }
    let mut items = vec![];
    go(ast, &mut items);
    items
}

/// Look through any groups wrapping the given expression.
pub(crate) fn unwrap_groups(mut ast: &Ast) -> &Ast {
    while let Ast::Group(ref group) = *ast {
        ast = &group.ast;
    }
    ast
}

/// Returns the literal of every branch, or `None` if some branch isn't a
/// literal.
pub(crate) fn literal_branches(branches: &[Ast]) -> Option<Vec<Vec<u8>>> {
    branches.iter().map(|branch| branch.as_literal()).collect()
}

fn common_prefix_len(lits: &[Vec<u8>]) -> usize {
    let first = match lits.first() {
        None => return 0,
        Some(first) => first,
    };
    lits[1..].iter().fold(first.len(), |len, lit| {
        first
            .iter()
            .zip(lit.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    })
}

fn is_atom(ast: &Ast) -> bool {
    match *ast {
        Ast::Literal(_) | Ast::Dot { .. } | Ast::Class(_) => true,
        Ast::Repetition(ref rep) => {
            unwrap_groups(&rep.ast).byte_set().is_some()
        }
        _ => false,
    }
}

/// Structural facts about a pattern.
#[derive(Clone, Debug, Default)]
pub struct Census {
    /// A weighted count of the nodes in the pattern. Leaves weigh little,
    /// alternations and nested repetitions weigh a lot.
    pub score: usize,
    /// The number of alternation nodes.
    pub alternations: usize,
    /// The largest number of branches in any one alternation.
    pub max_branches: usize,
    /// The deepest nesting of groups, repetitions and alternations.
    pub depth: usize,
    /// The number of repetitions without an upper bound.
    pub unbounded_repetitions: usize,
    /// Whether some repetition contains another repetition.
    pub nested_repetition: bool,
    /// The number of explicit capture groups.
    pub captures: usize,
    /// Assertions other than a leading start anchor and a trailing end
    /// anchor.
    pub inner_looks: LookSet,
}

impl Census {
    pub fn new(ast: &Ast) -> Census {
        let mut census = Census::default();
        let (_, body, _) = ast.strip_anchors();
        census.inner_looks = body.look_set();
        census.score = census.walk(ast, 0, false);
        census
    }

    fn walk(&mut self, ast: &Ast, depth: usize, in_repetition: bool) -> usize {
        self.depth = self.depth.max(depth);
        match *ast {
            Ast::Empty => 0,
            Ast::Literal(_)
            | Ast::Dot { .. }
            | Ast::Class(_)
            | Ast::Look(_) => 1,
            Ast::Concat(ref asts) => asts
                .iter()
                .map(|ast| self.walk(ast, depth, in_repetition))
                .sum(),
            Ast::Group(ref group) => {
                if group.index.is_some() {
                    self.captures += 1;
                }
                let inner = self.walk(&group.ast, depth + 1, in_repetition);
                inner + usize::from(group.index.is_some())
            }
            Ast::Repetition(ref rep) => {
                if rep.max.is_none() {
                    self.unbounded_repetitions += 1;
                }
                let mut weight = 2;
                if in_repetition {
                    self.nested_repetition = true;
                    weight += 6;
                }
                // Large bounded repetitions unroll into many states.
                let copies =
                    rep.max.unwrap_or(rep.min).max(1).min(1 << 10) as usize;
                weight + copies * self.walk(&rep.ast, depth + 1, true)
            }
            Ast::Alternation(ref asts) => {
                self.alternations += 1;
                self.max_branches = self.max_branches.max(asts.len());
                let branches: usize = asts
                    .iter()
                    .map(|ast| self.walk(ast, depth + 1, in_repetition))
                    .sum();
                // Every branch can combine with every other one in the
                // states a DFA builds.
                branches + asts.len() * asts.len()
            }
        }
    }
}

/// Classify a pattern into a cost tier.
///
/// `Simple` patterns have a [`Shape`] and a low score. `Complex` patterns
/// either score high or nest deeply. Everything else is `Medium`.
pub fn classify(ast: &Ast) -> PatternComplexity {
    let census = Census::new(ast);
    if census.score <= SIMPLE_SCORE_LIMIT && Shape::detect(ast).is_some() {
        PatternComplexity::Simple
    } else if census.score <= MEDIUM_SCORE_LIMIT
        && census.depth <= MEDIUM_DEPTH_LIMIT
    {
        PatternComplexity::Medium
    } else {
        PatternComplexity::Complex
    }
}

/// Returns true if a lazy DFA is the best fit for the given pattern.
///
/// A lazy DFA can only handle boundary anchors, so any other assertion rules
/// it out. Beyond that, it pays off for patterns that an NFA simulation would
/// find expensive: alternations, unbounded repetitions, deep nesting or a
/// large state space.
pub fn should_use_lazy_dfa(ast: &Ast) -> bool {
    let census = Census::new(ast);
    if !census.inner_looks.is_empty() {
        return false;
    }
    census.alternations > 0
        || census.unbounded_repetitions > 0
        || census.nested_repetition
        || census.depth >= 3
        || census.score > SIMPLE_SCORE_LIMIT
}
