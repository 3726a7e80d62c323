/*!
The pattern representation every engine in this crate compiles from.

Patterns are parsed with [`regex_syntax`]'s AST parser and then lowered into
the byte oriented [`Ast`] defined here. Lowering resolves flags
(case-insensitivity, multi-line anchors, dot-matches-newline and swapped
greediness), turns every class into a [`ByteSet`] and encodes non-ASCII
literals as UTF-8.

Character classes are ASCII only. Unicode classes such as `\pL`, or class
members outside of ASCII, are rejected with an "unsupported" error. Features
the parser itself doesn't support, such as backreferences and look-around,
are syntax errors.
*/

use regex_syntax::ast::{self, parse::ParserBuilder};

use crate::{
    error::Error,
    util::{
        alphabet::ByteSet,
        look::{Look, LookSet},
    },
};

/// The maximum nesting depth the parser accepts.
const NEST_LIMIT: u32 = 250;

/// A lowered regular expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Ast {
    /// Matches the empty string.
    Empty,
    /// A (possibly multi-byte) literal string.
    Literal(Vec<u8>),
    /// Any byte, except `\n` unless `dotall` is set.
    Dot { dotall: bool },
    /// A single byte drawn from a class.
    Class(Class),
    /// A zero-width assertion.
    Look(Look),
    /// A repeated sub-expression.
    Repetition(Repetition),
    /// A group, which may or may not capture.
    Group(Group),
    /// A sequence of sub-expressions.
    Concat(Vec<Ast>),
    /// A choice between sub-expressions, in priority order.
    Alternation(Vec<Ast>),
}

/// A class of bytes.
///
/// The members are stored as written in the pattern. A negated class
/// matches every byte that is *not* in `set`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Class {
    pub set: ByteSet,
    pub negated: bool,
}

impl Class {
    /// Returns every byte this class matches.
    pub fn matching_bytes(&self) -> ByteSet {
        if self.negated {
            self.set.negate()
        } else {
            self.set
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repetition {
    pub min: u32,
    /// The upper bound, or `None` if unbounded.
    pub max: Option<u32>,
    pub greedy: bool,
    pub ast: Box<Ast>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    /// The capture index, starting at `1`. `None` for non-capturing groups.
    pub index: Option<u32>,
    pub name: Option<String>,
    pub ast: Box<Ast>,
}

impl Ast {
    /// Parse and lower a pattern.
    pub fn parse(pattern: &str) -> Result<Ast, Error> {
        let parsed = ParserBuilder::new()
            .nest_limit(NEST_LIMIT)
            .octal(false)
            .build()
            .parse(pattern)
            .map_err(Error::syntax)?;
        Translator::default().lower(&parsed)
    }

    /// Returns the bytes matched by this node if it always consumes exactly
    /// one byte: a dot, a class or a one byte literal.
    pub fn byte_set(&self) -> Option<ByteSet> {
        match *self {
            Ast::Literal(ref bytes) if bytes.len() == 1 => {
                Some(ByteSet::from_bytes(bytes.iter().copied()))
            }
            Ast::Dot { dotall: true } => Some(ByteSet::full()),
            Ast::Dot { dotall: false } => {
                let mut set = ByteSet::full();
                set.remove(b'\n');
                Some(set)
            }
            Ast::Class(ref class) => Some(class.matching_bytes()),
            _ => None,
        }
    }

    /// Returns the literal this node matches, if it matches exactly one
    /// string. Groups are looked through.
    pub fn as_literal(&self) -> Option<Vec<u8>> {
        match *self {
            Ast::Empty => Some(vec![]),
            Ast::Literal(ref bytes) => Some(bytes.clone()),
            Ast::Group(ref group) => group.ast.as_literal(),
            Ast::Concat(ref asts) => {
                let mut lit = vec![];
                for ast in asts.iter() {
                    lit.extend(ast.as_literal()?);
                }
                Some(lit)
            }
            _ => None,
        }
    }

    /// Returns true if this expression can match without consuming any
    /// bytes. Assertions count as empty.
    pub fn can_match_empty(&self) -> bool {
        match *self {
            Ast::Empty | Ast::Look(_) => true,
            Ast::Literal(ref bytes) => bytes.is_empty(),
            Ast::Dot { .. } | Ast::Class(_) => false,
            Ast::Repetition(ref rep) => {
                rep.min == 0 || rep.ast.can_match_empty()
            }
            Ast::Group(ref group) => group.ast.can_match_empty(),
            Ast::Concat(ref asts) => asts.iter().all(Ast::can_match_empty),
            Ast::Alternation(ref asts) => {
                asts.iter().any(Ast::can_match_empty)
            }
        }
    }

    /// Returns the bounds of this node when viewed as a repetition. Nodes
    /// that aren't repetitions match exactly once.
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match *self {
            Ast::Repetition(ref rep) => (rep.min, rep.max),
            _ => (1, Some(1)),
        }
    }

    /// Split boundary anchors off of this expression.
    ///
    /// A leading `\A` (or `^` without multi-line mode) and a trailing `\z`
    /// (or `$`) are removed, and reported as the first and last elements of
    /// the returned triple. Anchors anywhere else stay where they are.
    pub fn strip_anchors(&self) -> (bool, Ast, bool) {
        match *self {
            Ast::Look(Look::Start) => (true, Ast::Empty, false),
            Ast::Look(Look::End) => (false, Ast::Empty, true),
            Ast::Concat(ref asts) => {
                let mut items = &asts[..];
                let start =
                    matches!(items.first(), Some(Ast::Look(Look::Start)));
                if start {
                    items = &items[1..];
                }
                let end = matches!(items.last(), Some(Ast::Look(Look::End)));
                if end {
                    items = &items[..items.len() - 1];
                }
                let ast = match items.len() {
                    0 => Ast::Empty,
                    1 => items[0].clone(),
                    _ => Ast::Concat(items.to_vec()),
                };
                (start, ast, end)
            }
            _ => (false, self.clone(), false),
        }
    }

    /// Returns every assertion used anywhere in this expression.
    pub fn look_set(&self) -> LookSet {
        let mut set = LookSet::empty();
        self.visit(&mut |ast| {
            if let Ast::Look(look) = *ast {
                set = set.insert(look);
            }
        });
        set
    }

    /// Returns true if this expression contains a non-greedy repetition
    /// whose greediness affects what it matches.
    pub fn has_lazy_repetition(&self) -> bool {
        let mut lazy = false;
        self.visit(&mut |ast| {
            if let Ast::Repetition(ref rep) = *ast {
                if !rep.greedy && Some(rep.min) != rep.max {
                    lazy = true;
                }
            }
        });
        lazy
    }

    /// Returns the number of explicit capture groups.
    pub fn captures_len(&self) -> usize {
        let mut len = 0;
        self.visit(&mut |ast| {
            if let Ast::Group(Group { index: Some(_), .. }) = *ast {
                len += 1;
            }
        });
        len
    }

    /// Returns the name of each explicit capture group, in index order.
    pub fn group_names(&self) -> Vec<Option<String>> {
        let mut names = vec![None; self.captures_len()];
        self.visit(&mut |ast| {
            if let Ast::Group(Group { index: Some(i), ref name, .. }) = *ast {
                names[i as usize - 1] = name.clone();
            }
        });
        names
    }

    /// Call `f` on this node and every node beneath it, in pre-order.
    pub fn visit<F: FnMut(&Ast)>(&self, f: &mut F) {
        f(self);
        match *self {
            Ast::Empty
            | Ast::Literal(_)
            | Ast::Dot { .. }
            | Ast::Class(_)
            | Ast::Look(_) => {}
            Ast::Repetition(ref rep) => rep.ast.visit(f),
            Ast::Group(ref group) => group.ast.visit(f),
            Ast::Concat(ref asts) | Ast::Alternation(ref asts) => {
                for ast in asts.iter() {
                    ast.visit(f);
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Flags {
    case_insensitive: bool,
    multi_line: bool,
    dot_matches_new_line: bool,
    swap_greed: bool,
}

impl Flags {
    fn apply(&mut self, flags: &ast::Flags) {
        let mut enable = true;
        for item in flags.items.iter() {
            match item.kind {
                ast::FlagsItemKind::Negation => enable = false,
                ast::FlagsItemKind::Flag(ref flag) => match *flag {
                    ast::Flag::CaseInsensitive => {
                        self.case_insensitive = enable
                    }
                    ast::Flag::MultiLine => self.multi_line = enable,
                    ast::Flag::DotMatchesNewLine => {
                        self.dot_matches_new_line = enable
                    }
                    ast::Flag::SwapGreed => self.swap_greed = enable,
                    // Whitespace is handled by the parser, and classes are
                    // always ASCII.
                    ast::Flag::IgnoreWhitespace | ast::Flag::Unicode => {}
                },
            }
        }
    }
}

/// Lowers a `regex_syntax` AST. Flags set with `(?flags)` last until the end
/// of the enclosing group, so the flag state is saved and restored around
/// every group.
#[derive(Debug, Default)]
struct Translator {
    flags: Flags,
}

impl Translator {
    fn lower(&mut self, ast: &ast::Ast) -> Result<Ast, Error> {
        Ok(match *ast {
            ast::Ast::Empty(_) => Ast::Empty,
            ast::Ast::Flags(ref set) => {
                self.flags.apply(&set.flags);
                Ast::Empty
            }
            ast::Ast::Literal(ref lit) => self.literal(lit.c),
            ast::Ast::Dot(_) => {
                Ast::Dot { dotall: self.flags.dot_matches_new_line }
            }
            ast::Ast::Assertion(ref assertion) => {
                Ast::Look(self.look(&assertion.kind))
            }
            ast::Ast::Class(ref class) => Ast::Class(self.class(class)?),
            ast::Ast::Repetition(ref rep) => {
                let (min, max) = match rep.op.kind {
                    ast::RepetitionKind::ZeroOrOne => (0, Some(1)),
                    ast::RepetitionKind::ZeroOrMore => (0, None),
                    ast::RepetitionKind::OneOrMore => (1, None),
                    ast::RepetitionKind::Range(ref range) => match *range {
                        ast::RepetitionRange::Exactly(n) => (n, Some(n)),
                        ast::RepetitionRange::AtLeast(n) => (n, None),
                        ast::RepetitionRange::Bounded(m, n) => (m, Some(n)),
                    },
                };
                let greedy = rep.greedy != self.flags.swap_greed;
                let ast = Box::new(self.lower(&rep.ast)?);
                Ast::Repetition(Repetition { min, max, greedy, ast })
            }
            ast::Ast::Group(ref group) => {
                let saved = self.flags;
                let (index, name) = match group.kind {
                    ast::GroupKind::CaptureIndex(i) => (Some(i), None),
                    ast::GroupKind::CaptureName(ref name) => {
                        (Some(name.index), Some(name.name.clone()))
                    }
                    ast::GroupKind::NonCapturing(ref flags) => {
                        self.flags.apply(flags);
                        (None, None)
                    }
                };
                let inner = self.lower(&group.ast);
                self.flags = saved;
                Ast::Group(Group { index, name, ast: Box::new(inner?) })
            }
            ast::Ast::Alternation(ref alt) => Ast::Alternation(
                alt.asts
                    .iter()
                    .map(|ast| self.lower(ast))
                    .collect::<Result<Vec<Ast>, Error>>()?,
            ),
            ast::Ast::Concat(ref concat) => {
                let mut asts: Vec<Ast> = vec![];
                for ast in concat.asts.iter() {
                    match self.lower(ast)? {
                        Ast::Empty => {}
                        Ast::Literal(bytes) => match asts.last_mut() {
                            Some(Ast::Literal(prev)) => prev.extend(bytes),
                            _ => asts.push(Ast::Literal(bytes)),
                        },
                        ast => asts.push(ast),
                    }
                }
                match asts.len() {
                    0 => Ast::Empty,
                    1 => asts.pop().unwrap_or(Ast::Empty),
                    _ => Ast::Concat(asts),
                }
            }
        })
    }

    fn literal(&self, c: char) -> Ast {
        if self.flags.case_insensitive && c.is_ascii_alphabetic() {
            let b = c as u8;
            let set = ByteSet::from_bytes([
                b.to_ascii_lowercase(),
                b.to_ascii_uppercase(),
            ]);
            return Ast::Class(Class { set, negated: false });
        }
        let mut buf = [0; 4];
        Ast::Literal(c.encode_utf8(&mut buf).as_bytes().to_vec())
    }

    fn look(&self, kind: &ast::AssertionKind) -> Look {
        match *kind {
            ast::AssertionKind::StartLine if self.flags.multi_line => {
                Look::StartLine
            }
            ast::AssertionKind::StartLine => Look::Start,
            ast::AssertionKind::EndLine if self.flags.multi_line => {
                Look::EndLine
            }
            ast::AssertionKind::EndLine => Look::End,
            ast::AssertionKind::StartText => Look::Start,
            ast::AssertionKind::EndText => Look::End,
            ast::AssertionKind::WordBoundary => Look::WordBoundary,
            ast::AssertionKind::NotWordBoundary => Look::WordBoundaryNegate,
        }
    }

    fn class(&self, class: &ast::Class) -> Result<Class, Error> {
        let (mut set, negated) = match *class {
            ast::Class::Unicode(_) => {
                return Err(Error::unsupported("Unicode character classes"))
            }
            ast::Class::Perl(ref perl) => (perl_set(&perl.kind), perl.negated),
            ast::Class::Bracketed(ref bracketed) => {
                (self.class_set(&bracketed.kind)?, bracketed.negated)
            }
        };
        if self.flags.case_insensitive {
            set.fold_ascii_case();
        }
        Ok(Class { set, negated })
    }

    fn class_set(&self, set: &ast::ClassSet) -> Result<ByteSet, Error> {
        match *set {
            ast::ClassSet::Item(ref item) => self.class_item(item),
            ast::ClassSet::BinaryOp(ref op) => {
                let lhs = self.class_set(&op.lhs)?;
                let rhs = self.class_set(&op.rhs)?;
                Ok(match op.kind {
                    ast::ClassSetBinaryOpKind::Intersection => {
                        lhs.intersect(&rhs)
                    }
                    ast::ClassSetBinaryOpKind::Difference => {
                        lhs.difference(&rhs)
                    }
                    ast::ClassSetBinaryOpKind::SymmetricDifference => {
                        lhs.symmetric_difference(&rhs)
                    }
                })
            }
        }
    }

    fn class_item(&self, item: &ast::ClassSetItem) -> Result<ByteSet, Error> {
        Ok(match *item {
            ast::ClassSetItem::Empty(_) => ByteSet::empty(),
            ast::ClassSetItem::Literal(ref lit) => {
                ByteSet::from_bytes([ascii_byte(lit.c)?])
            }
            ast::ClassSetItem::Range(ref range) => {
                let mut set = ByteSet::empty();
                let (start, end) =
                    (ascii_byte(range.start.c)?, ascii_byte(range.end.c)?);
                set.add_all(start, end);
                set
            }
            ast::ClassSetItem::Ascii(ref ascii) => {
                let set = ascii_set(&ascii.kind);
                if ascii.negated {
                    set.negate()
                } else {
                    set
                }
            }
            ast::ClassSetItem::Unicode(_) => {
                return Err(Error::unsupported("Unicode character classes"))
            }
            ast::ClassSetItem::Perl(ref perl) => {
                let set = perl_set(&perl.kind);
                if perl.negated {
                    set.negate()
                } else {
                    set
                }
            }
            ast::ClassSetItem::Bracketed(ref bracketed) => {
                let set = self.class_set(&bracketed.kind)?;
                if bracketed.negated {
                    set.negate()
                } else {
                    set
                }
            }
            ast::ClassSetItem::Union(ref union) => {
                let mut set = ByteSet::empty();
                for item in union.items.iter() {
                    set = set.union(&self.class_item(item)?);
                }
                set
            }
        })
    }
}

fn ascii_byte(c: char) -> Result<u8, Error> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::unsupported("non-ASCII characters in classes"))
    }
}

fn perl_set(kind: &ast::ClassPerlKind) -> ByteSet {
    let mut set = ByteSet::empty();
    match *kind {
        ast::ClassPerlKind::Digit => set.add_all(b'0', b'9'),
        ast::ClassPerlKind::Space => {
            set.add_all(b'\t', b'\r');
            set.add(b' ');
        }
        ast::ClassPerlKind::Word => {
            set.add_all(b'0', b'9');
            set.add_all(b'A', b'Z');
            set.add_all(b'a', b'z');
            set.add(b'_');
        }
    }
    set
}

fn ascii_set(kind: &ast::ClassAsciiKind) -> ByteSet {
    use regex_syntax::ast::ClassAsciiKind::*;

    let mut set = ByteSet::empty();
    let ranges: &[(u8, u8)] = match *kind {
        Alnum => &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')],
        Alpha => &[(b'A', b'Z'), (b'a', b'z')],
        Ascii => &[(0x00, 0x7F)],
        Blank => &[(b'\t', b'\t'), (b' ', b' ')],
        Cntrl => &[(0x00, 0x1F), (0x7F, 0x7F)],
        Digit => &[(b'0', b'9')],
        Graph => &[(b'!', b'~')],
        Lower => &[(b'a', b'z')],
        Print => &[(b' ', b'~')],
        Punct => &[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')],
        Space => &[(b'\t', b'\r'), (b' ', b' ')],
        Upper => &[(b'A', b'Z')],
        Word => &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')],
        Xdigit => &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')],
    };
    for &(start, end) in ranges.iter() {
        set.add_all(start, end);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> Ast {
        Ast::parse(pattern).unwrap()
    }

    fn class(bytes: &[u8], negated: bool) -> Ast {
        let set = ByteSet::from_bytes(bytes.iter().copied());
        Ast::Class(Class { set, negated })
    }

    #[test]
    fn literals_merge() {
        assert_eq!(parse("hello"), Ast::Literal(b"hello".to_vec()));
        assert_eq!(parse("☃"), Ast::Literal("☃".as_bytes().to_vec()));
        assert_eq!(parse(""), Ast::Empty);
    }

    #[test]
    fn repetitions() {
        let ast = parse("ab+");
        let expected = Ast::Concat(vec![
            Ast::Literal(b"a".to_vec()),
            Ast::Repetition(Repetition {
                min: 1,
                max: None,
                greedy: true,
                ast: Box::new(Ast::Literal(b"b".to_vec())),
            }),
        ]);
        assert_eq!(ast, expected);
        assert_eq!(parse("[0-9]{2,4}").bounds(), (2, Some(4)));
        assert_eq!(parse("a{3}").bounds(), (3, Some(3)));
        assert_eq!(parse("a{3,}").bounds(), (3, None));
        assert!(parse("a*?").has_lazy_repetition());
        assert!(parse("(?U)a*").has_lazy_repetition());
        assert!(!parse("(?U)a*?").has_lazy_repetition());
        assert!(!parse("a{2}?").has_lazy_repetition());
    }

    #[test]
    fn classes() {
        assert_eq!(parse(r"\d"), class(b"0123456789", false));
        assert_eq!(parse(r"[^a-c]"), class(b"abc", true));
        assert_eq!(parse(r"\S"), class(b"\t\n\x0B\x0C\r ", true));
        assert_eq!(parse(r"[[:digit:]x]"), class(b"0123456789x", false));
        assert_eq!(parse(r"[a-z&&[^aeiou]]").byte_set().unwrap().len(), 21);
        assert_eq!(parse(r"(?i)[a-b]"), class(b"abAB", false));
        assert_eq!(parse(r"(?i)a"), class(b"aA", false));

        let dot = parse(".").byte_set().unwrap();
        assert_eq!(dot.len(), 255);
        assert!(!dot.contains(b'\n'));
        assert!(parse("(?s).").byte_set().unwrap().is_full());
    }

    #[test]
    fn anchors() {
        assert_eq!(parse("^"), Ast::Look(Look::Start));
        assert_eq!(parse("(?m)^"), Ast::Look(Look::StartLine));
        assert_eq!(parse("$"), Ast::Look(Look::End));
        assert_eq!(parse(r"\b"), Ast::Look(Look::WordBoundary));

        let (start, ast, end) = parse("^abc$").strip_anchors();
        assert!(start && end);
        assert_eq!(ast, Ast::Literal(b"abc".to_vec()));

        let (start, ast, end) = parse("^$").strip_anchors();
        assert!(start && end);
        assert_eq!(ast, Ast::Empty);

        let (start, _, end) = parse("a^b").strip_anchors();
        assert!(!start && !end);
    }

    #[test]
    fn flags_are_scoped() {
        let ast = parse("a(?i:b)c");
        let expected = Ast::Concat(vec![
            Ast::Literal(b"a".to_vec()),
            Ast::Group(Group {
                index: None,
                name: None,
                ast: Box::new(class(b"bB", false)),
            }),
            Ast::Literal(b"c".to_vec()),
        ]);
        assert_eq!(ast, expected);
    }

    #[test]
    fn groups() {
        let ast = parse(r"(a)(?P<year>\d+)(?:c)");
        assert_eq!(ast.captures_len(), 2);
        assert_eq!(ast.group_names(), vec![None, Some("year".to_string())]);
        assert_eq!(parse("(hello|help)").as_literal(), None);
        assert_eq!(parse("(?:ab)(c)").as_literal(), Some(b"abc".to_vec()));
    }

    #[test]
    fn errors() {
        assert!(Ast::parse("a(").unwrap_err().is_syntax());
        assert!(Ast::parse("a{5,3}").unwrap_err().is_syntax());
        assert!(Ast::parse(r"(a)\1").unwrap_err().is_syntax());
        assert!(Ast::parse(r"\pL").unwrap_err().is_unsupported());
        assert!(Ast::parse(r"[é]").unwrap_err().is_unsupported());
    }
}
