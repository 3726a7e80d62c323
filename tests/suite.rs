// The shared corpus of match tests. Every engine runs every test it accepts,
// and all of them must report the same non-overlapping matches.

use bstr::ByteSlice;

pub struct RegexTest {
    pub name: &'static str,
    pub pattern: &'static str,
    pub haystack: &'static str,
    pub matches: &'static [(usize, usize)],
}

macro_rules! t {
    ($name:expr, $pattern:expr, $haystack:expr, [$($m:expr),* $(,)?] $(,)?) => {
        RegexTest {
            name: $name,
            pattern: $pattern,
            haystack: $haystack,
            matches: &[$($m),*],
        }
    };
}

pub const SUITE: &[RegexTest] = &[
    t!("literal", "hello", "hello world hello", [(0, 5), (12, 17)]),
    t!("literal-adjacent", "ab", "ababxab", [(0, 2), (2, 4), (5, 7)]),
    t!("wildcard", "h.*o", "hello world", [(0, 8)]),
    t!("wildcard-newline", "a.*b", "a\nb ab", [(4, 6)]),
    t!("plus", "[0-9]+", "a12b345", [(1, 3), (4, 7)]),
    t!(
        "bounded",
        "[0-9]{2,4}",
        "1 12 12345 123456",
        [(2, 4), (5, 9), (11, 15), (15, 17)],
    ),
    t!("exact-count", "x{3}", "xxxxxxx", [(0, 3), (3, 6)]),
    t!("anchored-both", "^abc$", "abc", [(0, 3)]),
    t!("anchored-both-tail", "^abc$", "abcd", []),
    t!("anchored-both-head", "^abc$", "xabc", []),
    t!("anchored-end", "abc$", "abcabc", [(3, 6)]),
    t!("anchored-start", "^ab", "abab", [(0, 2)]),
    t!("only-start", "^", "abc", [(0, 0)]),
    t!("only-end", "$", "abc", [(3, 3)]),
    t!("empty", "", "ab", [(0, 0), (1, 1), (2, 2)]),
    t!("star-none", "a*", "bbb", [(0, 0), (1, 1), (2, 2), (3, 3)]),
    t!("star-after-empty", "a*", "baaa", [(0, 0), (1, 4), (4, 4)]),
    t!("alternation", "cat|dog", "hotdog catalog", [(3, 6), (7, 10)]),
    t!("alternation-priority", "a|ab", "ab", [(0, 1)]),
    t!("alternation-prefix", "hel(lo|p|icopter)", "help hello helicopter", [
        (0, 4),
        (5, 10),
        (11, 21),
    ]),
    t!("group-repeat", "(foo|bar)+baz", "foobarbaz foobaz baz", [
        (0, 9),
        (10, 16),
    ]),
    t!("group-star", "a(b|c)*d", "abcbd ad", [(0, 5), (6, 8)]),
    t!("group-star-suffix", "(a|b)*c", "ababc", [(0, 5)]),
    t!("email", r"[a-z]+@[a-z]+\.com", "mail alice@example.com now", [(5, 22)]),
    t!("number", r"\d+\.\d+", "pi is 3.14159 not 3", [(6, 13)]),
    t!("negated-class", "[^a-z ]+", "abc DEF 12 x", [(4, 7), (8, 10)]),
    t!("word-boundary", r"\bfox\b", "fox foxes afox fox", [(0, 3), (15, 18)]),
    t!("lazy", "a+?", "aaa", [(0, 1), (1, 2), (2, 3)]),
    t!("case-insensitive", "(?i)hello", "say HeLLo", [(4, 9)]),
    t!("multi-line", "(?m)^x", "x\nax\nx", [(0, 1), (5, 6)]),
    t!("no-match", "[0-9]", "abc", []),
    t!("empty-haystack", "[0-9]*", "", [(0, 0)]),
];

/// Run every test in the suite through `find_all`.
///
/// `find_all` returns `None` when its engine refuses to build the pattern,
/// in which case the test is skipped. The number of tests that actually ran
/// is returned, so callers can check that they covered something.
pub fn run<F>(engine: &str, mut find_all: F) -> usize
where
    F: FnMut(&str, &[u8]) -> Option<Vec<(usize, usize)>>,
{
    let mut ran = 0;
    for test in SUITE {
        let got = match find_all(test.pattern, test.haystack.as_bytes()) {
            None => continue,
            Some(got) => got,
        };
        assert_eq!(
            test.matches,
            got.as_slice(),
            "{}: test '{}' failed for {:?} on {:?}",
            engine,
            test.name,
            test.pattern,
            test.haystack.as_bytes().as_bstr(),
        );
        ran += 1;
    }
    ran
}
