use std::thread;

use quickcheck::{QuickCheck, TestResult};
use regex_hybrid::{
    clear_regex_cache, compile_regex, get_stats,
    meta::{Config, Engine, Optimization, Regex},
    nfa::thompson::pikevm::PikeVM,
};

use crate::{
    suite,
    util::{pattern, reference, reference_groups, spans, squash},
};

#[test]
fn suite_default() {
    let ran = suite::run("meta", |pattern, haystack| {
        let re = Regex::new(pattern).ok()?;
        Some(spans(re.match_all(haystack)))
    });
    assert_eq!(suite::SUITE.len(), ran);
}

#[test]
fn suite_no_literal_optimizations() {
    let ran = suite::run("meta (no literals)", |pattern, haystack| {
        let re = Regex::builder()
            .configure(Config::new().literal_bypass(false).prefilter(false))
            .build(pattern)
            .ok()?;
        Some(spans(re.match_all(haystack)))
    });
    assert_eq!(suite::SUITE.len(), ran);
}

#[test]
fn suite_nfa_only() {
    let ran = suite::run("meta (NFA only)", |pattern, haystack| {
        let re = Regex::builder()
            .configure(Config::new().dfa(false).hybrid(false).onepass(false))
            .build(pattern)
            .ok()?;
        assert_eq!(Engine::NFA, re.engine());
        Some(spans(re.match_all(haystack)))
    });
    assert_eq!(suite::SUITE.len(), ran);
}

// A literal needle scattered through filler, between zero and five times,
// sometimes back to back. The memmem bypass must find what the PikeVM finds.
#[test]
fn literal_bypass_agrees_with_pikevm() {
    fn prop(recipe: Vec<u8>) -> TestResult {
        let needle = b"hello";
        let mut haystack = vec![];
        let mut occurrences = 0;
        for &b in recipe.iter() {
            if b % 7 == 0 && occurrences < 5 {
                haystack.extend_from_slice(needle);
                occurrences += 1;
            } else {
                haystack.extend(squash(&[b], b"helo xw"));
            }
        }
        let re = match Regex::new("hello") {
            Ok(re) => re,
            Err(err) => return TestResult::error(err.to_string()),
        };
        if re.optimization() != Optimization::ExactLiteral {
            return TestResult::failed();
        }
        TestResult::from_bool(
            spans(re.match_all(&haystack)) == reference("hello", &haystack),
        )
    }

    QuickCheck::new().tests(100).quickcheck(prop as fn(Vec<u8>) -> TestResult);
}

#[test]
fn adjacent_literals() -> crate::Result<()> {
    let re = Regex::new("hello")?;
    let haystack = b"hellohellohello xhello";
    let expected = vec![(0, 5), (5, 10), (10, 15), (17, 22)];
    assert_eq!(expected, spans(re.match_all(haystack)));
    assert_eq!(expected, reference("hello", haystack));
    Ok(())
}

// Every configuration of the router must agree with the PikeVM.
#[test]
fn router_agrees_with_pikevm() {
    const PATTERNS: &[&str] = &[
        "[0-9]{2,4}",
        r"\bab\b",
        r"(a|b)*abb",
        r"(\d+)-(\d+)",
        r"ab+c|bc",
        r"b\w+",
        "(a|ab)(c|bcd)",
    ];

    fn prop(bytes: Vec<u8>) -> bool {
        let haystack = squash(&bytes, b"abcd12- ");
        PATTERNS.iter().all(|&pattern| {
            let re = match Regex::new(pattern) {
                Ok(re) => re,
                Err(_) => return false,
            };
            spans(re.match_all(&haystack)) == reference(pattern, &haystack)
        })
    }

    QuickCheck::new().tests(200).quickcheck(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn random_patterns_agree_with_pikevm() {
    fn prop(recipe: Vec<u8>, bytes: Vec<u8>) -> TestResult {
        let pattern = pattern(&recipe);
        if PikeVM::new(&pattern).is_err() {
            return TestResult::discard();
        }
        let haystack = squash(&bytes, b"abc\n");
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(err) => return TestResult::error(err.to_string()),
        };
        if spans(re.match_all(&haystack)) != reference(&pattern, &haystack) {
            return TestResult::error(format!("{:?}: {}", re.engine(), pattern));
        }
        let expected = reference_groups(&pattern, &haystack, 0);
        let same = match re.captures_next(&haystack, 0) {
            None => expected.iter().all(Option::is_none),
            Some(caps) => caps
                .iter()
                .map(|m| m.map(|m| (m.start(), m.end())))
                .eq(expected.into_iter()),
        };
        if !same {
            return TestResult::error(format!("groups: {}", pattern));
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

#[test]
fn captures() -> crate::Result<()> {
    let re = Regex::new("(ab)+")?;
    let caps = re.captures_next(b"xabab", 0).ok_or("no match")?;
    let span = |i: usize| caps.get_group(i).map(|m| (m.start(), m.end()));
    assert_eq!(Some((1, 5)), span(0));
    assert_eq!(Some((3, 5)), span(1));

    let re = Regex::new(r"(\w+)@(\w+)")?;
    let all = re.captures_all(b"a@b cc@dd");
    let groups: Vec<_> = all
        .iter()
        .map(|caps| caps.get_group(2).map(|m| (m.start(), m.end())))
        .collect();
    assert_eq!(vec![Some((2, 3)), Some((7, 9))], groups);
    Ok(())
}

// Anchors inside one branch must not hide the branches after it.
#[test]
fn anchored_branches() -> crate::Result<()> {
    let cases: &[(&str, &[u8], &[(usize, usize)])] = &[
        (r"^.{0,2}|c|ab*", b"acabab\n", &[(0, 2), (2, 4), (4, 6)]),
        (r"^a*|[^a]|(c)", b"b\nxx", &[(0, 0), (1, 2), (2, 3), (3, 4)]),
        (r"(a?c{0,2}|a+[^a]{0,2})$", b"ax", &[(0, 2), (2, 2)]),
    ];
    for &(pattern, haystack, expected) in cases {
        let re = Regex::new(pattern)?;
        assert_eq!(expected, &spans(re.match_all(haystack))[..], "{}", pattern);
        assert_eq!(expected, &reference(pattern, haystack)[..], "{}", pattern);
    }

    let re = Regex::new(r"(a?c{0,2}|a+[^a]{0,2})$")?;
    let groups: Vec<_> = re
        .captures_all(b"ax")
        .iter()
        .map(|caps| caps.get_group(1).map(|m| (m.start(), m.end())))
        .collect();
    assert_eq!(vec![Some((0, 2)), Some((2, 2))], groups);
    Ok(())
}

#[test]
fn determinism() -> crate::Result<()> {
    let haystacks: &[&[u8]] = &[b"", b"abc 123 abc", b"x1y22z333"];
    for pattern in ["[0-9]+", r"(a|b)c", r"\b\w+\b", "abc"] {
        let (a, b) = (Regex::new(pattern)?, Regex::new(pattern)?);
        assert_eq!(a.engine(), b.engine());
        assert_eq!(a.optimization(), b.optimization());
        for &haystack in haystacks {
            assert_eq!(a.match_all(haystack), b.match_all(haystack));
            assert_eq!(a.match_all(haystack), a.match_all(haystack));
        }
    }
    Ok(())
}

#[test]
fn shared_between_threads() -> crate::Result<()> {
    let re = Regex::new(r"(\d+|[a-z]+)@(\w|-)+\.com")?;
    let haystack = b"bob@mail.com 42@x-y.com nope@".repeat(10);
    let expected = spans(re.match_all(&haystack));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (re, haystack) = (re.clone(), haystack.clone());
            thread::spawn(move || spans(re.match_all(&haystack)))
        })
        .collect();
    for handle in handles {
        assert_eq!(expected, handle.join().map_err(|_| "thread panicked")?);
    }
    Ok(())
}

// The only test touching the process wide cache, since the tests in this
// harness run concurrently.
#[test]
fn global_cache() -> crate::Result<()> {
    let re = compile_regex(r"[a-z]+\d")?;
    assert_eq!(spans(re.match_all(b"ab1 c2")), vec![(0, 3), (4, 6)]);
    let stats = get_stats();
    assert!(stats.contains(r#"pattern: "[a-z]+\\d""#), "{}", stats);
    assert!(stats.contains("engine: "), "{}", stats);

    let again = compile_regex(r"[a-z]+\d")?;
    assert_eq!(re.engine(), again.engine());

    assert!(compile_regex("a(").unwrap_err().is_syntax());

    clear_regex_cache();
    assert_eq!(spans(compile_regex(r"[a-z]+\d")?.match_all(b"z9")), vec![
        (0, 2)
    ]);
    Ok(())
}
