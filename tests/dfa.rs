use quickcheck::{QuickCheck, TestResult};
use regex_hybrid::{
    dfa::{onepass::OnePass, regex::Regex},
    nfa::thompson::pikevm::PikeVM,
};

use crate::{
    suite,
    util::{pattern, reference, reference_groups, spans, squash},
};

#[test]
fn suite_eager() {
    let ran = suite::run("eager DFA", |pattern, haystack| {
        let re = Regex::new(pattern).ok()?;
        Some(spans(re.match_all(haystack)))
    });
    assert!(ran >= 10, "eager DFA only ran {} tests", ran);
}

#[test]
fn suite_onepass() {
    let ran = suite::run("one-pass DFA", |pattern, haystack| {
        let re = OnePass::new(pattern).ok()?;
        let mut cache = re.create_cache();
        Some(spans(re.match_all(&mut cache, haystack)))
    });
    assert!(ran >= 5, "one-pass DFA only ran {} tests", ran);
}

// Random haystacks over a small alphabet, searched by the eager DFA and the
// PikeVM. Every pattern here has a shape the eager DFA accepts.
#[test]
fn eager_agrees_with_pikevm() {
    const PATTERNS: &[&str] = &[
        "[0-9]{2,4}",
        "[a-z]+[0-9]+",
        "cat|dog",
        "a*",
        "^ab",
        "b$",
        "x.*y",
    ];

    fn prop(bytes: Vec<u8>) -> TestResult {
        let haystack = squash(&bytes, b"abcdgotxy019 ");
        for &pattern in PATTERNS {
            let re = match Regex::new(pattern) {
                Ok(re) => re,
                Err(_) => continue,
            };
            if spans(re.match_all(&haystack)) != reference(pattern, &haystack)
            {
                return TestResult::failed();
            }
        }
        TestResult::passed()
    }

    QuickCheck::new().tests(300).quickcheck(prop as fn(Vec<u8>) -> TestResult);
}

#[test]
fn onepass_agrees_with_pikevm() {
    const PATTERNS: &[&str] = &[
        r"(ab)+",
        r"(\d+)-(\d+)",
        r"a(b|c)d",
        r"\bab",
        r"^ab|cd",
        r"(ab|cd)$",
        r"\bab|c",
    ];

    fn prop(bytes: Vec<u8>) -> bool {
        let haystack = squash(&bytes, b"abcd12- ");
        PATTERNS.iter().all(|&pattern| {
            let re = match OnePass::new(pattern) {
                Ok(re) => re,
                Err(_) => return true,
            };
            let mut cache = re.create_cache();
            spans(re.match_all(&mut cache, &haystack))
                == reference(pattern, &haystack)
        })
    }

    QuickCheck::new().tests(300).quickcheck(prop as fn(Vec<u8>) -> bool);
}

// Generated patterns, run by whichever of the two DFAs accepts them.
#[test]
fn random_patterns_agree_with_pikevm() {
    fn prop(recipe: Vec<u8>, bytes: Vec<u8>) -> TestResult {
        let pattern = pattern(&recipe);
        if PikeVM::new(&pattern).is_err() {
            return TestResult::discard();
        }
        let haystack = squash(&bytes, b"abc\n");
        let expected = reference(&pattern, &haystack);
        if let Ok(re) = Regex::new(&pattern) {
            if spans(re.match_all(&haystack)) != expected {
                return TestResult::error(format!("eager DFA: {}", pattern));
            }
        }
        if let Ok(re) = OnePass::new(&pattern) {
            let mut cache = re.create_cache();
            if spans(re.match_all(&mut cache, &haystack)) != expected {
                return TestResult::error(format!("one-pass: {}", pattern));
            }
            let mut caps = re.create_captures();
            re.captures_next(&mut cache, &haystack, 0, &mut caps);
            let groups: Vec<_> =
                caps.iter().map(|m| m.map(|m| (m.start(), m.end()))).collect();
            if groups != reference_groups(&pattern, &haystack, 0) {
                return TestResult::error(format!(
                    "one-pass groups: {}",
                    pattern
                ));
            }
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

#[test]
fn quantifier_boundary() -> crate::Result<()> {
    let re = Regex::new("[0-9]{2,4}")?;
    assert_eq!(None, re.match_first(b"1", 0));
    assert_eq!(
        Some((0, 2)),
        re.match_first(b"12", 0).map(|m| (m.start(), m.end())),
    );
    assert_eq!(
        Some((0, 4)),
        re.match_first(b"12345", 0).map(|m| (m.start(), m.end())),
    );
    Ok(())
}

#[test]
fn anchors() -> crate::Result<()> {
    let re = Regex::new("^abc$")?;
    assert!(re.match_next(b"abc", 0).is_some());
    assert!(re.match_next(b"abcd", 0).is_none());
    assert!(re.match_next(b"xabc", 0).is_none());
    assert!(re.match_next(b"abc", 1).is_none());
    Ok(())
}

#[test]
fn onepass_captures() -> crate::Result<()> {
    let re = OnePass::new("(ab)+")?;
    let mut cache = re.create_cache();
    let mut caps = re.create_captures();
    assert!(re.captures_next(&mut cache, b"xabab", 0, &mut caps));
    let span = |i: usize| caps.get_group(i).map(|m| (m.start(), m.end()));
    assert_eq!(Some((1, 5)), span(0));
    assert_eq!(Some((3, 5)), span(1));

    let re = OnePass::new(r"(\d+)-(\d+)")?;
    let mut cache = re.create_cache();
    let mut caps = re.create_captures();
    assert!(re.captures_next(&mut cache, b"tel 555-1234", 0, &mut caps));
    let span = |i: usize| caps.get_group(i).map(|m| (m.start(), m.end()));
    assert_eq!(Some((4, 12)), span(0));
    assert_eq!(Some((4, 7)), span(1));
    assert_eq!(Some((8, 12)), span(2));
    Ok(())
}

#[test]
fn onepass_rejections() {
    assert!(OnePass::new("a*a").unwrap_err().is_rejected());
    assert!(OnePass::new("(a|ab)c").unwrap_err().is_rejected());

    // Branches after a match that depends on an assertion.
    assert!(OnePass::new(r"^.{0,2}|c|ab*").unwrap_err().is_rejected());
    assert!(OnePass::new(r"^a*|[^a]|(c)").unwrap_err().is_rejected());
    assert!(OnePass::new(r"(?:a?c{0,2}|a+[^a]{0,2})$")
        .unwrap_err()
        .is_rejected());

    let groups = "(a)".repeat(33);
    assert!(OnePass::new(&groups).unwrap_err().is_capture_slot_overflow());
}

#[test]
fn eager_rejections() {
    assert!(Regex::new(r"\bfoo\b").unwrap_err().is_too_complex());
    assert!(Regex::new("(a|ab)+c").unwrap_err().is_too_complex());
    assert!(Regex::new("a(").unwrap_err().is_syntax());
}
