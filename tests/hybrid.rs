use quickcheck::{QuickCheck, TestResult};
use regex_hybrid::{
    hybrid::{Config, DFA, MAX_CACHE_CAPACITY},
    nfa::thompson::pikevm::PikeVM,
};

use crate::{
    suite,
    util::{pattern, reference, spans, squash},
};

fn build(pattern: &str, capacity: usize) -> Option<DFA> {
    DFA::builder()
        .configure(Config::new().cache_capacity(capacity))
        .build(pattern)
        .ok()
}

#[test]
fn suite_default_capacity() {
    let ran = suite::run("lazy DFA", |pattern, haystack| {
        let dfa = DFA::new(pattern).ok()?;
        let mut cache = dfa.create_cache();
        Some(spans(dfa.match_all(&mut cache, haystack)))
    });
    assert!(ran >= 20, "lazy DFA only ran {} tests", ran);
}

// With room for a single state, nearly every transition evicts something.
// Results must not change.
#[test]
fn suite_tiny_capacity() {
    let ran = suite::run("lazy DFA (capacity 1)", |pattern, haystack| {
        let dfa = build(pattern, 1)?;
        let mut cache = dfa.create_cache();
        Some(spans(dfa.match_all(&mut cache, haystack)))
    });
    assert!(ran >= 20, "lazy DFA only ran {} tests", ran);
}

#[test]
fn cache_capacity_does_not_change_matches() {
    const PATTERNS: &[&str] = &[
        r"(a|b)*abb[0-9]+",
        r"(\d+|[a-z]+)@(\w|-)+\.com",
        r"(foo|bar)+baz",
        r"^(ab|a)c$",
        r"[a-c]{2,5}x",
    ];

    fn prop(bytes: Vec<u8>) -> TestResult {
        let haystack = squash(&bytes, b"abcfoxrz01@.m-");
        for &pattern in PATTERNS {
            let (small, large) = match (
                build(pattern, 1),
                build(pattern, MAX_CACHE_CAPACITY),
            ) {
                (Some(small), Some(large)) => (small, large),
                _ => return TestResult::error(format!("{} failed", pattern)),
            };
            let mut small_cache = small.create_cache();
            let mut large_cache = large.create_cache();
            let got = spans(small.match_all(&mut small_cache, &haystack));
            if got != spans(large.match_all(&mut large_cache, &haystack))
                || got != reference(pattern, &haystack)
            {
                return TestResult::failed();
            }
        }
        TestResult::passed()
    }

    QuickCheck::new().tests(200).quickcheck(prop as fn(Vec<u8>) -> TestResult);
}

#[test]
fn random_patterns_agree_with_pikevm() {
    fn prop(recipe: Vec<u8>, bytes: Vec<u8>) -> TestResult {
        let pattern = pattern(&recipe);
        if PikeVM::new(&pattern).is_err() {
            return TestResult::discard();
        }
        let haystack = squash(&bytes, b"abc\n");
        let expected = reference(&pattern, &haystack);
        for capacity in [1, MAX_CACHE_CAPACITY] {
            let dfa = match build(&pattern, capacity) {
                Some(dfa) => dfa,
                None => return TestResult::passed(),
            };
            let mut cache = dfa.create_cache();
            if spans(dfa.match_all(&mut cache, &haystack)) != expected {
                return TestResult::error(format!(
                    "capacity {}: {}",
                    capacity, pattern
                ));
            }
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

// The start of the leftmost match is found without restarting the search at
// every candidate position.
#[test]
fn long_unanchored_search() -> crate::Result<()> {
    let dfa = DFA::new("(a|b)+c|d")?;
    let haystack = format!("{}d", "ab".repeat(50_000));
    let mut cache = dfa.create_cache();
    let n = haystack.len();
    assert_eq!(
        vec![(n - 1, n)],
        spans(dfa.match_all(&mut cache, haystack.as_bytes())),
    );
    let stats = cache.stats();
    assert!(stats.hits() + stats.misses() < 2 * n as u64 + 100);

    let haystack = format!("{}c", "ab".repeat(50_000));
    assert_eq!(
        vec![(0, haystack.len())],
        spans(dfa.match_all(&mut cache, haystack.as_bytes())),
    );
    Ok(())
}

#[test]
fn evictions_are_counted() -> crate::Result<()> {
    let pattern = r"(a|b)*abb[0-9]+";
    let haystack = b"abababbbabb123 babbab abb9 ba".repeat(20);

    let small = DFA::builder()
        .configure(Config::new().cache_capacity(1).eviction_batch_size(1))
        .build(pattern)?;
    let mut cache = small.create_cache();
    let expected = reference(pattern, &haystack);
    assert_eq!(expected, spans(small.match_all(&mut cache, &haystack)));
    assert!(cache.stats().evictions() > 0);
    assert!(cache.len() <= 2);

    let large = DFA::new(pattern)?;
    let mut cache = large.create_cache();
    assert_eq!(expected, spans(large.match_all(&mut cache, &haystack)));
    assert_eq!(0, cache.stats().evictions());
    Ok(())
}

#[test]
fn cache_reuse() -> crate::Result<()> {
    let dfa = DFA::new(r"(\d+|[a-z]+)@(\w|-)+\.com")?;
    let mut cache = dfa.create_cache();
    let haystack = b"write to bob@mail.com or 42@x-y.com";
    let first = spans(dfa.match_all(&mut cache, haystack));
    let misses = cache.stats().misses();
    assert!(misses > 0);

    // Every state the second search needs is already cached.
    let second = spans(dfa.match_all(&mut cache, haystack));
    assert_eq!(first, second);
    assert_eq!(misses, cache.stats().misses());
    assert!(cache.stats().hits() > 0);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(first, spans(dfa.match_all(&mut cache, haystack)));
    Ok(())
}

#[test]
fn anchors() -> crate::Result<()> {
    let dfa = DFA::new("^abc$")?;
    let mut cache = dfa.create_cache();
    assert_eq!(vec![(0, 3)], spans(dfa.match_all(&mut cache, b"abc")));
    assert!(dfa.match_next(&mut cache, b"abcd", 0).is_none());
    assert!(dfa.match_next(&mut cache, b"xabc", 0).is_none());
    Ok(())
}

#[test]
fn rejects_inner_assertions() {
    assert!(DFA::new(r"\bfoo\b").unwrap_err().is_rejected());
    assert!(DFA::new(r"a^b").unwrap_err().is_rejected());
}
