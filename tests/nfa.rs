use regex_hybrid::nfa::thompson::{pikevm::PikeVM, Compiler, Config};

use crate::{suite, util::spans};

#[test]
fn suite() {
    let ran = suite::run("PikeVM", |pattern, haystack| {
        let vm = PikeVM::new(pattern).ok()?;
        let mut cache = vm.create_cache();
        Some(spans(vm.match_all(&mut cache, haystack)))
    });
    assert_eq!(suite::SUITE.len(), ran);
}

#[test]
fn captures() -> crate::Result<()> {
    let vm = PikeVM::new(r"(a)|(b)")?;
    let mut cache = vm.create_cache();
    let mut caps = vm.create_captures();
    vm.captures_at(&mut cache, b"xb", 0, false, &mut caps);
    assert_eq!(Some((1, 2)), caps.get_match().map(|m| (m.start(), m.end())));
    assert_eq!(None, caps.get_group(1));
    assert_eq!(
        Some((1, 2)),
        caps.get_group(2).map(|m| (m.start(), m.end())),
    );

    // Anchored searches don't look past the starting position.
    vm.captures_at(&mut cache, b"xb", 0, true, &mut caps);
    assert!(!caps.is_match());
    Ok(())
}

// Group spans as Python's `re.search` reports them.
#[test]
fn known_results() -> crate::Result<()> {
    type Span = Option<(usize, usize)>;
    let cases: &[(&str, &[u8], &[Span])] = &[
        ("(a|)*b", b"aab", &[Some((0, 3)), Some((2, 2))]),
        ("(a*)*", b"b", &[Some((0, 0)), Some((0, 0))]),
        ("(a*)+", b"b", &[Some((0, 0)), Some((0, 0))]),
        ("(a?)*", b"aa", &[Some((0, 2)), Some((2, 2))]),
        ("(?:c?|ab)*", b"ab", &[Some((0, 0))]),
        ("(a|ab)*c", b"abac", &[Some((0, 4)), Some((2, 3))]),
        (
            "(a|ab)(c|bcd)(d*)",
            b"abcd",
            &[Some((0, 4)), Some((0, 1)), Some((1, 4)), Some((4, 4))],
        ),
        ("(a+)(b+)?", b"aac", &[Some((0, 2)), Some((0, 2)), None]),
        ("x*", b"axx", &[Some((0, 0))]),
    ];
    for &(pattern, haystack, expected) in cases {
        let vm = PikeVM::new(pattern)?;
        let mut cache = vm.create_cache();
        let mut caps = vm.create_captures();
        vm.captures_at(&mut cache, haystack, 0, false, &mut caps);
        let got: Vec<Span> =
            caps.iter().map(|m| m.map(|m| (m.start(), m.end()))).collect();
        assert_eq!(expected, &got[..], "{}", pattern);
    }
    Ok(())
}

#[test]
fn size_limit() -> crate::Result<()> {
    let err = Compiler::new()
        .configure(Config::new().size_limit(Some(10)))
        .build("[a-z]{50}")
        .unwrap_err();
    assert!(err.is_too_many_states());

    let nfa = Compiler::new()
        .configure(Config::new().size_limit(None))
        .build("[a-z]{50}")?;
    let vm = PikeVM::new_from_nfa(nfa);
    let mut cache = vm.create_cache();
    let haystack = "x".repeat(60);
    assert_eq!(
        vec![(0, 50)],
        spans(vm.match_all(&mut cache, haystack.as_bytes())),
    );
    Ok(())
}
