use criterion::{
    criterion_group, criterion_main, Bencher, Criterion, Throughput,
};
use regex_hybrid::{
    meta::{Config, Regex},
    nfa::thompson::pikevm::PikeVM,
};

mod inputs;

/// Patterns covering every engine and optimization, by name.
const PATTERNS: &[(&str, &str)] = &[
    ("literal", "hello"),
    ("wildcard", "h.*o"),
    ("quantifier", "[0-9]+"),
    ("range", "[0-9]{2,4}"),
    ("anchor", "^the"),
    ("alternation", "cat|dog|fox"),
    ("group", "(foo|bar)+baz"),
    ("email", r"[a-z]+@[a-z]+\.com"),
    ("number", r"\d+\.\d+"),
    ("class-filter", r"[^a-z\s]+"),
    ("literal-prefix", r"hel(lo|p|icopter)"),
    ("word", r"\bfox\b"),
];

fn find_all(c: &mut Criterion) {
    let corpora = [
        ("tiny", inputs::tiny()),
        ("small", inputs::small()),
        ("huge", inputs::huge()),
    ];
    for (corpus_name, corpus) in corpora.iter() {
        for &(name, pattern) in PATTERNS {
            let re = Regex::new(pattern).unwrap();
            let haystack = corpus.clone();
            let bench_name = format!("{}/{}", name, corpus_name);
            define(c, "find-all", &bench_name, corpus, move |b| {
                b.iter(|| re.match_all(&haystack).len());
            });
        }
    }
}

fn find_all_baseline(c: &mut Criterion) {
    let corpus = inputs::small();
    for &(name, pattern) in PATTERNS {
        let re = PikeVM::new(pattern).unwrap();
        let mut cache = re.create_cache();
        let haystack = corpus.clone();
        define(c, "find-all-pikevm", name, &corpus, move |b| {
            b.iter(|| re.match_all(&mut cache, &haystack).len());
        });
    }
}

fn literal_optimizations(c: &mut Criterion) {
    let corpus = inputs::huge();
    let configs = [
        ("none", false, false),
        ("prefilter", false, true),
        ("bypass", true, true),
    ];
    for &(label, bypass, prefilter) in configs.iter() {
        let re = Regex::builder()
            .configure(Config::new().literal_bypass(bypass).prefilter(prefilter))
            .build("helicopter")
            .unwrap();
        let haystack = corpus.clone();
        define(c, "literal-optimizations", label, &corpus, move |b| {
            b.iter(|| re.match_all(&haystack).len());
        });
    }
}

fn compile(c: &mut Criterion) {
    for &(name, pattern) in PATTERNS {
        define(c, "compile", name, &[], move |b| {
            b.iter(|| Regex::new(pattern).unwrap());
        });
    }
}

fn define(
    c: &mut Criterion,
    group_name: &str,
    bench_name: &str,
    corpus: &[u8],
    bench: impl FnMut(&mut Bencher),
) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Bytes(corpus.len() as u64));
    group.bench_function(bench_name, bench);
    group.finish();
}

criterion_group!(g1, find_all);
criterion_group!(g2, find_all_baseline);
criterion_group!(g3, literal_optimizations);
criterion_group!(g4, compile);
criterion_main!(g1, g2, g3, g4);
