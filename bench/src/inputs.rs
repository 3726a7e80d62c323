// Haystacks are generated instead of read from disk, so that the benchmarks
// don't depend on a corpus checked into the repository.

const WORDS: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "hello",
    "world", "testing", "3.14159", "2023-01-15", "alice@example.com",
    "   ", "foo", "bar", "baz", "1234567", "helicopter", "help", "cat",
];

/// A deterministic pseudo-random text of roughly `len` bytes.
pub fn text(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 32);
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    while out.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let word = WORDS[(state % WORDS.len() as u64) as usize];
        out.extend_from_slice(word.as_bytes());
        out.push(if state % 11 == 0 { b'\n' } else { b' ' });
    }
    out
}

pub fn tiny() -> Vec<u8> {
    text(100)
}

pub fn small() -> Vec<u8> {
    text(10_000)
}

pub fn huge() -> Vec<u8> {
    text(1_000_000)
}
