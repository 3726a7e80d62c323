use regex_hybrid::{nfa::thompson::pikevm::PikeVM, Match};

/// Turn matches into plain spans.
pub fn spans(matches: Vec<Match>) -> Vec<(usize, usize)> {
    matches.into_iter().map(|m| (m.start(), m.end())).collect()
}

/// Map arbitrary bytes onto a small alphabet, so random haystacks actually
/// exercise the patterns under test.
pub fn squash(bytes: &[u8], alphabet: &[u8]) -> Vec<u8> {
    bytes.iter().map(|&b| alphabet[b as usize % alphabet.len()]).collect()
}

/// The matches the PikeVM reports. The PikeVM runs every pattern, so it is
/// what the other engines are checked against.
pub fn reference(pattern: &str, haystack: &[u8]) -> Vec<(usize, usize)> {
    let vm = PikeVM::new(pattern).unwrap();
    let mut cache = vm.create_cache();
    spans(vm.match_all(&mut cache, haystack))
}

/// Decode arbitrary bytes into a small pattern.
///
/// The grammar covers alternation, capturing and non-capturing groups with
/// every kind of quantifier, and `^` or `$` anywhere, including inside a
/// single branch. Running out of bytes ends the pattern with plain literals.
pub fn pattern(recipe: &[u8]) -> String {
    let mut gen = Gen { recipe: recipe.iter(), out: String::new() };
    gen.alternation(0);
    gen.out
}

struct Gen<'a> {
    recipe: std::slice::Iter<'a, u8>,
    out: String,
}

impl<'a> Gen<'a> {
    const QUANTIFIERS: &'static [&'static str] =
        &["", "", "?", "*", "+", "{0,2}", "{1,2}", "*?", "??"];

    fn pick(&mut self, n: u8) -> u8 {
        self.recipe.next().map_or(0, |&b| b % n)
    }

    fn alternation(&mut self, depth: usize) {
        for i in 0..1 + self.pick(3) {
            if i > 0 {
                self.out.push('|');
            }
            for _ in 0..1 + self.pick(3) {
                self.item(depth);
            }
        }
    }

    fn item(&mut self, depth: usize) {
        let choices = if depth < 2 { 9 } else { 7 };
        match self.pick(choices) {
            0 => self.out.push('a'),
            1 => self.out.push('b'),
            2 => self.out.push('c'),
            3 => self.out.push_str("[ab]"),
            4 => self.out.push_str("[^a]"),
            5 => self.out.push('.'),
            6 => {
                let anchor = if self.pick(2) == 0 { '^' } else { '$' };
                self.out.push(anchor);
                return;
            }
            7 => {
                self.out.push('(');
                self.alternation(depth + 1);
                self.out.push(')');
            }
            _ => {
                self.out.push_str("(?:");
                self.alternation(depth + 1);
                self.out.push(')');
            }
        }
        let quantifier = self.pick(Gen::QUANTIFIERS.len() as u8);
        self.out.push_str(Gen::QUANTIFIERS[usize::from(quantifier)]);
    }
}

/// The spans of every group in the PikeVM's first match at or after `start`.
pub fn reference_groups(
    pattern: &str,
    haystack: &[u8],
    start: usize,
) -> Vec<Option<(usize, usize)>> {
    let vm = PikeVM::new(pattern).unwrap();
    let mut cache = vm.create_cache();
    let mut caps = vm.create_captures();
    vm.captures_at(&mut cache, haystack, start, false, &mut caps);
    caps.iter().map(|m| m.map(|m| (m.start(), m.end()))).collect()
}
