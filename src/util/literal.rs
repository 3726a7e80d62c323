/*!
Required literal extraction.

A required literal is a string that occurs in every match of a pattern. A
literal that every match *starts* with is additionally a prefix. Both kinds
feed prefilters: a prefix tells a search where to start, and a required
literal that can't be found in a haystack proves there is no match at all.
*/

use crate::syntax::Ast;

/// A literal that every match of some pattern contains.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Literal {
    bytes: Vec<u8>,
    prefix: bool,
}

impl Literal {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if every match starts with this literal.
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }
}

/// Returns the required literals of the given pattern, in the order they
/// occur in it. The list may be empty.
pub fn extract_literals(ast: &Ast) -> Vec<Literal> {
    let mut ex = Extractor {
        lits: vec![],
        run: vec![],
        run_is_prefix: false,
        at_start: true,
    };
    ex.walk(ast);
    ex.flush();
    ex.lits
}

/// Pick the most useful required literal for a prefilter.
///
/// A prefix of at least two bytes wins since it pins down where matches
/// start. Otherwise the longest literal wins, with ties going to the one that
/// occurs first.
pub fn get_best_literal(ast: &Ast) -> Option<Literal> {
    let lits = extract_literals(ast);
    let prefix = lits.iter().find(|lit| lit.prefix && lit.len() >= 2);
    if let Some(prefix) = prefix {
        return Some(prefix.clone());
    }
    let mut best: Option<&Literal> = None;
    for lit in lits.iter() {
        if best.map_or(true, |b| lit.len() > b.len()) {
            best = Some(lit);
        }
    }
    best.cloned()
}

#[derive(Debug)]
struct Extractor {
    lits: Vec<Literal>,
    run: Vec<u8>,
    run_is_prefix: bool,
    /// True while nothing that consumes input has been seen.
    at_start: bool,
}

impl Extractor {
    fn walk(&mut self, ast: &Ast) {
        match *ast {
            Ast::Empty => {}
            Ast::Look(_) => self.flush(),
            Ast::Literal(ref bytes) => self.extend(bytes),
            Ast::Concat(ref asts) => {
                for ast in asts.iter() {
                    self.walk(ast);
                }
            }
            Ast::Group(ref group) => self.walk(&group.ast),
            Ast::Repetition(ref rep) => {
                // One copy of a repeated literal is required, but whatever
                // follows it may be another copy, so the run ends here.
                match rep.ast.as_literal() {
                    Some(ref lit) if rep.min >= 1 && !lit.is_empty() => {
                        self.flush();
                        self.extend(lit);
                        self.flush();
                    }
                    _ => self.breaks(),
                }
            }
            Ast::Alternation(ref asts) => {
                let lits: Option<Vec<Vec<u8>>> =
                    asts.iter().map(|ast| ast.as_literal()).collect();
                match lits {
                    Some(lits) => {
                        let prefix = common_prefix(&lits);
                        self.extend(prefix);
                        self.breaks();
                    }
                    None => self.breaks(),
                }
            }
            Ast::Dot { .. } | Ast::Class(_) => self.breaks(),
        }
    }

    fn extend(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.run.is_empty() {
            self.run_is_prefix = self.at_start;
        }
        self.run.extend_from_slice(bytes);
        self.at_start = false;
    }

    /// Something that isn't a literal consumed input.
    fn breaks(&mut self) {
        self.flush();
        self.at_start = false;
    }

    fn flush(&mut self) {
        if !self.run.is_empty() {
            let bytes = core::mem::take(&mut self.run);
            self.lits.push(Literal { bytes, prefix: self.run_is_prefix });
        }
    }
}

fn common_prefix(lits: &[Vec<u8>]) -> &[u8] {
    let first = match lits.first() {
        None => return &[],
        Some(first) => first,
    };
    let mut len = first.len();
    for lit in lits[1..].iter() {
        len = first
            .iter()
            .zip(lit.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    &first[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(pattern: &str) -> Vec<(String, bool)> {
        let ast = Ast::parse(pattern).unwrap();
        extract_literals(&ast)
            .into_iter()
            .map(|lit| {
                let s = String::from_utf8(lit.as_bytes().to_vec()).unwrap();
                (s, lit.is_prefix())
            })
            .collect()
    }

    fn best(pattern: &str) -> Option<String> {
        let ast = Ast::parse(pattern).unwrap();
        get_best_literal(&ast)
            .map(|lit| String::from_utf8(lit.as_bytes().to_vec()).unwrap())
    }

    fn s(lit: &str, prefix: bool) -> (String, bool) {
        (lit.to_string(), prefix)
    }

    #[test]
    fn extraction() {
        assert_eq!(lits("hello"), vec![s("hello", true)]);
        assert_eq!(
            lits("hello.*world"),
            vec![s("hello", true), s("world", false)]
        );
        assert_eq!(lits(r".*@example\.com"), vec![s("@example.com", false)]);
        assert_eq!(lits("^abc"), vec![s("abc", true)]);
        assert_eq!(lits("(hello|help|helicopter)"), vec![s("hel", true)]);
        assert_eq!(lits("(abc)+x"), vec![s("abc", true), s("x", false)]);
        assert_eq!(lits("abc|def"), vec![]);
        assert_eq!(lits(r"\d+\.?\d*"), vec![]);
        assert_eq!(lits("(?i)abc"), vec![]);
        assert_eq!(lits("a*bc"), vec![s("bc", false)]);
    }

    #[test]
    fn selection() {
        assert_eq!(best("hello.*world!"), Some("hello".to_string()));
        assert_eq!(best("a.*world"), Some("world".to_string()));
        assert_eq!(
            best(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
            Some("@".to_string())
        );
        assert_eq!(best("[a-z]+"), None);
    }
}
