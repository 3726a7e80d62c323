/*!
A memoizing cache of compiled patterns.

[`PatternCache`] compiles each distinct pattern string at most once, even
when many threads ask for the same pattern at the same time: every caller
waits on the same cell and receives the same [`Regex`]. Entries never expire.
They are only dropped by [`PatternCache::clear`].

The free functions [`compile_regex`], [`clear_regex_cache`] and
[`get_stats`] operate on one cache shared by the whole process.
*/

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use crate::{
    error::Error,
    meta::{regex::Regex, stats::Stats},
};

type Slot = Arc<OnceLock<Result<Regex, Error>>>;

#[derive(Debug, Default)]
pub struct PatternCache {
    map: Mutex<HashMap<String, Slot>>,
    last: Mutex<Option<Regex>>,
}

impl PatternCache {
    pub fn new() -> PatternCache {
        PatternCache::default()
    }

    /// Return the compiled form of `pattern`, compiling it if no other call
    /// has. Compile errors are cached too, since compiling again would fail
    /// the same way.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, Error> {
        let slot = {
            let mut map = lock(&self.map);
            Arc::clone(map.entry(pattern.to_string()).or_default())
        };
        // The map lock is released while compiling, so that compiling one
        // pattern never blocks lookups of another.
        let result = slot
            .get_or_init(|| {
                debug!("compiling uncached pattern {:?}", pattern);
                Regex::new(pattern)
            })
            .clone();
        if let Ok(ref re) = result {
            *lock(&self.last) = Some(re.clone());
        }
        result
    }

    /// The number of patterns cached, including ones that failed to
    /// compile.
    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached pattern. Regexes already handed out stay valid.
    pub fn clear(&self) {
        lock(&self.map).clear();
        *lock(&self.last) = None;
    }

    /// Describe the most recently requested pattern that compiled.
    pub fn last_stats(&self) -> Option<Stats> {
        lock(&self.last).as_ref().map(|re| re.stats())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Nothing here can panic while holding a lock in a way that leaves the
    // value inconsistent.
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn global() -> &'static PatternCache {
    static CACHE: OnceLock<PatternCache> = OnceLock::new();
    CACHE.get_or_init(PatternCache::new)
}

/// Compile a pattern through the process wide cache.
pub fn compile_regex(pattern: &str) -> Result<Regex, Error> {
    global().get_or_compile(pattern)
}

/// Empty the process wide cache.
pub fn clear_regex_cache() {
    global().clear()
}

/// Describe the pattern most recently compiled through [`compile_regex`]:
/// the engine and optimization it uses and its lazy DFA cache counters.
pub fn get_stats() -> String {
    match global().last_stats() {
        None => "no pattern compiled".to_string(),
        Some(stats) => stats.to_string(),
    }
}
