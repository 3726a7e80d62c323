/*!
A lazy DFA backed by a bounded, least recently used state cache.

See [`DFA`] for details. The cache is kept separate from the DFA so that one
DFA can be shared between threads, each searching with its own [`Cache`].
*/

pub use self::{
    dfa::{Builder, Cache, Config, Stats, DFA, MAX_CACHE_CAPACITY},
    error::CacheError,
    id::LazyStateID,
};

mod dfa;
mod error;
mod id;
mod search;
mod state;
