// Basic FNV-1a hashing, as described at
// https://en.wikipedia.org/wiki/Fowler%E2%80%93Noll%E2%80%93Vo_hash_function
//
// The lazy DFA hashes every NFA state set it builds, so the hash has to be
// cheap. Maps keyed by a precomputed hash use this hasher too, since SipHash
// buys nothing on keys that are already hashes.

use std::collections::HashMap as StdHashMap;
use std::hash::{self, BuildHasherDefault};

use crate::util::primitives::StateID;

const PRIME: u64 = 1099511628211;
const INIT: u64 = 14695981039346656037;

pub(crate) type HashMap<K, V> = StdHashMap<K, V, BuildHasherDefault<Hasher>>;

#[derive(Debug)]
pub(crate) struct Hasher(u64);

impl Default for Hasher {
    fn default() -> Hasher {
        Hasher(INIT)
    }
}

impl hash::Hasher for Hasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes.iter() {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }
}

/// Hash an ordered sequence of states along with a set of flags.
///
/// Order matters: the same states in a different priority order hash (and
/// compare) differently.
pub(crate) fn hash_states(flags: u32, states: &[StateID]) -> u64 {
    let mut h = INIT;
    for byte in flags.to_le_bytes() {
        h = (h ^ byte as u64).wrapping_mul(PRIME);
    }
    for sid in states.iter() {
        for byte in sid.as_u32().to_le_bytes() {
            h = (h ^ byte as u64).wrapping_mul(PRIME);
        }
    }
    h
}
