/*!
Capture group offsets.

A [`Captures`] holds two slots per group: slot `2*i` is where group `i`
started and slot `2*i+1` is where it ended. Group `0` is the overall match.
A slot is `None` when its group did not participate in the match.
*/

use crate::util::search::Match;

/// The offsets of every capture group of a single match.
#[derive(Clone, Eq, PartialEq)]
pub struct Captures {
    slots: Vec<Option<usize>>,
}

impl Captures {
    /// Create an empty set of captures for a pattern with `group_len`
    /// groups, including the implicit group `0`.
    pub fn new(group_len: usize) -> Captures {
        Captures { slots: vec![None; group_len * 2] }
    }

    /// Returns true if this holds a match.
    pub fn is_match(&self) -> bool {
        self.slots.first().map_or(false, |s| s.is_some())
    }

    /// Returns the number of groups, including the implicit group `0`.
    pub fn group_len(&self) -> usize {
        self.slots.len() / 2
    }

    /// Returns the overall match, if any.
    pub fn get_match(&self) -> Option<Match> {
        self.get_group(0)
    }

    /// Returns the span of the given group, if it participated in the match.
    pub fn get_group(&self, index: usize) -> Option<Match> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Some(Match::with_group(index, start, end))
    }

    /// Returns an iterator over every group, in index order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Match>> + '_ {
        (0..self.group_len()).map(move |i| self.get_group(i))
    }

    /// Returns the raw slot offsets.
    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<usize>] {
        &mut self.slots
    }

    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }
}

impl core::fmt::Debug for Captures {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut list = f.debug_list();
        for group in self.iter() {
            list.entry(&group.map(|m| m.range()));
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups() {
        let mut caps = Captures::new(3);
        assert!(!caps.is_match());
        caps.slots_mut().copy_from_slice(&[
            Some(0),
            Some(4),
            Some(2),
            Some(4),
            None,
            None,
        ]);
        assert!(caps.is_match());
        assert_eq!(caps.get_match(), Some(Match::new(0, 4)));
        assert_eq!(caps.get_group(1), Some(Match::with_group(1, 2, 4)));
        assert_eq!(caps.get_group(2), None);
        assert_eq!(caps.get_group(3), None);
        assert_eq!(format!("{:?}", caps), "[Some(0..4), Some(2..4), None]");

        caps.clear();
        assert!(!caps.is_match());
    }
}
