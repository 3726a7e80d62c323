/*!
Byte sets and byte equivalence classes.

[`ByteSet`] is the bitmap every character class in this crate lowers to. It
is what the eager DFA compiler walks when it fans out transitions, and it
also doubles as a fast membership test for runs of class bytes.

[`ByteClasses`] partitions the 256 byte values into classes of bytes that no
pattern transition can tell apart. The lazy DFA and the one-pass DFA use it
to shrink their transition tables.
*/

use core::fmt;

/// A set of bytes, represented as a 256 bit bitmap.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct ByteSet {
    bits: [u128; 2],
}

impl ByteSet {
    /// Create an empty set of bytes.
    pub const fn empty() -> ByteSet {
        ByteSet { bits: [0; 2] }
    }

    /// Create a set containing every byte.
    pub const fn full() -> ByteSet {
        ByteSet { bits: [u128::MAX; 2] }
    }

    /// Create a set containing exactly the bytes given.
    pub fn from_bytes<I: IntoIterator<Item = u8>>(bytes: I) -> ByteSet {
        let mut set = ByteSet::empty();
        for b in bytes {
            set.add(b);
        }
        set
    }

    /// Add a byte to this set.
    #[inline]
    pub fn add(&mut self, byte: u8) {
        let bucket = byte / 128;
        let bit = byte % 128;
        self.bits[bucket as usize] |= 1 << bit;
    }

    /// Add an inclusive range of bytes.
    pub fn add_all(&mut self, start: u8, end: u8) {
        for b in start..=end {
            self.add(b);
        }
    }

    /// Remove a byte from this set.
    #[inline]
    pub fn remove(&mut self, byte: u8) {
        let bucket = byte / 128;
        let bit = byte % 128;
        self.bits[bucket as usize] &= !(1 << bit);
    }

    /// Return true if and only if the given byte is in this set.
    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        let bucket = byte / 128;
        let bit = byte % 128;
        self.bits[bucket as usize] & (1 << bit) > 0
    }

    /// Return the complement of this set.
    pub fn negate(&self) -> ByteSet {
        ByteSet { bits: [!self.bits[0], !self.bits[1]] }
    }

    pub fn union(&self, other: &ByteSet) -> ByteSet {
        ByteSet {
            bits: [self.bits[0] | other.bits[0], self.bits[1] | other.bits[1]],
        }
    }

    pub fn intersect(&self, other: &ByteSet) -> ByteSet {
        ByteSet {
            bits: [self.bits[0] & other.bits[0], self.bits[1] & other.bits[1]],
        }
    }

    pub fn difference(&self, other: &ByteSet) -> ByteSet {
        self.intersect(&other.negate())
    }

    pub fn symmetric_difference(&self, other: &ByteSet) -> ByteSet {
        ByteSet {
            bits: [self.bits[0] ^ other.bits[0], self.bits[1] ^ other.bits[1]],
        }
    }

    /// Add the other case of every ASCII letter in this set.
    pub fn fold_ascii_case(&mut self) {
        for b in b'a'..=b'z' {
            if self.contains(b) || self.contains(b.to_ascii_uppercase()) {
                self.add(b);
                self.add(b.to_ascii_uppercase());
            }
        }
    }

    /// Returns an iterator over all bytes in this set.
    pub fn iter(&self) -> ByteSetIter<'_> {
        ByteSetIter { set: self, b: 0 }
    }

    /// Returns an iterator over all contiguous ranges of bytes in this set.
    pub fn iter_ranges(&self) -> ByteSetRangeIter<'_> {
        ByteSetRangeIter { set: self, b: 0 }
    }

    /// Return the number of bytes in this set.
    pub fn len(&self) -> usize {
        (self.bits[0].count_ones() + self.bits[1].count_ones()) as usize
    }

    /// Return true if and only if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits == [0, 0]
    }

    /// Return true if and only if this set contains every byte.
    pub fn is_full(&self) -> bool {
        self.bits == [u128::MAX, u128::MAX]
    }

    /// Returns the number of consecutive bytes, starting at `start`, that are
    /// members of this set.
    ///
    /// The haystack is consumed in chunks of 8 bytes. Each chunk is turned
    /// into a membership mask, so a chunk full of members costs one
    /// comparison instead of eight branches.
    ///
    /// If `start` is out of bounds, this returns `0`.
    pub fn count_run(&self, haystack: &[u8], start: usize) -> usize {
        let hay = match haystack.get(start..) {
            None => return 0,
            Some(hay) => hay,
        };
        let mut chunks = hay.chunks_exact(8);
        let mut count = 0;
        for chunk in &mut chunks {
            let mask = self.chunk_mask(chunk);
            if mask != 0xFF {
                return count + mask.trailing_ones() as usize;
            }
            count += 8;
        }
        count
            + chunks.remainder().iter().take_while(|&&b| self.contains(b)).count()
    }

    /// Returns the position of the first byte at or after `start` that is a
    /// member of this set.
    pub fn find(&self, haystack: &[u8], start: usize) -> Option<usize> {
        let hay = haystack.get(start..)?;
        let mut chunks = hay.chunks_exact(8);
        let mut at = start;
        for chunk in &mut chunks {
            let mask = self.chunk_mask(chunk);
            if mask != 0 {
                return Some(at + mask.trailing_zeros() as usize);
            }
            at += 8;
        }
        chunks
            .remainder()
            .iter()
            .position(|&b| self.contains(b))
            .map(|i| at + i)
    }

    #[inline(always)]
    fn chunk_mask(&self, chunk: &[u8]) -> u8 {
        chunk
            .iter()
            .enumerate()
            .fold(0u8, |mask, (i, &b)| mask | ((self.contains(b) as u8) << i))
    }
}

impl fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSet(")?;
        for (i, (start, end)) in self.iter_ranges().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if start == end {
                write!(f, "{:?}", DebugByte(start))?;
            } else {
                write!(f, "{:?}-{:?}", DebugByte(start), DebugByte(end))?;
            }
        }
        write!(f, ")")
    }
}

#[derive(Debug)]
pub struct ByteSetIter<'a> {
    set: &'a ByteSet,
    b: usize,
}

impl<'a> Iterator for ByteSetIter<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while self.b <= 255 {
            let b = self.b as u8;
            self.b += 1;
            if self.set.contains(b) {
                return Some(b);
            }
        }
        None
    }
}

#[derive(Debug)]
pub struct ByteSetRangeIter<'a> {
    set: &'a ByteSet,
    b: usize,
}

impl<'a> Iterator for ByteSetRangeIter<'a> {
    type Item = (u8, u8);

    fn next(&mut self) -> Option<(u8, u8)> {
        while self.b <= 255 {
            let start = self.b as u8;
            self.b += 1;
            if !self.set.contains(start) {
                continue;
            }
            let mut end = start;
            while self.b <= 255 && self.set.contains(self.b as u8) {
                end = self.b as u8;
                self.b += 1;
            }
            return Some((start, end));
        }
        None
    }
}

/// A set of boundaries between byte equivalence classes.
///
/// Each byte recorded in this set marks the end of a class. Two bytes that
/// fall between the same pair of boundaries are never distinguished by any
/// transition in the automaton the set was built from.
#[derive(Clone, Debug, Default)]
pub struct ByteClassSet(ByteSet);

impl ByteClassSet {
    pub fn empty() -> ByteClassSet {
        ByteClassSet(ByteSet::empty())
    }

    /// Indicate that the given inclusive range of bytes can discriminate a
    /// match between it and all other bytes outside of the range.
    pub fn set_range(&mut self, start: u8, end: u8) {
        debug_assert!(start <= end);
        if start > 0 {
            self.0.add(start - 1);
        }
        self.0.add(end);
    }

    /// Convert these boundaries into a map from every byte to its class.
    pub fn byte_classes(&self) -> ByteClasses {
        let mut classes = ByteClasses([0; 256]);
        let mut class = 0u8;
        for b in 0..=255u8 {
            classes.0[b as usize] = class;
            // The class counter can't overflow, since byte 255 is the last
            // byte and we never bump the counter after it.
            if b < 255 && self.0.contains(b) {
                class += 1;
            }
        }
        classes
    }
}

/// A map from every byte to its equivalence class.
#[derive(Clone, Copy)]
pub struct ByteClasses([u8; 256]);

impl ByteClasses {
    /// Creates a map where each byte belongs to its own class.
    pub fn singletons() -> ByteClasses {
        let mut classes = ByteClasses([0; 256]);
        for b in 0..=255u8 {
            classes.0[b as usize] = b;
        }
        classes
    }

    /// Get the equivalence class for the given byte.
    #[inline]
    pub fn get(&self, byte: u8) -> u8 {
        self.0[byte as usize]
    }

    /// Return the total number of equivalence classes.
    #[inline]
    pub fn alphabet_len(&self) -> usize {
        self.0[255] as usize + 1
    }

    /// Returns true if and only if every byte maps to its own class.
    pub fn is_singleton(&self) -> bool {
        self.alphabet_len() == 256
    }

    /// Returns one byte from each equivalence class, in class order.
    pub fn representatives(&self) -> ByteClassRepresentatives<'_> {
        ByteClassRepresentatives { classes: self, byte: 0, last_class: None }
    }

    /// Returns every byte in the given class.
    pub fn elements(&self, class: u8) -> impl Iterator<Item = u8> + '_ {
        (0..=255u8).filter(move |&b| self.get(b) == class)
    }
}

impl fmt::Debug for ByteClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            return write!(f, "ByteClasses({{singletons}})");
        }
        write!(f, "ByteClasses(")?;
        for class in 0..self.alphabet_len() {
            if class > 0 {
                write!(f, ", ")?;
            }
            let set = ByteSet::from_bytes(self.elements(class as u8));
            write!(f, "{} => {:?}", class, set)?;
        }
        write!(f, ")")
    }
}

/// An iterator over representative bytes from each equivalence class.
#[derive(Debug)]
pub struct ByteClassRepresentatives<'a> {
    classes: &'a ByteClasses,
    byte: usize,
    last_class: Option<u8>,
}

impl<'a> Iterator for ByteClassRepresentatives<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while self.byte < 256 {
            let byte = self.byte as u8;
            let class = self.classes.get(byte);
            self.byte += 1;
            if self.last_class != Some(class) {
                self.last_class = Some(class);
                return Some(byte);
            }
        }
        None
    }
}

/// Prints a byte as a readable ASCII character or an escaped hex value.
pub(crate) struct DebugByte(pub(crate) u8);

impl fmt::Debug for DebugByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == b' ' {
            return write!(f, "' '");
        }
        let mut bytes = [0u8; 10];
        let mut len = 0;
        for (i, mut b) in core::ascii::escape_default(self.0).enumerate() {
            if i >= 2 && b'a' <= b && b <= b'f' {
                b -= 32;
            }
            bytes[len] = b;
            len += 1;
        }
        write!(f, "{}", String::from_utf8_lossy(&bytes[..len]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_classes() {
        let mut set = ByteClassSet::empty();
        set.set_range(b'a', b'z');

        let classes = set.byte_classes();
        assert_eq!(classes.get(0), 0);
        assert_eq!(classes.get(b'a' - 1), 0);
        assert_eq!(classes.get(b'a'), 1);
        assert_eq!(classes.get(b'm'), 1);
        assert_eq!(classes.get(b'z'), 1);
        assert_eq!(classes.get(b'z' + 1), 2);
        assert_eq!(classes.get(255), 2);
        assert_eq!(classes.alphabet_len(), 3);

        let reps: Vec<u8> = classes.representatives().collect();
        assert_eq!(reps, vec![0, b'a', b'z' + 1]);
    }

    #[test]
    fn full_byte_classes() {
        let mut set = ByteClassSet::empty();
        for b in 0..=255u8 {
            set.set_range(b, b);
        }
        assert_eq!(set.byte_classes().alphabet_len(), 256);
        assert!(set.byte_classes().is_singleton());
    }

    #[test]
    fn set_algebra() {
        let mut digits = ByteSet::empty();
        digits.add_all(b'0', b'9');
        assert_eq!(digits.len(), 10);
        assert_eq!(digits.negate().len(), 246);
        assert!(digits.union(&digits.negate()).is_full());
        assert!(digits.intersect(&digits.negate()).is_empty());

        let mut low = ByteSet::empty();
        low.add_all(b'0', b'4');
        assert_eq!(digits.difference(&low).iter().collect::<Vec<_>>(), b"56789");
        assert_eq!(
            digits.iter_ranges().collect::<Vec<_>>(),
            vec![(b'0', b'9')]
        );
    }

    #[test]
    fn fold_case() {
        let mut set = ByteSet::from_bytes(b"aZ!".iter().copied());
        set.fold_ascii_case();
        assert!(set.contains(b'A'));
        assert!(set.contains(b'z'));
        assert!(set.contains(b'!'));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn count_run() {
        let mut digits = ByteSet::empty();
        digits.add_all(b'0', b'9');

        assert_eq!(digits.count_run(b"", 0), 0);
        assert_eq!(digits.count_run(b"123", 5), 0);
        assert_eq!(digits.count_run(b"abc", 0), 0);
        assert_eq!(digits.count_run(b"123abc", 0), 3);
        assert_eq!(digits.count_run(b"abc123", 3), 3);
        // Runs that cross chunk boundaries.
        assert_eq!(digits.count_run(b"0123456789012x", 0), 13);
        assert_eq!(digits.count_run(b"01234567", 0), 8);
        assert_eq!(digits.count_run(b"0123456789012345678", 1), 18);
    }

    #[test]
    fn find() {
        let set = ByteSet::from_bytes(b"xyz".iter().copied());
        assert_eq!(set.find(b"abcdefghijklmnopqrstuvwxyz", 0), Some(23));
        assert_eq!(set.find(b"aaaaaaaaaaaaaaaaz", 3), Some(16));
        assert_eq!(set.find(b"aaaaaaaaaaaaaaaa", 0), None);
        assert_eq!(set.find(b"x", 2), None);
    }
}
