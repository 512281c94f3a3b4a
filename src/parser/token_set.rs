use std::fmt::{self, Debug, Formatter};
use crate::rule::END_OF_INPUT;

type BitBlock = u64;

const BLOCK_NBITS: usize = std::mem::size_of::<BitBlock>() * 8;

/// Number of distinct lookahead symbols: every literal code plus end of input.
pub(crate) const NUM_LOOKAHEADS: usize = END_OF_INPUT as usize + 1;

/// A set of lookahead symbols.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct TokenSet {
  slice: Box<[BitBlock]>,
}

impl TokenSet {
  pub fn new() -> Self {
    let len = (NUM_LOOKAHEADS + BLOCK_NBITS - 1) / BLOCK_NBITS;
    Self {
      slice: vec![0; len].into_boxed_slice(),
    }
  }

  pub fn clear(&mut self) {
    for x in self.slice.iter_mut() {
      *x = 0;
    }
  }

  pub fn insert(&mut self, token: u32) {
    self.slice[token as usize / BLOCK_NBITS] |=
      1 << (token as u64 % BLOCK_NBITS as u64);
  }

  pub fn insert_range(&mut self, lo: u32, hi: u32) {
    for token in lo..=hi {
      self.insert(token);
    }
  }

  #[cfg(test)]
  pub fn contains(&self, token: u32) -> bool {
    self.slice[token as usize / BLOCK_NBITS] & (1 << (token as u64 % BLOCK_NBITS as u64)) != 0
  }

  /// Returns whether the set has changed.
  pub fn union_with(&mut self, other: &TokenSet) -> bool {
    let mut changed = false;
    for i in 0..self.slice.len() {
      let old = self.slice[i];
      self.slice[i] |= other.slice[i];
      changed |= old != self.slice[i];
    }
    changed
  }

  pub fn iter(&self) -> Iter {
    Iter {
      slice: &*self.slice,
      bit: 0,
      index: 0,
    }
  }
}

pub(crate) struct Iter<'a> {
  slice: &'a [BitBlock],
  bit: usize,
  index: usize,
}

impl<'a> Iterator for Iter<'a> {
  type Item = u32;

  fn next(&mut self) -> Option<u32> {
    while self.index < self.slice.len() {
      if self.bit < BLOCK_NBITS {
        let bit = (self.slice[self.index] & !((1 << self.bit) - 1))
          .trailing_zeros() as usize;
        if bit < BLOCK_NBITS {
          self.bit = bit + 1;
          return Some((self.index * BLOCK_NBITS + bit) as u32);
        }
      }

      self.index += 1;
      self.bit = 0;
    }
    None
  }
}

impl Debug for TokenSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::TokenSet;
  use crate::rule::END_OF_INPUT;
  use pretty_assertions::assert_eq;

  #[test]
  fn insert() {
    let mut set = TokenSet::new();

    set.insert(7);
    set.insert(3);
    set.insert(7);
    set.insert(END_OF_INPUT);

    let vec = set.iter().collect::<Vec<_>>();

    assert_eq!(vec, vec![3, 7, END_OF_INPUT]);
    assert!(set.contains(END_OF_INPUT));
    assert!(!set.contains(4));
  }

  #[test]
  fn union_reports_change() {
    let mut a = TokenSet::new();
    a.insert_range(0x30, 0x32);
    let mut b = TokenSet::new();
    b.insert(0x31);

    assert!(!a.union_with(&b));
    b.insert(0x7e);
    assert!(a.union_with(&b));
    assert_eq!(a.iter().collect::<Vec<_>>(), vec![0x30, 0x31, 0x32, 0x7e]);

    a.clear();
    assert_eq!(a.iter().next(), None);
  }
}
