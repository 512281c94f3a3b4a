use std::fmt::{self, Debug, Formatter};

type BitBlock = u64;

const BLOCK_NBITS: usize = std::mem::size_of::<BitBlock>() * 8;

/// Fixed-capacity set of small integers. Hashable so that sets of NFA states
/// can be interned while building a DFA.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct BitSet {
  slice: Box<[BitBlock]>,
}

impl BitSet {
  pub fn new(num_bits: usize) -> Self {
    let len = (num_bits + BLOCK_NBITS - 1) / BLOCK_NBITS;
    Self {
      slice: vec![0; len].into_boxed_slice(),
    }
  }

  pub fn from_bit(num_bits: usize, bit: usize) -> Self {
    let mut s = Self::new(num_bits);
    s.insert(bit);
    s
  }

  /// Returns whether the bit was newly inserted.
  pub fn insert(&mut self, bit: usize) -> bool {
    let mask = 1 << (bit % BLOCK_NBITS);
    let block = &mut self.slice[bit / BLOCK_NBITS];
    let fresh = *block & mask == 0;
    *block |= mask;
    fresh
  }

  pub fn contains(&self, bit: usize) -> bool {
    self.slice[bit / BLOCK_NBITS] & (1 << (bit % BLOCK_NBITS)) != 0
  }

  pub fn is_empty(&self) -> bool {
    self.slice.iter().all(|&x| x == 0)
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
  type Item = usize;

  fn next(&mut self) -> Option<usize> {
    while self.index < self.slice.len() {
      if self.bit < BLOCK_NBITS {
        let bit = (self.slice[self.index] & !((1 << self.bit) - 1))
          .trailing_zeros() as usize;
        if bit < BLOCK_NBITS {
          self.bit = bit + 1;
          return Some(self.index * BLOCK_NBITS + bit);
        }
      }

      self.index += 1;
      self.bit = 0;
    }
    None
  }
}

impl Debug for BitSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}
