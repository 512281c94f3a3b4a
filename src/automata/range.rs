use std::fmt::{self, Debug, Formatter};
use crate::error::{Result, SyntaxError};

/// A closed interval of symbol codes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
  lo: u32,
  hi: u32,
}

impl Range {
  pub fn new(lo: u32, hi: u32) -> Result<Self> {
    if lo > hi {
      return Err(SyntaxError::new(format!(
        "invalid range [{}, {}], the lower bound is greater than the upper bound",
        lo, hi)));
    }
    Ok(Self { lo, hi })
  }

  pub const fn single(code: u32) -> Self {
    Self { lo: code, hi: code }
  }

  /// Caller guarantees `lo <= hi`.
  pub(crate) const fn spanning(lo: u32, hi: u32) -> Self {
    Self { lo, hi }
  }

  pub fn lo(&self) -> u32 {
    self.lo
  }

  pub fn hi(&self) -> u32 {
    self.hi
  }

  pub fn contains(&self, code: u32) -> bool {
    self.lo <= code && code <= self.hi
  }

  pub fn includes(&self, other: &Range) -> bool {
    self.lo <= other.lo && other.hi <= self.hi
  }

  fn overlaps(&self, other: &Range) -> bool {
    self.lo <= other.hi && other.lo <= self.hi
  }
}

impl Debug for Range {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    if self.lo == self.hi {
      write!(f, "[{}]", self.lo)
    } else {
      write!(f, "[{}, {}]", self.lo, self.hi)
    }
  }
}

/// A sorted union of non-overlapping ranges.
///
/// Adjacent ranges are kept apart: a set describes which codes are permitted,
/// it is not a canonical form. Equality looks through the split.
#[derive(Clone, Default)]
pub struct RangeSet {
  ranges: Vec<Range>,
}

impl RangeSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, range: Range) {
    let mut merged = range;
    self.ranges.retain(|r| {
      if r.overlaps(&merged) {
        merged = Range::spanning(r.lo.min(merged.lo), r.hi.max(merged.hi));
        false
      } else {
        true
      }
    });
    let at = self.ranges.partition_point(|r| r.lo < merged.lo);
    self.ranges.insert(at, merged);
  }

  pub fn union(&self, other: &RangeSet) -> RangeSet {
    let mut result = self.clone();
    for &range in &other.ranges {
      result.add(range);
    }
    result
  }

  pub fn contains(&self, code: u32) -> bool {
    let at = self.ranges.partition_point(|r| r.hi < code);
    self.ranges.get(at).map_or(false, |r| r.contains(code))
  }

  pub fn is_empty(&self) -> bool {
    self.ranges.is_empty()
  }

  /// Whether every code of `range` is in the set, across split neighbours.
  pub fn includes(&self, range: &Range) -> bool {
    self.coalesced().iter().any(|r| r.includes(range))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Range> + '_ {
    self.ranges.iter()
  }

  /// Ranges with adjacent neighbours joined.
  fn coalesced(&self) -> Vec<Range> {
    let mut out: Vec<Range> = Vec::with_capacity(self.ranges.len());
    for &r in &self.ranges {
      match out.last_mut() {
        Some(last) if last.hi.checked_add(1) == Some(r.lo) => last.hi = r.hi,
        _ => out.push(r),
      }
    }
    out
  }
}

impl PartialEq for RangeSet {
  fn eq(&self, other: &RangeSet) -> bool {
    self.coalesced() == other.coalesced()
  }
}

impl Eq for RangeSet {}

impl From<Range> for RangeSet {
  fn from(range: Range) -> RangeSet {
    RangeSet {
      ranges: vec![range],
    }
  }
}

impl Debug for RangeSet {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_set().entries(self.ranges.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn range(lo: u32, hi: u32) -> Range {
    Range::new(lo, hi).unwrap()
  }

  #[test]
  fn reversed_bounds() {
    let err = Range::new(5, 2).unwrap_err();
    assert!(err.message().contains("[5, 2]"));
  }

  #[test]
  fn add_merges_overlaps_only() {
    let mut set = RangeSet::new();
    set.add(range(10, 20));
    set.add(range(1, 3));
    set.add(range(4, 5));
    set.add(range(15, 30));

    let ranges = set.iter().copied().collect::<Vec<_>>();

    assert_eq!(ranges, vec![range(1, 3), range(4, 5), range(10, 30)]);
  }

  #[test]
  fn adjacent_ranges_compare_equal() {
    let mut split = RangeSet::new();
    split.add(range(1, 2));
    split.add(range(3, 4));

    assert_eq!(split, RangeSet::from(range(1, 4)));
    assert_ne!(split, RangeSet::from(range(1, 5)));
  }

  #[test]
  fn membership() {
    let set = RangeSet::from(range(0x41, 0x5a)).union(&RangeSet::from(range(0x61, 0x7a)));

    assert!(set.contains(0x41));
    assert!(set.contains(0x7a));
    assert!(!set.contains(0x60));
    assert!(!set.contains(0x7b));
    assert!(!RangeSet::new().contains(0));
  }

  #[test]
  fn inclusion_spans_split_neighbours() {
    let mut set = RangeSet::new();
    set.add(range(0, 9));
    set.add(range(10, 19));
    let set = set.union(&RangeSet::from(range(30, 39)));

    assert!(set.includes(&range(5, 15)));
    assert!(set.includes(&range(30, 30)));
    assert!(!set.includes(&range(15, 30)));
    assert!(!RangeSet::new().includes(&range(0, 0)));
  }
}
