//! Sparse integer address sets
//!
//! A [`RangeSet`] holds a set of non-negative addresses as an ordered list of
//! disjoint closed intervals. Intervals never overlap or touch: inserting an
//! address or range next to an existing interval merges the two.
//!
//! The main use is planning register reads. Descriptor tables add the address
//! range of every field they need, then [`RangeSet::coalesce`] merges nearby
//! ranges so fewer (but larger) read transactions are needed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid range {first}-{last}: first address is after last address")]
    Inverted { first: u32, last: u32 },
}

/// A closed interval of addresses, `first..=last`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct IntRange {
    first: u32,
    last: u32,
}

impl IntRange {
    pub fn new(first: u32, last: u32) -> Result<Self, RangeError> {
        if first > last {
            return Err(RangeError::Inverted { first, last });
        }
        Ok(IntRange { first, last })
    }

    /// A range covering a single address
    pub fn single(address: u32) -> Self {
        IntRange {
            first: address,
            last: address,
        }
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    /// Number of addresses covered; always at least 1
    pub fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }

    pub fn contains(&self, address: u32) -> bool {
        self.first <= address && address <= self.last
    }

    pub fn contains_range(&self, other: &IntRange) -> bool {
        self.first <= other.first && other.last <= self.last
    }
}

#[derive(Deserialize)]
struct RawRange {
    first: u32,
    last: u32,
}

impl TryFrom<RawRange> for IntRange {
    type Error = RangeError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        IntRange::new(raw.first, raw.last)
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Ordered set of disjoint, non-adjacent address ranges
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRangeSet")]
pub struct RangeSet {
    ranges: Vec<IntRange>,
}

/// Deserialized ranges in any order, merged on the way in
#[derive(Deserialize)]
struct RawRangeSet {
    ranges: Vec<IntRange>,
}

impl From<RawRangeSet> for RangeSet {
    fn from(raw: RawRangeSet) -> Self {
        raw.ranges.into_iter().collect()
    }
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet { ranges: Vec::new() }
    }

    pub fn add(&mut self, address: u32) {
        self.insert(IntRange::single(address));
    }

    /// Add every address in `first..=last`, merging with touching ranges
    pub fn add_range(&mut self, first: u32, last: u32) -> Result<(), RangeError> {
        self.insert(IntRange::new(first, last)?);
        Ok(())
    }

    pub fn insert(&mut self, range: IntRange) {
        // Ranges in [lo, hi) overlap or touch the new one.
        let lo = self
            .ranges
            .partition_point(|r| r.last.saturating_add(1) < range.first);
        let hi = self
            .ranges
            .partition_point(|r| r.first <= range.last.saturating_add(1));

        if lo >= hi {
            self.ranges.insert(lo, range);
            return;
        }

        let merged = IntRange {
            first: range.first.min(self.ranges[lo].first),
            last: range.last.max(self.ranges[hi - 1].last),
        };
        self.ranges.splice(lo..hi, std::iter::once(merged));
    }

    /// Add all ranges of another set
    pub fn extend_from(&mut self, other: &RangeSet) {
        for r in &other.ranges {
            self.insert(*r);
        }
    }

    pub fn contains(&self, address: u32) -> bool {
        let idx = self.ranges.partition_point(|r| r.last < address);
        self.ranges.get(idx).is_some_and(|r| r.first <= address)
    }

    /// Test if every address of `range` is in the set
    pub fn contains_all(&self, range: &IntRange) -> bool {
        let idx = self.ranges.partition_point(|r| r.last < range.first);
        self.ranges
            .get(idx)
            .is_some_and(|r| r.contains_range(range))
    }

    /// The ranges in ascending order
    pub fn ranges(&self) -> &[IntRange] {
        &self.ranges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IntRange> {
        self.ranges.iter()
    }

    /// Number of ranges (not addresses)
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of addresses in the set
    pub fn address_count(&self) -> u64 {
        self.ranges.iter().map(IntRange::len).sum()
    }

    /// Combine ranges to reduce the number of ranges in the set.
    ///
    /// Walks the ranges in ascending order, extending an accumulator range over
    /// the next range as long as the combined length stays within
    /// `max_length`. For example `0-1, 3-5, 20-28, 404-406, 412-418` combined
    /// with a maximum length of 32 gives `0-28, 404-418`.
    ///
    /// Ranges are only ever merged, never split: a single range already longer
    /// than `max_length` is returned as-is. Sets with fewer than two ranges are
    /// returned unchanged.
    pub fn coalesce(&self, max_length: u32) -> RangeSet {
        let Some((head, tail)) = self.ranges.split_first() else {
            return self.clone();
        };
        if tail.is_empty() {
            return self.clone();
        }

        let mut result = Vec::with_capacity(self.ranges.len());
        let mut curr = *head;
        for r in tail {
            if u64::from(r.last - curr.first) < u64::from(max_length) {
                curr = IntRange {
                    first: curr.first,
                    last: r.last,
                };
            } else {
                result.push(curr);
                curr = *r;
            }
        }
        result.push(curr);

        RangeSet { ranges: result }
    }
}

impl FromIterator<IntRange> for RangeSet {
    fn from_iter<I: IntoIterator<Item = IntRange>>(iter: I) -> Self {
        let mut set = RangeSet::new();
        for r in iter {
            set.insert(r);
        }
        set
    }
}

impl Extend<IntRange> for RangeSet {
    fn extend<I: IntoIterator<Item = IntRange>>(&mut self, iter: I) {
        for r in iter {
            self.insert(r);
        }
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a IntRange;
    type IntoIter = std::slice::Iter<'a, IntRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{r}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(ranges: &[(u32, u32)]) -> RangeSet {
        let mut set = RangeSet::new();
        for &(first, last) in ranges {
            set.add_range(first, last).unwrap();
        }
        set
    }

    fn pairs(set: &RangeSet) -> Vec<(u32, u32)> {
        set.iter().map(|r| (r.first(), r.last())).collect()
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            IntRange::new(5, 4),
            Err(RangeError::Inverted { first: 5, last: 4 })
        );
        let mut set = RangeSet::new();
        assert!(set.add_range(10, 1).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_merges_adjacent() {
        let mut set = RangeSet::new();
        set.add(1);
        set.add(3);
        assert_eq!(pairs(&set), vec![(1, 1), (3, 3)]);

        set.add(2);
        assert_eq!(pairs(&set), vec![(1, 3)]);

        set.add(0);
        set.add(4);
        assert_eq!(pairs(&set), vec![(0, 4)]);
    }

    #[test]
    fn test_add_range_bridges_several() {
        let mut set = set_of(&[(0, 1), (5, 6), (10, 12), (20, 21)]);
        set.add_range(2, 10).unwrap();
        assert_eq!(pairs(&set), vec![(0, 12), (20, 21)]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut set = set_of(&[(3, 7)]);
        set.add_range(3, 7).unwrap();
        set.add(5);
        assert_eq!(pairs(&set), vec![(3, 7)]);
    }

    #[test]
    fn test_contains() {
        let set = set_of(&[(0, 1), (3, 5)]);
        assert!(set.contains(0));
        assert!(set.contains(1));
        assert!(!set.contains(2));
        assert!(set.contains(5));
        assert!(!set.contains(6));

        assert!(set.contains_all(&IntRange::new(3, 5).unwrap()));
        assert!(!set.contains_all(&IntRange::new(1, 3).unwrap()));
        assert!(!set.contains_all(&IntRange::new(4, 6).unwrap()));
    }

    #[test]
    fn test_upper_bound_addresses() {
        let mut set = RangeSet::new();
        set.add(u32::MAX);
        set.add(u32::MAX - 1);
        assert_eq!(pairs(&set), vec![(u32::MAX - 1, u32::MAX)]);
        assert_eq!(set.address_count(), 2);
    }

    #[test]
    fn test_coalesce_documented_example() {
        let set = set_of(&[(0, 1), (3, 5), (20, 28), (404, 406), (412, 418)]);
        let combined = set.coalesce(32);
        assert_eq!(pairs(&combined), vec![(0, 28), (404, 418)]);
    }

    #[test]
    fn test_coalesce_small_sets_unchanged() {
        assert!(RangeSet::new().coalesce(8).is_empty());

        let single = set_of(&[(0, 99)]);
        assert_eq!(single.coalesce(8), single);
    }

    #[test]
    fn test_coalesce_never_splits_oversized_range() {
        let set = set_of(&[(0, 99), (101, 102), (200, 201)]);
        let combined = set.coalesce(16);
        assert_eq!(pairs(&combined), vec![(0, 99), (101, 102), (200, 201)]);
    }

    #[test]
    fn test_coalesce_exact_limit() {
        let set = set_of(&[(0, 1), (30, 31)]);
        assert_eq!(pairs(&set.coalesce(32)), vec![(0, 31)]);
        assert_eq!(pairs(&set.coalesce(31)), vec![(0, 1), (30, 31)]);
    }

    #[test]
    fn test_display() {
        let set = set_of(&[(0, 1), (3, 3), (20, 28)]);
        assert_eq!(set.to_string(), "[0-1, 3, 20-28]");
    }
}
