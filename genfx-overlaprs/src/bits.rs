use num_traits::{PrimInt, Signed, identities::zero};

use super::Overlapper;
use genfx_core::models::Interval;

/// Binary Interval Search over closed intervals.
///
/// From the journal article: <https://academic.oup.com/bioinformatics/article/29/1/1/273289>
///
/// Intervals are kept sorted by start together with sorted start and end
/// lists. A query binary searches to the first interval that could reach the
/// query start (using the longest interval length as look-behind) and scans
/// forward until intervals start after the query end.
///
/// # Examples
///
/// ```
/// use genfx_overlaprs::{Bits, Overlapper, Interval};
///
/// let exons = vec![
///     Interval { start: 100i64, end: 150, val: "exon1" },
///     Interval { start: 200, end: 250, val: "exon2" },
///     Interval { start: 225, end: 275, val: "exon3" },
/// ];
///
/// let bits = Bits::build(exons);
///
/// // both ends are inclusive
/// assert_eq!(bits.find(150, 200).len(), 2);
/// assert_eq!(bits.count(210, 240), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Bits<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// List of intervals
    pub intervals: Vec<Interval<I, T>>,
    /// Sorted list of start positions,
    starts: Vec<I>,
    /// Sorted list of end positions,
    ends: Vec<I>,
    /// The length of the longest interval
    max_len: I,
}

impl<I, T> Overlapper<I, T> for Bits<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Create a new instance of Bits by passing in a vector of Intervals. This vector will
    /// immediately be sorted by start order.
    fn build(mut intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        intervals.sort();
        let (mut starts, mut ends): (Vec<_>, Vec<_>) = intervals.iter().map(|x| (x.start, x.end)).unzip();
        starts.sort();
        ends.sort();
        let max_len = intervals
            .iter()
            .map(|iv| iv.end - iv.start)
            .fold(zero::<I>(), |acc, len| if len > acc { len } else { acc });
        Bits {
            intervals,
            starts,
            ends,
            max_len,
        }
    }

    #[inline]
    fn find(&self, start: I, stop: I) -> Vec<Interval<I, T>> {
        self.find_iter(start, stop).cloned().collect()
    }

    fn find_iter<'a>(&'a self, start: I, stop: I) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        let finder = IterFind {
            inner: self,
            off: Self::lower_bound(start - self.max_len, &self.intervals),
            start,
            stop,
        };
        Box::new(finder)
    }

    #[inline]
    fn len(&self) -> usize {
        self.intervals.len()
    }
}

impl<I, T> Bits<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Return an iterator over the intervals in start order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Interval<I, T>> {
        self.intervals.iter()
    }

    /// Determine the first index that we should start checking for overlaps for via a binary
    /// search.
    /// Assumes that the maximum interval length in `intervals` has been subtracted from
    /// `start`, otherwise the result is undefined
    #[inline]
    pub fn lower_bound(start: I, intervals: &[Interval<I, T>]) -> usize {
        let mut size = intervals.len();
        let mut low = 0;

        while size > 0 {
            let half = size / 2;
            let other_half = size - half;
            let probe = low + half;
            let other_low = low + other_half;
            let v = &intervals[probe];
            size = half;
            low = if v.start < start { other_low } else { low }
        }
        low
    }

    /// Index of the first element `>= key` in a sorted slice.
    #[inline]
    pub fn bsearch_seq<K>(key: K, elems: &[K]) -> usize
    where
        K: PartialEq + PartialOrd,
    {
        if elems.is_empty() || elems[0] >= key {
            return 0;
        } else if elems[elems.len() - 1] < key {
            return elems.len();
        }

        let mut cursor = 0;
        let mut length = elems.len();
        while length > 1 {
            let half = length >> 1;
            length -= half;
            cursor += (usize::from(elems[cursor + half - 1] < key)) * half;
        }
        cursor
    }

    /// Count all intervals that overlap `[start, stop]` with two binary searches: everything
    /// ending before `start` or starting after `stop` is excluded.
    #[inline]
    pub fn count(&self, start: I, stop: I) -> usize {
        let len = self.intervals.len();
        let ends_before = Self::bsearch_seq(start, &self.ends);
        let starts_before_or_at = Self::bsearch_seq(stop + I::one(), &self.starts);
        let num_cant_after = len - starts_before_or_at;
        len - ends_before - num_cant_after
    }
}

/// An iterator over intervals in a [`Bits`] structure that overlap with a query range.
#[derive(Debug)]
pub struct IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Signed + Send + Sync,
{
    inner: &'a Bits<I, T>,
    off: usize,
    start: I,
    stop: I,
}

impl<'a, I, T> Iterator for IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Signed + Send + Sync,
{
    type Item = &'a Interval<I, T>;

    #[inline]
    // interval.start <= stop && interval.end >= start
    fn next(&mut self) -> Option<Self::Item> {
        while self.off < self.inner.intervals.len() {
            let interval = &self.inner.intervals[self.off];
            self.off += 1;
            if interval.overlap(self.start, self.stop) {
                return Some(interval);
            } else if interval.start > self.stop {
                break;
            }
        }
        None
    }
}
