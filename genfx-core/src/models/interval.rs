use num_traits::{PrimInt, Signed};
use std::cmp::Ordering::{self};

/// Represent a closed range [start, end]
/// Both ends are inclusive. Coordinates are signed since circular
/// chromosomes may place features before the origin.
#[derive(Eq, Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Interval<I, T>) -> Ordering {
        match self.start.cmp(&other.start) {
            Ordering::Equal => self.end.cmp(&other.end),
            ord => ord,
        }
    }
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Number of positions covered
    #[inline]
    pub fn len(&self) -> I {
        self.end - self.start + I::one()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Check if the interval intersects the closed range [start, end]
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start <= end && self.end >= start
    }

    /// Size of the intersection between two intervals
    #[inline]
    pub fn intersect(&self, other: &Interval<I, T>) -> I {
        let len = std::cmp::min(self.end, other.end) - std::cmp::max(self.start, other.start) + I::one();
        if len < I::zero() { I::zero() } else { len }
    }

    /// Move both ends by `delta`
    #[inline]
    pub fn shift(&mut self, delta: I) {
        self.start = self.start + delta;
        self.end = self.end + delta;
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Interval<I, T>) -> bool {
        self.start == other.start && self.end == other.end
    }
}
