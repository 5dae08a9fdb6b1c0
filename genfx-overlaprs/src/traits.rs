use num_traits::{PrimInt, Signed};

pub use genfx_core::models::Interval;

/// Overlap queries over closed intervals: `find(start, end)` returns every
/// interval with `interval.start <= end && interval.end >= start`.
pub trait Overlapper<I, T>: Send + Sync
where
    I: PrimInt + Signed + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized;

    fn find(&self, start: I, end: I) -> Vec<Interval<I, T>>;

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
