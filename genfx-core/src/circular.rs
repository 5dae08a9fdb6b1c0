//! Coordinate correction for features on circular chromosomes.
//!
//! Annotations on circular genomes (mitochondria, bacterial chromosomes) often
//! describe a transcript that crosses the origin with segments near the end
//! of the chromosome and segments near 0. [`CircularCorrection`] rewrites such
//! segment sets so that they become contiguous, moving the wrapped part to
//! negative coordinates.
use crate::models::{Interval, Pos};

#[derive(Debug, Clone)]
pub struct CircularCorrection {
    chromosome_length: Pos,
    correct_large_gap: bool,
    corrected: bool,
}

impl CircularCorrection {
    pub fn new(chromosome_length: Pos) -> Self {
        CircularCorrection {
            chromosome_length,
            correct_large_gap: false,
            corrected: false,
        }
    }

    /// Also treat a gap larger than half the chromosome as the wrap point.
    pub fn with_large_gap(mut self, correct_large_gap: bool) -> Self {
        self.correct_large_gap = correct_large_gap;
        self
    }

    /// Has any call to [`correct`](Self::correct) changed a segment?
    pub fn is_corrected(&self) -> bool {
        self.corrected
    }

    ///
    /// Correct a set of segments in place. Segment order is preserved.
    /// Returns true if anything was moved.
    ///
    pub fn correct<T>(&mut self, segments: &mut [Interval<Pos, T>]) -> bool
    where
        T: Eq + Clone + Send + Sync,
    {
        if self.chromosome_length <= 0 || segments.is_empty() {
            return false;
        }

        let mut changed = self.correct_start_after_end(segments);
        changed |= self.correct_after_chromosome_end(segments);
        if self.correct_large_gap {
            changed |= self.correct_gap(segments);
        }

        self.corrected |= changed;
        changed
    }

    fn correct_start_after_end<T>(&self, segments: &mut [Interval<Pos, T>]) -> bool
    where
        T: Eq + Clone + Send + Sync,
    {
        let mut changed = false;
        for seg in segments.iter_mut().filter(|s| s.start > s.end) {
            seg.start -= self.chromosome_length;
            changed = true;
        }
        changed
    }

    fn correct_after_chromosome_end<T>(&self, segments: &mut [Interval<Pos, T>]) -> bool
    where
        T: Eq + Clone + Send + Sync,
    {
        let len = self.chromosome_length;
        if !segments.iter().any(|s| s.start >= len || s.end >= len) {
            return false;
        }

        for seg in segments.iter_mut().filter(|s| s.start > 0) {
            seg.shift(-len);
        }
        true
    }

    fn correct_gap<T>(&self, segments: &mut [Interval<Pos, T>]) -> bool
    where
        T: Eq + Clone + Send + Sync,
    {
        if segments.len() <= 1 {
            return false;
        }

        let mut sorted: Vec<(Pos, Pos)> = segments.iter().map(|s| (s.start, s.end)).collect();
        sorted.sort_unstable();

        // start of the segment right after the largest gap
        let mut max_gap = 0;
        let mut split_start = None;
        for pair in sorted.windows(2) {
            let gap = pair[1].0 - pair[0].1;
            if gap > max_gap {
                max_gap = gap;
                split_start = Some(pair[1].0);
            }
        }

        match split_start {
            Some(split) if max_gap > self.chromosome_length / 2 => {
                for seg in segments.iter_mut().filter(|s| s.start >= split) {
                    seg.shift(-self.chromosome_length);
                }
                true
            }
            _ => false,
        }
    }
}
