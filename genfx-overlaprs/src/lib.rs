//! Genomic interval overlap structures for genfx.
//!
//! This crate provides the overlap index used by the effect predictor to find
//! the genome features hit by a variant. Intervals are closed (`[start, end]`,
//! both inclusive) and use signed coordinates, since features on circular
//! chromosomes may be shifted before the origin.
//!
//! ## Features
//!
//! - **Exact overlap queries**: every implementation returns exactly the intervals a linear scan would
//! - **Iterator-based API**: [`Overlapper::find_iter`] yields references without copying intervals
//! - **Thread-safe**: all structures are `Send + Sync` and read-only after build
//!
//! ## Quick Start
//!
//! ```rust
//! use genfx_overlaprs::{IntervalTree, Overlapper, Interval};
//!
//! let intervals = vec![
//!     Interval { start: 100i64, end: 200, val: "gene1" },
//!     Interval { start: 150, end: 300, val: "gene2" },
//!     Interval { start: 400, end: 500, val: "gene3" },
//! ];
//!
//! let tree = IntervalTree::build(intervals);
//! assert_eq!(tree.find(200, 250).len(), 2);
//! ```

/// Binary Interval Search implementation.
///
/// See [`Bits`] for details.
pub mod bits;

/// Per-chromosome index over genome markers.
///
/// See [`forest::IntervalForest`].
pub mod forest;

/// Centered interval tree implementation.
///
/// See [`IntervalTree`] for details.
pub mod interval_tree;

/// Core traits for overlap operations.
///
/// See [`Overlapper`] for the main trait.
pub mod traits;

// re-exports
pub use self::bits::Bits;
pub use self::forest::{ForestError, ForestResult, IntervalForest, IntoIntervalForest};
pub use self::interval_tree::IntervalTree;
pub use self::traits::{Interval, Overlapper};

/// The type of overlap data structure to use.
///
/// * `IntervalTree` - balanced centered interval tree, O(log n + k) per query.
/// * `Bits` - Binary Interval Search. Very compact, best when intervals have similar lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapperType {
    #[default]
    IntervalTree,
    Bits,
}
