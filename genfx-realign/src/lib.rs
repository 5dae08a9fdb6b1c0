//! # genfx-realign
//!
//! Shifts insertions and deletions inside repeats to a canonical position.
//!
//! VCF files report indels at their leftmost position, while HGVS requires
//! the most 3' position on the transcript. [`realign_right`] and
//! [`realign_left`] move a [`Variant`](genfx_core::models::Variant) to either
//! end of its repeat using sequence from any [`ReferenceSequence`], usually a
//! [`Genome`](genfx_core::models::Genome).
//!
//! ```
//! use genfx_core::config::Config;
//! use genfx_core::models::{GenomeBuilder, Variant};
//! use genfx_realign::realign_right;
//!
//! let mut builder = GenomeBuilder::new("demo");
//! builder.add_chromosome("chr1", "CCCCCGTGTGTACCCCC", false).unwrap();
//! let genome = builder.build(&Config::default()).unwrap();
//!
//! let del = Variant::new("chr1", 5, "GT", "");
//! assert_eq!(realign_right(&genome, &del).start, 9);
//! ```
pub mod errors;
pub mod realign;
pub mod variant_realign;

pub use errors::{RealignError, RealignResult};
pub use realign::{Realign, ShiftDirection};
pub use variant_realign::{ReferenceSequence, realign, realign_left, realign_right};
