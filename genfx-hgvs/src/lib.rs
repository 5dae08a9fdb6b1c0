//! # genfx-hgvs
//!
//! HGVS nomenclature for effects predicted by [`genfx_effect`].
//!
//! [`HgvsDna`] renders `c.`/`n.`/`g.` notation and [`HgvsProtein`] renders
//! `p.` notation. [`annotate`] runs a prediction and bundles every effect with
//! both notations into a serializable [`Annotation`].
//!
//! ```
//! use genfx_core::config::Config;
//! use genfx_core::models::{GenomeBuilder, Strand, Variant};
//! use genfx_effect::EffectPredictor;
//! use genfx_hgvs::annotate;
//!
//! let mut b = GenomeBuilder::new("demo");
//! b.add_chromosome("chr1", "CCCCCATGAAATAACCCCC", false).unwrap();
//! let gene = b.add_gene("chr1", 5, 13, Strand::Plus, "G1", "GENE1").unwrap();
//! let tr = b.add_transcript(gene, 5, 13, "T1").unwrap();
//! b.add_exon(tr, 5, 13).unwrap();
//! b.add_cds(tr, 5, 13).unwrap();
//!
//! let config = Config::default();
//! let genome = b.build(&config).unwrap();
//! let predictor = EffectPredictor::new(&genome, &config).unwrap();
//!
//! let annotations = annotate(&predictor, &Variant::new("chr1", 9, "A", "G")).unwrap();
//! assert_eq!(annotations[0].hgvs_c.as_deref(), Some("c.5A>G"));
//! assert_eq!(annotations[0].hgvs_p.as_deref(), Some("p.Lys2Arg"));
//! ```
pub mod annotation;
pub mod dna;
pub mod errors;
pub mod protein;

mod utils;

pub use annotation::{Annotation, annotate};
pub use dna::HgvsDna;
pub use errors::{HgvsError, HgvsResult};
pub use protein::HgvsProtein;
