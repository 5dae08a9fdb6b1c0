//! # genfx-effect
//!
//! Predicts the functional effect of variants on the genes of a
//! [`Genome`](genfx_core::models::Genome).
//!
//! [`EffectPredictor`] queries an interval forest for the genes and
//! up/downstream regions hit by a variant, then walks every transcript to
//! classify the hit: exon, intron, splice site, UTR, and for coding bases the
//! codon and amino acid change. Structural variants additionally get gene
//! level effects and gene fusions from [`StructuralEffect`].
//!
//! Each result is a [`VariantEffect`] carrying one or more [`EffectType`]s, an
//! [`EffectImpact`] and any data quality tags ([`ErrorWarningType`]). Only
//! broken invariants are reported as [`EffectError`].
//!
//! ```
//! use genfx_core::config::Config;
//! use genfx_core::models::{GenomeBuilder, Strand, Variant};
//! use genfx_effect::{EffectImpact, EffectPredictor, EffectType};
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
//! let effects = predictor.predict(&Variant::new("chr1", 9, "A", "G")).unwrap();
//! assert_eq!(effects[0].effect_type(), EffectType::NonSynonymousCoding);
//! assert_eq!(effects[0].impact(), EffectImpact::Moderate);
//! assert_eq!(effects[0].aa_change(), "K2R");
//! ```
pub mod codon_change;
pub mod effect_type;
pub mod errors;
pub mod predictor;
pub mod structural;
pub mod variant_effect;

pub use codon_change::{CdsMap, CodonWindow, codon_change};
pub use effect_type::{EffectImpact, EffectType, ErrorWarningType};
pub use errors::{EffectError, EffectResult};
pub use predictor::EffectPredictor;
pub use structural::{Fusion, StructuralEffect};
pub use variant_effect::{VariantEffect, VariantEffects};
