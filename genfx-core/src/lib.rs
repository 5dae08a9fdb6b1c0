//! Core genome model for genfx.
//!
//! This crate holds the data every other genfx crate works on:
//!
//! - an arena based [`Genome`](models::Genome) of chromosomes, genes, transcripts, exons,
//!   introns, CDS segments, UTRs, splice sites and up/downstream regions, built with
//!   [`GenomeBuilder`](models::GenomeBuilder);
//! - the [`Variant`](models::Variant) model with type inference and decomposition of
//!   MIXED variants;
//! - [`CircularCorrection`](circular::CircularCorrection) of features crossing the origin
//!   of circular chromosomes;
//! - genetic code tables and the runtime [`Config`](config::Config).
//!
//! Coordinates are 0-based and closed: `[start, end]` includes both ends.
//!
//! ```rust
//! use genfx_core::config::Config;
//! use genfx_core::models::{GenomeBuilder, Strand};
//!
//! let mut builder = GenomeBuilder::new("demo");
//! builder.add_chromosome("chr1", "CCATGAAATAGCC", false).unwrap();
//! let gene = builder.add_gene("chr1", 2, 10, Strand::Plus, "G1", "GENE1").unwrap();
//! let tr = builder.add_transcript(gene, 2, 10, "T1").unwrap();
//! builder.add_exon(tr, 2, 10).unwrap();
//! builder.add_cds(tr, 2, 10).unwrap();
//!
//! let genome = builder.build(&Config::default()).unwrap();
//! assert_eq!(genome.transcript(tr).unwrap().protein(), "MK*");
//! ```
pub mod circular;
pub mod codon_table;
pub mod config;
pub mod errors;
pub mod models;
pub mod utils;
