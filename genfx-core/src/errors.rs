use thiserror::Error;

use crate::models::{MarkerId, MarkerKind, Pos};

/// Fatal errors raised while assembling a [`Genome`](crate::models::Genome).
///
/// These signal malformed annotation data or programming errors. Data-quality
/// problems found while annotating a single variant are reported as tags on
/// the resulting effects instead.
#[derive(Error, Debug, PartialEq)]
pub enum GenomeError {
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Duplicate chromosome: {0}")]
    DuplicateChromosome(String),

    #[error("Unknown marker id: {0}")]
    UnknownMarker(MarkerId),

    #[error("Marker {id} is a {found:?}, expected a {expected:?}")]
    WrongKind {
        id: MarkerId,
        expected: MarkerKind,
        found: MarkerKind,
    },

    #[error("Malformed interval '{id}': start {start} is after end {end}")]
    MalformedInterval { id: String, start: Pos, end: Pos },

    #[error("Negative length for '{id}': {length}")]
    NegativeLength { id: String, length: Pos },

    #[error("Transcript '{id}' has a CDS of {cds_len} bases but only {exon_len} exonic bases")]
    CdsLongerThanTranscript {
        id: String,
        cds_len: usize,
        exon_len: usize,
    },

    #[error("Invalid allele: {0}")]
    InvalidAllele(String),

    #[error("Transcript '{id}' [{start}, {end}] lies outside its chromosome")]
    OutOfChromosome { id: String, start: Pos, end: Pos },

    #[error("Exon '{id}' sequence has {found} bases, expected {expected}")]
    SequenceLengthMismatch {
        id: String,
        expected: usize,
        found: usize,
    },
}

pub type GenomeResult<T> = std::result::Result<T, GenomeError>;
