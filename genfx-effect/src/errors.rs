use thiserror::Error;

use genfx_core::models::MarkerId;
use genfx_overlaprs::ForestError;

/// Fatal errors raised while predicting effects.
///
/// These are invariant violations in the genome or in the predictor itself.
/// Problems with a single variant (unknown chromosome, reference mismatch, ...)
/// are reported as [`ErrorWarningType`](crate::ErrorWarningType) tags instead.
#[derive(Error, Debug, PartialEq)]
pub enum EffectError {
    #[error(transparent)]
    Forest(#[from] ForestError),

    #[error("Marker {0} is not part of the genome")]
    UnknownMarker(MarkerId),

    #[error("Inverted CDS base range for {variant} on '{transcript}': {start} > {end}")]
    InvertedCdsRange {
        variant: String,
        transcript: String,
        start: usize,
        end: usize,
    },

    #[error("Codon {codon} is out of range for '{transcript}' ({cds_len} CDS bases)")]
    CodonOutOfRange {
        transcript: String,
        codon: usize,
        cds_len: usize,
    },
}

pub type EffectResult<T> = std::result::Result<T, EffectError>;
