use thiserror::Error;

use genfx_core::models::Pos;

#[derive(Error, Debug, PartialEq)]
pub enum RealignError {
    #[error("No reference sequence available for {chromosome}:{start}-{end}")]
    NoSequence { chromosome: String, start: Pos, end: Pos },

    #[error("Reference allele '{expected}' does not match genome sequence '{found}' at {chromosome}:{start}")]
    ReferenceMismatch {
        chromosome: String,
        start: Pos,
        expected: String,
        found: String,
    },
}

pub type RealignResult<T> = std::result::Result<T, RealignError>;
