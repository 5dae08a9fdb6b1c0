use log::{debug, warn};

use genfx_core::models::{Genome, Pos, Variant};

use crate::errors::{RealignError, RealignResult};
use crate::realign::{Realign, ShiftDirection};

/// Upper bound on how many times the context window is widened.
pub const MAX_ITERATIONS: usize = 100;

/// Smallest context loaded on each side of the variant.
pub const MIN_CONTEXT: usize = 10;

/// Anything that can hand out forward strand reference sequence.
pub trait ReferenceSequence {
    ///
    /// A sequence containing `chromosome:[start, end]` and the genomic
    /// position of its first base.
    ///
    fn sequence_region(&self, chromosome: &str, start: Pos, end: Pos) -> Option<(Pos, &str)>;
}

impl ReferenceSequence for Genome {
    fn sequence_region(&self, chromosome: &str, start: Pos, end: Pos) -> Option<(Pos, &str)> {
        Genome::sequence_region(self, chromosome, start, end)
    }
}

///
/// Move an insertion or deletion to its leftmost or rightmost equivalent
/// position inside a repeat.
///
/// Reference context is loaded around the variant and widened (`n -> 2n + 1`)
/// while trimming reaches the edge of the loaded window. Returns `Ok(None)`
/// when the variant is not an indel, is already in place, or the window can
/// not be widened any further.
///
pub fn realign<R: ReferenceSequence + ?Sized>(
    reference: &R,
    variant: &Variant,
    direction: ShiftDirection,
) -> RealignResult<Option<Variant>> {
    if !(variant.is_ins() || variant.is_del()) {
        return Ok(None);
    }

    let chr = variant.chromosome.as_str();
    let start = variant.start;
    let ref_len = variant.reference.len() as Pos;
    let query_end = if ref_len > 0 { start + ref_len - 1 } else { start };

    let (offset, seq) = reference
        .sequence_region(chr, start, query_end)
        .ok_or_else(|| RealignError::NoSequence {
            chromosome: chr.to_string(),
            start,
            end: query_end,
        })?;
    let seq_end = offset + seq.len() as Pos - 1;
    let bases = |from: Pos, to: Pos| seq.get((from - offset) as usize..(to - offset) as usize).unwrap_or("");

    let found = bases(start, start + ref_len);
    if !found.eq_ignore_ascii_case(&variant.reference) {
        return Err(RealignError::ReferenceMismatch {
            chromosome: chr.to_string(),
            start,
            expected: variant.reference.clone(),
            found: found.to_string(),
        });
    }

    let mut n = (3 * variant.reference.len().max(variant.alt.len())).max(MIN_CONTEXT) as Pos;
    for _ in 0..MAX_ITERATIONS {
        let lo = (start - n).max(offset);
        let hi = (start + ref_len - 1 + n).min(seq_end);
        let up = bases(lo, start).to_ascii_uppercase();
        let down = bases(start + ref_len, hi + 1).to_ascii_uppercase();

        let ref_seq = format!("{}{}{}", up, variant.reference, down);
        let alt_seq = format!("{}{}{}", up, variant.alt, down);
        let realigned = Realign::with_direction(&ref_seq, &alt_seq, direction);

        let at_edge = match direction {
            ShiftDirection::Right if realigned.needs_more_right() => Some(hi >= seq_end),
            ShiftDirection::Left if realigned.needs_more_left() => Some(lo <= offset),
            _ => None,
        };
        match at_edge {
            Some(true) => {
                debug!("Realign {}: no more reference context to load", variant);
                return Ok(None);
            }
            Some(false) => {
                n = 2 * n + 1;
                continue;
            }
            None => {}
        }

        let new_start = lo + realigned.trimmed_left() as Pos;
        if new_start == start {
            return Ok(None);
        }

        let mut shifted = Variant::new(chr, new_start, realigned.ref_delta(), realigned.alt_delta()).with_id(&variant.id);
        shifted.genotype = variant.genotype.clone();
        return Ok(Some(shifted));
    }

    warn!(
        "Realign {}: gave up after {} iterations of widening the context",
        variant, MAX_ITERATIONS
    );
    Ok(None)
}

fn realign_or_original<R: ReferenceSequence + ?Sized>(
    reference: &R,
    variant: &Variant,
    direction: ShiftDirection,
) -> Variant {
    match realign(reference, variant, direction) {
        Ok(Some(shifted)) => {
            debug!("Realigned {} to {}", variant, shifted);
            shifted
        }
        Ok(None) => variant.clone(),
        Err(e) => {
            debug!("Could not realign {}: {}", variant, e);
            variant.clone()
        }
    }
}

/// Leftmost equivalent of `variant`, or a copy of it when it can not move.
pub fn realign_left<R: ReferenceSequence + ?Sized>(reference: &R, variant: &Variant) -> Variant {
    realign_or_original(reference, variant, ShiftDirection::Left)
}

/// Rightmost (3' on the forward strand) equivalent of `variant`.
pub fn realign_right<R: ReferenceSequence + ?Sized>(reference: &R, variant: &Variant) -> Variant {
    realign_or_original(reference, variant, ShiftDirection::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct Chrom(&'static str);

    impl ReferenceSequence for Chrom {
        fn sequence_region(&self, _chromosome: &str, start: Pos, end: Pos) -> Option<(Pos, &str)> {
            (start >= 0 && end < self.0.len() as Pos).then_some((0, self.0))
        }
    }

    #[fixture]
    fn repeat() -> Chrom {
        //      0    5    10   15
        Chrom("CCCCCGTGTGTACCCCC")
    }

    #[rstest]
    fn test_deletion_moves_right(repeat: Chrom) {
        let del = Variant::new("chr1", 5, "GT", "").with_id("rs1");
        let shifted = realign(&repeat, &del, ShiftDirection::Right).unwrap().unwrap();
        assert_eq!(shifted.start, 9);
        assert_eq!(shifted.end, 10);
        assert_eq!(shifted.reference, "GT");
        assert_eq!(shifted.id, "rs1");
    }

    #[rstest]
    fn test_deletion_moves_left(repeat: Chrom) {
        let del = Variant::new("chr1", 9, "GT", "");
        let shifted = realign_left(&repeat, &del);
        assert_eq!((shifted.start, shifted.reference.as_str()), (5, "GT"));
    }

    #[rstest]
    fn test_insertion_moves_right(repeat: Chrom) {
        let ins = Variant::new("chr1", 5, "", "GT");
        let shifted = realign_right(&repeat, &ins);
        assert_eq!((shifted.start, shifted.alt.as_str()), (11, "GT"));
        assert!(shifted.is_ins());
    }

    #[rstest]
    fn test_already_rightmost(repeat: Chrom) {
        let del = Variant::new("chr1", 9, "GT", "");
        assert_eq!(realign(&repeat, &del, ShiftDirection::Right).unwrap(), None);
    }

    #[rstest]
    fn test_reference_mismatch(repeat: Chrom) {
        let del = Variant::new("chr1", 5, "AA", "");
        assert_eq!(
            realign(&repeat, &del, ShiftDirection::Right).unwrap_err(),
            RealignError::ReferenceMismatch {
                chromosome: "chr1".to_string(),
                start: 5,
                expected: "AA".to_string(),
                found: "GT".to_string(),
            }
        );
        assert_eq!(realign_right(&repeat, &del), del);
    }

    #[rstest]
    fn test_no_context_past_sequence_end() {
        let seq = Chrom("ACGTAAAA");
        let del = Variant::new("chr1", 4, "A", "");
        assert_eq!(realign(&seq, &del, ShiftDirection::Right).unwrap(), None);
        assert_eq!(realign_right(&seq, &del), del);
    }

    #[rstest]
    fn test_snp_is_not_realigned(repeat: Chrom) {
        let snp = Variant::new("chr1", 5, "G", "A");
        assert_eq!(realign(&repeat, &snp, ShiftDirection::Right).unwrap(), None);
    }

    #[rstest]
    fn test_missing_sequence() {
        let seq = Chrom("ACGT");
        let del = Variant::new("chr1", 10, "A", "");
        assert!(matches!(
            realign(&seq, &del, ShiftDirection::Left),
            Err(RealignError::NoSequence { .. })
        ));
    }

    #[rstest]
    fn test_context_grows_for_long_repeats() {
        // 40 copies of "CA", more than the initial window
        let body: String = "G".to_string() + &"CA".repeat(40) + "G";
        let seq = Chrom(Box::leak(body.into_boxed_str()));
        let del = Variant::new("chr1", 1, "CA", "");
        let shifted = realign_right(&seq, &del);
        assert_eq!(shifted.start, 79);
    }
}
