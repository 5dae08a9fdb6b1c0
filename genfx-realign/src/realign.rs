//! Sequence level realignment of a reference/alternative pair.

/// Which way an ambiguous indel is pushed inside a repeat.
///
/// `Left` gives the VCF convention (leftmost position), `Right` gives the
/// HGVS convention (3'-most position on the forward strand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftDirection {
    Left,
    #[default]
    Right,
}

/// Trim the common prefix from a pair of alleles.
///
/// Returns `(trimmed_count, trimmed_alleles)`.
fn trim_left<'a>(a: &'a [u8], b: &'a [u8]) -> (usize, &'a [u8], &'a [u8]) {
    let min_len = a.len().min(b.len());
    let mut trimmed = 0;
    while trimmed < min_len && a[trimmed] == b[trimmed] {
        trimmed += 1;
    }
    (trimmed, &a[trimmed..], &b[trimmed..])
}

/// Trim the common suffix from a pair of alleles.
///
/// Returns `(trimmed_count, trimmed_alleles)`.
fn trim_right<'a>(a: &'a [u8], b: &'a [u8]) -> (usize, &'a [u8], &'a [u8]) {
    let min_len = a.len().min(b.len());
    let mut trimmed = 0;
    while trimmed < min_len && a[a.len() - 1 - trimmed] == b[b.len() - 1 - trimmed] {
        trimmed += 1;
    }
    (trimmed, &a[..a.len() - trimmed], &b[..b.len() - trimmed])
}

/// Reduce two sequences to the part where they differ.
///
/// Trimming order decides where the difference lands inside a repeat. With
/// [`ShiftDirection::Right`] the common prefix is removed first, so the delta
/// is pushed as far right as the sequences allow; with `Left` the common
/// suffix goes first.
///
/// ```
/// use genfx_realign::Realign;
///
/// let r = Realign::new("AAACTGTATTT", "AAACTATTT");
/// assert_eq!(r.ref_delta(), "GT");
/// assert_eq!(r.alt_delta(), "");
/// assert_eq!(r.trimmed_left(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Realign {
    reference: String,
    alternative: String,
    direction: ShiftDirection,
    trimmed_left: usize,
    trimmed_right: usize,
}

impl Realign {
    pub fn new(reference: &str, alternative: &str) -> Self {
        Self::with_direction(reference, alternative, ShiftDirection::default())
    }

    pub fn with_direction(reference: &str, alternative: &str, direction: ShiftDirection) -> Self {
        let (r, a) = (reference.as_bytes(), alternative.as_bytes());
        let (trimmed_left, trimmed_right) = match direction {
            ShiftDirection::Right => {
                let (left, r, a) = trim_left(r, a);
                let (right, _, _) = trim_right(r, a);
                (left, right)
            }
            ShiftDirection::Left => {
                let (right, r, a) = trim_right(r, a);
                let (left, _, _) = trim_left(r, a);
                (left, right)
            }
        };

        Realign {
            reference: reference.to_string(),
            alternative: alternative.to_string(),
            direction,
            trimmed_left,
            trimmed_right,
        }
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    /// Bases removed from the left of both sequences
    pub fn trimmed_left(&self) -> usize {
        self.trimmed_left
    }

    /// Bases removed from the right of both sequences
    pub fn trimmed_right(&self) -> usize {
        self.trimmed_right
    }

    fn delta<'a>(&self, seq: &'a str) -> &'a str {
        let end = seq.len().saturating_sub(self.trimmed_right).max(self.trimmed_left);
        seq.get(self.trimmed_left..end).unwrap_or("")
    }

    pub fn ref_delta(&self) -> &str {
        self.delta(&self.reference)
    }

    pub fn alt_delta(&self) -> &str {
        self.delta(&self.alternative)
    }

    fn min_len(&self) -> usize {
        self.reference.len().min(self.alternative.len())
    }

    /// Trimming ran into the right edge of the context, so the true 3' position
    /// may lie further right.
    pub fn needs_more_right(&self) -> bool {
        self.direction == ShiftDirection::Right && self.trimmed_left >= self.min_len()
    }

    /// Trimming ran into the left edge of the context.
    pub fn needs_more_left(&self) -> bool {
        self.direction == ShiftDirection::Left && self.trimmed_right >= self.min_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_trim_left_basic() {
        let (trimmed, a, b) = trim_left(b"ATCG", b"ATGG");
        assert_eq!(trimmed, 2);
        assert_eq!((a, b), (&b"CG"[..], &b"GG"[..]));
    }

    #[rstest]
    fn test_trim_right_basic() {
        let (trimmed, a, b) = trim_right(b"ATCG", b"AGCG");
        assert_eq!(trimmed, 2);
        assert_eq!((a, b), (&b"AT"[..], &b"AG"[..]));
    }

    #[rstest]
    #[case(ShiftDirection::Right, "GT", 5, 4)]
    #[case(ShiftDirection::Left, "TG", 4, 5)]
    fn test_deletion_in_repeat(
        #[case] direction: ShiftDirection,
        #[case] delta: &str,
        #[case] left: usize,
        #[case] right: usize,
    ) {
        let r = Realign::with_direction("AAACTGTATTT", "AAACTATTT", direction);
        assert_eq!(r.ref_delta(), delta);
        assert_eq!(r.alt_delta(), "");
        assert_eq!((r.trimmed_left(), r.trimmed_right()), (left, right));
        assert!(!r.needs_more_left());
        assert!(!r.needs_more_right());
    }

    #[rstest]
    fn test_insertion() {
        let r = Realign::new("CCAAAG", "CCAAAAG");
        assert_eq!(r.ref_delta(), "");
        assert_eq!(r.alt_delta(), "A");
        assert_eq!(r.trimmed_left(), 5);
    }

    #[rstest]
    fn test_repeat_reaching_the_end_needs_context() {
        let r = Realign::new("CAAA", "CAA");
        assert!(r.needs_more_right());
        let r = Realign::with_direction("AAAC", "AAC", ShiftDirection::Left);
        assert!(r.needs_more_left());
    }

    #[rstest]
    fn test_substitution_is_untouched() {
        let r = Realign::new("ACGT", "AGGT");
        assert_eq!((r.ref_delta(), r.alt_delta()), ("C", "G"));
    }
}
