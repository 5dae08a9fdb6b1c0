/// Watson-Crick complement of a single base. IUPAC ambiguity codes are
/// complemented too; anything else is passed through.
pub fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        'R' => 'Y',
        'Y' => 'R',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        other => other,
    }
}

/// Reverse complement of a DNA sequence.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement).collect()
}

/// Upper cased copy of `seq` with every non letter replaced by `N`.
/// The result is always ASCII, one byte per base.
pub fn sanitize_bases(seq: &str) -> String {
    seq.chars()
        .map(|c| if c.is_ascii_alphabetic() { c.to_ascii_uppercase() } else { 'N' })
        .collect()
}

/// Length of the longest common prefix of two byte strings.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Length of the longest common suffix, never eating into the first `keep` bases.
pub fn common_suffix_len(a: &[u8], b: &[u8], keep: usize) -> usize {
    let max = a.len().min(b.len()).saturating_sub(keep);
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take(max)
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("ACGT", "ACGT")]
    #[case("AAC", "GTT")]
    #[case("acgN", "Ncgt")]
    #[case("", "")]
    fn test_reverse_complement(#[case] seq: &str, #[case] expected: &str) {
        assert_eq!(reverse_complement(seq), expected);
    }

    #[rstest]
    #[case("acgt", "ACGT")]
    #[case("AÇGT", "ANGT")]
    #[case("A-G.T", "ANGNT")]
    #[case("", "")]
    fn test_sanitize_bases(#[case] seq: &str, #[case] expected: &str) {
        assert_eq!(sanitize_bases(seq), expected);
    }

    #[rstest]
    fn test_common_affixes() {
        assert_eq!(common_prefix_len(b"AAACTG", b"AAACTA"), 5);
        assert_eq!(common_suffix_len(b"GTATTT", b"ATTT", 0), 4);
        assert_eq!(common_suffix_len(b"AAA", b"AA", 1), 1);
    }
}
