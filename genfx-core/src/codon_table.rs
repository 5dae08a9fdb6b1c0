//! Genetic code tables used to translate coding sequences.
//!
//! Codons are indexed in NCBI `TCAG` order, so each table is a 64 character
//! amino acid string plus the list of codons allowed to initiate translation.
use serde::{Deserialize, Serialize};

pub const CODON_SIZE: usize = 3;

/// One letter code of the termination codon.
pub const STOP_AA: char = '*';

/// Amino acid reported for codons that cannot be translated (ambiguous bases
/// or an incomplete trailing codon).
pub const UNKNOWN_AA: char = '?';

const BASES: [u8; 4] = *b"TCAG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodonTableKind {
    #[default]
    Standard,
    VertebrateMitochondrial,
}

impl CodonTableKind {
    pub fn table(&self) -> &'static CodonTable {
        match self {
            CodonTableKind::Standard => &STANDARD,
            CodonTableKind::VertebrateMitochondrial => &VERTEBRATE_MITOCHONDRIAL,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CodonTable {
    pub name: &'static str,
    aas: &'static [u8; 64],
    starts: &'static [&'static str],
}

pub static STANDARD: CodonTable = CodonTable {
    name: "Standard",
    aas: b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG",
    starts: &["TTG", "CTG", "ATG"],
};

pub static VERTEBRATE_MITOCHONDRIAL: CodonTable = CodonTable {
    name: "Vertebrate_Mitochondrial",
    aas: b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG",
    starts: &["ATT", "ATC", "ATA", "ATG", "GTG"],
};

fn base_index(b: u8) -> Option<usize> {
    BASES.iter().position(|&x| x == b.to_ascii_uppercase())
}

impl CodonTable {
    fn codon_index(codon: &[u8]) -> Option<usize> {
        if codon.len() != CODON_SIZE {
            return None;
        }
        Some(base_index(codon[0])? * 16 + base_index(codon[1])? * 4 + base_index(codon[2])?)
    }

    /// Translate a single codon.
    pub fn codon_aa(&self, codon: &str) -> char {
        match Self::codon_index(codon.as_bytes()) {
            Some(idx) => self.aas[idx] as char,
            None => UNKNOWN_AA,
        }
    }

    /// Translate a run of codons. Trailing partial codons become `?`.
    pub fn aa(&self, codons: &str) -> String {
        codons
            .as_bytes()
            .chunks(CODON_SIZE)
            .map(|c| match Self::codon_index(c) {
                Some(idx) => self.aas[idx] as char,
                None => UNKNOWN_AA,
            })
            .collect()
    }

    /// Translate a full coding sequence: an initiating start codon is always `M`.
    pub fn protein(&self, cds: &str) -> String {
        let mut protein = self.aa(cds);
        if cds.len() >= CODON_SIZE && self.is_start(&cds[..CODON_SIZE]) {
            protein.replace_range(..1, "M");
        }
        protein
    }

    pub fn is_start(&self, codon: &str) -> bool {
        self.starts.iter().any(|s| s.eq_ignore_ascii_case(codon))
    }

    /// Is the first codon in `codons` a start codon?
    pub fn is_start_first(&self, codons: &str) -> bool {
        codons.len() >= CODON_SIZE && codons.is_char_boundary(CODON_SIZE) && self.is_start(&codons[..CODON_SIZE])
    }

    /// Does any complete codon in `codons` code for a stop?
    pub fn is_stop(&self, codons: &str) -> bool {
        codons
            .as_bytes()
            .chunks(CODON_SIZE)
            .filter_map(Self::codon_index)
            .any(|idx| self.aas[idx] == STOP_AA as u8)
    }
}

/// Three letter amino acid code, `Ter` for stop codons.
pub fn aa_three_letter(aa: char) -> &'static str {
    match aa.to_ascii_uppercase() {
        'A' => "Ala",
        'B' => "Asx",
        'C' => "Cys",
        'D' => "Asp",
        'E' => "Glu",
        'F' => "Phe",
        'G' => "Gly",
        'H' => "His",
        'I' => "Ile",
        'K' => "Lys",
        'L' => "Leu",
        'M' => "Met",
        'N' => "Asn",
        'P' => "Pro",
        'Q' => "Gln",
        'R' => "Arg",
        'S' => "Ser",
        'T' => "Thr",
        'U' => "Sec",
        'V' => "Val",
        'W' => "Trp",
        'X' => "X",
        'Y' => "Tyr",
        'Z' => "Glx",
        '*' => "Ter",
        _ => "???",
    }
}

pub fn aa_three_letter_str(aas: &str) -> String {
    aas.chars().map(aa_three_letter).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("ATG", 'M')]
    #[case("TAA", '*')]
    #[case("TGA", '*')]
    #[case("tgg", 'W')]
    #[case("GGN", '?')]
    #[case("AT", '?')]
    fn test_standard_codons(#[case] codon: &str, #[case] expected: char) {
        assert_eq!(STANDARD.codon_aa(codon), expected);
    }

    #[rstest]
    fn test_translate_with_partial_codon() {
        assert_eq!(STANDARD.aa("ATGGCCTAAGG"), "MA*?");
    }

    #[rstest]
    fn test_protein_forces_initial_methionine() {
        // CTG is an alternative start codon
        assert_eq!(STANDARD.protein("CTGCTG"), "ML");
        assert_eq!(STANDARD.aa("CTGCTG"), "LL");
    }

    #[rstest]
    fn test_mitochondrial_differences() {
        let table = CodonTableKind::VertebrateMitochondrial.table();
        assert_eq!(table.codon_aa("TGA"), 'W');
        assert_eq!(table.codon_aa("AGA"), '*');
        assert_eq!(table.codon_aa("ATA"), 'M');
        assert!(table.is_start("GTG"));
        assert!(!STANDARD.is_start("GTG"));
    }

    #[rstest]
    fn test_stop_and_start_detection() {
        assert!(STANDARD.is_stop("GCCTAG"));
        assert!(!STANDARD.is_stop("GCCTA"));
        assert!(STANDARD.is_start_first("ATGCCC"));
        assert!(!STANDARD.is_start_first("AT"));
    }

    #[rstest]
    fn test_three_letter_codes() {
        assert_eq!(aa_three_letter_str("MK*"), "MetLysTer");
        assert_eq!(aa_three_letter('?'), "???");
    }
}
