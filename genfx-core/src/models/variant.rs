use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::marker::{Located, Pos};
use crate::errors::{GenomeError, GenomeResult};
use crate::utils::{common_prefix_len, reverse_complement, sanitize_bases};

/// Variants larger than this are handled as structural variants.
pub const SMALL_VARIANT_SIZE_THRESHOLD: Pos = 10;

/// Structural variants above this size skip per-feature overlap queries.
pub const HUGE_VARIANT_SIZE_THRESHOLD: Pos = 1_000_000;

/// ...or above this fraction of a chromosome larger than [`HUGE_VARIANT_SIZE_THRESHOLD`].
pub const HUGE_VARIANT_RATIO_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariantType {
    Snp,
    Mnp,
    Ins,
    Del,
    Mixed,
    Dup,
    Inv,
    Bnd,
    Interval,
    None,
}

impl Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::Snp => "SNP",
            VariantType::Mnp => "MNP",
            VariantType::Ins => "INS",
            VariantType::Del => "DEL",
            VariantType::Mixed => "MIXED",
            VariantType::Dup => "DUP",
            VariantType::Inv => "INV",
            VariantType::Bnd => "BND",
            VariantType::Interval => "INTERVAL",
            VariantType::None => "NONE",
        };
        write!(f, "{}", name)
    }
}

///
/// Mate of a translocation.
///
/// `left` is true when the joined sequence lies to the left of the mate
/// position, `before` is true when the mate sequence is placed before the
/// local breakpoint. Together they encode the four VCF bracket notations.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakend {
    pub chromosome: String,
    pub position: Pos,
    pub left: bool,
    pub before: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub chromosome: String,
    pub start: Pos,
    pub end: Pos,
    pub reference: String,
    pub alt: String,
    pub variant_type: VariantType,
    pub id: String,
    /// Genotype the effect is computed for. `None` means "the ALT allele".
    pub genotype: Option<String>,
    pub breakend: Option<Breakend>,
}

fn normalize_allele(allele: &str) -> String {
    if allele == "*" {
        String::new()
    } else {
        sanitize_bases(allele)
    }
}

fn infer_type(reference: &str, alt: &str) -> VariantType {
    if reference == alt {
        VariantType::Interval
    } else if reference.len() == 1 && alt.len() == 1 {
        VariantType::Snp
    } else if reference.len() == alt.len() {
        VariantType::Mnp
    } else if reference.is_empty() {
        VariantType::Ins
    } else if alt.is_empty() {
        VariantType::Del
    } else {
        VariantType::Mixed
    }
}

impl Variant {
    ///
    /// Create a sequence variant, inferring its type from the alleles.
    ///
    /// Alleles are upper cased and `*` means "no bases". When one allele is a
    /// prefix of the other (the usual VCF anchor base) the shared prefix is
    /// removed and `start` moves accordingly.
    ///
    pub fn new(chromosome: &str, start: Pos, reference: &str, alt: &str) -> Variant {
        let mut reference = normalize_allele(reference);
        let mut alt = normalize_allele(alt);
        let mut start = start;

        if reference.len() != alt.len() && (reference.starts_with(&alt) || alt.starts_with(&reference)) {
            let prefix = common_prefix_len(reference.as_bytes(), alt.as_bytes());
            reference.drain(..prefix);
            alt.drain(..prefix);
            start += prefix as Pos;
        }

        let variant_type = infer_type(&reference, &alt);
        Variant::raw(chromosome, start, reference, alt, variant_type)
    }

    /// Like [`Variant::new`] but rejects alleles containing non IUPAC characters.
    pub fn checked(chromosome: &str, start: Pos, reference: &str, alt: &str) -> GenomeResult<Variant> {
        for allele in [reference, alt] {
            let valid = allele == "*"
                || allele
                    .chars()
                    .all(|c| "ACGTNRYKMSWBDHV".contains(c.to_ascii_uppercase()));
            if !valid {
                return Err(GenomeError::InvalidAllele(allele.to_string()));
            }
        }
        Ok(Variant::new(chromosome, start, reference, alt))
    }

    /// Structural variant without explicit allele sequences.
    pub fn structural(chromosome: &str, start: Pos, end: Pos, variant_type: VariantType) -> Variant {
        Variant {
            chromosome: chromosome.to_string(),
            start,
            end,
            reference: String::new(),
            alt: String::new(),
            variant_type,
            id: String::new(),
            genotype: None,
            breakend: None,
        }
    }

    /// Translocation joining `chromosome:position` to the breakend mate.
    pub fn translocation(chromosome: &str, position: Pos, reference: &str, alt: &str, breakend: Breakend) -> Variant {
        Variant {
            chromosome: chromosome.to_string(),
            start: position,
            end: position,
            reference: normalize_allele(reference),
            alt: alt.to_string(),
            variant_type: VariantType::Bnd,
            id: String::new(),
            genotype: None,
            breakend: Some(breakend),
        }
    }

    fn raw(chromosome: &str, start: Pos, reference: String, alt: String, variant_type: VariantType) -> Variant {
        let end = match variant_type {
            VariantType::Ins => start,
            _ => start + (reference.len() as Pos - 1).max(0),
        };
        Variant {
            chromosome: chromosome.to_string(),
            start,
            end,
            reference,
            alt,
            variant_type,
            id: String::new(),
            genotype: None,
            breakend: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_genotype(mut self, genotype: &str) -> Self {
        self.genotype = Some(genotype.to_string());
        self
    }

    pub fn genotype(&self) -> &str {
        self.genotype.as_deref().unwrap_or(&self.alt)
    }

    pub fn is_snp(&self) -> bool {
        self.variant_type == VariantType::Snp
    }

    pub fn is_mnp(&self) -> bool {
        self.variant_type == VariantType::Mnp
    }

    pub fn is_ins(&self) -> bool {
        self.variant_type == VariantType::Ins
    }

    pub fn is_del(&self) -> bool {
        self.variant_type == VariantType::Del
    }

    pub fn is_mixed(&self) -> bool {
        self.variant_type == VariantType::Mixed
    }

    pub fn is_dup(&self) -> bool {
        self.variant_type == VariantType::Dup
    }

    pub fn is_inv(&self) -> bool {
        self.variant_type == VariantType::Inv
    }

    pub fn is_bnd(&self) -> bool {
        self.variant_type == VariantType::Bnd
    }

    pub fn is_interval(&self) -> bool {
        self.variant_type == VariantType::Interval
    }

    /// Does this record describe an actual change of sequence?
    pub fn is_variant(&self) -> bool {
        !matches!(self.variant_type, VariantType::Interval | VariantType::None)
    }

    pub fn is_structural(&self) -> bool {
        matches!(
            self.variant_type,
            VariantType::Del | VariantType::Dup | VariantType::Inv | VariantType::Bnd
        )
    }

    pub fn is_structural_huge(&self, chromosome_length: Pos) -> bool {
        if !self.is_structural() {
            return false;
        }
        let size = self.size();
        size > HUGE_VARIANT_SIZE_THRESHOLD
            || (chromosome_length > HUGE_VARIANT_SIZE_THRESHOLD
                && size as f64 / chromosome_length as f64 > HUGE_VARIANT_RATIO_THRESHOLD)
    }

    /// Bases added (positive) or removed (negative) by the variant.
    pub fn length_change(&self) -> Pos {
        match self.variant_type {
            VariantType::Ins => self.alt.len() as Pos,
            VariantType::Del => -self.size(),
            VariantType::Dup => self.size(),
            VariantType::Mixed => self.alt.len() as Pos - self.reference.len() as Pos,
            _ => 0,
        }
    }

    /// Sequence change: deleted bases for deletions, the alternative allele otherwise.
    pub fn net_change(&self, reverse: bool) -> String {
        let seq = if self.is_del() { &self.reference } else { &self.alt };
        if reverse {
            reverse_complement(seq)
        } else {
            seq.clone()
        }
    }

    ///
    /// Sequence change restricted to the part of the variant inside `marker`.
    /// Deletions without a reference sequence are reported as `N`s.
    ///
    pub fn net_change_in<L: Located + ?Sized>(&self, marker: &L) -> String {
        if !self.is_del() {
            return self.net_change(false);
        }

        let mut seq = if self.reference.is_empty() {
            "N".repeat(self.size().max(0) as usize)
        } else {
            self.reference.clone()
        };

        let remove_after = (self.end - marker.end()).max(0) as usize;
        if remove_after > 0 {
            let keep = seq.len().saturating_sub(remove_after);
            seq.truncate(keep);
        }

        let remove_before = (marker.start() - self.start).max(0) as usize;
        if remove_before > 0 {
            seq.drain(..remove_before.min(seq.len()));
        }

        seq
    }

    ///
    /// Split a MIXED variant into an MNP covering the common length and an
    /// INS or DEL carrying the remaining bases. Other variants are returned
    /// unchanged.
    ///
    pub fn decompose(&self) -> Vec<Variant> {
        if !self.is_mixed() {
            return vec![self.clone()];
        }

        let min_len = self.reference.len().min(self.alt.len());
        let mut mnp = Variant::raw(
            &self.chromosome,
            self.start,
            self.reference[..min_len].to_string(),
            self.alt[..min_len].to_string(),
            VariantType::Mnp,
        );
        mnp.id = format!("{}_MNP", self.id);

        let rest_start = self.start + min_len as Pos;
        let rest_ref = self.reference[min_len..].to_string();
        let rest_alt = self.alt[min_len..].to_string();
        let (rest_type, suffix) = if rest_ref.is_empty() {
            (VariantType::Ins, "_INS")
        } else {
            (VariantType::Del, "_DEL")
        };
        let mut rest = Variant::raw(&self.chromosome, rest_start, rest_ref, rest_alt, rest_type);
        rest.id = format!("{}{}", self.id, suffix);

        for v in [&mut mnp, &mut rest] {
            v.genotype = self.genotype.clone();
        }

        vec![mnp, rest]
    }
}

impl Located for Variant {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }

    fn start(&self) -> Pos {
        self.start
    }

    fn end(&self) -> Pos {
        self.end
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_alleles = !self.reference.is_empty() || !self.alt.is_empty();
        if has_alleles || (self.is_variant() && !self.is_structural()) {
            write!(f, "{}:{}_{}/{}", self.chromosome, self.start, self.reference, self.alt)
        } else {
            write!(f, "{}:{}-{}[{}]", self.chromosome, self.start, self.end, self.variant_type)
        }
    }
}
