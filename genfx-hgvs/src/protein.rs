//!
//! Protein level HGVS notation (`p.`).
//!
//! Amino acids are written with three letter codes unless one letter codes
//! are configured. The old nomenclature uses one letter codes and `X` for
//! stop codons.
//!
use genfx_core::codon_table::{STOP_AA, aa_three_letter};
use genfx_core::config::HgvsConfig;
use genfx_core::models::{Genome, MarkerId, TranscriptView, Variant, VariantType};
use genfx_effect::{CdsMap, EffectType, VariantEffect};

use crate::utils::{effect_transcript, reference_prefix};

///
/// `p.` notation of one [`VariantEffect`].
///
/// Amino acids shared by the start or the end of the reference and
/// alternative residues are trimmed before classifying the change, so that
/// `KL -> KGL` is an insertion of `G` after `K`.
///
#[derive(Debug, Clone)]
pub struct HgvsProtein<'a> {
    genome: &'a Genome,
    effect: &'a VariantEffect,
    tr: Option<TranscriptView<'a>>,
    config: &'a HgvsConfig,
    /// 0-based codon of the first changed residue, after trimming
    codon_num: Option<usize>,
    aa_old: Vec<char>,
    aa_new: Vec<char>,
}

fn residues(aas: &str) -> Vec<char> {
    if aas == "-" {
        return Vec::new();
    }
    aas.chars().map(|c| c.to_ascii_uppercase()).collect()
}

impl<'a> HgvsProtein<'a> {
    pub fn new(genome: &'a Genome, effect: &'a VariantEffect, config: &'a HgvsConfig) -> Self {
        HgvsProtein {
            genome,
            effect,
            tr: effect_transcript(genome, effect),
            config,
            codon_num: effect.codon_num,
            aa_old: residues(&effect.aa_ref),
            aa_new: residues(&effect.aa_alt),
        }
    }

    fn stop(&self) -> char {
        if self.config.old_nomenclature { 'X' } else { STOP_AA }
    }

    fn aa_code(&self, aa: char) -> String {
        if self.config.old_nomenclature {
            return if aa == STOP_AA { "X".to_string() } else { aa.to_string() };
        }
        if self.config.one_letter_aa {
            return aa.to_string();
        }
        aa_three_letter(aa).to_string()
    }

    fn aa_codes(&self, aas: &[char]) -> String {
        aas.iter().map(|&aa| self.aa_code(aa)).collect()
    }

    fn reference(&self) -> String {
        reference_prefix(self.tr.as_ref(), "p.", self.config)
    }

    fn variant(&self) -> &Variant {
        &self.effect.variant
    }

    fn has(&self, effect_type: EffectType) -> bool {
        self.effect.has_effect_type(effect_type)
    }

    /// HGVS string, `None` when the effect has no protein level consequence.
    pub fn to_hgvs(mut self) -> Option<String> {
        self.effect.marker?;

        if self.effect.effect_type() == EffectType::TranscriptDeleted {
            return Some(format!("{}0?", self.reference()));
        }

        let variant_type = self.variant().variant_type;
        match variant_type {
            VariantType::Interval | VariantType::None | VariantType::Inv => return None,
            VariantType::Bnd => return self.translocation(),
            _ => {}
        }

        if variant_type != VariantType::Snp {
            self.trim();
        }

        let (pos, change) = match variant_type {
            VariantType::Snp | VariantType::Mnp => (String::new(), self.snp_or_mnp()?),
            _ if self.is_frame_shift() => (self.pos_frame_shift()?, "fs".to_string()),
            _ if self.is_ins() && self.is_duplication() => (self.pos_dup()?, "dup".to_string()),
            _ if self.is_ins() => (self.pos_ins()?, format!("ins{}", self.aa_codes(&self.aa_new))),
            _ if self.is_del() => (self.pos_del()?, "del".to_string()),
            _ => (self.pos_delins()?, format!("delins{}", self.aa_codes(&self.aa_new))),
        };

        Some(format!("{}{}{}", self.reference(), pos, change))
    }

    /// Remove identical amino acids from both ends of the change.
    fn trim(&mut self) {
        while let (Some(o), Some(n)) = (self.aa_old.first(), self.aa_new.first()) {
            if o != n {
                break;
            }
            self.aa_old.remove(0);
            self.aa_new.remove(0);
            self.codon_num = self.codon_num.map(|c| c + 1);
        }
        while let (Some(o), Some(n)) = (self.aa_old.last(), self.aa_new.last()) {
            if o != n {
                break;
            }
            self.aa_old.pop();
            self.aa_new.pop();
        }
    }

    fn is_frame_shift(&self) -> bool {
        self.has(EffectType::FrameShift)
            || self.has(EffectType::FrameShiftBeforeCdsStart)
            || self.has(EffectType::FrameShiftAfterCdsEnd)
    }

    fn is_ins(&self) -> bool {
        self.aa_old.is_empty() && !self.aa_new.is_empty()
    }

    fn is_del(&self) -> bool {
        !self.aa_old.is_empty() && self.aa_new.is_empty()
    }

    ///
    /// Inserted residues are a tandem copy of the residues right before
    /// them, either within the changed codons or in the protein.
    ///
    fn is_duplication(&self) -> bool {
        let aa_ref = self.effect.aa_ref.to_uppercase();
        if self.effect.aa_alt.to_uppercase() == aa_ref.repeat(2) {
            return true;
        }

        let (Some(tr), Some(aa_end), Some(inserted)) = (&self.tr, self.effect.codon_num, self.effect.aa_net_change())
        else {
            return false;
        };
        let Some(aa_start) = aa_end.checked_sub(inserted.len()) else {
            return false;
        };
        tr.protein()
            .get(aa_start..aa_end)
            .is_some_and(|before| before.eq_ignore_ascii_case(&inserted))
    }

    fn snp_or_mnp(&self) -> Option<String> {
        let codon_num = self.codon_num?;
        if self.aa_old.is_empty() && self.aa_new.is_empty() {
            return Some((codon_num + 1).to_string());
        }

        let old = self.aa_codes(&self.aa_old);
        let new = self.aa_codes(&self.aa_new);
        let aa_pos = codon_num + 1;

        if self.has(EffectType::StopGained) {
            return Some(format!("{}{}{}", old, aa_pos, self.stop()));
        }
        if self.has(EffectType::StopLost) {
            return Some(format!("{}{}{}ext{}?", old, aa_pos, new, self.stop()));
        }
        // a new start codon may not initiate translation
        if self.has(EffectType::StartLost)
            || self.has(EffectType::SynonymousStart)
            || self.has(EffectType::NonSynonymousStart)
        {
            return Some(format!("{}1?", old));
        }
        Some(format!("{}{}{}", old, aa_pos, new))
    }

    /// Reference residue and number of codon `codon` in `tr`.
    fn pos_in(&self, tr: Option<&TranscriptView<'_>>, codon: usize) -> Option<String> {
        let aa = tr?.protein().chars().nth(codon)?;
        Some(format!("{}{}", self.aa_code(aa), codon + 1))
    }

    fn pos_range_in(&self, tr: Option<&TranscriptView<'_>>, start: usize, end: usize) -> Option<String> {
        let first = self.pos_in(tr, start)?;
        if start == end {
            return Some(first);
        }
        Some(format!("{}_{}", first, self.pos_in(tr, end)?))
    }

    fn pos(&self, codon: usize) -> Option<String> {
        self.pos_in(self.tr.as_ref(), codon)
    }

    fn pos_range(&self, start: usize, end: usize) -> Option<String> {
        self.pos_range_in(self.tr.as_ref(), start, end)
    }

    fn pos_del(&self) -> Option<String> {
        let start = self.codon_num?;
        let end = start + self.aa_old.len().checked_sub(self.aa_new.len())?.max(1) - 1;
        self.pos_range(start, end)
    }

    fn pos_delins(&self) -> Option<String> {
        let start = self.codon_num?;
        let end = start + self.aa_old.len().max(1) - 1;
        self.pos_range(start, end)
    }

    fn pos_dup(&self) -> Option<String> {
        let end = self.codon_num?.checked_sub(1)?;
        let start = end.checked_sub(self.aa_new.len().saturating_sub(1))?;
        self.pos_range(start, end)
    }

    fn pos_ins(&self) -> Option<String> {
        let codon = self.codon_num?;
        self.pos_range(codon.checked_sub(1)?, codon)
    }

    ///
    /// Frame shifts name the first residue that actually changes, found by
    /// translating the coding sequence with the variant applied.
    ///
    fn pos_frame_shift(&self) -> Option<String> {
        let codon_num = self.codon_num?;
        let tr = self.tr.as_ref()?;
        let protein: Vec<char> = tr.protein().chars().collect();

        if codon_num > protein.len() {
            return None;
        }
        if codon_num == protein.len() {
            return Some(format!("{}{}", self.aa_code(STOP_AA), codon_num));
        }

        if !self.variant().is_mixed() {
            let changed = CdsMap::new(tr)
                .apply(self.variant(), tr.cds())
                .map(|cds| tr.codon_table().protein(&cds));
            if let Some(changed) = changed {
                let first_diff = protein
                    .iter()
                    .zip(changed.chars())
                    .enumerate()
                    .skip(codon_num)
                    .find(|(_, (old, new))| *old != new);
                if let Some((cn, (&aa, _))) = first_diff {
                    return Some(format!("{}{}", self.aa_code(aa), cn + 1));
                }
            }
        }

        self.pos(codon_num)
    }

    ///
    /// Fusion protein: `t(chrA;chrB)(trA:Met1_Lys20;trB:Val250_Ter387)`.
    ///
    fn translocation(&self) -> Option<String> {
        let fusion = self.effect.fusion.as_ref()?;
        if fusion.tr_left.is_none() && fusion.tr_right.is_none() {
            return None;
        }

        let variant = self.variant();
        let mate_chr = variant.breakend.as_ref().map_or(variant.chromosome.as_str(), |b| b.chromosome.as_str());

        let side = |tr: Option<MarkerId>, aa: Option<(usize, usize)>| -> String {
            let Some(view) = tr.and_then(|t| self.genome.transcript(t)) else {
                return String::new();
            };
            let range = aa
                .and_then(|(start, end)| self.pos_range_in(Some(&view), start, end))
                .unwrap_or_default();
            format!("{}:{}", view.transcript_id(), range)
        };

        Some(format!(
            "t({};{})({};{})",
            variant.chromosome,
            mate_chr,
            side(fusion.tr_left, fusion.aa_left),
            side(fusion.tr_right, fusion.aa_right)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures;
    use genfx_core::codon_table::STANDARD;
    use genfx_core::models::Breakend;
    use genfx_effect::Fusion;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn genome() -> Genome {
        fixtures::genome()
    }

    fn effect(
        genome: &Genome,
        variant: Variant,
        effect_type: EffectType,
        codons: (&str, &str),
        codon_num: usize,
    ) -> VariantEffect {
        let t1 = fixtures::transcript(genome, "T1");
        let mut effect = VariantEffect::new(&variant, Some(t1), effect_type);
        effect.set_codons(codons.0, codons.1, codon_num, 0, &STANDARD);
        effect
    }

    fn hgvs_with(genome: &Genome, effect: &VariantEffect, config: &HgvsConfig) -> Option<String> {
        HgvsProtein::new(genome, effect, config).to_hgvs()
    }

    fn hgvs(genome: &Genome, effect: &VariantEffect) -> Option<String> {
        hgvs_with(genome, effect, &HgvsConfig::default())
    }

    #[rstest]
    fn test_fixture_protein(genome: Genome) {
        let t1 = fixtures::transcript(&genome, "T1");
        assert_eq!(genome.transcript(t1).unwrap().protein(), "MKLRWGPFE*");
        let t2 = fixtures::transcript(&genome, "T2");
        assert_eq!(genome.transcript(t2).unwrap().protein(), "MASG*");
    }

    #[rstest]
    #[case(19, "A", "G", EffectType::NonSynonymousCoding, ("aAa", "aGa"), 1, "p.Lys2Arg")]
    #[case(23, "G", "A", EffectType::SynonymousCoding, ("ctG", "ctA"), 2, "p.Leu3Leu")]
    #[case(28, "G", "A", EffectType::StopGained, ("tGg", "tAg"), 4, "p.Trp5*")]
    #[case(17, "G", "A", EffectType::StartLost, ("atG", "atA"), 0, "p.Met1?")]
    #[case(52, "T", "C", EffectType::StopLost, ("Taa", "Caa"), 9, "p.Ter10Glnext*?")]
    fn test_substitutions(
        genome: Genome,
        #[case] pos: i64,
        #[case] r: &str,
        #[case] a: &str,
        #[case] effect_type: EffectType,
        #[case] codons: (&str, &str),
        #[case] codon_num: usize,
        #[case] expected: &str,
    ) {
        let eff = effect(&genome, Variant::new("chr1", pos, r, a), effect_type, codons, codon_num);
        assert_eq!(hgvs(&genome, &eff).unwrap(), expected);
    }

    #[rstest]
    fn test_amino_acid_codes(genome: Genome) {
        let missense = effect(
            &genome,
            Variant::new("chr1", 19, "A", "G"),
            EffectType::NonSynonymousCoding,
            ("aAa", "aGa"),
            1,
        );
        let nonsense = effect(
            &genome,
            Variant::new("chr1", 28, "G", "A"),
            EffectType::StopGained,
            ("tGg", "tAg"),
            4,
        );

        let one_letter = HgvsConfig {
            one_letter_aa: true,
            ..Default::default()
        };
        assert_eq!(hgvs_with(&genome, &missense, &one_letter).unwrap(), "p.K2R");
        assert_eq!(hgvs_with(&genome, &nonsense, &one_letter).unwrap(), "p.W5*");

        let old = HgvsConfig {
            old_nomenclature: true,
            ..Default::default()
        };
        assert_eq!(hgvs_with(&genome, &nonsense, &old).unwrap(), "p.W5X");

        let with_id = HgvsConfig {
            use_transcript_id: true,
            ..Default::default()
        };
        assert_eq!(hgvs_with(&genome, &missense, &with_id).unwrap(), "T1.2:p.Lys2Arg");
    }

    #[rstest]
    fn test_frame_shift(genome: Genome) {
        let eff = effect(
            &genome,
            Variant::new("chr1", 20, "", "C"),
            EffectType::FrameShift,
            ("aaa", "aaCa"),
            1,
        );
        assert_eq!(hgvs(&genome, &eff).unwrap(), "p.Lys2fs");
    }

    #[rstest]
    fn test_frame_shift_first_changed_residue(genome: Genome) {
        // AAA CTG CGT -> AAA CTC GCG: Leu3 stays, Arg4 is the first change
        let eff = effect(
            &genome,
            Variant::new("chr1", 23, "", "C"),
            EffectType::FrameShift,
            ("aaactg", "aaactCg"),
            1,
        );
        assert_eq!(hgvs(&genome, &eff).unwrap(), "p.Arg4fs");
    }

    #[rstest]
    fn test_insertion(genome: Genome) {
        let eff = effect(
            &genome,
            Variant::new("chr1", 21, "", "GGG"),
            EffectType::CodonInsertion,
            ("ctg", "GGGctg"),
            2,
        );
        assert_eq!(hgvs(&genome, &eff).unwrap(), "p.Lys2_Leu3insGly");
    }

    #[rstest]
    fn test_duplication(genome: Genome) {
        let eff = effect(
            &genome,
            Variant::new("chr1", 21, "", "AAA"),
            EffectType::CodonInsertion,
            ("ctg", "AAActg"),
            2,
        );
        assert_eq!(hgvs(&genome, &eff).unwrap(), "p.Lys2dup");

        let tandem = effect(
            &genome,
            Variant::new("chr1", 21, "", "CTG"),
            EffectType::CodonInsertion,
            ("ctg", "CTGctg"),
            2,
        );
        assert_eq!(hgvs(&genome, &tandem).unwrap(), "p.Leu3dup");
    }

    #[rstest]
    #[case(Variant::new("chr1", 18, "AAA", ""), ("AAA", ""), "p.Lys2del")]
    #[case(Variant::new("chr1", 18, "AAACTG", ""), ("AAACTG", ""), "p.Lys2_Leu3del")]
    #[case(Variant::new("chr1", 18, "AAACTG", "GAT"), ("AAACTG", "GAT"), "p.Lys2_Leu3delinsAsp")]
    fn test_deletions(genome: Genome, #[case] variant: Variant, #[case] codons: (&str, &str), #[case] expected: &str) {
        let eff = effect(&genome, variant, EffectType::CodonDeletion, codons, 1);
        assert_eq!(hgvs(&genome, &eff).unwrap(), expected);
    }

    #[rstest]
    fn test_transcript_deleted(genome: Genome) {
        let t1 = fixtures::transcript(&genome, "T1");
        let variant = Variant::structural("chr1", 0, 99, VariantType::Del);
        let eff = VariantEffect::new(&variant, Some(t1), EffectType::TranscriptDeleted);
        assert_eq!(hgvs(&genome, &eff).unwrap(), "p.0?");
    }

    #[rstest]
    fn test_no_protein_change(genome: Genome) {
        let t1 = fixtures::transcript(&genome, "T1");
        let intron = VariantEffect::new(&Variant::new("chr1", 31, "T", "A"), Some(t1), EffectType::Intron);
        assert_eq!(hgvs(&genome, &intron), None);

        let intergenic = VariantEffect::new(&Variant::new("chr1", 5, "C", "G"), None, EffectType::Intergenic);
        assert_eq!(hgvs(&genome, &intergenic), None);

        let inversion = VariantEffect::new(
            &Variant::structural("chr1", 16, 20, VariantType::Inv),
            Some(t1),
            EffectType::ExonInversionPartial,
        );
        assert_eq!(hgvs(&genome, &inversion), None);
    }

    #[rstest]
    fn test_translocation(genome: Genome) {
        let t1 = fixtures::transcript(&genome, "T1");
        let t2 = fixtures::transcript(&genome, "T2");
        let breakend = Breakend {
            chromosome: "chr2".to_string(),
            position: 30,
            left: false,
            before: false,
        };
        let variant = Variant::translocation("chr1", 20, "A", "A[chr2:30[", breakend);
        let mut eff = VariantEffect::new(&variant, Some(t1), EffectType::GeneFusion);
        eff.fusion = Some(Fusion {
            tr_left: Some(t1),
            tr_right: Some(t2),
            gene_left: genome.ancestor(t1, genfx_core::models::MarkerKind::Gene),
            gene_right: genome.ancestor(t2, genfx_core::models::MarkerKind::Gene),
            aa_left: Some((0, 1)),
            aa_right: Some((2, 4)),
        });
        assert_eq!(hgvs(&genome, &eff).unwrap(), "t(chr1;chr2)(T1:Met1_Lys2;T2:Ser3_Ter5)");
    }
}
