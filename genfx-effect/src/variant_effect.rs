use log::warn;

use genfx_core::codon_table::CodonTable;
use genfx_core::models::{Genome, Located, MarkerId, MarkerKind, Pos, Variant};

use crate::effect_type::{EffectImpact, EffectType, ErrorWarningType};
use crate::structural::Fusion;

/// Codon strings longer than this are left out of reports.
pub const MAX_CODON_SEQUENCE_LEN: usize = 100;

///
/// Effect of one variant on one marker (or on no marker at all, for
/// intergenic hits and chromosome errors).
///
/// An effect may carry several effect types, e.g. `SPLICE_SITE_REGION` and
/// `INTRON` for the same transcript. [`effect_type`](Self::effect_type) and
/// [`impact`](Self::impact) report the most important ones.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VariantEffect {
    pub variant: Variant,
    pub marker: Option<MarkerId>,
    effect_types: Vec<EffectType>,
    effect_impacts: Vec<EffectImpact>,
    pub codons_ref: String,
    pub codons_alt: String,
    pub aa_ref: String,
    pub aa_alt: String,
    /// 0-based codon number in the CDS
    pub codon_num: Option<usize>,
    /// 0-based position of the first changed base inside its codon
    pub codon_index: Option<usize>,
    /// 0-based position in the mRNA
    pub cdna_pos: Option<usize>,
    /// Distance to the transcript (upstream/downstream) or to the CDS (UTRs)
    pub distance: Option<Pos>,
    pub fusion: Option<Fusion>,
    errors: Vec<ErrorWarningType>,
    warnings: Vec<ErrorWarningType>,
}

impl VariantEffect {
    /// An effect without any effect type, used to carry errors.
    pub fn empty(variant: &Variant) -> Self {
        VariantEffect {
            variant: variant.clone(),
            marker: None,
            effect_types: Vec::new(),
            effect_impacts: Vec::new(),
            codons_ref: String::new(),
            codons_alt: String::new(),
            aa_ref: String::new(),
            aa_alt: String::new(),
            codon_num: None,
            codon_index: None,
            cdna_pos: None,
            distance: None,
            fusion: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn new(variant: &Variant, marker: Option<MarkerId>, effect_type: EffectType) -> Self {
        Self::with_impact(variant, marker, effect_type, effect_type.impact())
    }

    pub fn with_impact(
        variant: &Variant,
        marker: Option<MarkerId>,
        effect_type: EffectType,
        impact: EffectImpact,
    ) -> Self {
        let mut effect = Self::empty(variant);
        effect.marker = marker;
        effect.add_effect_with_impact(effect_type, impact);
        effect
    }

    /// Most important effect type, `NONE` if there is none.
    pub fn effect_type(&self) -> EffectType {
        self.effect_types.iter().min().copied().unwrap_or(EffectType::None)
    }

    /// Every effect type, most important first.
    pub fn effect_types(&self) -> Vec<EffectType> {
        let mut types = self.effect_types.clone();
        types.sort();
        types.dedup();
        types
    }

    pub fn has_effect_type(&self, effect_type: EffectType) -> bool {
        self.effect_types.contains(&effect_type)
    }

    /// Highest impact. Records that do not change the sequence are always `MODIFIER`.
    pub fn impact(&self) -> EffectImpact {
        if !self.variant.is_variant() {
            return EffectImpact::Modifier;
        }
        self.effect_impacts.iter().min().copied().unwrap_or(EffectImpact::Modifier)
    }

    pub fn add_effect(&mut self, effect_type: EffectType) {
        self.add_effect_with_impact(effect_type, effect_type.impact());
    }

    pub fn add_effect_with_impact(&mut self, effect_type: EffectType, impact: EffectImpact) {
        self.effect_types.push(effect_type);
        self.effect_impacts.push(impact);
    }

    /// Replace every effect type with `effect_type` at its default impact.
    pub fn set_effect(&mut self, effect_type: EffectType) {
        self.effect_types.clear();
        self.effect_impacts.clear();
        self.add_effect(effect_type);
    }

    pub fn set_impact(&mut self, impact: EffectImpact) {
        self.effect_impacts.clear();
        self.effect_impacts.push(impact);
    }

    ///
    /// Set the codon change and translate it with `table`.
    ///
    pub fn set_codons(
        &mut self,
        codons_ref: &str,
        codons_alt: &str,
        codon_num: usize,
        codon_index: usize,
        table: &CodonTable,
    ) {
        self.codons_ref = codons_ref.to_string();
        self.codons_alt = codons_alt.to_string();
        self.codon_num = Some(codon_num);
        self.codon_index = Some(codon_index);
        self.aa_ref = if codons_ref.is_empty() { String::new() } else { table.aa(codons_ref) };
        self.aa_alt = if codons_alt.is_empty() { String::new() } else { table.aa(codons_alt) };
    }

    /// `ref/alt` codons, empty for large variants.
    pub fn codon_change(&self) -> String {
        if self.variant.size() > MAX_CODON_SEQUENCE_LEN as Pos {
            return String::new();
        }
        if self.codons_ref.is_empty() && self.codons_alt.is_empty() {
            return String::new();
        }
        format!("{}/{}", self.codons_ref, self.codons_alt)
    }

    /// Amino acid change, `{ref}{codon number}{alt}`.
    pub fn aa_change(&self) -> String {
        let num = self.codon_num.map(|n| n + 1);
        match num {
            Some(n) if self.aa_ref.is_empty() && self.aa_alt.is_empty() => n.to_string(),
            Some(n) if self.aa_ref == self.aa_alt => format!("{}{}", self.aa_alt, n),
            Some(n) => format!("{}{}{}", self.aa_ref, n, self.aa_alt),
            None => String::new(),
        }
    }

    ///
    /// Amino acids inserted or deleted, assuming one of `aa_ref`/`aa_alt`
    /// contains the other at its start or end. `None` when neither holds.
    ///
    pub fn aa_net_change(&self) -> Option<String> {
        let (mut short, mut long) = (self.aa_ref.to_uppercase(), self.aa_alt.to_uppercase());
        if long.len() < short.len() {
            std::mem::swap(&mut short, &mut long);
        }
        if let Some(rest) = long.strip_prefix(&short) {
            return Some(rest.to_string());
        }
        if let Some(rest) = long.strip_suffix(&short) {
            return Some(rest.to_string());
        }
        None
    }

    pub fn errors(&self) -> &[ErrorWarningType] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ErrorWarningType] {
        &self.warnings
    }

    /// Errors and warnings, each reported once.
    pub fn add_error_warning(&mut self, tag: ErrorWarningType) {
        let list = if tag.is_error() { &mut self.errors } else { &mut self.warnings };
        if !list.contains(&tag) {
            list.push(tag);
        }
    }

    pub fn has_error_warning(&self, tag: ErrorWarningType) -> bool {
        self.errors.contains(&tag) || self.warnings.contains(&tag)
    }

    fn ancestor(&self, genome: &Genome, kind: MarkerKind) -> Option<MarkerId> {
        self.marker.and_then(|m| genome.ancestor(m, kind))
    }

    pub fn transcript(&self, genome: &Genome) -> Option<MarkerId> {
        self.ancestor(genome, MarkerKind::Transcript)
    }

    pub fn gene(&self, genome: &Genome) -> Option<MarkerId> {
        self.ancestor(genome, MarkerKind::Gene)
    }

    pub fn exon(&self, genome: &Genome) -> Option<MarkerId> {
        self.ancestor(genome, MarkerKind::Exon)
    }

    pub fn intron(&self, genome: &Genome) -> Option<MarkerId> {
        self.ancestor(genome, MarkerKind::Intron)
    }

    /// Gene region of the main effect, `EXON` for transcript level effects on an exon.
    pub fn gene_region(&self, genome: &Genome) -> EffectType {
        let region = self.effect_type().gene_region();
        let on_exon = self.marker.and_then(|m| genome.get(m)).is_some_and(|m| m.kind() == MarkerKind::Exon);
        if region == EffectType::Transcript && on_exon {
            EffectType::Exon
        } else {
            region
        }
    }

    /// Sequence Ontology terms of every effect type, `&` separated.
    pub fn so_terms(&self) -> String {
        let non_variant = !self.variant.is_variant() || self.variant.is_interval();
        self.effect_types()
            .iter()
            .map(|t| t.so_term(non_variant))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Transcript and exon level data problems relevant to this effect.
    fn sanity_check(&mut self, genome: &Genome) {
        let Some(tr) = self.transcript(genome).and_then(|t| genome.transcript(t)) else {
            return;
        };

        if tr.is_protein_coding() {
            if tr.is_incomplete() {
                self.add_error_warning(ErrorWarningType::WarningTranscriptIncomplete);
            }
            if tr.has_multiple_stop_codons() {
                self.add_error_warning(ErrorWarningType::WarningTranscriptMultipleStopCodons);
            }
            if !tr.cds().is_empty() && !tr.has_start_codon() {
                self.add_error_warning(ErrorWarningType::WarningTranscriptNoStartCodon);
            }
            if !tr.cds().is_empty() && !tr.has_stop_codon() {
                self.add_error_warning(ErrorWarningType::WarningTranscriptNoStopCodon);
            }
        }

        let Some(exon_id) = self.exon(genome) else {
            return;
        };
        let exon = &genome[exon_id];
        let Some(data) = exon.as_exon() else {
            return;
        };
        if !exon.intersects(&self.variant) {
            return;
        }
        if data.sequence.is_empty() {
            self.add_error_warning(ErrorWarningType::WarningSequenceNotAvailable);
            return;
        }

        let reference = &self.variant.reference;
        if reference.is_empty() || !exon.includes(&self.variant) {
            return;
        }
        let from = (self.variant.start - exon.start) as usize;
        let found = data.sequence.get(from..from + reference.len());
        if found.is_some_and(|f| !f.eq_ignore_ascii_case(reference)) {
            warn!(
                "Reference '{}' of {} does not match the genome ('{}')",
                reference,
                self.variant,
                found.unwrap_or_default()
            );
            self.add_error_warning(ErrorWarningType::WarningRefDoesNotMatchGenome);
        }
    }
}

///
/// Ordered effects of one variant.
///
/// Every effect added here is checked against its transcript and exon, so
/// data problems show up as warnings on the effects themselves.
///
#[derive(Debug, Clone)]
pub struct VariantEffects<'g> {
    genome: &'g Genome,
    effects: Vec<VariantEffect>,
}

impl<'g> VariantEffects<'g> {
    pub fn new(genome: &'g Genome) -> Self {
        VariantEffects {
            genome,
            effects: Vec::new(),
        }
    }

    pub fn genome(&self) -> &'g Genome {
        self.genome
    }

    pub fn add(&mut self, mut effect: VariantEffect) {
        effect.sanity_check(self.genome);
        self.effects.push(effect);
    }

    /// Add an effect of `effect_type` on `marker`.
    pub fn add_type(&mut self, variant: &Variant, marker: Option<MarkerId>, effect_type: EffectType) {
        self.add(VariantEffect::new(variant, marker, effect_type));
    }

    ///
    /// Add `effect_type` to the last effect when it refers to the same
    /// transcript as `marker`, otherwise add a new effect.
    ///
    pub fn add_effect_type(&mut self, variant: &Variant, marker: MarkerId, effect_type: EffectType) {
        let tr = self.genome.ancestor(marker, MarkerKind::Transcript);
        if let Some(last) = self.effects.last_mut() {
            let same_transcript = tr.is_some() && last.transcript(self.genome) == tr;
            if same_transcript && last.variant == *variant {
                last.add_effect(effect_type);
                return;
            }
        }
        self.add_type(variant, Some(marker), effect_type);
    }

    /// Tag the last effect, or a new empty one when there is none.
    pub fn add_error_warning(&mut self, variant: &Variant, tag: ErrorWarningType) {
        match self.effects.last_mut() {
            Some(last) => last.add_error_warning(tag),
            None => {
                let mut effect = VariantEffect::empty(variant);
                effect.add_error_warning(tag);
                self.effects.push(effect);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantEffect> {
        self.effects.iter()
    }

    pub fn last_mut(&mut self) -> Option<&mut VariantEffect> {
        self.effects.last_mut()
    }

    pub(crate) fn effects_mut(&mut self) -> &mut [VariantEffect] {
        &mut self.effects
    }

    pub fn into_vec(self) -> Vec<VariantEffect> {
        self.effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genfx_core::codon_table::STANDARD;
    use genfx_core::config::Config;
    use genfx_core::models::{GenomeBuilder, Strand};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn genome() -> (Genome, MarkerId, MarkerId) {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", "CCATGAAATAGCCCCCCCCC", false).unwrap();
        let g = b.add_gene("chr1", 2, 10, Strand::Plus, "G1", "GENE1").unwrap();
        let t = b.add_transcript(g, 2, 10, "T1").unwrap();
        let e = b.add_exon(t, 2, 10).unwrap();
        b.add_cds(t, 2, 10).unwrap();
        (b.build(&Config::default()).unwrap(), t, e)
    }

    #[rstest]
    fn test_highest_type_and_impact() {
        let v = Variant::new("chr1", 10, "A", "T");
        let mut effect = VariantEffect::new(&v, None, EffectType::Intron);
        effect.add_effect(EffectType::SpliceSiteRegion);
        assert_eq!(effect.effect_type(), EffectType::SpliceSiteRegion);
        assert_eq!(effect.impact(), EffectImpact::Low);
        assert_eq!(
            effect.effect_types(),
            vec![EffectType::SpliceSiteRegion, EffectType::Intron]
        );

        let interval = Variant::new("chr1", 10, "A", "A");
        let effect = VariantEffect::new(&interval, None, EffectType::StopGained);
        assert_eq!(effect.impact(), EffectImpact::Modifier);
        assert_eq!(VariantEffect::empty(&v).effect_type(), EffectType::None);
    }

    #[rstest]
    fn test_codons_and_aa() {
        let v = Variant::new("chr1", 10, "A", "T");
        let mut effect = VariantEffect::new(&v, None, EffectType::CodonChange);
        effect.set_codons("AAA", "TAA", 1, 0, &STANDARD);
        assert_eq!((effect.aa_ref.as_str(), effect.aa_alt.as_str()), ("K", "*"));
        assert_eq!(effect.aa_change(), "K2*");
        assert_eq!(effect.codon_change(), "AAA/TAA");
    }

    #[rstest]
    #[case("K", "KLM", Some("LM"))]
    #[case("KLM", "M", Some("KL"))]
    #[case("", "FS", Some("FS"))]
    #[case("KL", "MN", None)]
    fn test_aa_net_change(#[case] aa_ref: &str, #[case] aa_alt: &str, #[case] expected: Option<&str>) {
        let v = Variant::new("chr1", 10, "", "AAA");
        let mut effect = VariantEffect::new(&v, None, EffectType::CodonInsertion);
        effect.aa_ref = aa_ref.to_string();
        effect.aa_alt = aa_alt.to_string();
        assert_eq!(effect.aa_net_change(), expected.map(str::to_string));
    }

    #[rstest]
    fn test_errors_are_deduplicated() {
        let v = Variant::new("chr1", 10, "A", "T");
        let mut effect = VariantEffect::empty(&v);
        effect.add_error_warning(ErrorWarningType::ErrorOutOfExon);
        effect.add_error_warning(ErrorWarningType::ErrorOutOfExon);
        effect.add_error_warning(ErrorWarningType::InfoRealign3Prime);
        assert_eq!(effect.errors(), &[ErrorWarningType::ErrorOutOfExon]);
        assert_eq!(effect.warnings(), &[ErrorWarningType::InfoRealign3Prime]);
    }

    #[rstest]
    fn test_reference_mismatch_warning(genome: (Genome, MarkerId, MarkerId)) {
        let (genome, _, exon) = genome;
        let mut effects = VariantEffects::new(&genome);

        effects.add_type(&Variant::new("chr1", 5, "A", "T"), Some(exon), EffectType::Exon);
        effects.add_type(&Variant::new("chr1", 5, "G", "T"), Some(exon), EffectType::Exon);

        let effects = effects.into_vec();
        assert!(!effects[0].has_error_warning(ErrorWarningType::WarningRefDoesNotMatchGenome));
        assert!(effects[1].has_error_warning(ErrorWarningType::WarningRefDoesNotMatchGenome));
    }

    #[rstest]
    fn test_add_effect_type_merges_same_transcript(genome: (Genome, MarkerId, MarkerId)) {
        let (genome, t, exon) = genome;
        let v = Variant::new("chr1", 5, "A", "T");
        let mut effects = VariantEffects::new(&genome);
        effects.add_type(&v, Some(exon), EffectType::Exon);
        effects.add_effect_type(&v, t, EffectType::SpliceSiteRegion);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.iter().next().unwrap().effect_type(), EffectType::SpliceSiteRegion);
        assert_eq!(effects.iter().next().unwrap().gene_region(&genome), EffectType::SpliceSiteRegion);
    }

    #[rstest]
    fn test_error_on_empty_effects(genome: (Genome, MarkerId, MarkerId)) {
        let (genome, _, _) = genome;
        let v = Variant::new("chrX", 5, "A", "T");
        let mut effects = VariantEffects::new(&genome);
        effects.add_error_warning(&v, ErrorWarningType::ErrorChromosomeNotFound);
        let effects = effects.into_vec();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].errors(), &[ErrorWarningType::ErrorChromosomeNotFound]);
        assert_eq!(effects[0].marker, None);
    }
}
