use log::{debug, info};

use genfx_core::config::Config;
use genfx_core::models::{
    Genome, Located, Marker, MarkerId, MarkerKind, Pos, SMALL_VARIANT_SIZE_THRESHOLD, TranscriptView, Variant,
    VariantType,
};
use genfx_overlaprs::{IntervalForest, IntoIntervalForest, OverlapperType};
use genfx_realign::{realign_left, realign_right};

use crate::codon_change::codon_change;
use crate::effect_type::{EffectType, ErrorWarningType};
use crate::errors::{EffectError, EffectResult};
use crate::structural::StructuralEffect;
use crate::variant_effect::{VariantEffect, VariantEffects};

const START_CODON: &str = "ATG";

///
/// Predicts the effects of variants on an annotated genome.
///
/// The predictor only borrows the genome; its interval forest is built once
/// in [`EffectPredictor::new`] and never modified afterwards, so a single
/// predictor can be shared between threads.
///
/// # Examples
///
/// ```
/// use genfx_core::config::Config;
/// use genfx_core::models::{GenomeBuilder, Strand, Variant};
/// use genfx_effect::{EffectPredictor, EffectType};
///
/// let mut b = GenomeBuilder::new("demo");
/// b.add_chromosome("chr1", "CCCCCATGAAATAACCCCC", false).unwrap();
/// let gene = b.add_gene("chr1", 5, 13, Strand::Plus, "G1", "GENE1").unwrap();
/// let tr = b.add_transcript(gene, 5, 13, "T1").unwrap();
/// b.add_exon(tr, 5, 13).unwrap();
/// b.add_cds(tr, 5, 13).unwrap();
///
/// let config = Config::default();
/// let genome = b.build(&config).unwrap();
/// let predictor = EffectPredictor::new(&genome, &config).unwrap();
///
/// let effects = predictor.predict(&Variant::new("chr1", 8, "A", "T")).unwrap();
/// assert_eq!(effects[0].effect_type(), EffectType::StopGained);
/// ```
#[derive(Debug)]
pub struct EffectPredictor<'g> {
    genome: &'g Genome,
    forest: IntervalForest,
    config: Config,
}

impl<'g> EffectPredictor<'g> {
    pub fn new(genome: &'g Genome, config: &Config) -> EffectResult<Self> {
        Self::with_overlapper(genome, config, OverlapperType::IntervalTree)
    }

    pub fn with_overlapper(genome: &'g Genome, config: &Config, overlapper_type: OverlapperType) -> EffectResult<Self> {
        let forest = genome.into_interval_forest(overlapper_type)?;
        info!(
            "Effect predictor ready for '{}' ({} genes, {:?})",
            genome.name,
            genome.genes().len(),
            overlapper_type
        );
        Ok(EffectPredictor {
            genome,
            forest,
            config: config.clone(),
        })
    }

    pub fn genome(&self) -> &'g Genome {
        self.genome
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Markers in the forest intersecting `chromosome:[start, end]`.
    pub fn query(&self, chromosome: &str, start: Pos, end: Pos) -> Vec<MarkerId> {
        self.forest.query(chromosome, start, end)
    }

    ///
    /// Every effect of `variant`, in a deterministic order.
    ///
    /// Problems with the variant itself (unknown chromosome, position out of
    /// range) are reported as error tags on the returned effects. An `Err`
    /// means the genome or the predictor broke an invariant.
    ///
    pub fn predict(&self, variant: &Variant) -> EffectResult<Vec<VariantEffect>> {
        let mut effects = VariantEffects::new(self.genome);

        if self.config.predictor.error_on_missing_chromosome && self.genome.chromosome(&variant.chromosome).is_none() {
            effects.add_error_warning(variant, ErrorWarningType::ErrorChromosomeNotFound);
            return Ok(effects.into_vec());
        }

        if variant.is_bnd() {
            self.translocation(variant, &mut effects);
            return Ok(effects.into_vec());
        }

        let structural = variant.is_structural() && variant.size() > SMALL_VARIANT_SIZE_THRESHOLD;
        if structural && variant.is_structural_huge(self.genome.chromosome_length(&variant.chromosome)) {
            self.structural_huge(variant, &mut effects)?;
            return Ok(effects.into_vec());
        }

        let intersects = self.forest.query_located(variant);
        if structural && self.structural(variant, &mut effects, &intersects) {
            return Ok(effects.into_vec());
        }

        self.markers(variant, &mut effects, &intersects)?;
        Ok(effects.into_vec())
    }

    fn marker(&self, id: MarkerId) -> EffectResult<&'g Marker> {
        self.genome.get(id).ok_or(EffectError::UnknownMarker(id))
    }

    /// Fusions between whatever sits at both breakends.
    fn translocation(&self, variant: &Variant, effects: &mut VariantEffects<'g>) {
        let mut intersects = self.forest.query(&variant.chromosome, variant.start, variant.start);
        if let Some(mate) = &variant.breakend {
            intersects.extend(self.forest.query(&mate.chromosome, mate.position, mate.position));
        }
        for fusion in StructuralEffect::new(self.genome, variant, &intersects).fusions() {
            effects.add(fusion);
        }
    }

    /// Gene level effects and fusions. Returns whether the analysis is complete.
    fn structural(&self, variant: &Variant, effects: &mut VariantEffects<'g>, intersects: &[MarkerId]) -> bool {
        let sv = StructuralEffect::new(self.genome, variant, intersects);
        let mut added = false;
        if let Some(effect) = sv.effect() {
            effects.add(effect);
            added = true;
        }
        for fusion in sv.fusions() {
            effects.add(fusion);
            added = true;
        }
        debug!(
            "Structural variant {}: {} whole and {} partial genes",
            variant,
            sv.whole_genes(),
            sv.partial_genes()
        );

        // deletions and duplications are also annotated gene by gene
        if variant.is_del() || variant.is_dup() {
            return false;
        }
        added
    }

    ///
    /// Variants too large to query: a chromosome level effect plus an effect
    /// per gene, transcript and exon touched, found by scanning every gene.
    ///
    fn structural_huge(&self, variant: &Variant, effects: &mut VariantEffects<'g>) -> EffectResult<()> {
        let (chromosome, gene, transcript, exon, exon_partial) = match variant.variant_type {
            VariantType::Del => (
                EffectType::ChromosomeLargeDeletion,
                EffectType::GeneDeleted,
                EffectType::TranscriptDeleted,
                EffectType::ExonDeleted,
                EffectType::ExonDeletedPartial,
            ),
            VariantType::Dup => (
                EffectType::ChromosomeLargeDuplication,
                EffectType::GeneDuplication,
                EffectType::TranscriptDuplication,
                EffectType::ExonDuplication,
                EffectType::ExonDuplicationPartial,
            ),
            VariantType::Inv => (
                EffectType::ChromosomeLargeInversion,
                EffectType::GeneInversion,
                EffectType::TranscriptInversion,
                EffectType::ExonInversion,
                EffectType::ExonInversionPartial,
            ),
            _ => return Ok(()),
        };

        info!("Huge structural variant {}: scanning all genes", variant);
        effects.add_type(variant, self.genome.chromosome_id(&variant.chromosome), chromosome);

        for &gene_id in self.genome.genes() {
            let g = self.marker(gene_id)?;
            if !variant.intersects(g) {
                continue;
            }
            effects.add_type(variant, Some(gene_id), gene);

            let transcripts = g.as_gene().map(|d| d.transcripts.as_slice()).unwrap_or_default();
            for &tr_id in transcripts {
                let tr = self.marker(tr_id)?;
                if variant.includes(tr) {
                    effects.add_type(variant, Some(tr_id), transcript);
                } else if variant.intersects(tr) {
                    let exons = tr.as_transcript().map(|d| d.exons.as_slice()).unwrap_or_default();
                    for &ex_id in exons {
                        let ex = self.marker(ex_id)?;
                        if variant.includes(ex) {
                            effects.add_type(variant, Some(ex_id), exon);
                        } else if variant.intersects(ex) {
                            effects.add_type(variant, Some(ex_id), exon_partial);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn markers(&self, variant: &Variant, effects: &mut VariantEffects<'g>, intersects: &[MarkerId]) -> EffectResult<()> {
        let mut hit_chromosome = false;
        let mut hit_something = false;
        for &id in intersects {
            let marker = self.marker(id)?;
            match marker.kind() {
                MarkerKind::Chromosome => hit_chromosome = true,
                MarkerKind::Gene => {
                    self.gene(variant, id, marker, effects)?;
                    hit_something = true;
                }
                MarkerKind::Upstream | MarkerKind::Downstream => {
                    self.up_down_stream(variant, id, marker, effects);
                    hit_something = true;
                }
                _ => {}
            }
        }

        if !hit_chromosome {
            let chr_len = self.genome.chromosome_length(&variant.chromosome);
            if variant.is_ins() && variant.start == chr_len {
                effects.add_type(variant, None, EffectType::ChromosomeElongation);
            } else if self.config.predictor.error_chromosome_hit {
                effects.add_error_warning(variant, ErrorWarningType::ErrorOutOfChromosomeRange);
            }
        } else if !hit_something {
            effects.add_type(variant, None, EffectType::Intergenic);
        }
        Ok(())
    }

    /// Indels moved to their most 3' position on the gene's strand.
    fn shift(&self, variant: &Variant, gene: &Marker) -> Variant {
        let indel = (variant.is_ins() && !variant.alt.is_empty()) || (variant.is_del() && !variant.reference.is_empty());
        if !self.config.hgvs.shift || !indel {
            return variant.clone();
        }
        let shifted = if gene.is_minus() {
            realign_left(self.genome, variant)
        } else {
            realign_right(self.genome, variant)
        };
        if shifted.intersects(gene) { shifted } else { variant.clone() }
    }

    fn gene(&self, variant: &Variant, id: MarkerId, gene: &Marker, effects: &mut VariantEffects<'g>) -> EffectResult<()> {
        let shifted = self.shift(variant, gene);
        let realigned = shifted != *variant;
        let first = effects.len();

        let mut hit_transcript = false;
        let transcripts = gene.as_gene().map(|d| d.transcripts.as_slice()).unwrap_or_default();
        for &tr_id in transcripts {
            let tr = self.genome.transcript(tr_id).ok_or(EffectError::UnknownMarker(tr_id))?;
            if tr.marker.intersects(&shifted) {
                self.transcript(&shifted, tr, effects)?;
                hit_transcript = true;
            }
        }
        if !hit_transcript {
            effects.add_type(&shifted, Some(id), EffectType::Intragenic);
        }

        if realigned {
            for effect in &mut effects.effects_mut()[first..] {
                effect.add_error_warning(ErrorWarningType::InfoRealign3Prime);
            }
        }
        Ok(())
    }

    fn transcript(&self, variant: &Variant, tr: TranscriptView<'g>, effects: &mut VariantEffects<'g>) -> EffectResult<()> {
        if variant.includes(tr.marker) && variant.is_structural() {
            return codon_change(variant, tr, effects);
        }

        let exons = tr.genomic_order();
        if variant.is_structural() || variant.is_mixed() || variant.is_mnp() {
            let hit = exons.iter().filter(|e| e.intersects(variant)).count();
            if hit > 1 {
                return codon_change(variant, tr, effects);
            }
        }

        let mut exon_annotated = false;
        for (&ex_id, exon) in tr.exon_ids().iter().zip(&exons) {
            if exon.intersects(variant) {
                exon_annotated |= self.exon(variant, tr, ex_id, effects)?;
            }
        }

        let mut included = false;
        for &utr_id in &tr.data.utrs {
            let utr = self.marker(utr_id)?;
            if utr.intersects(variant) {
                self.utr(variant, tr, utr_id, utr, effects);
                included |= utr.includes(variant);
            }
        }
        if included {
            return Ok(());
        }

        for &intron_id in &tr.data.introns {
            let intron = self.marker(intron_id)?;
            if intron.intersects(variant) {
                self.splice_sites(variant, tr, intron_id, effects);
                effects.add_effect_type(variant, intron_id, EffectType::Intron);
                included |= intron.includes(variant);
            }
        }
        if included {
            return Ok(());
        }

        if !exon_annotated {
            effects.add_type(variant, Some(tr.id), EffectType::Transcript);
        }
        Ok(())
    }

    /// Returns whether the exon got an effect of its own.
    fn exon(&self, variant: &Variant, tr: TranscriptView<'g>, id: MarkerId, effects: &mut VariantEffects<'g>) -> EffectResult<bool> {
        let mut annotated = false;
        if !tr.is_protein_coding() || variant.is_interval() || !variant.is_variant() {
            effects.add_type(variant, Some(id), EffectType::Exon);
            annotated = true;
        } else if variant.intersects_range(tr.cds_min(), tr.cds_max()) {
            codon_change(variant, tr, effects)?;
            annotated = true;
        }

        self.splice_sites(variant, tr, id, effects);
        Ok(annotated)
    }

    /// Splice sites belonging to `parent` (an exon or an intron) hit by the variant.
    fn splice_sites(&self, variant: &Variant, tr: TranscriptView<'g>, parent: MarkerId, effects: &mut VariantEffects<'g>) {
        for (id, site) in tr.splice_sites() {
            if site.parent != Some(parent) || !site.intersects(variant) {
                continue;
            }
            match site.kind() {
                MarkerKind::SpliceSiteDonor => effects.add_type(variant, Some(id), EffectType::SpliceSiteDonor),
                MarkerKind::SpliceSiteAcceptor => effects.add_type(variant, Some(id), EffectType::SpliceSiteAcceptor),
                _ => effects.add_effect_type(variant, id, EffectType::SpliceSiteRegion),
            }
        }
    }

    fn utr(&self, variant: &Variant, tr: TranscriptView<'g>, id: MarkerId, utr: &Marker, effects: &mut VariantEffects<'g>) {
        let five_prime = utr.kind() == MarkerKind::Utr5Prime;
        if variant.is_del() && variant.includes(utr) {
            let effect_type = if five_prime { EffectType::Utr5Deleted } else { EffectType::Utr3Deleted };
            effects.add_type(variant, Some(id), effect_type);
            return;
        }

        if five_prime && self.start_gained(variant, tr) {
            effects.add_type(variant, Some(id), EffectType::StartGained);
            return;
        }

        let effect_type = if five_prime { EffectType::Utr5Prime } else { EffectType::Utr3Prime };
        let mut effect = VariantEffect::new(variant, Some(id), effect_type);
        effect.distance = Self::utr_distance(variant, tr, utr, five_prime);
        effects.add(effect);
    }

    ///
    /// Exonic bases between the variant and the CDS. The variant base closest
    /// to the CDS inside the UTR is used.
    ///
    fn utr_distance(variant: &Variant, tr: TranscriptView<'_>, utr: &Marker, five_prime: bool) -> Option<Pos> {
        let toward_higher = five_prime != tr.is_minus();
        let pos = if toward_higher {
            variant.end.min(utr.end)
        } else {
            variant.start.max(utr.start)
        };
        let here = tr.base_number_mrna(pos)? as Pos;
        if five_prime {
            let cds = tr.base_number_mrna(tr.cds_start())? as Pos;
            Some(cds - here)
        } else {
            let cds = tr.base_number_mrna(tr.cds_end())? as Pos;
            Some(here - cds)
        }
    }

    /// Does a substitution in the 5' UTR create a new ATG upstream of the CDS?
    fn start_gained(&self, variant: &Variant, tr: TranscriptView<'_>) -> bool {
        if !variant.is_snp() {
            return false;
        }
        let mrna = tr.mrna();
        let (Some(m), Some(cds)) = (tr.base_number_mrna(variant.start), tr.base_number_mrna(tr.cds_start())) else {
            return false;
        };
        let Some(alt) = variant.net_change(tr.is_minus()).chars().next() else {
            return false;
        };

        (m.saturating_sub(2)..=m)
            .filter(|&i| i + START_CODON.len() <= cds)
            .filter_map(|i| mrna.get(i..i + START_CODON.len()).map(|old| (i, old)))
            .any(|(i, old)| {
                let new: String = old
                    .chars()
                    .enumerate()
                    .map(|(k, c)| if i + k == m { alt } else { c })
                    .collect();
                new.eq_ignore_ascii_case(START_CODON) && !old.eq_ignore_ascii_case(START_CODON)
            })
    }

    fn up_down_stream(&self, variant: &Variant, id: MarkerId, marker: &Marker, effects: &mut VariantEffects<'g>) {
        let upstream = marker.kind() == MarkerKind::Upstream;
        let (effect_type, toward_start) = if upstream {
            (EffectType::Upstream, !marker.is_minus())
        } else {
            (EffectType::Downstream, marker.is_minus())
        };
        // bases from the variant to the transcript
        let distance = if toward_start {
            marker.end - variant.start + 1
        } else {
            variant.start - marker.start + 1
        };

        let mut effect = VariantEffect::new(variant, Some(id), effect_type);
        effect.distance = Some(distance.max(0));
        effects.add(effect);
    }
}
