//!
//! Flat, serializable annotation records: one per predicted effect, carrying
//! both HGVS notations next to the effect classification.
//!
use serde::{Deserialize, Serialize};

use genfx_core::config::HgvsConfig;
use genfx_core::models::{Genome, Variant};
use genfx_effect::{EffectImpact, EffectPredictor, EffectType, ErrorWarningType, VariantEffect};

use crate::dna::HgvsDna;
use crate::errors::HgvsResult;
use crate::protein::HgvsProtein;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub allele: String,
    pub effects: Vec<EffectType>,
    pub so_terms: String,
    pub impact: EffectImpact,
    pub gene_region: EffectType,
    pub gene_name: Option<String>,
    pub gene_id: Option<String>,
    pub biotype: Option<String>,
    pub transcript_id: Option<String>,
    /// Exon or intron rank and the transcript's total count of them
    pub rank: Option<(usize, usize)>,
    pub hgvs_c: Option<String>,
    pub hgvs_p: Option<String>,
    /// 1-based position in the mRNA
    pub cdna_pos: Option<usize>,
    pub codon_change: String,
    pub aa_change: String,
    pub distance: Option<i64>,
    pub errors: Vec<ErrorWarningType>,
    pub warnings: Vec<ErrorWarningType>,
}

fn allele(variant: &Variant) -> String {
    match variant.alt.as_str() {
        "" if variant.is_structural() => format!("<{}>", variant.variant_type),
        "" => "-".to_string(),
        alt => alt.to_string(),
    }
}

impl Annotation {
    pub fn new(genome: &Genome, effect: &VariantEffect, config: &HgvsConfig) -> Self {
        let gene = effect.gene(genome).and_then(|g| genome.get(g));
        let gene_data = gene.and_then(|g| g.as_gene());
        let tr = effect.transcript(genome).and_then(|t| genome.transcript(t));

        let rank = tr.and_then(|tr| {
            if let Some(exon) = effect.exon(genome) {
                return Some((genome[exon].rank(), tr.exon_ids().len()));
            }
            effect
                .intron(genome)
                .map(|intron| (genome[intron].rank(), tr.introns_genomic_order().len()))
        });

        Annotation {
            allele: allele(&effect.variant),
            effects: effect.effect_types(),
            so_terms: effect.so_terms(),
            impact: effect.impact(),
            gene_region: effect.gene_region(genome),
            gene_name: gene_data.map(|g| g.name.clone()),
            gene_id: gene.map(|g| g.id.clone()),
            biotype: gene_data.and_then(|g| g.biotype.clone()),
            transcript_id: tr.map(|t| t.transcript_id().to_string()),
            rank,
            hgvs_c: HgvsDna::new(genome, effect, config).to_hgvs(),
            hgvs_p: HgvsProtein::new(genome, effect, config).to_hgvs(),
            cdna_pos: effect.cdna_pos.map(|p| p + 1),
            codon_change: effect.codon_change(),
            aa_change: effect.aa_change(),
            distance: effect.distance,
            errors: effect.errors().to_vec(),
            warnings: effect.warnings().to_vec(),
        }
    }

    pub fn to_json(&self) -> HgvsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

///
/// Predict the effects of `variant` and annotate each one, using the
/// predictor's HGVS settings.
///
pub fn annotate(predictor: &EffectPredictor<'_>, variant: &Variant) -> HgvsResult<Vec<Annotation>> {
    let genome = predictor.genome();
    let config = &predictor.config().hgvs;
    let annotations = predictor
        .predict(variant)?
        .iter()
        .map(|effect| Annotation::new(genome, effect, config))
        .collect();
    Ok(annotations)
}
