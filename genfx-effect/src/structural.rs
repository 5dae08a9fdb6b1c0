//! Gene level effects of structural variants and gene fusions.

use genfx_core::codon_table::CODON_SIZE;
use genfx_core::models::{Genome, Located, MarkerId, MarkerKind, Pos, Variant, VariantType};

use crate::effect_type::EffectType;
use crate::variant_effect::VariantEffect;

///
/// Two features joined by a structural variant.
///
/// A side without a transcript is intergenic. Amino acid ranges are 0-based
/// and inclusive, and only computed for translocations.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Fusion {
    pub tr_left: Option<MarkerId>,
    pub tr_right: Option<MarkerId>,
    pub gene_left: Option<MarkerId>,
    pub gene_right: Option<MarkerId>,
    pub aa_left: Option<(usize, usize)>,
    pub aa_right: Option<(usize, usize)>,
}

impl Fusion {
    pub fn is_gene_gene(&self) -> bool {
        self.gene_left.is_some() && self.gene_right.is_some()
    }
}

/// Chromosome and position of the right end of a variant, the mate for translocations.
fn right_point(variant: &Variant) -> (&str, Pos) {
    match &variant.breakend {
        Some(b) if variant.is_bnd() => (b.chromosome.as_str(), b.position),
        _ => (variant.chromosome.as_str(), variant.end),
    }
}

///
/// Genes touched by a structural variant, split by which end of the variant
/// they sit on.
///
#[derive(Debug, Clone)]
pub struct StructuralEffect<'a> {
    genome: &'a Genome,
    variant: &'a Variant,
    genes_left: Vec<MarkerId>,
    genes_right: Vec<MarkerId>,
    whole_genes: usize,
    partial_genes: usize,
}

impl<'a> StructuralEffect<'a> {
    pub fn new(genome: &'a Genome, variant: &'a Variant, intersects: &[MarkerId]) -> Self {
        let (right_chr, right_pos) = right_point(variant);

        let mut effect = StructuralEffect {
            genome,
            variant,
            genes_left: Vec::new(),
            genes_right: Vec::new(),
            whole_genes: 0,
            partial_genes: 0,
        };

        let mut seen = Vec::new();
        for &id in intersects {
            let Some(m) = genome.get(id) else { continue };
            if m.kind() != MarkerKind::Gene || seen.contains(&id) {
                continue;
            }
            seen.push(id);

            if m.chromosome == variant.chromosome && m.intersects_range(variant.start, variant.start) {
                effect.genes_left.push(id);
            }
            if m.chromosome == right_chr && m.intersects_range(right_pos, right_pos) {
                effect.genes_right.push(id);
            }
            if variant.includes(m) {
                effect.whole_genes += 1;
            } else if variant.intersects(m) {
                effect.partial_genes += 1;
            }
        }
        effect
    }

    pub fn whole_genes(&self) -> usize {
        self.whole_genes
    }

    pub fn partial_genes(&self) -> usize {
        self.partial_genes
    }

    /// Gene level effect type, `NONE` when no gene is fully covered.
    pub fn effect_type(&self) -> EffectType {
        match self.variant.variant_type {
            VariantType::Inv if self.whole_genes > 0 => EffectType::GeneInversion,
            VariantType::Del if self.whole_genes > 0 => EffectType::GeneDeleted,
            VariantType::Dup if self.whole_genes > 0 => EffectType::GeneDuplication,
            VariantType::Bnd => match (self.genes_left.is_empty(), self.genes_right.is_empty()) {
                (false, false) => EffectType::GeneFusion,
                (true, true) => EffectType::FeatureFusion,
                _ => EffectType::GeneFusionHalf,
            },
            _ => EffectType::None,
        }
    }

    /// First gene at either end of the variant.
    pub fn gene(&self) -> Option<MarkerId> {
        self.genes_left.first().or(self.genes_right.first()).copied()
    }

    /// Gene level effect, if any.
    pub fn effect(&self) -> Option<VariantEffect> {
        let effect_type = self.effect_type();
        if effect_type == EffectType::None {
            return None;
        }
        Some(VariantEffect::new(self.variant, self.gene(), effect_type))
    }

    ///
    /// Every fusion between features at both ends of the variant.
    ///
    /// Translocation ends without a gene become intergenic partners. Other
    /// variants need a different gene at each end, and the variant must not
    /// sit inside both genes at once. When gene-gene fusions exist, half
    /// fusions are dropped.
    ///
    pub fn fusions(&self) -> Vec<VariantEffect> {
        let sides = |genes: &[MarkerId]| -> Vec<Option<MarkerId>> {
            if genes.is_empty() && self.variant.is_bnd() {
                vec![None]
            } else {
                genes.iter().copied().map(Some).collect()
            }
        };

        let mut fusions = Vec::new();
        for g_left in sides(&self.genes_left) {
            for g_right in sides(&self.genes_right) {
                if !self.variant.is_bnd() {
                    let (Some(l), Some(r)) = (g_left, g_right) else { continue };
                    if l == r || self.inside_both(l, r) {
                        continue;
                    }
                }
                fusions.extend(self.gene_fusions(g_left, g_right));
            }
        }

        let gene_gene = fusions
            .iter()
            .filter(|f| f.fusion.as_ref().is_some_and(Fusion::is_gene_gene))
            .count();
        if gene_gene > 0 && fusions.len() > gene_gene {
            fusions.retain(|f| f.fusion.as_ref().is_some_and(Fusion::is_gene_gene));
        }
        fusions
    }

    fn inside_both(&self, left: MarkerId, right: MarkerId) -> bool {
        let (l, r) = (&self.genome[left], &self.genome[right]);
        let start = l.start.max(r.start);
        let end = l.end.min(r.end);
        start <= end && start <= self.variant.start && self.variant.end <= end
    }

    fn transcripts(&self, gene: Option<MarkerId>) -> Vec<Option<MarkerId>> {
        match gene.and_then(|g| self.genome[g].as_gene()) {
            Some(data) => data.transcripts.iter().copied().map(Some).collect(),
            None => vec![None],
        }
    }

    fn gene_fusions(&self, gene_left: Option<MarkerId>, gene_right: Option<MarkerId>) -> Vec<VariantEffect> {
        let mut fusions = Vec::new();
        for tr_left in self.transcripts(gene_left) {
            for tr_right in self.transcripts(gene_right) {
                if let (Some(l), Some(r)) = (tr_left, tr_right) {
                    if gene_left == gene_right && self.genome[l].id > self.genome[r].id {
                        continue;
                    }
                }
                let fusion = Fusion {
                    tr_left,
                    tr_right,
                    gene_left,
                    gene_right,
                    aa_left: None,
                    aa_right: None,
                };
                fusions.push(FusionEffect::new(self.genome, self.variant, fusion).into_effect());
            }
        }
        fusions
    }
}

/// Classification of a single fusion.
struct FusionEffect<'a> {
    genome: &'a Genome,
    variant: &'a Variant,
    fusion: Fusion,
}

impl<'a> FusionEffect<'a> {
    fn new(genome: &'a Genome, variant: &'a Variant, fusion: Fusion) -> Self {
        FusionEffect { genome, variant, fusion }
    }

    fn is_minus(&self, tr: Option<MarkerId>) -> Option<bool> {
        tr.map(|t| self.genome[t].is_minus())
    }

    fn before(&self) -> bool {
        self.variant.breakend.as_ref().is_some_and(|b| b.before)
    }

    fn left(&self) -> bool {
        self.variant.breakend.as_ref().is_some_and(|b| b.left)
    }

    /// The left breakpoint maps to the previous coding base when it falls in an intron.
    fn use_prev_base_intron_left(&self) -> bool {
        match self.is_minus(self.fusion.tr_left) {
            Some(minus) => minus == self.before(),
            None => false,
        }
    }

    fn cds_base_left(&self) -> Option<usize> {
        let tr = self.genome.transcript(self.fusion.tr_left?)?;
        tr.base_number_cds(self.variant.start, self.use_prev_base_intron_left())
    }

    fn cds_base_right(&self) -> Option<usize> {
        let tr = self.genome.transcript(self.fusion.tr_right?)?;
        let (_, pos) = right_point(self.variant);
        tr.base_number_cds(pos, !self.use_prev_base_intron_left())
    }

    fn protein_len(&self, tr: Option<MarkerId>) -> Option<usize> {
        let tr = self.genome.transcript(tr?)?;
        Some(tr.protein().chars().count())
    }

    /// Amino acids kept from one side: from the start of the protein, or up to its end.
    fn aa_range(&self, cds_base: Option<usize>, protein_len: Option<usize>, begin: bool) -> Option<(usize, usize)> {
        let aa = cds_base? / CODON_SIZE;
        if begin {
            Some((0, aa))
        } else {
            Some((aa, protein_len?.saturating_sub(1)))
        }
    }

    fn aa_positions(&mut self) {
        let (left, before) = (self.left(), self.before());
        if let Some(minus) = self.is_minus(self.fusion.tr_left) {
            let begin = !minus != before;
            self.fusion.aa_left = self.aa_range(self.cds_base_left(), self.protein_len(self.fusion.tr_left), begin);
        }
        if let Some(minus) = self.is_minus(self.fusion.tr_right) {
            let begin = !minus == left;
            self.fusion.aa_right = self.aa_range(self.cds_base_right(), self.protein_len(self.fusion.tr_right), begin);
        }
    }

    /// Do the reading frames on both sides of the breakpoint line up?
    fn in_frame(&self) -> bool {
        let (Some(left), Some(right)) = (self.cds_base_left(), self.cds_base_right()) else {
            return true;
        };
        let frame_left = left % CODON_SIZE;
        let frame_right = right % CODON_SIZE;
        let minus = self.is_minus(self.fusion.tr_left).unwrap_or(false);
        if minus == self.before() {
            (frame_left + 1) % CODON_SIZE == frame_right
        } else {
            (frame_right + 1) % CODON_SIZE == frame_left
        }
    }

    fn effect_type(&self) -> EffectType {
        let same_strand = match (self.is_minus(self.fusion.tr_left), self.is_minus(self.fusion.tr_right)) {
            (Some(l), Some(r)) => l == r,
            _ => true,
        };
        let (forward, reverse) = if same_strand {
            (EffectType::GeneFusion, EffectType::GeneFusionReverese)
        } else {
            (EffectType::GeneFusionReverese, EffectType::GeneFusion)
        };

        match self.variant.variant_type {
            VariantType::Inv => reverse,
            VariantType::Bnd => match (self.fusion.tr_left, self.fusion.tr_right) {
                (None, None) => EffectType::FeatureFusion,
                (None, _) | (_, None) => EffectType::GeneFusionHalf,
                _ => match (self.left(), self.before()) {
                    (false, false) | (true, true) => forward,
                    _ => reverse,
                },
            },
            _ => forward,
        }
    }

    fn into_effect(mut self) -> VariantEffect {
        let effect_type = self.effect_type();

        let marker = if self.variant.is_bnd() {
            self.fusion.tr_left.or(self.fusion.tr_right)
        } else {
            self.fusion.gene_left
        };

        let mut effect = VariantEffect::new(self.variant, marker, effect_type);
        if self.variant.is_bnd() {
            self.aa_positions();
            if effect_type == EffectType::GeneFusion && !self.in_frame() {
                effect.add_effect(EffectType::FrameShift);
            }
        }
        effect.fusion = Some(self.fusion);
        effect
    }
}
