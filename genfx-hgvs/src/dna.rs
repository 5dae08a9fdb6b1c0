//!
//! DNA level HGVS notation.
//!
//! Coding transcripts are numbered from the first base of the start codon
//! (`c.1`). 5'UTR bases count backwards from it (`c.-1`), 3'UTR bases count
//! on from the last coding base (`c.*1`) and intronic bases are offsets from
//! the closest exonic base (`c.77+1`, `c.78-1`). Non-coding transcripts use
//! `n.` and effects without a transcript use 1-based genomic positions (`g.`).
//!
use log::debug;

use genfx_core::config::HgvsConfig;
use genfx_core::models::{Genome, Marker, Pos, TranscriptView, Variant, VariantType};
use genfx_core::utils::reverse_complement;
use genfx_effect::VariantEffect;

use crate::utils::{effect_transcript, reference_prefix};

/// Sequences longer than this are left out of `del`, `ins` and `dup` notation.
pub const MAX_SEQUENCE_LEN: usize = 100;

fn mrna(tr: &TranscriptView<'_>, pos: Pos) -> Option<Pos> {
    tr.base_number_mrna(pos).map(|n| n as Pos)
}

///
/// `c.`, `n.` or `g.` notation of one [`VariantEffect`].
///
/// ```
/// use genfx_core::config::{Config, HgvsConfig};
/// use genfx_core::models::{GenomeBuilder, Strand, Variant};
/// use genfx_effect::{EffectType, VariantEffect};
/// use genfx_hgvs::HgvsDna;
///
/// let mut b = GenomeBuilder::new("demo");
/// b.add_chromosome("chr1", "CCCCCATGAAATAACCCCC", false).unwrap();
/// let gene = b.add_gene("chr1", 5, 13, Strand::Plus, "G1", "GENE1").unwrap();
/// let tr = b.add_transcript(gene, 5, 13, "T1").unwrap();
/// b.add_exon(tr, 5, 13).unwrap();
/// b.add_cds(tr, 5, 13).unwrap();
/// let genome = b.build(&Config::default()).unwrap();
///
/// let effect = VariantEffect::new(&Variant::new("chr1", 9, "A", "G"), Some(tr), EffectType::Exon);
/// let config = HgvsConfig::default();
/// assert_eq!(HgvsDna::new(&genome, &effect, &config).to_hgvs().unwrap(), "c.5A>G");
/// ```
///
#[derive(Debug, Clone)]
pub struct HgvsDna<'a> {
    genome: &'a Genome,
    variant: &'a Variant,
    tr: Option<TranscriptView<'a>>,
    config: &'a HgvsConfig,
    plus: bool,
}

impl<'a> HgvsDna<'a> {
    pub fn new(genome: &'a Genome, effect: &'a VariantEffect, config: &'a HgvsConfig) -> Self {
        let tr = effect_transcript(genome, effect);
        let plus = tr.is_none_or(|t| !t.is_minus());
        HgvsDna {
            genome,
            variant: &effect.variant,
            tr,
            config,
            plus,
        }
    }

    ///
    /// Is an insertion a copy of the bases right before it (5' of it on the
    /// transcript)?
    ///
    pub fn is_duplication(&self) -> bool {
        let v = self.variant;
        if !v.is_ins() {
            return false;
        }

        let len = v.alt.len() as Pos;
        let (start, end) = if self.plus {
            ((v.start - len).max(0), v.start - 1)
        } else {
            (v.start, v.start + len - 1)
        };
        self.genome
            .sequence(&v.chromosome, start, end)
            .is_some_and(|seq| seq.eq_ignore_ascii_case(&v.alt))
    }

    /// HGVS string, `None` for non-variants or positions that cannot be numbered.
    pub fn to_hgvs(&self) -> Option<String> {
        let v = self.variant;
        let duplication = self.is_duplication();

        let (kind, prefix, suffix) = match v.variant_type {
            VariantType::Ins if duplication => ("dup", String::new(), ""),
            VariantType::Ins => ("ins", String::new(), ""),
            VariantType::Del => ("del", String::new(), ""),
            VariantType::Dup => ("dup", String::new(), ""),
            VariantType::Inv => ("inv", String::new(), ""),
            VariantType::Snp | VariantType::Mnp | VariantType::Mixed => ("", String::new(), ""),
            VariantType::Bnd => ("", self.translocation_prefix(), ")"),
            VariantType::Interval | VariantType::None => return None,
        };

        let pos = self.positions(duplication)?;
        let reference = self.reference();

        // c.G123T instead of c.123G>T
        if self.config.old_nomenclature && kind.is_empty() && !v.is_bnd() {
            return Some(format!(
                "{}{}{}{}{}",
                reference,
                self.strand_seq(&v.reference),
                pos,
                self.strand_seq(&v.alt),
                suffix
            ));
        }

        Some(format!("{}{}{}{}{}{}", prefix, reference, pos, kind, self.base_change(), suffix))
    }

    fn reference(&self) -> String {
        let kind = match &self.tr {
            None => "g.",
            Some(tr) if tr.is_protein_coding() => "c.",
            Some(_) => "n.",
        };
        reference_prefix(self.tr.as_ref(), kind, self.config)
    }

    fn strand_seq(&self, seq: &str) -> String {
        if self.plus {
            seq.to_string()
        } else {
            reverse_complement(seq)
        }
    }

    fn base_change(&self) -> String {
        let v = self.variant;
        match v.variant_type {
            VariantType::Snp => format!("{}>{}", self.strand_seq(&v.reference), self.strand_seq(&v.alt)),
            VariantType::Mnp | VariantType::Mixed => {
                format!("del{}ins{}", self.strand_seq(&v.reference), self.strand_seq(&v.alt))
            }
            VariantType::Ins | VariantType::Del | VariantType::Dup => {
                let change = v.net_change(!self.plus);
                if change.len() > MAX_SEQUENCE_LEN {
                    String::new()
                } else {
                    change
                }
            }
            _ => String::new(),
        }
    }

    /// `t(chrA;chrB)(bandA;bandB)(`
    fn translocation_prefix(&self) -> String {
        let v = self.variant;
        let (mate_chr, mate_pos) = match &v.breakend {
            Some(b) => (b.chromosome.as_str(), b.position),
            None => (v.chromosome.as_str(), v.end),
        };

        let bands = self.genome.cytobands();
        let band = |chr: &str, pos: Pos| -> String { bands.find(chr, pos).map(|b| b.name.clone()).unwrap_or_default() };

        format!(
            "t({};{})({};{})(",
            v.chromosome,
            mate_chr,
            band(&v.chromosome, v.start),
            band(mate_chr, mate_pos)
        )
    }

    /// First and last affected base, in transcription order.
    fn positions(&self, duplication: bool) -> Option<String> {
        let v = self.variant;
        let (start, end) = match v.variant_type {
            VariantType::Snp => {
                let p = if self.plus { v.start } else { v.end };
                (p, p)
            }
            VariantType::Ins => self.insertion_positions(duplication),
            VariantType::Mnp
            | VariantType::Del
            | VariantType::Dup
            | VariantType::Inv
            | VariantType::Mixed
            | VariantType::Bnd => {
                if self.plus {
                    (v.start, v.end)
                } else {
                    (v.end, v.start)
                }
            }
            VariantType::Interval | VariantType::None => return None,
        };

        if start == end {
            return self.pos(start);
        }
        Some(format!("{}_{}", self.pos(start)?, self.pos(end)?))
    }

    ///
    /// Insertions name both flanking bases. Duplications name the copied
    /// bases instead, a single one when only one base is duplicated.
    ///
    fn insertion_positions(&self, duplication: bool) -> (Pos, Pos) {
        let p = self.variant.start;
        let len = self.variant.alt.len() as Pos;
        match (duplication, self.plus) {
            (true, true) if len == 1 => (p - 1, p - 1),
            (true, false) if len == 1 => (p, p),
            (true, true) => (p - len, p - 1),
            (true, false) => (p + len - 1, p),
            (false, true) => (p - 1, p),
            (false, false) => (p, p - 1),
        }
    }

    fn pos(&self, pos: Pos) -> Option<String> {
        let Some(tr) = &self.tr else {
            return Some((pos + 1).to_string());
        };

        if tr.find_exon(pos).is_some() {
            return self.pos_exon(tr, pos);
        }
        if let Some(intron) = tr.find_intron(pos) {
            return self.pos_intron(tr, pos, intron);
        }
        if self.is_downstream(tr, pos) {
            return self.pos_downstream(tr, pos);
        }
        if self.is_upstream(tr, pos) {
            return self.pos_upstream(tr, pos);
        }

        debug!("No HGVS position for {}:{} on '{}'", tr.marker.chromosome, pos, tr.transcript_id());
        None
    }

    fn pos_exon(&self, tr: &TranscriptView<'_>, pos: Pos) -> Option<String> {
        if tr.is_utr3(pos) {
            let idx = (mrna(tr, pos)? - mrna(tr, tr.cds_end())?).abs();
            return (idx > 0).then(|| format!("*{}", idx));
        }
        if tr.is_utr5(pos) {
            let idx = (mrna(tr, pos)? - mrna(tr, tr.cds_start())?).abs();
            return (idx > 0).then(|| format!("-{}", idx));
        }
        tr.base_number_cds(pos, false).map(|n| (n + 1).to_string())
    }

    ///
    /// Offset from the closest exonic base. The central base of an intron
    /// with an odd length is the last one numbered with `+`.
    ///
    fn pos_intron(&self, tr: &TranscriptView<'_>, pos: Pos, intron: &Marker) -> Option<String> {
        let dist_left = (pos - intron.start).max(0) + 1;
        let dist_right = (intron.end - pos).max(0) + 1;

        let (exon_pos, sign) = if dist_left < dist_right {
            (intron.start - 1, if self.plus { "+" } else { "-" })
        } else if dist_right < dist_left {
            (intron.end + 1, if self.plus { "-" } else { "+" })
        } else if self.plus {
            (intron.start - 1, "+")
        } else {
            (intron.end + 1, "+")
        };

        let distance = (exon_pos - pos).abs();
        let offset = if distance > 0 {
            format!("{}{}", sign, distance)
        } else {
            String::new()
        };

        if tr.in_cds(exon_pos) {
            let base = tr.base_number_cds(exon_pos, false)? + 1;
            return Some(format!("{}{}", base, offset));
        }

        // exonic anchor in a UTR
        let (cds_edge, utr) = if exon_pos < tr.cds_min() {
            (tr.cds_min(), if self.plus { "-" } else { "*" })
        } else {
            (tr.cds_max(), if self.plus { "*" } else { "-" })
        };
        let utr_distance = (mrna(tr, cds_edge)? - mrna(tr, exon_pos)?).abs();
        Some(format!("{}{}{}", utr, utr_distance, offset))
    }

    fn is_upstream(&self, tr: &TranscriptView<'_>, pos: Pos) -> bool {
        if self.plus {
            pos < tr.marker.start
        } else {
            tr.marker.end < pos
        }
    }

    fn is_downstream(&self, tr: &TranscriptView<'_>, pos: Pos) -> bool {
        if self.plus {
            tr.marker.end < pos
        } else {
            pos < tr.marker.start
        }
    }

    /// Upstream bases continue the 5'UTR numbering.
    fn pos_upstream(&self, tr: &TranscriptView<'_>, pos: Pos) -> Option<String> {
        let tr_start = if self.plus { tr.marker.start } else { tr.marker.end };
        let idx = mrna(tr, tr.cds_start())? + (pos - tr_start).abs();
        (idx > 0).then(|| format!("-{}", idx))
    }

    /// Downstream bases continue the 3'UTR numbering.
    fn pos_downstream(&self, tr: &TranscriptView<'_>, pos: Pos) -> Option<String> {
        let tr_end = if self.plus { tr.marker.end } else { tr.marker.start };
        let idx = (mrna(tr, tr_end)? - mrna(tr, tr.cds_end())?).abs() + (pos - tr_end).abs();
        Some(format!("*{}", idx))
    }
}
