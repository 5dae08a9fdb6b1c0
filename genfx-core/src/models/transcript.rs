use super::genome::Genome;
use super::marker::{Located, Marker, MarkerId, MarkerKind, Pos, Strand, TranscriptData};
use crate::codon_table::{CODON_SIZE, CodonTable};

///
/// Read-only, strand aware view over a transcript and its children.
///
/// Exons and introns are stored in genomic order. [`genomic_order`](Self::genomic_order)
/// and [`transcription_order`](Self::transcription_order) make the iteration
/// order explicit at every call site.
///
#[derive(Debug, Clone, Copy)]
pub struct TranscriptView<'g> {
    pub genome: &'g Genome,
    pub id: MarkerId,
    pub marker: &'g Marker,
    pub data: &'g TranscriptData,
}

impl<'g> TranscriptView<'g> {
    pub fn new(genome: &'g Genome, id: MarkerId) -> Option<Self> {
        let marker = genome.get(id)?;
        let data = marker.as_transcript()?;
        Some(TranscriptView {
            genome,
            id,
            marker,
            data,
        })
    }

    pub fn strand(&self) -> Strand {
        self.marker.strand
    }

    pub fn is_minus(&self) -> bool {
        self.marker.is_minus()
    }

    pub fn transcript_id(&self) -> &'g str {
        &self.marker.id
    }

    pub fn version(&self) -> Option<&'g str> {
        self.data.version.as_deref()
    }

    pub fn gene(&self) -> Option<&'g Marker> {
        self.genome.gene_of(self.id)
    }

    pub fn is_protein_coding(&self) -> bool {
        self.data.protein_coding
    }

    pub fn codon_table(&self) -> &'static CodonTable {
        self.genome.codon_table(&self.marker.chromosome)
    }

    pub fn cds(&self) -> &'g str {
        &self.data.cds
    }

    pub fn protein(&self) -> &'g str {
        &self.data.protein
    }

    /// First coding base in transcription direction.
    pub fn cds_start(&self) -> Pos {
        self.data.cds_start
    }

    /// Last coding base in transcription direction.
    pub fn cds_end(&self) -> Pos {
        self.data.cds_end
    }

    pub fn cds_min(&self) -> Pos {
        self.data.cds_start.min(self.data.cds_end)
    }

    pub fn cds_max(&self) -> Pos {
        self.data.cds_start.max(self.data.cds_end)
    }

    fn ordered(&self, ids: &'g [MarkerId], reverse: bool) -> Vec<&'g Marker> {
        let mut markers: Vec<&'g Marker> = ids.iter().filter_map(|&id| self.genome.get(id)).collect();
        if reverse {
            markers.reverse();
        }
        markers
    }

    pub fn genomic_order(&self) -> Vec<&'g Marker> {
        self.ordered(&self.data.exons, false)
    }

    pub fn transcription_order(&self) -> Vec<&'g Marker> {
        self.ordered(&self.data.exons, self.is_minus())
    }

    pub fn introns_genomic_order(&self) -> Vec<&'g Marker> {
        self.ordered(&self.data.introns, false)
    }

    pub fn introns_transcription_order(&self) -> Vec<&'g Marker> {
        self.ordered(&self.data.introns, self.is_minus())
    }

    pub fn exon_ids(&self) -> &'g [MarkerId] {
        &self.data.exons
    }

    pub fn utrs(&self) -> Vec<&'g Marker> {
        self.ordered(&self.data.utrs, false)
    }

    pub fn splice_sites(&self) -> impl Iterator<Item = (MarkerId, &'g Marker)> + 'g {
        let genome = self.genome;
        self.data
            .splice_sites
            .iter()
            .filter_map(move |&id| genome.get(id).map(|m| (id, m)))
    }

    pub fn find_exon(&self, pos: Pos) -> Option<&'g Marker> {
        self.genomic_order().into_iter().find(|e| e.intersects_range(pos, pos))
    }

    pub fn find_exon_id(&self, pos: Pos) -> Option<MarkerId> {
        self.data
            .exons
            .iter()
            .copied()
            .find(|&id| self.genome[id].intersects_range(pos, pos))
    }

    pub fn find_intron(&self, pos: Pos) -> Option<&'g Marker> {
        self.introns_genomic_order()
            .into_iter()
            .find(|i| i.intersects_range(pos, pos))
    }

    pub fn is_utr5(&self, pos: Pos) -> bool {
        self.utrs()
            .iter()
            .any(|u| u.kind() == MarkerKind::Utr5Prime && u.intersects_range(pos, pos))
    }

    pub fn is_utr3(&self, pos: Pos) -> bool {
        self.utrs()
            .iter()
            .any(|u| u.kind() == MarkerKind::Utr3Prime && u.intersects_range(pos, pos))
    }

    /// Is `pos` before the CDS start in transcription direction?
    pub fn is_before_cds(&self, pos: Pos) -> bool {
        if self.is_minus() {
            pos > self.cds_start()
        } else {
            pos < self.cds_start()
        }
    }

    /// Is `pos` after the CDS end in transcription direction?
    pub fn is_after_cds(&self, pos: Pos) -> bool {
        if self.is_minus() {
            pos < self.cds_end()
        } else {
            pos > self.cds_end()
        }
    }

    pub fn in_cds(&self, pos: Pos) -> bool {
        self.cds_min() <= pos && pos <= self.cds_max()
    }

    /// Coding bases of an exon, as a genomic range.
    pub fn coding_range(&self, exon: &Marker) -> Option<(Pos, Pos)> {
        let start = exon.start.max(self.cds_min());
        let end = exon.end.min(self.cds_max());
        (start <= end).then_some((start, end))
    }

    ///
    /// 0-based CDS base number of a genomic position.
    ///
    /// Intronic positions map to the next coding base, or to the previous one
    /// when `use_prev_base_intron` is set. Positions outside the CDS give `None`.
    ///
    pub fn base_number_cds(&self, pos: Pos, use_prev_base_intron: bool) -> Option<usize> {
        if !self.in_cds(pos) {
            return None;
        }

        let minus = self.is_minus();
        let cds_start = self.cds_start();
        let mut first_cds_base_in_exon: Pos = 0;
        for exon in self.transcription_order() {
            if exon.intersects_range(pos, pos) {
                let in_exon = if minus {
                    exon.end.min(cds_start) - pos
                } else {
                    pos - exon.start.max(cds_start)
                };
                return usize::try_from(first_cds_base_in_exon + in_exon.max(0)).ok();
            }

            let before = if minus { pos > exon.end } else { pos < exon.start };
            if before {
                let base = first_cds_base_in_exon - if use_prev_base_intron { 1 } else { 0 };
                return usize::try_from(base).ok();
            }

            let coding = if minus {
                cds_start.min(exon.end) - exon.start + 1
            } else {
                exon.end - exon.start.max(cds_start) + 1
            };
            first_cds_base_in_exon += coding.max(0);
        }

        usize::try_from(first_cds_base_in_exon - 1).ok()
    }

    /// Genomic position of a 0-based CDS base.
    pub fn cds_base_to_pos(&self, cds_base: usize) -> Option<Pos> {
        let mut remaining = cds_base as Pos;
        for exon in self.transcription_order() {
            let Some((start, end)) = self.coding_range(exon) else {
                continue;
            };
            let len = end - start + 1;
            if remaining < len {
                return Some(if self.is_minus() { end - remaining } else { start + remaining });
            }
            remaining -= len;
        }
        None
    }

    /// 0-based mRNA base number of an exonic position.
    pub fn base_number_mrna(&self, pos: Pos) -> Option<usize> {
        let mut count: Pos = 0;
        for exon in self.transcription_order() {
            if exon.intersects_range(pos, pos) {
                let offset = if self.is_minus() { exon.end - pos } else { pos - exon.start };
                return usize::try_from(count + offset).ok();
            }
            count += exon.size();
        }
        None
    }

    /// Number of exonic bases.
    pub fn mrna_len(&self) -> Pos {
        self.genomic_order().iter().map(|e| e.size()).sum()
    }

    /// mRNA sequence in transcription direction, empty when any exon lacks a sequence.
    pub fn mrna(&self) -> String {
        let mut seq = String::new();
        for exon in self.genomic_order() {
            match exon.as_exon() {
                Some(e) if e.sequence.len() as Pos == exon.size() => seq.push_str(&e.sequence),
                _ => return String::new(),
            }
        }
        if self.is_minus() {
            crate::utils::reverse_complement(&seq)
        } else {
            seq
        }
    }

    pub fn has_start_codon(&self) -> bool {
        self.codon_table().is_start_first(self.cds())
    }

    pub fn has_stop_codon(&self) -> bool {
        let cds = self.cds();
        let n = cds.len() / CODON_SIZE * CODON_SIZE;
        n >= CODON_SIZE && self.codon_table().is_stop(&cds[n - CODON_SIZE..n])
    }

    /// CDS length is not a multiple of three.
    pub fn is_incomplete(&self) -> bool {
        !self.cds().is_empty() && self.cds().len() % CODON_SIZE != 0
    }

    /// A stop codon appears before the last amino acid.
    pub fn has_multiple_stop_codons(&self) -> bool {
        let protein = self.protein();
        match protein.char_indices().last() {
            Some((last, _)) => protein[..last].contains('*'),
            None => false,
        }
    }
}
