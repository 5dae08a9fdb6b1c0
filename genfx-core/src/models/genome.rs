use std::ops::Index;

use fxhash::FxHashMap;
use log::{debug, info};

use super::cytoband::{Cytoband, Cytobands};
use super::interval::Interval;
use super::marker::{
    ChromosomeData, ExonData, Feature, GeneData, IntronData, Located, Marker, MarkerId, MarkerKind, Pos, Strand,
    TranscriptData,
};
use super::transcript::TranscriptView;
use crate::circular::CircularCorrection;
use crate::codon_table::{CodonTable, CodonTableKind};
use crate::config::{CircularConfig, Config, PredictorConfig};
use crate::errors::{GenomeError, GenomeResult};
use crate::utils::{reverse_complement, sanitize_bases};

///
/// Immutable, fully annotated genome: an arena of markers addressed by [`MarkerId`].
///
/// Build one with [`GenomeBuilder`].
///
#[derive(Debug, Clone)]
pub struct Genome {
    pub name: String,
    markers: Vec<Marker>,
    chromosomes: FxHashMap<String, MarkerId>,
    chromosome_order: Vec<MarkerId>,
    genes: Vec<MarkerId>,
    cytobands: Cytobands,
    /// Exons carrying their full sequence, per chromosome, sorted by start.
    sequence_index: FxHashMap<String, Vec<MarkerId>>,
}

impl Index<MarkerId> for Genome {
    type Output = Marker;

    fn index(&self, id: MarkerId) -> &Marker {
        &self.markers[id.0]
    }
}

/// Slice `[start, end]` out of a chromosome, wrapping around the origin of circular ones.
fn chromosome_slice(data: &ChromosomeData, start: Pos, end: Pos) -> Option<String> {
    let seq = data.sequence.as_deref()?;
    let len = seq.len() as Pos;
    if start > end {
        return None;
    }
    if start >= 0 && end < len {
        return Some(seq[start as usize..=end as usize].to_string());
    }
    if !data.circular || len == 0 {
        return None;
    }
    let bytes = seq.as_bytes();
    Some((start..=end).map(|p| bytes[p.rem_euclid(len) as usize] as char).collect())
}

impl Genome {
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(id.0)
    }

    pub fn chromosome_id(&self, name: &str) -> Option<MarkerId> {
        self.chromosomes.get(name).copied()
    }

    pub fn chromosome(&self, name: &str) -> Option<&Marker> {
        self.chromosome_id(name).and_then(|id| self.get(id))
    }

    /// Chromosome ids in the order they were added.
    pub fn chromosome_ids(&self) -> &[MarkerId] {
        &self.chromosome_order
    }

    fn chromosome_data(&self, name: &str) -> Option<&ChromosomeData> {
        self.chromosome(name).and_then(|m| m.as_chromosome())
    }

    /// Length of a chromosome, 0 if it is unknown.
    pub fn chromosome_length(&self, name: &str) -> Pos {
        self.chromosome_data(name).map_or(0, |c| c.length)
    }

    pub fn is_circular(&self, name: &str) -> bool {
        self.chromosome_data(name).is_some_and(|c| c.circular)
    }

    pub fn codon_table(&self, chromosome: &str) -> &'static CodonTable {
        self.chromosome_data(chromosome)
            .map_or(CodonTableKind::Standard, |c| c.codon_table)
            .table()
    }

    pub fn genes(&self) -> &[MarkerId] {
        &self.genes
    }

    /// Every transcript id, grouped by gene.
    pub fn transcripts(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.genes
            .iter()
            .filter_map(|&g| self[g].as_gene())
            .flat_map(|g| g.transcripts.iter().copied())
    }

    pub fn transcript(&self, id: MarkerId) -> Option<TranscriptView<'_>> {
        TranscriptView::new(self, id)
    }

    pub fn parent(&self, id: MarkerId) -> Option<MarkerId> {
        self.get(id)?.parent
    }

    /// Walk up the parent chain until a marker of `kind` is found.
    pub fn ancestor(&self, id: MarkerId, kind: MarkerKind) -> Option<MarkerId> {
        let mut current = Some(id);
        while let Some(cur) = current {
            if self.get(cur)?.kind() == kind {
                return Some(cur);
            }
            current = self.parent(cur);
        }
        None
    }

    pub fn gene_of(&self, id: MarkerId) -> Option<&Marker> {
        self.ancestor(id, MarkerKind::Gene).map(|g| &self[g])
    }

    pub fn cytobands(&self) -> &Cytobands {
        &self.cytobands
    }

    ///
    /// Smallest known sequence that contains `[start, end]`: the chromosome
    /// sequence if available, otherwise the sequence of an exon covering the
    /// range. Returns the genomic position of the first base together with
    /// the sequence.
    ///
    pub fn sequence_region(&self, chromosome: &str, start: Pos, end: Pos) -> Option<(Pos, &str)> {
        if let Some(seq) = self.chromosome_data(chromosome).and_then(|c| c.sequence.as_deref()) {
            if start >= 0 && end < seq.len() as Pos {
                return Some((0, seq));
            }
        }

        let ids = self.sequence_index.get(chromosome)?;
        let candidates = ids.partition_point(|&id| self[id].start <= start);
        ids[..candidates]
            .iter()
            .map(|&id| &self[id])
            .filter(|m| end <= m.end)
            .filter_map(|m| m.as_exon().map(|exon| (m.start, exon.sequence.as_str())))
            .min_by_key(|(_, seq)| seq.len())
    }

    /// Forward strand sequence of `[start, end]`, if known.
    pub fn sequence(&self, chromosome: &str, start: Pos, end: Pos) -> Option<String> {
        if start > end {
            return None;
        }
        if let Some((offset, seq)) = self.sequence_region(chromosome, start, end) {
            let from = (start - offset) as usize;
            let to = (end - offset) as usize;
            return seq.get(from..=to).map(str::to_string);
        }
        self.chromosome_data(chromosome)
            .and_then(|c| chromosome_slice(c, start, end))
    }
}

///
/// Collects chromosomes, genes, transcripts and their segments and turns
/// them into a finished [`Genome`].
///
#[derive(Debug, Default)]
pub struct GenomeBuilder {
    name: String,
    markers: Vec<Marker>,
    chromosomes: FxHashMap<String, MarkerId>,
    chromosome_order: Vec<MarkerId>,
    genes: Vec<MarkerId>,
    cytobands: Cytobands,
}

impl GenomeBuilder {
    pub fn new(name: &str) -> Self {
        GenomeBuilder {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn push(&mut self, marker: Marker) -> MarkerId {
        let id = MarkerId(self.markers.len());
        self.markers.push(marker);
        id
    }

    fn push_child(&mut self, parent: MarkerId, start: Pos, end: Pos, id: String, feature: Feature) -> MarkerId {
        let (chromosome, strand) = {
            let p = &self.markers[parent.0];
            (p.chromosome.clone(), p.strand)
        };
        self.push(Marker {
            chromosome,
            start,
            end,
            strand,
            id,
            parent: Some(parent),
            feature,
        })
    }

    fn marker_of_kind(&self, id: MarkerId, expected: MarkerKind) -> GenomeResult<&Marker> {
        let marker = self.markers.get(id.0).ok_or(GenomeError::UnknownMarker(id))?;
        let found = marker.kind();
        if found != expected {
            return Err(GenomeError::WrongKind { id, expected, found });
        }
        Ok(marker)
    }

    fn chromosome_mut(&mut self, name: &str) -> GenomeResult<&mut ChromosomeData> {
        let id = *self
            .chromosomes
            .get(name)
            .ok_or_else(|| GenomeError::UnknownChromosome(name.to_string()))?;
        match &mut self.markers[id.0].feature {
            Feature::Chromosome(data) => Ok(data),
            other => Err(GenomeError::WrongKind {
                id,
                expected: MarkerKind::Chromosome,
                found: other.kind(),
            }),
        }
    }

    fn gene_mut(&mut self, id: MarkerId) -> GenomeResult<&mut GeneData> {
        self.marker_of_kind(id, MarkerKind::Gene)?;
        match &mut self.markers[id.0].feature {
            Feature::Gene(data) => Ok(data),
            _ => Err(GenomeError::UnknownMarker(id)),
        }
    }

    fn transcript_mut(&mut self, id: MarkerId) -> GenomeResult<&mut TranscriptData> {
        self.marker_of_kind(id, MarkerKind::Transcript)?;
        match &mut self.markers[id.0].feature {
            Feature::Transcript(data) => Ok(data),
            _ => Err(GenomeError::UnknownMarker(id)),
        }
    }

    fn exon_mut(&mut self, id: MarkerId) -> Option<&mut ExonData> {
        match &mut self.markers.get_mut(id.0)?.feature {
            Feature::Exon(data) => Some(data),
            _ => None,
        }
    }

    fn transcript(&self, id: MarkerId) -> Option<&TranscriptData> {
        self.markers.get(id.0)?.as_transcript()
    }

    /// Add a chromosome together with its full sequence.
    pub fn add_chromosome(&mut self, name: &str, sequence: &str, circular: bool) -> GenomeResult<MarkerId> {
        let sequence = sanitize_bases(sequence);
        let length = sequence.len() as Pos;
        self.insert_chromosome(name, Some(sequence), length, circular)
    }

    /// Add a chromosome whose sequence is not available.
    pub fn add_chromosome_length(&mut self, name: &str, length: Pos, circular: bool) -> GenomeResult<MarkerId> {
        if length < 0 {
            return Err(GenomeError::NegativeLength {
                id: name.to_string(),
                length,
            });
        }
        self.insert_chromosome(name, None, length, circular)
    }

    fn insert_chromosome(
        &mut self,
        name: &str,
        sequence: Option<String>,
        length: Pos,
        circular: bool,
    ) -> GenomeResult<MarkerId> {
        if self.chromosomes.contains_key(name) {
            return Err(GenomeError::DuplicateChromosome(name.to_string()));
        }
        let id = self.push(Marker {
            chromosome: name.to_string(),
            start: 0,
            end: (length - 1).max(0),
            strand: Strand::Plus,
            id: name.to_string(),
            parent: None,
            feature: Feature::Chromosome(ChromosomeData {
                sequence,
                circular,
                length,
                codon_table: CodonTableKind::Standard,
            }),
        });
        self.chromosomes.insert(name.to_string(), id);
        self.chromosome_order.push(id);
        Ok(id)
    }

    pub fn set_codon_table(&mut self, chromosome: &str, kind: CodonTableKind) -> GenomeResult<()> {
        self.chromosome_mut(chromosome)?.codon_table = kind;
        Ok(())
    }

    pub fn add_gene(
        &mut self,
        chromosome: &str,
        start: Pos,
        end: Pos,
        strand: Strand,
        id: &str,
        name: &str,
    ) -> GenomeResult<MarkerId> {
        let chr = *self
            .chromosomes
            .get(chromosome)
            .ok_or_else(|| GenomeError::UnknownChromosome(chromosome.to_string()))?;
        let gene = self.push(Marker {
            chromosome: chromosome.to_string(),
            start,
            end,
            strand,
            id: id.to_string(),
            parent: Some(chr),
            feature: Feature::Gene(GeneData {
                name: name.to_string(),
                ..Default::default()
            }),
        });
        self.genes.push(gene);
        Ok(gene)
    }

    pub fn set_biotype(&mut self, gene: MarkerId, biotype: &str) -> GenomeResult<()> {
        self.gene_mut(gene)?.biotype = Some(biotype.to_string());
        Ok(())
    }

    pub fn add_transcript(&mut self, gene: MarkerId, start: Pos, end: Pos, id: &str) -> GenomeResult<MarkerId> {
        self.marker_of_kind(gene, MarkerKind::Gene)?;
        let tr = self.push_child(gene, start, end, id.to_string(), Feature::Transcript(TranscriptData::default()));
        self.gene_mut(gene)?.transcripts.push(tr);
        Ok(tr)
    }

    pub fn set_version(&mut self, transcript: MarkerId, version: &str) -> GenomeResult<()> {
        self.transcript_mut(transcript)?.version = Some(version.to_string());
        Ok(())
    }

    pub fn set_protein_coding(&mut self, transcript: MarkerId, protein_coding: bool) -> GenomeResult<()> {
        self.transcript_mut(transcript)?.protein_coding = protein_coding;
        Ok(())
    }

    pub fn set_canonical(&mut self, transcript: MarkerId) -> GenomeResult<()> {
        self.transcript_mut(transcript)?.canonical = true;
        Ok(())
    }

    pub fn add_exon(&mut self, transcript: MarkerId, start: Pos, end: Pos) -> GenomeResult<MarkerId> {
        self.add_exon_with_sequence(transcript, start, end, "")
    }

    /// Add an exon with an explicit forward strand sequence.
    pub fn add_exon_with_sequence(
        &mut self,
        transcript: MarkerId,
        start: Pos,
        end: Pos,
        sequence: &str,
    ) -> GenomeResult<MarkerId> {
        let tr = self.marker_of_kind(transcript, MarkerKind::Transcript)?;
        let n = tr.as_transcript().map_or(0, |t| t.exons.len());
        let id = format!("{}_exon_{}", tr.id, n + 1);
        let exon = self.push_child(
            transcript,
            start,
            end,
            id,
            Feature::Exon(ExonData {
                sequence: sanitize_bases(sequence),
                ..Default::default()
            }),
        );
        self.transcript_mut(transcript)?.exons.push(exon);
        Ok(exon)
    }

    /// Add a coding segment. Marks the transcript as protein coding.
    pub fn add_cds(&mut self, transcript: MarkerId, start: Pos, end: Pos) -> GenomeResult<MarkerId> {
        let tr = self.marker_of_kind(transcript, MarkerKind::Transcript)?;
        let id = format!("{}_cds", tr.id);
        let cds = self.push_child(transcript, start, end, id, Feature::Cds);
        let data = self.transcript_mut(transcript)?;
        data.cds_segments.push(cds);
        data.protein_coding = true;
        Ok(cds)
    }

    pub fn add_utr5(&mut self, transcript: MarkerId, start: Pos, end: Pos) -> GenomeResult<MarkerId> {
        self.add_utr(transcript, start, end, Feature::Utr5Prime)
    }

    pub fn add_utr3(&mut self, transcript: MarkerId, start: Pos, end: Pos) -> GenomeResult<MarkerId> {
        self.add_utr(transcript, start, end, Feature::Utr3Prime)
    }

    fn add_utr(&mut self, transcript: MarkerId, start: Pos, end: Pos, feature: Feature) -> GenomeResult<MarkerId> {
        let tr = self.marker_of_kind(transcript, MarkerKind::Transcript)?;
        let id = format!("{}_utr", tr.id);
        let utr = self.push_child(transcript, start, end, id, feature);
        self.transcript_mut(transcript)?.utrs.push(utr);
        Ok(utr)
    }

    pub fn add_cytoband(&mut self, chromosome: &str, start: Pos, end: Pos, name: &str) {
        self.cytobands.add(Cytoband {
            chromosome: chromosome.to_string(),
            start,
            end,
            name: name.to_string(),
        });
    }

    ///
    /// Finish the genome: correct circular coordinates, validate, then derive
    /// exon ranks and frames, CDS and protein sequences, introns, splice sites,
    /// UTRs, upstream/downstream regions and canonical transcripts.
    ///
    pub fn build(mut self, config: &Config) -> GenomeResult<Genome> {
        let transcripts: Vec<MarkerId> = self
            .markers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind() == MarkerKind::Transcript)
            .map(|(i, _)| MarkerId(i))
            .collect();

        for &tr in &transcripts {
            self.correct_circular(tr, &config.circular)?;
        }

        self.validate()?;

        for &tr in &transcripts {
            self.sort_and_rank(tr);
            self.exon_sequences(tr)?;
            self.cds_start_end(tr);
            self.derive_utrs(tr);
            self.cds_sequence(tr);
            self.exon_frames(tr);
            self.introns(tr);
            self.splice_sites(tr, &config.predictor);
            self.up_down_stream(tr, config.predictor.up_down_stream_length);
        }

        self.select_canonical();
        let sequence_index = self.sequence_index();

        info!(
            "Genome '{}' built: {} chromosomes, {} genes, {} transcripts, {} markers",
            self.name,
            self.chromosome_order.len(),
            self.genes.len(),
            transcripts.len(),
            self.markers.len()
        );

        Ok(Genome {
            name: self.name,
            markers: self.markers,
            chromosomes: self.chromosomes,
            chromosome_order: self.chromosome_order,
            genes: self.genes,
            cytobands: self.cytobands,
            sequence_index,
        })
    }

    fn sequence_index(&self) -> FxHashMap<String, Vec<MarkerId>> {
        let mut index: FxHashMap<String, Vec<MarkerId>> = FxHashMap::default();
        for (i, m) in self.markers.iter().enumerate() {
            if m.as_exon().is_some_and(|e| !e.sequence.is_empty() && e.sequence.len() as Pos == m.size()) {
                index.entry(m.chromosome.clone()).or_default().push(MarkerId(i));
            }
        }
        for ids in index.values_mut() {
            ids.sort_by_key(|id| self.markers[id.0].start);
        }
        index
    }

    fn segments(&self, ids: &[MarkerId]) -> Vec<Interval<Pos, MarkerId>> {
        ids.iter()
            .map(|&id| Interval {
                start: self.markers[id.0].start,
                end: self.markers[id.0].end,
                val: id,
            })
            .collect()
    }

    fn correct_circular(&mut self, tr: MarkerId, config: &CircularConfig) -> GenomeResult<()> {
        let (chromosome, cds_ids, exon_ids) = {
            let marker = self.marker_of_kind(tr, MarkerKind::Transcript)?;
            let data = marker.as_transcript().ok_or(GenomeError::UnknownMarker(tr))?;
            (marker.chromosome.clone(), data.cds_segments.clone(), data.exons.clone())
        };
        let (length, circular) = match self.chromosome_mut(&chromosome) {
            Ok(c) => (c.length, c.circular),
            Err(_) => return Err(GenomeError::UnknownChromosome(chromosome)),
        };

        if !circular {
            return Ok(());
        }

        let mut correction = CircularCorrection::new(length).with_large_gap(config.correct_large_gap);
        for ids in [&cds_ids, &exon_ids] {
            let mut segs = self.segments(ids);
            if correction.correct(&mut segs) {
                for seg in segs {
                    let m = &mut self.markers[seg.val.0];
                    m.start = seg.start;
                    m.end = seg.end;
                }
            }
        }

        if !correction.is_corrected() {
            return Ok(());
        }

        let children: Vec<MarkerId> = if exon_ids.is_empty() { cds_ids } else { exon_ids };
        let start = children.iter().map(|id| self.markers[id.0].start).min();
        let end = children.iter().map(|id| self.markers[id.0].end).max();
        if let (Some(start), Some(end)) = (start, end) {
            let m = &mut self.markers[tr.0];
            debug!(
                "Circular correction of transcript '{}': [{}, {}] -> [{}, {}]",
                m.id, m.start, m.end, start, end
            );
            m.start = start;
            m.end = end;
        }
        self.transcript_mut(tr)?.corrected = true;

        if let Some(gene) = self.markers[tr.0].parent {
            let transcripts = self.gene_mut(gene)?.transcripts.clone();
            let start = transcripts.iter().map(|id| self.markers[id.0].start).min();
            let end = transcripts.iter().map(|id| self.markers[id.0].end).max();
            if let (Some(start), Some(end)) = (start, end) {
                let g = &mut self.markers[gene.0];
                g.start = start;
                g.end = end;
            }
        }
        Ok(())
    }

    fn validate(&self) -> GenomeResult<()> {
        for m in &self.markers {
            if m.start > m.end {
                return Err(GenomeError::MalformedInterval {
                    id: m.id.clone(),
                    start: m.start,
                    end: m.end,
                });
            }

            let Some(tr) = m.as_transcript() else {
                continue;
            };

            let chromosome = self.chromosomes.get(&m.chromosome).and_then(|&c| self.markers[c.0].as_chromosome());
            if let Some(chr) = chromosome.filter(|c| c.length > 0) {
                let min = if chr.circular { -chr.length } else { 0 };
                if m.start < min || m.end >= chr.length {
                    return Err(GenomeError::OutOfChromosome {
                        id: m.id.clone(),
                        start: m.start,
                        end: m.end,
                    });
                }
            }

            let exon_len: Pos = tr.exons.iter().map(|id| self.markers[id.0].size()).sum();
            let cds_len: Pos = tr.cds_segments.iter().map(|id| self.markers[id.0].size()).sum();
            if !tr.exons.is_empty() && cds_len > exon_len {
                return Err(GenomeError::CdsLongerThanTranscript {
                    id: m.id.clone(),
                    cds_len: cds_len as usize,
                    exon_len: exon_len as usize,
                });
            }
        }
        Ok(())
    }

    fn sort_and_rank(&mut self, tr: MarkerId) {
        let minus = self.markers[tr.0].is_minus();
        let Some(data) = self.transcript(tr) else {
            return;
        };
        let mut exons = data.exons.clone();
        let mut cds = data.cds_segments.clone();
        let mut utrs = data.utrs.clone();
        for ids in [&mut exons, &mut cds, &mut utrs] {
            ids.sort_by_key(|id| (self.markers[id.0].start, self.markers[id.0].end));
        }

        let n = exons.len();
        for (i, &ex) in exons.iter().enumerate() {
            if let Some(exon) = self.exon_mut(ex) {
                exon.rank = if minus { n - i } else { i + 1 };
            }
        }

        if let Ok(data) = self.transcript_mut(tr) {
            data.exons = exons;
            data.cds_segments = cds;
            data.utrs = utrs;
        }
    }

    fn exon_sequences(&mut self, tr: MarkerId) -> GenomeResult<()> {
        let Some(data) = self.transcript(tr) else {
            return Ok(());
        };
        let exons = data.exons.clone();
        let chromosome = self.markers[tr.0].chromosome.clone();

        for ex in exons {
            let (start, end, size, id, given) = {
                let m = &self.markers[ex.0];
                let given = m.as_exon().map_or(0, |e| e.sequence.len());
                (m.start, m.end, m.size(), m.id.clone(), given)
            };

            if given > 0 {
                if given as Pos != size {
                    return Err(GenomeError::SequenceLengthMismatch {
                        id,
                        expected: size as usize,
                        found: given,
                    });
                }
                continue;
            }

            let seq = self.chromosome_mut(&chromosome).ok().and_then(|c| chromosome_slice(c, start, end));
            if let (Some(seq), Some(exon)) = (seq, self.exon_mut(ex)) {
                exon.sequence = seq;
            }
        }
        Ok(())
    }

    fn cds_start_end(&mut self, tr: MarkerId) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        let minus = m.is_minus();

        let span = |ids: &[MarkerId]| {
            let start = ids.iter().map(|id| self.markers[id.0].start).min();
            let end = ids.iter().map(|id| self.markers[id.0].end).max();
            start.zip(end)
        };

        let (tr_start, tr_end) = span(&data.exons).unwrap_or((m.start, m.end));
        let (cds_start, cds_end) = if let Some((start, end)) = span(&data.cds_segments) {
            if minus { (end, start) } else { (start, end) }
        } else if !data.utrs.is_empty() {
            let (mut cds_start, mut cds_end) = if minus { (tr_end, tr_start) } else { (tr_start, tr_end) };
            for utr in data.utrs.iter().map(|id| &self.markers[id.0]) {
                match (utr.kind(), minus) {
                    (MarkerKind::Utr5Prime, false) => cds_start = cds_start.max(utr.end + 1),
                    (MarkerKind::Utr5Prime, true) => cds_start = cds_start.min(utr.start - 1),
                    (MarkerKind::Utr3Prime, false) => cds_end = cds_end.min(utr.start - 1),
                    (MarkerKind::Utr3Prime, true) => cds_end = cds_end.max(utr.end + 1),
                    _ => {}
                }
            }
            (cds_start, cds_end)
        } else if minus {
            (tr_end, tr_start)
        } else {
            (tr_start, tr_end)
        };

        if let Ok(data) = self.transcript_mut(tr) {
            data.cds_start = cds_start;
            data.cds_end = cds_end;
        }
    }

    fn derive_utrs(&mut self, tr: MarkerId) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        if !data.protein_coding || !data.utrs.is_empty() {
            return;
        }

        let minus = m.is_minus();
        let tr_id = m.id.clone();
        let cds_min = data.cds_start.min(data.cds_end);
        let cds_max = data.cds_start.max(data.cds_end);

        let mut pieces = Vec::new();
        for &ex in &data.exons {
            let e = &self.markers[ex.0];
            if e.start < cds_min {
                let feature = if minus { Feature::Utr3Prime } else { Feature::Utr5Prime };
                pieces.push((e.start, e.end.min(cds_min - 1), feature));
            }
            if e.end > cds_max {
                let feature = if minus { Feature::Utr5Prime } else { Feature::Utr3Prime };
                pieces.push((e.start.max(cds_max + 1), e.end, feature));
            }
        }

        let mut utrs = Vec::with_capacity(pieces.len());
        for (start, end, feature) in pieces {
            utrs.push(self.push_child(tr, start, end, format!("{}_utr", tr_id), feature));
        }
        if let Ok(data) = self.transcript_mut(tr) {
            data.utrs = utrs;
        }
    }

    fn cds_sequence(&mut self, tr: MarkerId) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        if !data.protein_coding || data.exons.is_empty() {
            return;
        }

        let minus = m.is_minus();
        let cds_min = data.cds_start.min(data.cds_end);
        let cds_max = data.cds_start.max(data.cds_end);

        let mut cds = String::new();
        let ordered: Vec<MarkerId> = if minus {
            data.exons.iter().rev().copied().collect()
        } else {
            data.exons.clone()
        };
        for ex in ordered {
            let e = &self.markers[ex.0];
            let start = e.start.max(cds_min);
            let end = e.end.min(cds_max);
            if start > end {
                continue;
            }
            let seq = e.as_exon().map_or("", |x| x.sequence.as_str());
            let Some(part) = seq.get((start - e.start) as usize..=(end - e.start) as usize) else {
                // no sequence for a coding exon
                return;
            };
            if minus {
                cds.push_str(&reverse_complement(part));
            } else {
                cds.push_str(part);
            }
        }

        let table = self
            .chromosomes
            .get(&m.chromosome)
            .and_then(|&c| self.markers[c.0].as_chromosome())
            .map_or(CodonTableKind::Standard, |c| c.codon_table)
            .table();
        let protein = table.protein(&cds);

        if let Ok(data) = self.transcript_mut(tr) {
            data.cds = cds;
            data.protein = protein;
        }
    }

    fn exon_frames(&mut self, tr: MarkerId) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        if !data.protein_coding {
            return;
        }
        let cds_min = data.cds_start.min(data.cds_end);
        let cds_max = data.cds_start.max(data.cds_end);
        let ordered: Vec<MarkerId> = if m.is_minus() {
            data.exons.iter().rev().copied().collect()
        } else {
            data.exons.clone()
        };

        let mut coding_bases: Pos = 0;
        for ex in ordered {
            let e = &self.markers[ex.0];
            let len = e.end.min(cds_max) - e.start.max(cds_min) + 1;
            let frame = (len > 0).then(|| ((3 - coding_bases % 3) % 3) as u8);
            coding_bases += len.max(0);
            if let Some(exon) = self.exon_mut(ex) {
                exon.frame = frame;
            }
        }
    }

    fn introns(&mut self, tr: MarkerId) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        let minus = m.is_minus();
        let tr_id = m.id.clone();

        let gaps: Vec<(Pos, Pos)> = data
            .exons
            .windows(2)
            .map(|pair| (self.markers[pair[0].0].end + 1, self.markers[pair[1].0].start - 1))
            .filter(|(start, end)| start <= end)
            .collect();

        let n = gaps.len();
        let mut introns = Vec::with_capacity(n);
        for (i, (start, end)) in gaps.into_iter().enumerate() {
            let rank = if minus { n - i } else { i + 1 };
            introns.push(self.push_child(
                tr,
                start,
                end,
                format!("{}_intron_{}", tr_id, rank),
                Feature::Intron(IntronData { rank }),
            ));
        }
        if let Ok(data) = self.transcript_mut(tr) {
            data.introns = introns;
        }
    }

    fn splice_sites(&mut self, tr: MarkerId, config: &PredictorConfig) {
        let m = &self.markers[tr.0];
        let Some(data) = m.as_transcript() else {
            return;
        };
        let minus = m.is_minus();

        // (parent, start, end, feature)
        let mut sites: Vec<(MarkerId, Pos, Pos, Feature)> = Vec::new();
        for (k, &intron) in data.introns.iter().enumerate() {
            let i = &self.markers[intron.0];
            let (start, end) = (i.start, i.end);
            let len = i.size();

            // core sites, clamped to the intron
            let size = config.splice_site_size.min(len);
            if size > 0 {
                let (left, right) = if minus {
                    (Feature::SpliceSiteAcceptor, Feature::SpliceSiteDonor)
                } else {
                    (Feature::SpliceSiteDonor, Feature::SpliceSiteAcceptor)
                };
                sites.push((intron, start, start + size - 1, left));
                sites.push((intron, end - size + 1, end, right));
            }

            let (min, max) = (config.splice_region_intron_min, config.splice_region_intron_max);
            if min <= max && min > 0 {
                let (ls, le) = (start + min - 1, (start + max - 1).min(end));
                if ls <= le {
                    sites.push((intron, ls, le, Feature::SpliceSiteRegion));
                }
                let (rs, re) = ((end - max + 1).max(start), end - min + 1);
                if rs <= re {
                    sites.push((intron, rs, re, Feature::SpliceSiteRegion));
                }
            }

            let exon_size = config.splice_region_exon_size;
            if exon_size > 0 {
                // introns are built from consecutive exons in genomic order
                let before = data.exons.iter().copied().find(|&e| self.markers[e.0].end == start - 1);
                let after = data.exons.iter().copied().find(|&e| self.markers[e.0].start == end + 1);
                if let Some(e) = before.or_else(|| data.exons.get(k).copied()) {
                    let ex = &self.markers[e.0];
                    sites.push((e, (ex.end - exon_size + 1).max(ex.start), ex.end, Feature::SpliceSiteRegion));
                }
                if let Some(e) = after.or_else(|| data.exons.get(k + 1).copied()) {
                    let ex = &self.markers[e.0];
                    sites.push((e, ex.start, (ex.start + exon_size - 1).min(ex.end), Feature::SpliceSiteRegion));
                }
            }
        }

        let tr_id = m.id.clone();
        let mut ids = Vec::with_capacity(sites.len());
        for (parent, start, end, feature) in sites {
            let name = match feature {
                Feature::SpliceSiteDonor => "donor",
                Feature::SpliceSiteAcceptor => "acceptor",
                _ => "region",
            };
            ids.push(self.push_child(parent, start, end, format!("{}_{}", tr_id, name), feature));
        }
        if let Ok(data) = self.transcript_mut(tr) {
            data.splice_sites = ids;
        }
    }

    fn up_down_stream(&mut self, tr: MarkerId, length: Pos) {
        if length <= 0 {
            return;
        }
        let m = &self.markers[tr.0];
        let (start, end, minus, tr_id) = (m.start, m.end, m.is_minus(), m.id.clone());
        let (chr_len, circular) = self
            .chromosomes
            .get(&m.chromosome)
            .and_then(|&c| self.markers[c.0].as_chromosome())
            .map_or((0, false), |c| (c.length, c.circular));

        let clamp = |lo: Pos, hi: Pos| -> Option<(Pos, Pos)> {
            let (mut lo, mut hi) = (lo, hi);
            if chr_len > 0 {
                lo = lo.max(if circular { -chr_len } else { 0 });
                hi = hi.min(chr_len - 1);
            } else {
                lo = lo.max(0);
            }
            (lo <= hi).then_some((lo, hi))
        };

        let before = clamp(start - length, start - 1);
        let after = clamp(end + 1, end + length);
        let (up, down) = if minus { (after, before) } else { (before, after) };

        let upstream = up.map(|(s, e)| self.push_child(tr, s, e, format!("{}_upstream", tr_id), Feature::Upstream));
        let downstream =
            down.map(|(s, e)| self.push_child(tr, s, e, format!("{}_downstream", tr_id), Feature::Downstream));
        if let Ok(data) = self.transcript_mut(tr) {
            data.upstream = upstream;
            data.downstream = downstream;
        }
    }

    fn select_canonical(&mut self) {
        for gene in self.genes.clone() {
            let Some(transcripts) = self.markers[gene.0].as_gene().map(|g| g.transcripts.clone()) else {
                continue;
            };

            let flagged = transcripts
                .iter()
                .copied()
                .find(|&t| self.transcript(t).is_some_and(|d| d.canonical));

            let canonical = flagged.or_else(|| {
                transcripts.iter().copied().min_by_key(|&t| {
                    let data = self.transcript(t);
                    let coding = data.is_some_and(|d| d.protein_coding);
                    let cds_len = data.map_or(0, |d| d.cds.len());
                    let mrna_len: Pos = data.map_or(0, |d| d.exons.iter().map(|e| self.markers[e.0].size()).sum());
                    (!coding, std::cmp::Reverse(cds_len), std::cmp::Reverse(mrna_len), t)
                })
            });

            if let Some(c) = canonical {
                if let Ok(data) = self.transcript_mut(c) {
                    data.canonical = true;
                }
                if let Ok(data) = self.gene_mut(gene) {
                    data.canonical = Some(c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    //                0         1         2         3         4
    //                0123456789012345678901234567890123456789012345
    const SEQ: &str = "CCCCCATGAAAGGGTTTGTAAGTCCCCCCCCCAGGGCCCTAACCCC";

    fn plus_builder() -> (GenomeBuilder, MarkerId) {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", SEQ, false).unwrap();
        let g = b.add_gene("chr1", 2, 44, Strand::Plus, "G1", "GENE1").unwrap();
        let t = b.add_transcript(g, 2, 44, "T1").unwrap();
        b.add_exon(t, 2, 19).unwrap();
        b.add_exon(t, 33, 44).unwrap();
        b.add_cds(t, 5, 19).unwrap();
        b.add_cds(t, 33, 41).unwrap();
        (b, t)
    }

    #[fixture]
    fn small_config() -> Config {
        let mut config = Config::default();
        config.predictor.up_down_stream_length = 10;
        config
    }

    #[rstest]
    fn test_build_plus_transcript(small_config: Config) {
        let (b, t) = plus_builder();
        let genome = b.build(&small_config).unwrap();
        let tr = genome[t].as_transcript().unwrap();

        assert_eq!((tr.cds_start, tr.cds_end), (5, 41));
        assert_eq!(tr.cds, "ATGAAAGGGTTTGTAGGGCCCTAA");
        assert_eq!(tr.protein, "MKGFVGP*");
        assert_eq!(tr.introns.len(), 1);
        assert_eq!((genome[tr.introns[0]].start, genome[tr.introns[0]].end), (20, 32));
        assert!(tr.canonical);

        let frames: Vec<Option<u8>> = tr.exons.iter().map(|&e| genome[e].as_exon().unwrap().frame).collect();
        // 15 coding bases in exon 1
        assert_eq!(frames, vec![Some(0), Some(0)]);

        let utr_kinds: Vec<MarkerKind> = tr.utrs.iter().map(|&u| genome[u].kind()).collect();
        assert_eq!(utr_kinds, vec![MarkerKind::Utr5Prime, MarkerKind::Utr3Prime]);

        let up = tr.upstream.map(|u| (genome[u].start, genome[u].end));
        let down = tr.downstream.map(|d| (genome[d].start, genome[d].end));
        assert_eq!(up, Some((0, 1)));
        assert_eq!(down, Some((45, 45)));
    }

    #[rstest]
    fn test_splice_sites(small_config: Config) {
        let (b, t) = plus_builder();
        let genome = b.build(&small_config).unwrap();
        let tr = genome[t].as_transcript().unwrap();

        let mut sites: Vec<(MarkerKind, Pos, Pos)> = tr
            .splice_sites
            .iter()
            .map(|&s| (genome[s].kind(), genome[s].start, genome[s].end))
            .collect();
        sites.sort_by_key(|s| (s.1, s.2));

        assert_eq!(
            sites,
            vec![
                (MarkerKind::SpliceSiteRegion, 17, 19),
                (MarkerKind::SpliceSiteDonor, 20, 21),
                (MarkerKind::SpliceSiteRegion, 22, 27),
                (MarkerKind::SpliceSiteRegion, 25, 30),
                (MarkerKind::SpliceSiteAcceptor, 31, 32),
                (MarkerKind::SpliceSiteRegion, 33, 35),
            ]
        );
    }

    #[rstest]
    fn test_minus_strand_ranks_and_cds(small_config: Config) {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", SEQ, false).unwrap();
        let g = b.add_gene("chr1", 2, 44, Strand::Minus, "G1", "GENE1").unwrap();
        let t = b.add_transcript(g, 2, 44, "T1").unwrap();
        b.add_exon(t, 33, 44).unwrap();
        b.add_exon(t, 2, 19).unwrap();
        b.add_cds(t, 5, 19).unwrap();

        let genome = b.build(&small_config).unwrap();
        let tr = genome[t].as_transcript().unwrap();

        let ranks: Vec<(Pos, usize)> = tr.exons.iter().map(|&e| (genome[e].start, genome[e].rank())).collect();
        assert_eq!(ranks, vec![(2, 2), (33, 1)]);
        assert_eq!((tr.cds_start, tr.cds_end), (19, 5));
        assert_eq!(tr.cds, reverse_complement("ATGAAAGGGTTTGTA"));
        assert_eq!(genome[tr.introns[0]].rank(), 1);
    }

    #[rstest]
    fn test_circular_transcript_is_corrected() {
        let mut config = Config::default();
        config.circular.correct_large_gap = true;
        config.predictor.up_down_stream_length = 0;

        let mut b = GenomeBuilder::new("test");
        b.add_chromosome_length("chrM", 1000, true).unwrap();
        let g = b.add_gene("chrM", 10, 950, Strand::Minus, "G1", "GENE1").unwrap();
        let t = b.add_transcript(g, 10, 950, "T1").unwrap();
        for (start, end) in [(800, 850), (900, 950), (10, 50)] {
            b.add_exon(t, start, end).unwrap();
            b.add_cds(t, start, end).unwrap();
        }

        let genome = b.build(&config).unwrap();
        let tr = genome[t].as_transcript().unwrap();

        assert!(tr.corrected);
        assert_eq!((genome[t].start, genome[t].end), (-200, 50));
        assert_eq!((genome[g].start, genome[g].end), (-200, 50));
        let starts: Vec<Pos> = tr.cds_segments.iter().map(|&c| genome[c].start).collect();
        assert_eq!(starts, vec![-200, -100, 10]);
    }

    #[rstest]
    fn test_build_errors() {
        let config = Config::default();

        let mut b = GenomeBuilder::new("test");
        assert_eq!(
            b.add_gene("chrX", 0, 10, Strand::Plus, "G", "G").unwrap_err(),
            GenomeError::UnknownChromosome("chrX".to_string())
        );
        b.add_chromosome("chr1", SEQ, false).unwrap();
        assert_eq!(
            b.add_chromosome("chr1", SEQ, false).unwrap_err(),
            GenomeError::DuplicateChromosome("chr1".to_string())
        );
        let g = b.add_gene("chr1", 0, 10, Strand::Plus, "G", "G").unwrap();
        assert!(matches!(b.add_exon(g, 0, 5), Err(GenomeError::WrongKind { .. })));
        let t = b.add_transcript(g, 0, 10, "T").unwrap();
        b.add_exon(t, 8, 4).unwrap();
        assert!(matches!(b.build(&config), Err(GenomeError::MalformedInterval { .. })));

        let mut b = GenomeBuilder::new("test");
        assert!(matches!(
            b.add_chromosome_length("chr1", -1, false),
            Err(GenomeError::NegativeLength { .. })
        ));
    }

    #[rstest]
    fn test_cds_longer_than_exons() {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", SEQ, false).unwrap();
        let g = b.add_gene("chr1", 0, 20, Strand::Plus, "G", "G").unwrap();
        let t = b.add_transcript(g, 0, 20, "T").unwrap();
        b.add_exon(t, 0, 5).unwrap();
        b.add_cds(t, 0, 20).unwrap();
        assert!(matches!(
            b.build(&Config::default()),
            Err(GenomeError::CdsLongerThanTranscript { .. })
        ));
    }

    #[rstest]
    fn test_sequence_region(small_config: Config) {
        let (b, _) = plus_builder();
        let genome = b.build(&small_config).unwrap();
        assert_eq!(genome.sequence("chr1", 5, 7).as_deref(), Some("ATG"));
        assert_eq!(genome.sequence_region("chr1", 5, 7).map(|(o, _)| o), Some(0));
        assert!(genome.sequence("chr1", 40, 60).is_none());
        assert!(genome.sequence("chr2", 1, 2).is_none());
    }

    #[rstest]
    fn test_sequence_from_exons_only() {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome_length("chr1", 100, false).unwrap();
        let g = b.add_gene("chr1", 10, 20, Strand::Plus, "G", "G").unwrap();
        let t = b.add_transcript(g, 10, 20, "T").unwrap();
        b.add_exon_with_sequence(t, 10, 20, "acgtacgtacg").unwrap();
        let genome = b.build(&Config::default()).unwrap();

        assert_eq!(genome.sequence_region("chr1", 12, 14).map(|(o, _)| o), Some(10));
        assert_eq!(genome.sequence("chr1", 12, 14).as_deref(), Some("GTA"));
    }

    #[rstest]
    fn test_non_ascii_sequence_is_sanitized() {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", "acgtÄacgt", false).unwrap();
        b.add_chromosome("chr2", "ACGT€", true).unwrap();
        let genome = b.build(&Config::default()).unwrap();

        assert_eq!(genome.chromosome_length("chr1"), 9);
        assert_eq!(genome.sequence("chr1", 3, 5).as_deref(), Some("TNA"));
        assert_eq!(genome.sequence("chr2", 3, 6).as_deref(), Some("TNAC"));
    }

    #[rstest]
    fn test_sequence_region_picks_smallest_exon() {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome_length("chr1", 200, false).unwrap();
        b.add_chromosome_length("chr2", 200, false).unwrap();
        let g1 = b.add_gene("chr1", 5, 40, Strand::Plus, "G1", "G1").unwrap();
        let short = b.add_transcript(g1, 10, 20, "T1").unwrap();
        b.add_exon_with_sequence(short, 10, 20, "acgtacgtacg").unwrap();
        let long = b.add_transcript(g1, 5, 40, "T2").unwrap();
        b.add_exon_with_sequence(long, 5, 40, "AAAAACCCCCGGGGGTTTTTAAAAACCCCCGGGGGT").unwrap();
        let g2 = b.add_gene("chr2", 10, 20, Strand::Plus, "G2", "G2").unwrap();
        let t3 = b.add_transcript(g2, 10, 20, "T3").unwrap();
        b.add_exon_with_sequence(t3, 10, 20, "TTTTTTTTTTT").unwrap();
        let genome = b.build(&Config::default()).unwrap();

        assert_eq!(genome.sequence_region("chr1", 12, 14).map(|(o, s)| (o, s.len())), Some((10, 11)));
        assert_eq!(genome.sequence_region("chr1", 30, 32).map(|(o, s)| (o, s.len())), Some((5, 36)));
        assert_eq!(genome.sequence("chr1", 30, 32).as_deref(), Some("CCC"));
        assert_eq!(genome.sequence("chr2", 12, 14).as_deref(), Some("TTT"));
        assert!(genome.sequence_region("chr1", 38, 45).is_none());
        assert!(genome.sequence_region("chr3", 12, 14).is_none());
    }

    #[rstest]
    fn test_canonical_prefers_longest_coding() {
        let mut b = GenomeBuilder::new("test");
        b.add_chromosome("chr1", SEQ, false).unwrap();
        let g = b.add_gene("chr1", 2, 44, Strand::Plus, "G1", "GENE1").unwrap();
        let short = b.add_transcript(g, 2, 19, "SHORT").unwrap();
        b.add_exon(short, 2, 19).unwrap();
        b.add_cds(short, 5, 10).unwrap();
        let long = b.add_transcript(g, 2, 44, "LONG").unwrap();
        b.add_exon(long, 2, 44).unwrap();
        b.add_cds(long, 5, 16).unwrap();
        let nc = b.add_transcript(g, 2, 44, "NC").unwrap();
        b.add_exon(nc, 2, 44).unwrap();

        let genome = b.build(&Config::default()).unwrap();
        assert_eq!(genome[g].as_gene().unwrap().canonical, Some(long));
    }
}
