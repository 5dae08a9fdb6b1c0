use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::codon_table::CodonTableKind;

/// Genomic coordinate. 0-based, and signed so that features on circular
/// chromosomes can sit before the origin.
pub type Pos = i64;

///
/// Stable index of a marker inside a [`Genome`](crate::models::Genome) arena
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub usize);

impl Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    pub fn is_minus(&self) -> bool {
        matches!(self, Strand::Minus)
    }

    pub fn sign(&self) -> i64 {
        match self {
            Strand::Plus => 1,
            Strand::Minus => -1,
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// Discriminant of a [`Feature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Chromosome,
    Gene,
    Transcript,
    Exon,
    Intron,
    Cds,
    Utr5Prime,
    Utr3Prime,
    SpliceSiteDonor,
    SpliceSiteAcceptor,
    SpliceSiteRegion,
    Upstream,
    Downstream,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeData {
    pub sequence: Option<String>,
    pub circular: bool,
    pub length: Pos,
    pub codon_table: CodonTableKind,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneData {
    pub name: String,
    pub biotype: Option<String>,
    pub transcripts: Vec<MarkerId>,
    pub canonical: Option<MarkerId>,
}

///
/// Transcript payload. Child lists are kept in genomic order; use
/// [`TranscriptView`](crate::models::TranscriptView) for strand aware access.
///
/// `cds_start`/`cds_end` follow transcription direction: on the minus strand
/// `cds_start > cds_end`.
///
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptData {
    pub version: Option<String>,
    pub protein_coding: bool,
    pub canonical: bool,
    pub exons: Vec<MarkerId>,
    pub introns: Vec<MarkerId>,
    pub cds_segments: Vec<MarkerId>,
    pub utrs: Vec<MarkerId>,
    pub splice_sites: Vec<MarkerId>,
    pub upstream: Option<MarkerId>,
    pub downstream: Option<MarkerId>,
    pub cds_start: Pos,
    pub cds_end: Pos,
    pub cds: String,
    pub protein: String,
    pub corrected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExonData {
    /// 1-based position in transcription order
    pub rank: usize,
    /// Bases to skip from the 5' end of the exon to reach a codon start.
    /// `None` for exons without coding bases.
    pub frame: Option<u8>,
    /// Forward strand sequence, empty when no sequence is available
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntronData {
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Chromosome(ChromosomeData),
    Gene(GeneData),
    Transcript(TranscriptData),
    Exon(ExonData),
    Intron(IntronData),
    Cds,
    Utr5Prime,
    Utr3Prime,
    SpliceSiteDonor,
    SpliceSiteAcceptor,
    SpliceSiteRegion,
    Upstream,
    Downstream,
}

impl Feature {
    pub fn kind(&self) -> MarkerKind {
        match self {
            Feature::Chromosome(_) => MarkerKind::Chromosome,
            Feature::Gene(_) => MarkerKind::Gene,
            Feature::Transcript(_) => MarkerKind::Transcript,
            Feature::Exon(_) => MarkerKind::Exon,
            Feature::Intron(_) => MarkerKind::Intron,
            Feature::Cds => MarkerKind::Cds,
            Feature::Utr5Prime => MarkerKind::Utr5Prime,
            Feature::Utr3Prime => MarkerKind::Utr3Prime,
            Feature::SpliceSiteDonor => MarkerKind::SpliceSiteDonor,
            Feature::SpliceSiteAcceptor => MarkerKind::SpliceSiteAcceptor,
            Feature::SpliceSiteRegion => MarkerKind::SpliceSiteRegion,
            Feature::Upstream => MarkerKind::Upstream,
            Feature::Downstream => MarkerKind::Downstream,
        }
    }
}

/// Anything with a chromosome and a closed `[start, end]` range.
pub trait Located {
    fn chromosome(&self) -> &str;
    fn start(&self) -> Pos;
    fn end(&self) -> Pos;

    fn size(&self) -> Pos {
        self.end() - self.start() + 1
    }

    fn intersects_range(&self, start: Pos, end: Pos) -> bool {
        self.start() <= end && self.end() >= start
    }

    fn intersects<L: Located + ?Sized>(&self, other: &L) -> bool {
        self.chromosome() == other.chromosome() && self.intersects_range(other.start(), other.end())
    }

    /// Is `other` completely inside this range?
    fn includes<L: Located + ?Sized>(&self, other: &L) -> bool {
        self.chromosome() == other.chromosome()
            && self.start() <= other.start()
            && other.end() <= self.end()
    }

    fn intersect_size<L: Located + ?Sized>(&self, other: &L) -> Pos {
        if self.chromosome() != other.chromosome() {
            return 0;
        }
        let len = self.end().min(other.end()) - self.start().max(other.start()) + 1;
        len.max(0)
    }
}

///
/// A located genome feature stored in the genome arena
///
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub chromosome: String,
    pub start: Pos,
    pub end: Pos,
    pub strand: Strand,
    pub id: String,
    pub parent: Option<MarkerId>,
    pub feature: Feature,
}

impl Marker {
    pub fn kind(&self) -> MarkerKind {
        self.feature.kind()
    }

    pub fn is_minus(&self) -> bool {
        self.strand.is_minus()
    }

    pub fn as_chromosome(&self) -> Option<&ChromosomeData> {
        match &self.feature {
            Feature::Chromosome(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_gene(&self) -> Option<&GeneData> {
        match &self.feature {
            Feature::Gene(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_transcript(&self) -> Option<&TranscriptData> {
        match &self.feature {
            Feature::Transcript(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_exon(&self) -> Option<&ExonData> {
        match &self.feature {
            Feature::Exon(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_intron(&self) -> Option<&IntronData> {
        match &self.feature {
            Feature::Intron(data) => Some(data),
            _ => None,
        }
    }

    /// Rank of an exon or intron, 0 for every other kind.
    pub fn rank(&self) -> usize {
        match &self.feature {
            Feature::Exon(data) => data.rank,
            Feature::Intron(data) => data.rank,
            _ => 0,
        }
    }

    /// Distance from `pos` to this marker, 0 when inside.
    pub fn distance(&self, pos: Pos) -> Pos {
        if pos < self.start {
            self.start - pos
        } else if pos > self.end {
            pos - self.end
        } else {
            0
        }
    }
}

impl Located for Marker {
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
