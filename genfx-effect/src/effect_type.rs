//! Effect taxonomy: effect types, their impacts and Sequence Ontology terms.
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// Putative impact of an effect, most severe first.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EffectImpact {
    High,
    Moderate,
    Low,
    Modifier,
}

impl Display for EffectImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectImpact::High => "HIGH",
            EffectImpact::Moderate => "MODERATE",
            EffectImpact::Low => "LOW",
            EffectImpact::Modifier => "MODIFIER",
        };
        write!(f, "{}", name)
    }
}

///
/// Effect of a variant on a genome feature.
///
/// Variants are declared in rank order, the most important first, so the
/// derived `Ord` sorts by importance: `a < b` means `a` outranks `b`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    ChromosomeLargeDeletion,
    ChromosomeLargeInversion,
    ChromosomeLargeDuplication,
    GeneDeleted,
    TranscriptDeleted,
    ExonDeleted,
    ExonDeletedPartial,
    GeneFusion,
    GeneFusionReverese,
    GeneFusionHalf,
    FrameShift,
    StopGained,
    StopLost,
    StartLost,
    SpliceSiteAcceptor,
    SpliceSiteDonor,
    ExonDuplication,
    ExonDuplicationPartial,
    ExonInversion,
    ExonInversionPartial,
    NonSynonymousCoding,
    NonSynonymousStop,
    NonSynonymousStart,
    GeneDuplication,
    TranscriptDuplication,
    #[serde(rename = "UTR_5_DELETED")]
    Utr5Deleted,
    #[serde(rename = "UTR_3_DELETED")]
    Utr3Deleted,
    SpliceSiteRegion,
    SynonymousCoding,
    SynonymousStart,
    SynonymousStop,
    GeneInversion,
    TranscriptInversion,
    CodonChange,
    CodonInsertion,
    CodonChangePlusCodonInsertion,
    CodonDeletion,
    CodonChangePlusCodonDeletion,
    #[serde(rename = "UTR_5_PRIME")]
    Utr5Prime,
    #[serde(rename = "UTR_3_PRIME")]
    Utr3Prime,
    FrameShiftBeforeCdsStart,
    FrameShiftAfterCdsEnd,
    StartGained,
    FeatureFusion,
    Upstream,
    Downstream,
    Intron,
    Intragenic,
    Intergenic,
    Cds,
    Exon,
    Transcript,
    Gene,
    ChromosomeElongation,
    Chromosome,
    None,
}

impl EffectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectType::ChromosomeLargeDeletion => "CHROMOSOME_LARGE_DELETION",
            EffectType::ChromosomeLargeInversion => "CHROMOSOME_LARGE_INVERSION",
            EffectType::ChromosomeLargeDuplication => "CHROMOSOME_LARGE_DUPLICATION",
            EffectType::GeneDeleted => "GENE_DELETED",
            EffectType::TranscriptDeleted => "TRANSCRIPT_DELETED",
            EffectType::ExonDeleted => "EXON_DELETED",
            EffectType::ExonDeletedPartial => "EXON_DELETED_PARTIAL",
            EffectType::GeneFusion => "GENE_FUSION",
            EffectType::GeneFusionReverese => "GENE_FUSION_REVERESE",
            EffectType::GeneFusionHalf => "GENE_FUSION_HALF",
            EffectType::FrameShift => "FRAME_SHIFT",
            EffectType::StopGained => "STOP_GAINED",
            EffectType::StopLost => "STOP_LOST",
            EffectType::StartLost => "START_LOST",
            EffectType::SpliceSiteAcceptor => "SPLICE_SITE_ACCEPTOR",
            EffectType::SpliceSiteDonor => "SPLICE_SITE_DONOR",
            EffectType::ExonDuplication => "EXON_DUPLICATION",
            EffectType::ExonDuplicationPartial => "EXON_DUPLICATION_PARTIAL",
            EffectType::ExonInversion => "EXON_INVERSION",
            EffectType::ExonInversionPartial => "EXON_INVERSION_PARTIAL",
            EffectType::NonSynonymousCoding => "NON_SYNONYMOUS_CODING",
            EffectType::NonSynonymousStop => "NON_SYNONYMOUS_STOP",
            EffectType::NonSynonymousStart => "NON_SYNONYMOUS_START",
            EffectType::GeneDuplication => "GENE_DUPLICATION",
            EffectType::TranscriptDuplication => "TRANSCRIPT_DUPLICATION",
            EffectType::Utr5Deleted => "UTR_5_DELETED",
            EffectType::Utr3Deleted => "UTR_3_DELETED",
            EffectType::SpliceSiteRegion => "SPLICE_SITE_REGION",
            EffectType::SynonymousCoding => "SYNONYMOUS_CODING",
            EffectType::SynonymousStart => "SYNONYMOUS_START",
            EffectType::SynonymousStop => "SYNONYMOUS_STOP",
            EffectType::GeneInversion => "GENE_INVERSION",
            EffectType::TranscriptInversion => "TRANSCRIPT_INVERSION",
            EffectType::CodonChange => "CODON_CHANGE",
            EffectType::CodonInsertion => "CODON_INSERTION",
            EffectType::CodonChangePlusCodonInsertion => "CODON_CHANGE_PLUS_CODON_INSERTION",
            EffectType::CodonDeletion => "CODON_DELETION",
            EffectType::CodonChangePlusCodonDeletion => "CODON_CHANGE_PLUS_CODON_DELETION",
            EffectType::Utr5Prime => "UTR_5_PRIME",
            EffectType::Utr3Prime => "UTR_3_PRIME",
            EffectType::FrameShiftBeforeCdsStart => "FRAME_SHIFT_BEFORE_CDS_START",
            EffectType::FrameShiftAfterCdsEnd => "FRAME_SHIFT_AFTER_CDS_END",
            EffectType::StartGained => "START_GAINED",
            EffectType::FeatureFusion => "FEATURE_FUSION",
            EffectType::Upstream => "UPSTREAM",
            EffectType::Downstream => "DOWNSTREAM",
            EffectType::Intron => "INTRON",
            EffectType::Intragenic => "INTRAGENIC",
            EffectType::Intergenic => "INTERGENIC",
            EffectType::Cds => "CDS",
            EffectType::Exon => "EXON",
            EffectType::Transcript => "TRANSCRIPT",
            EffectType::Gene => "GENE",
            EffectType::ChromosomeElongation => "CHROMOSOME_ELONGATION",
            EffectType::Chromosome => "CHROMOSOME",
            EffectType::None => "NONE",
        }
    }

    /// Default impact of this effect type.
    pub fn impact(&self) -> EffectImpact {
        use EffectType::*;
        match self {
            ChromosomeLargeDeletion | GeneDeleted | TranscriptDeleted | ExonDeleted | ExonDeletedPartial
            | ExonDuplication | ExonDuplicationPartial | ExonInversion | ExonInversionPartial | GeneFusion
            | GeneFusionReverese | GeneFusionHalf | FrameShift | StopGained | StopLost | StartLost
            | SpliceSiteAcceptor | SpliceSiteDonor => EffectImpact::High,

            ChromosomeLargeInversion | CodonChangePlusCodonDeletion | CodonChangePlusCodonInsertion
            | CodonDeletion | CodonInsertion | GeneDuplication | GeneInversion | NonSynonymousCoding
            | TranscriptDuplication | TranscriptInversion | Utr3Deleted | Utr5Deleted => EffectImpact::Moderate,

            ChromosomeLargeDuplication | CodonChange | FeatureFusion | NonSynonymousStart | NonSynonymousStop
            | SpliceSiteRegion | StartGained | SynonymousCoding | SynonymousStart | SynonymousStop => {
                EffectImpact::Low
            }

            Utr5Prime | Utr3Prime | FrameShiftBeforeCdsStart | FrameShiftAfterCdsEnd | Upstream | Downstream
            | Intron | Intragenic | Intergenic | Cds | Exon | Transcript | Gene | ChromosomeElongation
            | Chromosome | None => EffectImpact::Modifier,
        }
    }

    ///
    /// Coarse region of the gene this effect falls into.
    ///
    pub fn gene_region(&self) -> EffectType {
        use EffectType::*;
        match self {
            None | Chromosome | ChromosomeLargeDeletion | ChromosomeLargeDuplication | ChromosomeLargeInversion
            | ChromosomeElongation => Chromosome,

            Intergenic | FeatureFusion => Intergenic,
            Upstream => Upstream,
            Downstream => Downstream,
            Utr5Prime | Utr5Deleted | StartGained | FrameShiftBeforeCdsStart => Utr5Prime,
            Utr3Prime | Utr3Deleted | FrameShiftAfterCdsEnd => Utr3Prime,
            SpliceSiteAcceptor => SpliceSiteAcceptor,
            SpliceSiteDonor => SpliceSiteDonor,
            SpliceSiteRegion => SpliceSiteRegion,
            Intron => Intron,

            TranscriptDeleted | TranscriptDuplication | TranscriptInversion | Intragenic | Transcript | Cds => {
                Transcript
            }

            Gene | GeneDeleted | GeneDuplication | GeneFusion | GeneFusionHalf | GeneFusionReverese
            | GeneInversion => Gene,

            Exon | ExonDeleted | ExonDeletedPartial | ExonDuplication | ExonDuplicationPartial | ExonInversion
            | ExonInversionPartial | NonSynonymousStart | NonSynonymousCoding | SynonymousCoding
            | SynonymousStart | FrameShift | CodonChange | CodonInsertion | CodonChangePlusCodonInsertion
            | CodonDeletion | CodonChangePlusCodonDeletion | StartLost | StopGained | SynonymousStop
            | NonSynonymousStop | StopLost => Exon,
        }
    }

    ///
    /// Sequence Ontology term(s), `&` separated.
    ///
    /// `EXON` depends on the variant: intervals and non-variants hitting an
    /// exon are `exon_region`.
    ///
    pub fn so_term(&self, non_variant: bool) -> &'static str {
        use EffectType::*;
        match self {
            Cds | CodonChange => "coding_sequence_variant",
            ChromosomeLargeDeletion => "chromosome_number_variation",
            ChromosomeLargeDuplication => "duplication",
            ChromosomeLargeInversion => "inversion",
            Chromosome => "chromosome",
            ChromosomeElongation => "feature_elongation",
            CodonChangePlusCodonInsertion => "disruptive_inframe_insertion",
            CodonChangePlusCodonDeletion => "disruptive_inframe_deletion",
            CodonDeletion => "conservative_inframe_deletion",
            CodonInsertion => "conservative_inframe_insertion",
            Downstream => "downstream_gene_variant",
            Exon if non_variant => "exon_region",
            Exon => "non_coding_transcript_exon_variant",
            ExonDeleted | ExonDeletedPartial => "exon_loss_variant",
            ExonDuplication | ExonDuplicationPartial => "duplication",
            ExonInversion | ExonInversionPartial => "inversion",
            FeatureFusion => "feature_fusion",
            FrameShift => "frameshift_variant",
            FrameShiftBeforeCdsStart => "5_prime_UTR_variant",
            FrameShiftAfterCdsEnd => "3_prime_UTR_variant",
            Gene => "gene_variant",
            GeneInversion => "inversion",
            GeneDeleted => "feature_ablation",
            GeneDuplication => "duplication",
            GeneFusion | GeneFusionHalf => "gene_fusion",
            GeneFusionReverese => "bidirectional_gene_fusion",
            Intergenic => "intergenic_region",
            Intron => "intron_variant",
            Intragenic => "intragenic_variant",
            NonSynonymousCoding => "missense_variant",
            NonSynonymousStart => "initiator_codon_variant",
            NonSynonymousStop | SynonymousStop => "stop_retained_variant",
            SpliceSiteAcceptor => "splice_acceptor_variant",
            SpliceSiteDonor => "splice_donor_variant",
            SpliceSiteRegion => "splice_region_variant",
            StartLost => "start_lost",
            StartGained => "5_prime_UTR_premature_start_codon_gain_variant",
            StopGained => "stop_gained",
            StopLost => "stop_lost",
            SynonymousCoding => "synonymous_variant",
            SynonymousStart => "initiator_codon_variant&non_canonical_start_codon",
            Transcript => "non_coding_transcript_variant",
            TranscriptDeleted => "transcript_ablation",
            TranscriptDuplication => "duplication",
            TranscriptInversion => "inversion",
            Upstream => "upstream_gene_variant",
            Utr3Prime => "3_prime_UTR_variant",
            Utr3Deleted => "3_prime_UTR_truncation&exon_loss_variant",
            Utr5Prime => "5_prime_UTR_variant",
            Utr5Deleted => "5_prime_UTR_truncation&exon_loss_variant",
            None => "",
        }
    }

    pub fn is_fusion(&self) -> bool {
        matches!(
            self,
            EffectType::GeneFusion | EffectType::GeneFusionReverese | EffectType::GeneFusionHalf | EffectType::FeatureFusion
        )
    }
}

impl Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Recoverable findings attached to an effect instead of aborting the
/// prediction.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorWarningType {
    #[serde(rename = "INFO_REALIGN_3_PRIME")]
    InfoRealign3Prime,
    WarningSequenceNotAvailable,
    WarningRefDoesNotMatchGenome,
    WarningTranscriptIncomplete,
    WarningTranscriptMultipleStopCodons,
    WarningTranscriptNoStartCodon,
    WarningTranscriptNoStopCodon,
    ErrorChromosomeNotFound,
    ErrorOutOfChromosomeRange,
    ErrorOutOfExon,
    ErrorMissingCdsSequence,
}

impl ErrorWarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorWarningType::InfoRealign3Prime => "INFO_REALIGN_3_PRIME",
            ErrorWarningType::WarningSequenceNotAvailable => "WARNING_SEQUENCE_NOT_AVAILABLE",
            ErrorWarningType::WarningRefDoesNotMatchGenome => "WARNING_REF_DOES_NOT_MATCH_GENOME",
            ErrorWarningType::WarningTranscriptIncomplete => "WARNING_TRANSCRIPT_INCOMPLETE",
            ErrorWarningType::WarningTranscriptMultipleStopCodons => "WARNING_TRANSCRIPT_MULTIPLE_STOP_CODONS",
            ErrorWarningType::WarningTranscriptNoStartCodon => "WARNING_TRANSCRIPT_NO_START_CODON",
            ErrorWarningType::WarningTranscriptNoStopCodon => "WARNING_TRANSCRIPT_NO_STOP_CODON",
            ErrorWarningType::ErrorChromosomeNotFound => "ERROR_CHROMOSOME_NOT_FOUND",
            ErrorWarningType::ErrorOutOfChromosomeRange => "ERROR_OUT_OF_CHROMOSOME_RANGE",
            ErrorWarningType::ErrorOutOfExon => "ERROR_OUT_OF_EXON",
            ErrorWarningType::ErrorMissingCdsSequence => "ERROR_MISSING_CDS_SEQUENCE",
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_str().starts_with("ERROR")
    }

    pub fn is_warning(&self) -> bool {
        !self.is_error()
    }
}

impl Display for ErrorWarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
