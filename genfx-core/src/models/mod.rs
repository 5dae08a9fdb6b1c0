pub mod cytoband;
pub mod genome;
pub mod interval;
pub mod marker;
pub mod transcript;
pub mod variant;

// re-export for cleaner imports
pub use self::cytoband::{Cytoband, Cytobands};
pub use self::genome::{Genome, GenomeBuilder};
pub use self::interval::Interval;
pub use self::marker::{
    ChromosomeData, ExonData, Feature, GeneData, IntronData, Located, Marker, MarkerId, MarkerKind, Pos, Strand,
    TranscriptData,
};
pub use self::transcript::TranscriptView;
pub use self::variant::{
    Breakend, HUGE_VARIANT_RATIO_THRESHOLD, HUGE_VARIANT_SIZE_THRESHOLD, SMALL_VARIANT_SIZE_THRESHOLD, Variant,
    VariantType,
};
