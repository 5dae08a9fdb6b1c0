use genfx_core::config::HgvsConfig;
use genfx_core::models::{Genome, TranscriptView};
use genfx_effect::VariantEffect;

///
/// Transcript an effect refers to, if it sits on the variant's chromosome.
///
/// Translocation effects may point at the transcript on the mate
/// chromosome, which cannot number the local breakpoint.
///
pub(crate) fn effect_transcript<'g>(genome: &'g Genome, effect: &VariantEffect) -> Option<TranscriptView<'g>> {
    let tr = genome.transcript(effect.transcript(genome)?)?;
    (tr.marker.chromosome == effect.variant.chromosome).then_some(tr)
}

/// `{kind}` prefix, preceded by `{transcript}.{version}:` when configured.
pub(crate) fn reference_prefix(tr: Option<&TranscriptView<'_>>, kind: &str, config: &HgvsConfig) -> String {
    match tr {
        Some(tr) if config.use_transcript_id => match tr.version() {
            Some(version) if !version.is_empty() => format!("{}.{}:{}", tr.transcript_id(), version, kind),
            _ => format!("{}:{}", tr.transcript_id(), kind),
        },
        _ => kind.to_string(),
    }
}
