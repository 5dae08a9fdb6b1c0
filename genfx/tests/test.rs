use std::io::Write;
use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::NamedTempFile;

use genfx::batch::{BatchAnnotator, load_config};
use genfx::core::config::Config;
use genfx::core::models::{Genome, GenomeBuilder, Strand, Variant};
use genfx::effect::{EffectType, ErrorWarningType};
use genfx::hgvs::{Annotation, annotate};

#[fixture]
fn genome() -> Genome {
    let chr1 = concat!(
        "GATTACAGAT",
        "CCGCC",
        "ATGAAACTGCGTTGG",
        "GTAAGTCCAG",
        "GGACCTTTCGAATAA",
        "CGCGA",
        "TTTTTCCCCCAAAAAGGGGGTTTTTCCCCCAAAAAGGGGG",
    );
    let chr2 = concat!("TTTTGGGGCC", "CAGT", "TTATCCT", "CTTACCTAC", "GAAGCCAT", "GGC", "AAAACCCCG");

    let mut b = GenomeBuilder::new("test");
    b.add_chromosome("chr1", chr1, false).unwrap();
    b.add_chromosome("chr2", chr2, false).unwrap();

    let g1 = b.add_gene("chr1", 10, 59, Strand::Plus, "G1", "GENE1").unwrap();
    let t1 = b.add_transcript(g1, 10, 59, "T1").unwrap();
    b.set_version(t1, "2").unwrap();
    b.add_exon(t1, 10, 29).unwrap();
    b.add_exon(t1, 40, 59).unwrap();
    b.add_cds(t1, 15, 29).unwrap();
    b.add_cds(t1, 40, 54).unwrap();

    let g2 = b.add_gene("chr2", 10, 40, Strand::Minus, "G2", "GENE2").unwrap();
    let t2 = b.add_transcript(g2, 10, 40, "T2").unwrap();
    b.add_exon(t2, 10, 20).unwrap();
    b.add_exon(t2, 30, 40).unwrap();
    b.add_cds(t2, 14, 20).unwrap();
    b.add_cds(t2, 30, 37).unwrap();

    b.build(&Config::default()).unwrap()
}

#[fixture]
fn variants() -> Vec<Variant> {
    vec![
        Variant::new("chr1", 19, "A", "G"),
        Variant::new("chr1", 28, "G", "A"),
        Variant::new("chr2", 36, "A", "G"),
        Variant::new("chr1", 20, "", "C"),
        Variant::new("chr1", 34, "G", "A"),
        Variant::new("chrX", 10, "A", "T"),
    ]
}

fn on_transcript<'a>(annotations: &'a [Annotation], id: &str) -> &'a Annotation {
    annotations
        .iter()
        .find(|a| a.transcript_id.as_deref() == Some(id))
        .unwrap()
}

mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn test_batch_annotation(genome: Genome, variants: Vec<Variant>) {
        let annotator = BatchAnnotator::new(&genome, &Config::default()).unwrap();
        let annotations = annotator.annotate(&variants).unwrap();
        assert_eq!(annotations.len(), variants.len());

        let missense = on_transcript(&annotations[0], "T1");
        assert_eq!(missense.hgvs_c.as_deref(), Some("c.5A>G"));
        assert_eq!(missense.hgvs_p.as_deref(), Some("p.Lys2Arg"));

        let nonsense = on_transcript(&annotations[1], "T1");
        assert_eq!(nonsense.effects[0], EffectType::StopGained);
        assert_eq!(nonsense.hgvs_c.as_deref(), Some("c.14G>A"));
        assert_eq!(nonsense.hgvs_p.as_deref(), Some("p.Trp5*"));

        let minus = on_transcript(&annotations[2], "T2");
        assert_eq!(minus.hgvs_c.as_deref(), Some("c.2T>C"));
        assert_eq!(minus.hgvs_p.as_deref(), Some("p.Met1?"));

        let frame_shift = on_transcript(&annotations[3], "T1");
        assert_eq!(frame_shift.effects[0], EffectType::FrameShift);
        assert_eq!(frame_shift.hgvs_p.as_deref(), Some("p.Lys2fs"));

        let missing = &annotations[5];
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].errors, vec![ErrorWarningType::ErrorChromosomeNotFound]);
    }

    #[rstest]
    fn test_batch_matches_sequential(genome: Genome, variants: Vec<Variant>) {
        let annotator = BatchAnnotator::new(&genome, &Config::default()).unwrap();
        let parallel = annotator.annotate(&variants).unwrap();

        let sequential: Vec<Vec<Annotation>> = variants
            .iter()
            .map(|v| annotate(annotator.predictor(), v).unwrap())
            .collect();

        assert_eq!(parallel, sequential);
        assert_eq!(annotator.annotate(&variants).unwrap(), parallel);
    }

    #[rstest]
    fn test_json_lines(genome: Genome, variants: Vec<Variant>) {
        let annotator = BatchAnnotator::new(&genome, &Config::default()).unwrap();
        let total: usize = annotator.annotate(&variants).unwrap().iter().map(Vec::len).sum();

        let lines = annotator.annotate_json_lines(&variants).unwrap();
        assert_eq!(lines.len(), total);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert!(value.get("effects").is_some());
        }
    }

    #[rstest]
    fn test_config_file_drives_nomenclature(genome: Genome) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[hgvs]\none_letter_aa = true\nuse_transcript_id = true").unwrap();

        let config = load_config(file.path()).unwrap();
        let annotator = BatchAnnotator::new(&genome, &config).unwrap();
        let annotations = annotator.annotate(&[Variant::new("chr1", 19, "A", "G")]).unwrap();

        let missense = on_transcript(&annotations[0], "T1");
        assert_eq!(missense.hgvs_c.as_deref(), Some("T1.2:c.5A>G"));
        assert_eq!(missense.hgvs_p.as_deref(), Some("T1.2:p.K2R"));
    }

    #[rstest]
    fn test_missing_config_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }
}
