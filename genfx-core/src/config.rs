use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HGVS rendering flags.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HgvsConfig {
    /// Shift indels to their most 3' position before annotating.
    pub shift: bool,
    /// Use one letter amino acid codes in `p.` notation.
    pub one_letter_aa: bool,
    /// Prefix HGVS strings with `{transcript}.{version}:`.
    pub use_transcript_id: bool,
    /// Old style nomenclature (`c.G123T`, `X` for stop codons).
    pub old_nomenclature: bool,
}

impl Default for HgvsConfig {
    fn default() -> Self {
        HgvsConfig {
            shift: true,
            one_letter_aa: false,
            use_transcript_id: false,
            old_nomenclature: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    pub up_down_stream_length: i64,
    pub splice_site_size: i64,
    pub splice_region_exon_size: i64,
    pub splice_region_intron_min: i64,
    pub splice_region_intron_max: i64,
    pub error_on_missing_chromosome: bool,
    pub error_chromosome_hit: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            up_down_stream_length: 5000,
            splice_site_size: 2,
            splice_region_exon_size: 3,
            splice_region_intron_min: 3,
            splice_region_intron_max: 8,
            error_on_missing_chromosome: true,
            error_chromosome_hit: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct CircularConfig {
    /// Also treat a gap larger than half the chromosome as a wrap point.
    pub correct_large_gap: bool,
}

/// Runtime configuration threaded through genome building, prediction and HGVS rendering.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub hgvs: HgvsConfig,
    pub predictor: PredictorConfig,
    pub circular: CircularConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl TryFrom<&Path> for Config {
    type Error = ConfigError;

    fn try_from(value: &Path) -> ConfigResult<Self> {
        let file_content = read_to_string(value)?;
        let config: Config = toml::from_str(&file_content)?;
        Ok(config)
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.hgvs.shift);
        assert!(!config.hgvs.one_letter_aa);
        assert_eq!(config.predictor.up_down_stream_length, 5000);
        assert_eq!(config.predictor.splice_site_size, 2);
        assert_eq!(config.predictor.splice_region_intron_max, 8);
        assert!(!config.circular.correct_large_gap);
    }

    #[rstest]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = "[hgvs]\none_letter_aa = true\n".parse().unwrap();
        assert!(config.hgvs.one_letter_aa);
        assert!(config.hgvs.shift);
        assert_eq!(config.predictor, PredictorConfig::default());
    }

    #[rstest]
    fn test_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[predictor]\nup_down_stream_length = 100\n\n[circular]\ncorrect_large_gap = true"
        )
        .unwrap();

        let config = Config::try_from(file.path()).unwrap();
        assert_eq!(config.predictor.up_down_stream_length, 100);
        assert!(config.circular.correct_large_gap);
        assert_eq!(config.hgvs, HgvsConfig::default());
    }

    #[rstest]
    fn test_config_bad_toml() {
        let result: ConfigResult<Config> = "[hgvs\nshift = 1".parse();
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[rstest]
    fn test_config_missing_file() {
        let result = Config::try_from(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
