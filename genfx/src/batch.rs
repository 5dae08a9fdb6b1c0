//!
//! Parallel annotation of many variants against one genome.
//!
//! The genome and its interval forest are immutable once built, so every
//! variant is annotated independently on the rayon thread pool. Output order
//! always follows input order.
//!
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;

use genfx_core::config::Config;
use genfx_core::models::{Genome, Variant};
use genfx_effect::EffectPredictor;
use genfx_hgvs::{Annotation, annotate};

///
/// Read a TOML configuration file.
///
/// # Arguments
/// - `path` - path to the `.toml` file
///
pub fn load_config(path: &Path) -> Result<Config> {
    Config::try_from(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

pub struct BatchAnnotator<'g> {
    predictor: EffectPredictor<'g>,
}

impl<'g> BatchAnnotator<'g> {
    pub fn new(genome: &'g Genome, config: &Config) -> Result<Self> {
        let predictor = EffectPredictor::new(genome, config).context("Failed to build the interval forest")?;
        Ok(BatchAnnotator { predictor })
    }

    pub fn predictor(&self) -> &EffectPredictor<'g> {
        &self.predictor
    }

    ///
    /// Annotate every variant, one `Vec<Annotation>` per input variant.
    ///
    /// The first variant that breaks a predictor invariant aborts the batch.
    ///
    pub fn annotate(&self, variants: &[Variant]) -> Result<Vec<Vec<Annotation>>> {
        info!("Annotating {} variants", variants.len());
        variants
            .par_iter()
            .map(|variant| annotate(&self.predictor, variant).with_context(|| format!("Failed to annotate {}", variant)))
            .collect()
    }

    /// Annotations as JSON lines, one line per annotation.
    pub fn annotate_json_lines(&self, variants: &[Variant]) -> Result<Vec<String>> {
        let annotations = self.annotate(variants)?;
        let lines = annotations
            .iter()
            .flatten()
            .map(|annotation| annotation.to_json())
            .collect::<Result<Vec<String>, _>>()?;
        Ok(lines)
    }
}
