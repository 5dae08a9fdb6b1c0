//! Per-chromosome interval index over genome markers.
//!
//! [`IntervalForest`] keeps one [`Overlapper`] per chromosome and answers "which
//! markers overlap `chr:[start, end]`" queries. It is built once from a
//! finished [`Genome`] and is read-only afterwards, so it can be shared across
//! threads.
//!
//! # Examples
//!
//! ```
//! use genfx_core::config::Config;
//! use genfx_core::models::{GenomeBuilder, Strand};
//! use genfx_overlaprs::{OverlapperType, forest::IntoIntervalForest};
//!
//! let mut builder = GenomeBuilder::new("demo");
//! builder.add_chromosome_length("chr1", 10_000, false).unwrap();
//! let gene = builder.add_gene("chr1", 1000, 2000, Strand::Plus, "G1", "GENE1").unwrap();
//! let genome = builder.build(&Config::default()).unwrap();
//!
//! let forest = genome.into_interval_forest(OverlapperType::IntervalTree).unwrap();
//! let hits = forest.query("chr1", 1500, 1500);
//! assert!(hits.contains(&gene));
//! ```
use fxhash::FxHashMap;
use log::info;
use thiserror::Error;

use genfx_core::models::{Genome, Interval, Located, MarkerId, MarkerKind, Pos};

use crate::{Bits, IntervalTree, Overlapper, OverlapperType};

/// Errors that can occur when building an [`IntervalForest`].
#[derive(Debug, Error, PartialEq)]
pub enum ForestError {
    /// An interval whose start lies after its end.
    #[error("Malformed interval on {chromosome}: start={start}, end={end}")]
    MalformedInterval { chromosome: String, start: Pos, end: Pos },
}

pub type ForestResult<T> = std::result::Result<T, ForestError>;

pub struct IntervalForest {
    trees: FxHashMap<String, Box<dyn Overlapper<Pos, MarkerId>>>,
    intervals: FxHashMap<String, Vec<Interval<Pos, MarkerId>>>,
    overlapper_type: OverlapperType,
}

impl std::fmt::Debug for IntervalForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalForest")
            .field("chromosomes", &self.trees.len())
            .field("markers", &self.len())
            .field("overlapper_type", &self.overlapper_type)
            .finish()
    }
}

impl IntervalForest {
    /// Build a forest from `(chromosome, interval)` pairs.
    pub fn build<It>(intervals: It, overlapper_type: OverlapperType) -> ForestResult<Self>
    where
        It: IntoIterator<Item = (String, Interval<Pos, MarkerId>)>,
    {
        // STEP 1: organize intervals into vectors, one for each chrom
        let mut by_chrom: FxHashMap<String, Vec<Interval<Pos, MarkerId>>> = FxHashMap::default();
        for (chr, interval) in intervals {
            if interval.start > interval.end {
                return Err(ForestError::MalformedInterval {
                    chromosome: chr,
                    start: interval.start,
                    end: interval.end,
                });
            }
            by_chrom.entry(chr).or_default().push(interval);
        }

        // STEP 2: build one overlapper per chrom
        let mut trees: FxHashMap<String, Box<dyn Overlapper<Pos, MarkerId>>> = FxHashMap::default();
        for (chr, chr_intervals) in by_chrom.iter() {
            let lapper: Box<dyn Overlapper<Pos, MarkerId>> = match overlapper_type {
                OverlapperType::Bits => Box::new(Bits::build(chr_intervals.clone())),
                OverlapperType::IntervalTree => Box::new(IntervalTree::build(chr_intervals.clone())),
            };
            trees.insert(chr.clone(), lapper);
        }

        Ok(IntervalForest {
            trees,
            intervals: by_chrom,
            overlapper_type,
        })
    }

    pub fn overlapper_type(&self) -> OverlapperType {
        self.overlapper_type
    }

    /// Number of indexed markers.
    pub fn len(&self) -> usize {
        self.trees.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sorted(mut hits: Vec<&Interval<Pos, MarkerId>>) -> Vec<MarkerId> {
        hits.sort_by_key(|iv| (iv.start, iv.end, iv.val));
        hits.into_iter().map(|iv| iv.val).collect()
    }

    /// Markers intersecting `chromosome:[start, end]`, ordered by (start, end, id).
    pub fn query(&self, chromosome: &str, start: Pos, end: Pos) -> Vec<MarkerId> {
        match self.trees.get(chromosome) {
            Some(tree) => Self::sorted(tree.find_iter(start, end).collect()),
            None => Vec::new(),
        }
    }

    /// Markers intersecting any located item, e.g. a variant.
    pub fn query_located<L: Located + ?Sized>(&self, item: &L) -> Vec<MarkerId> {
        self.query(item.chromosome(), item.start(), item.end())
    }

    /// Linear scan equivalent of [`query`](Self::query).
    pub fn query_brute_force(&self, chromosome: &str, start: Pos, end: Pos) -> Vec<MarkerId> {
        match self.intervals.get(chromosome) {
            Some(all) => Self::sorted(all.iter().filter(|iv| iv.overlap(start, end)).collect()),
            None => Vec::new(),
        }
    }
}

/// Convert a collection of markers into an [`IntervalForest`].
pub trait IntoIntervalForest {
    fn into_interval_forest(self, overlapper_type: OverlapperType) -> ForestResult<IntervalForest>;
}

impl IntoIntervalForest for &Genome {
    /// Indexes chromosomes, genes and upstream/downstream regions. Everything
    /// else is reached through the gene's children.
    fn into_interval_forest(self, overlapper_type: OverlapperType) -> ForestResult<IntervalForest> {
        let intervals = self
            .markers()
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                matches!(
                    m.kind(),
                    MarkerKind::Chromosome | MarkerKind::Gene | MarkerKind::Upstream | MarkerKind::Downstream
                )
            })
            .map(|(i, m)| {
                (
                    m.chromosome.clone(),
                    Interval {
                        start: m.start,
                        end: m.end,
                        val: MarkerId(i),
                    },
                )
            });

        let forest = IntervalForest::build(intervals, overlapper_type)?;
        info!(
            "Interval forest built for genome '{}': {} markers on {} chromosomes",
            self.name,
            forest.len(),
            forest.trees.len()
        );
        Ok(forest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genfx_core::config::Config;
    use genfx_core::models::{GenomeBuilder, Strand};
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::*;

    fn random_intervals(seed: u64, n: usize, span: Pos) -> Vec<(String, Interval<Pos, MarkerId>)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let chr = format!("chr{}", rng.random_range(0..3));
                let start = rng.random_range(-span / 4..span - span / 4);
                let len = rng.random_range(0..200);
                (
                    chr,
                    Interval {
                        start,
                        end: start + len,
                        val: MarkerId(i),
                    },
                )
            })
            .collect()
    }

    #[rstest]
    #[case(OverlapperType::IntervalTree, 7)]
    #[case(OverlapperType::IntervalTree, 1234)]
    #[case(OverlapperType::Bits, 7)]
    #[case(OverlapperType::Bits, 99)]
    fn test_query_matches_brute_force(#[case] overlapper_type: OverlapperType, #[case] seed: u64) {
        let forest = IntervalForest::build(random_intervals(seed, 500, 5_000), overlapper_type).unwrap();
        assert_eq!(forest.len(), 500);

        let queries = random_intervals(seed.wrapping_mul(31).wrapping_add(1), 200, 6_000);
        for (chr, q) in queries {
            assert_eq!(
                forest.query(&chr, q.start, q.end),
                forest.query_brute_force(&chr, q.start, q.end)
            );
        }
        assert!(forest.query("chrUn", 0, 100).is_empty());
    }

    #[rstest]
    fn test_malformed_interval() {
        let bad = vec![(
            "chr1".to_string(),
            Interval {
                start: 10,
                end: 5,
                val: MarkerId(0),
            },
        )];
        assert_eq!(
            IntervalForest::build(bad, OverlapperType::Bits).unwrap_err(),
            ForestError::MalformedInterval {
                chromosome: "chr1".to_string(),
                start: 10,
                end: 5
            }
        );
    }

    #[rstest]
    #[case(OverlapperType::IntervalTree)]
    #[case(OverlapperType::Bits)]
    fn test_forest_from_genome(#[case] overlapper_type: OverlapperType) {
        let mut config = Config::default();
        config.predictor.up_down_stream_length = 100;

        let mut b = GenomeBuilder::new("test");
        let chr = b.add_chromosome_length("chr1", 10_000, false).unwrap();
        let g1 = b.add_gene("chr1", 1000, 2000, Strand::Plus, "G1", "GENE1").unwrap();
        let t1 = b.add_transcript(g1, 1000, 2000, "T1").unwrap();
        b.add_exon(t1, 1000, 2000).unwrap();
        let g2 = b.add_gene("chr1", 1500, 3000, Strand::Minus, "G2", "GENE2").unwrap();
        let genome = b.build(&config).unwrap();

        let forest = genome.into_interval_forest(overlapper_type).unwrap();
        assert_eq!(forest.query("chr1", 1600, 1700), vec![chr, g1, g2]);

        // upstream of T1 is [900, 999]
        let upstream = genome[t1].as_transcript().unwrap().upstream.unwrap();
        assert_eq!(forest.query("chr1", 950, 950), vec![chr, upstream]);
    }
}
