use fxhash::FxHashMap;

use super::marker::{Located, Pos};

/// Named cytogenetic band, e.g. `p36.33`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cytoband {
    pub chromosome: String,
    pub start: Pos,
    pub end: Pos,
    pub name: String,
}

impl Located for Cytoband {
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

#[derive(Debug, Clone, Default)]
pub struct Cytobands {
    bands: FxHashMap<String, Vec<Cytoband>>,
}

impl Cytobands {
    pub fn add(&mut self, band: Cytoband) {
        self.bands.entry(band.chromosome.clone()).or_default().push(band);
    }

    /// First band on `chromosome` that contains `pos`.
    pub fn find(&self, chromosome: &str, pos: Pos) -> Option<&Cytoband> {
        self.bands
            .get(chromosome)?
            .iter()
            .find(|band| band.intersects_range(pos, pos))
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bands.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn bands() -> Cytobands {
        let mut bands = Cytobands::default();
        for (start, end, name) in [(0, 99, "p11"), (100, 199, "q11"), (150, 250, "q12")] {
            bands.add(Cytoband {
                chromosome: "chr1".to_string(),
                start,
                end,
                name: name.to_string(),
            });
        }
        bands
    }

    #[rstest]
    fn test_find_first_match(bands: Cytobands) {
        assert_eq!(bands.len(), 3);
        assert_eq!(bands.find("chr1", 99).map(|b| b.name.as_str()), Some("p11"));
        assert_eq!(bands.find("chr1", 160).map(|b| b.name.as_str()), Some("q11"));
        assert_eq!(bands.find("chr1", 240).map(|b| b.name.as_str()), Some("q12"));
    }

    #[rstest]
    fn test_find_missing(bands: Cytobands) {
        assert!(bands.find("chr1", 300).is_none());
        assert!(bands.find("chr2", 10).is_none());
    }
}
