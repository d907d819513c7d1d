use crate::core::config::Settings;
use crate::pipeline::compare::store::{ClassifiedPositions, PositionRatios};

/// One assembly sequence and its classification results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contig {
    pub id: String,
    pub length: usize,
    pub hm_pos: PositionRatios,
    pub ht_pos: PositionRatios,
    pub hemi_pos: PositionRatios,
    hme_score: Option<f64>,
    bfr_score: Option<f64>,
}

impl Contig {
    pub fn new(id: &str, length: usize) -> Self {
        Contig {
            id: id.to_string(),
            length,
            ..Default::default()
        }
    }

    #[inline]
    pub fn hm_num(&self) -> usize {
        self.hm_pos.len()
    }

    #[inline]
    pub fn ht_num(&self) -> usize {
        self.ht_pos.len()
    }

    #[inline]
    pub fn hemi_num(&self) -> usize {
        self.hemi_pos.len()
    }

    /// Homozygous plus heterozygous position count.
    #[inline]
    pub fn variant_num(&self) -> usize {
        self.hm_num() + self.ht_num()
    }

    /// `None` until the comparison pass has run.
    pub fn hme_score(&self) -> Option<f64> {
        self.hme_score
    }

    /// `None` until the comparison pass has run.
    pub fn bfr_score(&self) -> Option<f64> {
        self.bfr_score
    }

    /// Take the comparison result and compute both scores.
    pub fn assign(&mut self, classified: ClassifiedPositions, settings: &Settings) {
        self.hm_pos = classified.hom;
        self.ht_pos = classified.het;
        self.hemi_pos = classified.hemi;
        self.hme_score = Some(hme_score(self.hm_num(), self.ht_num(), settings.hmes_adjust));
        self.bfr_score = Some(bfr_score(self.hemi_pos.values().copied()));
    }
}

/// Ratio of homozygous to heterozygous counts, smoothed by `adjust`.
pub fn hme_score(hom: usize, het: usize, adjust: f64) -> f64 {
    if hom + het == 0 {
        return 0.0;
    }
    (hom as f64 + adjust) / (het as f64 + adjust)
}

/// Geometric mean of the positive BFR values.
pub fn bfr_score<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| *v > 0.0)
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v.ln(), count + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_undefined_before_comparison() {
        let contig = Contig::new("frag1", 120);
        assert_eq!(contig.hme_score(), None);
        assert_eq!(contig.bfr_score(), None);
    }

    #[test]
    fn no_variants_scores_zero() {
        let mut contig = Contig::new("frag1", 120);
        contig.assign(ClassifiedPositions::default(), &Settings::default());
        assert_eq!(contig.hme_score(), Some(0.0));
        assert_eq!(contig.bfr_score(), Some(0.0));
    }

    #[test]
    fn hme_score_counts() {
        assert_eq!(hme_score(3, 1, 0.5), 3.5 / 1.5);
        assert_eq!(hme_score(0, 2, 0.5), 0.5 / 2.5);
        assert_eq!(hme_score(2, 0, 0.5), 5.0);
    }

    #[test]
    fn bfr_score_is_geometric_mean_of_positive_values() {
        assert!((bfr_score([2.0, 8.0]) - 4.0).abs() < 1e-12);
        assert!((bfr_score([2.0, 0.0, 8.0]) - 4.0).abs() < 1e-12);
        assert_eq!(bfr_score([0.0, 0.0]), 0.0);
        assert_eq!(bfr_score(Vec::new()), 0.0);
    }

    #[test]
    fn assign_moves_buckets() {
        let mut contig = Contig::new("frag1", 120);
        let classified = ClassifiedPositions {
            hom: [(10, 1.0), (20, 0.9)].into_iter().collect(),
            het: [(30, 0.5)].into_iter().collect(),
            hemi: [(40, 3.0)].into_iter().collect(),
        };
        contig.assign(classified, &Settings::default());
        assert_eq!(contig.hm_num(), 2);
        assert_eq!(contig.ht_num(), 1);
        assert_eq!(contig.hemi_num(), 1);
        assert_eq!(contig.variant_num(), 3);
        assert_eq!(contig.hme_score(), Some(2.5 / 1.5));
        assert_eq!(contig.bfr_score(), Some(3.0));
    }
}
