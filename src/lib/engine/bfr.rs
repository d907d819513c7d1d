//! Background-frequency-ratio (BFR) arithmetic.
//!
//! A BFR measures allele imbalance at a hemizygous position. For a single
//! fraction map it is the ratio of the larger of the reference and dominant
//! variant fractions to the smaller one, each shifted by the `bfr_adjust`
//! pseudo-fraction. When a background map is supplied the mutant ratio is
//! divided by the background ratio for the same allele and folded so the
//! result is never below 1.

use crate::engine::position::{dominant_variant, non_ref_fractions, Allele, BaseFractions};

/// Ratio of major to minor fraction between the reference and `allele`.
pub fn fraction_ratio(fractions: &BaseFractions, allele: Option<Allele>, adjust: f64) -> f64 {
    let reference = fractions.get(&Allele::Ref).copied().unwrap_or(0.0);
    let variant = allele
        .and_then(|a| fractions.get(&a).copied())
        .unwrap_or(0.0);
    let (major, minor) = if reference >= variant {
        (reference, variant)
    } else {
        (variant, reference)
    };
    (major + adjust) / (minor + adjust)
}

fn is_complex(fractions: &BaseFractions) -> bool {
    non_ref_fractions(fractions).count() > 1
}

/// Compute the BFR for a mutant map, optionally against a background map.
///
/// Complex loci (more than one alternate allele in either map) score 0.0.
pub fn get_bfr(mutant: &BaseFractions, background: Option<&BaseFractions>, adjust: f64) -> f64 {
    let allele = dominant_variant(mutant).map(|(allele, _)| allele);
    match background {
        None => fraction_ratio(mutant, allele, adjust),
        Some(bg) => {
            if is_complex(mutant) || is_complex(bg) {
                return 0.0;
            }
            // fall back to the background allele when the mutant only shows the reference
            let allele = allele.or_else(|| dominant_variant(bg).map(|(a, _)| a));
            let ratio = fraction_ratio(mutant, allele, adjust) / fraction_ratio(bg, allele, adjust);
            if ratio < 1.0 {
                1.0 / ratio
            } else {
                ratio
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fractions(entries: &[(Allele, f64)]) -> BaseFractions {
        entries.iter().copied().collect()
    }

    #[test]
    fn single_map_ratio() {
        let mutant = fractions(&[(Allele::Ref, 0.75), (Allele::A, 0.25)]);
        let bfr = get_bfr(&mutant, None, 0.05);
        assert!((bfr - 0.8 / 0.3).abs() < 1e-12);
    }

    #[test]
    fn balanced_single_map_is_one() {
        let mutant = fractions(&[(Allele::Ref, 0.5), (Allele::C, 0.5)]);
        assert!((get_bfr(&mutant, None, 0.05) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_reference_counts_as_zero() {
        let mutant = fractions(&[(Allele::G, 1.0)]);
        assert!((get_bfr(&mutant, None, 0.05) - 1.05 / 0.05).abs() < 1e-9);
    }

    #[test]
    fn two_maps_are_folded_above_one() {
        let mutant = fractions(&[(Allele::Ref, 0.5), (Allele::T, 0.5)]);
        let bg = fractions(&[(Allele::Ref, 0.75), (Allele::T, 0.25)]);
        let forward = get_bfr(&mutant, Some(&bg), 0.05);
        let reverse = get_bfr(&bg, Some(&mutant), 0.05);
        assert!(forward >= 1.0);
        assert!((forward - reverse).abs() < 1e-12);
        assert!((forward - (0.8 / 0.3)).abs() < 1e-12);
    }

    #[test]
    fn background_with_reference_only_uses_mutant_allele() {
        let mutant = fractions(&[(Allele::Ref, 0.75), (Allele::A, 0.25)]);
        let bg = fractions(&[(Allele::Ref, 1.0)]);
        let bfr = get_bfr(&mutant, Some(&bg), 0.05);
        let expected = (1.05 / 0.05) / (0.8 / 0.3);
        assert!((bfr - expected).abs() < 1e-9);
    }

    #[test]
    fn complex_loci_score_zero() {
        let mutant = fractions(&[(Allele::Ref, 0.4), (Allele::A, 0.3), (Allele::T, 0.3)]);
        let bg = fractions(&[(Allele::Ref, 0.5), (Allele::A, 0.5)]);
        assert_eq!(get_bfr(&mutant, Some(&bg), 0.05), 0.0);
    }
}
