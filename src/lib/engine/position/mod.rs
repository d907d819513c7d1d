//! Per-position allele primitives shared by every input source.
//!
//! Each decoded position carries a [`BaseFractions`] map from [`Allele`] to the
//! fraction of supporting reads. The map always uses [`Allele::Ref`] for reads
//! matching the reference, so callers never need the reference base to interpret it.
//!
//! # Implementations
//!
//! - [`pileup_record::AlleleFractionRecord`]: one decoded mpileup line

pub mod pileup_record;

use std::collections::BTreeMap;
use std::fmt;

/// An allele observed in a pileup column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Allele {
    /// Reads matching the reference base.
    Ref,
    A,
    C,
    G,
    T,
    N,
    /// Insertion following this position.
    Ins,
    /// Deletion at or following this position.
    Del,
}

impl Allele {
    #[inline]
    pub fn is_ref(&self) -> bool {
        matches!(self, Allele::Ref)
    }

    /// Map a pileup base byte (either strand) to an allele.
    #[inline]
    pub fn from_base(base: u8) -> Option<Self> {
        match base.to_ascii_uppercase() {
            b'A' => Some(Allele::A),
            b'C' => Some(Allele::C),
            b'G' => Some(Allele::G),
            b'T' => Some(Allele::T),
            b'N' => Some(Allele::N),
            _ => None,
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Allele::Ref => write!(f, "ref"),
            Allele::A => write!(f, "A"),
            Allele::C => write!(f, "C"),
            Allele::G => write!(f, "G"),
            Allele::T => write!(f, "T"),
            Allele::N => write!(f, "N"),
            Allele::Ins => write!(f, "ins"),
            Allele::Del => write!(f, "del"),
        }
    }
}

/// Fraction of reads supporting each allele at one position.
pub type BaseFractions = BTreeMap<Allele, f64>;

/// Iterate over the non-reference entries of a fraction map.
pub fn non_ref_fractions(fractions: &BaseFractions) -> impl Iterator<Item = (Allele, f64)> + '_ {
    fractions
        .iter()
        .filter(|(allele, _)| !allele.is_ref())
        .map(|(allele, frac)| (*allele, *frac))
}

/// The non-reference allele with the largest fraction.
///
/// Ties keep the allele that sorts first. Multi-allelic positions therefore
/// collapse onto a single dominant allele.
pub fn dominant_variant(fractions: &BaseFractions) -> Option<(Allele, f64)> {
    non_ref_fractions(fractions).fold(None, |best, (allele, frac)| match best {
        Some((_, best_frac)) if best_frac >= frac => best,
        _ => Some((allele, frac)),
    })
}
