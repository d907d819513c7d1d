//! Per-position primitives: allele fractions, pileup decoding, zygosity bands and BFR arithmetic.

pub mod bfr;
pub mod position;
pub mod zygosity;

pub use bfr::get_bfr;
pub use position::pileup_record::AlleleFractionRecord;
pub use position::{dominant_variant, Allele, BaseFractions};
pub use zygosity::Zygosity;
