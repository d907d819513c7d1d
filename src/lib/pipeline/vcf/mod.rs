//! Allele-call normalisation for one-sample VCF input.
//!
//! - [`record`]: VCF record reading and the depth fields the dialects use
//! - [`dialect`]: caller dialect detection and allele-depth extraction
//! - [`normalize`]: zygosity bucketing, background subtraction and pileup rendering

pub mod dialect;
pub mod normalize;
pub mod record;

pub use dialect::{get_allele_depth, get_allele_freq, AlleleDepth, AlleleDepthDialect, DIALECTS};
pub use normalize::{filtering, get_vars, to_pileup, VariantCalls, ZygosityBuckets};
pub use record::{read_variant_records, FieldValues, VariantRecords, VcfRecord};
