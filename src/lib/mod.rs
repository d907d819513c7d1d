//! segtriage: bulk segregant contig triage for non-reference assemblies
//!
//! The library turns per-position allele summaries of a mutant bulk, a
//! background bulk and optionally both parents into per-contig scores, and
//! selects the contigs most likely to carry the causal mutation or a linked
//! marker.
//!
//! # Modules
//!
//! - [`core`]: errors, run settings, I/O and filesystem helpers
//! - [`engine`]: allele fractions, the pileup decoder, zygosity bands and BFR arithmetic
//! - [`pipeline`]: VCF normalisation, per-contig comparison, scoring and reports
//! - [`utils`]: helpers used by the command line front end

pub mod core;
pub mod engine;
pub mod pipeline;
pub mod utils;
