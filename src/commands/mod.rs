pub mod common;
pub mod triage;
pub mod vcf2pileup;

pub use triage::{run_triage, TriageArgs};
pub use vcf2pileup::{run_vcf2pileup, Vcf2PileupArgs};
