//! Triage pipeline: VCF normalisation, per-contig comparison and whole-assembly selection.

pub mod assembly;
pub mod compare;
pub mod report;
pub mod variants;
pub mod vcf;

pub mod prelude {
    pub use super::assembly::{read_assembly, AssemblyEntry};
    pub use super::compare::{ClassifiedPositions, Contig, ContigPileupStore, InputSource};
    pub use super::report::{selection_rows, write_selection, VariantRow};
    pub use super::variants::{
        bfr_cutoff, InputFiles, InputFormat, ScoreKind, Selection, Stage, Variants,
        DISABLED_CUTOFF,
    };
    pub use super::vcf::{filtering, get_allele_depth, get_allele_freq, get_vars, to_pileup};
}
