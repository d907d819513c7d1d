//! Per-contig comparison of the mutant bulk against background and parents.

pub mod contig;
pub mod store;

pub use contig::{bfr_score, hme_score, Contig};
pub use store::{
    var_mode, ClassifiedPositions, ContigPileupStore, InputSource, PositionRatios,
    PositionRecords,
};
