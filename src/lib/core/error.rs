//! Error types for the segtriage library

use thiserror::Error;

/// Caller dialects the allele-depth normaliser understands.
pub const SUPPORTED_VCF_DIALECTS: &str = "VarScan, GATK, Bcftools(Samtools), Vcf 4.0, 4.1 and 4.2";

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "not a supported vcf format ({}) and check that it is one sample vcf: {record}",
        SUPPORTED_VCF_DIALECTS
    )]
    UnsupportedFormat { record: String },

    #[error("fasta id already found in the file for {0}; make sure there are no duplicate entries")]
    DuplicateAssemblyEntry(String),

    #[error("No sequence found for entry {0}")]
    EmptyAssemblyEntry(String),

    #[error("Missing required input: {0}")]
    MissingRequiredInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Threshold validation error: {field} must be between {min} and {max}, got {value}")]
    ThresholdValidation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

pub type Result<T> = std::result::Result<T, TriageError>;
