use anyhow::{bail, Result};
use segtriage_lib::core::config::{CrossType, Settings};
use segtriage_lib::core::error::TriageError;
use segtriage_lib::pipeline::variants::{InputFiles, InputFormat};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use crate::commands::common;

/// Characters not allowed in an output tag.
const TAG_METACHARS: &[char] = &['#', '/', ':', '*', '?', '\'', '<', '>', '|', '&', '$', ','];

/// CLI arguments for the `triage` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "triage")]
pub struct TriageArgs {
    /// Assembly FASTA, optionally gzipped.
    #[structopt(long, short = "a")]
    pub assembly: PathBuf,

    /// Mutant bulk pileup or VCF.
    #[structopt(long, short = "m")]
    pub mut_bulk: Option<PathBuf>,

    /// Background bulk pileup or VCF. Several files may be given comma separated.
    #[structopt(long, short = "b", use_delimiter = true)]
    pub bg_bulk: Vec<PathBuf>,

    /// Mutant parent pileup or VCF (polyploid runs).
    #[structopt(long)]
    pub mut_parent: Option<PathBuf>,

    /// Background parent pileup or VCF (polyploid runs).
    #[structopt(long)]
    pub bg_parent: Option<PathBuf>,

    /// Format of the bulk and parent inputs: pileup or vcf.
    #[structopt(long, short = "f", default_value = "pileup")]
    pub input_format: InputFormat,

    /// Tag for the report file names. A `.gz` suffix writes BGZF reports.
    #[structopt(long, short = "o", default_value = "segtriage")]
    pub output: String,

    /// Number of worker threads for the comparison pass.
    #[structopt(long, short = "t", default_value = "1")]
    pub threads: usize,

    /// Lower bound of the heterozygous allele fraction band.
    #[structopt(long, default_value = "0.25")]
    pub ht_low: f64,

    /// Upper bound of the heterozygous allele fraction band.
    #[structopt(long, default_value = "0.75")]
    pub ht_high: f64,

    /// Minimum coverage for a pileup position.
    #[structopt(long, default_value = "6")]
    pub min_depth: u32,

    /// Minimum reads supporting a non-reference base.
    #[structopt(long, default_value = "3")]
    pub min_non_ref_count: u32,

    /// Minimum reads supporting an indel.
    #[structopt(long, default_value = "3")]
    pub min_indel_count_support: u32,

    /// Keep variants at ambiguous (N) reference bases.
    #[structopt(long)]
    pub ambiguous_ref_bases: bool,

    /// Minimum mapping quality of a read.
    #[structopt(long, short = "q", default_value = "20")]
    pub mapping_quality: u8,

    /// Minimum base quality of a read base.
    #[structopt(long, short = "Q", default_value = "15")]
    pub base_quality: u8,

    /// Allele fractions at or below this value are ignored.
    #[structopt(long, default_value = "0.1")]
    pub noise: f64,

    /// Pseudo-count added to homozygous and heterozygous counts in the hme score.
    #[structopt(long, default_value = "0.5")]
    pub hmes_adjust: f64,

    /// Pseudo-fraction added to allele fractions in BFR ratios.
    #[structopt(long, default_value = "0.05")]
    pub bfr_adjust: f64,

    /// Mapping population: back or out cross.
    #[structopt(long, default_value = "back")]
    pub cross_type: CrossType,

    /// Score hemizygous parental positions (polyploid genomes).
    #[structopt(long)]
    pub polyploidy: bool,

    /// Score every contig, not only those carrying variants.
    #[structopt(long)]
    pub use_all_contigs: bool,

    /// Keep contigs scoring below the cutoff.
    #[structopt(long)]
    pub include_low_hmes: bool,

    /// Top percentage of BFR scores kept.
    #[structopt(long, default_value = "0.1")]
    pub bfr_proportion: f64,

    /// Background non-reference ratio above which a homozygous call is dropped.
    #[structopt(long, default_value = "0.35")]
    pub bg_bulk_noise: f64,
}

/// Normalised configuration derived from [`TriageArgs`].
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub assembly: PathBuf,
    pub inputs: InputFiles,
    pub output: String,
    pub threads: usize,
    pub settings: Settings,
}

impl From<TriageArgs> for TriageConfig {
    fn from(args: TriageArgs) -> TriageConfig {
        TriageConfig {
            assembly: args.assembly,
            inputs: InputFiles {
                mut_bulk: args.mut_bulk,
                bg_bulk: args.bg_bulk,
                mut_parent: args.mut_parent,
                bg_parent: args.bg_parent,
                format: args.input_format,
            },
            output: args.output,
            threads: args.threads,
            settings: Settings {
                ht_low: args.ht_low,
                ht_high: args.ht_high,
                min_depth: args.min_depth,
                min_non_ref_count: args.min_non_ref_count,
                min_indel_count_support: args.min_indel_count_support,
                ambiguous_ref_bases: args.ambiguous_ref_bases,
                mapping_quality: args.mapping_quality,
                base_quality: args.base_quality,
                noise: args.noise,
                hmes_adjust: args.hmes_adjust,
                bfr_adjust: args.bfr_adjust,
                cross_type: args.cross_type,
                polyploidy: args.polyploidy,
                only_frag_with_vars: !args.use_all_contigs,
                filter_out_low_hmes: !args.include_low_hmes,
                bfr_proportion: args.bfr_proportion,
                bg_bulk_noise: args.bg_bulk_noise,
            },
        }
    }
}

fn require_file(what: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} file, {} does not exist!", what, path.display());
    }
    Ok(())
}

impl TriageConfig {
    pub fn hme_report(&self) -> PathBuf {
        common::report_path(&self.output, common::HME_REPORT_SUFFIX)
    }

    pub fn bfr_report(&self) -> PathBuf {
        common::report_path(&self.output, common::BFR_REPORT_SUFFIX)
    }

    /// Check inputs, output tag and thresholds before any work starts.
    pub fn validate(&self) -> Result<()> {
        require_file("assembly", &self.assembly)?;
        let mut_bulk = self.inputs.mut_bulk.as_ref().ok_or_else(|| {
            TriageError::MissingRequiredInput(
                "--mut-bulk must be specified".to_string(),
            )
        })?;
        require_file("mut_bulk", mut_bulk)?;
        for path in &self.inputs.bg_bulk {
            require_file("bg_bulk", path)?;
        }
        if let Some(path) = &self.inputs.mut_parent {
            require_file("mut_parent", path)?;
        }
        if let Some(path) = &self.inputs.bg_parent {
            require_file("bg_parent", path)?;
        }
        if self.settings.polyploidy && !self.inputs.has_parents() {
            return Err(TriageError::MissingRequiredInput(
                "polyploidy needs --mut-parent or --bg-parent".to_string(),
            )
            .into());
        }

        if self.output.is_empty() || self.output.contains(TAG_METACHARS) {
            bail!(
                "please choose a name tag that contains alphanumeric characters, hyphen(-) and underscore(_) only"
            );
        }
        for report in [self.hme_report(), self.bfr_report()] {
            if report.exists() {
                bail!(
                    "'{}' file exists please choose a different name tag to be included in the output file name",
                    report.display()
                );
            }
        }

        self.settings.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> TriageArgs {
        TriageArgs::from_iter_safe(std::iter::once("triage").chain(list.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_settings() {
        let config: TriageConfig = args(&["--assembly", "asm.fa", "--mut-bulk", "m.pileup"]).into();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.inputs.format, InputFormat::Pileup);
        assert_eq!(config.threads, 1);
        assert!(config.inputs.bg_bulk.is_empty());
    }

    #[test]
    fn flags_invert_filters_and_split_backgrounds() {
        let config: TriageConfig = args(&[
            "--assembly",
            "asm.fa",
            "--mut-bulk",
            "m.vcf",
            "--bg-bulk",
            "b1.vcf,b2.vcf",
            "--input-format",
            "vcf",
            "--use-all-contigs",
            "--include-low-hmes",
            "--cross-type",
            "out",
        ])
        .into();
        assert_eq!(
            config.inputs.bg_bulk,
            vec![PathBuf::from("b1.vcf"), PathBuf::from("b2.vcf")]
        );
        assert_eq!(config.inputs.format, InputFormat::Vcf);
        assert!(!config.settings.only_frag_with_vars);
        assert!(!config.settings.filter_out_low_hmes);
        assert_eq!(config.settings.cross_type, CrossType::Out);
    }

    #[test]
    fn validation_checks_inputs_and_tag() {
        let dir = tempdir().unwrap();
        let asm = dir.path().join("asm.fa");
        let mutant = dir.path().join("m.pileup");
        std::fs::write(&asm, ">frag1\nACGT\n").unwrap();
        std::fs::write(&mutant, "").unwrap();
        let tag = dir.path().join("run").to_string_lossy().into_owned();

        let mut config: TriageConfig = args(&[
            "--assembly",
            asm.to_str().unwrap(),
            "--mut-bulk",
            mutant.to_str().unwrap(),
        ])
        .into();
        // tags may not contain a path separator
        config.output = tag.clone();
        assert!(config.validate().is_err());

        config.output = "run".to_string();
        assert!(config.validate().is_ok());

        config.inputs.bg_bulk = vec![dir.path().join("missing.pileup")];
        assert!(config.validate().is_err());
        config.inputs.bg_bulk.clear();

        config.settings.polyploidy = true;
        assert!(config.validate().is_err());
        config.inputs.mut_parent = Some(mutant.clone());
        assert!(config.validate().is_ok());

        config.inputs.mut_bulk = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn existing_report_blocks_the_tag() {
        let dir = tempdir().unwrap();
        let asm = dir.path().join("asm.fa");
        std::fs::write(&asm, ">frag1\nACGT\n").unwrap();
        let mut config: TriageConfig = args(&[
            "--assembly",
            asm.to_str().unwrap(),
            "--mut-bulk",
            asm.to_str().unwrap(),
            "--output",
            "existing_tag_check",
        ])
        .into();
        let report = config.hme_report();
        std::fs::write(&report, "").unwrap();
        let result = config.validate();
        std::fs::remove_file(&report).unwrap();
        assert!(result.is_err());

        config.settings.ht_low = 0.9;
        assert!(config.validate().is_err());
    }
}
