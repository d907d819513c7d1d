//! Render a one-sample VCF as pileup lines.
//!
//! Each record with an alternate allele becomes one synthetic mpileup line, the
//! same rendering the `triage` command applies to VCF inputs.

use anyhow::{Context, Result};
use log::info;
use segtriage_lib::pipeline::vcf::{read_variant_records, to_pileup};
use segtriage_lib::utils;
use std::io::Write;
use std::path::PathBuf;
use structopt::StructOpt;

/// CLI arguments for the `vcf2pileup` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "vcf2pileup")]
pub struct Vcf2PileupArgs {
    /// Input VCF, optionally gzipped; `-` reads stdin.
    pub vcf: PathBuf,

    /// Output file; stdout when omitted. A `.gz` path writes BGZF.
    #[structopt(long, short = "o")]
    pub output: Option<PathBuf>,
}

/// Execute the `vcf2pileup` command.
pub fn run_vcf2pileup(args: Vcf2PileupArgs) -> Result<()> {
    let gzipped = args.output.as_ref().map_or(false, utils::is_bgzipped);
    if let Some(output) = &args.output {
        utils::make_parent_dirs(output)?;
    }
    let mut writer = utils::get_raw_writer(&args.output, gzipped, 1, 6)?;

    let mut written = 0usize;
    for record in read_variant_records(&args.vcf)
        .with_context(|| format!("Failed to open {}", args.vcf.display()))?
    {
        let record = record?;
        writeln!(writer, "{}", to_pileup(&record)?)?;
        written += 1;
    }
    writer.flush()?;

    info!("Rendered {} records from {}", written, args.vcf.display());
    Ok(())
}
