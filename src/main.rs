//! segtriage - bulk segregant contig triage
//!
//! segtriage ranks the contigs of a non-reference assembly by how likely they
//! are to carry a causal mutation, using pileups or VCF calls of a mutant bulk,
//! a background bulk and optionally both parents.
//!
//! # Tools
//!
//! - `triage`: classify, score and select contigs, writing the selected positions
//! - `vcf2pileup`: render a one-sample VCF as synthetic pileup lines
//!
//! # Usage
//!
//! ```bash
//! # Pileup inputs, back-cross population
//! segtriage triage --assembly asm.fa --mut-bulk mut.pileup --bg-bulk bg.pileup --output run
//!
//! # VCF inputs with two background bulks
//! segtriage triage --assembly asm.fa --input-format vcf --mut-bulk mut.vcf --bg-bulk bg1.vcf,bg2.vcf
//!
//! # Polyploid run with parental pileups and gzipped reports
//! segtriage triage --assembly asm.fa --mut-bulk mut.pileup --bg-bulk bg.pileup \
//!     --mut-parent mp.pileup --bg-parent bp.pileup --polyploidy --output run.gz --threads 8
//! ```

extern crate segtriage_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use segtriage_lib::utils;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Candidate contig selection from bulk segregant sequencing
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Classify, score and select contigs from bulk and parent inputs
    Triage(commands::TriageArgs),
    /// Render a one-sample VCF as pileup lines
    Vcf2pileup(commands::Vcf2PileupArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Triage(args) => commands::run_triage(args)?,
            Subcommand::Vcf2pileup(args) => commands::run_vcf2pileup(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
