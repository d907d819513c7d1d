mod args;

use anyhow::{Context, Result};
use log::info;
use segtriage_lib::pipeline::report::write_selection;
use segtriage_lib::pipeline::variants::{ScoreKind, Variants};

use crate::commands::common;

pub use args::{TriageArgs, TriageConfig};

/// Execute the `triage` command end-to-end.
pub fn run_triage(args: TriageArgs) -> Result<()> {
    let config: TriageConfig = args.into();
    config.validate()?;

    info!("Running segtriage triage on {:?}", config.assembly);
    let threads = common::configure_global_thread_pool(config.threads)?;

    let mut variants = Variants::load(&config.assembly, config.settings.clone())
        .with_context(|| format!("Failed to load assembly {}", config.assembly.display()))?;
    variants
        .analyse_pileups(&config.inputs)
        .context("Failed to read variant inputs")?;
    variants.compare_pileups();

    variants.verify_bg_bulk_pileup();
    let hme_report = config.hme_report();
    let hmes_frags = variants.hmes_frags();
    write_selection(&hme_report, &hmes_frags, ScoreKind::Hme, threads)
        .with_context(|| format!("Failed to write {}", hme_report.display()))?;

    if config.settings.polyploidy {
        let bfr_report = config.bfr_report();
        let bfr_frags = variants.bfr_frags();
        write_selection(&bfr_report, &bfr_frags, ScoreKind::Bfr, threads)
            .with_context(|| format!("Failed to write {}", bfr_report.display()))?;
    }

    info!("Triage complete -> {}", config.output);
    Ok(())
}
